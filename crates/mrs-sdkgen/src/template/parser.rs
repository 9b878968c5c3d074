use super::{LoopKind, Node, Predicate, Template, TemplateError};
use crate::operations::Operation;

/// Knobs for [`parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Recognize `${name}` placeholders and `$$` escapes. Disabled for
    /// base-class files, whose `${...}` belongs to the target language.
    pub placeholders: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self { placeholders: true }
    }
}

enum BlockKind {
    Loop(LoopKind),
    Conditional(Predicate),
}

struct OpenBlock {
    name: String,
    line: usize,
    kind: BlockKind,
    body: Vec<Node>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edge {
    Start,
    End,
}

/// A whole-line `<indent><comment> --- <name>Start|End` marker.
#[derive(Debug)]
struct Marker<'s> {
    indent: &'s str,
    name: &'s str,
    edge: Edge,
}

impl<'s> Marker<'s> {
    fn parse(line: &'s str, comment_prefix: &str) -> Option<Self> {
        let content = line.trim_end_matches(['\n', '\r']);
        let trimmed = content.trim_start();
        let indent = &content[..content.len() - trimmed.len()];
        let rest = trimmed
            .strip_prefix(comment_prefix)?
            .strip_prefix(" --- ")?
            .trim_end();
        if rest.is_empty() || !rest.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }
        let (name, edge) = if let Some(name) = rest.strip_suffix("Start") {
            (name, Edge::Start)
        } else if let Some(name) = rest.strip_suffix("End") {
            (name, Edge::End)
        } else {
            return None;
        };
        (!name.is_empty()).then_some(Self { indent, name, edge })
    }
}

fn block_kind(name: &str, indent: &str) -> Option<BlockKind> {
    let kind = match name {
        "serviceLoop" => BlockKind::Loop(LoopKind::Service),
        "schemaLoop" => BlockKind::Loop(LoopKind::Schema),
        "objectLoop" => BlockKind::Loop(LoopKind::Object),
        "importLoop" => BlockKind::Loop(LoopKind::Import),
        "importRequiredDatatypesOnly" => BlockKind::Conditional(Predicate::RequiredDatatypes {
            indent: indent.to_string(),
        }),
        "authOnly" => BlockKind::Conditional(Predicate::Auth),
        "runtimeOnly" => BlockKind::Conditional(Predicate::RuntimeOnly),
        "runtimeRemove" => BlockKind::Conditional(Predicate::RuntimeRemove),
        _ => {
            let op = name.strip_suffix("Only")?;
            if let Some(op) = op.strip_prefix("crud") {
                BlockKind::Conditional(Predicate::Crud(Operation::from_marker_name(op)?))
            } else if let Some(op) = op.strip_prefix("import") {
                BlockKind::Conditional(Predicate::Import(Operation::from_marker_name(op)?))
            } else {
                return None;
            }
        }
    };
    Some(kind)
}

fn current<'b>(stack: &'b mut [OpenBlock], root: &'b mut Vec<Node>) -> &'b mut Vec<Node> {
    match stack.last_mut() {
        Some(block) => &mut block.body,
        None => root,
    }
}

fn push_literal(body: &mut Vec<Node>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Node::Literal(last)) = body.last_mut() {
        last.push_str(text);
    } else {
        body.push(Node::Literal(text.to_string()));
    }
}

fn is_placeholder_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn push_text(
    body: &mut Vec<Node>,
    line: &str,
    line_no: usize,
    options: ParseOptions,
) -> Result<(), TemplateError> {
    if !options.placeholders {
        push_literal(body, line);
        return Ok(());
    }
    let mut literal = String::new();
    let mut rest = line;
    while let Some(pos) = rest.find('$') {
        literal.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        if let Some(tail) = after.strip_prefix('$') {
            literal.push('$');
            rest = tail;
        } else if let Some(tail) = after.strip_prefix('{') {
            let end = tail
                .find('}')
                .ok_or(TemplateError::UnterminatedPlaceholder { line: line_no })?;
            let name = &tail[..end];
            if !is_placeholder_name(name) {
                return Err(TemplateError::InvalidPlaceholder {
                    line: line_no,
                    name: name.to_string(),
                });
            }
            push_literal(body, &literal);
            literal.clear();
            body.push(Node::Placeholder(name.to_string()));
            rest = &tail[end + 1..];
        } else {
            literal.push('$');
            rest = after;
        }
    }
    literal.push_str(rest);
    push_literal(body, &literal);
    Ok(())
}

/// Parse `source`, whose markers use `comment_prefix` (`//` or `#`).
pub fn parse(
    source: &str,
    comment_prefix: &str,
    options: ParseOptions,
) -> Result<Template, TemplateError> {
    let mut root = Vec::new();
    let mut stack: Vec<OpenBlock> = Vec::new();

    for (idx, line) in source.split_inclusive('\n').enumerate() {
        let line_no = idx + 1;
        let Some(marker) = Marker::parse(line, comment_prefix) else {
            push_text(current(&mut stack, &mut root), line, line_no, options)?;
            continue;
        };

        match marker.edge {
            Edge::Start => {
                let kind = block_kind(marker.name, marker.indent).ok_or_else(|| {
                    TemplateError::UnknownMarker {
                        line: line_no,
                        name: format!("{}Start", marker.name),
                    }
                })?;
                stack.push(OpenBlock {
                    name: marker.name.to_string(),
                    line: line_no,
                    kind,
                    body: Vec::new(),
                });
            }
            Edge::End => {
                let Some(open) = stack.pop() else {
                    return Err(TemplateError::UnexpectedEnd {
                        line: line_no,
                        found: marker.name.to_string(),
                        expected: None,
                    });
                };
                if open.name != marker.name {
                    return Err(TemplateError::UnexpectedEnd {
                        line: line_no,
                        found: marker.name.to_string(),
                        expected: Some(open.name),
                    });
                }
                let node = match open.kind {
                    BlockKind::Loop(kind) => Node::Loop {
                        kind,
                        body: open.body,
                    },
                    BlockKind::Conditional(predicate) => Node::Conditional {
                        predicate,
                        body: open.body,
                    },
                };
                current(&mut stack, &mut root).push(node);
            }
        }
    }

    if let Some(open) = stack.pop() {
        return Err(TemplateError::Unclosed {
            line: open.line,
            name: open.name,
        });
    }
    Ok(Template { nodes: root })
}
