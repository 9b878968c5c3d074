use super::{LoopKind, Node, Predicate, Template, TemplateError};
use crate::plan::{ObjectPlan, SchemaPlan, ServicePlan};

/// Where the generated code is headed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// A distributable package: imports and exports kept.
    #[default]
    Package,
    /// A single blob embedded into an interactive runtime session.
    Runtime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Root,
    Service,
    Schema,
    Object,
    Import,
}

#[derive(Clone, Copy)]
struct Frame<'p> {
    service: Option<&'p ServicePlan>,
    schema: Option<&'p SchemaPlan>,
    object: Option<&'p ObjectPlan>,
    level: Level,
}

impl<'p> Frame<'p> {
    fn lookup(&self, name: &str) -> Option<&'p str> {
        self.object
            .and_then(|o| o.vars.get(name))
            .or_else(|| self.schema.and_then(|s| s.vars.get(name)))
            .or_else(|| self.service.and_then(|s| s.vars.get(name)))
            .map(String::as_str)
    }

    fn service(&self, block: String) -> Result<&'p ServicePlan, TemplateError> {
        self.service.ok_or(TemplateError::MisplacedBlock {
            block,
            context: "outside of a service template",
        })
    }

    fn requires_auth(&self) -> Option<bool> {
        if let Some(object) = self.object {
            Some(object.requires_auth)
        } else if let Some(schema) = self.schema {
            Some(schema.requires_auth)
        } else {
            self.service.map(|s| s.requires_auth)
        }
    }
}

struct Renderer {
    mode: OutputMode,
    out: String,
}

impl Renderer {
    fn nodes<'p>(&mut self, nodes: &[Node], frame: Frame<'p>) -> Result<(), TemplateError> {
        for node in nodes {
            match node {
                Node::Literal(text) => self.out.push_str(text),
                Node::Placeholder(name) => {
                    let value = frame
                        .lookup(name)
                        .ok_or_else(|| TemplateError::UnknownPlaceholder { name: name.clone() })?;
                    self.out.push_str(value);
                }
                Node::Loop { kind, body } => self.expand_loop(*kind, body, frame)?,
                Node::Conditional { predicate, body } => {
                    self.conditional(predicate, body, frame)?
                }
            }
        }
        Ok(())
    }

    fn expand_loop<'p>(
        &mut self,
        kind: LoopKind,
        body: &[Node],
        frame: Frame<'p>,
    ) -> Result<(), TemplateError> {
        let misplaced = |context| TemplateError::MisplacedBlock {
            block: kind.marker_name().to_string(),
            context,
        };
        let service = frame.service(kind.marker_name().to_string())?;
        match kind {
            LoopKind::Service => {
                if frame.level != Level::Root {
                    return Err(misplaced("inside another loop"));
                }
                self.nodes(
                    body,
                    Frame {
                        level: Level::Service,
                        ..frame
                    },
                )
            }
            LoopKind::Schema => {
                if !matches!(frame.level, Level::Root | Level::Service) {
                    return Err(misplaced("below the service level"));
                }
                for schema in &service.schemas {
                    self.nodes(
                        body,
                        Frame {
                            schema: Some(schema),
                            level: Level::Schema,
                            ..frame
                        },
                    )?;
                }
                Ok(())
            }
            LoopKind::Object => {
                let schema = match (frame.level, frame.schema) {
                    (Level::Schema, Some(schema)) => schema,
                    _ => return Err(misplaced("outside of a schemaLoop")),
                };
                for object in &schema.objects {
                    self.nodes(
                        body,
                        Frame {
                            object: Some(object),
                            level: Level::Object,
                            ..frame
                        },
                    )?;
                }
                Ok(())
            }
            LoopKind::Import => {
                if !matches!(frame.level, Level::Root | Level::Service) {
                    return Err(misplaced("below the service level"));
                }
                self.nodes(
                    body,
                    Frame {
                        level: Level::Import,
                        ..frame
                    },
                )
            }
        }
    }

    fn conditional<'p>(
        &mut self,
        predicate: &Predicate,
        body: &[Node],
        frame: Frame<'p>,
    ) -> Result<(), TemplateError> {
        let misplaced = |context| TemplateError::MisplacedBlock {
            block: predicate.marker_name(),
            context,
        };
        let keep = match predicate {
            Predicate::RuntimeOnly => self.mode == OutputMode::Runtime,
            Predicate::RuntimeRemove => self.mode == OutputMode::Package,
            Predicate::Auth => frame
                .requires_auth()
                .ok_or_else(|| misplaced("outside of a service template"))?,
            Predicate::Crud(op) => match frame.object {
                Some(object) => object.operations.contains(*op),
                None => return Err(misplaced("outside of an objectLoop")),
            },
            Predicate::Import(op) => {
                if frame.level != Level::Import {
                    return Err(misplaced("outside of an importLoop"));
                }
                frame.service(predicate.marker_name())?.operations.contains(*op)
            }
            Predicate::RequiredDatatypes { indent } => {
                if frame.level != Level::Import {
                    return Err(misplaced("outside of an importLoop"));
                }
                let service = frame.service(predicate.marker_name())?;
                for datatype in &service.required_datatypes {
                    self.out.push_str(indent);
                    self.out.push_str(datatype);
                    self.out.push_str(",\n");
                }
                !service.required_datatypes.is_empty()
            }
        };
        if keep {
            self.nodes(body, frame)?;
        }
        Ok(())
    }
}

/// Render a service template against `plan`.
///
/// Service placeholders are available everywhere; the `serviceLoop` block
/// (if any) expands exactly once.
pub fn render(
    template: &Template,
    plan: &ServicePlan,
    mode: OutputMode,
) -> Result<String, TemplateError> {
    let mut renderer = Renderer {
        mode,
        out: String::new(),
    };
    let frame = Frame {
        service: Some(plan),
        schema: None,
        object: None,
        level: Level::Root,
    };
    renderer.nodes(&template.nodes, frame)?;
    Ok(renderer.out)
}

/// Render a template that has no service behind it (base classes).
///
/// Only `runtimeOnly` / `runtimeRemove` blocks are meaningful; anything
/// else is a [`TemplateError::MisplacedBlock`].
pub fn render_static(template: &Template, mode: OutputMode) -> Result<String, TemplateError> {
    let mut renderer = Renderer {
        mode,
        out: String::new(),
    };
    let frame = Frame {
        service: None,
        schema: None,
        object: None,
        level: Level::Root,
    };
    renderer.nodes(&template.nodes, frame)?;
    Ok(renderer.out)
}
