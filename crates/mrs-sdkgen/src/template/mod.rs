//! Marker-delimited source templates.
//!
//! A template is plain target-language source in which whole-line comment
//! markers delimit blocks:
//!
//! ```text
//! // --- schemaLoopStart
//! export class ${schema_class_name} {
//!     // --- objectLoopStart
//!     // --- crudUpdateOnlyStart
//!     ...
//!     // --- crudUpdateOnlyEnd
//!     // --- objectLoopEnd
//! }
//! // --- schemaLoopEnd
//! ```
//!
//! [`parse`] turns the text into a tree of [`Node`]s, rejecting malformed
//! markup up front. [`render`] evaluates that tree against a
//! [`ServicePlan`](crate::plan::ServicePlan).

mod parser;
mod postprocess;
mod render;

pub use parser::{ParseOptions, parse};
pub use postprocess::{prepare_for_runtime, strip_exports};
pub use render::{OutputMode, render, render_static};

use crate::operations::Operation;

/// A parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Literal(String),
    /// `${name}`
    Placeholder(String),
    Loop { kind: LoopKind, body: Vec<Node> },
    Conditional { predicate: Predicate, body: Vec<Node> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopKind {
    Service,
    Schema,
    Object,
    Import,
}

impl LoopKind {
    pub fn marker_name(self) -> &'static str {
        match self {
            Self::Service => "serviceLoop",
            Self::Schema => "schemaLoop",
            Self::Object => "objectLoop",
            Self::Import => "importLoop",
        }
    }
}

/// Condition under which a conditional block survives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `crud{Op}Only`: the enclosing object enables `Op`.
    Crud(Operation),
    /// `import{Op}Only`: some object of the service enables `Op`.
    Import(Operation),
    /// `importRequiredDatatypesOnly`: expands to one `{indent}{Type},` line
    /// per required datatype, or nothing.
    RequiredDatatypes { indent: String },
    /// `authOnly`
    Auth,
    /// `runtimeOnly`: kept only in runtime mode.
    RuntimeOnly,
    /// `runtimeRemove`: dropped in runtime mode.
    RuntimeRemove,
}

impl Predicate {
    pub fn marker_name(&self) -> String {
        match self {
            Self::Crud(op) => format!("crud{}Only", op),
            Self::Import(op) => format!("import{}Only", op),
            Self::RequiredDatatypes { .. } => "importRequiredDatatypesOnly".to_string(),
            Self::Auth => "authOnly".to_string(),
            Self::RuntimeOnly => "runtimeOnly".to_string(),
            Self::RuntimeRemove => "runtimeRemove".to_string(),
        }
    }
}

/// A malformed template, or one used outside the context it was written for.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("line {line}: unknown template marker `{name}`")]
    UnknownMarker { line: usize, name: String },

    #[error(
        "line {line}: `{found}End` does not match the open block ({})",
        .expected.as_deref().unwrap_or("none")
    )]
    UnexpectedEnd {
        line: usize,
        found: String,
        expected: Option<String>,
    },

    #[error("line {line}: `{name}Start` is never closed")]
    Unclosed { line: usize, name: String },

    #[error("line {line}: unterminated placeholder")]
    UnterminatedPlaceholder { line: usize },

    #[error("line {line}: invalid placeholder name `{name}`")]
    InvalidPlaceholder { line: usize, name: String },

    #[error("unknown placeholder `{name}`")]
    UnknownPlaceholder { name: String },

    #[error("`{block}` is not allowed {context}")]
    MisplacedBlock { block: String, context: &'static str },
}

impl Template {
    /// Whether the template contains any marker blocks.
    pub fn has_blocks(&self) -> bool {
        self.nodes
            .iter()
            .any(|n| matches!(n, Node::Loop { .. } | Node::Conditional { .. }))
    }
}
