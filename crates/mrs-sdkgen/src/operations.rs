//! Operations a generated object exposes, as seen by template conditionals.

use crate::model::{CrudOperation, DbObject, ObjectType};
use std::collections::BTreeSet;
use std::fmt;

/// An operation named by `crud{Op}Only` / `import{Op}Only` template blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
    ReadUnique,
    DeleteUnique,
    ProcedureCall,
    FunctionCall,
    ScriptCall,
    ProcedureTaskRun,
    FunctionTaskRun,
    ScriptTaskRun,
}

impl Operation {
    pub const ALL: [Operation; 12] = [
        Self::Create,
        Self::Read,
        Self::Update,
        Self::Delete,
        Self::ReadUnique,
        Self::DeleteUnique,
        Self::ProcedureCall,
        Self::FunctionCall,
        Self::ScriptCall,
        Self::ProcedureTaskRun,
        Self::FunctionTaskRun,
        Self::ScriptTaskRun,
    ];

    /// The `{Op}` part of a marker name.
    pub fn marker_name(self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Read => "Read",
            Self::Update => "Update",
            Self::Delete => "Delete",
            Self::ReadUnique => "ReadUnique",
            Self::DeleteUnique => "DeleteUnique",
            Self::ProcedureCall => "ProcedureCall",
            Self::FunctionCall => "FunctionCall",
            Self::ScriptCall => "ScriptCall",
            Self::ProcedureTaskRun => "ProcedureTaskRun",
            Self::FunctionTaskRun => "FunctionTaskRun",
            Self::ScriptTaskRun => "ScriptTaskRun",
        }
    }

    pub fn from_marker_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.marker_name() == name)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.marker_name())
    }
}

/// An ordered set of enabled operations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationSet(BTreeSet<Operation>);

impl OperationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, op: Operation) {
        self.0.insert(op);
    }

    pub fn contains(&self, op: Operation) -> bool {
        self.0.contains(&op)
    }

    pub fn extend(&mut self, other: &OperationSet) {
        self.0.extend(other.0.iter().copied());
    }

    pub fn iter(&self) -> impl Iterator<Item = Operation> + '_ {
        self.0.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Operation> for OperationSet {
    fn from_iter<T: IntoIterator<Item = Operation>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for OperationSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.iter().map(Operation::marker_name).collect();
        write!(f, "[{}]", names.join(", "))
    }
}

/// Operations enabled for `db_object`.
///
/// `Update` needs a primary key; the unique variants need at least one
/// unique field.
pub fn object_operations(
    db_object: &DbObject,
    has_primary_key: bool,
    has_unique_fields: bool,
) -> OperationSet {
    let crud = db_object.crud();
    let task = db_object.runs_as_task();
    let mut ops = OperationSet::new();
    match db_object.object_type {
        ObjectType::Table | ObjectType::View => {
            ops.insert(Operation::Read);
            if crud.contains(&CrudOperation::Create) {
                ops.insert(Operation::Create);
            }
            if crud.contains(&CrudOperation::Update) && has_primary_key {
                ops.insert(Operation::Update);
            }
            if crud.contains(&CrudOperation::Delete) {
                ops.insert(Operation::Delete);
            }
            if has_unique_fields {
                ops.insert(Operation::ReadUnique);
                if crud.contains(&CrudOperation::Delete) {
                    ops.insert(Operation::DeleteUnique);
                }
            }
        }
        ObjectType::Procedure if task => ops.insert(Operation::ProcedureTaskRun),
        ObjectType::Procedure => ops.insert(Operation::ProcedureCall),
        ObjectType::Function if task => ops.insert(Operation::FunctionTaskRun),
        ObjectType::Function => ops.insert(Operation::FunctionCall),
        ObjectType::Script if task => ops.insert(Operation::ScriptTaskRun),
        ObjectType::Script => ops.insert(Operation::ScriptCall),
    }
    ops
}
