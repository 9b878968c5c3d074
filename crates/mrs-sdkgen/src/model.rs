//! Reflected description of a published REST service.
//!
//! The graph is read once per generation pass and never mutated. It is
//! normally produced by reflecting the MySQL REST Service catalog; here it is
//! deserialized from JSON or YAML.
//!
//! ```text
//! Service ─┬─ Schema ─┬─ DbObject ─┬─ SdkObject ─┬─ Field ── DbColumn
//!          │          │            │             └─ Field ── ObjectReference
//!          │          │            └─ SdkObject (PARAMETERS / RESULT)
//!          │          └─ DbObject
//!          └─ Schema (SCRIPT_MODULE, skipped)
//! ```

use crate::language::SdkLanguage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// A published REST service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    /// Root path of the service (e.g., "/myService").
    pub url_context_root: String,
    #[serde(default = "default_auth_path")]
    pub auth_path: String,
    #[serde(default)]
    pub schemas: Vec<Schema>,
}

fn default_auth_path() -> String {
    "/authentication".to_string()
}

/// Error decoding a service graph from text.
#[derive(Debug, thiserror::Error)]
pub enum ServiceParseError {
    #[error("invalid JSON service description: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML service description: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

impl Service {
    pub fn from_json_str(input: &str) -> Result<Self, ServiceParseError> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn from_yaml_str(input: &str) -> Result<Self, ServiceParseError> {
        Ok(serde_yaml::from_str(input)?)
    }

    /// Load a service graph, choosing YAML for `.yaml`/`.yml` files and JSON otherwise.
    pub fn load(path: &Path) -> Result<Self, ServiceParseError> {
        let content = std::fs::read_to_string(path).map_err(|source| ServiceParseError::Io {
            path: path.display().to_string(),
            source,
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml_str(&content),
            _ => Self::from_json_str(&content),
        }
    }
}

/// Kind of a published schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SchemaType {
    #[default]
    DatabaseSchema,
    /// Not supported by the generator yet; skipped.
    ScriptModule,
}

/// An exposed database schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schema {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub request_path: String,
    #[serde(default)]
    pub schema_type: SchemaType,
    #[serde(default)]
    pub db_objects: Vec<DbObject>,
}

/// Type of database object behind an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObjectType {
    Table,
    View,
    Procedure,
    Function,
    Script,
}

impl ObjectType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Table => "TABLE",
            Self::View => "VIEW",
            Self::Procedure => "PROCEDURE",
            Self::Function => "FUNCTION",
            Self::Script => "SCRIPT",
        }
    }

    /// Tables and views expose documents; everything else is a routine.
    pub fn is_routine(self) -> bool {
        matches!(self, Self::Procedure | Self::Function | Self::Script)
    }
}

/// CRUD operation enabled on a database object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CrudOperation {
    Create,
    Read,
    Update,
    Delete,
}

/// Options attached to a database object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DbObjectOptions {
    /// Present when the routine runs as an asynchronous MySQL task.
    #[serde(default, rename = "mysqlTask", skip_serializing_if = "Option::is_none")]
    pub mysql_task: Option<serde_json::Value>,
}

/// An exposed table, view or routine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbObject {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub request_path: String,
    pub object_type: ObjectType,
    #[serde(default)]
    pub crud_operations: BTreeSet<CrudOperation>,
    #[serde(default)]
    pub requires_auth: bool,
    #[serde(default)]
    pub options: DbObjectOptions,
    /// Column that stores the owning user of a row, if row ownership is enforced.
    #[serde(default)]
    pub row_user_ownership_column: Option<String>,
    #[serde(default)]
    pub objects: Vec<SdkObject>,
}

impl DbObject {
    /// The enabled CRUD operations. READ is always part of the set.
    pub fn crud(&self) -> BTreeSet<CrudOperation> {
        let mut ops = self.crud_operations.clone();
        ops.insert(CrudOperation::Read);
        ops
    }

    pub fn runs_as_task(&self) -> bool {
        self.options.mysql_task.is_some()
    }
}

/// Role of an SDK object within its database object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SdkObjectKind {
    /// Input parameters of a routine.
    Parameters,
    /// A result set of a routine, or the single shape of a table/view.
    #[default]
    Result,
}

/// Class-name override for one target language.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageOptions {
    pub language: String,
    #[serde(default)]
    pub class_name: Option<String>,
}

/// User-supplied naming options for an SDK object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SdkOptions {
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub language_options: Vec<LanguageOptions>,
}

impl SdkOptions {
    /// The class name configured for `language`, falling back to the generic one.
    pub fn class_name_for(&self, language: SdkLanguage) -> Option<&str> {
        self.language_options
            .iter()
            .find(|o| o.language.parse::<SdkLanguage>().ok() == Some(language))
            .and_then(|o| o.class_name.as_deref())
            .or(self.class_name.as_deref())
    }
}

/// A field-set view of a database object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SdkObject {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub kind: SdkObjectKind,
    #[serde(default)]
    pub sdk_options: Option<SdkOptions>,
    #[serde(default)]
    pub fields: Vec<Field>,
}

/// Column metadata behind a scalar field or routine parameter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DbColumn {
    #[serde(default)]
    pub name: String,
    pub datatype: String,
    #[serde(default)]
    pub not_null: Option<bool>,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub is_unique: bool,
    #[serde(default)]
    pub is_generated: bool,
    #[serde(default)]
    pub id_generation: Option<String>,
    #[serde(default)]
    pub column_default: Option<serde_json::Value>,
    #[serde(default, rename = "in")]
    pub is_in: bool,
    #[serde(default, rename = "out")]
    pub is_out: bool,
}

impl DbColumn {
    /// Unknown nullability counts as nullable.
    pub fn is_nullable(&self) -> bool {
        self.not_null != Some(true)
    }

    fn has_default(&self) -> bool {
        matches!(&self.column_default, Some(v) if !v.is_null())
    }
}

/// Cardinality of a reference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferenceKind {
    #[default]
    #[serde(rename = "1:1")]
    OneToOne,
    #[serde(rename = "1:n")]
    OneToMany,
}

/// How a reference maps onto the referenced object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceMapping {
    #[serde(default)]
    pub kind: ReferenceKind,
    #[serde(default)]
    pub to_many: bool,
}

/// Foreign-key shaped link from a field to another object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectReference {
    #[serde(default)]
    pub reference_mapping: ReferenceMapping,
    /// Flatten the referenced fields into the parent.
    #[serde(default)]
    pub unnest: bool,
    /// Collapse the referenced object to the value of one of its fields.
    #[serde(default)]
    pub reduce_to_value_of_field_id: Option<String>,
}

impl ObjectReference {
    pub fn to_many(&self) -> bool {
        self.reference_mapping.to_many || self.reference_mapping.kind == ReferenceKind::OneToMany
    }
}

/// A field of an SDK object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Field {
    pub id: String,
    pub name: String,
    /// Nesting depth within the SDK object; 1 is the top level.
    #[serde(default = "default_lev")]
    pub lev: u32,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub allow_filtering: bool,
    #[serde(default)]
    pub allow_sorting: bool,
    #[serde(default)]
    pub db_column: Option<DbColumn>,
    #[serde(default)]
    pub represents_reference_id: Option<String>,
    #[serde(default)]
    pub parent_reference_id: Option<String>,
    #[serde(default)]
    pub object_reference: Option<ObjectReference>,
}

fn default_lev() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

impl Field {
    pub fn is_top_level(&self) -> bool {
        self.lev == 1
    }

    /// The reference this field stands for, if it is a reference field.
    pub fn reference(&self) -> Option<&ObjectReference> {
        self.represents_reference_id
            .as_ref()
            .and(self.object_reference.as_ref())
    }

    pub fn is_reference(&self) -> bool {
        self.represents_reference_id.is_some()
    }

    pub fn is_primary_key(&self) -> bool {
        self.is_top_level() && self.db_column.as_ref().is_some_and(|c| c.is_primary)
    }

    pub fn is_unique(&self) -> bool {
        self.is_top_level()
            && self
                .db_column
                .as_ref()
                .is_some_and(|c| c.is_primary || c.is_unique)
    }

    /// Whether a value must be supplied when creating a record.
    pub fn is_required_on_create(&self) -> bool {
        self.db_column.as_ref().is_some_and(|c| {
            !c.is_nullable() && !c.is_generated && c.id_generation.is_none() && !c.has_default()
        })
    }

    /// Monotonic columns usable for cursor-based pagination.
    pub fn can_be_cursor(&self) -> bool {
        if !self.is_top_level() {
            return false;
        }
        let Some(column) = &self.db_column else {
            return false;
        };
        if column.id_generation.is_some() {
            return true;
        }
        let datatype = column.datatype.to_ascii_lowercase();
        datatype.starts_with("timestamp") || datatype.starts_with("datetime")
    }

    pub fn is_in_param(&self) -> bool {
        self.db_column
            .as_ref()
            .is_some_and(|c| c.is_in || !c.is_out)
    }

    pub fn is_out_param(&self) -> bool {
        self.db_column.as_ref().is_some_and(|c| c.is_out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field(value: serde_json::Value) -> Field {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn cursor_requires_top_level_column() {
        let mut f = field(json!({ "id": "1", "name": "a", "lev": 0 }));
        assert!(!f.can_be_cursor());
        f.lev = 1;
        assert!(!f.can_be_cursor());

        f.db_column = Some(DbColumn {
            datatype: "int".into(),
            id_generation: Some("auto_inc".into()),
            ..Default::default()
        });
        assert!(f.can_be_cursor());

        f.db_column = Some(DbColumn {
            datatype: "timestamp".into(),
            ..Default::default()
        });
        assert!(f.can_be_cursor());
    }

    #[test]
    fn key_sets_only_consider_top_level() {
        let pk = field(json!({
            "id": "1", "name": "id",
            "db_column": { "datatype": "int", "is_primary": true, "not_null": true }
        }));
        assert!(pk.is_primary_key());
        assert!(pk.is_unique());

        let nested_pk = field(json!({
            "id": "2", "name": "id", "lev": 2,
            "db_column": { "datatype": "int", "is_primary": true }
        }));
        assert!(!nested_pk.is_primary_key());
        assert!(!nested_pk.is_unique());
    }

    #[test]
    fn required_on_create() {
        let f = field(json!({
            "id": "1", "name": "title",
            "db_column": { "datatype": "varchar(20)", "not_null": true }
        }));
        assert!(f.is_required_on_create());

        let generated = field(json!({
            "id": "2", "name": "id",
            "db_column": { "datatype": "int", "not_null": true, "id_generation": "auto_inc" }
        }));
        assert!(!generated.is_required_on_create());

        let defaulted = field(json!({
            "id": "3", "name": "status",
            "db_column": { "datatype": "int", "not_null": true, "column_default": "1" }
        }));
        assert!(!defaulted.is_required_on_create());

        let unresolved = field(json!({
            "id": "4", "name": "note",
            "db_column": { "datatype": "text" }
        }));
        assert!(!unresolved.is_required_on_create());
    }

    #[test]
    fn read_is_always_enabled() {
        let obj: DbObject = serde_json::from_value(json!({
            "id": "o", "request_path": "/t", "object_type": "TABLE",
            "crud_operations": ["UPDATE"]
        }))
        .unwrap();
        assert!(obj.crud().contains(&CrudOperation::Read));
        assert!(obj.crud().contains(&CrudOperation::Update));
    }

    #[test]
    fn language_class_name_wins() {
        let opts = SdkOptions {
            class_name: Some("Generic".into()),
            language_options: vec![LanguageOptions {
                language: "Python".into(),
                class_name: Some("PyName".into()),
            }],
        };
        assert_eq!(opts.class_name_for(SdkLanguage::Python), Some("PyName"));
        assert_eq!(opts.class_name_for(SdkLanguage::Swift), Some("Generic"));
    }

    #[test]
    fn load_yaml_service() {
        let service = Service::from_yaml_str(
            "id: s1\nurl_context_root: /myService\nschemas:\n  - id: sc1\n    request_path: /shop\n",
        )
        .unwrap();
        assert_eq!(service.auth_path, "/authentication");
        assert_eq!(service.schemas[0].schema_type, SchemaType::DatabaseSchema);
    }
}
