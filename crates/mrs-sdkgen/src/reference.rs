//! Expansion of reference fields into nested, unnested or reduced types.
//!
//! A [`ReferenceResolver`] walks one SDK object's flat field list and builds
//! the [`FieldMap`] of its top-level interface. Reference fields are handled
//! in three ways:
//!
//! - **reduced**: the field takes the scalar type of one referenced field;
//! - **unnested**: the referenced fields are spliced into the parent;
//! - **nested**: a `{Parent}{Field}` type family is declared and the field
//!   points at it.
//!
//! Declarations emitted along the way are deduplicated through
//! [`GeneratedTypes`], which lives for the whole generation pass.

use crate::datatype::{datatype_is_primitive, enhance, map_base_datatype, wrap_nullable};
use crate::declaration::{
    DeclField, DeclarationKind, TypeRef, declaration_name, generate_type_declaration,
};
use crate::identifier::{GenerationScope, IdentifierKind, convert_case, generate_identifier};
use crate::language::SdkLanguage;
use crate::model::{Field, ObjectReference};
use std::collections::BTreeSet;
use tracing::trace;

/// A reference field that cannot be turned into a type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReferenceError {
    #[error("field `{field}` is reduced to field id `{target}`, which does not exist")]
    UnknownReducedField { field: String, target: String },

    #[error(
        "field `{field}` is reduced to `{target}`, which has no scalar value (reducing to a reference is not supported)"
    )]
    UnsupportedReduction { field: String, target: String },
}

/// Type of one field map entry before it is rendered for a declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryType {
    /// Column value; the mapped type without nullable wrapping.
    Scalar(String),
    /// Reference collapsed to one referenced column's value.
    Reduced { base: String, to_many: bool },
    /// Reference to a nested type family.
    Nested { stem: String, to_many: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldEntry {
    /// Identifier in the target language.
    pub name: String,
    pub ty: EntryType,
    pub nullable: bool,
    pub primary_key: bool,
    pub unique: bool,
    pub required_on_create: bool,
    pub filterable: bool,
    pub sortable: bool,
    pub cursor: bool,
    /// Stores the owning user of the row.
    pub row_owner: bool,
}

impl FieldEntry {
    pub fn is_reference(&self) -> bool {
        !matches!(self.ty, EntryType::Scalar(_))
    }

    pub fn is_nested(&self) -> bool {
        matches!(self.ty, EntryType::Nested { .. })
    }
}

/// Ordered fields of one interface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    entries: Vec<FieldEntry>,
}

impl FieldMap {
    pub fn push(&mut self, entry: FieldEntry) {
        self.entries.push(entry);
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&FieldEntry> {
        self.entries.iter().find(|e| e.name == name)
    }
}

/// Which declaration a field map is being rendered into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Plain data: every field optional.
    Data,
    /// Creatable shape: fields without a value source are required.
    Create,
    /// Updatable shape: nullable, owner and reference fields are optional.
    Update,
    /// Python details class.
    Details,
    /// Document attributes (Python wrapper-field types).
    Document,
    /// Routine parameters and result rows: optional iff nullable.
    Plain,
    Filter,
    Cursor,
    Selectable,
    Sortable,
}

impl Shape {
    fn enhanced(self) -> bool {
        matches!(self, Shape::Document | Shape::Cursor)
    }

    fn optional(self, entry: &FieldEntry) -> bool {
        match self {
            Shape::Data | Shape::Filter | Shape::Cursor | Shape::Selectable | Shape::Sortable => {
                true
            }
            Shape::Create => !entry.required_on_create,
            Shape::Update => entry.nullable || entry.row_owner || entry.is_reference(),
            Shape::Details | Shape::Document => false,
            Shape::Plain => entry.nullable,
        }
    }
}

/// Declarations and datatypes accumulated over one generation pass.
#[derive(Debug)]
pub struct GeneratedTypes {
    language: SdkLanguage,
    aliases: BTreeSet<String>,
    /// Stems of top-level declaration families, one per object or routine part.
    stems: BTreeSet<String>,
    required_datatypes: BTreeSet<String>,
}

impl GeneratedTypes {
    pub fn new(language: SdkLanguage) -> Self {
        Self {
            language,
            aliases: BTreeSet::new(),
            stems: BTreeSet::new(),
            required_datatypes: BTreeSet::new(),
        }
    }

    pub fn language(&self) -> SdkLanguage {
        self.language
    }

    /// Append the declaration of `name` to `out` unless it was emitted
    /// earlier in the pass. Returns whether anything was appended.
    pub fn emit(
        &mut self,
        out: &mut String,
        name: &str,
        source: impl FnOnce(&mut Self) -> String,
    ) -> bool {
        if !self.aliases.insert(name.to_string()) {
            trace!(alias = name, "declaration already emitted");
            return false;
        }
        let text = source(self);
        out.push_str(&text);
        true
    }

    /// Reserve `stem` for one declaration family. A stem another object
    /// already holds gets the next free numeric suffix, so unrelated objects
    /// never share declarations.
    pub fn claim_stem(&mut self, stem: &str) -> String {
        let mut name = stem.to_string();
        let mut suffix = 0;
        while !self.stems.insert(name.clone()) {
            suffix += 1;
            name = format!("{}{}", stem, suffix);
        }
        if suffix > 0 {
            trace!(stem, name = %name, "stem already claimed");
        }
        name
    }

    pub fn is_emitted(&self, name: &str) -> bool {
        self.aliases.contains(name)
    }

    /// Record a datatype the generated code needs imported.
    pub fn require(&mut self, datatype: &str) {
        if !datatype_is_primitive(datatype, self.language) {
            self.required_datatypes.insert(datatype.to_string());
        }
    }

    pub fn required_datatypes(&self) -> &BTreeSet<String> {
        &self.required_datatypes
    }

    /// Render every entry of `map` for `shape`.
    pub fn fields(&mut self, map: &FieldMap, shape: Shape) -> Vec<DeclField> {
        self.fields_where(map, shape, |_| true)
    }

    /// Render the entries of `map` accepted by `keep` for `shape`.
    pub fn fields_where(
        &mut self,
        map: &FieldMap,
        shape: Shape,
        keep: impl Fn(&FieldEntry) -> bool,
    ) -> Vec<DeclField> {
        map.iter()
            .filter(|e| keep(e))
            .map(|e| DeclField::new(e.name.clone(), self.entry_type(e, shape), shape.optional(e)))
            .collect()
    }

    fn entry_type(&mut self, entry: &FieldEntry, shape: Shape) -> TypeRef {
        let lang = self.language;
        match shape {
            Shape::Selectable => {
                let ty = match lang {
                    SdkLanguage::TypeScript => "boolean",
                    SdkLanguage::Python => "bool",
                    SdkLanguage::Swift => "Bool",
                };
                return TypeRef::single(ty);
            }
            Shape::Sortable => return TypeRef::single("Order"),
            _ => {}
        }
        match &entry.ty {
            EntryType::Scalar(base) => TypeRef::Single(self.value_type(base, entry.nullable, shape)),
            EntryType::Reduced { base, to_many } => {
                let ty = self.value_type(base, entry.nullable, shape);
                if *to_many {
                    TypeRef::List(ty)
                } else {
                    TypeRef::Single(ty)
                }
            }
            EntryType::Nested { stem, to_many } => {
                let kind = match shape {
                    Shape::Create => DeclarationKind::Create,
                    Shape::Update => DeclarationKind::Update,
                    _ => DeclarationKind::Data,
                };
                let name = declaration_name(lang, stem, kind);
                if *to_many {
                    TypeRef::List(name)
                } else {
                    TypeRef::Single(name)
                }
            }
        }
    }

    fn value_type(&mut self, base: &str, nullable: bool, shape: Shape) -> String {
        let ty = if shape.enhanced() {
            enhance(base, self.language)
        } else {
            base.to_string()
        };
        self.require(&ty);
        if nullable {
            wrap_nullable(&ty, self.language)
        } else {
            ty
        }
    }
}

/// Which variants a nested type family gets, mirroring its top-level object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NestedGating {
    pub create: bool,
    pub update: bool,
}

/// Builds field maps for the interfaces of one SDK object.
pub struct ReferenceResolver<'a> {
    fields: &'a [Field],
    gating: NestedGating,
    row_owner: Option<&'a str>,
    types: &'a mut GeneratedTypes,
    declarations: String,
    nested_paths: Vec<String>,
}

impl<'a> ReferenceResolver<'a> {
    pub fn new(fields: &'a [Field], gating: NestedGating, types: &'a mut GeneratedTypes) -> Self {
        Self {
            fields,
            gating,
            row_owner: None,
            types,
            declarations: String::new(),
            nested_paths: Vec::new(),
        }
    }

    /// Mark the field backed by `column` as the row-ownership field.
    pub fn with_row_owner(mut self, column: Option<&'a str>) -> Self {
        self.row_owner = column;
        self
    }

    /// Field map of the top-level interface `stem`, keeping the fields
    /// accepted by `keep`.
    pub fn resolve(
        &mut self,
        stem: &str,
        scope: &mut GenerationScope,
        keep: impl Fn(&Field) -> bool,
    ) -> Result<FieldMap, ReferenceError> {
        let fields = self.fields;
        let mut map = FieldMap::default();
        for field in fields
            .iter()
            .filter(|f| f.is_top_level() && f.enabled && keep(f))
        {
            self.add_field(field, stem, "", &mut map, scope)?;
        }
        Ok(map)
    }

    /// Nested declarations emitted so far, innermost first.
    pub fn declarations(&self) -> &str {
        &self.declarations
    }

    /// Every reachable nested path (`customer`, `customer.address`, ...).
    pub fn nested_paths(&self) -> &[String] {
        &self.nested_paths
    }

    /// Consume the resolver, returning its declarations and nested paths.
    pub fn finish(self) -> (String, Vec<String>) {
        (self.declarations, self.nested_paths)
    }

    fn language(&self) -> SdkLanguage {
        self.types.language()
    }

    fn add_field(
        &mut self,
        field: &'a Field,
        stem: &str,
        path: &str,
        map: &mut FieldMap,
        scope: &mut GenerationScope,
    ) -> Result<(), ReferenceError> {
        match field.reference() {
            Some(reference) => self.add_reference(field, reference, stem, path, map, scope),
            None => {
                if let Some(entry) = self.scalar_entry(field, scope) {
                    map.push(entry);
                }
                Ok(())
            }
        }
    }

    fn scalar_entry(&self, field: &Field, scope: &mut GenerationScope) -> Option<FieldEntry> {
        let column = field.db_column.as_ref()?;
        let lang = self.language();
        Some(FieldEntry {
            name: generate_identifier(&field.name, IdentifierKind::Variable, lang, scope, &[]),
            ty: EntryType::Scalar(map_base_datatype(&column.datatype, lang).to_string()),
            nullable: column.is_nullable(),
            primary_key: field.is_primary_key(),
            unique: field.is_unique(),
            required_on_create: field.is_required_on_create(),
            filterable: field.allow_filtering,
            sortable: field.allow_sorting,
            cursor: field.can_be_cursor(),
            row_owner: self.row_owner.is_some_and(|owner| owner == column.name),
        })
    }

    fn children(&self, reference_field: &Field) -> Vec<&'a Field> {
        let fields = self.fields;
        fields
            .iter()
            .filter(|f| {
                f.enabled
                    && f.parent_reference_id.is_some()
                    && f.parent_reference_id == reference_field.represents_reference_id
            })
            .collect()
    }

    fn add_reference(
        &mut self,
        field: &'a Field,
        reference: &ObjectReference,
        stem: &str,
        path: &str,
        map: &mut FieldMap,
        scope: &mut GenerationScope,
    ) -> Result<(), ReferenceError> {
        let lang = self.language();
        let to_many = reference.to_many();

        if let Some(target_id) = &reference.reduce_to_value_of_field_id {
            let target = self.fields.iter().find(|f| &f.id == target_id).ok_or_else(|| {
                ReferenceError::UnknownReducedField {
                    field: field.name.clone(),
                    target: target_id.clone(),
                }
            })?;
            let column = match &target.db_column {
                Some(column) if !target.is_reference() => column,
                _ => {
                    return Err(ReferenceError::UnsupportedReduction {
                        field: field.name.clone(),
                        target: target.name.clone(),
                    });
                }
            };
            map.push(FieldEntry {
                name: generate_identifier(&field.name, IdentifierKind::Variable, lang, scope, &[]),
                ty: EntryType::Reduced {
                    base: map_base_datatype(&column.datatype, lang).to_string(),
                    to_many,
                },
                nullable: column.is_nullable(),
                primary_key: false,
                unique: false,
                required_on_create: false,
                filterable: field.allow_filtering,
                sortable: false,
                cursor: false,
                row_owner: false,
            });
            return Ok(());
        }

        let child_stem = format!(
            "{}{}",
            stem,
            convert_case(&field.name, IdentifierKind::Class, lang)
        );

        if reference.unnest {
            for child in self.children(field) {
                self.add_field(child, &child_stem, path, map, scope)?;
            }
            return Ok(());
        }

        let name = generate_identifier(&field.name, IdentifierKind::Variable, lang, scope, &[]);
        let child_path = if path.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", path, name)
        };
        self.nested_paths.push(child_path.clone());

        let mut child_scope = scope.child();
        let mut child_map = FieldMap::default();
        for child in self.children(field) {
            self.add_field(child, &child_stem, &child_path, &mut child_map, &mut child_scope)?;
        }
        self.emit_nested(&child_stem, &child_map);

        map.push(FieldEntry {
            name,
            ty: EntryType::Nested {
                stem: child_stem,
                to_many,
            },
            nullable: !to_many,
            primary_key: false,
            unique: false,
            required_on_create: false,
            filterable: false,
            sortable: false,
            cursor: false,
            row_owner: false,
        });
        Ok(())
    }

    fn emit_nested(&mut self, stem: &str, map: &FieldMap) {
        let lang = self.language();
        let mut variants = vec![(DeclarationKind::Data, Shape::Data)];
        if self.gating.create {
            variants.push((DeclarationKind::Create, Shape::Create));
        }
        if self.gating.update {
            variants.push((DeclarationKind::Update, Shape::Update));
        }
        for (kind, shape) in variants {
            let name = declaration_name(lang, stem, kind);
            let emitted = self.types.emit(&mut self.declarations, &name, |types| {
                let fields = types.fields(map, shape);
                generate_type_declaration(&name, &[], &fields, lang)
            });
            if emitted {
                trace!(name = %name, fields = map.len(), "emitted nested type");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: serde_json::Value) -> Vec<Field> {
        serde_json::from_value(value).unwrap()
    }

    /// `orders` with a nested `customer` reference that itself nests `address`.
    fn orders_fields() -> Vec<Field> {
        fields(json!([
            { "id": "f1", "name": "id",
              "db_column": { "name": "id", "datatype": "int", "not_null": true, "is_primary": true } },
            { "id": "f2", "name": "total",
              "db_column": { "name": "total", "datatype": "decimal(10,2)", "not_null": true } },
            { "id": "f3", "name": "customer", "represents_reference_id": "r1",
              "object_reference": { "reference_mapping": { "kind": "1:1" } } },
            { "id": "f4", "name": "name", "lev": 2, "parent_reference_id": "r1",
              "db_column": { "name": "name", "datatype": "varchar(40)" } },
            { "id": "f5", "name": "address", "lev": 2, "parent_reference_id": "r1",
              "represents_reference_id": "r2",
              "object_reference": { "reference_mapping": { "kind": "1:1" } } },
            { "id": "f6", "name": "city", "lev": 3, "parent_reference_id": "r2",
              "db_column": { "name": "city", "datatype": "varchar(40)", "not_null": true } }
        ]))
    }

    fn resolve(
        fields: &[Field],
        language: SdkLanguage,
        gating: NestedGating,
    ) -> (Result<FieldMap, ReferenceError>, String, Vec<String>) {
        let mut types = GeneratedTypes::new(language);
        let mut resolver = ReferenceResolver::new(fields, gating, &mut types);
        let map = resolver.resolve("Orders", &mut GenerationScope::with_seed(0), |_| true);
        let (decls, paths) = resolver.finish();
        (map, decls, paths)
    }

    #[test]
    fn nested_reference_emits_family_innermost_first() {
        let fields = orders_fields();
        let gating = NestedGating {
            create: false,
            update: true,
        };
        let (map, decls, paths) = resolve(&fields, SdkLanguage::TypeScript, gating);
        let map = map.unwrap();

        assert_eq!(map.names(), vec!["id", "total", "customer"]);
        assert_eq!(
            map.get("customer").map(|e| &e.ty),
            Some(&EntryType::Nested {
                stem: "OrdersCustomer".into(),
                to_many: false
            })
        );
        assert_eq!(paths, vec!["customer", "customer.address"]);

        let address = decls.find("export interface IOrdersCustomerAddressData {").unwrap();
        let customer = decls.find("export interface IOrdersCustomerData {").unwrap();
        assert!(address < customer);
        assert!(decls.contains("export interface IUpdateOrdersCustomer {"));
        assert!(!decls.contains("INewOrdersCustomer"));
        assert!(decls.contains("    address?: IOrdersCustomerAddressData,\n"));
    }

    #[test]
    fn unnested_fields_join_the_parent() {
        let fields = fields(json!([
            { "id": "f1", "name": "id",
              "db_column": { "name": "id", "datatype": "int", "not_null": true } },
            { "id": "f2", "name": "customer", "represents_reference_id": "r1",
              "object_reference": { "unnest": true } },
            { "id": "f3", "name": "id", "lev": 2, "parent_reference_id": "r1",
              "db_column": { "name": "id", "datatype": "int" } },
            { "id": "f4", "name": "first_name", "lev": 2, "parent_reference_id": "r1",
              "db_column": { "name": "first_name", "datatype": "varchar(20)" } }
        ]));
        let (map, decls, paths) = resolve(&fields, SdkLanguage::TypeScript, NestedGating::default());
        // The spliced `id` shares the parent's scope and gets a suffix.
        assert_eq!(map.unwrap().names(), vec!["id", "id1", "firstName"]);
        assert!(decls.is_empty());
        assert!(paths.is_empty());
    }

    #[test]
    fn reduced_reference_takes_target_type() {
        let fields = fields(json!([
            { "id": "f1", "name": "tags", "represents_reference_id": "r1",
              "object_reference": {
                  "reference_mapping": { "kind": "1:n", "to_many": true },
                  "reduce_to_value_of_field_id": "f2" } },
            { "id": "f2", "name": "label", "lev": 2, "parent_reference_id": "r1",
              "db_column": { "name": "label", "datatype": "varchar(10)", "not_null": true } }
        ]));
        let (map, decls, _) = resolve(&fields, SdkLanguage::Python, NestedGating::default());
        let map = map.unwrap();
        assert_eq!(
            map.get("tags").map(|e| &e.ty),
            Some(&EntryType::Reduced {
                base: "str".into(),
                to_many: true
            })
        );
        assert!(decls.is_empty());

        let mut types = GeneratedTypes::new(SdkLanguage::Python);
        let rendered = types.fields(&map, Shape::Data);
        assert_eq!(rendered[0].ty, TypeRef::List("str".into()));
    }

    #[test]
    fn reduction_errors() {
        let unknown = fields(json!([
            { "id": "f1", "name": "tags", "represents_reference_id": "r1",
              "object_reference": { "reduce_to_value_of_field_id": "missing" } }
        ]));
        let (map, _, _) = resolve(&unknown, SdkLanguage::TypeScript, NestedGating::default());
        assert_eq!(
            map.unwrap_err(),
            ReferenceError::UnknownReducedField {
                field: "tags".into(),
                target: "missing".into()
            }
        );

        let to_reference = fields(json!([
            { "id": "f1", "name": "owner", "represents_reference_id": "r1",
              "object_reference": { "reduce_to_value_of_field_id": "f2" } },
            { "id": "f2", "name": "account", "lev": 2, "parent_reference_id": "r1",
              "represents_reference_id": "r2", "object_reference": {} }
        ]));
        let (map, _, _) = resolve(&to_reference, SdkLanguage::TypeScript, NestedGating::default());
        assert!(matches!(
            map.unwrap_err(),
            ReferenceError::UnsupportedReduction { .. }
        ));
    }

    #[test]
    fn shared_aliases_suppress_duplicates() {
        let fields = orders_fields();
        let mut types = GeneratedTypes::new(SdkLanguage::Python);
        let gating = NestedGating::default();

        let mut first = ReferenceResolver::new(&fields, gating, &mut types);
        first
            .resolve("Orders", &mut GenerationScope::with_seed(0), |_| true)
            .unwrap();
        let (first_decls, _) = first.finish();

        let mut second = ReferenceResolver::new(&fields, gating, &mut types);
        second
            .resolve("Orders", &mut GenerationScope::with_seed(0), |_| true)
            .unwrap();
        let (second_decls, _) = second.finish();

        assert_eq!(first_decls.matches("class IOrdersCustomerData(").count(), 1);
        assert!(second_decls.is_empty());
        assert!(types.is_emitted("IOrdersCustomerAddressData"));
    }

    #[test]
    fn update_shape_optionality() {
        let fields = orders_fields();
        let mut types = GeneratedTypes::new(SdkLanguage::TypeScript);
        let mut resolver = ReferenceResolver::new(&fields, NestedGating::default(), &mut types);
        let map = resolver
            .resolve("Orders", &mut GenerationScope::with_seed(0), |_| true)
            .unwrap();
        drop(resolver);

        let update = types.fields(&map, Shape::Update);
        let optional: Vec<_> = update.iter().map(|f| (f.name.as_str(), f.optional)).collect();
        assert_eq!(optional, vec![("id", false), ("total", false), ("customer", true)]);
        assert_eq!(update[2].ty, TypeRef::single("IUpdateOrdersCustomer"));
    }

    #[test]
    fn required_datatypes_skip_primitives() {
        let fields = fields(json!([
            { "id": "f1", "name": "location",
              "db_column": { "name": "location", "datatype": "point" } },
            { "id": "f2", "name": "count",
              "db_column": { "name": "count", "datatype": "int" } }
        ]));
        let mut types = GeneratedTypes::new(SdkLanguage::TypeScript);
        let mut resolver = ReferenceResolver::new(&fields, NestedGating::default(), &mut types);
        let map = resolver
            .resolve("Places", &mut GenerationScope::with_seed(0), |_| true)
            .unwrap();
        drop(resolver);
        let rendered = types.fields(&map, Shape::Data);
        assert_eq!(rendered[0].ty, TypeRef::single("MaybeNull<Point>"));
        assert_eq!(
            types.required_datatypes().iter().collect::<Vec<_>>(),
            vec!["Point"]
        );
    }

    #[test]
    fn stems_are_unique_per_pass() {
        let mut types = GeneratedTypes::new(SdkLanguage::TypeScript);
        assert_eq!(types.claim_stem("Actor"), "Actor");
        assert_eq!(types.claim_stem("Actor"), "Actor1");
        assert_eq!(types.claim_stem("Actor1"), "Actor11");
        assert_eq!(types.claim_stem("Actor"), "Actor2");
    }
}
