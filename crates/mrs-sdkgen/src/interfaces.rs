//! Declarations emitted for one database object.
//!
//! Tables and views get a document family (data, create/update shapes,
//! document class, field enums and query helper types). Routines get a
//! parameter type, an `Out` type for procedures, and result types.

use crate::declaration::{
    DataClass, DeclField, DeclarationKind, TypeRef, declaration_name, generate_data_class,
    generate_details_class, generate_enum, generate_type_alias, generate_type_declaration,
    generate_type_declaration_placeholder, generate_union,
};
use crate::identifier::{GenerationScope, IdentifierKind, generate_identifier};
use crate::language::SdkLanguage;
use crate::model::{DbObject, Field, ObjectType, SdkObject, SdkObjectKind};
use crate::operations::{Operation, OperationSet, object_operations};
use crate::reference::{
    FieldEntry, FieldMap, GeneratedTypes, NestedGating, ReferenceError, ReferenceResolver, Shape,
};

/// What the planner knows about an object before its declarations exist.
#[derive(Debug, Clone, Copy)]
pub struct ObjectInput<'a> {
    pub db_object: &'a DbObject,
    /// Class name of the object, unique within its schema.
    pub class_name: &'a str,
    /// Full URL of the object's endpoint.
    pub endpoint: &'a str,
}

/// Declarations of one object plus the names templates refer to.
#[derive(Debug, Clone, Default)]
pub struct ObjectDeclarations {
    pub source: String,
    /// Stem every declaration name is derived from.
    pub class_name: String,
    pub param_interface: String,
    pub out_interface: String,
    pub meta_interface: String,
    pub primary_keys: Vec<String>,
    pub unique_fields: Vec<String>,
    pub operations: OperationSet,
}

/// Build the declarations of `input.db_object`.
///
/// `scope` is the object's identifier scope; field identifiers are drawn
/// from child scopes of it.
pub fn generate_object_declarations(
    input: &ObjectInput<'_>,
    types: &mut GeneratedTypes,
    scope: &mut GenerationScope,
) -> Result<ObjectDeclarations, ReferenceError> {
    match input.db_object.object_type {
        ObjectType::Table | ObjectType::View => table_declarations(input, types, scope),
        ObjectType::Procedure | ObjectType::Function | ObjectType::Script => {
            routine_declarations(input, types, scope)
        }
    }
}

/// Class name of an SDK object: language option, generic option, SDK
/// object name, then `fallback`.
fn sdk_class_name(
    sdk: Option<&SdkObject>,
    language: SdkLanguage,
    fallback: &str,
    scope: &mut GenerationScope,
) -> String {
    let configured = sdk.and_then(|s| {
        s.sdk_options
            .as_ref()
            .and_then(|o| o.class_name_for(language))
            .or(s.name.as_deref())
    });
    generate_identifier(
        configured.unwrap_or(fallback),
        IdentifierKind::Class,
        language,
        scope,
        &[],
    )
}

/// Emit `name` as a declaration of the `keep` entries, or as a placeholder
/// when none qualify.
fn emit_fields(
    types: &mut GeneratedTypes,
    out: &mut String,
    name: &str,
    parents: &[&str],
    map: &FieldMap,
    shape: Shape,
    keep: impl Fn(&FieldEntry) -> bool,
) {
    types.emit(out, name, |t| {
        let lang = t.language();
        let fields = t.fields_where(map, shape, keep);
        if fields.is_empty() && parents.is_empty() {
            generate_type_declaration_placeholder(name, lang)
        } else {
            generate_type_declaration(name, parents, &fields, lang)
        }
    });
}

fn table_declarations(
    input: &ObjectInput<'_>,
    types: &mut GeneratedTypes,
    scope: &mut GenerationScope,
) -> Result<ObjectDeclarations, ReferenceError> {
    let lang = types.language();
    let db_object = input.db_object;
    let sdk = db_object.objects.first();
    let fields = sdk.map(|s| s.fields.as_slice()).unwrap_or_default();
    let stem = types.claim_stem(&sdk_class_name(sdk, lang, input.class_name, scope));

    let has_pk = fields.iter().any(|f| f.enabled && f.is_primary_key());
    let has_unique = fields.iter().any(|f| f.enabled && f.is_unique());
    let operations = object_operations(db_object, has_pk, has_unique);
    let gating = NestedGating {
        create: operations.contains(Operation::Create),
        update: operations.contains(Operation::Update),
    };

    let mut field_scope = scope.child();
    let mut resolver = ReferenceResolver::new(fields, gating, types)
        .with_row_owner(db_object.row_user_ownership_column.as_deref());
    let map = resolver.resolve(&stem, &mut field_scope, |_| true)?;
    let (mut out, nested_paths) = resolver.finish();

    let name = |kind| declaration_name(lang, &stem, kind);
    let data = name(DeclarationKind::Data);

    if lang == SdkLanguage::Python {
        let details = name(DeclarationKind::Details);
        types.emit(&mut out, &details, |t| {
            let fields = t.fields(&map, Shape::Details);
            generate_details_class(&details, &fields, lang)
        });
    }

    let data_parents: &[&str] = match lang {
        SdkLanguage::TypeScript => &["IMrsResourceData"],
        SdkLanguage::Python | SdkLanguage::Swift => &[],
    };
    types.emit(&mut out, &data, |t| {
        let fields = t.fields(&map, Shape::Data);
        generate_type_declaration(&data, data_parents, &fields, lang)
    });

    if gating.create {
        let create = name(DeclarationKind::Create);
        types.emit(&mut out, &create, |t| {
            let fields = t.fields(&map, Shape::Create);
            generate_type_declaration(&create, &[], &fields, lang)
        });
    }
    if gating.update {
        let update = name(DeclarationKind::Update);
        types.emit(&mut out, &update, |t| {
            let fields = t.fields(&map, Shape::Update);
            generate_type_declaration(&update, &[], &fields, lang)
        });
    }

    let primary_keys: Vec<String> = map
        .iter()
        .filter(|e| e.primary_key)
        .map(|e| e.name.clone())
        .collect();
    let unique_fields: Vec<String> = map
        .iter()
        .filter(|e| e.unique)
        .map(|e| e.name.clone())
        .collect();

    let document = name(DeclarationKind::Plain);
    types.emit(&mut out, &document, |t| {
        let fields = t.fields(&map, Shape::Document);
        let class = DataClass {
            name: &document,
            data_type: &data,
            fields: &fields,
            endpoint: input.endpoint,
            primary_key: primary_keys.first().map(String::as_str),
            update: operations.contains(Operation::Update),
            delete: operations.contains(Operation::Delete) && has_pk,
        };
        generate_data_class(&class, lang)
    });

    let field_enum = name(DeclarationKind::Field);
    types.emit(&mut out, &field_enum, |_| {
        generate_enum(&field_enum, &map.names(), lang)
    });
    let nested_enum = name(DeclarationKind::NestedField);
    types.emit(&mut out, &nested_enum, |_| {
        generate_enum(&nested_enum, &nested_paths, lang)
    });

    let helpers: [(DeclarationKind, Shape, fn(&FieldEntry) -> bool); 5] = [
        (DeclarationKind::Selectable, Shape::Selectable, |_| true),
        (DeclarationKind::Sortable, Shape::Sortable, |e| {
            e.sortable && !e.is_nested()
        }),
        (DeclarationKind::Filterable, Shape::Filter, |e| {
            e.filterable && !e.is_nested()
        }),
        (DeclarationKind::UniqueFilterable, Shape::Filter, |e| e.unique),
        (DeclarationKind::Cursors, Shape::Cursor, |e| e.cursor),
    ];
    for (kind, shape, keep) in helpers {
        emit_fields(types, &mut out, &name(kind), &[], &map, shape, keep);
    }

    Ok(ObjectDeclarations {
        source: out,
        class_name: stem.clone(),
        param_interface: String::new(),
        out_interface: String::new(),
        meta_interface: data,
        primary_keys,
        unique_fields,
        operations,
    })
}

fn routine_declarations(
    input: &ObjectInput<'_>,
    types: &mut GeneratedTypes,
    scope: &mut GenerationScope,
) -> Result<ObjectDeclarations, ReferenceError> {
    let lang = types.language();
    let db_object = input.db_object;
    let stem = types.claim_stem(input.class_name);
    let operations = object_operations(db_object, false, false);
    let mut out = String::new();

    let params = db_object
        .objects
        .iter()
        .find(|o| o.kind == SdkObjectKind::Parameters);
    let param_fields = params.map(|p| p.fields.as_slice()).unwrap_or_default();
    let param_stem =
        types.claim_stem(&sdk_class_name(params, lang, &format!("{}Params", stem), scope));

    let param_interface = declaration_name(lang, &param_stem, DeclarationKind::Plain);
    let in_map = resolve_plain(param_fields, &param_stem, types, scope, &mut out, |f| {
        f.is_in_param()
    })?;
    emit_fields(types, &mut out, &param_interface, &[], &in_map, Shape::Plain, |_| true);

    let out_interface = if db_object.object_type == ObjectType::Procedure {
        let name = declaration_name(lang, &param_stem, DeclarationKind::Out);
        let out_map = resolve_plain(param_fields, &param_stem, types, scope, &mut out, |f| {
            f.is_out_param()
        })?;
        emit_fields(types, &mut out, &name, &[], &out_map, Shape::Plain, |_| true);
        name
    } else {
        String::new()
    };

    let results: Vec<&SdkObject> = db_object
        .objects
        .iter()
        .filter(|o| o.kind == SdkObjectKind::Result)
        .collect();
    let result_fallback = format!("{}Result", stem);

    let meta_interface = if db_object.object_type == ObjectType::Procedure {
        let mut tagged = Vec::new();
        for result in &results {
            let result_name = sdk_class_name(Some(result), lang, &result_fallback, scope);
            let result_stem = types.claim_stem(&result_name);
            let row = declaration_name(lang, &result_stem, DeclarationKind::Plain);
            let map = resolve_plain(&result.fields, &result_stem, types, scope, &mut out, |_| true)?;
            emit_fields(types, &mut out, &row, &[], &map, Shape::Plain, |_| true);

            let tag = declaration_name(lang, &result_stem, DeclarationKind::Tagged);
            types.emit(&mut out, &tag, |_| tagged_result_set(&tag, &result_name, &row, lang));
            tagged.push(tag);
        }
        let union = declaration_name(lang, &stem, DeclarationKind::ResultSet);
        types.emit(&mut out, &union, |_| {
            if tagged.is_empty() {
                generate_type_alias(&union, "JsonObject", lang)
            } else {
                generate_union(&union, &tagged, lang)
            }
        });
        union
    } else {
        let result = results.first().copied();
        let result_stem = types.claim_stem(&sdk_class_name(result, lang, &result_fallback, scope));
        let name = declaration_name(lang, &result_stem, DeclarationKind::Plain);
        let result_fields = result.map(|r| r.fields.as_slice()).unwrap_or_default();
        let map = resolve_plain(result_fields, &result_stem, types, scope, &mut out, |_| true)?;
        let single = db_object.object_type == ObjectType::Function && map.len() == 1;
        if single {
            types.emit(&mut out, &name, |t| {
                let fields = t.fields(&map, Shape::Plain);
                let target = fields.first().map(|f| return_type(f, lang)).unwrap_or_default();
                generate_type_alias(&name, &target, lang)
            });
        } else {
            emit_fields(types, &mut out, &name, &[], &map, Shape::Plain, |_| true);
        }
        name
    };

    Ok(ObjectDeclarations {
        source: out,
        class_name: stem,
        param_interface,
        out_interface,
        meta_interface,
        primary_keys: Vec::new(),
        unique_fields: Vec::new(),
        operations,
    })
}

/// Field map of a routine's parameter or result object, in a fresh field
/// scope. Nested declarations it needs are appended to `out`.
fn resolve_plain(
    fields: &[Field],
    stem: &str,
    types: &mut GeneratedTypes,
    scope: &mut GenerationScope,
    out: &mut String,
    keep: impl Fn(&Field) -> bool,
) -> Result<FieldMap, ReferenceError> {
    let mut field_scope = scope.child();
    let mut resolver = ReferenceResolver::new(fields, NestedGating::default(), types);
    let map = resolver.resolve(stem, &mut field_scope, keep)?;
    let (nested, _) = resolver.finish();
    out.push_str(&nested);
    Ok(map)
}

fn return_type(field: &DeclField, language: SdkLanguage) -> String {
    let ty = field.ty.render(language);
    if field.optional && language == SdkLanguage::Swift {
        format!("{}?", ty)
    } else {
        ty
    }
}

fn tagged_result_set(tag: &str, result: &str, row: &str, language: SdkLanguage) -> String {
    match language {
        SdkLanguage::TypeScript => generate_type_declaration(
            tag,
            &["JsonObject"],
            &[
                DeclField::new("type", TypeRef::Single(format!("\"{}\"", result)), false),
                DeclField::new("items", TypeRef::List(row.to_string()), false),
            ],
            language,
        ),
        SdkLanguage::Python => generate_type_alias(
            tag,
            &format!("MrsProcedureResultSet[Literal[\"{}\"], {}]", result, row),
            language,
        ),
        SdkLanguage::Swift => generate_type_declaration(
            tag,
            &[],
            &[
                DeclField::new("type", TypeRef::single("String"), false),
                DeclField::new("items", TypeRef::List(row.to_string()), false),
            ],
            language,
        ),
    }
}
