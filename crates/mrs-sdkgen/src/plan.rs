//! Per-pass view of a service, ready for template rendering.
//!
//! Planning walks the service once, in template order (schemas, then their
//! objects), claiming identifiers and generating declarations as it goes.
//! Rendering then only reads the plan, so a template may loop over the same
//! level several times without claiming names twice.

use crate::identifier::{GenerationScope, IdentifierKind, convert_case, generate_identifier};
use crate::interfaces::{ObjectInput, generate_object_declarations};
use crate::language::SdkLanguage;
use crate::model::{DbObject, Schema, SchemaType, Service};
use crate::operations::OperationSet;
use crate::reference::{GeneratedTypes, ReferenceError};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Base URL used when the caller supplies none.
pub const DEFAULT_SERVICE_URL: &str = "https://localhost:8443";

/// Placeholder values of one template level.
pub type Vars = BTreeMap<&'static str, String>;

#[derive(Debug, Clone, Default)]
pub struct ServicePlan {
    pub vars: Vars,
    pub schemas: Vec<SchemaPlan>,
    /// Operations enabled by at least one object of the service.
    pub operations: OperationSet,
    /// Non-primitive datatypes referenced by any declaration, sorted.
    pub required_datatypes: BTreeSet<String>,
    pub requires_auth: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SchemaPlan {
    pub vars: Vars,
    pub objects: Vec<ObjectPlan>,
    pub requires_auth: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ObjectPlan {
    pub vars: Vars,
    pub operations: OperationSet,
    pub requires_auth: bool,
}

/// Inputs of [`plan_service`].
#[derive(Debug, Clone, Copy)]
pub struct PlanInput<'a> {
    pub service: &'a Service,
    /// Schemas reflected for the service; empty when metadata was unavailable.
    pub schemas: &'a [Schema],
    pub language: SdkLanguage,
    /// Base URL the service is reachable under.
    pub service_url: Option<&'a str>,
    pub metadata_available: bool,
}

/// Full URL of the service: `url_context_root` appended to the base URL,
/// unless the context root already is an absolute URL.
pub fn service_url(base: Option<&str>, url_context_root: &str) -> String {
    if url_context_root.starts_with("http://") || url_context_root.starts_with("https://") {
        return url_context_root.to_string();
    }
    let base = base.unwrap_or(DEFAULT_SERVICE_URL).trim_end_matches('/');
    format!("{}{}", base, url_context_root)
}

fn bool_literal(value: bool, language: SdkLanguage) -> &'static str {
    match (language, value) {
        (SdkLanguage::Python, true) => "True",
        (SdkLanguage::Python, false) => "False",
        (_, true) => "true",
        (_, false) => "false",
    }
}

/// Plan a generation pass. `scope` is the service-level identifier scope.
pub fn plan_service(
    input: &PlanInput<'_>,
    scope: &mut GenerationScope,
) -> Result<ServicePlan, ReferenceError> {
    let lang = input.language;
    let service = input.service;
    let url = service_url(input.service_url, &service.url_context_root);
    debug!(
        service = %service.url_context_root,
        url = %url,
        schemas = input.schemas.len(),
        "planning service"
    );

    let class_name = generate_identifier(
        &service.url_context_root,
        IdentifierKind::Class,
        lang,
        scope,
        &[],
    );
    let mut vars = Vars::new();
    vars.insert("service_id", service.id.clone());
    vars.insert(
        "service_name",
        generate_identifier(
            &service.url_context_root,
            IdentifierKind::Variable,
            lang,
            scope,
            &[],
        ),
    );
    vars.insert("service_class_name", class_name.clone());
    vars.insert("service_url_context_root", service.url_context_root.clone());
    vars.insert("service_url", url.clone());
    vars.insert("service_auth_path", service.auth_path.clone());
    vars.insert(
        "service_metadata_available",
        bool_literal(input.metadata_available, lang).to_string(),
    );

    let mut plan = ServicePlan {
        vars,
        ..Default::default()
    };
    let mut types = GeneratedTypes::new(lang);
    let ctx = ServiceContext {
        language: lang,
        class_name: &class_name,
        url_context_root: &service.url_context_root,
        url: &url,
    };

    for schema in input.schemas {
        if schema.schema_type == SchemaType::ScriptModule {
            debug!(schema = %schema.request_path, "skipping script module schema");
            continue;
        }
        let schema_plan = plan_schema(&ctx, schema, &mut types, scope)?;
        for object in &schema_plan.objects {
            plan.operations.extend(&object.operations);
        }
        plan.requires_auth |= schema_plan.requires_auth;
        plan.schemas.push(schema_plan);
    }
    plan.required_datatypes = types.required_datatypes().clone();
    Ok(plan)
}

struct ServiceContext<'a> {
    language: SdkLanguage,
    class_name: &'a str,
    url_context_root: &'a str,
    url: &'a str,
}

fn plan_schema(
    ctx: &ServiceContext<'_>,
    schema: &Schema,
    types: &mut GeneratedTypes,
    service_scope: &mut GenerationScope,
) -> Result<SchemaPlan, ReferenceError> {
    let lang = ctx.language;
    debug!(schema = %schema.request_path, objects = schema.db_objects.len(), "planning schema");

    let name = generate_identifier(
        &schema.request_path,
        IdentifierKind::Variable,
        lang,
        service_scope,
        &[],
    );
    let class_name = generate_identifier(
        &format!(
            "{}{}",
            ctx.class_name,
            convert_case(&schema.request_path, IdentifierKind::Class, lang)
        ),
        IdentifierKind::Class,
        lang,
        service_scope,
        &[],
    );

    let mut vars = Vars::new();
    vars.insert("schema_id", schema.id.clone());
    vars.insert("schema_name", name);
    vars.insert("schema_class_name", class_name.clone());
    vars.insert("schema_request_path", schema.request_path.clone());

    let mut scope = service_scope.child();
    let mut objects = Vec::with_capacity(schema.db_objects.len());
    for db_object in &schema.db_objects {
        objects.push(plan_object(ctx, schema, &class_name, db_object, types, &mut scope)?);
    }
    let requires_auth = objects.iter().any(|o| o.requires_auth);
    Ok(SchemaPlan {
        vars,
        objects,
        requires_auth,
    })
}

fn plan_object(
    ctx: &ServiceContext<'_>,
    schema: &Schema,
    schema_class_name: &str,
    db_object: &DbObject,
    types: &mut GeneratedTypes,
    schema_scope: &mut GenerationScope,
) -> Result<ObjectPlan, ReferenceError> {
    let lang = ctx.language;
    let name = generate_identifier(
        &db_object.request_path,
        IdentifierKind::Variable,
        lang,
        schema_scope,
        &[],
    );
    let class_name = generate_identifier(
        &format!(
            "{}{}",
            schema_class_name,
            convert_case(&db_object.request_path, IdentifierKind::Class, lang)
        ),
        IdentifierKind::Class,
        lang,
        schema_scope,
        &[],
    );
    let full_request_path = format!(
        "{}{}{}",
        ctx.url_context_root, schema.request_path, db_object.request_path
    );
    let endpoint = format!("{}{}{}", ctx.url, schema.request_path, db_object.request_path);

    let mut scope = schema_scope.child();
    let input = ObjectInput {
        db_object,
        class_name: &class_name,
        endpoint: &endpoint,
    };
    let decls = generate_object_declarations(&input, types, &mut scope)?;
    debug!(
        object = %db_object.request_path,
        object_type = db_object.object_type.as_str(),
        operations = %decls.operations,
        "planned object"
    );

    let pks = &decls.primary_keys;
    let mut vars = Vars::new();
    vars.insert("obj_id", db_object.id.clone());
    vars.insert("obj_name", name);
    vars.insert("obj_class_name", decls.class_name.clone());
    vars.insert("obj_type", db_object.object_type.as_str().to_string());
    vars.insert("obj_request_path", db_object.request_path.clone());
    vars.insert("obj_full_request_path", full_request_path);
    vars.insert("obj_endpoint", endpoint.clone());
    vars.insert("obj_interfaces", decls.source.clone());
    vars.insert("obj_param_interface", decls.param_interface.clone());
    vars.insert("obj_out_interface", decls.out_interface.clone());
    vars.insert("obj_meta_interface", decls.meta_interface.clone());
    vars.insert("obj_pk_list", pks.join(", "));
    vars.insert(
        "obj_quoted_pk_list",
        pks.iter()
            .map(|pk| format!("\"{}\"", pk))
            .collect::<Vec<_>>()
            .join(", "),
    );
    vars.insert(
        "obj_string_pk_list",
        pks.iter()
            .map(|pk| format!("String(obj.{})", pk))
            .collect::<Vec<_>>()
            .join(", "),
    );
    vars.insert(
        "obj_string_args_where_pk_list",
        pks.iter()
            .map(|pk| format!("String(args.where.{})", pk))
            .collect::<Vec<_>>()
            .join(", "),
    );
    vars.insert(
        "obj_primary_key",
        pks.first()
            .map(|pk| format!("\"{}\"", pk))
            .unwrap_or_else(|| lang.null_literal().to_string()),
    );
    vars.insert("obj_unique_list", decls.unique_fields.join(", "));

    Ok(ObjectPlan {
        vars,
        operations: decls.operations,
        requires_auth: db_object.requires_auth,
    })
}
