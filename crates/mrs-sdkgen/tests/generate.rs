//! End-to-end generation against the builtin templates.

use mrs_sdkgen::{
    GenerateError, GenerateOptions, MetadataError, MetadataSource, Schema, Service,
    generate_from_file, generate_service_sdk, get_base_classes,
};
use std::path::{Path, PathBuf};

fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn load_fixture(name: &str) -> Service {
    Service::load(&fixture_path(name)).unwrap()
}

fn seeded() -> GenerateOptions {
    GenerateOptions {
        identifier_seed: Some(42),
        ..Default::default()
    }
}

fn generate(language: &str, options: &GenerateOptions) -> String {
    let service = load_fixture("my_service.json");
    generate_service_sdk(&service, &service, language, options).unwrap()
}

struct Denied;

impl MetadataSource for Denied {
    fn fetch_schemas(&self, _service: &Service) -> Result<Vec<Schema>, MetadataError> {
        Err(MetadataError::new(
            Some(MetadataError::INSUFFICIENT_PRIVILEGE),
            "execute command denied to user",
        ))
    }
}

#[test]
fn typescript_service_sdk() {
    let code = generate("TypeScript", &seeded());

    // Imports follow the enabled operations and required datatypes.
    assert!(code.contains("    type ICreateOptions,\n"));
    assert!(code.contains("    type IUpdateOptions,\n"));
    assert!(code.contains("    type IFindUniqueOptions,\n"));
    assert!(code.contains("    JsonValue,\n"));

    // Service, schema and object classes.
    assert!(code.contains("export class MyService extends MrsBaseService {"));
    assert!(code.contains("public constructor(serviceUrl = \"https://localhost:8443/myService\") {"));
    assert!(code.contains("super(serviceUrl, \"/authentication\", true);"));
    assert!(code.contains("export class MyServiceShop extends MrsBaseSchema {"));
    assert!(code.contains("public get shop(): MyServiceShop {"));
    assert!(code.contains("public get orders(): MyServiceShopOrdersRequest {"));
    assert!(code.contains("export class MyServiceShopOrdersRequest extends MrsBaseObject {"));

    // Table declarations and CRUD methods.
    assert!(code.contains("export interface IMyServiceShopOrdersData extends IMrsResourceData {"));
    assert!(code.contains("update(): Promise<IMyServiceShopOrders>;"));
    assert!(code.contains("public async create(args: ICreateOptions<INewMyServiceShopOrders>)"));
    assert!(code.contains("[String(obj.id)]"));
    assert!(code.contains("public async deleteUnique("));

    // Routines.
    assert!(code.contains(
        "IMrsProcedureResult<ISalesReportParamsOut, IMyServiceShopSalesReportResultSet>"
    ));
    assert!(code.contains("export type IMyServiceShopAddNumbersResult = number;"));
    assert!(code.contains(
        "public async call(params?: IMyServiceShopAddNumbersParams): Promise<IMyServiceShopAddNumbersResult> {"
    ));

    // Script modules are not generated; runtime-only code stays out of packages.
    assert!(!code.contains("/scripts"));
    assert!(!code.contains("mrsAuthenticate"));
    assert!(!code.contains("${"));
}

#[test]
fn nested_types_are_declared_once() {
    let code = generate("typescript", &seeded());
    assert_eq!(
        code.matches("export interface IMyServiceShopOrdersCustomerData {")
            .count(),
        1
    );
    assert!(code.contains("export interface INewMyServiceShopOrdersCustomer {"));
    assert!(code.contains("export interface IUpdateMyServiceShopOrdersCustomer {"));
    let nested = code.find("IMyServiceShopOrdersCustomerData {").unwrap();
    let parent = code.find("IMyServiceShopOrdersData extends").unwrap();
    assert!(nested < parent);
}

#[test]
fn python_service_sdk() {
    let code = generate("python", &seeded());

    assert!(code.starts_with("from __future__ import annotations\n"));
    assert!(code.contains("from .mrs_base_classes import (\n"));
    assert!(code.contains("    Decimal,\n"));
    assert!(code.contains("    IntField,\n"));
    assert!(code.contains("class MyService(MrsBaseService):"));
    assert!(code.contains("metadata_available=True,"));
    assert!(code.contains("self.shop = MyServiceShop(self, \"/shop\")"));
    assert!(code.contains("self.orders = MyServiceShopOrdersRequest(self, \"/orders\")"));
    assert!(code.contains("self.sales_report = MyServiceShopSalesReportRequest(self, \"/salesReport\")"));
    assert!(code.contains("class IMyServiceShopOrders(MrsDocument[IMyServiceShopOrdersData]):"));
    assert!(code.contains("    async def create(self, *, data: INewMyServiceShopOrders) -> IMyServiceShopOrders:"));
    assert!(code.contains(
        "ITaggedSales: TypeAlias = MrsProcedureResultSet[Literal[\"Sales\"], ISales]\n"
    ));
}

#[test]
fn swift_service_sdk() {
    let code = generate("swift", &seeded());

    assert!(code.starts_with("import Foundation\n"));
    assert!(code.contains("public final class MyService: MrsBaseService {"));
    assert!(code.contains("metadataAvailable: true)"));
    assert!(code.contains(
        "public lazy var orders = MyServiceShopOrdersRequest(schema: self, requestPath: \"/orders\")"
    ));
    assert!(code.contains(
        "public final class MyServiceShopOrders: MrsDocument<MyServiceShopOrdersData> {"
    ));
    assert!(code.contains("public func update() async throws -> MyServiceShopOrders {"));
}

#[test]
fn objects_sharing_an_sdk_name_keep_their_own_declarations() {
    let service = Service::from_json_str(
        r#"{
            "id": "svc", "url_context_root": "/svc",
            "schemas": [
                { "id": "sc1", "request_path": "/sakila", "db_objects": [
                    { "id": "o1", "request_path": "/actor", "object_type": "TABLE",
                      "objects": [{ "id": "so1", "name": "Actor", "fields": [
                          { "id": "f1", "name": "actorId",
                            "db_column": { "datatype": "int", "not_null": true, "is_primary": true } },
                          { "id": "f2", "name": "firstName",
                            "db_column": { "datatype": "varchar(45)" } }
                      ]}] }
                ]},
                { "id": "sc2", "request_path": "/movies", "db_objects": [
                    { "id": "o2", "request_path": "/actor", "object_type": "TABLE",
                      "objects": [{ "id": "so2", "name": "Actor", "fields": [
                          { "id": "f3", "name": "imdbId",
                            "db_column": { "datatype": "varchar(12)", "not_null": true, "is_primary": true } },
                          { "id": "f4", "name": "awards",
                            "db_column": { "datatype": "int" } }
                      ]}] }
                ]}
            ]
        }"#,
    )
    .unwrap();
    let code = generate_service_sdk(&service, &service, "typescript", &seeded()).unwrap();

    assert_eq!(code.matches("export interface IActorData extends").count(), 1);
    assert_eq!(code.matches("export interface IActor1Data extends").count(), 1);
    assert_eq!(code.matches("export class ActorRequest ").count(), 1);
    assert_eq!(code.matches("export class Actor1Request ").count(), 1);
    assert!(code.contains("this.document<IActor1>(item, [\"imdbId\"])"));

    let start = code.find("export interface IActor1Data extends").unwrap();
    let end = start + code[start..].find('}').unwrap();
    assert!(code[start..end].contains("imdbId"));
    assert!(code[start..end].contains("awards"));
}

#[test]
fn seeded_generation_is_deterministic() {
    for language in ["typescript", "python", "swift"] {
        assert_eq!(
            generate(language, &seeded()),
            generate(language, &seeded()),
            "{}",
            language
        );
    }
}

#[test]
fn service_url_override() {
    let options = GenerateOptions {
        service_url: Some("https://api.example.com/".into()),
        ..seeded()
    };
    let code = generate("typescript", &options);
    assert!(code.contains("serviceUrl = \"https://api.example.com/myService\""));
}

#[test]
fn insufficient_privilege_generates_an_empty_service() {
    let service = load_fixture("my_service.json");
    let code = generate_service_sdk(&service, &Denied, "python", &seeded()).unwrap();
    assert!(code.contains("class MyService(MrsBaseService):"));
    assert!(code.contains("metadata_available=False,"));
    assert!(!code.contains("MyServiceShop"));
}

#[test]
fn runtime_mode_typescript() {
    let options = GenerateOptions {
        prepare_for_runtime: true,
        ..seeded()
    };
    let code = generate("typescript", &options);
    assert!(!code.contains("import {"));
    assert!(!code.contains("export "));
    assert!(!code.contains("/*"));
    assert!(code.contains("declare function mrsAuthenticate("));
    assert!(code.contains("class MyService extends MrsBaseService {\n"));
    // The orders table requires authentication.
    assert!(code.contains("public static authenticateInteractively"));
    assert!(code.lines().all(|l| !l.is_empty() && l.trim() == l));
}

#[test]
fn runtime_mode_python() {
    let options = GenerateOptions {
        prepare_for_runtime: true,
        ..seeded()
    };
    let code = generate("python", &options);
    assert!(!code.contains("from .mrs_base_classes"));
    assert!(!code.contains("from __future__"));
    assert!(!code.contains("    IntField,\n"));
    assert!(code.contains("class MyService(MrsBaseService):"));
}

#[test]
fn yaml_service_with_task_routine() {
    let options = GenerateOptions {
        prepare_for_runtime: true,
        ..seeded()
    };
    let code = generate_from_file(&fixture_path("tasks_service.yaml"), "ts", &options).unwrap();
    assert!(code.contains("type ITasksJobsRebuildParams = never;"));
    assert!(code.contains("type ITasksJobsRebuildResultSet = JsonObject;"));
    assert!(code.contains("return this.runRoutineTask<"));
    assert!(code.contains("super(serviceUrl, \"/auth\", true);"));
    assert!(!code.contains("authenticateInteractively"));
}

#[test]
fn unsupported_language() {
    let err = generate_from_file(&fixture_path("my_service.json"), "kotlin", &seeded())
        .unwrap_err();
    assert!(matches!(err, GenerateError::Language(_)));
    assert_eq!(
        err.to_string(),
        "The SDK language `kotlin` is not supported. Supported languages: TypeScript, Python, Swift."
    );
}

#[test]
fn base_classes_package_and_runtime() {
    let package = get_base_classes("typescript", false, None).unwrap();
    assert!(package.contains("/* eslint-disable max-classes-per-file */"));
    assert!(package.contains("export class MrsBaseService {"));
    assert!(package.contains("export type MaybeNull<T> = T | null;"));

    let runtime = get_base_classes("typescript", true, None).unwrap();
    assert!(!runtime.contains("eslint-disable"));
    assert!(!runtime.contains("export "));
    assert!(runtime.contains("class MrsBaseService {"));
    // Target-language template literals pass through untouched.
    assert!(runtime.contains("${this.serviceUrl}${path}"));

    let python = get_base_classes("python", true, None).unwrap();
    assert!(python.starts_with("from __future__ import annotations\n"));
    assert!(python.contains("class MrsDocument(Generic[DataT]):"));

    let swift = get_base_classes("swift", false, None).unwrap();
    assert!(swift.contains("open class MrsDocument<Data: Codable> {"));
}
