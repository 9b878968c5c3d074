//! Client SDK generation for MySQL REST Service (MRS) endpoints.
//!
//! Given a service graph (service → schemas → database objects → SDK
//! objects → fields), renders a language template into the source of a
//! typed client SDK for TypeScript, Python or Swift.
//!
//! ```text
//!  Service graph ──► plan ──────────────────────► template::render ──► SDK source
//!                     │                                   ▲
//!                     ├─ identifier (GenerationScope)     │
//!                     ├─ operations (CRUD filter)         │
//!                     └─ interfaces                       │
//!                          ├─ reference (nesting)         │
//!                          ├─ datatype                    │
//!                          └─ declaration      templates (parsed, cached)
//! ```
//!
//! ```no_run
//! use mrs_sdkgen::{GenerateOptions, Service, generate_service_sdk};
//!
//! let service = Service::load(std::path::Path::new("service.json"))?;
//! let code = generate_service_sdk(&service, &service, "typescript", &GenerateOptions::default())?;
//! println!("{}", code);
//! # Ok::<(), mrs_sdkgen::GenerateError>(())
//! ```

pub mod config;
pub mod datatype;
pub mod declaration;
pub mod generator;
pub mod identifier;
pub mod interfaces;
pub mod language;
pub mod model;
pub mod operations;
pub mod plan;
pub mod reference;
pub mod template;
pub mod templates;

pub use config::{ConfigError, SdkGenConfig};
pub use generator::{
    GenerateError, GenerateOptions, MetadataError, MetadataSource, generate_from_file,
    generate_service_sdk, get_base_classes, write_output,
};
pub use identifier::{GenerationScope, IdentifierKind, generate_identifier};
pub use language::{LanguageNotSupportedError, SdkLanguage};
pub use model::{Schema, Service, ServiceParseError};
pub use operations::{Operation, OperationSet};
