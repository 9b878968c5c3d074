//! Entry points: generate a service SDK or fetch the base classes.

use crate::identifier::GenerationScope;
use crate::language::{LanguageNotSupportedError, SdkLanguage};
use crate::model::{Schema, Service, ServiceParseError};
use crate::plan::{PlanInput, plan_service};
use crate::reference::ReferenceError;
use crate::template::{OutputMode, TemplateError, prepare_for_runtime, render, render_static, strip_exports};
use crate::templates::{TemplateLoadError, TemplateSet};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Failure reported by a [`MetadataSource`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}{}", .code.map(|c| format!(" (error {})", c)).unwrap_or_default())]
pub struct MetadataError {
    /// Database error code, when the failure came from the server.
    pub code: Option<u32>,
    pub message: String,
}

impl MetadataError {
    /// The account may not execute the catalog-reflection routines.
    pub const INSUFFICIENT_PRIVILEGE: u32 = 1370;

    pub fn new(code: Option<u32>, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn is_insufficient_privilege(&self) -> bool {
        self.code == Some(Self::INSUFFICIENT_PRIVILEGE)
    }
}

/// Where the reflected schemas of a service come from.
pub trait MetadataSource {
    fn fetch_schemas(&self, service: &Service) -> Result<Vec<Schema>, MetadataError>;
}

/// A service description that already carries its schemas.
impl MetadataSource for Service {
    fn fetch_schemas(&self, _service: &Service) -> Result<Vec<Schema>, MetadataError> {
        Ok(self.schemas.clone())
    }
}

/// Any error [`generate_service_sdk`] or [`get_base_classes`] can return.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error(transparent)]
    Language(#[from] LanguageNotSupportedError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    TemplateLoad(#[from] TemplateLoadError),

    #[error("failed to retrieve service metadata: {0}")]
    Metadata(#[from] MetadataError),

    #[error(transparent)]
    Reference(#[from] ReferenceError),

    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Parse(#[from] ServiceParseError),
}

/// Knobs of a generation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Produce a single import-free blob instead of package sources.
    pub prepare_for_runtime: bool,
    /// Base URL of the service; `https://localhost:8443` when unset.
    pub service_url: Option<String>,
    /// Seed for the random identifier fallback; OS entropy when unset.
    pub identifier_seed: Option<u64>,
    /// Directory overriding the builtin templates.
    pub template_dir: Option<PathBuf>,
}

impl GenerateOptions {
    fn mode(&self) -> OutputMode {
        if self.prepare_for_runtime {
            OutputMode::Runtime
        } else {
            OutputMode::Package
        }
    }
}

/// Generate the client SDK source of `service` in `language`.
///
/// Schemas are fetched from `metadata`. A missing EXECUTE privilege
/// (error 1370) degrades to a service without reflected schemas; any other
/// metadata error is returned.
pub fn generate_service_sdk(
    service: &Service,
    metadata: &dyn MetadataSource,
    language: &str,
    options: &GenerateOptions,
) -> Result<String, GenerateError> {
    let language: SdkLanguage = language.parse()?;
    let templates = TemplateSet::load(language, options.template_dir.as_deref())?;

    let (schemas, metadata_available) = match metadata.fetch_schemas(service) {
        Ok(schemas) => (schemas, true),
        Err(err) if err.is_insufficient_privilege() => {
            warn!(
                service = %service.url_context_root,
                error = %err,
                "no access to service metadata; generating without schemas"
            );
            (Vec::new(), false)
        }
        Err(err) => return Err(err.into()),
    };

    let mut scope = match options.identifier_seed {
        Some(seed) => GenerationScope::with_seed(seed),
        None => GenerationScope::new(),
    };
    let input = PlanInput {
        service,
        schemas: &schemas,
        language,
        service_url: options.service_url.as_deref(),
        metadata_available,
    };
    let plan = plan_service(&input, &mut scope)?;

    let mode = options.mode();
    let code = render(&templates.service, &plan, mode)?;
    info!(
        language = %language,
        schemas = plan.schemas.len(),
        bytes = code.len(),
        "generated service SDK"
    );
    Ok(match mode {
        OutputMode::Package => code,
        OutputMode::Runtime => prepare_for_runtime(&code, language),
    })
}

/// The base-classes source the generated SDK builds on.
///
/// In runtime mode `runtimeRemove` regions and `export` keywords are
/// stripped.
pub fn get_base_classes(
    language: &str,
    prepare_for_runtime: bool,
    template_dir: Option<&Path>,
) -> Result<String, GenerateError> {
    let language: SdkLanguage = language.parse()?;
    let templates = TemplateSet::load(language, template_dir)?;
    let mode = if prepare_for_runtime {
        OutputMode::Runtime
    } else {
        OutputMode::Package
    };
    let code = render_static(&templates.base_classes, mode)?;
    Ok(match mode {
        OutputMode::Package => code,
        OutputMode::Runtime => strip_exports(&code, language),
    })
}

/// Load a service description from `path` and generate its SDK.
pub fn generate_from_file(
    path: &Path,
    language: &str,
    options: &GenerateOptions,
) -> Result<String, GenerateError> {
    let service = Service::load(path)?;
    generate_service_sdk(&service, &service, language, options)
}

/// Write generated code to `path`, creating parent directories.
pub fn write_output(path: &Path, code: &str) -> Result<(), GenerateError> {
    let io_err = |source| GenerateError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    std::fs::write(path, code).map_err(io_err)
}
