//! Per-language template files.
//!
//! The builtin set is compiled into the binary. A directory laid out as
//! `<dir>/<language>/<file>` can replace it. Either way a set is parsed once
//! and cached for the life of the process.

use crate::language::SdkLanguage;
use crate::template::{ParseOptions, Template, TemplateError, parse};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, RwLock};
use tracing::debug;

/// A template set could not be read or parsed.
#[derive(Debug, thiserror::Error)]
pub enum TemplateLoadError {
    #[error("failed to read template {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid template {file}: {source}")]
    Template { file: String, source: TemplateError },
}

/// The parsed templates of one language.
#[derive(Debug)]
pub struct TemplateSet {
    pub language: SdkLanguage,
    pub base_classes: Template,
    pub service: Template,
}

type CacheKey = (SdkLanguage, Option<PathBuf>);

static CACHE: LazyLock<RwLock<HashMap<CacheKey, Arc<TemplateSet>>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

fn builtin_sources(language: SdkLanguage) -> (&'static str, &'static str) {
    match language {
        SdkLanguage::TypeScript => (
            include_str!("../templates/typescript/MrsBaseClasses.ts"),
            include_str!("../templates/typescript/MrsServiceTemplate.ts.template"),
        ),
        SdkLanguage::Python => (
            include_str!("../templates/python/mrs_base_classes.py"),
            include_str!("../templates/python/mrs_service_template.py.template"),
        ),
        SdkLanguage::Swift => (
            include_str!("../templates/swift/MrsBaseClasses.swift"),
            include_str!("../templates/swift/MrsServiceTemplate.swift.template"),
        ),
    }
}

impl TemplateSet {
    /// The cached set for `language`, from `dir` or the builtin templates.
    pub fn load(
        language: SdkLanguage,
        dir: Option<&Path>,
    ) -> Result<Arc<TemplateSet>, TemplateLoadError> {
        let key = (language, dir.map(Path::to_path_buf));
        if let Some(set) = CACHE.read().ok().and_then(|c| c.get(&key).cloned()) {
            return Ok(set);
        }
        let set = Arc::new(match dir {
            Some(dir) => Self::from_dir(language, dir)?,
            None => Self::builtin(language)?,
        });
        if let Ok(mut cache) = CACHE.write() {
            cache.insert(key, Arc::clone(&set));
        }
        Ok(set)
    }

    pub fn builtin(language: SdkLanguage) -> Result<Self, TemplateLoadError> {
        let (base, service) = builtin_sources(language);
        Self::from_sources(language, base, service)
    }

    /// Read `<dir>/<language>/` (e.g. `templates/python/mrs_base_classes.py`).
    pub fn from_dir(language: SdkLanguage, dir: &Path) -> Result<Self, TemplateLoadError> {
        let dir = dir.join(language.template_dir());
        debug!(dir = %dir.display(), language = %language, "loading templates");
        let read = |file: &str| {
            let path = dir.join(file);
            std::fs::read_to_string(&path).map_err(|source| TemplateLoadError::Io { path, source })
        };
        let base = read(language.base_classes_file())?;
        let service = read(language.service_template_file())?;
        Self::from_sources(language, &base, &service)
    }

    pub fn from_sources(
        language: SdkLanguage,
        base_classes: &str,
        service: &str,
    ) -> Result<Self, TemplateLoadError> {
        let prefix = language.comment_prefix();
        let base_classes = parse(
            base_classes,
            prefix,
            ParseOptions {
                placeholders: false,
            },
        )
        .map_err(|source| TemplateLoadError::Template {
            file: language.base_classes_file().to_string(),
            source,
        })?;
        let service = parse(service, prefix, ParseOptions::default()).map_err(|source| {
            TemplateLoadError::Template {
                file: language.service_template_file().to_string(),
                source,
            }
        })?;
        Ok(Self {
            language,
            base_classes,
            service,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_templates_parse() {
        for language in SdkLanguage::ALL {
            let set = TemplateSet::builtin(language).unwrap();
            assert!(set.service.has_blocks(), "{}", language);
        }
    }

    #[test]
    fn sets_are_cached() {
        let a = TemplateSet::load(SdkLanguage::Swift, None).unwrap();
        let b = TemplateSet::load(SdkLanguage::Swift, None).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn directory_override() {
        let dir = tempfile::tempdir().unwrap();
        let lang_dir = dir.path().join("typescript");
        std::fs::create_dir_all(&lang_dir).unwrap();
        std::fs::write(lang_dir.join("MrsBaseClasses.ts"), "export class Base {}\n").unwrap();
        std::fs::write(
            lang_dir.join("MrsServiceTemplate.ts.template"),
            "// --- schemaLoopStart\n// --- schemaLoopEnd\n",
        )
        .unwrap();

        let set = TemplateSet::load(SdkLanguage::TypeScript, Some(dir.path())).unwrap();
        assert!(set.service.has_blocks());
        assert!(!set.base_classes.has_blocks());
    }

    #[test]
    fn malformed_directory_template_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let lang_dir = dir.path().join("python");
        std::fs::create_dir_all(&lang_dir).unwrap();
        std::fs::write(lang_dir.join("mrs_base_classes.py"), "").unwrap();
        std::fs::write(
            lang_dir.join("mrs_service_template.py.template"),
            "# --- objectLoopStart\n",
        )
        .unwrap();

        let err = TemplateSet::from_dir(SdkLanguage::Python, dir.path()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid template mrs_service_template.py.template: line 1: `objectLoopStart` is never closed"
        );
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = TemplateSet::from_dir(SdkLanguage::Swift, dir.path()).unwrap_err();
        assert!(matches!(err, TemplateLoadError::Io { .. }));
    }
}
