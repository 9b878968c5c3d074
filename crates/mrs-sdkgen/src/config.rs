//! Configuration for mrs-sdkgen.
//!
//! Loads config from:
//! 1. Global: ~/.config/mrs-sdkgen/config.toml
//! 2. Per-project: .mrs-sdkgen/config.toml (overrides global, key by key)
//!
//! Example config.toml:
//! ```toml
//! [generate]
//! language = "python"
//! service_url = "https://localhost:8443"
//! prepare_for_runtime = false
//! template_dir = "sdk-templates"
//! identifier_seed = 42
//! ```

use crate::generator::GenerateOptions;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// A config file exists but cannot be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// `[generate]` section.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct GenerateConfig {
    /// Default SDK language.
    pub language: Option<String>,
    pub service_url: Option<String>,
    pub prepare_for_runtime: Option<bool>,
    /// Template directory; relative paths resolve against the config's root.
    pub template_dir: Option<PathBuf>,
    pub identifier_seed: Option<u64>,
}

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct SdkGenConfig {
    pub generate: GenerateConfig,
}

impl SdkGenConfig {
    /// Load configuration for a project rooted at `root`.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        Self::load_from(Self::global_config_path().as_deref(), root)
    }

    /// Like [`load`](Self::load) with an explicit global config path.
    pub fn load_from(global: Option<&Path>, root: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(global_path) = global {
            let base = global_path.parent().unwrap_or(Path::new("."));
            if let Some(global) = Self::load_file(global_path, base)? {
                config = config.merge(global);
            }
        }

        let project_path = root.join(".mrs-sdkgen").join("config.toml");
        if let Some(project) = Self::load_file(&project_path, root)? {
            config = config.merge(project);
        }

        Ok(config)
    }

    /// Get the global config path.
    fn global_config_path() -> Option<PathBuf> {
        let config_home = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .ok()
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))?;
        Some(config_home.join("mrs-sdkgen").join("config.toml"))
    }

    /// Load a config file. A missing file is `Ok(None)`.
    fn load_file(path: &Path, base: &Path) -> Result<Option<Self>, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        let mut config: Self = toml::from_str(&content).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(dir) = config.generate.template_dir.take() {
            config.generate.template_dir = Some(if dir.is_relative() {
                base.join(dir)
            } else {
                dir
            });
        }
        Ok(Some(config))
    }

    /// Merge another config into this one; keys set in `other` win.
    fn merge(self, other: Self) -> Self {
        let (a, b) = (self.generate, other.generate);
        Self {
            generate: GenerateConfig {
                language: b.language.or(a.language),
                service_url: b.service_url.or(a.service_url),
                prepare_for_runtime: b.prepare_for_runtime.or(a.prepare_for_runtime),
                template_dir: b.template_dir.or(a.template_dir),
                identifier_seed: b.identifier_seed.or(a.identifier_seed),
            },
        }
    }

    /// Generation options implied by this config alone.
    pub fn generate_options(&self) -> GenerateOptions {
        GenerateOptions {
            prepare_for_runtime: self.generate.prepare_for_runtime.unwrap_or(false),
            service_url: self.generate.service_url.clone(),
            identifier_seed: self.generate.identifier_seed,
            template_dir: self.generate.template_dir.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_config(dir: &Path, content: &str) -> PathBuf {
        std::fs::create_dir_all(dir).unwrap();
        let path = dir.join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "{}", content).unwrap();
        path
    }

    #[test]
    fn test_missing_files_give_defaults() {
        let dir = TempDir::new().unwrap();
        let config = SdkGenConfig::load_from(None, dir.path()).unwrap();
        assert_eq!(config, SdkGenConfig::default());
        assert_eq!(config.generate_options(), GenerateOptions::default());
    }

    #[test]
    fn test_project_overrides_global_per_key() {
        let dir = TempDir::new().unwrap();
        let global = write_config(
            &dir.path().join("global"),
            r#"
[generate]
language = "swift"
service_url = "https://global:8443"
identifier_seed = 1
"#,
        );
        let root = dir.path().join("project");
        write_config(
            &root.join(".mrs-sdkgen"),
            r#"
[generate]
language = "python"
template_dir = "sdk-templates"
"#,
        );

        let config = SdkGenConfig::load_from(Some(&global), &root).unwrap();
        assert_eq!(config.generate.language.as_deref(), Some("python"));
        assert_eq!(
            config.generate.service_url.as_deref(),
            Some("https://global:8443")
        );
        assert_eq!(config.generate.identifier_seed, Some(1));
        assert_eq!(
            config.generate.template_dir,
            Some(root.join("sdk-templates"))
        );
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let dir = TempDir::new().unwrap();
        write_config(&dir.path().join(".mrs-sdkgen"), "[generate\nlanguage = 1");
        let err = SdkGenConfig::load_from(None, dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Toml { .. }));
    }
}
