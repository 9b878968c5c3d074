//! Target languages for SDK generation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A language the generator can emit client code for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdkLanguage {
    TypeScript,
    Python,
    Swift,
}

impl SdkLanguage {
    /// All supported languages, in the order they are listed to users.
    pub const ALL: [SdkLanguage; 3] = [Self::TypeScript, Self::Python, Self::Swift];

    /// Display name (e.g., "TypeScript").
    pub fn name(self) -> &'static str {
        match self {
            Self::TypeScript => "TypeScript",
            Self::Python => "Python",
            Self::Swift => "Swift",
        }
    }

    /// Line comment prefix used by template markers.
    pub fn comment_prefix(self) -> &'static str {
        match self {
            Self::TypeScript | Self::Swift => "//",
            Self::Python => "#",
        }
    }

    /// File extension of generated sources.
    pub fn extension(self) -> &'static str {
        match self {
            Self::TypeScript => "ts",
            Self::Python => "py",
            Self::Swift => "swift",
        }
    }

    /// Prefix prepended to every declaration stem.
    pub fn interface_prefix(self) -> &'static str {
        match self {
            Self::TypeScript | Self::Python => "I",
            Self::Swift => "",
        }
    }

    /// The literal used for an absent value in generated code.
    pub fn null_literal(self) -> &'static str {
        match self {
            Self::TypeScript => "null",
            Self::Python => "None",
            Self::Swift => "nil",
        }
    }

    /// File name of the base-classes source.
    pub fn base_classes_file(self) -> &'static str {
        match self {
            Self::TypeScript => "MrsBaseClasses.ts",
            Self::Python => "mrs_base_classes.py",
            Self::Swift => "MrsBaseClasses.swift",
        }
    }

    /// File name of the service template.
    pub fn service_template_file(self) -> &'static str {
        match self {
            Self::TypeScript => "MrsServiceTemplate.ts.template",
            Self::Python => "mrs_service_template.py.template",
            Self::Swift => "MrsServiceTemplate.swift.template",
        }
    }

    /// Directory (below a template root) holding this language's files.
    pub fn template_dir(self) -> &'static str {
        match self {
            Self::TypeScript => "typescript",
            Self::Python => "python",
            Self::Swift => "swift",
        }
    }
}

impl fmt::Display for SdkLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SdkLanguage {
    type Err = LanguageNotSupportedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "typescript" | "ts" => Ok(Self::TypeScript),
            "python" | "py" => Ok(Self::Python),
            "swift" => Ok(Self::Swift),
            _ => Err(LanguageNotSupportedError::new(s)),
        }
    }
}

/// The requested SDK language is not one of [`SdkLanguage::ALL`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "The SDK language `{requested}` is not supported. Supported languages: {}.",
    supported_list()
)]
pub struct LanguageNotSupportedError {
    pub requested: String,
}

impl LanguageNotSupportedError {
    pub fn new(requested: impl Into<String>) -> Self {
        Self {
            requested: requested.into(),
        }
    }

    /// The languages that would have been accepted.
    pub fn supported(&self) -> &'static [SdkLanguage] {
        &SdkLanguage::ALL
    }
}

fn supported_list() -> String {
    SdkLanguage::ALL
        .iter()
        .map(|l| l.name())
        .collect::<Vec<_>>()
        .join(", ")
}
