use crate::language::SdkLanguage;
use regex::Regex;
use std::sync::LazyLock;

static TS_IMPORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*import\s[^;]*;[ \t]*\n?").unwrap());
static TS_EXPORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^([ \t]*)export\s+(?:default\s+)?").unwrap());
static TS_BLOCK_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());
static TS_LINE_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^[ \t]*//.*$").unwrap());
static PY_IMPORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:from\s+[\w.]+\s+)?import\s").unwrap());
static SWIFT_IMPORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^import\s+\w+[ \t]*\n?").unwrap());

/// Remove `export` keywords so declarations become file-local.
pub fn strip_exports(code: &str, language: SdkLanguage) -> String {
    match language {
        SdkLanguage::TypeScript => TS_EXPORT.replace_all(code, "$1").into_owned(),
        SdkLanguage::Python | SdkLanguage::Swift => code.to_string(),
    }
}

/// Turn package-mode source into a single import-free blob.
pub fn prepare_for_runtime(code: &str, language: SdkLanguage) -> String {
    match language {
        SdkLanguage::TypeScript => {
            let code = TS_IMPORT.replace_all(code, "");
            let code = strip_exports(&code, language);
            let code = TS_BLOCK_COMMENT.replace_all(&code, "");
            let code = TS_LINE_COMMENT.replace_all(&code, "");
            let mut out = String::with_capacity(code.len());
            for line in code.lines().map(str::trim).filter(|l| !l.is_empty()) {
                out.push_str(line);
                out.push('\n');
            }
            out
        }
        SdkLanguage::Python => strip_python_imports(code),
        SdkLanguage::Swift => SWIFT_IMPORT.replace_all(code, "").into_owned(),
    }
}

fn strip_python_imports(code: &str) -> String {
    let mut out = String::with_capacity(code.len());
    let mut in_parenthesized = false;
    for line in code.split_inclusive('\n') {
        if in_parenthesized {
            in_parenthesized = !line.contains(')');
            continue;
        }
        if PY_IMPORT.is_match(line) {
            in_parenthesized = line.contains('(') && !line.contains(')');
            continue;
        }
        out.push_str(line);
    }
    out
}
