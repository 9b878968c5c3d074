//! Collision-free identifiers in each target language's case conventions.
//!
//! Identifiers are tracked in a [`GenerationScope`] that the caller owns and
//! passes explicitly. A fresh child scope is opened at every service, schema,
//! object and interface boundary, so sibling names are unique while names in
//! unrelated scopes may repeat.

use crate::language::SdkLanguage;
use heck::{ToLowerCamelCase, ToSnakeCase, ToUpperCamelCase};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use std::collections::BTreeSet;

const RANDOM_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const RANDOM_LEN: usize = 6;

/// What an identifier names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    /// Types: PascalCase in every language.
    Class,
    /// Values and fields: lowerCamelCase, or snake_case for Python.
    Variable,
}

/// Identifiers already handed out within one scope of a generation pass.
#[derive(Debug)]
pub struct GenerationScope {
    identifiers: Vec<String>,
    /// Final names, suffixes included.
    taken: BTreeSet<String>,
    rng: StdRng,
}

impl GenerationScope {
    /// A root scope whose random fallback is drawn from OS entropy.
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// A root scope with a reproducible random fallback.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            identifiers: Vec::new(),
            taken: BTreeSet::new(),
            rng,
        }
    }

    /// Open an empty nested scope. Its random stream is derived from this one.
    pub fn child(&mut self) -> Self {
        Self::from_rng(StdRng::seed_from_u64(self.rng.next_u64()))
    }

    /// Forget all identifiers issued so far.
    pub fn reset(&mut self) {
        self.identifiers.clear();
        self.taken.clear();
    }

    /// Identifiers issued so far, in order (without collision suffixes).
    pub fn issued(&self) -> &[String] {
        &self.identifiers
    }

    fn claim(&mut self, base: String) -> String {
        let mut suffix = self.identifiers.iter().filter(|i| **i == base).count();
        let mut name = if suffix == 0 {
            base.clone()
        } else {
            format!("{}{}", base, suffix)
        };
        // An earlier input may already have produced this exact name.
        while self.taken.contains(&name) {
            suffix += 1;
            name = format!("{}{}", base, suffix);
        }
        self.identifiers.push(base);
        self.taken.insert(name.clone());
        name
    }

    fn random_identifier(&mut self) -> String {
        (0..RANDOM_LEN)
            .map(|_| RANDOM_CHARSET[self.rng.gen_range(0..RANDOM_CHARSET.len())] as char)
            .collect()
    }
}

impl Default for GenerationScope {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert `value` into an identifier that is unique within `scope`.
///
/// Characters listed in `allowed_special_chars` survive and separate
/// independently converted segments (e.g. `.` in nested field paths).
pub fn generate_identifier(
    value: &str,
    kind: IdentifierKind,
    language: SdkLanguage,
    scope: &mut GenerationScope,
    allowed_special_chars: &[char],
) -> String {
    let mut base = String::new();
    let mut segment = String::new();
    for c in value.chars() {
        if allowed_special_chars.contains(&c) {
            base.push_str(&convert_case(&segment, kind, language));
            base.push(c);
            segment.clear();
        } else {
            segment.push(c);
        }
    }
    base.push_str(&convert_case(&segment, kind, language));

    if base.chars().all(|c| allowed_special_chars.contains(&c)) {
        base = scope.random_identifier();
    }
    if base.starts_with(|c: char| c.is_ascii_digit()) {
        base.insert(0, '_');
    }

    scope.claim(base)
}

/// Case conversion without collision tracking.
pub fn convert_case(value: &str, kind: IdentifierKind, language: SdkLanguage) -> String {
    let sanitized: String = value
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    match (kind, language) {
        (IdentifierKind::Class, _) => sanitized.to_upper_camel_case(),
        (IdentifierKind::Variable, SdkLanguage::Python) => {
            sanitized.to_lower_camel_case().to_snake_case()
        }
        (IdentifierKind::Variable, _) => sanitized.to_lower_camel_case(),
    }
}
