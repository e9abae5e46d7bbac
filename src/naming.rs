//! Identifier sanitization and the inverse parameter-name map.
//!
//! Wire names in descriptors are human-readable ("make new", "with
//! properties", "in"). Tools and registry entries use sanitized identifiers
//! instead; the original spelling is recovered only through [`ParamNameMap`],
//! never by guessing from the identifier.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Appended to identifiers that collide with a reserved word or a sibling.
pub const RESERVED_MARKER: char = '_';

/// Self-reference marker that never reaches a script.
pub const SELF_MARKER: &str = "self";

// Rust strict, edition and reserved keywords. Tool arguments share the
// identifier namespace with generated bindings, so none of these may be used
// bare.
const RESERVED_IDENTIFIERS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "crate",
    "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl",
    "in", "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "self", "static", "struct", "super", "trait", "true", "try", "type", "typeof",
    "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

/// Stable identifier of a registry entry and of the tool that exposes it.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FunctionId(pub String);

impl FunctionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lowercase, with spaces and hyphens turned into underscores.
pub fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            other => other,
        })
        .collect::<String>()
        .to_lowercase()
}

pub fn build_function_id(app: &str, command: &str) -> FunctionId {
    FunctionId(format!("{}_{}", sanitize(app), sanitize(command)))
}

/// Identifier for a zero-argument accessor such as `calendar_get_calendars`.
pub fn accessor_function_id(app: &str, target: &str) -> FunctionId {
    FunctionId(format!("{}_get_{}", sanitize(app), sanitize(target)))
}

pub fn is_reserved(identifier: &str) -> bool {
    RESERVED_IDENTIFIERS.contains(&identifier)
}

/// Sanitize a parameter name into a usable identifier.
///
/// Characters outside `[a-z0-9_]` are dropped, and reserved words get the
/// trailing marker. Uniqueness among siblings is handled by
/// [`ParamNameMap::insert`].
pub fn sanitize_param(raw: &str) -> String {
    let mut identifier: String = sanitize(raw)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    if identifier.is_empty() {
        identifier.push_str("param");
    }
    if identifier.starts_with(|c: char| c.is_ascii_digit()) {
        identifier.insert(0, '_');
    }
    if is_reserved(&identifier) {
        identifier.push(RESERVED_MARKER);
    }
    identifier
}

/// Sanitized identifier → original wire-form parameter name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamNameMap(BTreeMap<String, String>);

impl ParamNameMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `raw` and return the identifier it was assigned.
    ///
    /// A raw name that was already recorded keeps its identifier. A fresh raw
    /// name whose sanitized form is taken gets marker characters appended
    /// until it is unique.
    pub fn insert(&mut self, raw: &str) -> String {
        self.insert_avoiding(raw, &[])
    }

    /// Like [`ParamNameMap::insert`], additionally steering clear of
    /// identifiers the caller has claimed for something else.
    pub fn insert_avoiding(&mut self, raw: &str, taken: &[&str]) -> String {
        if let Some((identifier, _)) = self.0.iter().find(|(_, wire)| wire.as_str() == raw) {
            return identifier.clone();
        }
        let mut identifier = sanitize_param(raw);
        while self.0.contains_key(&identifier)
            || is_reserved(&identifier)
            || taken.contains(&identifier.as_str())
        {
            identifier.push(RESERVED_MARKER);
        }
        self.0.insert(identifier.clone(), raw.to_string());
        identifier
    }

    /// Wire name for an identifier, if it was recorded.
    pub fn original(&self, identifier: &str) -> Option<&str> {
        self.0.get(identifier).map(String::as_str)
    }

    /// Wire name for an identifier, falling back to the identifier itself.
    pub fn resolve<'a>(&'a self, identifier: &'a str) -> &'a str {
        self.original(identifier).unwrap_or(identifier)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ParamNameMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
