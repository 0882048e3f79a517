//! Error types for catalog construction, lookups and the binary codec

use crate::search::Suggestion;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodecError {
    #[error("Type not understood: {0}")]
    UnsupportedType(String),

    #[error("Buffer too short: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("Function '{function}' takes {expected} argument(s), {actual} given")]
    ArgumentMismatch {
        function: String,
        expected: usize,
        actual: usize,
    },

    #[error("Cannot parse '{text}' as {type_name}")]
    InvalidLiteral {
        text: String,
        type_name: &'static str,
    },
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read AST file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse AST JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Namespace not found: '{0}'")]
    NamespaceNotFound(String),

    #[error("{}", not_found("attribute", .name, .suggestions))]
    AttributeNotFound {
        name: String,
        suggestions: Vec<Suggestion>,
    },

    #[error("{}", not_found("function", .name, .suggestions))]
    FunctionNotFound {
        name: String,
        suggestions: Vec<Suggestion>,
    },

    #[error("Function '{name}' is overloaded; call one of: {}", .candidates.join(", "))]
    AmbiguousFunction {
        name: String,
        candidates: Vec<String>,
    },

    #[error("Definition header not found for type: {0}")]
    DefinitionHeaderNotFound(String),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

fn not_found(section: &str, name: &str, suggestions: &[Suggestion]) -> String {
    match suggestions.first() {
        Some(best) => format!(
            "Unknown {} '{}'. Did you mean: {}?",
            section, name, best.candidate
        ),
        None => format!("Unknown {} '{}'", section, name),
    }
}
