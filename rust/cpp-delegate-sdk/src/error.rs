use cpp_delegate_catalog::{CatalogError, CodecError, Operation, Suggestion};
use std::io;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DelegateError {
    #[error("Type not understood: {0}")]
    UnsupportedType(String),

    #[error("Timed out after {timeout:?} waiting for address of '{name}'")]
    AddressResolutionTimeout { name: String, timeout: Duration },

    #[error("Timed out after {timeout:?} waiting for {operation} response")]
    Timeout {
        operation: Operation,
        timeout: Duration,
    },

    #[error("{operation} cancelled")]
    Cancelled { operation: Operation },

    #[error("Attribute '{name}' is read-only (declared as \"const\" at `{location}`)")]
    ReadOnlyAttribute { name: String, location: String },

    #[error("Length of specified value ({actual}) does not match remote array length ({expected}) for '{name}'")]
    ArrayLengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("Unknown attribute '{name}'{}", hint(.suggestions))]
    AttributeNotFound {
        name: String,
        suggestions: Vec<Suggestion>,
    },

    #[error("Unknown function '{name}'{}", hint(.suggestions))]
    FunctionNotFound {
        name: String,
        suggestions: Vec<Suggestion>,
    },

    #[error("Function '{name}' is overloaded; call one of: {}", .candidates.join(", "))]
    AmbiguousFunction {
        name: String,
        candidates: Vec<String>,
    },

    #[error("Function '{function}' takes {expected} argument(s), {actual} given")]
    ArgumentMismatch {
        function: String,
        expected: usize,
        actual: usize,
    },

    #[error("Response too short: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("Request of {size} bytes exceeds the 16-bit size field")]
    RequestTooLarge { size: usize },

    #[error("Remote address 0x{0:x} does not fit the 32-bit address field")]
    AddressOutOfRange(u64),

    #[error("Cannot parse '{text}' as {type_name}")]
    InvalidLiteral {
        text: String,
        type_name: &'static str,
    },

    #[error("Channel closed")]
    ChannelClosed,

    #[error("Channel I/O error: {0}")]
    Io(#[source] io::Error),

    #[error(transparent)]
    Catalog(CatalogError),
}

fn hint(suggestions: &[Suggestion]) -> String {
    suggestions
        .first()
        .map(|best| format!(". Did you mean: {}?", best.candidate))
        .unwrap_or_default()
}

impl From<io::Error> for DelegateError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset => DelegateError::ChannelClosed,
            _ => DelegateError::Io(err),
        }
    }
}

impl From<CodecError> for DelegateError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::UnsupportedType(name) => DelegateError::UnsupportedType(name),
            CodecError::Truncated { expected, actual } => {
                DelegateError::Truncated { expected, actual }
            }
            CodecError::ArgumentMismatch {
                function,
                expected,
                actual,
            } => DelegateError::ArgumentMismatch {
                function,
                expected,
                actual,
            },
            CodecError::InvalidLiteral { text, type_name } => {
                DelegateError::InvalidLiteral { text, type_name }
            }
        }
    }
}

impl From<CatalogError> for DelegateError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::AttributeNotFound { name, suggestions } => {
                DelegateError::AttributeNotFound { name, suggestions }
            }
            CatalogError::FunctionNotFound { name, suggestions } => {
                DelegateError::FunctionNotFound { name, suggestions }
            }
            CatalogError::AmbiguousFunction { name, candidates } => {
                DelegateError::AmbiguousFunction { name, candidates }
            }
            CatalogError::Codec(codec) => codec.into(),
            other => DelegateError::Catalog(other),
        }
    }
}
