use thiserror::Error;

use crate::value::ErrorKind;

/// Failures raised by the match producer (pattern compilation, option validation, matching).
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid pattern: {0}")]
    Syntax(#[source] fancy_regex::Error),
    #[error("matching failed: {0}")]
    Runtime(#[source] fancy_regex::Error),
    #[error("invalid regex options value {0}")]
    InvalidOptions(i64),
    #[error("unsupported regex option: {0}")]
    UnsupportedOption(&'static str),
}

/// Result of a worksheet function, before it is folded into a host [`Value`](crate::Value).
#[derive(Debug, Error)]
pub enum FunctionError {
    /// A required argument was missing/empty, or an argument could not be coerced.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    /// A coercion produced a specific worksheet error (including propagated argument errors).
    #[error("argument error {0}")]
    Coercion(ErrorKind),
    /// The call was well formed but produced nothing to return.
    #[error("no result")]
    NoResult,
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl FunctionError {
    /// The worksheet error the host displays for this failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FunctionError::InvalidArgument(_) => ErrorKind::Value,
            FunctionError::Coercion(kind) => *kind,
            FunctionError::NoResult => ErrorKind::NA,
            // Engine exceptions surface as #VALUE! in the host.
            FunctionError::Engine(_) => ErrorKind::Value,
        }
    }
}

impl From<ErrorKind> for FunctionError {
    fn from(kind: ErrorKind) -> Self {
        FunctionError::Coercion(kind)
    }
}

pub type FunctionResult<T> = Result<T, FunctionError>;
