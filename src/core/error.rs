//! Typed error handling for request compilation
//!
//! Every failure raised while compiling a query step or parsing a filter
//! argument is a [`CompileError`]. The variants map one-to-one onto the
//! failure categories callers need to tell apart:
//!
//! - [`CompileError::Configuration`]: the declarative type graph is inconsistent
//! - [`CompileError::UnsupportedOperation`]: an operator or aggregate the engine does not implement
//! - [`CompileError::IllegalArgument`]: a malformed argument value
//! - [`CompileError::IllegalState`]: a selection with no type graph counterpart
//!
//! None of them are retried by the compiler.
//!
//! # Example
//!
//! ```rust,ignore
//! match compiler.compile_collection(brewery, &step) {
//!     Ok(request) => loader.load_many(&request).await?,
//!     Err(CompileError::UnsupportedOperation { message }) => {
//!         println!("Rejected: {}", message);
//!     }
//!     Err(e) => eprintln!("Other error: {}", e),
//! }
//! ```

use serde::Serialize;
use thiserror::Error;

/// The error type produced by the compiler and the filter criteria engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// The type/filter/sort configuration is internally inconsistent
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// A filter operator or aggregate function the engine does not implement
    #[error("{message}")]
    UnsupportedOperation { message: String },

    /// A malformed argument value
    #[error("Illegal argument: {message}")]
    IllegalArgument { message: String },

    /// A selected field has no counterpart in the type graph
    #[error("Illegal state: {message}")]
    IllegalState { message: String },
}

impl CompileError {
    pub fn configuration(message: impl Into<String>) -> Self {
        CompileError::Configuration {
            message: message.into(),
        }
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        CompileError::UnsupportedOperation {
            message: message.into(),
        }
    }

    pub fn illegal_argument(message: impl Into<String>) -> Self {
        CompileError::IllegalArgument {
            message: message.into(),
        }
    }

    pub fn illegal_state(message: impl Into<String>) -> Self {
        CompileError::IllegalState {
            message: message.into(),
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            CompileError::Configuration { .. } => "CONFIGURATION_ERROR",
            CompileError::UnsupportedOperation { .. } => "UNSUPPORTED_OPERATION",
            CompileError::IllegalArgument { .. } => "ILLEGAL_ARGUMENT",
            CompileError::IllegalState { .. } => "ILLEGAL_STATE",
        }
    }

    /// Whether the error points at the operator's configuration rather than the caller's query
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, CompileError::Configuration { .. })
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
        }
    }
}

/// Serializable error payload handed to the execution engine
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
}
