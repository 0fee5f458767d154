//! Error handling for the Twine Scheme interpreter
//!
//! This module defines the error types used throughout the interpreter,
//! including syntax errors with position information and general parse errors.

use std::fmt;

/// Error types for the Twine interpreter
#[derive(Debug, Clone)]
pub enum Error {
    /// Syntax errors with location information
    SyntaxError {
        message: String,
        line: usize,
        column: usize,
    },

    /// General parsing errors
    ParseError(String),

    /// Runtime evaluation errors
    RuntimeError(String),

    /// Arity errors for incorrect number of arguments
    ArityError {
        procedure: String,
        expected: usize,
        actual: usize,
    },

    /// Type errors for incorrect argument types
    TypeError {
        procedure: String,
        expected: String,
        actual: String,
        position: Option<usize>,
    },

    /// Environment-related errors
    EnvironmentError {
        kind: EnvironmentErrorKind,
        identifier: String,
        context: Option<String>,
    },

    /// An error value raised by the fiber scheduler or a concurrency
    /// primitive (interruption, deadlock, cleanup failure, and the like).
    Engine(crate::engine::EngineError),
}

/// Specific kinds of environment errors
#[derive(Debug, Clone)]
pub enum EnvironmentErrorKind {
    /// Unbound identifier error
    UnboundIdentifier,
    /// Invalid identifier
    InvalidIdentifier,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::SyntaxError {
                message,
                line,
                column,
            } => {
                write!(f, "Syntax error at line {line}, column {column}: {message}")
            }
            Error::ParseError(msg) => write!(f, "Parse error: {msg}"),
            Error::RuntimeError(msg) => write!(f, "Runtime error: {msg}"),
            Error::ArityError {
                procedure,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "{}: expected {} argument{}, got {}",
                    procedure,
                    expected,
                    if *expected == 1 { "" } else { "s" },
                    actual
                )
            }
            Error::TypeError {
                procedure,
                expected,
                actual,
                position,
            } => {
                if let Some(pos) = position {
                    write!(
                        f,
                        "{procedure}: expected {expected} for argument {pos}, got {actual}"
                    )
                } else {
                    write!(f, "{procedure}: expected {expected}, got {actual}")
                }
            }
            Error::EnvironmentError {
                kind,
                identifier,
                context,
            } => {
                let base_msg = match kind {
                    EnvironmentErrorKind::UnboundIdentifier => {
                        format!("Unbound identifier: '{identifier}'")
                    }
                    EnvironmentErrorKind::InvalidIdentifier => {
                        format!("Invalid identifier: '{identifier}'")
                    }
                };

                if let Some(ctx) = context {
                    write!(f, "{base_msg}. {ctx}")
                } else {
                    write!(f, "{base_msg}")
                }
            }
            Error::Engine(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<crate::engine::EngineError> for Error {
    fn from(e: crate::engine::EngineError) -> Self {
        Error::Engine(e)
    }
}

/// Result type alias for Twine operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a syntax error with position information
    pub fn syntax_error(message: &str, line: usize, column: usize) -> Self {
        Self::SyntaxError {
            message: message.to_string(),
            line,
            column,
        }
    }

    /// Create a general parse error
    pub fn parse_error(message: &str) -> Self {
        Self::ParseError(message.to_string())
    }

    /// Create a runtime error
    pub fn runtime_error(message: &str) -> Self {
        Self::RuntimeError(message.to_string())
    }

    /// Create an unbound identifier error with optional context
    pub fn unbound_identifier(identifier: &str, context: Option<&str>) -> Self {
        Self::EnvironmentError {
            kind: EnvironmentErrorKind::UnboundIdentifier,
            identifier: identifier.to_string(),
            context: context.map(|c| c.to_string()),
        }
    }

    /// Create an invalid identifier error with optional context
    pub fn invalid_identifier(identifier: &str, context: Option<&str>) -> Self {
        Self::EnvironmentError {
            kind: EnvironmentErrorKind::InvalidIdentifier,
            identifier: identifier.to_string(),
            context: context.map(|c| c.to_string()),
        }
    }

    /// Create an arity error for incorrect number of arguments
    pub fn arity_error(procedure: &str, expected: usize, actual: usize) -> Self {
        Self::ArityError {
            procedure: procedure.to_string(),
            expected,
            actual,
        }
    }

    /// Create a structured type error with procedure and type information
    pub fn type_error(
        procedure: &str,
        expected: &str,
        actual: &str,
        position: Option<usize>,
    ) -> Self {
        Self::TypeError {
            procedure: procedure.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
            position,
        }
    }

    /// Create an error for when an identifier must be a symbol but isn't
    pub fn identifier_must_be_symbol_error(form_name: &str, actual_type: &str) -> Self {
        Self::ParseError(format!(
            "{form_name}: identifier must be a symbol, got {actual_type}"
        ))
    }

    /// Create an error for when a binding must be a list but isn't
    pub fn binding_must_be_list_error(form_name: &str, actual_type: &str) -> Self {
        Self::ParseError(format!(
            "{form_name}: binding must be a list, got {actual_type}"
        ))
    }

    /// Create an error for when a binding list must be a list but isn't
    pub fn binding_list_must_be_list_error(form_name: &str, actual_type: &str) -> Self {
        Self::ParseError(format!(
            "{form_name}: binding list must be a list, got {actual_type}"
        ))
    }

    /// Create an error for when a parameter list must be a list but isn't
    pub fn parameter_list_must_be_list_error(form_name: &str, actual_type: &str) -> Self {
        Self::ParseError(format!(
            "{form_name}: parameter list must be a list, got {actual_type}"
        ))
    }

    /// Create an error for when a procedure name must be a symbol but isn't
    pub fn procedure_name_must_be_symbol_error(form_name: &str, actual_type: &str) -> Self {
        Self::RuntimeError(format!(
            "{form_name}: procedure name must be a symbol, got {actual_type}"
        ))
    }

    /// Create an error for when first argument must be a list of bindings but isn't
    pub fn first_argument_must_be_list_of_bindings_error(
        form_name: &str,
        actual_type: &str,
    ) -> Self {
        Self::RuntimeError(format!(
            "{form_name}: first argument must be a list of bindings, got {actual_type}"
        ))
    }

    /// Create an error for when each binding must be a list but isn't
    pub fn each_binding_must_be_list_error(form_name: &str) -> Self {
        Self::RuntimeError(format!("{form_name}: each binding must be a list"))
    }

    /// Create an error for when a parameter must be a symbol but isn't
    pub fn parameter_must_be_symbol_error(form_name: &str, actual_type: &str) -> Self {
        Self::ParseError(format!(
            "{form_name}: parameter must be a symbol, got {actual_type}"
        ))
    }

    /// Create an error for when a duplicate parameter is found
    pub fn duplicate_parameter_error(form_name: &str, param_name: &str) -> Self {
        Self::ParseError(format!("{form_name}: duplicate parameter '{param_name}'"))
    }

    /// Create an error for when a binding has wrong number of elements
    pub fn binding_wrong_arity_error(form_name: &str, expected: usize, actual: usize) -> Self {
        Self::ParseError(format!(
            "{form_name}: binding must have exactly {expected} elements (identifier and expression), got {actual}"
        ))
    }

    /// Create an error for when a duplicate identifier is found in bindings
    pub fn duplicate_identifier_error(form_name: &str, identifier: &str) -> Self {
        Self::ParseError(format!("{form_name}: duplicate identifier '{identifier}'"))
    }

    /// Create an error for when each binding must have exactly 2 elements
    pub fn binding_elements_wrong_arity_error(form_name: &str) -> Self {
        Self::RuntimeError(format!(
            "{form_name}: each binding must be a list of exactly 2 elements (identifier expression)"
        ))
    }
}
