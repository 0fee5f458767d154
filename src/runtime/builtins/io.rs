//! I/O builtin procedures for the Twine Scheme runtime
//!
//! This module implements basic I/O operations as builtin procedures:
//! `display`, `newline`
//!
//! ## Testing Strategy
//!
//! This module uses a hybrid testing approach to verify both return values and actual stdout output:
//!
//! ### Unit Tests (src/runtime/builtins/io.rs)
//! - Use `display_to_writer()` and `newline_to_writer()` with custom buffers
//! - Provide **exact byte-level verification** of output content
//! - Fast execution with precise control over test conditions
//! - Verify all data types format correctly (strings without quotes, proper list formatting, etc.)
//!
//! ### Integration Tests (tests/integration.rs)
//! - Use the main `display()` and `newline()` functions through full evaluation pipeline
//! - Verify procedures execute correctly with proper return values (`Value::Nil`)
//! - Test I/O in real contexts (arithmetic expressions, conditionals, lambdas)
//! - Run with `cargo test -- --nocapture` to see actual stdout output
//!
//! ### Alternative Approaches Available
//! - **Subprocess testing**: Use `std::process::Command` to capture stdout from test binaries
//! - **External crates**: Use `gag` crate for stdout redirection (requires dependency)
//! - **Current approach**: Provides comprehensive testing without external dependencies
//!
//! ## Implementation Notes
//!
//! Currently synchronous implementations using `print!` and `println!` directly.
//! In Phase 4, these will be replaced with async versions that properly yield fibers.

use crate::error::{Error, Result};
use crate::types::Value;
use std::io::{Write, stdout};

/// Implements the `display` builtin procedure
///
/// Outputs the given value to stdout without adding a newline.
/// Takes exactly one argument of any type.
///
/// Examples:
/// - `(display "hello")` outputs: hello
/// - `(display 42)` outputs: 42
/// - `(display #t)` outputs: #t
pub fn display(args: &[Value]) -> Result<Value> {
    if args.len() != 1 {
        return Err(Error::arity_error("display", 1, args.len()));
    }

    let value = &args[0];

    // Format the value for display output
    let output = match value {
        Value::String(s) => {
            // Display strings without quotes, just the content
            s.as_str().to_string()
        }
        Value::Symbol(_)
        | Value::Number(_)
        | Value::Boolean(_)
        | Value::List(_)
        | Value::Nil
        | Value::Procedure(_)
        | Value::Mutex(_)
        | Value::CondVar(_)
        | Value::Fiber(_) => {
            // Use standard formatting for all other types
            format!("{value}")
        }
    };

    // Print to stdout without newline
    print!("{output}");

    // Flush to ensure immediate output
    stdout()
        .flush()
        .map_err(|e| Error::runtime_error(&format!("I/O error: {e}")))?;

    // Return an unspecified value (using empty list as convention)
    Ok(Value::Nil)
}

/// Helper function for display that accepts any writer (for testing)
pub fn display_to_writer<W: Write>(args: &[Value], writer: &mut W) -> Result<Value> {
    if args.len() != 1 {
        return Err(Error::arity_error("display", 1, args.len()));
    }

    let value = &args[0];

    // Format the value for display output
    let output = match value {
        Value::String(s) => {
            // Display strings without quotes, just the content
            s.as_str().to_string()
        }
        Value::Symbol(_)
        | Value::Number(_)
        | Value::Boolean(_)
        | Value::List(_)
        | Value::Nil
        | Value::Procedure(_)
        | Value::Mutex(_)
        | Value::CondVar(_)
        | Value::Fiber(_) => {
            // Use standard formatting for all other types
            format!("{value}")
        }
    };

    // Write to the provided writer without newline
    write!(writer, "{output}").map_err(|e| Error::runtime_error(&format!("I/O error: {e}")))?;

    // Flush to ensure immediate output
    writer
        .flush()
        .map_err(|e| Error::runtime_error(&format!("I/O error: {e}")))?;

    // Return an unspecified value (using empty list as convention)
    Ok(Value::Nil)
}

/// Implements the `newline` builtin procedure
///
/// Outputs a newline character to stdout.
/// Takes no arguments.
///
/// Example:
/// - `(newline)` outputs a newline
pub fn newline(args: &[Value]) -> Result<Value> {
    if !args.is_empty() {
        return Err(Error::arity_error("newline", 0, args.len()));
    }

    // Print newline to stdout
    println!();

    // Flush to ensure immediate output
    stdout()
        .flush()
        .map_err(|e| Error::runtime_error(&format!("I/O error: {e}")))?;

    // Return an unspecified value (using empty list as convention)
    Ok(Value::Nil)
}

/// Helper function for newline that accepts any writer (for testing)
pub fn newline_to_writer<W: Write>(args: &[Value], writer: &mut W) -> Result<Value> {
    if !args.is_empty() {
        return Err(Error::arity_error("newline", 0, args.len()));
    }

    // Write newline to the provided writer
    writeln!(writer).map_err(|e| Error::runtime_error(&format!("I/O error: {e}")))?;

    // Flush to ensure immediate output
    writer
        .flush()
        .map_err(|e| Error::runtime_error(&format!("I/O error: {e}")))?;

    // Return an unspecified value (using empty list as convention)
    Ok(Value::Nil)
}
