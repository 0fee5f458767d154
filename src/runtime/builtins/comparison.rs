//! Comparison builtin procedures for the Twine Scheme runtime
//!
//! This module implements the core comparison operations as builtin procedures:
//! =, <, >, <=, >=
//!
//! All operations include proper arity checking and type validation.

use crate::error::{Error, Result};
use crate::types::Value;

/// Numeric equality
///
/// Scheme: (= number1 number2 ...)
/// Returns #t if all arguments are numerically equal, #f otherwise.
/// Requires at least two arguments.
pub fn equal(args: &[Value]) -> Result<Value> {
    if args.len() < 2 {
        return Err(Error::arity_error("=", 2, args.len()));
    }

    // Check all arguments are numbers first
    for (i, arg) in args.iter().enumerate() {
        if !arg.is_number() {
            return Err(Error::type_error(
                "=",
                "number",
                arg.type_name(),
                Some(i + 1),
            ));
        }
    }

    let first = args[0].as_number().unwrap();
    for arg in &args[1..] {
        if arg.as_number().unwrap() != first {
            return Ok(Value::boolean(false));
        }
    }
    Ok(Value::boolean(true))
}

/// Numeric less-than
///
/// Scheme: (< number1 number2 ...)
/// Returns #t if arguments are in strictly increasing order, #f otherwise.
/// Requires at least two arguments.
pub fn less_than(args: &[Value]) -> Result<Value> {
    if args.len() < 2 {
        return Err(Error::runtime_error("'<' requires at least two arguments"));
    }

    // Check all arguments are numbers first
    for arg in args {
        if !arg.is_number() {
            return Err(Error::runtime_error(&format!(
                "'<' requires numeric arguments, got {}",
                arg.type_name()
            )));
        }
    }

    for i in 1..args.len() {
        let prev = args[i - 1].as_number().unwrap();
        let curr = args[i].as_number().unwrap();
        if prev >= curr {
            return Ok(Value::boolean(false));
        }
    }
    Ok(Value::boolean(true))
}

/// Numeric greater-than
///
/// Scheme: (> number1 number2 ...)
/// Returns #t if arguments are in strictly decreasing order, #f otherwise.
/// Requires at least two arguments.
pub fn greater_than(args: &[Value]) -> Result<Value> {
    if args.len() < 2 {
        return Err(Error::runtime_error("'>' requires at least two arguments"));
    }

    // Check all arguments are numbers first
    for arg in args {
        if !arg.is_number() {
            return Err(Error::runtime_error(&format!(
                "'>' requires numeric arguments, got {}",
                arg.type_name()
            )));
        }
    }

    for i in 1..args.len() {
        let prev = args[i - 1].as_number().unwrap();
        let curr = args[i].as_number().unwrap();
        if prev <= curr {
            return Ok(Value::boolean(false));
        }
    }
    Ok(Value::boolean(true))
}

/// Numeric less-than-or-equal
///
/// Scheme: (<= number1 number2 ...)
/// Returns #t if arguments are in non-decreasing order, #f otherwise.
/// Requires at least two arguments.
pub fn less_than_or_equal(args: &[Value]) -> Result<Value> {
    if args.len() < 2 {
        return Err(Error::runtime_error("'<=' requires at least two arguments"));
    }

    // Check all arguments are numbers first
    for arg in args {
        if !arg.is_number() {
            return Err(Error::runtime_error(&format!(
                "'<=' requires numeric arguments, got {}",
                arg.type_name()
            )));
        }
    }

    for i in 1..args.len() {
        let prev = args[i - 1].as_number().unwrap();
        let curr = args[i].as_number().unwrap();
        if prev > curr {
            return Ok(Value::boolean(false));
        }
    }
    Ok(Value::boolean(true))
}

/// Numeric greater-than-or-equal
///
/// Scheme: (>= number1 number2 ...)
/// Returns #t if arguments are in non-increasing order, #f otherwise.
/// Requires at least two arguments.
pub fn greater_than_or_equal(args: &[Value]) -> Result<Value> {
    if args.len() < 2 {
        return Err(Error::runtime_error("'>=' requires at least two arguments"));
    }

    // Check all arguments are numbers first
    for arg in args {
        if !arg.is_number() {
            return Err(Error::runtime_error(&format!(
                "'>=' requires numeric arguments, got {}",
                arg.type_name()
            )));
        }
    }

    for i in 1..args.len() {
        let prev = args[i - 1].as_number().unwrap();
        let curr = args[i].as_number().unwrap();
        if prev < curr {
            return Ok(Value::boolean(false));
        }
    }
    Ok(Value::boolean(true))
}
