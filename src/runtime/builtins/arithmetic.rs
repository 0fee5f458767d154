//! Arithmetic builtin procedures for the Twine Scheme runtime
//!
//! This module implements the core arithmetic operations as builtin procedures:
//! +, -, *, /
//!
//! All operations include proper arity checking and type validation.

use crate::error::{Error, Result};
use crate::types::Value;

/// Add two or more numbers
///
/// Scheme: (+ number1 number2 ...)
/// Returns the sum of all arguments. With no arguments, returns 0.
pub fn add(args: &[Value]) -> Result<Value> {
    if args.is_empty() {
        return Ok(Value::number(0.0));
    }

    let mut sum = 0.0;
    for arg in args {
        match arg {
            Value::Number(n) => sum += n.value(),
            _ => {
                return Err(Error::runtime_error(&format!(
                    "'+' requires numeric arguments, got {}",
                    arg.type_name()
                )));
            }
        }
    }
    Ok(Value::number(sum))
}

/// Subtract numbers
///
/// Scheme: (- number1 number2 ...)
/// With one argument, returns its negation.
/// With multiple arguments, subtracts all subsequent arguments from the first.
pub fn subtract(args: &[Value]) -> Result<Value> {
    if args.is_empty() {
        return Err(Error::arity_error("-", 1, 0));
    }

    // Check all arguments are numbers first
    for (i, arg) in args.iter().enumerate() {
        if !arg.is_number() {
            return Err(Error::type_error(
                "-",
                "number",
                arg.type_name(),
                Some(i + 1),
            ));
        }
    }

    let first = args[0].as_number().unwrap();

    if args.len() == 1 {
        // Unary minus - negate the number
        Ok(Value::number(-first))
    } else {
        // Subtract all subsequent arguments from the first
        let mut result = first;
        for arg in &args[1..] {
            result -= arg.as_number().unwrap();
        }
        Ok(Value::number(result))
    }
}

/// Multiply numbers
///
/// Scheme: (* number1 number2 ...)
/// Returns the product of all arguments. With no arguments, returns 1.
pub fn multiply(args: &[Value]) -> Result<Value> {
    if args.is_empty() {
        return Ok(Value::number(1.0));
    }

    let mut product = 1.0;
    for arg in args {
        match arg {
            Value::Number(n) => product *= n.value(),
            _ => {
                return Err(Error::runtime_error(&format!(
                    "'*' requires numeric arguments, got {}",
                    arg.type_name()
                )));
            }
        }
    }
    Ok(Value::number(product))
}

/// Divide numbers
///
/// Scheme: (/ number1 number2 ...)
/// With one argument, returns its reciprocal (1/number).
/// With multiple arguments, divides the first by all subsequent arguments.
pub fn divide(args: &[Value]) -> Result<Value> {
    if args.is_empty() {
        return Err(Error::arity_error("/", 1, 0));
    }

    // Check all arguments are numbers first
    for (i, arg) in args.iter().enumerate() {
        if !arg.is_number() {
            return Err(Error::type_error(
                "/",
                "number",
                arg.type_name(),
                Some(i + 1),
            ));
        }
    }

    let first = args[0].as_number().unwrap();

    if args.len() == 1 {
        // Unary division - reciprocal
        if first == 0.0 {
            return Err(Error::runtime_error("Division by zero"));
        }
        Ok(Value::number(1.0 / first))
    } else {
        // Divide first by all subsequent arguments
        let mut result = first;
        for arg in &args[1..] {
            let divisor = arg.as_number().unwrap();
            if divisor == 0.0 {
                return Err(Error::runtime_error("Division by zero"));
            }
            result /= divisor;
        }
        Ok(Value::number(result))
    }
}
