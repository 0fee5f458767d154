//! Evaluation engine for the Twine Scheme runtime
//!
//! This module implements the core evaluation logic for Scheme expressions.
//! It handles atomic values, symbol lookup, list evaluation, and provides
//! the foundation for procedure calls and special forms.

use crate::error::{Error, Result};
use crate::parser::Expression;
use crate::types::{List, Value};
use std::sync::Arc;

use super::{Environment, special_forms};

pub mod procedure;

// Re-export public functions from procedure module
pub use procedure::{call_procedure, eval_arguments};

/// Evaluate a Scheme expression in the given environment
///
/// This is the core evaluation function that handles:
/// - Self-evaluating atoms (numbers, booleans, strings)
/// - Symbol lookup in the environment
/// - List evaluation (procedure calls and special forms)
/// - Quoted expressions
///
/// # Arguments
/// * `expr` - The expression to evaluate
/// * `env` - The environment for symbol lookup
///
/// # Returns
/// The evaluated value or an error if evaluation fails
pub fn eval(expr: Arc<Expression>, env: &mut Environment) -> Result<Value> {
    match expr.as_ref() {
        // Atoms are handled based on their value type
        Expression::Atom(value) => eval_atom(value.clone(), env),

        // Lists represent procedure calls or special forms
        Expression::List(elements) => eval_list(elements, env),

        // Quoted expressions prevent evaluation
        Expression::Quote(quoted_expr) => eval_quote(Arc::clone(quoted_expr)),
    }
}

/// Evaluate an atomic expression
///
/// Atoms are evaluated based on their type:
/// - Numbers, booleans, strings, and lists are self-evaluating
/// - Symbols are looked up as identifiers in the environment
fn eval_atom(value: Value, env: &Environment) -> Result<Value> {
    match value {
        // Self-evaluating values
        Value::Number(_)
        | Value::Boolean(_)
        | Value::String(_)
        | Value::List(_)
        | Value::Procedure(_)
        | Value::Mutex(_)
        | Value::CondVar(_)
        | Value::Fiber(_) => Ok(value),

        // Symbols need environment lookup
        Value::Symbol(identifier) => env.lookup(&identifier),

        // Handle nil value
        Value::Nil => Ok(Value::Nil),
    }
}

/// Evaluate a list expression
///
/// Lists represent compound expressions in Scheme:
/// - Empty lists evaluate to themselves
/// - Non-empty lists represent special forms or procedure calls: (form/procedure arg1 arg2 ...)
fn eval_list(elements: &[Arc<Expression>], env: &mut Environment) -> Result<Value> {
    // Empty list evaluates to empty list
    if elements.is_empty() {
        return Ok(Value::List(List::new()));
    }

    // Non-empty lists can be special forms or procedure calls
    let first_expr = Arc::clone(&elements[0]);
    let rest_exprs = &elements[1..];

    let procedure_value = match first_expr.as_ref() {
        Expression::Atom(Value::Symbol(identifier)) => {
            // Handle special forms first (these have special evaluation rules)
            if let Some(special_form) = special_forms::SpecialForm::from_name(identifier.as_str()) {
                return special_form.call(rest_exprs, env);
            }

            // Not a special form, try to look up identifier in environment
            env.lookup(identifier)?
        }
        _ => eval(Arc::clone(&first_expr), env)?,
    };

    // Check if the value is a procedure and call it
    match procedure_value {
        Value::Procedure(procedure) => call_procedure(procedure, rest_exprs, env),
        _ => {
            let error_msg = format!(
                "'{}' is not a procedure, got {}",
                procedure_value,
                procedure_value.type_name()
            );
            Err(Error::runtime_error(&error_msg))
        }
    }
}

/// Evaluate a quoted expression
///
/// Quoted expressions prevent evaluation and return the quoted expression
/// as a value without evaluating it.
fn eval_quote(expr: Arc<Expression>) -> Result<Value> {
    // Convert the quoted expression back to a Value
    expression_to_value(expr.as_ref())
}

/// Convert an Expression back to a Value
///
/// This is used for quote evaluation where we need to return
/// the quoted expression as a value without evaluating it.
fn expression_to_value(expr: &Expression) -> Result<Value> {
    match expr {
        Expression::Atom(value) => Ok(value.clone()),

        Expression::List(elements) => {
            let mut values = Vec::with_capacity(elements.len());
            for element in elements {
                values.push(expression_to_value(element.as_ref())?);
            }
            Ok(Value::List(List::from(values)))
        }

        Expression::Quote(quoted_expr) => {
            // Nested quotes - convert the inner expression
            expression_to_value(quoted_expr.as_ref())
        }
    }
}
