//! Lambda special form implementation
//!
//! This module implements the `lambda` special form for creating user-defined
//! procedures with lexical closure support. Lambda expressions create procedures
//! that capture their defining environment and can be called with arguments.

use crate::error::{Error, Result};
use crate::parser::Expression;
use crate::runtime::Environment;
use crate::types::{Lambda, Procedure, Symbol, Value};
use std::sync::Arc;

/// Evaluate a lambda expression
///
/// Lambda syntax: `(lambda (param1 param2 ...) body1 body2 ...)`
///
/// Creates a new procedure with the specified parameters and body expressions.
/// The procedure captures the current environment as a closure, implementing
/// lexical scoping. Since `Environment` is a cheap handle onto a shared scope,
/// a later `define` of the lambda's own name into that same scope is visible
/// to the closure without any separate patching step.
pub fn eval_lambda(args: &[Arc<Expression>], env: &Environment) -> Result<Value> {
    if args.len() < 2 {
        return Err(Error::arity_error("lambda", 2, args.len()));
    }

    let params_expr = Arc::clone(&args[0]);
    let body_exprs: Vec<Arc<Expression>> = args[1..].iter().map(Arc::clone).collect();

    let params = parse_parameter_list(&params_expr)?;
    validate_parameters(&params)?;

    let lambda = Lambda::new(params, None, body_exprs, env.clone());
    Ok(Value::procedure(Procedure::lambda(lambda)))
}

/// Parse the parameter list from a lambda expression
///
/// Parameter list can be:
/// - Empty list: `()`
/// - List of symbols: `(x y z)`
fn parse_parameter_list(params_expr: &Expression) -> Result<Vec<Symbol>> {
    match params_expr {
        Expression::List(elements) => {
            let mut params = Vec::with_capacity(elements.len());

            for element in elements {
                match element.as_ref() {
                    Expression::Atom(Value::Symbol(symbol)) => {
                        params.push(symbol.clone());
                    }
                    Expression::Atom(other) => {
                        return Err(Error::parse_error(&format!(
                            "lambda: parameter must be a symbol, got {}",
                            other.type_name()
                        )));
                    }
                    Expression::List(_) => {
                        return Err(Error::parse_error(
                            "lambda: parameter must be a symbol, got list",
                        ));
                    }
                    Expression::Quote(_) => {
                        return Err(Error::parse_error(
                            "lambda: parameter must be a symbol, got quote",
                        ));
                    }
                }
            }

            Ok(params)
        }
        Expression::Atom(Value::Symbol(_)) => Err(Error::parse_error(
            "lambda: parameters must be enclosed in parentheses",
        )),
        Expression::Atom(other) => Err(Error::parse_error(&format!(
            "lambda: parameter list must be a list, got {}",
            other.type_name()
        ))),
        Expression::Quote(_) => Err(Error::parse_error(
            "lambda: parameter list must be a list, got quote",
        )),
    }
}

/// Validate that all parameters are unique identifiers
fn validate_parameters(params: &[Symbol]) -> Result<()> {
    use std::collections::HashSet;

    let mut seen = HashSet::new();
    for param in params {
        if !seen.insert(param) {
            return Err(Error::parse_error(&format!(
                "lambda: duplicate parameter '{param}'"
            )));
        }
    }
    Ok(())
}

/// Parse a raw parameter-expression slice (used by `define`'s procedure-definition sugar).
pub fn parse_parameters(param_elements: &[Arc<Expression>]) -> Result<Vec<Symbol>> {
    let mut params = Vec::with_capacity(param_elements.len());
    for element in param_elements {
        match element.as_ref() {
            Expression::Atom(Value::Symbol(symbol)) => params.push(symbol.clone()),
            other => {
                return Err(Error::parse_error(&format!(
                    "parameter must be a symbol, got {}",
                    other.type_name()
                )));
            }
        }
    }
    Ok(params)
}

pub use validate_parameters as validate_unique_parameters;
