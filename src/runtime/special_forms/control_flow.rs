//! Control flow special forms
//!
//! This module implements control flow special forms that control the order
//! of expression evaluation, including conditionals and sequencing constructs.
//!
//! ## Current Special Forms
//! - `if`: Conditional expressions
//!
//! ## Future Special Forms (planned)
//! - `cond`: Multi-way conditionals
//! - `case`: Pattern matching conditionals
//! - `when`/`unless`: Single-branch conditionals
//! - `begin`: Expression sequencing

use crate::error::Result;
use crate::parser::Expression;
use crate::runtime::{environment::Environment, eval::eval};
use crate::types::Value;
use std::sync::Arc;

/// Evaluate an if special form
///
/// Syntax: (if <test> <consequent> <alternative>)
/// - Evaluates <test>
/// - If the result is truthy (anything except #f), evaluates and returns <consequent>
/// - If the result is falsy (#f), evaluates and returns <alternative>
pub fn eval_if(args: &[Arc<Expression>], env: &mut Environment) -> Result<Value> {
    // if requires exactly 3 arguments: test, consequent, alternative
    if args.len() != 3 {
        return Err(crate::Error::arity_error("if", 3, args.len()));
    }

    let test_expr = Arc::clone(&args[0]);
    let consequent_expr = Arc::clone(&args[1]);
    let alternative_expr = Arc::clone(&args[2]);

    // Evaluate the test expression
    let test_value = eval(test_expr, env)?;

    // In Scheme, only #f is false, everything else is true
    if test_value.is_truthy() {
        eval(consequent_expr, env)
    } else {
        eval(alternative_expr, env)
    }
}
