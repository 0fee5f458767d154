//! Concurrency special forms for the Twine Scheme runtime
//!
//! This module implements special forms related to fiber-based concurrency
//! and asynchronous task management.

use crate::engine::fiber::FiberId;
use crate::error::{Error, Result};
use crate::parser::Expression;
use crate::runtime::environment::Environment;
use crate::runtime::eval_async::eval_sequence_async;
use crate::types::Value;
use std::sync::Arc;

/// Evaluate the `async` special form
///
/// The `async` special form takes zero or more expressions and spawns them
/// for execution in a new fiber, returning a `Value::Fiber` handle immediately.
///
/// Syntax: `(async <expr>...)`
///
/// # Examples
/// * `(async)` - Empty body, spawned fiber evaluates to nil
/// * `(async (+ 1 2))` - Single expression
/// * `(async (display "Working...") (* 6 7))` - Multiple expressions, like `begin`
///
/// # Implementation Notes
/// This is a special form rather than a built-in procedure so that the body
/// expressions are not pre-evaluated by the caller - they are captured with
/// the current lexical environment and handed, unevaluated, to a freshly
/// spawned fiber that runs them sequentially through [`eval_sequence_async`].
pub fn eval_async(args: &[Arc<Expression>], env: &mut Environment) -> Result<Value> {
    let engine = env
        .engine()
        .ok_or_else(|| Error::runtime_error("async: no engine bound to this environment"))?;

    let body: Vec<Arc<Expression>> = args.iter().map(Arc::clone).collect();
    let closure_env = env.clone();

    let fiber_id = engine.spawn_fiber(move || {
        Box::pin(async move {
            let mut fiber_env = closure_env;
            eval_sequence_async(&body, &mut fiber_env).await
        })
    });

    Ok(Value::Fiber(fiber_id))
}

/// Helper used by tests and by builtins that need to recognize a bare fiber value.
pub fn is_fiber(value: &Value) -> Option<FiberId> {
    match value {
        Value::Fiber(id) => Some(*id),
        _ => None,
    }
}
