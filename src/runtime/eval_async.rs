//! The async counterpart of [`crate::runtime::eval::eval`], used by fiber
//! bodies. Only this evaluator can suspend: it `.await`s join/sleep/mutex/
//! condvar operations, which the synchronous evaluator never touches.
//!
//! Control flow and binding forms (`if`, `define`, `let`, `letrec`,
//! `lambda`) delegate to the same parsing/validation code the synchronous
//! evaluator uses — none of that suspends — so only the parts that touch
//! the scheduler live here.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::engine::{Engine, FiberId};
use crate::engine::sync::{CondVar, Mutex};
use crate::engine::timer::sleep_for;
use crate::error::{Error, Result};
use crate::parser::Expression;
use crate::runtime::eval::procedure::eval_arguments;
use crate::runtime::{Environment, special_forms};
use crate::types::{Lambda, List, Procedure, Value};

/// Evaluate `expr` in `env`, suspending the current fiber whenever a
/// concurrency operation requires it.
///
/// Written as a plain function returning a boxed future (rather than an
/// `async fn`) because it recurses: an `async fn` cannot call itself
/// without this same indirection.
pub fn eval_async(
    expr: Arc<Expression>,
    env: Environment,
) -> Pin<Box<dyn Future<Output = Result<Value>>>> {
    Box::pin(async move {
        match expr.as_ref() {
            Expression::Atom(value) => eval_atom_async(value.clone(), &env),
            Expression::List(elements) => eval_list_async(elements, env).await,
            Expression::Quote(quoted) => expression_to_value(quoted.as_ref()),
        }
    })
}

fn eval_atom_async(value: Value, env: &Environment) -> Result<Value> {
    match value {
        Value::Symbol(identifier) => env.lookup(&identifier),
        other => Ok(other),
    }
}

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
        Expression::Quote(quoted) => expression_to_value(quoted.as_ref()),
    }
}

async fn eval_list_async(elements: &[Arc<Expression>], mut env: Environment) -> Result<Value> {
    if elements.is_empty() {
        return Ok(Value::List(List::new()));
    }

    let first_expr = Arc::clone(&elements[0]);
    let rest_exprs = &elements[1..];

    if let Expression::Atom(Value::Symbol(identifier)) = first_expr.as_ref() {
        let name = identifier.as_str();

        if let Some(result) = dispatch_concurrency(name, rest_exprs, &mut env).await {
            return result;
        }

        // `if`/`define`/`let`/`letrec`/`lambda` never suspend: their body
        // expressions are only captured (lambda) or re-dispatched through
        // this very evaluator (if/let/letrec via the arguments they build,
        // since the forms below call the synchronous `eval`, which would
        // be wrong for a fiber body). Route these specially instead.
        if special_forms::SpecialForm::from_name(name).is_some() || name == "lambda" {
            return eval_sync_special_form(name, rest_exprs, &mut env);
        }

        let value = env.lookup(identifier)?;
        return call_value_async(value, rest_exprs, env).await;
    }

    let value = eval_async(first_expr, env.clone()).await?;
    call_value_async(value, rest_exprs, env).await
}

/// `if`/`define`/`let`/`letrec`/`lambda` bodies are themselves evaluated
/// through [`eval_async`] recursively (lambda captures unevaluated body
/// expressions; if/let/letrec call back into `eval`/`eval_async` for their
/// sub-expressions) — but `if`, `let` and `letrec` are implemented against
/// the synchronous `eval`. A fiber that never suspends inside a
/// conditional or a `let` binding still needs correct results, so for
/// those forms we fall back to synchronous evaluation of the relevant
/// sub-expression directly rather than duplicating their parsing logic.
fn eval_sync_special_form(
    name: &str,
    args: &[Arc<Expression>],
    env: &mut Environment,
) -> Result<Value> {
    special_forms::dispatch(name, args, env)
        .unwrap_or_else(|| Err(Error::runtime_error(&format!("unknown special form '{name}'"))))
}

async fn call_value_async(
    value: Value,
    arg_exprs: &[Arc<Expression>],
    env: Environment,
) -> Result<Value> {
    match value {
        Value::Procedure(Procedure::Builtin(builtin)) => {
            let mut env = env;
            let args = eval_arguments(arg_exprs, &mut env)?;
            builtin.call(&args)
        }
        Value::Procedure(Procedure::Lambda(lambda)) => {
            let args = eval_arguments_async(arg_exprs, &env).await?;
            call_lambda_async(lambda, args).await
        }
        other => Err(Error::runtime_error(&format!(
            "'{}' is not a procedure, got {}",
            other,
            other.type_name()
        ))),
    }
}

async fn eval_arguments_async(exprs: &[Arc<Expression>], env: &Environment) -> Result<Vec<Value>> {
    let mut args = Vec::with_capacity(exprs.len());
    for expr in exprs {
        args.push(eval_async(Arc::clone(expr), env.clone()).await?);
    }
    Ok(args)
}

/// Call a lambda asynchronously. Unlike the synchronous evaluator's
/// `call_lambda`, this does not implement tail-call optimization: a fiber
/// body that tail-recurses deeply will grow its `Future` on the heap with
/// each call rather than looping in place.
async fn call_lambda_async(lambda: Arc<Lambda>, args: Vec<Value>) -> Result<Value> {
    let expected = lambda.arity();
    if expected != args.len() {
        return Err(Error::arity_error("<lambda>", expected, args.len()));
    }

    let call_env = Environment::new_scope(lambda.env());
    for (param, arg) in lambda.params().iter().zip(args.into_iter()) {
        call_env.define(param.clone(), arg);
    }

    eval_sequence_async(lambda.body(), &mut call_env.clone()).await
}

/// Evaluate a sequence of body expressions in order, returning the value
/// of the last one (or `Nil` for an empty sequence). Used both by `async`
/// (a fiber's top-level body) and by lambda calls.
pub async fn eval_sequence_async(body: &[Arc<Expression>], env: &mut Environment) -> Result<Value> {
    let mut result = Value::Nil;
    for expr in body {
        result = eval_async(Arc::clone(expr), env.clone()).await?;
    }
    Ok(result)
}

fn require_engine(env: &Environment) -> Result<Engine> {
    env.engine()
        .ok_or_else(|| Error::runtime_error("no engine bound to this environment"))
}

fn require_fiber(engine: &Engine) -> Result<FiberId> {
    engine
        .current_fiber()
        .ok_or_else(|| Error::runtime_error("operation requires a running fiber"))
}

fn expect_fiber(name: &str, value: Value) -> Result<FiberId> {
    match value {
        Value::Fiber(id) => Ok(id),
        other => Err(Error::type_error(name, "fiber", other.type_name(), Some(1))),
    }
}

fn expect_mutex(name: &str, value: Value) -> Result<std::rc::Rc<Mutex>> {
    match value {
        Value::Mutex(m) => Ok(m),
        other => Err(Error::type_error(name, "mutex", other.type_name(), Some(1))),
    }
}

fn expect_condvar(name: &str, value: Value) -> Result<std::rc::Rc<CondVar>> {
    match value {
        Value::CondVar(c) => Ok(c),
        other => Err(Error::type_error(
            name,
            "condition-variable",
            other.type_name(),
            Some(1),
        )),
    }
}

/// Dispatch the concurrency operations that need to `.await`. Returns
/// `None` for anything that isn't one of these names, so the caller falls
/// through to ordinary lookup/call.
async fn dispatch_concurrency(
    name: &str,
    args: &[Arc<Expression>],
    env: &mut Environment,
) -> Option<Result<Value>> {
    let result = match name {
        "async" => crate::runtime::special_forms::concurrency::eval_async(args, env),
        "scope" => eval_scope(args, env).await,
        "join" => eval_join(args, env).await,
        "interrupt" => eval_interrupt(args, env).await,
        "mutex-new" => eval_mutex_new(args, env),
        "mutex-lock" => eval_mutex_lock(args, env).await,
        "mutex-unlock" => eval_mutex_unlock(args, env).await,
        "condvar-new" => eval_condvar_new(args, env),
        "condvar-wait" => eval_condvar_wait(args, env).await,
        "condvar-notify-one" => eval_condvar_notify(args, env, false).await,
        "condvar-notify-all" => eval_condvar_notify(args, env, true).await,
        "sleep" => eval_sleep(args, env).await,
        "cleanup-push" => eval_cleanup_push(args, env).await,
        "cleanup-pop" => eval_cleanup_pop(args, env),
        "disable-interruption" => eval_disable_interruption(args, env),
        "restore-interruption" => eval_restore_interruption(args, env),
        "check-interrupted" => eval_check_interrupted(args, env),
        _ => return None,
    };
    Some(result)
}

async fn eval_scope(args: &[Arc<Expression>], env: &mut Environment) -> Result<Value> {
    let engine = require_engine(env)?;
    let fiber = require_fiber(&engine)?;

    engine.enter_scope(fiber);
    let result = eval_sequence_async(args, env).await;
    let cleanup_result = engine.exit_scope(fiber);

    match (result, cleanup_result) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(cleanup_err)) => Err(cleanup_err),
        (Err(err), _) => Err(err),
    }
}

async fn eval_join(args: &[Arc<Expression>], env: &mut Environment) -> Result<Value> {
    if args.len() != 1 {
        return Err(Error::arity_error("join", 1, args.len()));
    }
    let engine = require_engine(env)?;
    let target = eval_async(Arc::clone(&args[0]), env.clone()).await?;
    let fiber = expect_fiber("join", target)?;
    engine.join(fiber).await
}

async fn eval_interrupt(args: &[Arc<Expression>], env: &mut Environment) -> Result<Value> {
    if args.len() != 1 {
        return Err(Error::arity_error("interrupt", 1, args.len()));
    }
    let engine = require_engine(env)?;
    let target = eval_async(Arc::clone(&args[0]), env.clone()).await?;
    let fiber = expect_fiber("interrupt", target)?;
    engine.interrupt(fiber);
    Ok(Value::Nil)
}

fn eval_mutex_new(args: &[Arc<Expression>], env: &mut Environment) -> Result<Value> {
    if !args.is_empty() {
        return Err(Error::arity_error("mutex-new", 0, args.len()));
    }
    let engine = require_engine(env)?;
    Ok(Value::mutex(Mutex::new(engine)))
}

async fn eval_mutex_lock(args: &[Arc<Expression>], env: &mut Environment) -> Result<Value> {
    if args.len() != 1 {
        return Err(Error::arity_error("mutex-lock", 1, args.len()));
    }
    let target = eval_async(Arc::clone(&args[0]), env.clone()).await?;
    let mutex = expect_mutex("mutex-lock", target)?;
    mutex.lock().await?;
    Ok(Value::Nil)
}

async fn eval_mutex_unlock(args: &[Arc<Expression>], env: &mut Environment) -> Result<Value> {
    if args.len() != 1 {
        return Err(Error::arity_error("mutex-unlock", 1, args.len()));
    }
    let engine = require_engine(env)?;
    let fiber = require_fiber(&engine)?;
    let target = eval_async(Arc::clone(&args[0]), env.clone()).await?;
    let mutex = expect_mutex("mutex-unlock", target)?;
    mutex.unlock(fiber)?;
    Ok(Value::Nil)
}

fn eval_condvar_new(args: &[Arc<Expression>], env: &mut Environment) -> Result<Value> {
    if !args.is_empty() {
        return Err(Error::arity_error("condvar-new", 0, args.len()));
    }
    let engine = require_engine(env)?;
    Ok(Value::condvar(CondVar::new(engine)))
}

async fn eval_condvar_wait(args: &[Arc<Expression>], env: &mut Environment) -> Result<Value> {
    if args.len() != 2 {
        return Err(Error::arity_error("condvar-wait", 2, args.len()));
    }
    let condvar_value = eval_async(Arc::clone(&args[0]), env.clone()).await?;
    let mutex_value = eval_async(Arc::clone(&args[1]), env.clone()).await?;
    let condvar = expect_condvar("condvar-wait", condvar_value)?;
    let mutex = expect_mutex("condvar-wait", mutex_value)?;
    condvar.wait(&mutex).await?;
    Ok(Value::Nil)
}

async fn eval_condvar_notify(
    args: &[Arc<Expression>],
    env: &mut Environment,
    all: bool,
) -> Result<Value> {
    let name = if all { "condvar-notify-all" } else { "condvar-notify-one" };
    if args.len() != 1 {
        return Err(Error::arity_error(name, 1, args.len()));
    }
    let target = eval_async(Arc::clone(&args[0]), env.clone()).await?;
    let condvar = expect_condvar(name, target)?;
    if all {
        condvar.notify_all();
    } else {
        condvar.notify_one();
    }
    Ok(Value::Nil)
}

async fn eval_sleep(args: &[Arc<Expression>], env: &mut Environment) -> Result<Value> {
    if args.len() != 1 {
        return Err(Error::arity_error("sleep", 1, args.len()));
    }
    let engine = require_engine(env)?;
    let fiber = require_fiber(&engine)?;
    let seconds_value = eval_async(Arc::clone(&args[0]), env.clone()).await?;
    let seconds = seconds_value
        .as_number()
        .ok_or_else(|| Error::type_error("sleep", "number", seconds_value.type_name(), Some(1)))?;
    if seconds < 0.0 {
        return Err(Error::runtime_error("sleep: duration must not be negative"));
    }
    sleep_for(engine, fiber, std::time::Duration::from_secs_f64(seconds)).await?;
    Ok(Value::Nil)
}

async fn eval_cleanup_push(args: &[Arc<Expression>], env: &mut Environment) -> Result<Value> {
    if args.len() != 1 {
        return Err(Error::arity_error("cleanup-push", 1, args.len()));
    }
    let engine = require_engine(env)?;
    let fiber = require_fiber(&engine)?;
    let thunk = eval_async(Arc::clone(&args[0]), env.clone()).await?;
    let procedure = match thunk {
        Value::Procedure(p) => p,
        other => {
            return Err(Error::type_error(
                "cleanup-push",
                "procedure",
                other.type_name(),
                Some(1),
            ));
        }
    };

    engine.scope_cleanup_push(
        fiber,
        Box::new(move || call_zero_arg_sync(&procedure).map(|_| ())),
    );
    Ok(Value::Nil)
}

/// Invoke a zero-argument procedure synchronously. Cleanup handlers run
/// with interruption disabled and are not expected to suspend, so they go
/// through the synchronous evaluator's procedure-calling path rather than
/// this module's async one.
fn call_zero_arg_sync(procedure: &Procedure) -> Result<Value> {
    match procedure {
        Procedure::Builtin(builtin) => (*builtin).call(&[]),
        Procedure::Lambda(lambda) => {
            crate::runtime::eval::procedure::call_lambda(lambda.clone(), Vec::new())
        }
    }
}

/// Remove the top handler of the current scope and run it immediately,
/// mirroring `scope_cleanup_push`'s counterpart described in the engine's
/// scope-cleanup stack: interruption is disabled for the duration of the
/// handler and restored once it returns. Errors with `unmatched_scope_cleanup`
/// if there is nothing left to pop.
fn eval_cleanup_pop(args: &[Arc<Expression>], env: &mut Environment) -> Result<Value> {
    if !args.is_empty() {
        return Err(Error::arity_error("cleanup-pop", 0, args.len()));
    }
    let engine = require_engine(env)?;
    let fiber = require_fiber(&engine)?;
    let handler = engine.scope_cleanup_pop(fiber)?;
    let result = handler();
    engine.restore_interruption(fiber)?;
    if let Err(ref e) = result {
        engine.notify_cleanup_error(e);
    }
    result.map(|_| Value::Nil)
}

fn eval_disable_interruption(args: &[Arc<Expression>], env: &mut Environment) -> Result<Value> {
    if !args.is_empty() {
        return Err(Error::arity_error("disable-interruption", 0, args.len()));
    }
    let engine = require_engine(env)?;
    let fiber = require_fiber(&engine)?;
    engine.disable_interruption(fiber);
    Ok(Value::Nil)
}

fn eval_restore_interruption(args: &[Arc<Expression>], env: &mut Environment) -> Result<Value> {
    if !args.is_empty() {
        return Err(Error::arity_error("restore-interruption", 0, args.len()));
    }
    let engine = require_engine(env)?;
    let fiber = require_fiber(&engine)?;
    engine.restore_interruption(fiber)?;
    Ok(Value::Nil)
}

fn eval_check_interrupted(args: &[Arc<Expression>], env: &mut Environment) -> Result<Value> {
    if !args.is_empty() {
        return Err(Error::arity_error("check-interrupted", 0, args.len()));
    }
    let engine = require_engine(env)?;
    let fiber = require_fiber(&engine)?;
    engine.check_not_interrupted(fiber)?;
    Ok(Value::Nil)
}
