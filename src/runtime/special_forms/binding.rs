//! Binding and definition special forms
//!
//! This module implements binding special forms like `define` and `let`.

use crate::Error;
use crate::error::Result;
use crate::parser::Expression;
use crate::runtime::special_forms::lambda::{parse_parameters, validate_unique_parameters};
use crate::runtime::{environment::Environment, eval::eval};
use crate::types::{Lambda, Procedure, Symbol, Value};
use std::sync::Arc;

/// Evaluate a define special form
///
/// Syntax:
/// - Binding definition: (define <identifier> <expression>)
/// - Procedure definition: (define (<identifier> <param>...) <body>...)
///
/// For binding definition:
/// - Evaluates <expression> and binds the result to <identifier> in the current environment
/// - Returns Nil
///
/// For procedure definition (syntactic sugar):
/// - (define (name param1 param2) body1 body2...)
/// - Equivalent to: (define name (lambda (param1 param2) body1 body2...))
pub fn eval_define(args: &[Arc<Expression>], env: &mut Environment) -> Result<Value> {
    if args.is_empty() {
        return Err(Error::arity_error("define", 2, 0));
    }

    let first_arg = Arc::clone(&args[0]);
    match first_arg.as_ref() {
        // Binding definition: (define identifier expression)
        Expression::Atom(Value::Symbol(identifier)) => {
            eval_define_binding(identifier, &args[1..], env)
        }

        // Procedure definition: (define (name param...) body...)
        Expression::List(param_elements) => eval_define_procedure(param_elements, &args[1..], env),

        _ => Err(Error::runtime_error(
            "define: first argument must be a symbol or parameter list",
        )),
    }
}

/// Handle variable binding: (define identifier expression)
///
/// Since `env` is a cheap handle onto a shared, mutable scope, a lambda
/// expression evaluated here captures `env` itself as its closure. Defining
/// `identifier` into that same scope afterwards is all recursion needs:
/// the lambda's body resolves `identifier` through the shared scope at call
/// time, well after this `define` has run.
fn eval_define_binding(
    identifier: &Symbol,
    value_exprs: &[Arc<Expression>],
    env: &mut Environment,
) -> Result<Value> {
    if value_exprs.len() != 1 {
        return Err(Error::arity_error("define", 2, value_exprs.len() + 1));
    }

    let value_expr = Arc::clone(&value_exprs[0]);
    let value = eval(value_expr, env)?;
    env.define(identifier.clone(), value);

    Ok(Value::Nil)
}

/// Handle procedure definition: (define (name param...) body...)
fn eval_define_procedure(
    param_elements: &[Arc<Expression>],
    args: &[Arc<Expression>],
    env: &mut Environment,
) -> Result<Value> {
    if param_elements.is_empty() {
        return Err(Error::runtime_error(
            "define: procedure definition requires non-empty parameter list",
        ));
    }

    // Extract procedure name
    let identifier = match param_elements[0].as_ref() {
        Expression::Atom(Value::Symbol(name)) => name.clone(),
        _ => {
            return Err(Error::runtime_error(
                "define: procedure name must be a symbol",
            ));
        }
    };

    // Extract and validate parameters
    let params = parse_parameters(&param_elements[1..])?;
    validate_unique_parameters(&params)?;

    // Validate procedure body
    if args.is_empty() {
        return Err(Error::runtime_error(
            "define: procedure definition requires at least one body expression",
        ));
    }

    // Collect all body expressions
    let body_exprs = args.iter().map(Arc::clone).collect();

    // The lambda captures `env` itself; defining `identifier` into it below
    // is enough to make the procedure callable recursively.
    let lambda = Lambda::new(params, None, body_exprs, env.clone()).with_name(identifier.clone());
    env.define(identifier, Value::Procedure(Procedure::lambda(lambda)));
    Ok(Value::Nil)
}

/// Evaluate a let special form
///
/// Syntax: (let ((id1 expr1) (id2 expr2) ...) body1 body2 ...)
///
/// Semantics:
/// 1. Evaluate all expressions (expr1, expr2, ...) in the current environment
/// 2. Create a new environment with current environment as parent
/// 3. Bind identifiers (id1, id2, ...) to their evaluated values simultaneously
/// 4. Evaluate body expressions sequentially in the new environment
/// 5. Return the value of the last body expression
pub fn eval_let(args: &[Arc<Expression>], env: &mut Environment) -> Result<Value> {
    if args.is_empty() {
        return Err(Error::arity_error("let", 1, 0));
    }

    // First argument must be the binding list
    let bindings_expr = Arc::clone(&args[0]);
    let body_exprs = &args[1..];

    if body_exprs.is_empty() {
        return Err(Error::runtime_error(
            "let: requires at least one body expression",
        ));
    }

    // Parse binding list: ((var1 expr1) (var2 expr2) ...)
    let binding_pairs = match bindings_expr.as_ref() {
        Expression::List(pairs) => pairs,
        _ => {
            return Err(Error::runtime_error(
                "let: first argument must be a list of bindings",
            ));
        }
    };

    // Parse and validate each binding pair
    let mut identifiers = Vec::with_capacity(binding_pairs.len());
    let mut expressions = Vec::with_capacity(binding_pairs.len());

    for pair in binding_pairs {
        match pair.as_ref() {
            Expression::List(elements) => {
                if elements.len() != 2 {
                    return Err(Error::runtime_error(
                        "let: each binding must be a list of exactly 2 elements (identifier expression)",
                    ));
                }

                // First element must be a symbol (identifier name)
                let identifier = match elements[0].as_ref() {
                    Expression::Atom(Value::Symbol(sym)) => sym.clone(),
                    _ => {
                        return Err(Error::runtime_error(
                            "let: binding identifier must be a symbol",
                        ));
                    }
                };

                // Second element is the expression to evaluate
                let expression = Arc::clone(&elements[1]);

                identifiers.push(identifier);
                expressions.push(expression);
            }
            _ => {
                return Err(Error::runtime_error("let: each binding must be a list"));
            }
        }
    }

    // Evaluate all expressions in the current environment BEFORE creating bindings
    let mut values = Vec::with_capacity(expressions.len());
    for expr in expressions {
        let value = eval(expr, env)?;
        values.push(value);
    }

    // Create new environment with current environment as parent
    let mut let_env = Environment::new_scope(env);

    // Bind all identifiers simultaneously in the new environment
    for (identifier, value) in identifiers.into_iter().zip(values.into_iter()) {
        let_env.define(identifier, value);
    }

    // Evaluate body expressions sequentially in new environment
    let mut result = Value::Nil;
    for body_expr in body_exprs {
        result = eval(Arc::clone(body_expr), &mut let_env)?;
    }

    Ok(result)
}

/// Evaluate a letrec special form
///
/// Syntax: (letrec ((id1 expr1) (id2 expr2) ...) body1 body2 ...)
///
/// Non-lambda bindings are evaluated and defined one at a time, in order, so
/// later bindings may reference earlier ones directly. Lambda bindings are
/// all evaluated first (capturing the shared `letrec_env`) and only defined
/// afterwards, so mutually recursive lambdas can reference each other: their
/// bodies resolve identifiers through `letrec_env` at call time, by which
/// point every binding has been defined.
///
/// Returns the value of the last body expression.
pub fn eval_letrec(args: &[Arc<Expression>], env: &mut Environment) -> Result<Value> {
    if args.is_empty() {
        return Err(Error::arity_error("letrec", 1, 0));
    }

    // First argument must be the binding list
    let bindings_expr = Arc::clone(&args[0]);
    let body_exprs = &args[1..];

    if body_exprs.is_empty() {
        return Err(Error::arity_error("letrec", 2, args.len()));
    }

    // Parse binding list
    let binding_elements = match bindings_expr.as_ref() {
        Expression::List(elements) => elements,
        Expression::Atom(atom) => {
            return Err(Error::parse_error(&format!(
                "letrec: binding list must be a list, got {}",
                atom.type_name()
            )));
        }
        Expression::Quote(_) => {
            return Err(Error::parse_error(
                "letrec: binding list must be a list, got quote",
            ));
        }
    };

    // Parse and validate individual bindings
    let mut identifiers = Vec::with_capacity(binding_elements.len());
    let mut value_exprs = Vec::with_capacity(binding_elements.len());

    for binding_expr in binding_elements {
        let binding_elements = match binding_expr.as_ref() {
            Expression::List(elements) => elements,
            Expression::Atom(atom) => {
                return Err(Error::parse_error(&format!(
                    "letrec: binding must be a list, got {}",
                    atom.type_name()
                )));
            }
            Expression::Quote(_) => {
                return Err(Error::parse_error(
                    "letrec: binding must be a list, got quote",
                ));
            }
        };

        if binding_elements.len() != 2 {
            return Err(Error::parse_error(&format!(
                "letrec: binding must have exactly 2 elements (identifier and expression), got {}",
                binding_elements.len()
            )));
        }

        // Extract identifier
        let identifier = match binding_elements[0].as_ref() {
            Expression::Atom(Value::Symbol(id)) => id.clone(),
            Expression::Atom(other) => {
                return Err(Error::parse_error(&format!(
                    "letrec: identifier must be a symbol, got {}",
                    other.type_name()
                )));
            }
            Expression::List(_) => {
                return Err(Error::parse_error(
                    "letrec: identifier must be a symbol, got list",
                ));
            }
            Expression::Quote(_) => {
                return Err(Error::parse_error(
                    "letrec: identifier must be a symbol, got quote",
                ));
            }
        };

        // Extract value expression
        let value_expr = Arc::clone(&binding_elements[1]);

        // Check for duplicate identifiers
        if identifiers.contains(&identifier) {
            return Err(Error::parse_error(&format!(
                "letrec: duplicate identifier '{}'",
                identifier
            )));
        }

        identifiers.push(identifier);
        value_exprs.push(value_expr);
    }

    // Create new environment extending the current one
    let mut letrec_env = Environment::new_scope(env);

    // Phase 1: Identify lambda and non-lambda expressions
    let mut lambda_indices = Vec::new();
    let mut non_lambda_indices = Vec::new();

    for (i, value_expr) in value_exprs.iter().enumerate() {
        let is_lambda = matches!(
            value_expr.as_ref(),
            Expression::List(elements) if !elements.is_empty() && matches!(
                elements[0].as_ref(),
                Expression::Atom(Value::Symbol(sym)) if sym.as_str() == "lambda"
            )
        );

        if is_lambda {
            lambda_indices.push(i);
        } else {
            non_lambda_indices.push(i);
        }
    }

    // Phase 2: Evaluate non-lambda expressions first and add them to environment
    for &i in &non_lambda_indices {
        let value = eval(Arc::clone(&value_exprs[i]), &mut letrec_env)?;
        letrec_env.define(identifiers[i].clone(), value);
    }

    // Phase 3: Evaluate lambda expressions, capturing `letrec_env` as their closure.
    // None are defined yet, so a lambda referencing a sibling lambda only resolves
    // it once that sibling is called, by which point phase 4 has run.
    let mut lambda_values = Vec::with_capacity(lambda_indices.len());
    for &i in &lambda_indices {
        let lambda_value = eval(Arc::clone(&value_exprs[i]), &mut letrec_env)?;
        lambda_values.push(lambda_value);
    }

    // Phase 4: Define all lambda bindings in the shared scope.
    for (&i, lambda_value) in lambda_indices.iter().zip(lambda_values.iter()) {
        letrec_env.define(identifiers[i].clone(), lambda_value.clone());
    }

    // Evaluate body expressions sequentially in the final environment
    let mut result = Value::Nil;
    for body_expr in body_exprs {
        result = eval(Arc::clone(body_expr), &mut letrec_env)?;
    }

    Ok(result)
}
