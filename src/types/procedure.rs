//! Callable values: built-ins and user-defined lambdas with closures
//!
//! Procedures are split into two cases. A `Builtin` is one of the fixed
//! native operations in [`crate::runtime::builtins`] — arity and behavior
//! live there, not here. A `Lambda` captures its parameter list, body, and
//! defining [`Environment`] at the point `(lambda ...)` is evaluated; since
//! `Environment` is a cheap handle onto a shared, mutable scope, the lambda
//! and its defining scope observe the same later `define`s, which is what
//! makes recursive and mutually-recursive `letrec` bindings work without any
//! separate placeholder/patching step.

use crate::parser::Expression;
use crate::runtime::builtins::Builtin;
use crate::runtime::environment::Environment;
use crate::types::Symbol;
use std::sync::Arc;

/// A user-defined procedure created by `(lambda (params...) body...)`.
#[derive(Debug, Clone)]
pub struct Lambda {
    pub params: Vec<Symbol>,
    /// Accepts a trailing "rest" parameter, e.g. `(lambda (a b . rest) ...)`.
    pub rest_param: Option<Symbol>,
    pub body: Vec<Arc<Expression>>,
    pub env: Environment,
    /// Display name, if bound via `(define (name ...) ...)`; used in errors.
    pub name: Option<Symbol>,
}

impl Lambda {
    pub fn new(
        params: Vec<Symbol>,
        rest_param: Option<Symbol>,
        body: Vec<Arc<Expression>>,
        env: Environment,
    ) -> Self {
        Lambda {
            params,
            rest_param,
            body,
            env,
            name: None,
        }
    }

    pub fn with_name(mut self, name: Symbol) -> Self {
        self.name = Some(name);
        self
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn display_name(&self) -> &str {
        self.name.as_ref().map(Symbol::as_str).unwrap_or("lambda")
    }

    pub fn params(&self) -> &[Symbol] {
        &self.params
    }

    pub fn body(&self) -> &[Arc<Expression>] {
        &self.body
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }
}

/// Display-equality only: two lambdas are equal iff they are the very same
/// closure (same `Arc`); structural equality on body/params is not attempted
/// since that would have to ignore the captured environment anyway.
impl PartialEq for Lambda {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl std::fmt::Display for Lambda {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "#<procedure:{name}>"),
            None => write!(f, "#<procedure>"),
        }
    }
}

/// Any callable Scheme value.
#[derive(Debug, Clone, PartialEq)]
pub enum Procedure {
    Builtin(Builtin),
    Lambda(Arc<Lambda>),
}

impl Procedure {
    pub fn lambda(lambda: Lambda) -> Self {
        Procedure::Lambda(Arc::new(lambda))
    }

    pub fn name(&self) -> &str {
        match self {
            Procedure::Builtin(builtin) => builtin.name(),
            Procedure::Lambda(lambda) => lambda.display_name(),
        }
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, Procedure::Builtin(_))
    }

    pub fn is_lambda(&self) -> bool {
        matches!(self, Procedure::Lambda(_))
    }

    /// Number of required parameters, if this is a lambda (`None` for builtins,
    /// whose arity is checked internally by their `call`).
    pub fn arity(&self) -> Option<usize> {
        match self {
            Procedure::Builtin(_) => None,
            Procedure::Lambda(lambda) => Some(lambda.arity()),
        }
    }

    pub fn params(&self) -> Option<&[Symbol]> {
        match self {
            Procedure::Builtin(_) => None,
            Procedure::Lambda(lambda) => Some(lambda.params()),
        }
    }

    pub fn body(&self) -> Option<&[Arc<Expression>]> {
        match self {
            Procedure::Builtin(_) => None,
            Procedure::Lambda(lambda) => Some(lambda.body()),
        }
    }

    pub fn env(&self) -> Option<&Environment> {
        match self {
            Procedure::Builtin(_) => None,
            Procedure::Lambda(lambda) => Some(lambda.env()),
        }
    }
}

impl std::fmt::Display for Procedure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Procedure::Builtin(builtin) => write!(f, "#<builtin:{}>", builtin.name()),
            Procedure::Lambda(lambda) => write!(f, "{lambda}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;

    #[test]
    fn builtin_procedure_identity() {
        let proc = Procedure::Builtin(Builtin::Car);
        assert!(proc.is_builtin());
        assert_eq!(proc.name(), "car");
    }

    #[test]
    fn lambda_procedure_reports_arity_and_name() {
        let env = Environment::new();
        let lambda = Lambda::new(
            vec![Symbol::new("x"), Symbol::new("y")],
            None,
            vec![Expression::arc_atom(Value::symbol("x"))],
            env,
        )
        .with_name(Symbol::new("my-proc"));
        let proc = Procedure::lambda(lambda);
        assert!(proc.is_lambda());
        assert_eq!(proc.name(), "my-proc");
    }

    #[test]
    fn two_distinct_lambdas_are_not_equal() {
        let env = Environment::new();
        let a = Procedure::lambda(Lambda::new(vec![], None, vec![], env.clone()));
        let b = Procedure::lambda(Lambda::new(vec![], None, vec![], env));
        assert_ne!(a, b);
        assert_eq!(a.clone(), a);
    }
}
