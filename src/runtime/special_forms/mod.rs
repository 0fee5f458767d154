//! Special forms for the Twine Scheme runtime
//!
//! This module contains all special forms organized by category.
//! Special forms have unique evaluation rules that differ from normal
//! procedure calls (arguments are not automatically evaluated).

use crate::error::Result;
use crate::parser::Expression;
use crate::runtime::environment::Environment;
use crate::types::Value;
use std::sync::Arc;

/// Enumeration of all special forms
///
/// Each variant represents a specific special form, eliminating the need
/// to store both function pointers and names. This provides type safety and
/// eliminates redundancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialForm {
    // Control flow expressions
    If,

    // Binding and definition forms
    Define,
    Let,
    LetRec,

    // Concurrency forms
    Async,
}

impl SpecialForm {
    /// Get the display name for this special form
    pub fn name(self) -> &'static str {
        match self {
            SpecialForm::If => "if",
            SpecialForm::Define => "define",
            SpecialForm::Let => "let",
            SpecialForm::LetRec => "letrec",
            SpecialForm::Async => "async",
        }
    }

    /// Execute this special form with the given arguments
    pub fn call(self, args: &[Arc<Expression>], env: &mut Environment) -> Result<Value> {
        match self {
            SpecialForm::If => control_flow::eval_if(args, env),
            SpecialForm::Define => binding::eval_define(args, env),
            SpecialForm::Let => binding::eval_let(args, env),
            SpecialForm::LetRec => binding::eval_letrec(args, env),
            SpecialForm::Async => concurrency::eval_async(args, env),
        }
    }

    /// Parse a special form name into its corresponding SpecialForm
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "if" => Some(SpecialForm::If),
            "define" => Some(SpecialForm::Define),
            "let" => Some(SpecialForm::Let),
            "letrec" => Some(SpecialForm::LetRec),
            "async" => Some(SpecialForm::Async),
            _ => None,
        }
    }
}

pub mod binding;
pub mod concurrency;
pub mod control_flow;
pub mod lambda;

/// Dispatch a special form evaluation
///
/// This function serves as the central dispatch point for all special forms.
/// It returns `Some(result)` if the name corresponds to a special form, or
/// `None` if the name is not a special form.
///
/// # Arguments
/// * `name` - The special form name
/// * `args` - The unevaluated argument expressions (special forms control evaluation)
/// * `env` - The environment for evaluation context
///
/// # Returns
/// * `Option<Result<Value>>` - Some(result) for special forms, None for unknown identifiers
pub fn dispatch(
    name: &str,
    args: &[Arc<Expression>],
    env: &mut Environment,
) -> Option<Result<Value>> {
    if name == "lambda" {
        return Some(lambda::eval_lambda(args, env));
    }

    SpecialForm::from_name(name).map(|special_form| special_form.call(args, env))
}
