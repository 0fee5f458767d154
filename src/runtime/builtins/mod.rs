//! Builtin procedures for the Twine Scheme runtime
//!
//! This module contains all built-in procedures organized by category.
//! These procedures are automatically available in the global environment.

use crate::error::Result;
use crate::types::Value;

/// Enumeration of all built-in procedures
///
/// Each variant represents a specific built-in procedure, eliminating the need
/// to store both function pointers and names. This provides type safety and
/// eliminates redundancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    // Arithmetic operations
    Add,
    Subtract,
    Multiply,
    Divide,

    // Comparison operations
    Equal,
    LessThan,
    GreaterThan,
    LessThanOrEqual,
    GreaterThanOrEqual,

    // List operations
    Car,
    Cdr,
    Cons,
    List,
    NullP,

    // I/O operations
    Display,
    Newline,

    // Type predicates
    NumberP,
    StringP,
    BooleanP,
    SymbolP,
    ListP,
    ProcedureP,
    EqP,
}

impl Builtin {
    /// Get the display name for this builtin procedure
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Add => "+",
            Builtin::Subtract => "-",
            Builtin::Multiply => "*",
            Builtin::Divide => "/",
            Builtin::Equal => "=",
            Builtin::LessThan => "<",
            Builtin::GreaterThan => ">",
            Builtin::LessThanOrEqual => "<=",
            Builtin::GreaterThanOrEqual => ">=",
            Builtin::Car => "car",
            Builtin::Cdr => "cdr",
            Builtin::Cons => "cons",
            Builtin::List => "list",
            Builtin::NullP => "null?",
            Builtin::Display => "display",
            Builtin::Newline => "newline",
            Builtin::NumberP => "number?",
            Builtin::StringP => "string?",
            Builtin::BooleanP => "boolean?",
            Builtin::SymbolP => "symbol?",
            Builtin::ListP => "list?",
            Builtin::ProcedureP => "procedure?",
            Builtin::EqP => "eq?",
        }
    }

    /// Execute this builtin procedure with the given arguments
    pub fn call(self, args: &[Value]) -> Result<Value> {
        match self {
            Builtin::Add => add(args),
            Builtin::Subtract => subtract(args),
            Builtin::Multiply => multiply(args),
            Builtin::Divide => divide(args),
            Builtin::Equal => equal(args),
            Builtin::LessThan => less_than(args),
            Builtin::GreaterThan => greater_than(args),
            Builtin::LessThanOrEqual => less_than_or_equal(args),
            Builtin::GreaterThanOrEqual => greater_than_or_equal(args),
            Builtin::Car => car(args),
            Builtin::Cdr => cdr(args),
            Builtin::Cons => cons(args),
            Builtin::List => list(args),
            Builtin::NullP => null_p(args),
            Builtin::Display => display(args),
            Builtin::Newline => newline(args),
            Builtin::NumberP => number_p(args),
            Builtin::StringP => string_p(args),
            Builtin::BooleanP => boolean_p(args),
            Builtin::SymbolP => symbol_p(args),
            Builtin::ListP => list_p(args),
            Builtin::ProcedureP => procedure_p(args),
            Builtin::EqP => eq_p(args),
        }
    }

    /// Parse a builtin procedure name into its corresponding Builtin
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "+" => Some(Builtin::Add),
            "-" => Some(Builtin::Subtract),
            "*" => Some(Builtin::Multiply),
            "/" => Some(Builtin::Divide),
            "=" => Some(Builtin::Equal),
            "<" => Some(Builtin::LessThan),
            ">" => Some(Builtin::GreaterThan),
            "<=" => Some(Builtin::LessThanOrEqual),
            ">=" => Some(Builtin::GreaterThanOrEqual),
            "car" => Some(Builtin::Car),
            "cdr" => Some(Builtin::Cdr),
            "cons" => Some(Builtin::Cons),
            "list" => Some(Builtin::List),
            "null?" => Some(Builtin::NullP),
            "display" => Some(Builtin::Display),
            "newline" => Some(Builtin::Newline),
            "number?" => Some(Builtin::NumberP),
            "string?" => Some(Builtin::StringP),
            "boolean?" => Some(Builtin::BooleanP),
            "symbol?" => Some(Builtin::SymbolP),
            "list?" => Some(Builtin::ListP),
            "procedure?" => Some(Builtin::ProcedureP),
            "eq?" => Some(Builtin::EqP),
            _ => None,
        }
    }
}

pub mod arithmetic;
pub mod comparison;
pub mod io;
pub mod list;
pub mod predicates;

// Re-export arithmetic functions for convenience
pub use arithmetic::{add, divide, multiply, subtract};

// Re-export comparison functions for convenience
pub use comparison::{equal, greater_than, greater_than_or_equal, less_than, less_than_or_equal};

// Re-export list functions for convenience
pub use list::{car, cdr, cons, list, null_p};

// Re-export I/O functions for convenience
pub use io::{display, newline};

// Re-export predicate functions for convenience
pub use predicates::{boolean_p, eq_p, list_p, number_p, procedure_p, string_p, symbol_p};
