//! Twine Engine
//!
//! A minimalist Scheme front end (lexer, parser, tree-walking evaluator)
//! wired to a cooperative fiber scheduler: the [`engine`] module hosts
//! fibers on top of `smol`'s single-threaded executor, with mutexes,
//! condition variables, an interruption facility, and a structured-
//! concurrency scope-cleanup stack built on top of it. Script-level
//! concurrency (`async`, `mutex-lock`, `condvar-wait`, `sleep`, `scope`,
//! `interrupt`, ...) is implemented in [`runtime::eval_async`] against
//! that engine.

pub mod engine;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod repl;
pub mod runtime;
pub mod types;

pub use engine::{Engine, EngineError};
pub use error::{Error, Result};
