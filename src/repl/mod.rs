//! Interactive REPL (Read-Eval-Print Loop) for the Twine Scheme interpreter.
//!
//! Provides an enhanced command-line interface with multi-line input support
//! using standard I/O without external dependencies.

use std::io::{self, Write};

use crate::{
    Engine, Error,
    lexer::{Lexer, Token},
    parser::Parser,
    runtime::{Environment, eval_async::eval_async},
    types::Value,
};

/// REPL configuration and state management
pub struct Repl {
    env: Environment,
}

impl Repl {
    /// Create a new REPL instance. Binds a fresh [`Engine`] to the
    /// top-level environment so `async`, `mutex-lock`, `sleep`, and the
    /// other concurrency forms work directly at the prompt, just as they
    /// would in a loaded script.
    pub fn new() -> Self {
        let env = Environment::new();
        env.bind_engine(Engine::new());
        Self { env }
    }

    /// Run the interactive REPL loop
    pub fn run(&mut self) -> io::Result<()> {
        println!("Twine Scheme Interpreter");
        println!("Type expressions to evaluate, or Ctrl+C to exit.");
        println!();

        loop {
            match self.read_complete_expression() {
                Ok(Some(input)) => {
                    // Evaluate and print
                    match eval_source(&input, &self.env) {
                        Ok(value) => println!("{value}"),
                        Err(error) => eprintln!("Error: {error}"),
                    }
                }
                Ok(None) => {
                    // EOF (Ctrl+D)
                    println!("\nGoodbye!");
                    break;
                }
                Err(error) => {
                    eprintln!("Input error: {error}");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Read a complete S-expression with multi-line support
    fn read_complete_expression(&mut self) -> io::Result<Option<String>> {
        let mut input = String::new();
        let mut line_buffer = String::new();

        // Read first line with prompt
        print!("twine> ");
        io::stdout().flush()?;

        line_buffer.clear();
        match io::stdin().read_line(&mut line_buffer)? {
            0 => return Ok(None), // EOF
            _ => input.push_str(&line_buffer),
        }

        let trimmed_input = input.trim();
        if trimmed_input.is_empty() {
            return Ok(Some(String::new()));
        }

        // Check if expression is already complete
        match is_expression_complete(trimmed_input) {
            Ok(true) => return Ok(Some(trimmed_input.to_string())),
            Ok(false) => {} // Continue reading
            Err(_) => return Ok(Some(trimmed_input.to_string())),
        }

        // Continue reading lines for incomplete expressions
        loop {
            line_buffer.clear();
            match io::stdin().read_line(&mut line_buffer)? {
                0 => break, // EOF - treat as completing current expression
                _ => {
                    input.push_str(&line_buffer);
                    let trimmed_input = input.trim();

                    match is_expression_complete(trimmed_input) {
                        Ok(true) => break,
                        Ok(false) => continue,
                        Err(_) => break,
                    }
                }
            }
        }

        let trimmed_input = input.trim();
        if trimmed_input.is_empty() {
            Ok(Some(String::new()))
        } else {
            Ok(Some(trimmed_input.to_string()))
        }
    }
}

impl Default for Repl {
    fn default() -> Self {
        Self::new()
    }
}

/// Determines if an expression is complete by tokenizing and checking bracket balance
fn is_expression_complete(input: &str) -> Result<bool, Error> {
    let mut lexer = Lexer::new(input.to_string());
    let mut paren_count = 0;
    let mut has_content = false;

    loop {
        let positioned_token = lexer.next_token()?;

        match positioned_token.token {
            Token::LeftParen => {
                paren_count += 1;
                has_content = true;
            }
            Token::RightParen => {
                paren_count -= 1;
                has_content = true;

                // If we go negative, the expression is malformed but complete
                // (let the parser handle the error)
                if paren_count < 0 {
                    return Ok(true);
                }
            }
            Token::Eof => {
                break;
            }
            _ => {
                has_content = true;
            }
        }
    }

    // Expression is complete when:
    // 1. All parentheses are balanced (paren_count == 0)
    // 2. We have some content (not just whitespace)
    Ok(paren_count == 0 && has_content)
}

/// Helper function to evaluate source code strings in the REPL context.
///
/// Each line is run to completion as its own fiber on the REPL's shared
/// engine, so suspending forms (`sleep`, `mutex-lock`, `join`, ...) work
/// the same way at the prompt as they do in a loaded script.
fn eval_source(source: &str, env: &Environment) -> Result<Value, Error> {
    if source.trim().is_empty() {
        return Ok(Value::nil());
    }

    let mut parser = Parser::new(source.to_string())?;
    let expr = parser.parse_expression()?.expr;

    let engine = env
        .engine()
        .ok_or_else(|| Error::runtime_error("repl: no engine bound to this environment"))?;
    let fiber_env = env.clone();
    let fiber = engine.spawn_fiber(move || eval_async(expr, fiber_env));
    engine.run_to_completion(fiber)
}
