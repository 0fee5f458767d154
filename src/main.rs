//! CLI entry point: runs a Scheme script as the VM's root fiber, or drops
//! into an interactive REPL when no script path is given.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser as ClapParser;
use twine_engine::repl::Repl;
use twine_engine::runtime::Environment;
use twine_engine::runtime::eval_async::eval_sequence_async;
use twine_engine::{Engine, parser::Parser};

/// Twine: a Scheme front end with fiber-based structured concurrency.
#[derive(ClapParser, Debug)]
#[command(name = "twine", version, about, long_about = None)]
struct Cli {
    /// Path to a Scheme script to run. Omit to start an interactive REPL.
    script: Option<PathBuf>,

    /// Hint for how many OS threads the host may dedicate to this VM's
    /// strand pool. The scheduler itself is single-threaded per VM
    /// regardless of this value; it is advisory plumbing for a future
    /// multi-VM host, accepted here so the CLI surface matches it.
    #[arg(long, value_name = "N")]
    main_context_concurrency_hint: Option<usize>,

    /// Module search roots (colon/semicolon-separated per the host OS).
    /// Accepted for compatibility with the CLI surface; this engine does
    /// not implement module loading, so the value is parsed and logged
    /// but otherwise unused.
    #[arg(long, env = "TWINE_PATH", hide_env_values = true)]
    module_path: Option<std::ffi::OsString>,

    /// ON/OFF/1/0/YES/NO/TRUE/FALSE; controls whether log output is
    /// colorized.
    #[arg(long, env = "TWINE_COLORS", hide_env_values = true)]
    colors: Option<String>,

    /// Integer log verbosity, forwarded to env_logger's filter:
    /// 0=error, 1=warn, 2=info (default), 3=debug, 4=trace.
    #[arg(long, env = "TWINE_LOG_LEVELS", hide_env_values = true)]
    log_levels: Option<i32>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    if let Some(hint) = cli.main_context_concurrency_hint {
        log::debug!("main-context-concurrency-hint = {hint} (advisory; this VM is single-threaded)");
    }
    if let Some(path) = &cli.module_path {
        let roots: Vec<_> = std::env::split_paths(path).collect();
        log::debug!("module search roots (unused by this engine): {roots:?}");
    }

    match cli.script {
        Some(path) => run_script(&path),
        None => {
            Repl::new().run().expect("REPL I/O failure");
            ExitCode::SUCCESS
        }
    }
}

fn init_logging(cli: &Cli) {
    let mut builder = env_logger::Builder::new();

    let level = match cli.log_levels {
        Some(0) => log::LevelFilter::Error,
        Some(1) => log::LevelFilter::Warn,
        Some(2) => log::LevelFilter::Info,
        Some(3) => log::LevelFilter::Debug,
        Some(n) if n >= 4 => log::LevelFilter::Trace,
        _ => log::LevelFilter::Info,
    };
    builder.filter_level(level);

    if let Some(colors) = &cli.colors {
        let write_style = if parse_bool_flag(colors) {
            env_logger::WriteStyle::Always
        } else {
            env_logger::WriteStyle::Never
        };
        builder.write_style(write_style);
    }

    builder.init();
}

fn parse_bool_flag(value: &str) -> bool {
    matches!(
        value.to_ascii_uppercase().as_str(),
        "ON" | "1" | "YES" | "TRUE"
    )
}

/// Load `path`, run it to completion as the VM's root fiber, and map the
/// result onto a process exit code: 0 on success, nonzero if the root
/// fiber finishes with an uncaught error (including one raised while
/// loading/parsing the script).
fn run_script(path: &PathBuf) -> ExitCode {
    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("twine: failed to read {}: {err}", path.display());
            return ExitCode::FAILURE;
        }
    };

    let mut parser = match Parser::new(source) {
        Ok(parser) => parser,
        Err(err) => {
            eprintln!("twine: {err}");
            return ExitCode::FAILURE;
        }
    };

    let exprs = match parser.parse_all() {
        Ok(exprs) => exprs,
        Err(err) => {
            eprintln!("twine: {err}");
            return ExitCode::FAILURE;
        }
    };

    let engine = Engine::new();
    let env = Environment::new();
    env.bind_engine(engine.clone());

    let body: Vec<Arc<_>> = exprs
        .into_iter()
        .map(|positioned| Arc::new(positioned.expr))
        .collect();
    let root = engine.spawn_fiber(move || {
        Box::pin(async move {
            let mut fiber_env = env;
            eval_sequence_async(&body, &mut fiber_env).await
        })
    });

    match engine.run_to_completion(root) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("uncaught error in root fiber: {err}");
            eprintln!("twine: {err}");
            ExitCode::FAILURE
        }
    }
}

