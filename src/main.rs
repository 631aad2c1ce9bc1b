//! lisp-session - CLI

use std::io::{self, BufRead, IsTerminal};
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use lisp_session::backends::repl::bridge::Prompts;
use lisp_session::backends::repl::terminal::{InputLine, LineTerminalConfig, Terminal};
use lisp_session::backends::repl::worker::{run_stdio_worker, WORKER_STACK_SIZE};
use lisp_session::backends::repl::{
    spawn_process, spawn_thread, LineTerminal, LispBackend, ScriptedTerminal, Session,
    SessionOptions, WorkerFactory,
};
use lisp_session::runtime::DEFAULT_MAX_DEPTH;
use lisp_session::util::config::{self, Isolation, UserConfig};
use lisp_session::util::logger::{self, LogLevel, LOG_ENV};
use lisp_session::{eval_source_with_depth, run_file_with_depth, NAME, VERSION};
use tracing::debug;

/// Interactive Lisp REPL with an isolated, interruptible evaluator
#[derive(Parser, Debug)]
#[command(name = "lisp-session")]
#[command(version = VERSION)]
#[command(about = NAME, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log level: debug, info, warn or error
    #[arg(long, value_name = "LEVEL", global = true)]
    log_level: Option<LogLevel>,

    /// Config file to use instead of the user config
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Where the evaluator runs: thread or process
    #[arg(long, value_name = "MODE", global = true)]
    isolation: Option<Isolation>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the interactive REPL (default)
    Repl,

    /// Evaluate code from the command line
    Eval {
        /// Code to evaluate
        #[arg(value_name = "CODE")]
        code: String,
    },

    /// Evaluate a source file
    Run {
        /// Source file to run
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Serve the evaluation protocol on stdin/stdout (used by process isolation)
    #[command(hide = true)]
    Worker {
        /// Bound on nested evaluation depth
        #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
        max_depth: usize,
    },

    /// Print version information
    Version,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // The worker gets everything it needs on its command line.
    let config = match (&args.command, &args.config) {
        (Some(Commands::Worker { .. }), _) => UserConfig::default(),
        (_, Some(path)) => config::load_from(path).context("Failed to load configuration")?,
        (_, None) => config::load_user_config().context("Failed to load configuration")?,
    };

    let cli_level = if args.verbose {
        Some(LogLevel::Debug)
    } else {
        args.log_level
    };
    let env_level = std::env::var(LOG_ENV).ok();
    let level = logger::resolve_level(cli_level, env_level.as_deref(), config.log.level);
    logger::init_with_level(level);

    if args.verbose {
        eprintln!("{} version: {}", NAME, VERSION);
        eprintln!("Host: {}", std::env::consts::OS);
    }

    let isolation = args.isolation.unwrap_or(config.session.isolation);
    let max_depth = config.session.max_eval_depth;

    match args.command.unwrap_or(Commands::Repl) {
        Commands::Repl => run_repl(config, isolation, level)?,
        Commands::Eval { code } => {
            let output = on_worker_stack(move || eval_source_with_depth(&code, max_depth))?
                .context("Failed to evaluate code")?;
            print_result(&output);
        }
        Commands::Run { file } => {
            let path = file.clone();
            let output = on_worker_stack(move || run_file_with_depth(&path, max_depth))?
                .with_context(|| format!("Failed to run: {}", file.display()))?;
            print_result(&output);
        }
        Commands::Worker { max_depth } => run_worker(max_depth)?,
        Commands::Version => {
            println!("{} {}", NAME, VERSION);
        }
    }

    Ok(())
}

fn print_result(output: &str) {
    if !output.is_empty() {
        println!("{}", output);
    }
}

fn run_repl(
    config: UserConfig,
    isolation: Isolation,
    level: LogLevel,
) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(async move {
        let options = SessionOptions {
            prompts: Prompts {
                primary: config.repl.prompt.clone(),
                continuation: config.repl.continuation_prompt.clone(),
            },
            max_restarts: config.session.max_restarts,
        };
        let spawn_worker = worker_factory(isolation, config.session.max_eval_depth, level)?;
        debug!(%isolation, "starting session");

        if io::stdin().is_terminal() {
            let terminal = LineTerminal::new(LineTerminalConfig {
                vi_mode: config.repl.vi_mode,
                history_file: config.repl.history_file.clone(),
                history_size: config.repl.history_size,
                colors: config.repl.colors,
            })
            .context("Failed to initialize terminal")?;
            println!("{} {} - type :help for assistance, Ctrl-D to exit", NAME, VERSION);
            drive(Session::new(terminal, options, spawn_worker)?).await
        } else {
            let terminal = ScriptedTerminal::from_lines(read_piped_lines()?).with_echo();
            drive(Session::new(terminal, options, spawn_worker)?).await
        }
    })
}

async fn drive<T: Terminal>(mut session: Session<T>) -> Result<()> {
    let result = session.run().await;
    session.dispose().await;
    result.context("REPL session failed")
}

/// Piped stdin, split into lines without assuming valid UTF-8
fn read_piped_lines() -> Result<Vec<InputLine>> {
    io::stdin()
        .lock()
        .split(b'\n')
        .map(|bytes| {
            bytes
                .map(|bytes| InputLine::from_bytes(&bytes))
                .context("Failed to read stdin")
        })
        .collect()
}

fn worker_factory(
    isolation: Isolation,
    max_depth: usize,
    level: LogLevel,
) -> Result<WorkerFactory> {
    let factory: WorkerFactory = match isolation {
        Isolation::Thread => Box::new(move || spawn_thread(move || LispBackend::with_max_depth(max_depth))),
        Isolation::Process => {
            let exe = std::env::current_exe().context("Cannot locate own executable")?;
            let args = vec![
                "--log-level".to_string(),
                level.to_string(),
                "worker".to_string(),
                "--max-depth".to_string(),
                max_depth.to_string(),
            ];
            Box::new(move || spawn_process(&exe, &args))
        }
    };
    Ok(factory)
}

fn run_worker(max_depth: usize) -> Result<()> {
    on_worker_stack(move || {
        let stdin = io::stdin();
        let stdout = io::stdout();
        run_stdio_worker(LispBackend::with_max_depth(max_depth), stdin.lock(), stdout.lock())
    })?
    .context("Worker I/O failed")
}

/// Run `f` on a thread with the worker's stack, so a configured depth
/// limit behaves the same in every subcommand
fn on_worker_stack<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    std::thread::Builder::new()
        .name("lisp-worker".into())
        .stack_size(WORKER_STACK_SIZE)
        .spawn(f)
        .context("Failed to start worker thread")?
        .join()
        .map_err(|_| anyhow!("worker thread panicked"))
}
