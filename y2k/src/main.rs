//! Y2K Interpreter CLI

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use y2k::error::report_runtime_error;
use y2k::interp::{Context, ExecMode, Interpreter, Outcome, RunOptions};
use y2k::repl::Repl;
use y2k::{Error, Result, source};

#[derive(Parser)]
#[command(
    name = "y2k",
    version,
    about = "Y2K - a programming language written in file timestamps"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a program (a directory of timestamped files or a raw file)
    Run {
        /// Program directory or file
        path: PathBuf,
        /// Values made available to the program as variables
        args: Vec<String>,
        /// Digits per group
        #[arg(short = 'd', long = "digits", default_value_t = 1)]
        digits: usize,
        /// Trace every step on stderr
        #[arg(long)]
        debug: bool,
        /// How nested bodies are executed (recursive or iterative)
        #[arg(long, default_value_t = ExecMode::Recursive)]
        mode: ExecMode,
        /// Print the final variables as JSON on stderr
        #[arg(long)]
        dump_vars: bool,
    },
    /// Print the digit stream a program is read as
    Digits {
        /// Program directory or file
        path: PathBuf,
        /// Digits per group
        #[arg(short = 'd', long = "digits", default_value_t = 1)]
        digits: usize,
    },
    /// Turn a raw program into a directory of timestamp-only files
    Export {
        /// Raw program file
        raw: PathBuf,
        /// Directory to write into
        #[arg(long, default_value = "y2k-out")]
        outdir: PathBuf,
        /// Digits per group
        #[arg(short = 'd', long = "digits", default_value_t = 1)]
        digits: usize,
    },
    /// Start an interactive session
    Repl {
        /// Digits per group
        #[arg(short = 'd', long = "digits", default_value_t = 1)]
        digits: usize,
        /// Trace every step on stderr
        #[arg(long)]
        debug: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let debug = matches!(
        cli.command,
        Command::Run { debug: true, .. } | Command::Repl { debug: true, .. }
    );
    init_logging(debug);

    let result = match cli.command {
        Command::Run {
            path,
            args,
            digits,
            debug,
            mode,
            dump_vars,
        } => run_program(&path, &args, Context::new(digits, debug), mode, dump_vars),
        Command::Digits { path, digits } => print_digits(&path, digits),
        Command::Export {
            raw,
            outdir,
            digits,
        } => export_program(&raw, &outdir, digits),
        Command::Repl { digits, debug } => start_repl(Context::new(digits, debug)),
    };

    match result {
        Ok(()) => {}
        // Already reported against the program's digits
        Err(Error::Runtime(_)) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

/// Log to stderr so program output on stdout stays clean. `RUST_LOG` wins
/// over the `--debug` default.
fn init_logging(debug: bool) {
    let default = if debug { "y2k=debug" } else { "y2k=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run_program(
    path: &Path,
    args: &[String],
    ctx: Context,
    mode: ExecMode,
    dump_vars: bool,
) -> Result<()> {
    let digits = source::load(path, ctx.window)?;
    let mut interp = Interpreter::new(ctx).with_options(RunOptions { mode });
    for arg in args {
        interp.inject_arg(arg);
    }

    let outcome = interp.run(&digits).inspect_err(|err| {
        report_runtime_error(&path.display().to_string(), &digits, err);
    })?;
    if outcome == Outcome::Aborted {
        tracing::debug!("program ended at CONTINUE");
    }

    if dump_vars {
        eprintln!("{}", serde_json::to_string_pretty(interp.variables())?);
    }
    Ok(())
}

fn print_digits(path: &Path, window: usize) -> Result<()> {
    let digits = source::load(path, window.max(1))?;
    println!("{digits}");
    Ok(())
}

fn export_program(raw: &Path, outdir: &Path, window: usize) -> Result<()> {
    let digits = source::read_raw(raw)?;
    let files = source::export(&digits, outdir, window)?;
    println!("✓ wrote {} file(s) to {}", files.len(), outdir.display());
    Ok(())
}

fn start_repl(ctx: Context) -> Result<()> {
    let mut repl = Repl::new(ctx, RunOptions::default())?;
    repl.run()?;
    Ok(())
}
