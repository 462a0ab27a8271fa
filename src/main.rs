//! Codetrail CLI - play the coding exercise game or check challenges.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod cli;

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

/// Codetrail - a turn-based coding exercise game
#[derive(Parser, Debug)]
#[command(name = "codetrail")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command.
#[derive(ClapArgs, Debug, Clone)]
struct CommonArgs {
    /// Challenge catalog JSON (default: built-in catalog)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Seed applied before every attempt (default: 42)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Fuel budget per attempt (default: 100000)
    #[arg(short, long)]
    budget: Option<u64>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Play the interactive game
    Play {
        /// Progress file (default: codetrail-progress.json)
        #[arg(short, long, default_value = cli::DEFAULT_PROGRESS_FILE)]
        progress: PathBuf,

        /// Keep progress in memory only
        #[arg(long)]
        no_save: bool,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Submit one snippet to one challenge
    Run {
        /// Challenge id
        #[arg(required = true)]
        id: u32,

        /// Snippet file, or - for stdin
        #[arg(required = true)]
        file: PathBuf,

        /// Record a pass for this user
        #[arg(short, long)]
        user: Option<String>,

        /// Progress file used with --user
        #[arg(short, long, default_value = cli::DEFAULT_PROGRESS_FILE)]
        progress: PathBuf,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Run every reference solution and report any that fail
    Check {
        /// Parallel threads (default: CPU count)
        #[arg(short = 'j', long)]
        threads: Option<usize>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,

        /// Show progress bar
        #[arg(long)]
        progress: bool,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// List the challenges in order
    List {
        /// Mark the challenges this user has completed
        #[arg(short, long)]
        user: Option<String>,

        /// Progress file used with --user
        #[arg(short, long, default_value = cli::DEFAULT_PROGRESS_FILE)]
        progress: PathBuf,

        #[command(flatten)]
        common: CommonArgs,
    },
}

impl CommonArgs {
    fn settings(&self) -> cli::Settings {
        cli::Settings {
            catalog: self.catalog.clone(),
            seed: self.seed,
            budget: self.budget,
            color: !self.no_color,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    cli::logging::init();

    let result = match args.command {
        Commands::Play {
            progress,
            no_save,
            common,
        } => cli::play::execute(&common.settings(), progress, no_save),

        Commands::Run {
            id,
            file,
            user,
            progress,
            format,
            common,
        } => cli::run::execute(&common.settings(), id, &file, user, progress, format),

        Commands::Check {
            threads,
            format,
            progress,
            common,
        } => cli::check::execute(&common.settings(), threads, format, progress),

        Commands::List {
            user,
            progress,
            common,
        } => cli::list::execute(&common.settings(), user, progress),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
