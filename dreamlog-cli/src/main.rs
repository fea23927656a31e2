// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! Dreamlog CLI - your dream journal from the command line.
//!
//! # Examples
//!
//! ```bash
//! # Sign in (password is prompted when not given)
//! dreamlog login luna
//!
//! # Recent dreams
//! dreamlog dreams list --size 20
//!
//! # Run an AI analysis and wait for it
//! dreamlog analyze 42
//!
//! # JSON output
//! dreamlog --format json --pretty dreams show 42
//!
//! # Point at another backend
//! dreamlog config set-base-url https://dreams.example.com/api
//! ```

mod commands;
mod context;
mod navigator;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use dreamlog_client::ApiError;
use dreamlog_store::{LogLevel, SettingsStore};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use commands::{analyze, auth, config, dreams};

// ============================================================================
// CLI Definition
// ============================================================================

/// Dreamlog CLI - record dreams and read their analyses.
#[derive(Parser)]
#[command(name = "dreamlog")]
#[command(about = "Dream journal CLI")]
#[command(long_about = r#"
Dreamlog keeps a dream journal on a Dreamlog server and asks it for
AI analyses of individual dreams.

Examples:
  dreamlog login luna               # Sign in
  dreamlog dreams list              # First page of dreams
  dreamlog dreams show 42           # One dream with its analysis
  dreamlog analyze 42               # Regenerate and wait for an analysis
  dreamlog --format json whoami     # JSON output
"#)]
#[command(version)]
#[command(author = "Dreamlog Contributors")]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Backend API root, overriding the configured one.
    #[arg(long, env = "DREAMLOG_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (minimal output).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Sign in.
    Login(auth::LoginArgs),

    /// Create an account and sign in.
    Register(auth::RegisterArgs),

    /// Sign out and forget the stored session.
    Logout,

    /// Show the signed-in account.
    Whoami(auth::WhoamiArgs),

    /// Browse and manage dreams.
    #[command(visible_alias = "d")]
    Dreams(dreams::DreamsArgs),

    /// Regenerate a dream's AI analysis and wait for it.
    #[command(visible_alias = "a")]
    Analyze(analyze::AnalyzeArgs),

    /// Manage configuration.
    Config(config::ConfigArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// General error.
    Error = 1,
    /// Not signed in, or the session expired.
    AuthRequired = 2,
    /// Access denied.
    Forbidden = 3,
    /// Polling gave up.
    Timeout = 4,
    /// Interrupted by the user.
    Interrupted = 130,
}

impl ExitCode {
    /// Picks the exit code for a failed command.
    fn for_error(error: &anyhow::Error) -> Self {
        match error.downcast_ref::<ApiError>() {
            Some(ApiError::AuthExpired { .. } | ApiError::RefreshFailed(_)) => Self::AuthRequired,
            Some(ApiError::Forbidden { .. }) => Self::Forbidden,
            Some(ApiError::PollTimeout { .. }) => Self::Timeout,
            Some(ApiError::Cancelled) => Self::Interrupted,
            _ => Self::Error,
        }
    }
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool, configured: LogLevel) {
    if quiet {
        return;
    }

    let filter = if verbose {
        EnvFilter::new("dreamlog=debug,dreamlog_client=debug,dreamlog_store=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "dreamlog={configured},dreamlog_client={configured},dreamlog_store={configured}"
            ))
        })
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = SettingsStore::load_default().await;
    setup_logging(cli.verbose, cli.quiet, settings.get().await.log_level);

    let result = match &cli.command {
        Commands::Login(args) => auth::login(args, &cli, &settings).await,
        Commands::Register(args) => auth::register(args, &cli, &settings).await,
        Commands::Logout => auth::logout(&cli, &settings).await,
        Commands::Whoami(args) => auth::whoami(args, &cli, &settings).await,
        Commands::Dreams(args) => dreams::run(args, &cli, &settings).await,
        Commands::Analyze(args) => analyze::run(args, &cli, &settings).await,
        Commands::Config(args) => config::run(args, &cli, &settings).await,
    };

    if let Err(e) = result {
        if cli.verbose {
            eprintln!("Error: {e:#}");
        } else if !cli.quiet {
            eprintln!("Error: {e}");
        }
        std::process::exit(ExitCode::for_error(&e) as i32);
    }

    Ok(())
}
