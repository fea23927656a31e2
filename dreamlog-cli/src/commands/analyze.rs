//! Analyze command - regenerate a dream's AI analysis and wait for it.

use anyhow::Result;
use clap::Args;
use dreamlog_client::{JOB_FAILED_MESSAGE, JobPoller, PollOptions};
use dreamlog_store::SettingsStore;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::user_facing;
use crate::context::AppContext;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the analyze command.
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Dream id.
    pub id: i64,

    /// Pause between status reads, in milliseconds.
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Status reads before giving up.
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Wait for a running analysis without starting a new one.
    #[arg(long)]
    pub watch: bool,
}

impl AnalyzeArgs {
    /// Applies the flags on top of the configured options.
    fn poll_options(&self, configured: PollOptions) -> PollOptions {
        let mut options = configured;
        if let Some(ms) = self.interval_ms {
            options = options.with_interval(Duration::from_millis(ms));
        }
        if let Some(max) = self.max_attempts {
            options = options.with_max_attempts(max);
        }
        options
    }
}

/// Runs the analyze command.
pub async fn run(args: &AnalyzeArgs, cli: &Cli, settings: &SettingsStore) -> Result<()> {
    let ctx = AppContext::build(cli, settings).await?;
    let options = args.poll_options(ctx.settings.poll_options());
    let poller = JobPoller::new(ctx.dreams(), options);

    let cancel = CancellationToken::new();
    let interrupt = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                debug!("Interrupted");
                cancel.cancel();
            }
        }
    });

    if cli.format == OutputFormat::Text && !cli.quiet {
        let verb = if args.watch { "Waiting for" } else { "Generating" };
        eprintln!(
            "{verb} the analysis of dream #{} (checking every {} ms, up to {} times)...",
            args.id,
            options.interval.as_millis(),
            options.max_attempts
        );
    }

    let result = if args.watch {
        poller.wait_until_terminal(args.id, &cancel).await
    } else {
        poller.poll_until_terminal(args.id, &cancel).await
    };
    interrupt.abort();

    let dream = result.map_err(|e| user_facing(e, JOB_FAILED_MESSAGE))?;

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            match &dream.ai_summary {
                Some(summary) => println!("{}", formatter.format_summary(summary)),
                None => println!("{}", formatter.format_dream(&dream)),
            }
        }
        OutputFormat::Json => {
            let json = JsonFormatter::new(cli.pretty);
            match &dream.ai_summary {
                Some(summary) => println!("{}", json.format(summary)?),
                None => println!("{}", json.format(&dream)?),
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(interval_ms: Option<u64>, max_attempts: Option<u32>) -> AnalyzeArgs {
        AnalyzeArgs {
            id: 1,
            interval_ms,
            max_attempts,
            watch: false,
        }
    }

    #[test]
    fn test_flags_override_configured_options() {
        let configured = PollOptions::default();
        let options = args(Some(250), Some(4)).poll_options(configured);
        assert_eq!(options.interval, Duration::from_millis(250));
        assert_eq!(options.max_attempts, 4);
    }

    #[test]
    fn test_configured_options_kept_without_flags() {
        let configured = PollOptions::default().with_max_attempts(7);
        let options = args(None, None).poll_options(configured);
        assert_eq!(options, configured);
    }

    #[test]
    fn test_zero_attempts_flag_still_reads_once() {
        let options = args(None, Some(0)).poll_options(PollOptions::default());
        assert_eq!(options.max_attempts, 1);
    }
}
