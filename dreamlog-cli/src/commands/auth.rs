//! Account commands - login, register, logout, whoami.

use anyhow::{Result, bail};
use clap::Args;
use dreamlog_client::{
    CredentialStore, GENERIC_FAILURE_MESSAGE, LOGIN_FAILED_MESSAGE, REGISTER_FAILED_MESSAGE,
};
use dreamlog_core::RegisterRequest;
use dreamlog_store::{CredentialBackend, SettingsStore};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use super::user_facing;
use crate::context::AppContext;
use crate::output::{JsonFormatter, SessionOutput, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the login command.
#[derive(Args)]
pub struct LoginArgs {
    /// Login name.
    pub username: String,

    /// Password. Prompted for when omitted.
    #[arg(long, env = "DREAMLOG_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

/// Arguments for the register command.
#[derive(Args)]
pub struct RegisterArgs {
    /// Login name.
    pub username: String,

    /// Contact email.
    #[arg(long)]
    pub email: String,

    /// Display name.
    #[arg(long)]
    pub nickname: Option<String>,

    /// Password. Prompted for when omitted.
    #[arg(long, env = "DREAMLOG_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

/// Arguments for the whoami command.
#[derive(Args)]
pub struct WhoamiArgs {
    /// Reload the account from the server instead of the stored copy.
    #[arg(long)]
    pub refresh: bool,
}

/// Runs the login command.
pub async fn login(args: &LoginArgs, cli: &Cli, settings: &SettingsStore) -> Result<()> {
    let ctx = AppContext::build(cli, settings).await?;
    let password = password_or_prompt(args.password.as_deref()).await?;

    let user = ctx
        .session()
        .login(&args.username, &password)
        .await
        .map_err(|e| user_facing(e, LOGIN_FAILED_MESSAGE))?;

    match cli.format {
        OutputFormat::Text => {
            if !cli.quiet {
                println!("Signed in as {}", user.display_name());
            }
        }
        OutputFormat::Json => {
            println!("{}", JsonFormatter::new(cli.pretty).format(&user)?);
        }
    }
    Ok(())
}

/// Runs the register command.
pub async fn register(args: &RegisterArgs, cli: &Cli, settings: &SettingsStore) -> Result<()> {
    let ctx = AppContext::build(cli, settings).await?;
    let password = password_or_prompt(args.password.as_deref()).await?;

    let request = RegisterRequest {
        username: args.username.clone(),
        confirm_password: password.clone(),
        password,
        email: args.email.clone(),
        nickname: args.nickname.clone(),
    };

    let user = ctx
        .session()
        .register(&request)
        .await
        .map_err(|e| user_facing(e, REGISTER_FAILED_MESSAGE))?;

    match cli.format {
        OutputFormat::Text => {
            if !cli.quiet {
                println!("Welcome, {}! You are signed in.", user.display_name());
            }
        }
        OutputFormat::Json => {
            println!("{}", JsonFormatter::new(cli.pretty).format(&user)?);
        }
    }
    Ok(())
}

/// Runs the logout command.
pub async fn logout(cli: &Cli, settings: &SettingsStore) -> Result<()> {
    let ctx = AppContext::build(cli, settings).await?;
    ctx.session().logout().await;

    if cli.format == OutputFormat::Text && !cli.quiet {
        println!("Signed out.");
    }
    Ok(())
}

/// Runs the whoami command.
pub async fn whoami(args: &WhoamiArgs, cli: &Cli, settings: &SettingsStore) -> Result<()> {
    let ctx = AppContext::build(cli, settings).await?;
    let session = ctx.session();

    let user = if args.refresh && session.is_logged_in() {
        Some(
            session
                .fetch_current_user()
                .await
                .map_err(|e| user_facing(e, GENERIC_FAILURE_MESSAGE))?,
        )
    } else {
        ctx.client.credentials().identity()
    };

    // Read after a possible refresh so the expiry is current.
    let access_token = ctx.client.credentials().access_token();
    let backend = CredentialBackend::from_kind(ctx.settings.credential_backend);
    let output = SessionOutput::new(user, access_token.as_deref(), backend.to_string());

    match cli.format {
        OutputFormat::Text => match &output.user {
            Some(user) => {
                let formatter = TextFormatter::new(!cli.no_color);
                println!("{}", formatter.format_user(user, output.token_expires_at));
            }
            None => bail!("Not signed in. Run `dreamlog login <username>`."),
        },
        OutputFormat::Json => {
            println!("{}", JsonFormatter::new(cli.pretty).format(&output)?);
        }
    }
    Ok(())
}

/// Returns the given password, or reads one line from stdin.
async fn password_or_prompt(given: Option<&str>) -> Result<String> {
    if let Some(password) = given {
        return Ok(password.to_string());
    }

    eprint!("Password: ");
    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        bail!("A password is required");
    }
    debug!("Password read from stdin");
    Ok(password)
}
