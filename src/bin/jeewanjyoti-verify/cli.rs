//! Command-line interface definition.

use clap::{Args, Parser, Subcommand, ValueEnum};
use jeewanjyoti_client::config::{ClientConfig, FlowKind};
use std::path::PathBuf;

/// Confirm JeewanJyoti payment redirects and manage the login session.
#[derive(Parser, Debug)]
#[command(name = "jeewanjyoti-verify")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Backend base URL.
    #[arg(long, global = true, env = "JEEWANJYOTI_API_BASE_URL")]
    pub api_base_url: Option<String>,

    /// Session file holding the access and refresh tokens.
    #[arg(long, global = true, env = "JEEWANJYOTI_SESSION_FILE")]
    pub session_file: Option<PathBuf>,

    /// Request timeout in seconds.
    #[arg(long, global = true, env = "JEEWANJYOTI_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Log level. Falls back to `log_level` in the config file.
    #[arg(long, global = true, env = "RUST_LOG")]
    pub log_level: Option<String>,

    /// Path to configuration file.
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Verify a gateway redirect with the backend.
    Verify(VerifyArgs),

    /// Manage the stored session.
    #[command(subcommand)]
    Session(SessionCommand),
}

/// Arguments for `verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Redirect URL (or just its query string) the gateway returned.
    pub redirect: String,

    /// Which verification flow the redirect belongs to.
    #[arg(long, value_enum, default_value = "payment")]
    pub flow: CliFlowKind,

    /// Use this access token instead of the session file.
    #[arg(long, env = "JEEWANJYOTI_ACCESS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

/// Session management commands.
#[derive(Subcommand, Debug)]
pub enum SessionCommand {
    /// Show whether a session is stored and when the access token expires.
    Status,

    /// Store tokens returned by a login.
    Store {
        /// JWT access token.
        #[arg(long)]
        access: Option<String>,

        /// JWT refresh token.
        #[arg(long)]
        refresh: Option<String>,

        /// User profile as JSON.
        #[arg(long)]
        user_data: Option<String>,
    },

    /// Remove all stored tokens.
    Clear,

    /// Exchange the refresh token for a new access token.
    Refresh,
}

/// Flow kind CLI enum.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CliFlowKind {
    /// Appointment payment.
    Payment,
    /// Loved-one mapping subscription.
    Mapping,
}

impl Cli {
    /// Build the effective configuration: file (or defaults), then CLI overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file is specified but cannot be loaded,
    /// or the effective configuration is invalid.
    pub fn client_config(&self) -> color_eyre::Result<ClientConfig> {
        let mut config = if let Some(ref path) = self.config {
            ClientConfig::from_file(path)?
        } else {
            ClientConfig::default()
        };

        if let Some(ref url) = self.api_base_url {
            config.api_base_url.clone_from(url);
        }
        if let Some(ref path) = self.session_file {
            config.session_file.clone_from(path);
        }
        if let Some(secs) = self.timeout_secs {
            config.request_timeout_secs = secs;
        }
        if let Some(ref level) = self.log_level {
            config.log_level.clone_from(level);
        }

        config.validate()?;
        Ok(config)
    }
}

impl From<CliFlowKind> for FlowKind {
    fn from(k: CliFlowKind) -> Self {
        match k {
            CliFlowKind::Payment => FlowKind::Payment,
            CliFlowKind::Mapping => FlowKind::Mapping,
        }
    }
}
