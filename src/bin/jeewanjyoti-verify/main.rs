//! jeewanjyoti-verify CLI entry point.

mod cli;

use clap::Parser;
use cli::{Cli, Command, SessionCommand, VerifyArgs};
use color_eyre::eyre::{eyre, WrapErr};
use jeewanjyoti_client::session::{is_token_expired, token_expiry};
use jeewanjyoti_client::{
    ClientConfig, CredentialProvider, FileSessionStore, FlowBuilder, FlowKind, RefreshOutcome,
    StaticCredential, TokenRefresher, TracingNavigator, VerificationClient,
    VerificationClientConfig, VerificationOutcome,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Parse CLI arguments
    let cli = Cli::parse();

    let config = cli.client_config()?;

    // Initialize tracing
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    info!("jeewanjyoti-verify v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Verify(args) => verify(&config, args).await,
        Command::Session(command) => session(&config, command).await,
    }
}

async fn verify(config: &ClientConfig, args: VerifyArgs) -> color_eyre::Result<()> {
    let kind = FlowKind::from(args.flow);
    let flow_config = config.flow(kind).clone();

    let client = VerificationClient::new(VerificationClientConfig::from_flow(config, &flow_config)?)?;

    let credentials: Arc<dyn CredentialProvider> = match args.token {
        Some(token) => Arc::new(StaticCredential::new(token)),
        None => Arc::new(FileSessionStore::new(&config.session_file)),
    };

    let flow = FlowBuilder::new(kind, flow_config, args.redirect)
        .credentials(credentials)
        .verifier(Arc::new(client))
        .navigator(Arc::new(TracingNavigator))
        .build()?;

    flow.activate()?;

    let outcome = tokio::select! {
        outcome = flow.wait_terminal() => outcome,
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, abandoning verification");
            flow.teardown();
            None
        }
    };

    let Some(outcome) = outcome else {
        return Err(eyre!("verification abandoned before it completed"));
    };

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    println!("next: {}", flow.destination());
    flow.navigate_to_destination()?;

    if let VerificationOutcome::Error { message } = outcome {
        warn!("Verification failed: {message}");
        std::process::exit(1);
    }
    Ok(())
}

async fn session(config: &ClientConfig, command: SessionCommand) -> color_eyre::Result<()> {
    let store = FileSessionStore::new(&config.session_file);

    match command {
        SessionCommand::Status => {
            let session = store.load()?;
            println!("session file: {}", store.path().display());
            println!("authenticated: {}", session.is_authenticated());
            if let Some(ref token) = session.access_token {
                let now = chrono::Utc::now();
                match token_expiry(token) {
                    Some(exp) => println!(
                        "access token expires: {} ({})",
                        exp.to_rfc3339(),
                        if is_token_expired(token, now) { "expired" } else { "valid" }
                    ),
                    None => println!("access token expires: unknown (treated as expired)"),
                }
            }
        }
        SessionCommand::Store {
            access,
            refresh,
            user_data,
        } => {
            let user_data = user_data
                .map(|raw| serde_json::from_str::<serde_json::Value>(&raw))
                .transpose()
                .wrap_err("--user-data must be valid JSON")?;
            store.store_tokens(access.as_deref(), refresh.as_deref(), user_data)?;
            println!("stored session in {}", store.path().display());
        }
        SessionCommand::Clear => {
            store.clear()?;
            println!("session cleared");
        }
        SessionCommand::Refresh => {
            let url = config.endpoint_url(&config.token_refresh_path)?;
            let refresher = TokenRefresher::new(url, config.request_timeout())?;
            match refresher.refresh(&store).await? {
                RefreshOutcome::Refreshed => println!("access token refreshed"),
                RefreshOutcome::NoRefreshToken => {
                    return Err(eyre!("no refresh token stored; log in first"));
                }
                RefreshOutcome::Rejected => {
                    return Err(eyre!("refresh token rejected; session cleared, log in again"));
                }
            }
        }
    }

    Ok(())
}
