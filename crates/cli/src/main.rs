//! ScamShield command line driver
//!
//! Reads scammer messages from stdin, one per line, runs each through a single
//! session and prints the turn result as a JSON line on stdout. Logs go to
//! stderr.
//!
//! Lines starting with `/` are commands:
//! - `/end` terminates the session and prints its final state
//! - `/state` prints the stored session

use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use scamshield_agent::{InMemorySessionStore, SessionRegistry, StallOnlyGenerator, TurnProcessor};
use scamshield_config::{load_settings, Settings};
use scamshield_core::Error;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Priority: env vars > config/{env}.yaml > config/default.yaml > defaults
    let env = std::env::var("SCAMSHIELD_ENV").ok();
    let settings = match load_settings(env.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            // Tracing not yet initialized
            eprintln!("Warning: Failed to load config: {}. Using defaults.", e);
            Settings::default()
        }
    };

    init_tracing(&settings);

    let session_id = std::env::args()
        .nth(1)
        .unwrap_or_else(SessionRegistry::create_session_id);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = settings.environment.as_str(),
        session_id = %session_id,
        "Starting ScamShield"
    );

    let registry = SessionRegistry::new(
        Arc::new(TurnProcessor::new(&settings)),
        Arc::new(InMemorySessionStore::new()),
        Arc::new(StallOnlyGenerator),
        settings.agent.clone(),
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        match handle_line(&registry, &session_id, &line).await? {
            LineOutput::Print(output) => {
                stdout.write_all(output.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
            }
            LineOutput::Skip => continue,
            LineOutput::Stop => break,
        }
    }

    Ok(())
}

/// What the driver does with one input line
#[derive(Debug, PartialEq)]
enum LineOutput {
    Print(String),
    Skip,
    Stop,
}

async fn handle_line(
    registry: &SessionRegistry,
    session_id: &str,
    line: &str,
) -> anyhow::Result<LineOutput> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(LineOutput::Skip);
    }

    let output = match line {
        "/end" => match registry.terminate(session_id).await {
            Ok(session) => serde_json::to_string(&session)?,
            Err(Error::SessionNotFound(id)) => {
                tracing::warn!(session_id = %id, "No session to terminate yet");
                return Ok(LineOutput::Skip);
            }
            Err(e) => return Err(e.into()),
        },
        "/state" => serde_json::to_string(&registry.session(session_id).await?)?,
        message => match registry.handle_message(session_id, message).await {
            Ok(turn) => serde_json::to_string(&turn)?,
            Err(Error::SessionClosed(id)) => {
                tracing::warn!(session_id = %id, "Session closed, ignoring input");
                return Ok(LineOutput::Stop);
            }
            Err(e) => return Err(e.into()),
        },
    };

    Ok(LineOutput::Print(output))
}

fn init_tracing(settings: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("scamshield={}", settings.logging.level).into()
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let fmt_layer = if settings.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed()
    };
    subscriber.with(fmt_layer).init();
}
