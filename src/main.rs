//! sidekick - fetch secrets from a secret agent.
//!
//! Connects to the agent over TCP or a Unix socket, requests one secret and
//! writes the decoded bytes to stdout.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use clap::{Parser, Subcommand};
use colored::Colorize;
use sidekick_client::{AgentConfig, ClientError, Endpoint, SecretClient};
use sidekick_protocol::SecretId;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sidekick")]
#[command(about = "Fetch secrets from a secret agent")]
#[command(version)]
struct Cli {
    /// YAML config file
    #[arg(short, long, env = "SIDEKICK_CONFIG")]
    config: Option<PathBuf>,

    /// Agent endpoint: unix:PATH, tcp:HOST:PORT or HOST:PORT
    #[arg(short, long, env = "SIDEKICK_AGENT")]
    agent: Option<Endpoint>,

    /// Timeout for each write and read, in milliseconds
    #[arg(long, env = "SIDEKICK_TIMEOUT_MS")]
    timeout_ms: Option<u64>,

    /// Connect timeout, in milliseconds
    #[arg(long, env = "SIDEKICK_CONNECT_TIMEOUT_MS")]
    connect_timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a secret and write it to stdout
    Get {
        /// Secret key
        key: String,

        /// Resource subpath qualifying the key
        #[arg(short, long)]
        resource: Option<String>,

        /// Write the secret base64-encoded instead of raw
        #[arg(long)]
        base64: bool,

        /// Append a newline after the secret
        #[arg(short, long)]
        newline: bool,
    },

    /// Print the effective configuration as YAML
    Config,
}

/// Builds the effective configuration: file, then environment, then flags.
fn resolve_config(cli: &Cli) -> Result<AgentConfig, ClientError> {
    let mut config = match cli.config {
        Some(ref path) => {
            let mut config = AgentConfig::from_file(path)?;
            config.apply_env_overrides();
            config
        }
        None => AgentConfig::load()?,
    };
    if let Some(ref agent) = cli.agent {
        config.endpoint = agent.clone();
    }
    if let Some(ms) = cli.timeout_ms {
        config = config.with_timeout(Duration::from_millis(ms));
    }
    if let Some(ms) = cli.connect_timeout_ms {
        config = config.with_connect_timeout(Duration::from_millis(ms));
    }
    Ok(config)
}

fn exit_with(err: &ClientError) -> ! {
    eprintln!("{} ({} failure): {}", "Error".red(), err.kind(), err);
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = resolve_config(&cli).unwrap_or_else(|e| exit_with(&e));

    match cli.command {
        Commands::Config => {
            let yaml = config
                .to_yaml()
                .unwrap_or_else(|e| exit_with(&ClientError::from(e)));
            print!("{}", yaml);
        }
        Commands::Get {
            key,
            resource,
            base64,
            newline,
        } => {
            let mut id = SecretId::new(key);
            if let Some(resource) = resource {
                id = id.with_resource(resource);
            }

            let client = SecretClient::new(config);
            tracing::debug!("Fetching secret from {}", client.config().endpoint);

            let secret = client.fetch(&id).await.unwrap_or_else(|e| exit_with(&e));

            let mut out = std::io::stdout().lock();
            if base64 {
                out.write_all(STANDARD.encode(secret.as_bytes()).as_bytes())?;
            } else {
                out.write_all(secret.as_bytes())?;
            }
            if newline {
                out.write_all(b"\n")?;
            }
            out.flush()?;
        }
    }

    Ok(())
}
