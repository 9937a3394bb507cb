//! regress-serve binary.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use regress_serve_api::server;
use regress_serve_api::telemetry::init_tracing;
use regress_serve_core::{ServeConfig, ServiceState};

/// Serve predictions from a regression model artifact.
#[derive(Debug, Parser)]
#[command(name = "regress-serve", version, about)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Model artifact path (overrides config and MODEL_PATH).
    #[arg(long, value_name = "PATH")]
    model_path: Option<String>,

    /// Address to bind.
    #[arg(long, value_name = "ADDR")]
    bind: Option<String>,

    /// Port to listen on.
    #[arg(short, long)]
    port: Option<u16>,
}

impl Cli {
    fn apply(self, config: &mut ServeConfig) {
        if let Some(path) = self.model_path {
            config.model.path = path;
        }
        if let Some(bind) = self.bind {
            config.server.bind_address = bind;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config =
        ServeConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    init_tracing(&config.logging)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        model_path = %config.model.path,
        "Starting regress-serve"
    );

    let model_path = config.model.path.clone();
    let state = tokio::task::spawn_blocking(move || ServiceState::initialize(model_path))
        .await
        .context("Model loading task panicked")?
        .into_shared();

    let listener = server::bind(&config).await?;
    server::serve(listener, state).await
}
