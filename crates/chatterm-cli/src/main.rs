use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use chatterm_core::{ChatConfig, Credential};
use chatterm_gateway::{CompletionGateway, GatewayConfig};

/// Chat with an OpenAI-compatible model from your terminal.
///
/// Type a message and press Enter. Replies appear in the transcript above
/// the input box. Ctrl+C or Esc quits and prints whatever was left unsent.
#[derive(Parser, Debug)]
#[command(name = "chatterm", version, about)]
struct Cli {
    /// JSON file holding {"API_KEY": "..."} (overrides the config file).
    #[arg(short, long)]
    credentials: Option<PathBuf>,

    /// Settings file (defaults to ~/.config/chatterm/config.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Model name to request (overrides the config file).
    #[arg(short, long)]
    model: Option<String>,

    /// Where to append the debug log when logging is enabled.
    #[arg(long, default_value = "debug.log")]
    log_file: PathBuf,

    /// Enable logging and increase verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Logging is off unless `DEBUG` is set or `-v` is given.
fn init_logging(cli: &Cli) -> Result<()> {
    let debug_env = std::env::var("DEBUG").is_ok_and(|v| !v.is_empty());
    let filter = match cli.verbose {
        0 if debug_env => "debug",
        0 => return Ok(()),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    // Log to a file to avoid corrupting the TUI output.
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&cli.log_file)
        .with_context(|| format!("Failed to open log file {}", cli.log_file.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::sync::Mutex::new(log_file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli)?;

    // Load config.
    let mut config = match cli.config {
        Some(ref path) => ChatConfig::load_from(path),
        None => ChatConfig::load(),
    }
    .context("Failed to load configuration")?;
    if let Some(ref model) = cli.model {
        config.api.model = model.clone();
    }

    let credentials_path = cli
        .credentials
        .clone()
        .unwrap_or_else(|| config.api.credentials_file.clone());
    let credential = Credential::load(&credentials_path).context("Failed to load API key")?;

    tracing::info!(
        model = %config.api.model,
        base_url = %config.api.base_url,
        "Starting chatterm v{}",
        env!("CARGO_PKG_VERSION")
    );

    let gateway = CompletionGateway::new(GatewayConfig {
        base_url: config.api.base_url.clone(),
        model: config.api.model.clone(),
        api_key: credential.api_key().to_string(),
        timeout: config.request.timeout(),
    })
    .context("Failed to build HTTP client")?;
    let gateway = Arc::new(gateway);

    chatterm_tui::install_panic_hook();

    // Start the TUI.
    let mut app = chatterm_tui::App::new(&config, gateway);
    let unsent = app.run().await?;

    println!("{unsent}");

    tracing::info!("chatterm exited cleanly");
    Ok(())
}
