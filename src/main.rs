use agentbus::agents::run_session;
use agentbus::{init_logging, EventBus, Settings, BUILD_DATE, VERSION};
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;

/// Play a short browsing session between sample agents over the event bus
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Settings file (.toml or .json); defaults to the user config directory
    #[arg(short, long, env = "AGENTBUS_SETTINGS")]
    settings: Option<PathBuf>,

    /// Number of images the primary browser selects
    #[arg(short, long, default_value_t = 3)]
    images: u64,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let path = match cli.settings {
        Some(path) => path,
        None => Settings::default_path()?,
    };
    let settings = Settings::load_or_default(&path)
        .with_context(|| format!("loading settings from {}", path.display()))?;

    // Initialize logging
    init_logging(&settings.logging)?;
    tracing::info!("agentbus {} (built {})", VERSION, BUILD_DATE);

    let bus = EventBus::with_config(settings.bus_config());
    let summary = run_session(&bus, cli.images)?;

    for line in &summary.status {
        tracing::info!("status: {}", line);
    }
    let stats = bus.stats();
    tracing::info!(
        "posted {} events, {} notifications, {} suppressed, {} failed",
        stats.posted, stats.delivered, stats.suppressed, stats.failed
    );

    Ok(())
}
