use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use travel_portal_core::config::{parse_pair, update_config_file, ClientConfig};

// Merges key=value pairs into the client config file. Dotted keys nest; JSON literals keep
// their type.
#[derive(Parser, Debug)]
#[command(name = "update-config")]
struct Cli {
    #[arg(long, short, default_value = "config.json")]
    file: String,
    #[arg(required = true)]
    pairs: Vec<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let pairs = cli
        .pairs
        .iter()
        .map(|raw| parse_pair(raw))
        .collect::<Result<Vec<_>, _>>()?;

    let document = update_config_file(&cli.file, &pairs)
        .with_context(|| format!("updating {}", cli.file))?;
    info!(file = %cli.file, keys = pairs.len(), "config updated");

    match serde_json::from_value::<ClientConfig>(document.clone()) {
        Ok(config) => {
            if let Err(e) = config.validate() {
                warn!(error = %e, "config file written but does not validate");
            }
        }
        Err(e) => warn!(error = %e, "config file written but does not load"),
    }

    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}
