//! Command-line access to a VinGris suite.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use vingris::config::watcher::StoreWatcher;
use vingris::config::{load_config, ServiceConfig};
use vingris::observability::logging::init_logging;
use vingris::{ConfigService, SystemProperties};

#[derive(Parser)]
#[command(name = "vingris")]
#[command(about = "Query a VinGris configuration suite", long_about = None)]
struct Cli {
    /// Service settings file (TOML)
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Suite document to use instead of discovery
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// System property used by substitution, as NAME=VALUE
    #[arg(short = 'D', value_name = "NAME=VALUE", value_parser = parse_property)]
    define: Vec<(String, String)>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print one property, failing if it cannot be resolved
    Get { application: String, property: String },
    /// Print one property, or nothing if it cannot be resolved
    GetSafe { application: String, property: String },
    /// Print every property of an application as JSON
    Dump { application: String },
    /// Report whether the documents changed since loading
    Changed,
    /// Print a property again whenever its documents change
    Watch { application: String, property: String },
}

fn parse_property(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut settings = match &cli.settings {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(file) = cli.file {
        settings.discovery.base_path = Some(file);
    }

    init_logging(&settings.logging)?;

    let properties = SystemProperties::new();
    for (name, value) in cli.define {
        properties.set(name, value);
    }
    let service = Arc::new(ConfigService::with_properties(settings, properties));

    match cli.command {
        Commands::Get { application, property } => {
            println!("{}", service.get_property(&application, &property)?);
        }
        Commands::GetSafe { application, property } => {
            if let Some(value) = service.get_property_safely(&application, &property) {
                println!("{value}");
            }
        }
        Commands::Dump { application } => {
            let resolved = service.get_application(&application)?;
            println!("{}", serde_json::to_string_pretty(&resolved)?);
        }
        Commands::Changed => {
            println!("{}", service.has_config_changed());
        }
        Commands::Watch { application, property } => {
            watch(service, &application, &property).await?;
        }
    }

    Ok(())
}

async fn watch(
    service: Arc<ConfigService>,
    application: &str,
    property: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    print_current(&service, application, property);

    let (watcher, mut changes) = StoreWatcher::new(service.clone());
    let _watcher = watcher.run()?;

    loop {
        tokio::select! {
            Some(path) = changes.recv() => {
                tracing::debug!(path = %path.display(), "Re-reading property");
                print_current(&service, application, property);
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    tracing::info!("Watch stopped");
    Ok(())
}

fn print_current(service: &ConfigService, application: &str, property: &str) {
    match service.get_property_safely(application, property) {
        Some(value) => println!("{value}"),
        None => println!("<unresolved>"),
    }
}
