//! Geocat Admin - operator command line interface
//!
//! Opens a catalog root the same way the service does and reports on it:
//! record counts, files that failed to load, dangling sensor links, and the
//! root property file.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use geocat_common::{CatalogConfig, ServiceType};
use geocat_store::{Catalog, CatalogLoadReport};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "geocat-admin")]
#[command(about = "Geocat catalog administration")]
#[command(version)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long, env = "GEOCAT_CONFIG")]
    config: Option<PathBuf>,

    /// Catalog root, overriding the configuration
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show record counts and load diagnostics
    Inspect {
        /// Exit with an error when any file failed to load
        #[arg(long)]
        strict: bool,
    },
    /// List sensor links naming a missing data or sensor record
    Links,
    /// List services, optionally of one type
    Services {
        /// Service type (wms, wfs, csw, ...)
        service_type: Option<String>,
    },
    /// Root property file operations
    Prop {
        #[command(subcommand)]
        action: PropCommands,
    },
}

#[derive(Subcommand, Debug)]
enum PropCommands {
    /// Print one property
    Get {
        key: String,
    },
    /// Set one property
    Set {
        key: String,
        value: String,
    },
    /// Remove one property
    Remove {
        key: String,
    },
    /// Print every property
    List,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config =
        CatalogConfig::load(args.config.as_deref()).context("failed to load configuration")?;
    if let Some(root) = args.root {
        config.root_dir = root;
    }
    info!("Opening catalog at {:?}", config.root_dir);

    let (catalog, report) = Catalog::open(&config)
        .with_context(|| format!("failed to open catalog at {}", config.root_dir.display()))?;

    match args.command {
        Commands::Inspect { strict } => {
            print_inspect(&catalog, &report);
            if strict && !report.is_clean() {
                bail!("{} files failed to load", report.diagnostics().count());
            }
        }
        Commands::Links => {
            let dangling = catalog.dangling_sensor_links();
            if dangling.is_empty() {
                println!("No dangling sensor links");
            } else {
                println!("{:<12} {:<12} {}", "DATA", "SENSOR", "MISSING");
                println!("{}", "-".repeat(40));
                for (data, sensor) in dangling {
                    let missing = if catalog.data().exists_by_id(&data) {
                        "sensor"
                    } else {
                        "data"
                    };
                    println!("{data:<12} {sensor:<12} {missing}");
                }
            }
        }
        Commands::Services { service_type } => {
            let services = match service_type {
                Some(t) => {
                    let t: ServiceType = t.parse().map_err(anyhow::Error::msg)?;
                    catalog.services().find_by_type(t)
                }
                None => catalog.services().find_all(),
            };
            println!("{:<8} {:<30} {:<10} VERSIONS", "TYPE", "IDENTIFIER", "STATUS");
            println!("{}", "-".repeat(70));
            for s in services {
                println!(
                    "{:<8} {:<30} {:<10} {}",
                    s.service_type.to_string(),
                    s.identifier,
                    format!("{:?}", s.status),
                    s.versions.join(",")
                );
            }
        }
        Commands::Prop { action } => match action {
            PropCommands::Get { key } => match catalog.properties().get(&key) {
                Some(value) => println!("{value}"),
                None => bail!("property {key} is not set"),
            },
            PropCommands::Set { key, value } => {
                catalog.properties().set(&key, &value)?;
                println!("{key}={value}");
            }
            PropCommands::Remove { key } => {
                if !catalog.properties().remove(&key)? {
                    bail!("property {key} is not set");
                }
            }
            PropCommands::List => {
                for (key, value) in catalog.properties().entries() {
                    println!("{key}={value}");
                }
            }
        },
    }

    Ok(())
}

fn print_inspect(catalog: &Catalog, report: &CatalogLoadReport) {
    println!("Catalog: {}", catalog.root().display());
    println!("{:<16} {:>8}", "KIND", "RECORDS");
    println!("{}", "-".repeat(25));
    for (kind, count) in catalog.counts() {
        println!("{:<16} {:>8}", kind.to_string(), count);
    }
    println!(
        "{:<16} {:>8}",
        "sensor_x_data",
        catalog.sensor_links().owners().len()
    );

    if report.is_clean() {
        println!("\nAll files loaded");
        return;
    }
    println!("\nDiagnostics");
    println!("===========");
    for (store, diagnostic) in report.diagnostics() {
        println!("[{store}] {diagnostic}");
    }
}
