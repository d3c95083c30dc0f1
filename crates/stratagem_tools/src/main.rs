//! Stratagem - Development Tools

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stratagem_tools::{requirements, simulate, validate, Result};

#[derive(Parser)]
#[command(name = "stratagem-tools")]
#[command(about = "Development tools for Stratagem content")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a content file
    Validate {
        /// Path to the content RON file
        #[arg(default_value = "assets/data/content.ron")]
        content: PathBuf,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the requirements of every unit type and upgrade
    Requirements {
        /// Path to the content RON file
        #[arg(default_value = "assets/data/content.ron")]
        content: PathBuf,
    },
    /// Run a scenario headless and print the final state as JSON
    Simulate {
        /// Path to the content RON file
        content: PathBuf,
        /// Path to the scenario RON file
        scenario: PathBuf,
        /// Number of ticks to run
        #[arg(long, default_value_t = 100)]
        ticks: u64,
    },
}

fn run(command: Commands) -> Result<bool> {
    match command {
        Commands::Validate { content, json } => {
            tracing::info!("Validating content in: {}", content.display());
            let report = validate::validate_content(&content)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "{} unit types, {} upgrades, {} error(s)",
                    report.unit_types,
                    report.upgrades,
                    report.errors.len()
                );
                for error in &report.errors {
                    println!("  {error}");
                }
            }
            Ok(report.is_clean())
        }
        Commands::Requirements { content } => {
            let catalog = validate::load_clean_content(&content)?;
            print!("{}", requirements::render_requirements(&catalog));
            Ok(true)
        }
        Commands::Simulate {
            content,
            scenario,
            ticks,
        } => {
            let catalog = Arc::new(validate::load_clean_content(&content)?);
            let scenario = simulate::load_scenario(&scenario)?;
            let report = simulate::run_scenario(catalog, &scenario, ticks)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(true)
        }
    }
}

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match run(cli.command) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => {
            tracing::error!("Validation failed");
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
