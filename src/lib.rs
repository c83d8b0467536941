pub mod config;
pub mod contract;
pub mod demo;
pub mod email;
pub mod error;
pub mod factory;
pub mod load_config;
pub mod logger;
pub mod pdf;
pub mod search;
pub mod signature;
pub mod storage;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use contract::SearchOptions;
use load_config::load_config;
use logger::CallLogger;

#[derive(Parser)]
#[clap(
    name = "switchboard",
    version,
    about = "Call third-party capabilities (email, object storage, e-signature, web search) through pluggable mock or vendor providers"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one illustrative scenario per configured capability
    Demo {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
    /// Run a one-off query against the configured search provider
    Search {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        #[clap(long)]
        query: String,
        #[clap(long, default_value_t = 5)]
        num_results: usize,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    let result = match cli.command {
        Commands::Demo { config } => {
            let config = load_config(config)?;
            println!("Demo starting...");
            match demo::run_demo(&config).await {
                Ok(report) => {
                    println!("Demo complete.\nReport:");
                    println!("{report:#?}");
                    Ok(())
                }
                Err(e) => {
                    eprintln!("[ERROR] Demo failed: {e}");
                    Err(anyhow::Error::new(e))
                }
            }
        }
        Commands::Search {
            config,
            query,
            num_results,
        } => {
            let config = load_config(config)?;
            let logger = CallLogger::jsonl(&config.logging.log_file)?;
            let service = factory::create_search_service(&config, &logger)?;
            let options = SearchOptions {
                num_results,
                ..SearchOptions::default()
            };
            let hits = service.search(&query, options).await?;
            for hit in &hits {
                println!("{}. {} ({})", hit.position, hit.title, hit.url);
                if !hit.snippet.is_empty() {
                    println!("   {}", hit.snippet);
                }
            }
            Ok(())
        }
    };

    result
}
