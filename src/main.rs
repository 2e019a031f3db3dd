use clap::{Parser, Subcommand};
use scrapi::config::ConfigLoader;
use scrapi::engine::ScrapeEngine;
use scrapi::fetcher::HttpFetcher;
use scrapi::server;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(name = "scrapi")]
#[command(version = "0.1.0")]
#[command(about = "Periodic web scraper serving its latest results over HTTP", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape on the configured interval and serve the results
    Serve {
        /// Path to the configuration file (JSON/YAML/TOML)
        #[arg(short, long)]
        config: PathBuf,

        /// Address to listen on
        #[arg(short, long, env = "SCRAPI_ADDR", default_value = "0.0.0.0:8000")]
        addr: String,
    },
    /// Run a single scrape cycle and print the result as JSON
    Once {
        /// Path to the configuration file
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate a configuration file
    Check {
        /// Path to the configuration file
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config, addr } => {
            log::info!("Loading config from {:?}", config);
            let config = ConfigLoader::load(&config)?;

            let engine = Arc::new(ScrapeEngine::new(config)?);
            engine.start()?;

            let app = server::router(engine.clone());
            let listener = TcpListener::bind(&addr).await?;
            log::info!("Serving on {}", addr);
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            engine.stop()?;
        }
        Commands::Once { config } => {
            let config = ConfigLoader::load(&config)?;
            let fetcher = HttpFetcher::new()?;
            let result = scrapi::run_cycle(&config, &fetcher, 1).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Check { config } => match ConfigLoader::load(&config) {
            Ok(cfg) => {
                println!("✅ Config is valid:");
                println!("   Interval: {}s", cfg.interval.as_secs());
                println!("   Request timeout: {}s", cfg.request_timeout.as_secs());
                println!("   Endpoints: {}", cfg.endpoints.len());
                for endpoint in &cfg.endpoints {
                    println!("     {} ({} selector(s))", endpoint.url, endpoint.selectors.len());
                }
            }
            Err(e) => {
                eprintln!("❌ Config error: {}", e);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutting down...");
}
