use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicators_mlops::config::{Settings, DEFAULT_CONFIG_PATH};
use indicators_mlops::registry::ModelKind;
use indicators_mlops::service::{self, AppContext};
use indicators_mlops::{logging, tasks};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "indicators-mlops",
    version,
    about = "Scrape education indicators, load them into SQLite and train regressors"
)]
struct Cli {
    /// Base configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the REST service (reloads the store first when UPDATE_DATA is set)
    Serve,
    /// Crawl the monitoring site into the workbook
    Scrape,
    /// Reload the SQLite store from the workbook
    Import,
    /// Train one model family on the stored data
    Train {
        /// LASSO_REGRESSION, LINEAR_REGRESSION or RIDGE_REGRESSION
        #[arg(long)]
        model: ModelKind,
    },
    /// Write predictions of a fitted model for its held-out rows
    Predict {
        /// Artifact path, or a file name in the estimated-models directory
        #[arg(long)]
        artifact: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;
    logging::init(settings.debug);

    match cli.command {
        Command::Serve => {
            if let Some(summary) = tasks::import_if_requested(&settings)? {
                info!(rows = summary.data_rows, "store reloaded");
            }
            let runtime = tokio::runtime::Runtime::new().context("starting tokio runtime")?;
            runtime.block_on(async {
                let listener = tokio::net::TcpListener::bind(&settings.bind_address)
                    .await
                    .with_context(|| format!("binding {}", settings.bind_address))?;
                service::serve(listener, Arc::new(AppContext::new(settings.clone()))).await?;
                Ok::<_, anyhow::Error>(())
            })?;
        }
        Command::Scrape => {
            let path = tasks::scrape(&settings)?;
            println!("{}", path.display());
        }
        Command::Import => {
            let summary = tasks::import_data(&settings)?;
            println!("{} data rows, {} info rows", summary.data_rows, summary.info_rows);
        }
        Command::Train { model } => {
            let path = tasks::train(&settings, model)?;
            println!("{}", path.display());
        }
        Command::Predict { artifact } => {
            let path = tasks::predict(&settings, &artifact)?;
            println!("{}", path.display());
        }
    }
    Ok(())
}
