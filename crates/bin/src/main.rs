//! Hobart CLI binary.
//!
//! Provides command-line interface for the Hobart demand model.

mod integration;

use clap::{Parser, Subcommand};
use hobart::ManagerUniverse;
use hobart_data::fetch::{self, HoldingsProvider};
use hobart_data::{FetchConfig, cache};
use hobart_demand::{
    LinearIvConfig, LinearIvEstimator, NonlinearIvConfig, NonlinearIvEstimator,
};
use hobart_output::{ExportFormat, Exporter};
use indicatif::{ProgressBar, ProgressStyle};
use integration::pipeline::{summarize, to_observation_set};
use polars::prelude::DataFrame;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "hobart")]
#[command(about = "Hobart: institutional asset demand estimation", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate demand coefficients for one or more managers
    Estimate {
        /// Manager identifiers to estimate, one independent fit each
        #[arg(required = true)]
        manager_ids: Vec<i64>,

        /// Read the holdings table from a local CSV instead of downloading
        #[arg(long)]
        file: Option<PathBuf>,

        /// Override the dataset URL
        #[arg(long)]
        url: Option<String>,

        /// Ceiling on the market-equity coefficient
        #[arg(long, default_value_t = hobart_demand::DEFAULT_CEILING)]
        ceiling: f64,

        /// Convergence tolerance of the nonlinear iteration
        #[arg(long, default_value_t = hobart_demand::DEFAULT_TOLERANCE)]
        tolerance: f64,

        /// Step budget of the nonlinear iteration
        #[arg(long, default_value_t = hobart_demand::DEFAULT_MAX_ITERATIONS)]
        max_iterations: usize,

        /// Disable caching (always fetch fresh data)
        #[arg(long)]
        no_cache: bool,

        /// Force refresh cached data
        #[arg(long)]
        refresh: bool,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// List the managers present in the holdings table
    Managers {
        /// Read the holdings table from a local CSV instead of downloading
        #[arg(long)]
        file: Option<PathBuf>,

        /// Override the dataset URL
        #[arg(long)]
        url: Option<String>,

        /// Disable caching (always fetch fresh data)
        #[arg(long)]
        no_cache: bool,
    },

    /// Show or clear the dataset cache
    Cache {
        /// Remove the cached dataset
        #[arg(long)]
        clear: bool,

        /// Override the dataset URL the cache entry belongs to
        #[arg(long)]
        url: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Estimate {
            manager_ids,
            file,
            url,
            ceiling,
            tolerance,
            max_iterations,
            no_cache,
            refresh,
            format,
        } => {
            let config = FetchConfig {
                use_cache: !no_cache,
                force_refresh: refresh,
            };
            let holdings = load_holdings(file, url, &config).await?;
            estimate_managers(
                &holdings,
                &manager_ids,
                ceiling,
                tolerance,
                max_iterations,
                &format,
            )?;
        }
        Commands::Managers { file, url, no_cache } => {
            let config = FetchConfig {
                use_cache: !no_cache,
                force_refresh: false,
            };
            let holdings = load_holdings(file, url, &config).await?;
            list_managers(&holdings)?;
        }
        Commands::Cache { clear, url } => {
            cache_status(clear, url)?;
        }
    }

    Ok(())
}

/// Load the holdings table from a local file or over HTTP with a progress
/// spinner.
async fn load_holdings(
    file: Option<PathBuf>,
    url: Option<String>,
    config: &FetchConfig,
) -> Result<DataFrame, Box<dyn std::error::Error>> {
    if let Some(path) = file {
        println!("Loading holdings from {}...", path.display());
        let df = fetch::load_file(&path)?;
        println!("  {} rows", df.height());
        return Ok(df);
    }

    let provider = match url {
        Some(url) => HoldingsProvider::with_url(url),
        None => HoldingsProvider::new(),
    };

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Fetching holdings from {}...", provider.url()));

    match provider.fetch(config).await {
        Ok(df) => {
            pb.finish_with_message(format!("Fetched {} rows", df.height()));
            Ok(df)
        }
        Err(e) => {
            pb.finish_with_message("Failed!");
            Err(format!("Failed to fetch holdings: {}", e).into())
        }
    }
}

fn estimate_managers(
    holdings: &DataFrame,
    manager_ids: &[i64],
    ceiling: f64,
    tolerance: f64,
    max_iterations: usize,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let linear_estimator = LinearIvEstimator::new(LinearIvConfig { ceiling });
    let nonlinear_estimator = NonlinearIvEstimator::new(NonlinearIvConfig {
        ceiling,
        tolerance,
        max_iterations,
    });
    let is_json = format.to_lowercase() == "json";

    let mut summaries = Vec::with_capacity(manager_ids.len());
    for &manager_id in manager_ids {
        let rows = hobart_data::select::manager_holdings(holdings, manager_id)?;
        let observations = to_observation_set(&rows)?;

        if !is_json {
            println!(
                "\nManager {}: {} securities ({} held)",
                manager_id,
                observations.len(),
                observations.n_positive()
            );
            print!("  Linear IV...");
        }
        let linear = linear_estimator.estimate(&observations)?;
        if !is_json {
            println!(
                " done{}",
                if linear.constrained { " (ceiling binding)" } else { "" }
            );
            print!("  Nonlinear IV...");
        }
        let nonlinear = nonlinear_estimator.estimate(&observations, &linear.coefficients)?;
        if !is_json {
            println!(
                " converged in {} iteration(s){}",
                nonlinear.iterations,
                if nonlinear.constrained { " (ceiling binding)" } else { "" }
            );
        }

        summaries.push(summarize(manager_id, &observations, &linear, &nonlinear));
    }

    if is_json {
        println!("{}", summaries.export_to_string(ExportFormat::PrettyJson)?);
    } else {
        for summary in &summaries {
            println!("{}", summary.to_ascii_table());
        }
    }

    Ok(())
}

fn list_managers(holdings: &DataFrame) -> Result<(), Box<dyn std::error::Error>> {
    let universe = ManagerUniverse::from_dataframe(holdings)?;

    println!("Holdings Table Managers");
    println!("=======================\n");
    println!("Distinct managers: {}\n", universe.size());
    println!("{:<12} {:>12} {:>12}", "Manager", "Securities", "Held");
    for manager in universe.managers() {
        println!(
            "{:<12} {:>12} {:>12}",
            manager.manager_id, manager.n_holdings, manager.n_positive
        );
    }

    Ok(())
}

fn cache_status(clear: bool, url: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let provider = match url {
        Some(url) => HoldingsProvider::with_url(url),
        None => HoldingsProvider::new(),
    };
    let dir = cache::default_dir()?;
    let name = provider.cache_name();

    if clear {
        cache::remove(&dir, name)?;
        println!("Removed cached dataset {}", dir.join(name).display());
        return Ok(());
    }

    let info = cache::info(&dir, name);
    println!("Dataset cache");
    println!("=============\n");
    println!("  Path:     {}", info.path.display());
    if info.exists {
        println!("  Size:     {} bytes", info.size_bytes);
        if let Some(modified) = info.modified {
            println!("  Updated:  {}", modified.format("%Y-%m-%d %H:%M:%S UTC"));
        }
    } else {
        println!("  Status:   not cached");
    }

    Ok(())
}
