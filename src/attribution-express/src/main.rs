//! Attribution Express: channel attribution and acquisition-cost reporting.
//!
//! Main entry point: loads the source tables, runs every attribution
//! policy, and emits the CAC and marginal allocation tables.

use anyhow::Context;
use attribution_core::{AppConfig, Tier};
use attribution_engine::{
    AttributionEngine, AttributionModel, CacCalculator, MarginalAllocationAnalyzer,
};
use attribution_reporting::{loader, tables};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "attribution-express")]
#[command(about = "Channel attribution and acquisition-cost reporting")]
#[command(version)]
struct Cli {
    /// Customer touch table (overrides config)
    #[arg(long, env = "ATTRIBUTION_EXPRESS__CUSTOMERS_PATH")]
    customers: Option<PathBuf>,

    /// Channel spend table (overrides config)
    #[arg(long, env = "ATTRIBUTION_EXPRESS__SPEND_PATH")]
    spend: Option<PathBuf>,

    /// Directory for result CSVs (overrides config)
    #[arg(long, env = "ATTRIBUTION_EXPRESS__OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Print tables without writing result files
    #[arg(long, default_value_t = false)]
    no_export: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "attribution_express=info,attribution_reporting=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    info!("Attribution Express starting up");

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    if let Some(path) = cli.customers {
        config.customers_path = path.display().to_string();
    }
    if let Some(path) = cli.spend {
        config.spend_path = path.display().to_string();
    }
    if let Some(path) = cli.output_dir {
        config.output_dir = path.display().to_string();
    }

    info!(
        customers = %config.customers_path,
        spend = %config.spend_path,
        output_dir = %config.output_dir,
        "Configuration loaded"
    );

    let customers = loader::load_customers(Path::new(&config.customers_path))
        .context("loading customer touch table")?;
    let cost = loader::load_cost_model(Path::new(&config.spend_path))
        .context("loading channel spend table")?;

    let converted = loader::converted_customers(&customers);
    info!(
        total = customers.len(),
        converted = converted.len(),
        "customers filtered to conversions"
    );

    let channel_set = config.attribution.channel_set();
    let engine = AttributionEngine::new(channel_set.clone());
    let calculator = CacCalculator::new(cost.clone());
    let output_dir = Path::new(&config.output_dir);

    for model in AttributionModel::ALL {
        let totals = engine.run(model, converted.iter().copied())?;
        let report = calculator.compute(model, &totals, Tier::One);
        if !report.missing_cost.is_empty() {
            warn!(
                model = model.display_name(),
                channels = ?report.missing_cost,
                "channels excluded from the CAC join for lack of cost data"
            );
        }

        println!("{} attribution", model.display_name());
        println!("{}", tables::render_cac_table(&report));

        if !cli.no_export {
            let path = output_dir.join(format!("cac_{}.csv", model.slug()));
            tables::write_cac_csv(&report, &path)?;
            info!(path = %path.display(), "CAC table written");
        }
    }

    let analyzer = MarginalAllocationAnalyzer::new(channel_set, cost);
    let marginal = analyzer.analyze(converted.iter().copied())?;
    if !marginal.missing_cost.is_empty() {
        warn!(
            channels = ?marginal.missing_cost,
            "channels excluded from the marginal table for lack of cost data"
        );
    }

    println!("Marginal allocation");
    println!("{}", tables::render_marginal_table(&marginal));

    if !cli.no_export {
        let path = output_dir.join("marginal_allocation.csv");
        tables::write_marginal_csv(&marginal, &path)?;
        info!(path = %path.display(), "marginal allocation table written");
    }

    Ok(())
}
