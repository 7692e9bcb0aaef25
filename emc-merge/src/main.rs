//! emc-merge - Exo-MerCat merge engine
//!
//! Reads the uniform catalog written by the per-source adapters, resolves
//! canonical stellar identifiers, merges same-planet rows and writes the
//! merged catalog plus the audit logs for human review.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use emc_common::config::{resolve_output_dir, ConfigResolver};
use emc_common::ReplacementPolicy;
use emc_merge::catalog_io::{self, BROWN_DWARF_FILE, CATALOG_FILE};
use emc_merge::resolve::{OfflineResolver, SimbadClient};
use emc_merge::MergePipeline;

/// Command-line arguments for emc-merge
#[derive(Parser, Debug)]
#[command(name = "emc-merge")]
#[command(about = "Merge exoplanet catalogs into the Exo-MerCat catalog")]
#[command(version)]
struct Args {
    /// TOML config file
    #[arg(short, long, env = "EMC_CONFIG")]
    config: Option<PathBuf>,

    /// Uniform input catalog (overrides input_file)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output folder (overrides EMC_OUTPUT_DIR and output_dir)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Known-mistake replacement table (overrides replacements_file)
    #[arg(short, long)]
    replacements: Option<PathBuf>,

    /// Skip the external resolver; every lookup is a miss
    #[arg(long)]
    offline: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = ConfigResolver::new(args.config.clone())
        .load()
        .context("Failed to load configuration")?;

    // Initialize tracing: RUST_LOG, then --verbose, then [logging] level
    let default_level = if args.verbose {
        "debug".to_string()
    } else {
        config.logging.level.clone()
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting emc-merge v{}", env!("CARGO_PKG_VERSION"));

    // Step 1: Paths
    let input = args.input.clone().unwrap_or_else(|| config.input_file.clone());
    let output_dir = resolve_output_dir(args.output_dir.as_deref(), &config);
    let log_dir = config.log_dir_in(&output_dir);
    info!("Input: {}", input.display());
    info!("Output folder: {}", output_dir.display());

    // Step 2: Replacement table
    let policy = match args.replacements.as_ref().or(config.replacements_file.as_ref()) {
        Some(path) => {
            info!("Replacement table: {}", path.display());
            ReplacementPolicy::load(path)
                .with_context(|| format!("Failed to load replacements from {}", path.display()))?
        }
        None => ReplacementPolicy::default(),
    };

    // Step 3: Uniform rows
    let rows = catalog_io::read_rows(&input)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    // Step 4: Run the merge
    let output = if args.offline {
        info!("Offline mode: external resolver disabled");
        let resolver = OfflineResolver;
        MergePipeline::new(policy, &resolver, &resolver, &config)
            .run(rows)
            .await?
    } else {
        let client = SimbadClient::new(&config.resolver)
            .context("Failed to create SIMBAD client")?;
        MergePipeline::new(policy, &client, &client, &config)
            .run(rows)
            .await?
    };

    // Step 5: Artifacts
    let today = chrono::Local::now().date_naive();
    catalog_io::write_catalog(&output_dir.join(CATALOG_FILE), &output.catalog)?;
    catalog_io::write_catalog(
        &output_dir.join(catalog_io::dated_file_name(today)),
        &output.catalog,
    )?;
    catalog_io::write_catalog(&output_dir.join(BROWN_DWARF_FILE), &output.brown_dwarfs)?;

    let written = output
        .audit
        .write_to_dir(&log_dir)
        .with_context(|| format!("Failed to write audit logs to {}", log_dir.display()))?;
    info!(
        "{} audit records written to {} files in {}",
        output.audit.len(),
        written.len(),
        log_dir.display()
    );

    info!("Done: {} entries", output.catalog.len());
    Ok(())
}
