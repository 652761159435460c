pub mod catalog;
pub mod config;
pub mod emit;
pub mod generate;
pub mod list;
pub mod load_config;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use catalog::HttpCatalog;
use generate::generate;
use list::{PrefixLister, S3PrefixLister};
use load_config::load_config;

/// CLI for opendata-gen: registry entries for bucket-hosted datasets.
#[derive(Parser)]
#[clap(
    name = "opendata-gen",
    version,
    about = "Generate AWS Open Data registry entries for datasets in a public S3 bucket"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate one registry entry file per dataset prefix in the bucket
    Generate {
        /// Path to an optional YAML config file
        #[clap(long)]
        config: Option<PathBuf>,
        /// Override the bucket name from config/defaults
        #[clap(long)]
        bucket: Option<String>,
        /// Override the output directory from config/defaults
        #[clap(long)]
        output_dir: Option<PathBuf>,
    },
    /// Export the bucket's dataset prefixes as a CSV, without generating entries
    ExportPrefixes {
        /// Path to an optional YAML config file
        #[clap(long)]
        config: Option<PathBuf>,
        /// Where to write the CSV
        #[clap(long, default_value = "physionet-open-s3-bucket-prefixes.csv")]
        out: PathBuf,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Generate {
            config,
            bucket,
            output_dir,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(bucket) = bucket {
                config.bucket = bucket;
            }
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }

            let lister = S3PrefixLister::new(&config.bucket, &config.region).await;
            let catalog = HttpCatalog::new(&config);

            println!("Generating registry entries for bucket '{}'...", config.bucket);
            match generate(&config, &lister, &catalog).await {
                Ok(report) => {
                    println!(
                        "Generation complete: {} written, {} skipped.",
                        report.written.len(),
                        report.skipped.len()
                    );
                    for skipped in &report.skipped {
                        println!("  skipped {}: {}", skipped.slug, skipped.reason);
                    }
                    Ok(())
                }
                Err(e) => {
                    eprintln!("[ERROR] Generation failed: {e}");
                    Err(anyhow::Error::new(e))
                }
            }
        }
        Commands::ExportPrefixes { config, out } => {
            let config = load_config(config.as_deref())?;
            let lister = S3PrefixLister::new(&config.bucket, &config.region).await;
            let slugs = lister.list_prefixes().await.map_err(|e| {
                eprintln!("[ERROR] Listing failed: {e}");
                anyhow::Error::new(e)
            })?;
            emit::export_prefixes_csv(&out, &slugs)?;
            println!("Exported {} prefixes to {}", slugs.len(), out.display());
            Ok(())
        }
    }
}
