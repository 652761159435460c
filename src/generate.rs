//! High-level pipeline: list prefixes → fetch catalog metadata → emit entries.
//!
//! One forward pass, dataset by dataset, in listing order. A listing or write
//! failure aborts the run; a fetch failure skips that dataset with a warning
//! and the loop continues. The returned report carries everything a caller
//! needs for the end-of-run summary.

use tracing::{error, info, warn};

use crate::catalog::Catalog;
use crate::config::GeneratorConfig;
use crate::emit;
use crate::emit::WriteError;
use crate::list::{ListingError, PrefixLister};

/// Fatal pipeline failure.
#[derive(Debug)]
pub enum GenerateError {
    Listing(ListingError),
    Write(WriteError),
}

impl std::fmt::Display for GenerateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerateError::Listing(e) => write!(f, "{e}"),
            GenerateError::Write(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for GenerateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GenerateError::Listing(e) => Some(e),
            GenerateError::Write(e) => Some(e),
        }
    }
}

impl From<ListingError> for GenerateError {
    fn from(e: ListingError) -> Self {
        GenerateError::Listing(e)
    }
}

impl From<WriteError> for GenerateError {
    fn from(e: WriteError) -> Self {
        GenerateError::Write(e)
    }
}

/// A dataset the run passed over, with the cause for the summary.
#[derive(Debug)]
pub struct SkippedDataset {
    pub slug: String,
    pub reason: String,
}

/// Outcome of a full run.
#[derive(Debug, Default)]
pub struct GenerateReport {
    /// Identifiers an entry file was written for, in processing order.
    pub written: Vec<String>,
    /// Identifiers skipped because their catalog lookup failed.
    pub skipped: Vec<SkippedDataset>,
}

/// Run the full pipeline with the given stages.
pub async fn generate<L, C>(
    config: &GeneratorConfig,
    lister: &L,
    catalog: &C,
) -> Result<GenerateReport, GenerateError>
where
    L: PrefixLister + ?Sized,
    C: Catalog + ?Sized,
{
    info!(bucket = %config.bucket, "Starting registry entry generation");

    let slugs = match lister.list_prefixes().await {
        Ok(slugs) => slugs,
        Err(e) => {
            error!(error = %e, bucket = %config.bucket, "Bucket listing failed");
            return Err(e.into());
        }
    };
    info!(datasets = slugs.len(), "Bucket listing returned dataset prefixes");

    let mut report = GenerateReport::default();

    for slug in slugs {
        let metadata = match catalog.fetch_project(&slug).await {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(slug = %slug, reason = %e, "Skipping dataset: catalog lookup failed");
                report.skipped.push(SkippedDataset {
                    slug,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let record = emit::build_record(config, &slug, &metadata);
        let path = emit::write_record(&config.output_dir, &slug, &record)?;
        info!(slug = %slug, path = %path.display(), "Generated registry entry");
        report.written.push(slug);
    }

    info!(
        written = report.written.len(),
        skipped = report.skipped.len(),
        "Generation complete"
    );
    Ok(report)
}
