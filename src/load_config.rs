//! Loads the optional YAML config file and merges it with defaults and
//! environment overrides.
//!
//! Every section and field is optional: running with no config file at all
//! targets the PhysioNet open-data bucket with the stock attribution fields.
//! The catalog base URL can additionally be overridden with the
//! `CATALOG_BASE_URL` environment variable, which wins over the file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

use crate::config::GeneratorConfig;

/// Environment override for the catalog endpoint.
pub const CATALOG_BASE_URL_ENV: &str = "CATALOG_BASE_URL";

#[derive(Deserialize, Default)]
struct StaticConfig {
    #[serde(default)]
    bucket: BucketSection,
    #[serde(default)]
    catalog: CatalogSection,
    #[serde(default)]
    output: OutputSection,
    #[serde(default)]
    record: RecordSection,
}

#[derive(Deserialize, Default)]
struct BucketSection {
    name: Option<String>,
    region: Option<String>,
}

#[derive(Deserialize, Default)]
struct CatalogSection {
    base_url: Option<String>,
}

#[derive(Deserialize, Default)]
struct OutputSection {
    dir: Option<PathBuf>,
}

#[derive(Deserialize, Default)]
struct RecordSection {
    managed_by: Option<String>,
    contact: Option<String>,
    tags: Option<Vec<String>>,
    adx_categories: Option<String>,
}

/// Build the run configuration: defaults, then the file (if given), then the
/// environment.
pub fn load_config(path: Option<&Path>) -> Result<GeneratorConfig> {
    let static_conf = match path {
        Some(path_ref) => {
            info!(config_path = ?path_ref, "Loading configuration from file");
            let content = fs::read_to_string(path_ref)
                .with_context(|| format!("Failed to read config file {path_ref:?}"))?;
            serde_yaml::from_str::<StaticConfig>(&content)
                .with_context(|| format!("Failed to parse config YAML {path_ref:?}"))?
        }
        None => {
            info!("No config file given, using defaults");
            StaticConfig::default()
        }
    };

    let mut config = GeneratorConfig::default();
    if let Some(name) = static_conf.bucket.name {
        config.bucket = name;
    }
    if let Some(region) = static_conf.bucket.region {
        config.region = region;
    }
    if let Some(base_url) = static_conf.catalog.base_url {
        config.catalog_base_url = base_url;
    }
    if let Some(dir) = static_conf.output.dir {
        config.output_dir = dir;
    }
    if let Some(managed_by) = static_conf.record.managed_by {
        config.managed_by = managed_by;
    }
    if let Some(contact) = static_conf.record.contact {
        config.contact_url = contact;
    }
    if let Some(tags) = static_conf.record.tags {
        config.tags = tags;
    }
    if let Some(categories) = static_conf.record.adx_categories {
        config.adx_categories = categories;
    }

    if let Ok(base_url) = std::env::var(CATALOG_BASE_URL_ENV) {
        info!(base_url = %base_url, "Catalog base URL overridden from environment");
        config.catalog_base_url = base_url;
    }

    info!(
        bucket = %config.bucket,
        output_dir = %config.output_dir.display(),
        catalog = %config.catalog_base_url,
        "Config resolved"
    );

    Ok(config)
}
