//! Explicit run configuration for the generator pipeline.
//!
//! All knobs live here so every stage receives plain values instead of
//! reading globals. Defaults describe the PhysioNet open-data bucket and
//! catalog; `load_config` merges an optional YAML file and environment
//! overrides on top of these.

use std::path::PathBuf;

/// Default public bucket holding one dataset per top-level prefix.
pub const DEFAULT_BUCKET: &str = "physionet-open";
/// Region the bucket lives in; also stamped into every emitted resource entry.
pub const DEFAULT_REGION: &str = "us-east-1";
/// Base URL of the catalog API that knows the published projects.
pub const DEFAULT_CATALOG_BASE_URL: &str = "https://physionet.org/api/v1";
/// Where registry entry files are written.
pub const DEFAULT_OUTPUT_DIR: &str = "datasets";

/// Fully resolved configuration consumed by the pipeline stages.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Name of the public bucket to enumerate.
    pub bucket: String,
    /// Bucket region, used for the anonymous client and the resource entries.
    pub region: String,
    /// Directory registry entry files are written into.
    pub output_dir: PathBuf,
    /// Base URL of the metadata catalog API.
    pub catalog_base_url: String,
    /// Attribution string for the `ManagedBy` field.
    pub managed_by: String,
    /// Contact URL stamped into every record.
    pub contact_url: String,
    /// Tags attached to every record.
    pub tags: Vec<String>,
    /// AWS Data Exchange category string.
    pub adx_categories: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            bucket: DEFAULT_BUCKET.to_string(),
            region: DEFAULT_REGION.to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            catalog_base_url: DEFAULT_CATALOG_BASE_URL.to_string(),
            managed_by: "PhysioNet".to_string(),
            contact_url: "https://physionet.org/about/#contact_us".to_string(),
            tags: vec!["aws-pds".to_string()],
            adx_categories: "Healthcare & Life Sciences Data".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_targets_the_public_bucket() {
        let config = GeneratorConfig::default();
        assert_eq!(config.bucket, "physionet-open");
        assert_eq!(config.region, "us-east-1");
        assert_eq!(config.output_dir, PathBuf::from("datasets"));
        assert_eq!(config.tags, vec!["aws-pds".to_string()]);
    }
}
