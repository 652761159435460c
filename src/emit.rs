//! File emitter: renders one registry entry per dataset and writes it to the
//! output directory.
//!
//! The on-disk schema is the AWS Open Data registry entry format. Field order
//! is part of the schema, so the record is a struct serialized in declaration
//! order rather than a map. Rendering is pure; the same record always yields
//! byte-identical YAML, which keeps reruns idempotent.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::catalog::ProjectMetadata;
use crate::config::GeneratorConfig;

/// Resource type stamped into every entry; datasets live in S3 only.
const RESOURCE_TYPE: &str = "S3 Bucket";

/// Failure writing output. Fatal: an unwritable output directory means the
/// environment is broken for every remaining dataset too.
#[derive(Debug)]
pub enum WriteError {
    /// YAML rendering failed; indicates a bug rather than an I/O problem.
    Render(serde_yaml::Error),
    /// Creating the directory or writing the file failed.
    Io { path: PathBuf, source: io::Error },
}

impl std::fmt::Display for WriteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteError::Render(e) => write!(f, "failed to render record: {e}"),
            WriteError::Io { path, source } => {
                write!(f, "failed to write {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for WriteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WriteError::Render(e) => Some(e),
            WriteError::Io { source, .. } => Some(source),
        }
    }
}

/// One storage location of a dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceEntry {
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "ARN")]
    pub arn: String,
    #[serde(rename = "Region")]
    pub region: String,
    #[serde(rename = "Type")]
    pub resource_type: String,
}

/// A complete registry entry, serialized in schema order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Documentation")]
    pub documentation: String,
    #[serde(rename = "Contact")]
    pub contact: String,
    #[serde(rename = "ManagedBy")]
    pub managed_by: String,
    #[serde(rename = "UpdateFrequency")]
    pub update_frequency: String,
    #[serde(rename = "Tags")]
    pub tags: Vec<String>,
    #[serde(rename = "License")]
    pub license: String,
    #[serde(rename = "Resources")]
    pub resources: Vec<ResourceEntry>,
    #[serde(rename = "ADXCategories")]
    pub adx_categories: String,
}

/// ARN of the prefix holding one dataset's objects. Trailing slash included:
/// the ARN names the prefix, not an object.
pub fn dataset_arn(bucket: &str, slug: &str) -> String {
    format!("arn:aws:s3:::{bucket}/{slug}/")
}

/// Merge bucket identity, fetched metadata and fixed attribution into one
/// registry entry.
pub fn build_record(
    config: &GeneratorConfig,
    slug: &str,
    metadata: &ProjectMetadata,
) -> DatasetRecord {
    DatasetRecord {
        name: metadata.title.clone(),
        description: metadata.description.clone(),
        documentation: metadata.documentation.clone(),
        contact: metadata.contact.clone(),
        managed_by: config.managed_by.clone(),
        update_frequency: metadata.update_frequency.clone(),
        tags: metadata.tags.clone(),
        license: metadata.license.clone(),
        resources: vec![ResourceEntry {
            description: metadata.documentation.clone(),
            arn: dataset_arn(&config.bucket, slug),
            region: config.region.clone(),
            resource_type: RESOURCE_TYPE.to_string(),
        }],
        adx_categories: metadata.category.clone(),
    }
}

/// Render a record to its YAML document.
pub fn render_record(record: &DatasetRecord) -> Result<String, WriteError> {
    serde_yaml::to_string(record).map_err(WriteError::Render)
}

/// Write the record to `<output_dir>/<slug>.yaml`, creating the directory if
/// needed and overwriting any previous file. Returns the written path.
pub fn write_record(
    output_dir: &Path,
    slug: &str,
    record: &DatasetRecord,
) -> Result<PathBuf, WriteError> {
    let rendered = render_record(record)?;
    fs::create_dir_all(output_dir).map_err(|e| WriteError::Io {
        path: output_dir.to_path_buf(),
        source: e,
    })?;
    let path = output_dir.join(format!("{slug}.yaml"));
    fs::write(&path, rendered).map_err(|e| WriteError::Io {
        path: path.clone(),
        source: e,
    })?;
    debug!(path = %path.display(), "Wrote registry entry");
    Ok(path)
}

/// Export the raw prefix list as a one-column CSV, header included, for
/// auditing a run without generating entries.
pub fn export_prefixes_csv(path: &Path, slugs: &[String]) -> Result<(), WriteError> {
    let mut csv = String::from("project_slug\n");
    for slug in slugs {
        csv.push_str(slug);
        csv.push('\n');
    }
    fs::write(path, csv).map_err(|e| WriteError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ProjectMetadata;
    use tempfile::tempdir;

    fn sample_metadata() -> ProjectMetadata {
        ProjectMetadata {
            title: "MIMIC-IV Clinical Database Demo".to_string(),
            description: "A demo subset of MIMIC-IV.".to_string(),
            license: "Open Data Commons ODbL v1.0".to_string(),
            documentation: "https://doi.org/10.13026/abcd-1234".to_string(),
            contact: "https://physionet.org/about/#contact_us".to_string(),
            update_frequency: "Not updated".to_string(),
            tags: vec!["aws-pds".to_string()],
            category: "Healthcare & Life Sciences Data".to_string(),
        }
    }

    #[test]
    fn arn_has_fixed_form_with_trailing_slash() {
        assert_eq!(
            dataset_arn("physionet-open", "mimic-iv-demo"),
            "arn:aws:s3:::physionet-open/mimic-iv-demo/"
        );
    }

    #[test]
    fn record_fields_render_in_schema_order() {
        let config = GeneratorConfig::default();
        let record = build_record(&config, "mimic-iv-demo", &sample_metadata());
        let yaml = render_record(&record).unwrap();

        let keys: Vec<&str> = yaml
            .lines()
            .filter(|l| !l.starts_with([' ', '-']))
            .filter_map(|l| l.split(':').next())
            .collect();
        assert_eq!(
            keys,
            vec![
                "Name",
                "Description",
                "Documentation",
                "Contact",
                "ManagedBy",
                "UpdateFrequency",
                "Tags",
                "License",
                "Resources",
                "ADXCategories"
            ]
        );
    }

    #[test]
    fn rendering_is_idempotent() {
        let config = GeneratorConfig::default();
        let record = build_record(&config, "mimic-iv-demo", &sample_metadata());
        assert_eq!(render_record(&record).unwrap(), render_record(&record).unwrap());
    }

    #[test]
    fn resource_entry_carries_documentation_region_and_type() {
        let config = GeneratorConfig::default();
        let record = build_record(&config, "eicu-demo", &sample_metadata());
        assert_eq!(record.resources.len(), 1);
        let resource = &record.resources[0];
        assert_eq!(resource.description, "https://doi.org/10.13026/abcd-1234");
        assert_eq!(resource.arn, "arn:aws:s3:::physionet-open/eicu-demo/");
        assert_eq!(resource.region, "us-east-1");
        assert_eq!(resource.resource_type, "S3 Bucket");
    }

    #[test]
    fn empty_tags_render_without_crashing() {
        let config = GeneratorConfig::default();
        let mut metadata = sample_metadata();
        metadata.tags.clear();
        let record = build_record(&config, "eicu-demo", &metadata);
        let yaml = render_record(&record).unwrap();
        assert!(yaml.contains("Tags: []"));
    }

    #[test]
    fn write_record_creates_directory_and_overwrites() {
        let dir = tempdir().unwrap();
        let output_dir = dir.path().join("datasets");
        let config = GeneratorConfig::default();
        let record = build_record(&config, "mimic-iv-demo", &sample_metadata());

        let first = write_record(&output_dir, "mimic-iv-demo", &record).unwrap();
        assert_eq!(first, output_dir.join("mimic-iv-demo.yaml"));
        let before = std::fs::read_to_string(&first).unwrap();

        // Second write must overwrite with identical bytes.
        write_record(&output_dir, "mimic-iv-demo", &record).unwrap();
        let after = std::fs::read_to_string(&first).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn write_record_fails_on_unwritable_target() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("datasets");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let config = GeneratorConfig::default();
        let record = build_record(&config, "mimic-iv-demo", &sample_metadata());
        let err = write_record(&blocker, "mimic-iv-demo", &record).unwrap_err();
        assert!(matches!(err, WriteError::Io { .. }));
    }

    #[test]
    fn csv_export_has_header_and_one_row_per_slug() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefixes.csv");
        let slugs = vec!["mimic-iv-demo".to_string(), "eicu-demo".to_string()];
        export_prefixes_csv(&path, &slugs).unwrap();
        let csv = std::fs::read_to_string(&path).unwrap();
        assert_eq!(csv, "project_slug\nmimic-iv-demo\neicu-demo\n");
    }
}
