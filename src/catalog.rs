//! Metadata fetcher: resolves each dataset identifier against the published
//! projects catalog API.
//!
//! The catalog exposes two endpoints per project: a version index
//! (`/project/published/<slug>/`, a JSON array ordered oldest-first) and the
//! per-version details (`/project/published/<slug>/<version>/`). The fetcher
//! takes the latest version, then maps the details onto a flat
//! [`ProjectMetadata`] record, filling documented defaults for anything the
//! catalog omits. One attempt per dataset; the pipeline decides what a
//! failure means.

use async_trait::async_trait;
use regex::Regex;
use reqwest::header::USER_AGENT;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;

use crate::config::GeneratorConfig;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

/// License assumed when the catalog record carries none.
pub const DEFAULT_LICENSE: &str = "Open Data Commons Open Database License v1.0";
/// Update cadence reported for archival datasets; the catalog has no field for it.
pub const DEFAULT_UPDATE_FREQUENCY: &str = "Not updated";

/// Sent on every catalog request; the API rejects clients without one.
const CATALOG_USER_AGENT: &str = "Mozilla/5.0";

/// Per-dataset fetch failure. Never fatal to the run: the pipeline skips the
/// dataset and logs the cause.
#[derive(Debug)]
pub enum FetchError {
    /// The catalog has no published record for this identifier.
    NotFound,
    /// Transport-level failure (connect, timeout, body decode).
    Http(reqwest::Error),
    /// The catalog answered with an unexpected status code.
    Status(StatusCode),
    /// The response body did not have the shape we rely on.
    Schema(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::NotFound => write!(f, "no published catalog record"),
            FetchError::Http(e) => write!(f, "catalog request failed: {e}"),
            FetchError::Status(code) => write!(f, "catalog returned status {code}"),
            FetchError::Schema(msg) => write!(f, "unexpected catalog response shape: {msg}"),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Http(e) => Some(e),
            _ => None,
        }
    }
}

/// Flat metadata record for one dataset, ready for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectMetadata {
    pub title: String,
    /// Catalog abstract with HTML tags stripped.
    pub description: String,
    pub license: String,
    /// DOI link when the project has one, otherwise its catalog content page.
    pub documentation: String,
    pub contact: String,
    pub update_frequency: String,
    pub tags: Vec<String>,
    pub category: String,
}

/// Trait seam for the fetch stage; mocked in pipeline tests.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Fetch the metadata record for one dataset identifier.
    async fn fetch_project(&self, slug: &str) -> Result<ProjectMetadata, FetchError>;
}

/// Production catalog client over HTTP.
pub struct HttpCatalog {
    http: reqwest::Client,
    base_url: String,
    html_tag: Regex,
    contact_url: String,
    tags: Vec<String>,
    category: String,
}

impl HttpCatalog {
    pub fn new(config: &GeneratorConfig) -> Self {
        HttpCatalog {
            http: reqwest::Client::new(),
            base_url: config.catalog_base_url.trim_end_matches('/').to_string(),
            html_tag: Regex::new(r"<[^>]+>").expect("static pattern"),
            contact_url: config.contact_url.clone(),
            tags: config.tags.clone(),
            category: config.adx_categories.clone(),
        }
    }

    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        let resp = self
            .http
            .get(url)
            .header(USER_AGENT, CATALOG_USER_AGENT)
            .send()
            .await
            .map_err(FetchError::Http)?;
        match resp.status() {
            StatusCode::NOT_FOUND => Err(FetchError::NotFound),
            status if !status.is_success() => Err(FetchError::Status(status)),
            _ => resp.json().await.map_err(FetchError::Http),
        }
    }

    /// Map the per-version details payload onto a [`ProjectMetadata`].
    fn build_metadata(&self, slug: &str, details: &Value) -> Result<ProjectMetadata, FetchError> {
        let title = details
            .get("title")
            .and_then(Value::as_str)
            .ok_or_else(|| FetchError::Schema("details record without a title".to_string()))?;

        let abstract_html = details
            .get("abstract")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let description = self.html_tag.replace_all(abstract_html, "").into_owned();

        let license = details
            .get("license")
            .and_then(|l| l.get("name"))
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_LICENSE)
            .to_string();

        let documentation = match details.get("doi").and_then(Value::as_str) {
            Some(doi) if !doi.is_empty() => format!("https://doi.org/{doi}"),
            _ => format!("https://physionet.org/content/{slug}/"),
        };

        Ok(ProjectMetadata {
            title: title.to_string(),
            description,
            license,
            documentation,
            contact: self.contact_url.clone(),
            update_frequency: DEFAULT_UPDATE_FREQUENCY.to_string(),
            tags: self.tags.clone(),
            category: self.category.clone(),
        })
    }
}

#[async_trait]
impl Catalog for HttpCatalog {
    async fn fetch_project(&self, slug: &str) -> Result<ProjectMetadata, FetchError> {
        let versions_url = format!("{}/project/published/{}/", self.base_url, slug);
        let versions = self.get_json(&versions_url).await?;
        let version = latest_version(&versions)?;
        debug!(slug = slug, version = %version, "Resolved latest published version");

        let details_url = format!("{}/project/published/{}/{}/", self.base_url, slug, version);
        let details = self.get_json(&details_url).await?;
        self.build_metadata(slug, &details)
    }
}

/// Pick the latest version from the version index. The catalog returns the
/// array oldest-first, so the last entry wins. An empty or non-array body
/// means the project is not published.
fn latest_version(versions: &Value) -> Result<String, FetchError> {
    let entries = versions.as_array().ok_or(FetchError::NotFound)?;
    let latest = entries.last().ok_or(FetchError::NotFound)?;
    latest
        .get("version")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| FetchError::Schema("version entry without a version field".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn catalog() -> HttpCatalog {
        HttpCatalog::new(&GeneratorConfig::default())
    }

    #[test]
    fn latest_version_takes_last_entry() {
        let body = json!([
            {"version": "1.0"},
            {"version": "2.0"},
            {"version": "2.1"}
        ]);
        assert_eq!(latest_version(&body).unwrap(), "2.1");
    }

    #[test]
    fn empty_version_index_means_not_found() {
        let body = json!([]);
        assert!(matches!(latest_version(&body), Err(FetchError::NotFound)));
    }

    #[test]
    fn non_array_version_index_means_not_found() {
        let body = json!({"detail": "Not found."});
        assert!(matches!(latest_version(&body), Err(FetchError::NotFound)));
    }

    #[test]
    fn version_entry_without_version_field_is_a_schema_error() {
        let body = json!([{"slug": "mimic-iv-demo"}]);
        assert!(matches!(latest_version(&body), Err(FetchError::Schema(_))));
    }

    #[test]
    fn full_details_map_onto_metadata() {
        let details = json!({
            "title": "MIMIC-IV Clinical Database Demo",
            "abstract": "<p>A demo subset of <b>MIMIC-IV</b>.</p>",
            "license": {"name": "Open Data Commons ODbL v1.0"},
            "doi": "10.13026/abcd-1234"
        });
        let record = catalog().build_metadata("mimic-iv-demo", &details).unwrap();
        assert_eq!(record.title, "MIMIC-IV Clinical Database Demo");
        assert_eq!(record.description, "A demo subset of MIMIC-IV.");
        assert_eq!(record.license, "Open Data Commons ODbL v1.0");
        assert_eq!(record.documentation, "https://doi.org/10.13026/abcd-1234");
        assert_eq!(record.update_frequency, "Not updated");
        assert_eq!(record.tags, vec!["aws-pds".to_string()]);
    }

    #[test]
    fn missing_optional_fields_resolve_to_defaults() {
        let details = json!({"title": "eICU Demo"});
        let record = catalog().build_metadata("eicu-demo", &details).unwrap();
        assert_eq!(record.description, "");
        assert_eq!(record.license, DEFAULT_LICENSE);
        assert_eq!(record.documentation, "https://physionet.org/content/eicu-demo/");
    }

    #[test]
    fn null_doi_falls_back_to_content_page() {
        let details = json!({"title": "eICU Demo", "doi": null});
        let record = catalog().build_metadata("eicu-demo", &details).unwrap();
        assert_eq!(record.documentation, "https://physionet.org/content/eicu-demo/");
    }

    #[test]
    fn missing_title_is_a_schema_error() {
        let details = json!({"abstract": "<p>No title here.</p>"});
        assert!(matches!(
            catalog().build_metadata("x", &details),
            Err(FetchError::Schema(_))
        ));
    }
}
