//! Bucket lister: enumerates top-level prefixes of the public dataset bucket.
//!
//! Each top-level prefix is one dataset; the prefix with its trailing slash
//! stripped is the dataset identifier used by every downstream stage. Listing
//! uses anonymous (unsigned) access, so no credentials are ever required.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use tracing::{debug, info};

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

/// Error listing the bucket. Fatal to the whole run: without a complete
/// prefix list there is nothing meaningful to generate.
#[derive(Debug)]
pub enum ListingError {
    /// The listing request itself failed (network, DNS, access).
    Request(String),
    /// The service answered but the listing payload was not usable.
    MalformedListing(String),
}

impl std::fmt::Display for ListingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListingError::Request(msg) => write!(f, "bucket listing request failed: {msg}"),
            ListingError::MalformedListing(msg) => {
                write!(f, "bucket listing returned malformed data: {msg}")
            }
        }
    }
}

impl std::error::Error for ListingError {}

/// Trait seam for the listing stage, so the pipeline can run against a mock
/// in tests without touching the network.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait PrefixLister: Send + Sync {
    /// Return all distinct dataset identifiers (top-level prefixes, trailing
    /// slash stripped). No ordering guarantee.
    async fn list_prefixes(&self) -> Result<Vec<String>, ListingError>;
}

/// Production lister backed by the S3 API, using unsigned requests against
/// the public bucket.
pub struct S3PrefixLister {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3PrefixLister {
    /// Build an anonymous S3 client for the given bucket and region.
    pub async fn new(bucket: &str, region: &str) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .no_credentials()
            .region(Region::new(region.to_string()))
            .load()
            .await;
        S3PrefixLister {
            client: aws_sdk_s3::Client::new(&sdk_config),
            bucket: bucket.to_string(),
        }
    }
}

#[async_trait]
impl PrefixLister for S3PrefixLister {
    async fn list_prefixes(&self) -> Result<Vec<String>, ListingError> {
        let mut prefixes: Vec<String> = Vec::new();
        let mut continuation_token: Option<String> = None;

        // Delimiter-based listing: CommonPrefixes are the dataset boundaries.
        loop {
            let mut req = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .delimiter("/");
            if let Some(token) = continuation_token {
                req = req.continuation_token(token);
            }
            let resp = req
                .send()
                .await
                .map_err(|e| ListingError::Request(format!("{e}")))?;

            for common_prefix in resp.common_prefixes() {
                let prefix = common_prefix.prefix().ok_or_else(|| {
                    ListingError::MalformedListing(
                        "listing entry without a prefix value".to_string(),
                    )
                })?;
                prefixes.push(normalise_prefix(prefix));
            }

            debug!(
                bucket = %self.bucket,
                total = prefixes.len(),
                truncated = resp.next_continuation_token.is_some(),
                "Fetched one page of bucket listing"
            );

            continuation_token = resp.next_continuation_token;
            if continuation_token.is_none() {
                break;
            }
        }

        info!(bucket = %self.bucket, prefixes = prefixes.len(), "Bucket listing complete");
        Ok(prefixes)
    }
}

/// Strip the trailing delimiter so the prefix can serve as an identifier
/// and a file stem.
pub fn normalise_prefix(prefix: &str) -> String {
    prefix.trim_end_matches('/').to_string()
}
