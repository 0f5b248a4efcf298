//! CDN publishing and cache purging.
//!
//! The publisher speaks a bearer-token zone API: raw file uploads to
//! `/api/v1/zones/{zone}/upload` and batched purges to
//! `/api/v1/zones/{zone}/purge`. Credentials are checked before any network
//! activity, non-2xx responses and transport failures are classified
//! separately, and no retrying happens at this layer.

use crate::constants::CDN_REQUEST_TIMEOUT_SECS;
use crate::error::{ConvertError, Result};
use crate::store;
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct CdnCredentials {
    pub base_url: String,
    pub api_key: String,
    pub zone_id: String,
}

impl CdnCredentials {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        zone_id: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim().to_string(),
            api_key: api_key.into().trim().to_string(),
            zone_id: zone_id.into().trim().to_string(),
        }
    }

    /// Merges explicit values with the `AVIF_CDN_URL` / `AVIF_CDN_API_KEY` /
    /// `AVIF_CDN_ZONE_ID` environment variables. Explicit values win.
    pub fn resolve(
        base_url: Option<String>,
        api_key: Option<String>,
        zone_id: Option<String>,
    ) -> Self {
        Self::new(
            base_url.or_else(|| env::var("AVIF_CDN_URL").ok()).unwrap_or_default(),
            api_key
                .or_else(|| env::var("AVIF_CDN_API_KEY").ok())
                .unwrap_or_default(),
            zone_id
                .or_else(|| env::var("AVIF_CDN_ZONE_ID").ok())
                .unwrap_or_default(),
        )
    }

    pub fn is_complete(&self) -> bool {
        !self.base_url.is_empty() && !self.api_key.is_empty() && !self.zone_id.is_empty()
    }

    fn upload_url(&self) -> String {
        format!(
            "{}/api/v1/zones/{}/upload",
            self.base_url.trim_end_matches('/'),
            self.zone_id
        )
    }

    fn purge_url(&self) -> String {
        format!(
            "{}/api/v1/zones/{}/purge",
            self.base_url.trim_end_matches('/'),
            self.zone_id
        )
    }

    /// Public location of an uploaded file when the CDN response does not
    /// name one.
    fn derived_location(&self, file_path: &Path) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.zone_id,
            file_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        )
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: Option<String>,
}

fn build_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(CDN_REQUEST_TIMEOUT_SECS))
        .build()
        .map_err(|e| ConvertError::TransportError(e.to_string()))
}

/// Uploads a file to the CDN and returns its remote location.
///
/// Fails closed on incomplete credentials before reading the file or
/// opening a connection. The file is read fully into memory; the size cap
/// from the store layer bounds that.
pub async fn push_to_cdn_async(file_path: &Path, credentials: &CdnCredentials) -> Result<String> {
    if !credentials.is_complete() {
        return Err(ConvertError::InvalidCredentials);
    }

    let data = store::read_file_bytes(file_path)?;

    let client = build_client()?;
    let response = client
        .post(credentials.upload_url())
        .header("Authorization", format!("Bearer {}", credentials.api_key))
        .header("Content-Type", "application/octet-stream")
        .body(data)
        .send()
        .await
        .map_err(|e| ConvertError::TransportError(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ConvertError::RemoteError(status.as_u16()));
    }

    let location = response
        .json::<UploadResponse>()
        .await
        .ok()
        .and_then(|r| r.url)
        .unwrap_or_else(|| credentials.derived_location(file_path));

    Ok(location)
}

/// Purges one or more URLs from the CDN cache with a single batched request.
///
/// Every URL is parsed and normalized first; a malformed URL rejects the
/// whole call before anything is sent.
pub async fn purge_cache_async(urls: &[String], credentials: &CdnCredentials) -> Result<()> {
    if !credentials.is_complete() {
        return Err(ConvertError::InvalidCredentials);
    }

    let normalized: Vec<String> = urls
        .iter()
        .map(|u| {
            reqwest::Url::parse(u.trim())
                .map(|parsed| parsed.to_string())
                .map_err(|_| ConvertError::InvalidUrl(u.clone()))
        })
        .collect::<Result<_>>()?;

    let client = build_client()?;
    let response = client
        .post(credentials.purge_url())
        .header("Authorization", format!("Bearer {}", credentials.api_key))
        .json(&serde_json::json!({ "files": normalized }))
        .send()
        .await
        .map_err(|e| ConvertError::TransportError(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ConvertError::RemoteError(status.as_u16()));
    }

    Ok(())
}

pub fn push_to_cdn(file_path: &Path, credentials: &CdnCredentials) -> Result<String> {
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| ConvertError::TransportError(format!("Failed to create runtime: {}", e)))?;
    runtime.block_on(push_to_cdn_async(file_path, credentials))
}

pub fn purge_cache(urls: &[String], credentials: &CdnCredentials) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| ConvertError::TransportError(format!("Failed to create runtime: {}", e)))?;
    runtime.block_on(purge_cache_async(urls, credentials))
}
