//! GitHub Actions artifact client.

use super::{
    ArtifactListing, ArtifactQuery, ArtifactRef, ArtifactSource, extract_payload, select_artifact,
    verify_digest,
};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use std::time::Duration;
use vmstrap_shared::constants::artifact as consts;
use vmstrap_shared::{VmstrapError, VmstrapResult};

/// Blocking client for the GitHub "list artifacts" and download endpoints.
///
/// No token is sent; the artifacts must be publicly downloadable. There is
/// no request timeout: the payload is a full root filesystem.
#[derive(Debug, Clone)]
pub struct GithubArtifactClient {
    client: Client,
    api_url: String,
}

impl GithubArtifactClient {
    pub fn new(api_url: impl Into<String>) -> VmstrapResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(consts::ACCEPT));

        let client = Client::builder()
            .user_agent(consts::USER_AGENT)
            .default_headers(headers)
            .timeout(None::<Duration>)
            .build()
            .map_err(|e| VmstrapError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn listing_url(&self, owner: &str, repo: &str) -> String {
        format!("{}/repos/{}/{}/actions/artifacts", self.api_url, owner, repo)
    }

    /// Fetch the artifact listing for a repository.
    fn list_artifacts(&self, owner: &str, repo: &str) -> VmstrapResult<ArtifactListing> {
        let url = self.listing_url(owner, repo);
        tracing::info!(url = %url, "Fetching artifact list");

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| VmstrapError::Network(format!("Failed to fetch artifact list: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(VmstrapError::Artifact(format!(
                "Failed to fetch artifact list from {}: HTTP {}",
                url, status
            )));
        }

        response
            .json::<ArtifactListing>()
            .map_err(|e| VmstrapError::Artifact(format!("Malformed artifact list: {}", e)))
    }

    /// Download an artifact archive into memory.
    fn download(&self, url: &str) -> VmstrapResult<Vec<u8>> {
        tracing::info!(url = %url, "Downloading artifact");

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| VmstrapError::Network(format!("Failed to download artifact: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(VmstrapError::Artifact(format!(
                "Failed to download artifact: HTTP {}",
                status
            )));
        }

        let bytes = response
            .bytes()
            .map_err(|e| VmstrapError::Network(format!("Failed to read artifact body: {}", e)))?;

        tracing::info!(bytes = bytes.len(), "Artifact downloaded");
        Ok(bytes.to_vec())
    }
}

impl ArtifactSource for GithubArtifactClient {
    fn fetch_latest(&self, query: &ArtifactQuery) -> VmstrapResult<ArtifactRef> {
        let listing = self.list_artifacts(&query.repo_owner, &query.repo_name)?;
        if listing.artifacts.is_empty() {
            return Err(VmstrapError::Artifact(format!(
                "No artifacts found in repository {}/{}",
                query.repo_owner, query.repo_name
            )));
        }

        let entry = select_artifact(&listing.artifacts, &query.artifact_name)?.clone();
        tracing::info!(
            id = ?entry.id,
            name = %entry.name,
            created_at = ?entry.created_at,
            "Selected artifact"
        );

        let download_url = entry
            .archive_download_url
            .clone()
            .filter(|url| !url.is_empty())
            .ok_or_else(|| {
                VmstrapError::Artifact(format!(
                    "Artifact '{}' has no download URL",
                    entry.name
                ))
            })?;

        let bytes = self.download(&download_url)?;
        verify_digest(&bytes, entry.digest.as_deref())?;

        let local_path = extract_payload(&bytes, &query.payload_suffix, &query.work_dir)?;
        tracing::info!(path = %local_path.display(), "Artifact extracted");

        Ok(ArtifactRef {
            entry,
            download_url,
            local_path,
        })
    }
}
