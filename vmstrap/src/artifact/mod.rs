//! Root filesystem artifact retrieval.
//!
//! The root filesystem tarball is published as a GitHub Actions workflow
//! artifact. Retrieval is a two-stage lookup:
//!
//! ```text
//! list artifacts ─→ select by name ─→ download zip ─→ verify ─→ extract payload
//! ```
//!
//! [`ArtifactSource`] is the seam the pipeline depends on;
//! [`GithubArtifactClient`] is the real implementation.

mod archive;
mod client;

pub use archive::{extract_payload, verify_digest};
pub use client::GithubArtifactClient;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use vmstrap_shared::{VmstrapError, VmstrapResult};

/// One entry of the remote artifact listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactEntry {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub archive_download_url: Option<String>,
    #[serde(default)]
    pub size_in_bytes: Option<u64>,
    /// Expired artifacts are still listed but can no longer be downloaded.
    #[serde(default)]
    pub expired: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Content digest of the zip, e.g. `sha256:<hex>`, when published.
    #[serde(default)]
    pub digest: Option<String>,
}

/// Response body of the "list artifacts for a repository" endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArtifactListing {
    #[serde(default)]
    pub total_count: Option<u64>,
    #[serde(default)]
    pub artifacts: Vec<ArtifactEntry>,
}

/// What to fetch and where to put it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactQuery {
    pub repo_owner: String,
    pub repo_name: String,
    pub artifact_name: String,
    pub payload_suffix: String,
    pub work_dir: PathBuf,
}

/// A downloaded, verified payload ready for extraction.
///
/// `local_path` exists and is non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    pub entry: ArtifactEntry,
    pub download_url: String,
    pub local_path: PathBuf,
}

/// Produces the root filesystem payload on local disk.
pub trait ArtifactSource {
    fn fetch_latest(&self, query: &ArtifactQuery) -> VmstrapResult<ArtifactRef>;
}

/// Pick the artifact to install from a listing.
///
/// Among non-expired entries named `name`, the newest by `created_at` wins.
/// Ties, and entries without a timestamp, keep listing order: the first
/// one seen is preferred.
pub fn select_artifact<'a>(
    entries: &'a [ArtifactEntry],
    name: &str,
) -> VmstrapResult<&'a ArtifactEntry> {
    let mut best: Option<&ArtifactEntry> = None;
    let mut saw_expired = false;

    for entry in entries.iter().filter(|e| e.name == name) {
        if entry.expired {
            saw_expired = true;
            continue;
        }
        match best {
            Some(current) if entry.created_at <= current.created_at => {}
            _ => best = Some(entry),
        }
    }

    best.ok_or_else(|| {
        if saw_expired {
            VmstrapError::Artifact(format!(
                "Artifact '{}' exists but every copy has expired",
                name
            ))
        } else {
            VmstrapError::Artifact(format!("Desired artifact '{}' not found", name))
        }
    })
}
