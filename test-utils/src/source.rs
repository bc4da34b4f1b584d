use std::sync::atomic::{AtomicUsize, Ordering};
use vmstrap::{ArtifactEntry, ArtifactQuery, ArtifactRef, ArtifactSource, VmstrapError, VmstrapResult};

/// An [`ArtifactSource`] that writes a fixed payload, or always fails.
pub struct StaticArtifactSource {
    payload: Result<Vec<u8>, String>,
    calls: AtomicUsize,
}

impl StaticArtifactSource {
    /// Writes `payload` to `<work_dir>/<payload_suffix>`.
    pub fn new(payload: Vec<u8>) -> Self {
        Self {
            payload: Ok(payload),
            calls: AtomicUsize::new(0),
        }
    }

    /// Fails every fetch with an `Artifact` error carrying `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            payload: Err(message.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ArtifactSource for StaticArtifactSource {
    fn fetch_latest(&self, query: &ArtifactQuery) -> VmstrapResult<ArtifactRef> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let payload = self
            .payload
            .as_ref()
            .map_err(|message| VmstrapError::Artifact(message.clone()))?;

        std::fs::create_dir_all(&query.work_dir)
            .map_err(|e| VmstrapError::Storage(e.to_string()))?;
        let local_path = query.work_dir.join(&query.payload_suffix);
        std::fs::write(&local_path, payload).map_err(|e| VmstrapError::Storage(e.to_string()))?;

        Ok(ArtifactRef {
            entry: ArtifactEntry {
                id: Some(1),
                name: query.artifact_name.clone(),
                archive_download_url: Some("https://example.invalid/zip".to_string()),
                size_in_bytes: Some(payload.len() as u64),
                expired: false,
                created_at: None,
                digest: None,
            },
            download_url: "https://example.invalid/zip".to_string(),
            local_path,
        })
    }
}
