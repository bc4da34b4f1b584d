//! Stage 2: Artifact retrieval.
//!
//! Nothing on the host has been modified yet; any failure here leaves the
//! target disk untouched.

use crate::artifact::ArtifactQuery;
use crate::pipeline::types::{FetchInput, FetchOutput};
use vmstrap_shared::errors::{VmstrapError, VmstrapResult};

pub fn run(input: FetchInput<'_>) -> VmstrapResult<FetchOutput> {
    let query = ArtifactQuery {
        repo_owner: input.options.repo_owner.clone(),
        repo_name: input.options.repo_name.clone(),
        artifact_name: input.options.artifact_name.clone(),
        payload_suffix: input.options.payload_suffix.clone(),
        work_dir: input.work_dir.to_path_buf(),
    };

    let artifact = input.source.fetch_latest(&query)?;

    // `local_path` must exist and be non-empty before anything destructive runs.
    let size = std::fs::metadata(&artifact.local_path)
        .map(|m| m.len())
        .map_err(|e| {
            VmstrapError::Artifact(format!(
                "Payload {} is missing: {}",
                artifact.local_path.display(),
                e
            ))
        })?;
    if size == 0 {
        return Err(VmstrapError::Artifact(format!(
            "Payload {} is empty",
            artifact.local_path.display()
        )));
    }

    tracing::info!(path = %artifact.local_path.display(), bytes = size, "Payload ready");
    Ok(FetchOutput { artifact })
}
