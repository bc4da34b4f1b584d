//! Verification and payload extraction for downloaded artifact zips.

use sha2::{Digest, Sha256};
use std::fs;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use vmstrap_shared::{VmstrapError, VmstrapResult};
use zip::ZipArchive;

const SHA256_PREFIX: &str = "sha256:";

/// Check downloaded bytes against a published digest.
///
/// `None` means the remote publishes no digest; that is accepted and
/// logged. Only `sha256:` digests are understood, others are skipped.
pub fn verify_digest(bytes: &[u8], digest: Option<&str>) -> VmstrapResult<()> {
    let Some(digest) = digest else {
        tracing::warn!("Artifact has no published digest; trusting transport only");
        return Ok(());
    };

    let Some(expected) = digest.strip_prefix(SHA256_PREFIX) else {
        tracing::warn!(digest = %digest, "Unsupported digest algorithm, skipping verification");
        return Ok(());
    };

    let actual = hex::encode(Sha256::digest(bytes));
    if !actual.eq_ignore_ascii_case(expected) {
        return Err(VmstrapError::Artifact(format!(
            "Artifact digest mismatch: expected {}{}, got {}{}",
            SHA256_PREFIX, expected, SHA256_PREFIX, actual
        )));
    }

    tracing::info!(digest = %digest, "Artifact digest verified");
    Ok(())
}

/// Extract the first zip entry whose name ends with `suffix` into `work_dir`.
///
/// Entries nested in subdirectories land at `work_dir/<basename>`. The file
/// is written to a temporary name first and renamed into place, so a failed
/// extraction never leaves a truncated payload behind.
///
/// # Errors
///
/// Fails when the bytes are not a zip, no entry matches, the entry path is
/// unsafe, or the extracted file is empty.
pub fn extract_payload(bytes: &[u8], suffix: &str, work_dir: &Path) -> VmstrapResult<PathBuf> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| VmstrapError::Artifact(format!("Artifact is not a valid zip archive: {}", e)))?;

    let index = find_entry(&mut archive, suffix)?.ok_or_else(|| {
        VmstrapError::Artifact(format!(
            "Tarball '{}' not found in artifact archive",
            suffix
        ))
    })?;

    let mut entry = archive
        .by_index(index)
        .map_err(|e| VmstrapError::Artifact(format!("Failed to read archive entry: {}", e)))?;

    let entry_name = entry.name().to_string();
    let file_name = entry
        .enclosed_name()
        .and_then(|p| p.file_name().map(|n| n.to_os_string()))
        .ok_or_else(|| {
            VmstrapError::Artifact(format!("Refusing unsafe archive entry path '{}'", entry_name))
        })?;

    fs::create_dir_all(work_dir).map_err(|e| {
        VmstrapError::Storage(format!(
            "Failed to create work directory {}: {}",
            work_dir.display(),
            e
        ))
    })?;

    let destination = work_dir.join(&file_name);
    tracing::info!(entry = %entry_name, destination = %destination.display(), "Extracting payload from artifact");

    let mut staged = NamedTempFile::new_in(work_dir).map_err(|e| {
        VmstrapError::Storage(format!(
            "Failed to create temporary file in {}: {}",
            work_dir.display(),
            e
        ))
    })?;

    let written = io::copy(&mut entry, staged.as_file_mut()).map_err(|e| {
        VmstrapError::Storage(format!("Failed to extract '{}': {}", entry_name, e))
    })?;

    if written == 0 {
        return Err(VmstrapError::Artifact(format!(
            "Payload '{}' in artifact archive is empty",
            entry_name
        )));
    }

    staged.persist(&destination).map_err(|e| {
        VmstrapError::Storage(format!(
            "Failed to move payload to {}: {}",
            destination.display(),
            e.error
        ))
    })?;

    Ok(destination)
}

/// Index of the first non-directory entry, in archive order, ending in `suffix`.
fn find_entry<R: io::Read + io::Seek>(
    archive: &mut ZipArchive<R>,
    suffix: &str,
) -> VmstrapResult<Option<usize>> {
    for index in 0..archive.len() {
        let entry = archive
            .by_index_raw(index)
            .map_err(|e| VmstrapError::Artifact(format!("Failed to read archive index: {}", e)))?;
        if !entry.is_dir() && entry.name().ends_with(suffix) {
            return Ok(Some(index));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::FileOptions;

    fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut cursor);
            for (name, contents) in entries {
                writer.start_file(*name, FileOptions::default()).unwrap();
                writer.write_all(contents).unwrap();
            }
            writer.finish().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_extract_top_level_payload() {
        let dir = TempDir::new().unwrap();
        let bytes = zip_bytes(&[("arch-custom-rootfs.tar.zst", b"rootfs")]);

        let path = extract_payload(&bytes, "arch-custom-rootfs.tar.zst", dir.path()).unwrap();
        assert_eq!(path, dir.path().join("arch-custom-rootfs.tar.zst"));
        assert_eq!(fs::read(&path).unwrap(), b"rootfs");
    }

    #[test]
    fn test_extract_nested_payload_flattens() {
        let dir = TempDir::new().unwrap();
        let bytes = zip_bytes(&[
            ("build/README.txt", b"docs"),
            ("build/out/arch-custom-rootfs.tar.zst", b"rootfs"),
        ]);

        let path = extract_payload(&bytes, "arch-custom-rootfs.tar.zst", dir.path()).unwrap();
        assert_eq!(path, dir.path().join("arch-custom-rootfs.tar.zst"));
        assert!(!dir.path().join("build").exists());
    }

    #[test]
    fn test_first_match_in_archive_order() {
        let dir = TempDir::new().unwrap();
        let bytes = zip_bytes(&[
            ("a/arch-custom-rootfs.tar.zst", b"first"),
            ("b/arch-custom-rootfs.tar.zst", b"second"),
        ]);

        let path = extract_payload(&bytes, "arch-custom-rootfs.tar.zst", dir.path()).unwrap();
        assert_eq!(fs::read(path).unwrap(), b"first");
    }

    #[test]
    fn test_missing_payload() {
        let dir = TempDir::new().unwrap();
        let bytes = zip_bytes(&[("rootfs.tar.gz", b"wrong")]);

        let err = extract_payload(&bytes, "arch-custom-rootfs.tar.zst", dir.path()).unwrap_err();
        assert!(err.to_string().contains("not found in artifact archive"));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_empty_payload_rejected() {
        let dir = TempDir::new().unwrap();
        let bytes = zip_bytes(&[("arch-custom-rootfs.tar.zst", b"")]);

        let err = extract_payload(&bytes, "arch-custom-rootfs.tar.zst", dir.path()).unwrap_err();
        assert!(err.to_string().contains("empty"));
        assert!(!dir.path().join("arch-custom-rootfs.tar.zst").exists());
    }

    #[test]
    fn test_not_a_zip() {
        let dir = TempDir::new().unwrap();
        let err = extract_payload(b"definitely not a zip", "x", dir.path()).unwrap_err();
        assert!(matches!(err, VmstrapError::Artifact(_)));
    }

    #[test]
    fn test_traversal_entry_rejected() {
        let dir = TempDir::new().unwrap();
        let bytes = zip_bytes(&[("../../arch-custom-rootfs.tar.zst", b"evil")]);

        let err = extract_payload(&bytes, "arch-custom-rootfs.tar.zst", dir.path()).unwrap_err();
        assert!(err.to_string().contains("unsafe"));
    }

    #[test]
    fn test_digest_match_and_mismatch() {
        let bytes = b"artifact bytes";
        let good = format!("sha256:{}", hex::encode(Sha256::digest(bytes)));
        verify_digest(bytes, Some(&good)).unwrap();
        verify_digest(bytes, Some(&good.to_uppercase().replace("SHA256:", "sha256:"))).unwrap();

        let err = verify_digest(bytes, Some("sha256:deadbeef")).unwrap_err();
        assert!(err.to_string().contains("digest mismatch"));
    }

    #[test]
    fn test_digest_absent_or_unknown_is_accepted() {
        verify_digest(b"x", None).unwrap();
        verify_digest(b"x", Some("md5:abc")).unwrap();
    }
}
