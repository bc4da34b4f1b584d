//! In-process extraction of a zstd-compressed root filesystem tarball.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tar::Archive;
use vmstrap_shared::{VmstrapError, VmstrapResult};

/// Unpack `tarball` (tar + zstd) into `dest`.
///
/// Permissions, mtimes and xattrs are preserved. Ownership is preserved
/// only when running as root, like GNU tar's `--same-owner` default.
/// Entries that would land outside `dest` are refused by the tar crate.
pub fn unpack_tar_zst(tarball: &Path, dest: &Path) -> VmstrapResult<()> {
    let file = File::open(tarball).map_err(|e| {
        VmstrapError::Storage(format!(
            "Failed to open root filesystem tarball {}: {}",
            tarball.display(),
            e
        ))
    })?;

    let decoder = zstd::stream::read::Decoder::new(BufReader::new(file)).map_err(|e| {
        VmstrapError::Storage(format!(
            "Failed to initialise zstd decoder for {}: {}",
            tarball.display(),
            e
        ))
    })?;

    let mut archive = Archive::new(decoder);
    archive.set_preserve_permissions(true);
    archive.set_preserve_mtime(true);
    archive.set_unpack_xattrs(true);
    archive.set_preserve_ownerships(nix::unistd::geteuid().is_root());
    archive.set_overwrite(true);

    tracing::info!(
        tarball = %tarball.display(),
        dest = %dest.display(),
        "Extracting root filesystem"
    );

    archive.unpack(dest).map_err(|e| {
        VmstrapError::Storage(format!(
            "Failed to extract {} into {}: {}",
            tarball.display(),
            dest.display(),
            e
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn tar_zst(entries: &[(&str, &[u8], u32)]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for (path, content, mode) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_path(path).unwrap();
            header.set_size(content.len() as u64);
            header.set_mode(*mode);
            header.set_mtime(1_700_000_000);
            header.set_uid(0);
            header.set_gid(0);
            header.set_cksum();
            builder.append(&header, *content).unwrap();
        }
        let tar = builder.into_inner().unwrap();
        zstd::stream::encode_all(&tar[..], 3).unwrap()
    }

    #[test]
    fn test_unpack_preserves_layout_and_mode() {
        let dir = TempDir::new().unwrap();
        let tarball = dir.path().join("rootfs.tar.zst");
        std::fs::write(
            &tarball,
            tar_zst(&[
                ("etc/os-release", b"NAME=\"Arch Linux\"\n", 0o644),
                ("usr/bin/hello", b"#!/bin/sh\n", 0o755),
            ]),
        )
        .unwrap();

        let root = dir.path().join("mnt");
        std::fs::create_dir(&root).unwrap();
        unpack_tar_zst(&tarball, &root).unwrap();

        assert_eq!(
            std::fs::read_to_string(root.join("etc/os-release")).unwrap(),
            "NAME=\"Arch Linux\"\n"
        );
        let mode = std::fs::metadata(root.join("usr/bin/hello"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[test]
    fn test_not_zstd_is_storage_error() {
        let dir = TempDir::new().unwrap();
        let tarball = dir.path().join("rootfs.tar.zst");
        std::fs::write(&tarball, b"plain text, not zstd").unwrap();

        let err = unpack_tar_zst(&tarball, dir.path()).unwrap_err();
        assert!(matches!(err, VmstrapError::Storage(_)));
    }

    #[test]
    fn test_missing_tarball() {
        let dir = TempDir::new().unwrap();
        let err = unpack_tar_zst(&dir.path().join("absent.tar.zst"), dir.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to open"));
    }
}
