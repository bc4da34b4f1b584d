//! Populate the mounted root: unpack the payload, then write fstab.

mod extract;
mod fstab;

pub use extract::unpack_tar_zst;
pub use fstab::{FstabEntry, append_fstab, generate_entries, parse_fstab, render_block};

use crate::disk::MountSet;
use crate::util::command::{CommandRunner, CommandSpec};
use std::path::Path;
use vmstrap_shared::{VmstrapError, VmstrapResult};

pub struct RootPopulator<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> RootPopulator<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    /// Unpack `artifact_path` into the mounted root and append its fstab.
    ///
    /// Returns the entries that were appended.
    pub fn populate(&self, artifact_path: &Path, mounts: &MountSet) -> VmstrapResult<Vec<FstabEntry>> {
        let root = mounts.root_dir();
        unpack_tar_zst(artifact_path, root)?;

        let entries = generate_entries(mounts, |device| self.filesystem_uuid(device))?;
        let path = append_fstab(root, &render_block(&entries))?;

        tracing::info!(path = %path.display(), entries = entries.len(), "fstab written");
        Ok(entries.into_iter().map(|(_, entry)| entry).collect())
    }

    /// Filesystem UUID of a formatted partition, via `blkid`.
    fn filesystem_uuid(&self, device: &Path) -> VmstrapResult<String> {
        let output = self.runner.run(
            &CommandSpec::new("blkid")
                .args(["-s", "UUID", "-o", "value"])
                .arg(device.to_string_lossy()),
        )?;

        let uuid = output.stdout.trim();
        if uuid.is_empty() {
            return Err(VmstrapError::Storage(format!(
                "No filesystem UUID reported for {}",
                device.display()
            )));
        }
        Ok(uuid.to_string())
    }
}

