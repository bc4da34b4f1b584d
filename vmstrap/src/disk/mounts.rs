use super::layout::Filesystem;
use std::path::{Path, PathBuf};

/// A formatted partition mounted at `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mount {
    pub device: PathBuf,
    pub target: PathBuf,
    pub filesystem: Filesystem,
}

/// Everything the populate and configure stages need from a provisioned disk.
///
/// When this value exists, root is mounted at `root.target`, the ESP at
/// `efi.target` inside it, and swap is active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountSet {
    pub root: Mount,
    pub efi: Mount,
    pub swap: PathBuf,
}

impl MountSet {
    /// Mount point of the new root filesystem.
    pub fn root_dir(&self) -> &Path {
        &self.root.target
    }
}
