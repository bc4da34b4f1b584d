//! Target disk preparation.
//!
//! ```text
//! /dev/sdX
//! ├── 1  1MiB     .. 2049MiB   fat32  esp   → <root>/boot
//! ├── 2  2049MiB  .. 10241MiB  swap         → swapon
//! └── 3  10241MiB .. 100%      ext4         → <root>
//! ```

pub mod layout;
mod mounts;
mod provisioner;

pub use layout::{DiskLayout, Filesystem, PartitionRole, PartitionSpec, partition_path};
pub use mounts::{Mount, MountSet};
pub use provisioner::DiskProvisioner;
