//! The one supported partition layout.

use std::fmt;
use std::path::{Path, PathBuf};
use vmstrap_shared::constants::disk as consts;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartitionRole {
    Efi,
    Swap,
    Root,
}

impl fmt::Display for PartitionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Efi => "efi",
            Self::Swap => "swap",
            Self::Root => "root",
        })
    }
}

/// Filesystem laid down on a partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filesystem {
    Fat32,
    Swap,
    Ext4,
}

impl Filesystem {
    /// Type name understood by `parted mkpart`.
    pub fn parted_name(&self) -> &'static str {
        match self {
            Self::Fat32 => "fat32",
            Self::Swap => "linux-swap",
            Self::Ext4 => "ext4",
        }
    }

    /// Type name used by `mount` and fstab.
    pub fn mount_type(&self) -> &'static str {
        match self {
            Self::Fat32 => "vfat",
            Self::Swap => "swap",
            Self::Ext4 => "ext4",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionSpec {
    /// 1-based partition number.
    pub number: u32,
    pub role: PartitionRole,
    /// Start boundary as given to parted, e.g. `1MiB`.
    pub start: &'static str,
    /// End boundary as given to parted, e.g. `100%`.
    pub end: &'static str,
    pub filesystem: Filesystem,
    /// Flags switched on with `parted set`.
    pub flags: &'static [&'static str],
}

/// Fixed GPT layout: ESP, swap, root.
///
/// The layout does not depend on the device size. A device too small for
/// it is rejected by parted, not truncated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskLayout {
    partitions: [PartitionSpec; 3],
}

impl DiskLayout {
    pub fn standard() -> Self {
        Self {
            partitions: [
                PartitionSpec {
                    number: 1,
                    role: PartitionRole::Efi,
                    start: consts::EFI_START,
                    end: consts::EFI_END,
                    filesystem: Filesystem::Fat32,
                    flags: &["esp"],
                },
                PartitionSpec {
                    number: 2,
                    role: PartitionRole::Swap,
                    start: consts::EFI_END,
                    end: consts::SWAP_END,
                    filesystem: Filesystem::Swap,
                    flags: &[],
                },
                PartitionSpec {
                    number: 3,
                    role: PartitionRole::Root,
                    start: consts::SWAP_END,
                    end: consts::ROOT_END,
                    filesystem: Filesystem::Ext4,
                    flags: &[],
                },
            ],
        }
    }

    pub fn partitions(&self) -> &[PartitionSpec] {
        &self.partitions
    }

    pub fn by_role(&self, role: PartitionRole) -> &PartitionSpec {
        match role {
            PartitionRole::Efi => &self.partitions[0],
            PartitionRole::Swap => &self.partitions[1],
            PartitionRole::Root => &self.partitions[2],
        }
    }
}

impl Default for DiskLayout {
    fn default() -> Self {
        Self::standard()
    }
}

/// Device node of partition `number` on `device`.
///
/// Disks whose name ends in a digit (`nvme0n1`, `mmcblk0`, `loop0`) use a
/// `p` separator; others (`sda`, `vda`) append the number directly.
pub fn partition_path(device: &Path, number: u32) -> PathBuf {
    let base = device.to_string_lossy();
    let separator = if base.ends_with(|c: char| c.is_ascii_digit()) {
        "p"
    } else {
        ""
    };
    PathBuf::from(format!("{}{}{}", base, separator, number))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_layout_has_three_partitions_in_role_order() {
        let layout = DiskLayout::standard();
        let roles: Vec<_> = layout.partitions().iter().map(|p| p.role).collect();
        assert_eq!(
            roles,
            vec![PartitionRole::Efi, PartitionRole::Swap, PartitionRole::Root]
        );
        let numbers: Vec<_> = layout.partitions().iter().map(|p| p.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn test_layout_boundaries() {
        let layout = DiskLayout::standard();
        let bounds: Vec<_> = layout
            .partitions()
            .iter()
            .map(|p| (p.start, p.end))
            .collect();
        assert_eq!(
            bounds,
            vec![
                ("1MiB", "2049MiB"),
                ("2049MiB", "10241MiB"),
                ("10241MiB", "100%")
            ]
        );
    }

    #[test]
    fn test_partitions_are_contiguous() {
        let layout = DiskLayout::standard();
        for pair in layout.partitions().windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }

    #[test]
    fn test_only_efi_has_esp_flag() {
        let layout = DiskLayout::standard();
        assert_eq!(layout.by_role(PartitionRole::Efi).flags, &["esp"]);
        assert!(layout.by_role(PartitionRole::Swap).flags.is_empty());
        assert!(layout.by_role(PartitionRole::Root).flags.is_empty());
        assert_eq!(layout.by_role(PartitionRole::Root).filesystem, Filesystem::Ext4);
    }

    #[test]
    fn test_partition_path_naming() {
        assert_eq!(partition_path(Path::new("/dev/sda"), 1), PathBuf::from("/dev/sda1"));
        assert_eq!(partition_path(Path::new("/dev/vdb"), 3), PathBuf::from("/dev/vdb3"));
        assert_eq!(
            partition_path(Path::new("/dev/nvme0n1"), 2),
            PathBuf::from("/dev/nvme0n1p2")
        );
        assert_eq!(
            partition_path(Path::new("/dev/mmcblk0"), 1),
            PathBuf::from("/dev/mmcblk0p1")
        );
    }

    proptest! {
        #[test]
        fn prop_partition_path_extends_device(name in "[a-z]{2,6}[0-9]{0,2}", number in 1u32..4) {
            let device = PathBuf::from(format!("/dev/{name}"));
            let part = partition_path(&device, number);
            let part = part.to_string_lossy();
            prop_assert!(part.starts_with(device.to_string_lossy().as_ref()));
            prop_assert!(part.ends_with(&number.to_string()));
        }
    }
}
