//! Destructive partitioning, formatting and mounting of the target disk.

use super::layout::{DiskLayout, Filesystem, PartitionRole, partition_path};
use super::mounts::{Mount, MountSet};
use crate::prompt::Prompter;
use crate::util::command::{CommandRunner, CommandSpec};
use std::path::Path;
use vmstrap_shared::constants::disk as consts;
use vmstrap_shared::{VmstrapError, VmstrapResult};

/// Wipes a block device and lays down [`DiskLayout::standard`].
///
/// Step order is load-bearing: wipe → partition → format → mount. Every
/// step but the initial unmount is fatal; nothing is retried or undone.
pub struct DiskProvisioner<'a> {
    runner: &'a dyn CommandRunner,
    prompter: &'a dyn Prompter,
    mount_root: &'a Path,
    layout: DiskLayout,
}

impl<'a> DiskProvisioner<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        prompter: &'a dyn Prompter,
        mount_root: &'a Path,
    ) -> Self {
        Self {
            runner,
            prompter,
            mount_root,
            layout: DiskLayout::standard(),
        }
    }

    pub fn layout(&self) -> &DiskLayout {
        &self.layout
    }

    /// Confirm with the operator, then wipe, partition, format and mount.
    ///
    /// # Errors
    ///
    /// `VmstrapError::Aborted` if the operator declines (nothing touched);
    /// `VmstrapError::Command` for the first tool that fails.
    pub fn provision(&self, device: &Path) -> VmstrapResult<MountSet> {
        self.prompter.confirm(&format!(
            "WARNING: This will wipe all data on {}.",
            device.display()
        ))?;

        tracing::warn!(device = %device.display(), "Wiping disk");

        self.unmount_existing(device);
        self.wipe(device)?;
        self.partition(device)?;

        let mounts = self.plan_mounts(device);
        self.format(device)?;
        self.mount(&mounts)?;

        tracing::info!(
            root = %mounts.root.device.display(),
            efi = %mounts.efi.device.display(),
            swap = %mounts.swap.display(),
            "Disk provisioned"
        );
        Ok(mounts)
    }

    /// Unmount whatever is mounted from the device. Failures are ignored:
    /// usually nothing is mounted at all.
    fn unmount_existing(&self, device: &Path) {
        let device_str = device.to_string_lossy().into_owned();
        let Some(listing) = self
            .runner
            .run_best_effort(&CommandSpec::new("lsblk").args(["-lnpo", "NAME", device_str.as_str()]))
        else {
            return;
        };

        for node in listing
            .stdout
            .lines()
            .map(str::trim)
            .filter(|n| !n.is_empty() && *n != device_str)
        {
            self.runner
                .run_best_effort(&CommandSpec::new("swapoff").arg(node));
            self.runner.run_best_effort(&CommandSpec::new("umount").arg(node));
        }
    }

    fn wipe(&self, device: &Path) -> VmstrapResult<()> {
        let device = device.to_string_lossy().into_owned();
        self.runner
            .run(&CommandSpec::new("sgdisk").args(["--zap-all", device.as_str()]))?;
        self.runner
            .run(&CommandSpec::new("wipefs").args(["-a", device.as_str()]))?;
        Ok(())
    }

    fn partition(&self, device: &Path) -> VmstrapResult<()> {
        let device = device.to_string_lossy().into_owned();
        let parted = || CommandSpec::new("parted").args(["--script", device.as_str()]);

        self.runner.run(&parted().args(["mklabel", "gpt"]))?;

        for spec in self.layout.partitions() {
            self.runner.run(&parted().args([
                "mkpart",
                "primary",
                spec.filesystem.parted_name(),
                spec.start,
                spec.end,
            ]))?;

            let number = spec.number.to_string();
            for flag in spec.flags {
                self.runner
                    .run(&parted().args(["set", number.as_str(), *flag, "on"]))?;
            }
        }
        Ok(())
    }

    fn format(&self, device: &Path) -> VmstrapResult<()> {
        for spec in self.layout.partitions() {
            let part = partition_path(device, spec.number)
                .to_string_lossy()
                .into_owned();
            let cmd = match spec.filesystem {
                Filesystem::Fat32 => CommandSpec::new("mkfs.fat").args(["-F32", part.as_str()]),
                Filesystem::Swap => CommandSpec::new("mkswap").arg(part),
                Filesystem::Ext4 => CommandSpec::new("mkfs.ext4").args(["-F", part.as_str()]),
            };
            self.runner.run(&cmd)?;
        }
        Ok(())
    }

    fn plan_mounts(&self, device: &Path) -> MountSet {
        let root = self.layout.by_role(PartitionRole::Root);
        let efi = self.layout.by_role(PartitionRole::Efi);
        let swap = self.layout.by_role(PartitionRole::Swap);

        MountSet {
            root: Mount {
                device: partition_path(device, root.number),
                target: self.mount_root.to_path_buf(),
                filesystem: root.filesystem,
            },
            efi: Mount {
                device: partition_path(device, efi.number),
                target: self.mount_root.join(consts::BOOT_DIR),
                filesystem: efi.filesystem,
            },
            swap: partition_path(device, swap.number),
        }
    }

    /// Root first, then the ESP inside it, then swap.
    fn mount(&self, mounts: &MountSet) -> VmstrapResult<()> {
        self.runner.run(&mount_command(&mounts.root))?;

        std::fs::create_dir_all(&mounts.efi.target).map_err(|e| {
            VmstrapError::Storage(format!(
                "Failed to create {}: {}",
                mounts.efi.target.display(),
                e
            ))
        })?;
        self.runner.run(&mount_command(&mounts.efi))?;

        self.runner
            .run(&CommandSpec::new("swapon").arg(mounts.swap.to_string_lossy()))?;
        Ok(())
    }
}

fn mount_command(mount: &Mount) -> CommandSpec {
    CommandSpec::new("mount").args([
        mount.device.to_string_lossy().into_owned(),
        mount.target.to_string_lossy().into_owned(),
    ])
}
