//! Fixed provisioning policy.
//!
//! Centralized location for every hardcoded path, name and size the
//! installer relies on. `InstallOptions` defaults are built from these.

/// Host environment markers checked before anything else runs.
pub mod environment {
    /// Present only when booted from the Arch live ISO.
    pub const LIVE_MARKER: &str = "/run/archiso";

    /// Present only when the firmware booted us in UEFI mode.
    pub const EFI_DIR: &str = "/sys/firmware/efi";

    /// DMI product name of the machine.
    pub const PRODUCT_NAME_PATH: &str = "/sys/class/dmi/id/product_name";

    /// Substrings of the DMI product name accepted as a throwaway VM.
    pub const APPROVED_PLATFORMS: &[&str] = &["VirtualBox", "VMware"];
}

/// Remote build artifact store.
pub mod artifact {
    pub const API_URL: &str = "https://api.github.com";
    pub const REPO_OWNER: &str = "soroushalinia";
    pub const REPO_NAME: &str = "arch-custom-actions";

    /// Name of the workflow artifact carrying the root filesystem.
    pub const ARTIFACT_NAME: &str = "arch-installation";

    /// File name suffix of the tarball inside the artifact zip.
    pub const PAYLOAD_SUFFIX: &str = "arch-custom-rootfs.tar.zst";

    /// GitHub rejects API requests without a user agent.
    pub const USER_AGENT: &str = concat!("vmstrap/", env!("CARGO_PKG_VERSION"));

    pub const ACCEPT: &str = "application/vnd.github+json";
}

/// Target disk and mount points.
pub mod disk {
    pub const DEFAULT_DEVICE: &str = "/dev/sda";
    pub const MOUNT_ROOT: &str = "/mnt";

    /// ESP mount point relative to the mount root.
    pub const BOOT_DIR: &str = "boot";

    /// Partition boundaries as understood by `parted`.
    pub const EFI_START: &str = "1MiB";
    pub const EFI_END: &str = "2049MiB";
    pub const SWAP_END: &str = "10241MiB";
    pub const ROOT_END: &str = "100%";
}

/// First-boot configuration applied inside the new root.
pub mod system {
    pub const TIMEZONE: &str = "Asia/Tehran";
    pub const LOCALE: &str = "en_US.UTF-8";
    pub const ADMIN_GROUP: &str = "wheel";
    pub const SHELL: &str = "/bin/zsh";

    pub const LOADER_ENTRY: &str = "arch";
    pub const LOADER_TIMEOUT_SECS: u32 = 5;
    pub const ENTRY_TITLE: &str = "Arch Linux";

    /// Tool that enters the new root with /proc, /sys and /dev prepared.
    pub const CHROOT_PROGRAM: &str = "arch-chroot";

    /// Control script location, as seen from inside the new root.
    /// Must stay outside /tmp: arch-chroot mounts a fresh tmpfs there.
    pub const SCRIPT_PATH: &str = "/root/vmstrap-configure.sh";

    /// Directory arch-chroot replaces with an empty tmpfs.
    pub const CHROOT_TMPFS: &str = "/tmp";
}

/// Environment variables understood by the CLI.
pub mod envs {
    pub const DEVICE: &str = "VMSTRAP_DEVICE";
    pub const CONFIG: &str = "VMSTRAP_CONFIG";
    pub const API_URL: &str = "VMSTRAP_API_URL";
    pub const WORK_DIR: &str = "VMSTRAP_WORK_DIR";
}
