//! Configuration for an install run.
//!
//! Every field defaults to the fixed provisioning policy in
//! [`vmstrap_shared::constants`], so running without any configuration is
//! the normal case. A JSON file can override individual fields.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use vmstrap_shared::constants::{artifact, disk, environment, system};
use vmstrap_shared::{VmstrapError, VmstrapResult};

// ============================================================================
// Install Options
// ============================================================================

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct InstallOptions {
    /// Block device that is wiped and repartitioned.
    pub device: PathBuf,

    /// Where the new root filesystem is mounted.
    pub mount_root: PathBuf,

    /// Directory the downloaded payload is extracted into.
    pub work_dir: PathBuf,

    pub environment: EnvironmentOptions,
    pub artifact: ArtifactOptions,
    pub system: SystemSettings,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            device: PathBuf::from(disk::DEFAULT_DEVICE),
            mount_root: PathBuf::from(disk::MOUNT_ROOT),
            work_dir: PathBuf::from("."),
            environment: EnvironmentOptions::default(),
            artifact: ArtifactOptions::default(),
            system: SystemSettings::default(),
        }
    }
}

impl InstallOptions {
    /// Load options from a JSON file; missing fields keep their defaults.
    pub fn load(path: &Path) -> VmstrapResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            VmstrapError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let options: Self = serde_json::from_str(&content).map_err(|e| {
            VmstrapError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        options.validate()?;
        Ok(options)
    }

    /// Reject option combinations that cannot describe a valid run.
    pub fn validate(&self) -> VmstrapResult<()> {
        if self.device.as_os_str().is_empty() {
            return Err(VmstrapError::Config("device must not be empty".into()));
        }
        if !self.mount_root.is_absolute() {
            return Err(VmstrapError::Config(format!(
                "mount_root must be an absolute path, got {}",
                self.mount_root.display()
            )));
        }
        if !self.system.script_path.is_absolute() {
            return Err(VmstrapError::Config(format!(
                "system.script_path must be an absolute path inside the new root, got {}",
                self.system.script_path.display()
            )));
        }
        if self.system.script_path.starts_with(system::CHROOT_TMPFS) {
            return Err(VmstrapError::Config(format!(
                "system.script_path must not be under {}, arch-chroot mounts a fresh tmpfs there; got {}",
                system::CHROOT_TMPFS,
                self.system.script_path.display()
            )));
        }
        if self.environment.approved_platforms.is_empty() {
            return Err(VmstrapError::Config(
                "environment.approved_platforms must list at least one platform".into(),
            ));
        }
        if self.artifact.payload_suffix.is_empty() {
            return Err(VmstrapError::Config(
                "artifact.payload_suffix must not be empty".into(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Environment Options
// ============================================================================

/// Host markers consulted by the environment validator.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct EnvironmentOptions {
    pub live_marker: PathBuf,
    pub efi_dir: PathBuf,
    pub product_name_path: PathBuf,
    pub approved_platforms: Vec<String>,
}

impl Default for EnvironmentOptions {
    fn default() -> Self {
        Self {
            live_marker: PathBuf::from(environment::LIVE_MARKER),
            efi_dir: PathBuf::from(environment::EFI_DIR),
            product_name_path: PathBuf::from(environment::PRODUCT_NAME_PATH),
            approved_platforms: environment::APPROVED_PLATFORMS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

// ============================================================================
// Artifact Options
// ============================================================================

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ArtifactOptions {
    /// Base URL of the GitHub REST API.
    pub api_url: String,
    pub repo_owner: String,
    pub repo_name: String,
    pub artifact_name: String,
    pub payload_suffix: String,
}

impl Default for ArtifactOptions {
    fn default() -> Self {
        Self {
            api_url: artifact::API_URL.to_string(),
            repo_owner: artifact::REPO_OWNER.to_string(),
            repo_name: artifact::REPO_NAME.to_string(),
            artifact_name: artifact::ARTIFACT_NAME.to_string(),
            payload_suffix: artifact::PAYLOAD_SUFFIX.to_string(),
        }
    }
}

// ============================================================================
// System Settings
// ============================================================================

/// First-boot settings baked into the control script.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct SystemSettings {
    /// Zoneinfo name, e.g. `Asia/Tehran`.
    pub timezone: String,

    /// UTF-8 locale enabled in locale.gen, e.g. `en_US.UTF-8`.
    pub locale: String,

    /// Supplementary group of the primary user, granted sudo.
    pub admin_group: String,

    /// Login shell of the primary user.
    pub shell: String,

    pub loader_entry: String,
    pub loader_timeout: u32,
    pub entry_title: String,

    pub chroot_program: String,

    /// Control script location as seen from inside the new root.
    pub script_path: PathBuf,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            timezone: system::TIMEZONE.to_string(),
            locale: system::LOCALE.to_string(),
            admin_group: system::ADMIN_GROUP.to_string(),
            shell: system::SHELL.to_string(),
            loader_entry: system::LOADER_ENTRY.to_string(),
            loader_timeout: system::LOADER_TIMEOUT_SECS,
            entry_title: system::ENTRY_TITLE.to_string(),
            chroot_program: system::CHROOT_PROGRAM.to_string(),
            script_path: PathBuf::from(system::SCRIPT_PATH),
        }
    }
}
