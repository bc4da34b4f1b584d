//! Pre-flight environment validation.
//!
//! This module decides whether the host is a throwaway machine we are
//! allowed to wipe: running as root, booted from the Arch live ISO, in UEFI
//! mode, inside an approved hypervisor.
//!
//! These checks follow "Validate Early" - they run before any network or
//! disk I/O, read only, and evaluate every predicate so the operator sees
//! all problems at once.

use crate::options::EnvironmentOptions;
use std::fmt;
use std::io;
use std::path::Path;
use vmstrap_shared::{VmstrapError, VmstrapResult};

/// Read-only view of the host used by the validator.
pub trait HostProbe {
    /// Effective user id of the current process.
    fn effective_uid(&self) -> u32;

    fn path_exists(&self, path: &Path) -> bool;

    fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/// Probe backed by the real host.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProbe;

impl HostProbe for SystemProbe {
    fn effective_uid(&self) -> u32 {
        nix::unistd::geteuid().as_raw()
    }

    fn path_exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// One of the four safety predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SafetyPredicate {
    Root,
    LiveEnvironment,
    UefiBoot,
    ApprovedVirtualPlatform,
}

impl SafetyPredicate {
    /// Operator-facing explanation of a failed predicate.
    pub fn diagnostic(&self) -> &'static str {
        match self {
            Self::Root => "this installer must be run as root",
            Self::LiveEnvironment => "this does not appear to be a live Arch environment",
            Self::UefiBoot => "the system is not booted in UEFI mode",
            Self::ApprovedVirtualPlatform => {
                "the system does not appear to be running inside VMware or VirtualBox"
            }
        }
    }
}

impl fmt::Display for SafetyPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.diagnostic())
    }
}

/// Outcome of the environment checks.
///
/// Immutable once built. The pipeline refuses to start destructive work
/// unless [`SafetyCheckResult::all_passed`] holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafetyCheckResult {
    pub is_root: bool,
    pub is_live_environment: bool,
    pub is_uefi_boot: bool,
    pub is_approved_virtual_platform: bool,
    /// DMI product name as read (empty when unreadable).
    pub platform_name: String,
}

impl SafetyCheckResult {
    /// A result with every predicate satisfied.
    pub fn passing(platform_name: impl Into<String>) -> Self {
        Self {
            is_root: true,
            is_live_environment: true,
            is_uefi_boot: true,
            is_approved_virtual_platform: true,
            platform_name: platform_name.into(),
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failures().is_empty()
    }

    /// Predicates that do not hold, in check order.
    pub fn failures(&self) -> Vec<SafetyPredicate> {
        [
            (self.is_root, SafetyPredicate::Root),
            (self.is_live_environment, SafetyPredicate::LiveEnvironment),
            (self.is_uefi_boot, SafetyPredicate::UefiBoot),
            (
                self.is_approved_virtual_platform,
                SafetyPredicate::ApprovedVirtualPlatform,
            ),
        ]
        .into_iter()
        .filter(|(ok, _)| !ok)
        .map(|(_, predicate)| predicate)
        .collect()
    }

    /// Turn a failing result into a `Precondition` error.
    pub fn ensure(&self) -> VmstrapResult<()> {
        let failures = self.failures();
        if failures.is_empty() {
            return Ok(());
        }

        let reasons: Vec<&str> = failures.iter().map(|p| p.diagnostic()).collect();
        Err(VmstrapError::Precondition(reasons.join("; ")))
    }
}

/// Evaluates the safety predicates against a [`HostProbe`].
pub struct EnvironmentValidator<'a> {
    probe: &'a dyn HostProbe,
    options: &'a EnvironmentOptions,
}

impl<'a> EnvironmentValidator<'a> {
    pub fn new(probe: &'a dyn HostProbe, options: &'a EnvironmentOptions) -> Self {
        Self { probe, options }
    }

    /// Evaluate every predicate. Never fails, never short-circuits.
    pub fn check(&self) -> SafetyCheckResult {
        let platform_name = self
            .probe
            .read_to_string(&self.options.product_name_path)
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|e| {
                tracing::debug!(
                    path = %self.options.product_name_path.display(),
                    error = %e,
                    "Could not read product name"
                );
                String::new()
            });

        let is_approved_virtual_platform = self
            .options
            .approved_platforms
            .iter()
            .any(|vendor| platform_name.contains(vendor.as_str()));

        SafetyCheckResult {
            is_root: self.probe.effective_uid() == 0,
            is_live_environment: self.probe.path_exists(&self.options.live_marker),
            is_uefi_boot: self.probe.path_exists(&self.options.efi_dir),
            is_approved_virtual_platform,
            platform_name,
        }
    }

    /// Evaluate every predicate and fail unless all of them hold.
    ///
    /// # Errors
    ///
    /// Returns `VmstrapError::Precondition` listing each failed predicate.
    pub fn validate(&self) -> VmstrapResult<SafetyCheckResult> {
        let result = self.check();
        for failure in result.failures() {
            tracing::error!(check = ?failure, "{}", failure.diagnostic());
        }
        result.ensure()?;

        tracing::info!(platform = %result.platform_name, "Environment check passed");
        Ok(result)
    }
}
