//! Type definitions for the install pipeline.

use super::metrics::PipelineMetrics;
use crate::artifact::{ArtifactRef, ArtifactSource};
use crate::disk::MountSet;
use crate::host_check::{HostProbe, SafetyCheckResult};
use crate::options::{ArtifactOptions, EnvironmentOptions, InstallOptions, SystemSettings};
use crate::prompt::Prompter;
use crate::rootfs::FstabEntry;
use crate::util::command::CommandRunner;
use std::path::Path;

/// Everything a run talks to, bundled once.
#[derive(Clone, Copy)]
pub struct InstallContext<'a> {
    pub probe: &'a dyn HostProbe,
    pub source: &'a dyn ArtifactSource,
    pub runner: &'a dyn CommandRunner,
    pub prompter: &'a dyn Prompter,
    pub options: &'a InstallOptions,
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct InstallReport {
    pub safety: SafetyCheckResult,
    pub artifact: ArtifactRef,
    pub mounts: MountSet,
    pub fstab: Vec<FstabEntry>,
    pub hostname: String,
    pub username: String,
    pub metrics: PipelineMetrics,
}

// ============================================================================
// Stage inputs / outputs
// ============================================================================

pub struct ValidateInput<'a> {
    pub probe: &'a dyn HostProbe,
    pub options: &'a EnvironmentOptions,
}

pub struct ValidateOutput {
    pub safety: SafetyCheckResult,
}

pub struct FetchInput<'a> {
    pub source: &'a dyn ArtifactSource,
    pub options: &'a ArtifactOptions,
    pub work_dir: &'a Path,
}

pub struct FetchOutput {
    pub artifact: ArtifactRef,
}

pub struct ProvisionInput<'a> {
    pub runner: &'a dyn CommandRunner,
    pub prompter: &'a dyn Prompter,
    pub device: &'a Path,
    pub mount_root: &'a Path,
}

pub struct ProvisionOutput {
    pub mounts: MountSet,
}

pub struct PopulateInput<'a> {
    pub runner: &'a dyn CommandRunner,
    pub artifact: &'a ArtifactRef,
    pub mounts: &'a MountSet,
}

pub struct PopulateOutput {
    pub fstab: Vec<FstabEntry>,
}

pub struct ConfigureInput<'a> {
    pub runner: &'a dyn CommandRunner,
    pub prompter: &'a dyn Prompter,
    pub settings: &'a SystemSettings,
    pub mounts: &'a MountSet,
}

/// Only the non-secret half of the identity leaves the stage.
pub struct ConfigureOutput {
    pub hostname: String,
    pub username: String,
}
