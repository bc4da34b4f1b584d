//! vmstrap - staged, safety-gated provisioning of a throwaway Arch Linux VM.
//!
//! ## Architecture
//!
//! ```text
//! Validate ──→ Fetch ──→ Provision ──→ Populate ──→ Configure
//!  (host)    (artifact)   (disk)       (rootfs)    (chroot)
//! ```
//!
//! Every stage is sequential and blocking. The first failure aborts the run;
//! nothing is rolled back. Destructive stages only run after the validator
//! produced a [`SafetyCheckResult`] with every predicate satisfied.
//!
//! External effects go through three seams so the pipeline can be driven by
//! test doubles:
//! - [`HostProbe`] - read-only host inspection
//! - [`CommandRunner`] - external tools (disk, mount, chroot)
//! - [`Prompter`] - operator confirmation and identity input

pub mod artifact;
pub mod configure;
pub mod disk;
pub mod host_check;
pub mod options;
pub mod pipeline;
pub mod prompt;
pub mod rootfs;
pub mod util;

pub use artifact::{ArtifactEntry, ArtifactQuery, ArtifactRef, ArtifactSource, GithubArtifactClient};
pub use configure::{ChrootBoundary, Configurator, ControlScript, IdentityConfig, Secret};
pub use disk::{DiskLayout, DiskProvisioner, Mount, MountSet, PartitionRole, PartitionSpec};
pub use host_check::{EnvironmentValidator, HostProbe, SafetyCheckResult, SafetyPredicate, SystemProbe};
pub use options::{ArtifactOptions, EnvironmentOptions, InstallOptions, SystemSettings};
pub use pipeline::{InstallContext, InstallPipeline, InstallReport, PipelineMetrics, StageKind};
pub use prompt::Prompter;
pub use rootfs::{FstabEntry, RootPopulator};
pub use util::command::{CommandOutput, CommandRunner, CommandSpec, SystemRunner};

pub use vmstrap_shared::{VmstrapError, VmstrapResult};
