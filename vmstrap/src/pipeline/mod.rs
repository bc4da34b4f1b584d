//! Install orchestration.
//!
//! ## Architecture
//!
//! ```text
//! 1. Validate ──→ 2. Fetch ──→ 3. Provision ──→ 4. Populate ──→ 5. Configure
//!    (gate)          (read-only)   (destructive)
//! ```
//!
//! Strictly sequential. The first failing stage aborts the run and nothing
//! is undone: a failure after Provision leaves a partially installed disk.

mod metrics;
mod stages;
mod types;

pub use metrics::{PipelineMetrics, StageKind, StageMetrics};
pub use types::{InstallContext, InstallReport};

use crate::host_check::SafetyCheckResult;
use stages::{configure, fetch, populate, provision, validate};
use std::time::Instant;
use types::{ConfigureInput, FetchInput, PopulateInput, ProvisionInput, ValidateInput};
use vmstrap_shared::errors::{VmstrapError, VmstrapResult};

/// Runs the install stages against an [`InstallContext`].
///
/// # Example
///
/// ```ignore
/// let ctx = InstallContext { probe: &probe, source: &client, runner: &runner, prompter: &prompter, options: &options };
/// let report = InstallPipeline::new(ctx).run()?;
/// ```
pub struct InstallPipeline<'a> {
    ctx: InstallContext<'a>,
}

impl<'a> InstallPipeline<'a> {
    pub fn new(ctx: InstallContext<'a>) -> Self {
        Self { ctx }
    }

    /// Validate the environment, then run every remaining stage.
    pub fn run(&self) -> VmstrapResult<InstallReport> {
        let started = Instant::now();
        let mut metrics = PipelineMetrics::default();

        let validated = metrics.record(StageKind::Validate, || {
            validate::run(ValidateInput {
                probe: self.ctx.probe,
                options: &self.ctx.options.environment,
            })
        })?;

        self.execute(validated.safety, metrics, started)
    }

    /// Run every stage after validation with an existing check result.
    ///
    /// # Errors
    ///
    /// `VmstrapError::Precondition` if `safety` has any failed predicate;
    /// no stage runs in that case.
    pub fn run_validated(&self, safety: SafetyCheckResult) -> VmstrapResult<InstallReport> {
        self.execute(safety, PipelineMetrics::default(), Instant::now())
    }

    fn execute(
        &self,
        safety: SafetyCheckResult,
        mut metrics: PipelineMetrics,
        started: Instant,
    ) -> VmstrapResult<InstallReport> {
        if !safety.all_passed() {
            tracing::error!(failures = ?safety.failures(), "Refusing to run destructive stages");
            safety.ensure()?;
            return Err(VmstrapError::Internal(
                "safety check failed without a reported predicate".into(),
            ));
        }

        let options = self.ctx.options;

        let fetched = metrics.record(StageKind::Fetch, || {
            fetch::run(FetchInput {
                source: self.ctx.source,
                options: &options.artifact,
                work_dir: &options.work_dir,
            })
        })?;

        let provisioned = metrics.record(StageKind::Provision, || {
            provision::run(ProvisionInput {
                runner: self.ctx.runner,
                prompter: self.ctx.prompter,
                device: &options.device,
                mount_root: &options.mount_root,
            })
        })?;

        let populated = metrics.record(StageKind::Populate, || {
            populate::run(PopulateInput {
                runner: self.ctx.runner,
                artifact: &fetched.artifact,
                mounts: &provisioned.mounts,
            })
        })?;

        let configured = metrics.record(StageKind::Configure, || {
            configure::run(ConfigureInput {
                runner: self.ctx.runner,
                prompter: self.ctx.prompter,
                settings: &options.system,
                mounts: &provisioned.mounts,
            })
        })?;

        metrics.total_duration_ms = started.elapsed().as_millis();
        metrics.log_summary();

        Ok(InstallReport {
            safety,
            artifact: fetched.artifact,
            mounts: provisioned.mounts,
            fstab: populated.fstab,
            hostname: configured.hostname,
            username: configured.username,
            metrics,
        })
    }
}
