use std::fmt;
use std::time::Instant;

/// The pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    Validate,
    Fetch,
    Provision,
    Populate,
    Configure,
}

impl StageKind {
    pub const ALL: [StageKind; 5] = [
        StageKind::Validate,
        StageKind::Fetch,
        StageKind::Provision,
        StageKind::Populate,
        StageKind::Configure,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validate => "validate",
            Self::Fetch => "fetch",
            Self::Provision => "provision",
            Self::Populate => "populate",
            Self::Configure => "configure",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageMetrics {
    pub stage: StageKind,
    pub duration_ms: u128,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineMetrics {
    pub total_duration_ms: u128,
    pub stages: Vec<StageMetrics>,
}

impl PipelineMetrics {
    pub fn stage_duration_ms(&self, stage: StageKind) -> Option<u128> {
        self.stages
            .iter()
            .find(|m| m.stage == stage)
            .map(|m| m.duration_ms)
    }

    /// Stages that completed, in order.
    pub fn completed(&self) -> Vec<StageKind> {
        self.stages.iter().map(|m| m.stage).collect()
    }

    /// Run `f` as `stage`, recording its duration when it succeeds.
    pub(crate) fn record<T, E: fmt::Display>(
        &mut self,
        stage: StageKind,
        f: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, E> {
        tracing::info!(stage = %stage, "Stage started");
        let started = Instant::now();
        let result = f();
        let duration_ms = started.elapsed().as_millis();

        match &result {
            Ok(_) => {
                tracing::info!(stage = %stage, duration_ms, "Stage finished");
                self.stages.push(StageMetrics { stage, duration_ms });
            }
            Err(e) => tracing::error!(stage = %stage, duration_ms, error = %e, "Stage failed"),
        }
        result
    }

    pub(crate) fn log_summary(&self) {
        for stage in &self.stages {
            tracing::info!(stage = %stage.stage, duration_ms = stage.duration_ms, "Stage timing");
        }
        tracing::info!(total_duration_ms = self.total_duration_ms, "Pipeline finished");
    }
}
