use parking_lot::Mutex;
use std::path::Path;
use vmstrap::{CommandOutput, CommandRunner, CommandSpec, VmstrapResult};

type Rule = Box<dyn Fn(&CommandSpec) -> Option<VmstrapResult<CommandOutput>> + Send + Sync>;

/// A [`CommandRunner`] that records every call and runs nothing.
///
/// Unmatched commands succeed with empty output. Rules are checked in the
/// order they were added; the first one that answers wins.
#[derive(Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<CommandSpec>>,
    rules: Vec<Rule>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer matching commands with `f`.
    pub fn rule<F>(mut self, f: F) -> Self
    where
        F: Fn(&CommandSpec) -> Option<VmstrapResult<CommandOutput>> + Send + Sync + 'static,
    {
        self.rules.push(Box::new(f));
        self
    }

    /// Fail `program` with exit code 1 when its arguments contain `arg`.
    pub fn fail_on(self, program: &'static str, arg: &'static str) -> Self {
        self.rule(move |spec| {
            (spec.program() == program && spec.get_args().iter().any(|a| a == arg))
                .then(|| Ok(CommandOutput::failed(1, format!("{program}: simulated failure"))))
        })
    }

    /// Answer every call to `program` with `stdout`.
    pub fn stdout_for(self, program: &'static str, stdout: &'static str) -> Self {
        self.rule(move |spec| (spec.program() == program).then(|| Ok(CommandOutput::ok(stdout))))
    }

    /// `blkid` answers `uuid-<device basename>` for every device.
    pub fn fake_blkid(self) -> Self {
        self.rule(|spec| {
            if spec.program() != "blkid" {
                return None;
            }
            let device = spec.get_args().last()?;
            let name = Path::new(device).file_name()?.to_string_lossy().into_owned();
            Some(Ok(CommandOutput::ok(format!("uuid-{name}\n"))))
        })
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().clone()
    }

    /// Every call rendered as a command line.
    pub fn command_lines(&self) -> Vec<String> {
        self.calls.lock().iter().map(ToString::to_string).collect()
    }

    pub fn programs(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .map(|c| c.program().to_string())
            .collect()
    }

    pub fn count(&self, program: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.program() == program)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.lock().is_empty()
    }
}

impl CommandRunner for RecordingRunner {
    fn output(&self, spec: &CommandSpec) -> VmstrapResult<CommandOutput> {
        self.calls.lock().push(spec.clone());
        self.rules
            .iter()
            .find_map(|rule| rule(spec))
            .unwrap_or_else(|| Ok(CommandOutput::ok("")))
    }
}
