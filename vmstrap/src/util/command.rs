//! External tool execution.
//!
//! Every disk, mount and chroot operation is a blocking call to an external
//! program. [`CommandSpec`] describes the call, [`CommandRunner`] executes it.
//! The runner is the seam tests replace with a recording fake.

use std::fmt;
use std::process::{Command, Stdio};

use vmstrap_shared::{VmstrapError, VmstrapResult};

/// Builder for one external program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
    inherit_output: bool,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            inherit_output: false,
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Stream stdout/stderr to the operator's terminal instead of capturing.
    ///
    /// Used for long-running steps whose progress the operator should see.
    pub fn inherit_output(mut self) -> Self {
        self.inherit_output = true;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    pub fn inherits_output(&self) -> bool {
        self.inherit_output
    }

    /// Build the `std::process::Command` for this spec.
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd.stdin(Stdio::null());
        if self.inherit_output {
            cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        } else {
            cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        }
        cmd
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Outcome of a finished external program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// A successful run with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed run with the given exit code and stderr.
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    fn status_display(&self) -> String {
        match self.code {
            Some(code) => format!("exit status: {code}"),
            None => "termination by signal".to_string(),
        }
    }
}

/// Executes external programs.
///
/// Implementors only provide [`CommandRunner::output`]; the strict and
/// best-effort flavours are derived from it.
pub trait CommandRunner {
    /// Run the command to completion and report how it ended.
    ///
    /// Errors only when the program could not be started.
    fn output(&self, spec: &CommandSpec) -> VmstrapResult<CommandOutput>;

    /// Run the command; a non-zero exit is an error.
    fn run(&self, spec: &CommandSpec) -> VmstrapResult<CommandOutput> {
        tracing::info!(program = %spec.program(), args = ?spec.get_args(), "Running");
        let output = self.output(spec)?;
        if !output.success() {
            return Err(VmstrapError::command(
                spec.program(),
                spec.get_args(),
                output.status_display(),
                output.stderr.clone(),
            ));
        }
        Ok(output)
    }

    /// Run the command and ignore any failure, including failure to spawn.
    fn run_best_effort(&self, spec: &CommandSpec) -> Option<CommandOutput> {
        tracing::info!(program = %spec.program(), args = ?spec.get_args(), "Running (best effort)");
        match self.output(spec) {
            Ok(output) if output.success() => Some(output),
            Ok(output) => {
                tracing::debug!(
                    command = %spec,
                    status = %output.status_display(),
                    "Best-effort command failed, ignoring"
                );
                None
            }
            Err(e) => {
                tracing::debug!(command = %spec, error = %e, "Best-effort command did not start, ignoring");
                None
            }
        }
    }
}

/// Runs commands on the real host.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for SystemRunner {
    fn output(&self, spec: &CommandSpec) -> VmstrapResult<CommandOutput> {
        let mut cmd = spec.to_command();

        if spec.inherits_output() {
            let status = cmd
                .status()
                .map_err(|e| VmstrapError::spawn(spec.program(), e))?;
            return Ok(CommandOutput {
                code: status.code(),
                stdout: String::new(),
                stderr: String::new(),
            });
        }

        let output = cmd
            .output()
            .map_err(|e| VmstrapError::spawn(spec.program(), e))?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
