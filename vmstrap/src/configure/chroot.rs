//! Crossing into the new root.
//!
//! The rendered script is written under the new root, executed through
//! `arch-chroot`, and removed again by [`TransientScript`] on every exit
//! path.

use super::script::ControlScript;
use crate::options::SystemSettings;
use crate::util::command::{CommandRunner, CommandSpec};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use vmstrap_shared::{VmstrapError, VmstrapResult};

const SCRIPT_MODE: u32 = 0o700;

/// Builder for an `arch-chroot` invocation.
#[derive(Debug, Clone)]
pub struct ChrootCommand {
    program: String,
    root: PathBuf,
    command: Vec<String>,
}

impl ChrootCommand {
    pub fn new(program: impl Into<String>, root: impl AsRef<Path>) -> Self {
        Self {
            program: program.into(),
            root: root.as_ref().to_path_buf(),
            command: Vec::new(),
        }
    }

    /// Command to run inside the root, as seen from inside it.
    pub fn command(mut self, program: impl AsRef<Path>) -> Self {
        self.command
            .push(program.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Output goes straight to the terminal: the operator watches
    /// `locale-gen` and `bootctl` progress.
    pub fn build(self) -> CommandSpec {
        CommandSpec::new(self.program)
            .arg(self.root.to_string_lossy())
            .args(self.command)
            .inherit_output()
    }
}

/// Executes a control script inside a root filesystem.
pub trait Boundary {
    fn execute(&self, root: &Path, script: &ControlScript) -> VmstrapResult<()>;
}

/// The real boundary: a transient script file plus `arch-chroot`.
pub struct ChrootBoundary<'a> {
    runner: &'a dyn CommandRunner,
    program: String,
    script_path: PathBuf,
}

impl<'a> ChrootBoundary<'a> {
    pub fn new(runner: &'a dyn CommandRunner, settings: &SystemSettings) -> Self {
        Self {
            runner,
            program: settings.chroot_program.clone(),
            script_path: settings.script_path.clone(),
        }
    }
}

impl Boundary for ChrootBoundary<'_> {
    fn execute(&self, root: &Path, script: &ControlScript) -> VmstrapResult<()> {
        let host_path = host_path(root, &self.script_path);
        let _script = TransientScript::write(host_path, &script.render())?;

        let spec = ChrootCommand::new(&self.program, root)
            .command(&self.script_path)
            .build();

        tracing::info!(root = %root.display(), script = %self.script_path.display(), "Configuring new root");
        self.runner.run(&spec)?;
        Ok(())
    }
}

/// `inner` (absolute inside the root) as a path on the host.
fn host_path(root: &Path, inner: &Path) -> PathBuf {
    root.join(inner.strip_prefix("/").unwrap_or(inner))
}

/// A script file that exists for as long as this guard does.
pub struct TransientScript {
    path: PathBuf,
}

impl TransientScript {
    /// Write `contents` to `path` as an owner-only executable.
    pub fn write(path: PathBuf, contents: &str) -> VmstrapResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                VmstrapError::Storage(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(SCRIPT_MODE)
            .open(&path)
            .map_err(|e| {
                VmstrapError::Storage(format!("Failed to create {}: {}", path.display(), e))
            })?;

        // Guard first, so a failed write is cleaned up too.
        let guard = Self { path };
        file.write_all(contents.as_bytes()).map_err(|e| {
            VmstrapError::Storage(format!("Failed to write {}: {}", guard.path.display(), e))
        })?;

        tracing::debug!(path = %guard.path.display(), "Control script written");
        Ok(guard)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TransientScript {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Control script removed"),
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove control script"
            ),
        }
    }
}
