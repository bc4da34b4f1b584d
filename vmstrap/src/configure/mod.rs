//! First-boot configuration of the new root.
//!
//! Three separately testable parts:
//!
//! ```text
//! collect_identity ──→ ControlScript::for_identity ──→ Boundary::execute
//!   (prompts)              (pure rendering)           (write, chroot, remove)
//! ```

mod chroot;
mod identity;
mod script;

pub use chroot::{Boundary, ChrootBoundary, ChrootCommand, TransientScript};
pub use identity::{IdentityConfig, Secret, collect_identity};
pub use script::{ControlScript, ScriptStep, shell_quote};

use crate::options::SystemSettings;
use crate::util::command::CommandRunner;
use std::path::Path;
use vmstrap_shared::VmstrapResult;

pub struct Configurator<'a> {
    runner: &'a dyn CommandRunner,
    settings: &'a SystemSettings,
}

impl<'a> Configurator<'a> {
    pub fn new(runner: &'a dyn CommandRunner, settings: &'a SystemSettings) -> Self {
        Self { runner, settings }
    }

    /// Render the control script for `identity` and run it inside `root`.
    pub fn configure(&self, root: &Path, identity: &IdentityConfig) -> VmstrapResult<()> {
        let script = ControlScript::for_identity(identity, self.settings);
        tracing::debug!(steps = script.steps().len(), "Control script rendered");

        ChrootBoundary::new(self.runner, self.settings).execute(root, &script)
    }
}
