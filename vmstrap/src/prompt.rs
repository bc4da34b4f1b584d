//! Operator interaction.
//!
//! The pipeline never talks to the terminal directly. It asks a
//! [`Prompter`] for confirmation and identity input, so tests can drive a
//! full run with scripted answers.

use crate::configure::Secret;
use vmstrap_shared::VmstrapResult;

pub trait Prompter {
    /// Show `message` and block until the operator agrees to continue.
    ///
    /// # Errors
    ///
    /// Returns `VmstrapError::Aborted` when the operator declines or input
    /// is closed.
    fn confirm(&self, message: &str) -> VmstrapResult<()>;

    /// Read one line of plain text.
    fn input(&self, prompt: &str) -> VmstrapResult<String>;

    /// Read one line without echoing it.
    fn secret(&self, prompt: &str) -> VmstrapResult<Secret>;
}
