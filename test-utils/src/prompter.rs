use parking_lot::Mutex;
use std::collections::VecDeque;
use vmstrap::{Prompter, Secret, VmstrapError, VmstrapResult};

/// A [`Prompter`] answering from fixed queues.
///
/// An exhausted queue behaves like a closed terminal: `Aborted`.
pub struct ScriptedPrompter {
    confirm: bool,
    inputs: Mutex<VecDeque<String>>,
    secrets: Mutex<VecDeque<String>>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    /// Confirms, and has no answers queued.
    pub fn new() -> Self {
        Self {
            confirm: true,
            inputs: Mutex::new(VecDeque::new()),
            secrets: Mutex::new(VecDeque::new()),
            asked: Mutex::new(Vec::new()),
        }
    }

    /// Confirms and answers the identity prompts.
    pub fn identity(hostname: &str, username: &str, user_password: &str, root_password: &str) -> Self {
        Self::new()
            .inputs([hostname, username])
            .secrets([user_password, root_password])
    }

    /// Declines the confirmation gate.
    pub fn declining() -> Self {
        Self {
            confirm: false,
            ..Self::new()
        }
    }

    pub fn inputs<'a>(self, answers: impl IntoIterator<Item = &'a str>) -> Self {
        self.inputs.lock().extend(answers.into_iter().map(str::to_string));
        self
    }

    pub fn secrets<'a>(self, answers: impl IntoIterator<Item = &'a str>) -> Self {
        self.secrets.lock().extend(answers.into_iter().map(str::to_string));
        self
    }

    /// Every message and prompt shown, in order.
    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().clone()
    }

    fn pop(&self, queue: &Mutex<VecDeque<String>>, prompt: &str) -> VmstrapResult<String> {
        self.asked.lock().push(prompt.to_string());
        queue
            .lock()
            .pop_front()
            .ok_or_else(|| VmstrapError::Aborted(format!("no answer for '{prompt}'")))
    }
}

impl Default for ScriptedPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&self, message: &str) -> VmstrapResult<()> {
        self.asked.lock().push(message.to_string());
        if self.confirm {
            Ok(())
        } else {
            Err(VmstrapError::Aborted("operator declined".into()))
        }
    }

    fn input(&self, prompt: &str) -> VmstrapResult<String> {
        self.pop(&self.inputs, prompt)
    }

    fn secret(&self, prompt: &str) -> VmstrapResult<Secret> {
        self.pop(&self.secrets, prompt).map(Secret::new)
    }
}
