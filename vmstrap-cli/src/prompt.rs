//! Terminal implementation of [`Prompter`].

use std::io::{self, BufRead, Write};
use vmstrap::{Prompter, Secret, VmstrapError, VmstrapResult};

const CONFIRM_HINT: &str = "Press Enter to continue, or type n (or Ctrl+C) to abort... ";

/// Reads answers from stdin; passwords are read without echo.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl TerminalPrompter {
    fn read_line(&self, prompt: &str) -> VmstrapResult<String> {
        print!("{prompt}");
        io::stdout()
            .flush()
            .map_err(|e| VmstrapError::Internal(format!("Failed to flush stdout: {}", e)))?;

        let mut line = String::new();
        let read = io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| VmstrapError::Aborted(format!("Failed to read input: {}", e)))?;
        if read == 0 {
            return Err(VmstrapError::Aborted("input closed".into()));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

impl Prompter for TerminalPrompter {
    fn confirm(&self, message: &str) -> VmstrapResult<()> {
        println!("{message}");
        let answer = self.read_line(CONFIRM_HINT)?;
        check_confirmation(&answer)
    }

    fn input(&self, prompt: &str) -> VmstrapResult<String> {
        self.read_line(prompt)
    }

    fn secret(&self, prompt: &str) -> VmstrapResult<Secret> {
        rpassword::prompt_password(prompt)
            .map(Secret::new)
            .map_err(|e| VmstrapError::Aborted(format!("Failed to read password: {}", e)))
    }
}

/// Any answer continues except an explicit `n`/`no`.
fn check_confirmation(answer: &str) -> VmstrapResult<()> {
    if matches!(answer.trim().to_ascii_lowercase().as_str(), "n" | "no") {
        return Err(VmstrapError::Aborted("operator declined".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hint_names_every_way_out() {
        assert!(CONFIRM_HINT.contains("Enter"));
        assert!(CONFIRM_HINT.contains("type n"));
        assert!(CONFIRM_HINT.contains("Ctrl+C"));
    }

    #[test]
    fn test_enter_or_anything_else_continues() {
        for answer in ["", "  ", "y", "yes", "go"] {
            assert!(check_confirmation(answer).is_ok(), "{answer:?}");
        }
    }

    #[test]
    fn test_n_aborts() {
        for answer in ["n", "N", "no", " No "] {
            let err = check_confirmation(answer).unwrap_err();
            assert!(matches!(err, VmstrapError::Aborted(_)), "{answer:?}");
        }
    }
}
