//! Stage 1: Environment validation.

use crate::host_check::EnvironmentValidator;
use crate::pipeline::types::{ValidateInput, ValidateOutput};
use vmstrap_shared::errors::VmstrapResult;

/// Evaluate the safety predicates; fail unless every one holds.
pub fn run(input: ValidateInput<'_>) -> VmstrapResult<ValidateOutput> {
    let safety = EnvironmentValidator::new(input.probe, input.options).validate()?;
    Ok(ValidateOutput { safety })
}
