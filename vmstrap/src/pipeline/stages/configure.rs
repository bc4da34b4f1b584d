//! Stage 5: First-boot configuration inside the new root.

use crate::configure::{Configurator, collect_identity};
use crate::pipeline::types::{ConfigureInput, ConfigureOutput};
use vmstrap_shared::errors::VmstrapResult;

/// Collect the identity, then run the control script through the chroot.
pub fn run(input: ConfigureInput<'_>) -> VmstrapResult<ConfigureOutput> {
    let identity = collect_identity(input.prompter)?;

    Configurator::new(input.runner, input.settings).configure(input.mounts.root_dir(), &identity)?;

    Ok(ConfigureOutput {
        hostname: identity.hostname,
        username: identity.username,
    })
}
