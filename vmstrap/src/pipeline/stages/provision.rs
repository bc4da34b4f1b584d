//! Stage 3: Disk provisioning.

use crate::disk::DiskProvisioner;
use crate::pipeline::types::{ProvisionInput, ProvisionOutput};
use vmstrap_shared::errors::VmstrapResult;

/// Confirm, wipe, partition, format and mount the target device.
pub fn run(input: ProvisionInput<'_>) -> VmstrapResult<ProvisionOutput> {
    let mounts = DiskProvisioner::new(input.runner, input.prompter, input.mount_root)
        .provision(input.device)?;
    Ok(ProvisionOutput { mounts })
}
