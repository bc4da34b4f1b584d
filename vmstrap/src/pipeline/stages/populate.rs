//! Stage 4: Root filesystem population.

use crate::pipeline::types::{PopulateInput, PopulateOutput};
use crate::rootfs::RootPopulator;
use vmstrap_shared::errors::VmstrapResult;

pub fn run(input: PopulateInput<'_>) -> VmstrapResult<PopulateOutput> {
    let fstab = RootPopulator::new(input.runner).populate(&input.artifact.local_path, input.mounts)?;
    Ok(PopulateOutput { fstab })
}
