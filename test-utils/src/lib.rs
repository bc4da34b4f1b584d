//! Scripted fakes for the vmstrap pipeline seams.
//!
//! Every fake records what it was asked so tests can assert on ordering
//! and on what never happened.

mod fixtures;
mod probe;
mod prompter;
mod runner;
mod source;

pub use fixtures::rootfs_tar_zst;
pub use probe::FakeProbe;
pub use prompter::ScriptedPrompter;
pub use runner::RecordingRunner;
pub use source::StaticArtifactSource;
