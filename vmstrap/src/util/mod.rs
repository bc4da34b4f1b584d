//! Process helpers shared by the pipeline stages.

pub mod command;

pub use command::{CommandOutput, CommandRunner, CommandSpec, SystemRunner};
