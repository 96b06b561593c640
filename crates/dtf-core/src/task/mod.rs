//! Task definition and management
//!
//! A [`Task`] is the unit handed to a launcher: working directory, setup,
//! post-setup and run phases, resources and datasets, checked against the
//! cluster membership the per-node phases refer to.

mod task;
mod builder;
mod validator;
mod command;
mod file;

pub use task::{Task, TaskId};
pub use builder::TaskBuilder;
pub use validator::TaskValidator;
pub use command::{CommandMap, CommandSource};
pub use file::{ResourcesFile, TaskFile};
