//! CLI command implementations.

mod config;
mod doctor;
mod hook;
mod init;
mod run;
mod transcribe;

pub use config::run_config;
pub use doctor::run_doctor;
pub use hook::{run_hook, BLOCKING_EXIT_CODE};
pub use init::run_init;
pub use run::run_workflow;
pub use transcribe::run_transcribe;
