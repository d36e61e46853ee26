//! Managed child-process supervisor.
//!
//! A [`Process`] owns one child's full lifecycle: the {Stopped, Starting,
//! Running, Stopping} state machine, config-file/log-file naming and
//! rendering through the `overseer_options` formatter, substitution of
//! `%PID%`/`%ROOTPATH%`/... placeholders, and launch/stop policy via
//! `tokio::process`.

mod config;
mod process;
mod state;
mod substitution;

pub use config::{ProcessConfiguration, CMDLINE, CONFIG};
pub use process::{Process, StartFailure, StopHandler};
pub use state::{ExitStatus, ProcessState};
pub use substitution::Substitutor;
