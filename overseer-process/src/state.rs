use serde::Serialize;

/// Lifecycle state of a supervised process.
///
/// `Stopped` is both the initial and only terminal-reachable state;
/// processes are long-lived entities of the controller, not one-shot jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

/// Outcome of a completed run, delivered to the stop-handler exactly once
/// from the exit callback.
#[derive(Debug, Clone, Serialize)]
pub struct ExitStatus {
    pub code: Option<i32>,
    /// Set when the child exited without a prior `stop()` call.
    pub unexpected_exit: bool,
    pub error: Option<String>,
}
