//! Typed results for every controller action (§4.C6). Each mirrors one of
//! the original's `ActionResult` subclasses, minus the error code — a
//! failed action returns `Err(OverseerError)` instead, and the front-end
//! projects that onto a status code (C10).

use serde::Serialize;

use overseer_options::OptionValue;
use overseer_process::{ExitStatus, ProcessState};

#[derive(Debug, Clone, Serialize)]
pub struct ControllerInfo {
    pub pid: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessInfo {
    pub name: String,
    pub state: ProcessState,
    pub configs: Vec<String>,
}

/// `getProcessOption`/`setProcessOption`/`removeProcessOption` all produce
/// this same triple: the schema, the effective value (if any), and its
/// rendered presentation.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessOption {
    pub name: String,
    pub required: bool,
    pub is_list: bool,
    pub is_system: bool,
    pub domain: Option<Vec<String>>,
    pub value: Option<OptionValue>,
    pub rendered: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StopProcessResult {
    pub exit_status: Option<ExitStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessLog {
    pub lines: Vec<String>,
}
