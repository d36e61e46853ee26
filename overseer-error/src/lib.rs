//! Categorized error taxonomy for the overseer process supervisor.
//!
//! The taxonomy is closed and exhaustive: every error surfaced by the
//! controller, the process supervisor, the option model, or the HTTP client
//! core is one of the variants below. Each carries a stable `category` name
//! and `code`, and renders a canonical message that an optional free-form
//! `detail` string is appended to. Status-code selection from (category,
//! code) happens only in the web front-end — this crate never mentions HTTP.

mod client;
mod controller;
mod option;
mod process;

pub use client::ClientError;
pub use controller::ControllerError;
pub use option::OptionError;
pub use process::ProcessError;

/// Union of every category this service can produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverseerError {
    Controller(ControllerError),
    Process(ProcessError),
    Option(OptionError),
    Client(ClientError),
}

impl OverseerError {
    /// Stable category name, shared with the JSON `"category"` field.
    pub fn category(&self) -> &'static str {
        match self {
            OverseerError::Controller(e) => e.category(),
            OverseerError::Process(e) => e.category(),
            OverseerError::Option(e) => e.category(),
            OverseerError::Client(e) => e.category(),
        }
    }

    /// Stable numeric code within the category.
    pub fn code(&self) -> i64 {
        match self {
            OverseerError::Controller(e) => e.code(),
            OverseerError::Process(e) => e.code(),
            OverseerError::Option(e) => e.code(),
            OverseerError::Client(e) => e.code(),
        }
    }
}

impl std::fmt::Display for OverseerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverseerError::Controller(e) => write!(f, "{e}"),
            OverseerError::Process(e) => write!(f, "{e}"),
            OverseerError::Option(e) => write!(f, "{e}"),
            OverseerError::Client(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for OverseerError {}

impl From<ControllerError> for OverseerError {
    fn from(e: ControllerError) -> Self {
        OverseerError::Controller(e)
    }
}

impl From<ProcessError> for OverseerError {
    fn from(e: ProcessError) -> Self {
        OverseerError::Process(e)
    }
}

impl From<OptionError> for OverseerError {
    fn from(e: OptionError) -> Self {
        OverseerError::Option(e)
    }
}

impl From<ClientError> for OverseerError {
    fn from(e: ClientError) -> Self {
        OverseerError::Client(e)
    }
}
