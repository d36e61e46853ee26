use std::fmt;

/// Errors raised by the process supervisor (§4.C4).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessError {
    AlreadyRunning { detail: Option<String> },
    NoSuchStorage { detail: Option<String> },
    NoSuchOption { detail: Option<String> },
    MissingRequiredOption { detail: Option<String> },
    SubstitutionNotFound { detail: Option<String> },
    ConfigFileWriteError { detail: Option<String> },
    ProcessNotRunning { detail: Option<String> },
    SystemOptionEditForbidden { detail: Option<String> },
    CantEditConfigOfRunningProcess { detail: Option<String> },
    OptionRenderFailed { detail: Option<String> },
}

impl ProcessError {
    pub fn category(&self) -> &'static str {
        "ProcessErrors"
    }

    pub fn code(&self) -> i64 {
        match self {
            ProcessError::AlreadyRunning { .. } => 1,
            ProcessError::NoSuchStorage { .. } => 2,
            ProcessError::NoSuchOption { .. } => 3,
            ProcessError::MissingRequiredOption { .. } => 4,
            ProcessError::SubstitutionNotFound { .. } => 5,
            ProcessError::ConfigFileWriteError { .. } => 6,
            ProcessError::ProcessNotRunning { .. } => 7,
            ProcessError::SystemOptionEditForbidden { .. } => 8,
            ProcessError::CantEditConfigOfRunningProcess { .. } => 9,
            ProcessError::OptionRenderFailed { .. } => 10,
        }
    }

    fn canonical_message(&self) -> &'static str {
        match self {
            ProcessError::AlreadyRunning { .. } => "Process is already running.",
            ProcessError::NoSuchStorage { .. } => "No such configuration storage.",
            ProcessError::NoSuchOption { .. } => "No such option.",
            ProcessError::MissingRequiredOption { .. } => "Missing required option.",
            ProcessError::SubstitutionNotFound { .. } => "Substitution not found.",
            ProcessError::ConfigFileWriteError { .. } => "Config file write error.",
            ProcessError::ProcessNotRunning { .. } => "Process is not running.",
            ProcessError::SystemOptionEditForbidden { .. } => "Editing a system option is forbidden.",
            ProcessError::CantEditConfigOfRunningProcess { .. } => {
                "Can't edit configuration of a running process."
            }
            ProcessError::OptionRenderFailed { .. } => "Failed to render an option's value.",
        }
    }

    fn detail(&self) -> &Option<String> {
        match self {
            ProcessError::AlreadyRunning { detail }
            | ProcessError::NoSuchStorage { detail }
            | ProcessError::NoSuchOption { detail }
            | ProcessError::MissingRequiredOption { detail }
            | ProcessError::SubstitutionNotFound { detail }
            | ProcessError::ConfigFileWriteError { detail }
            | ProcessError::ProcessNotRunning { detail }
            | ProcessError::SystemOptionEditForbidden { detail }
            | ProcessError::CantEditConfigOfRunningProcess { detail }
            | ProcessError::OptionRenderFailed { detail } => detail,
        }
    }
}

impl fmt::Display for ProcessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.detail() {
            Some(detail) => write!(f, "{}: {}", self.canonical_message(), detail),
            None => write!(f, "{}", self.canonical_message()),
        }
    }
}

impl std::error::Error for ProcessError {}
