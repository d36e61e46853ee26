use std::fmt;

/// Errors raised by the async HTTP client core (§4.C9).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    InternalError { detail: Option<String> },
    RequestCanceled { detail: Option<String> },
    RequestTimedOut { detail: Option<String> },
}

impl ClientError {
    pub fn category(&self) -> &'static str {
        "HttpClientErrors"
    }

    pub fn code(&self) -> i64 {
        match self {
            ClientError::InternalError { .. } => 1,
            ClientError::RequestCanceled { .. } => 2,
            ClientError::RequestTimedOut { .. } => 3,
        }
    }

    fn canonical_message(&self) -> &'static str {
        match self {
            ClientError::InternalError { .. } => "Internal HTTP client error.",
            ClientError::RequestCanceled { .. } => "Request was canceled.",
            ClientError::RequestTimedOut { .. } => "Request timed out.",
        }
    }

    fn detail(&self) -> &Option<String> {
        match self {
            ClientError::InternalError { detail }
            | ClientError::RequestCanceled { detail }
            | ClientError::RequestTimedOut { detail } => detail,
        }
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.detail() {
            Some(detail) => write!(f, "{}: {}", self.canonical_message(), detail),
            None => write!(f, "{}", self.canonical_message()),
        }
    }
}

impl std::error::Error for ClientError {}
