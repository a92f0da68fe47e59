use reqwest::StatusCode;
use thiserror::Error;

use crate::endpoint::Endpoint;

/// Coarse classification of a failed query, for callers that only need to branch on the
/// kind of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The HTTP exchange failed: non-success status, connection error or timeout.
    Transport,
    /// The service answered but declared zero matching rows.
    NoMatchingData,
    /// The query could not be built, so nothing was sent.
    MalformedQuery,
    /// The service answered with a `Failed` header, e.g. bad credentials or arguments.
    Rejected,
    /// The response body wasn't the JSON envelope the service normally returns.
    Decode,
}

/// Why a query produced no table.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("{endpoint}: HTTP {status}{}", detail_suffix(.detail))]
    Status {
        endpoint: Endpoint,
        status: StatusCode,
        detail: String,
    },

    #[error("{endpoint}: request failed")]
    Connection {
        endpoint: Endpoint,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint}: no matching data could be found")]
    NoMatchingData { endpoint: Endpoint },

    #[error("{endpoint}: malformed query: {reason}")]
    MalformedQuery { endpoint: Endpoint, reason: String },

    #[error("{endpoint}: request rejected by the service: {}", .messages.join("; "))]
    Rejected {
        endpoint: Endpoint,
        messages: Vec<String>,
    },

    #[error("{endpoint}: failed to parse API JSON")]
    Decode {
        endpoint: Endpoint,
        #[source]
        source: serde_json::Error,
    },
}

impl QueryError {
    pub fn kind(&self) -> FailureKind {
        match self {
            QueryError::Status { .. } | QueryError::Connection { .. } => FailureKind::Transport,
            QueryError::NoMatchingData { .. } => FailureKind::NoMatchingData,
            QueryError::MalformedQuery { .. } => FailureKind::MalformedQuery,
            QueryError::Rejected { .. } => FailureKind::Rejected,
            QueryError::Decode { .. } => FailureKind::Decode,
        }
    }

    pub fn endpoint(&self) -> Endpoint {
        match self {
            QueryError::Status { endpoint, .. }
            | QueryError::Connection { endpoint, .. }
            | QueryError::NoMatchingData { endpoint }
            | QueryError::MalformedQuery { endpoint, .. }
            | QueryError::Rejected { endpoint, .. }
            | QueryError::Decode { endpoint, .. } => *endpoint,
        }
    }

    /// HTTP status, when the failure came with one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            QueryError::Status { status, .. } => Some(*status),
            QueryError::Connection { source, .. } => source.status(),
            _ => None,
        }
    }

    pub fn is_no_data(&self) -> bool {
        self.kind() == FailureKind::NoMatchingData
    }
}

fn detail_suffix(detail: &str) -> String {
    if detail.is_empty() {
        String::new()
    } else {
        format!(" ({})", detail)
    }
}

/// Builds the detail text for a non-success status from whatever the service said plus a
/// remediation hint for the statuses users commonly hit.
pub(crate) fn status_detail(status: StatusCode, server_messages: &[String]) -> String {
    let hint = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Some("check the account email and key; new keys are issued via /signup")
        }
        StatusCode::NOT_FOUND => {
            Some("endpoint not found; check the base URL (default https://aqs.epa.gov/data/api)")
        }
        StatusCode::TOO_MANY_REQUESTS => Some("the service limits request rate; slow down"),
        _ => None,
    };

    let mut parts: Vec<&str> = server_messages.iter().map(String::as_str).collect();
    if let Some(hint) = hint {
        parts.push(hint);
    }
    parts.join("; ")
}
