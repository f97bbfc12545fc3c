// Transport error taxonomy.

use pickem_core::workflow::RequestFailed;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The server rejected the credentials or the bearer token (HTTP 401).
    #[error("not authorized{}", fmt_detail(.detail))]
    Unauthorized { detail: Option<String> },

    /// Any other non-success status.
    #[error("server returned {status}{}", fmt_detail(.detail))]
    Status { status: u16, detail: Option<String> },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response body: {0}")]
    Decode(String),
}

fn fmt_detail(detail: &Option<String>) -> String {
    match detail {
        Some(d) => format!(": {d}"),
        None => String::new(),
    }
}

impl ApiError {
    /// Human readable detail supplied by the server, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Unauthorized { detail } | ApiError::Status { detail, .. } => {
                detail.as_deref()
            }
            ApiError::Transport(_) | ApiError::Decode(_) => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            ApiError::Decode(_) => None,
        }
    }
}

impl From<ApiError> for RequestFailed {
    fn from(err: ApiError) -> Self {
        RequestFailed::new(err.detail().map(str::to_string))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_is_carried_into_request_failure() {
        let err = ApiError::Status {
            status: 400,
            detail: Some("Cannot make picks for games that have already started".into()),
        };
        assert_eq!(err.to_string(), "server returned 400: Cannot make picks for games that have already started");
        let failed: RequestFailed = err.into();
        assert_eq!(
            failed.message_or("Failed to save picks"),
            "Cannot make picks for games that have already started"
        );
    }

    #[test]
    fn decode_errors_have_no_detail() {
        let failed: RequestFailed = ApiError::Decode("eof".into()).into();
        assert_eq!(failed.message_or("Failed to load your leagues"), "Failed to load your leagues");
    }

    #[test]
    fn unauthorized_is_flagged() {
        let err = ApiError::Unauthorized { detail: None };
        assert!(err.is_unauthorized());
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.to_string(), "not authorized");
    }
}
