use thiserror::Error;

/// Failure taxonomy for a refresh cycle.
///
/// Only the course list call can fail a whole cycle; grade sub-call failures
/// degrade a single course and profile failures are swallowed. The worker
/// delivers these as events, never across the task boundary as panics.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Canvas rejected the API token (HTTP 401). Check your token in the settings.")]
    Auth,

    #[error("Canvas returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Network error reaching Canvas: {0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl FetchError {
    /// Map a reqwest failure. Timeouts and connection failures are treated
    /// identically as transport errors.
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Transport("request timed out".to_string())
        } else {
            FetchError::Transport(err.to_string())
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        if status == reqwest::StatusCode::UNAUTHORIZED {
            FetchError::Auth
        } else {
            FetchError::Http {
                status: status.as_u16(),
                body,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_maps_to_auth() {
        let err = FetchError::from_status(reqwest::StatusCode::UNAUTHORIZED, String::new());
        assert!(matches!(err, FetchError::Auth));
    }

    #[test]
    fn auth_and_transport_messages_are_distinguishable() {
        let auth = FetchError::Auth.to_string();
        let transport = FetchError::Transport("request timed out".to_string()).to_string();
        assert_ne!(auth, transport);
        assert!(auth.contains("token"));
        assert!(transport.contains("Network error"));
    }
}
