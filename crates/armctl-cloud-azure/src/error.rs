//! Azure provider error types

use armctl_cloud::ProviderError;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArmError {
    #[error("environment variable {0} is not set")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, ArmError>;

/// ARM error envelope: `{"error": {"code": "...", "message": "..."}}`
#[derive(Debug, serde::Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Default, serde::Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

pub(crate) fn parse_error_body(body: &str) -> ErrorBody {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error)
        .unwrap_or_else(|_| ErrorBody {
            code: String::new(),
            message: body.trim().chars().take(512).collect(),
        })
}

/// Map a non-success HTTP status to a provider error
pub(crate) fn classify_status(
    status: u16,
    retry_after: Option<Duration>,
    body: &str,
) -> ProviderError {
    let ErrorBody { code, message } = parse_error_body(body);
    match status {
        404 => ProviderError::NotFound(if message.is_empty() { code } else { message }),
        401 | 403 => ProviderError::Authentication(format!("{code}: {message}")),
        429 | 503 => ProviderError::Throttled { retry_after },
        500..=599 if code.is_empty() => ProviderError::Transport(format!("{status}: {message}")),
        500..=599 => ProviderError::Transport(format!("{status} {code}: {message}")),
        _ => ProviderError::Api {
            status,
            code,
            message,
        },
    }
}

pub(crate) fn classify_transport(err: &reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout(err.to_string())
    } else if err.is_decode() {
        ProviderError::Malformed(err.to_string())
    } else {
        ProviderError::Transport(err.to_string())
    }
}

/// `Retry-After` in seconds; the HTTP-date form is not used by ARM
pub(crate) fn parse_retry_after(value: Option<&str>) -> Option<Duration> {
    value?.trim().parse::<u64>().ok().map(Duration::from_secs)
}
