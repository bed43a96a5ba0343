//! Error types for the upsert core

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Name of the provider operation an error happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Get,
    CreateOrUpdate,
    List,
    ListTypes,
    ListVersions,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Get => write!(f, "get"),
            Operation::CreateOrUpdate => write!(f, "createOrUpdate"),
            Operation::List => write!(f, "list"),
            Operation::ListTypes => write!(f, "listTypes"),
            Operation::ListVersions => write!(f, "listVersions"),
        }
    }
}

/// Local validation failures raised by the model mapper before any network call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("tag name must not be empty")]
    EmptyTagName,

    #[error("tag name '{0}' has leading or trailing whitespace")]
    TagNameWhitespace(String),

    #[error("duplicate tag name: {0}")]
    DuplicateTag(String),

    #[error("tag name '{name}' is {len} characters long (max {max})")]
    TagNameTooLong { name: String, len: usize, max: usize },

    #[error("value of tag '{name}' is {len} characters long (max {max})")]
    TagValueTooLong { name: String, len: usize, max: usize },

    #[error("{count} tags given (max {max})")]
    TooManyTags { count: usize, max: usize },

    #[error("security rule name must not be empty")]
    EmptyRuleName,

    #[error("duplicate security rule name: {0}")]
    DuplicateRuleName(String),

    #[error("security rule '{rule}' sets both a single {field} and a list of them")]
    ConflictingRuleField { rule: String, field: &'static str },

    #[error("security rule '{rule}' has priority {priority} (allowed {min}..={max})")]
    PriorityOutOfRange {
        rule: String,
        priority: u32,
        min: u32,
        max: u32,
    },

    #[error("priority {priority} is used by both '{first}' and '{second}'")]
    DuplicatePriority {
        priority: u32,
        first: String,
        second: String,
    },
}

/// Failures reported by a provider client
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("throttled by provider{}", retry_hint(.retry_after))]
    Throttled { retry_after: Option<Duration> },

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("API error {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("long-running operation ended as {status}: {message}")]
    OperationFailed { status: String, message: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}

fn retry_hint(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(d) => format!(", retry after {}s", d.as_secs()),
        None => String::new(),
    }
}

impl ProviderError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::NotFound(_))
    }

    /// Network, timeout and throttling failures that an outer layer may retry
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Throttled { .. }
            | ProviderError::Timeout(_)
            | ProviderError::Transport(_) => true,
            ProviderError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Errors surfaced by the orchestrators
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("{operation} {resource} failed: {source}")]
    Provider {
        operation: Operation,
        resource: String,
        #[source]
        source: ProviderError,
    },

    #[error("{operation} {resource} was cancelled")]
    Cancelled {
        operation: Operation,
        resource: String,
    },

    #[error("malformed {resource_type} returned by provider: {message}")]
    MalformedResponse {
        resource_type: &'static str,
        message: String,
    },

    #[error("confirmation prompt failed: {0}")]
    Prompt(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CloudError {
    pub fn provider(operation: Operation, resource: impl Into<String>, source: ProviderError) -> Self {
        CloudError::Provider {
            operation,
            resource: resource.into(),
            source,
        }
    }

    pub fn malformed(resource_type: &'static str, message: impl Into<String>) -> Self {
        CloudError::MalformedResponse {
            resource_type,
            message: message.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, CloudError::Provider { source, .. } if source.is_transient())
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;

pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_classification() {
        assert!(ProviderError::NotFound("nsg1".into()).is_not_found());
        assert!(!ProviderError::NotFound("nsg1".into()).is_transient());
        assert!(ProviderError::Timeout("get".into()).is_transient());
        assert!(
            ProviderError::Throttled {
                retry_after: Some(Duration::from_secs(5))
            }
            .is_transient()
        );
        assert!(
            ProviderError::Api {
                status: 503,
                code: "ServiceUnavailable".into(),
                message: "busy".into()
            }
            .is_transient()
        );
        assert!(
            !ProviderError::Api {
                status: 400,
                code: "InvalidRequest".into(),
                message: "bad".into()
            }
            .is_transient()
        );
    }

    #[test]
    fn test_error_message_carries_context() {
        let err = CloudError::provider(
            Operation::CreateOrUpdate,
            "networkSecurityGroups/nsg1 (rg1)",
            ProviderError::Timeout("no response in 60s".into()),
        );
        let msg = err.to_string();
        assert!(msg.contains("createOrUpdate"));
        assert!(msg.contains("nsg1"));
        assert!(msg.contains("rg1"));
        assert!(err.is_transient());
    }

    #[test]
    fn test_throttled_message() {
        let err = ProviderError::Throttled {
            retry_after: Some(Duration::from_secs(30)),
        };
        assert_eq!(err.to_string(), "throttled by provider, retry after 30s");
    }
}
