//! Per-invocation context
//!
//! Built once at the command boundary and passed by reference into the
//! orchestrators. Nothing in it is shared between invocations.

use crate::error::{CloudError, Operation, ProviderResult, Result};
use chrono::{DateTime, Utc};
use std::future::Future;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct InvocationContext {
    /// Command name, used for log correlation
    pub command: String,
    pub started_at: DateTime<Utc>,
    cancellation: CancellationToken,
}

impl InvocationContext {
    pub fn new(command: impl Into<String>) -> Self {
        Self::with_cancellation(command, CancellationToken::new())
    }

    pub fn with_cancellation(command: impl Into<String>, cancellation: CancellationToken) -> Self {
        Self {
            command: command.into(),
            started_at: Utc::now(),
            cancellation,
        }
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    pub fn elapsed_ms(&self) -> i64 {
        (Utc::now() - self.started_at).num_milliseconds()
    }

    /// Await a provider call, abandoning it on cancellation
    ///
    /// Provider failures are wrapped with the operation and resource so the
    /// caller can diagnose them without the logs.
    pub async fn call<T, F>(&self, operation: Operation, resource: &str, call: F) -> Result<T>
    where
        F: Future<Output = ProviderResult<T>>,
    {
        if self.is_cancelled() {
            return Err(CloudError::Cancelled {
                operation,
                resource: resource.to_string(),
            });
        }

        tracing::debug!(command = %self.command, %operation, resource, "provider call");
        tokio::select! {
            biased;
            _ = self.cancellation.cancelled() => {
                tracing::warn!(%operation, resource, "provider call abandoned");
                Err(CloudError::Cancelled {
                    operation,
                    resource: resource.to_string(),
                })
            }
            result = call => result.map_err(|e| CloudError::provider(operation, resource, e)),
        }
    }
}
