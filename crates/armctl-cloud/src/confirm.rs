//! Confirmation policy and channel

use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;

/// What the policy requires before mutating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    ProceedWithoutPrompt,
    Prompt,
}

/// Result of a gated mutation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationOutcome {
    /// Existing resource, overwrite accepted or forced
    Proceed,
    /// Existing resource, user declined
    Skip,
    /// Nothing to overwrite
    NotApplicable,
}

pub struct ConfirmationPolicy;

impl ConfirmationPolicy {
    pub fn decide(exists: bool, force: bool) -> GateDecision {
        match (exists, force) {
            (false, _) => GateDecision::ProceedWithoutPrompt,
            (true, true) => GateDecision::ProceedWithoutPrompt,
            (true, false) => GateDecision::Prompt,
        }
    }

    /// Run the policy, prompting on `channel` only when required
    pub async fn resolve<C>(
        channel: &C,
        exists: bool,
        force: bool,
        message: &str,
        resource_name: &str,
    ) -> Result<ConfirmationOutcome>
    where
        C: ConfirmationChannel + ?Sized,
    {
        if !exists {
            return Ok(ConfirmationOutcome::NotApplicable);
        }
        match Self::decide(exists, force) {
            GateDecision::ProceedWithoutPrompt => {
                tracing::debug!(resource_name, "overwrite forced, not prompting");
                Ok(ConfirmationOutcome::Proceed)
            }
            GateDecision::Prompt => {
                if channel.prompt(message, resource_name).await? {
                    Ok(ConfirmationOutcome::Proceed)
                } else {
                    Ok(ConfirmationOutcome::Skip)
                }
            }
        }
    }
}

/// Asks a human whether to go ahead
#[async_trait]
pub trait ConfirmationChannel: Send + Sync {
    /// Block until the user accepts (`true`) or declines (`false`)
    async fn prompt(&self, message: &str, resource_name: &str) -> Result<bool>;
}

/// Declines every prompt; for non-interactive sessions
pub struct AlwaysDecline;

#[async_trait]
impl ConfirmationChannel for AlwaysDecline {
    async fn prompt(&self, message: &str, _resource_name: &str) -> Result<bool> {
        tracing::info!("non-interactive session, declining: {}", message);
        Ok(false)
    }
}

/// Accepts every prompt
pub struct AlwaysAccept;

#[async_trait]
impl ConfirmationChannel for AlwaysAccept {
    async fn prompt(&self, _message: &str, _resource_name: &str) -> Result<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_table() {
        assert_eq!(
            ConfirmationPolicy::decide(false, false),
            GateDecision::ProceedWithoutPrompt
        );
        assert_eq!(
            ConfirmationPolicy::decide(false, true),
            GateDecision::ProceedWithoutPrompt
        );
        assert_eq!(
            ConfirmationPolicy::decide(true, true),
            GateDecision::ProceedWithoutPrompt
        );
        assert_eq!(ConfirmationPolicy::decide(true, false), GateDecision::Prompt);
    }

    #[tokio::test]
    async fn test_resolve_outcomes() {
        let absent = ConfirmationPolicy::resolve(&AlwaysDecline, false, false, "m", "nsg1")
            .await
            .unwrap();
        assert_eq!(absent, ConfirmationOutcome::NotApplicable);

        let forced = ConfirmationPolicy::resolve(&AlwaysDecline, true, true, "m", "nsg1")
            .await
            .unwrap();
        assert_eq!(forced, ConfirmationOutcome::Proceed);

        let declined = ConfirmationPolicy::resolve(&AlwaysDecline, true, false, "m", "nsg1")
            .await
            .unwrap();
        assert_eq!(declined, ConfirmationOutcome::Skip);

        let accepted = ConfirmationPolicy::resolve(&AlwaysAccept, true, false, "m", "nsg1")
            .await
            .unwrap();
        assert_eq!(accepted, ConfirmationOutcome::Proceed);
    }

    #[test]
    fn test_always_decline_never_accepts() {
        let answer = tokio_test::block_on(AlwaysDecline.prompt("Overwrite it?", "nsg1")).unwrap();
        assert!(!answer);
    }
}
