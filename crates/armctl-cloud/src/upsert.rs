//! Confirmation-gated upsert
//!
//! ```text
//! VALIDATE -> CHECK_EXISTS -> absent ------------------------> MUTATE -> REFETCH -> DONE
//!                          -> present -> CONFIRM -> accepted -> MUTATE
//!                                                -> declined -> SKIPPED
//! ```
//!
//! `VALIDATE` is the pure `to_wire` mapping, so malformed input fails before
//! the first network call. The value handed back after `MUTATE` always comes
//! from a fresh read, never from the locally built wire model.

use crate::confirm::{ConfirmationChannel, ConfirmationOutcome, ConfirmationPolicy};
use crate::context::InvocationContext;
use crate::error::{CloudError, Operation, Result};
use crate::gate;
use crate::mapper::WireMapped;
use crate::model::ResourceIdentity;
use crate::provider::ResourceProvider;
use serde::Serialize;
use std::fmt;

/// What an upsert ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertAction {
    Create,
    Update,
    Skip,
}

impl fmt::Display for UpsertAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpsertAction::Create => write!(f, "created"),
            UpsertAction::Update => write!(f, "updated"),
            UpsertAction::Skip => write!(f, "skipped"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UpsertOutcome<D> {
    /// Mutation went through; `resource` is the provider's canonical state
    Applied { resource: D, created: bool },
    /// The user declined to overwrite; `prior` is the untouched remote state
    Skipped { prior: Option<D> },
}

impl<D> UpsertOutcome<D> {
    pub fn action(&self) -> UpsertAction {
        match self {
            UpsertOutcome::Applied { created: true, .. } => UpsertAction::Create,
            UpsertOutcome::Applied { created: false, .. } => UpsertAction::Update,
            UpsertOutcome::Skipped { .. } => UpsertAction::Skip,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, UpsertOutcome::Skipped { .. })
    }

    pub fn resource(&self) -> Option<&D> {
        match self {
            UpsertOutcome::Applied { resource, .. } => Some(resource),
            UpsertOutcome::Skipped { prior } => prior.as_ref(),
        }
    }
}

pub struct Upsert<'a, P: ?Sized, C: ?Sized> {
    ctx: &'a InvocationContext,
    provider: &'a P,
    channel: &'a C,
}

impl<'a, P, C> Upsert<'a, P, C>
where
    P: ResourceProvider + ?Sized,
    C: ConfirmationChannel + ?Sized,
{
    pub fn new(ctx: &'a InvocationContext, provider: &'a P, channel: &'a C) -> Self {
        Self {
            ctx,
            provider,
            channel,
        }
    }

    pub async fn run<D>(&self, desired: &D, force: bool) -> Result<UpsertOutcome<D>>
    where
        D: WireMapped<Wire = P::Wire>,
    {
        let identity = desired.identity();
        let resource = format!("{} {}", self.provider.resource_type(), identity);

        let wire = desired.to_wire().map_err(|e| {
            tracing::warn!(%resource, error = %e, "rejected before contacting provider");
            CloudError::Validation(e)
        })?;

        let prior = gate::probe(self.ctx, self.provider, identity).await?;
        let exists = prior.is_some();
        tracing::info!(%resource, exists, force, "existence checked");

        let message = overwrite_message(D::RESOURCE_TYPE, identity);
        let outcome = tokio::select! {
            biased;
            _ = self.ctx.cancellation().cancelled() => {
                return Err(CloudError::Cancelled {
                    operation: Operation::CreateOrUpdate,
                    resource: resource.clone(),
                });
            }
            outcome = ConfirmationPolicy::resolve(self.channel, exists, force, &message, &identity.name) => outcome?,
        };

        if outcome == ConfirmationOutcome::Skip {
            tracing::info!(%resource, "overwrite declined, leaving resource unchanged");
            let prior = prior.map(D::from_wire).transpose()?;
            return Ok(UpsertOutcome::Skipped { prior });
        }

        self.ctx
            .call(
                Operation::CreateOrUpdate,
                &resource,
                self.provider.create_or_update(identity, &wire),
            )
            .await?;
        tracing::info!(%resource, created = !exists, "createOrUpdate finished");

        let canonical = self
            .ctx
            .call(Operation::Get, &resource, self.provider.get(identity))
            .await?;
        let resource = D::from_wire(canonical)?;

        Ok(UpsertOutcome::Applied {
            resource,
            created: !exists,
        })
    }
}

/// Prompt text naming the resource and its scope
pub fn overwrite_message(resource_type: &str, identity: &ResourceIdentity) -> String {
    format!(
        "{} '{}' already exists in resource group '{}' ({}). Overwrite it?",
        resource_type,
        identity.name,
        identity.scope.resource_group,
        identity.scope.location
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Scope;

    #[test]
    fn test_overwrite_message_names_scope() {
        let identity =
            ResourceIdentity::new(Scope::new("sub-1", "rg1", "westus"), "nsg1").unwrap();
        let msg = overwrite_message("network security group", &identity);
        assert_eq!(
            msg,
            "network security group 'nsg1' already exists in resource group 'rg1' (westus). Overwrite it?"
        );
    }

    #[test]
    fn test_outcome_action() {
        let applied: UpsertOutcome<u8> = UpsertOutcome::Applied {
            resource: 1,
            created: true,
        };
        assert_eq!(applied.action(), UpsertAction::Create);
        assert_eq!(applied.resource(), Some(&1));

        let skipped: UpsertOutcome<u8> = UpsertOutcome::Skipped { prior: Some(2) };
        assert!(skipped.is_skipped());
        assert_eq!(skipped.action().to_string(), "skipped");
        assert_eq!(skipped.resource(), Some(&2));
    }
}
