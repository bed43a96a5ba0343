//! Existence gate
//!
//! A not-found read means "absent". Every other failure is fatal.

use crate::context::InvocationContext;
use crate::error::{CloudError, Operation, Result};
use crate::model::ResourceIdentity;
use crate::provider::ResourceProvider;

/// Read the resource, returning `None` when the provider reports not-found
pub async fn probe<P>(
    ctx: &InvocationContext,
    provider: &P,
    identity: &ResourceIdentity,
) -> Result<Option<P::Wire>>
where
    P: ResourceProvider + ?Sized,
{
    let resource = format!("{} {}", provider.resource_type(), identity);
    match ctx
        .call(Operation::Get, &resource, provider.get(identity))
        .await
    {
        Ok(wire) => Ok(Some(wire)),
        Err(CloudError::Provider { source, .. }) if source.is_not_found() => {
            tracing::debug!(%resource, "resource does not exist");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

pub async fn exists<P>(
    ctx: &InvocationContext,
    provider: &P,
    identity: &ResourceIdentity,
) -> Result<bool>
where
    P: ResourceProvider + ?Sized,
{
    Ok(probe(ctx, provider, identity).await?.is_some())
}
