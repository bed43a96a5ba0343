//! Read path
//!
//! Queries go straight to the provider: no existence check, no prompt, no
//! mutation.

use crate::context::InvocationContext;
use crate::error::{Operation, Result};
use crate::mapper::WireMapped;
use crate::model::ResourceIdentity;
use crate::provider::{ListProvider, ListQuery, ResourceProvider};

pub struct Reader<'a> {
    ctx: &'a InvocationContext,
}

impl<'a> Reader<'a> {
    pub fn new(ctx: &'a InvocationContext) -> Self {
        Self { ctx }
    }

    /// Fetch one resource and map it into the domain model
    pub async fn get<D, P>(&self, provider: &P, identity: &ResourceIdentity) -> Result<D>
    where
        P: ResourceProvider + ?Sized,
        D: WireMapped<Wire = P::Wire>,
    {
        let resource = format!("{} {}", provider.resource_type(), identity);
        let wire = self
            .ctx
            .call(Operation::Get, &resource, provider.get(identity))
            .await?;
        D::from_wire(wire)
    }

    /// Provider listing, returned exactly as received
    pub async fn list<Q, P>(&self, provider: &P, query: &Q) -> Result<Vec<P::Item>>
    where
        Q: ListQuery,
        P: ListProvider<Q> + ?Sized,
    {
        let target = query.to_string();
        let items = self
            .ctx
            .call(Q::OPERATION, &target, provider.list(query))
            .await?;
        tracing::debug!(%target, count = items.len(), "listed");
        Ok(items)
    }

    /// Provider listing mapped into the domain model
    pub async fn list_mapped<D, Q, P>(&self, provider: &P, query: &Q) -> Result<Vec<D>>
    where
        Q: ListQuery,
        P: ListProvider<Q> + ?Sized,
        D: WireMapped<Wire = P::Item>,
    {
        self.list(provider, query)
            .await?
            .into_iter()
            .map(D::from_wire)
            .collect()
    }
}
