//! Provider client traits
//!
//! Remote management API surface consumed by the orchestrators. Network and
//! authentication details live in the implementing crate; from here a call is
//! an opaque RPC that either returns a wire model or a [`ProviderError`].

use crate::error::{Operation, ProviderResult};
use crate::model::ResourceIdentity;
use async_trait::async_trait;
use std::fmt;

/// Read and upsert operations for a single resource type
#[async_trait]
pub trait ResourceProvider: Send + Sync {
    type Wire: Send + Sync;

    /// ARM resource type, e.g. "Microsoft.Network/networkSecurityGroups"
    fn resource_type(&self) -> &str;

    /// Read the current state. A missing resource is [`ProviderError::NotFound`].
    ///
    /// [`ProviderError::NotFound`]: crate::error::ProviderError::NotFound
    async fn get(&self, identity: &ResourceIdentity) -> ProviderResult<Self::Wire>;

    /// Create or replace the resource, blocking until any long-running
    /// operation behind it has finished
    async fn create_or_update(
        &self,
        identity: &ResourceIdentity,
        model: &Self::Wire,
    ) -> ProviderResult<Self::Wire>;
}

/// Query accepted by a [`ListProvider`]
pub trait ListQuery: fmt::Display + Send + Sync {
    const OPERATION: Operation;
}

/// List operation keyed by query type
#[async_trait]
pub trait ListProvider<Q: ListQuery>: Send + Sync {
    type Item: Send;

    async fn list(&self, query: &Q) -> ProviderResult<Vec<Self::Item>>;
}

/// All resources of a type in one resource group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceGroupQuery {
    pub subscription_id: String,
    pub resource_group: String,
}

impl ListQuery for ResourceGroupQuery {
    const OPERATION: Operation = Operation::List;
}

impl fmt::Display for ResourceGroupQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "resource group '{}'", self.resource_group)
    }
}

/// Extension types a publisher offers in a location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionTypeQuery {
    pub subscription_id: String,
    pub location: String,
    pub publisher: String,
}

impl ListQuery for ExtensionTypeQuery {
    const OPERATION: Operation = Operation::ListTypes;
}

impl fmt::Display for ExtensionTypeQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "extension types of '{}' in '{}'",
            self.publisher, self.location
        )
    }
}

/// Versions of one extension type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionVersionQuery {
    pub subscription_id: String,
    pub location: String,
    pub publisher: String,
    pub type_name: String,
    /// OData `$filter` passed through to the provider
    pub filter: Option<String>,
}

impl ListQuery for ExtensionVersionQuery {
    const OPERATION: Operation = Operation::ListVersions;
}

impl fmt::Display for ExtensionVersionQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "versions of '{}.{}' in '{}'",
            self.publisher, self.type_name, self.location
        )
    }
}
