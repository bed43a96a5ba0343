//! Microsoft.Network resource clients

use crate::client::ArmClient;
use armctl_cloud::mapper::NSG_PROVIDER_TYPE;
use armctl_cloud::{
    ListProvider, NetworkSecurityGroupWire, ProviderResult, ResourceGroupQuery,
    ResourceIdentity, ResourceProvider,
};
use async_trait::async_trait;
use reqwest::Url;

pub const NETWORK_API_VERSION: &str = "2023-09-01";

/// Network security groups over ARM
#[derive(Debug, Clone)]
pub struct NetworkSecurityGroupClient {
    arm: ArmClient,
}

impl NetworkSecurityGroupClient {
    pub fn new(arm: ArmClient) -> Self {
        Self { arm }
    }

    fn resource_url(&self, identity: &ResourceIdentity) -> ProviderResult<Url> {
        self.arm.url(
            &[
                "subscriptions",
                &identity.scope.subscription_id,
                "resourceGroups",
                identity.resource_group(),
                "providers",
                "Microsoft.Network",
                "networkSecurityGroups",
                &identity.name,
            ],
            NETWORK_API_VERSION,
            &[],
        )
    }

    fn collection_url(&self, query: &ResourceGroupQuery) -> ProviderResult<Url> {
        self.arm.url(
            &[
                "subscriptions",
                &query.subscription_id,
                "resourceGroups",
                &query.resource_group,
                "providers",
                "Microsoft.Network",
                "networkSecurityGroups",
            ],
            NETWORK_API_VERSION,
            &[],
        )
    }
}

#[async_trait]
impl ResourceProvider for NetworkSecurityGroupClient {
    type Wire = NetworkSecurityGroupWire;

    fn resource_type(&self) -> &str {
        NSG_PROVIDER_TYPE
    }

    async fn get(&self, identity: &ResourceIdentity) -> ProviderResult<NetworkSecurityGroupWire> {
        self.arm.get_json(self.resource_url(identity)?).await
    }

    async fn create_or_update(
        &self,
        identity: &ResourceIdentity,
        model: &NetworkSecurityGroupWire,
    ) -> ProviderResult<NetworkSecurityGroupWire> {
        self.arm.put_json(self.resource_url(identity)?, model).await
    }
}

#[async_trait]
impl ListProvider<ResourceGroupQuery> for NetworkSecurityGroupClient {
    type Item = NetworkSecurityGroupWire;

    async fn list(&self, query: &ResourceGroupQuery) -> ProviderResult<Vec<Self::Item>> {
        self.arm.list_paged(self.collection_url(query)?).await
    }
}
