//! Microsoft.Compute VM extension image catalog

use crate::client::ArmClient;
use armctl_cloud::{
    ExtensionTypeQuery, ExtensionVersionQuery, ListProvider, ProviderResult,
    VirtualMachineImageResource,
};
use async_trait::async_trait;
use reqwest::Url;

pub const COMPUTE_API_VERSION: &str = "2023-09-01";

/// Read-only access to `.../artifacttypes/vmextension/types`
#[derive(Debug, Clone)]
pub struct ExtensionImageClient {
    arm: ArmClient,
}

impl ExtensionImageClient {
    pub fn new(arm: ArmClient) -> Self {
        Self { arm }
    }

    fn types_url(
        &self,
        subscription_id: &str,
        location: &str,
        publisher: &str,
        tail: &[&str],
        query: &[(&str, &str)],
    ) -> ProviderResult<Url> {
        let mut segments = vec![
            "subscriptions",
            subscription_id,
            "providers",
            "Microsoft.Compute",
            "locations",
            location,
            "publishers",
            publisher,
            "artifacttypes",
            "vmextension",
            "types",
        ];
        segments.extend_from_slice(tail);
        self.arm.url(&segments, COMPUTE_API_VERSION, query)
    }
}

// Both catalog endpoints answer with a bare JSON array, not a page envelope.

#[async_trait]
impl ListProvider<ExtensionTypeQuery> for ExtensionImageClient {
    type Item = VirtualMachineImageResource;

    async fn list(&self, query: &ExtensionTypeQuery) -> ProviderResult<Vec<Self::Item>> {
        let url = self.types_url(
            &query.subscription_id,
            &query.location,
            &query.publisher,
            &[],
            &[],
        )?;
        self.arm.get_json(url).await
    }
}

#[async_trait]
impl ListProvider<ExtensionVersionQuery> for ExtensionImageClient {
    type Item = VirtualMachineImageResource;

    async fn list(&self, query: &ExtensionVersionQuery) -> ProviderResult<Vec<Self::Item>> {
        let filter: Vec<(&str, &str)> = query
            .filter
            .as_deref()
            .map(|f| vec![("$filter", f)])
            .unwrap_or_default();
        let url = self.types_url(
            &query.subscription_id,
            &query.location,
            &query.publisher,
            &[query.type_name.as_str(), "versions"],
            &filter,
        )?;
        self.arm.get_json(url).await
    }
}
