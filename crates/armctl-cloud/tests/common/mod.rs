#![allow(dead_code)]

use armctl_cloud::wire::{SecurityRuleProperties, SecurityRuleWire};
use armctl_cloud::{
    ConfirmationChannel, ExtensionTypeQuery, ListProvider, NetworkSecurityGroupWire,
    ProviderError, ProviderResult, ResourceGroupQuery, ResourceIdentity, ResourceProvider,
    VirtualMachineImageResource,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory provider that behaves like ARM for network security groups
#[derive(Default)]
pub struct FakeArm {
    groups: Mutex<HashMap<String, NetworkSecurityGroupWire>>,
    pub catalog: Vec<VirtualMachineImageResource>,
    pub get_calls: AtomicUsize,
    pub create_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
    /// Returned by every `get` when set
    pub get_failure: Mutex<Option<ProviderError>>,
    pub create_failure: Mutex<Option<ProviderError>>,
    pub last_sent: Mutex<Option<NetworkSecurityGroupWire>>,
}

fn key(identity: &ResourceIdentity) -> String {
    format!(
        "{}/{}",
        identity.resource_group().to_lowercase(),
        identity.name.to_lowercase()
    )
}

impl FakeArm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(mut self, catalog: Vec<VirtualMachineImageResource>) -> Self {
        self.catalog = catalog;
        self
    }

    /// Seed an existing resource as the server would store it
    pub fn seed(&self, identity: &ResourceIdentity, wire: NetworkSecurityGroupWire) {
        let stored = normalize(wire, 1);
        self.groups.lock().unwrap().insert(key(identity), stored);
    }

    pub fn stored(&self, identity: &ResourceIdentity) -> Option<NetworkSecurityGroupWire> {
        self.groups.lock().unwrap().get(&key(identity)).cloned()
    }

    pub fn gets(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn creates(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn lists(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn fail_gets_with(&self, err: ProviderError) {
        *self.get_failure.lock().unwrap() = Some(err);
    }

    pub fn fail_creates_with(&self, err: ProviderError) {
        *self.create_failure.lock().unwrap() = Some(err);
    }
}

/// Server-side defaults the client never asked for
fn normalize(mut wire: NetworkSecurityGroupWire, generation: u32) -> NetworkSecurityGroupWire {
    wire.resource_type = Some("Microsoft.Network/networkSecurityGroups".to_string());
    wire.etag = Some(format!("W/\"{generation}\""));
    wire.properties.provisioning_state = Some("Succeeded".to_string());
    wire.properties.resource_guid = Some("00000000-0000-0000-0000-000000000001".to_string());
    wire.properties.default_security_rules = vec![SecurityRuleWire {
        name: "AllowVnetInBound".to_string(),
        properties: SecurityRuleProperties {
            protocol: "*".to_string(),
            source_address_prefix: Some("VirtualNetwork".to_string()),
            destination_address_prefix: Some("VirtualNetwork".to_string()),
            access: "Allow".to_string(),
            priority: 65000,
            direction: "Inbound".to_string(),
            ..Default::default()
        },
        ..Default::default()
    }];
    for rule in &mut wire.properties.security_rules {
        rule.etag = wire.etag.clone();
        rule.properties.provisioning_state = Some("Succeeded".to_string());
    }
    wire
}

#[async_trait]
impl ResourceProvider for FakeArm {
    type Wire = NetworkSecurityGroupWire;

    fn resource_type(&self) -> &str {
        "Microsoft.Network/networkSecurityGroups"
    }

    async fn get(&self, identity: &ResourceIdentity) -> ProviderResult<NetworkSecurityGroupWire> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.get_failure.lock().unwrap().clone() {
            return Err(err);
        }
        self.groups
            .lock()
            .unwrap()
            .get(&key(identity))
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(identity.name.clone()))
    }

    async fn create_or_update(
        &self,
        identity: &ResourceIdentity,
        model: &NetworkSecurityGroupWire,
    ) -> ProviderResult<NetworkSecurityGroupWire> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.create_failure.lock().unwrap().clone() {
            return Err(err);
        }
        *self.last_sent.lock().unwrap() = Some(model.clone());
        let generation = self.create_calls.load(Ordering::SeqCst) as u32 + 1;
        let stored = normalize(model.clone(), generation);
        self.groups
            .lock()
            .unwrap()
            .insert(key(identity), stored.clone());
        // ARM answers the PUT with a provisioning body, not the final state
        let mut accepted = model.clone();
        accepted.properties.provisioning_state = Some("Updating".to_string());
        Ok(accepted)
    }
}

#[async_trait]
impl ListProvider<ExtensionTypeQuery> for FakeArm {
    type Item = VirtualMachineImageResource;

    async fn list(&self, query: &ExtensionTypeQuery) -> ProviderResult<Vec<Self::Item>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .catalog
            .iter()
            .filter(|r| r.location == query.location)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ListProvider<ResourceGroupQuery> for FakeArm {
    type Item = NetworkSecurityGroupWire;

    async fn list(&self, query: &ResourceGroupQuery) -> ProviderResult<Vec<Self::Item>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let prefix = format!("{}/", query.resource_group.to_lowercase());
        let mut items: Vec<_> = self
            .groups
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| k.starts_with(&prefix))
            .map(|(_, v)| v.clone())
            .collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }
}

/// Confirmation channel with a fixed answer that records every prompt
pub struct ScriptedChannel {
    answer: bool,
    pub prompts: AtomicUsize,
    pub messages: Mutex<Vec<String>>,
}

impl ScriptedChannel {
    pub fn accepting() -> Self {
        Self::answering(true)
    }

    pub fn declining() -> Self {
        Self::answering(false)
    }

    fn answering(answer: bool) -> Self {
        Self {
            answer,
            prompts: AtomicUsize::new(0),
            messages: Mutex::new(Vec::new()),
        }
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConfirmationChannel for ScriptedChannel {
    async fn prompt(&self, message: &str, _resource_name: &str) -> armctl_cloud::Result<bool> {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        self.messages.lock().unwrap().push(message.to_string());
        Ok(self.answer)
    }
}
