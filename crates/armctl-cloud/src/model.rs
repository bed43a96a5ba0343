//! Domain model
//!
//! In-process representation of resources, independent of the wire schema.
//! Instances are built fresh per command invocation and never persisted.

use crate::error::ValidationError;
use crate::wire::VirtualMachineImageResource;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Where a resource lives in the provider's hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    pub subscription_id: String,
    pub resource_group: String,
    pub location: String,
}

impl Scope {
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group: resource_group.into(),
            location: location.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        non_empty("subscription id", &self.subscription_id)?;
        non_empty("resource group", &self.resource_group)?;
        non_empty("location", &self.location)?;
        Ok(())
    }
}

/// `(scope, name)` identity of a resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceIdentity {
    pub scope: Scope,
    pub name: String,
}

impl ResourceIdentity {
    pub fn new(scope: Scope, name: impl Into<String>) -> Result<Self, ValidationError> {
        let identity = Self {
            scope,
            name: name.into(),
        };
        identity.validate()?;
        Ok(identity)
    }

    /// Address of an existing resource whose location is not known yet.
    /// Only valid for reads; the provider response carries the location.
    pub fn lookup(
        subscription_id: impl Into<String>,
        resource_group: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let identity = Self {
            scope: Scope::new(subscription_id, resource_group, ""),
            name: name.into(),
        };
        non_empty("name", &identity.name)?;
        non_empty("subscription id", &identity.scope.subscription_id)?;
        non_empty("resource group", &identity.scope.resource_group)?;
        Ok(identity)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        non_empty("name", &self.name)?;
        self.scope.validate()
    }

    pub fn resource_group(&self) -> &str {
        &self.scope.resource_group
    }

    pub fn location(&self) -> &str {
        &self.scope.location
    }
}

impl fmt::Display for ResourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' (resource group '{}')", self.name, self.scope.resource_group)
    }
}

fn non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty { field });
    }
    Ok(())
}

/// A single resource tag
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub value: String,
}

impl Tag {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Tags as supplied by the caller
///
/// May hold duplicates until the mapper validates it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagSet(Vec<Tag>);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, tag: Tag) {
        self.0.push(tag);
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(Tag::new(name, value));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
            .map(|t| t.value.as_str())
    }

    /// Order-insensitive view used for comparisons
    pub fn as_map(&self) -> HashMap<String, String> {
        self.0
            .iter()
            .map(|t| (t.name.clone(), t.value.clone()))
            .collect()
    }
}

impl FromIterator<Tag> for TagSet {
    fn from_iter<I: IntoIterator<Item = Tag>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Inbound,
    Outbound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    Tcp,
    Udp,
    Icmp,
    Esp,
    Ah,
    #[serde(rename = "*", alias = "Any")]
    Any,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Access {
    Allow,
    Deny,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Inbound => write!(f, "Inbound"),
            Direction::Outbound => write!(f, "Outbound"),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Tcp => write!(f, "Tcp"),
            Protocol::Udp => write!(f, "Udp"),
            Protocol::Icmp => write!(f, "Icmp"),
            Protocol::Esp => write!(f, "Esp"),
            Protocol::Ah => write!(f, "Ah"),
            Protocol::Any => write!(f, "*"),
        }
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::Allow => write!(f, "Allow"),
            Access::Deny => write!(f, "Deny"),
        }
    }
}

fn any() -> String {
    "*".to_string()
}

/// Security rule of a network security group
///
/// Each address prefix and port range has a single form and a list form.
/// A non-empty list takes the place of the single value, which is then
/// left empty (or at its `*` default when read from a rules file).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityRule {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Evaluation order, unique within the group
    pub priority: u32,
    pub direction: Direction,
    #[serde(default = "default_protocol")]
    pub protocol: Protocol,
    #[serde(default = "any")]
    pub source_address_prefix: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_address_prefixes: Vec<String>,
    #[serde(default = "any")]
    pub source_port_range: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_port_ranges: Vec<String>,
    #[serde(default = "any")]
    pub destination_address_prefix: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub destination_address_prefixes: Vec<String>,
    #[serde(default = "any")]
    pub destination_port_range: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub destination_port_ranges: Vec<String>,
    pub access: Access,
}

fn default_protocol() -> Protocol {
    Protocol::Any
}

impl SecurityRule {
    /// Rule matching everything in `direction`; narrow it with the builder methods
    pub fn new(name: impl Into<String>, priority: u32, direction: Direction, access: Access) -> Self {
        Self {
            name: name.into(),
            description: None,
            priority,
            direction,
            protocol: Protocol::Any,
            source_address_prefix: any(),
            source_address_prefixes: Vec::new(),
            source_port_range: any(),
            source_port_ranges: Vec::new(),
            destination_address_prefix: any(),
            destination_address_prefixes: Vec::new(),
            destination_port_range: any(),
            destination_port_ranges: Vec::new(),
            access,
        }
    }

    pub fn protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn destination_port_range(mut self, range: impl Into<String>) -> Self {
        self.destination_port_range = range.into();
        self
    }

    pub fn destination_port_ranges<I, S>(mut self, ranges: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.destination_port_range.clear();
        self.destination_port_ranges = ranges.into_iter().map(Into::into).collect();
        self
    }

    pub fn source_address_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.source_address_prefix = prefix.into();
        self
    }

    pub fn source_address_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.source_address_prefix.clear();
        self.source_address_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Network security group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkSecurityGroup {
    #[serde(flatten)]
    pub identity: ResourceIdentity,
    pub security_rules: Vec<SecurityRule>,
    pub tags: TagSet,

    /// Full resource id, populated by the provider
    pub id: Option<String>,
    pub etag: Option<String>,
    pub provisioning_state: Option<String>,
    pub default_security_rules: Vec<SecurityRule>,
}

impl NetworkSecurityGroup {
    pub fn new(identity: ResourceIdentity) -> Self {
        Self {
            identity,
            security_rules: Vec::new(),
            tags: TagSet::new(),
            id: None,
            etag: None,
            provisioning_state: None,
            default_security_rules: Vec::new(),
        }
    }

    pub fn with_rules(mut self, rules: Vec<SecurityRule>) -> Self {
        self.security_rules = rules;
        self
    }

    pub fn with_tags(mut self, tags: TagSet) -> Self {
        self.tags = tags;
        self
    }

    pub fn name(&self) -> &str {
        &self.identity.name
    }
}

/// Extension type published in a location; the catalog form is canonical
pub type ExtensionImageType = VirtualMachineImageResource;

/// Published version of an extension type
pub type ExtensionImageVersion = VirtualMachineImageResource;
