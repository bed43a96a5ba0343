//! Translation between the domain model and the provider wire schema
//!
//! Every resource type gets an explicit [`WireMapped`] impl. `to_wire` is
//! where caller input is validated: it runs before any network call, so a
//! bad tag or a priority clash never reaches the provider.

use crate::error::{CloudError, ValidationError};
use crate::model::{
    Access, Direction, NetworkSecurityGroup, Protocol, ResourceIdentity, Scope, SecurityRule, Tag,
    TagSet,
};
use crate::wire::{
    NetworkSecurityGroupProperties, NetworkSecurityGroupWire, SecurityRuleProperties,
    SecurityRuleWire,
};
use std::collections::{HashMap, HashSet};

pub const MAX_TAG_NAME_LEN: usize = 512;
pub const MAX_TAG_VALUE_LEN: usize = 256;
pub const MAX_TAGS: usize = 50;

pub const MIN_RULE_PRIORITY: u32 = 100;
pub const MAX_RULE_PRIORITY: u32 = 4096;

/// A domain type with an explicit mapping to its wire schema
pub trait WireMapped: Sized {
    type Wire;

    /// Resource type used in messages and logs, e.g. "network security group"
    const RESOURCE_TYPE: &'static str;

    fn identity(&self) -> &ResourceIdentity;

    /// Validate and translate into the provider schema. Pure.
    fn to_wire(&self) -> Result<Self::Wire, ValidationError>;

    /// Translate a provider response back into the domain model
    fn from_wire(wire: Self::Wire) -> Result<Self, CloudError>;
}

/// Build the tag dictionary sent to the provider
///
/// Tag names are compared case-insensitively, as the provider does, and are
/// sent exactly as given. Surrounding whitespace is rejected rather than
/// trimmed so the stored name never differs from the requested one.
pub fn tags_to_wire(tags: &TagSet) -> Result<HashMap<String, String>, ValidationError> {
    if tags.len() > MAX_TAGS {
        return Err(ValidationError::TooManyTags {
            count: tags.len(),
            max: MAX_TAGS,
        });
    }

    let mut seen = HashSet::with_capacity(tags.len());
    let mut out = HashMap::with_capacity(tags.len());
    for tag in tags.iter() {
        let name = tag.name.as_str();
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyTagName);
        }
        if name.trim() != name {
            return Err(ValidationError::TagNameWhitespace(name.to_string()));
        }
        let name_len = name.chars().count();
        if name_len > MAX_TAG_NAME_LEN {
            return Err(ValidationError::TagNameTooLong {
                name: truncate(name),
                len: name_len,
                max: MAX_TAG_NAME_LEN,
            });
        }
        let value_len = tag.value.chars().count();
        if value_len > MAX_TAG_VALUE_LEN {
            return Err(ValidationError::TagValueTooLong {
                name: name.to_string(),
                len: value_len,
                max: MAX_TAG_VALUE_LEN,
            });
        }
        if !seen.insert(name.to_lowercase()) {
            return Err(ValidationError::DuplicateTag(name.to_string()));
        }
        out.insert(name.to_string(), tag.value.clone());
    }
    Ok(out)
}

pub fn tags_from_wire(tags: HashMap<String, String>) -> TagSet {
    let mut tags: Vec<Tag> = tags.into_iter().map(|(k, v)| Tag::new(k, v)).collect();
    tags.sort_by(|a, b| a.name.cmp(&b.name));
    tags.into_iter().collect()
}

fn truncate(s: &str) -> String {
    let head: String = s.chars().take(32).collect();
    format!("{head}...")
}

/// Validate rule names and priorities, preserving caller order
pub fn rules_to_wire(rules: &[SecurityRule]) -> Result<Vec<SecurityRuleWire>, ValidationError> {
    let mut by_priority: HashMap<u32, &str> = HashMap::with_capacity(rules.len());
    let mut names = HashSet::with_capacity(rules.len());

    for rule in rules {
        if rule.name.trim().is_empty() {
            return Err(ValidationError::EmptyRuleName);
        }
        if !names.insert(rule.name.to_lowercase()) {
            return Err(ValidationError::DuplicateRuleName(rule.name.clone()));
        }
        if !(MIN_RULE_PRIORITY..=MAX_RULE_PRIORITY).contains(&rule.priority) {
            return Err(ValidationError::PriorityOutOfRange {
                rule: rule.name.clone(),
                priority: rule.priority,
                min: MIN_RULE_PRIORITY,
                max: MAX_RULE_PRIORITY,
            });
        }
        if let Some(first) = by_priority.insert(rule.priority, &rule.name) {
            return Err(ValidationError::DuplicatePriority {
                priority: rule.priority,
                first: first.to_string(),
                second: rule.name.clone(),
            });
        }
    }

    rules.iter().map(rule_to_wire).collect()
}

fn rule_to_wire(rule: &SecurityRule) -> Result<SecurityRuleWire, ValidationError> {
    let (source_address_prefix, source_address_prefixes) = field_to_wire(
        rule,
        "source address prefix",
        &rule.source_address_prefix,
        &rule.source_address_prefixes,
    )?;
    let (source_port_range, source_port_ranges) = field_to_wire(
        rule,
        "source port range",
        &rule.source_port_range,
        &rule.source_port_ranges,
    )?;
    let (destination_address_prefix, destination_address_prefixes) = field_to_wire(
        rule,
        "destination address prefix",
        &rule.destination_address_prefix,
        &rule.destination_address_prefixes,
    )?;
    let (destination_port_range, destination_port_ranges) = field_to_wire(
        rule,
        "destination port range",
        &rule.destination_port_range,
        &rule.destination_port_ranges,
    )?;

    Ok(SecurityRuleWire {
        id: None,
        name: rule.name.clone(),
        etag: None,
        properties: SecurityRuleProperties {
            description: rule.description.clone(),
            protocol: rule.protocol.to_string(),
            source_port_range,
            source_port_ranges,
            destination_port_range,
            destination_port_ranges,
            source_address_prefix,
            source_address_prefixes,
            destination_address_prefix,
            destination_address_prefixes,
            access: rule.access.to_string(),
            // priority is range-checked before this point
            priority: rule.priority as i32,
            direction: rule.direction.to_string(),
            provisioning_state: None,
        },
    })
}

/// Pick the single or list form of a prefix/range field; the provider
/// rejects a rule that carries both.
fn field_to_wire(
    rule: &SecurityRule,
    field: &'static str,
    single: &str,
    list: &[String],
) -> Result<(Option<String>, Vec<String>), ValidationError> {
    if list.is_empty() {
        if single.trim().is_empty() {
            return Err(ValidationError::Empty { field });
        }
        return Ok((Some(single.to_string()), Vec::new()));
    }
    if !single.is_empty() && single != "*" {
        return Err(ValidationError::ConflictingRuleField {
            rule: rule.name.clone(),
            field,
        });
    }
    Ok((None, list.to_vec()))
}

/// `*` only when the provider sent neither form
fn field_from_wire(single: Option<String>, list: Vec<String>) -> (String, Vec<String>) {
    match single {
        Some(single) => (single, list),
        None if list.is_empty() => ("*".to_string(), list),
        None => (String::new(), list),
    }
}

fn rule_from_wire(wire: SecurityRuleWire) -> Result<SecurityRule, String> {
    let p = wire.properties;
    let priority = u32::try_from(p.priority)
        .map_err(|_| format!("rule '{}' has negative priority {}", wire.name, p.priority))?;
    let (source_address_prefix, source_address_prefixes) =
        field_from_wire(p.source_address_prefix, p.source_address_prefixes);
    let (source_port_range, source_port_ranges) =
        field_from_wire(p.source_port_range, p.source_port_ranges);
    let (destination_address_prefix, destination_address_prefixes) =
        field_from_wire(p.destination_address_prefix, p.destination_address_prefixes);
    let (destination_port_range, destination_port_ranges) =
        field_from_wire(p.destination_port_range, p.destination_port_ranges);
    Ok(SecurityRule {
        protocol: parse_protocol(&p.protocol)
            .ok_or_else(|| format!("rule '{}' has unknown protocol '{}'", wire.name, p.protocol))?,
        direction: parse_direction(&p.direction).ok_or_else(|| {
            format!("rule '{}' has unknown direction '{}'", wire.name, p.direction)
        })?,
        access: parse_access(&p.access)
            .ok_or_else(|| format!("rule '{}' has unknown access '{}'", wire.name, p.access))?,
        name: wire.name,
        description: p.description,
        priority,
        source_address_prefix,
        source_address_prefixes,
        source_port_range,
        source_port_ranges,
        destination_address_prefix,
        destination_address_prefixes,
        destination_port_range,
        destination_port_ranges,
    })
}

fn rules_from_wire(rules: Vec<SecurityRuleWire>) -> Result<Vec<SecurityRule>, String> {
    let mut rules = rules
        .into_iter()
        .map(rule_from_wire)
        .collect::<Result<Vec<_>, _>>()?;
    rules.sort_by_key(|r| r.priority);
    Ok(rules)
}

fn parse_protocol(s: &str) -> Option<Protocol> {
    match s.to_ascii_lowercase().as_str() {
        "tcp" => Some(Protocol::Tcp),
        "udp" => Some(Protocol::Udp),
        "icmp" => Some(Protocol::Icmp),
        "esp" => Some(Protocol::Esp),
        "ah" => Some(Protocol::Ah),
        "*" | "any" => Some(Protocol::Any),
        _ => None,
    }
}

fn parse_direction(s: &str) -> Option<Direction> {
    match s.to_ascii_lowercase().as_str() {
        "inbound" => Some(Direction::Inbound),
        "outbound" => Some(Direction::Outbound),
        _ => None,
    }
}

fn parse_access(s: &str) -> Option<Access> {
    match s.to_ascii_lowercase().as_str() {
        "allow" => Some(Access::Allow),
        "deny" => Some(Access::Deny),
        _ => None,
    }
}

/// `/subscriptions/{s}/resourceGroups/{rg}/providers/{provider_type}/{name}`
pub fn resource_id(identity: &ResourceIdentity, provider_type: &str) -> String {
    format!(
        "/subscriptions/{}/resourceGroups/{}/providers/{}/{}",
        identity.scope.subscription_id, identity.scope.resource_group, provider_type, identity.name
    )
}

/// Split a resource id into `(subscription, resource group)`
///
/// Segment names are matched case-insensitively; ARM is not consistent about
/// `resourceGroups` vs `resourcegroups` in returned ids.
pub fn parse_resource_id(id: &str) -> Option<(String, String)> {
    let segments: Vec<&str> = id.split('/').filter(|s| !s.is_empty()).collect();
    let mut subscription = None;
    let mut group = None;
    for pair in segments.windows(2) {
        if pair[0].eq_ignore_ascii_case("subscriptions") && subscription.is_none() {
            subscription = Some(pair[1].to_string());
        } else if pair[0].eq_ignore_ascii_case("resourceGroups") && group.is_none() {
            group = Some(pair[1].to_string());
        }
    }
    Some((subscription?, group?))
}

pub const NSG_PROVIDER_TYPE: &str = "Microsoft.Network/networkSecurityGroups";

impl WireMapped for NetworkSecurityGroup {
    type Wire = NetworkSecurityGroupWire;

    const RESOURCE_TYPE: &'static str = "network security group";

    fn identity(&self) -> &ResourceIdentity {
        &self.identity
    }

    fn to_wire(&self) -> Result<NetworkSecurityGroupWire, ValidationError> {
        self.identity.validate()?;
        let tags = tags_to_wire(&self.tags)?;
        let security_rules = rules_to_wire(&self.security_rules)?;

        Ok(NetworkSecurityGroupWire {
            id: Some(resource_id(&self.identity, NSG_PROVIDER_TYPE)),
            name: Some(self.identity.name.clone()),
            resource_type: None,
            location: self.identity.scope.location.clone(),
            etag: None,
            tags,
            properties: NetworkSecurityGroupProperties {
                security_rules,
                ..Default::default()
            },
        })
    }

    fn from_wire(wire: NetworkSecurityGroupWire) -> Result<Self, CloudError> {
        let malformed = |msg: String| CloudError::malformed(Self::RESOURCE_TYPE, msg);

        let id = wire
            .id
            .ok_or_else(|| malformed("response has no resource id".to_string()))?;
        let (subscription_id, resource_group) =
            parse_resource_id(&id).ok_or_else(|| malformed(format!("unparseable resource id '{id}'")))?;
        let name = match wire.name {
            Some(name) => name,
            None => id
                .rsplit('/')
                .next()
                .unwrap_or_default()
                .to_string(),
        };
        let identity = ResourceIdentity::new(
            Scope::new(subscription_id, resource_group, wire.location),
            name,
        )
        .map_err(|e| malformed(e.to_string()))?;

        let props = wire.properties;
        Ok(NetworkSecurityGroup {
            identity,
            security_rules: rules_from_wire(props.security_rules).map_err(malformed)?,
            tags: tags_from_wire(wire.tags),
            id: Some(id),
            etag: wire.etag,
            provisioning_state: props.provisioning_state,
            default_security_rules: rules_from_wire(props.default_security_rules)
                .map_err(malformed)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(name: &str) -> ResourceIdentity {
        ResourceIdentity::new(Scope::new("sub-1", "rg1", "westus"), name).unwrap()
    }

    fn sample() -> NetworkSecurityGroup {
        NetworkSecurityGroup::new(identity("nsg1"))
            .with_rules(vec![
                SecurityRule::new("allow-https", 200, Direction::Inbound, Access::Allow)
                    .protocol(Protocol::Tcp)
                    .destination_port_range("443"),
                SecurityRule::new("allow-ssh", 100, Direction::Inbound, Access::Allow)
                    .protocol(Protocol::Tcp)
                    .destination_port_range("22")
                    .source_address_prefix("10.0.0.0/8")
                    .description("ops"),
                SecurityRule::new("deny-out", 4096, Direction::Outbound, Access::Deny),
            ])
            .with_tags(TagSet::new().with("env", "prod").with("owner", "netops"))
    }

    #[test]
    fn test_round_trip_preserves_identity_rules_and_tags() {
        let nsg = sample();
        let wire = nsg.to_wire().unwrap();
        let back = NetworkSecurityGroup::from_wire(wire).unwrap();

        assert_eq!(back.identity, nsg.identity);
        assert_eq!(back.tags.as_map(), nsg.tags.as_map());

        let mut expected = nsg.security_rules.clone();
        expected.sort_by_key(|r| r.priority);
        assert_eq!(back.security_rules, expected);
    }

    #[test]
    fn test_to_wire_preserves_rule_order() {
        let wire = sample().to_wire().unwrap();
        let names: Vec<_> = wire
            .properties
            .security_rules
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(names, vec!["allow-https", "allow-ssh", "deny-out"]);
        assert_eq!(
            wire.id.as_deref(),
            Some(
                "/subscriptions/sub-1/resourceGroups/rg1/providers/Microsoft.Network/networkSecurityGroups/nsg1"
            )
        );
        assert_eq!(wire.properties.security_rules[2].properties.protocol, "*");
    }

    #[test]
    fn test_duplicate_tag_rejected() {
        let nsg = sample().with_tags(TagSet::new().with("env", "prod").with("Env", "dev"));
        assert_eq!(
            nsg.to_wire().unwrap_err(),
            ValidationError::DuplicateTag("Env".to_string())
        );
    }

    #[test]
    fn test_tag_length_limits() {
        let long_name = "n".repeat(MAX_TAG_NAME_LEN + 1);
        let err = tags_to_wire(&TagSet::new().with(long_name, "v")).unwrap_err();
        assert!(matches!(err, ValidationError::TagNameTooLong { len, .. } if len == 513));

        let long_value = "v".repeat(MAX_TAG_VALUE_LEN + 1);
        let err = tags_to_wire(&TagSet::new().with("k", long_value)).unwrap_err();
        assert!(matches!(err, ValidationError::TagValueTooLong { ref name, .. } if name == "k"));

        let at_limit = TagSet::new().with("k".repeat(MAX_TAG_NAME_LEN), "v".repeat(MAX_TAG_VALUE_LEN));
        assert!(tags_to_wire(&at_limit).is_ok());
    }

    #[test]
    fn test_too_many_tags() {
        let tags: TagSet = (0..=MAX_TAGS)
            .map(|i| Tag::new(format!("k{i}"), "v"))
            .collect();
        assert_eq!(
            tags_to_wire(&tags).unwrap_err(),
            ValidationError::TooManyTags {
                count: MAX_TAGS + 1,
                max: MAX_TAGS
            }
        );
    }

    #[test]
    fn test_empty_tag_name() {
        let tags = TagSet::new().with(" ", "v");
        assert_eq!(tags_to_wire(&tags).unwrap_err(), ValidationError::EmptyTagName);
    }

    #[test]
    fn test_duplicate_priority_names_both_rules() {
        let rules = vec![
            SecurityRule::new("a", 300, Direction::Inbound, Access::Allow),
            SecurityRule::new("b", 300, Direction::Outbound, Access::Deny),
        ];
        let err = rules_to_wire(&rules).unwrap_err();
        assert_eq!(
            err,
            ValidationError::DuplicatePriority {
                priority: 300,
                first: "a".to_string(),
                second: "b".to_string(),
            }
        );
        assert!(err.to_string().contains("300"));
    }

    #[test]
    fn test_priority_range() {
        let rules = vec![SecurityRule::new("low", 99, Direction::Inbound, Access::Allow)];
        assert!(matches!(
            rules_to_wire(&rules).unwrap_err(),
            ValidationError::PriorityOutOfRange { priority: 99, .. }
        ));
    }

    #[test]
    fn test_duplicate_rule_name() {
        let rules = vec![
            SecurityRule::new("web", 100, Direction::Inbound, Access::Allow),
            SecurityRule::new("WEB", 110, Direction::Inbound, Access::Allow),
        ];
        assert_eq!(
            rules_to_wire(&rules).unwrap_err(),
            ValidationError::DuplicateRuleName("WEB".to_string())
        );
    }

    #[test]
    fn test_parse_resource_id() {
        assert_eq!(
            parse_resource_id(
                "/subscriptions/sub-1/resourcegroups/RG1/providers/Microsoft.Network/networkSecurityGroups/nsg1"
            ),
            Some(("sub-1".to_string(), "RG1".to_string()))
        );
        assert_eq!(parse_resource_id("/providers/Microsoft.Compute"), None);
    }

    #[test]
    fn test_from_wire_rejects_unknown_enum() {
        let mut wire = sample().to_wire().unwrap();
        wire.properties.security_rules[0].properties.access = "Maybe".to_string();
        let err = NetworkSecurityGroup::from_wire(wire).unwrap_err();
        assert!(matches!(err, CloudError::MalformedResponse { .. }));
        assert!(err.to_string().contains("Maybe"));
    }

    #[test]
    fn test_from_wire_requires_id() {
        let mut wire = sample().to_wire().unwrap();
        wire.id = None;
        assert!(matches!(
            NetworkSecurityGroup::from_wire(wire),
            Err(CloudError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn test_from_wire_keeps_server_fields() {
        let mut wire = sample().to_wire().unwrap();
        wire.etag = Some("W/\"1\"".to_string());
        wire.properties.provisioning_state = Some("Succeeded".to_string());
        wire.properties.default_security_rules = vec![SecurityRuleWire {
            name: "AllowVnetInBound".to_string(),
            properties: SecurityRuleProperties {
                protocol: "*".to_string(),
                access: "Allow".to_string(),
                priority: 65000,
                direction: "Inbound".to_string(),
                source_address_prefix: Some("VirtualNetwork".to_string()),
                ..Default::default()
            },
            ..Default::default()
        }];

        let nsg = NetworkSecurityGroup::from_wire(wire).unwrap();
        assert_eq!(nsg.provisioning_state.as_deref(), Some("Succeeded"));
        assert_eq!(nsg.default_security_rules.len(), 1);
        assert_eq!(nsg.default_security_rules[0].priority, 65000);
        assert_eq!(nsg.default_security_rules[0].destination_port_range, "*");
    }

    #[test]
    fn test_tag_name_with_surrounding_whitespace_rejected() {
        for name in ["env ", " env", "\tenv"] {
            assert_eq!(
                tags_to_wire(&TagSet::new().with(name, "prod")).unwrap_err(),
                ValidationError::TagNameWhitespace(name.to_string())
            );
        }
        let inner = tags_to_wire(&TagSet::new().with("cost center", "42")).unwrap();
        assert_eq!(inner.get("cost center").map(String::as_str), Some("42"));
    }

    #[test]
    fn test_from_wire_carries_prefix_and_range_lists() {
        let mut wire = sample().to_wire().unwrap();
        let props = &mut wire.properties.security_rules[0].properties;
        props.source_address_prefix = None;
        props.source_address_prefixes = vec!["10.0.0.0/8".to_string()];
        props.destination_port_range = None;
        props.destination_port_ranges = vec!["22".to_string(), "443".to_string()];

        let nsg = NetworkSecurityGroup::from_wire(wire).unwrap();
        let rule = nsg
            .security_rules
            .iter()
            .find(|r| r.name == "allow-https")
            .unwrap();
        assert_eq!(rule.source_address_prefixes, vec!["10.0.0.0/8"]);
        assert_eq!(rule.destination_port_ranges, vec!["22", "443"]);
        assert_ne!(rule.source_address_prefix, "*");
        assert_ne!(rule.destination_port_range, "*");
        assert_eq!(rule.source_port_range, "*");
    }

    #[test]
    fn test_list_fields_sent_in_list_form() {
        let nsg = sample().with_rules(vec![
            SecurityRule::new("web", 100, Direction::Inbound, Access::Allow)
                .protocol(Protocol::Tcp)
                .source_address_prefixes(["10.0.0.0/8", "192.168.0.0/16"])
                .destination_port_ranges(["80", "443"]),
        ]);
        let wire = nsg.to_wire().unwrap();
        let props = &wire.properties.security_rules[0].properties;
        assert!(props.source_address_prefix.is_none());
        assert_eq!(props.source_address_prefixes.len(), 2);
        assert!(props.destination_port_range.is_none());
        assert_eq!(props.destination_port_ranges, vec!["80", "443"]);
        assert_eq!(props.source_port_range.as_deref(), Some("*"));

        let back = NetworkSecurityGroup::from_wire(wire).unwrap();
        assert_eq!(back.security_rules, nsg.security_rules);
    }

    #[test]
    fn test_single_and_list_form_conflict() {
        let mut rule = SecurityRule::new("web", 100, Direction::Inbound, Access::Allow)
            .destination_port_ranges(["80", "443"]);
        rule.destination_port_range = "8080".to_string();
        assert_eq!(
            rules_to_wire(&[rule]).unwrap_err(),
            ValidationError::ConflictingRuleField {
                rule: "web".to_string(),
                field: "destination port range",
            }
        );
    }

    #[test]
    fn test_from_wire_parses_ipsec_protocols() {
        let mut wire = sample().to_wire().unwrap();
        wire.properties.security_rules[0].properties.protocol = "Esp".to_string();
        wire.properties.security_rules[1].properties.protocol = "ah".to_string();

        let nsg = NetworkSecurityGroup::from_wire(wire).unwrap();
        let protocol = |name: &str| {
            nsg.security_rules
                .iter()
                .find(|r| r.name == name)
                .map(|r| r.protocol)
        };
        assert_eq!(protocol("allow-https"), Some(Protocol::Esp));
        assert_eq!(protocol("allow-ssh"), Some(Protocol::Ah));

        let resent = nsg.to_wire().unwrap();
        let sent: Vec<_> = resent
            .properties
            .security_rules
            .iter()
            .map(|r| r.properties.protocol.as_str())
            .collect();
        assert!(sent.contains(&"Esp"));
        assert!(sent.contains(&"Ah"));
    }
}
