use crate::output;
use crate::prompt::StdinConfirmation;
use crate::{NsgCommands, Session};
use anyhow::Context;
use armctl_cloud::{
    NetworkSecurityGroup, Reader, ResourceGroupQuery, ResourceIdentity, Scope, SecurityRule, Tag,
    TagSet, Upsert,
};
use armctl_cloud_azure::NetworkSecurityGroupClient;
use colored::Colorize;
use serde::Deserialize;
use std::path::Path;

pub async fn handle(session: &Session, cmd: NsgCommands) -> anyhow::Result<()> {
    let client = NetworkSecurityGroupClient::new(session.arm.clone());

    match cmd {
        NsgCommands::New {
            name,
            resource_group,
            location,
            rules_file,
            tags,
            force,
        } => {
            let location = location
                .or_else(|| session.settings.default_location.clone())
                .context("--location is required (or set default_location in armctl.yaml)")?;
            let identity = ResourceIdentity::new(
                Scope::new(session.subscription_id(), resource_group, location),
                name,
            )?;
            let rules = match rules_file {
                Some(path) => load_rules(&path)?,
                None => Vec::new(),
            };
            let desired = NetworkSecurityGroup::new(identity.clone())
                .with_rules(rules)
                .with_tags(tag_set(tags));

            if session.output == output::OutputFormat::Table {
                println!(
                    "{} network security group {}...",
                    "Applying".blue(),
                    identity
                );
            }
            let outcome = Upsert::new(&session.ctx, &client, &StdinConfirmation)
                .run(&desired, force)
                .await?;
            output::print_upsert(&identity, &outcome, session.output)
        }
        NsgCommands::Get {
            name,
            resource_group,
        } => {
            let identity =
                ResourceIdentity::lookup(session.subscription_id(), resource_group, name)?;
            let nsg: NetworkSecurityGroup =
                Reader::new(&session.ctx).get(&client, &identity).await?;
            output::print_network_security_group(&nsg, session.output)
        }
        NsgCommands::List { resource_group } => {
            let query = ResourceGroupQuery {
                subscription_id: session.subscription_id().to_string(),
                resource_group,
            };
            let groups: Vec<NetworkSecurityGroup> = Reader::new(&session.ctx)
                .list_mapped(&client, &query)
                .await?;
            output::print_network_security_groups(&groups, session.output)
        }
    }
}

/// `--tag KEY=VALUE`
pub fn parse_tag(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid tag '{s}': expected KEY=VALUE"))?;
    Ok((key.to_string(), value.to_string()))
}

// Duplicates are kept so validation reports them instead of silently dropping one
fn tag_set(tags: Vec<(String, String)>) -> TagSet {
    tags.into_iter()
        .map(|(name, value)| Tag::new(name, value))
        .collect()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RulesFile {
    List(Vec<SecurityRule>),
    Wrapped { security_rules: Vec<SecurityRule> },
}

/// Read security rules from YAML (or JSON, by extension)
fn load_rules(path: &Path) -> anyhow::Result<Vec<SecurityRule>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read rules file {}", path.display()))?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let parsed: RulesFile = if is_json {
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse rules file {}", path.display()))?
    } else {
        serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse rules file {}", path.display()))?
    };

    Ok(match parsed {
        RulesFile::List(rules) => rules,
        RulesFile::Wrapped { security_rules } => security_rules,
    })
}
