//! Terminal and JSON rendering

use armctl_cloud::{
    NetworkSecurityGroup, ResourceIdentity, SecurityRule, UpsertAction, UpsertOutcome,
    VirtualMachineImageResource,
};
use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Serialize)]
struct UpsertReport<'a> {
    action: UpsertAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    resource: Option<&'a NetworkSecurityGroup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    prior: Option<&'a NetworkSecurityGroup>,
}

pub fn print_upsert(
    identity: &ResourceIdentity,
    outcome: &UpsertOutcome<NetworkSecurityGroup>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        let prior = match outcome {
            UpsertOutcome::Skipped { prior } => prior.as_ref(),
            UpsertOutcome::Applied { .. } => None,
        };
        return print_json(&UpsertReport {
            action: outcome.action(),
            resource: outcome.resource(),
            prior,
        });
    }

    match outcome {
        UpsertOutcome::Applied { resource, .. } => {
            println!(
                "{} {} {}",
                "✓".green(),
                outcome.action().to_string().green().bold(),
                identity
            );
            println!();
            print_group(resource);
        }
        UpsertOutcome::Skipped { .. } => {
            println!(
                "{} {} {} already exists and was left unchanged",
                "⚠".yellow(),
                "skipped".yellow().bold(),
                identity
            );
        }
    }
    Ok(())
}

pub fn print_network_security_group(
    nsg: &NetworkSecurityGroup,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(nsg),
        OutputFormat::Table => {
            print_group(nsg);
            Ok(())
        }
    }
}

fn print_group(nsg: &NetworkSecurityGroup) {
    println!("{:<20} {}", "Name:".bold(), nsg.name().cyan());
    println!("{:<20} {}", "Resource group:".bold(), nsg.identity.resource_group());
    println!("{:<20} {}", "Location:".bold(), nsg.identity.location());
    if let Some(state) = &nsg.provisioning_state {
        let state = if state == "Succeeded" {
            state.green()
        } else {
            state.yellow()
        };
        println!("{:<20} {}", "Provisioning:".bold(), state);
    }
    if !nsg.tags.is_empty() {
        let tags: Vec<String> = nsg
            .tags
            .iter()
            .map(|t| format!("{}={}", t.name, t.value))
            .collect();
        println!("{:<20} {}", "Tags:".bold(), tags.join(", "));
    }

    println!();
    print_rules(&nsg.security_rules);
    if !nsg.default_security_rules.is_empty() {
        println!();
        println!("{}", "Default rules".dimmed());
        print_rules(&nsg.default_security_rules);
    }
}

fn print_rules(rules: &[SecurityRule]) {
    if rules.is_empty() {
        println!("{}", "No security rules".dimmed());
        return;
    }

    println!(
        "{}",
        format!(
            "{:<28} {:>8} {:<9} {:<6} {:<6} {:<20} {:<20}",
            "RULE", "PRIORITY", "DIRECTION", "ACCESS", "PROTO", "SOURCE", "DESTINATION"
        )
        .bold()
    );
    println!("{}", "─".repeat(103).dimmed());

    for rule in rules {
        let access = match rule.access {
            armctl_cloud::Access::Allow => "Allow".green(),
            armctl_cloud::Access::Deny => "Deny".red(),
        };
        println!(
            "{:<28} {:>8} {:<9} {:<6} {:<6} {:<20} {:<20}",
            rule.name.cyan(),
            rule.priority,
            rule.direction.to_string(),
            access,
            rule.protocol.to_string(),
            endpoint(
                &rule.source_address_prefix,
                &rule.source_address_prefixes,
                &rule.source_port_range,
                &rule.source_port_ranges,
            ),
            endpoint(
                &rule.destination_address_prefix,
                &rule.destination_address_prefixes,
                &rule.destination_port_range,
                &rule.destination_port_ranges,
            ),
        );
    }
}

/// `prefix:range`, with list forms comma-joined
fn endpoint(prefix: &str, prefixes: &[String], range: &str, ranges: &[String]) -> String {
    let pick = |single: &str, list: &[String]| {
        if list.is_empty() {
            single.to_string()
        } else {
            list.join(",")
        }
    };
    format!("{}:{}", pick(prefix, prefixes), pick(range, ranges))
}

pub fn print_network_security_groups(
    groups: &[NetworkSecurityGroup],
    format: OutputFormat,
) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        return print_json(groups);
    }

    if groups.is_empty() {
        println!("{}", "No network security groups found".dimmed());
        return Ok(());
    }

    println!(
        "{}",
        format!(
            "{:<32} {:<16} {:>6} {:<12}",
            "NAME", "LOCATION", "RULES", "STATE"
        )
        .bold()
    );
    println!("{}", "─".repeat(69).dimmed());
    for nsg in groups {
        println!(
            "{:<32} {:<16} {:>6} {:<12}",
            nsg.name().cyan(),
            nsg.identity.location(),
            nsg.security_rules.len(),
            nsg.provisioning_state.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}

pub fn print_images(
    images: &[VirtualMachineImageResource],
    empty_message: &str,
    format: OutputFormat,
) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        return print_json(images);
    }

    if images.is_empty() {
        println!("{}", empty_message.dimmed());
        return Ok(());
    }

    println!("{}", format!("{:<48} {:<16}", "NAME", "LOCATION").bold());
    println!("{}", "─".repeat(65).dimmed());
    for image in images {
        println!("{:<48} {:<16}", image.name.cyan(), image.location);
    }
    Ok(())
}
