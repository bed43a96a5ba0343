mod commands;
mod output;
mod prompt;

use anyhow::Context;
use armctl_cloud::{CloudError, InvocationContext};
use armctl_cloud_azure::{ArmClient, ArmConfig};
use armctl_config::Settings;
use clap::{Parser, Subcommand};
use colored::Colorize;
use output::OutputFormat;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "armctl")]
#[command(about = "Confirmed, idempotent upserts for Azure Resource Manager", long_about = None)]
struct Cli {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    output: OutputFormat,
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage network security groups
    #[command(subcommand, visible_alias = "nsg")]
    NetworkSecurityGroup(NsgCommands),
    /// Browse the VM extension image catalog
    #[command(subcommand)]
    ExtensionImage(ExtensionImageCommands),
    /// Show version information
    Version,
}

/// Network security group subcommands
#[derive(Subcommand)]
pub enum NsgCommands {
    /// Create a network security group, or overwrite it after confirmation
    New {
        /// Resource name
        #[arg(short, long)]
        name: String,
        /// Resource group
        #[arg(short = 'g', long)]
        resource_group: String,
        /// Azure region (falls back to default_location in the settings file)
        #[arg(short, long)]
        location: Option<String>,
        /// YAML or JSON file with a list of security rules
        #[arg(long)]
        rules_file: Option<PathBuf>,
        /// Tag as KEY=VALUE (repeatable)
        #[arg(long = "tag", value_name = "KEY=VALUE", value_parser = commands::network_security_group::parse_tag)]
        tags: Vec<(String, String)>,
        /// Overwrite an existing resource without asking
        #[arg(short, long, visible_alias = "yes")]
        force: bool,
    },
    /// Show a network security group
    Get {
        /// Resource name
        #[arg(short, long)]
        name: String,
        /// Resource group
        #[arg(short = 'g', long)]
        resource_group: String,
    },
    /// List network security groups in a resource group
    List {
        /// Resource group
        #[arg(short = 'g', long)]
        resource_group: String,
    },
}

/// VM extension image subcommands
#[derive(Subcommand)]
pub enum ExtensionImageCommands {
    /// List extension types offered by a publisher
    Types {
        /// Azure region
        #[arg(short, long)]
        location: String,
        /// Publisher, e.g. Microsoft.Compute
        #[arg(short, long)]
        publisher: String,
    },
    /// List versions of an extension type
    Versions {
        /// Azure region
        #[arg(short, long)]
        location: String,
        /// Publisher, e.g. Microsoft.Compute
        #[arg(short, long)]
        publisher: String,
        /// Extension type, e.g. CustomScriptExtension
        #[arg(short = 't', long = "type")]
        type_name: String,
        /// OData filter passed to the service
        #[arg(long)]
        filter: Option<String>,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::NetworkSecurityGroup(NsgCommands::New { .. }) => "network-security-group new",
            Commands::NetworkSecurityGroup(NsgCommands::Get { .. }) => "network-security-group get",
            Commands::NetworkSecurityGroup(NsgCommands::List { .. }) => "network-security-group list",
            Commands::ExtensionImage(ExtensionImageCommands::Types { .. }) => "extension-image types",
            Commands::ExtensionImage(ExtensionImageCommands::Versions { .. }) => {
                "extension-image versions"
            }
            Commands::Version => "version",
        }
    }
}

/// Everything a command handler needs for one invocation
pub struct Session {
    pub ctx: InvocationContext,
    pub arm: ArmClient,
    pub settings: Settings,
    pub output: OutputFormat,
}

impl Session {
    pub fn subscription_id(&self) -> &str {
        self.arm.subscription_id()
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn arm_config(settings: &Settings) -> anyhow::Result<ArmConfig> {
    let subscription_id = settings.subscription_id.clone().context(
        "no subscription configured: set AZURE_SUBSCRIPTION_ID or subscription_id in armctl.yaml",
    )?;
    let access_token = std::env::var("AZURE_ACCESS_TOKEN")
        .ok()
        .filter(|t| !t.trim().is_empty())
        .context("AZURE_ACCESS_TOKEN is not set (obtain one with `az account get-access-token`)")?;

    let mut config = ArmConfig::new(subscription_id, access_token).with_endpoint(&settings.endpoint);
    config.timeout = Duration::from_secs(settings.timeout_secs);
    config.poll_interval = Duration::from_secs(settings.poll_interval_secs);
    config.max_polls = settings.max_polls;
    Ok(config)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if matches!(cli.command, Commands::Version) {
        println!("armctl {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let settings = armctl_config::load().context("failed to load settings")?;
    let arm = ArmClient::new(arm_config(&settings)?)?;

    let cancellation = CancellationToken::new();
    let ctx = InvocationContext::with_cancellation(cli.command.name(), cancellation.clone());
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\n{}", "Interrupted, abandoning the in-flight request".yellow());
            cancellation.cancel();
        }
    });

    let session = Session {
        ctx,
        arm,
        settings,
        output: cli.output,
    };

    match cli.command {
        Commands::NetworkSecurityGroup(cmd) => {
            commands::network_security_group::handle(&session, cmd).await?
        }
        Commands::ExtensionImage(cmd) => commands::extension_image::handle(&session, cmd).await?,
        Commands::Version => unreachable!("Version is handled before settings are loaded"),
    }

    tracing::debug!(
        command = %session.ctx.command,
        elapsed_ms = session.ctx.elapsed_ms(),
        "command finished"
    );
    Ok(())
}

/// Outer message followed by every cause not already spelled out in it
fn render_error(err: &anyhow::Error) -> String {
    let mut message = err.to_string();
    for cause in err.chain().skip(1) {
        let cause = cause.to_string();
        if !message.contains(&cause) {
            message.push_str(": ");
            message.push_str(&cause);
        }
    }
    message
}

fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<CloudError>() {
        Some(CloudError::Cancelled { .. }) => 130,
        _ => 1,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        eprintln!("{} {}", "Error:".red().bold(), render_error(&err));
        // A prompt may still be blocked on stdin; do not wait for it
        std::process::exit(exit_code(&err));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use armctl_cloud::{Operation, ProviderError};

    #[test]
    fn test_render_error_does_not_repeat_causes() {
        let err = anyhow::Error::from(CloudError::provider(
            Operation::Get,
            "nsg1",
            ProviderError::Authentication("token expired".into()),
        ))
        .context("command failed");
        let rendered = render_error(&err);
        assert!(rendered.starts_with("command failed: get nsg1 failed"));
        assert_eq!(rendered.matches("token expired").count(), 1);
    }

    #[test]
    fn test_cancelled_exit_code() {
        let err = anyhow::Error::from(CloudError::Cancelled {
            operation: Operation::CreateOrUpdate,
            resource: "nsg1".into(),
        });
        assert_eq!(exit_code(&err), 130);
        assert_eq!(exit_code(&anyhow::anyhow!("boom")), 1);
    }

    #[test]
    fn test_cli_parses_new_with_tags() {
        let cli = Cli::try_parse_from([
            "armctl", "nsg", "new", "--name", "nsg1", "-g", "rg1", "-l", "westus", "--tag",
            "env=test", "--tag", "team=net", "--force",
        ])
        .unwrap();
        match cli.command {
            Commands::NetworkSecurityGroup(NsgCommands::New { tags, force, .. }) => {
                assert_eq!(tags.len(), 2);
                assert!(force);
            }
            _ => panic!("expected network-security-group new"),
        }
    }
}
