use crate::output;
use crate::{ExtensionImageCommands, Session};
use armctl_cloud::{ExtensionTypeQuery, ExtensionVersionQuery, Reader};
use armctl_cloud_azure::ExtensionImageClient;

pub async fn handle(session: &Session, cmd: ExtensionImageCommands) -> anyhow::Result<()> {
    let client = ExtensionImageClient::new(session.arm.clone());
    let reader = Reader::new(&session.ctx);

    match cmd {
        ExtensionImageCommands::Types {
            location,
            publisher,
        } => {
            let query = ExtensionTypeQuery {
                subscription_id: session.subscription_id().to_string(),
                location,
                publisher,
            };
            let types = reader.list(&client, &query).await?;
            output::print_images(
                &types,
                &format!("No extension types found for {query}"),
                session.output,
            )
        }
        ExtensionImageCommands::Versions {
            location,
            publisher,
            type_name,
            filter,
        } => {
            let query = ExtensionVersionQuery {
                subscription_id: session.subscription_id().to_string(),
                location,
                publisher,
                type_name,
                filter,
            };
            let versions = reader.list(&client, &query).await?;
            output::print_images(
                &versions,
                &format!("No {query} found"),
                session.output,
            )
        }
    }
}
