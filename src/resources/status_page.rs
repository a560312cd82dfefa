//! `cronjoborg_status_page` resource

use async_trait::async_trait;
use tracing::{info, warn};

use super::{Resource, require_id};
use crate::client::ApiClient;
use crate::provider::error::{ProviderError, Result};
use crate::schema::{Attribute, AttributeType, Block, ResourceData, Schema, Validation};

pub const TYPE_NAME: &str = "cronjoborg_status_page";

pub struct StatusPageResource;

#[async_trait]
impl Resource for StatusPageResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::new(
            Block::new()
                .with_description("A public status page")
                .attribute(
                    "title",
                    Attribute::required(AttributeType::String)
                        .description("The title of the status page")
                        .validate_with(Validation::StringLenBetween { min: 1, max: 100 })
                        .force_new(),
                ),
        )
    }

    async fn create(&self, client: &ApiClient, data: &mut ResourceData) -> Result<()> {
        let title = data
            .get_str("title")
            .ok_or_else(|| ProviderError::missing("title"))?
            .to_string();
        let status_page_id = client.create_status_page(&title).await?;
        info!(status_page_id = status_page_id, "Created status page");

        data.set_id(status_page_id.to_string());
        self.read(client, data).await
    }

    async fn read(&self, client: &ApiClient, data: &mut ResourceData) -> Result<()> {
        let status_page_id = require_id(data)?.to_string();
        match client.get_status_page(&status_page_id).await {
            Ok(page) => {
                data.set("title", page.title);
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                warn!(status_page_id = %status_page_id, "Status page not found, removing from state");
                data.clear_id();
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, client: &ApiClient, data: &mut ResourceData) -> Result<()> {
        let status_page_id = require_id(data)?.to_string();
        client.delete_status_page(&status_page_id).await?;
        info!(status_page_id = %status_page_id, "Deleted status page");

        data.clear_id();
        Ok(())
    }
}
