//! `cronjoborg_folder` resource
//!
//! Folders cannot be renamed through the API, so a title change replaces
//! the folder.

use async_trait::async_trait;
use tracing::{info, warn};

use super::{Resource, require_id};
use crate::client::ApiClient;
use crate::provider::error::{ProviderError, Result};
use crate::schema::{Attribute, AttributeType, Block, ResourceData, Schema, Validation};

pub const TYPE_NAME: &str = "cronjoborg_folder";

pub struct FolderResource;

#[async_trait]
impl Resource for FolderResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::new(
            Block::new()
                .with_description("A folder grouping cron jobs")
                .attribute(
                    "title",
                    Attribute::required(AttributeType::String)
                        .description("The title of the folder")
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
        let folder_id = client.create_folder(&title).await?;
        info!(folder_id = folder_id, "Created folder");

        data.set_id(folder_id.to_string());
        self.read(client, data).await
    }

    async fn read(&self, client: &ApiClient, data: &mut ResourceData) -> Result<()> {
        let folder_id = require_id(data)?.to_string();
        let folders = client.get_folders().await?;

        match folders
            .into_iter()
            .find(|f| f.folder_id.to_string() == folder_id)
        {
            Some(folder) => data.set("title", folder.title),
            None => {
                warn!(folder_id = %folder_id, "Folder not found, removing from state");
                data.clear_id();
            }
        }
        Ok(())
    }

    async fn delete(&self, client: &ApiClient, data: &mut ResourceData) -> Result<()> {
        let folder_id = require_id(data)?.to_string();
        client.delete_folder(&folder_id).await?;
        info!(folder_id = %folder_id, "Deleted folder");

        data.clear_id();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::{Map, json};

    fn test_client(server: &MockServer) -> ApiClient {
        ApiClient::new(server.base_url(), "test-key").with_max_retries(0)
    }

    #[test]
    fn test_title_forces_replacement() {
        let schema = FolderResource.schema();
        assert!(schema.block.attributes["title"].force_new);
    }

    #[tokio::test]
    async fn test_create_and_read() {
        let server = MockServer::start_async().await;
        let create = server
            .mock_async(|when, then| {
                when.method(PUT).path("/folders").json_body(json!({"title": "Prod"}));
                then.status(200).json_body(json!({"folderId": 42}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/folders");
                then.status(200).json_body(json!({
                    "folders": [
                        {"folderId": 41, "title": "Staging"},
                        {"folderId": 42, "title": "Prod"}
                    ]
                }));
            })
            .await;

        let mut data = ResourceData::default();
        data.set("title", "Prod");
        FolderResource.create(&test_client(&server), &mut data).await.unwrap();

        create.assert_async().await;
        assert_eq!(data.id(), "42");
        assert_eq!(data.get_str("title"), Some("Prod"));
    }

    #[tokio::test]
    async fn test_read_missing_folder_clears_id() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/folders");
                then.status(200).json_body(json!({"folders": [{"folderId": 1, "title": "Other"}]}));
            })
            .await;

        let mut data = ResourceData::default().with_id("42");
        FolderResource.read(&test_client(&server), &mut data).await.unwrap();
        assert!(!data.exists());
    }

    #[tokio::test]
    async fn test_delete() {
        let server = MockServer::start_async().await;
        let delete = server
            .mock_async(|when, then| {
                when.method(DELETE)
                    .path("/folders/42")
                    .json_body(json!({"folderId": "42"}));
                then.status(200).json_body(json!({}));
            })
            .await;

        let mut data = ResourceData::default().with_id("42");
        FolderResource.delete(&test_client(&server), &mut data).await.unwrap();

        delete.assert_async().await;
        assert!(!data.exists());
    }

    #[tokio::test]
    async fn test_update_is_unsupported() {
        let server = MockServer::start_async().await;
        let mut data = ResourceData::default().with_id("42");
        let err = FolderResource
            .update(&test_client(&server), &mut data, &Map::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Unsupported { .. }));
    }
}
