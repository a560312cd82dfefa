//! The cron-job.org provider
//!
//! [`CronJobProvider`] owns the configured API client and the registries of
//! resources and data sources. Its lifecycle methods validate a
//! configuration against the type's schema, apply defaults and then drive
//! the resource implementation, mirroring what an infrastructure tool does
//! with a provider plugin.

pub mod error;

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::client::{ApiClient, normalize_base_url};
use crate::config::ProviderConfig;
use crate::config::loader::API_KEY_ENV;
use crate::data_sources::{
    DataSource, DataSourceRegistry, JobDataSource, JobHistoryDataSource, JobsDataSource,
};
use crate::resources::{
    FolderResource, JobResource, Resource, ResourceRegistry, StatusPageResource,
};
use crate::schema::{Attribute, AttributeType, Block, Plan, ResourceData, Schema, plan};

pub use error::{ProviderError, Result};

/// Message returned by `configure` when no API key is available
pub const MISSING_API_KEY_MESSAGE: &str =
    "API key must be provided via provider configuration or CRON_JOB_API_KEY environment variable";

pub struct CronJobProvider {
    client: Option<ApiClient>,
    resources: ResourceRegistry,
    data_sources: DataSourceRegistry,
}

impl CronJobProvider {
    /// Creates an unconfigured provider with every resource and data source
    /// registered
    pub fn new() -> Result<Self> {
        let mut resources = ResourceRegistry::new();
        resources.register(Box::new(JobResource))?;
        resources.register(Box::new(FolderResource))?;
        resources.register(Box::new(StatusPageResource))?;

        let mut data_sources = DataSourceRegistry::new();
        data_sources.register(Box::new(JobDataSource))?;
        data_sources.register(Box::new(JobsDataSource))?;
        data_sources.register(Box::new(JobHistoryDataSource))?;

        Ok(Self {
            client: None,
            resources,
            data_sources,
        })
    }

    /// Schema of the provider configuration block
    pub fn schema() -> Schema {
        Schema::new(
            Block::new()
                .attribute(
                    "api_url",
                    Attribute::optional(AttributeType::String)
                        .description("The base URL of the cron-job.org API")
                        .default_value(crate::config::DEFAULT_API_URL),
                )
                .attribute(
                    "api_key",
                    Attribute::optional(AttributeType::String)
                        .description(format!(
                            "API key for cron-job.org. Can also be set with the {} environment variable.",
                            API_KEY_ENV
                        ))
                        .sensitive(),
                ),
        )
    }

    /// Builds the API client
    ///
    /// The key falls back to `CRON_JOB_API_KEY` when the configuration has
    /// none; trailing slashes are trimmed from the URL.
    pub fn configure(&mut self, config: &ProviderConfig) -> Result<()> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty()))
            .ok_or_else(|| ProviderError::config(MISSING_API_KEY_MESSAGE))?;

        let config = ProviderConfig {
            api_url: normalize_base_url(&config.api_url),
            api_key: Some(api_key),
            ..config.clone()
        };
        let client = ApiClient::from_config(&config)?;
        info!(api_url = %client.base_url(), "Provider configured");

        self.client = Some(client);
        Ok(())
    }

    pub fn client(&self) -> Result<&ApiClient> {
        self.client.as_ref().ok_or(ProviderError::NotConfigured)
    }

    pub fn resource_types(&self) -> Vec<&str> {
        self.resources.names()
    }

    pub fn data_source_types(&self) -> Vec<&str> {
        self.data_sources.names()
    }

    pub fn resource(&self, type_name: &str) -> Result<&dyn Resource> {
        self.resources
            .get(type_name)
            .ok_or_else(|| ProviderError::UnknownType {
                kind: "resource",
                name: type_name.to_string(),
            })
    }

    pub fn data_source(&self, type_name: &str) -> Result<&dyn DataSource> {
        self.data_sources
            .get(type_name)
            .ok_or_else(|| ProviderError::UnknownType {
                kind: "data source",
                name: type_name.to_string(),
            })
    }

    /// Validates `config` against `schema` and returns it with defaults
    fn prepare(
        type_name: &str,
        schema: &Schema,
        mut config: Map<String, Value>,
    ) -> Result<Map<String, Value>> {
        let errors = schema.block.validate(&config);
        if !errors.is_empty() {
            return Err(ProviderError::Validation {
                type_name: type_name.to_string(),
                errors,
            });
        }
        schema.block.apply_defaults(&mut config);
        Ok(config)
    }

    /// Checks a resource configuration without calling the API
    pub fn validate_resource(&self, type_name: &str, config: &Map<String, Value>) -> Result<()> {
        let resource = self.resource(type_name)?;
        Self::prepare(type_name, &resource.schema(), config.clone()).map(|_| ())
    }

    /// Checks a data source configuration without calling the API
    pub fn validate_data_source(
        &self,
        type_name: &str,
        config: &Map<String, Value>,
    ) -> Result<()> {
        let data_source = self.data_source(type_name)?;
        Self::prepare(type_name, &data_source.schema(), config.clone()).map(|_| ())
    }

    pub async fn create(
        &self,
        type_name: &str,
        config: Map<String, Value>,
    ) -> Result<ResourceData> {
        let resource = self.resource(type_name)?;
        let config = Self::prepare(type_name, &resource.schema(), config)?;
        let mut data = ResourceData::new(config);

        debug!(type_name = type_name, "Creating resource");
        resource.create(self.client()?, &mut data).await?;
        Ok(data)
    }

    /// Refreshes state; the returned id is empty if the object is gone
    pub async fn read(&self, type_name: &str, mut state: ResourceData) -> Result<ResourceData> {
        let resource = self.resource(type_name)?;
        resource.read(self.client()?, &mut state).await?;
        Ok(state)
    }

    /// Plans the changes needed to move `state` to `config`
    ///
    /// A state without id plans the creation of every configured value.
    pub fn plan(
        &self,
        type_name: &str,
        state: &ResourceData,
        config: Map<String, Value>,
    ) -> Result<Plan> {
        let resource = self.resource(type_name)?;
        let schema = resource.schema();
        let config = Self::prepare(type_name, &schema, config)?;

        let empty = Map::new();
        let prior = if state.exists() { &state.attributes } else { &empty };
        Ok(plan(&schema.block, prior, &config))
    }

    /// Applies `config` to an existing object, updating in place or
    /// replacing it when a force-new attribute changed
    pub async fn update(
        &self,
        type_name: &str,
        state: ResourceData,
        config: Map<String, Value>,
    ) -> Result<ResourceData> {
        let resource = self.resource(type_name)?;
        let planned = self.plan(type_name, &state, config.clone())?;
        let client = self.client()?;

        if !state.exists() {
            return self.create(type_name, config).await;
        }
        if !planned.has_changes() {
            debug!(type_name = type_name, id = %state.id(), "No changes");
            return Ok(state);
        }

        let config = Self::prepare(type_name, &resource.schema(), config)?;
        if planned.requires_replace {
            info!(type_name = type_name, id = %state.id(), "Replacing resource");
            let mut old = state;
            resource.delete(client, &mut old).await?;
            return self.create(type_name, config).await;
        }

        let mut data = state;
        for (key, value) in &config {
            data.attributes.insert(key.clone(), value.clone());
        }
        resource.update(client, &mut data, &config).await?;
        Ok(data)
    }

    /// Deletes the object; the returned state has an empty id
    pub async fn delete(&self, type_name: &str, mut state: ResourceData) -> Result<ResourceData> {
        let resource = self.resource(type_name)?;
        resource.delete(self.client()?, &mut state).await?;
        Ok(state)
    }

    pub async fn read_data_source(
        &self,
        type_name: &str,
        config: Map<String, Value>,
    ) -> Result<ResourceData> {
        let data_source = self.data_source(type_name)?;
        let config = Self::prepare(type_name, &data_source.schema(), config)?;
        let mut data = ResourceData::new(config);

        data_source.read(self.client()?, &mut data).await?;
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::CONFIG_TEST_ENV_LOCK;
    use httpmock::prelude::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {}", other),
        }
    }

    fn configured(server: &MockServer) -> CronJobProvider {
        let mut provider = CronJobProvider::new().unwrap();
        let config = ProviderConfig::default()
            .with_api_url(format!("{}/", server.base_url()))
            .with_api_key("test-key")
            .with_max_retries(0);
        provider.configure(&config).unwrap();
        provider
    }

    #[test]
    fn test_registered_types() {
        let provider = CronJobProvider::new().unwrap();
        assert_eq!(
            provider.resource_types(),
            vec!["cronjoborg_folder", "cronjoborg_job", "cronjoborg_status_page"]
        );
        assert_eq!(
            provider.data_source_types(),
            vec!["cronjoborg_job", "cronjoborg_job_history", "cronjoborg_jobs"]
        );
        assert!(matches!(
            provider.resource("cronjoborg_nope"),
            Err(ProviderError::UnknownType { kind: "resource", .. })
        ));
    }

    #[test]
    fn test_provider_schema() {
        let schema = CronJobProvider::schema();
        assert_eq!(
            schema.block.attributes["api_url"].default,
            Some(json!("https://api.cron-job.org"))
        );
        assert!(schema.block.attributes["api_key"].sensitive);
    }

    #[test]
    fn test_configure_requires_api_key() {
        let _lock = CONFIG_TEST_ENV_LOCK.lock().unwrap();
        unsafe {
            std::env::remove_var(API_KEY_ENV);
        }

        let mut provider = CronJobProvider::new().unwrap();
        let err = provider.configure(&ProviderConfig::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "API key must be provided via provider configuration or CRON_JOB_API_KEY environment variable"
        );
        assert!(matches!(provider.client(), Err(ProviderError::NotConfigured)));
    }

    #[test]
    fn test_configure_falls_back_to_env_key() {
        let _lock = CONFIG_TEST_ENV_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var(API_KEY_ENV, "env-key");
        }

        let mut provider = CronJobProvider::new().unwrap();
        let config = ProviderConfig::default().with_api_url("https://api.cron-job.org//");
        let result = provider.configure(&config);

        unsafe {
            std::env::remove_var(API_KEY_ENV);
        }
        result.unwrap();
        assert_eq!(provider.client().unwrap().base_url(), "https://api.cron-job.org");
    }

    #[test]
    fn test_validate_resource_reports_errors() {
        let provider = CronJobProvider::new().unwrap();
        let config = object(json!({"title": "", "url": "nope"}));

        let err = provider
            .validate_resource("cronjoborg_job", &config)
            .unwrap_err();
        match err {
            ProviderError::Validation { type_name, errors } => {
                assert_eq!(type_name, "cronjoborg_job");
                assert_eq!(errors.len(), 2);
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let config = object(json!({"title": "ok", "url": "https://example.com"}));
        provider.validate_resource("cronjoborg_job", &config).unwrap();
        provider
            .validate_data_source("cronjoborg_job", &object(json!({"job_id": 1})))
            .unwrap();
    }

    #[test]
    fn test_plan_against_existing_state() {
        let provider = CronJobProvider::new().unwrap();
        let state: ResourceData = serde_json::from_value(json!({
            "id": "1",
            "attributes": {"title": "Old"}
        }))
        .unwrap();

        let planned = provider
            .plan("cronjoborg_folder", &state, object(json!({"title": "New"})))
            .unwrap();
        assert!(planned.requires_replace);

        let planned = provider
            .plan("cronjoborg_folder", &state, object(json!({"title": "Old"})))
            .unwrap();
        assert!(!planned.has_changes());
    }

    #[tokio::test]
    async fn test_operations_require_configuration() {
        let provider = CronJobProvider::new().unwrap();
        let err = provider
            .read_data_source("cronjoborg_jobs", Map::new())
            .await
            .unwrap_err();
        assert_eq!(err, ProviderError::NotConfigured);
    }

    #[tokio::test]
    async fn test_update_in_place() {
        let server = MockServer::start_async().await;
        let patch = server
            .mock_async(|when, then| {
                when.method(PATCH)
                    .path("/jobs/5")
                    .json_body_includes(r#"{"job": {"title": "New", "enabled": false}}"#);
                then.status(200).json_body(json!({}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/jobs/5");
                then.status(200).json_body(json!({
                    "jobDetails": {"jobId": 5, "title": "New", "url": "https://example.com", "enabled": false}
                }));
            })
            .await;

        let provider = configured(&server);
        let state: ResourceData = serde_json::from_value(json!({
            "id": "5",
            "attributes": {"title": "Old", "url": "https://example.com", "enabled": true}
        }))
        .unwrap();
        let config = object(json!({"title": "New", "url": "https://example.com", "enabled": false}));

        let updated = provider.update("cronjoborg_job", state, config).await.unwrap();

        patch.assert_async().await;
        assert_eq!(updated.id(), "5");
        assert_eq!(updated.get_str("title"), Some("New"));
        assert_eq!(updated.get_bool("enabled"), Some(false));
    }

    #[tokio::test]
    async fn test_update_leaves_unconfigured_auth_untouched() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/jobs/8");
                then.status(200).json_body(json!({
                    "jobDetails": {
                        "jobId": 8,
                        "title": "Old",
                        "url": "https://example.com",
                        "enabled": true,
                        "auth": {"enable": true, "user": "admin", "password": ""}
                    }
                }));
            })
            .await;
        // Exact body: any auth key would miss this mock and fail the update
        let patch = server
            .mock_async(|when, then| {
                when.method(PATCH).path("/jobs/8").json_body(json!({
                    "job": {
                        "title": "Renamed",
                        "url": "https://example.com",
                        "enabled": true,
                        "saveResponses": false,
                        "redirectSuccess": false,
                        "folderId": 0,
                        "requestMethod": 0
                    }
                }));
                then.status(200).json_body(json!({}));
            })
            .await;

        let provider = configured(&server);
        let state = provider
            .read("cronjoborg_job", ResourceData::default().with_id("8"))
            .await
            .unwrap();
        let password = state.get_block("auth").and_then(|auth| auth.get("password"));
        assert_eq!(password, Some(&json!("")));

        let config = object(json!({"title": "Renamed", "url": "https://example.com"}));
        provider.update("cronjoborg_job", state, config).await.unwrap();

        patch.assert_async().await;
    }

    #[tokio::test]
    async fn test_update_replaces_force_new_resource() {
        let server = MockServer::start_async().await;
        let delete = server
            .mock_async(|when, then| {
                when.method(DELETE).path("/folders/1");
                then.status(200).json_body(json!({}));
            })
            .await;
        let create = server
            .mock_async(|when, then| {
                when.method(PUT).path("/folders").json_body(json!({"title": "New"}));
                then.status(200).json_body(json!({"folderId": 2}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/folders");
                then.status(200)
                    .json_body(json!({"folders": [{"folderId": 2, "title": "New"}]}));
            })
            .await;

        let provider = configured(&server);
        let state = ResourceData::new(object(json!({"title": "Old"}))).with_id("1");
        let replaced = provider
            .update("cronjoborg_folder", state, object(json!({"title": "New"})))
            .await
            .unwrap();

        delete.assert_async().await;
        create.assert_async().await;
        assert_eq!(replaced.id(), "2");
    }

    #[tokio::test]
    async fn test_update_without_changes_makes_no_calls() {
        let server = MockServer::start_async().await;
        let any = server
            .mock_async(|when, then| {
                when.any_request();
                then.status(500);
            })
            .await;

        let provider = configured(&server);
        let state = ResourceData::new(object(json!({"title": "Same"}))).with_id("1");
        let result = provider
            .update("cronjoborg_folder", state.clone(), object(json!({"title": "Same"})))
            .await
            .unwrap();

        assert_eq!(result, state);
        any.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_config_before_calling_api() {
        let server = MockServer::start_async().await;
        let any = server
            .mock_async(|when, then| {
                when.any_request();
                then.status(500);
            })
            .await;

        let provider = configured(&server);
        let err = provider
            .create("cronjoborg_job", object(json!({"title": "x"})))
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::Validation { .. }));
        any.assert_hits_async(0).await;
    }
}
