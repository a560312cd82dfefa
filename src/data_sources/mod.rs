//! Read-only data sources

pub mod job;
pub mod job_history;
pub mod jobs;

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::client::ApiClient;
use crate::provider::error::{ProviderError, Result};
use crate::resources::job::SCHEDULE_FIELDS;
use crate::schema::{Attribute, AttributeType, Block, NestedBlock, ResourceData, Schema};

pub use job::JobDataSource;
pub use job_history::JobHistoryDataSource;
pub use jobs::JobsDataSource;

/// A data source reads remote objects into state without managing them
#[async_trait]
pub trait DataSource: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    /// Reads using the arguments in `data` and sets id and computed values
    async fn read(&self, client: &ApiClient, data: &mut ResourceData) -> Result<()>;
}

/// Registry of data source types
pub struct DataSourceRegistry {
    data_sources: BTreeMap<String, Box<dyn DataSource>>,
}

impl DataSourceRegistry {
    pub fn new() -> Self {
        Self {
            data_sources: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, data_source: Box<dyn DataSource>) -> Result<()> {
        let name = data_source.type_name().to_string();
        if self.data_sources.contains_key(&name) {
            return Err(ProviderError::config(format!(
                "Data source '{}' is already registered",
                name
            )));
        }
        self.data_sources.insert(name, data_source);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&dyn DataSource> {
        self.data_sources.get(name).map(|d| d.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        self.data_sources.keys().map(String::as_str).collect()
    }
}

impl Default for DataSourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// `job_id` argument shared by the job and job history data sources
fn job_id_argument() -> Attribute {
    Attribute::required(AttributeType::Int).description("Identifier of the job")
}

fn job_id_from(data: &ResourceData) -> Result<String> {
    data.get_i64("job_id")
        .map(|id| id.to_string())
        .ok_or_else(|| ProviderError::attribute("job_id", "job_id must be an integer"))
}

/// Computed job summary fields, as listed by `GET /jobs`
fn job_summary_attributes(block: Block) -> Block {
    let int = |description: &str| Attribute::computed(AttributeType::Int).description(description);
    let boolean =
        |description: &str| Attribute::computed(AttributeType::Bool).description(description);
    let string =
        |description: &str| Attribute::computed(AttributeType::String).description(description);

    block
        .attribute("enabled", boolean("Whether the job is enabled"))
        .attribute("title", string("The title of the job"))
        .attribute("save_responses", boolean("Whether responses are saved"))
        .attribute("url", string("The URL called by the job"))
        .attribute("last_status", int("Last execution status"))
        .attribute("last_duration", int("Last execution duration in milliseconds"))
        .attribute("last_execution", int("Unix timestamp of the last execution"))
        .attribute("next_execution", int("Unix timestamp of the next execution, if any"))
        .attribute("type", int("Job type (0 = default job, 1 = monitoring job)"))
        .attribute("request_timeout", int("Job timeout in seconds"))
        .attribute("redirect_success", boolean("Whether 3xx redirects count as success"))
        .attribute("folder_id", int("Identifier of the folder the job is in"))
        .attribute("request_method", int("HTTP request method"))
        .block("schedule", NestedBlock::computed_list(computed_schedule_block()))
}

fn computed_schedule_block() -> Block {
    let mut block = Block::new()
        .attribute(
            "timezone",
            Attribute::computed(AttributeType::String).description("Schedule time zone"),
        )
        .attribute(
            "expires_at",
            Attribute::computed(AttributeType::Int).description("Expiry date/time, 0 = never"),
        );
    for (name, _, _, description) in SCHEDULE_FIELDS {
        block = block.attribute(
            name,
            Attribute::computed(AttributeType::list_of(AttributeType::Int)).description(description),
        );
    }
    block
}
