//! `cronjoborg_jobs` data source

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::{DataSource, job_summary_attributes};
use crate::client::{ApiClient, Job};
use crate::provider::error::Result;
use crate::resources::job::{flatten_schedule, set_job_fields};
use crate::schema::{Attribute, AttributeType, Block, NestedBlock, ResourceData, Schema};

pub const TYPE_NAME: &str = "cronjoborg_jobs";

pub struct JobsDataSource;

fn flatten_job(job: &Job) -> Value {
    let mut fields = Map::new();
    fields.insert("job_id".into(), job.job_id.into());
    set_job_fields(&mut fields, job);
    fields.insert("schedule".into(), flatten_schedule(&job.schedule));
    Value::Object(fields)
}

#[async_trait]
impl DataSource for JobsDataSource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        let job = job_summary_attributes(Block::new().attribute(
            "job_id",
            Attribute::computed(AttributeType::Int).description("Identifier of the job"),
        ));

        Schema::new(
            Block::new()
                .with_description("Lists all cron jobs of the account")
                .attribute(
                    "some_failed",
                    Attribute::computed(AttributeType::Bool)
                        .description("True if some jobs could not be retrieved due to internal errors"),
                )
                .block("jobs", NestedBlock::computed_list(job)),
        )
    }

    async fn read(&self, client: &ApiClient, data: &mut ResourceData) -> Result<()> {
        let list = client.get_jobs().await?;
        if list.some_failed {
            warn!("Some jobs could not be retrieved by the API");
        }
        debug!(count = list.jobs.len(), "Read jobs data source");

        data.set_id(format!("jobs-{}", list.jobs.len()));
        data.set("some_failed", list.some_failed);
        data.set(
            "jobs",
            Value::Array(list.jobs.iter().map(flatten_job).collect()),
        );
        Ok(())
    }
}
