//! `cronjoborg_job` data source

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use tracing::debug;

use super::{DataSource, job_id_argument, job_id_from, job_summary_attributes};
use crate::client::ApiClient;
use crate::provider::error::Result;
use crate::resources::job::{flatten_schedule, set_job_fields};
use crate::schema::{Attribute, AttributeType, Block, NestedBlock, ResourceData, Schema};

pub const TYPE_NAME: &str = "cronjoborg_job";

pub struct JobDataSource;

#[async_trait]
impl DataSource for JobDataSource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        let auth = Block::new()
            .attribute("enable", Attribute::computed(AttributeType::Bool))
            .attribute("user", Attribute::computed(AttributeType::String))
            .attribute(
                "password",
                Attribute::computed(AttributeType::String)
                    .description("HTTP basic auth password")
                    .sensitive(),
            );
        let notification = Block::new()
            .attribute("on_failure", Attribute::computed(AttributeType::Bool))
            .attribute("on_success", Attribute::computed(AttributeType::Bool))
            .attribute("on_disable", Attribute::computed(AttributeType::Bool));
        let extended_data = Block::new()
            .attribute(
                "headers",
                Attribute::computed(AttributeType::map_of(AttributeType::String)),
            )
            .attribute("body", Attribute::computed(AttributeType::String));

        let block = job_summary_attributes(
            Block::new()
                .with_description("Reads a single cron job")
                .attribute("job_id", job_id_argument()),
        )
        .block("auth", NestedBlock::computed_list(auth))
        .block("notification", NestedBlock::computed_list(notification))
        .block("extended_data", NestedBlock::computed_list(extended_data));

        Schema::new(block)
    }

    async fn read(&self, client: &ApiClient, data: &mut ResourceData) -> Result<()> {
        let job_id = job_id_from(data)?;

        let job = client.get_job(&job_id).await?;
        let details = client.get_job_details(&job_id).await?;
        debug!(job_id = %job_id, "Read job data source");

        data.set_id(job_id);
        set_job_fields(&mut data.attributes, &job);
        data.set("schedule", flatten_schedule(&job.schedule));
        data.set(
            "auth",
            json!([{
                "enable": details.auth.enable,
                "user": details.auth.user,
                "password": details.auth.password,
            }]),
        );
        data.set(
            "notification",
            json!([{
                "on_failure": details.notification.on_failure,
                "on_success": details.notification.on_success,
                "on_disable": details.notification.on_disable,
            }]),
        );
        let headers: Map<String, Value> = details
            .extended_data
            .headers
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        data.set(
            "extended_data",
            json!([{ "headers": headers, "body": details.extended_data.body }]),
        );
        Ok(())
    }
}
