//! `cronjoborg_job` resource

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::{
    Resource, bool_field, int_field, int_list_field, require_id, string_field, string_map_field,
};
use crate::client::{
    ApiClient, DetailedJob, Job, JobAuth, JobExtendedData, JobNotification, JobPayload,
    JobSchedule,
};
use crate::provider::error::Result;
use crate::schema::diff::{expand_schedule_slice, reconcile_schedule_slice};
use crate::schema::{
    Attribute, AttributeType, Block, DiffSuppress, NestedBlock, ResourceData, Schema, Validation,
};

pub const TYPE_NAME: &str = "cronjoborg_job";

/// Schedule array fields with their allowed value range
pub(crate) const SCHEDULE_FIELDS: [(&str, i64, i64, &str); 5] = [
    ("hours", 0, 23, "Hours in which the job runs (0-23, [-1] = every hour)"),
    ("mdays", 1, 31, "Days of month on which the job runs (1-31, [-1] = every day)"),
    ("minutes", 0, 59, "Minutes at which the job runs (0-59, [-1] = every minute)"),
    ("months", 1, 12, "Months in which the job runs (1-12, [-1] = every month)"),
    ("wdays", 0, 6, "Days of week on which the job runs (0=Sunday - 6=Saturday, [-1] = every day)"),
];

pub struct JobResource;

fn schedule_block() -> Block {
    let mut block = Block::new()
        .with_description("Execution schedule of the job")
        .attribute(
            "timezone",
            Attribute::optional(AttributeType::String)
                .description("Schedule time zone, e.g. Europe/Berlin")
                .default_value("UTC"),
        )
        .attribute(
            "expires_at",
            Attribute::optional(AttributeType::Int)
                .description("Date/time after which the job expires (YYYYMMDDhhmmss, 0 = never)")
                .default_value(0)
                .validate_with(Validation::ExpiresAt),
        );

    for (name, min, max, description) in SCHEDULE_FIELDS {
        block = block.attribute(
            name,
            Attribute::optional(AttributeType::list_of(AttributeType::Int))
                .description(description)
                .validate_with(Validation::ScheduleValues { min, max })
                .suppress_diff(DiffSuppress::ScheduleWildcard),
        );
    }
    block
}

fn auth_block() -> Block {
    Block::new()
        .with_description("HTTP basic authentication settings")
        .attribute(
            "enable",
            Attribute::optional(AttributeType::Bool)
                .description("Whether HTTP basic authentication is enabled")
                .default_value(false),
        )
        .attribute(
            "user",
            Attribute::optional(AttributeType::String).description("HTTP basic auth username"),
        )
        .attribute(
            "password",
            Attribute::optional(AttributeType::String)
                .description("HTTP basic auth password")
                .sensitive(),
        )
}

fn notification_block() -> Block {
    Block::new()
        .with_description("Notification settings")
        .attribute(
            "on_failure",
            Attribute::optional(AttributeType::Bool)
                .description("Whether to send a notification on job failure")
                .default_value(false),
        )
        .attribute(
            "on_success",
            Attribute::optional(AttributeType::Bool)
                .description("Whether to send a notification when the job succeeds after a prior failure")
                .default_value(false),
        )
        .attribute(
            "on_disable",
            Attribute::optional(AttributeType::Bool)
                .description("Whether to send a notification when the job is disabled automatically")
                .default_value(false),
        )
}

fn extended_data_block() -> Block {
    Block::new()
        .with_description("Extra request headers and body")
        .attribute(
            "headers",
            Attribute::optional(AttributeType::map_of(AttributeType::String))
                .description("Request headers"),
        )
        .attribute(
            "body",
            Attribute::optional(AttributeType::String).description("Request body"),
        )
}

impl JobResource {
    fn block() -> Block {
        Block::new()
            .with_description("A cron job on cron-job.org")
            .attribute(
                "title",
                Attribute::required(AttributeType::String)
                    .description("The title of the cron job")
                    .validate_with(Validation::StringLenBetween { min: 1, max: 100 }),
            )
            .attribute(
                "url",
                Attribute::required(AttributeType::String)
                    .description("The URL to be called by the cron job")
                    .validate_with(Validation::Url),
            )
            .attribute(
                "enabled",
                Attribute::optional(AttributeType::Bool)
                    .description("Whether the job is enabled")
                    .default_value(true),
            )
            .attribute(
                "save_responses",
                Attribute::optional(AttributeType::Bool)
                    .description("Whether to save job response headers and bodies")
                    .default_value(false),
            )
            .attribute(
                "request_timeout",
                Attribute::optional_computed(AttributeType::Int)
                    .description("Job timeout in seconds"),
            )
            .attribute(
                "redirect_success",
                Attribute::optional(AttributeType::Bool)
                    .description("Whether to treat 3xx HTTP redirect status codes as success")
                    .default_value(false),
            )
            .attribute(
                "folder_id",
                Attribute::optional(AttributeType::Int)
                    .description("Identifier of the folder the job is in (0 = root folder)")
                    .default_value(0),
            )
            .attribute(
                "request_method",
                Attribute::optional(AttributeType::Int)
                    .description(
                        "HTTP request method (0=GET, 1=POST, 2=OPTIONS, 3=HEAD, 4=PUT, 5=DELETE, 6=TRACE, 7=CONNECT, 8=PATCH)",
                    )
                    .default_value(0)
                    .validate_with(Validation::IntBetween { min: 0, max: 8 }),
            )
            .attribute(
                "type",
                Attribute::computed(AttributeType::Int)
                    .description("Job type (0 = default job, 1 = monitoring job)"),
            )
            .attribute(
                "last_status",
                Attribute::computed(AttributeType::Int).description("Last execution status"),
            )
            .attribute(
                "last_duration",
                Attribute::computed(AttributeType::Int)
                    .description("Last execution duration in milliseconds"),
            )
            .attribute(
                "last_execution",
                Attribute::computed(AttributeType::Int)
                    .description("Unix timestamp of the last execution"),
            )
            .attribute(
                "next_execution",
                Attribute::computed(AttributeType::Int)
                    .description("Unix timestamp of the predicted next execution"),
            )
            .block("schedule", NestedBlock::single(schedule_block()))
            .block("auth", NestedBlock::single(auth_block()))
            .block("notification", NestedBlock::single(notification_block()))
            .block("extended_data", NestedBlock::single(extended_data_block()))
    }
}

fn expand_schedule(fields: &Map<String, Value>) -> JobSchedule {
    let timezone = string_field(fields, "timezone");
    JobSchedule {
        timezone: if timezone.is_empty() {
            "UTC".to_string()
        } else {
            timezone
        },
        expires_at: int_field(fields, "expires_at"),
        hours: expand_schedule_slice(&int_list_field(fields, "hours")),
        mdays: expand_schedule_slice(&int_list_field(fields, "mdays")),
        minutes: expand_schedule_slice(&int_list_field(fields, "minutes")),
        months: expand_schedule_slice(&int_list_field(fields, "months")),
        wdays: expand_schedule_slice(&int_list_field(fields, "wdays")),
    }
}

/// Builds the API payload from resource state
pub(crate) fn expand_job(data: &ResourceData) -> JobPayload {
    JobPayload {
        enabled: data.get_bool("enabled"),
        title: data.get_str("title").map(str::to_string),
        save_responses: data.get_bool("save_responses"),
        url: data.get_str("url").map(str::to_string),
        request_timeout: data.get_i64("request_timeout"),
        redirect_success: data.get_bool("redirect_success"),
        folder_id: data.get_i64("folder_id"),
        request_method: data.get_i64("request_method"),
        schedule: data.get_block("schedule").map(expand_schedule),
        auth: data.get_block("auth").map(|auth| JobAuth {
            enable: bool_field(auth, "enable"),
            user: string_field(auth, "user"),
            password: string_field(auth, "password"),
        }),
        notification: data.get_block("notification").map(|n| JobNotification {
            on_failure: bool_field(n, "on_failure"),
            on_success: bool_field(n, "on_success"),
            on_disable: bool_field(n, "on_disable"),
        }),
        extended_data: data.get_block("extended_data").map(|ext| JobExtendedData {
            headers: string_map_field(ext, "headers"),
            body: string_field(ext, "body"),
        }),
    }
}

/// Writes the scalar job fields shared by the resource and data sources
pub(crate) fn set_job_fields(attributes: &mut Map<String, Value>, job: &Job) {
    attributes.insert("title".into(), job.title.clone().into());
    attributes.insert("url".into(), job.url.clone().into());
    attributes.insert("enabled".into(), job.enabled.into());
    attributes.insert("save_responses".into(), job.save_responses.into());
    attributes.insert("request_timeout".into(), job.request_timeout.into());
    attributes.insert("redirect_success".into(), job.redirect_success.into());
    attributes.insert("folder_id".into(), job.folder_id.into());
    attributes.insert("request_method".into(), job.request_method.into());
    attributes.insert("type".into(), job.job_type.into());
    attributes.insert("last_status".into(), job.last_status.into());
    attributes.insert("last_duration".into(), job.last_duration.into());
    attributes.insert("last_execution".into(), job.last_execution.into());
    match job.next_execution {
        Some(next) => {
            attributes.insert("next_execution".into(), next.into());
        }
        None => {
            attributes.remove("next_execution");
        }
    }
}

/// Schedule block as returned by the API, without reconciliation
pub(crate) fn flatten_schedule(schedule: &JobSchedule) -> Value {
    serde_json::json!([{
        "timezone": schedule.timezone,
        "expires_at": schedule.expires_at,
        "hours": schedule.hours,
        "mdays": schedule.mdays,
        "minutes": schedule.minutes,
        "months": schedule.months,
        "wdays": schedule.wdays,
    }])
}

fn reconciled_schedule(
    prior: Option<&Map<String, Value>>,
    remote: &JobSchedule,
) -> Map<String, Value> {
    let empty = Map::new();
    let prior = prior.unwrap_or(&empty);
    let remote_fields = [
        ("hours", &remote.hours),
        ("mdays", &remote.mdays),
        ("minutes", &remote.minutes),
        ("months", &remote.months),
        ("wdays", &remote.wdays),
    ];

    let mut fields = Map::new();
    fields.insert("timezone".into(), remote.timezone.clone().into());
    fields.insert("expires_at".into(), remote.expires_at.into());
    for (name, values) in remote_fields {
        let reconciled = reconcile_schedule_slice(&int_list_field(prior, name), values);
        fields.insert(name.into(), reconciled.into());
    }
    fields
}

/// Writes a detailed job into resource state, keeping wildcard schedule
/// representations and the password from the prior state
fn apply_remote(data: &mut ResourceData, remote: &DetailedJob) {
    let schedule = reconciled_schedule(data.get_block("schedule"), &remote.job.schedule);
    let prior_password = data
        .get_block("auth")
        .map(|auth| string_field(auth, "password"))
        .unwrap_or_default();

    set_job_fields(&mut data.attributes, &remote.job);
    data.set_block("schedule", schedule);

    let password = if remote.auth.password.is_empty() {
        prior_password
    } else {
        remote.auth.password.clone()
    };
    let mut auth = Map::new();
    auth.insert("enable".into(), remote.auth.enable.into());
    auth.insert("user".into(), remote.auth.user.clone().into());
    auth.insert("password".into(), password.into());
    data.set_block("auth", auth);

    let mut notification = Map::new();
    notification.insert("on_failure".into(), remote.notification.on_failure.into());
    notification.insert("on_success".into(), remote.notification.on_success.into());
    notification.insert("on_disable".into(), remote.notification.on_disable.into());
    data.set_block("notification", notification);

    let headers: Map<String, Value> = remote
        .extended_data
        .headers
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();
    let mut extended = Map::new();
    extended.insert("headers".into(), Value::Object(headers));
    extended.insert("body".into(), remote.extended_data.body.clone().into());
    data.set_block("extended_data", extended);
}

#[async_trait]
impl Resource for JobResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::new(Self::block())
    }

    async fn create(&self, client: &ApiClient, data: &mut ResourceData) -> Result<()> {
        let payload = expand_job(data);
        let job_id = client.create_job(&payload).await?;
        info!(job_id = job_id, "Created job");

        data.set_id(job_id.to_string());
        self.read(client, data).await
    }

    async fn read(&self, client: &ApiClient, data: &mut ResourceData) -> Result<()> {
        let job_id = require_id(data)?.to_string();
        match client.get_job_details(&job_id).await {
            Ok(remote) => {
                debug!(job_id = %job_id, "Read job");
                apply_remote(data, &remote);
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                warn!(job_id = %job_id, "Job not found, removing from state");
                data.clear_id();
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update(
        &self,
        client: &ApiClient,
        data: &mut ResourceData,
        config: &Map<String, Value>,
    ) -> Result<()> {
        let job_id = require_id(data)?.to_string();
        let payload = expand_job(&ResourceData::new(config.clone()));
        client.update_job(&job_id, &payload).await?;
        info!(job_id = %job_id, "Updated job");

        self.read(client, data).await
    }

    async fn delete(&self, client: &ApiClient, data: &mut ResourceData) -> Result<()> {
        let job_id = require_id(data)?.to_string();
        client.delete_job(&job_id).await?;
        info!(job_id = %job_id, "Deleted job");

        data.clear_id();
        Ok(())
    }
}
