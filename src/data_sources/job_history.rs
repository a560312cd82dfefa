//! `cronjoborg_job_history` data source

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use super::{DataSource, job_id_argument, job_id_from};
use crate::client::{ApiClient, HistoryItem};
use crate::provider::error::Result;
use crate::schema::{Attribute, AttributeType, Block, NestedBlock, ResourceData, Schema};

pub const TYPE_NAME: &str = "cronjoborg_job_history";

pub struct JobHistoryDataSource;

/// Null headers and body (responses not saved) become empty strings
fn flatten_history_item(item: &HistoryItem) -> Value {
    json!({
        "job_log_id": item.job_log_id,
        "job_id": item.job_id,
        "identifier": item.identifier,
        "date": item.date,
        "date_planned": item.date_planned,
        "jitter": item.jitter,
        "url": item.url,
        "duration": item.duration,
        "status": item.status,
        "status_text": item.status_text,
        "http_status": item.http_status,
        "headers": item.headers.clone().unwrap_or_default(),
        "body": item.body.clone().unwrap_or_default(),
        "stats": [{
            "name_lookup": item.stats.name_lookup,
            "connect": item.stats.connect,
            "app_connect": item.stats.app_connect,
            "pre_transfer": item.stats.pre_transfer,
            "start_transfer": item.stats.start_transfer,
            "total": item.stats.total,
        }],
    })
}

fn history_item_block() -> Block {
    let int = |description: &str| Attribute::computed(AttributeType::Int).description(description);
    let string =
        |description: &str| Attribute::computed(AttributeType::String).description(description);

    let stats = Block::new()
        .attribute("name_lookup", int("Time until DNS lookup completed (microseconds)"))
        .attribute("connect", int("Time until the connection was established (microseconds)"))
        .attribute("app_connect", int("Time until the TLS handshake completed (microseconds)"))
        .attribute("pre_transfer", int("Time until the transfer was about to start (microseconds)"))
        .attribute("start_transfer", int("Time until the first byte was received (microseconds)"))
        .attribute("total", int("Total request time (microseconds)"));

    Block::new()
        .attribute("job_log_id", int("Identifier of the history entry"))
        .attribute("job_id", int("Identifier of the job"))
        .attribute("identifier", string("Identifier of the execution"))
        .attribute("date", int("Unix timestamp of the actual execution"))
        .attribute("date_planned", int("Unix timestamp of the planned execution"))
        .attribute("jitter", int("Scheduling jitter in milliseconds"))
        .attribute("url", string("The URL that was called"))
        .attribute("duration", int("Request duration in milliseconds"))
        .attribute("status", int("Execution status"))
        .attribute("status_text", string("Human readable execution status"))
        .attribute("http_status", int("HTTP status code of the response"))
        .attribute("headers", string("Raw response headers, if saved"))
        .attribute("body", string("Raw response body, if saved"))
        .block("stats", NestedBlock::computed_list(stats))
}

#[async_trait]
impl DataSource for JobHistoryDataSource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::new(
            Block::new()
                .with_description("Reads the execution history of a cron job")
                .attribute("job_id", job_id_argument())
                .attribute(
                    "predictions",
                    Attribute::computed(AttributeType::list_of(AttributeType::Int))
                        .description("Unix timestamps of the next predicted executions"),
                )
                .block("history", NestedBlock::computed_list(history_item_block())),
        )
    }

    async fn read(&self, client: &ApiClient, data: &mut ResourceData) -> Result<()> {
        let job_id = job_id_from(data)?;
        let history = client.get_job_history(&job_id).await?;
        debug!(job_id = %job_id, entries = history.history.len(), "Read job history");

        data.set_id(format!("job-{}-history-{}", job_id, history.history.len()));
        data.set("predictions", history.predictions.clone());
        data.set(
            "history",
            Value::Array(history.history.iter().map(flatten_history_item).collect()),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn test_client(server: &MockServer) -> ApiClient {
        ApiClient::new(server.base_url(), "test-key").with_max_retries(0)
    }

    #[tokio::test]
    async fn test_read_history() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/jobs/12/history");
                then.status(200).json_body(json!({
                    "history": [
                        {
                            "jobLogId": 100, "jobId": 12, "identifier": "12-1",
                            "date": 1700000000, "datePlanned": 1699999999, "jitter": 12,
                            "url": "https://example.com", "duration": 80, "status": 1,
                            "statusText": "OK", "httpStatus": 200,
                            "headers": null, "body": null,
                            "stats": {"nameLookup": 1, "connect": 2, "appConnect": 3,
                                      "preTransfer": 4, "startTransfer": 5, "total": 6}
                        },
                        {
                            "jobLogId": 101, "jobId": 12, "identifier": "12-2",
                            "status": 4, "statusText": "HTTP error", "httpStatus": 500,
                            "headers": "Content-Type: text/plain", "body": "oops"
                        }
                    ],
                    "predictions": [1700003600, 1700007200]
                }));
            })
            .await;

        let mut data = ResourceData::default();
        data.set("job_id", 12);
        JobHistoryDataSource
            .read(&test_client(&server), &mut data)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(data.id(), "job-12-history-2");
        assert_eq!(data.get("predictions"), Some(&json!([1700003600, 1700007200])));

        let history = data.get("history").unwrap().as_array().unwrap();
        assert_eq!(history[0]["headers"], json!(""));
        assert_eq!(history[0]["body"], json!(""));
        assert_eq!(history[0]["stats"][0]["total"], json!(6));
        assert_eq!(history[1]["headers"], json!("Content-Type: text/plain"));
        assert_eq!(history[1]["http_status"], json!(500));
        assert_eq!(history[1]["stats"][0]["connect"], json!(0));
    }

    #[tokio::test]
    async fn test_read_history_api_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/jobs/12/history");
                then.status(403).body(r#"{"error": "Forbidden"}"#);
            })
            .await;

        let mut data = ResourceData::default();
        data.set("job_id", 12);
        let err = JobHistoryDataSource
            .read(&test_client(&server), &mut data)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "API error 403: Forbidden");
        assert!(!data.exists());
    }
}
