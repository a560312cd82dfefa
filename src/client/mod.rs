//! Thin HTTP client for the cron-job.org REST API
//!
//! Every request carries `Authorization: Bearer <api_key>`. Bodies are
//! JSON-encoded, and any status >= 400 is turned into an [`ApiError::Api`]
//! carrying the status code, the message found in the body and the raw body.
//!
//! # Example
//!
//! ```rust,no_run
//! use cronjoborg::client::ApiClient;
//!
//! async fn example() -> cronjoborg::client::error::Result<()> {
//!     let client = ApiClient::new("https://api.cron-job.org", "your-api-key");
//!     let jobs = client.get_jobs().await?;
//!     println!("{} jobs", jobs.jobs.len());
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub mod error;
pub mod types;

pub use error::ApiError;
pub use types::{
    DetailedJob, Folder, HistoryItem, HistoryItemStats, Job, JobAuth, JobExtendedData, JobHistory,
    JobList, JobNotification, JobPayload, JobSchedule, StatusPage,
};

use crate::config::ProviderConfig;
use error::Result;

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_MAX_RETRIES: u32 = 3;
const MAX_BACKOFF_SECONDS: u64 = 60;

#[derive(Serialize)]
struct JobRequest<'a> {
    job: &'a JobPayload,
}

#[derive(Serialize)]
struct TitleRequest<'a> {
    title: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateJobResponse {
    job_id: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobDetailsResponse {
    job_details: DetailedJob,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateFolderResponse {
    folder_id: i64,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct FolderListResponse {
    folders: Vec<Folder>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateStatusPageResponse {
    status_page_id: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusPageResponse {
    status_page: StatusPage,
}

/// Client for the cron-job.org API
#[derive(Debug, Clone)]
pub struct ApiClient {
    /// Base URL without trailing slash
    base_url: String,
    /// API key sent as bearer token
    api_key: String,
    /// HTTP timeout in seconds
    timeout_seconds: u64,
    /// Attempts after the first one for retryable failures
    max_retries: u32,
    http: Client,
}

/// Removes every trailing slash so paths can be appended verbatim
pub fn normalize_base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

impl ApiClient {
    /// Creates a client with default timeout and retry settings
    ///
    /// Falls back to a default `reqwest::Client` if the configured builder
    /// cannot be constructed.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let http = build_http_client(DEFAULT_TIMEOUT_SECONDS).unwrap_or_default();
        Self {
            base_url: normalize_base_url(&base_url.into()),
            api_key: api_key.into(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            max_retries: DEFAULT_MAX_RETRIES,
            http,
        }
    }

    /// Creates a client from provider configuration
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ApiError::config("API key is required"))?;

        Ok(Self {
            base_url: normalize_base_url(&config.api_url),
            api_key: api_key.to_string(),
            timeout_seconds: config.timeout_seconds,
            max_retries: config.max_retries,
            http: build_http_client(config.timeout_seconds)?,
        })
    }

    /// Sets the HTTP timeout
    pub fn with_timeout(mut self, seconds: u64) -> Result<Self> {
        self.http = build_http_client(seconds)?;
        self.timeout_seconds = seconds;
        Ok(self)
    }

    /// Sets how many times retryable failures are retried
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Performs a request against `<base_url><path>`
    ///
    /// Returns the raw response for any status below 400. Rate limiting and
    /// transport failures are retried with exponential backoff.
    pub async fn do_request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        let payload = body
            .map(|b| serde_json::to_vec(b))
            .transpose()
            .map_err(|e| ApiError::serialization(format!("Failed to marshal request body: {}", e)))?;

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            debug!(attempt = attempt, method = %method, path = %path, "Sending API request");

            let mut request = self
                .http
                .request(method.clone(), &url)
                .header("Authorization", format!("Bearer {}", self.api_key));
            if let Some(bytes) = &payload {
                request = request
                    .header("Content-Type", "application/json")
                    .body(bytes.clone());
            }

            let error = match request.send().await {
                Ok(resp) => {
                    let status = resp.status();
                    debug!(status = %status, method = %method, path = %path, "Received API response");
                    if status.as_u16() < 400 {
                        return Ok(resp);
                    }

                    let retry_after = retry_after_seconds(&resp);
                    let body = resp.text().await.unwrap_or_default();
                    let err = ApiError::from_response(status.as_u16(), body);
                    if status == StatusCode::TOO_MANY_REQUESTS {
                        (err, retry_after)
                    } else {
                        return Err(err);
                    }
                }
                Err(e) if e.is_timeout() => (ApiError::timeout(self.timeout_seconds), None),
                Err(e) => (ApiError::from(e), None),
            };

            let (err, retry_after) = error;
            if attempt > self.max_retries || !err.is_retryable() {
                return Err(err);
            }

            let delay = retry_after.unwrap_or_else(|| backoff_delay(attempt));
            warn!(
                attempt = attempt,
                max_retries = self.max_retries,
                delay_secs = delay,
                error = %err,
                "API request failed, retrying"
            );
            tokio::time::sleep(Duration::from_secs(delay)).await;
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let resp = self.do_request::<()>(Method::GET, path, None).await?;
        decode(resp).await
    }

    /// Lists all jobs of the account
    pub async fn get_jobs(&self) -> Result<JobList> {
        let list: JobList = self.get_json("/jobs").await?;
        debug!(count = list.jobs.len(), some_failed = list.some_failed, "Fetched jobs");
        Ok(list)
    }

    /// Finds a job summary by id in the job listing
    pub async fn get_job(&self, job_id: &str) -> Result<Job> {
        let list = self.get_jobs().await?;
        list.jobs
            .into_iter()
            .find(|job| job.job_id.to_string() == job_id)
            .ok_or_else(|| ApiError::api(404, format!("Job {} not found", job_id), ""))
    }

    /// Fetches the full job including auth, notification and extended data
    pub async fn get_job_details(&self, job_id: &str) -> Result<DetailedJob> {
        let resp: JobDetailsResponse = self.get_json(&format!("/jobs/{}", job_id)).await?;
        Ok(resp.job_details)
    }

    /// Fetches execution history and predicted executions of a job
    pub async fn get_job_history(&self, job_id: &str) -> Result<JobHistory> {
        self.get_json(&format!("/jobs/{}/history", job_id)).await
    }

    /// Creates a job and returns its id
    pub async fn create_job(&self, job: &JobPayload) -> Result<i64> {
        let resp = self
            .do_request(Method::PUT, "/jobs", Some(&JobRequest { job }))
            .await?;
        let created: CreateJobResponse = decode(resp).await?;
        Ok(created.job_id)
    }

    /// Updates the given fields of a job
    pub async fn update_job(&self, job_id: &str, job: &JobPayload) -> Result<()> {
        self.do_request(
            Method::PATCH,
            &format!("/jobs/{}", job_id),
            Some(&JobRequest { job }),
        )
        .await?;
        Ok(())
    }

    pub async fn delete_job(&self, job_id: &str) -> Result<()> {
        let body = serde_json::json!({ "jobId": job_id });
        self.do_request(Method::DELETE, &format!("/jobs/{}", job_id), Some(&body))
            .await?;
        Ok(())
    }

    /// Creates a folder and returns its id
    pub async fn create_folder(&self, title: &str) -> Result<i64> {
        let resp = self
            .do_request(Method::PUT, "/folders", Some(&TitleRequest { title }))
            .await?;
        let created: CreateFolderResponse = decode(resp).await?;
        Ok(created.folder_id)
    }

    pub async fn get_folders(&self) -> Result<Vec<Folder>> {
        let list: FolderListResponse = self.get_json("/folders").await?;
        Ok(list.folders)
    }

    pub async fn delete_folder(&self, folder_id: &str) -> Result<()> {
        let body = serde_json::json!({ "folderId": folder_id });
        self.do_request(Method::DELETE, &format!("/folders/{}", folder_id), Some(&body))
            .await?;
        Ok(())
    }

    /// Creates a status page and returns its id
    pub async fn create_status_page(&self, title: &str) -> Result<i64> {
        let resp = self
            .do_request(Method::PUT, "/statuspages", Some(&TitleRequest { title }))
            .await?;
        let created: CreateStatusPageResponse = decode(resp).await?;
        Ok(created.status_page_id)
    }

    pub async fn get_status_page(&self, status_page_id: &str) -> Result<StatusPage> {
        let resp: StatusPageResponse = self
            .get_json(&format!("/statuspages/{}", status_page_id))
            .await?;
        Ok(resp.status_page)
    }

    pub async fn delete_status_page(&self, status_page_id: &str) -> Result<()> {
        let body = serde_json::json!({ "statusPageId": status_page_id });
        self.do_request(
            Method::DELETE,
            &format!("/statuspages/{}", status_page_id),
            Some(&body),
        )
        .await?;
        Ok(())
    }
}

fn build_http_client(timeout_seconds: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .build()
        .map_err(|e| ApiError::config(format!("Failed to build HTTP client: {}", e)))
}

/// Exponential backoff in seconds for the given attempt (1-based), capped
fn backoff_delay(attempt: u32) -> u64 {
    2_u64
        .saturating_pow(attempt.saturating_sub(1))
        .min(MAX_BACKOFF_SECONDS)
}

fn retry_after_seconds(resp: &reqwest::Response) -> Option<u64> {
    resp.headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes)
        .map_err(|e| ApiError::serialization(format!("Failed to parse response: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn test_client(server: &MockServer) -> ApiClient {
        ApiClient::new(server.base_url(), "test-key").with_max_retries(0)
    }

    #[test]
    fn test_new_client_trims_trailing_slashes() {
        let client = ApiClient::new("https://api.cron-job.org///", "test-api-key");
        assert_eq!(client.base_url(), "https://api.cron-job.org");
        assert_eq!(client.timeout_seconds(), DEFAULT_TIMEOUT_SECONDS);
        assert_eq!(client.max_retries(), DEFAULT_MAX_RETRIES);
    }

    #[test]
    fn test_from_config_requires_api_key() {
        let config = ProviderConfig::default();
        let err = ApiClient::from_config(&config).unwrap_err();
        assert!(matches!(err, ApiError::Config { .. }));

        let config = ProviderConfig::default()
            .with_api_key("key")
            .with_api_url("https://custom.example.com/api/");
        let client = ApiClient::from_config(&config).unwrap();
        assert_eq!(client.base_url(), "https://custom.example.com/api");
    }

    #[tokio::test]
    async fn test_do_request_sets_bearer_token() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/test")
                    .header("Authorization", "Bearer test-key")
                    .header_missing("Content-Type");
                then.status(200).body(r#"{"success": true}"#);
            })
            .await;

        let resp = test_client(&server)
            .do_request::<()>(reqwest::Method::GET, "/test", None)
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_do_request_with_body_sets_content_type() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/test")
                    .header("Content-Type", "application/json")
                    .json_body(json!({"title": "Test Job"}));
                then.status(200).body(r#"{"success": true}"#);
            })
            .await;

        let body = json!({"title": "Test Job"});
        let resp = test_client(&server)
            .do_request(reqwest::Method::POST, "/test", Some(&body))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_do_request_api_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/test");
                then.status(400).body(r#"{"error": "Invalid request"}"#);
            })
            .await;

        let err = test_client(&server)
            .do_request::<()>(reqwest::Method::GET, "/test", None)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ApiError::api(400, "Invalid request", r#"{"error": "Invalid request"}"#)
        );
    }

    #[tokio::test]
    async fn test_rate_limit_without_retries_budget() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/jobs");
                then.status(429).body(r#"{"message": "Too many requests"}"#);
            })
            .await;

        let err = test_client(&server).get_jobs().await.unwrap_err();

        assert_eq!(err.status_code(), Some(429));
        assert!(err.is_retryable());
        mock.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn test_rate_limit_is_retried_with_retry_after() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/jobs");
                then.status(429).header("Retry-After", "0").body("");
            })
            .await;

        let client = ApiClient::new(server.base_url(), "test-key").with_max_retries(2);
        let err = client.get_jobs().await.unwrap_err();

        assert_eq!(err.status_code(), Some(429));
        mock.assert_hits_async(3).await;
    }

    #[test]
    fn test_backoff_delay_is_capped() {
        assert_eq!(backoff_delay(1), 1);
        assert_eq!(backoff_delay(2), 2);
        assert_eq!(backoff_delay(4), 8);
        assert_eq!(backoff_delay(7), MAX_BACKOFF_SECONDS);
        assert_eq!(backoff_delay(65), MAX_BACKOFF_SECONDS);
        assert_eq!(backoff_delay(u32::MAX), MAX_BACKOFF_SECONDS);
    }

    #[tokio::test]
    async fn test_connection_refused_is_retried_then_network_error() {
        // Bind and drop a listener so the port is closed
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();

        let client =
            ApiClient::new(format!("http://127.0.0.1:{}", port), "test-key").with_max_retries(1);
        let started = std::time::Instant::now();
        let err = client
            .do_request::<()>(reqwest::Method::GET, "/jobs", None)
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Network { .. }), "got {:?}", err);
        // One backoff of 1s between the two attempts
        assert!(started.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_slow_response_maps_to_timeout() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/jobs");
                then.status(200)
                    .delay(Duration::from_secs(3))
                    .json_body(json!({"jobs": []}));
            })
            .await;

        let client = ApiClient::new(server.base_url(), "test-key")
            .with_max_retries(0)
            .with_timeout(1)
            .unwrap();
        let err = client.get_jobs().await.unwrap_err();

        assert_eq!(err, ApiError::Timeout { seconds: 1 });
        assert!(err.is_retryable());
        mock.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn test_get_jobs() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/jobs");
                then.status(200).json_body(json!({
                    "jobs": [
                        {
                            "jobId": 1,
                            "title": "Test Job 1",
                            "url": "https://example.com/1",
                            "enabled": true,
                            "saveResponses": false,
                            "schedule": {
                                "timezone": "UTC",
                                "hours": [10],
                                "mdays": [-1],
                                "minutes": [0],
                                "months": [-1],
                                "wdays": [-1]
                            }
                        },
                        {
                            "jobId": 2,
                            "title": "Test Job 2",
                            "url": "https://example.com/2",
                            "enabled": false,
                            "saveResponses": true
                        }
                    ],
                    "someFailed": true
                }));
            })
            .await;

        let list = test_client(&server).get_jobs().await.unwrap();

        assert_eq!(list.jobs.len(), 2);
        assert!(list.some_failed);
        assert_eq!(list.jobs[0].job_id, 1);
        assert_eq!(list.jobs[0].title, "Test Job 1");
        assert_eq!(list.jobs[0].schedule.hours, vec![10]);
        assert_eq!(list.jobs[1].job_id, 2);
        assert!(list.jobs[1].save_responses);
    }

    #[tokio::test]
    async fn test_get_job_found_and_missing() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/jobs");
                then.status(200)
                    .json_body(json!({"jobs": [{"jobId": 1, "title": "Test Job 1"}]}));
            })
            .await;

        let client = test_client(&server);
        let job = client.get_job("1").await.unwrap();
        assert_eq!(job.job_id, 1);
        assert_eq!(job.title, "Test Job 1");

        let err = client.get_job("999").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_get_job_details() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/jobs/123");
                then.status(200).json_body(json!({
                    "jobDetails": {
                        "jobId": 123,
                        "title": "Test Job",
                        "url": "https://example.com",
                        "enabled": true,
                        "extendedData": {"headers": [], "body": ""}
                    }
                }));
            })
            .await;

        let details = test_client(&server).get_job_details("123").await.unwrap();

        assert_eq!(details.job.title, "Test Job");
        assert_eq!(details.job.url, "https://example.com");
        assert!(details.extended_data.headers.is_empty());
    }

    #[tokio::test]
    async fn test_get_job_history() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/jobs/1/history");
                then.status(200).json_body(json!({
                    "history": [
                        {"jobId": 1, "date": 1672567200, "status": 1, "httpStatus": 200, "duration": 150},
                        {"jobId": 1, "date": 1672563600, "status": 4, "httpStatus": 404, "duration": 100}
                    ],
                    "predictions": [1672570800]
                }));
            })
            .await;

        let history = test_client(&server).get_job_history("1").await.unwrap();

        assert_eq!(history.history.len(), 2);
        assert_eq!(history.history[0].http_status, 200);
        assert_eq!(history.history[1].http_status, 404);
        assert_eq!(history.predictions, vec![1_672_570_800]);
    }

    #[tokio::test]
    async fn test_create_job() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(PUT).path("/jobs").json_body(json!({
                    "job": {"title": "Test Job", "url": "https://example.com"}
                }));
                then.status(200).json_body(json!({"jobId": 123}));
            })
            .await;

        let payload = JobPayload {
            title: Some("Test Job".to_string()),
            url: Some("https://example.com".to_string()),
            ..Default::default()
        };
        let job_id = test_client(&server).create_job(&payload).await.unwrap();

        assert_eq!(job_id, 123);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_update_job_body_has_no_job_id() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(PATCH).path("/jobs/123").json_body(json!({
                    "job": {"title": "Updated Job", "url": "https://example.com/updated"}
                }));
                then.status(200);
            })
            .await;

        let payload = JobPayload {
            title: Some("Updated Job".to_string()),
            url: Some("https://example.com/updated".to_string()),
            ..Default::default()
        };
        test_client(&server)
            .update_job("123", &payload)
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_job() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(DELETE)
                    .path("/jobs/123")
                    .json_body(json!({"jobId": "123"}));
                then.status(200);
            })
            .await;

        test_client(&server).delete_job("123").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_folder_endpoints() {
        let server = MockServer::start_async().await;
        let create = server
            .mock_async(|when, then| {
                when.method(PUT)
                    .path("/folders")
                    .json_body(json!({"title": "ops"}));
                then.status(200).json_body(json!({"folderId": 5}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/folders");
                then.status(200)
                    .json_body(json!({"folders": [{"folderId": 5, "title": "ops"}]}));
            })
            .await;
        let delete = server
            .mock_async(|when, then| {
                when.method(DELETE)
                    .path("/folders/5")
                    .json_body(json!({"folderId": "5"}));
                then.status(200);
            })
            .await;

        let client = test_client(&server);
        assert_eq!(client.create_folder("ops").await.unwrap(), 5);
        let folders = client.get_folders().await.unwrap();
        assert_eq!(
            folders,
            vec![Folder {
                folder_id: 5,
                title: "ops".to_string()
            }]
        );
        client.delete_folder("5").await.unwrap();

        create.assert_async().await;
        delete.assert_async().await;
    }

    #[tokio::test]
    async fn test_status_page_endpoints() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(PUT)
                    .path("/statuspages")
                    .json_body(json!({"title": "public"}));
                then.status(200).json_body(json!({"statusPageId": 9}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/statuspages/9");
                then.status(200)
                    .json_body(json!({"statusPage": {"statusPageId": 9, "title": "public"}}));
            })
            .await;
        let delete = server
            .mock_async(|when, then| {
                when.method(DELETE)
                    .path("/statuspages/9")
                    .json_body(json!({"statusPageId": "9"}));
                then.status(200);
            })
            .await;

        let client = test_client(&server);
        assert_eq!(client.create_status_page("public").await.unwrap(), 9);
        assert_eq!(client.get_status_page("9").await.unwrap().title, "public");
        client.delete_status_page("9").await.unwrap();
        delete.assert_async().await;
    }

    #[tokio::test]
    async fn test_invalid_json_response_is_serialization_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/jobs/1");
                then.status(200).body("not json");
            })
            .await;

        let err = test_client(&server).get_job_details("1").await.unwrap_err();
        assert!(matches!(err, ApiError::Serialization { .. }));
    }
}
