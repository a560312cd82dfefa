//! Wire types for the cron-job.org REST API
//!
//! All structs use the API's camelCase field names. Fields the API omits
//! decode to their zero value so partially populated responses still parse.

use std::collections::BTreeMap;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// Execution schedule of a job
///
/// Each time-unit array uses `[-1]` to mean "every unit".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobSchedule {
    /// Schedule time zone, e.g. `Europe/Berlin`
    pub timezone: String,
    /// Expiry as `YYYYMMDDhhmmss` in the job's time zone, 0 = never
    pub expires_at: i64,
    pub hours: Vec<i64>,
    pub mdays: Vec<i64>,
    pub minutes: Vec<i64>,
    pub months: Vec<i64>,
    pub wdays: Vec<i64>,
}

/// Job summary as returned by the job listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Job {
    pub job_id: i64,
    pub enabled: bool,
    pub title: String,
    pub save_responses: bool,
    pub url: String,
    pub last_status: i64,
    /// Last execution duration in milliseconds
    pub last_duration: i64,
    /// Unix timestamp of the last execution, in seconds
    pub last_execution: i64,
    /// Unix timestamp of the predicted next execution, if any
    pub next_execution: Option<i64>,
    /// 0 = default job, 1 = monitoring job
    #[serde(rename = "type")]
    pub job_type: i64,
    pub request_timeout: i64,
    pub redirect_success: bool,
    pub folder_id: i64,
    pub schedule: JobSchedule,
    pub request_method: i64,
}

/// HTTP basic authentication settings of a job
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobAuth {
    pub enable: bool,
    pub user: String,
    pub password: String,
}

/// Notification settings of a job
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobNotification {
    pub on_failure: bool,
    /// Notify when the job succeeds after a prior failure
    pub on_success: bool,
    /// Notify when the job was disabled automatically
    pub on_disable: bool,
}

/// Extra request data (headers and body) sent by the job
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobExtendedData {
    #[serde(deserialize_with = "deserialize_headers")]
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

/// Decodes request headers that may arrive as an object, `null` or `[]`
///
/// The API serializes an empty header map as an empty JSON array.
fn deserialize_headers<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Headers {
        Map(BTreeMap<String, String>),
        List(Vec<serde_json::Value>),
    }

    match Option::<Headers>::deserialize(deserializer)? {
        None => Ok(BTreeMap::new()),
        Some(Headers::Map(map)) => Ok(map),
        Some(Headers::List(list)) if list.is_empty() => Ok(BTreeMap::new()),
        Some(Headers::List(_)) => Err(de::Error::custom(
            "expected headers to be an object, found a non-empty array",
        )),
    }
}

/// Full job as returned by `GET /jobs/<id>`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedJob {
    #[serde(flatten)]
    pub job: Job,
    #[serde(default)]
    pub auth: JobAuth,
    #[serde(default)]
    pub notification: JobNotification,
    #[serde(default)]
    pub extended_data: JobExtendedData,
}

/// Writable job fields sent on create and update
///
/// Unset fields are omitted so a PATCH only touches what was configured.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_responses: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_success: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_method: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<JobSchedule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<JobAuth>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<JobNotification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extended_data: Option<JobExtendedData>,
}

/// Response of `GET /jobs`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobList {
    pub jobs: Vec<Job>,
    /// True if some jobs could not be retrieved due to internal errors
    pub some_failed: bool,
}

/// Timing information of a single execution, in microseconds
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HistoryItemStats {
    pub name_lookup: i64,
    pub connect: i64,
    pub app_connect: i64,
    pub pre_transfer: i64,
    pub start_transfer: i64,
    pub total: i64,
}

/// One entry of a job's execution history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HistoryItem {
    pub job_log_id: i64,
    pub job_id: i64,
    pub identifier: String,
    pub date: i64,
    pub date_planned: i64,
    /// Scheduling jitter in milliseconds
    pub jitter: i64,
    pub url: String,
    pub duration: i64,
    pub status: i64,
    pub status_text: String,
    pub http_status: i64,
    /// Raw response headers, only present when responses are saved
    pub headers: Option<String>,
    /// Raw response body, only present when responses are saved
    pub body: Option<String>,
    pub stats: HistoryItemStats,
}

/// Response of `GET /jobs/<id>/history`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobHistory {
    pub history: Vec<HistoryItem>,
    /// Unix timestamps of the next predicted executions
    pub predictions: Vec<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Folder {
    pub folder_id: i64,
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatusPage {
    pub status_page_id: i64,
    pub title: String,
}
