use serde::{Deserialize, Serialize};

/// Default cron-job.org API endpoint (no trailing slash)
pub const DEFAULT_API_URL: &str = "https://api.cron-job.org";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

/// Configuration summary that is safe to log
#[derive(Debug, Clone, PartialEq)]
pub struct SafeConfigSummary {
    pub api_url: String,
    pub api_key_configured: bool,
    pub timeout_seconds: u64,
    pub max_retries: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: None,
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl ProviderConfig {
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Returns true if a non-empty API key is set
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// Returns a summary without the API key
    pub fn get_safe_summary(&self) -> SafeConfigSummary {
        SafeConfigSummary {
            api_url: self.api_url.clone(),
            api_key_configured: self.has_api_key(),
            timeout_seconds: self.timeout_seconds,
            max_retries: self.max_retries,
        }
    }
}
