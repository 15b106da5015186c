//! LanguageTool HTTP grammar checker
//!
//! Requires the `languagetool` feature:
//! ```toml
//! podium = { version = "0.4", features = ["languagetool"] }
//! ```

use super::GrammarChecker;
use crate::ServiceError;
use std::time::Duration;

const DEFAULT_LANGUAGE: &str = "en-US";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for a LanguageTool server's `/v2/check` endpoint
pub struct LanguageToolClient {
    base_url: String,
    language: String,
    client: reqwest::blocking::Client,
}

impl LanguageToolClient {
    pub fn new(base_url: &str) -> Result<Self, ServiceError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ServiceError::Failed(e.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            client,
        })
    }

    /// Set the language code sent with each request
    pub fn language(mut self, language: &str) -> Self {
        self.language = language.to_string();
        self
    }

    fn endpoint(&self) -> String {
        if self.base_url.ends_with("/v2/check") {
            self.base_url.clone()
        } else {
            format!("{}/v2/check", self.base_url)
        }
    }
}

impl GrammarChecker for LanguageToolClient {
    fn name(&self) -> &str {
        "LanguageTool"
    }

    fn check(&self, text: &str) -> Result<usize, ServiceError> {
        let response = self
            .client
            .post(self.endpoint())
            .form(&[("text", text), ("language", self.language.as_str())])
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    ServiceError::Unavailable(format!("LanguageTool at {}", self.base_url))
                } else {
                    ServiceError::Failed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ServiceError::Failed(format!("{}: {}", status, body)));
        }

        let json: serde_json::Value = response
            .json()
            .map_err(|e| ServiceError::Failed(format!("invalid response: {}", e)))?;
        count_matches(&json)
    }
}

fn count_matches(json: &serde_json::Value) -> Result<usize, ServiceError> {
    json["matches"]
        .as_array()
        .map(|m| m.len())
        .ok_or_else(|| ServiceError::Failed("response has no matches array".to_string()))
}
