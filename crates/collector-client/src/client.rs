//! Collector API client.
//!
//! Thin reqwest wrapper over the collector REST endpoints. Every request
//! carries a fixed client-side timeout; a timeout or non-2xx response is
//! surfaced as an error and the caller decides whether to retry (the sync
//! engine treats all of them as retry-later).

use std::time::Duration;

use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use crate::error::{CollectorError, Result};
use crate::types::{ApiErrorResponse, AssignmentsResponse, LoginRequest, LoginResponse};

/// Fixed timeout for collector requests.
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const MAX_LOG_BODY_CHARS: usize = 512;

/// Client for the survey collector REST API.
#[derive(Debug, Clone)]
pub struct CollectorClient {
    client: reqwest::Client,
    base_url: String,
}

impl CollectorClient {
    /// Create a new collector client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The base URL of the collector API
    ///   (e.g., "https://survey.example.gov.in/api")
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn headers(&self, token: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let auth_value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| CollectorError::auth("Invalid access token format"))?;
        headers.insert(AUTHORIZATION, auth_value);

        Ok(headers)
    }

    fn log_response(status: reqwest::StatusCode, body: &str) {
        if status.is_success() {
            debug!("collector response status: {}", status);
            return;
        }

        let mut preview = body.chars().take(MAX_LOG_BODY_CHARS).collect::<String>();
        if body.chars().count() > MAX_LOG_BODY_CHARS {
            preview.push_str("...");
        }
        debug!("collector response error ({}): {}", status, preview);
    }

    /// Parse a JSON response body, surfacing collector failure bodies
    /// (`{message, errors?}` or `{error}`) as API errors.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;
        Self::log_response(status, &body);

        if !status.is_success() {
            if let Ok(error) = serde_json::from_str::<ApiErrorResponse>(&body) {
                return Err(CollectorError::api(
                    status.as_u16(),
                    error.display_message(),
                ));
            }
            return Err(CollectorError::api(
                status.as_u16(),
                format!("Request failed: {}", body),
            ));
        }

        serde_json::from_str(&body).map_err(|e| {
            log::error!("Failed to deserialize response. Body: {}, Error: {}", body, e);
            CollectorError::api(status.as_u16(), format!("Failed to parse response: {}", e))
        })
    }

    /// Authenticate and obtain a bearer token.
    ///
    /// POST /auth/login
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse> {
        let url = format!("{}/auth/login", self.base_url);
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };

        let response = self.client.post(&url).json(&request).send().await?;
        Self::parse_response(response).await
    }

    /// Upload one completed survey. All-or-nothing per survey: a non-2xx
    /// response means nothing was stored server-side.
    ///
    /// POST /surveys/addSurvey
    pub async fn submit_survey(
        &self,
        token: &str,
        payload: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        let url = format!("{}/surveys/addSurvey", self.base_url);

        let response = self
            .client
            .post(&url)
            .headers(self.headers(token)?)
            .json(payload)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// The surveyor's ward/mohalla assignments.
    ///
    /// GET /surveyor/my-assignments
    pub async fn my_assignments(
        &self,
        token: &str,
    ) -> Result<Vec<patwari_core::masterdata::Assignment>> {
        let url = format!("{}/surveyor/my-assignments", self.base_url);

        let response = self
            .client
            .get(&url)
            .headers(self.headers(token)?)
            .send()
            .await?;

        let wrapper: AssignmentsResponse = Self::parse_response(response).await?;
        Ok(wrapper.assignments)
    }

    /// The full lookup-table bundle.
    ///
    /// GET /master-data/all
    pub async fn master_data(
        &self,
        token: &str,
    ) -> Result<patwari_core::masterdata::MasterDataBundle> {
        let url = format!("{}/master-data/all", self.base_url);

        let response = self
            .client
            .get(&url)
            .headers(self.headers(token)?)
            .send()
            .await?;

        Self::parse_response(response).await
    }
}

#[async_trait::async_trait]
impl patwari_core::sync::SurveyCollectorApi for CollectorClient {
    async fn submit_survey(
        &self,
        token: &str,
        payload: serde_json::Value,
    ) -> patwari_core::Result<serde_json::Value> {
        CollectorClient::submit_survey(self, token, &payload)
            .await
            .map_err(Into::into)
    }
}

#[async_trait::async_trait]
impl patwari_core::masterdata::ReferenceDataApi for CollectorClient {
    async fn fetch_master_data(
        &self,
        token: &str,
    ) -> patwari_core::Result<patwari_core::masterdata::MasterDataBundle> {
        self.master_data(token).await.map_err(Into::into)
    }

    async fn fetch_assignments(
        &self,
        token: &str,
    ) -> patwari_core::Result<Vec<patwari_core::masterdata::Assignment>> {
        self.my_assignments(token).await.map_err(Into::into)
    }
}
