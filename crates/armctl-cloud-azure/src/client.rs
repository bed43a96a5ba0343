//! Azure Resource Manager REST client
//!
//! Bearer-token JSON calls against the management endpoint. Handles the
//! three ARM conventions every resource client needs: error envelopes,
//! `nextLink` pagination and long-running PUTs that answer with an
//! `Azure-AsyncOperation` or `Location` header.

use crate::config::ArmConfig;
use crate::error::{
    ErrorBody, Result, classify_status, classify_transport, parse_retry_after,
};
use armctl_cloud::wire::Page;
use armctl_cloud::{ProviderError, ProviderResult};
use reqwest::header::{HeaderMap, LOCATION, RETRY_AFTER};
use reqwest::{Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const ASYNC_OPERATION: &str = "azure-asyncoperation";

/// Status document returned by an `Azure-AsyncOperation` URL
#[derive(Debug, Deserialize)]
struct OperationStatus {
    status: String,
    #[serde(default)]
    error: Option<ErrorBody>,
}

#[derive(Debug, PartialEq, Eq)]
enum OperationState {
    Running,
    Succeeded,
    Failed,
}

fn operation_state(status: &str) -> OperationState {
    if status.eq_ignore_ascii_case("Succeeded") {
        OperationState::Succeeded
    } else if status.eq_ignore_ascii_case("Failed") || status.eq_ignore_ascii_case("Canceled") {
        OperationState::Failed
    } else {
        OperationState::Running
    }
}

fn header<'a>(headers: &'a HeaderMap, name: impl reqwest::header::AsHeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Shared HTTP client for all ARM resource clients
#[derive(Debug, Clone)]
pub struct ArmClient {
    http: reqwest::Client,
    config: ArmConfig,
}

impl ArmClient {
    pub fn new(config: ArmConfig) -> Result<Self> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("armctl/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ArmConfig {
        &self.config
    }

    pub fn subscription_id(&self) -> &str {
        &self.config.subscription_id
    }

    /// Build `{endpoint}/{segments...}?api-version=...&{query...}`
    ///
    /// Segments are percent-encoded individually.
    pub fn url(
        &self,
        segments: &[&str],
        api_version: &str,
        query: &[(&str, &str)],
    ) -> ProviderResult<Url> {
        let mut url = Url::parse(&self.config.endpoint).map_err(|e| {
            ProviderError::Transport(format!("invalid endpoint '{}': {e}", self.config.endpoint))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                ProviderError::Transport(format!(
                    "endpoint cannot carry a path: {}",
                    self.config.endpoint
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        url.query_pairs_mut()
            .append_pair("api-version", api_version)
            .extend_pairs(query);
        Ok(url)
    }

    /// GET a single JSON document
    pub async fn get_json<T: DeserializeOwned>(&self, url: Url) -> ProviderResult<T> {
        debug!(%url, "GET");
        let response = self.execute(self.http.get(url)).await?;
        decode(response).await
    }

    /// GET every page of a `{"value": [...], "nextLink": ...}` collection
    pub async fn list_paged<T: DeserializeOwned>(&self, url: Url) -> ProviderResult<Vec<T>> {
        let mut items = Vec::new();
        let mut next = Some(url.to_string());
        let mut pages = 0u32;

        while let Some(link) = next.take() {
            debug!(url = %link, "GET page");
            let response = self.execute(self.http.get(&link)).await?;
            let page: Page<T> = decode(response).await?;
            pages += 1;
            items.extend(page.value);
            next = page.next_link.filter(|n| !n.is_empty() && *n != link);
        }

        debug!(pages, count = items.len(), "listed collection");
        Ok(items)
    }

    /// PUT a JSON body and wait for the resource to settle
    ///
    /// When ARM answers with a long-running operation, the operation is
    /// polled to completion and the resource is re-read from `url`.
    pub async fn put_json<B, T>(&self, url: Url, body: &B) -> ProviderResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!(%url, "PUT");
        let response = self.execute(self.http.put(url.clone()).json(body)).await?;
        let status = response.status();
        let headers = response.headers();
        let retry_after = parse_retry_after(header(headers, RETRY_AFTER));
        let async_operation = header(headers, ASYNC_OPERATION).map(str::to_string);
        let location = header(headers, LOCATION).map(str::to_string);

        if let Some(operation_url) = async_operation {
            self.poll_async_operation(&operation_url, retry_after).await?;
            return self.get_json(url).await;
        }
        if status == StatusCode::ACCEPTED {
            if let Some(location_url) = location {
                self.poll_location(&location_url, retry_after).await?;
                return self.get_json(url).await;
            }
        }
        decode(response).await
    }

    async fn execute(&self, request: reqwest::RequestBuilder) -> ProviderResult<Response> {
        let response = request
            .bearer_auth(&self.config.access_token)
            .send()
            .await
            .map_err(|e| classify_transport(&e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let retry_after = parse_retry_after(header(response.headers(), RETRY_AFTER));
        let body = response.text().await.unwrap_or_default();
        let err = classify_status(status.as_u16(), retry_after, &body);
        if !err.is_not_found() {
            warn!(status = status.as_u16(), error = %err, "ARM request failed");
        }
        Err(err)
    }

    async fn poll_async_operation(
        &self,
        operation_url: &str,
        mut delay: Option<Duration>,
    ) -> ProviderResult<()> {
        for attempt in 1..=self.config.max_polls {
            tokio::time::sleep(delay.unwrap_or(self.config.poll_interval)).await;

            let response = self.execute(self.http.get(operation_url)).await?;
            delay = parse_retry_after(header(response.headers(), RETRY_AFTER));
            let status: OperationStatus = decode(response).await?;
            debug!(attempt, status = %status.status, "polled async operation");

            match operation_state(&status.status) {
                OperationState::Running => continue,
                OperationState::Succeeded => return Ok(()),
                OperationState::Failed => {
                    return Err(ProviderError::OperationFailed {
                        status: status.status,
                        message: status.error.map(|e| e.message).unwrap_or_default(),
                    });
                }
            }
        }
        Err(self.polls_exhausted())
    }

    async fn poll_location(&self, location_url: &str, mut delay: Option<Duration>) -> ProviderResult<()> {
        for attempt in 1..=self.config.max_polls {
            tokio::time::sleep(delay.unwrap_or(self.config.poll_interval)).await;

            let response = self.execute(self.http.get(location_url)).await?;
            debug!(attempt, status = response.status().as_u16(), "polled location");
            if response.status() != StatusCode::ACCEPTED {
                return Ok(());
            }
            delay = parse_retry_after(header(response.headers(), RETRY_AFTER));
        }
        Err(self.polls_exhausted())
    }

    fn polls_exhausted(&self) -> ProviderError {
        ProviderError::Timeout(format!(
            "long-running operation still running after {} polls",
            self.config.max_polls
        ))
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> ProviderResult<T> {
    let body = response.text().await.map_err(|e| classify_transport(&e))?;
    serde_json::from_str(&body).map_err(|e| ProviderError::Malformed(e.to_string()))
}
