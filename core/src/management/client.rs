//! Management-plane REST client.
//!
//! List operations return a [`Pager`] driving `nextLink` continuation
//! lazily; nothing is fetched until the caller demands a page.

use super::errors::ManagementError;
use super::models::{ErrorResponse, ListResponse, Resource, ResourceGroup, Subscription};
use crate::common::{HttpError, RequestThrottle};
use crate::paging::{Page, PageFetcher, Pager};
use crate::settings::settings;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, RETRY_AFTER};
use serde::de::DeserializeOwned;
use std::num::NonZeroU32;
use std::time::Duration;

const MANAGEMENT_ENDPOINT: &str = "https://management.azure.com";
const API_VERSION_SUBSCRIPTIONS: &str = "2022-12-01";
const API_VERSION_RESOURCE_GROUPS: &str = "2021-04-01";
const API_VERSION_RESOURCES: &str = "2021-04-01";

const CLIENT_REQUEST_ID_HEADER: &str = "x-ms-client-request-id";
const REQUEST_ID_HEADER: &str = "x-ms-request-id";

/// Fallback when a 429 carries no usable Retry-After header.
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(30);

/// Client for the management-plane REST API.
#[derive(Debug, Clone)]
pub struct ManagementClient {
    http: reqwest::Client,
    endpoint: String,
    timeout_secs: u64,
    throttle: Option<RequestThrottle>,
}

/// Builder for [`ManagementClient`].
///
/// The request timeout defaults to the process-wide
/// [`request_timeout`](crate::settings::ClientSettings::request_timeout)
/// setting when not set explicitly.
#[derive(Debug, Default)]
pub struct ManagementClientBuilder {
    endpoint: Option<String>,
    timeout: Option<Duration>,
    requests_per_second: Option<NonZeroU32>,
}

impl ManagementClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the management endpoint (sovereign clouds, emulators).
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set an explicit per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Throttle outbound requests to the given per-second rate.
    pub fn requests_per_second(mut self, requests: NonZeroU32) -> Self {
        self.requests_per_second = Some(requests);
        self
    }

    pub fn build(self) -> Result<ManagementClient, HttpError> {
        let timeout = match self.timeout {
            Some(timeout) => timeout,
            None => settings()
                .request_timeout()
                .map_err(|e| HttpError::ClientBuild {
                    reason: e.to_string(),
                })?,
        };
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HttpError::ClientBuild {
                reason: e.to_string(),
            })?;

        Ok(ManagementClient {
            http,
            endpoint: self
                .endpoint
                .unwrap_or_else(|| MANAGEMENT_ENDPOINT.to_string()),
            timeout_secs: timeout.as_secs(),
            throttle: self.requests_per_second.map(RequestThrottle::per_second),
        })
    }
}

impl ManagementClient {
    /// Wrap an existing HTTP client, using the default endpoint.
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            endpoint: MANAGEMENT_ENDPOINT.to_string(),
            timeout_secs: 30,
            throttle: None,
        }
    }

    pub fn builder() -> ManagementClientBuilder {
        ManagementClientBuilder::new()
    }

    /// The endpoint requests are issued against.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// List all subscriptions accessible to the authenticated principal.
    pub fn list_subscriptions(&self, token: &str) -> Pager<Subscription, ManagementError> {
        let first_url = format!(
            "{}/subscriptions?api-version={}",
            self.endpoint, API_VERSION_SUBSCRIPTIONS
        );
        self.list_pager("list_subscriptions", first_url, token)
    }

    /// List all resource groups in a subscription.
    pub fn list_resource_groups(
        &self,
        token: &str,
        subscription_id: &str,
    ) -> Pager<ResourceGroup, ManagementError> {
        let first_url = format!(
            "{}/subscriptions/{}/resourcegroups?api-version={}",
            self.endpoint, subscription_id, API_VERSION_RESOURCE_GROUPS
        );
        self.list_pager("list_resource_groups", first_url, token)
    }

    /// List all resources in a subscription.
    pub fn list_resources(
        &self,
        token: &str,
        subscription_id: &str,
    ) -> Pager<Resource, ManagementError> {
        let first_url = format!(
            "{}/subscriptions/{}/resources?api-version={}",
            self.endpoint, subscription_id, API_VERSION_RESOURCES
        );
        self.list_pager("list_resources", first_url, token)
    }

    /// Fetch a single subscription.
    pub async fn get_subscription(
        &self,
        token: &str,
        subscription_id: &str,
    ) -> Result<Subscription, ManagementError> {
        let url = format!(
            "{}/subscriptions/{}?api-version={}",
            self.endpoint, subscription_id, API_VERSION_SUBSCRIPTIONS
        );
        self.get_json("get_subscription", &url, token).await
    }

    /// Build a pager for a list operation: the first fetch hits
    /// `first_url`, later fetches follow the service's `nextLink`.
    fn list_pager<T>(
        &self,
        operation: &'static str,
        first_url: String,
        token: &str,
    ) -> Pager<T, ManagementError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let client = self.clone();
        let token = token.to_string();
        let fetch: PageFetcher<T, ManagementError> = Box::new(move |continuation| {
            let client = client.clone();
            let token = token.clone();
            let url = continuation.unwrap_or_else(|| first_url.clone());
            Box::pin(async move {
                let response: ListResponse<T> = client.get_json(operation, &url, &token).await?;
                Ok(Page::new(response.value, response.next_link))
            })
        });
        Pager::new(fetch)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        url: &str,
        token: &str,
    ) -> Result<T, ManagementError> {
        if let Some(throttle) = &self.throttle {
            throttle.acquire().await;
        }

        let client_request_id = uuid::Uuid::new_v4().to_string();
        log::debug!("{operation}: GET {url} [client-request-id {client_request_id}]");

        let response = self
            .http
            .get(url)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(CLIENT_REQUEST_ID_HEADER, &client_request_id)
            .send()
            .await
            .map_err(|e| self.transport_error(url, e))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = retry_after(response.headers());
            log::warn!("{operation}: throttled by service, retry after {retry_after:?}");
            return Err(ManagementError::Throttled { retry_after });
        }

        if !status.is_success() {
            let request_id = response
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(String::from);
            let body = response.text().await.unwrap_or_default();
            let (code, message) = match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(envelope) => (envelope.error.code, envelope.error.message),
                Err(_) => ("Unknown".to_string(), body),
            };
            log::warn!("{operation}: {code} (HTTP {})", status.as_u16());
            return Err(ManagementError::Api {
                code,
                status_code: status.as_u16(),
                message,
                request_id,
                operation,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ManagementError::Decode {
                operation,
                reason: e.to_string(),
            })
    }

    fn transport_error(&self, url: &str, error: reqwest::Error) -> ManagementError {
        if error.is_timeout() {
            ManagementError::Http(HttpError::Timeout {
                url: url.to_string(),
                seconds: self.timeout_secs,
            })
        } else {
            ManagementError::Http(HttpError::RequestFailed {
                url: url.to_string(),
                reason: error.to_string(),
            })
        }
    }
}

/// Parse a Retry-After header: delta-seconds or an HTTP-date.
fn retry_after(headers: &HeaderMap) -> Duration {
    let Some(value) = headers.get(RETRY_AFTER).and_then(|v| v.to_str().ok()) else {
        return DEFAULT_RETRY_AFTER;
    };
    if let Ok(seconds) = value.trim().parse::<u64>() {
        return Duration::from_secs(seconds);
    }
    if let Ok(date) = chrono::DateTime::parse_from_rfc2822(value) {
        let delta = date.with_timezone(&chrono::Utc) - chrono::Utc::now();
        return delta.to_std().unwrap_or(DEFAULT_RETRY_AFTER);
    }
    DEFAULT_RETRY_AFTER
}
