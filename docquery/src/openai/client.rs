//! OpenAI API client implementation.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ApiError, Result};

use super::config::OpenAIConfig;

/// Page size requested from list endpoints.
pub(crate) const PAGE_LIMIT: &str = "100";

/// Beta header required by the assistants endpoints.
const ASSISTANTS_BETA: &str = "assistants=v2";

/// OpenAI error response.
#[derive(Debug, Clone, Deserialize)]
struct OpenAIErrorResponse {
    pub error: OpenAIError,
}

/// OpenAI error details.
#[derive(Debug, Clone, Deserialize)]
struct OpenAIError {
    pub message: String,
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

/// One page of a cursor-paginated list.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ListResponse<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub last_id: Option<String>,
}

/// OpenAI API client.
#[derive(Debug, Clone)]
pub struct OpenAI {
    pub(crate) config: Arc<OpenAIConfig>,
    pub(crate) base_url: Url,
    pub(crate) client: Client,
}

impl OpenAI {
    /// Create a new OpenAI client with the given configuration.
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        if config.api_key.expose_secret().is_empty() {
            return Err(ApiError::auth("API key is required").into());
        }

        let base_url = Url::parse(&config.base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| {
                ApiError::invalid_request(format!("invalid base URL: {}", config.base_url))
            })?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(timeout));
        }

        let client = builder
            .build()
            .map_err(|e| ApiError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            config: Arc::new(config),
            base_url,
            client,
        })
    }

    /// Get the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Get the organization ID, if configured.
    #[must_use]
    pub fn organization(&self) -> Option<&str> {
        self.config.organization.as_deref()
    }

    /// Get the project ID, if configured.
    #[must_use]
    pub fn project(&self) -> Option<&str> {
        self.config.project.as_deref()
    }

    /// Build an endpoint URL from path segments. Segments are percent-encoded.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::invalid_request("base URL cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Attach authentication, scoping and beta headers.
    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        let mut req = req
            .header(
                "Authorization",
                format!("Bearer {}", self.config.api_key.expose_secret()),
            )
            .header("OpenAI-Beta", ASSISTANTS_BETA);

        if let Some(org) = &self.config.organization {
            req = req.header("OpenAI-Organization", org);
        }
        if let Some(project) = &self.config.project {
            req = req.header("OpenAI-Project", project);
        }

        req
    }

    /// GET `url` and decode the JSON body.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: Url, expected: &str) -> Result<T> {
        let response = self.authorize(self.client.get(url)).send().await?;
        Self::decode(response, expected).await
    }

    /// POST `body` as JSON to `url` and decode the JSON reply.
    pub(crate) async fn post_json<B, T>(&self, url: Url, body: &B, expected: &str) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let response = self
            .authorize(self.client.post(url))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;
        Self::decode(response, expected).await
    }

    /// POST a multipart form to `url` and decode the JSON reply.
    pub(crate) async fn post_multipart<T: DeserializeOwned>(
        &self,
        url: Url,
        form: reqwest::multipart::Form,
        expected: &str,
    ) -> Result<T> {
        let response = self
            .authorize(self.client.post(url))
            .multipart(form)
            .send()
            .await?;
        Self::decode(response, expected).await
    }

    /// Fetch every page of a cursor-paginated list.
    ///
    /// `query` is sent with every page, alongside `limit` and `after`.
    pub(crate) async fn list_all<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
        expected: &str,
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let mut url = self.endpoint(segments)?;
            {
                let mut pairs = url.query_pairs_mut();
                pairs.extend_pairs(query);
                pairs.append_pair("limit", PAGE_LIMIT);
                if let Some(cursor) = &after {
                    pairs.append_pair("after", cursor);
                }
            }

            let page: ListResponse<T> = self.get_json(url, expected).await?;
            items.extend(page.data);

            match page.last_id {
                Some(last) if page.has_more && after.as_deref() != Some(last.as_str()) => {
                    after = Some(last);
                }
                _ => break,
            }
        }

        tracing::trace!(count = items.len(), endpoint = %segments.join("/"), "listed");
        Ok(items)
    }

    /// Check the status and decode the body as `T`.
    async fn decode<T: DeserializeOwned>(response: Response, expected: &str) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Self::parse_error(status.as_u16(), &error_text).into());
        }

        let response_text = response.text().await?;
        serde_json::from_str(&response_text).map_err(|e| {
            ApiError::response_format(
                expected,
                format!("parse error: {e}, response: {response_text}"),
            )
            .into()
        })
    }

    /// Parse an error response from OpenAI.
    pub(crate) fn parse_error(status: u16, body: &str) -> ApiError {
        if let Ok(error_response) = serde_json::from_str::<OpenAIErrorResponse>(body) {
            let error = error_response.error;

            return match status {
                401 | 403 => ApiError::auth(error.message),
                404 => ApiError::not_found(error.message),
                429 => ApiError::rate_limited(),
                _ => match error.code.or(error.error_type) {
                    Some(code) => ApiError::provider_code(code, error.message),
                    None => ApiError::invalid_request(error.message),
                },
            };
        }

        ApiError::http_status(status, body.to_owned())
    }
}
