//! OpenAI client configuration.

use secrecy::SecretString;

use crate::credentials::Credentials;

/// Configuration for the OpenAI client.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// API key for authentication.
    pub api_key: SecretString,
    /// Base URL for the API (defaults to OpenAI's API).
    pub base_url: String,
    /// Organization ID, sent as `OpenAI-Organization`.
    pub organization: Option<String>,
    /// Project ID, sent as `OpenAI-Project`.
    pub project: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

impl OpenAIConfig {
    /// Default OpenAI API base URL.
    pub const DEFAULT_BASE_URL: &'static str = "https://api.openai.com/v1";
    /// Default request timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

    /// Creates a new configuration with the given API key.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            base_url: Self::DEFAULT_BASE_URL.to_owned(),
            organization: None,
            project: None,
            timeout_secs: Some(Self::DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Creates a configuration scoped to the credentials' organization and
    /// project.
    #[must_use]
    pub fn from_credentials(credentials: &Credentials) -> Self {
        Self {
            api_key: credentials.api_key().clone(),
            organization: Some(credentials.organization_id().to_owned()),
            project: Some(credentials.project_id().to_owned()),
            ..Self::new("")
        }
    }

    /// Sets the base URL.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the organization ID.
    #[must_use]
    pub fn with_organization(mut self, org: impl Into<String>) -> Self {
        self.organization = Some(org.into());
        self
    }

    /// Sets the project ID.
    #[must_use]
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }
}
