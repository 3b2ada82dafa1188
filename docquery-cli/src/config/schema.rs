//! Configuration schema definitions.

use std::path::PathBuf;
use std::time::Duration;

use docquery::credentials::CredentialPaths;
use docquery::poll::PollPolicy;
use docquery::provision::{
    AssistantSpec, DEFAULT_ASSISTANT_NAME, DEFAULT_DOCUMENT, DEFAULT_INSTRUCTIONS, DEFAULT_MODEL,
    DEFAULT_STORE_NAME, DuplicatePolicy,
};
use serde::{Deserialize, Serialize};

/// Placeholder replaced by the lookup code in [`QueryConfig::template`].
pub const CODE_PLACEHOLDER: &str = "{code}";

/// Largest accepted poll backoff multiplier.
pub const MAX_POLL_MULTIPLIER: f64 = 10.0;

/// Default lookup code.
pub const DEFAULT_CODE: &str = "1017";

/// Default question, asking for the locality name of a SIRSUP code.
pub const DEFAULT_QUERY_TEMPLATE: &str = "Retrieve the 'DENLOC' value from the file \
siruta_rez.txt located in the vector storage of the attached 'Siruta Database', where the \
'DENLOC' field corresponds to the record in which the 'SIRUTA' field is equal to the provided \
'SIRSUP' code '{code}'. If no matching 'SIRSUP' code is found, return a JSON object with the \
message 'No matching record found for SIRSUP code {code}'. Do not include any additional text \
or explanations outside the JSON object.";

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocqueryConfig {
    /// Where the secrets live.
    #[serde(default)]
    pub credentials: CredentialPaths,

    /// Remote endpoint settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// The assistant to find or create.
    #[serde(default)]
    pub assistant: AssistantConfig,

    /// The vector store to find or create.
    #[serde(default)]
    pub knowledge_store: KnowledgeStoreConfig,

    /// Poll loop timing.
    #[serde(default)]
    pub poll: PollConfig,

    /// The question to ask.
    #[serde(default)]
    pub query: QueryConfig,
}

/// Remote endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API base URL, including the version segment.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            timeout_secs: 120,
        }
    }
}

/// Assistant settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Name used to find an existing assistant.
    pub name: String,
    /// Model for a newly created assistant.
    pub model: String,
    /// Instructions for a newly created assistant.
    pub instructions: String,
    /// Which assistant to use when several share the name.
    pub duplicates: DuplicatePolicy,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_ASSISTANT_NAME.to_string(),
            model: DEFAULT_MODEL.to_string(),
            instructions: DEFAULT_INSTRUCTIONS.to_string(),
            duplicates: DuplicatePolicy::default(),
        }
    }
}

/// Knowledge store settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeStoreConfig {
    /// Name used to find an existing store.
    pub name: String,
    /// Documents uploaded into a newly created store.
    pub files: Vec<PathBuf>,
    /// Which store to use when several share the name.
    pub duplicates: DuplicatePolicy,
}

impl Default for KnowledgeStoreConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_STORE_NAME.to_string(),
            files: vec![PathBuf::from(DEFAULT_DOCUMENT)],
            duplicates: DuplicatePolicy::default(),
        }
    }
}

/// Poll loop timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// First delay between fetches, in milliseconds.
    pub interval_ms: u64,
    /// Largest delay between fetches, in milliseconds.
    pub max_interval_ms: u64,
    /// Delay growth factor.
    pub multiplier: f64,
    /// Overall limit in seconds; 0 waits forever.
    pub timeout_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            max_interval_ms: 10_000,
            multiplier: 1.5,
            timeout_secs: 600,
        }
    }
}

/// The question sent to the assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Code substituted into the template.
    pub code: String,
    /// Question text with a `{code}` placeholder.
    pub template: String,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            code: DEFAULT_CODE.to_string(),
            template: DEFAULT_QUERY_TEMPLATE.to_string(),
        }
    }
}

impl DocqueryConfig {
    /// Validate the configuration and return any issues found.
    #[must_use]
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if self.assistant.name.trim().is_empty() {
            issues.push(ConfigIssue::error("assistant.name", "Assistant name must not be empty"));
        }
        if self.assistant.model.trim().is_empty() {
            issues.push(ConfigIssue::error("assistant.model", "Model must not be empty"));
        }
        if self.knowledge_store.name.trim().is_empty() {
            issues.push(ConfigIssue::error(
                "knowledge_store.name",
                "Knowledge store name must not be empty",
            ));
        }
        if self.knowledge_store.files.is_empty() {
            issues.push(ConfigIssue::warning(
                "knowledge_store.files",
                "No documents configured, a new store would be left empty",
            ));
        }

        if !self.query.template.contains(CODE_PLACEHOLDER) {
            issues.push(ConfigIssue::warning(
                "query.template",
                "Template has no {code} placeholder, every query will be identical",
            ));
        }

        if self.poll.interval_ms == 0 {
            issues.push(ConfigIssue::error("poll.interval_ms", "Poll interval must be at least 1 ms"));
        }
        if self.poll.max_interval_ms < self.poll.interval_ms {
            issues.push(ConfigIssue::warning(
                "poll.max_interval_ms",
                "Max interval is below the interval, polling will not back off",
            ));
        }
        if !(1.0..=MAX_POLL_MULTIPLIER).contains(&self.poll.multiplier) {
            issues.push(ConfigIssue::error(
                "poll.multiplier",
                format!("Multiplier must be between 1.0 and {MAX_POLL_MULTIPLIER}"),
            ));
        }

        if self.api.timeout_secs == 0 {
            issues.push(ConfigIssue::warning(
                "api.timeout_secs",
                "Request timeout is 0, requests will time out immediately",
            ));
        }

        issues
    }

    /// Check if the configuration is valid (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validate()
            .iter()
            .all(|issue| issue.level != IssueLevel::Error)
    }

    /// Question text for `code`.
    #[must_use]
    pub fn render_query(&self, code: &str) -> String {
        self.query.template.replace(CODE_PLACEHOLDER, code)
    }

    /// Poll policy built from the `[poll]` section.
    #[must_use]
    pub fn poll_policy(&self) -> PollPolicy {
        let poll = &self.poll;
        PollPolicy {
            interval: Duration::from_millis(poll.interval_ms),
            max_interval: Duration::from_millis(poll.max_interval_ms.max(poll.interval_ms)),
            multiplier: poll.multiplier,
            timeout: (poll.timeout_secs > 0).then(|| Duration::from_secs(poll.timeout_secs)),
        }
    }

    /// Assistant spec built from the `[assistant]` section.
    #[must_use]
    pub fn assistant_spec(&self) -> AssistantSpec {
        AssistantSpec::new(
            &self.assistant.name,
            &self.assistant.instructions,
            &self.assistant.model,
        )
    }
}

/// A configuration validation issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    /// Issue severity level.
    pub level: IssueLevel,
    /// Configuration path (e.g., "poll.interval_ms").
    pub path: String,
    /// Human-readable message.
    pub message: String,
}

impl ConfigIssue {
    /// Create an error-level issue.
    #[must_use]
    pub fn error(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Error,
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a warning-level issue.
    #[must_use]
    pub fn warning(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Warning,
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = match self.level {
            IssueLevel::Error => "ERROR",
            IssueLevel::Warning => "WARN",
        };
        write!(f, "[{level}] {}: {}", self.path, self.message)
    }
}

/// Issue severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueLevel {
    /// Configuration error that prevents operation.
    Error,
    /// Warning that may cause unexpected behavior.
    Warning,
}
