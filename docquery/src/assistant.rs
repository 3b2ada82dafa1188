//! Assistant types and the provider trait for managing assistants.
//!
//! An assistant is a remote-configured agent with fixed instructions, a model
//! and a set of enabled tools. docquery only ever uses the `file_search` tool,
//! whose resources point at one or more vector stores.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A tool enabled on an assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Tool {
    /// Retrieval over attached vector stores.
    FileSearch,
    /// Sandboxed code execution.
    CodeInterpreter,
    /// Any tool type docquery does not configure (e.g. functions).
    #[serde(other)]
    Other,
}

/// The `file_search` tool's resources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSearchResources {
    /// Vector stores searched by the tool.
    #[serde(default)]
    pub vector_store_ids: Vec<String>,
}

/// Resources used by an assistant's tools.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResources {
    /// Resources of the `file_search` tool, if configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_search: Option<FileSearchResources>,
}

impl ToolResources {
    /// Resources pointing `file_search` at the given stores.
    #[must_use]
    pub fn file_search(vector_store_ids: Vec<String>) -> Self {
        Self {
            file_search: Some(FileSearchResources { vector_store_ids }),
        }
    }
}

/// A remote assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assistant {
    /// Server-assigned id.
    pub id: String,
    /// Human readable name, used as the reuse key.
    #[serde(default)]
    pub name: Option<String>,
    /// System instructions.
    #[serde(default)]
    pub instructions: Option<String>,
    /// Model identifier.
    pub model: String,
    /// Enabled tools.
    #[serde(default)]
    pub tools: Vec<Tool>,
    /// Tool resources.
    #[serde(default)]
    pub tool_resources: Option<ToolResources>,
    /// Creation time (Unix seconds).
    #[serde(default)]
    pub created_at: i64,
}

impl Assistant {
    /// Vector stores currently searched by this assistant's `file_search` tool.
    ///
    /// Returns `None` when no `file_search` resource is configured at all.
    #[must_use]
    pub fn vector_store_ids(&self) -> Option<&[String]> {
        self.tool_resources
            .as_ref()
            .and_then(|r| r.file_search.as_ref())
            .map(|fs| fs.vector_store_ids.as_slice())
    }
}

/// Parameters for creating an assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAssistantRequest {
    /// Model identifier (e.g., "gpt-4o").
    pub model: String,
    /// Assistant name.
    pub name: String,
    /// System instructions.
    pub instructions: String,
    /// Enabled tools.
    pub tools: Vec<Tool>,
}

impl CreateAssistantRequest {
    /// Create a request with `file_search` enabled.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        instructions: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            name: name.into(),
            instructions: instructions.into(),
            tools: vec![Tool::FileSearch],
        }
    }

    /// Replace the enabled tools.
    #[must_use]
    pub fn tools(mut self, tools: Vec<Tool>) -> Self {
        self.tools = tools;
        self
    }
}

/// Parameters for updating an assistant. Only set fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateAssistantRequest {
    /// New tool resources.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_resources: Option<ToolResources>,
}

/// Core trait for services that manage assistants.
#[async_trait]
pub trait AssistantProvider: Send + Sync {
    /// List every assistant visible to the session, across all pages.
    async fn list_assistants(&self) -> Result<Vec<Assistant>>;

    /// Create an assistant.
    async fn create_assistant(&self, request: &CreateAssistantRequest) -> Result<Assistant>;

    /// Update an assistant and return its new state.
    async fn update_assistant(
        &self,
        assistant_id: &str,
        request: &UpdateAssistantRequest,
    ) -> Result<Assistant>;
}
