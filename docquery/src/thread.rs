//! Conversation (thread), message and run types, and the provider trait for
//! running an assistant against a thread.
//!
//! A thread is created per query and holds one user message. A run executes
//! the assistant against the thread; the caller polls it until it reaches a
//! terminal [`RunStatus`] and then lists the messages the run produced.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::assistant::Tool;
use crate::error::Result;

/// Message author role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// End-user message.
    User,
    /// Assistant reply.
    Assistant,
}

/// A reference to an uploaded file, attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageAttachment {
    /// The attached file.
    pub file_id: String,
    /// Tools that should process the file.
    pub tools: Vec<Tool>,
}

impl MessageAttachment {
    /// Attach `file_id` for processing by `file_search`.
    #[must_use]
    pub fn file_search(file_id: impl Into<String>) -> Self {
        Self {
            file_id: file_id.into(),
            tools: vec![Tool::FileSearch],
        }
    }
}

/// A message to seed a new thread with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateMessage {
    /// Author role.
    pub role: MessageRole,
    /// Message body.
    pub content: String,
    /// Attached files.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<MessageAttachment>,
}

impl CreateMessage {
    /// Create a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            attachments: Vec::new(),
        }
    }

    /// Add an attachment.
    #[must_use]
    pub fn attach(mut self, attachment: MessageAttachment) -> Self {
        self.attachments.push(attachment);
        self
    }
}

/// Parameters for creating a thread.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateThreadRequest {
    /// Initial messages.
    pub messages: Vec<CreateMessage>,
}

/// A conversation thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    /// Server-assigned id.
    pub id: String,
    /// Creation time (Unix seconds).
    #[serde(default)]
    pub created_at: i64,
}

/// Lifecycle state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Waiting to start.
    Queued,
    /// Executing.
    InProgress,
    /// Waiting on tool outputs the caller would have to submit.
    RequiresAction,
    /// Cancellation requested.
    Cancelling,
    /// Cancelled.
    Cancelled,
    /// Failed.
    Failed,
    /// Finished successfully.
    Completed,
    /// Ended early (token or turn limits).
    Incomplete,
    /// Expired before finishing.
    Expired,
    /// A status this client does not know; treated as terminal.
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// Returns `true` once the run will not progress without caller action.
    ///
    /// `requires_action` counts as terminal: docquery configures no function
    /// tools, so it never submits tool outputs.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Queued | Self::InProgress | Self::Cancelling)
    }

    /// Returns the status string used by the API.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::InProgress => "in_progress",
            Self::RequiresAction => "requires_action",
            Self::Cancelling => "cancelling",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
            Self::Completed => "completed",
            Self::Incomplete => "incomplete",
            Self::Expired => "expired",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error reported on a failed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunError {
    /// Error code (e.g. "server_error", "rate_limit_exceeded").
    pub code: String,
    /// Human readable message.
    pub message: String,
}

/// One execution of an assistant against a thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    /// Server-assigned id.
    pub id: String,
    /// Thread being executed.
    pub thread_id: String,
    /// Assistant executing the thread.
    pub assistant_id: String,
    /// Current status.
    pub status: RunStatus,
    /// Last error, set when the run failed.
    #[serde(default)]
    pub last_error: Option<RunError>,
}

impl Run {
    /// Message describing why the run did not complete.
    #[must_use]
    pub fn failure_message(&self) -> String {
        self.last_error.as_ref().map_or_else(
            || format!("run {} ended as {}", self.id, self.status),
            |e| format!("{}: {}", e.code, e.message),
        )
    }
}

/// Parameters for creating a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRunRequest {
    /// Assistant to execute.
    pub assistant_id: String,
}

impl CreateRunRequest {
    /// Run `assistant_id`.
    #[must_use]
    pub fn new(assistant_id: impl Into<String>) -> Self {
        Self {
            assistant_id: assistant_id.into(),
        }
    }
}

/// Reference to a file inside an annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    /// Referenced file id.
    pub file_id: String,
}

/// A span of a text reply that points at a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Annotation {
    /// The span quotes a document found by `file_search`.
    FileCitation {
        /// Literal annotated text within the reply.
        text: String,
        /// Start of the span (character offset).
        #[serde(default)]
        start_index: Option<usize>,
        /// End of the span (character offset, exclusive).
        #[serde(default)]
        end_index: Option<usize>,
        /// Cited document.
        file_citation: FileRef,
    },
    /// The span links to a file generated by a tool.
    FilePath {
        /// Literal annotated text within the reply.
        text: String,
        /// Start of the span (character offset).
        #[serde(default)]
        start_index: Option<usize>,
        /// End of the span (character offset, exclusive).
        #[serde(default)]
        end_index: Option<usize>,
        /// Generated file.
        file_path: FileRef,
    },
}

impl Annotation {
    /// Create a file citation annotation.
    #[must_use]
    pub fn file_citation(
        text: impl Into<String>,
        span: Option<(usize, usize)>,
        file_id: impl Into<String>,
    ) -> Self {
        Self::FileCitation {
            text: text.into(),
            start_index: span.map(|(s, _)| s),
            end_index: span.map(|(_, e)| e),
            file_citation: FileRef {
                file_id: file_id.into(),
            },
        }
    }

    /// Create a file path annotation.
    #[must_use]
    pub fn file_path(
        text: impl Into<String>,
        span: Option<(usize, usize)>,
        file_id: impl Into<String>,
    ) -> Self {
        Self::FilePath {
            text: text.into(),
            start_index: span.map(|(s, _)| s),
            end_index: span.map(|(_, e)| e),
            file_path: FileRef {
                file_id: file_id.into(),
            },
        }
    }

    /// The literal annotated text.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::FileCitation { text, .. } | Self::FilePath { text, .. } => text,
        }
    }

    /// The reported character span, when both ends are present and ordered.
    #[must_use]
    pub fn span(&self) -> Option<(usize, usize)> {
        let (start, end) = match self {
            Self::FileCitation {
                start_index,
                end_index,
                ..
            }
            | Self::FilePath {
                start_index,
                end_index,
                ..
            } => (*start_index, *end_index),
        };
        match (start, end) {
            (Some(s), Some(e)) if s <= e => Some((s, e)),
            _ => None,
        }
    }

    /// The cited document, for file citations only.
    #[must_use]
    pub fn cited_file_id(&self) -> Option<&str> {
        match self {
            Self::FileCitation { file_citation, .. } => Some(&file_citation.file_id),
            Self::FilePath { .. } => None,
        }
    }
}

/// Text block of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextContent {
    /// Raw text.
    pub value: String,
    /// Annotated spans, in document order.
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

/// A content block of a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    /// Text with annotations.
    Text {
        /// The text block.
        text: TextContent,
    },
    /// Model refusal.
    Refusal {
        /// Refusal text.
        refusal: String,
    },
    /// Image blocks and anything newer.
    #[serde(other)]
    Other,
}

/// A message stored in a thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadMessage {
    /// Server-assigned id.
    pub id: String,
    /// Author role.
    pub role: MessageRole,
    /// Run that produced the message, if any.
    #[serde(default)]
    pub run_id: Option<String>,
    /// Content blocks.
    #[serde(default)]
    pub content: Vec<MessageContent>,
}

impl ThreadMessage {
    /// The first text block, skipping non-text content.
    #[must_use]
    pub fn first_text(&self) -> Option<&TextContent> {
        self.content.iter().find_map(|c| match c {
            MessageContent::Text { text } => Some(text),
            _ => None,
        })
    }
}

/// Core trait for services that run assistants against threads.
#[async_trait]
pub trait ThreadProvider: Send + Sync {
    /// Create a thread seeded with messages.
    async fn create_thread(&self, request: &CreateThreadRequest) -> Result<Thread>;

    /// Start a run of an assistant on a thread.
    async fn create_run(&self, thread_id: &str, request: &CreateRunRequest) -> Result<Run>;

    /// Fetch the current state of a run.
    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run>;

    /// List a thread's messages, newest first, optionally only those produced
    /// by `run_id`.
    async fn list_messages(&self, thread_id: &str, run_id: Option<&str>)
    -> Result<Vec<ThreadMessage>>;
}
