//! Vector store (knowledge store) types and provider trait.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Per-status file counts of a vector store or file batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCounts {
    /// Files still being processed.
    #[serde(default)]
    pub in_progress: u32,
    /// Files ingested successfully.
    #[serde(default)]
    pub completed: u32,
    /// Files that failed to ingest.
    #[serde(default)]
    pub failed: u32,
    /// Files whose ingestion was cancelled.
    #[serde(default)]
    pub cancelled: u32,
    /// Total number of files.
    #[serde(default)]
    pub total: u32,
}

impl fmt::Display for FileCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "total={} completed={} failed={} cancelled={} in_progress={}",
            self.total, self.completed, self.failed, self.cancelled, self.in_progress
        )
    }
}

/// A remote vector store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorStore {
    /// Server-assigned id.
    pub id: String,
    /// Human readable name, used as the reuse key.
    #[serde(default)]
    pub name: Option<String>,
    /// Store status ("completed", "in_progress", "expired").
    #[serde(default)]
    pub status: Option<String>,
    /// File counts.
    #[serde(default)]
    pub file_counts: FileCounts,
    /// Creation time (Unix seconds).
    #[serde(default)]
    pub created_at: i64,
}

/// Parameters for creating a vector store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateVectorStoreRequest {
    /// Store name.
    pub name: String,
}

impl CreateVectorStoreRequest {
    /// Create a request for a store named `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Status of a file batch ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// Files are still being ingested.
    InProgress,
    /// All files were processed.
    Completed,
    /// The batch was cancelled.
    Cancelled,
    /// The batch failed.
    Failed,
    /// The batch expired before finishing.
    Expired,
    /// A status this client does not know; treated as terminal.
    #[serde(other)]
    Unknown,
}

impl BatchStatus {
    /// Returns `true` once the batch will not change any more.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::InProgress)
    }

    /// Returns the status string used by the API.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
            Self::Expired => "expired",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A batch of files being ingested into a vector store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileBatch {
    /// Batch id.
    pub id: String,
    /// Store the batch belongs to.
    pub vector_store_id: String,
    /// Ingestion status.
    pub status: BatchStatus,
    /// Per-status file counts.
    #[serde(default)]
    pub file_counts: FileCounts,
}

/// A document ingested into a vector store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorStoreFile {
    /// File id (same as the uploaded file's id).
    pub id: String,
    /// Store the file belongs to.
    #[serde(default)]
    pub vector_store_id: String,
    /// Ingestion status ("in_progress", "completed", "cancelled", "failed").
    #[serde(default)]
    pub status: Option<String>,
    /// Creation time (Unix seconds).
    #[serde(default)]
    pub created_at: i64,
}

/// Core trait for services that manage vector stores.
#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    /// List every vector store visible to the session, across all pages.
    async fn list_vector_stores(&self) -> Result<Vec<VectorStore>>;

    /// Create a vector store.
    async fn create_vector_store(&self, request: &CreateVectorStoreRequest)
    -> Result<VectorStore>;

    /// Start ingesting already uploaded files into a store.
    async fn create_file_batch(&self, vector_store_id: &str, file_ids: &[String])
    -> Result<FileBatch>;

    /// Fetch the current state of a file batch.
    async fn retrieve_file_batch(&self, vector_store_id: &str, batch_id: &str)
    -> Result<FileBatch>;

    /// List every document in a store, across all pages.
    async fn list_vector_store_files(&self, vector_store_id: &str) -> Result<Vec<VectorStoreFile>>;
}
