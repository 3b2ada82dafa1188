//! Uploaded file types and provider trait.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Purpose tag for files used by assistants and vector stores.
pub const ASSISTANTS_PURPOSE: &str = "assistants";

/// Metadata of an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileObject {
    /// Server-assigned id.
    pub id: String,
    /// Original filename.
    pub filename: String,
    /// Size in bytes.
    #[serde(default)]
    pub bytes: u64,
    /// Upload purpose.
    #[serde(default)]
    pub purpose: Option<String>,
    /// Creation time (Unix seconds).
    #[serde(default)]
    pub created_at: i64,
}

/// A file read into memory, ready to upload.
#[derive(Clone, PartialEq, Eq)]
pub struct FileUpload {
    /// Filename reported to the service.
    pub filename: String,
    /// File contents, uploaded verbatim.
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for FileUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileUpload")
            .field("filename", &self.filename)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl FileUpload {
    /// Create an upload from in-memory bytes.
    #[must_use]
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    /// Read `path` for upload.
    ///
    /// The file's existence is not checked beforehand; a missing path fails
    /// here with the underlying I/O error.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map_or_else(|| "upload".to_owned(), |n| n.to_string_lossy().into_owned());
        Ok(Self { filename, bytes })
    }
}

/// Core trait for services that store files.
#[async_trait]
pub trait FileProvider: Send + Sync {
    /// Upload a file with the `assistants` purpose.
    async fn upload_file(&self, upload: FileUpload) -> Result<FileObject>;

    /// Retrieve a file's metadata by id.
    async fn retrieve_file(&self, file_id: &str) -> Result<FileObject>;
}
