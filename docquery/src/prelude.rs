//! Prelude module for convenient imports.
//!
//! # Usage
//!
//! ```rust,ignore
//! use docquery::prelude::*;
//! ```

#[cfg(feature = "openai")]
pub use crate::openai::{OpenAI, OpenAIConfig};

pub use crate::assistant::{
    Assistant, AssistantProvider, CreateAssistantRequest, Tool, ToolResources,
    UpdateAssistantRequest,
};
pub use crate::citation::{AnnotatedAnswer, Citation, rewrite_citations};
pub use crate::credentials::{CredentialPaths, Credentials};
pub use crate::error::{ApiError, ApiErrorKind, Error, Result};
pub use crate::file::{FileObject, FileProvider, FileUpload};
pub use crate::outcome::Outcome;
pub use crate::poll::{PollPolicy, Poller};
pub use crate::provision::{
    AssistantSpec, Attachment, DuplicatePolicy, attach_knowledge_store, ensure_assistant,
    ensure_knowledge_store, find_assistant, find_knowledge_store, list_documents,
    select_document,
};
pub use crate::query::{Query, query};
pub use crate::thread::{Annotation, Run, RunStatus, ThreadMessage, ThreadProvider};
pub use crate::vector_store::{
    BatchStatus, FileBatch, FileCounts, VectorStore, VectorStoreFile, VectorStoreProvider,
};
pub use tokio_util::sync::CancellationToken;
