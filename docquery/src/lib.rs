//! docquery - query a document through an OpenAI assistant.
//!
//! This crate provisions an assistant and a vector store holding one or more
//! documents, reusing both by name across runs, then asks the assistant a
//! question and returns its reply with numbered citation markers.
//!
//! The remote service is reached through four capability traits
//! ([`AssistantProvider`], [`VectorStoreProvider`], [`FileProvider`] and
//! [`ThreadProvider`]), implemented by the OpenAI client and by an in-memory
//! [`mock::MockProvider`].

pub mod assistant;
pub mod citation;
pub mod credentials;
pub mod error;
pub mod file;
pub mod mock;
#[cfg(feature = "openai")]
pub mod openai;
pub mod outcome;
pub mod poll;
pub mod prelude;
pub mod provision;
pub mod query;
pub mod thread;
pub mod vector_store;

pub use assistant::AssistantProvider;
pub use error::{ApiError, ApiErrorKind, Error, Result};
pub use file::FileProvider;
pub use outcome::Outcome;
pub use thread::ThreadProvider;
pub use vector_store::VectorStoreProvider;

/// Re-exported for callers that cancel poll loops.
pub use tokio_util::sync::CancellationToken;
