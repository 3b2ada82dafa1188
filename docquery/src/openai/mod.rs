//! OpenAI Assistants API client.
//!
//! This module provides a client for the OpenAI Assistants (v2) API, supporting:
//! - Assistants (list, create, update)
//! - Vector stores and file batches
//! - File uploads
//! - Threads, runs and messages

mod assistants;
mod client;
mod config;
mod files;
mod threads;
mod vector_stores;

pub use client::OpenAI;
pub use config::OpenAIConfig;
