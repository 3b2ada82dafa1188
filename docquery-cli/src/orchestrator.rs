//! The provision-then-query sequence behind the subcommands.
//!
//! Every step is generic over the provider traits so the same code drives the
//! real client and [`docquery::mock::MockProvider`].

use docquery::citation::AnnotatedAnswer;
use docquery::credentials::Credentials;
use docquery::openai::{OpenAI, OpenAIConfig};
use docquery::poll::Poller;
use docquery::prelude::{
    Assistant, Attachment, Query, VectorStore, attach_knowledge_store, ensure_assistant,
    ensure_knowledge_store, find_assistant, find_knowledge_store, list_documents, query,
    select_document,
};
use docquery::{AssistantProvider, FileProvider, Outcome, ThreadProvider, VectorStoreProvider};
use tracing::info;

use crate::config::DocqueryConfig;
use crate::error::{CliError, CliResult};

/// Resources a question is asked against.
#[derive(Debug, Clone)]
pub struct Provisioned {
    /// Assistant with the knowledge store attached.
    pub assistant: Assistant,
    /// Knowledge store holding the documents.
    pub store: VectorStore,
    /// Document attached to questions, if the store has any.
    pub document_id: Option<String>,
}

/// Build the HTTP client from the configured credential files.
pub fn connect(config: &DocqueryConfig) -> CliResult<OpenAI> {
    let credentials = Credentials::load(&config.credentials).map_err(CliError::setup)?;
    let client_config = OpenAIConfig::from_credentials(&credentials)
        .with_base_url(&config.api.base_url)
        .with_timeout(config.api.timeout_secs);
    OpenAI::new(client_config).map_err(CliError::setup)
}

/// Find or create the assistant and the knowledge store, then attach them.
pub async fn provision<P>(
    provider: &P,
    config: &DocqueryConfig,
    poller: &Poller,
) -> CliResult<Provisioned>
where
    P: AssistantProvider + VectorStoreProvider + FileProvider + ?Sized,
{
    let assistant = ensure_assistant(provider, &config.assistant_spec(), config.assistant.duplicates)
        .await
        .map_err(CliError::setup)?;

    let knowledge = &config.knowledge_store;
    let store = ensure_knowledge_store(
        provider,
        &knowledge.name,
        &knowledge.files,
        knowledge.duplicates,
        poller,
    )
    .await
    .map_err(CliError::setup)?;

    finish(provider, assistant, store).await
}

/// Like [`provision`], but never creates anything.
pub async fn lookup<P>(provider: &P, config: &DocqueryConfig) -> CliResult<Provisioned>
where
    P: AssistantProvider + VectorStoreProvider + ?Sized,
{
    let assistant = find_assistant(provider, &config.assistant.name, config.assistant.duplicates)
        .await
        .map_err(CliError::setup)?
        .ok_or_else(|| CliError::NotProvisioned {
            kind: "assistant",
            name: config.assistant.name.clone(),
        })?;

    let knowledge = &config.knowledge_store;
    let store = find_knowledge_store(provider, &knowledge.name, knowledge.duplicates)
        .await
        .map_err(CliError::setup)?
        .ok_or_else(|| CliError::NotProvisioned {
            kind: "vector store",
            name: knowledge.name.clone(),
        })?;

    finish(provider, assistant, store).await
}

async fn finish<P>(provider: &P, assistant: Assistant, store: VectorStore) -> CliResult<Provisioned>
where
    P: AssistantProvider + VectorStoreProvider + ?Sized,
{
    let documents = list_documents(provider, &store)
        .await
        .map_err(CliError::setup)?;
    let document_id = select_document(&documents).map(str::to_owned);

    let assistant = match attach_knowledge_store(provider, &assistant, &store)
        .await
        .map_err(CliError::setup)?
    {
        Attachment::Updated(updated) => updated,
        Attachment::AlreadyAttached => assistant,
    };

    info!(
        assistant_id = %assistant.id,
        vector_store_id = %store.id,
        document_id = document_id.as_deref().unwrap_or("-"),
        "ready"
    );
    Ok(Provisioned {
        assistant,
        store,
        document_id,
    })
}

/// Ask `text`; `Ok(None)` means the run finished without a reply.
pub async fn ask<P>(
    provider: &P,
    provisioned: &Provisioned,
    text: String,
    poller: &Poller,
) -> CliResult<Option<AnnotatedAnswer>>
where
    P: ThreadProvider + FileProvider + ?Sized,
{
    let mut question = Query::new(text);
    if let Some(id) = &provisioned.document_id {
        question = question.with_document(id);
    }

    match query(provider, &provisioned.assistant, &provisioned.store, &question, poller).await {
        Outcome::Ready(answer) => Ok(Some(answer)),
        Outcome::Empty(_) => Ok(None),
        Outcome::Failed(err) => Err(CliError::query(err)),
    }
}
