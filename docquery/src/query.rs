//! Running one question against the provisioned assistant.

use tracing::{debug, error, info, warn};

use crate::assistant::Assistant;
use crate::citation::{AnnotatedAnswer, Citation, Rewrite, rewrite_citations};
use crate::error::{Error, Result};
use crate::file::FileProvider;
use crate::outcome::Outcome;
use crate::poll::Poller;
use crate::thread::{
    CreateMessage, CreateRunRequest, CreateThreadRequest, MessageAttachment, Run, RunStatus,
    ThreadProvider,
};
use crate::vector_store::VectorStore;

/// A question for the assistant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// Question text.
    pub text: String,
    /// Document attached to the question for `file_search`.
    pub document_id: Option<String>,
}

impl Query {
    /// A question without an attached document.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            document_id: None,
        }
    }

    /// Attach a document.
    #[must_use]
    pub fn with_document(mut self, document_id: impl Into<String>) -> Self {
        self.document_id = Some(document_id.into());
        self
    }

    fn to_message(&self) -> CreateMessage {
        let message = CreateMessage::user(&self.text);
        match &self.document_id {
            Some(id) => message.attach(MessageAttachment::file_search(id)),
            None => message,
        }
    }
}

/// Ask `query` in a new thread and wait for the reply.
///
/// Every failure is logged and returned as [`Outcome::Failed`]. A run that
/// produces no text is [`Outcome::Empty`].
pub async fn query<P>(
    provider: &P,
    assistant: &Assistant,
    store: &VectorStore,
    query: &Query,
    poller: &Poller,
) -> Outcome<AnnotatedAnswer>
where
    P: ThreadProvider + FileProvider + ?Sized,
{
    let outcome = match ask(provider, assistant, store, query, poller).await {
        Ok(outcome) => outcome,
        Err(err) => Outcome::Failed(err),
    };

    match &outcome {
        Outcome::Ready(answer) => {
            info!(citations = answer.citations.len(), "received answer");
        }
        Outcome::Empty(reason) => warn!(reason = %reason, "no answer"),
        Outcome::Failed(err) if err.is_cancelled() => warn!("query cancelled"),
        Outcome::Failed(err) => error!(error = %err, "query failed"),
    }
    outcome
}

async fn ask<P>(
    provider: &P,
    assistant: &Assistant,
    store: &VectorStore,
    query: &Query,
    poller: &Poller,
) -> Result<Outcome<AnnotatedAnswer>>
where
    P: ThreadProvider + FileProvider + ?Sized,
{
    if query.document_id.is_none() {
        warn!(vector_store_id = %store.id, "no document to attach, asking without attachment");
    }

    let request = CreateThreadRequest {
        messages: vec![query.to_message()],
    };
    let thread = provider
        .create_thread(&request)
        .await
        .inspect_err(|e| error!(error = %e, "an error occurred while creating the thread"))?;
    info!(thread_id = %thread.id, vector_store_id = %store.id, "query thread created");

    let run = provider
        .create_run(&thread.id, &CreateRunRequest::new(&assistant.id))
        .await?;
    let run = wait_for_run(provider, run, poller).await?;

    if run.status != RunStatus::Completed {
        return Err(Error::RunFailed {
            status: run.status,
            message: run.failure_message(),
        });
    }

    let messages = provider.list_messages(&thread.id, Some(&run.id)).await?;
    let Some(message) = messages.first() else {
        return Ok(Outcome::empty("no messages found in the thread"));
    };
    let Some(text) = message.first_text() else {
        return Ok(Outcome::empty(format!("message {} has no text content", message.id)));
    };

    let rewrite = rewrite_citations(&text.value, &text.annotations);
    resolve_citations(provider, rewrite).await.map(Outcome::Ready)
}

async fn wait_for_run<P>(provider: &P, run: Run, poller: &Poller) -> Result<Run>
where
    P: ThreadProvider + ?Sized,
{
    if run.status.is_terminal() {
        return Ok(run);
    }

    let thread_id = run.thread_id.as_str();
    let run_id = run.id.as_str();
    debug!(thread_id, run_id, status = %run.status, "waiting for run");
    poller
        .until(
            &format!("run {run_id}"),
            move || provider.retrieve_run(thread_id, run_id),
            |r: &Run| r.status.is_terminal(),
        )
        .await
}

/// Resolve each cited file id to its filename.
async fn resolve_citations<P>(provider: &P, rewrite: Rewrite) -> Result<AnnotatedAnswer>
where
    P: FileProvider + ?Sized,
{
    let mut citations = Vec::with_capacity(rewrite.citations.len());
    for pending in rewrite.citations {
        let file = provider.retrieve_file(&pending.file_id).await?;
        citations.push(Citation {
            index: pending.index,
            file_id: pending.file_id,
            filename: file.filename,
        });
    }

    Ok(AnnotatedAnswer {
        text: rewrite.text,
        citations,
    })
}
