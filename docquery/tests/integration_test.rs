//! Integration tests for the provision-then-query flow.

#![allow(clippy::unwrap_used, clippy::panic)]

use std::path::PathBuf;
use std::time::Duration;

use docquery::mock::{MockOperation, MockProvider};
use docquery::prelude::*;
use docquery::provision::{DEFAULT_ASSISTANT_NAME, DEFAULT_DOCUMENT, DEFAULT_STORE_NAME};

fn poller() -> Poller {
    Poller::new(PollPolicy::fixed(Duration::from_millis(1)))
}

fn write_document(dir: &tempfile::TempDir) -> PathBuf {
    let path = dir.path().join(DEFAULT_DOCUMENT);
    std::fs::write(&path, "SIRUTA;DENLOC;SIRSUP\n1017;ALBA IULIA;1\n").unwrap();
    path
}

/// Provision everything, then ask once.
async fn provision_and_ask(
    provider: &MockProvider,
    documents: &[PathBuf],
    question: &str,
) -> Outcome<AnnotatedAnswer> {
    let poller = poller();
    let assistant = ensure_assistant(provider, &AssistantSpec::default(), DuplicatePolicy::default())
        .await
        .unwrap();
    let store = ensure_knowledge_store(
        provider,
        DEFAULT_STORE_NAME,
        documents,
        DuplicatePolicy::default(),
        &poller,
    )
    .await
    .unwrap();

    let files = list_documents(provider, &store).await.unwrap();
    let mut q = Query::new(question);
    if let Some(id) = select_document(&files) {
        q = q.with_document(id);
    }

    let assistant = match attach_knowledge_store(provider, &assistant, &store).await.unwrap() {
        Attachment::Updated(updated) => updated,
        Attachment::AlreadyAttached => assistant,
    };

    query(provider, &assistant, &store, &q, &poller).await
}

#[tokio::test]
async fn test_first_run_provisions_and_answers() {
    let dir = tempfile::tempdir().unwrap();
    let documents = vec![write_document(&dir)];

    // The first upload gets id "file-3": assistant is 1, store is 2.
    let provider = MockProvider::new()
        .with_batch_statuses(vec![BatchStatus::InProgress, BatchStatus::Completed])
        .with_run_statuses(vec![RunStatus::Queued, RunStatus::InProgress, RunStatus::Completed])
        .with_reply(
            "{\"DENLOC\": \"ALBA IULIA\"}†",
            vec![Annotation::file_citation("†", None, "file-3")],
        );

    let answer = provision_and_ask(&provider, &documents, "1017")
        .await
        .ready()
        .unwrap();

    assert_eq!(answer.text, "{\"DENLOC\": \"ALBA IULIA\"}[0]");
    assert_eq!(answer.to_string(), "{\"DENLOC\": \"ALBA IULIA\"}[0]\n[0] siruta_rez.txt");
    assert_eq!(answer.json().unwrap()["DENLOC"], "ALBA IULIA");

    let calls = provider.calls();
    assert_eq!(calls.create_assistant, 1);
    assert_eq!(calls.create_vector_store, 1);
    assert_eq!(calls.upload_file, 1);
    assert_eq!(calls.update_assistant, 1);

    let threads = provider.threads();
    assert_eq!(threads[0].messages[0].attachments[0].file_id, "file-3");
}

#[tokio::test]
async fn test_second_run_reuses_everything() {
    let dir = tempfile::tempdir().unwrap();
    let documents = vec![write_document(&dir)];
    let provider = MockProvider::new().with_reply("{}", vec![]);

    let _ = provision_and_ask(&provider, &documents, "1017").await;
    let _ = provision_and_ask(&provider, &documents, "2130").await;

    let calls = provider.calls();
    assert_eq!(calls.create_assistant, 1);
    assert_eq!(calls.create_vector_store, 1);
    assert_eq!(calls.upload_file, 1);
    assert_eq!(calls.create_file_batch, 1);
    assert_eq!(calls.update_assistant, 1, "second attach is a no-op");
    assert_eq!(calls.create_thread, 2);
    assert_eq!(provider.assistants().len(), 1);
    assert_eq!(provider.vector_stores().len(), 1);
}

#[tokio::test]
async fn test_unknown_code_reply_is_reported_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let provider = MockProvider::new().with_reply(
        "{\"message\": \"No matching record found for SIRSUP code 9999\"}",
        vec![],
    );

    let answer = provision_and_ask(&provider, &[write_document(&dir)], "9999")
        .await
        .ready()
        .unwrap();

    assert!(answer.citations.is_empty());
    assert_eq!(
        answer.json().unwrap()["message"],
        "No matching record found for SIRSUP code 9999"
    );
}

#[tokio::test]
async fn test_run_without_messages_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let provider = MockProvider::new();

    let outcome = provision_and_ask(&provider, &[write_document(&dir)], "1017").await;
    assert!(outcome.is_empty());
}

#[tokio::test]
async fn test_existing_store_without_documents_asks_without_attachment() {
    let provider = MockProvider::new()
        .with_vector_store(VectorStore {
            id: "vs_existing".into(),
            name: Some(DEFAULT_STORE_NAME.into()),
            status: Some("completed".into()),
            file_counts: FileCounts::default(),
            created_at: 1,
        })
        .with_reply("{}", vec![]);

    let outcome = provision_and_ask(&provider, &[], "1017").await;
    assert!(outcome.is_ready());
    assert!(provider.threads()[0].messages[0].attachments.is_empty());
    assert_eq!(provider.calls().upload_file, 0);
}

#[tokio::test]
async fn test_query_failure_does_not_affect_provisioning() {
    let dir = tempfile::tempdir().unwrap();
    let provider = MockProvider::new()
        .fail_on(MockOperation::CreateRun, ApiError::rate_limited());

    let outcome = provision_and_ask(&provider, &[write_document(&dir)], "1017").await;
    match outcome {
        Outcome::Failed(Error::Api(e)) => assert!(e.is_retryable()),
        other => panic!("expected failed outcome, got {other:?}"),
    }

    let assistants = provider.assistants();
    assert_eq!(assistants[0].name.as_deref(), Some(DEFAULT_ASSISTANT_NAME));
    assert_eq!(assistants[0].vector_store_ids().map(<[String]>::len), Some(1));
}
