//! Idempotent provisioning of the assistant and its knowledge store.
//!
//! Resources are looked up by exact name and reused when present, so running
//! the tool repeatedly converges on one assistant and one store. When several
//! resources share a name, a [`DuplicatePolicy`] decides which one to use.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::assistant::{
    Assistant, AssistantProvider, CreateAssistantRequest, Tool, ToolResources,
    UpdateAssistantRequest,
};
use crate::error::{Error, Result};
use crate::file::{FileProvider, FileUpload};
use crate::poll::Poller;
use crate::vector_store::{
    BatchStatus, CreateVectorStoreRequest, FileBatch, VectorStore, VectorStoreFile,
    VectorStoreProvider,
};

/// Default assistant name.
pub const DEFAULT_ASSISTANT_NAME: &str = "Database Query Assistant";

/// Default assistant instructions.
pub const DEFAULT_INSTRUCTIONS: &str = "You are an expert in querying and analyzing a database \
stored in memory. Use your knowledge and the file_search tool to perform various SELECT queries \
and operations based on provided IDs and other criteria.";

/// Default model.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Default knowledge store name.
pub const DEFAULT_STORE_NAME: &str = "Siruta Database";

/// Default document uploaded into a new knowledge store.
pub const DEFAULT_DOCUMENT: &str = "siruta_rez.txt";

/// How to choose among several resources with the same name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Use the first one in listing order.
    First,
    /// Use the one created last.
    #[default]
    MostRecent,
    /// Fail.
    Reject,
}

impl DuplicatePolicy {
    /// Choose one of `matches`, or `None` when there are none.
    fn pick<T>(
        self,
        kind: &'static str,
        name: &str,
        matches: Vec<T>,
        created_at: impl Fn(&T) -> i64,
    ) -> Result<Option<T>> {
        let count = matches.len();
        if count > 1 {
            warn!(kind, name, count, policy = ?self, "several resources share this name");
        }

        match self {
            Self::Reject if count > 1 => Err(Error::duplicate_name(kind, name, count)),
            Self::First | Self::Reject => Ok(matches.into_iter().next()),
            Self::MostRecent => Ok(matches
                .into_iter()
                .reduce(|best, next| if created_at(&next) > created_at(&best) { next } else { best })),
        }
    }
}

/// Desired configuration of the assistant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantSpec {
    /// Name, used as the reuse key.
    pub name: String,
    /// System instructions.
    pub instructions: String,
    /// Model identifier.
    pub model: String,
    /// Enabled tools.
    pub tools: Vec<Tool>,
}

impl Default for AssistantSpec {
    fn default() -> Self {
        Self::new(DEFAULT_ASSISTANT_NAME, DEFAULT_INSTRUCTIONS, DEFAULT_MODEL)
    }
}

impl AssistantSpec {
    /// An assistant with the `file_search` tool.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        instructions: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into(),
            model: model.into(),
            tools: vec![Tool::FileSearch],
        }
    }

    fn to_request(&self) -> CreateAssistantRequest {
        CreateAssistantRequest::new(&self.name, &self.instructions, &self.model)
            .tools(self.tools.clone())
    }
}

/// Look up the assistant named `name` with a single listing.
pub async fn find_assistant<P>(
    provider: &P,
    name: &str,
    duplicates: DuplicatePolicy,
) -> Result<Option<Assistant>>
where
    P: AssistantProvider + ?Sized,
{
    let matches: Vec<Assistant> = provider
        .list_assistants()
        .await?
        .into_iter()
        .filter(|a| a.name.as_deref() == Some(name))
        .collect();
    duplicates.pick("assistant", name, matches, |a| a.created_at)
}

/// Return the assistant named `spec.name`, creating it when none exists.
///
/// An existing assistant is returned as is, even if its instructions or model
/// differ from `spec`.
pub async fn ensure_assistant<P>(
    provider: &P,
    spec: &AssistantSpec,
    duplicates: DuplicatePolicy,
) -> Result<Assistant>
where
    P: AssistantProvider + ?Sized,
{
    if let Some(existing) = find_assistant(provider, &spec.name, duplicates).await? {
        info!(assistant_id = %existing.id, name = %spec.name, "an assistant with this name already exists");
        return Ok(existing);
    }

    let created = provider.create_assistant(&spec.to_request()).await?;
    info!(assistant_id = %created.id, name = %spec.name, model = %created.model, "created assistant");
    Ok(created)
}

/// Look up the vector store named `name` with a single listing.
pub async fn find_knowledge_store<P>(
    provider: &P,
    name: &str,
    duplicates: DuplicatePolicy,
) -> Result<Option<VectorStore>>
where
    P: VectorStoreProvider + ?Sized,
{
    let matches: Vec<VectorStore> = provider
        .list_vector_stores()
        .await?
        .into_iter()
        .filter(|s| s.name.as_deref() == Some(name))
        .collect();
    duplicates.pick("vector store", name, matches, |s| s.created_at)
}

/// Return the vector store named `name`, creating and filling it when none
/// exists.
///
/// A new store receives every file in `file_paths`, uploaded verbatim and
/// ingested as one batch. The batch is polled until it settles; its outcome is
/// logged, and the store is returned even when ingestion failed.
pub async fn ensure_knowledge_store<P>(
    provider: &P,
    name: &str,
    file_paths: &[PathBuf],
    duplicates: DuplicatePolicy,
    poller: &Poller,
) -> Result<VectorStore>
where
    P: VectorStoreProvider + FileProvider + ?Sized,
{
    if let Some(existing) = find_knowledge_store(provider, name, duplicates).await? {
        info!(vector_store_id = %existing.id, name, "reusing existing vector store");
        return Ok(existing);
    }

    let store = provider
        .create_vector_store(&CreateVectorStoreRequest::new(name))
        .await?;
    info!(vector_store_id = %store.id, name, "created vector store");

    if file_paths.is_empty() {
        warn!(vector_store_id = %store.id, "no documents configured, store left empty");
        return Ok(store);
    }

    let mut uploads = Vec::with_capacity(file_paths.len());
    for path in file_paths {
        let upload = FileUpload::from_path(path)
            .await
            .inspect_err(|e| error!(path = %path.display(), error = %e, "failed to read document"))?;
        uploads.push(upload);
    }

    let mut file_ids = Vec::with_capacity(uploads.len());
    for upload in uploads {
        let file = provider.upload_file(upload).await?;
        debug!(file_id = %file.id, filename = %file.filename, bytes = file.bytes, "uploaded document");
        file_ids.push(file.id);
    }

    let batch = ingest(provider, &store.id, &file_ids, poller).await?;
    match batch.status {
        BatchStatus::Completed => info!(
            batch_id = %batch.id,
            status = %batch.status,
            file_counts = %batch.file_counts,
            "file batch finished"
        ),
        _ => warn!(
            batch_id = %batch.id,
            status = %batch.status,
            file_counts = %batch.file_counts,
            "file batch did not complete"
        ),
    }

    Ok(store)
}

/// Create a batch for `file_ids` and poll it until it settles.
async fn ingest<P>(
    provider: &P,
    store_id: &str,
    file_ids: &[String],
    poller: &Poller,
) -> Result<FileBatch>
where
    P: VectorStoreProvider + ?Sized,
{
    let started = provider.create_file_batch(store_id, file_ids).await?;
    if started.status.is_terminal() {
        return Ok(started);
    }

    let batch_id = started.id.as_str();
    poller
        .until(
            &format!("file batch {batch_id}"),
            move || provider.retrieve_file_batch(store_id, batch_id),
            |batch: &FileBatch| batch.status.is_terminal(),
        )
        .await
}

/// Result of [`attach_knowledge_store`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attachment {
    /// The assistant was updated; its new state.
    Updated(Assistant),
    /// The store was already attached; nothing was sent.
    AlreadyAttached,
}

impl Attachment {
    /// Returns `true` if an update was sent.
    #[must_use]
    pub const fn is_updated(&self) -> bool {
        matches!(self, Self::Updated(_))
    }
}

/// Make `store` one of the stores searched by `assistant`'s `file_search`
/// tool, keeping the stores already configured.
///
/// The check uses `assistant` as given; there is no concurrency control
/// against other writers.
pub async fn attach_knowledge_store<P>(
    provider: &P,
    assistant: &Assistant,
    store: &VectorStore,
) -> Result<Attachment>
where
    P: AssistantProvider + ?Sized,
{
    let vector_store_ids = match assistant.vector_store_ids() {
        Some(ids) if ids.iter().any(|id| *id == store.id) => {
            info!(
                assistant_id = %assistant.id,
                vector_store_id = %store.id,
                "the assistant already has this vector store in its tool resources"
            );
            return Ok(Attachment::AlreadyAttached);
        }
        Some(ids) => ids.iter().cloned().chain([store.id.clone()]).collect(),
        None => vec![store.id.clone()],
    };

    let request = UpdateAssistantRequest {
        tool_resources: Some(ToolResources::file_search(vector_store_ids)),
    };
    let updated = provider.update_assistant(&assistant.id, &request).await?;
    info!(assistant_id = %updated.id, vector_store_id = %store.id, "assistant updated");
    Ok(Attachment::Updated(updated))
}

/// List the documents of `store`, logging each id.
pub async fn list_documents<P>(provider: &P, store: &VectorStore) -> Result<Vec<VectorStoreFile>>
where
    P: VectorStoreProvider + ?Sized,
{
    let files = provider.list_vector_store_files(&store.id).await?;
    for file in &files {
        info!(file_id = %file.id, "document");
    }
    Ok(files)
}

/// The document to attach to queries: the last one listed.
#[must_use]
pub fn select_document(files: &[VectorStoreFile]) -> Option<&str> {
    files.last().map(|f| f.id.as_str())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::mock::{MockOperation, MockProvider};
    use crate::poll::PollPolicy;
    use crate::vector_store::FileCounts;
    use crate::{ApiError, ApiErrorKind};

    fn assistant(id: &str, name: &str, created_at: i64) -> Assistant {
        Assistant {
            id: id.into(),
            name: Some(name.into()),
            instructions: None,
            model: DEFAULT_MODEL.into(),
            tools: vec![Tool::FileSearch],
            tool_resources: None,
            created_at,
        }
    }

    fn store(id: &str, name: &str, created_at: i64) -> VectorStore {
        VectorStore {
            id: id.into(),
            name: Some(name.into()),
            status: Some("completed".into()),
            file_counts: FileCounts::default(),
            created_at,
        }
    }

    fn poller() -> Poller {
        Poller::new(PollPolicy::fixed(Duration::from_millis(1)))
    }

    mod duplicate_policy {
        use super::*;

        fn items() -> Vec<(&'static str, i64)> {
            vec![("a", 5), ("b", 9), ("c", 9), ("d", 1)]
        }

        #[test]
        fn first_keeps_listing_order() {
            let got = DuplicatePolicy::First.pick("x", "n", items(), |i| i.1).unwrap();
            assert_eq!(got.unwrap().0, "a");
        }

        #[test]
        fn most_recent_prefers_earliest_listed_on_ties() {
            let got = DuplicatePolicy::MostRecent.pick("x", "n", items(), |i| i.1).unwrap();
            assert_eq!(got.unwrap().0, "b");
        }

        #[test]
        fn reject_fails_only_on_duplicates() {
            let err = DuplicatePolicy::Reject.pick("x", "n", items(), |i| i.1).unwrap_err();
            assert!(matches!(err, Error::DuplicateName { count: 4, .. }));

            let single = DuplicatePolicy::Reject.pick("x", "n", vec![("a", 1)], |i| i.1).unwrap();
            assert_eq!(single.unwrap().0, "a");
        }

        #[test]
        fn empty_is_none() {
            let got = DuplicatePolicy::default()
                .pick("x", "n", Vec::<(&str, i64)>::new(), |i| i.1)
                .unwrap();
            assert!(got.is_none());
        }

        #[test]
        fn deserializes_snake_case() {
            let policy: DuplicatePolicy = serde_json::from_str("\"most_recent\"").unwrap();
            assert_eq!(policy, DuplicatePolicy::MostRecent);
        }
    }

    mod ensure_assistant {
        use super::*;

        #[tokio::test]
        async fn creates_when_missing() {
            let mock = MockProvider::new();
            let got = ensure_assistant(&mock, &AssistantSpec::default(), DuplicatePolicy::default())
                .await
                .unwrap();

            assert_eq!(got.name.as_deref(), Some(DEFAULT_ASSISTANT_NAME));
            assert_eq!(got.model, DEFAULT_MODEL);
            assert_eq!(got.tools, vec![Tool::FileSearch]);
            assert_eq!(mock.calls().create_assistant, 1);
        }

        #[tokio::test]
        async fn reuses_existing_without_creating() {
            let mock = MockProvider::new()
                .with_assistant(assistant("asst_other", "Other", 1))
                .with_assistant(assistant("asst_1", DEFAULT_ASSISTANT_NAME, 2));

            let got = ensure_assistant(&mock, &AssistantSpec::default(), DuplicatePolicy::default())
                .await
                .unwrap();

            assert_eq!(got.id, "asst_1");
            assert_eq!(mock.calls().create_assistant, 0);
            assert_eq!(mock.calls().list_assistants, 1);
        }

        #[tokio::test]
        async fn is_idempotent() {
            let mock = MockProvider::new();
            let spec = AssistantSpec::default();
            let first = ensure_assistant(&mock, &spec, DuplicatePolicy::default()).await.unwrap();
            let second = ensure_assistant(&mock, &spec, DuplicatePolicy::default()).await.unwrap();

            assert_eq!(first.id, second.id);
            assert_eq!(mock.assistants().len(), 1);
        }

        #[tokio::test]
        async fn duplicates_follow_policy() {
            let mock = MockProvider::new()
                .with_assistant(assistant("asst_old", DEFAULT_ASSISTANT_NAME, 10))
                .with_assistant(assistant("asst_new", DEFAULT_ASSISTANT_NAME, 20));
            let spec = AssistantSpec::default();

            let recent = ensure_assistant(&mock, &spec, DuplicatePolicy::MostRecent).await.unwrap();
            assert_eq!(recent.id, "asst_new");

            let first = ensure_assistant(&mock, &spec, DuplicatePolicy::First).await.unwrap();
            assert_eq!(first.id, "asst_old");

            let err = ensure_assistant(&mock, &spec, DuplicatePolicy::Reject).await.unwrap_err();
            assert!(matches!(err, Error::DuplicateName { kind: "assistant", count: 2, .. }));
        }

        #[tokio::test]
        async fn list_failure_propagates() {
            let mock = MockProvider::new()
                .fail_on(MockOperation::ListAssistants, ApiError::auth("Incorrect API key provided"));
            let err = ensure_assistant(&mock, &AssistantSpec::default(), DuplicatePolicy::default())
                .await
                .unwrap_err();

            assert!(matches!(err, Error::Api(ref e) if e.kind == ApiErrorKind::Auth));
            assert_eq!(mock.calls().create_assistant, 0);
        }
    }

    mod ensure_knowledge_store {
        use super::*;

        fn document(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
            let path = dir.path().join(name);
            std::fs::write(&path, content).unwrap();
            path
        }

        #[tokio::test]
        async fn reuses_existing_without_uploading() {
            let mock = MockProvider::new().with_vector_store(store("vs_1", DEFAULT_STORE_NAME, 1));
            let got = ensure_knowledge_store(
                &mock,
                DEFAULT_STORE_NAME,
                &[PathBuf::from("does-not-matter.txt")],
                DuplicatePolicy::default(),
                &poller(),
            )
            .await
            .unwrap();

            assert_eq!(got.id, "vs_1");
            assert_eq!(mock.calls().create_vector_store, 0);
            assert_eq!(mock.calls().upload_file, 0);
            assert_eq!(mock.calls().create_file_batch, 0);
        }

        #[tokio::test]
        async fn creates_uploads_and_ingests() {
            let dir = tempfile::tempdir().unwrap();
            let path = document(&dir, DEFAULT_DOCUMENT, "SIRUTA;DENLOC\n1017;ALBA IULIA\n");
            let mock = MockProvider::new()
                .with_batch_statuses(vec![BatchStatus::InProgress, BatchStatus::Completed]);

            let got = ensure_knowledge_store(
                &mock,
                DEFAULT_STORE_NAME,
                &[path],
                DuplicatePolicy::default(),
                &poller(),
            )
            .await
            .unwrap();

            assert_eq!(got.name.as_deref(), Some(DEFAULT_STORE_NAME));
            assert_eq!(mock.uploads(), vec![DEFAULT_DOCUMENT.to_owned()]);
            assert_eq!(mock.batch_requests().len(), 1);
            assert_eq!(mock.calls().retrieve_file_batch, 1);

            let files = list_documents(&mock, &got).await.unwrap();
            assert_eq!(files.len(), 1);
        }

        #[tokio::test]
        async fn batch_failure_still_returns_store() {
            let dir = tempfile::tempdir().unwrap();
            let path = document(&dir, "a.txt", "x");
            let mock = MockProvider::new().with_batch_statuses(vec![BatchStatus::Failed]);

            let got = ensure_knowledge_store(&mock, "S", &[path], DuplicatePolicy::default(), &poller())
                .await
                .unwrap();
            assert_eq!(got.name.as_deref(), Some("S"));
            assert_eq!(mock.calls().retrieve_file_batch, 0);
        }

        #[tokio::test]
        async fn missing_document_fails_after_store_creation() {
            let dir = tempfile::tempdir().unwrap();
            let mock = MockProvider::new();

            let err = ensure_knowledge_store(
                &mock,
                "S",
                &[dir.path().join("missing.txt")],
                DuplicatePolicy::default(),
                &poller(),
            )
            .await
            .unwrap_err();

            assert!(matches!(err, Error::Io(_)));
            assert_eq!(mock.calls().create_vector_store, 1);
            assert_eq!(mock.calls().upload_file, 0);
        }

        #[tokio::test]
        async fn uploads_every_document_in_one_batch() {
            let dir = tempfile::tempdir().unwrap();
            let paths = vec![document(&dir, "a.txt", "a"), document(&dir, "b.txt", "b")];
            let mock = MockProvider::new();

            ensure_knowledge_store(&mock, "S", &paths, DuplicatePolicy::default(), &poller())
                .await
                .unwrap();

            assert_eq!(mock.uploads(), vec!["a.txt".to_owned(), "b.txt".to_owned()]);
            let batches = mock.batch_requests();
            assert_eq!(batches.len(), 1);
            assert_eq!(batches[0].len(), 2);
        }

        #[tokio::test]
        async fn no_documents_leaves_store_empty() {
            let mock = MockProvider::new();
            ensure_knowledge_store(&mock, "S", &[], DuplicatePolicy::default(), &poller())
                .await
                .unwrap();
            assert_eq!(mock.calls().create_file_batch, 0);
        }
    }

    mod attach_knowledge_store {
        use super::*;

        fn with_stores(mut a: Assistant, ids: &[&str]) -> Assistant {
            a.tool_resources = Some(ToolResources::file_search(
                ids.iter().map(|s| (*s).to_owned()).collect(),
            ));
            a
        }

        #[tokio::test]
        async fn sets_resources_when_none() {
            let a = assistant("asst_1", "A", 1);
            let mock = MockProvider::new().with_assistant(a.clone());

            let got = attach_knowledge_store(&mock, &a, &store("vs_1", "S", 1)).await.unwrap();
            let Attachment::Updated(updated) = got else {
                unreachable!("expected an update");
            };
            assert_eq!(updated.vector_store_ids().unwrap(), ["vs_1".to_owned()]);
        }

        #[tokio::test]
        async fn appends_to_existing_stores() {
            let a = with_stores(assistant("asst_1", "A", 1), &["vs_0"]);
            let mock = MockProvider::new().with_assistant(a.clone());

            attach_knowledge_store(&mock, &a, &store("vs_1", "S", 1)).await.unwrap();

            let updates = mock.updates();
            assert_eq!(updates.len(), 1);
            let ids = updates[0]
                .1
                .tool_resources
                .as_ref()
                .and_then(|r| r.file_search.as_ref())
                .map(|fs| fs.vector_store_ids.clone())
                .unwrap();
            assert_eq!(ids, vec!["vs_0".to_owned(), "vs_1".to_owned()]);
        }

        #[tokio::test]
        async fn already_attached_sends_nothing() {
            let a = with_stores(assistant("asst_1", "A", 1), &["vs_0", "vs_1"]);
            let mock = MockProvider::new().with_assistant(a.clone());

            let got = attach_knowledge_store(&mock, &a, &store("vs_1", "S", 1)).await.unwrap();
            assert_eq!(got, Attachment::AlreadyAttached);
            assert_eq!(mock.calls().update_assistant, 0);
        }

        #[tokio::test]
        async fn update_failure_propagates() {
            let a = assistant("asst_1", "A", 1);
            let mock = MockProvider::new()
                .with_assistant(a.clone())
                .fail_on(MockOperation::UpdateAssistant, ApiError::not_found("gone"));

            let err = attach_knowledge_store(&mock, &a, &store("vs_1", "S", 1)).await.unwrap_err();
            assert!(matches!(err, Error::Api(ref e) if e.kind == ApiErrorKind::NotFound));
        }
    }

    mod documents {
        use super::*;

        #[tokio::test]
        async fn selects_last_listed() {
            let s = store("vs_1", "S", 1);
            let mock = MockProvider::new()
                .with_store_file("vs_1", "file-a", "a.txt")
                .with_store_file("vs_1", "file-b", "b.txt");

            let files = list_documents(&mock, &s).await.unwrap();
            assert_eq!(select_document(&files), Some("file-b"));
        }

        #[test]
        fn empty_store_selects_nothing() {
            assert_eq!(select_document(&[]), None);
        }
    }
}
