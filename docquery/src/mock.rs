//! In-memory provider for testing.
//!
//! [`MockProvider`] implements every provider trait against local state, so
//! provisioning and queries can be exercised without network access. Batch
//! and run progress are scripted as status sequences.
//!
//! ```rust,ignore
//! use docquery::mock::MockProvider;
//! use docquery::thread::RunStatus;
//!
//! let provider = MockProvider::new()
//!     .with_run_statuses(vec![RunStatus::Queued, RunStatus::Completed])
//!     .with_reply("{\"DENLOC\": \"ALBA IULIA\"}", vec![]);
//! ```

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::assistant::{
    Assistant, AssistantProvider, CreateAssistantRequest, UpdateAssistantRequest,
};
use crate::error::{ApiError, Result};
use crate::file::{ASSISTANTS_PURPOSE, FileObject, FileProvider, FileUpload};
use crate::thread::{
    Annotation, CreateRunRequest, CreateThreadRequest, MessageContent, MessageRole, Run,
    RunError, RunStatus, TextContent, Thread, ThreadMessage, ThreadProvider,
};
use crate::vector_store::{
    BatchStatus, CreateVectorStoreRequest, FileBatch, FileCounts, VectorStore, VectorStoreFile,
    VectorStoreProvider,
};

/// Operations a [`MockProvider`] can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum MockOperation {
    /// [`AssistantProvider::list_assistants`].
    ListAssistants,
    /// [`AssistantProvider::create_assistant`].
    CreateAssistant,
    /// [`AssistantProvider::update_assistant`].
    UpdateAssistant,
    /// [`VectorStoreProvider::list_vector_stores`].
    ListVectorStores,
    /// [`VectorStoreProvider::create_vector_store`].
    CreateVectorStore,
    /// [`VectorStoreProvider::create_file_batch`].
    CreateFileBatch,
    /// [`VectorStoreProvider::list_vector_store_files`].
    ListVectorStoreFiles,
    /// [`FileProvider::upload_file`].
    UploadFile,
    /// [`FileProvider::retrieve_file`].
    RetrieveFile,
    /// [`ThreadProvider::create_thread`].
    CreateThread,
    /// [`ThreadProvider::create_run`].
    CreateRun,
    /// [`ThreadProvider::retrieve_run`].
    RetrieveRun,
    /// [`ThreadProvider::list_messages`].
    ListMessages,
}

/// Number of calls made per operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MockCalls {
    /// Assistant listings.
    pub list_assistants: usize,
    /// Assistant creations.
    pub create_assistant: usize,
    /// Assistant updates.
    pub update_assistant: usize,
    /// Vector store listings.
    pub list_vector_stores: usize,
    /// Vector store creations.
    pub create_vector_store: usize,
    /// File batch creations.
    pub create_file_batch: usize,
    /// File batch fetches.
    pub retrieve_file_batch: usize,
    /// Vector store file listings.
    pub list_vector_store_files: usize,
    /// File uploads.
    pub upload_file: usize,
    /// File metadata fetches.
    pub retrieve_file: usize,
    /// Thread creations.
    pub create_thread: usize,
    /// Run creations.
    pub create_run: usize,
    /// Run fetches.
    pub retrieve_run: usize,
    /// Message listings.
    pub list_messages: usize,
}

#[derive(Debug)]
struct MockState {
    next_id: u64,
    clock: i64,
    calls: MockCalls,
    failures: HashMap<MockOperation, ApiError>,
    assistants: Vec<Assistant>,
    stores: Vec<VectorStore>,
    store_files: HashMap<String, Vec<VectorStoreFile>>,
    files: HashMap<String, FileObject>,
    batch_statuses: Vec<BatchStatus>,
    batches: HashMap<String, (FileBatch, usize)>,
    run_statuses: Vec<RunStatus>,
    run_error: Option<RunError>,
    runs: HashMap<String, (Run, usize)>,
    messages: Vec<ThreadMessage>,
    uploads: Vec<String>,
    batch_requests: Vec<Vec<String>>,
    updates: Vec<(String, UpdateAssistantRequest)>,
    threads: Vec<CreateThreadRequest>,
    message_queries: Vec<Option<String>>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            next_id: 0,
            clock: 1_700_000_000,
            calls: MockCalls::default(),
            failures: HashMap::new(),
            assistants: Vec::new(),
            stores: Vec::new(),
            store_files: HashMap::new(),
            files: HashMap::new(),
            batch_statuses: vec![BatchStatus::Completed],
            batches: HashMap::new(),
            run_statuses: vec![RunStatus::Completed],
            run_error: None,
            runs: HashMap::new(),
            messages: Vec::new(),
            uploads: Vec::new(),
            batch_requests: Vec::new(),
            updates: Vec::new(),
            threads: Vec::new(),
            message_queries: Vec::new(),
        }
    }
}

impl MockState {
    fn id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{}", self.next_id)
    }

    fn tick(&mut self) -> i64 {
        self.clock += 1;
        self.clock
    }

    fn check(&self, op: MockOperation) -> Result<()> {
        match self.failures.get(&op) {
            Some(err) => Err(err.clone().into()),
            None => Ok(()),
        }
    }
}

/// Status at `step` of a script; the last entry repeats.
fn scripted<T: Copy>(script: &[T], step: usize, fallback: T) -> T {
    script
        .get(step)
        .or_else(|| script.last())
        .copied()
        .unwrap_or(fallback)
}

fn batch_counts(status: BatchStatus, total: u32) -> FileCounts {
    let mut counts = FileCounts {
        total,
        ..FileCounts::default()
    };
    match status {
        BatchStatus::InProgress => counts.in_progress = total,
        BatchStatus::Completed => counts.completed = total,
        BatchStatus::Failed | BatchStatus::Expired | BatchStatus::Unknown => counts.failed = total,
        BatchStatus::Cancelled => counts.cancelled = total,
    }
    counts
}

/// An in-memory implementation of every provider trait.
#[derive(Debug, Default)]
pub struct MockProvider {
    state: Mutex<MockState>,
}

impl MockProvider {
    /// Create an empty mock where batches and runs complete immediately.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn mutate(self, f: impl FnOnce(&mut MockState)) -> Self {
        f(&mut self.state());
        self
    }

    /// Seed an existing assistant.
    #[must_use]
    pub fn with_assistant(self, assistant: Assistant) -> Self {
        self.mutate(|s| s.assistants.push(assistant))
    }

    /// Seed an existing vector store.
    #[must_use]
    pub fn with_vector_store(self, store: VectorStore) -> Self {
        self.mutate(|s| s.stores.push(store))
    }

    /// Seed an uploaded file and list it in `store_id`.
    #[must_use]
    pub fn with_store_file(
        self,
        store_id: impl Into<String>,
        file_id: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        let store_id = store_id.into();
        let file_id = file_id.into();
        let filename = filename.into();
        self.mutate(|s| {
            let created_at = s.tick();
            s.files.insert(
                file_id.clone(),
                FileObject {
                    id: file_id.clone(),
                    filename,
                    bytes: 0,
                    purpose: Some(ASSISTANTS_PURPOSE.to_owned()),
                    created_at,
                },
            );
            s.store_files
                .entry(store_id.clone())
                .or_default()
                .push(VectorStoreFile {
                    id: file_id,
                    vector_store_id: store_id,
                    status: Some("completed".to_owned()),
                    created_at,
                });
        })
    }

    /// Statuses reported by a new batch and its successive fetches.
    #[must_use]
    pub fn with_batch_statuses(self, statuses: Vec<BatchStatus>) -> Self {
        self.mutate(|s| s.batch_statuses = statuses)
    }

    /// Statuses reported by a new run and its successive fetches.
    #[must_use]
    pub fn with_run_statuses(self, statuses: Vec<RunStatus>) -> Self {
        self.mutate(|s| s.run_statuses = statuses)
    }

    /// Error attached to runs that end without completing.
    #[must_use]
    pub fn with_run_error(self, code: impl Into<String>, message: impl Into<String>) -> Self {
        let error = RunError {
            code: code.into(),
            message: message.into(),
        };
        self.mutate(|s| s.run_error = Some(error))
    }

    /// Reply with a single assistant text message.
    #[must_use]
    pub fn with_reply(self, text: impl Into<String>, annotations: Vec<Annotation>) -> Self {
        let message = ThreadMessage {
            id: "msg_reply".to_owned(),
            role: MessageRole::Assistant,
            run_id: None,
            content: vec![MessageContent::Text {
                text: TextContent {
                    value: text.into(),
                    annotations,
                },
            }],
        };
        self.with_messages(vec![message])
    }

    /// Messages returned by every listing.
    #[must_use]
    pub fn with_messages(self, messages: Vec<ThreadMessage>) -> Self {
        self.mutate(|s| s.messages = messages)
    }

    /// Fail every call to `op` with `error`.
    #[must_use]
    pub fn fail_on(self, op: MockOperation, error: ApiError) -> Self {
        self.mutate(|s| {
            s.failures.insert(op, error);
        })
    }

    /// Calls made so far.
    #[must_use]
    pub fn calls(&self) -> MockCalls {
        self.state().calls
    }

    /// Current assistants.
    #[must_use]
    pub fn assistants(&self) -> Vec<Assistant> {
        self.state().assistants.clone()
    }

    /// Current vector stores.
    #[must_use]
    pub fn vector_stores(&self) -> Vec<VectorStore> {
        self.state().stores.clone()
    }

    /// Filenames uploaded so far.
    #[must_use]
    pub fn uploads(&self) -> Vec<String> {
        self.state().uploads.clone()
    }

    /// File ids of every batch created so far.
    #[must_use]
    pub fn batch_requests(&self) -> Vec<Vec<String>> {
        self.state().batch_requests.clone()
    }

    /// Assistant updates sent so far.
    #[must_use]
    pub fn updates(&self) -> Vec<(String, UpdateAssistantRequest)> {
        self.state().updates.clone()
    }

    /// Thread creation requests sent so far.
    #[must_use]
    pub fn threads(&self) -> Vec<CreateThreadRequest> {
        self.state().threads.clone()
    }

    /// The `run_id` filter of every message listing.
    #[must_use]
    pub fn message_queries(&self) -> Vec<Option<String>> {
        self.state().message_queries.clone()
    }
}

#[async_trait]
impl AssistantProvider for MockProvider {
    async fn list_assistants(&self) -> Result<Vec<Assistant>> {
        let mut s = self.state();
        s.calls.list_assistants += 1;
        s.check(MockOperation::ListAssistants)?;
        Ok(s.assistants.clone())
    }

    async fn create_assistant(&self, request: &CreateAssistantRequest) -> Result<Assistant> {
        let mut s = self.state();
        s.calls.create_assistant += 1;
        s.check(MockOperation::CreateAssistant)?;
        let assistant = Assistant {
            id: s.id("asst_"),
            name: Some(request.name.clone()),
            instructions: Some(request.instructions.clone()),
            model: request.model.clone(),
            tools: request.tools.clone(),
            tool_resources: None,
            created_at: s.tick(),
        };
        s.assistants.push(assistant.clone());
        Ok(assistant)
    }

    async fn update_assistant(
        &self,
        assistant_id: &str,
        request: &UpdateAssistantRequest,
    ) -> Result<Assistant> {
        let mut s = self.state();
        s.calls.update_assistant += 1;
        s.check(MockOperation::UpdateAssistant)?;
        s.updates.push((assistant_id.to_owned(), request.clone()));
        let assistant = s
            .assistants
            .iter_mut()
            .find(|a| a.id == assistant_id)
            .ok_or_else(|| ApiError::not_found(format!("No assistant found with id '{assistant_id}'.")))?;
        if let Some(resources) = &request.tool_resources {
            assistant.tool_resources = Some(resources.clone());
        }
        Ok(assistant.clone())
    }
}

#[async_trait]
impl VectorStoreProvider for MockProvider {
    async fn list_vector_stores(&self) -> Result<Vec<VectorStore>> {
        let mut s = self.state();
        s.calls.list_vector_stores += 1;
        s.check(MockOperation::ListVectorStores)?;
        Ok(s.stores.clone())
    }

    async fn create_vector_store(
        &self,
        request: &CreateVectorStoreRequest,
    ) -> Result<VectorStore> {
        let mut s = self.state();
        s.calls.create_vector_store += 1;
        s.check(MockOperation::CreateVectorStore)?;
        let store = VectorStore {
            id: s.id("vs_"),
            name: Some(request.name.clone()),
            status: Some("completed".to_owned()),
            file_counts: FileCounts::default(),
            created_at: s.tick(),
        };
        s.stores.push(store.clone());
        Ok(store)
    }

    async fn create_file_batch(
        &self,
        vector_store_id: &str,
        file_ids: &[String],
    ) -> Result<FileBatch> {
        let mut s = self.state();
        s.calls.create_file_batch += 1;
        s.check(MockOperation::CreateFileBatch)?;
        if !s.stores.iter().any(|st| st.id == vector_store_id) {
            return Err(ApiError::not_found(format!(
                "No vector store found with id '{vector_store_id}'."
            ))
            .into());
        }
        s.batch_requests.push(file_ids.to_vec());

        let created_at = s.tick();
        let files = s.store_files.entry(vector_store_id.to_owned()).or_default();
        files.extend(file_ids.iter().map(|id| VectorStoreFile {
            id: id.clone(),
            vector_store_id: vector_store_id.to_owned(),
            status: Some("completed".to_owned()),
            created_at,
        }));

        let status = scripted(&s.batch_statuses, 0, BatchStatus::Completed);
        let total = u32::try_from(file_ids.len()).unwrap_or(u32::MAX);
        let batch = FileBatch {
            id: s.id("vsfb_"),
            vector_store_id: vector_store_id.to_owned(),
            status,
            file_counts: batch_counts(status, total),
        };
        s.batches.insert(batch.id.clone(), (batch.clone(), 0));
        Ok(batch)
    }

    async fn retrieve_file_batch(
        &self,
        vector_store_id: &str,
        batch_id: &str,
    ) -> Result<FileBatch> {
        let mut s = self.state();
        s.calls.retrieve_file_batch += 1;
        let MockState {
            batches,
            batch_statuses,
            ..
        } = &mut *s;
        let (batch, step) = batches
            .get_mut(batch_id)
            .filter(|(b, _)| b.vector_store_id == vector_store_id)
            .ok_or_else(|| ApiError::not_found(format!("No file batch found with id '{batch_id}'.")))?;
        *step += 1;
        batch.status = scripted(batch_statuses, *step, BatchStatus::Completed);
        batch.file_counts = batch_counts(batch.status, batch.file_counts.total);
        Ok(batch.clone())
    }

    async fn list_vector_store_files(&self, vector_store_id: &str) -> Result<Vec<VectorStoreFile>> {
        let mut s = self.state();
        s.calls.list_vector_store_files += 1;
        s.check(MockOperation::ListVectorStoreFiles)?;
        Ok(s.store_files.get(vector_store_id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl FileProvider for MockProvider {
    async fn upload_file(&self, upload: FileUpload) -> Result<FileObject> {
        let mut s = self.state();
        s.calls.upload_file += 1;
        s.check(MockOperation::UploadFile)?;
        let file = FileObject {
            id: s.id("file-"),
            filename: upload.filename.clone(),
            bytes: upload.bytes.len() as u64,
            purpose: Some(ASSISTANTS_PURPOSE.to_owned()),
            created_at: s.tick(),
        };
        s.uploads.push(upload.filename);
        s.files.insert(file.id.clone(), file.clone());
        Ok(file)
    }

    async fn retrieve_file(&self, file_id: &str) -> Result<FileObject> {
        let mut s = self.state();
        s.calls.retrieve_file += 1;
        s.check(MockOperation::RetrieveFile)?;
        s.files
            .get(file_id)
            .cloned()
            .ok_or_else(|| ApiError::not_found(format!("No such File object: {file_id}")).into())
    }
}

#[async_trait]
impl ThreadProvider for MockProvider {
    async fn create_thread(&self, request: &CreateThreadRequest) -> Result<Thread> {
        let mut s = self.state();
        s.calls.create_thread += 1;
        s.check(MockOperation::CreateThread)?;
        s.threads.push(request.clone());
        Ok(Thread {
            id: s.id("thread_"),
            created_at: s.tick(),
        })
    }

    async fn create_run(&self, thread_id: &str, request: &CreateRunRequest) -> Result<Run> {
        let mut s = self.state();
        s.calls.create_run += 1;
        s.check(MockOperation::CreateRun)?;
        let status = scripted(&s.run_statuses, 0, RunStatus::Completed);
        let run = Run {
            id: s.id("run_"),
            thread_id: thread_id.to_owned(),
            assistant_id: request.assistant_id.clone(),
            status,
            last_error: None,
        };
        s.runs.insert(run.id.clone(), (run.clone(), 0));
        Ok(run)
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        let mut s = self.state();
        s.calls.retrieve_run += 1;
        s.check(MockOperation::RetrieveRun)?;
        let MockState {
            runs,
            run_statuses,
            run_error,
            ..
        } = &mut *s;
        let (run, step) = runs
            .get_mut(run_id)
            .filter(|(r, _)| r.thread_id == thread_id)
            .ok_or_else(|| ApiError::not_found(format!("No run found with id '{run_id}'.")))?;
        *step += 1;
        run.status = scripted(run_statuses, *step, RunStatus::Completed);
        if run.status.is_terminal() && run.status != RunStatus::Completed {
            run.last_error.clone_from(run_error);
        }
        Ok(run.clone())
    }

    async fn list_messages(
        &self,
        _thread_id: &str,
        run_id: Option<&str>,
    ) -> Result<Vec<ThreadMessage>> {
        let mut s = self.state();
        s.calls.list_messages += 1;
        s.check(MockOperation::ListMessages)?;
        s.message_queries.push(run_id.map(str::to_owned));
        Ok(s
            .messages
            .iter()
            .cloned()
            .map(|mut m| {
                if m.run_id.is_none() {
                    m.run_id = run_id.map(str::to_owned);
                }
                m
            })
            .collect())
    }
}
