//! OpenAI ThreadProvider implementation.

use async_trait::async_trait;

use crate::error::Result;
use crate::thread::{
    CreateRunRequest, CreateThreadRequest, Run, Thread, ThreadMessage, ThreadProvider,
};

use super::client::OpenAI;

#[async_trait]
impl ThreadProvider for OpenAI {
    async fn create_thread(&self, request: &CreateThreadRequest) -> Result<Thread> {
        let url = self.endpoint(&["threads"])?;
        self.post_json(url, request, "thread").await
    }

    async fn create_run(&self, thread_id: &str, request: &CreateRunRequest) -> Result<Run> {
        let url = self.endpoint(&["threads", thread_id, "runs"])?;
        self.post_json(url, request, "run").await
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        let url = self.endpoint(&["threads", thread_id, "runs", run_id])?;
        self.get_json(url, "run").await
    }

    async fn list_messages(
        &self,
        thread_id: &str,
        run_id: Option<&str>,
    ) -> Result<Vec<ThreadMessage>> {
        let query: Vec<(&str, &str)> = run_id.map(|id| ("run_id", id)).into_iter().collect();
        self.list_all(&["threads", thread_id, "messages"], &query, "message list")
            .await
    }
}
