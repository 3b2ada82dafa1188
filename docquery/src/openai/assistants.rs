//! OpenAI AssistantProvider implementation.

use async_trait::async_trait;

use crate::assistant::{
    Assistant, AssistantProvider, CreateAssistantRequest, UpdateAssistantRequest,
};
use crate::error::Result;

use super::client::OpenAI;

#[async_trait]
impl AssistantProvider for OpenAI {
    async fn list_assistants(&self) -> Result<Vec<Assistant>> {
        self.list_all(&["assistants"], &[], "assistant list").await
    }

    async fn create_assistant(&self, request: &CreateAssistantRequest) -> Result<Assistant> {
        let url = self.endpoint(&["assistants"])?;
        self.post_json(url, request, "assistant").await
    }

    async fn update_assistant(
        &self,
        assistant_id: &str,
        request: &UpdateAssistantRequest,
    ) -> Result<Assistant> {
        let url = self.endpoint(&["assistants", assistant_id])?;
        self.post_json(url, request, "assistant").await
    }
}
