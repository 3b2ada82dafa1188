//! OpenAI VectorStoreProvider implementation.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;
use crate::vector_store::{
    CreateVectorStoreRequest, FileBatch, VectorStore, VectorStoreFile, VectorStoreProvider,
};

use super::client::OpenAI;

/// Body of a file batch creation request.
#[derive(Debug, Serialize)]
struct CreateFileBatchBody<'a> {
    file_ids: &'a [String],
}

#[async_trait]
impl VectorStoreProvider for OpenAI {
    async fn list_vector_stores(&self) -> Result<Vec<VectorStore>> {
        self.list_all(&["vector_stores"], &[], "vector store list").await
    }

    async fn create_vector_store(
        &self,
        request: &CreateVectorStoreRequest,
    ) -> Result<VectorStore> {
        let url = self.endpoint(&["vector_stores"])?;
        self.post_json(url, request, "vector store").await
    }

    async fn create_file_batch(
        &self,
        vector_store_id: &str,
        file_ids: &[String],
    ) -> Result<FileBatch> {
        let url = self.endpoint(&["vector_stores", vector_store_id, "file_batches"])?;
        self.post_json(url, &CreateFileBatchBody { file_ids }, "file batch")
            .await
    }

    async fn retrieve_file_batch(
        &self,
        vector_store_id: &str,
        batch_id: &str,
    ) -> Result<FileBatch> {
        let url = self.endpoint(&["vector_stores", vector_store_id, "file_batches", batch_id])?;
        self.get_json(url, "file batch").await
    }

    async fn list_vector_store_files(&self, vector_store_id: &str) -> Result<Vec<VectorStoreFile>> {
        self.list_all(
            &["vector_stores", vector_store_id, "files"],
            &[],
            "vector store file list",
        )
        .await
    }
}
