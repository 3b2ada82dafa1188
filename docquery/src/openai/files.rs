//! OpenAI FileProvider implementation.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};

use crate::error::Result;
use crate::file::{ASSISTANTS_PURPOSE, FileObject, FileProvider, FileUpload};

use super::client::OpenAI;

#[async_trait]
impl FileProvider for OpenAI {
    async fn upload_file(&self, upload: FileUpload) -> Result<FileObject> {
        let url = self.endpoint(&["files"])?;
        let FileUpload { filename, bytes } = upload;

        let form = Form::new()
            .text("purpose", ASSISTANTS_PURPOSE)
            .part("file", Part::bytes(bytes).file_name(filename));

        self.post_multipart(url, form, "file object").await
    }

    async fn retrieve_file(&self, file_id: &str) -> Result<FileObject> {
        let url = self.endpoint(&["files", file_id])?;
        self.get_json(url, "file object").await
    }
}
