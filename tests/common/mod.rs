#![allow(dead_code)]

use async_trait::async_trait;
use docfill_server::assembly::common::default_templates_dir;
use docfill_server::assembly::{builtin_document_types, PdfRenderer};
use docfill_server::config::AppConfig;
use docfill_server::storage::{ObjectStorage, StorageError};
use docfill_server::templates::TemplateStore;
use docfill_server::AppState;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

pub const BOUNDARY: &str = "----docfill-test-boundary";

/// In-memory object storage.
#[derive(Default)]
pub struct MockObjectStorage {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MockObjectStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn has_file(&self, filename: &str) -> bool {
        self.files.lock().await.contains_key(filename)
    }

    pub async fn file_count(&self) -> usize {
        self.files.lock().await.len()
    }
}

#[async_trait]
impl ObjectStorage for MockObjectStorage {
    async fn upload_file(&self, filename: &str, file_data: &[u8]) -> Result<(), StorageError> {
        self.files
            .lock()
            .await
            .insert(filename.to_string(), file_data.to_vec());
        Ok(())
    }

    async fn read_file(&self, filename: &str) -> Result<Vec<u8>, StorageError> {
        self.files
            .lock()
            .await
            .get(filename)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(filename.to_string()))
    }

    async fn delete_file(&self, filename: &str) -> Result<(), StorageError> {
        self.files
            .lock()
            .await
            .remove(filename)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(filename.to_string()))
    }
}

/// Storage whose uploads take a while, to widen race windows.
pub struct SlowStorage {
    pub inner: Arc<MockObjectStorage>,
    upload_delay: Duration,
}

impl SlowStorage {
    pub fn new(inner: Arc<MockObjectStorage>, upload_delay: Duration) -> Self {
        Self {
            inner,
            upload_delay,
        }
    }
}

#[async_trait]
impl ObjectStorage for SlowStorage {
    async fn upload_file(&self, filename: &str, file_data: &[u8]) -> Result<(), StorageError> {
        tokio::time::sleep(self.upload_delay).await;
        self.inner.upload_file(filename, file_data).await
    }

    async fn read_file(&self, filename: &str) -> Result<Vec<u8>, StorageError> {
        self.inner.read_file(filename).await
    }

    async fn delete_file(&self, filename: &str) -> Result<(), StorageError> {
        self.inner.delete_file(filename).await
    }
}

/// Renderer that wraps the HTML in a fake PDF header.
pub struct FakePdfRenderer;

impl PdfRenderer for FakePdfRenderer {
    fn render_pdf(
        &self,
        html: &str,
    ) -> Result<Vec<u8>, docfill_server::assembly::GeneratorError> {
        Ok(format!("%PDF-1.7\n{}", html).into_bytes())
    }
}

pub fn bundled_templates() -> TemplateStore {
    TemplateStore::load(default_templates_dir(), builtin_document_types().unwrap()).unwrap()
}

pub fn test_state(
    storage: Arc<MockObjectStorage>,
    renderer: Option<Arc<dyn PdfRenderer>>,
) -> AppState {
    AppState::with_parts(AppConfig::default(), bundled_templates(), storage, renderer)
}

pub fn slow_state(storage: Arc<MockObjectStorage>, upload_delay: Duration) -> AppState {
    let slow: Arc<dyn ObjectStorage + Send + Sync> =
        Arc::new(SlowStorage::new(storage, upload_delay));
    AppState::with_parts(AppConfig::default(), bundled_templates(), slow, None)
}

/// A multipart part: name, optional filename, body.
pub struct Part<'a> {
    pub name: &'a str,
    pub filename: Option<&'a str>,
    pub body: &'a [u8],
}

impl<'a> Part<'a> {
    pub fn text(name: &'a str, body: &'a str) -> Self {
        Self {
            name,
            filename: None,
            body: body.as_bytes(),
        }
    }

    pub fn file(name: &'a str, filename: &'a str, body: &'a [u8]) -> Self {
        Self {
            name,
            filename: Some(filename),
            body,
        }
    }
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part.filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n",
                    part.name, filename
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                    part.name
                )
                .as_bytes(),
            ),
        }
        body.extend_from_slice(part.body);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}
