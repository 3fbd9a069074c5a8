use actix_web::{web, HttpResponse};
use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::assembly::{
    builtin_document_types, AssemblyOptions, CommandPdfRenderer, DataRecord, DocumentGenerator,
    GeneratedDocument, GenerationRequest, Generator, GeneratorError, OutputFormat, PdfRenderer,
    RequiredFields, Validator,
};
use crate::config::AppConfig;
use crate::documents::persistence::{
    load_index, start_persistence_worker, DocumentIndex, CHANNEL_CAPACITY,
};
use crate::storage::{LocalStorage, ObjectStorage};
use crate::templates::TemplateStore;
use crate::ErrorResponse;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub templates: Arc<TemplateStore>,
    pub documents: DocumentIndex,
    pub storage: Arc<dyn ObjectStorage + Send + Sync>,
    pub renderer: Option<Arc<dyn PdfRenderer>>,
    pub persist_sender: mpsc::Sender<()>,
    /// Serializes updates and deletes of the same document.
    document_locks: Arc<Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>>,
}

/// One template rendering, run off the async executor.
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub template_id: String,
    pub data: Map<String, Value>,
    pub options: AssemblyOptions,
    pub format: OutputFormat,
    pub output_name: Option<String>,
    /// Reject data that leaves required fields empty.
    pub validate: bool,
}

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("template '{0}' not found")]
    UnknownTemplate(String),
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Generator(#[from] GeneratorError),
    #[error("generation task failed: {0}")]
    Blocking(String),
}

impl From<GenerateError> for HttpResponse {
    fn from(error: GenerateError) -> Self {
        let message = error.to_string();
        match error {
            GenerateError::UnknownTemplate(_) => {
                HttpResponse::NotFound().json(ErrorResponse::not_found(&message))
            }
            GenerateError::Validation(_) => {
                HttpResponse::BadRequest().json(ErrorResponse::bad_request(&message))
            }
            GenerateError::Generator(GeneratorError::RendererUnavailable) => {
                HttpResponse::ServiceUnavailable()
                    .json(ErrorResponse::new("ServiceUnavailable", &message))
            }
            _ => {
                log::error!("Document generation failed: {}", message);
                HttpResponse::InternalServerError().json(ErrorResponse::internal_error(&message))
            }
        }
    }
}

impl AppState {
    /// Build the state from configuration: load templates, open storage,
    /// restore the document index and start the persistence worker.
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        let templates = TemplateStore::load(&config.templates_dir, builtin_document_types()?)?;
        let storage: Arc<dyn ObjectStorage + Send + Sync> =
            Arc::new(LocalStorage::new(&config.documents_dir).await?);

        let renderer = config
            .pdf_renderer
            .as_deref()
            .and_then(CommandPdfRenderer::from_command_line)
            .map(|renderer| {
                log::info!("PDF output enabled via '{}'", renderer.program());
                Arc::new(renderer) as Arc<dyn PdfRenderer>
            });
        if renderer.is_none() {
            log::warn!("PDF_RENDERER not set, documents will be generated as HTML");
        }

        let records = load_index(storage.as_ref()).await?;
        let state = Self::with_parts(config, templates, storage, renderer);
        state
            .documents
            .write()
            .extend(records.into_iter().map(|record| (record.id, record)));
        Ok(state)
    }

    /// Assemble a state from ready parts. Spawns the persistence worker, so
    /// it must run inside a Tokio runtime.
    pub fn with_parts(
        config: AppConfig,
        templates: TemplateStore,
        storage: Arc<dyn ObjectStorage + Send + Sync>,
        renderer: Option<Arc<dyn PdfRenderer>>,
    ) -> Self {
        let (persist_sender, receiver) = mpsc::channel(CHANNEL_CAPACITY);
        let documents: DocumentIndex = Arc::new(RwLock::new(BTreeMap::new()));

        let documents_clone = documents.clone();
        let storage_clone = storage.clone();
        tokio::spawn(async move {
            start_persistence_worker(receiver, documents_clone, storage_clone).await;
        });

        Self {
            config: Arc::new(config),
            templates: Arc::new(templates),
            documents,
            storage,
            renderer,
            persist_sender,
            document_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Format used when the caller does not choose one.
    pub fn preferred_format(&self) -> OutputFormat {
        if self.renderer.is_some() {
            OutputFormat::Pdf
        } else {
            OutputFormat::Html
        }
    }

    pub async fn generate(&self, job: RenderJob) -> Result<GeneratedDocument, GenerateError> {
        let templates = self.templates.clone();
        let renderer = self.renderer.clone();

        web::block(move || {
            let template = templates
                .get(&job.template_id)
                .ok_or_else(|| GenerateError::UnknownTemplate(job.template_id.clone()))?;
            let data = DataRecord::from_json(&job.data, template.doc_type.list_key());

            if job.validate {
                RequiredFields {
                    doc_type: &template.doc_type,
                    data: &data,
                }
                .validate()
                .map_err(GenerateError::Validation)?;
            }

            let mut request = GenerationRequest::new(data)
                .with_options(job.options)
                .with_format(job.format);
            if let Some(name) = job.output_name {
                request = request.with_output_name(name);
            }

            DocumentGenerator::new(&template.doc_type, &template.content)
                .with_renderer(renderer.as_deref())
                .generate(request)
                .map_err(GenerateError::from)
        })
        .await
        .map_err(|e| GenerateError::Blocking(e.to_string()))?
    }

    /// Hold exclusive access to one document across an update or delete.
    pub async fn lock_document(&self, id: Uuid) -> OwnedMutexGuard<()> {
        let lock = self
            .document_locks
            .lock()
            .entry(id)
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    /// Drop the lock entry of a deleted document.
    pub fn forget_document_lock(&self, id: Uuid) {
        self.document_locks.lock().remove(&id);
    }

    /// Ask the persistence worker to store the current index. The worker
    /// reads the shared map when it writes, so a full queue already covers
    /// this change.
    pub fn persist_documents(&self) {
        match self.persist_sender.try_send(()) {
            Ok(()) => log::debug!("Document index queued for background persistence"),
            Err(TrySendError::Full(())) => {
                log::debug!("Document index persistence already pending")
            }
            Err(TrySendError::Closed(())) => {
                log::error!("Document index persistence worker is not running")
            }
        }
    }
}
