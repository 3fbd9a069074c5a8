//! Background persistence of the document index.
//!
//! Handlers update the in-memory index and signal this worker, which batches
//! bursts of signals and then stores the index as it stands at write time.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::documents::DocumentRecord;
use crate::storage::{ObjectStorage, StorageError};

pub const INDEX_FILE: &str = "index.json";
pub const CHANNEL_CAPACITY: usize = 100;
const DEBOUNCE_MS: u64 = 500;

/// In-memory document index shared by the handlers and the worker.
pub type DocumentIndex = Arc<RwLock<BTreeMap<Uuid, DocumentRecord>>>;

pub async fn start_persistence_worker(
    mut receiver: mpsc::Receiver<()>,
    documents: DocumentIndex,
    storage: Arc<dyn ObjectStorage + Send + Sync>,
) {
    log::info!("Document index persistence worker started");

    while receiver.recv().await.is_some() {
        while receiver.try_recv().is_ok() {
            log::debug!("Batching pending index update");
        }

        tokio::time::sleep(tokio::time::Duration::from_millis(DEBOUNCE_MS)).await;

        while receiver.try_recv().is_ok() {
            log::debug!("Batching index update after debounce delay");
        }

        let latest: Vec<DocumentRecord> = documents.read().values().cloned().collect();
        match serde_json::to_vec_pretty(&latest) {
            Ok(json_data) => match storage.upload_file(INDEX_FILE, &json_data).await {
                Ok(()) => log::info!("Document index persisted ({} documents)", latest.len()),
                Err(e) => log::error!("Failed to persist document index: {}", e),
            },
            Err(e) => log::error!("Failed to serialize document index: {}", e),
        }
    }

    log::info!("Document index persistence worker stopped");
}

/// Read the persisted index. A missing index is an empty one.
pub async fn load_index(
    storage: &(dyn ObjectStorage + Send + Sync),
) -> anyhow::Result<Vec<DocumentRecord>> {
    match storage.read_file(INDEX_FILE).await {
        Ok(bytes) => {
            let records: Vec<DocumentRecord> = serde_json::from_slice(&bytes)?;
            log::info!("Loaded document index with {} documents", records.len());
            Ok(records)
        }
        Err(StorageError::NotFound(_)) => {
            log::info!("No document index found, starting empty");
            Ok(Vec::new())
        }
        Err(e) => Err(e.into()),
    }
}
