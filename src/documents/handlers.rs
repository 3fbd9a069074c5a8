use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::assembly::GeneratedDocument;
use crate::content::mime_type_for;
use crate::documents::models::{stored_name_for, DocumentRecord};
use crate::documents::multipart_parser::{MultipartParser, ParsedDocumentUpload};
use crate::state::RenderJob;
use crate::storage::StorageError;
use crate::{AppState, ErrorResponse};

/// Form payload for creating or updating a document (documentation only).
#[derive(utoipa::ToSchema)]
#[allow(dead_code)]
pub struct DocumentUploadForm {
    /// Ready-made file. When absent the document is generated from the template.
    #[schema(value_type = Option<String>, format = Binary)]
    file: Option<Vec<u8>>,
    template_id: String,
    title: Option<String>,
    /// The template's list field, JSON-encoded, plus any scalar field as its own part
    #[schema(value_type = Option<String>)]
    fields: Option<String>,
}

fn document_not_found(id: Uuid) -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse::not_found(&format!(
        "Document {} not found",
        id
    )))
}

fn storage_failure(e: StorageError) -> HttpResponse {
    log::error!("Document storage failed: {}", e);
    HttpResponse::InternalServerError().json(ErrorResponse::internal_error(&e.to_string()))
}

/// Scalar form parts and, if the list field was sent, its decoded rows.
type FormParts = (BTreeMap<String, String>, Option<Vec<Value>>);

fn split_form_fields(
    mut fields: BTreeMap<String, String>,
    list_key: Option<&str>,
) -> Result<FormParts, String> {
    let rows = match list_key.and_then(|key| fields.remove(key).map(|raw| (key, raw))) {
        Some((_, raw)) if raw.trim().is_empty() => Some(Vec::new()),
        Some((key, raw)) => match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(rows)) => Some(rows),
            Ok(_) | Err(_) => {
                return Err(format!("Field '{}' must be a JSON array of objects", key));
            }
        },
        None => None,
    };
    Ok((fields, rows))
}

/// What the stored blob will be: an upload or a freshly generated file.
struct Blob {
    filename: String,
    mime_type: String,
    content: Vec<u8>,
    generated: bool,
}

impl From<GeneratedDocument> for Blob {
    fn from(document: GeneratedDocument) -> Self {
        Self {
            filename: document.filename,
            mime_type: document.mime_type,
            content: document.content,
            generated: true,
        }
    }
}

impl Blob {
    /// `filename` is already sanitized by the multipart parser.
    fn uploaded(data: Vec<u8>, filename: String) -> Self {
        Self {
            mime_type: mime_type_for(&filename),
            filename,
            content: data,
            generated: false,
        }
    }
}

/// Render `record`'s template from its stored form data.
async fn generate_blob(state: &AppState, record: &DocumentRecord) -> Result<Blob, HttpResponse> {
    let job = RenderJob {
        template_id: record.template_id.clone(),
        data: record.form_data(),
        options: state.config.assembly_options(),
        format: state.preferred_format(),
        output_name: Some(record.title.clone()),
        validate: true,
    };
    state
        .generate(job)
        .await
        .map(Blob::from)
        .map_err(HttpResponse::from)
}

/// Point `record` at a freshly stored blob.
fn attach_blob(record: &mut DocumentRecord, blob: Blob, stored_name: String) {
    record.stored_name = stored_name;
    record.filename = blob.filename;
    record.mime_type = blob.mime_type;
    record.size_bytes = blob.content.len();
    record.generated = blob.generated;
}

#[utoipa::path(
    context_path = "/api",
    tag = "Document Service",
    get,
    path = "/documents",
    responses(
        (status = 200, description = "All documents, newest first", body = [DocumentRecord])
    )
)]
pub async fn list_documents(state: web::Data<AppState>) -> impl Responder {
    let mut documents: Vec<DocumentRecord> = state.documents.read().values().cloned().collect();
    documents.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    HttpResponse::Ok().json(documents)
}

#[utoipa::path(
    context_path = "/api",
    tag = "Document Service",
    get,
    path = "/documents/{id}",
    params(
        ("id" = Uuid, Path, description = "Document id")
    ),
    responses(
        (status = 200, description = "Document found", body = DocumentRecord),
        (status = 404, description = "Document not found", body = ErrorResponse)
    )
)]
pub async fn get_document(state: web::Data<AppState>, path: web::Path<Uuid>) -> impl Responder {
    let id = path.into_inner();
    let documents = state.documents.read();
    match documents.get(&id) {
        Some(record) => HttpResponse::Ok().json(record),
        None => document_not_found(id),
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Document Service",
    get,
    path = "/documents/{id}/file",
    params(
        ("id" = Uuid, Path, description = "Document id")
    ),
    responses(
        (status = 200, description = "Stored file bytes with its MIME type"),
        (status = 404, description = "Document not found", body = ErrorResponse)
    )
)]
pub async fn download_document(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> impl Responder {
    let id = path.into_inner();
    let record = match state.documents.read().get(&id).cloned() {
        Some(record) => record,
        None => return document_not_found(id),
    };

    match state.storage.read_file(&record.stored_name).await {
        Ok(bytes) => HttpResponse::Ok()
            .content_type(record.mime_type.as_str())
            .insert_header((
                "Content-Disposition",
                format!("attachment; filename=\"{}\"", record.filename),
            ))
            .body(bytes),
        Err(StorageError::NotFound(name)) => {
            log::warn!("Blob {} for document {} is missing", name, id);
            document_not_found(id)
        }
        Err(e) => storage_failure(e),
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Document Service",
    post,
    path = "/documents",
    request_body(content = DocumentUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Document stored", body = DocumentRecord),
        (status = 400, description = "Invalid form data", body = ErrorResponse),
        (status = 404, description = "Template not found", body = ErrorResponse)
    )
)]
pub async fn create_document(state: web::Data<AppState>, payload: Multipart) -> impl Responder {
    let ParsedDocumentUpload {
        file,
        template_id,
        title,
        fields,
    } = match MultipartParser::parse_document_multipart(payload).await {
        Ok(parsed) => parsed,
        Err(e) => return HttpResponse::from(e),
    };

    let template_id = match template_id.filter(|id| !id.is_empty()) {
        Some(id) => id,
        None => {
            return HttpResponse::BadRequest()
                .json(ErrorResponse::bad_request("template_id is required"))
        }
    };
    let (template_name, list_key) = match state.templates.get(&template_id) {
        Some(template) => (
            template.doc_type.name.clone(),
            template.doc_type.list_key().map(str::to_string),
        ),
        None => {
            return HttpResponse::NotFound().json(ErrorResponse::not_found(&format!(
                "Template '{}' not found",
                template_id
            )))
        }
    };
    let title = title.filter(|t| !t.is_empty()).unwrap_or(template_name);

    let (fields, rows) = match split_form_fields(fields, list_key.as_deref()) {
        Ok(parts) => parts,
        Err(message) => return HttpResponse::BadRequest().json(ErrorResponse::bad_request(&message)),
    };

    let now = Utc::now();
    let mut record = DocumentRecord {
        id: Uuid::new_v4(),
        template_id,
        title,
        filename: String::new(),
        stored_name: String::new(),
        mime_type: String::new(),
        size_bytes: 0,
        generated: false,
        fields,
        list_field: list_key,
        rows: rows.unwrap_or_default(),
        created_at: now,
        updated_at: now,
    };

    let blob = match file {
        Some((data, filename)) => Blob::uploaded(data, filename),
        None => match generate_blob(&state, &record).await {
            Ok(blob) => blob,
            Err(response) => return response,
        },
    };

    let id = record.id;
    let stored_name = stored_name_for(id, &blob.filename);
    if let Err(e) = state.storage.upload_file(&stored_name, &blob.content).await {
        return storage_failure(e);
    }
    attach_blob(&mut record, blob, stored_name);

    state.documents.write().insert(id, record.clone());
    state.persist_documents();
    log::info!("Created document {} ({})", id, record.filename);

    HttpResponse::Created().json(record)
}

#[utoipa::path(
    context_path = "/api",
    tag = "Document Service",
    put,
    path = "/documents/{id}",
    params(
        ("id" = Uuid, Path, description = "Document id")
    ),
    request_body(content = DocumentUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Document updated", body = DocumentRecord),
        (status = 400, description = "Invalid form data", body = ErrorResponse),
        (status = 404, description = "Document or template not found", body = ErrorResponse)
    )
)]
pub async fn update_document(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    payload: Multipart,
) -> impl Responder {
    let id = path.into_inner();
    let parsed = match MultipartParser::parse_document_multipart(payload).await {
        Ok(parsed) => parsed,
        Err(e) => return HttpResponse::from(e),
    };

    let guard = state.lock_document(id).await;
    let mut record = match state.documents.read().get(&id).cloned() {
        Some(record) => record,
        None => {
            drop(guard);
            state.forget_document_lock(id);
            return document_not_found(id);
        }
    };

    let template_changed = match parsed.template_id.filter(|t| !t.is_empty()) {
        Some(template_id) if template_id != record.template_id => {
            match state.templates.get(&template_id) {
                Some(template) => {
                    let list_field = template.doc_type.list_key().map(str::to_string);
                    if list_field != record.list_field {
                        record.rows.clear();
                    }
                    record.list_field = list_field;
                    record.template_id = template_id;
                    true
                }
                None => {
                    return HttpResponse::NotFound().json(ErrorResponse::not_found(&format!(
                        "Template '{}' not found",
                        template_id
                    )))
                }
            }
        }
        _ => false,
    };
    if let Some(title) = parsed.title.filter(|t| !t.is_empty()) {
        record.title = title;
    }

    let (fields, rows) = match split_form_fields(parsed.fields, record.list_field.as_deref()) {
        Ok(parts) => parts,
        Err(message) => return HttpResponse::BadRequest().json(ErrorResponse::bad_request(&message)),
    };
    let data_changed = !fields.is_empty() || rows.is_some();
    record.fields.extend(fields);
    if let Some(rows) = rows {
        record.rows = rows;
    }

    let blob = match parsed.file {
        Some((data, filename)) => Some(Blob::uploaded(data, filename)),
        None if record.generated && (data_changed || template_changed) => {
            match generate_blob(&state, &record).await {
                Ok(blob) => Some(blob),
                Err(response) => return response,
            }
        }
        None => None,
    };

    let previous_blob = record.stored_name.clone();
    let mut uploaded = None;
    if let Some(blob) = blob {
        let stored_name = stored_name_for(id, &blob.filename);
        if let Err(e) = state.storage.upload_file(&stored_name, &blob.content).await {
            return storage_failure(e);
        }
        uploaded = Some(stored_name.clone());
        attach_blob(&mut record, blob, stored_name);
    }
    record.updated_at = Utc::now();

    let committed = match state.documents.write().get_mut(&id) {
        Some(slot) => {
            *slot = record.clone();
            true
        }
        None => false,
    };
    if !committed {
        if let Some(stored_name) = uploaded {
            remove_blob(&state, &stored_name).await;
        }
        return document_not_found(id);
    }

    if uploaded.is_some() && record.stored_name != previous_blob {
        remove_blob(&state, &previous_blob).await;
    }
    state.persist_documents();
    log::info!("Updated document {}", id);

    HttpResponse::Ok().json(record)
}

#[utoipa::path(
    context_path = "/api",
    tag = "Document Service",
    delete,
    path = "/documents/{id}",
    params(
        ("id" = Uuid, Path, description = "Document id")
    ),
    responses(
        (status = 204, description = "Document deleted"),
        (status = 404, description = "Document not found", body = ErrorResponse)
    )
)]
pub async fn delete_document(state: web::Data<AppState>, path: web::Path<Uuid>) -> impl Responder {
    let id = path.into_inner();
    let guard = state.lock_document(id).await;
    let removed = state.documents.write().remove(&id);
    let record = match removed {
        Some(record) => record,
        None => {
            drop(guard);
            state.forget_document_lock(id);
            return document_not_found(id);
        }
    };

    remove_blob(&state, &record.stored_name).await;
    state.persist_documents();
    drop(guard);
    state.forget_document_lock(id);
    log::info!("Deleted document {}", id);

    HttpResponse::NoContent().finish()
}

async fn remove_blob(state: &AppState, stored_name: &str) {
    match state.storage.delete_file(stored_name).await {
        Ok(()) | Err(StorageError::NotFound(_)) => {}
        Err(e) => log::warn!("Failed to remove blob {}: {}", stored_name, e),
    }
}
