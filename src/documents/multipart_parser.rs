use actix_multipart::{Field, Multipart};
use actix_web::HttpResponse;
use futures::StreamExt;
use sanitize_filename::sanitize;
use std::collections::BTreeMap;

use crate::ErrorResponse;

/// Text parts that describe the document itself rather than template fields.
const TEMPLATE_ID_PART: &str = "template_id";
const TITLE_PART: &str = "title";
const FILE_PART: &str = "file";

#[derive(Debug, Default)]
pub struct ParsedDocumentUpload {
    /// File bytes and the sanitized original filename
    pub file: Option<(Vec<u8>, String)>,
    pub template_id: Option<String>,
    pub title: Option<String>,
    /// Every other text part, keyed by part name
    pub fields: BTreeMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum MultipartParseError {
    #[error("Multipart field error: {0}")]
    FieldError(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Invalid UTF-8 data: {0}")]
    Utf8Error(String),
}

impl From<MultipartParseError> for HttpResponse {
    fn from(error: MultipartParseError) -> Self {
        match error {
            MultipartParseError::IoError(_) => HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error(&error.to_string())),
            _ => HttpResponse::BadRequest().json(ErrorResponse::bad_request(&error.to_string())),
        }
    }
}

pub struct MultipartParser;

impl MultipartParser {
    pub async fn parse_document_multipart(
        mut multipart: Multipart,
    ) -> Result<ParsedDocumentUpload, MultipartParseError> {
        let mut parsed = ParsedDocumentUpload::default();

        while let Some(item) = multipart.next().await {
            let mut field = item.map_err(|e| MultipartParseError::FieldError(e.to_string()))?;
            let content_disposition = field.content_disposition().ok_or_else(|| {
                MultipartParseError::FieldError("Content disposition not found".to_string())
            })?;
            let name = content_disposition
                .get_name()
                .ok_or_else(|| MultipartParseError::FieldError("Field name not found".to_string()))?
                .to_string();
            let filename = content_disposition.get_filename().map(sanitize);

            if name == FILE_PART {
                let data = read_bytes(&mut field).await?;
                if data.is_empty() {
                    log::debug!("Ignoring empty file part");
                    continue;
                }
                let filename = filename
                    .filter(|f| !f.is_empty())
                    .unwrap_or_else(|| "upload.dat".to_string());
                parsed.file = Some((data, filename));
                continue;
            }

            let value = String::from_utf8(read_bytes(&mut field).await?)
                .map_err(|e| MultipartParseError::Utf8Error(e.to_string()))?;

            match name.as_str() {
                TEMPLATE_ID_PART => parsed.template_id = Some(value.trim().to_string()),
                TITLE_PART => parsed.title = Some(value.trim().to_string()),
                _ => {
                    parsed.fields.insert(name, value);
                }
            }
        }

        Ok(parsed)
    }
}

async fn read_bytes(field: &mut Field) -> Result<Vec<u8>, MultipartParseError> {
    let mut buffer = Vec::new();
    while let Some(chunk) = field.next().await {
        let data = chunk.map_err(|e| MultipartParseError::IoError(e.to_string()))?;
        buffer.extend_from_slice(&data);
    }
    Ok(buffer)
}
