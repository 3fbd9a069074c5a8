use actix_web::{web, HttpResponse, Responder};

use crate::assembly::{AssemblyOptions, OutputFormat};
use crate::content::FileContent;
use crate::state::RenderJob;
use crate::templates::models::{RenderRequest, RenderResponse, TemplateDetail, TemplateSummary};
use crate::{AppState, ErrorResponse};

fn template_not_found(id: &str) -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse::not_found(&format!(
        "Template '{}' not found",
        id
    )))
}

#[utoipa::path(
    context_path = "/api",
    tag = "Template Service",
    get,
    path = "/templates",
    responses(
        (status = 200, description = "List of available templates", body = [TemplateSummary])
    )
)]
pub async fn list_templates(state: web::Data<AppState>) -> impl Responder {
    let summaries: Vec<TemplateSummary> = state.templates.list().map(TemplateSummary::from).collect();
    HttpResponse::Ok().json(summaries)
}

#[utoipa::path(
    context_path = "/api",
    tag = "Template Service",
    get,
    path = "/templates/{id}",
    params(
        ("id" = String, Path, description = "Template id, e.g. invoice")
    ),
    responses(
        (status = 200, description = "Template found", body = TemplateDetail),
        (status = 404, description = "Template not found", body = ErrorResponse)
    )
)]
pub async fn get_template(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let id = path.into_inner();
    match state.templates.get(&id) {
        Some(template) => HttpResponse::Ok().json(TemplateDetail::from(template)),
        None => template_not_found(&id),
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Template Service",
    get,
    path = "/templates/{id}/content",
    params(
        ("id" = String, Path, description = "Template id")
    ),
    responses(
        (status = 200, description = "Raw template HTML", content_type = "text/html", body = String),
        (status = 404, description = "Template not found", body = ErrorResponse)
    )
)]
pub async fn get_template_content(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    let id = path.into_inner();
    match state.templates.get(&id) {
        Some(template) => HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(template.content.clone()),
        None => template_not_found(&id),
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Template Service",
    post,
    path = "/templates/{id}/render",
    params(
        ("id" = String, Path, description = "Template id")
    ),
    request_body = RenderRequest,
    responses(
        (status = 200, description = "Filled document", body = RenderResponse),
        (status = 404, description = "Template not found", body = ErrorResponse),
        (status = 503, description = "PDF requested but no renderer is configured", body = ErrorResponse)
    )
)]
pub async fn render_template(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<RenderRequest>,
) -> impl Responder {
    let template_id = path.into_inner();
    let request = body.into_inner();

    let defaults = state.config.assembly_options();
    let options = AssemblyOptions::new(request.missing_value.unwrap_or(defaults.missing_value))
        .with_cleanup(request.cleanup.unwrap_or(defaults.cleanup));

    let job = RenderJob {
        template_id: template_id.clone(),
        data: request.data,
        options,
        format: request.format,
        output_name: request.output_name,
        validate: false,
    };

    let document = match state.generate(job).await {
        Ok(document) => document,
        Err(e) => return HttpResponse::from(e),
    };

    let (html, file) = match request.format {
        OutputFormat::Html => (Some(document.html), None),
        OutputFormat::Pdf => (
            None,
            Some(FileContent::new(
                document.filename.clone(),
                document.mime_type.clone(),
                &document.content,
            )),
        ),
    };

    HttpResponse::Ok().json(RenderResponse {
        template_id,
        filename: document.filename,
        generated_on: document.generated_on,
        html,
        file,
        totals: document.totals,
    })
}
