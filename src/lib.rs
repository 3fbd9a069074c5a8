use actix_cors::Cors;
use actix_web::middleware::Compress;
use actix_web::{http::header, web, App, HttpServer};
use actix_web_prometheus::PrometheusMetricsBuilder;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

pub mod assembly;
pub mod config;
pub mod content;
pub mod documents;
pub mod state;
pub mod storage;
pub mod templates;

pub use crate::state::AppState;

use crate::config::AppConfig;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_type: &str, message: &str) -> Self {
        Self {
            error: error_type.to_string(),
            message: message.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn not_found(message: &str) -> Self {
        Self::new("NotFound", message)
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new("BadRequest", message)
    }

    pub fn internal_error(message: &str) -> Self {
        Self::new("InternalServerError", message)
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::templates::handlers::list_templates,
        crate::templates::handlers::get_template,
        crate::templates::handlers::get_template_content,
        crate::templates::handlers::render_template,
        crate::documents::handlers::list_documents,
        crate::documents::handlers::get_document,
        crate::documents::handlers::download_document,
        crate::documents::handlers::create_document,
        crate::documents::handlers::update_document,
        crate::documents::handlers::delete_document
    ),
    components(
        schemas(
            templates::models::TemplateField,
            templates::models::TemplateSummary,
            templates::models::TemplateDetail,
            templates::models::RenderRequest,
            templates::models::RenderResponse,
            documents::models::DocumentRecord,
            documents::handlers::DocumentUploadForm,
            assembly::Category,
            assembly::OutputFormat,
            assembly::Totals,
            assembly::totals::LineTotals,
            content::FileContent,
            content::FileMetadata,
            ErrorResponse,
        )
    ),
    tags(
        (name = "Template Service", description = "Template listing and rendering."),
        (name = "Document Service", description = "Stored and generated documents.")
    )
)]
pub struct ApiDoc;

/// Register the `/api` routes.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(
                web::resource("/templates")
                    .route(web::get().to(templates::handlers::list_templates)),
            )
            .service(
                web::resource("/templates/{id}")
                    .route(web::get().to(templates::handlers::get_template)),
            )
            .service(
                web::resource("/templates/{id}/content")
                    .route(web::get().to(templates::handlers::get_template_content)),
            )
            .service(
                web::resource("/templates/{id}/render")
                    .route(web::post().to(templates::handlers::render_template)),
            )
            .service(
                web::resource("/documents")
                    .route(web::get().to(documents::handlers::list_documents))
                    .route(web::post().to(documents::handlers::create_document)),
            )
            .service(
                web::resource("/documents/{id}")
                    .route(web::get().to(documents::handlers::get_document))
                    .route(web::put().to(documents::handlers::update_document))
                    .route(web::delete().to(documents::handlers::delete_document)),
            )
            .service(
                web::resource("/documents/{id}/file")
                    .route(web::get().to(documents::handlers::download_document)),
            ),
    );
}

pub async fn run() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env()?;
    let bind_address = (config.host.clone(), config.port);
    let allowed_origins = config.allowed_origins.clone();

    let app_state = match AppState::new(config).await {
        Ok(state) => web::Data::new(state),
        Err(e) => {
            log::error!("Failed to initialise application state: {:#}", e);
            return Err(e);
        }
    };
    log::info!(
        "Serving {} templates, {} stored documents",
        app_state.templates.len(),
        app_state.documents.read().len()
    );

    let prometheus = PrometheusMetricsBuilder::new("docfill_server")
        .endpoint("/metrics")
        .build()
        .map_err(|e| anyhow::anyhow!("failed to create Prometheus metrics middleware: {}", e))?;

    log::info!("Starting server at http://{}:{}", bind_address.0, bind_address.1);

    HttpServer::new(move || {
        let app_state = app_state.clone();
        let prometheus = prometheus.clone();
        let cors = allowed_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
            .max_age(3600);

        App::new()
            .wrap(Compress::default())
            .wrap(prometheus)
            .wrap(cors)
            .app_data(app_state)
            .configure(configure_api)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
    })
    .keep_alive(actix_web::http::KeepAlive::Os)
    .bind(bind_address)?
    .run()
    .await?;

    Ok(())
}
