use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderMap, HeaderValue, Method, Request, Response, StatusCode, header};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::sync::Arc;

use super::models::{
    DownloadRequest, ErrorResponse, ExtractRequest, ExtractResponse, LanguageItem,
};
use super::state::ServerState;
use crate::data;
use crate::export;
use crate::languages::LanguageRegistry;
use crate::ocr::{OcrOptions, TesseractEngine};
use crate::session::{self, OCR_FAILURE_MESSAGE, SessionError, SessionState};
use crate::settings;

const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

type ApiError = (StatusCode, Json<ErrorResponse>);

pub async fn run_server(settings: settings::Settings, addr: Option<String>) -> Result<()> {
    let addr = addr.unwrap_or_else(|| settings.server_addr.clone());
    let engine = Arc::new(TesseractEngine::new(OcrOptions::from_settings(&settings)));
    let state = Arc::new(ServerState::new(
        settings,
        LanguageRegistry::load()?,
        engine,
    ));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind server address {}", addr))?;
    tracing::info!(addr = %addr, "server listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/languages", get(languages))
        .route("/extract", post(extract))
        .route("/download", post(download))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(axum::middleware::from_fn(cors_middleware))
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

async fn cors_middleware(req: Request<Body>, next: Next) -> Result<Response<Body>, StatusCode> {
    if req.method() == Method::OPTIONS {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        apply_cors_headers(response.headers_mut());
        return Ok(response);
    }
    let mut response = next.run(req).await;
    apply_cors_headers(response.headers_mut());
    Ok(response)
}

fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert("access-control-allow-origin", HeaderValue::from_static("*"));
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static("GET,POST,OPTIONS"),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("content-type"),
    );
    headers.insert(
        "access-control-expose-headers",
        HeaderValue::from_static("content-disposition"),
    );
}

async fn languages(State(state): State<Arc<ServerState>>) -> Json<Vec<LanguageItem>> {
    let items = state
        .registry
        .all()
        .iter()
        .map(|lang| LanguageItem {
            code: lang.code.clone(),
            name: lang.name.clone(),
        })
        .collect();
    Json(items)
}

async fn extract(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<ExtractRequest>,
) -> Result<Json<ExtractResponse>, ApiError> {
    let raw = payload
        .data_base64
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "data_base64 is required"))?;
    let bytes = BASE64.decode(strip_data_url(raw)).map_err(|err| {
        api_error(
            StatusCode::BAD_REQUEST,
            format!("invalid base64 image data: {}", err),
        )
    })?;
    let image = data::load_image_from_bytes(bytes, None).map_err(|err| map_session_error(&err))?;
    let language = resolve_language(&state, payload.lang.as_deref())?;
    let strip_symbols = payload
        .strip_symbols
        .unwrap_or(state.settings.strip_symbols);

    let current = SessionState::new(language);
    let next = session::process_image(
        &current,
        &state.gate,
        state.engine.clone(),
        &state.registry,
        image,
        strip_symbols,
    )
    .await
    .map_err(|err| map_session_error(&err))?;

    Ok(Json(ExtractResponse {
        language_name: state.registry.display_name(&next.language),
        json: next.preview_json(),
        filename: next.export_filename(),
        language: next.language,
        entries: next.entries,
    }))
}

async fn download(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<DownloadRequest>,
) -> Result<Response<Body>, ApiError> {
    let language = resolve_language(&state, payload.lang.as_deref())?;
    let current = SessionState {
        language,
        entries: payload.entries,
    };
    let artifact = current.artifact();
    tracing::info!(
        filename = %artifact.filename,
        bytes = artifact.bytes.len(),
        "serving translations download"
    );
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, artifact.media_type)
        .header(
            header::CONTENT_DISPOSITION,
            export::content_disposition(&artifact),
        )
        .body(Body::from(artifact.bytes))
        .map_err(|err| {
            tracing::error!(error = %err, "failed to build download response");
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("failed to build download response: {}", err),
            )
        })
}

fn resolve_language(state: &ServerState, requested: Option<&str>) -> Result<String, ApiError> {
    let code = requested.unwrap_or(&state.settings.language);
    state
        .registry
        .validate(code)
        .map_err(|err| api_error(StatusCode::BAD_REQUEST, err.to_string()))
}

fn map_session_error(err: &anyhow::Error) -> ApiError {
    match err.downcast_ref::<SessionError>() {
        Some(SessionError::Busy) => api_error(StatusCode::CONFLICT, SessionError::Busy.to_string()),
        Some(SessionError::UnsupportedInput) => api_error(
            StatusCode::BAD_REQUEST,
            SessionError::UnsupportedInput.to_string(),
        ),
        Some(SessionError::NoText) => {
            tracing::error!(error = %err, "ocr produced no usable text");
            api_error(StatusCode::UNPROCESSABLE_ENTITY, OCR_FAILURE_MESSAGE)
        }
        None => {
            tracing::error!(error = ?err, "error processing image");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, OCR_FAILURE_MESSAGE)
        }
    }
}

// Browsers hand over `data:image/png;base64,...` from FileReader.
fn strip_data_url(raw: &str) -> &str {
    if raw.starts_with("data:") {
        if let Some((_, payload)) = raw.split_once(',') {
            return payload;
        }
    }
    raw
}

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}
