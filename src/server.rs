use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartRejection},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::{Map, Value};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{
    config::AppConfig,
    cors::build_cors_layer,
    envelope::ApiResponse,
    error::ServiceError,
    prediction::{PredictionClient, PredictionStatus},
    storage::{ImageUpload, ObjectStore},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub storage: Arc<dyn ObjectStore>,
    pub predictions: Arc<dyn PredictionClient>,
}

#[derive(Debug, Serialize)]
pub struct ColorizeData {
    pub id: String,
    pub status: PredictionStatus,
    pub output_url: Option<String>,
    pub s3_url: String,
}

#[derive(Debug, Default)]
struct ColorizeForm {
    image: Option<ImageUpload>,
    format: Option<String>,
}

pub fn build_router(
    config: Arc<AppConfig>,
    storage: Arc<dyn ObjectStore>,
    predictions: Arc<dyn PredictionClient>,
) -> Router {
    let body_limit = config.max_upload_bytes;
    let state = AppState {
        config,
        storage,
        predictions,
    };

    Router::new()
        .route("/health", get(health))
        .route(
            "/ddcolor",
            post(colorize).options(preflight).fallback(invalid_method),
        )
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(build_cors_layer())
        .layer(TraceLayer::new_for_http())
}

async fn health() -> &'static str {
    "ok"
}

async fn preflight() {}

async fn invalid_method() -> ServiceError {
    ServiceError::InvalidMethod
}

/// Stores the uploaded image and submits it for colorization.
///
/// A body that is not a multipart form carries no image file and is
/// answered like a form without one. `format` is matched exactly as sent;
/// only an empty value counts as absent.
async fn colorize(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ApiResponse<ColorizeData>>, ServiceError> {
    let multipart = multipart.map_err(|e| {
        tracing::debug!(rejection = %e.body_text(), "body is not a multipart form");
        ServiceError::MissingImage
    })?;
    let form = read_form(multipart).await?;

    let image = form.image.ok_or(ServiceError::MissingImage)?;
    let model = state.config.model.name.as_str();

    if let Some(format) = form.format.as_deref() {
        let supported = state.predictions.supported_formats(model).await?;
        if !supported.iter().any(|f| f == format) {
            return Err(ServiceError::UnsupportedFormat { supported });
        }
    }

    info!(
        file_name = ?image.file_name,
        size = image.bytes.len(),
        format = ?form.format,
        "colorize request accepted"
    );

    let upload = state.storage.upload(image).await?;

    let mut input = Map::new();
    input.insert("image".into(), Value::String(upload.url.clone()));
    let prediction = state
        .predictions
        .create_prediction(model, input, form.format.as_deref())
        .await?;

    Ok(Json(ApiResponse::ok(ColorizeData {
        id: prediction.id,
        status: prediction.status,
        output_url: prediction.output,
        s3_url: upload.url,
    })))
}

async fn read_form(mut multipart: Multipart) -> Result<ColorizeForm, ServiceError> {
    let mut form = ColorizeForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServiceError::BadRequest(e.body_text()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("image") => {
                // A part without a filename is a plain form value, not a file.
                let Some(file_name) = field.file_name().map(str::to_string) else {
                    continue;
                };
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ServiceError::BadRequest(e.body_text()))?;
                // An empty file input still submits a part with no content.
                if !bytes.is_empty() {
                    form.image = Some(ImageUpload {
                        file_name: Some(file_name),
                        content_type,
                        bytes,
                    });
                }
            }
            Some("format") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ServiceError::BadRequest(e.body_text()))?;
                form.format = (!value.is_empty()).then_some(value);
            }
            _ => {}
        }
    }

    Ok(form)
}
