use axum::http::{Method, header};
use tower_http::cors::{Any, CorsLayer};

/// Browsers may call the endpoint from any origin; only the upload
/// methods and the headers a form post needs are allowed.
pub fn build_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}
