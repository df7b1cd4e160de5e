use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::assets::AssetLoader;

/// Serve the embedded upload page
pub async fn handle_index() -> Response {
    match AssetLoader::index_html() {
        Some(page) => Html(page).into_response(),
        None => (StatusCode::NOT_FOUND, "Upload page not embedded").into_response(),
    }
}
