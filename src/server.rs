//! HTTP server setup and configuration.
//!
//! This module provides the router and application state used by both
//! the production server and integration tests.

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::error::ApiError;
use crate::models::AppConfig;
use crate::services::{
    DestinationResolver, Dispatcher, ImageConverter, LabelPipeline, SystemDispatcher,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub converter: Arc<ImageConverter>,
    pub pipeline: Arc<LabelPipeline>,
    pub resolver: Arc<DestinationResolver>,
    pub dispatcher: Arc<dyn Dispatcher>,
}

/// Create application state that prints through the system devices.
pub fn create_app_state(config: AppConfig) -> AppState {
    let dispatcher = Arc::new(SystemDispatcher::new(config.dispatch.timeout()));
    create_app_state_with(config, dispatcher)
}

/// Create application state with a custom dispatcher.
pub fn create_app_state_with(config: AppConfig, dispatcher: Arc<dyn Dispatcher>) -> AppState {
    let profile = config.printer.profile();
    let converter = Arc::new(ImageConverter::new(
        &config.converter,
        profile.max_width_dots,
    ));
    let pipeline = Arc::new(LabelPipeline::new(profile));
    let resolver = Arc::new(DestinationResolver::new(config.destination.clone()));

    AppState {
        config: Arc::new(config),
        converter,
        pipeline,
        resolver,
        dispatcher,
    }
}

/// Build the API router with all endpoints and middleware.
///
/// This is the core router used by both production and tests.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        // Upload page
        .route("/", get(api::handle_index))
        // Label endpoints
        .route("/api/print", post(handle_print))
        .route("/api/render", post(handle_render))
        .route("/api/printer", get(handle_printer))
        // Health check
        .route("/health", get(|| async { "OK" }))
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
}

// Wrapper handlers to extract state components for the underlying API handlers

async fn handle_print(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    api::handle_print(
        State(state.converter),
        State(state.pipeline),
        State(state.resolver),
        State(state.dispatcher),
        headers,
        body,
    )
    .await
}

async fn handle_render(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    api::handle_render(State(state.converter), State(state.pipeline), headers, body).await
}

async fn handle_printer(State(state): State<AppState>) -> Json<api::PrinterResponse> {
    api::handle_printer(State(state.resolver), State(state.pipeline)).await
}
