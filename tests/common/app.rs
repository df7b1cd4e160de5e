//! Test application factory for integration tests.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use labelpress::models::{AppConfig, Destination};
use labelpress::server::{build_router, create_app_state_with, AppState};
use labelpress::services::{DispatchError, Dispatcher};
use tspl_raster::PrintPayload;

use super::fixtures;

/// Device path the default test config prints to
pub const TEST_DEVICE: &str = "/dev/labelpress-test-lp0";

/// Dispatcher that records jobs instead of touching a device
#[derive(Default)]
pub struct RecordingDispatcher {
    jobs: Mutex<Vec<(Destination, Vec<u8>)>>,
    time_out: bool,
}

impl RecordingDispatcher {
    /// A dispatcher whose printer never accepts a job
    pub fn timing_out() -> Self {
        Self {
            time_out: true,
            ..Default::default()
        }
    }

    pub fn jobs(&self) -> Vec<(Destination, Vec<u8>)> {
        self.jobs.lock().unwrap().clone()
    }
}

#[async_trait]
impl Dispatcher for RecordingDispatcher {
    async fn dispatch(
        &self,
        destination: &Destination,
        payload: &PrintPayload,
    ) -> Result<(), DispatchError> {
        if self.time_out {
            return Err(DispatchError::Timeout {
                target: destination.to_string(),
                secs: 10,
            });
        }
        self.jobs
            .lock()
            .unwrap()
            .push((destination.clone(), payload.as_bytes().to_vec()));
        Ok(())
    }
}

/// Config with an explicit serial destination and no usable converter
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.destination.serial = Some(PathBuf::from(TEST_DEVICE));
    config.destination.serial_candidates = Vec::new();
    config.destination.detect_queue = false;
    config.converter.programs = vec!["labelpress-test-missing-converter".to_string()];
    config
}

/// Test application with router and direct access to the dispatcher
pub struct TestApp {
    router: axum::Router,
    pub dispatcher: Arc<RecordingDispatcher>,
}

impl TestApp {
    /// Create a new test application printing to [`TEST_DEVICE`]
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: AppConfig) -> Self {
        Self::with_dispatcher(config, RecordingDispatcher::default())
    }

    pub fn with_dispatcher(config: AppConfig, dispatcher: RecordingDispatcher) -> Self {
        let dispatcher = Arc::new(dispatcher);
        let state = create_app_state_with(config, dispatcher.clone());

        // Build router using shared server module (same as production)
        let router = build_router(state);

        Self { router, dispatcher }
    }

    /// Create state for custom router configuration
    pub fn create_state() -> AppState {
        create_app_state_with(test_config(), Arc::new(RecordingDispatcher::default()))
    }

    /// Make a GET request to the given path
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request(Request::get(path).body(Body::empty()).unwrap())
            .await
    }

    /// POST a single-part multipart upload
    pub async fn upload(&self, path: &str, filename: &str, data: &[u8]) -> TestResponse {
        let body = fixtures::multipart(fixtures::BOUNDARY, filename, "image/bmp", data);
        self.post(path, Some(fixtures::multipart_content_type().as_str()), body)
            .await
    }

    /// POST a raw body with an optional Content-Type
    pub async fn post(
        &self,
        path: &str,
        content_type: Option<&str>,
        body: Vec<u8>,
    ) -> TestResponse {
        let mut builder = Request::post(path);
        if let Some(content_type) = content_type {
            builder = builder.header("Content-Type", content_type);
        }
        self.request(builder.body(Body::from(body)).unwrap()).await
    }

    /// Send a request to the router
    async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Request failed");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes()
            .to_vec();

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Test response with convenience methods
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    /// Parse body as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).expect("Failed to parse JSON response")
    }

    /// Get body as string
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Get raw body bytes
    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    /// Get a header as a string
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}
