use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tspl_raster::RasterError;

use crate::services::{ConvertError, DestinationError, DispatchError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing required header: {0}")]
    MissingHeader(&'static str),

    #[error("Upload error: {0}")]
    Upload(#[from] RasterError),

    #[error("Conversion error: {0}")]
    Convert(#[from] ConvertError),

    #[error("Label error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("No printer available: {0}")]
    Destination(#[from] DestinationError),

    #[error("Print failed: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failures between a decoded upload and a finished payload
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Raster(#[from] RasterError),

    #[error("image is {width} dots wide, print head holds {max}")]
    LabelTooWide { width: u32, max: u32 },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingHeader(_) => StatusCode::BAD_REQUEST,
            ApiError::Upload(_) => StatusCode::BAD_REQUEST,
            ApiError::Convert(e) => match e {
                ConvertError::Unavailable(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                ConvertError::Failed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                ConvertError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                ConvertError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Pipeline(PipelineError::Raster(_)) => StatusCode::BAD_REQUEST,
            ApiError::Pipeline(PipelineError::LabelTooWide { .. }) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::Destination(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Dispatch(DispatchError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Dispatch(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Clients (including the upload page) render the body as-is.
        (self.status(), self.to_string()).into_response()
    }
}
