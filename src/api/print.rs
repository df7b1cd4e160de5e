use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tspl_raster::{boundary_from_content_type, extract_first_part, UploadPart};

use super::headers::HeaderMapExt;
use crate::error::ApiError;
use crate::services::{
    DestinationResolver, Dispatcher, ImageConverter, LabelPipeline, RenderedLabel,
};

pub const LABEL_WIDTH_PX: &str = "x-label-width-px";
pub const LABEL_HEIGHT_PX: &str = "x-label-height-px";
pub const LABEL_WIDTH_MM: &str = "x-label-width-mm";
pub const LABEL_HEIGHT_MM: &str = "x-label-height-mm";

/// Print an uploaded image
///
/// Takes the first part of a multipart upload, converts it to a
/// monochrome label and sends it to the resolved printer.
#[utoipa::path(
    post,
    path = "/api/print",
    request_body(content = Vec<u8>, content_type = "multipart/form-data", description = "Image upload; only the first part is used"),
    responses(
        (status = 200, description = "Label printed", body = String, content_type = "text/plain"),
        (status = 400, description = "Malformed upload or unsupported bitmap"),
        (status = 413, description = "Upload too large"),
        (status = 415, description = "No image converter available for this format"),
        (status = 422, description = "Image wider than the print head or not convertible"),
        (status = 502, description = "Printer rejected the job"),
        (status = 503, description = "No printer available"),
        (status = 504, description = "Printer did not accept the job in time"),
    ),
    tag = "Labels"
)]
pub async fn handle_print(
    State(converter): State<Arc<ImageConverter>>,
    State(pipeline): State<Arc<LabelPipeline>>,
    State(resolver): State<Arc<DestinationResolver>>,
    State(dispatcher): State<Arc<dyn Dispatcher>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let (filename, label) = prepare_label(&converter, &pipeline, &headers, body).await?;

    let destination = resolver.resolve().await?;
    dispatcher.dispatch(&destination, &label.payload).await?;

    tracing::info!(
        filename = %filename,
        destination = %destination,
        width = label.width_px,
        height = label.height_px,
        "Label printed"
    );

    Ok(format!(
        "Printed {filename} ({}x{} px, {}x{} mm) on {destination}",
        label.width_px, label.height_px, label.width_mm, label.height_mm
    ))
}

/// Render an uploaded image without printing
///
/// Returns the raw printer payload, with the label dimensions in
/// `X-Label-*` response headers.
#[utoipa::path(
    post,
    path = "/api/render",
    request_body(content = Vec<u8>, content_type = "multipart/form-data", description = "Image upload; only the first part is used"),
    responses(
        (status = 200, description = "Printer payload", body = Vec<u8>, content_type = "application/octet-stream"),
        (status = 400, description = "Malformed upload or unsupported bitmap"),
        (status = 413, description = "Upload too large"),
        (status = 415, description = "No image converter available for this format"),
        (status = 422, description = "Image wider than the print head or not convertible"),
    ),
    tag = "Labels"
)]
pub async fn handle_render(
    State(converter): State<Arc<ImageConverter>>,
    State(pipeline): State<Arc<LabelPipeline>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let (_, label) = prepare_label(&converter, &pipeline, &headers, body).await?;

    let dimensions = [
        (LABEL_WIDTH_PX, label.width_px),
        (LABEL_HEIGHT_PX, label.height_px),
        (LABEL_WIDTH_MM, label.width_mm),
        (LABEL_HEIGHT_MM, label.height_mm),
    ];

    let mut response = (
        [(header::CONTENT_TYPE, "application/octet-stream")],
        label.payload.into_bytes(),
    )
        .into_response();
    for (name, value) in dimensions {
        response
            .headers_mut()
            .insert(HeaderName::from_static(name), HeaderValue::from(value));
    }

    Ok(response)
}

/// Extract the upload, normalize it to a bitmap and encode it
async fn prepare_label(
    converter: &ImageConverter,
    pipeline: &Arc<LabelPipeline>,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<(String, RenderedLabel), ApiError> {
    let content_type = headers.require_str("Content-Type")?;
    let boundary = boundary_from_content_type(content_type)?;

    let UploadPart {
        filename,
        content_type: part_type,
        bytes,
    } = extract_first_part(&body, boundary)?;

    tracing::info!(
        filename = %filename,
        content_type = %part_type,
        bytes = bytes.len(),
        "Received upload"
    );

    let upload = body.slice_ref(bytes);
    let bitmap = converter.normalize(upload).await?;
    let label = pipeline.render_in_blocking_context(bitmap).await?;

    Ok((filename, label))
}
