use axum::{extract::State, response::Json};
use serde::Serialize;
use std::sync::Arc;
use tspl_raster::px_to_mm;
use utoipa::ToSchema;

use crate::models::Destination;
use crate::services::{DestinationResolver, LabelPipeline};

/// Printer status as seen by the server
#[derive(Debug, Serialize, ToSchema)]
pub struct PrinterResponse {
    /// Where the next label would go, if anywhere
    pub destination: Option<DestinationInfo>,
    /// Why no destination could be resolved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub profile: ProfileInfo,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DestinationInfo {
    /// "serial" or "queue"
    pub kind: String,
    /// Device path or queue name
    pub target: String,
}

impl From<&Destination> for DestinationInfo {
    fn from(destination: &Destination) -> Self {
        Self {
            kind: destination.kind().to_string(),
            target: destination.target(),
        }
    }
}

/// Label stock and print-head characteristics
#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileInfo {
    pub dpi: u32,
    pub max_width_dots: u32,
    pub max_width_mm: u32,
    pub gap_mm: u32,
}

/// Show the printer a label would be sent to
#[utoipa::path(
    get,
    path = "/api/printer",
    responses(
        (status = 200, description = "Printer status", body = PrinterResponse),
    ),
    tag = "Printer"
)]
pub async fn handle_printer(
    State(resolver): State<Arc<DestinationResolver>>,
    State(pipeline): State<Arc<LabelPipeline>>,
) -> Json<PrinterResponse> {
    let profile = pipeline.profile();

    let (destination, error) = match resolver.resolve().await {
        Ok(destination) => (Some(DestinationInfo::from(&destination)), None),
        Err(e) => (None, Some(e.to_string())),
    };

    Json(PrinterResponse {
        destination,
        error,
        profile: ProfileInfo {
            dpi: profile.dpi,
            max_width_dots: profile.max_width_dots,
            max_width_mm: px_to_mm(profile.max_width_dots, profile.dpi),
            gap_mm: profile.gap_mm,
        },
    })
}
