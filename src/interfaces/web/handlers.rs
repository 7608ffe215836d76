use super::error_response::ErrorResponse;
use super::models::HealthResponse;
use crate::application::use_cases::GenerateMeshUseCase;
use crate::domain::generation::{ForegroundRatio, GenerationRequest, ModelGateway};
use crate::infrastructure::staging::GlbStaging;
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

pub const MESH_FILENAME: &str = "model.glb";

/// Shared state for the HTTP handlers. The gateway is the process-wide model handle.
#[derive(Clone)]
pub struct GenerationState {
    pub gateway: Arc<dyn ModelGateway>,
    pub generator: Arc<GenerateMeshUseCase>,
    pub staging: GlbStaging,
}

impl GenerationState {
    pub fn new(
        gateway: Arc<dyn ModelGateway>,
        foreground_ratio: ForegroundRatio,
        staging: GlbStaging,
    ) -> Self {
        Self {
            generator: Arc::new(GenerateMeshUseCase::new(gateway.clone(), foreground_ratio)),
            gateway,
            staging,
        }
    }
}

/// Health check
pub async fn health(State(state): State<Arc<GenerationState>>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(
        state.gateway.device(),
        state.gateway.model_name(),
    ))
}

/// Generate a GLB mesh from a base64 encoded image
pub async fn generate(
    State(state): State<Arc<GenerationState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ErrorResponse> {
    let Json(body) = match payload {
        Ok(json) => json,
        Err(e) => {
            warn!("JSON parsing error: {:?}", e);
            return Err(ErrorResponse::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                e.body_text(),
            ));
        }
    };

    let request = GenerationRequest::from_json(&body)?;
    info!(
        resolution = request.resolution.value(),
        image_len = request.image.len(),
        "Generation requested"
    );

    let mesh = state.generator.execute(request).await?;
    let bytes = state.staging.transmit(mesh).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={MESH_FILENAME}"),
            ),
        ],
        bytes,
    )
        .into_response())
}
