use crate::domain::generation::Device;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub device: Device,
    pub model: String,
}

impl HealthResponse {
    pub fn healthy(device: Device, model: impl Into<String>) -> Self {
        Self {
            status: "healthy".to_string(),
            device,
            model: model.into(),
        }
    }
}
