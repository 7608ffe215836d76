use super::glb;
use crate::domain::generation::{
    Device, GenerationError, McResolution, MeshArtifact, ModelGateway,
};
use async_trait::async_trait;
use image::{Rgba, RgbImage, RgbaImage};
use serde_json::json;
use tracing::{debug, info};

/// Channel level above which a pixel counts as studio-white background.
const WHITE_THRESHOLD: u8 = 240;

/// Stand-in gateway used for local development and tests.
///
/// Background removal is a plain white-key, and the mesh is a placeholder
/// tetrahedron tagged with the requested resolution.
pub struct MockModelGateway {
    device: Device,
}

impl Default for MockModelGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MockModelGateway {
    pub fn new() -> Self {
        Self::with_device(Device::Cpu)
    }

    pub fn with_device(device: Device) -> Self {
        info!("Initializing mock model gateway on {}", device);
        Self { device }
    }
}

#[async_trait]
impl ModelGateway for MockModelGateway {
    fn model_name(&self) -> &str {
        "mock"
    }

    fn device(&self) -> Device {
        self.device
    }

    async fn remove_background(&self, image: RgbImage) -> Result<RgbaImage, GenerationError> {
        let (width, height) = image.dimensions();
        let keyed = RgbaImage::from_fn(width, height, |x, y| {
            let [r, g, b] = image.get_pixel(x, y).0;
            let is_background = r >= WHITE_THRESHOLD && g >= WHITE_THRESHOLD && b >= WHITE_THRESHOLD;
            Rgba([r, g, b, if is_background { 0 } else { 255 }])
        });
        Ok(keyed)
    }

    async fn infer_and_extract_mesh(
        &self,
        image: RgbaImage,
        resolution: McResolution,
    ) -> Result<MeshArtifact, GenerationError> {
        debug!(
            width = image.width(),
            height = image.height(),
            resolution = resolution.value(),
            "Mock inference"
        );

        let bytes = glb::tetrahedron(json!({
            "placeholder": true,
            "mc_resolution": resolution.value()
        }))
        .map_err(|e| GenerationError::Export(e.to_string()))?;

        MeshArtifact::from_glb(bytes)
    }
}
