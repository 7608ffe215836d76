use crate::domain::generation::services::decode_image;
use crate::domain::generation::{
    ForegroundRatio, GenerationError, GenerationRequest, MeshArtifact, ModelGateway,
};
use crate::measure_time;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

/// 画像から GLB メッシュを生成するユースケース
///
/// モデルハンドルは逐次利用を前提としているため、ゲートウェイ呼び出しは
/// ロックで一件ずつ直列化する。デコードはロックの外で行う。
pub struct GenerateMeshUseCase {
    gateway: Arc<dyn ModelGateway>,
    foreground_ratio: ForegroundRatio,
    inference_lock: Mutex<()>,
}

impl GenerateMeshUseCase {
    pub fn new(gateway: Arc<dyn ModelGateway>, foreground_ratio: ForegroundRatio) -> Self {
        Self {
            gateway,
            foreground_ratio,
            inference_lock: Mutex::new(()),
        }
    }

    pub async fn execute(&self, request: GenerationRequest) -> Result<MeshArtifact, GenerationError> {
        let request_id = Uuid::new_v4();
        let span = info_span!("generate", %request_id, resolution = request.resolution.value());
        self.run(request).instrument(span).await
    }

    async fn run(&self, request: GenerationRequest) -> Result<MeshArtifact, GenerationError> {
        let GenerationRequest { image, resolution } = request;

        info!("Processing image...");
        let image = measure_time!("decode_image", {
            tokio::task::spawn_blocking(move || decode_image(&image)).await??
        });

        let _guard = self.inference_lock.lock().await;

        info!("Removing background...");
        let image = measure_time!("remove_background", {
            self.gateway.remove_background(image).await?
        });

        info!("Resizing foreground...");
        let image = measure_time!("resize_foreground", {
            self.gateway
                .resize_foreground(image, self.foreground_ratio)
                .await?
        });

        info!("Generating 3D mesh (resolution: {})...", resolution);
        let mesh = measure_time!("infer_and_extract_mesh", {
            self.gateway.infer_and_extract_mesh(image, resolution).await?
        });

        info!(
            size_kb = %format!("{:.1}", mesh.size_kb()),
            "Mesh generated successfully"
        );
        Ok(mesh)
    }
}
