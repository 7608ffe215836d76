use super::entities::MeshArtifact;
use super::errors::GenerationError;
use super::services;
use super::value_objects::{Device, ForegroundRatio, McResolution};
use async_trait::async_trait;
use image::{RgbImage, RgbaImage};

/// 事前学習済みモデルへのゲートウェイ
///
/// プロセス起動時に一度だけロードされ、以後は読み取り専用で共有される。
/// 推論の内部実装には立ち入らない。
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// ヘルスチェックで報告するモデル名
    fn model_name(&self) -> &str;

    /// 推論に使用しているデバイス
    fn device(&self) -> Device;

    /// 背景を除去し、前景以外を透明にした画像を返す
    async fn remove_background(&self, image: RgbImage) -> Result<RgbaImage, GenerationError>;

    /// 前景を正方形キャンバスの中央に再配置
    async fn resize_foreground(
        &self,
        image: RgbaImage,
        ratio: ForegroundRatio,
    ) -> Result<RgbaImage, GenerationError> {
        tokio::task::spawn_blocking(move || services::resize_foreground(&image, ratio)).await?
    }

    /// 推論とマーチングキューブによるメッシュ抽出を行い、GLB として書き出す
    async fn infer_and_extract_mesh(
        &self,
        image: RgbaImage,
        resolution: McResolution,
    ) -> Result<MeshArtifact, GenerationError>;
}
