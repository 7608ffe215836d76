use super::worker::{RuntimeWorker, WorkerJob};
use super::RuntimeError;
use crate::config::RuntimeConfig;
use crate::domain::generation::services::composite_on_gray;
use crate::domain::generation::{
    Device, GenerationError, McResolution, MeshArtifact, ModelGateway,
};
use async_trait::async_trait;
use image::{ImageFormat, RgbImage, RgbaImage};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

pub const MODEL_NAME: &str = "TripoSR";

/// Python package the worker imports from the checkout.
const PACKAGE_DIR: &str = "tsr";

/// Gateway to the native TripoSR runtime.
///
/// The model lives in one worker process started by [`TripoSrRuntime::load`].
/// If the worker dies it is started again on the next request.
pub struct TripoSrRuntime {
    config: RuntimeConfig,
    device: Device,
    worker: Mutex<Option<RuntimeWorker>>,
    restarts: AtomicU32,
}

impl TripoSrRuntime {
    /// Locates the checkout and loads the model into a fresh worker.
    pub async fn load(config: RuntimeConfig, device: Device) -> Result<Self, RuntimeError> {
        let package = config.triposr_dir.join(PACKAGE_DIR);
        if !tokio::fs::try_exists(&package).await.unwrap_or(false) {
            return Err(RuntimeError::CheckoutNotFound(package));
        }

        info!("Loading TripoSR runtime from {}", config.triposr_dir.display());
        let worker = RuntimeWorker::spawn(&config, device).await?;
        info!(
            model = %config.pretrained_model,
            device = %device,
            chunk_size = config.chunk_size,
            "TripoSR runtime loaded successfully"
        );

        Ok(Self {
            config,
            device,
            worker: Mutex::new(Some(worker)),
            restarts: AtomicU32::new(0),
        })
    }

    pub fn package_dir(&self) -> PathBuf {
        self.config.triposr_dir.join(PACKAGE_DIR)
    }

    async fn run_job(&self, job: &WorkerJob<'_>) -> Result<(), RuntimeError> {
        let mut slot = self.worker.lock().await;

        let mut worker = match slot.take() {
            Some(worker) => worker,
            None => {
                let restart = self.restarts.fetch_add(1, Ordering::Relaxed) + 1;
                warn!("Restarting TripoSR worker (restart #{})", restart);
                RuntimeWorker::spawn(&self.config, self.device).await?
            }
        };

        let result = worker.run(job).await;
        match &result {
            Err(e) if e.is_fatal() => error!("Discarding TripoSR worker: {}", e),
            _ => *slot = Some(worker),
        }
        result
    }
}

#[async_trait]
impl ModelGateway for TripoSrRuntime {
    fn model_name(&self) -> &str {
        MODEL_NAME
    }

    fn device(&self) -> Device {
        self.device
    }

    async fn remove_background(&self, image: RgbImage) -> Result<RgbaImage, GenerationError> {
        let workdir = tempfile::Builder::new().prefix("triposr-").tempdir()?;
        let input = workdir.path().join("input.png");
        let output = workdir.path().join("foreground.png");

        let input_path = input.clone();
        tokio::task::spawn_blocking(move || image.save_with_format(&input_path, ImageFormat::Png))
            .await?
            .map_err(|e| GenerationError::BackgroundRemoval(format!("failed to stage image: {e}")))?;

        self.run_job(&WorkerJob::RemoveBackground {
            input: &input,
            output: &output,
        })
        .await
        .map_err(|e| GenerationError::BackgroundRemoval(e.to_string()))?;

        tokio::task::spawn_blocking(move || image::open(&output).map(|image| image.to_rgba8()))
            .await?
            .map_err(|e| GenerationError::BackgroundRemoval(e.to_string()))
    }

    async fn infer_and_extract_mesh(
        &self,
        image: RgbaImage,
        resolution: McResolution,
    ) -> Result<MeshArtifact, GenerationError> {
        let workdir = tempfile::Builder::new().prefix("triposr-").tempdir()?;
        let input = workdir.path().join("input.png");
        let output = workdir.path().join("mesh.glb");

        let input_path = input.clone();
        tokio::task::spawn_blocking(move || {
            composite_on_gray(&image).save_with_format(&input_path, ImageFormat::Png)
        })
        .await?
        .map_err(|e| GenerationError::Inference(format!("failed to stage input image: {e}")))?;

        self.run_job(&WorkerJob::Mesh {
            input: &input,
            output: &output,
            resolution: resolution.value(),
        })
        .await
        .map_err(|e| GenerationError::Inference(e.to_string()))?;

        info!("Exporting to GLB...");
        let bytes = tokio::fs::read(&output)
            .await
            .map_err(|e| GenerationError::Export(format!("{}: {}", output.display(), e)))?;

        MeshArtifact::from_glb(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_requires_checkout() {
        let checkout = tempfile::tempdir().unwrap();
        let config = RuntimeConfig {
            triposr_dir: checkout.path().to_path_buf(),
            ..RuntimeConfig::default()
        };

        match TripoSrRuntime::load(config, Device::Cpu).await {
            Err(RuntimeError::CheckoutNotFound(path)) => {
                assert_eq!(path, checkout.path().join("tsr"));
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("runtime should not load without the tsr package"),
        }
    }

    #[cfg(unix)]
    mod with_fake_worker {
        use super::*;
        use crate::infrastructure::model::glb;
        use crate::infrastructure::model::worker::test_helpers::{
            FakeBehavior, fake_interpreter, load_count,
        };
        use image::{Rgb, Rgba};
        use std::path::Path;
        use tempfile::TempDir;

        fn checkout(behavior: FakeBehavior) -> (TempDir, RuntimeConfig, PathBuf) {
            let dir = tempfile::tempdir().unwrap();
            std::fs::create_dir(dir.path().join("tsr")).unwrap();
            let mesh = dir.path().join("fixture.glb");
            std::fs::write(&mesh, glb::tetrahedron(serde_json::Value::Null).unwrap()).unwrap();
            let (interpreter, loads) = fake_interpreter(dir.path(), &mesh, behavior);

            let config = RuntimeConfig {
                python: interpreter,
                triposr_dir: dir.path().to_path_buf(),
                ..RuntimeConfig::default()
            };
            (dir, config, loads)
        }

        fn foreground() -> RgbaImage {
            RgbaImage::from_pixel(16, 16, Rgba([120, 30, 30, 255]))
        }

        async fn generate(runtime: &TripoSrRuntime) -> Result<MeshArtifact, GenerationError> {
            runtime
                .infer_and_extract_mesh(foreground(), McResolution::default())
                .await
        }

        #[tokio::test]
        async fn test_model_is_loaded_once_across_requests() {
            let (_dir, config, loads) = checkout(FakeBehavior::Serve);

            let runtime = TripoSrRuntime::load(config, Device::Cpu).await.unwrap();
            assert_eq!(load_count(&loads), 1);

            for _ in 0..3 {
                let mesh = generate(&runtime).await.unwrap();
                assert_eq!(&mesh.as_bytes()[0..4], b"glTF");
            }
            let keyed = runtime
                .remove_background(RgbImage::from_pixel(8, 8, Rgb([1, 2, 3])))
                .await
                .unwrap();
            assert_eq!(keyed.dimensions(), (8, 8));

            assert_eq!(load_count(&loads), 1);
            assert_eq!(runtime.restarts.load(Ordering::Relaxed), 0);
        }

        #[tokio::test]
        async fn test_dead_worker_is_restarted_on_next_request() {
            let (_dir, config, loads) = checkout(FakeBehavior::ExitAfterFirstJob);
            let runtime = TripoSrRuntime::load(config, Device::Cpu).await.unwrap();

            assert!(generate(&runtime).await.is_ok());
            assert!(matches!(
                generate(&runtime).await,
                Err(GenerationError::Inference(_))
            ));
            assert!(generate(&runtime).await.is_ok());

            assert_eq!(load_count(&loads), 2);
            assert_eq!(runtime.restarts.load(Ordering::Relaxed), 1);
        }

        #[tokio::test]
        async fn test_failed_job_keeps_the_worker() {
            let (_dir, config, loads) = checkout(FakeBehavior::FailJobs);
            let runtime = TripoSrRuntime::load(config, Device::Cpu).await.unwrap();

            for _ in 0..2 {
                match generate(&runtime).await {
                    Err(GenerationError::Inference(message)) => {
                        assert!(message.contains("CUDA out of memory"))
                    }
                    other => panic!("expected inference error, got {other:?}"),
                }
            }
            assert_eq!(load_count(&loads), 1);
        }

        #[tokio::test]
        async fn test_load_fails_when_worker_cannot_start() {
            let (dir, mut config, _) = checkout(FakeBehavior::Serve);
            config.python = Path::new("false").to_path_buf();

            assert!(matches!(
                TripoSrRuntime::load(config, Device::Cpu).await,
                Err(RuntimeError::WorkerExited(_))
            ));
            drop(dir);
        }
    }
}
