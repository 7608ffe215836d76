pub mod device;
pub mod glb;
pub mod mock_model;
pub mod triposr_runtime;
pub mod worker;

pub use device::DeviceProbe;
pub use mock_model::MockModelGateway;
pub use triposr_runtime::TripoSrRuntime;

use crate::config::RuntimeConfig;
use crate::domain::generation::ModelGateway;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("TripoSR package not found in checkout: {0}")]
    CheckoutNotFound(PathBuf),

    #[error("Failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("TripoSR worker exited: {0}")]
    WorkerExited(String),

    #[error("TripoSR worker job failed: {0}")]
    JobFailed(String),

    #[error("Unexpected worker message: {0}")]
    Protocol(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RuntimeError {
    /// Whether the worker can no longer be trusted to serve further jobs.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, RuntimeError::JobFailed(_))
    }
}

/// Resolves the device and loads the configured gateway once, before serving.
pub async fn load_gateway(config: &RuntimeConfig) -> Result<Arc<dyn ModelGateway>, RuntimeError> {
    let device = DeviceProbe::new().select(config.device).await;
    info!("Using device: {}", device);

    if config.mock {
        info!("Using mock model gateway; meshes are placeholders");
        return Ok(Arc::new(MockModelGateway::with_device(device)));
    }

    let runtime = TripoSrRuntime::load(config.clone(), device).await?;
    Ok(Arc::new(runtime))
}
