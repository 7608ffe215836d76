use crate::domain::generation::{GenerationError, MeshArtifact};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Stages a mesh on disk before it is sent back to the client.
///
/// The staging file is removed whether or not the write/read succeeded.
#[derive(Debug, Clone, Default)]
pub struct GlbStaging {
    directory: Option<PathBuf>,
}

impl GlbStaging {
    pub fn new(directory: Option<PathBuf>) -> Self {
        Self { directory }
    }

    pub async fn transmit(&self, mesh: MeshArtifact) -> Result<Vec<u8>, GenerationError> {
        let directory = self.directory.clone();
        tokio::task::spawn_blocking(move || stage_and_read(directory.as_deref(), &mesh)).await?
    }
}

fn stage_and_read(directory: Option<&Path>, mesh: &MeshArtifact) -> Result<Vec<u8>, GenerationError> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("mesh-").suffix(".glb");
    let mut staged = match directory {
        Some(directory) => builder.tempfile_in(directory)?,
        None => builder.tempfile()?,
    };
    debug!("Staging {} byte mesh at {}", mesh.len(), staged.path().display());

    let read_back = staged
        .write_all(mesh.as_bytes())
        .and_then(|_| staged.flush())
        .and_then(|_| std::fs::read(staged.path()));
    let removed = staged.close();

    let bytes = read_back?;
    removed?;
    Ok(bytes)
}
