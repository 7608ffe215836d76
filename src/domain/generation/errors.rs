use super::value_objects::McResolution;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Missing image data")]
    MissingImage,

    #[error("Resolution must be between {min} and {max}", min = McResolution::MIN, max = McResolution::MAX)]
    ResolutionOutOfRange,

    #[error("Invalid image payload: {0}")]
    InvalidPayload(String),

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("No foreground found in image after background removal")]
    NoForeground,

    #[error("Foreground ratio must be in (0, 1], got {0}")]
    InvalidForegroundRatio(f32),

    #[error("Background removal failed: {0}")]
    BackgroundRemoval(String),

    #[error("Model inference failed: {0}")]
    Inference(String),

    #[error("Mesh export failed: {0}")]
    Export(String),

    #[error("Staging file operation failed: {0}")]
    Staging(#[from] std::io::Error),

    #[error("Worker task failed: {0}")]
    Task(String),
}

impl GenerationError {
    /// 呼び出し側の入力が原因のエラーか (HTTP 400 に対応)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            GenerationError::MissingImage | GenerationError::ResolutionOutOfRange
        )
    }
}

impl From<tokio::task::JoinError> for GenerationError {
    fn from(error: tokio::task::JoinError) -> Self {
        GenerationError::Task(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_classification() {
        assert!(GenerationError::MissingImage.is_client_error());
        assert!(GenerationError::ResolutionOutOfRange.is_client_error());

        assert!(!GenerationError::Decode("bad".to_string()).is_client_error());
        assert!(!GenerationError::NoForeground.is_client_error());
        assert!(!GenerationError::Inference("boom".to_string()).is_client_error());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(GenerationError::MissingImage.to_string(), "Missing image data");
        assert_eq!(
            GenerationError::ResolutionOutOfRange.to_string(),
            "Resolution must be between 128 and 512"
        );
    }
}
