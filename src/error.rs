/// Error types shared by the sequencer, the capture store and their collaborators
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, BoothError>;

#[derive(thiserror::Error, Debug)]
pub enum BoothError {
    /// The camera stream was never acquired or has been stopped
    #[error("camera unavailable: {0}")]
    CameraUnavailable(String),

    /// Overlay geometry could not be resolved
    #[error("overlay not ready: {0}")]
    OverlayNotReady(String),

    #[error("unknown layout '{0}'")]
    UnknownLayout(String),

    #[error("asset not found: {0}")]
    AssetNotFound(String),

    /// Encoded image payload was not a base64 JPEG
    #[error("invalid image payload: {0}")]
    InvalidPayload(String),

    #[error("failed to write {}: {source}", path.display())]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to stat {}: {source}", path.display())]
    FileStat {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to delete {}: {source}", path.display())]
    FileDelete {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

impl BoothError {
    pub fn camera(msg: impl Into<String>) -> Self {
        Self::CameraUnavailable(msg.into())
    }

    pub fn overlay(msg: impl Into<String>) -> Self {
        Self::OverlayNotReady(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// True when the underlying I/O error says the file is already gone
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::FileWrite { source, .. }
            | Self::FileStat { source, .. }
            | Self::FileDelete { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_the_path() {
        let err = BoothError::FileDelete {
            path: PathBuf::from("/tmp/captured/photo.jpg"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let message = err.to_string();
        assert!(message.contains("failed to delete"));
        assert!(message.contains("/tmp/captured/photo.jpg"));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_not_found_detection() {
        let err = BoothError::FileStat {
            path: PathBuf::from("gone.jpg"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(err.is_not_found());
        assert!(!BoothError::UnknownLayout("x".into()).is_not_found());
    }
}
