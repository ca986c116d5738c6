use thiserror::Error;

#[derive(Error, Debug)]
pub enum PetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Autolaunch error: {0}")]
    Autolaunch(String),

    #[error("Background task failed: {0}")]
    Join(String),
}

impl From<auto_launch::Error> for PetError {
    fn from(err: auto_launch::Error) -> Self {
        PetError::Autolaunch(err.to_string())
    }
}

impl From<tokio::task::JoinError> for PetError {
    fn from(err: tokio::task::JoinError) -> Self {
        PetError::Join(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only config");
        let err: PetError = io_err.into();
        assert!(matches!(err, PetError::Io(_)));
        assert!(err.to_string().contains("read-only config"));
    }

    #[test]
    fn test_error_display() {
        let err = PetError::Autolaunch("no autostart dir".to_string());
        assert_eq!(err.to_string(), "Autolaunch error: no autostart dir");

        let err = PetError::Join("worker panicked".to_string());
        assert_eq!(err.to_string(), "Background task failed: worker panicked");
    }
}
