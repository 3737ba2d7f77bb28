use thiserror::Error;

pub type Result<T> = std::result::Result<T, YabuError>;

/// Every variant is terminal for the current run: the error surfaces to the
/// operator and the process exits non-zero. Already-completed steps are not
/// rolled back.
#[derive(Debug, Error)]
pub enum YabuError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("control file error: {0}")]
    Config(String),

    #[error("object store error: {0}")]
    Connectivity(String),

    #[error("listing sanity check failed: {0}")]
    Ordering(String),

    #[error("staging failed: {0}")]
    Staging(String),

    #[error("archive creation failed: {0}")]
    ArchiveCreation(String),

    #[error("upload failed: {0}")]
    Upload(String),

    #[error("hook error: {0}")]
    Hook(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
