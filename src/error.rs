use thiserror::Error;

#[derive(Error, Debug)]
pub enum QualityError {
    #[error("Image loading error: {0}")]
    ImageLoad(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Candidate '{0}' was supplied more than once")]
    DuplicateCandidate(String),

    #[error("Reference image has no pixels")]
    EmptyImage,
}

pub type Result<T> = std::result::Result<T, QualityError>;
