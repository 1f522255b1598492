use thiserror::Error;
use wsitk_core::TransformError;

/// Errors raised while reading or writing a transform sequence.
#[derive(Error, Debug)]
pub enum LoaderError {
    /// Top level is not a mapping, or a stage value is neither a mapping
    /// nor a list of mappings.
    #[error("Malformed transform sequence: {0}")]
    Malformed(String),

    /// A parameter map that does not deserialise.
    #[error("Invalid parameter map under '{stage}': {source}")]
    Definition {
        stage: String,
        #[source]
        source: serde_json::Error,
    },

    /// A parameter map that deserialises but does not describe a valid transform.
    #[error("Transform {position} under '{stage}': {source}")]
    Transform {
        position: usize,
        stage: String,
        #[source]
        source: TransformError,
    },

    #[error("Transform sequence error: {0}")]
    Sequence(#[from] TransformError),

    /// Stages must appear in ascending order, each as one adjacent run, to be
    /// written in the stage-keyed format.
    #[error("Stage {0} is out of order or split across non-adjacent transforms")]
    UnorderedStage(usize),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LoaderError>;
