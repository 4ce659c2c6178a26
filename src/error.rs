use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("ort (onnxruntime) error: {0}")]
    Ort(#[from] ort::Error),
    #[error("inference engine error: {0}")]
    Engine(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error("unsupported model: {0}")]
    UnsupportedModel(String),
    #[error("tensor shape mismatch: {0}")]
    ShapeMismatch(String),
    #[error("image is empty ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },
    #[cfg(feature = "save")]
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
