use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Ort(#[from] ort::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Bincode(#[from] bincode::Error),
    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
    #[error("Model file not found: {0}")]
    ModelNotFound(PathBuf),
    #[error("Failed to initialize the inference runtime: {0}")]
    RuntimeInit(String),
    #[error("Output layer {layer:?} not found. Available outputs: {available:?}")]
    MissingOutputLayer { layer: String, available: Vec<String> },
    #[error("The forward pass returned no feature rows")]
    EmptyOutput,
    #[error("Unable to determine the data directory for this platform")]
    NoDataDirectory,
}

impl serde::Serialize for Error {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
      S: serde::ser::Serializer,
    {
      serializer.serialize_str(self.to_string().as_ref())
    }
}
