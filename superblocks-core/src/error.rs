use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Missing prerequisite: {0}")]
    MissingPrerequisite(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("GeoJSON error: {0}")]
    GeoJsonError(String),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn missing(stage: &str) -> Self {
        Error::MissingPrerequisite(stage.to_string())
    }
}
