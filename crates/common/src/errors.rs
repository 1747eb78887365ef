use std::fmt::Debug;

pub type Result<T, E = EtlError> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum EtlError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("extraction error: {0}")]
    Extraction(#[source] anyhow::Error),
    #[error("transform error: {0}")]
    Transform(#[source] anyhow::Error),
    #[error("database error: {0}")]
    Database(#[source] anyhow::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl EtlError {
    pub fn extraction(err: impl Into<anyhow::Error>) -> Self {
        Self::Extraction(err.into())
    }

    pub fn transform(err: impl Into<anyhow::Error>) -> Self {
        Self::Transform(err.into())
    }

    pub fn db(err: impl Into<anyhow::Error>) -> Self {
        Self::Database(err.into())
    }
}
