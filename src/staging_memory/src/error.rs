use thiserror::Error;

#[derive(Error, Debug)]
pub enum OverlayError {
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Base store error: {0}")]
    Base(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl OverlayError {
    pub fn key_not_found<K: std::fmt::Debug>(k: &K) -> Self {
        OverlayError::KeyNotFound(format!("{k:?}"))
    }

    pub fn base<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        OverlayError::Base(Box::new(err))
    }

    pub fn is_key_not_found(&self) -> bool {
        matches!(self, OverlayError::KeyNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, OverlayError>;
