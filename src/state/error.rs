use thiserror::Error;

use crate::core::errors::ApiError;
use crate::documents::DocumentError;

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("Failed to load configuration: {0}")]
    Config(#[source] ApiError),

    #[error("Failed to initialize {name} provider: {source}")]
    Provider {
        name: &'static str,
        #[source]
        source: ApiError,
    },

    #[error("Failed to initialize OCR client: {0}")]
    Ocr(#[source] DocumentError),
}
