use std::path::PathBuf;
use thiserror::Error;

use crate::product::ProductId;

/// Every failure the explorer can report
///
/// Errors are handled where they occur: a failed login re-renders the login
/// page, a missing image leaves the rest of the dashboard usable. None of them
/// terminate the process. An empty filter result is not an error at all.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// Username/password pair did not match the credential store
    #[error("Invalid credentials!")]
    AuthFailure,

    /// Product image file is missing from the image directory
    #[error("Image not found: {}", path.display())]
    AssetNotFound { path: PathBuf },

    /// Product id is not part of the session catalog
    #[error("Unknown product id: {0}")]
    UnknownProduct(ProductId),

    /// Catalog file is malformed (line 1 is the header)
    #[error("Invalid catalog data at line {line}: {message}")]
    Catalog { line: usize, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Image processing failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("Chart rendering failed: {0}")]
    Chart(String),

    #[error("Export failed: {0}")]
    Export(String),

    #[error("Template rendering failed: {0}")]
    Template(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),
}

impl DashboardError {
    pub(crate) fn catalog(line: usize, message: impl Into<String>) -> Self {
        DashboardError::Catalog {
            line,
            message: message.into(),
        }
    }
}
