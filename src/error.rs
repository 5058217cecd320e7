//! Error types and result alias for the crate.
//!
//! Fog operations themselves never fail (a disabled layer is simply inert).
//! These errors only come out of host plumbing: loading the background image,
//! reading or writing map documents, and the app config file.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FogError>;

#[derive(Debug, Error)]
pub enum FogError {
    #[error("failed to load fog image '{path}': {source}")]
    ImageLoad {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to read map document {path:?}: {source}")]
    DocumentRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write map document {path:?}: {source}")]
    DocumentWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed map document: {0}")]
    DocumentFormat(#[from] serde_json::Error),

    #[error("could not read config file {path:?}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config file {path:?} is corrupted: {source}")]
    ConfigFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not write config file {path:?}: {source}")]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_format_from_serde() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: FogError = parse_err.into();
        assert!(matches!(err, FogError::DocumentFormat(_)));
        assert!(err.to_string().starts_with("malformed map document"));
    }

    #[test]
    fn test_document_read_message_names_path() {
        let err = FogError::DocumentRead {
            path: PathBuf::from("maps/cave.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.to_string().contains("cave.json"));
    }
}
