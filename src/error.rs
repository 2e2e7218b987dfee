//! Crate-level error types.

use std::fmt;

use crate::asset::AssetError;
use crate::gpu::render_context::RenderContextError;

/// Errors produced by the vitrine crate.
#[derive(Debug)]
pub enum VitrineError {
    /// GPU context initialization failure.
    Gpu(RenderContextError),
    /// Failed to fetch or parse a model.
    AssetLoad(AssetError),
    /// Generic I/O failure.
    Io(std::io::Error),
    /// Failed to spawn a background thread.
    ThreadSpawn(std::io::Error),
    /// TOML options parsing/serialization failure.
    OptionsParse(String),
    /// Catalog file parsing failure.
    CatalogParse(String),
    /// Window event-loop failure.
    EventLoop(String),
}

impl fmt::Display for VitrineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpu(e) => write!(f, "GPU error: {e}"),
            Self::AssetLoad(e) => write!(f, "asset load error: {e}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::ThreadSpawn(e) => {
                write!(f, "failed to spawn thread: {e}")
            }
            Self::OptionsParse(msg) => {
                write!(f, "options parse error: {msg}")
            }
            Self::CatalogParse(msg) => {
                write!(f, "catalog parse error: {msg}")
            }
            Self::EventLoop(msg) => write!(f, "event loop error: {msg}"),
        }
    }
}

impl std::error::Error for VitrineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Gpu(e) => Some(e),
            Self::AssetLoad(e) => Some(e),
            Self::Io(e) | Self::ThreadSpawn(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RenderContextError> for VitrineError {
    fn from(e: RenderContextError) -> Self {
        Self::Gpu(e)
    }
}

impl From<AssetError> for VitrineError {
    fn from(e: AssetError) -> Self {
        Self::AssetLoad(e)
    }
}

impl From<std::io::Error> for VitrineError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
