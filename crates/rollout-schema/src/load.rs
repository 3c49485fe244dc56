//! # Pipeline Loading
//!
//! Chains the two validation phases into a single call:
//!
//! 1. parse bytes, resolve the schema, validate structure;
//! 2. deserialize the validated tree into [`Pipeline`];
//! 3. run semantic validation on the typed model.
//!
//! Each phase short-circuits the next. The first error is returned as-is.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rollout_core::{Pipeline, PipelineError};
use thiserror::Error;

use crate::error::SchemaError;
use crate::registry::SchemaRegistry;
use crate::validate::SchemaValidator;

/// Error from loading a pipeline.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The pipeline file could not be read.
    #[error("failed to read pipeline {}: {source}", .path.display())]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Structural validation failed.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The validated document did not map onto the typed model.
    #[error("failed to decode pipeline: {0}")]
    Deserialize(String),

    /// Semantic validation failed.
    #[error(transparent)]
    Semantic(#[from] PipelineError),
}

/// Loads pipelines through structural then semantic validation.
#[derive(Debug, Clone)]
pub struct PipelineLoader {
    validator: SchemaValidator,
}

impl PipelineLoader {
    /// A loader validating against `registry`.
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self {
            validator: SchemaValidator::new(registry),
        }
    }

    /// A loader over [`SchemaRegistry::builtin`].
    pub fn builtin() -> Result<Self, SchemaError> {
        Ok(Self::new(Arc::new(SchemaRegistry::builtin()?)))
    }

    /// Structural validation only.
    pub fn validate_schema(&self, bytes: &[u8]) -> Result<(), SchemaError> {
        self.validator.validate_schema(bytes)
    }

    /// Parse, validate, and return the typed pipeline.
    ///
    /// # Errors
    ///
    /// The first failure of any phase; see [`LoadError`].
    pub fn load(&self, bytes: &[u8]) -> Result<Pipeline, LoadError> {
        let document = self.validator.checked_document(bytes)?;
        let pipeline: Pipeline =
            serde_json::from_value(document).map_err(|e| LoadError::Deserialize(e.to_string()))?;
        pipeline.validate()?;

        tracing::debug!(
            rollout = %pipeline.rollout_name,
            steps = pipeline.step_count(),
            "pipeline loaded"
        );
        Ok(pipeline)
    }

    /// Read a pipeline file and [`load`](Self::load) it.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<Pipeline, LoadError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::trace!(path = %path.display(), bytes = bytes.len(), "read pipeline file");
        self.load(&bytes)
    }
}
