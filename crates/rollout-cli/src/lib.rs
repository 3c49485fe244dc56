//! # rollout-cli — Pipeline Validation CLI
//!
//! Command-line front end over `rollout-schema` and `rollout-core`.
//!
//! ## Subcommands
//!
//! - `validate` — structural and semantic validation of pipeline files
//! - `schemas` — list registered schema references
//!
//! ## Crate Policy
//!
//! - Argument parsing lives here; validation logic lives in the library
//!   crates.
//! - Results go to stdout, logs to stderr.

pub mod schemas;
pub mod validate;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use rollout_schema::{SchemaRegistry, SchemaRegistryBuilder};

/// Build the schema registry: embedded schemas plus, optionally, every
/// schema file in `schema_dir`.
pub fn load_registry(schema_dir: Option<&Path>) -> Result<Arc<SchemaRegistry>> {
    let mut builder =
        SchemaRegistryBuilder::with_builtin().context("failed to load embedded schemas")?;
    if let Some(dir) = schema_dir {
        builder = builder
            .load_dir(dir)
            .with_context(|| format!("failed to load schemas from {}", dir.display()))?;
    }
    let registry = builder.build().context("failed to build schema registry")?;
    Ok(Arc::new(registry))
}
