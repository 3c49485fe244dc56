//! # Schemas Subcommand
//!
//! Lists the schema references a pipeline may declare in `$schema`.

use std::io::Write;

use anyhow::Result;
use rollout_schema::SchemaRegistry;

/// Write one reference per line, marking the default with ` (default)`.
pub fn run_schemas(registry: &SchemaRegistry, out: &mut impl Write) -> Result<u8> {
    for reference in registry.references() {
        if reference == registry.default_reference() {
            writeln!(out, "{reference} (default)")?;
        } else {
            writeln!(out, "{reference}")?;
        }
    }
    Ok(0)
}
