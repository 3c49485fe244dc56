//! # Validate Subcommand
//!
//! Validates pipeline files. Each file is reported on its own line:
//!
//! ```text
//! ok pipelines/region.yaml
//! FAIL pipelines/global.yaml: duplicate step name "deploy"
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use rollout_schema::{LoadError, PipelineLoader};

/// Arguments for the validate subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Pipeline files (YAML or JSON).
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Only check schema conformance; skip semantic validation.
    #[arg(long)]
    pub schema_only: bool,
}

/// Validate every file, writing one result line per file to `out`.
///
/// Returns exit code 0 when every file passes, 1 otherwise.
pub fn run_validate(args: &ValidateArgs, loader: &PipelineLoader, out: &mut impl Write) -> Result<u8> {
    let mut failures = 0usize;

    for path in &args.files {
        match validate_file(loader, path, args.schema_only) {
            Ok(()) => writeln!(out, "ok {}", path.display())?,
            Err(e) => {
                failures += 1;
                writeln!(out, "FAIL {}: {e}", path.display())?;
            }
        }
    }

    tracing::info!(files = args.files.len(), failures, "validation finished");
    Ok(u8::from(failures > 0))
}

fn validate_file(loader: &PipelineLoader, path: &Path, schema_only: bool) -> Result<(), LoadError> {
    if !schema_only {
        return loader.load_file(path).map(drop);
    }
    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    loader.validate_schema(&bytes)?;
    Ok(())
}
