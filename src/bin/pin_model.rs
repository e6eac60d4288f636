//! Model pinning utility for Nexus pipeline artifacts.
//!
//! Validates that an artifact loads as a pipeline and prints its SHA-256
//! digest in the form the service reads from the environment.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin pin_model -- <artifact_or_dir> [--expect <sha256>]
//! ```

use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use nexus_renal::adapters::pipeline::PipelineAdapter;

fn usage() -> String {
    "Usage: pin_model <artifact_or_dir> [--expect <sha256>]".to_string()
}

fn parse_args() -> Result<(PathBuf, Option<String>)> {
    let mut args = env::args().skip(1);
    let mut path: Option<PathBuf> = None;
    let mut expect: Option<String> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--expect" => {
                let v = args.next().with_context(usage)?;
                expect = Some(v);
            }
            "-h" | "--help" => bail!(usage()),
            _ => {
                if path.is_some() {
                    bail!(usage());
                }
                path = Some(PathBuf::from(arg));
            }
        }
    }

    let path = path.with_context(usage)?;
    Ok((path, expect))
}

fn main() -> Result<()> {
    let (path, expect) = parse_args()?;

    let adapter = PipelineAdapter::load(&path, expect.as_deref())
        .with_context(|| format!("Failed to load pipeline artifact {path:?}"))?;
    let exported = adapter.exported();

    println!("Artifact: {:?}", adapter.source());
    println!(
        "Features: {} numeric, {} categorical ({} encoded)",
        exported.numeric_features.len(),
        exported.categorical_features.len(),
        exported.encoded_width()
    );
    println!("NEXUS_MODEL_SHA256={}", adapter.sha256());

    Ok(())
}
