//! Build script for plmatch.
//!
//! Copies the `.env.example` template into the local data directory, next to
//! the `.env` the binary reads at startup:
//!
//! - Linux: `~/.local/share/plmatch/.env.example`
//! - macOS: `~/Library/Application Support/plmatch/.env.example`
//! - Windows: `%LOCALAPPDATA%/plmatch/.env.example`
//!
//! A missing template only produces a cargo warning.

use std::{env, fs, path::PathBuf};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=.env.example");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let template = manifest_dir.join(".env.example");

    let mut out_dir = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    out_dir.push("plmatch");

    if !template.is_file() {
        println!("cargo:warning=.env.example not found at {}", template.display());
        return Ok(());
    }

    // Read-only build sandboxes are common; the template is a convenience.
    if let Err(e) = fs::create_dir_all(&out_dir)
        .and_then(|_| fs::copy(&template, out_dir.join(".env.example")).map(|_| ()))
    {
        println!("cargo:warning=could not install .env.example: {e}");
    }
    Ok(())
}
