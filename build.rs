//! Build script for the nowplaying backend.
//!
//! Copies the `.env.example` configuration template into the user's local
//! data directory, next to where the application looks for its `.env` file,
//! so a fresh install has a documented starting point.

use std::{env, fs, path::PathBuf};

/// Copies `.env.example` to the local data directory.
///
/// # File Operations
///
/// ## Source Location
/// `.env.example` in the crate root (where Cargo.toml resides).
///
/// ## Destination Location
/// - Linux: `~/.local/share/nowplaying/.env.example`
/// - macOS: `~/Library/Application Support/nowplaying/.env.example`
/// - Windows: `%LOCALAPPDATA%/nowplaying/.env.example`
///
/// # Error Handling Strategy
///
/// - **Missing Template**: Issues a cargo warning but continues the build
/// - **Directory Creation Failures**: Returns errors (critical)
/// - **File Copy Failures**: Returns errors (critical)
fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=.env.example");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let env_example_path = manifest_dir.join(".env.example");

    let mut out_dir = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    out_dir.push("nowplaying");
    fs::create_dir_all(&out_dir)?;

    if env_example_path.is_file() {
        let contents = fs::read_to_string(&env_example_path)?;
        fs::write(out_dir.join(".env.example"), contents)?;
    } else {
        println!(
            "cargo:warning=.env.example not found at {}",
            env_example_path.display()
        );
    }

    Ok(())
}
