/*
 * version.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Version reporting for sassc
 */

use std::path::Path;

use anyhow::{Context, Result};
use libsass::Sass;

pub fn cargo_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Print the binary version, then the libsass and Sass language versions if
/// the library can be loaded.
pub fn execute(library: Option<&Path>) -> Result<()> {
    println!("sassc: {}", cargo_version());
    let sass = match library {
        Some(path) => Sass::load_from(path),
        None => Sass::load(),
    }
    .context("libsass is not available")?;
    println!("libsass: {}", sass.version());
    println!("sass: {}", sass.language_version());
    Ok(())
}
