/*
 * compile.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Compile command implementation
 */

//! Compile one Sass input to CSS.
//!
//! Settings are resolved in order: the `--config` file first, then command
//! line flags on top. The input is either a file, compiled through a file
//! context so relative imports resolve, or stdin, compiled as data.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use libsass::{Compilation, CompileOutput, Sass, SassConfig, SassError};
use tracing::{debug, info};

use crate::Cli;

/// Execute the compile command
pub fn execute(cli: &Cli) -> Result<()> {
    let config = resolve_config(cli)?;
    debug!(?config, "Resolved Sass settings");

    let sass = match &cli.library {
        Some(path) => Sass::load_from(path),
        None => Sass::load(),
    }
    .context("Failed to load libsass")?;

    let mut compilation = match (&cli.input, cli.stdin) {
        (Some(input), false) => Compilation::file(sass, input)?,
        (None, true) => {
            let mut source = Vec::new();
            io::stdin()
                .read_to_end(&mut source)
                .context("Failed to read stdin")?;
            Compilation::data(sass, source)?
        }
        _ => bail!("Provide an input file or --stdin"),
    };
    compilation.configure(&config)?;

    let result = if cli.staged {
        compilation.compile_staged()
    } else {
        compilation.compile()
    };
    let output = result.map_err(report_failure)?;
    write_output(cli, &config, &output)
}

/// Merge the config file with the flags given on the command line.
pub fn resolve_config(cli: &Cli) -> Result<SassConfig> {
    let mut config = match &cli.config {
        Some(path) => SassConfig::from_path(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => SassConfig::default(),
    };
    config.merge(flags_config(cli)?);
    Ok(config)
}

fn flags_config(cli: &Cli) -> Result<SassConfig> {
    let mut flags = SassConfig {
        output_style: cli.style,
        precision: cli.precision,
        include_paths: cli.include_paths.clone(),
        plugin_paths: cli.plugin_paths.clone(),
        output_path: cli.output.clone(),
        ..SassConfig::default()
    };
    if cli.line_comments {
        flags.source_comments = Some(true);
    }
    if cli.indented {
        flags.indented_syntax = Some(true);
    }
    if cli.embed_source_map {
        flags.source_map_embed = Some(true);
    }
    if cli.source_map_contents {
        flags.source_map_contents = Some(true);
    }
    if cli.omit_map_comment {
        flags.omit_source_map_url = Some(true);
    }
    if cli.sourcemap || cli.embed_source_map {
        flags.source_map_file = Some(source_map_path(cli.output.as_deref(), cli.embed_source_map)?);
    }
    Ok(flags)
}

/// `out.css` maps to `out.css.map`. Without an output file only an embedded
/// map is possible.
fn source_map_path(output: Option<&Path>, embed: bool) -> Result<PathBuf> {
    match output {
        Some(output) => {
            let mut map = output.as_os_str().to_owned();
            map.push(".map");
            Ok(PathBuf::from(map))
        }
        None if embed => Ok(PathBuf::from("stdout.css.map")),
        None => bail!("--sourcemap needs --output (or use --embed-source-map)"),
    }
}

fn report_failure(err: SassError) -> anyhow::Error {
    match err.as_compile_failure().and_then(|failure| failure.formatted.clone()) {
        Some(formatted) => anyhow::anyhow!(formatted.trim_end().to_string()),
        None => err.into(),
    }
}

fn write_output(cli: &Cli, config: &SassConfig, output: &CompileOutput) -> Result<()> {
    match &cli.output {
        Some(path) => {
            fs::write(path, &output.css)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), "Wrote CSS");
        }
        None => {
            io::stdout()
                .write_all(output.css.as_bytes())
                .context("Failed to write CSS to stdout")?;
        }
    }

    if let (Some(map), Some(map_path), false) =
        (&output.source_map, &config.source_map_file, cli.embed_source_map)
    {
        fs::write(map_path, map)
            .with_context(|| format!("Failed to write {}", map_path.display()))?;
        info!(path = %map_path.display(), "Wrote source map");
    }
    Ok(())
}
