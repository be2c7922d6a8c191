//! sassc - compile Sass through libsass

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use libsass::OutputStyle;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod compile;
mod version;

#[derive(Parser, Debug)]
#[command(name = "sassc")]
#[command(about = "Compile Sass to CSS with libsass", long_about = None)]
#[command(disable_version_flag = true)]
pub(crate) struct Cli {
    /// Input file (omit with --stdin)
    pub input: Option<PathBuf>,

    /// Read the input from stdin
    #[arg(short = 's', long, conflicts_with = "input")]
    pub stdin: bool,

    /// Write CSS to FILE instead of stdout
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output style (nested, expanded, compact, compressed)
    #[arg(short = 't', long = "style", value_name = "NAME")]
    pub style: Option<OutputStyle>,

    /// Digits after the decimal point in numbers
    #[arg(short = 'p', long)]
    pub precision: Option<i32>,

    /// Directory searched for imports (repeatable)
    #[arg(short = 'I', long = "include-path", value_name = "DIR")]
    pub include_paths: Vec<PathBuf>,

    /// Directory searched for plugins (repeatable)
    #[arg(short = 'P', long = "plugin-path", value_name = "DIR")]
    pub plugin_paths: Vec<PathBuf>,

    /// Write a source map next to the output
    #[arg(short = 'm', long)]
    pub sourcemap: bool,

    /// Embed the source map in the CSS as a data URI
    #[arg(long)]
    pub embed_source_map: bool,

    /// Include the sources in the source map
    #[arg(long)]
    pub source_map_contents: bool,

    /// Leave out the sourceMappingURL comment
    #[arg(short = 'M', long)]
    pub omit_map_comment: bool,

    /// Treat the input as indented syntax (.sass)
    #[arg(short = 'a', long = "sass")]
    pub indented: bool,

    /// Emit comments with the source line of each rule
    #[arg(short = 'l', long)]
    pub line_comments: bool,

    /// TOML file with default settings; flags override it
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// libsass shared library to load (defaults to $LIBSASS_PATH)
    #[arg(long, value_name = "PATH")]
    pub library: Option<PathBuf>,

    /// Compile with separate parse and execute phases
    #[arg(long)]
    pub staged: bool,

    /// Print sassc, libsass and Sass language versions
    #[arg(short = 'v', long)]
    pub version: bool,
}

fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the CSS
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sassc=info,libsass=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if cli.version {
        return version::execute(cli.library.as_deref());
    }
    compile::execute(&cli)
}
