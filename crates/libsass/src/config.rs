//! Compile settings loaded from TOML.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! [`SassConfig`] mirrors the libsass option set. Every field is optional:
//! anything left unset keeps the libsass default when the config is applied.
//!
//! ```toml
//! output-style = "compressed"
//! precision = 6
//! include-paths = ["scss/vendor", "scss/partials"]
//! source-map-file = "site.css.map"
//! source-map-contents = true
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::handle::Options;
use crate::library::Sass;
use crate::options::OptionStrings;
use crate::types::OutputStyle;

/// Compile settings for one compilation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SassConfig {
    pub output_style: Option<OutputStyle>,
    /// Digits after the decimal point. libsass defaults to 10.
    pub precision: Option<i32>,
    pub indent: Option<String>,
    pub linefeed: Option<String>,
    /// Emit `/* line N, file */` comments.
    pub source_comments: Option<bool>,
    pub source_map_embed: Option<bool>,
    pub source_map_contents: Option<bool>,
    pub omit_source_map_url: Option<bool>,
    /// Parse the input as the indented (`.sass`) syntax.
    pub indented_syntax: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub include_paths: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub plugin_paths: Vec<PathBuf>,
    pub input_path: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
    /// Setting this enables source map generation.
    pub source_map_file: Option<PathBuf>,
    pub source_map_root: Option<String>,
    /// List sources in the map as `file://` URLs.
    pub source_map_file_urls: Option<bool>,
}

impl SassConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Reading Sass config");
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Overlay `other` on `self`: set fields in `other` win, and its include and
    /// plugin paths are appended.
    pub fn merge(&mut self, other: SassConfig) {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if other.$field.is_some() {
                    self.$field = other.$field;
                })*
            };
        }
        take!(
            output_style,
            precision,
            indent,
            linefeed,
            source_comments,
            source_map_embed,
            source_map_contents,
            omit_source_map_url,
            indented_syntax,
            input_path,
            output_path,
            source_map_file,
            source_map_root,
            source_map_file_urls
        );
        self.include_paths.extend(other.include_paths);
        self.plugin_paths.extend(other.plugin_paths);
    }

    /// Write every set field into `options`. `indent` and `linefeed` are kept
    /// in `strings`, which must outlive `options`.
    ///
    /// # Safety
    ///
    /// `options` must be live.
    pub unsafe fn apply(&self, sass: &Sass, options: Options, strings: &mut OptionStrings) -> Result<()> {
        unsafe {
            if let Some(style) = self.output_style {
                sass.option_set_output_style(options, style);
            }
            if let Some(precision) = self.precision {
                sass.option_set_precision(options, precision);
            }
            if let Some(indent) = &self.indent {
                sass.option_set_indent(options, strings.hold("indent", indent)?);
            }
            if let Some(linefeed) = &self.linefeed {
                sass.option_set_linefeed(options, strings.hold("linefeed", linefeed)?);
            }
            if let Some(enabled) = self.source_comments {
                sass.option_set_source_comments(options, enabled);
            }
            if let Some(enabled) = self.source_map_embed {
                sass.option_set_source_map_embed(options, enabled);
            }
            if let Some(enabled) = self.source_map_contents {
                sass.option_set_source_map_contents(options, enabled);
            }
            if let Some(enabled) = self.omit_source_map_url {
                sass.option_set_omit_source_map_url(options, enabled);
            }
            if let Some(enabled) = self.indented_syntax {
                sass.option_set_is_indented_syntax_src(options, enabled);
            }
            for path in &self.include_paths {
                sass.option_push_include_path(options, path)?;
            }
            for path in &self.plugin_paths {
                sass.option_push_plugin_path(options, path)?;
            }
            if let Some(path) = &self.input_path {
                sass.option_set_input_path(options, path)?;
            }
            if let Some(path) = &self.output_path {
                sass.option_set_output_path(options, path)?;
            }
            if let Some(path) = &self.source_map_file {
                sass.option_set_source_map_file(options, path)?;
            }
            if let Some(root) = &self.source_map_root {
                sass.option_set_source_map_root(options, root)?;
            }
            if let Some(enabled) = self.source_map_file_urls {
                sass.option_set_source_map_file_urls(options, enabled);
            }
        }
        Ok(())
    }
}
