//! Compile options (`sass/context.h`).
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! Path and source-map strings are copied by libsass when set. `indent` and
//! `linefeed` are not: libsass keeps the pointer, so the caller keeps the
//! string alive in an [`OptionStrings`] for as long as the options are in use.
//!
//! Importer and function lists installed with the `set_c_*` setters are owned
//! by the options from then on and freed with the owning context.

use std::ffi::{CStr, CString};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::handle::{FunctionList, ImporterList, Options};
use crate::library::Sass;
use crate::memory::{borrowed_path, borrowed_string, c_string, path_c_string};
use crate::types::OutputStyle;

/// Strings libsass borrows from the caller instead of copying.
///
/// Keep this alive until every [`Options`] the strings were installed into has
/// been deleted.
#[derive(Debug, Default)]
pub struct OptionStrings {
    held: Vec<CString>,
}

impl OptionStrings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep a NUL-terminated copy of `value` and return it. The returned string
    /// stays at the same address until `self` is dropped.
    pub fn hold(&mut self, what: &'static str, value: &str) -> Result<&CStr> {
        self.held.push(c_string(what, value)?);
        Ok(self.held.last().map(CString::as_c_str).unwrap_or_default())
    }

    pub fn len(&self) -> usize {
        self.held.len()
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }
}

impl Sass {
    // Getters

    /// # Safety
    ///
    /// `options` must be live.
    pub unsafe fn option_get_precision(&self, options: Options) -> i32 {
        unsafe { (self.raw().sass_option_get_precision)(options.as_raw()) }
    }

    /// # Safety
    ///
    /// `options` must be live.
    pub unsafe fn option_get_output_style(&self, options: Options) -> Result<OutputStyle> {
        OutputStyle::try_from(unsafe { (self.raw().sass_option_get_output_style)(options.as_raw()) })
    }

    /// # Safety
    ///
    /// `options` must be live.
    pub unsafe fn option_get_source_comments(&self, options: Options) -> bool {
        unsafe { (self.raw().sass_option_get_source_comments)(options.as_raw()) }
    }

    /// # Safety
    ///
    /// `options` must be live.
    pub unsafe fn option_get_source_map_embed(&self, options: Options) -> bool {
        unsafe { (self.raw().sass_option_get_source_map_embed)(options.as_raw()) }
    }

    /// # Safety
    ///
    /// `options` must be live.
    pub unsafe fn option_get_source_map_contents(&self, options: Options) -> bool {
        unsafe { (self.raw().sass_option_get_source_map_contents)(options.as_raw()) }
    }

    /// # Safety
    ///
    /// `options` must be live.
    pub unsafe fn option_get_omit_source_map_url(&self, options: Options) -> bool {
        unsafe { (self.raw().sass_option_get_omit_source_map_url)(options.as_raw()) }
    }

    /// # Safety
    ///
    /// `options` must be live.
    pub unsafe fn option_get_is_indented_syntax_src(&self, options: Options) -> bool {
        unsafe { (self.raw().sass_option_get_is_indented_syntax_src)(options.as_raw()) }
    }

    /// # Safety
    ///
    /// `options` must be live.
    pub unsafe fn option_get_indent(&self, options: Options) -> Option<String> {
        unsafe { borrowed_string((self.raw().sass_option_get_indent)(options.as_raw())) }
    }

    /// # Safety
    ///
    /// `options` must be live.
    pub unsafe fn option_get_linefeed(&self, options: Options) -> Option<String> {
        unsafe { borrowed_string((self.raw().sass_option_get_linefeed)(options.as_raw())) }
    }

    /// # Safety
    ///
    /// `options` must be live.
    pub unsafe fn option_get_input_path(&self, options: Options) -> Option<PathBuf> {
        unsafe { borrowed_path((self.raw().sass_option_get_input_path)(options.as_raw())) }
    }

    /// # Safety
    ///
    /// `options` must be live.
    pub unsafe fn option_get_output_path(&self, options: Options) -> Option<PathBuf> {
        unsafe { borrowed_path((self.raw().sass_option_get_output_path)(options.as_raw())) }
    }

    /// The raw plugin path string as last set (may hold several paths joined by
    /// the platform separator).
    ///
    /// # Safety
    ///
    /// `options` must be live.
    pub unsafe fn option_get_plugin_path(&self, options: Options) -> Option<String> {
        unsafe { borrowed_string((self.raw().sass_option_get_plugin_path)(options.as_raw())) }
    }

    /// Number of include paths, counting every pushed path.
    ///
    /// # Safety
    ///
    /// `options` must be live.
    pub unsafe fn option_get_include_path_size(&self, options: Options) -> usize {
        unsafe { (self.raw().sass_option_get_include_path_size)(options.as_raw()) }
    }

    /// Include path `index`, in push order.
    ///
    /// # Safety
    ///
    /// `options` must be live and `index` less than
    /// [`Sass::option_get_include_path_size`].
    pub unsafe fn option_get_include_path(&self, options: Options, index: usize) -> Option<PathBuf> {
        unsafe { borrowed_path((self.raw().sass_option_get_include_path)(options.as_raw(), index)) }
    }

    /// Every include path, in push order.
    ///
    /// # Safety
    ///
    /// `options` must be live.
    pub unsafe fn option_get_include_paths(&self, options: Options) -> Vec<PathBuf> {
        let size = unsafe { self.option_get_include_path_size(options) };
        (0..size)
            .filter_map(|index| unsafe { self.option_get_include_path(options, index) })
            .collect()
    }

    /// # Safety
    ///
    /// `options` must be live.
    pub unsafe fn option_get_source_map_file(&self, options: Options) -> Option<PathBuf> {
        unsafe { borrowed_path((self.raw().sass_option_get_source_map_file)(options.as_raw())) }
    }

    /// # Safety
    ///
    /// `options` must be live.
    pub unsafe fn option_get_source_map_root(&self, options: Options) -> Option<String> {
        unsafe { borrowed_string((self.raw().sass_option_get_source_map_root)(options.as_raw())) }
    }

    /// # Safety
    ///
    /// `options` must be live.
    pub unsafe fn option_get_source_map_file_urls(&self, options: Options) -> bool {
        unsafe { (self.raw().sass_option_get_source_map_file_urls)(options.as_raw()) }
    }

    /// Borrowed from the options.
    ///
    /// # Safety
    ///
    /// `options` must be live.
    pub unsafe fn option_get_c_headers(&self, options: Options) -> ImporterList {
        ImporterList::from_raw(unsafe { (self.raw().sass_option_get_c_headers)(options.as_raw()) })
    }

    /// Borrowed from the options.
    ///
    /// # Safety
    ///
    /// `options` must be live.
    pub unsafe fn option_get_c_importers(&self, options: Options) -> ImporterList {
        ImporterList::from_raw(unsafe { (self.raw().sass_option_get_c_importers)(options.as_raw()) })
    }

    /// Borrowed from the options.
    ///
    /// # Safety
    ///
    /// `options` must be live.
    pub unsafe fn option_get_c_functions(&self, options: Options) -> FunctionList {
        FunctionList::from_raw(unsafe { (self.raw().sass_option_get_c_functions)(options.as_raw()) })
    }

    // Setters

    /// Digits after the decimal point in emitted numbers. libsass defaults to 10.
    ///
    /// # Safety
    ///
    /// `options` must be live.
    pub unsafe fn option_set_precision(&self, options: Options, precision: i32) {
        unsafe { (self.raw().sass_option_set_precision)(options.as_raw(), precision) }
    }

    /// # Safety
    ///
    /// `options` must be live.
    pub unsafe fn option_set_output_style(&self, options: Options, style: OutputStyle) {
        unsafe { (self.raw().sass_option_set_output_style)(options.as_raw(), style.as_raw()) }
    }

    /// Emit `/* line N, file */` comments.
    ///
    /// # Safety
    ///
    /// `options` must be live.
    pub unsafe fn option_set_source_comments(&self, options: Options, enabled: bool) {
        unsafe { (self.raw().sass_option_set_source_comments)(options.as_raw(), enabled) }
    }

    /// # Safety
    ///
    /// `options` must be live.
    pub unsafe fn option_set_source_map_embed(&self, options: Options, enabled: bool) {
        unsafe { (self.raw().sass_option_set_source_map_embed)(options.as_raw(), enabled) }
    }

    /// # Safety
    ///
    /// `options` must be live.
    pub unsafe fn option_set_source_map_contents(&self, options: Options, enabled: bool) {
        unsafe { (self.raw().sass_option_set_source_map_contents)(options.as_raw(), enabled) }
    }

    /// # Safety
    ///
    /// `options` must be live.
    pub unsafe fn option_set_omit_source_map_url(&self, options: Options, enabled: bool) {
        unsafe { (self.raw().sass_option_set_omit_source_map_url)(options.as_raw(), enabled) }
    }

    /// Treat the input as the indented (`.sass`) syntax.
    ///
    /// # Safety
    ///
    /// `options` must be live.
    pub unsafe fn option_set_is_indented_syntax_src(&self, options: Options, enabled: bool) {
        unsafe { (self.raw().sass_option_set_is_indented_syntax_src)(options.as_raw(), enabled) }
    }

    /// libsass stores the pointer without copying.
    ///
    /// # Safety
    ///
    /// `options` must be live and `indent` must outlive it, e.g. by holding it
    /// in an [`OptionStrings`].
    pub unsafe fn option_set_indent(&self, options: Options, indent: &CStr) {
        unsafe { (self.raw().sass_option_set_indent)(options.as_raw(), indent.as_ptr()) }
    }

    /// libsass stores the pointer without copying.
    ///
    /// # Safety
    ///
    /// Same as [`Sass::option_set_indent`].
    pub unsafe fn option_set_linefeed(&self, options: Options, linefeed: &CStr) {
        unsafe { (self.raw().sass_option_set_linefeed)(options.as_raw(), linefeed.as_ptr()) }
    }

    /// # Safety
    ///
    /// `options` must be live.
    pub unsafe fn option_set_input_path(&self, options: Options, path: &Path) -> Result<()> {
        let path = path_c_string("input path", path)?;
        unsafe { (self.raw().sass_option_set_input_path)(options.as_raw(), path.as_ptr()) };
        Ok(())
    }

    /// Only used to compute relative URLs in the source map; nothing is written.
    ///
    /// # Safety
    ///
    /// `options` must be live.
    pub unsafe fn option_set_output_path(&self, options: Options, path: &Path) -> Result<()> {
        let path = path_c_string("output path", path)?;
        unsafe { (self.raw().sass_option_set_output_path)(options.as_raw(), path.as_ptr()) };
        Ok(())
    }

    /// Replace the plugin path string. Several directories may be joined with
    /// the platform path separator.
    ///
    /// # Safety
    ///
    /// `options` must be live.
    pub unsafe fn option_set_plugin_path(&self, options: Options, path: &str) -> Result<()> {
        let path = c_string("plugin path", path)?;
        unsafe { (self.raw().sass_option_set_plugin_path)(options.as_raw(), path.as_ptr()) };
        Ok(())
    }

    /// Replace the include path string. Several directories may be joined with
    /// the platform path separator.
    ///
    /// # Safety
    ///
    /// `options` must be live.
    pub unsafe fn option_set_include_path(&self, options: Options, path: &str) -> Result<()> {
        let path = c_string("include path", path)?;
        unsafe { (self.raw().sass_option_set_include_path)(options.as_raw(), path.as_ptr()) };
        Ok(())
    }

    /// Enables source map generation. The map is returned through
    /// `context_get_source_map_string`, never written to disk by libsass.
    ///
    /// # Safety
    ///
    /// `options` must be live.
    pub unsafe fn option_set_source_map_file(&self, options: Options, path: &Path) -> Result<()> {
        let path = path_c_string("source map file", path)?;
        unsafe { (self.raw().sass_option_set_source_map_file)(options.as_raw(), path.as_ptr()) };
        Ok(())
    }

    /// # Safety
    ///
    /// `options` must be live.
    pub unsafe fn option_set_source_map_root(&self, options: Options, root: &str) -> Result<()> {
        let root = c_string("source map root", root)?;
        unsafe { (self.raw().sass_option_set_source_map_root)(options.as_raw(), root.as_ptr()) };
        Ok(())
    }

    /// Write `file://` URLs for the sources listed in the source map instead
    /// of paths relative to it.
    ///
    /// # Safety
    ///
    /// `options` must be live.
    pub unsafe fn option_set_source_map_file_urls(&self, options: Options, enabled: bool) {
        unsafe { (self.raw().sass_option_set_source_map_file_urls)(options.as_raw(), enabled) }
    }

    /// Install header importers. The options take ownership of `list`.
    ///
    /// # Safety
    ///
    /// `options` must be live, `list` must not be installed anywhere else, and
    /// every callback in it must outlive the options.
    pub unsafe fn option_set_c_headers(&self, options: Options, list: ImporterList) {
        unsafe { (self.raw().sass_option_set_c_headers)(options.as_raw(), list.as_raw()) }
    }

    /// Install importers. The options take ownership of `list`.
    ///
    /// # Safety
    ///
    /// Same as [`Sass::option_set_c_headers`].
    pub unsafe fn option_set_c_importers(&self, options: Options, list: ImporterList) {
        unsafe { (self.raw().sass_option_set_c_importers)(options.as_raw(), list.as_raw()) }
    }

    /// Install custom functions. The options take ownership of `list`.
    ///
    /// # Safety
    ///
    /// Same as [`Sass::option_set_c_headers`].
    pub unsafe fn option_set_c_functions(&self, options: Options, list: FunctionList) {
        unsafe { (self.raw().sass_option_set_c_functions)(options.as_raw(), list.as_raw()) }
    }

    /// Append one include path. The string is copied.
    ///
    /// # Safety
    ///
    /// `options` must be live.
    pub unsafe fn option_push_include_path(&self, options: Options, path: &Path) -> Result<()> {
        let path = path_c_string("include path", path)?;
        unsafe { (self.raw().sass_option_push_include_path)(options.as_raw(), path.as_ptr()) };
        Ok(())
    }

    /// Append one plugin directory. libsass loads the plugins it finds there
    /// when the compiler is created.
    ///
    /// # Safety
    ///
    /// `options` must be live.
    pub unsafe fn option_push_plugin_path(&self, options: Options, path: &Path) -> Result<()> {
        let path = path_c_string("plugin path", path)?;
        unsafe { (self.raw().sass_option_push_plugin_path)(options.as_raw(), path.as_ptr()) };
        Ok(())
    }
}
