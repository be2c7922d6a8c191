//! File and data contexts and their results (`sass/context.h`).
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! A [`FileContext`] or [`DataContext`] is owned by whoever made it and must be
//! deleted explicitly. The [`Context`] and [`Options`] reachable from it are
//! borrowed and die with it.
//!
//! Result strings come in two flavours:
//! - `context_get_*` copies a string the context still owns;
//! - `context_take_*` moves the string out, leaving the context's field null.

use std::path::{Path, PathBuf};

use libsass_sys::c_char;
use tracing::debug;

use crate::error::Result;
use crate::handle::{Context, DataContext, FileContext, Options};
use crate::library::Sass;
use crate::memory::{NativeString, borrowed_path, borrowed_string, path_c_string};
use crate::types::Status;

impl Sass {
    /// `sass_make_options`: a standalone option set, copied into a context with
    /// [`Sass::file_context_set_options`] or [`Sass::data_context_set_options`].
    pub fn make_options(&self) -> Options {
        Options::from_raw(unsafe { (self.raw().sass_make_options)() })
    }

    /// # Safety
    ///
    /// `options` must come from [`Sass::make_options`] and not be used afterwards.
    pub unsafe fn delete_options(&self, options: Options) {
        unsafe { (self.raw().sass_delete_options)(options.as_raw()) }
    }

    /// `sass_make_file_context`: a compilation of the file at `input_path`.
    pub fn make_file_context(&self, input_path: &Path) -> Result<FileContext> {
        let path = path_c_string("input path", input_path)?;
        debug!(path = %input_path.display(), "Creating file context");
        Ok(FileContext::from_raw(unsafe {
            (self.raw().sass_make_file_context)(path.as_ptr())
        }))
    }

    /// `sass_make_data_context`: a compilation of `source`.
    ///
    /// The source is copied into libsass memory and the context takes ownership
    /// of the copy. libsass reads it as a C string, so a source holding a NUL
    /// byte is rejected with [`SassError::InteriorNul`](crate::SassError::InteriorNul).
    pub fn make_data_context(&self, source: &[u8]) -> Result<DataContext> {
        let buffer = self.alloc_buffer("source", source)?;
        debug!(bytes = source.len(), "Creating data context");
        Ok(DataContext::from_raw(unsafe {
            (self.raw().sass_make_data_context)(buffer)
        }))
    }

    /// `sass_compile_file_context`: parse and execute in one call.
    ///
    /// # Safety
    ///
    /// `ctx` must be live, and every callback registered in its options must
    /// still be alive.
    pub unsafe fn compile_file_context(&self, ctx: FileContext) -> Status {
        Status::from_raw(unsafe { (self.raw().sass_compile_file_context)(ctx.as_raw()) })
    }

    /// `sass_compile_data_context`: parse and execute in one call.
    ///
    /// # Safety
    ///
    /// Same as [`Sass::compile_file_context`].
    pub unsafe fn compile_data_context(&self, ctx: DataContext) -> Status {
        Status::from_raw(unsafe { (self.raw().sass_compile_data_context)(ctx.as_raw()) })
    }

    /// Frees the context, its options and any importer/function lists installed
    /// in them.
    ///
    /// # Safety
    ///
    /// `ctx` must be live, have no compiler still using it, and not be used afterwards.
    pub unsafe fn delete_file_context(&self, ctx: FileContext) {
        unsafe { (self.raw().sass_delete_file_context)(ctx.as_raw()) }
    }

    /// # Safety
    ///
    /// Same as [`Sass::delete_file_context`].
    pub unsafe fn delete_data_context(&self, ctx: DataContext) {
        unsafe { (self.raw().sass_delete_data_context)(ctx.as_raw()) }
    }

    /// The shared result view, borrowed from `ctx`.
    ///
    /// # Safety
    ///
    /// `ctx` must be live.
    pub unsafe fn file_context_get_context(&self, ctx: FileContext) -> Context {
        Context::from_raw(unsafe { (self.raw().sass_file_context_get_context)(ctx.as_raw()) })
    }

    /// The shared result view, borrowed from `ctx`.
    ///
    /// # Safety
    ///
    /// `ctx` must be live.
    pub unsafe fn data_context_get_context(&self, ctx: DataContext) -> Context {
        Context::from_raw(unsafe { (self.raw().sass_data_context_get_context)(ctx.as_raw()) })
    }

    /// Borrowed from `ctx`.
    ///
    /// # Safety
    ///
    /// `ctx` must be live.
    pub unsafe fn context_get_options(&self, ctx: Context) -> Options {
        Options::from_raw(unsafe { (self.raw().sass_context_get_options)(ctx.as_raw()) })
    }

    /// Borrowed from `ctx`.
    ///
    /// # Safety
    ///
    /// `ctx` must be live.
    pub unsafe fn file_context_get_options(&self, ctx: FileContext) -> Options {
        Options::from_raw(unsafe { (self.raw().sass_file_context_get_options)(ctx.as_raw()) })
    }

    /// Borrowed from `ctx`.
    ///
    /// # Safety
    ///
    /// `ctx` must be live.
    pub unsafe fn data_context_get_options(&self, ctx: DataContext) -> Options {
        Options::from_raw(unsafe { (self.raw().sass_data_context_get_options)(ctx.as_raw()) })
    }

    /// Move the settings in `options` into the context, replacing its own.
    ///
    /// libsass copies the struct shallowly and then resets `options`: the
    /// strings and lists it held now belong to the context, and `options` is
    /// left empty. Release it afterwards with [`Sass::delete_options`]. The
    /// `indent` and `linefeed` strings are still borrowed, so an
    /// [`OptionStrings`](crate::OptionStrings) holding them must outlive the
    /// context.
    ///
    /// # Safety
    ///
    /// `ctx` and `options` must be live.
    pub unsafe fn file_context_set_options(&self, ctx: FileContext, options: Options) {
        unsafe { (self.raw().sass_file_context_set_options)(ctx.as_raw(), options.as_raw()) }
    }

    /// # Safety
    ///
    /// Same as [`Sass::file_context_set_options`].
    pub unsafe fn data_context_set_options(&self, ctx: DataContext, options: Options) {
        unsafe { (self.raw().sass_data_context_set_options)(ctx.as_raw(), options.as_raw()) }
    }

    // Results

    /// Compiled CSS, borrowed and copied out. `None` before a successful
    /// compile or after [`Sass::context_take_output_string`].
    ///
    /// # Safety
    ///
    /// `ctx` must be live.
    pub unsafe fn context_get_output_string(&self, ctx: Context) -> Option<String> {
        unsafe { borrowed_string((self.raw().sass_context_get_output_string)(ctx.as_raw())) }
    }

    /// # Safety
    ///
    /// `ctx` must be live.
    pub unsafe fn context_get_error_status(&self, ctx: Context) -> Status {
        Status::from_raw(unsafe { (self.raw().sass_context_get_error_status)(ctx.as_raw()) })
    }

    /// Error details as JSON, borrowed and copied out.
    ///
    /// # Safety
    ///
    /// `ctx` must be live.
    pub unsafe fn context_get_error_json(&self, ctx: Context) -> Option<String> {
        unsafe { borrowed_string((self.raw().sass_context_get_error_json)(ctx.as_raw())) }
    }

    /// Formatted error with source excerpt, borrowed and copied out.
    ///
    /// # Safety
    ///
    /// `ctx` must be live.
    pub unsafe fn context_get_error_text(&self, ctx: Context) -> Option<String> {
        unsafe { borrowed_string((self.raw().sass_context_get_error_text)(ctx.as_raw())) }
    }

    /// # Safety
    ///
    /// `ctx` must be live.
    pub unsafe fn context_get_error_message(&self, ctx: Context) -> Option<String> {
        unsafe { borrowed_string((self.raw().sass_context_get_error_message)(ctx.as_raw())) }
    }

    /// # Safety
    ///
    /// `ctx` must be live.
    pub unsafe fn context_get_error_file(&self, ctx: Context) -> Option<String> {
        unsafe { borrowed_string((self.raw().sass_context_get_error_file)(ctx.as_raw())) }
    }

    /// Source text of the file the error occurred in.
    ///
    /// # Safety
    ///
    /// `ctx` must be live.
    pub unsafe fn context_get_error_src(&self, ctx: Context) -> Option<String> {
        unsafe { borrowed_string((self.raw().sass_context_get_error_src)(ctx.as_raw())) }
    }

    /// # Safety
    ///
    /// `ctx` must be live.
    pub unsafe fn context_get_error_line(&self, ctx: Context) -> usize {
        unsafe { (self.raw().sass_context_get_error_line)(ctx.as_raw()) }
    }

    /// # Safety
    ///
    /// `ctx` must be live.
    pub unsafe fn context_get_error_column(&self, ctx: Context) -> usize {
        unsafe { (self.raw().sass_context_get_error_column)(ctx.as_raw()) }
    }

    /// Source map JSON, borrowed and copied out. Only produced when a source
    /// map file is configured.
    ///
    /// # Safety
    ///
    /// `ctx` must be live.
    pub unsafe fn context_get_source_map_string(&self, ctx: Context) -> Option<String> {
        unsafe { borrowed_string((self.raw().sass_context_get_source_map_string)(ctx.as_raw())) }
    }

    /// # Safety
    ///
    /// `ctx` must be live.
    pub unsafe fn context_get_included_files_size(&self, ctx: Context) -> usize {
        unsafe { (self.raw().sass_context_get_included_files_size)(ctx.as_raw()) }
    }

    /// Every file read during compilation (the entry file first), copied out.
    ///
    /// # Safety
    ///
    /// `ctx` must be live.
    pub unsafe fn context_get_included_files(&self, ctx: Context) -> Vec<PathBuf> {
        unsafe {
            let size = self.context_get_included_files_size(ctx);
            let files = (self.raw().sass_context_get_included_files)(ctx.as_raw());
            collect_paths(files, size)
        }
    }

    /// Move the compiled CSS out of the context.
    ///
    /// # Safety
    ///
    /// `ctx` must be live.
    pub unsafe fn context_take_output_string(&self, ctx: Context) -> Option<NativeString> {
        unsafe {
            let ptr = (self.raw().sass_context_take_output_string)(ctx.as_raw());
            NativeString::from_raw(*self, ptr)
        }
    }

    /// Move the source map out of the context.
    ///
    /// # Safety
    ///
    /// `ctx` must be live.
    pub unsafe fn context_take_source_map_string(&self, ctx: Context) -> Option<NativeString> {
        unsafe {
            let ptr = (self.raw().sass_context_take_source_map_string)(ctx.as_raw());
            NativeString::from_raw(*self, ptr)
        }
    }

    /// Move the included-files array out of the context. The native array and
    /// its strings are freed after copying.
    ///
    /// # Safety
    ///
    /// `ctx` must be live.
    pub unsafe fn context_take_included_files(&self, ctx: Context) -> Vec<PathBuf> {
        unsafe {
            let size = self.context_get_included_files_size(ctx);
            let files = (self.raw().sass_context_take_included_files)(ctx.as_raw());
            if files.is_null() {
                return Vec::new();
            }
            let paths = collect_paths(files, size);
            for index in 0..size {
                let entry = *files.add(index);
                if entry.is_null() {
                    break;
                }
                self.free_memory(entry);
            }
            self.free_memory(files.cast());
            paths
        }
    }
}

/// Read a null-terminated `char**` of at most `size` entries.
unsafe fn collect_paths(files: *mut *mut c_char, size: usize) -> Vec<PathBuf> {
    if files.is_null() {
        return Vec::new();
    }
    let mut paths = Vec::with_capacity(size);
    for index in 0..size {
        let entry = unsafe { *files.add(index) };
        match unsafe { borrowed_path(entry) } {
            Some(path) => paths.push(path),
            None => break,
        }
    }
    paths
}
