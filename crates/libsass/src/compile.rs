//! Owned compilations on top of the flat API.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! [`Compilation`] owns a file or data context together with the closures
//! registered on it, so the callbacks cannot be freed while libsass may still
//! call them. Compiling consumes it and returns either a [`CompileOutput`] or
//! a [`SassError::Compile`] describing the failure.
//!
//! ```rust,ignore
//! use libsass::{Compilation, Sass};
//!
//! let sass = Sass::load()?;
//! let mut compilation = Compilation::data(sass, "a { b: double(2px) }")?;
//! compilation.register_function("double($x)", |sass, args, _| unsafe {
//!     let x = sass.list_get_value(args, 0);
//!     let unit = sass.number_get_unit(x).unwrap_or_default();
//!     sass.make_number(sass.number_get_value(x) * 2.0, &unit).unwrap_or_default()
//! })?;
//! let output = compilation.compile()?;
//! assert!(output.css.contains("b: 4px"));
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::callback::CallbackStore;
use crate::config::SassConfig;
use crate::error::{Result, SassError};
use crate::handle::{Compiler, Context, DataContext, FileContext, FunctionEntry, ImportList, ImporterEntry, Options, Value};
use crate::library::Sass;
use crate::options::OptionStrings;
use crate::types::{CompilerState, OutputStyle, Status};

/// The JSON document returned by `context_get_error_json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorJson {
    pub status: i32,
    pub file: Option<String>,
    pub line: Option<usize>,
    pub column: Option<usize>,
    pub message: String,
    pub formatted: Option<String>,
}

impl ErrorJson {
    pub fn parse(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Everything libsass reported about a failed compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileFailure {
    pub status: Status,
    pub message: String,
    /// Message with the offending source excerpt, as libsass prints it.
    pub formatted: Option<String>,
    pub file: Option<PathBuf>,
    /// Full source text of `file`.
    pub source: Option<String>,
    pub line: usize,
    pub column: usize,
    pub json: Option<ErrorJson>,
}

impl fmt::Display for CompileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = self.message.trim_end();
        match &self.file {
            Some(file) => write!(f, "{}:{}:{}: {message}", file.display(), self.line, self.column),
            None => write!(f, "Sass compilation failed ({}): {message}", self.status),
        }
    }
}

impl From<CompileFailure> for SassError {
    fn from(failure: CompileFailure) -> Self {
        SassError::Compile(Box::new(failure))
    }
}

impl Sass {
    /// Collect the error accessors of `ctx` into a [`CompileFailure`].
    ///
    /// `status` is the value returned by the failed call. The context's own
    /// error status takes precedence when it is set.
    ///
    /// # Safety
    ///
    /// `ctx` must be live.
    pub unsafe fn context_get_failure(&self, ctx: Context, status: Status) -> CompileFailure {
        unsafe {
            let context_status = self.context_get_error_status(ctx);
            let json = self.context_get_error_json(ctx).and_then(|json| {
                ErrorJson::parse(&json)
                    .inspect_err(|err| debug!(error = %err, "Unparseable libsass error JSON"))
                    .ok()
            });
            CompileFailure {
                status: if context_status.is_success() { status } else { context_status },
                message: self.context_get_error_message(ctx).unwrap_or_default(),
                formatted: self.context_get_error_text(ctx),
                file: self.context_get_error_file(ctx).map(PathBuf::from),
                source: self.context_get_error_src(ctx),
                line: self.context_get_error_line(ctx),
                column: self.context_get_error_column(ctx),
                json,
            }
        }
    }
}

/// The result of a successful compilation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileOutput {
    pub css: String,
    /// Present when a source map file was configured.
    pub source_map: Option<String>,
    /// Every file read, the entry file first.
    pub included_files: Vec<PathBuf>,
}

#[derive(Debug, Clone, Copy)]
enum Job {
    File(FileContext),
    Data(DataContext),
}

/// A file or data compilation with its options and callbacks.
///
/// Dropping a `Compilation` deletes its context and any callback entries that
/// were registered but never installed.
pub struct Compilation {
    sass: Sass,
    job: Job,
    strings: OptionStrings,
    callbacks: CallbackStore,
    functions: Vec<FunctionEntry>,
    importers: Vec<ImporterEntry>,
    headers: Vec<ImporterEntry>,
}

impl Compilation {
    /// Compile `source` held in memory.
    pub fn data(sass: Sass, source: impl AsRef<[u8]>) -> Result<Self> {
        let ctx = sass.make_data_context(source.as_ref())?;
        Ok(Self::new(sass, Job::Data(ctx)))
    }

    /// Compile the file at `path`. The file is read by libsass when compiling.
    pub fn file(sass: Sass, path: impl AsRef<Path>) -> Result<Self> {
        let ctx = sass.make_file_context(path.as_ref())?;
        Ok(Self::new(sass, Job::File(ctx)))
    }

    fn new(sass: Sass, job: Job) -> Self {
        Self {
            sass,
            job,
            strings: OptionStrings::new(),
            callbacks: CallbackStore::new(),
            functions: Vec::new(),
            importers: Vec::new(),
            headers: Vec::new(),
        }
    }

    pub fn sass(&self) -> Sass {
        self.sass
    }

    /// The context's options, for settings not covered by [`SassConfig`].
    pub fn options(&self) -> Options {
        // SAFETY: the context is owned by self
        unsafe {
            match self.job {
                Job::File(ctx) => self.sass.file_context_get_options(ctx),
                Job::Data(ctx) => self.sass.data_context_get_options(ctx),
            }
        }
    }

    pub fn context(&self) -> Context {
        // SAFETY: the context is owned by self
        unsafe {
            match self.job {
                Job::File(ctx) => self.sass.file_context_get_context(ctx),
                Job::Data(ctx) => self.sass.data_context_get_context(ctx),
            }
        }
    }

    pub fn configure(&mut self, config: &SassConfig) -> Result<()> {
        let options = self.options();
        // SAFETY: the options belong to our context, and held strings live as
        // long as self
        unsafe { config.apply(&self.sass, options, &mut self.strings) }
    }

    pub fn set_output_style(&mut self, style: OutputStyle) {
        // SAFETY: the options belong to our context
        unsafe { self.sass.option_set_output_style(self.options(), style) }
    }

    pub fn set_precision(&mut self, precision: i32) {
        // SAFETY: the options belong to our context
        unsafe { self.sass.option_set_precision(self.options(), precision) }
    }

    /// Register a custom function such as `"double($x)"`.
    /// See [`CallbackStore::function`].
    pub fn register_function<F>(&mut self, signature: &str, callback: F) -> Result<()>
    where
        F: Fn(&Sass, Value, Compiler) -> Value + 'static,
    {
        let entry = self.callbacks.function(&self.sass, signature, callback)?;
        self.functions.push(entry);
        Ok(())
    }

    /// Register an importer consulted for every `@import`.
    /// See [`CallbackStore::importer`].
    pub fn register_importer<F>(&mut self, priority: f64, callback: F)
    where
        F: Fn(&Sass, &str, Compiler) -> Option<ImportList> + 'static,
    {
        let entry = self.callbacks.importer(&self.sass, priority, callback);
        self.importers.push(entry);
    }

    /// Register a header importer. Headers are consulted once, before the
    /// entry file, and their imports are prepended to it.
    pub fn register_header<F>(&mut self, priority: f64, callback: F)
    where
        F: Fn(&Sass, &str, Compiler) -> Option<ImportList> + 'static,
    {
        let entry = self.callbacks.importer(&self.sass, priority, callback);
        self.headers.push(entry);
    }

    /// Parse and execute in one native call.
    pub fn compile(mut self) -> Result<CompileOutput> {
        self.install_callbacks();
        debug!(callbacks = self.callbacks.len(), "Compiling Sass");
        // SAFETY: the context and the callback store are owned by self
        let status = unsafe {
            match self.job {
                Job::File(ctx) => self.sass.compile_file_context(ctx),
                Job::Data(ctx) => self.sass.compile_data_context(ctx),
            }
        };
        self.finish(status)
    }

    /// Compile through a [`Compiler`], one phase at a time.
    pub fn compile_staged(mut self) -> Result<CompileOutput> {
        self.install_callbacks();
        let sass = self.sass;
        // SAFETY: the context outlives the compiler, which is deleted by the
        // guard before self is dropped
        let compiler = CompilerGuard {
            sass,
            compiler: unsafe {
                match self.job {
                    Job::File(ctx) => sass.make_file_compiler(ctx),
                    Job::Data(ctx) => sass.make_data_compiler(ctx),
                }
            },
        };

        unsafe {
            let status = sass.compiler_parse(compiler.compiler);
            if !status.is_success() {
                return self.finish(status);
            }
            debug!(
                state = ?sass.compiler_get_state(compiler.compiler).ok(),
                imports = sass.compiler_get_import_stack_size(compiler.compiler),
                "Parsed"
            );
            let status = sass.compiler_execute(compiler.compiler);
            if matches!(sass.compiler_get_state(compiler.compiler), Ok(CompilerState::Executed)) {
                debug!("Executed");
            }
            self.finish(status)
        }
    }

    fn install_callbacks(&mut self) {
        let sass = self.sass;
        let options = self.options();
        // SAFETY: each list is sized to its entries and handed to our own
        // options, which free it together with the context. The closures
        // live in self.callbacks, which outlives the context.
        unsafe {
            if !self.functions.is_empty() {
                let list = sass.make_function_list(self.functions.len());
                for (index, entry) in self.functions.drain(..).enumerate() {
                    sass.function_set_list_entry(list, index, entry);
                }
                sass.option_set_c_functions(options, list);
            }
            if !self.importers.is_empty() {
                let list = sass.make_importer_list(self.importers.len());
                for (index, entry) in self.importers.drain(..).enumerate() {
                    sass.importer_set_list_entry(list, index, entry);
                }
                sass.option_set_c_importers(options, list);
            }
            if !self.headers.is_empty() {
                let list = sass.make_importer_list(self.headers.len());
                for (index, entry) in self.headers.drain(..).enumerate() {
                    sass.importer_set_list_entry(list, index, entry);
                }
                sass.option_set_c_headers(options, list);
            }
        }
    }

    fn finish(&self, status: Status) -> Result<CompileOutput> {
        let sass = self.sass;
        let ctx = self.context();
        // SAFETY: the context is owned by self
        unsafe {
            let context_status = sass.context_get_error_status(ctx);
            if !status.is_success() || !context_status.is_success() {
                let failure = sass.context_get_failure(ctx, status);
                warn!(status = %failure.status, message = %failure.message, "Sass compilation failed");
                return Err(failure.into());
            }
            let css = sass
                .context_take_output_string(ctx)
                .map_or_else(String::new, |css| css.to_string_lossy().into_owned());
            let source_map = sass
                .context_take_source_map_string(ctx)
                .map(|map| map.to_string_lossy().into_owned());
            let included_files = sass.context_get_included_files(ctx);
            info!(
                bytes = css.len(),
                included = included_files.len(),
                "Sass compilation succeeded"
            );
            Ok(CompileOutput {
                css,
                source_map,
                included_files,
            })
        }
    }
}

impl Drop for Compilation {
    fn drop(&mut self) {
        let sass = self.sass;
        // SAFETY: pending entries were never installed, and the context is
        // owned by self with no compiler left on it
        unsafe {
            for entry in self.functions.drain(..) {
                sass.delete_function(entry);
            }
            for entry in self.importers.drain(..).chain(self.headers.drain(..)) {
                sass.delete_importer(entry);
            }
            match self.job {
                Job::File(ctx) => sass.delete_file_context(ctx),
                Job::Data(ctx) => sass.delete_data_context(ctx),
            }
        }
    }
}

impl fmt::Debug for Compilation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compilation")
            .field("job", &self.job)
            .field("callbacks", &self.callbacks)
            .finish_non_exhaustive()
    }
}

struct CompilerGuard {
    sass: Sass,
    compiler: Compiler,
}

impl Drop for CompilerGuard {
    fn drop(&mut self) {
        // SAFETY: created in compile_staged and not shared
        unsafe { self.sass.delete_compiler(self.compiler) }
    }
}
