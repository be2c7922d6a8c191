//! Two-phase compilation (`sass/context.h`).
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! A [`Compiler`] splits compilation into parse and execute:
//!
//! ```text
//! Created --parse--> Parsed --execute--> Executed
//! ```
//!
//! Each phase returns a [`Status`]. A failed phase leaves the error on the
//! compiler's [`Context`]; the compiler must be deleted either way. Calling
//! `compiler_execute` before a successful `compiler_parse` is not checked here
//! and its outcome is up to libsass.

use tracing::{debug, warn};

use crate::error::Result;
use crate::handle::{Compiler, Context, DataContext, FileContext, ImportEntry, Options};
use crate::library::Sass;
use crate::types::{CompilerState, Status};

impl Sass {
    /// `sass_make_file_compiler`. Plugins on the plugin path are loaded here.
    ///
    /// # Safety
    ///
    /// `ctx` must be live and outlive the compiler.
    pub unsafe fn make_file_compiler(&self, ctx: FileContext) -> Compiler {
        Compiler::from_raw(unsafe { (self.raw().sass_make_file_compiler)(ctx.as_raw()) })
    }

    /// `sass_make_data_compiler`. Plugins on the plugin path are loaded here.
    ///
    /// # Safety
    ///
    /// `ctx` must be live and outlive the compiler.
    pub unsafe fn make_data_compiler(&self, ctx: DataContext) -> Compiler {
        Compiler::from_raw(unsafe { (self.raw().sass_make_data_compiler)(ctx.as_raw()) })
    }

    /// Created → Parsed. Importers run during this phase.
    ///
    /// # Safety
    ///
    /// `compiler` must be live and in [`CompilerState::Created`], and every
    /// registered callback must still be alive.
    pub unsafe fn compiler_parse(&self, compiler: Compiler) -> Status {
        let status = Status::from_raw(unsafe { (self.raw().sass_compiler_parse)(compiler.as_raw()) });
        if status.is_success() {
            debug!("Sass compiler parsed");
        } else {
            warn!(%status, "Sass compiler parse failed");
        }
        status
    }

    /// Parsed → Executed. Custom functions run during this phase.
    ///
    /// # Safety
    ///
    /// `compiler` must be live and in [`CompilerState::Parsed`], and every
    /// registered callback must still be alive.
    pub unsafe fn compiler_execute(&self, compiler: Compiler) -> Status {
        let status = Status::from_raw(unsafe { (self.raw().sass_compiler_execute)(compiler.as_raw()) });
        if status.is_success() {
            debug!("Sass compiler executed");
        } else {
            warn!(%status, "Sass compiler execute failed");
        }
        status
    }

    /// Frees the compiler only. Its context stays alive.
    ///
    /// # Safety
    ///
    /// `compiler` must be live and not used afterwards.
    pub unsafe fn delete_compiler(&self, compiler: Compiler) {
        unsafe { (self.raw().sass_delete_compiler)(compiler.as_raw()) }
    }

    /// Always allowed on a live compiler.
    ///
    /// # Safety
    ///
    /// `compiler` must be live.
    pub unsafe fn compiler_get_state(&self, compiler: Compiler) -> Result<CompilerState> {
        CompilerState::try_from(unsafe { (self.raw().sass_compiler_get_state)(compiler.as_raw()) })
    }

    /// Borrowed from the compiler.
    ///
    /// # Safety
    ///
    /// `compiler` must be live.
    pub unsafe fn compiler_get_context(&self, compiler: Compiler) -> Context {
        Context::from_raw(unsafe { (self.raw().sass_compiler_get_context)(compiler.as_raw()) })
    }

    /// Borrowed from the compiler.
    ///
    /// # Safety
    ///
    /// `compiler` must be live.
    pub unsafe fn compiler_get_options(&self, compiler: Compiler) -> Options {
        Options::from_raw(unsafe { (self.raw().sass_compiler_get_options)(compiler.as_raw()) })
    }

    /// Depth of the import stack. Meaningful inside an importer or function
    /// callback; the entry file counts as the first import.
    ///
    /// # Safety
    ///
    /// `compiler` must be live.
    pub unsafe fn compiler_get_import_stack_size(&self, compiler: Compiler) -> usize {
        unsafe { (self.raw().sass_compiler_get_import_stack_size)(compiler.as_raw()) }
    }

    /// The import currently being processed, borrowed from the compiler.
    ///
    /// # Safety
    ///
    /// `compiler` must be live and its import stack non-empty.
    pub unsafe fn compiler_get_last_import(&self, compiler: Compiler) -> ImportEntry {
        ImportEntry::from_raw(unsafe { (self.raw().sass_compiler_get_last_import)(compiler.as_raw()) })
    }

    /// Import stack entry `index`, counted from the bottom, borrowed from the
    /// compiler.
    ///
    /// # Safety
    ///
    /// `compiler` must be live and `index` less than
    /// [`Sass::compiler_get_import_stack_size`].
    pub unsafe fn compiler_get_import_entry(&self, compiler: Compiler, index: usize) -> ImportEntry {
        ImportEntry::from_raw(unsafe {
            (self.raw().sass_compiler_get_import_entry)(compiler.as_raw(), index)
        })
    }
}
