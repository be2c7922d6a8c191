//! Loading libsass and the [`Sass`] entry point.
//!
//! Copyright (c) 2025 Posit, PBC

use std::fmt;
use std::path::{Path, PathBuf};

use libsass_sys::{SassLibrary, default_library_name};
use once_cell::sync::OnceCell;
use tracing::debug;

use crate::error::{Result, SassError};
use crate::memory::borrowed_string;

/// Environment variable naming the libsass shared library to load.
pub const LIBRARY_PATH_ENV: &str = "LIBSASS_PATH";

/// The process-wide symbol table. The first successful load wins.
static LIBRARY: OnceCell<SassLibrary> = OnceCell::new();

/// Path used by [`Sass::load`]: `$LIBSASS_PATH` if set, otherwise the platform
/// library name, resolved through the dynamic loader's search path.
pub fn default_library_path() -> PathBuf {
    std::env::var_os(LIBRARY_PATH_ENV)
        .filter(|path| !path.is_empty())
        .map_or_else(|| PathBuf::from(default_library_name()), PathBuf::from)
}

/// Handle to the loaded libsass library.
///
/// Every native entry point is a method on this type, grouped by the handle
/// kind it operates on (values, importers, imports, functions, contexts,
/// compilers, options). `Sass` is a cheap copyable reference to a table that
/// lives for the rest of the process.
///
/// Most methods are `unsafe`: libsass does not check its handles, so passing a
/// destroyed handle, a value of the wrong tag, or an index out of range is
/// undefined behaviour. Those preconditions are listed on each method and are
/// not validated by the binding.
#[derive(Clone, Copy)]
pub struct Sass {
    lib: &'static SassLibrary,
}

impl Sass {
    /// Load libsass from [`default_library_path`].
    pub fn load() -> Result<Self> {
        Self::load_from(default_library_path())
    }

    /// Load libsass from `path`.
    ///
    /// Only one library is loaded per process. Once a load has succeeded, later
    /// calls return that library regardless of `path`.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let lib = LIBRARY.get_or_try_init(|| {
            debug!(path = %path.display(), "Loading libsass");
            // SAFETY: libsass only runs C++ static initializers on load, and the
            // declared signatures follow its public headers.
            unsafe { SassLibrary::open(path) }.map_err(|source| SassError::LibraryLoad {
                path: path.to_path_buf(),
                source,
            })
        })?;
        Ok(Self { lib })
    }

    /// Use an entry-point table built without a shared library, e.g. with
    /// [`SassLibrary::from_symbols`].
    ///
    /// The same first-wins rule as [`Sass::load_from`] applies: if a library is
    /// already in place, `library` is dropped and the existing one is returned.
    pub fn install(library: SassLibrary) -> Self {
        let lib = LIBRARY.get_or_init(|| {
            debug!("Installing in-process libsass table");
            library
        });
        Self { lib }
    }

    /// The library loaded earlier in this process, if any.
    pub fn loaded() -> Option<Self> {
        LIBRARY.get().map(|lib| Self { lib })
    }

    /// The raw entry-point table.
    pub fn raw(&self) -> &'static SassLibrary {
        self.lib
    }

    /// `libsass_version`
    pub fn version(&self) -> String {
        // SAFETY: returns a static string
        unsafe { borrowed_string((self.lib.libsass_version)()) }.unwrap_or_default()
    }

    /// `libsass_language_version`
    pub fn language_version(&self) -> String {
        // SAFETY: returns a static string
        unsafe { borrowed_string((self.lib.libsass_language_version)()) }.unwrap_or_default()
    }
}

impl fmt::Debug for Sass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sass").field("lib", self.lib).finish()
    }
}
