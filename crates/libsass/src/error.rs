//! Error types for the libsass binding.
//!
//! Copyright (c) 2025 Posit, PBC

use std::ffi::NulError;
use std::path::PathBuf;

use thiserror::Error;

use crate::compile::CompileFailure;

/// Errors surfaced by the binding.
///
/// Native failures are reported as data: a failed compilation becomes
/// [`SassError::Compile`] carrying everything libsass reported about it.
/// Misuse of handles (wrong tag, destroyed handle, invalid compiler state)
/// is not detected here; those are `unsafe` preconditions.
#[derive(Debug, Error)]
pub enum SassError {
    /// The shared library could not be opened, or a symbol was missing
    #[error("Failed to load libsass from {}: {source}", path.display())]
    LibraryLoad {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    /// A string or buffer argument cannot be passed as a C string
    #[error("{what} contains an interior NUL byte at offset {position}")]
    InteriorNul { what: &'static str, position: usize },

    /// libsass returned an enum value this binding does not know
    #[error("Unknown {kind} value {value} returned by libsass")]
    UnknownDiscriminant { kind: &'static str, value: i32 },

    /// `sass_alloc_memory` returned null
    #[error("libsass could not allocate {size} bytes")]
    OutOfMemory { size: usize },

    /// Compilation finished with a non-zero status
    #[error("{0}")]
    Compile(Box<CompileFailure>),

    /// Configuration file could not be parsed
    #[error("Invalid sass configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// Configuration or input file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SassError {
    pub fn interior_nul(what: &'static str, source: NulError) -> Self {
        Self::InteriorNul {
            what,
            position: source.nul_position(),
        }
    }

    pub fn unknown_discriminant(kind: &'static str, value: i32) -> Self {
        Self::UnknownDiscriminant { kind, value }
    }

    /// The compilation failure, if this is one.
    pub fn as_compile_failure(&self) -> Option<&CompileFailure> {
        match self {
            Self::Compile(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Result type for binding operations
pub type Result<T> = std::result::Result<T, SassError>;
