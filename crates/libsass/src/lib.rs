/*
 * libsass
 * Copyright (c) 2025 Posit, PBC
 *
 * Typed binding to the libsass C library.
 *
 * Every native entry point is a method on `Sass`, grouped by the handle kind
 * it operates on. On top of that flat catalogue:
 *
 * - Handle newtypes keep the pointer categories apart (an ImporterList is not
 *   an ImportList)
 * - Native enums (Tag, Separator, OutputStyle, Op, CompilerState) are checked
 *   on the way back from libsass
 * - NativeString owns strings moved out of libsass by the `take` accessors
 * - CallbackStore turns Rust closures into importers and custom functions
 * - Compilation owns a context with its callbacks and reports failures as data
 */

mod callback;
mod compile;
mod compiler;
mod config;
mod context;
mod error;
mod function;
mod handle;
mod import;
mod library;
mod memory;
mod options;
mod types;
mod value;

// Entry point and loading
pub use library::{LIBRARY_PATH_ENV, Sass, default_library_path};

// Handles and native enums
pub use handle::{
    Compiler, Context, DataContext, FileContext, FunctionEntry, FunctionList, ImportEntry,
    ImportList, ImporterEntry, ImporterList, Options, Value,
};
pub use types::{CompilerState, Op, OutputStyle, Separator, Status, Tag};

// Ownership helpers
pub use callback::CallbackStore;
pub use memory::NativeString;
pub use options::OptionStrings;

// Errors, configuration and owned compilations
pub use compile::{CompileFailure, CompileOutput, Compilation, ErrorJson};
pub use config::SassConfig;
pub use error::{Result, SassError};

/// The raw ABI crate, for callers that need the C declarations directly.
pub use libsass_sys as sys;
