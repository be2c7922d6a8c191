/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Raw ABI declarations for the [libsass][] C library.
//!
//! This crate mirrors the public libsass 3.6 headers (`sass/base.h`,
//! `sass/values.h`, `sass/functions.h`, `sass/context.h`):
//!
//! - opaque C types (`Sass_Options`, `Sass_Value`, `Sass_Compiler`, ...)
//! - the pointer typedefs built on them (`Sass_Import_Entry`, `Sass_Function_List`, ...)
//! - the raw `c_int` constant tables (tags, separators, output styles, operators, states)
//! - the two callback typedefs (`Sass_Importer_Fn`, `Sass_Function_Fn`)
//! - [`SassLibrary`], the table of entry points resolved from a shared library at runtime
//!
//! Nothing here is safe to call. Most users want the `libsass` crate, which wraps each
//! pointer category in its own handle type and documents the ownership rules per accessor.
//!
//! The native library is opened with `libloading`, so building this crate does not
//! require libsass to be installed.
//!
//! [libsass]: https://github.com/sass/libsass

#![allow(non_camel_case_types)]
#![allow(non_upper_case_globals)]

mod library;
mod types;

pub use library::{SassLibrary, default_library_name};
pub use types::*;
