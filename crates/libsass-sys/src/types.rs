/*
 * types.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! C types and constant tables from the libsass public headers.

use std::marker::{PhantomData, PhantomPinned};

pub use libc::{c_char, c_double, c_int, c_void, size_t};

macro_rules! opaque {
    ($($(#[$meta:meta])* $name:ident;)*) => {
        $(
            $(#[$meta])*
            #[repr(C)]
            pub struct $name {
                _data: [u8; 0],
                _marker: PhantomData<(*mut u8, PhantomPinned)>,
            }
        )*
    };
}

opaque! {
    /// `struct Sass_Options`
    Sass_Options;
    /// `struct Sass_Context`, the result view shared by both context kinds
    Sass_Context;
    /// `struct Sass_File_Context`
    Sass_File_Context;
    /// `struct Sass_Data_Context`
    Sass_Data_Context;
    /// `struct Sass_Compiler`
    Sass_Compiler;
    /// `union Sass_Value`
    Sass_Value;
    /// `struct Sass_Importer`
    Sass_Importer;
    /// `struct Sass_Import`
    Sass_Import;
    /// `struct Sass_Function`
    Sass_Function;
}

pub type Sass_Importer_Entry = *mut Sass_Importer;
pub type Sass_Importer_List = *mut Sass_Importer_Entry;
pub type Sass_Import_Entry = *mut Sass_Import;
pub type Sass_Import_List = *mut Sass_Import_Entry;
pub type Sass_Function_Entry = *mut Sass_Function;
pub type Sass_Function_List = *mut Sass_Function_Entry;

/// `typedef Sass_Import_List (*Sass_Importer_Fn)(const char* url, Sass_Importer_Entry cb, struct Sass_Compiler* compiler)`
pub type Sass_Importer_Fn = Option<
    unsafe extern "C" fn(
        url: *const c_char,
        cb: Sass_Importer_Entry,
        compiler: *mut Sass_Compiler,
    ) -> Sass_Import_List,
>;

/// `typedef union Sass_Value* (*Sass_Function_Fn)(const union Sass_Value*, Sass_Function_Entry cb, struct Sass_Compiler* compiler)`
pub type Sass_Function_Fn = Option<
    unsafe extern "C" fn(
        args: *const Sass_Value,
        cb: Sass_Function_Entry,
        compiler: *mut Sass_Compiler,
    ) -> *mut Sass_Value,
>;

// enum Sass_Output_Style
pub type Sass_Output_Style = c_int;
pub const SASS_STYLE_NESTED: Sass_Output_Style = 0;
pub const SASS_STYLE_EXPANDED: Sass_Output_Style = 1;
pub const SASS_STYLE_COMPACT: Sass_Output_Style = 2;
pub const SASS_STYLE_COMPRESSED: Sass_Output_Style = 3;
pub const SASS_STYLE_INSPECT: Sass_Output_Style = 4;
pub const SASS_STYLE_TO_SASS: Sass_Output_Style = 5;
/// Added in libsass 3.6.
pub const SASS_STYLE_TO_CSS: Sass_Output_Style = 6;

// enum Sass_Tag
pub type Sass_Tag = c_int;
pub const SASS_BOOLEAN: Sass_Tag = 0;
pub const SASS_NUMBER: Sass_Tag = 1;
pub const SASS_COLOR: Sass_Tag = 2;
pub const SASS_STRING: Sass_Tag = 3;
pub const SASS_LIST: Sass_Tag = 4;
pub const SASS_MAP: Sass_Tag = 5;
pub const SASS_NULL: Sass_Tag = 6;
pub const SASS_ERROR: Sass_Tag = 7;
pub const SASS_WARNING: Sass_Tag = 8;

// enum Sass_Separator
pub type Sass_Separator = c_int;
pub const SASS_COMMA: Sass_Separator = 0;
pub const SASS_SPACE: Sass_Separator = 1;
/// Internal separator used by libsass for map-like argument lists.
pub const SASS_HASH: Sass_Separator = 2;

// enum Sass_OP
pub type Sass_OP = c_int;
pub const AND: Sass_OP = 0;
pub const OR: Sass_OP = 1;
pub const EQ: Sass_OP = 2;
pub const NEQ: Sass_OP = 3;
pub const GT: Sass_OP = 4;
pub const GTE: Sass_OP = 5;
pub const LT: Sass_OP = 6;
pub const LTE: Sass_OP = 7;
pub const ADD: Sass_OP = 8;
pub const SUB: Sass_OP = 9;
pub const MUL: Sass_OP = 10;
pub const DIV: Sass_OP = 11;
pub const MOD: Sass_OP = 12;
pub const NUM_OPS: Sass_OP = 13;

// enum Sass_Compiler_State
pub type Sass_Compiler_State = c_int;
pub const SASS_COMPILER_CREATED: Sass_Compiler_State = 0;
pub const SASS_COMPILER_PARSED: Sass_Compiler_State = 1;
pub const SASS_COMPILER_EXECUTED: Sass_Compiler_State = 2;
