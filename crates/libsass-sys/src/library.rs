/*
 * library.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The libsass entry-point table.
//!
//! Every exported function is declared once in the `sass_library!` invocation below.
//! The macro expands to a struct with one function-pointer field per entry point and two
//! constructors: one resolves every symbol from an opened shared library, the other
//! takes addresses from a resolver function (an implementation linked into the process).
//! A missing symbol fails construction, so a [`SassLibrary`] always has every field set.

use std::ffi::{OsStr, OsString};
use std::fmt;

use libloading::Library;

use crate::types::*;

macro_rules! sass_library {
    ($(
        $(#[$meta:meta])*
        fn $name:ident($($arg:ident: $ty:ty),* $(,)?) $(-> $ret:ty)?;
    )*) => {
        /// Function pointers for every libsass entry point, resolved from a shared library.
        ///
        /// The pointers stay valid for as long as this value (which owns the
        /// [`Library`], if any) is alive.
        pub struct SassLibrary {
            library: Option<Library>,
            $(
                $(#[$meta])*
                pub $name: unsafe extern "C" fn($($ty),*) $(-> $ret)?,
            )*
        }

        impl SassLibrary {
            /// Open the shared library at `path` and resolve every entry point.
            ///
            /// # Safety
            ///
            /// Loading runs the library's initializers. `path` must name a libsass build
            /// whose exported signatures match the 3.6 headers declared here.
            pub unsafe fn open<P: AsRef<OsStr>>(path: P) -> Result<Self, libloading::Error> {
                let library = unsafe { Library::new(path.as_ref()) }?;
                unsafe { Self::from_library(library) }
            }

            /// Resolve every entry point from an already opened library.
            ///
            /// # Safety
            ///
            /// Same as [`SassLibrary::open`].
            pub unsafe fn from_library(library: Library) -> Result<Self, libloading::Error> {
                $(
                    let $name = unsafe {
                        *library.get::<unsafe extern "C" fn($($ty),*) $(-> $ret)?>(
                            concat!(stringify!($name), "\0").as_bytes(),
                        )?
                    };
                )*
                Ok(Self { library: Some(library), $($name,)* })
            }

            /// Build the table from `resolve`, which maps an entry-point name to the
            /// address of its implementation. Fails with the first name it cannot
            /// resolve.
            ///
            /// # Safety
            ///
            /// Every address returned must be a function with the signature declared for
            /// that name, valid for as long as the table is used.
            pub unsafe fn from_symbols<F>(mut resolve: F) -> Result<Self, &'static str>
            where
                F: FnMut(&str) -> Option<*const c_void>,
            {
                $(
                    let $name = match resolve(stringify!($name)) {
                        Some(address) if !address.is_null() => unsafe {
                            std::mem::transmute::<*const c_void, unsafe extern "C" fn($($ty),*) $(-> $ret)?>(
                                address,
                            )
                        },
                        _ => return Err(stringify!($name)),
                    };
                )*
                Ok(Self { library: None, $($name,)* })
            }

            /// Names of all resolved entry points, in declaration order.
            pub const SYMBOLS: &'static [&'static str] = &[$(stringify!($name)),*];

            /// The underlying library handle. `None` for a table built with
            /// [`SassLibrary::from_symbols`].
            pub fn library(&self) -> Option<&Library> {
                self.library.as_ref()
            }
        }
    };
}

sass_library! {
    // sass/base.h
    fn sass_alloc_memory(size: size_t) -> *mut c_void;
    fn sass_copy_c_string(str: *const c_char) -> *mut c_char;
    fn sass_free_memory(ptr: *mut c_void);
    fn libsass_version() -> *const c_char;
    fn libsass_language_version() -> *const c_char;

    // sass/values.h
    fn sass_make_null() -> *mut Sass_Value;
    fn sass_make_boolean(val: bool) -> *mut Sass_Value;
    fn sass_make_string(val: *const c_char) -> *mut Sass_Value;
    fn sass_make_qstring(val: *const c_char) -> *mut Sass_Value;
    fn sass_make_number(val: c_double, unit: *const c_char) -> *mut Sass_Value;
    fn sass_make_color(r: c_double, g: c_double, b: c_double, a: c_double) -> *mut Sass_Value;
    fn sass_make_list(len: size_t, sep: Sass_Separator, is_bracketed: bool) -> *mut Sass_Value;
    fn sass_make_map(len: size_t) -> *mut Sass_Value;
    fn sass_make_error(msg: *const c_char) -> *mut Sass_Value;
    fn sass_make_warning(msg: *const c_char) -> *mut Sass_Value;
    fn sass_delete_value(val: *mut Sass_Value);
    fn sass_clone_value(val: *const Sass_Value) -> *mut Sass_Value;
    fn sass_value_op(op: Sass_OP, a: *const Sass_Value, b: *const Sass_Value) -> *mut Sass_Value;
    fn sass_value_stringify(a: *const Sass_Value, compressed: bool, precision: c_int) -> *mut Sass_Value;
    fn sass_value_get_tag(v: *const Sass_Value) -> Sass_Tag;
    fn sass_value_is_null(v: *const Sass_Value) -> bool;
    fn sass_value_is_number(v: *const Sass_Value) -> bool;
    fn sass_value_is_string(v: *const Sass_Value) -> bool;
    fn sass_value_is_boolean(v: *const Sass_Value) -> bool;
    fn sass_value_is_color(v: *const Sass_Value) -> bool;
    fn sass_value_is_list(v: *const Sass_Value) -> bool;
    fn sass_value_is_map(v: *const Sass_Value) -> bool;
    fn sass_value_is_error(v: *const Sass_Value) -> bool;
    fn sass_value_is_warning(v: *const Sass_Value) -> bool;
    fn sass_number_get_value(v: *const Sass_Value) -> c_double;
    fn sass_number_set_value(v: *mut Sass_Value, value: c_double);
    fn sass_number_get_unit(v: *const Sass_Value) -> *const c_char;
    fn sass_number_set_unit(v: *mut Sass_Value, unit: *mut c_char);
    fn sass_string_get_value(v: *const Sass_Value) -> *const c_char;
    fn sass_string_set_value(v: *mut Sass_Value, value: *mut c_char);
    fn sass_string_is_quoted(v: *const Sass_Value) -> bool;
    fn sass_string_set_quoted(v: *mut Sass_Value, quoted: bool);
    fn sass_boolean_get_value(v: *const Sass_Value) -> bool;
    fn sass_boolean_set_value(v: *mut Sass_Value, value: bool);
    fn sass_color_get_r(v: *const Sass_Value) -> c_double;
    fn sass_color_set_r(v: *mut Sass_Value, r: c_double);
    fn sass_color_get_g(v: *const Sass_Value) -> c_double;
    fn sass_color_set_g(v: *mut Sass_Value, g: c_double);
    fn sass_color_get_b(v: *const Sass_Value) -> c_double;
    fn sass_color_set_b(v: *mut Sass_Value, b: c_double);
    fn sass_color_get_a(v: *const Sass_Value) -> c_double;
    fn sass_color_set_a(v: *mut Sass_Value, a: c_double);
    fn sass_list_get_length(v: *const Sass_Value) -> size_t;
    fn sass_list_get_separator(v: *const Sass_Value) -> Sass_Separator;
    fn sass_list_set_separator(v: *mut Sass_Value, value: Sass_Separator);
    fn sass_list_get_is_bracketed(v: *const Sass_Value) -> bool;
    fn sass_list_set_is_bracketed(v: *mut Sass_Value, value: bool);
    fn sass_list_get_value(v: *const Sass_Value, i: size_t) -> *mut Sass_Value;
    fn sass_list_set_value(v: *mut Sass_Value, i: size_t, value: *mut Sass_Value);
    fn sass_map_get_length(v: *const Sass_Value) -> size_t;
    fn sass_map_get_key(v: *const Sass_Value, i: size_t) -> *mut Sass_Value;
    fn sass_map_set_key(v: *mut Sass_Value, i: size_t, key: *mut Sass_Value);
    fn sass_map_get_value(v: *const Sass_Value, i: size_t) -> *mut Sass_Value;
    fn sass_map_set_value(v: *mut Sass_Value, i: size_t, value: *mut Sass_Value);
    fn sass_error_get_message(v: *const Sass_Value) -> *mut c_char;
    fn sass_error_set_message(v: *mut Sass_Value, msg: *mut c_char);
    fn sass_warning_get_message(v: *const Sass_Value) -> *mut c_char;
    fn sass_warning_set_message(v: *mut Sass_Value, msg: *mut c_char);

    // sass/functions.h: importers
    fn sass_make_importer_list(length: size_t) -> Sass_Importer_List;
    fn sass_importer_get_list_entry(list: Sass_Importer_List, idx: size_t) -> Sass_Importer_Entry;
    fn sass_importer_set_list_entry(list: Sass_Importer_List, idx: size_t, entry: Sass_Importer_Entry);
    fn sass_delete_importer_list(list: Sass_Importer_List);
    fn sass_make_importer(importer: Sass_Importer_Fn, priority: c_double, cookie: *mut c_void) -> Sass_Importer_Entry;
    fn sass_importer_get_function(cb: Sass_Importer_Entry) -> Sass_Importer_Fn;
    fn sass_importer_get_priority(cb: Sass_Importer_Entry) -> c_double;
    fn sass_importer_get_cookie(cb: Sass_Importer_Entry) -> *mut c_void;
    fn sass_delete_importer(cb: Sass_Importer_Entry);

    // sass/functions.h: imports
    fn sass_make_import_list(length: size_t) -> Sass_Import_List;
    fn sass_make_import_entry(path: *const c_char, source: *mut c_char, srcmap: *mut c_char) -> Sass_Import_Entry;
    fn sass_make_import(imp_path: *const c_char, abs_base: *const c_char, source: *mut c_char, srcmap: *mut c_char) -> Sass_Import_Entry;
    fn sass_import_set_error(import: Sass_Import_Entry, message: *const c_char, line: size_t, col: size_t) -> Sass_Import_Entry;
    fn sass_import_set_list_entry(list: Sass_Import_List, idx: size_t, entry: Sass_Import_Entry);
    fn sass_import_get_list_entry(list: Sass_Import_List, idx: size_t) -> Sass_Import_Entry;
    fn sass_import_get_imp_path(entry: Sass_Import_Entry) -> *const c_char;
    fn sass_import_get_abs_path(entry: Sass_Import_Entry) -> *const c_char;
    fn sass_import_get_source(entry: Sass_Import_Entry) -> *const c_char;
    fn sass_import_get_srcmap(entry: Sass_Import_Entry) -> *const c_char;
    fn sass_import_take_source(entry: Sass_Import_Entry) -> *mut c_char;
    fn sass_import_take_srcmap(entry: Sass_Import_Entry) -> *mut c_char;
    fn sass_import_get_error_line(entry: Sass_Import_Entry) -> size_t;
    fn sass_import_get_error_column(entry: Sass_Import_Entry) -> size_t;
    fn sass_import_get_error_message(entry: Sass_Import_Entry) -> *const c_char;
    fn sass_delete_import_list(list: Sass_Import_List);
    fn sass_delete_import(entry: Sass_Import_Entry);

    // sass/functions.h: custom functions
    fn sass_make_function_list(length: size_t) -> Sass_Function_List;
    fn sass_make_function(signature: *const c_char, cb: Sass_Function_Fn, cookie: *mut c_void) -> Sass_Function_Entry;
    fn sass_delete_function(entry: Sass_Function_Entry);
    fn sass_delete_function_list(list: Sass_Function_List);
    fn sass_function_get_list_entry(list: Sass_Function_List, pos: size_t) -> Sass_Function_Entry;
    fn sass_function_set_list_entry(list: Sass_Function_List, pos: size_t, cb: Sass_Function_Entry);
    fn sass_function_get_signature(cb: Sass_Function_Entry) -> *const c_char;
    fn sass_function_get_function(cb: Sass_Function_Entry) -> Sass_Function_Fn;
    fn sass_function_get_cookie(cb: Sass_Function_Entry) -> *mut c_void;

    // sass/context.h: contexts
    fn sass_make_options() -> *mut Sass_Options;
    fn sass_delete_options(options: *mut Sass_Options);
    fn sass_make_file_context(input_path: *const c_char) -> *mut Sass_File_Context;
    fn sass_make_data_context(source_string: *mut c_char) -> *mut Sass_Data_Context;
    fn sass_compile_file_context(ctx: *mut Sass_File_Context) -> c_int;
    fn sass_compile_data_context(ctx: *mut Sass_Data_Context) -> c_int;
    fn sass_delete_file_context(ctx: *mut Sass_File_Context);
    fn sass_delete_data_context(ctx: *mut Sass_Data_Context);
    fn sass_file_context_get_context(file_ctx: *mut Sass_File_Context) -> *mut Sass_Context;
    fn sass_data_context_get_context(data_ctx: *mut Sass_Data_Context) -> *mut Sass_Context;
    fn sass_context_get_options(ctx: *mut Sass_Context) -> *mut Sass_Options;
    fn sass_file_context_get_options(file_ctx: *mut Sass_File_Context) -> *mut Sass_Options;
    fn sass_data_context_get_options(data_ctx: *mut Sass_Data_Context) -> *mut Sass_Options;
    fn sass_file_context_set_options(file_ctx: *mut Sass_File_Context, opt: *mut Sass_Options);
    fn sass_data_context_set_options(data_ctx: *mut Sass_Data_Context, opt: *mut Sass_Options);

    // sass/context.h: two-phase compiler
    fn sass_make_file_compiler(file_ctx: *mut Sass_File_Context) -> *mut Sass_Compiler;
    fn sass_make_data_compiler(data_ctx: *mut Sass_Data_Context) -> *mut Sass_Compiler;
    fn sass_compiler_parse(compiler: *mut Sass_Compiler) -> c_int;
    fn sass_compiler_execute(compiler: *mut Sass_Compiler) -> c_int;
    fn sass_delete_compiler(compiler: *mut Sass_Compiler);
    fn sass_compiler_get_state(compiler: *mut Sass_Compiler) -> Sass_Compiler_State;
    fn sass_compiler_get_context(compiler: *mut Sass_Compiler) -> *mut Sass_Context;
    fn sass_compiler_get_options(compiler: *mut Sass_Compiler) -> *mut Sass_Options;
    fn sass_compiler_get_import_stack_size(compiler: *mut Sass_Compiler) -> size_t;
    fn sass_compiler_get_last_import(compiler: *mut Sass_Compiler) -> Sass_Import_Entry;
    fn sass_compiler_get_import_entry(compiler: *mut Sass_Compiler, idx: size_t) -> Sass_Import_Entry;

    // sass/context.h: option getters
    fn sass_option_get_precision(options: *mut Sass_Options) -> c_int;
    fn sass_option_get_output_style(options: *mut Sass_Options) -> Sass_Output_Style;
    fn sass_option_get_source_comments(options: *mut Sass_Options) -> bool;
    fn sass_option_get_source_map_embed(options: *mut Sass_Options) -> bool;
    fn sass_option_get_source_map_contents(options: *mut Sass_Options) -> bool;
    fn sass_option_get_omit_source_map_url(options: *mut Sass_Options) -> bool;
    fn sass_option_get_is_indented_syntax_src(options: *mut Sass_Options) -> bool;
    fn sass_option_get_indent(options: *mut Sass_Options) -> *const c_char;
    fn sass_option_get_linefeed(options: *mut Sass_Options) -> *const c_char;
    fn sass_option_get_input_path(options: *mut Sass_Options) -> *const c_char;
    fn sass_option_get_output_path(options: *mut Sass_Options) -> *const c_char;
    fn sass_option_get_plugin_path(options: *mut Sass_Options) -> *const c_char;
    fn sass_option_get_include_path_size(options: *mut Sass_Options) -> size_t;
    fn sass_option_get_include_path(options: *mut Sass_Options, i: size_t) -> *const c_char;
    fn sass_option_get_source_map_file(options: *mut Sass_Options) -> *const c_char;
    fn sass_option_get_source_map_root(options: *mut Sass_Options) -> *const c_char;
    fn sass_option_get_source_map_file_urls(options: *mut Sass_Options) -> bool;
    fn sass_option_get_c_headers(options: *mut Sass_Options) -> Sass_Importer_List;
    fn sass_option_get_c_importers(options: *mut Sass_Options) -> Sass_Importer_List;
    fn sass_option_get_c_functions(options: *mut Sass_Options) -> Sass_Function_List;

    // sass/context.h: option setters
    fn sass_option_set_precision(options: *mut Sass_Options, precision: c_int);
    fn sass_option_set_output_style(options: *mut Sass_Options, output_style: Sass_Output_Style);
    fn sass_option_set_source_comments(options: *mut Sass_Options, source_comments: bool);
    fn sass_option_set_source_map_embed(options: *mut Sass_Options, source_map_embed: bool);
    fn sass_option_set_source_map_contents(options: *mut Sass_Options, source_map_contents: bool);
    fn sass_option_set_omit_source_map_url(options: *mut Sass_Options, omit_source_map_url: bool);
    fn sass_option_set_is_indented_syntax_src(options: *mut Sass_Options, is_indented_syntax_src: bool);
    fn sass_option_set_indent(options: *mut Sass_Options, indent: *const c_char);
    fn sass_option_set_linefeed(options: *mut Sass_Options, linefeed: *const c_char);
    fn sass_option_set_input_path(options: *mut Sass_Options, input_path: *const c_char);
    fn sass_option_set_output_path(options: *mut Sass_Options, output_path: *const c_char);
    fn sass_option_set_plugin_path(options: *mut Sass_Options, plugin_path: *const c_char);
    fn sass_option_set_include_path(options: *mut Sass_Options, include_path: *const c_char);
    fn sass_option_set_source_map_file(options: *mut Sass_Options, source_map_file: *const c_char);
    fn sass_option_set_source_map_root(options: *mut Sass_Options, source_map_root: *const c_char);
    fn sass_option_set_source_map_file_urls(options: *mut Sass_Options, source_map_file_urls: bool);
    fn sass_option_set_c_headers(options: *mut Sass_Options, c_headers: Sass_Importer_List);
    fn sass_option_set_c_importers(options: *mut Sass_Options, c_importers: Sass_Importer_List);
    fn sass_option_set_c_functions(options: *mut Sass_Options, c_functions: Sass_Function_List);
    fn sass_option_push_plugin_path(options: *mut Sass_Options, path: *const c_char);
    fn sass_option_push_include_path(options: *mut Sass_Options, path: *const c_char);

    // sass/context.h: results
    fn sass_context_get_output_string(ctx: *mut Sass_Context) -> *const c_char;
    fn sass_context_get_error_status(ctx: *mut Sass_Context) -> c_int;
    fn sass_context_get_error_json(ctx: *mut Sass_Context) -> *const c_char;
    fn sass_context_get_error_text(ctx: *mut Sass_Context) -> *const c_char;
    fn sass_context_get_error_message(ctx: *mut Sass_Context) -> *const c_char;
    fn sass_context_get_error_file(ctx: *mut Sass_Context) -> *const c_char;
    fn sass_context_get_error_src(ctx: *mut Sass_Context) -> *const c_char;
    fn sass_context_get_error_line(ctx: *mut Sass_Context) -> size_t;
    fn sass_context_get_error_column(ctx: *mut Sass_Context) -> size_t;
    fn sass_context_get_source_map_string(ctx: *mut Sass_Context) -> *const c_char;
    fn sass_context_get_included_files(ctx: *mut Sass_Context) -> *mut *mut c_char;
    fn sass_context_get_included_files_size(ctx: *mut Sass_Context) -> size_t;
    fn sass_context_take_output_string(ctx: *mut Sass_Context) -> *mut c_char;
    fn sass_context_take_source_map_string(ctx: *mut Sass_Context) -> *mut c_char;
    fn sass_context_take_included_files(ctx: *mut Sass_Context) -> *mut *mut c_char;
}

impl fmt::Debug for SassLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SassLibrary")
            .field("library", &self.library)
            .field("symbols", &Self::SYMBOLS.len())
            .finish()
    }
}

/// Platform file name of the libsass shared library (`libsass.so`, `libsass.dylib`, `sass.dll`).
pub fn default_library_name() -> OsString {
    libloading::library_filename("sass")
}
