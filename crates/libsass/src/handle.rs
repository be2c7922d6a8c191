//! Typed handles over libsass pointers.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! Every native pointer category gets its own `#[repr(transparent)]` wrapper so
//! that, for example, an [`ImporterList`] cannot be passed where an
//! [`ImportList`] is expected. Handles are plain addresses: copying one does
//! not copy the native resource, and dropping one releases nothing. Whether a
//! given handle is owned or borrowed is stated on the accessor that produced it.
//!
//! Handles are neither `Send` nor `Sync`; libsass is single-threaded per
//! compilation.

use libsass_sys as sys;

macro_rules! handle {
    ($($(#[$meta:meta])* $name:ident => $raw:ty;)*) => {
        $(
            $(#[$meta])*
            #[repr(transparent)]
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
            pub struct $name($raw);

            impl $name {
                /// Wrap an address returned by libsass.
                pub const fn from_raw(raw: $raw) -> Self {
                    Self(raw)
                }

                /// A null handle, for out-parameters libsass will fill in.
                pub const fn null() -> Self {
                    Self(std::ptr::null_mut())
                }

                pub const fn as_raw(self) -> $raw {
                    self.0
                }

                pub fn is_null(self) -> bool {
                    self.0.is_null()
                }
            }

            impl Default for $name {
                fn default() -> Self {
                    Self::null()
                }
            }
        )*
    };
}

handle! {
    /// `struct Sass_Options*`
    Options => *mut sys::Sass_Options;
    /// `struct Sass_Context*`, borrowed from a file or data context or a compiler
    Context => *mut sys::Sass_Context;
    /// `struct Sass_File_Context*`
    FileContext => *mut sys::Sass_File_Context;
    /// `struct Sass_Data_Context*`
    DataContext => *mut sys::Sass_Data_Context;
    /// `struct Sass_Compiler*`
    Compiler => *mut sys::Sass_Compiler;
    /// `union Sass_Value*`
    Value => *mut sys::Sass_Value;
    /// `Sass_Importer_Entry`
    ImporterEntry => sys::Sass_Importer_Entry;
    /// `Sass_Importer_List`, fixed length
    ImporterList => sys::Sass_Importer_List;
    /// `Sass_Import_Entry`
    ImportEntry => sys::Sass_Import_Entry;
    /// `Sass_Import_List`, fixed length
    ImportList => sys::Sass_Import_List;
    /// `Sass_Function_Entry`
    FunctionEntry => sys::Sass_Function_Entry;
    /// `Sass_Function_List`, fixed length
    FunctionList => sys::Sass_Function_List;
}

impl Value {
    pub(crate) fn as_const(self) -> *const sys::Sass_Value {
        self.0.cast_const()
    }
}
