//! Enumerations from the libsass headers.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! Each enum is `#[repr(i32)]` with the discriminants written out, since the
//! numbers must match the native header rather than Rust's auto-assignment.
//! Values coming back from libsass go through `TryFrom<c_int>`, which reports
//! an unknown number as [`SassError::UnknownDiscriminant`].

use std::fmt;
use std::str::FromStr;

use libsass_sys::c_int;
use serde::{Deserialize, Serialize};

use crate::error::SassError;

macro_rules! native_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident as $kind:literal {
            $($(#[$vmeta:meta])* $variant:ident = $value:literal,)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(i32)]
        pub enum $name {
            $($(#[$vmeta])* $variant = $value,)*
        }

        impl $name {
            /// Every variant, in header order.
            pub const ALL: &'static [$name] = &[$($name::$variant),*];

            /// The native integer value.
            pub const fn as_raw(self) -> c_int {
                self as c_int
            }
        }

        impl TryFrom<c_int> for $name {
            type Error = SassError;

            fn try_from(value: c_int) -> Result<Self, SassError> {
                match value {
                    $($value => Ok($name::$variant),)*
                    other => Err(SassError::unknown_discriminant($kind, other)),
                }
            }
        }

        impl From<$name> for c_int {
            fn from(value: $name) -> c_int {
                value.as_raw()
            }
        }
    };
}

native_enum! {
    /// `enum Sass_Tag`: the discriminant of a [`Value`](crate::Value).
    pub enum Tag as "Sass_Tag" {
        Boolean = 0,
        Number = 1,
        Color = 2,
        String = 3,
        List = 4,
        Map = 5,
        Null = 6,
        Error = 7,
        Warning = 8,
    }
}

native_enum! {
    /// `enum Sass_Separator`
    pub enum Separator as "Sass_Separator" {
        Comma = 0,
        Space = 1,
        /// Used by libsass for keyword argument maps.
        Hash = 2,
    }
}

native_enum! {
    /// `enum Sass_Output_Style`
    #[derive(Default, Serialize, Deserialize)]
    #[serde(rename_all = "kebab-case")]
    pub enum OutputStyle as "Sass_Output_Style" {
        #[default]
        Nested = 0,
        Expanded = 1,
        Compact = 2,
        Compressed = 3,
        /// Debug output used by `inspect()`.
        Inspect = 4,
        ToSass = 5,
        /// libsass 3.6 and later.
        ToCss = 6,
    }
}

native_enum! {
    /// `enum Sass_OP`, the operators accepted by [`Sass::value_op`](crate::Sass::value_op).
    pub enum Op as "Sass_OP" {
        And = 0,
        Or = 1,
        Eq = 2,
        Neq = 3,
        Gt = 4,
        Gte = 5,
        Lt = 6,
        Lte = 7,
        Add = 8,
        Sub = 9,
        Mul = 10,
        Div = 11,
        Mod = 12,
    }
}

native_enum! {
    /// `enum Sass_Compiler_State`
    ///
    /// A compiler moves `Created -> Parsed -> Executed`, one step per call to
    /// [`Sass::compiler_parse`](crate::Sass::compiler_parse) and
    /// [`Sass::compiler_execute`](crate::Sass::compiler_execute).
    pub enum CompilerState as "Sass_Compiler_State" {
        Created = 0,
        Parsed = 1,
        Executed = 2,
    }
}

impl OutputStyle {
    /// The name used in configuration files and on the command line.
    pub fn name(self) -> &'static str {
        match self {
            OutputStyle::Nested => "nested",
            OutputStyle::Expanded => "expanded",
            OutputStyle::Compact => "compact",
            OutputStyle::Compressed => "compressed",
            OutputStyle::Inspect => "inspect",
            OutputStyle::ToSass => "to-sass",
            OutputStyle::ToCss => "to-css",
        }
    }
}

impl fmt::Display for OutputStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OutputStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OutputStyle::ALL
            .iter()
            .copied()
            .find(|style| style.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let names: Vec<_> = OutputStyle::ALL.iter().map(|s| s.name()).collect();
                format!("unknown output style '{}' (expected one of {})", s, names.join(", "))
            })
    }
}

/// Status code returned by the compile, parse and execute entry points.
///
/// Zero is success. A non-zero status never releases anything: the context or
/// compiler that produced it must still be deleted by its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Status(c_int);

impl Status {
    pub const SUCCESS: Status = Status(0);

    pub const fn from_raw(code: c_int) -> Self {
        Self(code)
    }

    pub const fn code(self) -> c_int {
        self.0
    }

    pub const fn is_success(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "status {}", self.0)
    }
}
