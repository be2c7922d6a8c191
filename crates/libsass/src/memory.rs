//! Buffers crossing the boundary with an ownership transfer.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! libsass frees some strings it receives (data context sources, import
//! sources, string setters) and hands out others the caller must free (the
//! `take` accessors). Both directions must use libsass's own allocator, so
//! [`Sass::alloc_c_string`] copies into `sass_alloc_memory` and [`NativeString`]
//! releases with `sass_free_memory`.

use std::borrow::Cow;
use std::ffi::{CStr, CString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;
use std::str::Utf8Error;

use libsass_sys::c_char;

use crate::error::{Result, SassError};
use crate::library::Sass;

/// A NUL-terminated string owned by the caller and allocated by libsass.
///
/// Produced by the `take` accessors. Freed with `sass_free_memory` on drop.
pub struct NativeString {
    sass: Sass,
    ptr: NonNull<c_char>,
}

impl NativeString {
    /// Take ownership of a libsass-allocated string. Returns `None` for null.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a NUL-terminated buffer allocated by libsass's
    /// allocator that nothing else will free.
    pub unsafe fn from_raw(sass: Sass, ptr: *mut c_char) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| Self { sass, ptr })
    }

    pub fn as_c_str(&self) -> &CStr {
        // SAFETY: non-null and NUL-terminated by construction
        unsafe { CStr::from_ptr(self.ptr.as_ptr()) }
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.as_c_str().to_bytes()
    }

    pub fn to_str(&self) -> std::result::Result<&str, Utf8Error> {
        self.as_c_str().to_str()
    }

    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        self.as_c_str().to_string_lossy()
    }

    /// Give the buffer back without freeing it, e.g. to hand it to another
    /// libsass call that takes ownership.
    pub fn into_raw(self) -> *mut c_char {
        let ptr = self.ptr.as_ptr();
        std::mem::forget(self);
        ptr
    }
}

impl Drop for NativeString {
    fn drop(&mut self) {
        // SAFETY: we own the buffer and it came from libsass's allocator
        unsafe { (self.sass.raw().sass_free_memory)(self.ptr.as_ptr().cast()) }
    }
}

impl fmt::Debug for NativeString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NativeString").field(&self.as_c_str()).finish()
    }
}

impl fmt::Display for NativeString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

impl Sass {
    /// Copy `bytes` into a NUL-terminated buffer from `sass_alloc_memory`.
    ///
    /// The returned pointer is owned by the caller until it is passed to a libsass
    /// function that takes ownership, or freed with [`Sass::free_memory`]. libsass
    /// reads the buffer as a C string, so a buffer holding a NUL byte is rejected.
    pub fn alloc_c_string(&self, bytes: &[u8]) -> Result<*mut c_char> {
        self.alloc_buffer("buffer", bytes)
    }

    pub(crate) fn alloc_buffer(&self, what: &'static str, bytes: &[u8]) -> Result<*mut c_char> {
        check_nul(what, bytes)?;
        let size = bytes.len() + 1;
        // SAFETY: plain allocation
        let ptr = unsafe { (self.raw().sass_alloc_memory)(size) }.cast::<u8>();
        if ptr.is_null() {
            return Err(SassError::OutOfMemory { size });
        }
        // SAFETY: ptr has room for bytes.len() + 1 bytes
        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), ptr, bytes.len());
            *ptr.add(bytes.len()) = 0;
        }
        Ok(ptr.cast())
    }

    /// `sass_copy_c_string`: duplicate a string with libsass's allocator.
    pub fn copy_c_string(&self, value: &str) -> Result<*mut c_char> {
        let value = c_string("string", value)?;
        // SAFETY: value is a valid C string for the duration of the call
        let ptr = unsafe { (self.raw().sass_copy_c_string)(value.as_ptr()) };
        if ptr.is_null() {
            return Err(SassError::OutOfMemory {
                size: value.as_bytes_with_nul().len(),
            });
        }
        Ok(ptr)
    }

    /// `sass_free_memory`
    ///
    /// # Safety
    ///
    /// `ptr` must be null or come from libsass's allocator, and must not be
    /// freed twice. Never pass a field that libsass still owns.
    pub unsafe fn free_memory(&self, ptr: *mut c_char) {
        unsafe { (self.raw().sass_free_memory)(ptr.cast()) }
    }

    pub(crate) fn alloc_optional(&self, what: &'static str, bytes: Option<&[u8]>) -> Result<*mut c_char> {
        match bytes {
            Some(bytes) => self.alloc_buffer(what, bytes),
            None => Ok(std::ptr::null_mut()),
        }
    }
}

pub(crate) fn c_string(what: &'static str, value: &str) -> Result<CString> {
    CString::new(value).map_err(|source| SassError::interior_nul(what, source))
}

/// Buffers handed to libsass are read up to the first NUL.
pub(crate) fn check_nul(what: &'static str, bytes: &[u8]) -> Result<()> {
    match bytes.iter().position(|byte| *byte == 0) {
        Some(position) => Err(SassError::InteriorNul { what, position }),
        None => Ok(()),
    }
}

/// A path as a C string. On Unix the raw bytes are passed through, so a path
/// that is not valid UTF-8 still names the same file.
#[cfg(unix)]
pub(crate) fn path_c_string(what: &'static str, path: &Path) -> Result<CString> {
    use std::os::unix::ffi::OsStrExt;

    CString::new(path.as_os_str().as_bytes()).map_err(|source| SassError::interior_nul(what, source))
}

#[cfg(not(unix))]
pub(crate) fn path_c_string(what: &'static str, path: &Path) -> Result<CString> {
    c_string(what, &path.to_string_lossy())
}

/// Copy a borrowed native path. Null becomes `None`.
///
/// # Safety
///
/// Same as [`borrowed_string`].
#[cfg(unix)]
pub(crate) unsafe fn borrowed_path(ptr: *const c_char) -> Option<PathBuf> {
    use std::os::unix::ffi::OsStrExt;

    if ptr.is_null() {
        return None;
    }
    let bytes = unsafe { CStr::from_ptr(ptr) }.to_bytes();
    Some(PathBuf::from(std::ffi::OsStr::from_bytes(bytes)))
}

#[cfg(not(unix))]
pub(crate) unsafe fn borrowed_path(ptr: *const c_char) -> Option<PathBuf> {
    unsafe { borrowed_string(ptr) }.map(PathBuf::from)
}

/// Copy a borrowed native string. Null becomes `None`.
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string that stays valid for
/// the duration of the call.
pub(crate) unsafe fn borrowed_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        None
    } else {
        Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
    }
}
