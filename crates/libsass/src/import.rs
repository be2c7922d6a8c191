//! Importer and import entries (`sass/functions.h`).
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! An importer is a callback libsass consults for every `@import`. It answers
//! with an [`ImportList`] of resolved [`ImportEntry`]s, or null to let the next
//! importer (or libsass's own file lookup) handle the URL.
//!
//! Ownership of the lists:
//! - an [`ImporterList`] installed with `option_set_c_importers`/`c_headers` is
//!   freed together with its context, entries included;
//! - an [`ImportList`] returned from an importer callback is consumed by libsass;
//! - anything never handed over is freed by the caller with the matching
//!   `delete_*` call.
//!
//! Source and source-map buffers passed to [`Sass::make_import_entry`] and
//! [`Sass::make_import`] are copied into libsass memory, and the entry takes
//! ownership of the copy. A buffer holding a NUL byte is rejected.

use std::path::Path;

use libsass_sys::{Sass_Importer_Fn, c_void};

use crate::error::Result;
use crate::handle::{ImportEntry, ImportList, ImporterEntry, ImporterList};
use crate::library::Sass;
use crate::memory::{NativeString, borrowed_string, c_string, path_c_string};

impl Sass {
    // Importer lists and entries

    /// `sass_make_importer_list`: `length` null slots.
    pub fn make_importer_list(&self, length: usize) -> ImporterList {
        ImporterList::from_raw(unsafe { (self.raw().sass_make_importer_list)(length) })
    }

    /// Entry `index`, borrowed from the list.
    ///
    /// # Safety
    ///
    /// `list` must be live and `index` less than its length.
    pub unsafe fn importer_get_list_entry(&self, list: ImporterList, index: usize) -> ImporterEntry {
        ImporterEntry::from_raw(unsafe {
            (self.raw().sass_importer_get_list_entry)(list.as_raw(), index)
        })
    }

    /// The list takes ownership of `entry`.
    ///
    /// # Safety
    ///
    /// `list` must be live and `index` less than its length.
    pub unsafe fn importer_set_list_entry(&self, list: ImporterList, index: usize, entry: ImporterEntry) {
        unsafe { (self.raw().sass_importer_set_list_entry)(list.as_raw(), index, entry.as_raw()) }
    }

    /// `sass_delete_importer_list`: frees the list and every entry in it.
    ///
    /// # Safety
    ///
    /// `list` must be owned by the caller (not installed in any options).
    pub unsafe fn delete_importer_list(&self, list: ImporterList) {
        unsafe { (self.raw().sass_delete_importer_list)(list.as_raw()) }
    }

    /// `sass_make_importer`: register a raw callback with a priority and cookie.
    ///
    /// Importers with a higher priority are consulted first. For Rust closures,
    /// use [`CallbackStore::importer`](crate::CallbackStore::importer), which
    /// supplies the trampoline and keeps the closure alive.
    ///
    /// # Safety
    ///
    /// `function` must be a valid callback for as long as any compilation can
    /// invoke it, and `cookie` must be whatever that callback expects.
    pub unsafe fn make_importer(
        &self,
        function: Sass_Importer_Fn,
        priority: f64,
        cookie: *mut c_void,
    ) -> ImporterEntry {
        ImporterEntry::from_raw(unsafe { (self.raw().sass_make_importer)(function, priority, cookie) })
    }

    /// # Safety
    ///
    /// `entry` must be live.
    pub unsafe fn importer_get_function(&self, entry: ImporterEntry) -> Sass_Importer_Fn {
        unsafe { (self.raw().sass_importer_get_function)(entry.as_raw()) }
    }

    /// # Safety
    ///
    /// `entry` must be live.
    pub unsafe fn importer_get_priority(&self, entry: ImporterEntry) -> f64 {
        unsafe { (self.raw().sass_importer_get_priority)(entry.as_raw()) }
    }

    /// # Safety
    ///
    /// `entry` must be live.
    pub unsafe fn importer_get_cookie(&self, entry: ImporterEntry) -> *mut c_void {
        unsafe { (self.raw().sass_importer_get_cookie)(entry.as_raw()) }
    }

    /// `sass_delete_importer`. Does not free the cookie.
    ///
    /// # Safety
    ///
    /// `entry` must be owned by the caller (not stored in a list).
    pub unsafe fn delete_importer(&self, entry: ImporterEntry) {
        unsafe { (self.raw().sass_delete_importer)(entry.as_raw()) }
    }

    // Import lists and entries

    /// `sass_make_import_list`: `length` null slots.
    pub fn make_import_list(&self, length: usize) -> ImportList {
        ImportList::from_raw(unsafe { (self.raw().sass_make_import_list)(length) })
    }

    /// `sass_make_import_entry`: an import resolved to `path`.
    ///
    /// With `source` set, libsass compiles that text instead of reading `path`.
    /// Buffers are copied; the entry owns the copies.
    pub fn make_import_entry(
        &self,
        path: &str,
        source: Option<&[u8]>,
        srcmap: Option<&[u8]>,
    ) -> Result<ImportEntry> {
        let path = c_string("import path", path)?;
        let (source, srcmap) = self.import_buffers(source, srcmap)?;
        Ok(ImportEntry::from_raw(unsafe {
            (self.raw().sass_make_import_entry)(path.as_ptr(), source, srcmap)
        }))
    }

    /// `sass_make_import`: like [`Sass::make_import_entry`], with the import path
    /// as written and the absolute path it resolved to.
    pub fn make_import(
        &self,
        imp_path: &str,
        abs_path: &Path,
        source: Option<&[u8]>,
        srcmap: Option<&[u8]>,
    ) -> Result<ImportEntry> {
        let imp_path = c_string("import path", imp_path)?;
        let abs_path = path_c_string("absolute import path", abs_path)?;
        let (source, srcmap) = self.import_buffers(source, srcmap)?;
        Ok(ImportEntry::from_raw(unsafe {
            (self.raw().sass_make_import)(imp_path.as_ptr(), abs_path.as_ptr(), source, srcmap)
        }))
    }

    fn import_buffers(
        &self,
        source: Option<&[u8]>,
        srcmap: Option<&[u8]>,
    ) -> Result<(*mut libsass_sys::c_char, *mut libsass_sys::c_char)> {
        let source = self.alloc_optional("import source", source)?;
        match self.alloc_optional("import source map", srcmap) {
            Ok(srcmap) => Ok((source, srcmap)),
            Err(err) => {
                // SAFETY: source was allocated above and not handed over yet
                unsafe { self.free_memory(source) };
                Err(err)
            }
        }
    }

    /// `sass_import_set_error`: attach an error that fails the `@import` at
    /// `line`/`column` of the importing file. Returns `entry`.
    ///
    /// # Safety
    ///
    /// `entry` must be live.
    pub unsafe fn import_set_error(
        &self,
        entry: ImportEntry,
        message: &str,
        line: usize,
        column: usize,
    ) -> Result<ImportEntry> {
        let message = c_string("import error message", message)?;
        Ok(ImportEntry::from_raw(unsafe {
            (self.raw().sass_import_set_error)(entry.as_raw(), message.as_ptr(), line, column)
        }))
    }

    /// The list takes ownership of `entry`.
    ///
    /// # Safety
    ///
    /// `list` must be live and `index` less than its length.
    pub unsafe fn import_set_list_entry(&self, list: ImportList, index: usize, entry: ImportEntry) {
        unsafe { (self.raw().sass_import_set_list_entry)(list.as_raw(), index, entry.as_raw()) }
    }

    /// Entry `index`, borrowed from the list.
    ///
    /// # Safety
    ///
    /// `list` must be live and `index` less than its length.
    pub unsafe fn import_get_list_entry(&self, list: ImportList, index: usize) -> ImportEntry {
        ImportEntry::from_raw(unsafe { (self.raw().sass_import_get_list_entry)(list.as_raw(), index) })
    }

    /// Borrowed, copied out.
    ///
    /// # Safety
    ///
    /// `entry` must be live.
    pub unsafe fn import_get_imp_path(&self, entry: ImportEntry) -> Option<String> {
        unsafe { borrowed_string((self.raw().sass_import_get_imp_path)(entry.as_raw())) }
    }

    /// Borrowed, copied out.
    ///
    /// # Safety
    ///
    /// `entry` must be live.
    pub unsafe fn import_get_abs_path(&self, entry: ImportEntry) -> Option<String> {
        unsafe { borrowed_string((self.raw().sass_import_get_abs_path)(entry.as_raw())) }
    }

    /// Borrowed, copied out. `None` once the source has been taken.
    ///
    /// # Safety
    ///
    /// `entry` must be live.
    pub unsafe fn import_get_source(&self, entry: ImportEntry) -> Option<String> {
        unsafe { borrowed_string((self.raw().sass_import_get_source)(entry.as_raw())) }
    }

    /// Borrowed, copied out. `None` once the source map has been taken.
    ///
    /// # Safety
    ///
    /// `entry` must be live.
    pub unsafe fn import_get_srcmap(&self, entry: ImportEntry) -> Option<String> {
        unsafe { borrowed_string((self.raw().sass_import_get_srcmap)(entry.as_raw())) }
    }

    /// `sass_import_take_source`: move the source out of the entry.
    ///
    /// The entry's field is cleared, so a later [`Sass::import_get_source`]
    /// returns `None` and deleting the entry does not free the buffer again.
    ///
    /// # Safety
    ///
    /// `entry` must be live.
    pub unsafe fn import_take_source(&self, entry: ImportEntry) -> Option<NativeString> {
        unsafe {
            let ptr = (self.raw().sass_import_take_source)(entry.as_raw());
            NativeString::from_raw(*self, ptr)
        }
    }

    /// `sass_import_take_srcmap`: move the source map out of the entry.
    ///
    /// # Safety
    ///
    /// `entry` must be live.
    pub unsafe fn import_take_srcmap(&self, entry: ImportEntry) -> Option<NativeString> {
        unsafe {
            let ptr = (self.raw().sass_import_take_srcmap)(entry.as_raw());
            NativeString::from_raw(*self, ptr)
        }
    }

    /// # Safety
    ///
    /// `entry` must be live.
    pub unsafe fn import_get_error_line(&self, entry: ImportEntry) -> usize {
        unsafe { (self.raw().sass_import_get_error_line)(entry.as_raw()) }
    }

    /// # Safety
    ///
    /// `entry` must be live.
    pub unsafe fn import_get_error_column(&self, entry: ImportEntry) -> usize {
        unsafe { (self.raw().sass_import_get_error_column)(entry.as_raw()) }
    }

    /// Borrowed, copied out.
    ///
    /// # Safety
    ///
    /// `entry` must be live.
    pub unsafe fn import_get_error_message(&self, entry: ImportEntry) -> Option<String> {
        unsafe { borrowed_string((self.raw().sass_import_get_error_message)(entry.as_raw())) }
    }

    /// `sass_delete_import_list`: frees the list and every entry in it.
    ///
    /// # Safety
    ///
    /// `list` must be owned by the caller (not returned to libsass).
    pub unsafe fn delete_import_list(&self, list: ImportList) {
        unsafe { (self.raw().sass_delete_import_list)(list.as_raw()) }
    }

    /// `sass_delete_import`: frees the entry and any fields not yet taken.
    ///
    /// # Safety
    ///
    /// `entry` must be owned by the caller (not stored in a list).
    pub unsafe fn delete_import(&self, entry: ImportEntry) {
        unsafe { (self.raw().sass_delete_import)(entry.as_raw()) }
    }

    /// Build an [`ImportList`] from already created entries.
    ///
    /// The list takes ownership of every entry.
    pub fn import_list_from(&self, entries: Vec<ImportEntry>) -> ImportList {
        let list = self.make_import_list(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            // SAFETY: list was created with entries.len() slots
            unsafe { self.import_set_list_entry(list, index, entry) };
        }
        list
    }

    /// A one-entry [`ImportList`] carrying an import error for `path`.
    pub fn import_error_list(&self, path: &str, message: &str, line: usize, column: usize) -> Result<ImportList> {
        let entry = self.make_import_entry(path, None, None)?;
        // SAFETY: entry was just created
        let entry = match unsafe { self.import_set_error(entry, message, line, column) } {
            Ok(entry) => entry,
            Err(err) => {
                unsafe { self.delete_import(entry) };
                return Err(err);
            }
        };
        Ok(self.import_list_from(vec![entry]))
    }
}

