//! Custom function entries (`sass/functions.h`).
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! A custom function is a Sass signature such as `"double($x)"` bound to a
//! callback. libsass calls it with a list value holding the arguments and
//! takes ownership of the value it returns.

use libsass_sys::{Sass_Function_Fn, c_void};

use crate::error::Result;
use crate::handle::{FunctionEntry, FunctionList};
use crate::library::Sass;
use crate::memory::{borrowed_string, c_string};

impl Sass {
    /// `sass_make_function_list`: `length` null slots.
    pub fn make_function_list(&self, length: usize) -> FunctionList {
        FunctionList::from_raw(unsafe { (self.raw().sass_make_function_list)(length) })
    }

    /// `sass_make_function`: bind `signature` to a raw callback and cookie.
    ///
    /// For Rust closures use [`CallbackStore::function`](crate::CallbackStore::function).
    ///
    /// # Safety
    ///
    /// `function` must stay valid for as long as any compilation can invoke it,
    /// and `cookie` must be whatever that callback expects.
    pub unsafe fn make_function(
        &self,
        signature: &str,
        function: Sass_Function_Fn,
        cookie: *mut c_void,
    ) -> Result<FunctionEntry> {
        let signature = c_string("function signature", signature)?;
        Ok(FunctionEntry::from_raw(unsafe {
            (self.raw().sass_make_function)(signature.as_ptr(), function, cookie)
        }))
    }

    /// `sass_delete_function`. Does not free the cookie.
    ///
    /// # Safety
    ///
    /// `entry` must be owned by the caller (not stored in a list).
    pub unsafe fn delete_function(&self, entry: FunctionEntry) {
        unsafe { (self.raw().sass_delete_function)(entry.as_raw()) }
    }

    /// `sass_delete_function_list`: frees the list and every entry in it.
    ///
    /// # Safety
    ///
    /// `list` must be owned by the caller (not installed in any options).
    pub unsafe fn delete_function_list(&self, list: FunctionList) {
        unsafe { (self.raw().sass_delete_function_list)(list.as_raw()) }
    }

    /// Entry `index`, borrowed from the list.
    ///
    /// # Safety
    ///
    /// `list` must be live and `index` less than its length.
    pub unsafe fn function_get_list_entry(&self, list: FunctionList, index: usize) -> FunctionEntry {
        FunctionEntry::from_raw(unsafe {
            (self.raw().sass_function_get_list_entry)(list.as_raw(), index)
        })
    }

    /// The list takes ownership of `entry`.
    ///
    /// # Safety
    ///
    /// `list` must be live and `index` less than its length.
    pub unsafe fn function_set_list_entry(&self, list: FunctionList, index: usize, entry: FunctionEntry) {
        unsafe { (self.raw().sass_function_set_list_entry)(list.as_raw(), index, entry.as_raw()) }
    }

    /// Borrowed, copied out.
    ///
    /// # Safety
    ///
    /// `entry` must be live.
    pub unsafe fn function_get_signature(&self, entry: FunctionEntry) -> Option<String> {
        unsafe { borrowed_string((self.raw().sass_function_get_signature)(entry.as_raw())) }
    }

    /// # Safety
    ///
    /// `entry` must be live.
    pub unsafe fn function_get_function(&self, entry: FunctionEntry) -> Sass_Function_Fn {
        unsafe { (self.raw().sass_function_get_function)(entry.as_raw()) }
    }

    /// # Safety
    ///
    /// `entry` must be live.
    pub unsafe fn function_get_cookie(&self, entry: FunctionEntry) -> *mut c_void {
        unsafe { (self.raw().sass_function_get_cookie)(entry.as_raw()) }
    }
}
