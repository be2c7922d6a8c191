//! Rust closures as libsass importers and custom functions.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! libsass calls back through a plain C function pointer plus an opaque
//! cookie. [`CallbackStore`] leaks each closure into a heap slot, keeps the
//! raw slot pointer, passes it as the cookie and registers one `extern "C"`
//! trampoline per callback kind. The store frees the slots when it is
//! dropped. The trampoline reads the cookie back from the entry it is called
//! with and dispatches to the closure.
//!
//! A closure that panics does not unwind into libsass. The panic is caught
//! and turned into data: an error value for functions, an import error for
//! importers. Both fail the compilation with the panic message.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::ptr::{self, NonNull};

use libsass_sys::{
    Sass_Compiler, Sass_Function_Entry, Sass_Import_List, Sass_Importer_Entry, Sass_Value,
    c_char,
};
use tracing::{debug, error};

use crate::error::Result;
use crate::handle::{Compiler, FunctionEntry, ImportList, ImporterEntry, Value};
use crate::library::Sass;
use crate::memory::borrowed_string;

type ImporterCallback = dyn Fn(&Sass, &str, Compiler) -> Option<ImportList>;
type FunctionCallback = dyn Fn(&Sass, Value, Compiler) -> Value;

struct ImporterSlot {
    callback: Box<ImporterCallback>,
}

struct FunctionSlot {
    signature: String,
    callback: Box<FunctionCallback>,
}

/// Owns the closures behind importer and function entries.
///
/// Every entry created from a store points into it. The store must outlive
/// every compilation that can invoke those entries, and must not be dropped
/// while libsass is running a callback from it.
#[derive(Default)]
pub struct CallbackStore {
    importers: Vec<NonNull<ImporterSlot>>,
    functions: Vec<NonNull<FunctionSlot>>,
}

impl CallbackStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an importer entry that dispatches to `callback`.
    ///
    /// The callback receives the URL as written in the `@import` and the
    /// running compiler. It returns `None` to decline the URL, or an
    /// [`ImportList`] (ownership passes to libsass) built with
    /// [`Sass::import_list_from`] or [`Sass::import_error_list`]. Importers
    /// with a higher `priority` are consulted first.
    pub fn importer<F>(&mut self, sass: &Sass, priority: f64, callback: F) -> ImporterEntry
    where
        F: Fn(&Sass, &str, Compiler) -> Option<ImportList> + 'static,
    {
        let slot = leak(ImporterSlot {
            callback: Box::new(callback),
        });
        self.importers.push(slot);
        // SAFETY: the trampoline is 'static and the slot is freed only when
        // self is dropped
        unsafe { sass.make_importer(Some(importer_trampoline), priority, slot.as_ptr().cast()) }
    }

    /// Create a function entry for `signature` that dispatches to `callback`.
    ///
    /// The callback receives the arguments as a borrowed list value and must
    /// return an owned value (ownership passes to libsass). Returning
    /// [`Sass::make_error`] fails the compilation with its message.
    pub fn function<F>(&mut self, sass: &Sass, signature: &str, callback: F) -> Result<FunctionEntry>
    where
        F: Fn(&Sass, Value, Compiler) -> Value + 'static,
    {
        let slot = leak(FunctionSlot {
            signature: signature.to_string(),
            callback: Box::new(callback),
        });
        // SAFETY: as for importers
        match unsafe { sass.make_function(signature, Some(function_trampoline), slot.as_ptr().cast()) } {
            Ok(entry) => {
                self.functions.push(slot);
                Ok(entry)
            }
            Err(err) => {
                // SAFETY: no entry refers to the slot
                drop(unsafe { Box::from_raw(slot.as_ptr()) });
                Err(err)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.importers.len() + self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.importers.is_empty() && self.functions.is_empty()
    }

    /// Signatures of the registered functions, in registration order.
    pub fn function_signatures(&self) -> impl Iterator<Item = &str> {
        // SAFETY: slots stay live until self is dropped
        self.functions
            .iter()
            .map(|slot| unsafe { slot.as_ref() }.signature.as_str())
    }
}

impl Drop for CallbackStore {
    fn drop(&mut self) {
        // SAFETY: every slot came from Box::leak in `leak` and is freed once
        unsafe {
            for slot in self.importers.drain(..) {
                drop(Box::from_raw(slot.as_ptr()));
            }
            for slot in self.functions.drain(..) {
                drop(Box::from_raw(slot.as_ptr()));
            }
        }
    }
}

fn leak<T>(slot: T) -> NonNull<T> {
    NonNull::from(Box::leak(Box::new(slot)))
}

impl fmt::Debug for CallbackStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackStore")
            .field("importers", &self.importers.len())
            .field("functions", &self.function_signatures().collect::<Vec<_>>())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "callback panicked".to_string()
    }
}

/// libsass error messages are C strings.
fn without_nul(message: &str) -> String {
    message.replace('\0', "")
}

unsafe extern "C" fn importer_trampoline(
    url: *const c_char,
    entry: Sass_Importer_Entry,
    compiler: *mut Sass_Compiler,
) -> Sass_Import_List {
    let Some(sass) = Sass::loaded() else {
        return ptr::null_mut();
    };
    // SAFETY: libsass passes the entry this trampoline was registered with
    let cookie = unsafe { sass.importer_get_cookie(ImporterEntry::from_raw(entry)) };
    if cookie.is_null() {
        return ptr::null_mut();
    }
    // SAFETY: the cookie is a live ImporterSlot owned by a CallbackStore
    let slot = unsafe { &*cookie.cast::<ImporterSlot>() };
    let url = unsafe { borrowed_string(url) }.unwrap_or_default();
    debug!(url = %url, "Dispatching Sass importer");

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        (slot.callback)(&sass, &url, Compiler::from_raw(compiler))
    }));
    match outcome {
        Ok(Some(list)) => list.as_raw(),
        Ok(None) => ptr::null_mut(),
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(url = %url, message = %message, "Sass importer panicked");
            let message = without_nul(&format!("importer panicked: {message}"));
            sass.import_error_list(&without_nul(&url), &message, 0, 0)
                .map_or(ptr::null_mut(), ImportList::as_raw)
        }
    }
}

unsafe extern "C" fn function_trampoline(
    arguments: *const Sass_Value,
    entry: Sass_Function_Entry,
    compiler: *mut Sass_Compiler,
) -> *mut Sass_Value {
    let Some(sass) = Sass::loaded() else {
        return ptr::null_mut();
    };
    // SAFETY: libsass passes the entry this trampoline was registered with
    let cookie = unsafe { sass.function_get_cookie(FunctionEntry::from_raw(entry)) };
    if cookie.is_null() {
        return sass.make_null().as_raw();
    }
    // SAFETY: the cookie is a live FunctionSlot owned by a CallbackStore
    let slot = unsafe { &*cookie.cast::<FunctionSlot>() };
    debug!(signature = %slot.signature, "Dispatching Sass function");

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        (slot.callback)(&sass, Value::from_raw(arguments.cast_mut()), Compiler::from_raw(compiler))
    }));
    match outcome {
        Ok(value) => value.as_raw(),
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(signature = %slot.signature, message = %message, "Sass function panicked");
            let message = without_nul(&format!("{} panicked: {message}", slot.signature));
            sass.make_error(&message).map_or(ptr::null_mut(), Value::as_raw)
        }
    }
}
