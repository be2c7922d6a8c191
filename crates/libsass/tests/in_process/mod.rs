//! An in-process implementation of the libsass C API.
//!
//! It is not a Sass compiler. Compiling copies the source through and only
//! understands two constructs: `@import "url";` lines, answered by header and
//! custom importers or by files on disk, and calls to registered custom
//! functions whose arguments are numbers or bare words. Compressed output
//! squeezes whitespace. That is enough to drive every crossing the binding
//! makes: buffers it hands over, strings it takes back, and callbacks found
//! again through their cookies.
//!
//! Every buffer from `sass_alloc_memory` is tracked, so tests can check that
//! the binding frees what it takes exactly once and never frees anything else.

#![allow(dead_code)]

use std::collections::BTreeSet;
use std::ffi::{CStr, CString};
use std::fs;
use std::mem;
use std::path::{Path, PathBuf};
use std::ptr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use libsass::Sass;
use libsass::sys::*;

/// Install this implementation as the process-wide library.
pub fn install() -> Sass {
    // SAFETY: `resolve` only hands out functions defined below, each with the
    // signature declared for its name
    match unsafe { SassLibrary::from_symbols(resolve) } {
        Ok(library) => Sass::install(library),
        Err(name) => panic!("in-process libsass does not define {name}"),
    }
}

// Allocation tracking

static LIVE: Mutex<BTreeSet<usize>> = Mutex::new(BTreeSet::new());
static INVALID_FREES: AtomicUsize = AtomicUsize::new(0);

fn live() -> MutexGuard<'static, BTreeSet<usize>> {
    LIVE.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Whether `ptr` came from `sass_alloc_memory` and has not been freed.
pub fn is_live(ptr: *const c_char) -> bool {
    live().contains(&(ptr as usize))
}

/// Calls to `sass_free_memory` with a pointer that was never allocated here
/// or was already freed.
pub fn invalid_frees() -> usize {
    INVALID_FREES.load(Ordering::SeqCst)
}

unsafe extern "C" fn sass_alloc_memory(size: size_t) -> *mut c_void {
    let ptr = unsafe { libc::malloc(size.max(1)) };
    if !ptr.is_null() {
        live().insert(ptr as usize);
    }
    ptr
}

unsafe extern "C" fn sass_free_memory(ptr: *mut c_void) {
    if ptr.is_null() {
        return;
    }
    if live().remove(&(ptr as usize)) {
        unsafe { libc::free(ptr) }
    } else {
        INVALID_FREES.fetch_add(1, Ordering::SeqCst);
    }
}

fn dup_bytes(bytes: &[u8]) -> *mut c_char {
    let ptr = unsafe { sass_alloc_memory(bytes.len() + 1) }.cast::<u8>();
    if ptr.is_null() {
        return ptr::null_mut();
    }
    unsafe {
        ptr::copy_nonoverlapping(bytes.as_ptr(), ptr, bytes.len());
        *ptr.add(bytes.len()) = 0;
    }
    ptr.cast()
}

fn dup(text: &str) -> *mut c_char {
    dup_bytes(text.as_bytes())
}

unsafe fn dup_c(ptr: *const c_char) -> *mut c_char {
    if ptr.is_null() {
        ptr::null_mut()
    } else {
        dup_bytes(unsafe { CStr::from_ptr(ptr) }.to_bytes())
    }
}

unsafe fn release(ptr: *mut c_char) {
    unsafe { sass_free_memory(ptr.cast()) }
}

unsafe fn read(ptr: *const c_char) -> String {
    if ptr.is_null() {
        String::new()
    } else {
        unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
    }
}

#[cfg(unix)]
unsafe fn read_path(ptr: *const c_char) -> PathBuf {
    use std::os::unix::ffi::OsStrExt;

    if ptr.is_null() {
        return PathBuf::new();
    }
    let bytes = unsafe { CStr::from_ptr(ptr) }.to_bytes();
    PathBuf::from(std::ffi::OsStr::from_bytes(bytes))
}

#[cfg(not(unix))]
unsafe fn read_path(ptr: *const c_char) -> PathBuf {
    PathBuf::from(unsafe { read(ptr) })
}

fn c_text(text: &str) -> CString {
    CString::new(text.replace('\0', "")).unwrap_or_default()
}

unsafe extern "C" fn sass_copy_c_string(value: *const c_char) -> *mut c_char {
    unsafe { dup_c(value) }
}

unsafe extern "C" fn libsass_version() -> *const c_char {
    c"3.6.6".as_ptr()
}

unsafe extern "C" fn libsass_language_version() -> *const c_char {
    c"3.5".as_ptr()
}

// Values

enum Val {
    Boolean(bool),
    Number(f64, *mut c_char),
    Color([f64; 4]),
    Str(*mut c_char, bool),
    List(Sass_Separator, bool, Vec<*mut Sass_Value>),
    Map(Vec<*mut Sass_Value>, Vec<*mut Sass_Value>),
    Null,
    Error(*mut c_char),
    Warning(*mut c_char),
}

fn new_value(val: Val) -> *mut Sass_Value {
    Box::into_raw(Box::new(val)).cast()
}

unsafe fn value<'a>(v: *const Sass_Value) -> &'a Val {
    unsafe { &*v.cast::<Val>() }
}

unsafe fn value_mut<'a>(v: *mut Sass_Value) -> &'a mut Val {
    unsafe { &mut *v.cast::<Val>() }
}

unsafe extern "C" fn sass_make_null() -> *mut Sass_Value {
    new_value(Val::Null)
}

unsafe extern "C" fn sass_make_boolean(val: bool) -> *mut Sass_Value {
    new_value(Val::Boolean(val))
}

unsafe extern "C" fn sass_make_string(val: *const c_char) -> *mut Sass_Value {
    new_value(Val::Str(unsafe { dup_c(val) }, false))
}

unsafe extern "C" fn sass_make_qstring(val: *const c_char) -> *mut Sass_Value {
    new_value(Val::Str(unsafe { dup_c(val) }, true))
}

unsafe extern "C" fn sass_make_number(val: c_double, unit: *const c_char) -> *mut Sass_Value {
    new_value(Val::Number(val, unsafe { dup_c(unit) }))
}

unsafe extern "C" fn sass_make_color(r: c_double, g: c_double, b: c_double, a: c_double) -> *mut Sass_Value {
    new_value(Val::Color([r, g, b, a]))
}

unsafe extern "C" fn sass_make_list(len: size_t, sep: Sass_Separator, is_bracketed: bool) -> *mut Sass_Value {
    new_value(Val::List(sep, is_bracketed, vec![ptr::null_mut(); len]))
}

unsafe extern "C" fn sass_make_map(len: size_t) -> *mut Sass_Value {
    new_value(Val::Map(vec![ptr::null_mut(); len], vec![ptr::null_mut(); len]))
}

unsafe extern "C" fn sass_make_error(msg: *const c_char) -> *mut Sass_Value {
    new_value(Val::Error(unsafe { dup_c(msg) }))
}

unsafe extern "C" fn sass_make_warning(msg: *const c_char) -> *mut Sass_Value {
    new_value(Val::Warning(unsafe { dup_c(msg) }))
}

unsafe extern "C" fn sass_delete_value(val: *mut Sass_Value) {
    if val.is_null() {
        return;
    }
    let val = unsafe { Box::from_raw(val.cast::<Val>()) };
    unsafe {
        match *val {
            Val::Number(_, unit) => release(unit),
            Val::Str(text, _) | Val::Error(text) | Val::Warning(text) => release(text),
            Val::List(_, _, items) => {
                for item in items {
                    sass_delete_value(item);
                }
            }
            Val::Map(keys, values) => {
                for item in keys.into_iter().chain(values) {
                    sass_delete_value(item);
                }
            }
            Val::Boolean(_) | Val::Color(_) | Val::Null => {}
        }
    }
}

unsafe extern "C" fn sass_clone_value(val: *const Sass_Value) -> *mut Sass_Value {
    if val.is_null() {
        return ptr::null_mut();
    }
    let copy = unsafe {
        match value(val) {
            Val::Boolean(flag) => Val::Boolean(*flag),
            Val::Number(number, unit) => Val::Number(*number, dup_c(*unit)),
            Val::Color(channels) => Val::Color(*channels),
            Val::Str(text, quoted) => Val::Str(dup_c(*text), *quoted),
            Val::List(sep, bracketed, items) => Val::List(
                *sep,
                *bracketed,
                items.iter().map(|item| sass_clone_value(*item)).collect(),
            ),
            Val::Map(keys, values) => Val::Map(
                keys.iter().map(|item| sass_clone_value(*item)).collect(),
                values.iter().map(|item| sass_clone_value(*item)).collect(),
            ),
            Val::Null => Val::Null,
            Val::Error(text) => Val::Error(dup_c(*text)),
            Val::Warning(text) => Val::Warning(dup_c(*text)),
        }
    };
    new_value(copy)
}

unsafe extern "C" fn sass_value_op(op: Sass_OP, a: *const Sass_Value, b: *const Sass_Value) -> *mut Sass_Value {
    let (a, b) = unsafe { (value(a), value(b)) };
    match (a, b) {
        (Val::Number(x, unit_a), Val::Number(y, unit_b)) => {
            let unit = if unsafe { read(*unit_a) }.is_empty() { *unit_b } else { *unit_a };
            let number = |result: f64| new_value(Val::Number(result, unsafe { dup_c(unit) }));
            match op {
                ADD => number(x + y),
                SUB => number(x - y),
                MUL => number(x * y),
                DIV => number(x / y),
                MOD => number(x % y),
                EQ => new_value(Val::Boolean((x - y).abs() < f64::EPSILON)),
                NEQ => new_value(Val::Boolean((x - y).abs() >= f64::EPSILON)),
                GT => new_value(Val::Boolean(x > y)),
                GTE => new_value(Val::Boolean(x >= y)),
                LT => new_value(Val::Boolean(x < y)),
                LTE => new_value(Val::Boolean(x <= y)),
                _ => new_value(Val::Error(dup("Undefined operation"))),
            }
        }
        (Val::Boolean(x), Val::Boolean(y)) if op == AND => new_value(Val::Boolean(*x && *y)),
        (Val::Boolean(x), Val::Boolean(y)) if op == OR => new_value(Val::Boolean(*x || *y)),
        (Val::Str(x, quoted), Val::Str(y, _)) if op == ADD => {
            let joined = unsafe { read(*x) + &read(*y) };
            new_value(Val::Str(dup(&joined), *quoted))
        }
        _ => new_value(Val::Error(dup("Undefined operation"))),
    }
}

fn format_number(number: f64, precision: c_int) -> String {
    let digits = usize::try_from(precision).unwrap_or(0);
    let text = format!("{number:.digits$}");
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}

unsafe fn render(val: *const Sass_Value, precision: c_int) -> String {
    if val.is_null() {
        return String::new();
    }
    unsafe {
        match value(val) {
            Val::Boolean(flag) => flag.to_string(),
            Val::Number(number, unit) => format!("{}{}", format_number(*number, precision), read(*unit)),
            Val::Color([r, g, b, a]) => format!(
                "rgba({}, {}, {}, {})",
                format_number(*r, 0),
                format_number(*g, 0),
                format_number(*b, 0),
                format_number(*a, precision)
            ),
            Val::Str(text, true) => format!("\"{}\"", read(*text)),
            Val::Str(text, false) => read(*text),
            Val::List(sep, _, items) => items
                .iter()
                .map(|item| render(*item, precision))
                .collect::<Vec<_>>()
                .join(if *sep == SASS_COMMA { ", " } else { " " }),
            Val::Map(keys, values) => format!(
                "({})",
                keys.iter()
                    .zip(values)
                    .map(|(key, entry)| format!("{}: {}", render(*key, precision), render(*entry, precision)))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Val::Null => "null".to_string(),
            Val::Error(text) | Val::Warning(text) => read(*text),
        }
    }
}

unsafe extern "C" fn sass_value_stringify(a: *const Sass_Value, _compressed: bool, precision: c_int) -> *mut Sass_Value {
    let text = unsafe { render(a, precision) };
    new_value(Val::Str(dup(&text), false))
}

unsafe extern "C" fn sass_value_get_tag(v: *const Sass_Value) -> Sass_Tag {
    match unsafe { value(v) } {
        Val::Boolean(_) => SASS_BOOLEAN,
        Val::Number(..) => SASS_NUMBER,
        Val::Color(_) => SASS_COLOR,
        Val::Str(..) => SASS_STRING,
        Val::List(..) => SASS_LIST,
        Val::Map(..) => SASS_MAP,
        Val::Null => SASS_NULL,
        Val::Error(_) => SASS_ERROR,
        Val::Warning(_) => SASS_WARNING,
    }
}

macro_rules! tag_predicates {
    ($($name:ident => $tag:ident;)*) => {
        $(
            unsafe extern "C" fn $name(v: *const Sass_Value) -> bool {
                unsafe { sass_value_get_tag(v) == $tag }
            }
        )*
    };
}

tag_predicates! {
    sass_value_is_null => SASS_NULL;
    sass_value_is_number => SASS_NUMBER;
    sass_value_is_string => SASS_STRING;
    sass_value_is_boolean => SASS_BOOLEAN;
    sass_value_is_color => SASS_COLOR;
    sass_value_is_list => SASS_LIST;
    sass_value_is_map => SASS_MAP;
    sass_value_is_error => SASS_ERROR;
    sass_value_is_warning => SASS_WARNING;
}

unsafe extern "C" fn sass_number_get_value(v: *const Sass_Value) -> c_double {
    match unsafe { value(v) } {
        Val::Number(number, _) => *number,
        _ => 0.0,
    }
}

unsafe extern "C" fn sass_number_set_value(v: *mut Sass_Value, value: c_double) {
    if let Val::Number(number, _) = unsafe { value_mut(v) } {
        *number = value;
    }
}

unsafe extern "C" fn sass_number_get_unit(v: *const Sass_Value) -> *const c_char {
    match unsafe { value(v) } {
        Val::Number(_, unit) => *unit,
        _ => ptr::null(),
    }
}

unsafe extern "C" fn sass_number_set_unit(v: *mut Sass_Value, unit: *mut c_char) {
    if let Val::Number(_, old) = unsafe { value_mut(v) } {
        unsafe { release(*old) };
        *old = unit;
    }
}

unsafe extern "C" fn sass_string_get_value(v: *const Sass_Value) -> *const c_char {
    match unsafe { value(v) } {
        Val::Str(text, _) => *text,
        _ => ptr::null(),
    }
}

unsafe extern "C" fn sass_string_set_value(v: *mut Sass_Value, value: *mut c_char) {
    if let Val::Str(old, _) = unsafe { value_mut(v) } {
        unsafe { release(*old) };
        *old = value;
    }
}

unsafe extern "C" fn sass_string_is_quoted(v: *const Sass_Value) -> bool {
    matches!(unsafe { value(v) }, Val::Str(_, true))
}

unsafe extern "C" fn sass_string_set_quoted(v: *mut Sass_Value, quoted: bool) {
    if let Val::Str(_, flag) = unsafe { value_mut(v) } {
        *flag = quoted;
    }
}

unsafe extern "C" fn sass_boolean_get_value(v: *const Sass_Value) -> bool {
    matches!(unsafe { value(v) }, Val::Boolean(true))
}

unsafe extern "C" fn sass_boolean_set_value(v: *mut Sass_Value, value: bool) {
    if let Val::Boolean(flag) = unsafe { value_mut(v) } {
        *flag = value;
    }
}

macro_rules! color_channels {
    ($($get:ident, $set:ident => $index:literal;)*) => {
        $(
            unsafe extern "C" fn $get(v: *const Sass_Value) -> c_double {
                match unsafe { value(v) } {
                    Val::Color(channels) => channels[$index],
                    _ => 0.0,
                }
            }

            unsafe extern "C" fn $set(v: *mut Sass_Value, channel: c_double) {
                if let Val::Color(channels) = unsafe { value_mut(v) } {
                    channels[$index] = channel;
                }
            }
        )*
    };
}

color_channels! {
    sass_color_get_r, sass_color_set_r => 0;
    sass_color_get_g, sass_color_set_g => 1;
    sass_color_get_b, sass_color_set_b => 2;
    sass_color_get_a, sass_color_set_a => 3;
}

unsafe extern "C" fn sass_list_get_length(v: *const Sass_Value) -> size_t {
    match unsafe { value(v) } {
        Val::List(_, _, items) => items.len(),
        _ => 0,
    }
}

unsafe extern "C" fn sass_list_get_separator(v: *const Sass_Value) -> Sass_Separator {
    match unsafe { value(v) } {
        Val::List(sep, _, _) => *sep,
        _ => SASS_SPACE,
    }
}

unsafe extern "C" fn sass_list_set_separator(v: *mut Sass_Value, value: Sass_Separator) {
    if let Val::List(sep, _, _) = unsafe { value_mut(v) } {
        *sep = value;
    }
}

unsafe extern "C" fn sass_list_get_is_bracketed(v: *const Sass_Value) -> bool {
    matches!(unsafe { value(v) }, Val::List(_, true, _))
}

unsafe extern "C" fn sass_list_set_is_bracketed(v: *mut Sass_Value, value: bool) {
    if let Val::List(_, bracketed, _) = unsafe { value_mut(v) } {
        *bracketed = value;
    }
}

unsafe extern "C" fn sass_list_get_value(v: *const Sass_Value, i: size_t) -> *mut Sass_Value {
    match unsafe { value(v) } {
        Val::List(_, _, items) => items.get(i).copied().unwrap_or(ptr::null_mut()),
        _ => ptr::null_mut(),
    }
}

unsafe extern "C" fn sass_list_set_value(v: *mut Sass_Value, i: size_t, value: *mut Sass_Value) {
    if let Val::List(_, _, items) = unsafe { value_mut(v) } {
        if let Some(slot) = items.get_mut(i) {
            *slot = value;
        }
    }
}

unsafe extern "C" fn sass_map_get_length(v: *const Sass_Value) -> size_t {
    match unsafe { value(v) } {
        Val::Map(keys, _) => keys.len(),
        _ => 0,
    }
}

unsafe extern "C" fn sass_map_get_key(v: *const Sass_Value, i: size_t) -> *mut Sass_Value {
    match unsafe { value(v) } {
        Val::Map(keys, _) => keys.get(i).copied().unwrap_or(ptr::null_mut()),
        _ => ptr::null_mut(),
    }
}

unsafe extern "C" fn sass_map_set_key(v: *mut Sass_Value, i: size_t, key: *mut Sass_Value) {
    if let Val::Map(keys, _) = unsafe { value_mut(v) } {
        if let Some(slot) = keys.get_mut(i) {
            *slot = key;
        }
    }
}

unsafe extern "C" fn sass_map_get_value(v: *const Sass_Value, i: size_t) -> *mut Sass_Value {
    match unsafe { value(v) } {
        Val::Map(_, values) => values.get(i).copied().unwrap_or(ptr::null_mut()),
        _ => ptr::null_mut(),
    }
}

unsafe extern "C" fn sass_map_set_value(v: *mut Sass_Value, i: size_t, value: *mut Sass_Value) {
    if let Val::Map(_, values) = unsafe { value_mut(v) } {
        if let Some(slot) = values.get_mut(i) {
            *slot = value;
        }
    }
}

unsafe extern "C" fn sass_error_get_message(v: *const Sass_Value) -> *mut c_char {
    match unsafe { value(v) } {
        Val::Error(text) => *text,
        _ => ptr::null_mut(),
    }
}

unsafe extern "C" fn sass_error_set_message(v: *mut Sass_Value, msg: *mut c_char) {
    if let Val::Error(old) = unsafe { value_mut(v) } {
        unsafe { release(*old) };
        *old = msg;
    }
}

unsafe extern "C" fn sass_warning_get_message(v: *const Sass_Value) -> *mut c_char {
    match unsafe { value(v) } {
        Val::Warning(text) => *text,
        _ => ptr::null_mut(),
    }
}

unsafe extern "C" fn sass_warning_set_message(v: *mut Sass_Value, msg: *mut c_char) {
    if let Val::Warning(old) = unsafe { value_mut(v) } {
        unsafe { release(*old) };
        *old = msg;
    }
}

// Null-terminated pointer arrays, as libsass allocates them

unsafe fn make_slots<T>(length: size_t) -> *mut *mut T {
    unsafe { libc::calloc(length + 1, mem::size_of::<*mut T>()) }.cast()
}

unsafe fn slots<T>(list: *mut *mut T) -> Vec<*mut T> {
    let mut entries = Vec::new();
    if list.is_null() {
        return entries;
    }
    loop {
        let entry = unsafe { *list.add(entries.len()) };
        if entry.is_null() {
            return entries;
        }
        entries.push(entry);
    }
}

// Importers

struct Importer {
    function: Sass_Importer_Fn,
    priority: c_double,
    cookie: *mut c_void,
}

unsafe fn importer<'a>(entry: Sass_Importer_Entry) -> &'a Importer {
    unsafe { &*entry.cast::<Importer>() }
}

unsafe extern "C" fn sass_make_importer_list(length: size_t) -> Sass_Importer_List {
    unsafe { make_slots(length) }
}

unsafe extern "C" fn sass_importer_get_list_entry(list: Sass_Importer_List, idx: size_t) -> Sass_Importer_Entry {
    unsafe { *list.add(idx) }
}

unsafe extern "C" fn sass_importer_set_list_entry(list: Sass_Importer_List, idx: size_t, entry: Sass_Importer_Entry) {
    unsafe { *list.add(idx) = entry }
}

unsafe extern "C" fn sass_delete_importer_list(list: Sass_Importer_List) {
    unsafe {
        for entry in slots(list) {
            sass_delete_importer(entry);
        }
        libc::free(list.cast());
    }
}

unsafe extern "C" fn sass_make_importer(
    importer: Sass_Importer_Fn,
    priority: c_double,
    cookie: *mut c_void,
) -> Sass_Importer_Entry {
    Box::into_raw(Box::new(Importer {
        function: importer,
        priority,
        cookie,
    }))
    .cast()
}

unsafe extern "C" fn sass_importer_get_function(cb: Sass_Importer_Entry) -> Sass_Importer_Fn {
    unsafe { importer(cb) }.function
}

unsafe extern "C" fn sass_importer_get_priority(cb: Sass_Importer_Entry) -> c_double {
    unsafe { importer(cb) }.priority
}

unsafe extern "C" fn sass_importer_get_cookie(cb: Sass_Importer_Entry) -> *mut c_void {
    unsafe { importer(cb) }.cookie
}

unsafe extern "C" fn sass_delete_importer(cb: Sass_Importer_Entry) {
    if !cb.is_null() {
        drop(unsafe { Box::from_raw(cb.cast::<Importer>()) });
    }
}

// Imports

struct Import {
    imp_path: *mut c_char,
    abs_path: *mut c_char,
    source: *mut c_char,
    srcmap: *mut c_char,
    error: *mut c_char,
    line: size_t,
    column: size_t,
}

unsafe fn import<'a>(entry: Sass_Import_Entry) -> &'a mut Import {
    unsafe { &mut *entry.cast::<Import>() }
}

unsafe extern "C" fn sass_make_import_list(length: size_t) -> Sass_Import_List {
    unsafe { make_slots(length) }
}

unsafe extern "C" fn sass_make_import_entry(path: *const c_char, source: *mut c_char, srcmap: *mut c_char) -> Sass_Import_Entry {
    unsafe { sass_make_import(path, path, source, srcmap) }
}

unsafe extern "C" fn sass_make_import(
    imp_path: *const c_char,
    abs_base: *const c_char,
    source: *mut c_char,
    srcmap: *mut c_char,
) -> Sass_Import_Entry {
    Box::into_raw(Box::new(Import {
        imp_path: unsafe { dup_c(imp_path) },
        abs_path: unsafe { dup_c(abs_base) },
        source,
        srcmap,
        error: ptr::null_mut(),
        line: 0,
        column: 0,
    }))
    .cast()
}

unsafe extern "C" fn sass_import_set_error(
    entry: Sass_Import_Entry,
    message: *const c_char,
    line: size_t,
    col: size_t,
) -> Sass_Import_Entry {
    let target = unsafe { import(entry) };
    unsafe {
        release(target.error);
        target.error = dup_c(message);
    }
    target.line = line;
    target.column = col;
    entry
}

unsafe extern "C" fn sass_import_set_list_entry(list: Sass_Import_List, idx: size_t, entry: Sass_Import_Entry) {
    unsafe { *list.add(idx) = entry }
}

unsafe extern "C" fn sass_import_get_list_entry(list: Sass_Import_List, idx: size_t) -> Sass_Import_Entry {
    unsafe { *list.add(idx) }
}

unsafe extern "C" fn sass_import_get_imp_path(entry: Sass_Import_Entry) -> *const c_char {
    unsafe { import(entry) }.imp_path
}

unsafe extern "C" fn sass_import_get_abs_path(entry: Sass_Import_Entry) -> *const c_char {
    unsafe { import(entry) }.abs_path
}

unsafe extern "C" fn sass_import_get_source(entry: Sass_Import_Entry) -> *const c_char {
    unsafe { import(entry) }.source
}

unsafe extern "C" fn sass_import_get_srcmap(entry: Sass_Import_Entry) -> *const c_char {
    unsafe { import(entry) }.srcmap
}

unsafe extern "C" fn sass_import_take_source(entry: Sass_Import_Entry) -> *mut c_char {
    mem::replace(&mut unsafe { import(entry) }.source, ptr::null_mut())
}

unsafe extern "C" fn sass_import_take_srcmap(entry: Sass_Import_Entry) -> *mut c_char {
    mem::replace(&mut unsafe { import(entry) }.srcmap, ptr::null_mut())
}

unsafe extern "C" fn sass_import_get_error_line(entry: Sass_Import_Entry) -> size_t {
    unsafe { import(entry) }.line
}

unsafe extern "C" fn sass_import_get_error_column(entry: Sass_Import_Entry) -> size_t {
    unsafe { import(entry) }.column
}

unsafe extern "C" fn sass_import_get_error_message(entry: Sass_Import_Entry) -> *const c_char {
    unsafe { import(entry) }.error
}

unsafe extern "C" fn sass_delete_import_list(list: Sass_Import_List) {
    unsafe {
        for entry in slots(list) {
            sass_delete_import(entry);
        }
        libc::free(list.cast());
    }
}

unsafe extern "C" fn sass_delete_import(entry: Sass_Import_Entry) {
    if entry.is_null() {
        return;
    }
    let entry = unsafe { Box::from_raw(entry.cast::<Import>()) };
    unsafe {
        for text in [entry.imp_path, entry.abs_path, entry.source, entry.srcmap, entry.error] {
            release(text);
        }
    }
}

// Custom functions

struct Function {
    signature: *mut c_char,
    function: Sass_Function_Fn,
    cookie: *mut c_void,
}

unsafe fn function<'a>(entry: Sass_Function_Entry) -> &'a Function {
    unsafe { &*entry.cast::<Function>() }
}

unsafe extern "C" fn sass_make_function_list(length: size_t) -> Sass_Function_List {
    unsafe { make_slots(length) }
}

unsafe extern "C" fn sass_make_function(signature: *const c_char, cb: Sass_Function_Fn, cookie: *mut c_void) -> Sass_Function_Entry {
    Box::into_raw(Box::new(Function {
        signature: unsafe { dup_c(signature) },
        function: cb,
        cookie,
    }))
    .cast()
}

unsafe extern "C" fn sass_delete_function(entry: Sass_Function_Entry) {
    if entry.is_null() {
        return;
    }
    let entry = unsafe { Box::from_raw(entry.cast::<Function>()) };
    unsafe { release(entry.signature) };
}

unsafe extern "C" fn sass_delete_function_list(list: Sass_Function_List) {
    unsafe {
        for entry in slots(list) {
            sass_delete_function(entry);
        }
        libc::free(list.cast());
    }
}

unsafe extern "C" fn sass_function_get_list_entry(list: Sass_Function_List, pos: size_t) -> Sass_Function_Entry {
    unsafe { *list.add(pos) }
}

unsafe extern "C" fn sass_function_set_list_entry(list: Sass_Function_List, pos: size_t, cb: Sass_Function_Entry) {
    unsafe { *list.add(pos) = cb }
}

unsafe extern "C" fn sass_function_get_signature(cb: Sass_Function_Entry) -> *const c_char {
    unsafe { function(cb) }.signature
}

unsafe extern "C" fn sass_function_get_function(cb: Sass_Function_Entry) -> Sass_Function_Fn {
    unsafe { function(cb) }.function
}

unsafe extern "C" fn sass_function_get_cookie(cb: Sass_Function_Entry) -> *mut c_void {
    unsafe { function(cb) }.cookie
}

// Options

struct Opts {
    precision: c_int,
    output_style: Sass_Output_Style,
    source_comments: bool,
    source_map_embed: bool,
    source_map_contents: bool,
    source_map_file_urls: bool,
    omit_source_map_url: bool,
    is_indented_syntax_src: bool,
    indent: *const c_char,
    linefeed: *const c_char,
    input_path: *mut c_char,
    output_path: *mut c_char,
    plugin_path: *mut c_char,
    include_path: *mut c_char,
    source_map_file: *mut c_char,
    source_map_root: *mut c_char,
    include_paths: Vec<*mut c_char>,
    plugin_paths: Vec<*mut c_char>,
    c_headers: Sass_Importer_List,
    c_importers: Sass_Importer_List,
    c_functions: Sass_Function_List,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            precision: 10,
            output_style: SASS_STYLE_NESTED,
            source_comments: false,
            source_map_embed: false,
            source_map_contents: false,
            source_map_file_urls: false,
            omit_source_map_url: false,
            is_indented_syntax_src: false,
            indent: c"  ".as_ptr(),
            linefeed: c"\n".as_ptr(),
            input_path: ptr::null_mut(),
            output_path: ptr::null_mut(),
            plugin_path: ptr::null_mut(),
            include_path: ptr::null_mut(),
            source_map_file: ptr::null_mut(),
            source_map_root: ptr::null_mut(),
            include_paths: Vec::new(),
            plugin_paths: Vec::new(),
            c_headers: ptr::null_mut(),
            c_importers: ptr::null_mut(),
            c_functions: ptr::null_mut(),
        }
    }
}

unsafe fn opts<'a>(options: *mut Sass_Options) -> &'a mut Opts {
    unsafe { &mut *options.cast::<Opts>() }
}

/// Free everything `options` owns and reset it to the defaults.
unsafe fn clear_options(options: &mut Opts) {
    let owned = mem::take(options);
    let strings = [
        owned.input_path,
        owned.output_path,
        owned.plugin_path,
        owned.include_path,
        owned.source_map_file,
        owned.source_map_root,
    ];
    unsafe {
        for text in strings.into_iter().chain(owned.include_paths).chain(owned.plugin_paths) {
            release(text);
        }
        sass_delete_importer_list(owned.c_headers);
        sass_delete_importer_list(owned.c_importers);
        sass_delete_function_list(owned.c_functions);
    }
}

unsafe extern "C" fn sass_make_options() -> *mut Sass_Options {
    Box::into_raw(Box::new(Opts::default())).cast()
}

unsafe extern "C" fn sass_delete_options(options: *mut Sass_Options) {
    if options.is_null() {
        return;
    }
    let mut options = unsafe { Box::from_raw(options.cast::<Opts>()) };
    unsafe { clear_options(&mut options) };
}

macro_rules! option_fields {
    ($($get:ident, $set:ident => $field:ident: $ty:ty;)*) => {
        $(
            unsafe extern "C" fn $get(options: *mut Sass_Options) -> $ty {
                unsafe { opts(options) }.$field
            }

            unsafe extern "C" fn $set(options: *mut Sass_Options, value: $ty) {
                unsafe { opts(options) }.$field = value;
            }
        )*
    };
}

option_fields! {
    sass_option_get_precision, sass_option_set_precision => precision: c_int;
    sass_option_get_output_style, sass_option_set_output_style => output_style: Sass_Output_Style;
    sass_option_get_source_comments, sass_option_set_source_comments => source_comments: bool;
    sass_option_get_source_map_embed, sass_option_set_source_map_embed => source_map_embed: bool;
    sass_option_get_source_map_contents, sass_option_set_source_map_contents => source_map_contents: bool;
    sass_option_get_source_map_file_urls, sass_option_set_source_map_file_urls => source_map_file_urls: bool;
    sass_option_get_omit_source_map_url, sass_option_set_omit_source_map_url => omit_source_map_url: bool;
    sass_option_get_is_indented_syntax_src, sass_option_set_is_indented_syntax_src => is_indented_syntax_src: bool;
    sass_option_get_indent, sass_option_set_indent => indent: *const c_char;
    sass_option_get_linefeed, sass_option_set_linefeed => linefeed: *const c_char;
    sass_option_get_c_headers, sass_option_set_c_headers => c_headers: Sass_Importer_List;
    sass_option_get_c_importers, sass_option_set_c_importers => c_importers: Sass_Importer_List;
    sass_option_get_c_functions, sass_option_set_c_functions => c_functions: Sass_Function_List;
}

macro_rules! option_strings {
    ($($get:ident, $set:ident => $field:ident;)*) => {
        $(
            unsafe extern "C" fn $get(options: *mut Sass_Options) -> *const c_char {
                unsafe { opts(options) }.$field
            }

            unsafe extern "C" fn $set(options: *mut Sass_Options, value: *const c_char) {
                let options = unsafe { opts(options) };
                unsafe {
                    release(options.$field);
                    options.$field = dup_c(value);
                }
            }
        )*
    };
}

option_strings! {
    sass_option_get_input_path, sass_option_set_input_path => input_path;
    sass_option_get_output_path, sass_option_set_output_path => output_path;
    sass_option_get_plugin_path, sass_option_set_plugin_path => plugin_path;
    sass_option_get_source_map_file, sass_option_set_source_map_file => source_map_file;
    sass_option_get_source_map_root, sass_option_set_source_map_root => source_map_root;
}

unsafe extern "C" fn sass_option_set_include_path(options: *mut Sass_Options, include_path: *const c_char) {
    let options = unsafe { opts(options) };
    unsafe {
        release(options.include_path);
        options.include_path = dup_c(include_path);
    }
}

unsafe extern "C" fn sass_option_get_include_path_size(options: *mut Sass_Options) -> size_t {
    unsafe { opts(options) }.include_paths.len()
}

unsafe extern "C" fn sass_option_get_include_path(options: *mut Sass_Options, i: size_t) -> *const c_char {
    let options = unsafe { opts(options) };
    options.include_paths.get(i).map_or(ptr::null(), |path| path.cast_const())
}

unsafe extern "C" fn sass_option_push_include_path(options: *mut Sass_Options, path: *const c_char) {
    let copy = unsafe { dup_c(path) };
    unsafe { opts(options) }.include_paths.push(copy);
}

unsafe extern "C" fn sass_option_push_plugin_path(options: *mut Sass_Options, path: *const c_char) {
    let copy = unsafe { dup_c(path) };
    unsafe { opts(options) }.plugin_paths.push(copy);
}

// Contexts

struct Ctx {
    options: Opts,
    is_file: bool,
    source: *mut c_char,
    output: *mut c_char,
    source_map: *mut c_char,
    error_status: c_int,
    error_json: *mut c_char,
    error_text: *mut c_char,
    error_message: *mut c_char,
    error_file: *mut c_char,
    error_src: *mut c_char,
    error_line: size_t,
    error_column: size_t,
    included_files: *mut *mut c_char,
    included_files_size: size_t,
}

impl Ctx {
    fn new(is_file: bool) -> Self {
        Self {
            options: Opts::default(),
            is_file,
            source: ptr::null_mut(),
            output: ptr::null_mut(),
            source_map: ptr::null_mut(),
            error_status: 0,
            error_json: ptr::null_mut(),
            error_text: ptr::null_mut(),
            error_message: ptr::null_mut(),
            error_file: ptr::null_mut(),
            error_src: ptr::null_mut(),
            error_line: 0,
            error_column: 0,
            included_files: ptr::null_mut(),
            included_files_size: 0,
        }
    }
}

unsafe fn ctx<'a, T>(ctx: *mut T) -> &'a mut Ctx {
    unsafe { &mut *ctx.cast::<Ctx>() }
}

unsafe fn free_included_files(ctx: &mut Ctx) {
    let files = mem::replace(&mut ctx.included_files, ptr::null_mut());
    if files.is_null() {
        return;
    }
    unsafe {
        for entry in slots(files) {
            release(entry);
        }
        release(files.cast());
    }
}

unsafe fn delete_context(ctx: *mut Ctx) {
    if ctx.is_null() {
        return;
    }
    let mut ctx = unsafe { Box::from_raw(ctx) };
    unsafe {
        clear_options(&mut ctx.options);
        for text in [
            ctx.source,
            ctx.output,
            ctx.source_map,
            ctx.error_json,
            ctx.error_text,
            ctx.error_message,
            ctx.error_file,
            ctx.error_src,
        ] {
            release(text);
        }
        free_included_files(&mut ctx);
    }
}

unsafe extern "C" fn sass_make_file_context(input_path: *const c_char) -> *mut Sass_File_Context {
    let mut ctx = Ctx::new(true);
    ctx.options.input_path = unsafe { dup_c(input_path) };
    Box::into_raw(Box::new(ctx)).cast()
}

unsafe extern "C" fn sass_make_data_context(source_string: *mut c_char) -> *mut Sass_Data_Context {
    let mut ctx = Ctx::new(false);
    ctx.source = source_string;
    Box::into_raw(Box::new(ctx)).cast()
}

unsafe extern "C" fn sass_compile_file_context(ctx: *mut Sass_File_Context) -> c_int {
    unsafe { compile_context(ctx.cast()) }
}

unsafe extern "C" fn sass_compile_data_context(ctx: *mut Sass_Data_Context) -> c_int {
    unsafe { compile_context(ctx.cast()) }
}

unsafe extern "C" fn sass_delete_file_context(ctx: *mut Sass_File_Context) {
    unsafe { delete_context(ctx.cast()) }
}

unsafe extern "C" fn sass_delete_data_context(ctx: *mut Sass_Data_Context) {
    unsafe { delete_context(ctx.cast()) }
}

unsafe extern "C" fn sass_file_context_get_context(file_ctx: *mut Sass_File_Context) -> *mut Sass_Context {
    file_ctx.cast()
}

unsafe extern "C" fn sass_data_context_get_context(data_ctx: *mut Sass_Data_Context) -> *mut Sass_Context {
    data_ctx.cast()
}

unsafe fn context_options(ctx: *mut Ctx) -> *mut Sass_Options {
    unsafe { ptr::addr_of_mut!((*ctx).options) }.cast()
}

unsafe extern "C" fn sass_context_get_options(ctx: *mut Sass_Context) -> *mut Sass_Options {
    unsafe { context_options(ctx.cast()) }
}

unsafe extern "C" fn sass_file_context_get_options(file_ctx: *mut Sass_File_Context) -> *mut Sass_Options {
    unsafe { context_options(file_ctx.cast()) }
}

unsafe extern "C" fn sass_data_context_get_options(data_ctx: *mut Sass_Data_Context) -> *mut Sass_Options {
    unsafe { context_options(data_ctx.cast()) }
}

/// Move the settings out of `from`, leaving it empty but still allocated.
unsafe fn move_options(to: *mut Ctx, from: *mut Sass_Options) {
    let target = unsafe { context_options(to) };
    if target == from {
        return;
    }
    unsafe {
        clear_options(opts(target));
        *opts(target) = mem::take(opts(from));
    }
}

unsafe extern "C" fn sass_file_context_set_options(file_ctx: *mut Sass_File_Context, opt: *mut Sass_Options) {
    unsafe { move_options(file_ctx.cast(), opt) }
}

unsafe extern "C" fn sass_data_context_set_options(data_ctx: *mut Sass_Data_Context, opt: *mut Sass_Options) {
    unsafe { move_options(data_ctx.cast(), opt) }
}

// Results

macro_rules! context_strings {
    ($($get:ident => $field:ident;)*) => {
        $(
            unsafe extern "C" fn $get(ctx: *mut Sass_Context) -> *const c_char {
                unsafe { self::ctx(ctx) }.$field
            }
        )*
    };
}

context_strings! {
    sass_context_get_output_string => output;
    sass_context_get_error_json => error_json;
    sass_context_get_error_text => error_text;
    sass_context_get_error_message => error_message;
    sass_context_get_error_file => error_file;
    sass_context_get_error_src => error_src;
    sass_context_get_source_map_string => source_map;
}

unsafe extern "C" fn sass_context_get_error_status(ctx: *mut Sass_Context) -> c_int {
    unsafe { self::ctx(ctx) }.error_status
}

unsafe extern "C" fn sass_context_get_error_line(ctx: *mut Sass_Context) -> size_t {
    unsafe { self::ctx(ctx) }.error_line
}

unsafe extern "C" fn sass_context_get_error_column(ctx: *mut Sass_Context) -> size_t {
    unsafe { self::ctx(ctx) }.error_column
}

unsafe extern "C" fn sass_context_get_included_files(ctx: *mut Sass_Context) -> *mut *mut c_char {
    unsafe { self::ctx(ctx) }.included_files
}

unsafe extern "C" fn sass_context_get_included_files_size(ctx: *mut Sass_Context) -> size_t {
    unsafe { self::ctx(ctx) }.included_files_size
}

unsafe extern "C" fn sass_context_take_output_string(ctx: *mut Sass_Context) -> *mut c_char {
    mem::replace(&mut unsafe { self::ctx(ctx) }.output, ptr::null_mut())
}

unsafe extern "C" fn sass_context_take_source_map_string(ctx: *mut Sass_Context) -> *mut c_char {
    mem::replace(&mut unsafe { self::ctx(ctx) }.source_map, ptr::null_mut())
}

unsafe extern "C" fn sass_context_take_included_files(ctx: *mut Sass_Context) -> *mut *mut c_char {
    mem::replace(&mut unsafe { self::ctx(ctx) }.included_files, ptr::null_mut())
}

// Compilers

struct Compiler {
    ctx: *mut Ctx,
    state: Sass_Compiler_State,
    stack: Vec<Sass_Import_Entry>,
    included: Vec<String>,
    parsed: String,
}

struct Failure {
    message: String,
    file: Option<String>,
    line: usize,
    column: usize,
}

impl Failure {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            file: None,
            line: 1,
            column: 1,
        }
    }

    fn within(mut self, file: &str, line: usize) -> Self {
        if self.file.is_none() {
            self.file = Some(file.to_string());
        }
        if self.line == 0 {
            self.line = line;
        }
        if self.column == 0 {
            self.column = 1;
        }
        self
    }
}

unsafe fn make_compiler(ctx: *mut Ctx) -> *mut Sass_Compiler {
    Box::into_raw(Box::new(Compiler {
        ctx,
        state: SASS_COMPILER_CREATED,
        stack: Vec::new(),
        included: Vec::new(),
        parsed: String::new(),
    }))
    .cast()
}

unsafe extern "C" fn sass_make_file_compiler(file_ctx: *mut Sass_File_Context) -> *mut Sass_Compiler {
    unsafe { make_compiler(file_ctx.cast()) }
}

unsafe extern "C" fn sass_make_data_compiler(data_ctx: *mut Sass_Data_Context) -> *mut Sass_Compiler {
    unsafe { make_compiler(data_ctx.cast()) }
}

unsafe extern "C" fn sass_delete_compiler(compiler: *mut Sass_Compiler) {
    if compiler.is_null() {
        return;
    }
    let compiler = unsafe { Box::from_raw(compiler.cast::<Compiler>()) };
    for entry in compiler.stack {
        unsafe { sass_delete_import(entry) };
    }
}

unsafe extern "C" fn sass_compiler_get_state(compiler: *mut Sass_Compiler) -> Sass_Compiler_State {
    unsafe { (*compiler.cast::<Compiler>()).state }
}

unsafe extern "C" fn sass_compiler_get_context(compiler: *mut Sass_Compiler) -> *mut Sass_Context {
    unsafe { (*compiler.cast::<Compiler>()).ctx }.cast()
}

unsafe extern "C" fn sass_compiler_get_options(compiler: *mut Sass_Compiler) -> *mut Sass_Options {
    unsafe { context_options((*compiler.cast::<Compiler>()).ctx) }
}

unsafe extern "C" fn sass_compiler_get_import_stack_size(compiler: *mut Sass_Compiler) -> size_t {
    unsafe { (*compiler.cast::<Compiler>()).stack.len() }
}

unsafe extern "C" fn sass_compiler_get_last_import(compiler: *mut Sass_Compiler) -> Sass_Import_Entry {
    unsafe { (*compiler.cast::<Compiler>()).stack.last().copied() }.unwrap_or(ptr::null_mut())
}

unsafe extern "C" fn sass_compiler_get_import_entry(compiler: *mut Sass_Compiler, idx: size_t) -> Sass_Import_Entry {
    unsafe { (&(*compiler.cast::<Compiler>()).stack).get(idx).copied() }.unwrap_or(ptr::null_mut())
}

unsafe extern "C" fn sass_compiler_parse(compiler: *mut Sass_Compiler) -> c_int {
    let this = compiler.cast::<Compiler>();
    let (state, ctx) = unsafe { ((*this).state, (*this).ctx) };
    if state != SASS_COMPILER_CREATED {
        return -1;
    }
    if unsafe { (*ctx).error_status } != 0 {
        return unsafe { (*ctx).error_status };
    }
    match unsafe { parse(this) } {
        Ok(text) => {
            unsafe {
                (*this).parsed = text;
                (*this).state = SASS_COMPILER_PARSED;
            }
            0
        }
        Err(failure) => unsafe { fail(ctx, failure) },
    }
}

unsafe extern "C" fn sass_compiler_execute(compiler: *mut Sass_Compiler) -> c_int {
    let this = compiler.cast::<Compiler>();
    let (state, ctx) = unsafe { ((*this).state, (*this).ctx) };
    if state == SASS_COMPILER_EXECUTED {
        return unsafe { (*ctx).error_status };
    }
    if state != SASS_COMPILER_PARSED {
        return -1;
    }
    let text = mem::take(unsafe { &mut (*this).parsed });
    match unsafe { execute(this, text) } {
        Ok(css) => {
            unsafe {
                finish(this, &css);
                (*this).state = SASS_COMPILER_EXECUTED;
            }
            0
        }
        Err(failure) => unsafe { fail(ctx, failure) },
    }
}

unsafe fn compile_context(ctx: *mut Ctx) -> c_int {
    unsafe {
        if (*ctx).error_status != 0 {
            return (*ctx).error_status;
        }
        let compiler = make_compiler(ctx);
        if sass_compiler_parse(compiler) == 0 {
            sass_compiler_execute(compiler);
        }
        sass_delete_compiler(compiler);
        (*ctx).error_status
    }
}

unsafe fn push_import(compiler: *mut Compiler, imp_path: &str, abs_path: &str) {
    let (imp_path, abs_path) = (c_text(imp_path), c_text(abs_path));
    unsafe {
        let entry = sass_make_import(imp_path.as_ptr(), abs_path.as_ptr(), ptr::null_mut(), ptr::null_mut());
        (*compiler).stack.push(entry);
    }
}

unsafe fn pop_import(compiler: *mut Compiler) {
    if let Some(entry) = unsafe { (*compiler).stack.pop() } {
        unsafe { sass_delete_import(entry) };
    }
}

/// Importer entries, highest priority first.
unsafe fn importers_by_priority(list: Sass_Importer_List) -> Vec<Sass_Importer_Entry> {
    let mut entries = unsafe { slots(list) };
    entries.sort_by(|a, b| unsafe { importer(*b).priority.total_cmp(&importer(*a).priority) });
    entries
}

struct Resolved {
    path: String,
    source: String,
}

/// Ask one importer about `url`. `Ok(None)` means it declined.
unsafe fn call_importer(
    compiler: *mut Compiler,
    entry: Sass_Importer_Entry,
    url: &str,
) -> Result<Option<Vec<Resolved>>, Failure> {
    let Some(callback) = unsafe { importer(entry) }.function else {
        return Ok(None);
    };
    let url_text = c_text(url);
    let list = unsafe { callback(url_text.as_ptr(), entry, compiler.cast()) };
    if list.is_null() {
        return Ok(None);
    }

    let mut resolved = Vec::new();
    let mut failure = None;
    for entry in unsafe { slots(list) } {
        let entry = unsafe { import(entry) };
        if !entry.error.is_null() {
            failure.get_or_insert_with(|| Failure {
                message: unsafe { read(entry.error) },
                file: None,
                line: entry.line,
                column: entry.column,
            });
            continue;
        }
        let path = unsafe { read(entry.abs_path) };
        let source = mem::replace(&mut entry.source, ptr::null_mut());
        let text = if source.is_null() {
            fs::read_to_string(&path).ok()
        } else {
            let text = unsafe { read(source) };
            unsafe { release(source) };
            Some(text)
        };
        match text {
            Some(source) => resolved.push(Resolved { path, source }),
            None => {
                failure.get_or_insert_with(|| Failure::new(format!("File to import not found or unreadable: {url}.")));
            }
        }
    }
    unsafe { sass_delete_import_list(list) };

    match failure {
        Some(failure) => Err(failure),
        None => Ok(Some(resolved)),
    }
}

fn import_url(line: &str) -> Option<&str> {
    let rest = line.trim().strip_prefix("@import")?.trim();
    let rest = rest.strip_suffix(';')?.trim();
    rest.strip_prefix('"')?.strip_suffix('"')
}

fn candidates(url: &str) -> Vec<PathBuf> {
    let path = Path::new(url);
    let name = path.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default();
    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    vec![
        parent.join(format!("_{name}.scss")),
        parent.join(format!("{name}.scss")),
        path.to_path_buf(),
    ]
}

unsafe fn find_on_disk(ctx: *mut Ctx, base: Option<&Path>, url: &str) -> Option<PathBuf> {
    let mut dirs: Vec<PathBuf> = base.map(Path::to_path_buf).into_iter().collect();
    for path in unsafe { &(*ctx).options.include_paths } {
        dirs.push(unsafe { read_path(*path) });
    }
    dirs.iter()
        .flat_map(|dir| candidates(url).into_iter().map(move |candidate| dir.join(candidate)))
        .find(|candidate| candidate.is_file())
}

unsafe fn expand(compiler: *mut Compiler, text: &str, base: Option<&Path>, current: &str) -> Result<String, Failure> {
    let ctx = unsafe { (*compiler).ctx };
    let mut out = String::new();
    'lines: for (index, line) in text.lines().enumerate() {
        let Some(url) = import_url(line) else {
            out.push_str(line);
            out.push('\n');
            continue;
        };

        for entry in unsafe { importers_by_priority((*ctx).options.c_importers) } {
            let answer = unsafe { call_importer(compiler, entry, url) }.map_err(|failure| failure.within(current, index + 1))?;
            if let Some(resolved) = answer {
                for import in resolved {
                    unsafe { push_import(compiler, url, &import.path) };
                    let parent = Path::new(&import.path).parent();
                    let body = unsafe { expand(compiler, &import.source, parent, &import.path) };
                    unsafe { pop_import(compiler) };
                    out.push_str(&body?);
                }
                continue 'lines;
            }
        }

        let Some(path) = (unsafe { find_on_disk(ctx, base, url) }) else {
            return Err(Failure::new(format!("File to import not found or unreadable: {url}.")).within(current, index + 1));
        };
        let source = fs::read_to_string(&path)
            .map_err(|err| Failure::new(format!("{}: {err}", path.display())).within(current, index + 1))?;
        let display = path.to_string_lossy().into_owned();
        unsafe {
            (*compiler).included.push(display.clone());
            push_import(compiler, url, &display);
        }
        let body = unsafe { expand(compiler, &source, path.parent(), &display) };
        unsafe { pop_import(compiler) };
        out.push_str(&body?);
    }
    Ok(out)
}

unsafe fn parse(compiler: *mut Compiler) -> Result<String, Failure> {
    let ctx = unsafe { (*compiler).ctx };
    let (root, text) = unsafe {
        if (*ctx).is_file {
            let path = read_path((*ctx).options.input_path);
            let text = fs::read_to_string(&path)
                .map_err(|_| Failure::new(format!("File to read not found or unreadable: {}", path.display())))?;
            let root = path.to_string_lossy().into_owned();
            (*compiler).included.push(root.clone());
            (root, text)
        } else {
            ("stdin".to_string(), read((*ctx).source))
        }
    };
    let base = unsafe { (*ctx).is_file }.then(|| Path::new(&root).parent().map(Path::to_path_buf)).flatten();

    unsafe { push_import(compiler, &root, &root) };
    let mut out = String::new();
    for entry in unsafe { importers_by_priority((*ctx).options.c_headers) } {
        let answer = unsafe { call_importer(compiler, entry, &root) }.map_err(|failure| failure.within(&root, 1))?;
        for header in answer.into_iter().flatten() {
            out.push_str(&header.source);
            out.push('\n');
        }
    }
    let body = unsafe { expand(compiler, &text, base.as_deref(), &root) }?;
    unsafe { pop_import(compiler) };
    out.push_str(&body);
    Ok(out)
}

fn argument(text: &str) -> *mut Sass_Value {
    let split = text
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-' || c == '+'))
        .unwrap_or(text.len());
    match text[..split].parse::<f64>() {
        Ok(number) => new_value(Val::Number(number, dup(&text[split..]))),
        Err(_) => match text.strip_prefix('"').and_then(|rest| rest.strip_suffix('"')) {
            Some(inner) => new_value(Val::Str(dup(inner), true)),
            None => new_value(Val::Str(dup(text), false)),
        },
    }
}

unsafe fn arguments(text: &str) -> *mut Sass_Value {
    let parts: Vec<&str> = text.split(',').map(str::trim).filter(|part| !part.is_empty()).collect();
    unsafe {
        let list = sass_make_list(parts.len(), SASS_COMMA, false);
        for (index, part) in parts.into_iter().enumerate() {
            sass_list_set_value(list, index, argument(part));
        }
        list
    }
}

unsafe fn function_result(result: *mut Sass_Value, signature: &str, precision: c_int) -> Result<String, Failure> {
    if result.is_null() {
        return Err(Failure::new(format!("{signature} returned null")));
    }
    unsafe {
        match value(result) {
            Val::Error(message) => Err(Failure::new(read(*message))),
            Val::Warning(_) => Ok(String::new()),
            _ => Ok(render(result, precision)),
        }
    }
}

/// Replace every `name(args)` call in `text` with the function's result.
unsafe fn call_function(compiler: *mut Compiler, entry: Sass_Function_Entry, text: &str, precision: c_int) -> Result<String, Failure> {
    let (callback, signature) = unsafe { (function(entry).function, read(function(entry).signature)) };
    let Some(callback) = callback else {
        return Ok(text.to_string());
    };
    let name = signature.split('(').next().unwrap_or_default().trim();
    if name.is_empty() {
        return Ok(text.to_string());
    }

    let pattern = format!("{name}(");
    let mut out = String::new();
    let mut rest = text;
    while let Some(start) = rest.find(&pattern) {
        let open = start + pattern.len();
        let Some(length) = rest[open..].find(')') else {
            break;
        };
        let inside_word = rest[..start]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_alphanumeric() || c == '-' || c == '_');
        if inside_word {
            out.push_str(&rest[..open]);
            rest = &rest[open..];
            continue;
        }

        let rendered = unsafe {
            let args = arguments(&rest[open..open + length]);
            let result = callback(args, entry, compiler.cast());
            sass_delete_value(args);
            let rendered = function_result(result, &signature, precision);
            sass_delete_value(result);
            rendered
        };
        out.push_str(&rest[..start]);
        out.push_str(&rendered?);
        rest = &rest[open + length + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

fn compress(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace(" {", "{")
        .replace("{ ", "{")
        .replace(": ", ":")
        .replace("; ", ";")
        .replace(" }", "}")
        .replace(";}", "}")
        + "\n"
}

unsafe fn execute(compiler: *mut Compiler, text: String) -> Result<String, Failure> {
    let ctx = unsafe { (*compiler).ctx };
    let (precision, style, functions) = unsafe {
        let options = &(*ctx).options;
        (options.precision, options.output_style, slots(options.c_functions))
    };
    let mut text = text;
    for entry in functions {
        text = unsafe { call_function(compiler, entry, &text, precision) }?;
    }
    Ok(if style == SASS_STYLE_COMPRESSED { compress(&text) } else { text })
}

fn json_string(text: &str) -> String {
    let mut out = String::from("\"");
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            c if u32::from(c) < 0x20 => out.push_str(&format!("\\u{:04x}", u32::from(c))),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

unsafe fn finish(compiler: *mut Compiler, css: &str) {
    unsafe {
        let ctx = (*compiler).ctx;
        let included = mem::take(&mut (*compiler).included);
        release((*ctx).output);
        (*ctx).output = dup(css);

        if !(*ctx).options.source_map_file.is_null() {
            let sources = included.iter().map(|path| json_string(path)).collect::<Vec<_>>().join(",");
            let map = format!(
                r#"{{"version":3,"file":{},"sources":[{sources}],"mappings":""}}"#,
                json_string(&read((*ctx).options.output_path))
            );
            release((*ctx).source_map);
            (*ctx).source_map = dup(&map);
        }

        free_included_files(&mut *ctx);
        let files = sass_alloc_memory((included.len() + 1) * mem::size_of::<*mut c_char>()).cast::<*mut c_char>();
        for (index, path) in included.iter().enumerate() {
            *files.add(index) = dup(path);
        }
        *files.add(included.len()) = ptr::null_mut();
        (*ctx).included_files = files;
        (*ctx).included_files_size = included.len();
    }
}

unsafe fn fail(ctx: *mut Ctx, failure: Failure) -> c_int {
    let ctx = unsafe { &mut *ctx };
    let file = failure.file.unwrap_or_else(|| "stdin".to_string());
    let formatted = format!(
        "Error: {}\n        on line {}:{} of {}\n",
        failure.message, failure.line, failure.column, file
    );
    let json = format!(
        r#"{{"status":1,"file":{},"line":{},"column":{},"message":{},"formatted":{}}}"#,
        json_string(&file),
        failure.line,
        failure.column,
        json_string(&failure.message),
        json_string(&formatted)
    );
    unsafe {
        for text in [ctx.error_json, ctx.error_text, ctx.error_message, ctx.error_file] {
            release(text);
        }
    }
    ctx.error_status = 1;
    ctx.error_json = dup(&json);
    ctx.error_text = dup(&formatted);
    ctx.error_message = dup(&failure.message);
    ctx.error_file = dup(&file);
    ctx.error_line = failure.line;
    ctx.error_column = failure.column;
    1
}

macro_rules! entry_points {
    ($($name:ident),* $(,)?) => {
        fn resolve(symbol: &str) -> Option<*const c_void> {
            match symbol {
                $(stringify!($name) => Some($name as *const c_void),)*
                _ => None,
            }
        }
    };
}

entry_points! {
    sass_alloc_memory,
    sass_copy_c_string,
    sass_free_memory,
    libsass_version,
    libsass_language_version,
    sass_make_null,
    sass_make_boolean,
    sass_make_string,
    sass_make_qstring,
    sass_make_number,
    sass_make_color,
    sass_make_list,
    sass_make_map,
    sass_make_error,
    sass_make_warning,
    sass_delete_value,
    sass_clone_value,
    sass_value_op,
    sass_value_stringify,
    sass_value_get_tag,
    sass_value_is_null,
    sass_value_is_number,
    sass_value_is_string,
    sass_value_is_boolean,
    sass_value_is_color,
    sass_value_is_list,
    sass_value_is_map,
    sass_value_is_error,
    sass_value_is_warning,
    sass_number_get_value,
    sass_number_set_value,
    sass_number_get_unit,
    sass_number_set_unit,
    sass_string_get_value,
    sass_string_set_value,
    sass_string_is_quoted,
    sass_string_set_quoted,
    sass_boolean_get_value,
    sass_boolean_set_value,
    sass_color_get_r,
    sass_color_set_r,
    sass_color_get_g,
    sass_color_set_g,
    sass_color_get_b,
    sass_color_set_b,
    sass_color_get_a,
    sass_color_set_a,
    sass_list_get_length,
    sass_list_get_separator,
    sass_list_set_separator,
    sass_list_get_is_bracketed,
    sass_list_set_is_bracketed,
    sass_list_get_value,
    sass_list_set_value,
    sass_map_get_length,
    sass_map_get_key,
    sass_map_set_key,
    sass_map_get_value,
    sass_map_set_value,
    sass_error_get_message,
    sass_error_set_message,
    sass_warning_get_message,
    sass_warning_set_message,
    sass_make_importer_list,
    sass_importer_get_list_entry,
    sass_importer_set_list_entry,
    sass_delete_importer_list,
    sass_make_importer,
    sass_importer_get_function,
    sass_importer_get_priority,
    sass_importer_get_cookie,
    sass_delete_importer,
    sass_make_import_list,
    sass_make_import_entry,
    sass_make_import,
    sass_import_set_error,
    sass_import_set_list_entry,
    sass_import_get_list_entry,
    sass_import_get_imp_path,
    sass_import_get_abs_path,
    sass_import_get_source,
    sass_import_get_srcmap,
    sass_import_take_source,
    sass_import_take_srcmap,
    sass_import_get_error_line,
    sass_import_get_error_column,
    sass_import_get_error_message,
    sass_delete_import_list,
    sass_delete_import,
    sass_make_function_list,
    sass_make_function,
    sass_delete_function,
    sass_delete_function_list,
    sass_function_get_list_entry,
    sass_function_set_list_entry,
    sass_function_get_signature,
    sass_function_get_function,
    sass_function_get_cookie,
    sass_make_options,
    sass_delete_options,
    sass_make_file_context,
    sass_make_data_context,
    sass_compile_file_context,
    sass_compile_data_context,
    sass_delete_file_context,
    sass_delete_data_context,
    sass_file_context_get_context,
    sass_data_context_get_context,
    sass_context_get_options,
    sass_file_context_get_options,
    sass_data_context_get_options,
    sass_file_context_set_options,
    sass_data_context_set_options,
    sass_make_file_compiler,
    sass_make_data_compiler,
    sass_compiler_parse,
    sass_compiler_execute,
    sass_delete_compiler,
    sass_compiler_get_state,
    sass_compiler_get_context,
    sass_compiler_get_options,
    sass_compiler_get_import_stack_size,
    sass_compiler_get_last_import,
    sass_compiler_get_import_entry,
    sass_option_get_precision,
    sass_option_get_output_style,
    sass_option_get_source_comments,
    sass_option_get_source_map_embed,
    sass_option_get_source_map_contents,
    sass_option_get_omit_source_map_url,
    sass_option_get_is_indented_syntax_src,
    sass_option_get_indent,
    sass_option_get_linefeed,
    sass_option_get_input_path,
    sass_option_get_output_path,
    sass_option_get_plugin_path,
    sass_option_get_include_path_size,
    sass_option_get_include_path,
    sass_option_get_source_map_file,
    sass_option_get_source_map_root,
    sass_option_get_source_map_file_urls,
    sass_option_get_c_headers,
    sass_option_get_c_importers,
    sass_option_get_c_functions,
    sass_option_set_precision,
    sass_option_set_output_style,
    sass_option_set_source_comments,
    sass_option_set_source_map_embed,
    sass_option_set_source_map_contents,
    sass_option_set_omit_source_map_url,
    sass_option_set_is_indented_syntax_src,
    sass_option_set_indent,
    sass_option_set_linefeed,
    sass_option_set_input_path,
    sass_option_set_output_path,
    sass_option_set_plugin_path,
    sass_option_set_include_path,
    sass_option_set_source_map_file,
    sass_option_set_source_map_root,
    sass_option_set_source_map_file_urls,
    sass_option_set_c_headers,
    sass_option_set_c_importers,
    sass_option_set_c_functions,
    sass_option_push_plugin_path,
    sass_option_push_include_path,
    sass_context_get_output_string,
    sass_context_get_error_status,
    sass_context_get_error_json,
    sass_context_get_error_text,
    sass_context_get_error_message,
    sass_context_get_error_file,
    sass_context_get_error_src,
    sass_context_get_error_line,
    sass_context_get_error_column,
    sass_context_get_source_map_string,
    sass_context_get_included_files,
    sass_context_get_included_files_size,
    sass_context_take_output_string,
    sass_context_take_source_map_string,
    sass_context_take_included_files,
}
