//! The tagged value protocol (`sass/values.h`).
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! A [`Value`] is inspected by reading its [`Tag`] and then using the accessor
//! family for that tag. Calling an accessor for another tag is undefined in
//! libsass and is not checked here.
//!
//! Ownership: `make_*`, `clone_value`, `value_op` and `value_stringify` return
//! owned values, released with [`Sass::delete_value`] or handed to libsass
//! (as a function result, or stored into a list or map). Values read out of a
//! list or map are borrowed from their container.

use crate::error::Result;
use crate::handle::Value;
use crate::library::Sass;
use crate::memory::{borrowed_string, c_string};
use crate::types::{Op, Separator, Tag};

impl Sass {
    /// `sass_make_null`
    pub fn make_null(&self) -> Value {
        Value::from_raw(unsafe { (self.raw().sass_make_null)() })
    }

    /// `sass_make_boolean`
    pub fn make_boolean(&self, value: bool) -> Value {
        Value::from_raw(unsafe { (self.raw().sass_make_boolean)(value) })
    }

    /// `sass_make_string`: an unquoted string. The contents are copied.
    pub fn make_string(&self, value: &str) -> Result<Value> {
        let value = c_string("string value", value)?;
        Ok(Value::from_raw(unsafe {
            (self.raw().sass_make_string)(value.as_ptr())
        }))
    }

    /// `sass_make_qstring`: a quoted string. The contents are copied.
    pub fn make_qstring(&self, value: &str) -> Result<Value> {
        let value = c_string("string value", value)?;
        Ok(Value::from_raw(unsafe {
            (self.raw().sass_make_qstring)(value.as_ptr())
        }))
    }

    /// `sass_make_number`. An empty `unit` makes a unitless number.
    pub fn make_number(&self, value: f64, unit: &str) -> Result<Value> {
        let unit = c_string("number unit", unit)?;
        Ok(Value::from_raw(unsafe {
            (self.raw().sass_make_number)(value, unit.as_ptr())
        }))
    }

    /// `sass_make_color` with channels `r`, `g`, `b` in 0–255 and alpha in 0–1.
    pub fn make_color(&self, r: f64, g: f64, b: f64, a: f64) -> Value {
        Value::from_raw(unsafe { (self.raw().sass_make_color)(r, g, b, a) })
    }

    /// `sass_make_list`: a list of `len` null slots, to be filled with
    /// [`Sass::list_set_value`].
    pub fn make_list(&self, len: usize, separator: Separator, bracketed: bool) -> Value {
        Value::from_raw(unsafe {
            (self.raw().sass_make_list)(len, separator.as_raw(), bracketed)
        })
    }

    /// `sass_make_map`: a map of `len` empty slots.
    pub fn make_map(&self, len: usize) -> Value {
        Value::from_raw(unsafe { (self.raw().sass_make_map)(len) })
    }

    /// `sass_make_error`. Returning an error value from a custom function fails
    /// the compilation with `message`.
    pub fn make_error(&self, message: &str) -> Result<Value> {
        let message = c_string("error message", message)?;
        Ok(Value::from_raw(unsafe {
            (self.raw().sass_make_error)(message.as_ptr())
        }))
    }

    /// `sass_make_warning`
    pub fn make_warning(&self, message: &str) -> Result<Value> {
        let message = c_string("warning message", message)?;
        Ok(Value::from_raw(unsafe {
            (self.raw().sass_make_warning)(message.as_ptr())
        }))
    }

    /// `sass_delete_value`: frees the value and, for lists and maps, every
    /// element.
    ///
    /// # Safety
    ///
    /// `value` must be owned by the caller and not used afterwards.
    pub unsafe fn delete_value(&self, value: Value) {
        unsafe { (self.raw().sass_delete_value)(value.as_raw()) }
    }

    /// `sass_clone_value`: a deep, owned copy.
    ///
    /// # Safety
    ///
    /// `value` must be live.
    pub unsafe fn clone_value(&self, value: Value) -> Value {
        Value::from_raw(unsafe { (self.raw().sass_clone_value)(value.as_const()) })
    }

    /// `sass_value_op`: evaluate `a <op> b` with Sass semantics. The result is
    /// owned; a type mismatch yields an error value rather than failing.
    ///
    /// # Safety
    ///
    /// `a` and `b` must be live.
    pub unsafe fn value_op(&self, op: Op, a: Value, b: Value) -> Value {
        Value::from_raw(unsafe {
            (self.raw().sass_value_op)(op.as_raw(), a.as_const(), b.as_const())
        })
    }

    /// `sass_value_stringify`: render `value` as CSS into a new owned string value.
    ///
    /// # Safety
    ///
    /// `value` must be live.
    pub unsafe fn value_stringify(&self, value: Value, compressed: bool, precision: i32) -> Value {
        Value::from_raw(unsafe {
            (self.raw().sass_value_stringify)(value.as_const(), compressed, precision)
        })
    }

    /// `sass_value_get_tag`
    ///
    /// # Safety
    ///
    /// `value` must be live.
    pub unsafe fn value_get_tag(&self, value: Value) -> Result<Tag> {
        Tag::try_from(unsafe { (self.raw().sass_value_get_tag)(value.as_const()) })
    }

    /// Dispatch to the `sass_value_is_*` predicate for `tag`.
    ///
    /// # Safety
    ///
    /// `value` must be live.
    pub unsafe fn value_is(&self, value: Value, tag: Tag) -> bool {
        let lib = self.raw();
        let predicate = match tag {
            Tag::Boolean => lib.sass_value_is_boolean,
            Tag::Number => lib.sass_value_is_number,
            Tag::Color => lib.sass_value_is_color,
            Tag::String => lib.sass_value_is_string,
            Tag::List => lib.sass_value_is_list,
            Tag::Map => lib.sass_value_is_map,
            Tag::Null => lib.sass_value_is_null,
            Tag::Error => lib.sass_value_is_error,
            Tag::Warning => lib.sass_value_is_warning,
        };
        unsafe { predicate(value.as_const()) }
    }

    /// # Safety
    ///
    /// `value` must be live.
    pub unsafe fn value_is_null(&self, value: Value) -> bool {
        unsafe { (self.raw().sass_value_is_null)(value.as_const()) }
    }

    /// # Safety
    ///
    /// `value` must be live.
    pub unsafe fn value_is_number(&self, value: Value) -> bool {
        unsafe { (self.raw().sass_value_is_number)(value.as_const()) }
    }

    /// # Safety
    ///
    /// `value` must be live.
    pub unsafe fn value_is_string(&self, value: Value) -> bool {
        unsafe { (self.raw().sass_value_is_string)(value.as_const()) }
    }

    /// # Safety
    ///
    /// `value` must be live.
    pub unsafe fn value_is_boolean(&self, value: Value) -> bool {
        unsafe { (self.raw().sass_value_is_boolean)(value.as_const()) }
    }

    /// # Safety
    ///
    /// `value` must be live.
    pub unsafe fn value_is_color(&self, value: Value) -> bool {
        unsafe { (self.raw().sass_value_is_color)(value.as_const()) }
    }

    /// # Safety
    ///
    /// `value` must be live.
    pub unsafe fn value_is_list(&self, value: Value) -> bool {
        unsafe { (self.raw().sass_value_is_list)(value.as_const()) }
    }

    /// # Safety
    ///
    /// `value` must be live.
    pub unsafe fn value_is_map(&self, value: Value) -> bool {
        unsafe { (self.raw().sass_value_is_map)(value.as_const()) }
    }

    /// # Safety
    ///
    /// `value` must be live.
    pub unsafe fn value_is_error(&self, value: Value) -> bool {
        unsafe { (self.raw().sass_value_is_error)(value.as_const()) }
    }

    /// # Safety
    ///
    /// `value` must be live.
    pub unsafe fn value_is_warning(&self, value: Value) -> bool {
        unsafe { (self.raw().sass_value_is_warning)(value.as_const()) }
    }

    // Numbers. Every accessor below requires a live value tagged Number.

    /// # Safety
    ///
    /// `value` must be a live number.
    pub unsafe fn number_get_value(&self, value: Value) -> f64 {
        unsafe { (self.raw().sass_number_get_value)(value.as_const()) }
    }

    /// # Safety
    ///
    /// `value` must be a live number.
    pub unsafe fn number_set_value(&self, value: Value, number: f64) {
        unsafe { (self.raw().sass_number_set_value)(value.as_raw(), number) }
    }

    /// Borrowed unit string, copied out.
    ///
    /// # Safety
    ///
    /// `value` must be a live number.
    pub unsafe fn number_get_unit(&self, value: Value) -> Option<String> {
        unsafe { borrowed_string((self.raw().sass_number_get_unit)(value.as_const())) }
    }

    /// The unit is copied into libsass memory, which the value then owns.
    ///
    /// # Safety
    ///
    /// `value` must be a live number.
    pub unsafe fn number_set_unit(&self, value: Value, unit: &str) -> Result<()> {
        let unit = self.copy_c_string(unit)?;
        unsafe { (self.raw().sass_number_set_unit)(value.as_raw(), unit) };
        Ok(())
    }

    // Strings

    /// Borrowed contents, copied out.
    ///
    /// # Safety
    ///
    /// `value` must be a live string.
    pub unsafe fn string_get_value(&self, value: Value) -> Option<String> {
        unsafe { borrowed_string((self.raw().sass_string_get_value)(value.as_const())) }
    }

    /// The contents are copied into libsass memory, which the value then owns.
    ///
    /// # Safety
    ///
    /// `value` must be a live string.
    pub unsafe fn string_set_value(&self, value: Value, contents: &str) -> Result<()> {
        let contents = self.copy_c_string(contents)?;
        unsafe { (self.raw().sass_string_set_value)(value.as_raw(), contents) };
        Ok(())
    }

    /// # Safety
    ///
    /// `value` must be a live string.
    pub unsafe fn string_is_quoted(&self, value: Value) -> bool {
        unsafe { (self.raw().sass_string_is_quoted)(value.as_const()) }
    }

    /// # Safety
    ///
    /// `value` must be a live string.
    pub unsafe fn string_set_quoted(&self, value: Value, quoted: bool) {
        unsafe { (self.raw().sass_string_set_quoted)(value.as_raw(), quoted) }
    }

    // Booleans

    /// # Safety
    ///
    /// `value` must be a live boolean.
    pub unsafe fn boolean_get_value(&self, value: Value) -> bool {
        unsafe { (self.raw().sass_boolean_get_value)(value.as_const()) }
    }

    /// # Safety
    ///
    /// `value` must be a live boolean.
    pub unsafe fn boolean_set_value(&self, value: Value, flag: bool) {
        unsafe { (self.raw().sass_boolean_set_value)(value.as_raw(), flag) }
    }

    // Colors

    /// # Safety
    ///
    /// `value` must be a live color.
    pub unsafe fn color_get_r(&self, value: Value) -> f64 {
        unsafe { (self.raw().sass_color_get_r)(value.as_const()) }
    }

    /// # Safety
    ///
    /// `value` must be a live color.
    pub unsafe fn color_get_g(&self, value: Value) -> f64 {
        unsafe { (self.raw().sass_color_get_g)(value.as_const()) }
    }

    /// # Safety
    ///
    /// `value` must be a live color.
    pub unsafe fn color_get_b(&self, value: Value) -> f64 {
        unsafe { (self.raw().sass_color_get_b)(value.as_const()) }
    }

    /// # Safety
    ///
    /// `value` must be a live color.
    pub unsafe fn color_get_a(&self, value: Value) -> f64 {
        unsafe { (self.raw().sass_color_get_a)(value.as_const()) }
    }

    /// # Safety
    ///
    /// `value` must be a live color.
    pub unsafe fn color_set_r(&self, value: Value, r: f64) {
        unsafe { (self.raw().sass_color_set_r)(value.as_raw(), r) }
    }

    /// # Safety
    ///
    /// `value` must be a live color.
    pub unsafe fn color_set_g(&self, value: Value, g: f64) {
        unsafe { (self.raw().sass_color_set_g)(value.as_raw(), g) }
    }

    /// # Safety
    ///
    /// `value` must be a live color.
    pub unsafe fn color_set_b(&self, value: Value, b: f64) {
        unsafe { (self.raw().sass_color_set_b)(value.as_raw(), b) }
    }

    /// # Safety
    ///
    /// `value` must be a live color.
    pub unsafe fn color_set_a(&self, value: Value, a: f64) {
        unsafe { (self.raw().sass_color_set_a)(value.as_raw(), a) }
    }

    // Lists

    /// # Safety
    ///
    /// `value` must be a live list.
    pub unsafe fn list_get_length(&self, value: Value) -> usize {
        unsafe { (self.raw().sass_list_get_length)(value.as_const()) }
    }

    /// # Safety
    ///
    /// `value` must be a live list.
    pub unsafe fn list_get_separator(&self, value: Value) -> Result<Separator> {
        Separator::try_from(unsafe { (self.raw().sass_list_get_separator)(value.as_const()) })
    }

    /// # Safety
    ///
    /// `value` must be a live list.
    pub unsafe fn list_set_separator(&self, value: Value, separator: Separator) {
        unsafe { (self.raw().sass_list_set_separator)(value.as_raw(), separator.as_raw()) }
    }

    /// # Safety
    ///
    /// `value` must be a live list.
    pub unsafe fn list_get_is_bracketed(&self, value: Value) -> bool {
        unsafe { (self.raw().sass_list_get_is_bracketed)(value.as_const()) }
    }

    /// # Safety
    ///
    /// `value` must be a live list.
    pub unsafe fn list_set_is_bracketed(&self, value: Value, bracketed: bool) {
        unsafe { (self.raw().sass_list_set_is_bracketed)(value.as_raw(), bracketed) }
    }

    /// Element `index`, borrowed from the list.
    ///
    /// # Safety
    ///
    /// `value` must be a live list and `index < list_get_length(value)`.
    pub unsafe fn list_get_value(&self, value: Value, index: usize) -> Value {
        Value::from_raw(unsafe { (self.raw().sass_list_get_value)(value.as_const(), index) })
    }

    /// Store `element` at `index`. The list takes ownership of `element`; the
    /// previous occupant of the slot is not freed.
    ///
    /// # Safety
    ///
    /// `value` must be a live list, `index < list_get_length(value)`, and
    /// `element` must be owned by the caller.
    pub unsafe fn list_set_value(&self, value: Value, index: usize, element: Value) {
        unsafe { (self.raw().sass_list_set_value)(value.as_raw(), index, element.as_raw()) }
    }

    // Maps

    /// # Safety
    ///
    /// `value` must be a live map.
    pub unsafe fn map_get_length(&self, value: Value) -> usize {
        unsafe { (self.raw().sass_map_get_length)(value.as_const()) }
    }

    /// Key `index`, borrowed from the map.
    ///
    /// # Safety
    ///
    /// `value` must be a live map and `index < map_get_length(value)`.
    pub unsafe fn map_get_key(&self, value: Value, index: usize) -> Value {
        Value::from_raw(unsafe { (self.raw().sass_map_get_key)(value.as_const(), index) })
    }

    /// The map takes ownership of `key`.
    ///
    /// # Safety
    ///
    /// `value` must be a live map, `index < map_get_length(value)`, and `key`
    /// must be owned by the caller.
    pub unsafe fn map_set_key(&self, value: Value, index: usize, key: Value) {
        unsafe { (self.raw().sass_map_set_key)(value.as_raw(), index, key.as_raw()) }
    }

    /// Value `index`, borrowed from the map.
    ///
    /// # Safety
    ///
    /// `value` must be a live map and `index < map_get_length(value)`.
    pub unsafe fn map_get_value(&self, value: Value, index: usize) -> Value {
        Value::from_raw(unsafe { (self.raw().sass_map_get_value)(value.as_const(), index) })
    }

    /// The map takes ownership of `entry`.
    ///
    /// # Safety
    ///
    /// `value` must be a live map, `index < map_get_length(value)`, and `entry`
    /// must be owned by the caller.
    pub unsafe fn map_set_value(&self, value: Value, index: usize, entry: Value) {
        unsafe { (self.raw().sass_map_set_value)(value.as_raw(), index, entry.as_raw()) }
    }

    // Errors and warnings

    /// Borrowed message, copied out.
    ///
    /// # Safety
    ///
    /// `value` must be a live error.
    pub unsafe fn error_get_message(&self, value: Value) -> Option<String> {
        unsafe { borrowed_string((self.raw().sass_error_get_message)(value.as_const())) }
    }

    /// # Safety
    ///
    /// `value` must be a live error.
    pub unsafe fn error_set_message(&self, value: Value, message: &str) -> Result<()> {
        let message = self.copy_c_string(message)?;
        unsafe { (self.raw().sass_error_set_message)(value.as_raw(), message) };
        Ok(())
    }

    /// Borrowed message, copied out.
    ///
    /// # Safety
    ///
    /// `value` must be a live warning.
    pub unsafe fn warning_get_message(&self, value: Value) -> Option<String> {
        unsafe { borrowed_string((self.raw().sass_warning_get_message)(value.as_const())) }
    }

    /// # Safety
    ///
    /// `value` must be a live warning.
    pub unsafe fn warning_set_message(&self, value: Value, message: &str) -> Result<()> {
        let message = self.copy_c_string(message)?;
        unsafe { (self.raw().sass_warning_set_message)(value.as_raw(), message) };
        Ok(())
    }
}
