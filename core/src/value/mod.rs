//! The JSON value type.
//!
//! A [Value] is a single pointer to a [Shared] payload. Copies are O(1) and share the payload;
//! the first mutation through a copy detaches it, so every handle observes value semantics.
//!
//! Scalars carry precomputed boolean, integer, float and string views, kept mutually consistent
//! at construction time (see [coerce]). Strings are raw bytes and may embed NULs. When the
//! `autocast-strings` feature is enabled, a string whose content reads as a number or a boolean
//! also gets the corresponding views, so that e.g. `Value::from("0x10").to_u64() == 16`.
//!
//! Compound values grow on demand. Mutable accessors promote a `Null` or `Undefined` value to an
//! array or an object, and array indexing accepts the position right after the last element,
//! appending a `Null` there. Any other index beyond the end is an error, so arrays can't end up
//! with holes. Read-only accessors never fail on a missing element: they return `Null` instead.
use crate::{error::ValueError, shared::Shared};

use once_cell::sync::Lazy;
use std::{
    borrow::Cow,
    collections::BTreeMap,
    fmt,
    ops::{Index, IndexMut},
};

pub mod coerce;

use coerce::{format_float, views_of_str, FromValue, Views};

/// An object key. Keys are arbitrary bytes, compared and ordered byte-wise.
pub type Key = Box<[u8]>;

/// The elements of an array value.
pub type Array = Vec<Value>;

/// The fields of an object value, in key order.
pub type Object = BTreeMap<Key, Value>;

/// Shared by the read-only indexing operators to return a reference to a missing element.
static NULL: Lazy<Value> = Lazy::new(Value::null);

/// The kind of a [Value].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Null,
    Bool,
    Integer,
    Double,
    String,
    Array,
    Object,
    /// No value at all, as opposed to an explicit `null`.
    Undefined,
}

impl Kind {
    pub const ALL: [Kind; 8] = [
        Kind::Null,
        Kind::Bool,
        Kind::Integer,
        Kind::Double,
        Kind::String,
        Kind::Array,
        Kind::Object,
        Kind::Undefined,
    ];

    pub fn is_numeric(self) -> bool {
        matches!(self, Kind::Integer | Kind::Double)
    }

    pub fn is_compound(self) -> bool {
        matches!(self, Kind::Array | Kind::Object)
    }

    /// Returns `true` for every kind except `Null` and `Undefined`.
    pub fn is_set(self) -> bool {
        !matches!(self, Kind::Null | Kind::Undefined)
    }

    fn name(self) -> &'static str {
        match self {
            Kind::Null => "null",
            Kind::Bool => "bool",
            Kind::Integer => "integer",
            Kind::Double => "double",
            Kind::String => "string",
            Kind::Array => "array",
            Kind::Object => "object",
            Kind::Undefined => "undefined",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A scalar with its precomputed views. `text` is the string view.
#[derive(Clone, Debug, PartialEq)]
struct Scalar {
    views: Views,
    text: Box<[u8]>,
}

impl Scalar {
    fn new(views: Views, text: impl Into<Box<[u8]>>) -> Self {
        Scalar {
            views,
            text: text.into(),
        }
    }
}

/// The payload of a value. Only the data relevant to the kind exists.
#[derive(Clone, Debug, PartialEq)]
enum ValueData {
    Null,
    Undefined,
    Bool(bool),
    Integer(Scalar),
    Double(Scalar),
    String(Scalar),
    Array(Array),
    Object(Object),
}

impl ValueData {
    fn kind(&self) -> Kind {
        match self {
            ValueData::Null => Kind::Null,
            ValueData::Undefined => Kind::Undefined,
            ValueData::Bool(_) => Kind::Bool,
            ValueData::Integer(_) => Kind::Integer,
            ValueData::Double(_) => Kind::Double,
            ValueData::String(_) => Kind::String,
            ValueData::Array(_) => Kind::Array,
            ValueData::Object(_) => Kind::Object,
        }
    }
}

/// A copy-on-write JSON value. See the [module documentation](self).
#[derive(Clone)]
pub struct Value(Shared<ValueData>);

impl Value {
    fn from_data(data: ValueData) -> Self {
        Value(Shared::new(data))
    }

    #[inline]
    fn data(&self) -> &ValueData {
        &self.0
    }

    /// Mutable access to the payload. This is the only place where values detach.
    #[inline]
    fn data_mut(&mut self) -> &mut ValueData {
        Shared::make_mut(&mut self.0)
    }

    /// Creates an explicit `null`.
    pub fn null() -> Self {
        Self::from_data(ValueData::Null)
    }

    /// Creates the "no value" sentinel.
    pub fn undefined() -> Self {
        Self::from_data(ValueData::Undefined)
    }

    /// Creates the zero value of a kind: `false`, `0`, `0.0`, an empty string, an empty array or
    /// an empty object.
    pub fn with_kind(kind: Kind) -> Self {
        match kind {
            Kind::Null => Self::null(),
            Kind::Undefined => Self::undefined(),
            Kind::Bool => Self::from(false),
            Kind::Integer => Self::from(0u64),
            Kind::Double => Self::from(0.0f64),
            Kind::String => Self::from(""),
            Kind::Array => Self::from_data(ValueData::Array(Array::new())),
            Kind::Object => Self::from_data(ValueData::Object(Object::new())),
        }
    }

    pub fn kind(&self) -> Kind {
        self.data().kind()
    }

    pub fn is_null(&self) -> bool {
        self.kind() == Kind::Null
    }

    pub fn is_undefined(&self) -> bool {
        self.kind() == Kind::Undefined
    }

    pub fn is_bool(&self) -> bool {
        self.kind() == Kind::Bool
    }

    pub fn is_integer(&self) -> bool {
        self.kind() == Kind::Integer
    }

    pub fn is_double(&self) -> bool {
        self.kind() == Kind::Double
    }

    pub fn is_string(&self) -> bool {
        self.kind() == Kind::String
    }

    pub fn is_array(&self) -> bool {
        self.kind() == Kind::Array
    }

    pub fn is_object(&self) -> bool {
        self.kind() == Kind::Object
    }

    pub fn is_numeric(&self) -> bool {
        self.kind().is_numeric()
    }

    pub fn is_compound(&self) -> bool {
        self.kind().is_compound()
    }

    pub fn is_set(&self) -> bool {
        self.kind().is_set()
    }

    /// The number of handles sharing the payload of this value. Mostly useful for tests and
    /// diagnostics.
    pub fn ref_count(&self) -> usize {
        Shared::ref_count(&self.0)
    }

    /// Returns `true` if both values share the same payload.
    pub fn ptr_eq(&self, other: &Value) -> bool {
        Shared::ptr_eq(&self.0, &other.0)
    }

    fn views(&self) -> Views {
        match self.data() {
            ValueData::Bool(b) => Views::of_unsigned(u64::from(*b)),
            ValueData::Integer(scalar) | ValueData::Double(scalar) | ValueData::String(scalar) => {
                scalar.views
            }
            ValueData::Null | ValueData::Undefined | ValueData::Array(_) | ValueData::Object(_) => {
                Views::default()
            }
        }
    }

    pub fn to_bool(&self) -> bool {
        self.views().boolean
    }

    /// The integer view. Negative numbers are stored as their two's complement, so reading them
    /// back through [Self::to_i64] recovers the sign.
    pub fn to_u64(&self) -> u64 {
        self.views().integer
    }

    pub fn to_i64(&self) -> i64 {
        self.to_u64() as i64
    }

    pub fn to_u32(&self) -> u32 {
        self.to_u64() as u32
    }

    pub fn to_i32(&self) -> i32 {
        self.to_u64() as i32
    }

    pub fn to_u16(&self) -> u16 {
        self.to_u64() as u16
    }

    pub fn to_i16(&self) -> i16 {
        self.to_u64() as i16
    }

    pub fn to_u8(&self) -> u8 {
        self.to_u64() as u8
    }

    pub fn to_i8(&self) -> i8 {
        self.to_u64() as i8
    }

    pub fn to_usize(&self) -> usize {
        self.to_u64() as usize
    }

    pub fn to_isize(&self) -> isize {
        self.to_u64() as isize
    }

    /// The float view.
    pub fn to_f64(&self) -> f64 {
        self.views().float
    }

    pub fn to_f32(&self) -> f32 {
        self.to_f64() as f32
    }

    /// The string view, as raw bytes. `null` reads as `"null"`, booleans as `"true"` and
    /// `"false"`, numbers in their decimal form, and undefined or compound values as an empty
    /// string.
    pub fn to_bytes(&self) -> &[u8] {
        match self.data() {
            ValueData::Null => b"null",
            ValueData::Bool(true) => b"true",
            ValueData::Bool(false) => b"false",
            ValueData::Integer(scalar) | ValueData::Double(scalar) | ValueData::String(scalar) => {
                &scalar.text
            }
            ValueData::Undefined | ValueData::Array(_) | ValueData::Object(_) => b"",
        }
    }

    /// The string view as text, or `None` if it isn't valid UTF-8.
    pub fn to_str(&self) -> Option<&str> {
        std::str::from_utf8(self.to_bytes()).ok()
    }

    /// The string view as text, replacing invalid UTF-8 sequences.
    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.to_bytes())
    }

    /// Converts to `T` by reading the view matching `T`. See [FromValue].
    pub fn to<'a, T: FromValue<'a>>(&'a self) -> T {
        T::from_value(self)
    }

    /// The number of elements of an array or fields of an object, and zero for anything else.
    pub fn count(&self) -> usize {
        match self.data() {
            ValueData::Array(array) => array.len(),
            ValueData::Object(object) => object.len(),
            _ => 0,
        }
    }

    /// Turns this value into an array of exactly `len` elements, padding with `Null` if needed.
    /// Whatever this value held before is dropped unless it already was an array.
    pub fn resize(&mut self, len: usize) {
        if let ValueData::Array(array) = self.data() {
            if array.len() == len {
                return;
            }
        }

        if !self.is_array() {
            // Replaced, not detached: the old payload is never copied.
            *self = Value::from_data(ValueData::Array(
                std::iter::repeat_with(Value::null).take(len).collect(),
            ));
        } else if let ValueData::Array(array) = self.data_mut() {
            array.resize_with(len, Value::null);
        }
    }

    /// The elements of this value if it's an array.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self.data() {
            ValueData::Array(array) => Some(array),
            _ => None,
        }
    }

    /// The fields of this value if it's an object.
    pub fn as_object(&self) -> Option<&Object> {
        match self.data() {
            ValueData::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Iterates over the elements of an array. Yields nothing for other kinds.
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.as_array().unwrap_or_default().iter()
    }

    /// Returns the element at `index`, or `None` if this value isn't an array or `index` is out
    /// of bounds.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.as_array()?.get(index)
    }

    /// Returns a copy of the element at `index`, or `Null` if this value isn't an array or
    /// `index` is out of bounds. Copies are cheap: they share the element's payload.
    pub fn at(&self, index: usize) -> Value {
        self.get(index).cloned().unwrap_or_default()
    }

    /// Returns a mutable reference to the element at `index`.
    ///
    /// A `Null` or `Undefined` value is first turned into an empty array. If `index` is the
    /// length of the array, a `Null` element is appended and returned.
    ///
    /// # Errors
    ///
    /// - [ValueError::InvalidOperation] if this value is neither an array, `Null` nor `Undefined`
    /// - [ValueError::IndexOutOfRange] if `index` is past the length of the array
    ///
    /// The value is left untouched on error.
    pub fn at_mut(&mut self, index: usize) -> Result<&mut Value, ValueError> {
        let len = self.growable_len("at_mut")?;
        if index > len {
            return Err(ValueError::IndexOutOfRange { index, len });
        }

        let array = self.array_mut("at_mut")?;
        if index == array.len() {
            array.push(Value::null());
        }

        Ok(&mut array[index])
    }

    /// Returns the length of the array this value is or can be promoted to, or an error if the
    /// kind doesn't allow array operations.
    fn growable_len(&self, operation: &'static str) -> Result<usize, ValueError> {
        match self.data() {
            ValueData::Array(array) => Ok(array.len()),
            ValueData::Null | ValueData::Undefined => Ok(0),
            data => Err(ValueError::InvalidOperation {
                operation,
                kind: data.kind(),
            }),
        }
    }

    /// Detaches and returns the array of this value, promoting `Null` and `Undefined` to an empty
    /// array.
    fn array_mut(&mut self, operation: &'static str) -> Result<&mut Array, ValueError> {
        let kind = self.kind();
        if !matches!(kind, Kind::Null | Kind::Undefined | Kind::Array) {
            return Err(ValueError::InvalidOperation { operation, kind });
        }

        if kind != Kind::Array {
            *self = Value::from_data(ValueData::Array(Array::new()));
        }

        match self.data_mut() {
            ValueData::Array(array) => Ok(array),
            _ => Err(ValueError::InvalidOperation { operation, kind }),
        }
    }

    /// Detaches and returns the object of this value, promoting `Null` and `Undefined` to an
    /// empty object.
    fn object_mut(&mut self, operation: &'static str) -> Result<&mut Object, ValueError> {
        let kind = self.kind();
        if !matches!(kind, Kind::Null | Kind::Undefined | Kind::Object) {
            return Err(ValueError::InvalidOperation { operation, kind });
        }

        if kind != Kind::Object {
            *self = Value::from_data(ValueData::Object(Object::new()));
        }

        match self.data_mut() {
            ValueData::Object(object) => Ok(object),
            _ => Err(ValueError::InvalidOperation { operation, kind }),
        }
    }

    /// Returns the field `key`, or `None` if this value isn't an object or doesn't have this
    /// field.
    pub fn get_key(&self, key: impl AsRef<[u8]>) -> Option<&Value> {
        self.as_object()?.get(key.as_ref())
    }

    /// Returns `true` if this value is an object with a field `key`.
    pub fn contains_key(&self, key: impl AsRef<[u8]>) -> bool {
        self.get_key(key).is_some()
    }

    /// Returns a copy of the field `key`, or `Null` if this value isn't an object or doesn't have
    /// this field.
    ///
    /// # Errors
    ///
    /// [ValueError::EmptyKey] if `key` is empty.
    pub fn at_key(&self, key: impl AsRef<[u8]>) -> Result<Value, ValueError> {
        let key = non_empty(key.as_ref())?;
        Ok(self.get_key(key).cloned().unwrap_or_default())
    }

    /// Returns a mutable reference to the field `key`, inserting a `Null` field if there is none
    /// yet. A `Null` or `Undefined` value is first turned into an empty object.
    ///
    /// # Errors
    ///
    /// - [ValueError::EmptyKey] if `key` is empty
    /// - [ValueError::InvalidOperation] if this value is neither an object, `Null` nor
    ///   `Undefined`
    pub fn at_key_mut(&mut self, key: impl AsRef<[u8]>) -> Result<&mut Value, ValueError> {
        let key = non_empty(key.as_ref())?;
        let object = self.object_mut("at_key_mut")?;

        Ok(object.entry(Key::from(key)).or_default())
    }

    /// Iterates over the keys of an object in byte-wise order. Yields nothing for other kinds.
    pub fn keys(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.entries().map(|(key, _)| key)
    }

    /// Iterates over the fields of an object in key order. Yields nothing for other kinds.
    pub fn entries(&self) -> impl Iterator<Item = (&[u8], &Value)> + '_ {
        self.as_object()
            .into_iter()
            .flat_map(|object| object.iter().map(|(key, value)| (&**key, value)))
    }

    /// Appends `value` to this array and returns a mutable reference to it. A `Null` or
    /// `Undefined` value is first turned into an empty array. Pass `()` to append a `Null`.
    ///
    /// # Errors
    ///
    /// [ValueError::InvalidOperation] if this value is neither an array, `Null` nor `Undefined`.
    pub fn push_back(&mut self, value: impl Into<Value>) -> Result<&mut Value, ValueError> {
        let array = self.array_mut("push_back")?;
        array.push(value.into());

        let last = array.len() - 1;
        Ok(&mut array[last])
    }

    /// Same as [Self::push_back], but inserts at the front of the array.
    pub fn push_front(&mut self, value: impl Into<Value>) -> Result<&mut Value, ValueError> {
        let array = self.array_mut("push_front")?;
        array.insert(0, value.into());

        Ok(&mut array[0])
    }

    /// Removes the element at `index`, shifting the following ones. Does nothing if this value
    /// isn't an array or `index` is out of bounds.
    pub fn remove(&mut self, index: usize) {
        self.take(index);
    }

    /// Removes the field `key`. Does nothing if this value isn't an object or has no such field.
    pub fn remove_key(&mut self, key: impl AsRef<[u8]>) {
        self.take_key(key);
    }

    /// Removes and returns the element at `index`, or returns `Null` if this value isn't an array
    /// or `index` is out of bounds.
    pub fn take(&mut self, index: usize) -> Value {
        if self.get(index).is_none() {
            return Value::null();
        }

        match self.data_mut() {
            ValueData::Array(array) => array.remove(index),
            _ => Value::null(),
        }
    }

    /// Removes and returns the field `key`, or returns `Null` if this value isn't an object or has
    /// no such field.
    pub fn take_key(&mut self, key: impl AsRef<[u8]>) -> Value {
        let key = key.as_ref();
        if !self.contains_key(key) {
            return Value::null();
        }

        match self.data_mut() {
            ValueData::Object(object) => object.remove(key).unwrap_or_default(),
            _ => Value::null(),
        }
    }
}

fn non_empty(key: &[u8]) -> Result<&[u8], ValueError> {
    if key.is_empty() {
        Err(ValueError::EmptyKey)
    } else {
        Ok(key)
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::null()
    }
}

// Handles sharing a payload are equal without looking into it.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.data() == other.data()
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.data() {
            ValueData::Null => write!(f, "Null"),
            ValueData::Undefined => write!(f, "Undefined"),
            ValueData::Bool(b) => write!(f, "Bool({b})"),
            ValueData::Integer(scalar) => {
                write!(f, "Integer({})", String::from_utf8_lossy(&scalar.text))
            }
            ValueData::Double(scalar) => {
                write!(f, "Double({})", String::from_utf8_lossy(&scalar.text))
            }
            ValueData::String(scalar) => {
                write!(f, "String({:?})", String::from_utf8_lossy(&scalar.text))
            }
            ValueData::Array(array) => f.debug_list().entries(array).finish(),
            ValueData::Object(object) => f
                .debug_map()
                .entries(
                    object
                        .iter()
                        .map(|(key, value)| (String::from_utf8_lossy(key), value)),
                )
                .finish(),
        }
    }
}

impl From<Kind> for Value {
    fn from(kind: Kind) -> Self {
        Value::with_kind(kind)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::null()
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or_else(Value::null, Into::into)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::from_data(ValueData::Bool(value))
    }
}

macro_rules! from_unsigned {
    ( $( $ty:ty ),* ) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::from_data(ValueData::Integer(Scalar::new(
                        Views::of_unsigned(value as u64),
                        value.to_string().into_bytes(),
                    )))
                }
            }
        )*
    };
}

macro_rules! from_signed {
    ( $( $ty:ty ),* ) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::from_data(ValueData::Integer(Scalar::new(
                        Views::of_signed(value as i64),
                        value.to_string().into_bytes(),
                    )))
                }
            }
        )*
    };
}

from_unsigned!(u8, u16, u32, u64, usize);
from_signed!(i8, i16, i32, i64, isize);

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::from_data(ValueData::Double(Scalar::new(
            Views::of_float(value),
            format_float(value).into_bytes(),
        )))
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::from(f64::from(value))
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        let views = views_of_str(&bytes);
        Value::from_data(ValueData::String(Scalar::new(views, bytes)))
    }
}

impl From<&[u8]> for Value {
    fn from(bytes: &[u8]) -> Self {
        Value::from(bytes.to_vec())
    }
}

impl From<String> for Value {
    fn from(string: String) -> Self {
        Value::from(string.into_bytes())
    }
}

impl From<&str> for Value {
    fn from(string: &str) -> Self {
        Value::from(string.as_bytes())
    }
}

impl From<Cow<'_, str>> for Value {
    fn from(string: Cow<'_, str>) -> Self {
        Value::from(string.into_owned())
    }
}

impl FromIterator<Value> for Value {
    /// Collects into an array.
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Value::from_data(ValueData::Array(iter.into_iter().collect()))
    }
}

impl<K: AsRef<[u8]>> FromIterator<(K, Value)> for Value {
    /// Collects into an object. Later duplicates of a key overwrite earlier ones, and fields with
    /// an empty key are skipped.
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Value::from_data(ValueData::Object(
            iter.into_iter()
                .filter(|(key, _)| !key.as_ref().is_empty())
                .map(|(key, value)| (Key::from(key.as_ref()), value))
                .collect(),
        ))
    }
}

impl Index<usize> for Value {
    type Output = Value;

    /// Same as [Value::get], but returns `Null` instead of `None`.
    fn index(&self, index: usize) -> &Value {
        self.get(index).unwrap_or(&*NULL)
    }
}

impl IndexMut<usize> for Value {
    /// Same as [Value::at_mut].
    ///
    /// # Panics
    ///
    /// Panics where [Value::at_mut] returns an error.
    fn index_mut(&mut self, index: usize) -> &mut Value {
        self.at_mut(index).unwrap_or_else(|err| panic!("{err}"))
    }
}

impl Index<&str> for Value {
    type Output = Value;

    /// Same as [Value::get_key], but returns `Null` instead of `None`.
    fn index(&self, key: &str) -> &Value {
        self.get_key(key).unwrap_or(&*NULL)
    }
}

impl IndexMut<&str> for Value {
    /// Same as [Value::at_key_mut].
    ///
    /// # Panics
    ///
    /// Panics where [Value::at_key_mut] returns an error.
    fn index_mut(&mut self, key: &str) -> &mut Value {
        self.at_key_mut(key).unwrap_or_else(|err| panic!("{err}"))
    }
}
