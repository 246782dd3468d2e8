//! Serialization of values to JSON text.
use crate::value::{Kind, Value};

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::ser::Formatter;

use std::{io, vec};

bitflags::bitflags! {
    /// Layout options of [stringify], combined with `|`.
    ///
    /// Every option but `SIMPLE_FIELDS_FIRST` only affects indented output.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FormatFlags: u16 {
        /// One element or field per line, nested levels indented by a tab.
        const INDENTED = 0x0001;
        /// Indent with four spaces instead of a tab.
        const USE_SPACES = 0x0002;
        /// Pad the keys of an object so that its values start in the same column.
        const ALIGN_OBJECTS = 0x0004;
        /// Move a long string field to its own line, below its key, and keep arrays holding
        /// long strings one element per line.
        const SPLIT_STRINGS = 0x0008;
        /// Write empty arrays as `[]` instead of opening them over two lines.
        const INLINE_EMPTY_ARRAYS = 0x0010;
        /// Write empty objects as `{}` instead of opening them over two lines.
        const INLINE_EMPTY_OBJECTS = 0x0020;
        /// Write arrays holding only scalars on a single line.
        const INLINE_SIMPLE_ARRAYS = 0x0040;
        /// Break inlined arrays of more than [ROW_LEN] elements into rows of that many.
        const SPLIT_SIMPLE_ARRAYS = 0x0080;
        /// Within an object, write the fields holding scalars before those holding arrays or
        /// objects. Each group stays in key order.
        const SIMPLE_FIELDS_FIRST = 0x0100;

        const MAX_READABLE = Self::INDENTED.bits()
            | Self::ALIGN_OBJECTS.bits()
            | Self::SPLIT_STRINGS.bits()
            | Self::INLINE_EMPTY_ARRAYS.bits()
            | Self::INLINE_EMPTY_OBJECTS.bits()
            | Self::INLINE_SIMPLE_ARRAYS.bits()
            | Self::SPLIT_SIMPLE_ARRAYS.bits()
            | Self::SIMPLE_FIELDS_FIRST.bits();
    }
}

impl FormatFlags {
    /// Everything on a single line, no whitespace.
    pub const COMPACT: FormatFlags = FormatFlags::empty();
    pub const MIN_SIZE: FormatFlags = FormatFlags::COMPACT;
}

impl Default for FormatFlags {
    #[inline]
    fn default() -> Self {
        FormatFlags::COMPACT
    }
}

/// Number of elements per row of a split simple array.
pub const ROW_LEN: usize = 10;

/// Strings longer than this many bytes are split off by `SPLIT_STRINGS`.
pub const STRING_WIDTH: usize = 64;

/// Fields of an object in the order they are written.
fn fields(value: &Value, simple_fields_first: bool) -> Vec<(&[u8], &Value)> {
    if !simple_fields_first {
        return value.entries().collect();
    }

    let (mut simple, compound): (Vec<_>, Vec<_>) =
        value.entries().partition(|(_, field)| !field.is_compound());
    simple.extend(compound);
    simple
}

/// A value together with the field ordering to serialize it with.
struct Ordered<'a> {
    value: &'a Value,
    simple_fields_first: bool,
}

impl<'a> Ordered<'a> {
    fn child(&self, value: &'a Value) -> Self {
        Ordered {
            value,
            simple_fields_first: self.simple_fields_first,
        }
    }
}

impl Serialize for Ordered<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let value = self.value;

        match value.kind() {
            Kind::Null | Kind::Undefined => serializer.serialize_unit(),
            Kind::Bool => serializer.serialize_bool(value.to_bool()),
            // Negative integers are stored as their two's complement: the sign is only known
            // through the float view.
            Kind::Integer if value.to_f64() < 0.0 => serializer.serialize_i64(value.to_i64()),
            Kind::Integer => serializer.serialize_u64(value.to_u64()),
            Kind::Double => serializer.serialize_f64(value.to_f64()),
            Kind::String => serializer.serialize_str(&value.to_string_lossy()),
            Kind::Array => {
                let mut seq = serializer.serialize_seq(Some(value.count()))?;
                for elem in value.iter() {
                    seq.serialize_element(&self.child(elem))?;
                }

                seq.end()
            }
            Kind::Object => {
                let mut map = serializer.serialize_map(Some(value.count()))?;
                for (key, field) in fields(value, self.simple_fields_first) {
                    map.serialize_entry(&String::from_utf8_lossy(key), &self.child(field))?;
                }

                map.end()
            }
        }
    }
}

impl Serialize for Value {
    /// `Null` and `Undefined` serialize as a unit, and strings are converted to UTF-8 lossily.
    /// Object fields are serialized in key order.
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        Ordered {
            value: self,
            simple_fields_first: false,
        }
        .serialize(serializer)
    }
}

/// How a container is laid out in indented output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Shape {
    /// One element or field per line.
    Lines,
    /// Everything on the line of the opening bracket.
    Inline,
    /// Rows of up to [ROW_LEN] elements.
    Rows,
}

/// A layout decision, consumed by [LayoutFormatter] in serialization order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Hint {
    Container(Shape),
    Field { pad: usize, split: bool },
}

fn is_long_string(value: &Value) -> bool {
    value.is_string() && value.to_bytes().len() > STRING_WIDTH
}

/// Width of a key once escaped and quoted.
fn key_width(key: &[u8]) -> usize {
    serde_json::to_string(&String::from_utf8_lossy(key)).map_or(0, |text| text.chars().count())
}

/// Pushes the hints of `value` and its descendants, in the order [Ordered] writes them.
fn plan(value: &Value, flags: FormatFlags, hints: &mut Vec<Hint>) {
    let split_strings = flags.contains(FormatFlags::SPLIT_STRINGS);

    match value.kind() {
        Kind::Array => {
            let simple = value
                .iter()
                .all(|elem| !elem.is_compound() && !(split_strings && is_long_string(elem)));

            let shape = if value.count() == 0 {
                if flags.contains(FormatFlags::INLINE_EMPTY_ARRAYS) {
                    Shape::Inline
                } else {
                    Shape::Lines
                }
            } else if simple && flags.contains(FormatFlags::INLINE_SIMPLE_ARRAYS) {
                if flags.contains(FormatFlags::SPLIT_SIMPLE_ARRAYS) && value.count() > ROW_LEN {
                    Shape::Rows
                } else {
                    Shape::Inline
                }
            } else {
                Shape::Lines
            };

            hints.push(Hint::Container(shape));
            for elem in value.iter() {
                plan(elem, flags, hints);
            }
        }
        Kind::Object => {
            let shape = if value.count() == 0 && flags.contains(FormatFlags::INLINE_EMPTY_OBJECTS) {
                Shape::Inline
            } else {
                Shape::Lines
            };
            hints.push(Hint::Container(shape));

            let fields = fields(value, flags.contains(FormatFlags::SIMPLE_FIELDS_FIRST));
            let align = flags.contains(FormatFlags::ALIGN_OBJECTS);
            let width = if align {
                fields.iter().map(|(key, _)| key_width(key)).max().unwrap_or(0)
            } else {
                0
            };

            for (key, field) in fields {
                hints.push(Hint::Field {
                    pad: if align { width - key_width(key) } else { 0 },
                    split: split_strings && is_long_string(field),
                });
                plan(field, flags, hints);
            }
        }
        _ => {}
    }
}

/// Indented output, following the hints computed by [plan] for the value being written.
struct LayoutFormatter<'a> {
    indent: &'a [u8],
    depth: usize,
    hints: vec::IntoIter<Hint>,
    /// Shape of each open container and the number of elements written to it so far.
    open: Vec<(Shape, usize)>,
}

impl<'a> LayoutFormatter<'a> {
    fn new(value: &Value, flags: FormatFlags, indent: &'a [u8]) -> Self {
        let mut hints = Vec::new();
        plan(value, flags, &mut hints);

        LayoutFormatter {
            indent,
            depth: 0,
            hints: hints.into_iter(),
            open: Vec::new(),
        }
    }

    fn newline<W>(&self, writer: &mut W, depth: usize) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b"\n")?;
        for _ in 0..depth {
            writer.write_all(self.indent)?;
        }

        Ok(())
    }

    fn open<W>(&mut self, writer: &mut W, bracket: &[u8]) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let shape = match self.hints.next() {
            Some(Hint::Container(shape)) => shape,
            _ => Shape::Lines,
        };

        self.open.push((shape, 0));
        self.depth += 1;
        writer.write_all(bracket)
    }

    fn close<W>(&mut self, writer: &mut W, bracket: &[u8]) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.depth -= 1;
        if let Some((Shape::Lines | Shape::Rows, _)) = self.open.pop() {
            self.newline(writer, self.depth)?;
        }

        writer.write_all(bracket)
    }
}

impl Formatter for LayoutFormatter<'_> {
    fn begin_array<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.open(writer, b"[")
    }

    fn end_array<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.close(writer, b"]")
    }

    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if !first {
            writer.write_all(b",")?;
        }

        let (shape, index) = match self.open.last_mut() {
            Some((shape, count)) => {
                *count += 1;
                (*shape, *count - 1)
            }
            None => (Shape::Lines, 0),
        };

        match shape {
            Shape::Inline if first => Ok(()),
            Shape::Inline => writer.write_all(b" "),
            Shape::Rows if index % ROW_LEN != 0 => writer.write_all(b" "),
            Shape::Rows | Shape::Lines => self.newline(writer, self.depth),
        }
    }

    fn begin_object<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.open(writer, b"{")
    }

    fn end_object<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.close(writer, b"}")
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if !first {
            writer.write_all(b",")?;
        }

        self.newline(writer, self.depth)
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b":")?;

        match self.hints.next() {
            Some(Hint::Field { split: true, .. }) => self.newline(writer, self.depth + 1),
            Some(Hint::Field { pad, .. }) => writer.write_all(&b" ".repeat(pad + 1)),
            _ => writer.write_all(b" "),
        }
    }
}

/// Writes `value` as JSON text to `writer`.
///
/// Floats that aren't finite have no JSON representation and are written as `null`.
pub fn to_writer<W: io::Write>(
    writer: W,
    value: &Value,
    flags: FormatFlags,
) -> serde_json::Result<()> {
    let ordered = Ordered {
        value,
        simple_fields_first: flags.contains(FormatFlags::SIMPLE_FIELDS_FIRST),
    };

    if flags.contains(FormatFlags::INDENTED) {
        let indent: &[u8] = if flags.contains(FormatFlags::USE_SPACES) {
            b"    "
        } else {
            b"\t"
        };

        let formatter = LayoutFormatter::new(value, flags, indent);
        let mut serializer = serde_json::Serializer::with_formatter(writer, formatter);
        ordered.serialize(&mut serializer)
    } else {
        let mut serializer = serde_json::Serializer::new(writer);
        ordered.serialize(&mut serializer)
    }
}

/// Renders `value` as JSON text. See [to_writer].
pub fn stringify(value: &Value, flags: FormatFlags) -> Vec<u8> {
    let mut out = Vec::new();

    // Writing to a vector doesn't fail, and neither does serializing a value.
    if let Err(err) = to_writer(&mut out, value, flags) {
        log::error!("couldn't serialize a value: {err}");
    }

    out
}

impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        use serde_json::{Map, Number};

        match value.kind() {
            Kind::Null | Kind::Undefined => serde_json::Value::Null,
            Kind::Bool => serde_json::Value::Bool(value.to_bool()),
            Kind::Integer if value.to_f64() < 0.0 => {
                serde_json::Value::Number(Number::from(value.to_i64()))
            }
            Kind::Integer => serde_json::Value::Number(Number::from(value.to_u64())),
            Kind::Double => Number::from_f64(value.to_f64())
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Kind::String => serde_json::Value::String(value.to_string_lossy().into_owned()),
            Kind::Array => serde_json::Value::Array(value.iter().map(Into::into).collect()),
            Kind::Object => serde_json::Value::Object(
                value
                    .entries()
                    .map(|(key, field)| (String::from_utf8_lossy(key).into_owned(), field.into()))
                    .collect::<Map<_, _>>(),
            ),
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        serde_json::Value::from(&value)
    }
}
