//! Deserialization of values from JSON text.
//!
//! [parse] is the entry point for untrusted input: it never fails, but reports a [ParseResult]
//! locating the first problem. Parsing is done by `serde_json`; its errors are classified into
//! [ParseStatus] codes.
use crate::{
    error::{ParseError, ParseResult, ParseStatus},
    value::{Kind, Value},
};

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde_json::error::Category;

use std::fmt;

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_unit<E>(self) -> Result<Value, E> {
        Ok(Value::null())
    }

    fn visit_none<E>(self) -> Result<Value, E> {
        Ok(Value::null())
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer)
    }

    fn visit_bool<E>(self, value: bool) -> Result<Value, E> {
        Ok(Value::from(value))
    }

    fn visit_i64<E>(self, value: i64) -> Result<Value, E> {
        Ok(Value::from(value))
    }

    fn visit_u64<E>(self, value: u64) -> Result<Value, E> {
        Ok(Value::from(value))
    }

    fn visit_f64<E>(self, value: f64) -> Result<Value, E> {
        Ok(Value::from(value))
    }

    fn visit_str<E>(self, value: &str) -> Result<Value, E> {
        Ok(Value::from(value))
    }

    fn visit_string<E>(self, value: String) -> Result<Value, E> {
        Ok(Value::from(value))
    }

    fn visit_bytes<E>(self, value: &[u8]) -> Result<Value, E> {
        Ok(Value::from(value))
    }

    fn visit_byte_buf<E>(self, value: Vec<u8>) -> Result<Value, E> {
        Ok(Value::from(value))
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut elems = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(elem) = seq.next_element::<Value>()? {
            elems.push(elem);
        }

        Ok(elems.into_iter().collect())
    }

    fn visit_map<A>(self, mut map: A) -> Result<Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut object = Value::with_kind(Kind::Object);

        while let Some(key) = map.next_key::<String>()? {
            if key.is_empty() {
                return Err(de::Error::custom(ParseStatus::InvalidName));
            }

            if object.contains_key(&key) {
                return Err(de::Error::custom(format_args!(
                    "{}: `{key}`",
                    ParseStatus::DuplicateName
                )));
            }

            let field = map.next_value::<Value>()?;
            *object
                .at_key_mut(&key)
                .map_err(<A::Error as de::Error>::custom)? = field;
        }

        Ok(object)
    }
}

impl<'de> Deserialize<'de> for Value {
    /// Object keys must be non-empty and unique.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ValueVisitor)
    }
}

impl From<serde_json::Value> for Value {
    /// Fields with an empty key are skipped, as the [Deserialize] impl would reject them.
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::null(),
            serde_json::Value::Bool(b) => Value::from(b),
            serde_json::Value::Number(n) => {
                if let Some(n) = n.as_u64() {
                    Value::from(n)
                } else if let Some(n) = n.as_i64() {
                    Value::from(n)
                } else {
                    Value::from(n.as_f64().unwrap_or_default())
                }
            }
            serde_json::Value::String(s) => Value::from(s),
            serde_json::Value::Array(elems) => elems.into_iter().map(Value::from).collect(),
            serde_json::Value::Object(fields) => fields
                .into_iter()
                .map(|(key, field)| (key, Value::from(field)))
                .collect(),
        }
    }
}

fn is_json_space(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r')
}

/// The 1-based line and column of the byte at `offset`.
fn position(input: &[u8], offset: usize) -> (usize, usize) {
    let before = &input[..offset.min(input.len())];
    let row = before.iter().filter(|&&b| b == b'\n').count() + 1;
    let line_start = before
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |newline| newline + 1);

    (row, before.len() - line_start + 1)
}

/// The byte offset of a 1-based line and column, as reported by `serde_json`. A column of zero
/// designates the start of the line.
fn offset_of(input: &[u8], row: usize, col: usize) -> usize {
    let line_start = if row <= 1 {
        0
    } else {
        input
            .iter()
            .enumerate()
            .filter(|(_, b)| **b == b'\n')
            .nth(row - 2)
            .map_or(input.len(), |(newline, _)| newline + 1)
    };

    (line_start + col.saturating_sub(1)).min(input.len())
}

/// Classifies an error reported by `serde_json`.
fn status_of(err: &serde_json::Error) -> ParseStatus {
    if err.classify() == Category::Eof {
        return ParseStatus::EndOfData;
    }

    let message = err.to_string();

    // Errors raised while building the value carry the message of their status.
    if let Some(status) = ParseStatus::ALL
        .into_iter()
        .filter(|status| !status.is_ok())
        .find(|status| message.starts_with(status.message()))
    {
        return status;
    }

    if message.starts_with("expected `:`") {
        ParseStatus::ColonExpected
    } else if message.starts_with("expected `,` or `]`") {
        ParseStatus::SquareBracketExpected
    } else if message.starts_with("expected `,` or `}`") {
        ParseStatus::CurlyBracketExpected
    } else if message.starts_with("key must be a string") {
        ParseStatus::InvalidName
    } else if message.starts_with("invalid number") || message.starts_with("number out of range")
    {
        ParseStatus::InvalidNumber
    } else {
        ParseStatus::InvalidCharacter
    }
}

fn failure(input: &[u8], err: &serde_json::Error) -> ParseResult {
    let status = status_of(err);
    let offset = offset_of(input, err.line(), err.column());
    let (row, col) = position(input, offset);

    log::debug!("JSON parsing failed: {err}");

    ParseResult {
        status,
        offset,
        row,
        col,
    }
}

/// Parses a JSON document.
///
/// On success, returns the value with a [ParseStatus::NoError] result whose offset is the length
/// of the input. If non-whitespace data follows a complete value, the value is still returned,
/// together with a [ParseStatus::MoreData] result pointing at that data.
///
/// On failure, returns [Value::undefined] and a result locating the problem.
pub fn parse(input: &[u8]) -> (Value, ParseResult) {
    let mut stream = serde_json::Deserializer::from_slice(input).into_iter::<Value>();

    let value = match stream.next() {
        Some(Ok(value)) => value,
        Some(Err(err)) => return (Value::undefined(), failure(input, &err)),
        None => {
            let (row, col) = position(input, input.len());
            let result = ParseResult {
                status: ParseStatus::EndOfData,
                offset: input.len(),
                row,
                col,
            };

            log::debug!("JSON parsing failed: no value in the input");
            return (Value::undefined(), result);
        }
    };

    let end = stream.byte_offset();
    let (status, offset) = match input[end..].iter().position(|&b| !is_json_space(b)) {
        Some(rest) => (ParseStatus::MoreData, end + rest),
        None => (ParseStatus::NoError, input.len()),
    };
    let (row, col) = position(input, offset);

    (
        value,
        ParseResult {
            status,
            offset,
            row,
            col,
        },
    )
}

impl Value {
    /// Parses a complete JSON document. Unlike [parse], trailing data after the value is an
    /// error.
    pub fn from_json(input: &[u8]) -> Result<Value, ParseError> {
        match parse(input) {
            (value, result) if result.status == ParseStatus::NoError => Ok(value),
            (_, result) => Err(ParseError {
                status: result.status,
                offset: result.offset,
                row: result.row,
                col: result.col,
            }),
        }
    }
}
