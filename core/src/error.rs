//! Error types.
//!
//! Two unrelated families live here. [ValueError] is raised by the structural mutators of
//! [crate::Value] and signals a programming error: the operation doesn't apply to the kind of the
//! value, or the requested slot can't exist. [ParseStatus], [ParseResult] and [ParseError] report
//! problems found in untrusted JSON text, together with the position of the failure.
use crate::value::Kind;

use std::fmt;

/// A failed structural operation on a [crate::Value].
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum ValueError {
    /// An array or object operation was attempted on a value of an incompatible kind, e.g.
    /// indexing into a boolean.
    #[error("`{operation}` can't be used on a value of kind {kind}")]
    InvalidOperation {
        operation: &'static str,
        kind: Kind,
    },

    /// An index was neither inside the array nor the single position right after its end.
    #[error("index {index} is out of range for an array of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// An object was accessed with an empty key.
    #[error("object keys can't be empty")]
    EmptyKey,
}

impl ValueError {
    /// Returns `true` for the errors caused by applying an operation to the wrong kind of value.
    pub fn is_invalid_operation(&self) -> bool {
        matches!(self, ValueError::InvalidOperation { .. })
    }

    /// Returns `true` for the errors caused by an index or a key that can't designate a slot.
    pub fn is_out_of_range(&self) -> bool {
        matches!(
            self,
            ValueError::IndexOutOfRange { .. } | ValueError::EmptyKey
        )
    }
}

/// Outcome codes of JSON parsing. Non-negative codes are successes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum ParseStatus {
    NoError = 0,
    /// A complete value was read, but more data follows it.
    MoreData = 1,
    InvalidCharacter = -1,
    EndOfData = -2,
    IntExpected = -3,
    InvalidNumber = -4,
    SquareBracketExpected = -5,
    CurlyBracketExpected = -6,
    ColonExpected = -7,
    InvalidName = -8,
    DuplicateName = -9,
}

impl ParseStatus {
    pub const ALL: [ParseStatus; 11] = [
        ParseStatus::NoError,
        ParseStatus::MoreData,
        ParseStatus::InvalidCharacter,
        ParseStatus::EndOfData,
        ParseStatus::IntExpected,
        ParseStatus::InvalidNumber,
        ParseStatus::SquareBracketExpected,
        ParseStatus::CurlyBracketExpected,
        ParseStatus::ColonExpected,
        ParseStatus::InvalidName,
        ParseStatus::DuplicateName,
    ];

    /// The numeric code of this status.
    pub fn code(self) -> i8 {
        self as i8
    }

    /// Maps a numeric code back to its status.
    pub fn from_code(code: i8) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.code() == code)
    }

    pub fn is_ok(self) -> bool {
        self.code() >= 0
    }

    /// A human-readable description.
    pub fn message(self) -> &'static str {
        match self {
            ParseStatus::NoError => "no error",
            ParseStatus::MoreData => "there is more data after the value",
            ParseStatus::InvalidCharacter => "invalid character",
            ParseStatus::EndOfData => "unexpected end of data",
            ParseStatus::IntExpected => "expected an integer value",
            ParseStatus::InvalidNumber => "invalid number representation",
            ParseStatus::SquareBracketExpected => "square bracket expected",
            ParseStatus::CurlyBracketExpected => "curly bracket expected",
            ParseStatus::ColonExpected => "colon expected",
            ParseStatus::InvalidName => "invalid name of object field",
            ParseStatus::DuplicateName => "duplicate name of object field",
        }
    }
}

impl fmt::Display for ParseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// The status of a parse together with the position it refers to. `row` and `col` are 1-based;
/// `offset` is a byte offset into the input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseResult {
    pub status: ParseStatus,
    pub offset: usize,
    pub row: usize,
    pub col: usize,
}

impl ParseResult {
    /// A successful result positioned at the start of the input.
    pub fn ok() -> Self {
        ParseResult {
            status: ParseStatus::NoError,
            offset: 0,
            row: 1,
            col: 1,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status.is_ok()
    }

    /// Converts a failing result to an error, and a successful one to `Ok(())`.
    pub fn into_result(self) -> Result<(), ParseError> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(ParseError {
                status: self.status,
                offset: self.offset,
                row: self.row,
                col: self.col,
            })
        }
    }
}

impl Default for ParseResult {
    fn default() -> Self {
        Self::ok()
    }
}

/// A JSON input that couldn't be parsed. Same fields as the failing [ParseResult].
#[derive(thiserror::Error, Clone, Copy, Debug, PartialEq, Eq)]
#[error("{status} at line {row}, column {col} (byte {offset})")]
pub struct ParseError {
    pub status: ParseStatus,
    pub offset: usize,
    pub row: usize,
    pub col: usize,
}

impl From<ParseError> for ParseResult {
    fn from(err: ParseError) -> Self {
        ParseResult {
            status: err.status,
            offset: err.offset,
            row: err.row,
            col: err.col,
        }
    }
}
