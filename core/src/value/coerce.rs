//! Scalar views and conversions.
//!
//! Every scalar value carries four precomputed views (boolean, 64-bit integer, float and string),
//! computed once when the value is built. The functions here compute those views; the `to_*`
//! accessors of [Value] only read them back.
use super::Value;

use std::borrow::Cow;

/// Number of significant digits used to format floats. Beyond that precision, formatting isn't
/// round-trip exact.
pub const FLOAT_DIGITS: usize = f64::DIGITS as usize + 2;

/// The boolean, integer and float views of a scalar. The string view is stored alongside.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Views {
    pub boolean: bool,
    pub integer: u64,
    pub float: f64,
}

impl Views {
    pub(super) fn of_unsigned(value: u64) -> Self {
        Views {
            boolean: value != 0,
            integer: value,
            float: value as f64,
        }
    }

    pub(super) fn of_signed(value: i64) -> Self {
        Views {
            boolean: value != 0,
            integer: value as u64,
            float: value as f64,
        }
    }

    pub(super) fn of_float(value: f64) -> Self {
        Views {
            // NaN is truthy, as any non-zero float.
            boolean: value != 0.0,
            integer: clamp_to_integer(value),
            float: value,
        }
    }
}

/// Converts a float to the integer view. Negative values go through `i64` and are stored as their
/// two's complement; values outside of the representable range clamp to `i64::MIN` or
/// `u64::MAX`. NaN maps to zero.
pub fn clamp_to_integer(value: f64) -> u64 {
    if value.is_nan() {
        0
    } else if value < 0.0 {
        if value < i64::MIN as f64 {
            i64::MIN as u64
        } else {
            value as i64 as u64
        }
    } else if value > u64::MAX as f64 {
        u64::MAX
    } else {
        value as u64
    }
}

/// Derives the scalar views of string content.
///
/// `0`, `off` and `false` (any case) are falsy and `on`, `true` truthy. Otherwise the content is
/// parsed as an integer and as a float, each parse having to consume the whole string. Content
/// that is neither, or that embeds a NUL byte, keeps zero views.
#[cfg(feature = "autocast-strings")]
pub fn views_of_str(bytes: &[u8]) -> Views {
    if bytes.contains(&0) {
        return Views::default();
    }

    let Ok(text) = std::str::from_utf8(bytes) else {
        return Views::default();
    };

    if ["0", "off", "false"]
        .iter()
        .any(|falsy| text.eq_ignore_ascii_case(falsy))
    {
        return Views::default();
    }

    if ["on", "true"]
        .iter()
        .any(|truthy| text.eq_ignore_ascii_case(truthy))
    {
        return Views {
            boolean: true,
            integer: 1,
            float: 1.0,
        };
    }

    let (integer, float) = match (parse_integer(text), parse_float(text)) {
        (Some(integer), Some(float)) => (integer, float),
        // Hexadecimal content is only read by the integer parser.
        (Some(integer), None) => (integer, integer_to_float(text)),
        (None, Some(float)) => (clamp_to_integer(float), float),
        (None, None) => (0, 0.0),
    };

    Views {
        boolean: integer != 0,
        integer,
        float,
    }
}

#[cfg(not(feature = "autocast-strings"))]
pub fn views_of_str(_bytes: &[u8]) -> Views {
    Views::default()
}

/// The whitespace skipped before a number, as C's `isspace`.
fn is_c_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\x0b' | '\x0c' | '\r')
}

/// Splits an integer into its sign, radix and digits, checking that the digits are valid.
fn split_integer(text: &str) -> Option<(bool, u32, &str)> {
    let text = text.trim_start_matches(is_c_space);

    let (negative, unsigned) = if let Some(rest) = text.strip_prefix('-') {
        (true, rest)
    } else {
        (false, text.strip_prefix('+').unwrap_or(text))
    };

    let (radix, digits) = if let Some(hex) = unsigned
        .strip_prefix("0x")
        .or_else(|| unsigned.strip_prefix("0X"))
    {
        (16, hex)
    } else if unsigned.len() > 1 && unsigned.starts_with('0') {
        (8, &unsigned[1..])
    } else {
        (10, unsigned)
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }

    Some((negative, radix, digits))
}

/// Parses an unsigned integer with automatic base detection: `0x` or `0X` introduces hexadecimal
/// digits, a leading `0` octal ones, and anything else is decimal. A leading `-` negates the
/// result modulo 2^64. Out of range magnitudes saturate to `u64::MAX`.
///
/// Returns `None` unless the whole string is consumed.
pub fn parse_integer(text: &str) -> Option<u64> {
    let (negative, radix, digits) = split_integer(text)?;

    match u64::from_str_radix(digits, radix) {
        Ok(magnitude) if negative => Some(magnitude.wrapping_neg()),
        Ok(magnitude) => Some(magnitude),
        // The digits were validated above, so the only possible failure is an overflow.
        Err(_) => Some(u64::MAX),
    }
}

/// Reads an integer accepted by [parse_integer] as a signed float, without wrapping or
/// saturating: `-0x10` is `-16.0`.
fn integer_to_float(text: &str) -> f64 {
    let Some((negative, radix, digits)) = split_integer(text) else {
        return 0.0;
    };

    let magnitude = digits
        .chars()
        .filter_map(|c| c.to_digit(radix))
        .fold(0.0, |acc, digit| acc * f64::from(radix) + f64::from(digit));

    if negative {
        -magnitude
    } else {
        magnitude
    }
}

/// Parses a float in decimal or exponent notation, or one of `inf`, `infinity` and `nan`. Leading
/// whitespace is skipped. Magnitudes too large for an `f64` give an infinity.
///
/// Returns `None` unless the whole string is consumed.
pub fn parse_float(text: &str) -> Option<f64> {
    text.trim_start_matches(is_c_space).parse().ok()
}

/// Formats a float with [FLOAT_DIGITS] significant digits, choosing between fixed and scientific
/// notation the way C's `%g` does, and stripping trailing zeros.
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return String::from(if value.is_sign_negative() { "-nan" } else { "nan" });
    }

    if value.is_infinite() {
        return String::from(if value < 0.0 { "-inf" } else { "inf" });
    }

    if value == 0.0 {
        return String::from(if value.is_sign_negative() { "-0" } else { "0" });
    }

    let precision = FLOAT_DIGITS;
    let scientific = format!("{:.*e}", precision - 1, value);
    // `{:e}` always produces an exponent, so the split can't fail.
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= precision as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}e{sign}{:02}",
            strip_fraction_zeros(mantissa),
            exponent.unsigned_abs()
        )
    } else {
        let decimals = (precision as i32 - 1 - exponent) as usize;
        strip_fraction_zeros(&format!("{value:.decimals$}")).to_owned()
    }
}

fn strip_fraction_zeros(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}

/// Conversion out of a [Value], reading one of its precomputed views. Never fails: a value that
/// doesn't carry a meaningful view for the target type yields the zero view.
///
/// Integral types truncate the 64-bit integer view, float types narrow the float view, and the
/// boolean and string-like types read their view exactly.
pub trait FromValue<'a>: Sized {
    fn from_value(value: &'a Value) -> Self;
}

macro_rules! from_integer_view {
    ( $( $ty:ty ),* ) => {
        $(
            impl<'a> FromValue<'a> for $ty {
                #[inline]
                fn from_value(value: &'a Value) -> Self {
                    value.to_u64() as $ty
                }
            }
        )*
    };
}

from_integer_view!(u8, i8, u16, i16, u32, i32, u64, i64, usize, isize);

impl<'a> FromValue<'a> for f64 {
    #[inline]
    fn from_value(value: &'a Value) -> Self {
        value.to_f64()
    }
}

impl<'a> FromValue<'a> for f32 {
    #[inline]
    fn from_value(value: &'a Value) -> Self {
        value.to_f64() as f32
    }
}

impl<'a> FromValue<'a> for bool {
    #[inline]
    fn from_value(value: &'a Value) -> Self {
        value.to_bool()
    }
}

impl<'a> FromValue<'a> for &'a [u8] {
    #[inline]
    fn from_value(value: &'a Value) -> Self {
        value.to_bytes()
    }
}

impl<'a> FromValue<'a> for Cow<'a, str> {
    #[inline]
    fn from_value(value: &'a Value) -> Self {
        value.to_string_lossy()
    }
}

impl<'a> FromValue<'a> for Vec<u8> {
    fn from_value(value: &'a Value) -> Self {
        value.to_bytes().to_vec()
    }
}

impl<'a> FromValue<'a> for String {
    fn from_value(value: &'a Value) -> Self {
        value.to_string_lossy().into_owned()
    }
}
