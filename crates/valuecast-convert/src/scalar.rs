//! Numeric and string coercion.
//!
//! This module handles conversions between scalar kinds (bool, integers, floats,
//! string) and the "coerce to number" normalization used by comparisons.
//!
//! ## Rules
//!
//! - Strings parse as literals: integers accept an optional sign, `0x`/`0o`/`0b`
//!   prefixes, a leading `0` for octal and `_` separators; floats accept decimal and
//!   scientific notation; bools accept `1 t true yes y on` / `0 f false no n off`.
//! - Floats truncate toward zero when coerced to integers.
//! - Narrowing that does not fit the target width fails; nothing wraps.
//! - Nil pointers, nil interfaces and the invalid value coerce to the zero value.

use valuecast_core::{CoercionError, DynamicValue, Kind, Payload};

/// Coerce a value to the payload of a scalar kind.
///
/// Pointer and interface indirection is stripped first.
pub fn coerce_scalar(value: &DynamicValue, target: Kind) -> Result<Payload, CoercionError> {
    let value = value.unwrap_indirect();
    if value.is_invalid() || value.is_nil() {
        return zero_scalar(value, target);
    }

    match target {
        Kind::Bool => to_bool(value).map(Payload::Bool),
        k if k.is_signed() => to_signed(value, k).map(Payload::Int),
        k if k.is_unsigned() => to_unsigned(value, k).map(Payload::Uint),
        Kind::Float32 => to_float(value, target).map(|v| Payload::Float(v as f32 as f64)),
        Kind::Float64 => to_float(value, target).map(Payload::Float),
        Kind::String => stringify(value).map(Payload::String),
        _ => Err(unsupported(value, target)),
    }
}

fn zero_scalar(value: &DynamicValue, target: Kind) -> Result<Payload, CoercionError> {
    match target {
        Kind::Bool => Ok(Payload::Bool(false)),
        k if k.is_signed() => Ok(Payload::Int(0)),
        k if k.is_unsigned() => Ok(Payload::Uint(0)),
        k if k.is_float() => Ok(Payload::Float(0.0)),
        Kind::String => Ok(Payload::String(String::new())),
        _ => Err(unsupported(value, target)),
    }
}

fn unsupported(value: &DynamicValue, target: Kind) -> CoercionError {
    CoercionError::Unsupported {
        from: value.ty().to_string(),
        target,
    }
}

fn overflow(value: impl ToString, target: Kind) -> CoercionError {
    CoercionError::Overflow {
        value: value.to_string(),
        target,
    }
}

fn parse_error(text: &str, target: Kind) -> CoercionError {
    CoercionError::Parse {
        text: text.to_string(),
        target,
    }
}

/// Coerce a concrete value to bool.
pub fn to_bool(value: &DynamicValue) -> Result<bool, CoercionError> {
    match value.payload() {
        Payload::Bool(v) => Ok(*v),
        Payload::Int(v) => Ok(*v != 0),
        Payload::Uint(v) => Ok(*v != 0),
        Payload::Float(v) => Ok(*v != 0.0),
        Payload::String(s) => parse_bool_text(s).ok_or_else(|| parse_error(s, Kind::Bool)),
        Payload::Invalid | Payload::Pointer(None) | Payload::Interface(None) => Ok(false),
        _ => Err(unsupported(value, Kind::Bool)),
    }
}

/// Coerce a concrete value to a signed integer that fits `target`.
pub fn to_signed(value: &DynamicValue, target: Kind) -> Result<i64, CoercionError> {
    let wide: i128 = match value.payload() {
        Payload::Bool(v) => i128::from(*v),
        Payload::Int(v) => i128::from(*v),
        Payload::Uint(v) => i128::from(*v),
        Payload::Float(v) => truncate_float(*v).ok_or_else(|| overflow(v, target))?,
        Payload::String(s) => parse_int_text(s, target)?,
        Payload::Invalid | Payload::Pointer(None) | Payload::Interface(None) => 0,
        _ => return Err(unsupported(value, target)),
    };

    let (min, max) = target.signed_range().unwrap_or((i64::MIN, i64::MAX));
    if wide < i128::from(min) || wide > i128::from(max) {
        return Err(overflow(wide, target));
    }
    Ok(wide as i64)
}

/// Coerce a concrete value to an unsigned integer that fits `target`.
pub fn to_unsigned(value: &DynamicValue, target: Kind) -> Result<u64, CoercionError> {
    let wide: i128 = match value.payload() {
        Payload::Bool(v) => i128::from(*v),
        Payload::Int(v) => i128::from(*v),
        Payload::Uint(v) => i128::from(*v),
        Payload::Float(v) => truncate_float(*v).ok_or_else(|| overflow(v, target))?,
        Payload::String(s) => parse_int_text(s, target)?,
        Payload::Invalid | Payload::Pointer(None) | Payload::Interface(None) => 0,
        _ => return Err(unsupported(value, target)),
    };

    let max = target.unsigned_max().unwrap_or(u64::MAX);
    if wide < 0 || wide > i128::from(max) {
        return Err(overflow(wide, target));
    }
    Ok(wide as u64)
}

/// Coerce a concrete value to a float. Narrowing to `float32` is done by the caller.
pub fn to_float(value: &DynamicValue, target: Kind) -> Result<f64, CoercionError> {
    match value.payload() {
        Payload::Bool(v) => Ok(if *v { 1.0 } else { 0.0 }),
        Payload::Int(v) => Ok(*v as f64),
        Payload::Uint(v) => Ok(*v as f64),
        Payload::Float(v) => Ok(*v),
        Payload::String(s) => parse_float_text(s).ok_or_else(|| parse_error(s, target)),
        Payload::Invalid | Payload::Pointer(None) | Payload::Interface(None) => Ok(0.0),
        _ => Err(unsupported(value, target)),
    }
}

/// Render a scalar value as text.
///
/// Integers render in base 10 and floats in fixed notation with the shortest
/// representation that round-trips. Composite values are not scalars and fail;
/// the conversion engine renders those as JSON.
pub fn stringify(value: &DynamicValue) -> Result<String, CoercionError> {
    let value = value.unwrap_indirect();
    match value.payload() {
        Payload::Invalid | Payload::Pointer(None) | Payload::Interface(None) => Ok(String::new()),
        Payload::Bool(v) => Ok(v.to_string()),
        Payload::Int(v) => Ok(v.to_string()),
        Payload::Uint(v) => Ok(v.to_string()),
        Payload::Float(v) => Ok(format_float(*v, value.kind())),
        Payload::String(s) => Ok(s.clone()),
        Payload::Slice(elems) => {
            bytes_of(elems)
                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
                .ok_or_else(|| unsupported(value, Kind::String))
        }
        _ => Err(unsupported(value, Kind::String)),
    }
}

/// The bytes of a `[]uint8`, or `None` if any element is not a `uint8`.
pub(crate) fn bytes_of(elems: &[DynamicValue]) -> Option<Vec<u8>> {
    elems
        .iter()
        .map(|e| match (e.kind(), e.payload()) {
            (Kind::Uint8, Payload::Uint(b)) => u8::try_from(*b).ok(),
            _ => None,
        })
        .collect()
}

fn format_float(v: f64, kind: Kind) -> String {
    if v.is_nan() {
        return "NaN".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "+Inf" } else { "-Inf" }.to_string();
    }
    if kind == Kind::Float32 {
        (v as f32).to_string()
    } else {
        v.to_string()
    }
}

fn truncate_float(v: f64) -> Option<i128> {
    if !v.is_finite() {
        return None;
    }
    let t = v.trunc();
    // i128 comfortably covers the u64 and i64 ranges checked by callers
    if t.abs() >= 1.7e38 {
        return None;
    }
    Some(t as i128)
}

// =============================================================================
// Text parsing
// =============================================================================

/// Why an integer literal failed to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralError {
    /// Not a valid integer literal.
    Syntax,
    /// Valid syntax but too large for 128 bits.
    Range,
}

fn parse_int_text(s: &str, target: Kind) -> Result<i128, CoercionError> {
    parse_int_literal(s).map_err(|e| match e {
        LiteralError::Syntax => parse_error(s, target),
        LiteralError::Range => overflow(s, target),
    })
}

/// Parse an integer literal.
///
/// Accepts an optional sign, `0x`/`0o`/`0b` prefixes, a leading `0` for octal,
/// `_` separators between digits, and a trailing all-zero fraction (`"12.00"`).
pub fn parse_int_literal(s: &str) -> Result<i128, LiteralError> {
    let s = trim_zero_decimal(s);
    let (negative, body) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let (radix, digits, prefixed) = split_radix(body);
    if digits.is_empty() || !underscores_ok(digits, prefixed) {
        return Err(LiteralError::Syntax);
    }

    let cleaned: String = digits.chars().filter(|c| *c != '_').collect();
    if cleaned.is_empty() || cleaned.starts_with(['+', '-']) {
        return Err(LiteralError::Syntax);
    }
    let magnitude = match u128::from_str_radix(&cleaned, radix) {
        Ok(v) => v,
        Err(e) => {
            return Err(match e.kind() {
                std::num::IntErrorKind::PosOverflow => LiteralError::Range,
                _ => LiteralError::Syntax,
            });
        }
    };
    let magnitude = i128::try_from(magnitude).map_err(|_| LiteralError::Range)?;
    Ok(if negative { -magnitude } else { magnitude })
}

fn split_radix(body: &str) -> (u32, &str, bool) {
    let bytes = body.as_bytes();
    if bytes.len() >= 2 && bytes[0] == b'0' {
        match bytes[1] {
            b'x' | b'X' => return (16, &body[2..], true),
            b'o' | b'O' => return (8, &body[2..], true),
            b'b' | b'B' => return (2, &body[2..], true),
            _ => return (8, &body[1..], true),
        }
    }
    (10, body, false)
}

fn underscores_ok(digits: &str, prefixed: bool) -> bool {
    if !digits.contains('_') {
        return true;
    }
    if digits.ends_with('_') || digits.contains("__") {
        return false;
    }
    // "0x_ff" is allowed, "_ff" is not
    prefixed || !digits.starts_with('_')
}

fn trim_zero_decimal(s: &str) -> &str {
    let mut found_zero = false;
    for (i, b) in s.bytes().enumerate().rev() {
        match b {
            b'.' if found_zero => return &s[..i],
            b'.' => {}
            b'0' => found_zero = true,
            _ => return s,
        }
    }
    s
}

/// Parse a float in decimal or scientific notation.
pub fn parse_float_text(s: &str) -> Option<f64> {
    if s.is_empty() || s.contains(char::is_whitespace) {
        return None;
    }
    s.parse::<f64>().ok()
}

/// Parse boolean text, ASCII case-insensitively.
pub fn parse_bool_text(s: &str) -> Option<bool> {
    const TRUE: [&str; 6] = ["1", "t", "true", "yes", "y", "on"];
    const FALSE: [&str; 6] = ["0", "f", "false", "no", "n", "off"];

    if TRUE.iter().any(|t| s.eq_ignore_ascii_case(t)) {
        Some(true)
    } else if FALSE.iter().any(|f| s.eq_ignore_ascii_case(f)) {
        Some(false)
    } else {
        None
    }
}

// =============================================================================
// Numeric normalization
// =============================================================================

/// A value normalized for numeric comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number<'a> {
    Signed(i64),
    Unsigned(u64),
    Float(f64),
    /// The value could not be read as a number and passes through unchanged.
    Other(&'a DynamicValue),
}

impl Number<'_> {
    pub fn is_numeric(&self) -> bool {
        !matches!(self, Number::Other(_))
    }
}

/// Normalize a value for numeric comparison.
///
/// Invalid and zero values become integer zero. Strings containing `.` parse as
/// floats, other strings as signed 64-bit integers; unparsable strings pass
/// through as [`Number::Other`]. Bools map to 1 and 0. Pointers and interfaces
/// are unwrapped first.
pub fn coerce_to_number(value: &DynamicValue) -> Number<'_> {
    if value.is_invalid() || value.is_zero() {
        return Number::Signed(0);
    }
    match value.payload() {
        Payload::Pointer(Some(inner)) | Payload::Interface(Some(inner)) => coerce_to_number(inner),
        Payload::Bool(v) => Number::Signed(i64::from(*v)),
        Payload::Int(v) => Number::Signed(*v),
        Payload::Uint(v) => Number::Unsigned(*v),
        Payload::Float(v) => Number::Float(*v),
        Payload::String(s) if s.contains('.') => match parse_float_text(s) {
            Some(v) => Number::Float(v),
            None => Number::Other(value),
        },
        Payload::String(s) => match parse_int_literal(s).ok().and_then(|v| i64::try_from(v).ok()) {
            Some(v) => Number::Signed(v),
            None => Number::Other(value),
        },
        _ => Number::Other(value),
    }
}

// =============================================================================
// Lenient accessors
// =============================================================================

/// Render any value as text, returning an empty string when it has no scalar form.
pub fn to_string_lossy(value: &DynamicValue) -> String {
    stringify(value).unwrap_or_default()
}

/// Read any value as bool, returning `false` on failure.
pub fn to_bool_lossy(value: &DynamicValue) -> bool {
    to_bool(value.unwrap_indirect()).unwrap_or(false)
}

/// Read any value as `i64`, returning 0 on failure.
pub fn to_i64_lossy(value: &DynamicValue) -> i64 {
    to_signed(value.unwrap_indirect(), Kind::Int64).unwrap_or(0)
}

/// Read any value as `u64`, returning 0 on failure.
pub fn to_u64_lossy(value: &DynamicValue) -> u64 {
    to_unsigned(value.unwrap_indirect(), Kind::Uint64).unwrap_or(0)
}

/// Read any value as `f64`, returning 0.0 on failure.
pub fn to_f64_lossy(value: &DynamicValue) -> f64 {
    to_float(value.unwrap_indirect(), Kind::Float64).unwrap_or(0.0)
}
