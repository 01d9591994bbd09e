//! Numeric narrowing.
//!
//! Integral kinds truncate toward zero and reject NaN, infinities and values
//! outside their range. `float` rejects finite values beyond its range.
//! Nothing is ever clamped.

use hostbridge_core::{NativeValue, NumericKind, string_to_number};

/// Narrow a script number to `kind`; `None` when it does not fit.
pub(crate) fn narrow(n: f64, kind: NumericKind) -> Option<NativeValue> {
    let integral = || integral_value(n, kind);
    match kind {
        NumericKind::Double => Some(NativeValue::from(n)),
        NumericKind::Float => {
            if n.is_finite() && n.abs() > f32::MAX as f64 {
                None
            } else {
                Some(NativeValue::from(n as f32))
            }
        }
        NumericKind::Long => integral().map(NativeValue::Long),
        NumericKind::Int => integral().map(|v| NativeValue::Int(v as i32)),
        NumericKind::Short => integral().map(|v| NativeValue::Short(v as i16)),
        NumericKind::Char => integral().map(|v| NativeValue::Char(v as u16)),
        NumericKind::Byte => integral().map(|v| NativeValue::Byte(v as i8)),
    }
}

fn integral_value(n: f64, kind: NumericKind) -> Option<i64> {
    let (min, max) = kind.integral_range()?;
    if !n.is_finite() {
        return None;
    }
    let truncated = n.trunc();
    // `max + 1` keeps the bound exact for long, whose max is not representable
    if truncated < min as f64 || truncated >= max as f64 + 1.0 {
        return None;
    }
    Some(truncated as i64)
}

/// Parse numeric text; non-numeric text never converts, even to `double`.
pub(crate) fn parse(text: &str, kind: NumericKind) -> Option<NativeValue> {
    let n = string_to_number(text);
    if n.is_nan() {
        return None;
    }
    narrow(n, kind)
}

/// A one-unit string is that character; anything else is parsed as a code.
pub(crate) fn char_from_string(text: &str) -> Option<NativeValue> {
    let mut units = text.encode_utf16();
    match (units.next(), units.next()) {
        (Some(unit), None) => Some(NativeValue::Char(unit)),
        _ => parse(text, NumericKind::Char),
    }
}
