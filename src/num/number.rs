use std::fmt;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;

/// Scalar targets a raw string or number literal can be coerced into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Decimal,
    BigInteger,
    Char,
    Bool,
}

impl ScalarKind {
    pub fn type_name(self) -> &'static str {
        match self {
            ScalarKind::I8 => "i8",
            ScalarKind::I16 => "i16",
            ScalarKind::I32 => "i32",
            ScalarKind::I64 => "i64",
            ScalarKind::U8 => "u8",
            ScalarKind::U16 => "u16",
            ScalarKind::U32 => "u32",
            ScalarKind::U64 => "u64",
            ScalarKind::F32 => "f32",
            ScalarKind::F64 => "f64",
            ScalarKind::Decimal => "BigDecimal",
            ScalarKind::BigInteger => "BigInt",
            ScalarKind::Char => "char",
            ScalarKind::Bool => "bool",
        }
    }

    /// Booleans arrive as their own token, so only the numeric and character
    /// kinds take the string conversion path inside collections.
    pub fn is_string_convertible(self) -> bool {
        !matches!(self, ScalarKind::Bool)
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// A coerced scalar. The big kinds hold arbitrary precision.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Decimal(BigDecimal),
    BigInteger(BigInt),
    Char(char),
    Bool(bool),
}

impl Scalar {
    pub fn kind(&self) -> ScalarKind {
        match self {
            Scalar::I8(_) => ScalarKind::I8,
            Scalar::I16(_) => ScalarKind::I16,
            Scalar::I32(_) => ScalarKind::I32,
            Scalar::I64(_) => ScalarKind::I64,
            Scalar::U8(_) => ScalarKind::U8,
            Scalar::U16(_) => ScalarKind::U16,
            Scalar::U32(_) => ScalarKind::U32,
            Scalar::U64(_) => ScalarKind::U64,
            Scalar::F32(_) => ScalarKind::F32,
            Scalar::F64(_) => ScalarKind::F64,
            Scalar::Decimal(_) => ScalarKind::Decimal,
            Scalar::BigInteger(_) => ScalarKind::BigInteger,
            Scalar::Char(_) => ScalarKind::Char,
            Scalar::Bool(_) => ScalarKind::Bool,
        }
    }

    pub fn zero(kind: ScalarKind) -> Self {
        match kind {
            ScalarKind::I8 => Scalar::I8(0),
            ScalarKind::I16 => Scalar::I16(0),
            ScalarKind::I32 => Scalar::I32(0),
            ScalarKind::I64 => Scalar::I64(0),
            ScalarKind::U8 => Scalar::U8(0),
            ScalarKind::U16 => Scalar::U16(0),
            ScalarKind::U32 => Scalar::U32(0),
            ScalarKind::U64 => Scalar::U64(0),
            ScalarKind::F32 => Scalar::F32(0.0),
            ScalarKind::F64 => Scalar::F64(0.0),
            ScalarKind::Decimal => Scalar::Decimal(BigDecimal::from(0)),
            ScalarKind::BigInteger => Scalar::BigInteger(BigInt::from(0)),
            ScalarKind::Char => Scalar::Char('\0'),
            ScalarKind::Bool => Scalar::Bool(false),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buffer = itoa::Buffer::new();
        match self {
            Scalar::I8(v) => f.write_str(buffer.format(*v)),
            Scalar::I16(v) => f.write_str(buffer.format(*v)),
            Scalar::I32(v) => f.write_str(buffer.format(*v)),
            Scalar::I64(v) => f.write_str(buffer.format(*v)),
            Scalar::U8(v) => f.write_str(buffer.format(*v)),
            Scalar::U16(v) => f.write_str(buffer.format(*v)),
            Scalar::U32(v) => f.write_str(buffer.format(*v)),
            Scalar::U64(v) => f.write_str(buffer.format(*v)),
            Scalar::F32(v) => f.write_str(&format_f32(*v)),
            Scalar::F64(v) => f.write_str(&format_f64(*v)),
            Scalar::Decimal(v) => write!(f, "{}", v.to_plain_string()),
            Scalar::BigInteger(v) => write!(f, "{v}"),
            Scalar::Char(v) => write!(f, "{v}"),
            Scalar::Bool(v) => write!(f, "{v}"),
        }
    }
}

pub fn format_f32(value: f32) -> String {
    if !value.is_finite() {
        return non_finite(f64::from(value));
    }
    if value == 0.0 {
        return "0".to_string();
    }
    let mut buffer = ryu::Buffer::new();
    normalize_number_str(buffer.format(value))
}

pub fn format_f64(value: f64) -> String {
    if !value.is_finite() {
        return non_finite(value);
    }
    if value == 0.0 {
        return "0".to_string();
    }
    let mut buffer = ryu::Buffer::new();
    normalize_number_str(buffer.format(value))
}

fn non_finite(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_sign_negative() {
        "-Infinity".to_string()
    } else {
        "Infinity".to_string()
    }
}

fn normalize_number_str(raw: &str) -> String {
    if raw.contains('e') || raw.contains('E') {
        return expand_exponent(raw);
    }
    trim_number(raw.to_string())
}

fn expand_exponent(raw: &str) -> String {
    let (mantissa, exponent) = match raw.find(['e', 'E']) {
        Some(idx) => (&raw[..idx], &raw[idx + 1..]),
        None => (raw, "0"),
    };
    let (negative, mantissa) = match mantissa.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, mantissa),
    };

    let mut digits = String::with_capacity(mantissa.len());
    let mut dot_pos = None;
    for ch in mantissa.chars() {
        match ch {
            '0'..='9' => digits.push(ch),
            '.' => dot_pos = Some(digits.len()),
            _ => {}
        }
    }
    let exp: i32 = exponent.parse().unwrap_or(0);

    let dot_pos = dot_pos.unwrap_or(digits.len()) as i32;
    let new_pos = dot_pos + exp;
    let mut out = String::new();
    if negative {
        out.push('-');
    }

    if new_pos <= 0 {
        out.push_str("0.");
        out.extend(std::iter::repeat_n('0', (-new_pos) as usize));
        out.push_str(&digits);
        return trim_number(out);
    }

    let pos = new_pos as usize;
    if pos >= digits.len() {
        out.push_str(&digits);
        out.extend(std::iter::repeat_n('0', pos - digits.len()));
        return trim_number(out);
    }

    out.push_str(&digits[..pos]);
    out.push('.');
    out.push_str(&digits[pos..]);
    trim_number(out)
}

fn trim_number(mut value: String) -> String {
    if let Some(dot) = value.find('.') {
        let mut end = value.len();
        while end > dot + 1 && value.as_bytes()[end - 1] == b'0' {
            end -= 1;
        }
        value.truncate(end);
        if value.ends_with('.') {
            value.pop();
        }
    }
    let all_zero = value
        .trim_start_matches('-')
        .chars()
        .filter(|ch| *ch != '.')
        .all(|ch| ch == '0');
    if all_zero {
        return "0".to_string();
    }
    value
}
