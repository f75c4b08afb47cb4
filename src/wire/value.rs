//! Caller-side values
//!
//! The store only knows byte sequences. `Value` is what callers hand in
//! before the per-element conversion rule is applied.

/// A single caller-supplied element
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Raw bytes, sent verbatim
    Bytes(Vec<u8>),

    /// Integer, sent as decimal text
    Integer(i64),

    /// Floating point number, sent as `%.14g` style text
    Number(f64),

    /// Has no byte form; skipped by the list conversions
    Boolean(bool),

    /// Has no byte form; skipped by the list conversions
    Nil,
}

impl Value {
    /// Byte representation, or None for values that cannot be converted
    pub fn to_wire(&self) -> Option<Vec<u8>> {
        match self {
            Value::Bytes(bytes) => Some(bytes.clone()),
            Value::Integer(n) => Some(n.to_string().into_bytes()),
            Value::Number(n) => Some(format_number(*n).into_bytes()),
            Value::Boolean(_) | Value::Nil => None,
        }
    }

    /// Owning variant of [`to_wire`](Self::to_wire)
    pub fn into_wire(self) -> Option<Vec<u8>> {
        match self {
            Value::Bytes(bytes) => Some(bytes),
            other => other.to_wire(),
        }
    }

    /// False for values the conversions drop
    pub fn is_convertible(&self) -> bool {
        !matches!(self, Value::Boolean(_) | Value::Nil)
    }
}

/// Render a number the way the host environment prints it (`%.14g`)
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "nan".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    // Rounded to 14 significant digits; the exponent decides the notation
    let sci = format!("{:.13e}", n);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };

    if !(-4..14).contains(&exp) {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_fraction(mantissa), sign, exp.abs())
    } else {
        let decimals = (13 - exp) as usize;
        trim_fraction(&format!("{:.*}", decimals, n)).to_string()
    }
}

fn trim_fraction(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Bytes(s.as_bytes().to_vec())
    }
}

impl From<&&str> for Value {
    fn from(s: &&str) -> Self {
        Value::from(*s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Bytes(s.into_bytes())
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::from(s.as_str())
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Value::Bytes(b.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for Value {
    fn from(b: &[u8; N]) -> Self {
        Value::Bytes(b.to_vec())
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<&Vec<u8>> for Value {
    fn from(b: &Vec<u8>) -> Self {
        Value::Bytes(b.clone())
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(n as i64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<&i64> for Value {
    fn from(n: &i64) -> Self {
        Value::Integer(*n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Integer(n as i64)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        match i64::try_from(n) {
            Ok(n) => Value::Integer(n),
            Err(_) => Value::Number(n as f64),
        }
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::from(n as u64)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&f64> for Value {
    fn from(n: &f64) -> Self {
        Value::Number(*n)
    }
}

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Nil)
    }
}
