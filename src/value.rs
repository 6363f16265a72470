/// A stored text value, classified at comparison time.
///
/// Rows keep every value as text. Numeric-ness is only decided when a
/// condition compares two values, so the same column may hold numbers in one
/// row and words in another.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    /// Text that parses as a 64-bit signed integer.
    Int(i64),
    /// Text that parses as a 64-bit float but not as an integer.
    Float(f64),
    /// Anything else, kept as the original text.
    Text(&'a str),
}

impl<'a> Value<'a> {
    /// Classifies `raw`, trying integer first, then float, then falling back
    /// to text.
    ///
    /// Only decimal notation counts as a float: words such as `nan` or `inf`
    /// stay text.
    pub fn parse(raw: &'a str) -> Self {
        if let Ok(i) = raw.parse::<i64>() {
            return Self::Int(i);
        }
        if is_decimal(raw) {
            if let Ok(f) = raw.parse::<f64>() {
                return Self::Float(f);
            }
        }
        Self::Text(raw)
    }

    /// Returns the inner integer if this is a [Value::Int].
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the value as a float, widening integers.
    /// Returns `None` for [Value::Text].
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Text(_) => None,
        }
    }
}

/// At least one digit, and no letters besides an exponent marker.
fn is_decimal(raw: &str) -> bool {
    raw.bytes().any(|b| b.is_ascii_digit())
        && raw
            .bytes()
            .all(|b| !b.is_ascii_alphabetic() || b == b'e' || b == b'E')
}

#[cfg(test)]
mod tests {
    use super::*;

    // ─────────────────────────────────────────────────────────────
    // Test 1 : parse
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_parse_classifies_text() {
        assert_eq!(Value::parse("22"), Value::Int(22));
        assert_eq!(Value::parse("-7"), Value::Int(-7));
        assert_eq!(Value::parse("3.5"), Value::Float(3.5));
        assert_eq!(Value::parse("'Jon'"), Value::Text("'Jon'"));
        assert_eq!(Value::parse(""), Value::Text(""));
    }

    // ─────────────────────────────────────────────────────────────
    // Test 2 : integers too large for i64 fall back to float
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_parse_overflowing_integer_is_float() {
        let v = Value::parse("99999999999999999999");
        assert!(matches!(v, Value::Float(_)));
    }

    // ─────────────────────────────────────────────────────────────
    // Test 3 : special float words stay text
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_float_words_are_text() {
        for word in ["nan", "NaN", "Nan", "inf", "Inf", "-inf", "infinity", "Infinity"] {
            assert_eq!(Value::parse(word), Value::Text(word), "{word}");
        }
        assert_eq!(Value::parse("1e3"), Value::Float(1000.0));
        assert_eq!(Value::parse("2.5E-1"), Value::Float(0.25));
        assert_eq!(Value::parse("e"), Value::Text("e"));
    }

    // ─────────────────────────────────────────────────────────────
    // Test 4 : accessors
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_accessors() {
        assert_eq!(Value::Int(4).as_int(), Some(4));
        assert_eq!(Value::Float(4.0).as_int(), None);
        assert_eq!(Value::Int(4).as_float(), Some(4.0));
        assert_eq!(Value::Float(0.5).as_float(), Some(0.5));
        assert_eq!(Value::Text("x").as_float(), None);
        assert_eq!(Value::Text("x").as_int(), None);
    }
}
