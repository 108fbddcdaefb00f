//! Escaping and key/value decoding for the ServerQuery text format.
//!
//! Values on the wire cannot contain spaces, pipes or line breaks, so the
//! server and client both use a backslash escape scheme:
//!
//! | char | wire |
//! |------|------|
//! | `\`  | `\\` |
//! | `/`  | `\/` |
//! | ` `  | `\s` |
//! | `\|` | `\p` |
//! | LF   | `\n` |
//! | TAB  | `\t` |

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Escapes a value for the wire.
///
/// Leading and trailing whitespace that survives escaping is stripped.
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str(r"\\"),
            '/' => out.push_str(r"\/"),
            ' ' => out.push_str(r"\s"),
            '|' => out.push_str(r"\p"),
            '\n' => out.push_str(r"\n"),
            '\t' => out.push_str(r"\t"),
            other => out.push(other),
        }
    }
    out.trim().to_string()
}

/// Reverses [`escape`].
///
/// The scan is single-pass so an escaped backslash followed by a letter is
/// never read as a second escape. Unknown escapes are kept verbatim.
pub fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('/') => out.push('/'),
            Some('s') => out.push(' '),
            Some('p') => out.push('|'),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out.trim().to_string()
}

/// A scalar argument or decoded field value.
///
/// Decoding only ever produces [`Value::Int`] and [`Value::Str`]; floats and
/// booleans exist for command arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl Value {
    /// Renders the value as it goes on the wire.
    ///
    /// Booleans become a literal `1`/`0`; everything else is escaped.
    pub fn to_wire(&self) -> String {
        match self {
            Self::Bool(true) => "1".to_string(),
            Self::Bool(false) => "0".to_string(),
            Self::Str(s) => escape(s),
            other => escape(&other.to_string()),
        }
    }

    /// Returns the integer payload, parsing strings if needed.
    pub fn as_int(&self) -> Option<i64> {
        i64::from_value(self)
    }

    /// Returns the string payload without conversion.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{}", u8::from(*b)),
            Self::Str(s) => f.write_str(s),
        }
    }
}

macro_rules! value_from_int {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Value {
            fn from(value: $ty) -> Self {
                Self::Int(i64::from(value))
            }
        })*
    };
}

value_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        i64::try_from(value).map_or_else(|_| Self::Str(value.to_string()), Self::Int)
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        i64::try_from(value).map_or_else(|_| Self::Str(value.to_string()), Self::Int)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Self::Float(f64::from(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Self::Str(value.clone())
    }
}

/// Lenient conversion from a decoded [`Value`] into a field type.
///
/// Returns `None` when the value cannot represent the target type; fields
/// are optional everywhere so a mismatch reads as "absent".
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(n) => Some(*n),
            Value::Bool(b) => Some(i64::from(*b)),
            Value::Str(s) => s.parse().ok(),
            Value::Float(_) => None,
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Option<Self> {
        Some(value.to_string())
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            other => i64::from_value(other).map(|n| n != 0),
        }
    }
}

/// One decoded row: an ordered list of unique keys and their values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a field. A repeated key replaces the earlier value in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((key, value)),
        }
    }

    /// Looks up a field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Looks up and converts a field.
    pub fn get_as<T: FromValue>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(T::from_value)
    }

    /// Integer field.
    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get_as(key)
    }

    /// Field rendered as text (integers included).
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.get_as(key)
    }

    /// Field read as a `0`/`1` flag.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get_as(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates fields in wire order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (key, value) in iter {
            record.insert(key, value);
        }
        record
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Decodes a whitespace separated `key=value` line.
///
/// Only the first `=` separates key from value. Values that parse as an
/// integer become [`Value::Int`]; anything else is unescaped into
/// [`Value::Str`]. A token without `=` yields an empty string value.
pub fn decode_token_line(line: &str) -> Record {
    line.split_whitespace()
        .map(|token| {
            let (key, raw) = token.split_once('=').unwrap_or((token, ""));
            let value = match raw.parse::<i64>() {
                Ok(n) => Value::Int(n),
                Err(_) => Value::Str(unescape(raw)),
            };
            (key, value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_reserved_characters() {
        assert_eq!(escape(r"a\b"), r"a\\b");
        assert_eq!(escape("a/b"), r"a\/b");
        assert_eq!(escape("hello world"), r"hello\sworld");
        assert_eq!(escape("a|b"), r"a\pb");
        assert_eq!(escape("a\nb\tc"), r"a\nb\tc");
    }

    #[test]
    fn escape_backslash_before_other_substitutions() {
        // A literal backslash-s must not collapse into an escaped space.
        assert_eq!(escape(r"\s"), r"\\s");
        assert_eq!(unescape(&escape(r"\s")), r"\s");
    }

    #[test]
    fn roundtrip_strips_outer_whitespace() {
        for input in [
            "plain",
            "  padded value  ",
            "pipes|and/slashes\\",
            "multi\nline\ttext",
            "\r\ncarriage",
            r"\p literal",
            "",
        ] {
            assert_eq!(unescape(&escape(input)), input.trim(), "input: {input:?}");
        }
    }

    #[test]
    fn unescape_keeps_unknown_sequences() {
        assert_eq!(unescape(r"a\xb"), r"a\xb");
        assert_eq!(unescape("trailing\\"), "trailing\\");
    }

    #[test]
    fn decode_types_integers_and_strings() {
        let record = decode_token_line("foo=42 bar=baz neg=-7");
        assert_eq!(record.get("foo"), Some(&Value::Int(42)));
        assert_eq!(record.get("bar"), Some(&Value::Str("baz".into())));
        assert_eq!(record.get("neg"), Some(&Value::Int(-7)));
    }

    #[test]
    fn decode_unescapes_after_failed_int_parse() {
        let record = decode_token_line(r"foo=4\sbar");
        assert_eq!(record.get("foo"), Some(&Value::Str("4 bar".into())));
    }

    #[test]
    fn decode_splits_on_first_equals_only() {
        let record = decode_token_line("token=abc=def= url=a=b");
        assert_eq!(record.get_string("token").as_deref(), Some("abc=def="));
        assert_eq!(record.get_string("url").as_deref(), Some("a=b"));
    }

    #[test]
    fn decode_bare_key_and_order() {
        let record = decode_token_line("clid=5 flag cid=3");
        assert_eq!(record.keys().collect::<Vec<_>>(), ["clid", "flag", "cid"]);
        assert_eq!(record.get("flag"), Some(&Value::Str(String::new())));
    }

    #[test]
    fn decode_empty_line() {
        assert!(decode_token_line("").is_empty());
        assert!(decode_token_line(" \n\r ").is_empty());
    }

    #[test]
    fn repeated_key_replaces_value() {
        let record = decode_token_line("a=1 a=2");
        assert_eq!(record.len(), 1);
        assert_eq!(record.get_int("a"), Some(2));
    }

    #[test]
    fn lenient_field_conversion() {
        let record = decode_token_line("nick=1234 flag=1 name=bob");
        assert_eq!(record.get_string("nick").as_deref(), Some("1234"));
        assert_eq!(record.get_bool("flag"), Some(true));
        assert_eq!(record.get_int("name"), None);
        assert_eq!(record.get_int("missing"), None);
    }

    #[test]
    fn value_wire_rendering() {
        assert_eq!(Value::from(true).to_wire(), "1");
        assert_eq!(Value::from(false).to_wire(), "0");
        assert_eq!(Value::from(5u32).to_wire(), "5");
        assert_eq!(Value::from(0.5).to_wire(), "0.5");
        assert_eq!(Value::from("a b").to_wire(), r"a\sb");
    }

    #[test]
    fn record_serializes_as_ordered_map() {
        let record = decode_token_line(r"clid=1 client_nickname=Bob\sSmith");
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"clid":1,"client_nickname":"Bob Smith"}"#);
    }
}
