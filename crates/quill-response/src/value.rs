//! Dynamically typed values passed in from script code.

use std::fmt;

/// A script-side value as seen by host objects.
///
/// [`Display`](fmt::Display) follows script string coercion, so every value,
/// including `null` and `undefined`, has a defined text form.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ScriptValue {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<ScriptValue>),
    Object(Vec<(String, ScriptValue)>),
}

impl ScriptValue {
    /// Type name used in argument error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            ScriptValue::Undefined => "undefined",
            ScriptValue::Null => "null",
            ScriptValue::Bool(_) => "boolean",
            ScriptValue::Number(_) => "number",
            ScriptValue::String(_) => "string",
            ScriptValue::Array(_) => "array",
            ScriptValue::Object(_) => "object",
        }
    }

    /// `null` and `undefined` both count as "argument omitted".
    pub fn is_nullish(&self) -> bool {
        matches!(self, ScriptValue::Undefined | ScriptValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScriptValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            ScriptValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

fn fmt_number(n: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if n.is_nan() {
        f.write_str("NaN")
    } else if n.is_infinite() {
        f.write_str(if n > 0.0 { "Infinity" } else { "-Infinity" })
    } else if n == 0.0 {
        // Covers -0 as well.
        f.write_str("0")
    } else if n.abs() >= 1e21 || n.abs() < 1e-6 {
        // Exponent form always carries a sign: 1e+21, 1.5e-7.
        let text = format!("{n:e}");
        match text.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                write!(f, "{mantissa}e+{exponent}")
            }
            _ => f.write_str(&text),
        }
    } else {
        write!(f, "{n}")
    }
}

impl fmt::Display for ScriptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptValue::Undefined => f.write_str("undefined"),
            ScriptValue::Null => f.write_str("null"),
            ScriptValue::Bool(b) => write!(f, "{b}"),
            ScriptValue::Number(n) => fmt_number(*n, f),
            ScriptValue::String(s) => f.write_str(s),
            ScriptValue::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    // Holes and nullish elements render as nothing inside arrays.
                    if !item.is_nullish() {
                        write!(f, "{item}")?;
                    }
                }
                Ok(())
            }
            ScriptValue::Object(_) => f.write_str("[object Object]"),
        }
    }
}

impl From<&str> for ScriptValue {
    fn from(s: &str) -> Self {
        ScriptValue::String(s.to_string())
    }
}

impl From<String> for ScriptValue {
    fn from(s: String) -> Self {
        ScriptValue::String(s)
    }
}

impl From<f64> for ScriptValue {
    fn from(n: f64) -> Self {
        ScriptValue::Number(n)
    }
}

impl From<i32> for ScriptValue {
    fn from(n: i32) -> Self {
        ScriptValue::Number(n.into())
    }
}

impl From<i64> for ScriptValue {
    fn from(n: i64) -> Self {
        ScriptValue::Number(n as f64)
    }
}

impl From<bool> for ScriptValue {
    fn from(b: bool) -> Self {
        ScriptValue::Bool(b)
    }
}

impl<T: Into<ScriptValue>> From<Option<T>> for ScriptValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(ScriptValue::Null, Into::into)
    }
}

impl<T: Into<ScriptValue>> From<Vec<T>> for ScriptValue {
    fn from(items: Vec<T>) -> Self {
        ScriptValue::Array(items.into_iter().map(Into::into).collect())
    }
}

impl From<serde_json::Value> for ScriptValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => ScriptValue::Null,
            serde_json::Value::Bool(b) => ScriptValue::Bool(b),
            serde_json::Value::Number(n) => ScriptValue::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => ScriptValue::String(s),
            serde_json::Value::Array(items) => {
                ScriptValue::Array(items.into_iter().map(Into::into).collect())
            }
            serde_json::Value::Object(map) => {
                ScriptValue::Object(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}
