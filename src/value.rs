//! Dynamically-typed parameter values
//!
//! Every converter produces a [`Value`], and parsed results hand values to
//! handlers through [`crate::Invocation`]. Handlers pull concrete Rust types
//! back out with [`FromValue`].

use crate::error::{Error, Result};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// A converted argument value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// The absent value. As a declared default it hides the help suffix.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Path(PathBuf),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    /// A validated member of a choice set, kept in its raw string form
    Choice(String),
    /// Growable collection from a list-typed parameter
    List(Vec<Value>),
    /// Ordered immutable collection from a tuple-typed parameter
    Tuple(Vec<Value>),
    /// Structured data produced by a custom converter
    Json(serde_json::Value),
}

impl Value {
    /// Short name of the variant, used in type mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Path(_) => "path",
            Value::Date(_) => "date",
            Value::DateTime(_) => "datetime",
            Value::Choice(_) => "choice",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Json(_) => "json",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) | Value::Choice(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "None"),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Str(s) | Value::Choice(s) => write!(f, "{s}"),
            Value::Path(p) => write!(f, "{}", p.display()),
            Value::Date(d) => write!(f, "{d}"),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            Value::List(items) => write_items(f, items, '[', ']'),
            Value::Tuple(items) => write_items(f, items, '(', ')'),
            Value::Json(json) => write!(f, "{json}"),
        }
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, items: &[Value], open: char, close: char) -> fmt::Result {
    write!(f, "{open}")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    write!(f, "{close}")
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<PathBuf> for Value {
    fn from(p: PathBuf) -> Self {
        Value::Path(p)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::DateTime(dt)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

/// A Rust enum exposed on the command line as a fixed set of string tokens
pub trait Choices: Sized {
    /// Valid raw tokens in declaration order.
    fn choices() -> &'static [&'static str];

    /// Look a member up by its raw token.
    fn from_choice(token: &str) -> Option<Self>;
}

/// Typed extraction wrapper for [`Choices`] enums
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choice<E>(pub E);

impl<E> Choice<E> {
    pub fn into_inner(self) -> E {
        self.0
    }
}

/// Conversion out of a [`Value`] into a concrete Rust type
pub trait FromValue: Sized {
    /// Human readable name of the target type, for mismatch errors.
    const EXPECTED: &'static str;

    fn from_value(name: &str, value: &Value) -> Result<Self>;

    /// Called when the parameter has neither a supplied value nor a default.
    fn from_missing(name: &str) -> Result<Self> {
        Err(Error::MissingValue(name.to_string()))
    }
}

fn mismatch<T: FromValue>(name: &str, value: &Value) -> Error {
    Error::TypeMismatch {
        name: name.to_string(),
        expected: T::EXPECTED,
        found: value.kind().to_string(),
    }
}

impl FromValue for Value {
    const EXPECTED: &'static str = "any value";

    fn from_value(_name: &str, value: &Value) -> Result<Self> {
        Ok(value.clone())
    }
}

impl FromValue for String {
    const EXPECTED: &'static str = "a string";

    fn from_value(name: &str, value: &Value) -> Result<Self> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| mismatch::<Self>(name, value))
    }
}

impl FromValue for i64 {
    const EXPECTED: &'static str = "an integer";

    fn from_value(name: &str, value: &Value) -> Result<Self> {
        match value {
            Value::Int(i) => Ok(*i),
            _ => Err(mismatch::<Self>(name, value)),
        }
    }
}

impl FromValue for f64 {
    const EXPECTED: &'static str = "a float";

    fn from_value(name: &str, value: &Value) -> Result<Self> {
        match value {
            Value::Float(x) => Ok(*x),
            Value::Int(i) => Ok(*i as f64),
            _ => Err(mismatch::<Self>(name, value)),
        }
    }
}

impl FromValue for bool {
    const EXPECTED: &'static str = "a boolean";

    fn from_value(name: &str, value: &Value) -> Result<Self> {
        match value {
            Value::Bool(b) => Ok(*b),
            _ => Err(mismatch::<Self>(name, value)),
        }
    }
}

impl FromValue for NaiveDate {
    const EXPECTED: &'static str = "a date";

    fn from_value(name: &str, value: &Value) -> Result<Self> {
        match value {
            Value::Date(d) => Ok(*d),
            _ => Err(mismatch::<Self>(name, value)),
        }
    }
}

impl FromValue for NaiveDateTime {
    const EXPECTED: &'static str = "a datetime";

    fn from_value(name: &str, value: &Value) -> Result<Self> {
        match value {
            Value::DateTime(dt) => Ok(*dt),
            _ => Err(mismatch::<Self>(name, value)),
        }
    }
}

impl FromValue for PathBuf {
    const EXPECTED: &'static str = "a path";

    fn from_value(name: &str, value: &Value) -> Result<Self> {
        match value {
            Value::Path(p) => Ok(p.clone()),
            Value::Str(s) => Ok(PathBuf::from(s)),
            _ => Err(mismatch::<Self>(name, value)),
        }
    }
}

impl FromValue for serde_json::Value {
    const EXPECTED: &'static str = "structured data";

    fn from_value(name: &str, value: &Value) -> Result<Self> {
        match value {
            Value::Json(json) => Ok(json.clone()),
            other => serde_json::to_value(other).map_err(|_| mismatch::<Self>(name, value)),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    const EXPECTED: &'static str = "a collection";

    fn from_value(name: &str, value: &Value) -> Result<Self> {
        match value {
            Value::List(items) | Value::Tuple(items) => items
                .iter()
                .map(|item| T::from_value(name, item))
                .collect(),
            _ => Err(mismatch::<Self>(name, value)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    const EXPECTED: &'static str = T::EXPECTED;

    fn from_value(name: &str, value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(name, other).map(Some),
        }
    }

    fn from_missing(_name: &str) -> Result<Self> {
        Ok(None)
    }
}

impl<E: Choices> FromValue for Choice<E> {
    const EXPECTED: &'static str = "a choice";

    fn from_value(name: &str, value: &Value) -> Result<Self> {
        let token = value.as_str().ok_or_else(|| mismatch::<Self>(name, value))?;
        E::from_choice(token)
            .map(Choice)
            .ok_or_else(|| Error::TypeMismatch {
                name: name.to_string(),
                expected: "a declared choice",
                found: format!("'{token}'"),
            })
    }
}
