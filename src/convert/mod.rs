//! String to value conversion
//!
//! Resolves a parameter's declared type into the converter the parser runs
//! on each raw token. Lookup order for a scalar type:
//!
//! 1. a converter registered under the type's name in the [`TypeRegistry`]
//! 2. the built-in handling for primitives, dates and datetimes
//! 3. the type's own converter (`ParamType::Custom`)
//!
//! A `ParamType::Named` type with no registered converter still resolves; it
//! fails when a value is converted, naming the offending input.

mod temporal;

pub use temporal::{parse_date, parse_datetime};

use crate::error::{Error, Result};
use crate::signature::{ChoiceSpec, ParamType};
use crate::value::Value;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

type ConvertFn = dyn Fn(&str) -> Result<Value> + Send + Sync;

/// A named string to value conversion function
#[derive(Clone)]
pub struct Converter {
    name: String,
    func: Arc<ConvertFn>,
}

impl Converter {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&str) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn convert(&self, input: &str) -> Result<Value> {
        (self.func)(input)
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converter").field("name", &self.name).finish()
    }
}

/// Caller-registered converters keyed by type name
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    converters: HashMap<String, Converter>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a converter for every parameter typed `type_name`.
    ///
    /// Registering a built-in name such as `date` replaces the built-in
    /// handling for that type.
    pub fn register<F>(&mut self, type_name: impl Into<String>, func: F)
    where
        F: Fn(&str) -> Result<Value> + Send + Sync + 'static,
    {
        let type_name = type_name.into();
        let converter = Converter::new(type_name.clone(), func);
        self.converters.insert(type_name, converter);
    }

    pub fn get(&self, type_name: &str) -> Option<&Converter> {
        self.converters.get(type_name)
    }

    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    /// A registry holding `self`'s converters, overridden by `child`'s.
    pub fn layered(&self, child: &TypeRegistry) -> TypeRegistry {
        let mut converters = self.converters.clone();
        converters.extend(
            child
                .converters
                .iter()
                .map(|(name, converter)| (name.clone(), converter.clone())),
        );
        TypeRegistry { converters }
    }
}

/// Per-token conversion chosen for a parameter
#[derive(Debug, Clone)]
pub enum ValueConverter {
    /// Raw string passed through
    Raw,
    Convert(Converter),
    /// Membership checked on the raw token before it becomes a choice value
    Choices(ChoiceSpec),
}

impl ValueConverter {
    /// Run the conversion on one token, outside the parser.
    pub fn apply(&self, input: &str) -> Result<Value> {
        match self {
            ValueConverter::Raw => Ok(Value::Str(input.to_string())),
            ValueConverter::Convert(converter) => converter.convert(input),
            ValueConverter::Choices(spec) if spec.contains(input) => {
                Ok(Value::Choice(input.to_string()))
            }
            ValueConverter::Choices(spec) => Err(Error::conversion(
                &spec.name,
                input,
                format!(
                    "choose from {}",
                    spec.values
                        .iter()
                        .map(|v| format!("'{v}'"))
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            )),
        }
    }
}

/// How collected values are materialized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    List,
    Tuple,
}

impl Collection {
    pub fn collect(self, items: Vec<Value>) -> Value {
        match self {
            Collection::List => Value::List(items),
            Collection::Tuple => Value::Tuple(items),
        }
    }
}

/// Resolved conversion for one parameter
#[derive(Debug, Clone)]
pub struct Resolved {
    pub converter: ValueConverter,
    pub collection: Option<Collection>,
}

/// Resolve a declared type into its conversion.
///
/// `None` (an untyped parameter) passes raw strings through.
pub fn resolve(ty: Option<&ParamType>, registry: &TypeRegistry) -> Resolved {
    let Some(ty) = ty else {
        return Resolved {
            converter: ValueConverter::Raw,
            collection: None,
        };
    };

    match ty {
        ParamType::List(elem) | ParamType::Tuple(elem) => {
            let collection = if matches!(ty, ParamType::Tuple(_)) {
                Collection::Tuple
            } else {
                Collection::List
            };
            let converter = elem
                .as_deref()
                .map(|elem| resolve_scalar(elem, registry))
                .unwrap_or(ValueConverter::Raw);
            Resolved {
                converter,
                collection: Some(collection),
            }
        }
        scalar => Resolved {
            converter: resolve_scalar(scalar, registry),
            collection: None,
        },
    }
}

fn resolve_scalar(ty: &ParamType, registry: &TypeRegistry) -> ValueConverter {
    if let Some(converter) = registry.get(ty.type_name()) {
        return ValueConverter::Convert(converter.clone());
    }

    match ty {
        ParamType::Str => ValueConverter::Raw,
        ParamType::Int => ValueConverter::Convert(Converter::new("int", parse_int)),
        ParamType::Float => ValueConverter::Convert(Converter::new("float", parse_float)),
        ParamType::Bool => ValueConverter::Convert(Converter::new("bool", parse_bool)),
        ParamType::Date => ValueConverter::Convert(Converter::new("date", parse_date)),
        ParamType::DateTime => {
            ValueConverter::Convert(Converter::new("datetime", parse_datetime))
        }
        ParamType::Path => ValueConverter::Convert(Converter::new("path", |s: &str| {
            Ok(Value::Path(PathBuf::from(s)))
        })),
        ParamType::Choice(spec) => ValueConverter::Choices(spec.clone()),
        ParamType::Custom(converter) => ValueConverter::Convert(converter.clone()),
        ParamType::Named(name) => {
            let name = name.clone();
            ValueConverter::Convert(Converter::new(name.clone(), move |input: &str| {
                Err(Error::UnknownType {
                    type_name: name.clone(),
                    input: input.to_string(),
                })
            }))
        }
        ParamType::List(_) | ParamType::Tuple(_) => {
            let name = ty.type_name().to_string();
            ValueConverter::Convert(Converter::new(name.clone(), move |input: &str| {
                Err(Error::conversion(
                    name.clone(),
                    input,
                    "nested collections are not supported",
                ))
            }))
        }
    }
}

pub fn parse_int(input: &str) -> Result<Value> {
    input
        .trim()
        .parse::<i64>()
        .map(Value::Int)
        .map_err(|e| Error::conversion("int", input, e))
}

pub fn parse_float(input: &str) -> Result<Value> {
    input
        .trim()
        .parse::<f64>()
        .map(Value::Float)
        .map_err(|e| Error::conversion("float", input, e))
}

pub fn parse_bool(input: &str) -> Result<Value> {
    match input.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" | "on" => Ok(Value::Bool(true)),
        "false" | "f" | "no" | "n" | "0" | "off" => Ok(Value::Bool(false)),
        _ => Err(Error::conversion("bool", input, "expected true or false")),
    }
}
