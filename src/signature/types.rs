use crate::convert::Converter;
use crate::value::Choices;

/// Type annotation of a declared parameter
#[derive(Debug, Clone)]
pub enum ParamType {
    Str,
    Int,
    Float,
    Bool,
    Date,
    DateTime,
    Path,
    /// A fixed set of raw string tokens
    Choice(ChoiceSpec),
    /// `list` or `list[T]`; collected values stay growable
    List(Option<Box<ParamType>>),
    /// `tuple` or `tuple[T, ...]`; collected values become a tuple
    Tuple(Option<Box<ParamType>>),
    /// A type known only by name, resolved through the type registry
    Named(String),
    /// A type that converts itself from raw text
    Custom(Converter),
}

impl ParamType {
    pub fn list_of(elem: ParamType) -> Self {
        ParamType::List(Some(Box::new(elem)))
    }

    pub fn tuple_of(elem: ParamType) -> Self {
        ParamType::Tuple(Some(Box::new(elem)))
    }

    pub fn named(name: impl Into<String>) -> Self {
        ParamType::Named(name.into())
    }

    /// Choice set taken from a [`Choices`] enum.
    pub fn choices<E: Choices>(name: impl Into<String>) -> Self {
        ParamType::Choice(ChoiceSpec::new(name, E::choices().iter().copied()))
    }

    /// Name used for registry lookups and conversion errors.
    pub fn type_name(&self) -> &str {
        match self {
            ParamType::Str => "str",
            ParamType::Int => "int",
            ParamType::Float => "float",
            ParamType::Bool => "bool",
            ParamType::Date => "date",
            ParamType::DateTime => "datetime",
            ParamType::Path => "path",
            ParamType::Choice(spec) => &spec.name,
            ParamType::List(_) => "list",
            ParamType::Tuple(_) => "tuple",
            ParamType::Named(name) => name,
            ParamType::Custom(converter) => converter.name(),
        }
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, ParamType::List(_) | ParamType::Tuple(_))
    }
}

/// An enumeration exposed as its declared values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceSpec {
    pub name: String,
    pub values: Vec<String>,
}

impl ChoiceSpec {
    pub fn new<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, token: &str) -> bool {
        self.values.iter().any(|v| v == token)
    }
}
