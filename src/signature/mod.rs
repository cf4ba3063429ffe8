//! Declared command signatures
//!
//! A [`Parameter`] describes one parameter of a command handler the way a
//! function signature would: its name, how it may be passed, its type and
//! its default. Commands are built from an ordered list of them.

mod types;

pub use types::{ChoiceSpec, ParamType};

use crate::value::Value;

/// How a parameter may be supplied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    PositionalOnly,
    PositionalOrKeyword,
    KeywordOnly,
    /// Collects extra positional values; has no command-line form
    VarPositional,
    /// Collects extra keyword values; receives the parser itself
    VarKeyword,
}

impl ParamKind {
    pub fn is_variadic(self) -> bool {
        matches!(self, ParamKind::VarPositional | ParamKind::VarKeyword)
    }

    /// Whether a direct call may bind this parameter by position.
    pub fn accepts_position(self) -> bool {
        matches!(self, ParamKind::PositionalOnly | ParamKind::PositionalOrKeyword)
    }
}

/// One declared parameter of a command handler
#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub kind: ParamKind,
    pub ty: Option<ParamType>,
    pub default: Option<Value>,
    pub help: Option<String>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            ty: None,
            default: None,
            help: None,
        }
    }

    pub fn positional_only(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::PositionalOnly)
    }

    /// A regular parameter: positional without a default, a flag with one.
    pub fn positional(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::PositionalOrKeyword)
    }

    pub fn keyword(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::KeywordOnly)
    }

    pub fn var_positional(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::VarPositional)
    }

    pub fn var_keyword(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::VarKeyword)
    }

    pub fn ty(mut self, ty: ParamType) -> Self {
        self.ty = Some(ty);
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    pub fn is_bool(&self) -> bool {
        matches!(self.ty, Some(ParamType::Bool))
    }

    /// Positional on the command line: positional-only, or
    /// positional-or-keyword without a default. Booleans are never
    /// positional, whatever their kind.
    pub fn is_positional(&self) -> bool {
        !self.is_bool() && self.binds_positionally()
    }

    /// Whether the parsed value travels in the positional list.
    pub(crate) fn binds_positionally(&self) -> bool {
        match self.kind {
            ParamKind::PositionalOnly => true,
            ParamKind::PositionalOrKeyword => !self.has_default(),
            _ => false,
        }
    }
}
