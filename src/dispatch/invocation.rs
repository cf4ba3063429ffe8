//! The assembled call a handler receives

use crate::error::Result;
use crate::signature::Parameter;
use crate::value::{Choice, Choices, FromValue, Value};
use serde_json::json;
use std::collections::BTreeMap;

/// Positional values and keyword values for one handler call.
///
/// Built by the dispatcher from parsed arguments, or by hand for a direct
/// call. Values the caller did not supply fall back to the declared
/// parameter defaults through [`Invocation::value`].
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    args: Vec<Value>,
    kwargs: BTreeMap<String, Value>,
    positional_names: Vec<String>,
    defaults: BTreeMap<String, Value>,
    command: Option<String>,
    parser: Option<clap::Command>,
}

impl Invocation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional value.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Set a keyword value.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(name.into(), value.into());
        self
    }

    /// No positional and no keyword values were supplied.
    pub fn is_empty(&self) -> bool {
        self.args.is_empty() && self.kwargs.is_empty()
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn kwargs(&self) -> &BTreeMap<String, Value> {
        &self.kwargs
    }

    /// Name of the command whose handler runs, once known.
    pub fn command(&self) -> Option<&str> {
        self.command.as_deref()
    }

    /// Value bound to `name`: keyword first, then a named positional, then
    /// the declared default.
    pub fn value(&self, name: &str) -> Option<&Value> {
        if let Some(value) = self.kwargs.get(name) {
            return Some(value);
        }
        if let Some(index) = self.positional_names.iter().position(|n| n == name) {
            if let Some(value) = self.args.get(index) {
                return Some(value);
            }
        }
        self.defaults.get(name)
    }

    /// Typed value of `name`.
    pub fn get<T: FromValue>(&self, name: &str) -> Result<T> {
        match self.value(name) {
            Some(value) => T::from_value(name, value),
            None => T::from_missing(name),
        }
    }

    /// The enum behind a choice-valued parameter.
    pub fn get_choice<E: Choices>(&self, name: &str) -> Result<E> {
        self.get::<Choice<E>>(name).map(Choice::into_inner)
    }

    /// The configured parser, present when the handler takes variadic
    /// keywords and the call came through the command line.
    pub fn parser(&self) -> Option<&clap::Command> {
        self.parser.as_ref()
    }

    pub fn render_help(&self) -> Option<String> {
        self.parser
            .as_ref()
            .map(|parser| parser.clone().render_help().to_string())
    }

    /// JSON view of the call: command name, positional values, keyword values.
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "command": self.command,
            "args": self.args,
            "kwargs": self.kwargs,
        })
    }

    pub(crate) fn push_positional(&mut self, name: impl Into<String>, value: Value) {
        self.positional_names.push(name.into());
        self.args.push(value);
    }

    pub(crate) fn insert_kwarg(&mut self, name: impl Into<String>, value: Value) {
        self.kwargs.insert(name.into(), value);
    }

    /// Keep an existing keyword value; used for values nobody declared.
    pub(crate) fn insert_kwarg_if_absent(&mut self, name: impl Into<String>, value: Value) {
        self.kwargs.entry(name.into()).or_insert(value);
    }

    pub(crate) fn set_parser(&mut self, parser: clap::Command) {
        self.parser = Some(parser);
    }

    /// Attach names and defaults from the handler's declared parameters.
    ///
    /// Positional values left unnamed are matched, in order, to the
    /// parameters that accept a position.
    pub(crate) fn bind(&mut self, command: &str, params: &[Parameter]) {
        self.command = Some(command.to_string());

        if self.positional_names.len() < self.args.len() {
            let named = self.positional_names.len();
            let extra = params
                .iter()
                .filter(|p| p.kind.accepts_position() && !p.kind.is_variadic())
                .skip(named)
                .take(self.args.len() - named)
                .map(|p| p.name.clone());
            self.positional_names.extend(extra.collect::<Vec<_>>());
        }

        for param in params {
            if let Some(default) = &param.default {
                self.defaults
                    .entry(param.name.clone())
                    .or_insert_with(|| default.clone());
            }
        }
    }
}
