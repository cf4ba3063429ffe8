//! Command descriptors
//!
//! A [`Command`] pairs a handler with its declared parameters. It can be
//! called directly with an [`Invocation`] or driven from the command line,
//! where the parameters are mapped to a clap parser first.

use super::invocation::Invocation;
use crate::config::Settings;
use crate::console::{Console, ProcessConsole};
use crate::convert::TypeRegistry;
use crate::error::{Error, Result};
use crate::signature::{ParamKind, Parameter};
use crate::value::Value;
use std::collections::HashSet;
use std::ffi::OsString;
use std::fmt;
use tracing::debug;

pub type Handler = Box<dyn Fn(&Invocation) -> anyhow::Result<()>>;
pub type ParserHook = Box<dyn Fn(clap::Command) -> clap::Command>;

pub struct Command {
    pub(crate) name: String,
    pub(crate) doc: Option<String>,
    pub(crate) params: Vec<Parameter>,
    pub(crate) source: Option<String>,
    pub(crate) handler: Handler,
    pub(crate) subcommands: Vec<Command>,
    pub(crate) types: TypeRegistry,
    pub(crate) parser_hook: Option<ParserHook>,
    pub(crate) settings: Option<Settings>,
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("doc", &self.doc)
            .field("params", &self.params)
            .field("subcommands", &self.subcommands)
            .field("types", &self.types)
            .field("parser_hook", &self.parser_hook.is_some())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Command {
    pub fn new<F>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Invocation) -> anyhow::Result<()> + 'static,
    {
        Self {
            name: name.into(),
            doc: None,
            params: Vec::new(),
            source: None,
            handler: Box::new(handler),
            subcommands: Vec::new(),
            types: TypeRegistry::new(),
            parser_hook: None,
            settings: None,
        }
    }

    /// Docstring: the first paragraph becomes the summary in a parent's
    /// subcommand listing, the whole text the description.
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn param(mut self, param: Parameter) -> Self {
        self.params.push(param);
        self
    }

    pub fn params(mut self, params: impl IntoIterator<Item = Parameter>) -> Self {
        self.params.extend(params);
        self
    }

    /// Source text of the handler's declaration, scanned for trailing
    /// parameter comments.
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn subcommand(mut self, command: Command) -> Self {
        self.subcommands.push(command);
        self
    }

    pub fn register_subcommand(&mut self, command: Command) -> &mut Self {
        self.subcommands.push(command);
        self
    }

    /// Register a converter for parameters typed `type_name`. Subcommands
    /// see it too unless they register their own under the same name.
    pub fn type_converter<F>(mut self, type_name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&str) -> Result<Value> + Send + Sync + 'static,
    {
        self.types.register(type_name, func);
        self
    }

    /// Customize the fresh parser before any parameter is registered on it.
    pub fn parser_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(clap::Command) -> clap::Command + 'static,
    {
        self.parser_hook = Some(Box::new(hook));
        self
    }

    /// Fixed presentation settings; [`Command::run`] loads them from the
    /// environment otherwise.
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get_params(&self) -> &[Parameter] {
        &self.params
    }

    pub fn get_subcommands(&self) -> &[Command] {
        &self.subcommands
    }

    /// Dedented, trimmed docstring.
    pub fn description(&self) -> Option<String> {
        self.doc
            .as_deref()
            .map(|doc| dedent(doc).trim().to_string())
            .filter(|doc| !doc.is_empty())
    }

    /// First run of non-blank docstring lines, joined by single spaces.
    pub fn summary(&self) -> Option<String> {
        let description = self.description()?;
        let summary = description
            .lines()
            .take_while(|line| !line.trim().is_empty())
            .map(str::trim)
            .collect::<Vec<_>>()
            .join(" ");
        Some(summary)
    }

    /// Docstring paragraphs after the summary, if any.
    pub fn details(&self) -> Option<String> {
        let description = self.description()?;
        let rest = description
            .lines()
            .skip_while(|line| !line.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        let rest = rest.trim();
        (!rest.is_empty()).then(|| rest.to_string())
    }

    /// Run the handler directly, without looking at process arguments.
    pub fn call(&self, mut invocation: Invocation) -> anyhow::Result<()> {
        invocation.bind(&self.name, &self.params);
        debug!(
            command = %self.name,
            args = invocation.args().len(),
            kwargs = invocation.kwargs().len(),
            "calling handler"
        );
        (self.handler)(&invocation)
    }

    /// Direct call when anything is supplied, command-line run otherwise.
    pub fn invoke(&self, invocation: Invocation) -> anyhow::Result<()> {
        if invocation.is_empty() {
            self.run()
        } else {
            self.call(invocation)
        }
    }

    /// Parse the process arguments and dispatch.
    ///
    /// A parse failure prints the rendered error and exits the process.
    pub fn run(&self) -> anyhow::Result<()> {
        let settings = match &self.settings {
            Some(settings) => settings.clone(),
            None => Settings::load()?,
        };
        super::dispatch(self, std::env::args_os(), ProcessConsole::new(), &settings)
    }

    /// Parse `argv` (program name first) and dispatch, writing through
    /// `console`.
    pub fn run_from<I, T, C>(&self, argv: I, console: C) -> anyhow::Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
        C: Console,
    {
        let settings = self.settings.clone().unwrap_or_default();
        super::dispatch(self, argv, console, &settings)
    }

    /// Reject declarations no parser can represent.
    pub(crate) fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for param in &self.params {
            if !seen.insert(param.name.as_str()) {
                return Err(Error::Declaration(format!(
                    "command '{}' declares parameter '{}' twice",
                    self.name, param.name
                )));
            }
        }

        for kind in [ParamKind::VarPositional, ParamKind::VarKeyword] {
            if self.params.iter().filter(|p| p.kind == kind).count() > 1 {
                return Err(Error::Declaration(format!(
                    "command '{}' declares more than one {:?} parameter",
                    self.name, kind
                )));
            }
        }

        let mut names = HashSet::new();
        for sub in &self.subcommands {
            if !names.insert(crate::mapper::kebab_case(&sub.name)) {
                return Err(Error::Declaration(format!(
                    "command '{}' registers subcommand '{}' twice",
                    self.name, sub.name
                )));
            }
            sub.validate()?;
        }
        Ok(())
    }

    pub(crate) fn takes_var_keyword(&self) -> bool {
        self.params.iter().any(|p| p.kind == ParamKind::VarKeyword)
    }
}

/// Remove the whitespace prefix shared by every non-blank line.
fn dedent(text: &str) -> String {
    let indent = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    text.lines()
        .map(|line| line.get(indent..).unwrap_or_else(|| line.trim_start()))
        .collect::<Vec<_>>()
        .join("\n")
}
