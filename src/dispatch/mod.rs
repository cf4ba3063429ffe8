//! Parser construction and call assembly
//!
//! A [`Command`] tree becomes one clap parser: the top-level parameters on
//! the root, one subcommand per registered subcommand. After parsing, the
//! dispatcher rebuilds positional and keyword values for the selected
//! handler and calls it. Handler errors pass through untouched.

mod command;
mod invocation;

pub use command::{Command, Handler, ParserHook};
pub use invocation::Invocation;

use crate::config::Settings;
use crate::console::Console;
use crate::convert::TypeRegistry;
use crate::error::{Error, Result};
use crate::harvest::harvest_comments;
use crate::mapper::{
    check_positional_order, extract_unclaimed, extract_value, kebab_case, map_parameters,
    register_arguments, RegisteredArgs,
};
use crate::value::Value;
use clap::ArgMatches;
use std::collections::{HashMap, HashSet};
use std::ffi::OsString;
use std::io::Write;
use tracing::{debug, trace};

/// A configured parser and the arguments each level registered
#[derive(Debug)]
pub struct BuiltParser {
    pub parser: clap::Command,
    top: RegisteredArgs,
    subcommands: Vec<(String, RegisteredArgs)>,
}

impl BuiltParser {
    fn registered_for(&self, subcommand: &str) -> Option<&RegisteredArgs> {
        self.subcommands
            .iter()
            .find(|(name, _)| name == subcommand)
            .map(|(_, registered)| registered)
    }
}

/// Build the parser for `command` and its subcommands.
pub fn build_parser(command: &Command, settings: &Settings) -> Result<BuiltParser> {
    command.validate()?;

    let mut parser = clap::Command::new(kebab_case(&command.name)).args_override_self(true);
    if let Some(description) = command.description() {
        parser = parser.about(description);
    }
    // hook-added arguments are registered before any declared parameter
    if let Some(hook) = &command.parser_hook {
        parser = hook(parser);
    }
    let (mut parser, top) = register_level(parser, command, &command.types)?;

    let mut subcommands = Vec::with_capacity(command.subcommands.len());
    for sub in &command.subcommands {
        let name = kebab_case(&sub.name);
        let mut sub_parser = clap::Command::new(name.clone()).args_override_self(true);
        if let Some(summary) = sub.summary() {
            sub_parser = sub_parser.about(summary);
        }
        if let Some(details) = sub.details() {
            sub_parser = sub_parser.after_help(details);
        }
        if let Some(hook) = &sub.parser_hook {
            sub_parser = hook(sub_parser);
        }
        let types = command.types.layered(&sub.types);
        let (sub_parser, registered) = register_level(sub_parser, sub, &types)?;
        debug!(subcommand = %name, args = registered.specs.len(), "registered subcommand");
        parser = parser.subcommand(settings.apply(sub_parser));
        subcommands.push((name, registered));
    }

    Ok(BuiltParser {
        parser: settings.apply(parser),
        top,
        subcommands,
    })
}

fn register_level(
    parser: clap::Command,
    command: &Command,
    types: &TypeRegistry,
) -> Result<(clap::Command, RegisteredArgs)> {
    let comments = match &command.source {
        Some(source) => {
            let names: Vec<&str> = command.params.iter().map(|p| p.name.as_str()).collect();
            harvest_comments(source, &names)
        }
        None => HashMap::new(),
    };
    let specs = map_parameters(&command.params, types, &comments);
    check_positional_order(&command.name, &specs)?;
    Ok(register_arguments(parser, specs))
}

/// Parse `argv`, then call the selected handler.
///
/// A parse failure (including `--help`) is rendered through `console`,
/// whose `exit` decides whether the process ends or an
/// [`Error::Exit`] comes back.
pub fn dispatch<I, T, C>(
    command: &Command,
    argv: I,
    mut console: C,
    settings: &Settings,
) -> anyhow::Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    C: Console,
{
    let mut built = build_parser(command, settings)?;
    let matches = match built.parser.try_get_matches_from_mut(argv) {
        Ok(matches) => matches,
        Err(err) => return Err(report_parse_error(&err, &mut console).into()),
    };

    let (target, invocation) = assemble(command, &built, &matches)?;
    target.call(invocation)
}

fn report_parse_error<C: Console>(err: &clap::Error, console: &mut C) -> Error {
    let rendered = err.render();
    let text = if console.styled() {
        rendered.ansi().to_string()
    } else {
        rendered.to_string()
    };
    debug!(kind = ?err.kind(), code = err.exit_code(), "parse ended");

    let stream = if err.use_stderr() {
        console.stderr()
    } else {
        console.stdout()
    };
    if let Err(e) = stream.write_all(text.as_bytes()).and_then(|()| stream.flush()) {
        return Error::Io(e);
    }
    console.exit(err.exit_code())
}

/// Resolve the target handler and rebuild its call from parsed values.
fn assemble<'a>(
    command: &'a Command,
    built: &BuiltParser,
    matches: &ArgMatches,
) -> Result<(&'a Command, Invocation)> {
    let mut invocation = Invocation::new();

    let Some((name, sub_matches)) = matches.subcommand() else {
        fill_declared(&mut invocation, &built.top, matches);
        merge_unclaimed(&mut invocation, &built.top, &built.parser, matches);
        if command.takes_var_keyword() {
            invocation.set_parser(built.parser.clone());
        }
        return Ok((command, invocation));
    };

    let target = command
        .subcommands
        .iter()
        .find(|sub| kebab_case(&sub.name) == name)
        .ok_or_else(|| Error::Declaration(format!("unknown subcommand '{name}'")))?;
    let registered = built
        .registered_for(name)
        .ok_or_else(|| Error::Declaration(format!("unregistered subcommand '{name}'")))?;
    let sub_parser = built
        .parser
        .find_subcommand(name)
        .ok_or_else(|| Error::Declaration(format!("unknown subcommand '{name}'")))?;
    debug!(subcommand = %name, "dispatching to subcommand");

    // top-level values reach the subcommand as keywords
    for (spec, value) in built.top.extract(matches) {
        invocation.insert_kwarg(spec.name.clone(), value);
    }
    fill_declared(&mut invocation, registered, sub_matches);
    merge_unclaimed(&mut invocation, registered, sub_parser, sub_matches);
    merge_unclaimed(&mut invocation, &built.top, &built.parser, matches);
    if target.takes_var_keyword() {
        invocation.set_parser(sub_parser.clone());
    }
    Ok((target, invocation))
}

/// Positional values in declaration order, keyword values for the rest.
///
/// A positional left unsupplied ahead of a supplied one takes its default
/// so later values keep their slots.
fn fill_declared(invocation: &mut Invocation, registered: &RegisteredArgs, matches: &ArgMatches) {
    let mut slots = Vec::new();
    for spec in &registered.specs {
        let value = extract_value(spec, matches);
        if spec.binds_positionally {
            slots.push((spec, value));
        } else if let Some(value) = value {
            trace!(param = %spec.name, %value, "keyword value");
            invocation.insert_kwarg(spec.name.clone(), value);
        }
    }

    let supplied = slots
        .iter()
        .rposition(|(_, value)| value.is_some())
        .map_or(0, |last| last + 1);
    for (spec, value) in slots.into_iter().take(supplied) {
        let value = value
            .or_else(|| spec.default.clone())
            .unwrap_or(Value::Null);
        trace!(param = %spec.name, %value, "positional value");
        invocation.push_positional(spec.name.clone(), value);
    }
}

/// Values of arguments no declared parameter created, such as hook-added ones.
fn merge_unclaimed(
    invocation: &mut Invocation,
    registered: &RegisteredArgs,
    parser: &clap::Command,
    matches: &ArgMatches,
) {
    let groups: HashSet<&str> = parser.get_groups().map(|g| g.get_id().as_str()).collect();
    for id in matches.ids() {
        let id = id.as_str();
        if registered.is_claimed(id) || groups.contains(id) {
            continue;
        }
        if let Some(value) = extract_unclaimed(matches, id) {
            trace!(id, %value, "unclaimed value");
            invocation.insert_kwarg_if_absent(id, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::{ParamType, Parameter};

    fn noop(_: &Invocation) -> anyhow::Result<()> {
        Ok(())
    }

    fn parse(command: &Command, argv: &[&str]) -> (String, Invocation) {
        let mut built = build_parser(command, &Settings::default()).unwrap();
        let matches = built.parser.try_get_matches_from_mut(argv).unwrap();
        let (target, invocation) = assemble(command, &built, &matches).unwrap();
        (target.name().to_string(), invocation)
    }

    #[test]
    fn test_positional_gap_takes_default() {
        let cmd = Command::new("main", noop)
            .param(Parameter::positional_only("a"))
            .param(Parameter::positional_only("b").default("b"))
            .param(Parameter::positional_only("c").default("c"));

        let (_, inv) = parse(&cmd, &["main", "x"]);
        assert_eq!(inv.args(), &[Value::from("x")]);

        let (_, inv) = parse(&cmd, &["main", "x", "y", "z"]);
        assert_eq!(inv.args().len(), 3);
    }

    #[test]
    fn test_subcommand_receives_top_level_keywords() {
        let cmd = Command::new("main", noop)
            .param(Parameter::keyword("global_option").ty(ParamType::Bool).default(false))
            .subcommand(Command::new("subfunc", noop).param(Parameter::positional("foo")));

        let (target, inv) = parse(&cmd, &["main", "--global-option", "subfunc", "bar"]);
        assert_eq!(target, "subfunc");
        assert_eq!(inv.args(), &[Value::from("bar")]);
        assert_eq!(
            inv.kwargs().get("global_option"),
            Some(&Value::Bool(true))
        );
    }

    #[test]
    fn test_boolean_group_ids_are_not_merged() {
        let cmd = Command::new("main", noop).param(Parameter::keyword("a").ty(ParamType::Bool));
        let (_, inv) = parse(&cmd, &["main", "--no-a"]);
        assert_eq!(inv.kwargs().len(), 1);
        assert_eq!(inv.kwargs().get("a"), Some(&Value::Bool(false)));
    }

    #[test]
    fn test_declaration_errors_surface_before_parsing() {
        let cmd = Command::new("main", noop)
            .param(Parameter::positional("a"))
            .param(Parameter::positional("a"));
        assert!(matches!(
            build_parser(&cmd, &Settings::default()),
            Err(Error::Declaration(_))
        ));
    }
}
