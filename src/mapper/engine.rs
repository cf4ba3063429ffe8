//! clap registration and extraction for [`ArgumentSpec`]s
//!
//! Every stored value goes through a [`Value`] producing value parser, so
//! extraction reads `Value`s back regardless of declared type. Presence is
//! decided by value source: nothing is pre-populated for an argument the
//! user did not supply.

use super::{required_after_optional, ArgAction, ArgumentSpec, Arity};
use crate::convert::ValueConverter;
use crate::value::Value;
use clap::builder::{PossibleValuesParser, TypedValueParser, ValueParser};
use clap::parser::ValueSource;
use clap::{Arg, ArgGroup, ArgMatches};
use std::collections::HashSet;
use std::path::PathBuf;

/// Argument specs registered on one parser, plus every id they occupy
#[derive(Debug, Clone, Default)]
pub struct RegisteredArgs {
    pub specs: Vec<ArgumentSpec>,
    claimed: HashSet<String>,
}

impl RegisteredArgs {
    /// Whether an id in the parse result belongs to a declared parameter.
    pub fn is_claimed(&self, id: &str) -> bool {
        self.claimed.contains(id)
    }

    /// Values of declared parameters in declaration order; absent ones skipped.
    pub fn extract(&self, matches: &ArgMatches) -> Vec<(&ArgumentSpec, Value)> {
        self.specs
            .iter()
            .filter_map(|spec| extract_value(spec, matches).map(|value| (spec, value)))
            .collect()
    }
}

fn negation_id(name: &str) -> String {
    format!("no-{name}")
}

fn group_id(name: &str) -> String {
    format!("{name}-flag")
}

/// Register specs on `cmd` in order.
pub fn register_arguments(
    mut cmd: clap::Command,
    specs: Vec<ArgumentSpec>,
) -> (clap::Command, RegisteredArgs) {
    let mut claimed = HashSet::new();

    for spec in specs.iter().filter(|spec| !spec.starved) {
        claimed.insert(spec.name.clone());
        match spec.action {
            ArgAction::BooleanOptional => {
                let negation = negation_id(&spec.name);
                let group = group_id(&spec.name);
                claimed.insert(negation.clone());
                claimed.insert(group.clone());

                let mut positive = Arg::new(spec.name.clone())
                    .long(spec.display_name.clone())
                    .action(clap::ArgAction::SetTrue)
                    .overrides_with(negation.clone());
                if let Some(help) = &spec.help {
                    positive = positive.help(help.clone());
                }
                let negative = Arg::new(negation.clone())
                    .long(format!("no-{}", spec.display_name))
                    .action(clap::ArgAction::SetTrue)
                    .overrides_with(spec.name.clone());
                cmd = cmd.arg(positive).arg(negative).group(
                    ArgGroup::new(group)
                        .args([spec.name.clone(), negation])
                        .multiple(true)
                        .required(true),
                );
            }
            ArgAction::StoreConst(value) => {
                let mut arg = Arg::new(spec.name.clone())
                    .long(spec.display_name.clone())
                    .action(if value {
                        clap::ArgAction::SetTrue
                    } else {
                        clap::ArgAction::SetFalse
                    });
                if let Some(help) = &spec.help {
                    arg = arg.help(help.clone());
                }
                cmd = cmd.arg(arg);
            }
            ArgAction::Store => cmd = cmd.arg(store_arg(spec)),
        }
    }

    // `[opt] <req>`: a lone trailing token goes to the required positional
    if required_after_optional(&specs) {
        cmd = cmd.allow_missing_positional(true);
    }

    (cmd, RegisteredArgs { specs, claimed })
}

fn store_arg(spec: &ArgumentSpec) -> Arg {
    let mut arg = Arg::new(spec.name.clone())
        .value_parser(value_parser(&spec.converter))
        .required(spec.engine_required());

    arg = if spec.positional {
        arg.value_name(spec.display_name.clone())
    } else {
        arg.long(spec.display_name.clone())
            .value_name(spec.name.to_uppercase())
            .action(clap::ArgAction::Set)
    };

    arg = match spec.arity {
        Arity::Single | Arity::ZeroOrOne => arg.num_args(1),
        Arity::ZeroOrMore => arg.num_args(0..),
    };

    if let Some(help) = &spec.help {
        arg = arg.help(help.clone());
    }
    arg
}

fn value_parser(converter: &ValueConverter) -> ValueParser {
    match converter {
        // membership is checked on the raw token first so the error lists
        // the declared values
        ValueConverter::Choices(spec) => PossibleValuesParser::new(spec.values.clone())
            .map(Value::Choice)
            .into(),
        other => {
            let converter = other.clone();
            ValueParser::new(move |input: &str| converter.apply(input))
        }
    }
}

fn from_command_line(matches: &ArgMatches, id: &str) -> bool {
    matches!(matches.value_source(id), Some(ValueSource::CommandLine))
}

/// The parsed value of one declared parameter, or `None` if not supplied.
pub fn extract_value(spec: &ArgumentSpec, matches: &ArgMatches) -> Option<Value> {
    match spec.action {
        ArgAction::BooleanOptional => {
            if from_command_line(matches, &spec.name) {
                Some(Value::Bool(true))
            } else if from_command_line(matches, &negation_id(&spec.name)) {
                Some(Value::Bool(false))
            } else {
                None
            }
        }
        ArgAction::StoreConst(value) => {
            from_command_line(matches, &spec.name).then_some(Value::Bool(value))
        }
        ArgAction::Store => {
            if spec.starved || !from_command_line(matches, &spec.name) {
                // an empty positional collection still reaches the handler
                return match spec.collection {
                    Some(collection) if spec.positional && spec.default.is_none() => {
                        Some(collection.collect(Vec::new()))
                    }
                    _ => None,
                };
            }
            let values: Vec<Value> = matches
                .get_many::<Value>(&spec.name)
                .map(|values| values.cloned().collect())
                .unwrap_or_default();
            match spec.collection {
                Some(collection) => Some(collection.collect(values)),
                None => values.into_iter().next(),
            }
        }
    }
}

macro_rules! try_typed {
    ($matches:expr, $id:expr, $ty:ty, $wrap:expr) => {
        if let Ok(Some(values)) = $matches.try_get_many::<$ty>($id) {
            let mut items: Vec<Value> = values.map(|v| ($wrap)(v.clone())).collect();
            return Some(if items.len() == 1 {
                items.remove(0)
            } else {
                Value::List(items)
            });
        }
    };
}

/// Best-effort value of an argument the mapper did not create.
pub fn extract_unclaimed(matches: &ArgMatches, id: &str) -> Option<Value> {
    try_typed!(matches, id, Value, |v: Value| v);
    try_typed!(matches, id, String, Value::Str);
    try_typed!(matches, id, bool, Value::Bool);
    try_typed!(matches, id, u8, |v: u8| Value::Int(i64::from(v)));
    try_typed!(matches, id, i64, Value::Int);
    try_typed!(matches, id, u64, |v: u64| Value::Int(v as i64));
    try_typed!(matches, id, f64, Value::Float);
    try_typed!(matches, id, PathBuf, Value::Path);

    let raw = matches.try_get_raw(id).ok()??;
    let mut items: Vec<Value> = raw
        .map(|v| Value::Str(v.to_string_lossy().into_owned()))
        .collect();
    match items.len() {
        0 => None,
        1 => Some(items.remove(0)),
        _ => Some(Value::List(items)),
    }
}
