//! Parameter to argument mapping
//!
//! Turns declared [`Parameter`]s into [`ArgumentSpec`]s, then into clap
//! arguments. Variadic parameters have no command-line form and are skipped.

mod engine;

pub use engine::{extract_unclaimed, extract_value, register_arguments, RegisteredArgs};

use crate::convert::{resolve, Collection, TypeRegistry, ValueConverter};
use crate::error::{Error, Result};
use crate::signature::Parameter;
use crate::value::Value;
use std::collections::HashMap;
use tracing::debug;

/// How many value tokens an argument consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Single,
    ZeroOrOne,
    ZeroOrMore,
}

/// What the parser does when it meets the argument
#[derive(Debug, Clone, PartialEq)]
pub enum ArgAction {
    /// Store converted value(s)
    Store,
    /// `--name` stores true, `--no-name` stores false; one is required
    BooleanOptional,
    /// `--name` stores this constant (the negated default)
    StoreConst(bool),
}

/// The parser-facing form of one parameter
#[derive(Debug, Clone)]
pub struct ArgumentSpec {
    /// Parameter name; also the parser's argument id
    pub name: String,
    pub display_name: String,
    pub positional: bool,
    /// Whether the value travels in the positional list of the call
    pub binds_positionally: bool,
    /// Required for help purposes: no default, and a flag or a boolean
    pub required: bool,
    pub arity: Arity,
    pub action: ArgAction,
    pub converter: ValueConverter,
    pub collection: Option<Collection>,
    pub help: Option<String>,
    pub default: Option<Value>,
    /// Optional positional behind a list positional. The list takes every
    /// token, so this one is never registered and always falls back.
    pub starved: bool,
}

impl ArgumentSpec {
    /// Whether the parser itself must reject a missing argument.
    pub fn engine_required(&self) -> bool {
        if self.positional {
            self.default.is_none() && self.arity == Arity::Single
        } else {
            self.default.is_none() && self.action != ArgAction::BooleanOptional
        }
    }

    /// Values of the choice set, when the converter validates choices.
    pub fn choices(&self) -> Option<&[String]> {
        match &self.converter {
            ValueConverter::Choices(spec) => Some(&spec.values),
            _ => None,
        }
    }

    /// Long option names the argument occupies on the parser.
    pub fn longs(&self) -> Vec<String> {
        match self.action {
            ArgAction::BooleanOptional => {
                vec![self.display_name.clone(), format!("no-{}", self.display_name)]
            }
            _ => vec![self.display_name.clone()],
        }
    }
}

/// Strip outer underscores and hyphenate the rest.
///
/// `optional_argument` becomes `optional-argument`, `__foo___` becomes `foo`.
pub fn kebab_case(name: &str) -> String {
    name.trim_matches('_').replace('_', "-")
}

/// Map every non-variadic parameter to its argument spec, in order.
///
/// Flags whose long names collide are not renamed: the last one declared
/// takes the name and the earlier ones get no command-line form. A boolean
/// without default claims its `--no-` form as well.
pub fn map_parameters(
    params: &[Parameter],
    registry: &TypeRegistry,
    comments: &HashMap<String, String>,
) -> Vec<ArgumentSpec> {
    let specs: Vec<ArgumentSpec> = params
        .iter()
        .filter(|p| !p.kind.is_variadic())
        .map(|p| map_parameter(p, registry, comments))
        .collect();

    let mut kept = Vec::with_capacity(specs.len());
    for (i, spec) in specs.iter().enumerate() {
        let shadowed = !spec.positional && {
            let longs = spec.longs();
            specs[i + 1..]
                .iter()
                .filter(|later| !later.positional)
                .any(|later| later.longs().iter().any(|long| longs.contains(long)))
        };
        if shadowed {
            debug!(
                param = %spec.name,
                display = %spec.display_name,
                "flag name taken by a later parameter"
            );
            continue;
        }
        kept.push(spec.clone());
    }

    let mut after_list = false;
    for spec in kept.iter_mut().filter(|spec| spec.positional) {
        if after_list && !spec.engine_required() {
            debug!(param = %spec.name, "positional follows a list positional");
            spec.starved = true;
        }
        after_list |= spec.arity == Arity::ZeroOrMore;
    }
    kept
}

/// Reject positional orders a parser cannot split unambiguously.
///
/// A required positional may follow an optional one only as `[opt] <req>`
/// or `<req> [opt] <req>`, the optional one possibly a list.
pub fn check_positional_order(command: &str, specs: &[ArgumentSpec]) -> Result<()> {
    let positionals: Vec<&ArgumentSpec> = specs
        .iter()
        .filter(|spec| spec.positional && !spec.starved)
        .collect();
    let Some(first_optional) = positionals.iter().position(|spec| !spec.engine_required()) else {
        return Ok(());
    };
    let trailing = &positionals[first_optional + 1..];
    let Some(required) = trailing.iter().find(|spec| spec.engine_required()) else {
        return Ok(());
    };
    if first_optional <= 1 && trailing.len() == 1 {
        return Ok(());
    }
    Err(Error::Declaration(format!(
        "command '{}' declares required positional '{}' after optional positional '{}'",
        command, required.name, positionals[first_optional].name
    )))
}

/// Whether a required positional follows an optional one.
pub(crate) fn required_after_optional(specs: &[ArgumentSpec]) -> bool {
    let mut optional_seen = false;
    for spec in specs.iter().filter(|spec| spec.positional && !spec.starved) {
        if spec.engine_required() && optional_seen {
            return true;
        }
        optional_seen |= !spec.engine_required();
    }
    false
}

pub fn map_parameter(
    param: &Parameter,
    registry: &TypeRegistry,
    comments: &HashMap<String, String>,
) -> ArgumentSpec {
    let display_name = kebab_case(&param.name);
    let positional = param.is_positional();
    let has_default = param.has_default();
    let required = !has_default && (!positional || param.is_bool());

    let help = decorate_help(
        param.help.as_deref().or(comments.get(&param.name).map(String::as_str)),
        required,
        param.default.as_ref().filter(|d| !d.is_null() && !param.is_bool()),
    );

    let spec = if param.is_bool() {
        let action = match &param.default {
            None => ArgAction::BooleanOptional,
            Some(Value::Bool(default)) => ArgAction::StoreConst(!default),
            // a non-bool default on a bool parameter behaves like false
            Some(_) => ArgAction::StoreConst(true),
        };
        ArgumentSpec {
            name: param.name.clone(),
            display_name,
            positional: false,
            binds_positionally: param.binds_positionally(),
            required,
            arity: Arity::Single,
            action,
            converter: ValueConverter::Raw,
            collection: None,
            help,
            default: param.default.clone(),
            starved: false,
        }
    } else {
        let resolved = resolve(param.ty.as_ref(), registry);
        let arity = if positional && has_default {
            Arity::ZeroOrOne
        } else if resolved.collection.is_some() {
            Arity::ZeroOrMore
        } else {
            Arity::Single
        };
        ArgumentSpec {
            name: param.name.clone(),
            display_name,
            positional,
            binds_positionally: param.binds_positionally(),
            required,
            arity,
            action: ArgAction::Store,
            converter: resolved.converter,
            // a positional with a default takes at most one token
            collection: resolved.collection.filter(|_| arity == Arity::ZeroOrMore),
            help,
            default: param.default.clone(),
            starved: false,
        }
    };

    debug!(
        param = %spec.name,
        display = %spec.display_name,
        positional = spec.positional,
        required = spec.required,
        arity = ?spec.arity,
        "mapped parameter"
    );
    spec
}

fn decorate_help(help: Option<&str>, required: bool, default: Option<&Value>) -> Option<String> {
    let mut parts = Vec::new();
    if required {
        parts.push("required".to_string());
    }
    if let Some(default) = default {
        parts.push(format!("default: {default}"));
    }
    let extra = parts.join(", ");

    match (help.filter(|h| !h.is_empty()), extra.is_empty()) {
        (Some(help), false) => Some(format!("{help} ({extra})")),
        (Some(help), true) => Some(help.to_string()),
        (None, false) => Some(format!("({extra})")),
        (None, true) => None,
    }
}
