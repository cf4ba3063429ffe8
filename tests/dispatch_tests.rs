// Tests for parsing command lines into handler invocations
use bargeparse::{
    CapturedConsole, Choices, Command, Error, Invocation, ParamType, Parameter, Value,
};
use chrono::NaiveDate;
use clap::{Arg, ArgAction};
use std::cell::RefCell;
use std::rc::Rc;

type Slot = Rc<RefCell<Option<Invocation>>>;

/// A handler that keeps the invocation it receives
fn recorder() -> (Slot, impl Fn(&Invocation) -> anyhow::Result<()> + 'static) {
    let slot: Slot = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&slot);
    let handler = move |inv: &Invocation| {
        *sink.borrow_mut() = Some(inv.clone());
        Ok(())
    };
    (slot, handler)
}

fn run(cmd: &Command, argv: &[&str]) -> (anyhow::Result<()>, CapturedConsole) {
    let mut console = CapturedConsole::new();
    let result = cmd.run_from(argv.iter().copied(), &mut console);
    (result, console)
}

fn exit_code(result: &anyhow::Result<()>) -> Option<i32> {
    result.as_ref().err()?.downcast_ref::<Error>()?.exit_code()
}

fn received(slot: &Slot) -> Invocation {
    slot.borrow().clone().expect("handler was not called")
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Color {
    Red,
    Green,
    Blue,
}

impl Choices for Color {
    fn choices() -> &'static [&'static str] {
        &["red", "green", "blue"]
    }

    fn from_choice(token: &str) -> Option<Self> {
        match token {
            "red" => Some(Color::Red),
            "green" => Some(Color::Green),
            "blue" => Some(Color::Blue),
            _ => None,
        }
    }
}

#[test]
fn test_args_and_kwargs() {
    let (slot, handler) = recorder();
    let cmd = Command::new("func", handler).params([
        Parameter::positional("a"),
        Parameter::positional("b"),
        Parameter::positional("c").default(Value::Null),
        Parameter::positional("d").default(Value::Null),
    ]);

    let (result, _) = run(&cmd, &["", "--c", "fizz", "--d", "buzz", "foo", "bar"]);
    result.unwrap();

    let inv = received(&slot);
    assert_eq!(inv.get::<String>("a").unwrap(), "foo");
    assert_eq!(inv.get::<String>("b").unwrap(), "bar");
    assert_eq!(inv.get::<String>("c").unwrap(), "fizz");
    assert_eq!(inv.get::<String>("d").unwrap(), "buzz");
    assert_eq!(inv.args(), &[Value::from("foo"), Value::from("bar")]);
}

#[test]
fn test_pos_only_args() {
    let (slot, handler) = recorder();
    let cmd = Command::new("func", handler).param(Parameter::positional_only("a"));

    run(&cmd, &["", "foo"]).0.unwrap();

    assert_eq!(received(&slot).args(), &[Value::from("foo")]);
}

#[test]
fn test_keyword_only_args() {
    let (slot, handler) = recorder();
    let cmd = Command::new("func", handler).param(Parameter::keyword("a"));

    run(&cmd, &["", "--a", "foo"]).0.unwrap();

    let inv = received(&slot);
    assert!(inv.args().is_empty());
    assert_eq!(inv.kwargs().get("a"), Some(&Value::from("foo")));
}

#[test]
fn test_keyword_only_without_default_is_required() {
    let (slot, handler) = recorder();
    let cmd = Command::new("func", handler).param(Parameter::keyword("a"));

    let (result, console) = run(&cmd, &[""]);

    assert_eq!(exit_code(&result), Some(2));
    assert!(console.err_str().contains("--a <A>"));
    assert!(slot.borrow().is_none());
}

#[test]
fn test_docstring_becomes_help_description() {
    let (slot, handler) = recorder();
    let cmd = Command::new("func", handler).doc(
        "
        Helpful help message
        ",
    );

    let (result, console) = run(&cmd, &["", "--help"]);

    assert_eq!(exit_code(&result), Some(0));
    assert_eq!(console.exit_code, Some(0));
    let out = console.out_str();
    assert!(out.contains("Usage:"));
    assert!(out.contains("Helpful help message"));
    assert!(out.contains("-h, --help"));
    assert!(slot.borrow().is_none());
}

#[test]
fn test_int_typehint() {
    let (slot, handler) = recorder();
    let cmd = Command::new("func", handler).param(Parameter::positional("a").ty(ParamType::Int));

    run(&cmd, &["", "1"]).0.unwrap();

    assert_eq!(received(&slot).get::<i64>("a").unwrap(), 1);
}

#[test]
fn test_float_typehint() {
    let (slot, handler) = recorder();
    let cmd =
        Command::new("func", handler).param(Parameter::positional("a").ty(ParamType::Float));

    run(&cmd, &["", "0.25"]).0.unwrap();

    assert_eq!(received(&slot).get::<f64>("a").unwrap(), 0.25);
}

#[test]
fn test_conversion_failure_exits_with_usage_error() {
    let (slot, handler) = recorder();
    let cmd = Command::new("func", handler).param(Parameter::positional("a").ty(ParamType::Int));

    let (result, console) = run(&cmd, &["", "x"]);

    assert_eq!(exit_code(&result), Some(2));
    assert!(console.err_str().contains("invalid int value 'x'"));
    assert!(console.out_str().is_empty());
    assert!(slot.borrow().is_none());
}

fn bool_command(handler: impl Fn(&Invocation) -> anyhow::Result<()> + 'static) -> Command {
    Command::new("func", handler).param(Parameter::keyword("a").ty(ParamType::Bool))
}

#[test]
fn test_boolean_without_default_takes_both_flags() {
    let (slot, handler) = recorder();
    run(&bool_command(handler), &["", "--a"]).0.unwrap();
    assert!(received(&slot).get::<bool>("a").unwrap());

    let (slot, handler) = recorder();
    run(&bool_command(handler), &["", "--no-a"]).0.unwrap();
    assert!(!received(&slot).get::<bool>("a").unwrap());

    let (slot, handler) = recorder();
    run(&bool_command(handler), &["", "--a", "--no-a"]).0.unwrap();
    assert!(!received(&slot).get::<bool>("a").unwrap());

    let (slot, handler) = recorder();
    let (result, console) = run(&bool_command(handler), &[""]);
    assert_eq!(exit_code(&result), Some(2));
    assert!(console.err_str().contains("--a"));
    assert!(slot.borrow().is_none());
}

#[test]
fn test_boolean_with_default_flips_it() {
    let (slot, handler) = recorder();
    let cmd = Command::new("func", handler).params([
        Parameter::keyword("quiet").ty(ParamType::Bool).default(false),
        Parameter::keyword("color").ty(ParamType::Bool).default(true),
    ]);

    run(&cmd, &["", "--quiet", "--color"]).0.unwrap();
    let inv = received(&slot);
    assert!(inv.get::<bool>("quiet").unwrap());
    assert!(!inv.get::<bool>("color").unwrap());

    let (result, console) = run(&cmd, &["", "--no-color"]);
    assert_eq!(exit_code(&result), Some(2));
    assert!(console.err_str().contains("--no-color"));
}

#[test]
fn test_unsupplied_defaults_are_not_forwarded() {
    let (slot, handler) = recorder();
    let cmd = Command::new("func", handler).params([
        Parameter::keyword("name").default("anon"),
        Parameter::keyword("quiet").ty(ParamType::Bool).default(false),
        Parameter::keyword("limit").ty(ParamType::Int).default(Value::Null),
    ]);

    run(&cmd, &[""]).0.unwrap();

    let inv = received(&slot);
    assert!(inv.kwargs().is_empty());
    assert_eq!(inv.get::<String>("name").unwrap(), "anon");
    assert!(!inv.get::<bool>("quiet").unwrap());
    assert_eq!(inv.get::<Option<i64>>("limit").unwrap(), None);
}

#[test]
fn test_supplied_value_equal_to_default_is_forwarded() {
    let (slot, handler) = recorder();
    let cmd = Command::new("func", handler).param(Parameter::keyword("name").default("anon"));

    run(&cmd, &["", "--name", "anon"]).0.unwrap();

    assert_eq!(received(&slot).kwargs().get("name"), Some(&Value::from("anon")));
}

#[test]
fn test_optional_argument_name_is_kebab_cased() {
    let (slot, handler) = recorder();
    let cmd = Command::new("func", handler).params([
        Parameter::keyword("optional_argument").default(Value::Null),
        Parameter::keyword("__foo___").default(Value::Null),
    ]);

    run(&cmd, &["", "--optional-argument", "x", "--foo", "y"]).0.unwrap();

    let inv = received(&slot);
    assert_eq!(inv.get::<String>("optional_argument").unwrap(), "x");
    assert_eq!(inv.get::<String>("__foo___").unwrap(), "y");
}

#[test]
fn test_choice_values() {
    let (slot, handler) = recorder();
    let cmd = Command::new("func", handler)
        .param(Parameter::keyword("color").ty(ParamType::choices::<Color>("Color")));

    run(&cmd, &["", "--color", "green"]).0.unwrap();

    assert_eq!(received(&slot).get_choice::<Color>("color").unwrap(), Color::Green);
}

#[test]
fn test_invalid_choice_names_token_and_choices() {
    let (slot, handler) = recorder();
    let cmd = Command::new("func", handler)
        .param(Parameter::positional("color").ty(ParamType::choices::<Color>("Color")));

    let (result, console) = run(&cmd, &["", "purple"]);

    assert_eq!(exit_code(&result), Some(2));
    let err = console.err_str();
    assert!(err.contains("purple"));
    assert!(err.contains("red, green, blue"));
    assert!(slot.borrow().is_none());
}

#[test]
fn test_list_of_choices() {
    let (slot, handler) = recorder();
    let cmd = Command::new("func", handler).param(
        Parameter::keyword("colors")
            .ty(ParamType::list_of(ParamType::choices::<Color>("Color")))
            .default(Value::Null),
    );

    run(&cmd, &["", "--colors", "red", "blue"]).0.unwrap();

    let colors: Vec<bargeparse::Choice<Color>> = received(&slot).get("colors").unwrap();
    let colors: Vec<Color> = colors.into_iter().map(|c| c.into_inner()).collect();
    assert_eq!(colors, vec![Color::Red, Color::Blue]);
}

#[test]
fn test_list_and_tuple_collections() {
    let (slot, handler) = recorder();
    let cmd = Command::new("func", handler).params([
        Parameter::positional("a").ty(ParamType::list_of(ParamType::Int)),
        Parameter::keyword("b").ty(ParamType::tuple_of(ParamType::Int)).default(Value::Null),
    ]);

    run(&cmd, &["", "1", "2", "--b", "1", "2"]).0.unwrap();

    let inv = received(&slot);
    assert_eq!(inv.args(), &[Value::List(vec![Value::Int(1), Value::Int(2)])]);
    assert_eq!(
        inv.kwargs().get("b"),
        Some(&Value::Tuple(vec![Value::Int(1), Value::Int(2)]))
    );
    assert_eq!(inv.get::<Vec<i64>>("a").unwrap(), vec![1, 2]);
}

#[test]
fn test_second_list_positional_stays_empty() {
    let (slot, handler) = recorder();
    let cmd = Command::new("main", handler).params([
        Parameter::positional("a").ty(ParamType::list_of(ParamType::Int)),
        Parameter::positional("b").ty(ParamType::list_of(ParamType::Int)),
    ]);

    run(&cmd, &["main", "1", "2"]).0.unwrap();

    let inv = received(&slot);
    assert_eq!(
        inv.args(),
        &[
            Value::List(vec![Value::Int(1), Value::Int(2)]),
            Value::List(Vec::new()),
        ]
    );
}

#[test]
fn test_defaulted_positional_after_list_keeps_default() {
    let (slot, handler) = recorder();
    let cmd = Command::new("main", handler).params([
        Parameter::positional("a").ty(ParamType::list_of(ParamType::Int)),
        Parameter::positional_only("b").default("x"),
    ]);

    run(&cmd, &["main", "1", "2"]).0.unwrap();

    let inv = received(&slot);
    assert_eq!(inv.get::<Vec<i64>>("a").unwrap(), vec![1, 2]);
    assert_eq!(inv.get::<String>("b").unwrap(), "x");
}

#[test]
fn test_required_positional_after_list_takes_last_token() {
    let (slot, handler) = recorder();
    let cmd = Command::new("main", handler).params([
        Parameter::positional("sources").ty(ParamType::list_of(ParamType::Str)),
        Parameter::positional("dest"),
    ]);

    run(&cmd, &["main", "a", "b", "c"]).0.unwrap();
    let inv = received(&slot);
    assert_eq!(inv.get::<Vec<String>>("sources").unwrap(), vec!["a", "b"]);
    assert_eq!(inv.get::<String>("dest").unwrap(), "c");

    let (result, _) = run(&cmd, &["main"]);
    assert_eq!(exit_code(&result), Some(2));
}

#[test]
fn test_ambiguous_positional_order_is_a_declaration_error() {
    let (slot, handler) = recorder();
    let cmd = Command::new("main", handler).params([
        Parameter::positional("a").ty(ParamType::list_of(ParamType::Int)),
        Parameter::positional("b"),
        Parameter::positional("c"),
    ]);

    let (result, _) = run(&cmd, &["main", "1", "2", "3"]);

    let err = result.unwrap_err();
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Declaration(_))));
    assert!(slot.borrow().is_none());
}

#[test]
fn test_keyword_shadows_boolean_negation() {
    let (slot, handler) = recorder();
    let cmd = Command::new("main", handler).params([
        Parameter::keyword("a").ty(ParamType::Bool),
        Parameter::keyword("no_a").default("z"),
    ]);

    run(&cmd, &["main", "--no-a", "y"]).0.unwrap();
    assert_eq!(received(&slot).kwargs().get("no_a"), Some(&Value::from("y")));

    let (result, _) = run(&cmd, &["main", "--a"]);
    assert_eq!(exit_code(&result), Some(2));
}

#[test]
fn test_float_default_in_help() {
    let (_, handler) = recorder();
    let cmd = Command::new("main", handler)
        .param(Parameter::keyword("x").ty(ParamType::Float).default(1.0));

    let (_, console) = run(&cmd, &["main", "--help"]);

    assert!(console.out_str().contains("(default: 1.0)"));
}

#[test]
fn test_untyped_list_keeps_strings() {
    let (slot, handler) = recorder();
    let cmd = Command::new("func", handler).param(Parameter::positional("a").ty(ParamType::List(None)));

    run(&cmd, &["", "x", "1"]).0.unwrap();

    assert_eq!(
        received(&slot).get::<Vec<String>>("a").unwrap(),
        vec!["x".to_string(), "1".to_string()]
    );
}

#[test]
fn test_repeated_option_keeps_last_value() {
    let (slot, handler) = recorder();
    let cmd = Command::new("func", handler).param(Parameter::keyword("a").default(Value::Null));

    run(&cmd, &["", "--a", "first", "--a", "second"]).0.unwrap();

    assert_eq!(received(&slot).get::<String>("a").unwrap(), "second");
}

#[test]
fn test_dates_accept_any_separator() {
    let (slot, handler) = recorder();
    let cmd = Command::new("func", handler).params([
        Parameter::positional("day").ty(ParamType::Date),
        Parameter::keyword("at").ty(ParamType::DateTime).default(Value::Null),
    ]);

    run(&cmd, &["", "2024/05/01", "--at", "2024-05-01T09:30:00"]).0.unwrap();

    let inv = received(&slot);
    let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    assert_eq!(inv.get::<NaiveDate>("day").unwrap(), day);
    assert_eq!(
        inv.get::<chrono::NaiveDateTime>("at").unwrap(),
        day.and_hms_opt(9, 30, 0).unwrap()
    );
}

#[test]
fn test_subcommand_sees_global_option() {
    let (top_slot, top_handler) = recorder();
    let (slot, handler) = recorder();
    let cmd = Command::new("main", top_handler)
        .param(Parameter::keyword("global_option").ty(ParamType::Bool).default(false))
        .subcommand(Command::new("subfunc", handler).param(Parameter::positional("foo")));

    run(&cmd, &["", "--global-option", "subfunc", "bar"]).0.unwrap();

    assert!(top_slot.borrow().is_none());
    let inv = received(&slot);
    assert_eq!(inv.command(), Some("subfunc"));
    assert_eq!(inv.get::<String>("foo").unwrap(), "bar");
    assert!(inv.get::<bool>("global_option").unwrap());
}

#[test]
fn test_registered_subcommand_name_is_kebab_cased() {
    let (slot, handler) = recorder();
    let (_, top_handler) = recorder();
    let mut cmd = Command::new("main", top_handler);
    cmd.register_subcommand(
        Command::new("do_work", handler)
            .doc(
                "
                Do the work
                thoroughly.

                Long description.
                ",
            )
            .param(Parameter::keyword("times").ty(ParamType::Int).default(1)),
    );

    let (result, console) = run(&cmd, &["", "--help"]);
    assert_eq!(exit_code(&result), Some(0));
    let out = console.out_str();
    assert!(out.contains("do-work"));
    assert!(out.contains("Do the work thoroughly."));
    assert!(!out.contains("Long description."));

    run(&cmd, &["", "do-work", "--times", "3"]).0.unwrap();
    assert_eq!(received(&slot).get::<i64>("times").unwrap(), 3);
}

#[test]
fn test_subcommand_short_help_shows_whole_docstring() {
    let (_, handler) = recorder();
    let (_, top_handler) = recorder();
    let cmd = Command::new("main", top_handler).subcommand(Command::new("sub", handler).doc(
        "
        Summary line.

        Details that only the subcommand help shows.
        ",
    ));

    for flag in ["-h", "--help"] {
        let (result, console) = run(&cmd, &["", "sub", flag]);
        assert_eq!(exit_code(&result), Some(0));
        let out = console.out_str();
        assert!(out.contains("Summary line."));
        assert!(out.contains("Details that only the subcommand help shows."));
    }
}

#[test]
fn test_no_subcommand_runs_top_level() {
    let (top_slot, top_handler) = recorder();
    let (slot, handler) = recorder();
    let cmd = Command::new("main", top_handler)
        .param(Parameter::keyword("global_option").ty(ParamType::Bool).default(false))
        .subcommand(Command::new("subfunc", handler).param(Parameter::positional("foo")));

    run(&cmd, &["", "--global-option"]).0.unwrap();

    assert!(slot.borrow().is_none());
    assert!(received(&top_slot).get::<bool>("global_option").unwrap());
}

#[test]
fn test_parser_hook_values_are_merged() {
    let (slot, handler) = recorder();
    let cmd = Command::new("func", handler)
        .parser_hook(|parser| {
            parser
                .arg(Arg::new("verbose").short('v').action(ArgAction::Count))
                .arg(Arg::new("level").long("level"))
        })
        .param(Parameter::positional("a"));

    run(&cmd, &["", "-vv", "--level", "high", "x"]).0.unwrap();

    let inv = received(&slot);
    assert_eq!(inv.get::<String>("a").unwrap(), "x");
    assert_eq!(inv.kwargs().get("verbose"), Some(&Value::Int(2)));
    assert_eq!(inv.kwargs().get("level"), Some(&Value::from("high")));
}

#[test]
fn test_var_keyword_receives_parser() {
    let output = Rc::new(RefCell::new(String::new()));
    let sink = Rc::clone(&output);
    let cmd = Command::new("func", move |inv: &Invocation| {
        *sink.borrow_mut() = inv.render_help().unwrap_or_default();
        Ok(())
    })
    .doc("Prints its own help.")
    .params([
        Parameter::keyword("name").default("x").help("the name"),
        Parameter::var_keyword("kwargs"),
    ]);

    run(&cmd, &[""]).0.unwrap();

    let help = output.borrow();
    assert!(help.contains("Prints its own help."));
    assert!(help.contains("--name <NAME>"));
    assert!(help.contains("the name (default: x)"));
}

#[test]
fn test_without_var_keyword_no_parser_is_passed() {
    let (slot, handler) = recorder();
    let cmd = Command::new("func", handler).param(Parameter::var_positional("args"));

    run(&cmd, &[""]).0.unwrap();

    assert!(received(&slot).parser().is_none());
}

#[test]
fn test_custom_type_converter() {
    let (slot, handler) = recorder();
    let (_, top_handler) = recorder();
    let cmd = Command::new("main", top_handler)
        .type_converter("Point", |input: &str| {
            let (x, y) = input.split_once(',').ok_or_else(|| {
                Error::conversion("Point", input, "expected x,y")
            })?;
            let parse = |s: &str| {
                s.trim()
                    .parse::<i64>()
                    .map_err(|e| Error::conversion("Point", input, e))
            };
            Ok(Value::Tuple(vec![Value::Int(parse(x)?), Value::Int(parse(y)?)]))
        })
        .subcommand(
            Command::new("plot", handler).param(Parameter::positional("at").ty(ParamType::named("Point"))),
        );

    run(&cmd, &["", "plot", "3,4"]).0.unwrap();
    assert_eq!(received(&slot).get::<Vec<i64>>("at").unwrap(), vec![3, 4]);

    let (result, console) = run(&cmd, &["", "plot", "3;4"]);
    assert_eq!(exit_code(&result), Some(2));
    assert!(console.err_str().contains("expected x,y"));
}

#[test]
fn test_registered_converter_beats_builtin_date() {
    let (slot, handler) = recorder();
    let cmd = Command::new("func", handler)
        .type_converter("date", |input: &str| Ok(Value::from(format!("custom:{input}"))))
        .param(Parameter::positional("day").ty(ParamType::Date));

    run(&cmd, &["", "2024-05-01"]).0.unwrap();

    assert_eq!(received(&slot).get::<String>("day").unwrap(), "custom:2024-05-01");
}

#[test]
fn test_unregistered_named_type_fails_on_conversion() {
    let (slot, handler) = recorder();
    let cmd = Command::new("func", handler).param(Parameter::positional("a").ty(ParamType::named("Widget")));

    let (result, console) = run(&cmd, &["", "gear"]);

    assert_eq!(exit_code(&result), Some(2));
    let err = console.err_str();
    assert!(err.contains("Widget"));
    assert!(err.contains("gear"));
    assert!(slot.borrow().is_none());
}

#[test]
fn test_harvested_comments_become_help() {
    let (_, handler) = recorder();
    let cmd = Command::new("func", handler)
        .source(
            "fn func(
                a: String,  // first thing
                b: i64,     // second thing
            ) {}",
        )
        .params([
            Parameter::positional("a"),
            Parameter::keyword("b").ty(ParamType::Int).help("explicit"),
        ]);

    let (result, console) = run(&cmd, &["", "--help"]);

    assert_eq!(exit_code(&result), Some(0));
    let out = console.out_str();
    assert!(out.contains("first thing"));
    assert!(out.contains("explicit (required)"));
    assert!(!out.contains("second thing"));
}

#[test]
fn test_handler_errors_propagate_unchanged() {
    #[derive(Debug, thiserror::Error)]
    #[error("handler failed: {0}")]
    struct HandlerError(String);

    let cmd = Command::new("func", |inv: &Invocation| {
        Err(HandlerError(inv.get::<String>("a")?).into())
    })
    .param(Parameter::positional("a"));

    let (result, console) = run(&cmd, &["", "boom"]);

    let err = result.unwrap_err();
    assert_eq!(err.downcast_ref::<HandlerError>().unwrap().0, "boom");
    assert!(console.err_str().is_empty());
}

#[test]
fn test_direct_call_bypasses_parsing() {
    let (slot, handler) = recorder();
    let cmd = Command::new("func", handler).params([
        Parameter::positional("a"),
        Parameter::keyword("b").default("b"),
    ]);

    cmd.invoke(Invocation::new().arg("direct")).unwrap();

    let inv = received(&slot);
    assert_eq!(inv.get::<String>("a").unwrap(), "direct");
    assert_eq!(inv.get::<String>("b").unwrap(), "b");
    assert!(inv.parser().is_none());
}

#[test]
fn test_declaration_error_is_reported() {
    let (slot, handler) = recorder();
    let cmd = Command::new("func", handler)
        .param(Parameter::positional("a"))
        .param(Parameter::keyword("a"));

    let (result, _) = run(&cmd, &["", "x"]);

    let err = result.unwrap_err();
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Declaration(_))));
    assert!(slot.borrow().is_none());
}
