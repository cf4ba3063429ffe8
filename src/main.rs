use bargeparse::logging::{init_logging, verbosity};
use bargeparse::{Choices, Command, Invocation, ParamType, Parameter, ProcessConsole, Settings};
use clap::{Arg, ArgAction};
use serde_json::json;
use std::ffi::OsString;
use tracing::error;

/// Source of the `schedule` handler's declaration; its trailing comments
/// become the help text of each parameter.
const SCHEDULE_SIGNATURE: &str = r#"
fn schedule(
    day: NaiveDate,            // day the job runs
    at: Option<NaiveDateTime>, // exact start time
    tags: Vec<String>,         // labels attached to the job
    window: (i64, i64),        // allowed start window in minutes
) {}
"#;

#[derive(Debug, Clone, Copy)]
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

fn print_invocation(inv: &Invocation) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(&inv.to_json())?);
    Ok(())
}

fn sum(inv: &Invocation) -> anyhow::Result<()> {
    let numbers: Vec<i64> = inv.get("numbers")?;
    let total: i64 = numbers.iter().sum();
    let mut output = inv.to_json();
    output["total"] = json!(total);
    println!("{}", serde_json::to_string(&output)?);
    Ok(())
}

fn main_command(inv: &Invocation) -> anyhow::Result<()> {
    if let Some(color) = inv.get::<Option<bargeparse::Choice<Color>>>("color")? {
        tracing::debug!(color = ?color.into_inner(), "color selected");
    }
    print_invocation(inv)
}

fn help_me(inv: &Invocation) -> anyhow::Result<()> {
    if let Some(help) = inv.render_help() {
        print!("{help}");
    }
    Ok(())
}

fn build_cli() -> Command {
    Command::new("bargeparse", main_command)
        .doc(
            "
            Demonstration of signature-derived command lines.

            Every option and subcommand below comes from declared handler
            parameters.
            ",
        )
        .parser_hook(|parser| {
            parser.arg(
                Arg::new("verbose")
                    .short('v')
                    .long("verbose")
                    .action(ArgAction::Count)
                    .help("Enable verbose output (-v for debug, -vv for trace)"),
            )
        })
        .param(
            Parameter::keyword("global_option")
                .ty(ParamType::Bool)
                .default(false)
                .help("Option available to every subcommand"),
        )
        .param(
            Parameter::keyword("color")
                .ty(ParamType::choices::<Color>("Color"))
                .default(bargeparse::Value::Null)
                .help("Output color"),
        )
        .subcommand(
            Command::new("subfunc", print_invocation)
                .doc("Echo a single value.")
                .param(Parameter::positional("foo").help("value to echo")),
        )
        .subcommand(
            Command::new("sum", sum)
                .doc("Add integers together.")
                .param(
                    Parameter::positional("numbers")
                        .ty(ParamType::list_of(ParamType::Int))
                        .help("integers to add"),
                ),
        )
        .subcommand(
            Command::new("schedule", print_invocation)
                .doc(
                    "
                    Schedule a job.

                    Dates accept any separators: 2024-05-01, 2024/05/01 and
                    2024.05.01 are the same day.
                    ",
                )
                .source(SCHEDULE_SIGNATURE)
                .param(Parameter::positional("day").ty(ParamType::Date))
                .param(
                    Parameter::keyword("at")
                        .ty(ParamType::DateTime)
                        .default(bargeparse::Value::Null),
                )
                .param(
                    Parameter::keyword("tags")
                        .ty(ParamType::list_of(ParamType::Str))
                        .default(Vec::<String>::new()),
                )
                .param(
                    Parameter::keyword("window")
                        .ty(ParamType::tuple_of(ParamType::Int))
                        .default(bargeparse::Value::Null),
                ),
        )
        .subcommand(
            Command::new("help_me", help_me)
                .doc("Print this subcommand's help from inside the handler.")
                .param(Parameter::var_keyword("kwargs")),
        )
}

fn main() {
    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let args: Vec<OsString> = std::env::args_os().collect();
    init_logging(&settings, verbosity(&args));

    let cli = build_cli().settings(settings);
    if let Err(e) = cli.run_from(args, ProcessConsole::new()) {
        error!("Fatal error: {}", e);
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
