//! # bargeparse
//!
//! Command-line interfaces derived from declared handler signatures.
//!
//! A [`Command`] lists its parameters the way a function signature would
//! (name, kind, type, default). The crate maps them onto a clap parser,
//! parses the process arguments, rebuilds the positional and keyword values
//! the handler expects and calls it. The same command can also be called
//! directly with an [`Invocation`], which never touches process arguments.
//!
//! ## Usage
//!
//! ```no_run
//! use bargeparse::{Command, Invocation, ParamType, Parameter};
//!
//! let cli = Command::new("greet", |inv: &Invocation| {
//!     let name: String = inv.get("name")?;
//!     let times: i64 = inv.get("times")?;
//!     for _ in 0..times {
//!         println!("hello {name}");
//!     }
//!     Ok(())
//! })
//! .doc("Say hello.")
//! .param(Parameter::positional("name").help("who to greet"))
//! .param(Parameter::keyword("times").ty(ParamType::Int).default(1));
//!
//! cli.run().unwrap();
//! ```
//!
//! ## Modules
//!
//! - `signature` - Declared parameters and their types
//! - `value` - Dynamically typed parsed values and typed extraction
//! - `convert` - String to value converters and the custom type registry
//! - `mapper` - Parameter to clap argument mapping
//! - `harvest` - Trailing parameter comments from declaration source
//! - `dispatch` - Parser construction, the command tree and call assembly
//! - `console` - Output streams and exit behavior
//! - `config` - Presentation settings
//! - `logging` - Tracing setup for binaries

pub mod config;
pub mod console;
pub mod convert;
pub mod dispatch;
pub mod error;
pub mod harvest;
pub mod logging;
pub mod mapper;
pub mod signature;
pub mod value;


pub use config::{ColorMode, Settings};
pub use console::{CapturedConsole, Console, ProcessConsole};
pub use convert::{Converter, TypeRegistry};
pub use dispatch::{build_parser, dispatch, Command, Invocation};
pub use error::{Error, Result};
pub use signature::{ChoiceSpec, ParamKind, ParamType, Parameter};
pub use value::{Choice, Choices, FromValue, Value};
