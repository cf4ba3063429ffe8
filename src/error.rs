use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid {type_name} value '{input}': {reason}")]
    Conversion {
        type_name: String,
        input: String,
        reason: String,
    },

    #[error("no converter registered for type '{type_name}' (input '{input}')")]
    UnknownType { type_name: String, input: String },

    #[error("Declaration error: {0}")]
    Declaration(String),

    #[error("Missing value for parameter '{0}'")]
    MissingValue(String),

    #[error("Parameter '{name}' expected {expected}, found {found}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        found: String,
    },

    #[error("Exited with status {code}")]
    Exit { code: i32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    pub fn conversion(
        type_name: impl Into<String>,
        input: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        Error::Conversion {
            type_name: type_name.into(),
            input: input.into(),
            reason: reason.to_string(),
        }
    }

    /// Exit status carried by an intercepted engine exit, if this is one.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Error::Exit { code } => Some(*code),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
