//! Parser presentation settings
//!
//! Settings are layered: built-in defaults, then an optional TOML file named
//! by `BARGEPARSE_CONFIG`, then individual environment overrides.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_ENV: &str = "BARGEPARSE_CONFIG";
pub const TERM_WIDTH_ENV: &str = "BARGEPARSE_TERM_WIDTH";
pub const COLOR_ENV: &str = "BARGEPARSE_COLOR";
pub const LOG_ENV: &str = "BARGEPARSE_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Some(ColorMode::Auto),
            "always" => Some(ColorMode::Always),
            "never" => Some(ColorMode::Never),
            _ => None,
        }
    }

    pub fn to_clap(self) -> clap::ColorChoice {
        match self {
            ColorMode::Auto => clap::ColorChoice::Auto,
            ColorMode::Always => clap::ColorChoice::Always,
            ColorMode::Never => clap::ColorChoice::Never,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Fixed help wrapping width; the terminal's width when unset
    pub term_width: Option<usize>,
    pub max_term_width: Option<usize>,
    pub color: ColorMode,
    /// `tracing_subscriber` env-filter directive
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            term_width: None,
            max_term_width: None,
            color: ColorMode::Auto,
            log_level: "warn".to_string(),
        }
    }
}

impl Settings {
    /// Defaults, then the file named by `BARGEPARSE_CONFIG`, then env overrides.
    pub fn load() -> Result<Self> {
        let mut settings = match std::env::var(CONFIG_ENV) {
            Ok(path) if !path.is_empty() => Self::from_file(Path::new(&path))?,
            _ => Self::default(),
        };
        settings.merge_env_vars();
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn merge_env_vars(&mut self) {
        if let Ok(width) = std::env::var(TERM_WIDTH_ENV) {
            if let Ok(width) = width.trim().parse::<usize>() {
                self.term_width = Some(width);
            }
        }

        if let Ok(color) = std::env::var(COLOR_ENV) {
            if let Some(color) = ColorMode::parse(&color) {
                self.color = color;
            }
        }

        if let Ok(log_level) = std::env::var(LOG_ENV) {
            if !log_level.trim().is_empty() {
                self.log_level = log_level;
            }
        }
    }

    pub fn with_term_width(mut self, width: usize) -> Self {
        self.term_width = Some(width);
        self
    }

    pub fn with_color(mut self, color: ColorMode) -> Self {
        self.color = color;
        self
    }

    /// Apply presentation settings to one parser.
    pub fn apply(&self, cmd: clap::Command) -> clap::Command {
        let mut cmd = cmd.color(self.color.to_clap());
        if let Some(width) = self.term_width {
            cmd = cmd.term_width(width);
        }
        if let Some(width) = self.max_term_width {
            cmd = cmd.max_term_width(width);
        }
        cmd
    }

    /// Log filter for a verbosity count, falling back to the configured level.
    pub fn log_filter(&self, verbose: u8) -> &str {
        match verbose {
            0 => &self.log_level,
            1 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.term_width, None);
        assert_eq!(settings.color, ColorMode::Auto);
        assert_eq!(settings.log_level, "warn");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings = Settings::from_toml_str("term_width = 100\ncolor = \"never\"\n").unwrap();
        assert_eq!(settings.term_width, Some(100));
        assert_eq!(settings.color, ColorMode::Never);
        assert_eq!(settings.log_level, "warn");
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        assert!(matches!(
            Settings::from_toml_str("term_width = \"wide\""),
            Err(Error::Toml(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "log_level = \"debug\"").unwrap();
        let settings = Settings::from_file(file.path()).unwrap();
        assert_eq!(settings.log_level, "debug");

        assert!(matches!(
            Settings::from_file(Path::new("/nonexistent/bargeparse.toml")),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_log_filter_by_verbosity() {
        let settings = Settings::default();
        assert_eq!(settings.log_filter(0), "warn");
        assert_eq!(settings.log_filter(1), "debug");
        assert_eq!(settings.log_filter(3), "trace");
    }

    #[test]
    fn test_color_mode_parse() {
        assert_eq!(ColorMode::parse("Always"), Some(ColorMode::Always));
        assert_eq!(ColorMode::parse("sometimes"), None);
    }
}
