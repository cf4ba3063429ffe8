//! Logging configuration and initialization

use crate::config::Settings;
use std::ffi::OsString;
use tracing::{debug, trace};

/// Initialize tracing on stderr for a verbosity count.
pub fn init_logging(settings: &Settings, verbose: u8) {
    tracing_subscriber::fmt()
        .with_env_filter(settings.log_filter(verbose))
        .with_writer(std::io::stderr)
        .with_target(verbose >= 2) // Show target module for -vv and above
        .with_line_number(verbose >= 3)
        .init();

    debug!("bargeparse started with verbosity level: {}", verbose);
    trace!("Full CLI args: {:?}", std::env::args().collect::<Vec<_>>());
}

/// Count `-v`/`--verbose` occurrences ahead of a full parse.
///
/// Logging has to be live before the parser is built, so this only looks at
/// the raw tokens. Scanning stops at `--`.
pub fn verbosity(argv: &[OsString]) -> u8 {
    let mut count = 0u8;
    for arg in argv.iter().skip(1) {
        let Some(arg) = arg.to_str() else { continue };
        if arg == "--" {
            break;
        }
        if arg == "--verbose" {
            count = count.saturating_add(1);
        } else if let Some(shorts) = arg.strip_prefix('-') {
            if !shorts.is_empty() && shorts.chars().all(|c| c == 'v') {
                count = count.saturating_add(shorts.len().min(u8::MAX as usize) as u8);
            }
        }
    }
    count
}
