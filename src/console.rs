//! Output streams and exit behavior handed to the dispatcher
//!
//! The process console writes to the real streams and terminates the
//! process on a parse failure. The captured console buffers everything and
//! turns the exit into [`Error::Exit`], so embedding callers and tests can
//! intercept it.

use crate::error::Error;
use std::io::{self, IsTerminal, Write};

pub trait Console {
    fn stdout(&mut self) -> &mut dyn Write;

    fn stderr(&mut self) -> &mut dyn Write;

    /// End the run with `code`. The returned error is what `run_from`
    /// hands back when the console does not terminate the process.
    fn exit(&mut self, code: i32) -> Error;

    /// Whether rendered output should keep terminal styling.
    fn styled(&self) -> bool {
        false
    }
}

/// The real process streams
pub struct ProcessConsole {
    stdout: io::Stdout,
    stderr: io::Stderr,
}

impl ProcessConsole {
    pub fn new() -> Self {
        Self {
            stdout: io::stdout(),
            stderr: io::stderr(),
        }
    }
}

impl Default for ProcessConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl Console for ProcessConsole {
    fn stdout(&mut self) -> &mut dyn Write {
        &mut self.stdout
    }

    fn stderr(&mut self) -> &mut dyn Write {
        &mut self.stderr
    }

    fn exit(&mut self, code: i32) -> Error {
        let _ = self.stdout.flush();
        let _ = self.stderr.flush();
        std::process::exit(code)
    }

    fn styled(&self) -> bool {
        self.stderr.is_terminal()
    }
}

/// In-memory streams; exit becomes an error value
#[derive(Debug, Default)]
pub struct CapturedConsole {
    pub out: Vec<u8>,
    pub err: Vec<u8>,
    pub exit_code: Option<i32>,
}

impl CapturedConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn out_str(&self) -> String {
        String::from_utf8_lossy(&self.out).into_owned()
    }

    pub fn err_str(&self) -> String {
        String::from_utf8_lossy(&self.err).into_owned()
    }
}

impl Console for CapturedConsole {
    fn stdout(&mut self) -> &mut dyn Write {
        &mut self.out
    }

    fn stderr(&mut self) -> &mut dyn Write {
        &mut self.err
    }

    fn exit(&mut self, code: i32) -> Error {
        self.exit_code = Some(code);
        Error::Exit { code }
    }
}

impl<C: Console + ?Sized> Console for &mut C {
    fn stdout(&mut self) -> &mut dyn Write {
        (**self).stdout()
    }

    fn stderr(&mut self) -> &mut dyn Write {
        (**self).stderr()
    }

    fn exit(&mut self, code: i32) -> Error {
        (**self).exit(code)
    }

    fn styled(&self) -> bool {
        (**self).styled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_captured_console_intercepts_exit() {
        let mut console = CapturedConsole::new();
        writeln!(console.stderr(), "error: nope").unwrap();
        let err = console.exit(2);
        assert_eq!(err.exit_code(), Some(2));
        assert_eq!(console.exit_code, Some(2));
        assert_eq!(console.err_str(), "error: nope\n");
        assert!(console.out_str().is_empty());
    }
}
