//! Colored, prefix-tagged logging to stderr.
//!
//! stdout carries emitted markup, so every diagnostic goes to stderr.
//!
//! ```ignore
//! log!("artifact"; "{} → {}", name, file_name);
//! debug!("resolve"; "{} required", count);   // only with --verbose
//! ```

use owo_colors::OwoColorize;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Toggle debug output (`--verbose`).
pub fn set_verbose(verbose: bool) {
    VERBOSE.store(verbose, Ordering::Relaxed);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

/// Log a message under a `[module]` prefix.
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Like [`log!`], only when verbose output is on.
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

/// Write one prefixed message to stderr. Write failures are ignored.
pub fn log(module: &str, message: &str) {
    let mut stderr = io::stderr().lock();
    let _ = write_line(&mut stderr, module, message);
}

fn write_line(out: &mut impl Write, module: &str, message: &str) -> io::Result<()> {
    writeln!(out, "{} {}", prefix(module), message)?;
    out.flush()
}

/// `[module]`, colored by what the module reports.
fn prefix(module: &str) -> String {
    let tag = format!("[{module}]");
    match module.to_ascii_lowercase().as_str() {
        "artifact" => tag.bright_green().bold().to_string(),
        "error" => tag.bright_red().bold().to_string(),
        "warning" => tag.bright_magenta().bold().to_string(),
        "resolve" | "emit" => tag.bright_blue().bold().to_string(),
        _ => tag.bright_yellow().bold().to_string(),
    }
}
