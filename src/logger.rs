//! Logging utilities with colored output.
//!
//! This module provides:
//! - `log!` macro for formatted terminal output with colored prefixes
//! - `debug!` macro for output that only appears with `--verbose`
//! - `paint` for styling that honors `--color` and redirection
//!
//! Output goes to stdout unless `set_stderr(true)` was called, which keeps
//! stdout free for data (e.g. `--dry-run`).
//!
//! # Example
//!
//! ```ignore
//! log!("sitemap"; "updated {}", path.display());
//! debug!("config"; "using {}", config_path.display());
//! ```

use crossterm::{
    execute,
    terminal::{Clear, ClearType},
};
use owo_colors::{OwoColorize, Stream, Style};
use std::{
    fmt::Display,
    io::{IsTerminal, Write, stderr, stdout},
    sync::atomic::{AtomicBool, Ordering},
};

/// Global verbose flag (set by --verbose CLI argument)
static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Set verbose mode globally
pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

/// Check if verbose mode is enabled
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

/// Route log output to stderr instead of stdout
static TO_STDERR: AtomicBool = AtomicBool::new(false);

/// Send log output to stderr (true) or stdout (false)
pub fn set_stderr(v: bool) {
    TO_STDERR.store(v, Ordering::SeqCst);
}

/// Stream log output currently goes to
fn stream() -> Stream {
    if TO_STDERR.load(Ordering::SeqCst) {
        Stream::Stderr
    } else {
        Stream::Stdout
    }
}

// ============================================================================
// Log Macro
// ============================================================================

/// Log a message with a colored module prefix
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a debug message (only shown when --verbose is enabled)
///
/// # Usage
/// ```ignore
/// debug!("module"; "debug info: {}", value);
/// ```
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Log a message with a colored module prefix
#[inline]
pub fn log(module: &str, message: &str) {
    let module_lower = module.to_ascii_lowercase();
    let prefix = colorize_prefix(module, &module_lower);

    match stream() {
        Stream::Stderr => write_line(&mut stderr().lock(), &prefix, message),
        _ => write_line(&mut stdout().lock(), &prefix, message),
    }
}

fn write_line<W: Write + IsTerminal>(out: &mut W, prefix: &str, message: &str) {
    // Escape sequences would end up in redirected output
    if out.is_terminal() {
        execute!(out, Clear(ClearType::UntilNewLine)).ok();
    }

    writeln!(out, "{prefix} {message}").ok();
    out.flush().ok();
}

/// Style `text` if the log stream supports colors.
///
/// Respects the global override set from `--color`.
pub fn paint(text: impl Display, style: Style) -> String {
    text.if_supports_color(stream(), |t| t.style(style))
        .to_string()
}

/// Apply color to a module prefix based on module type
#[inline]
fn colorize_prefix(module: &str, module_lower: &str) -> String {
    let style = match module_lower {
        "sitemap" => Style::new().bright_blue(),
        "error" => Style::new().bright_red(),
        _ => Style::new().bright_yellow(),
    };
    paint(format!("[{module}]"), style.bold())
}
