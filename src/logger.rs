//! Logging utilities with colored module prefixes.
//!
//! Provides the `log!` macro for formatted terminal output where each
//! line carries a colored `[module]` prefix identifying the subsystem
//! that emitted it.
//!
//! # Example
//!
//! ```ignore
//! log!("store"; "skipping reserved path segment in `{}`", path);
//! log!("modules"; "loaded `{}`", id);
//! ```

use colored::{ColoredString, Colorize};
use std::{
    io::{Write, stdout},
    sync::OnceLock,
};

/// Output width used for message truncation (set once on first use).
static MAX_WIDTH: OnceLock<usize> = OnceLock::new();

/// Fallback width when none was configured.
const DEFAULT_WIDTH: usize = 120;

/// Length of brackets around module name: "[]"
const BRACKET_LEN: usize = 2;
/// Space after prefix: "[module] " <- this space
const SPACE_AFTER_PREFIX: usize = 1;

/// Total prefix length for a module name.
#[inline]
const fn calc_prefix_len(module_len: usize) -> usize {
    module_len + BRACKET_LEN + SPACE_AFTER_PREFIX
}

/// Configure the output width used for truncation.
///
/// Only the first call has an effect; later calls are ignored.
pub fn set_max_width(width: usize) {
    MAX_WIDTH.set(width).ok();
}

fn max_width() -> usize {
    *MAX_WIDTH.get_or_init(|| DEFAULT_WIDTH)
}

/// Log a message with a colored module prefix.
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

/// Log a message with a colored module prefix.
///
/// Single-line messages are truncated to the configured width;
/// multiline messages are printed untouched.
pub fn log(module: &str, message: &str) {
    let prefix = colorize_prefix(module, &module.to_ascii_lowercase());
    let width = max_width();

    let mut stdout = stdout().lock();

    if message.contains('\n') {
        writeln!(stdout, "{prefix} {message}").ok();
    } else {
        let prefix_len = calc_prefix_len(module.len());
        let max_msg_len = width.saturating_sub(prefix_len);

        let message = if message.len() > max_msg_len {
            truncate_str(message, max_msg_len)
        } else {
            message
        };

        writeln!(stdout, "{prefix} {message}").ok();
    }

    stdout.flush().ok();
}

/// Apply color to a module prefix based on module type.
#[inline]
fn colorize_prefix(module: &str, module_lower: &str) -> ColoredString {
    let prefix = format!("[{module}]");
    match module_lower {
        "modules" => prefix.bright_blue().bold(),
        "resolve" => prefix.bright_green().bold(),
        "error" => prefix.bright_red().bold(),
        _ => prefix.bright_yellow().bold(),
    }
}

/// Truncate a string to fit within `max_len` bytes.
///
/// Ensures the result is valid UTF-8 by finding the nearest character boundary.
#[inline]
fn truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
