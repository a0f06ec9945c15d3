// ============================================================================
// splatreel-cli/src/output.rs
// ============================================================================
//
// TERMINAL OUTPUT: Styled Printing Helpers
//
// Small helpers for headings, label/value lines and status lines. Styling
// comes from `console`, which drops colors automatically when stdout is not
// a terminal.
//
// AI-ASSISTANT-INFO: Styled terminal output helpers for the CLI

use console::{Style, style};
use splatreel_core::StatusLevel;

use std::fmt::Display;

/// Print a heading with colored styling and clear separation
pub fn print_heading(text: &str) {
    let line = "=".repeat(50);
    println!("{}", style(&line).blue());
    println!(" {}", style(text).bold());
    println!("{}", style(&line).blue());
}

/// Print an info line with label and value, with the label colored
pub fn print_info<T: Display>(label: &str, value: T) {
    println!("  {:<18} {}", style(format!("{label}:")).cyan(), value);
}

/// Style used for the tag of a status line.
pub fn level_style(level: StatusLevel) -> Style {
    match level {
        StatusLevel::Info => Style::new().cyan(),
        StatusLevel::Success => Style::new().green(),
        StatusLevel::Warning => Style::new().yellow(),
        StatusLevel::Error => Style::new().red().bold(),
    }
}

/// Formats a status line such as `[OK] frame 3: Saved ...`.
pub fn status_line(level: StatusLevel, message: &str) -> String {
    let tag = match level {
        StatusLevel::Info => "[INFO]",
        StatusLevel::Success => "[OK]",
        StatusLevel::Warning => "[WARN]",
        StatusLevel::Error => "[ERROR]",
    };
    format!("{} {}", level_style(level).apply_to(tag), message)
}

pub fn print_status(level: StatusLevel, message: &str) {
    println!("{}", status_line(level, message));
}

/// Print an error message to stderr
pub fn print_error(message: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_line_tags() {
        console::set_colors_enabled(false);
        assert_eq!(status_line(StatusLevel::Success, "saved"), "[OK] saved");
        assert_eq!(status_line(StatusLevel::Error, "boom"), "[ERROR] boom");
    }
}
