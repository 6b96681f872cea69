//! Unified output formatting utilities for consistent CLI presentation.
//!
//! This module provides the formatting functions used by every
//! git-line-blame command, so errors, notices and annotation lines share one
//! color scheme and spacing.
//!
//! # Design Principles
//! - **Consistent color scheme**: Red for errors, blue for hashes and links, bright_black for muted detail
//! - **Standardized spacing**: Newline before and after error and info output

use crate::core::annotation::SHORT_HASH_LEN;
use crate::core::display::Notice;
use crate::core::sources::CommitDetail;
use colored::*;

/// Formats and prints an error message with consistent styling
///
/// # Format
/// ```text
///
/// ✕ Error: <message>
///
/// ```
///
/// # Colors
/// - "✕ Error:" in red
/// - Message in white
/// - Newlines before and after for spacing
pub fn print_error(message: &str) {
    println!("\n{} {}\n", "✕ Error:".red(), message.white());
}

/// Formats and prints an informational message with consistent styling
pub fn print_info(message: &str) {
    println!("\n{}\n", message.white());
}

/// Prints a transient notice the way a status bar would show it
pub fn print_notice(notice: &Notice) {
    println!("{} {}", "ℹ".blue(), notice.message.white());
}

/// One annotated line: `<line> <hash> <text>`
pub fn format_annotation_line(line: usize, hash: &str, text: &str, width: usize) -> String {
    let hash = if hash.is_empty() {
        " ".repeat(SHORT_HASH_LEN)
    } else {
        hash.to_string()
    };
    let number = format!("{line:>width$}");
    format!("{} {} {}", number.bright_black(), hash.blue(), text.white())
}

/// Prints commit detail as `git show -s` would lay it out
pub fn print_commit_detail(hash: &str, detail: &CommitDetail) {
    println!("{} {}", "commit".yellow(), hash.yellow());
    println!("Committer: {} <{}>", detail.author, detail.email.bright_black());
    println!();
    println!("    {}", detail.subject.white());
    if !detail.message.is_empty() {
        println!();
        for line in detail.message.lines() {
            println!("    {line}");
        }
    }
}
