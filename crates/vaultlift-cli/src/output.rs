//! Colored status lines for terminal output

use colored::Colorize;
use std::fmt;

pub fn success(msg: &str) {
    println!("{} {}", "ok:".green().bold(), msg);
}

pub fn warning(msg: &str) {
    eprintln!("{} {}", "warning:".yellow().bold(), msg);
}

pub fn error(msg: &str) {
    eprintln!("{} {}", "error:".red().bold(), msg);
}

/// `Finished <name> (migrated/attempted)` progress line
pub fn finished_line(name: &str, migrated: usize, attempted: usize) -> String {
    let counts = format!("({migrated}/{attempted})");
    let counts = if migrated == attempted {
        counts.green()
    } else {
        counts.yellow()
    };
    format!("{} [{}] {}", "Finished".green().bold(), name, counts)
}

/// Progress line for a document that failed as a whole
pub fn failed_line(name: &str, err: &impl fmt::Display) -> String {
    format!("{} [{}] {:#}", "Failed".red().bold(), name, err)
}
