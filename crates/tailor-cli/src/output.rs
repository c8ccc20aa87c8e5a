//! Output formatting and display utilities
//!
//! Provides colored, formatted output for the CLI

use colored::Colorize;

use tailor::AlterWarning;

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red().bold(), msg);
}

/// Print a warning message to stderr
pub fn warning(msg: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), msg);
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue().bold(), msg);
}

/// Print a header
pub fn header(msg: &str) {
    println!("\n{}", msg.bold().underline());
}

/// Print a subheader
pub fn subheader(msg: &str) {
    println!("\n{}", msg.bold());
}

/// Print the warnings collected while resolving a profile
pub fn print_alter_warnings(warnings: &[AlterWarning]) {
    if warnings.is_empty() {
        return;
    }
    subheader(&format!("Skipped directives ({}):", warnings.len()));
    for warning in warnings {
        let location = match &warning.control_id {
            Some(id) => format!("[{}]", id),
            None => "[set-parameter]".to_string(),
        };
        println!(
            "  {} {} {}",
            "⚠".yellow(),
            location.dimmed(),
            warning.to_string().yellow()
        );
    }
}

/// Print one rendered parameter
pub fn print_param(id: &str, text: Option<&str>) {
    match text {
        Some(text) => println!("  {} {}", format!("{}:", id).cyan(), text),
        None => println!("  {} {}", format!("{}:", id).cyan(), "(left in place)".dimmed()),
    }
}

/// Print a JSON report
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<(), serde_json::Error> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}
