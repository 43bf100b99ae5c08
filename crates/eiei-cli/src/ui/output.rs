//! Status lines and key/value output.

use console::{Style, style};

/// Print a success message with checkmark.
pub fn success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Print an error message with X.
pub fn error(msg: &str) {
    println!("{} {}", style("✗").red().bold(), msg);
}

/// Print a warning message.
pub fn warning(msg: &str) {
    println!("{} {}", style("⚠").yellow().bold(), msg);
}

/// Print an info message.
pub fn info(msg: &str) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}

/// Print a header/section title.
pub fn header(msg: &str) {
    println!("\n{}", style(msg).bold().underlined());
}

/// Print one line of the status report.
pub fn health_check(name: &str, status: HealthStatus, detail: Option<&str>) {
    let (icon, label, tone) = status.render();

    let line = match detail {
        Some(d) => format!("{} - {}", tone.apply_to(label), style(d).dim()),
        None => tone.apply_to(label).to_string(),
    };
    println!("  {} {name}: {line}", tone.apply_to(icon));
}

/// Outcome of one status check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    /// Healthy.
    Ok,
    /// Degraded but usable, e.g. an ephemeral signing secret.
    Warning,
    /// Not determined.
    Unknown,
}

impl HealthStatus {
    fn render(self) -> (&'static str, &'static str, Style) {
        match self {
            Self::Ok => ("✓", "OK", Style::new().green()),
            Self::Warning => ("⚠", "WARNING", Style::new().yellow()),
            Self::Unknown => ("?", "UNKNOWN", Style::new().dim()),
        }
    }
}

/// Print a key-value pair.
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", style(key).bold(), value);
}
