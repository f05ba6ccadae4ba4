use std::time::Duration;

use colored::*;

use submergex_common::hostname::HostnameSet;
use submergex_core::process::RunStatus;

use crate::terminal::colors;

/// Hosts shown in a phase summary before the list is cut short.
pub const SAMPLE_LIMIT: usize = 15;

/// Up to [`SAMPLE_LIMIT`] hosts as `(index, host)` tree lines, plus an "... and N more" tail.
pub fn host_sample(hosts: &HostnameSet) -> Vec<(String, ColoredString)> {
    let mut lines: Vec<(String, ColoredString)> = hosts
        .iter()
        .take(SAMPLE_LIMIT)
        .enumerate()
        .map(|(idx, host)| ((idx + 1).to_string(), host.as_str().color(colors::HOST)))
        .collect();

    let rest: usize = hosts.len().saturating_sub(SAMPLE_LIMIT);
    if rest > 0 {
        lines.push((
            String::from("..."),
            format!("and {rest} more").color(colors::SEPARATOR),
        ));
    }
    lines
}

pub fn duration(elapsed: Duration) -> ColoredString {
    format!("{:.2}s", elapsed.as_secs_f64()).bold().yellow()
}

pub fn rate(percent: f64) -> ColoredString {
    let text: String = format!("{percent:.1}%");
    match percent {
        p if p >= 50.0 => text.green().bold(),
        p if p > 0.0 => text.yellow().bold(),
        _ => text.color(colors::DEAD).bold(),
    }
}

pub fn count(n: usize, noun: &str) -> ColoredString {
    format!("{n} {noun}").bold().green()
}

pub fn run_status(status: &RunStatus) -> ColoredString {
    match status {
        RunStatus::Completed => "completed".green(),
        RunStatus::TimedOut => "timed out, partial output kept".yellow(),
        RunStatus::LaunchFailed(reason) => format!("failed: {reason}").color(colors::DEAD),
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
