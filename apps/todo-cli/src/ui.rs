//! Terminal output: status messages, task tables, summaries.

use crate::config::DEFAULT_DATE_FORMAT;
use crate::models::{Priority, Task, TaskStats};
use chrono::{DateTime, Utc};
use colored::Colorize;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use std::fmt::Write;

/// Kind of one-line status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Success,
    Info,
    Warning,
    Error,
    Delete,
}

impl MessageKind {
    fn marker(&self) -> &'static str {
        match self {
            MessageKind::Success => "✔",
            MessageKind::Info => "ℹ",
            MessageKind::Warning => "⚠",
            MessageKind::Error => "✖",
            MessageKind::Delete => "🗑",
        }
    }
}

/// Format a status message with its marker.
pub fn message(kind: MessageKind, text: &str) -> String {
    let line = format!("{} {}", kind.marker(), text);
    match kind {
        MessageKind::Success => line.green().to_string(),
        MessageKind::Info => line.cyan().to_string(),
        MessageKind::Warning => line.yellow().to_string(),
        MessageKind::Error => line.red().bold().to_string(),
        MessageKind::Delete => line.magenta().to_string(),
    }
}

/// Print a status message; warnings and errors go to stderr.
pub fn print_message(kind: MessageKind, text: &str) {
    match kind {
        MessageKind::Warning | MessageKind::Error => eprintln!("{}", message(kind, text)),
        _ => println!("{}", message(kind, text)),
    }
}

/// Enable or disable colors for everything this module prints.
pub fn set_color(enabled: bool) {
    colored::control::set_override(enabled);
}

fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::Low => Color::DarkGrey,
        Priority::Medium => Color::White,
        Priority::High => Color::Red,
    }
}

/// Format a timestamp, falling back to the default format when chrono
/// rejects `date_format`.
pub fn format_timestamp(ts: &DateTime<Utc>, date_format: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", ts.format(date_format)).is_err() {
        out = ts.format(DEFAULT_DATE_FORMAT).to_string();
    }
    out
}

/// Table of tasks. `verbose` adds creation and completion times.
pub fn task_table(tasks: &[Task], verbose: bool, date_format: &str, color: bool) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    if !color {
        table.force_no_tty();
    }

    let mut header = vec![
        Cell::new("ID").fg(Color::Cyan),
        Cell::new("Status").fg(Color::Cyan),
        Cell::new("Task").fg(Color::Cyan),
        Cell::new("Priority").fg(Color::Cyan),
        Cell::new("Due").fg(Color::Cyan),
        Cell::new("Tags").fg(Color::Cyan),
    ];
    if verbose {
        header.push(Cell::new("Created").fg(Color::Cyan));
        header.push(Cell::new("Completed").fg(Color::Cyan));
    }
    table.set_header(header);

    for task in tasks {
        let (status, status_color) = if task.done {
            ("done", Color::Green)
        } else if task.is_overdue() {
            ("overdue", Color::Red)
        } else {
            ("todo", Color::Yellow)
        };

        let due = task.due.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string());
        let tags = if task.tags.is_empty() {
            "-".to_string()
        } else {
            task.tags.join(", ")
        };

        let mut row = vec![
            Cell::new(task.id),
            Cell::new(status).fg(status_color),
            Cell::new(&task.text),
            Cell::new(task.priority.label()).fg(priority_color(task.priority)),
            Cell::new(due),
            Cell::new(tags),
        ];
        if verbose {
            row.push(Cell::new(format_timestamp(&task.created, date_format)));
            row.push(Cell::new(
                task.completed_at
                    .map(|d| format_timestamp(&d, date_format))
                    .unwrap_or_else(|| "-".to_string()),
            ));
        }
        table.add_row(row);
    }

    table
}

/// One-line summary printed under a listing.
pub fn summary(stats: &TaskStats) -> String {
    let noun = if stats.total == 1 { "task" } else { "tasks" };
    let mut line = format!(
        "{} {}: {} done, {} pending",
        stats.total, noun, stats.done, stats.pending
    );
    if stats.overdue > 0 {
        line.push_str(&format!(", {} overdue", stats.overdue));
    }
    line
}

/// Description of a freshly added task, with its metadata in parentheses.
pub fn added_line(task: &Task, date_format: &str) -> String {
    let mut meta = vec![format!("priority: {}", task.priority)];
    if let Some(due) = task.due {
        meta.push(format!("due: {}", due));
    }
    meta.push(format!("created: {}", format_timestamp(&task.created, date_format)));
    if !task.tags.is_empty() {
        meta.push(format!("tags: {}", task.tags.join(", ")));
    }
    let meta: Vec<String> = meta.into_iter().map(|m| format!("({})", m)).collect();
    format!("Task added: [{}] {} {}", task.id, task.text, meta.join(" "))
}

/// Shown when `todo` runs without a command.
pub const USAGE: &str = "\
Welcome to todo, a minimalist command-line todo manager.

Available commands:
  todo add \"Task content\" [--priority low|medium|high] [--due YYYY-MM-DD] [--tags tag1,tag2]
  todo list [--done | --undone] [--priority P] [--tags work,urgent] [--sort priority] [--verbose]
  todo complete <id>
  todo delete <id> [<id> ...]
  todo edit <id> [--text T] [--priority P] [--due YYYY-MM-DD] [--tags tag1,tag2]
  todo clear
  todo config [--init]

Run `todo --help` for more details.";

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample() -> Vec<Task> {
        let mut a = Task::new(1, "Buy milk");
        a.priority = Priority::High;
        a.tags = vec!["home".to_string(), "Errands".to_string()];
        a.due = NaiveDate::from_ymd_opt(2999, 1, 1);
        let mut b = Task::new(2, "Call Bob");
        b.mark_done();
        vec![a, b]
    }

    #[test]
    fn test_table_contents() {
        let rendered = task_table(&sample(), false, "%Y-%m-%d", false).to_string();
        assert!(rendered.contains("Buy milk"));
        assert!(rendered.contains("2999-01-01"));
        assert!(rendered.contains("home, Errands"));
        assert!(rendered.contains("done"));
        assert!(!rendered.contains("Created"));
    }

    #[test]
    fn test_verbose_table_has_timestamps() {
        let rendered = task_table(&sample(), true, "%Y-%m-%d", false).to_string();
        assert!(rendered.contains("Created"));
        assert!(rendered.contains("Completed"));
    }

    #[test]
    fn test_summary() {
        let stats = TaskStats {
            total: 3,
            done: 1,
            pending: 2,
            overdue: 1,
        };
        assert_eq!(summary(&stats), "3 tasks: 1 done, 2 pending, 1 overdue");

        let single = TaskStats {
            total: 1,
            done: 0,
            pending: 1,
            overdue: 0,
        };
        assert_eq!(summary(&single), "1 task: 0 done, 1 pending");
    }

    #[test]
    fn test_added_line() {
        let task = &sample()[0];
        let line = added_line(task, "%Y");
        assert!(line.starts_with("Task added: [1] Buy milk (priority: high) (due: 2999-01-01)"));
        assert!(line.ends_with("(tags: home, Errands)"));
    }

    #[test]
    fn test_invalid_date_format_does_not_panic() {
        let tasks = sample();
        let ts = tasks[1].created;
        assert_eq!(format_timestamp(&ts, "%Q"), ts.format(DEFAULT_DATE_FORMAT).to_string());
        assert_eq!(format_timestamp(&ts, "%Y"), ts.format("%Y").to_string());

        let line = added_line(&tasks[0], "%Q");
        assert!(line.contains("(created: "));
        let rendered = task_table(&tasks, true, "%Q", false).to_string();
        assert!(rendered.contains("Completed"));
    }

    #[test]
    fn test_message_marker() {
        set_color(false);
        assert_eq!(message(MessageKind::Info, "All tasks cleared."), "ℹ All tasks cleared.");
    }
}
