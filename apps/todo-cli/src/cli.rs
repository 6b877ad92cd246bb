//! Command-line definitions.

use crate::models::{Priority, TaskId};
use crate::storage::Backend;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "todo")]
#[command(about = "A simple and minimalist command-line todo manager", long_about = None)]
#[command(after_help = "Use `todo <command> --help` to get more details about a specific command.")]
#[command(version, disable_version_flag = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Print version
    #[arg(short = 'v', short_alias = 'V', long, action = ArgAction::Version)]
    pub version: Option<bool>,

    /// Task store file
    #[arg(long, global = true, env = "TODO_CLI_STORE")]
    pub store: Option<PathBuf>,

    /// Storage backend (sqlite, json)
    #[arg(long, global = true, value_parser = parse_backend)]
    pub backend: Option<Backend>,

    /// Config file
    #[arg(long, global = true, env = "TODO_CLI_CONFIG")]
    pub config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Add a new task
    Add(AddArgs),

    /// List tasks with optional filters and sorting
    List(ListArgs),

    /// Mark a task as completed
    Complete {
        /// ID of the task to complete
        id: TaskId,
    },

    /// Delete one or more tasks by their ID
    Delete {
        /// ID(s) of the task(s) to delete
        #[arg(required = true, num_args = 1..)]
        ids: Vec<TaskId>,
    },

    /// Edit an existing task
    Edit(EditArgs),

    /// Delete all tasks
    Clear,

    /// Show the configuration in use
    Config {
        /// Write a default config file if none exists
        #[arg(long)]
        init: bool,
    },
}

#[derive(Debug, Args)]
pub struct AddArgs {
    /// The content of the task to add
    pub text: String,

    /// Task priority (default: medium)
    #[arg(long, value_parser = parse_priority)]
    pub priority: Option<Priority>,

    /// Due date (format: YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<String>,

    /// Comma-separated tags (e.g. work,urgent)
    #[arg(long)]
    pub tags: Option<String>,
}

#[derive(Debug, Default, Args)]
pub struct ListArgs {
    /// Show only completed tasks
    #[arg(long)]
    pub done: bool,

    /// Show only uncompleted tasks
    #[arg(long)]
    pub undone: bool,

    /// Filter tasks by priority
    #[arg(long, value_parser = parse_priority)]
    pub priority: Option<Priority>,

    /// Sort tasks by field
    #[arg(long, value_enum)]
    pub sort: Option<SortField>,

    /// Filter tasks by tags, comma-separated (e.g. work,urgent)
    #[arg(long)]
    pub tags: Option<String>,

    /// Show creation and completion times
    #[arg(long)]
    pub verbose: bool,
}

#[derive(Debug, Args)]
pub struct EditArgs {
    /// ID of the task to edit
    pub id: TaskId,

    /// New task text
    #[arg(long)]
    pub text: Option<String>,

    /// New task priority
    #[arg(long, value_parser = parse_priority)]
    pub priority: Option<Priority>,

    /// New due date (format: YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<String>,

    /// New tags, comma-separated (e.g. work,urgent)
    #[arg(long)]
    pub tags: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortField {
    Priority,
}

fn parse_priority(s: &str) -> Result<Priority, String> {
    s.parse().map_err(|e: crate::error::TodoError| e.to_string())
}

fn parse_backend(s: &str) -> Result<Backend, String> {
    s.parse().map_err(|e: crate::error::TodoError| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_command() {
        let cli = Cli::try_parse_from(["todo"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_parse_add() {
        let cli = Cli::try_parse_from([
            "todo", "add", "Buy milk", "--priority", "high", "--due", "2024-05-01", "--tags", "home,errands",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Add(args)) => {
                assert_eq!(args.text, "Buy milk");
                assert_eq!(args.priority, Some(Priority::High));
                assert_eq!(args.due.as_deref(), Some("2024-05-01"));
                assert_eq!(args.tags.as_deref(), Some("home,errands"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_list_flags() {
        let cli = Cli::try_parse_from([
            "todo", "list", "--undone", "--priority", "low", "--sort", "priority", "--verbose",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::List(args)) => {
                assert!(args.undone);
                assert!(!args.done);
                assert_eq!(args.priority, Some(Priority::Low));
                assert_eq!(args.sort, Some(SortField::Priority));
                assert!(args.verbose);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_delete_many() {
        let cli = Cli::try_parse_from(["todo", "delete", "1", "3", "5"]).unwrap();
        match cli.command {
            Some(Commands::Delete { ids }) => assert_eq!(ids, vec![1, 3, 5]),
            other => panic!("unexpected command: {:?}", other),
        }
        assert!(Cli::try_parse_from(["todo", "delete"]).is_err());
    }

    #[test]
    fn test_global_options_after_command() {
        let cli = Cli::try_parse_from(["todo", "clear", "--backend", "json", "--store", "t.json"]).unwrap();
        assert_eq!(cli.backend, Some(Backend::Json));
        assert_eq!(cli.store, Some(PathBuf::from("t.json")));
    }

    #[test]
    fn test_version_flags() {
        for flag in ["-v", "-V", "--version"] {
            let err = Cli::try_parse_from(["todo", flag]).unwrap_err();
            assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
        }
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(Cli::try_parse_from(["todo", "add", "x", "--priority", "urgent"]).is_err());
        assert!(Cli::try_parse_from(["todo", "complete", "abc"]).is_err());
        assert!(Cli::try_parse_from(["todo", "frobnicate"]).is_err());
        assert!(Cli::try_parse_from(["todo", "list", "--sort", "due"]).is_err());
    }
}
