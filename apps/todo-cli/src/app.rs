//! Command dispatch: turns parsed commands into repository calls and output.

use crate::cli::{AddArgs, Cli, Commands, EditArgs, ListArgs, SortField};
use crate::config::Config;
use crate::error::{TodoError, TodoResult};
use crate::models::{parse_due, split_tags, NewTask, Task, TaskId, TaskPatch, TaskStats};
use crate::query::{ListQuery, SortKey, StatusFilter};
use crate::repository::Repository;
use crate::storage::{open_backend, Storage};
use crate::ui::{self, MessageKind};
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct App<S: Storage> {
    pub repo: Repository<S>,
    pub config: Config,
    /// File the config was read from, if any.
    pub config_path: Option<PathBuf>,
}

impl<S: Storage> App<S> {
    pub fn new(repo: Repository<S>, config: Config) -> Self {
        Self {
            repo,
            config,
            config_path: None,
        }
    }

    pub fn with_config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    pub fn add(&mut self, args: &AddArgs) -> TodoResult<Task> {
        let mut new = NewTask::new(args.text.as_str())
            .priority(args.priority.unwrap_or(self.config.defaults.priority));
        if let Some(due) = &args.due {
            new = new.due(parse_due(due)?);
        }
        if let Some(tags) = &args.tags {
            new = new.tags(split_tags(tags));
        }
        self.repo.add(new)
    }

    pub fn list(&self, args: &ListArgs) -> TodoResult<Vec<Task>> {
        let mut query = ListQuery::new().status(StatusFilter::from_flags(args.done, args.undone)?);
        if let Some(priority) = args.priority {
            query = query.priority(priority);
        }
        if let Some(tags) = &args.tags {
            query = query.tags(split_tags(tags));
        }
        if let Some(SortField::Priority) = args.sort {
            query = query.sort(SortKey::Priority);
        }
        Ok(query.apply(&self.repo.list()))
    }

    pub fn complete(&mut self, id: TaskId) -> TodoResult<Task> {
        self.repo.complete(id)
    }

    /// Delete each id in turn; a missing id does not stop the others.
    pub fn delete(&mut self, ids: &[TaskId]) -> Vec<(TaskId, TodoResult<Task>)> {
        ids.iter().map(|&id| (id, self.repo.delete(id))).collect()
    }

    pub fn edit(&mut self, args: &EditArgs) -> TodoResult<Task> {
        let patch = TaskPatch {
            text: args.text.clone(),
            priority: args.priority,
            due: args.due.as_deref().map(parse_due).transpose()?,
            // An empty `--tags` means "not given"; it never wipes the tags.
            tags: args.tags.as_deref().map(split_tags).filter(|tags| !tags.is_empty()),
        };
        self.repo.edit(args.id, &patch)
    }

    pub fn clear(&mut self) -> TodoResult<usize> {
        self.repo.clear()
    }

    /// Run one command and print its output. Returns the exit code for
    /// outcomes that were already reported to the user.
    pub fn run(&mut self, command: &Commands) -> TodoResult<i32> {
        let date_format = self.config.display.date_format.clone();

        match command {
            Commands::Add(args) => {
                let task = self.add(args)?;
                ui::print_message(MessageKind::Success, &ui::added_line(&task, &date_format));
                println!();
                ui::print_message(MessageKind::Info, "You can now list your tasks with `todo list`.");
            }
            Commands::List(args) => {
                let tasks = self.list(args)?;
                if tasks.is_empty() {
                    ui::print_message(MessageKind::Info, "No tasks found.");
                } else {
                    let verbose = args.verbose || self.config.display.verbose;
                    let table = ui::task_table(&tasks, verbose, &date_format, self.config.display.color);
                    println!("{}", table);
                    println!("{}", ui::summary(&TaskStats::from_tasks(&tasks)));
                }
            }
            Commands::Complete { id } => {
                let task = self.complete(*id)?;
                ui::print_message(
                    MessageKind::Success,
                    &format!("Task [{}] \"{}\" marked as done!", task.id, task.text),
                );
            }
            Commands::Delete { ids } => {
                let mut missing = 0;
                for (id, result) in self.delete(ids) {
                    match result {
                        Ok(task) => ui::print_message(
                            MessageKind::Delete,
                            &format!("Task [{}] \"{}\" deleted.", task.id, task.text),
                        ),
                        Err(TodoError::NotFound(_)) => {
                            missing += 1;
                            ui::print_message(MessageKind::Error, &format!("Sorry, task [{}] not found.", id));
                        }
                        Err(e) => return Err(e),
                    }
                }
                if missing > 0 {
                    return Ok(1);
                }
            }
            Commands::Edit(args) => {
                let task = self.edit(args)?;
                ui::print_message(
                    MessageKind::Success,
                    &format!("Task [{}] updated: \"{}\"", task.id, task.text),
                );
            }
            Commands::Clear => {
                let removed = self.clear()?;
                debug!(removed, "clear finished");
                ui::print_message(MessageKind::Info, "All tasks cleared.");
            }
            Commands::Config { init } => {
                let store = self.repo.storage().describe();
                return show_config(self.config_path.as_deref(), &self.config, *init, &store);
            }
        }
        Ok(0)
    }
}

fn config_file(cli: &Cli) -> Option<PathBuf> {
    cli.config.clone().or_else(Config::config_path)
}

/// Entry point behind `main`: load config, open the store, run the command.
pub fn run(cli: Cli) -> TodoResult<i32> {
    let mut config = match config_file(&cli) {
        Some(path) => Config::load_from(&path),
        None => Config::default(),
    };
    config.display.color &= !cli.no_color;
    ui::set_color(config.display.color);

    let Some(command) = &cli.command else {
        println!("{}", ui::USAGE);
        return Ok(0);
    };

    let backend = cli.backend.unwrap_or(config.storage.backend);
    let store_path = config.store_path(backend, cli.store.as_deref());

    // `config` must work even when the store cannot be opened.
    if let Commands::Config { init } = command {
        let store = store_path.display().to_string();
        return show_config(config_file(&cli).as_deref(), &config, *init, &store);
    }

    debug!(?backend, path = %store_path.display(), "opening task store");
    let storage = open_backend(backend, &store_path)?;
    let repo = Repository::open(storage)?;
    App::new(repo, config)
        .with_config_path(config_file(&cli))
        .run(command)
}

fn show_config(path: Option<&Path>, config: &Config, init: bool, store: &str) -> TodoResult<i32> {
    if init {
        let Some(path) = path else {
            return Err(TodoError::Usage("no config directory available, pass --config".to_string()));
        };
        if path.exists() {
            ui::print_message(MessageKind::Warning, &format!("Config already exists at {}", path.display()));
        } else {
            Config::default().save_to(path)?;
            ui::print_message(MessageKind::Success, &format!("Wrote default config to {}", path.display()));
        }
        return Ok(0);
    }

    match path {
        Some(path) => ui::print_message(MessageKind::Info, &format!("Config file: {}", path.display())),
        None => ui::print_message(MessageKind::Info, "Config file: (none)"),
    }
    ui::print_message(MessageKind::Info, &format!("Task store: {}", store));
    println!();
    print!("{}", toml::to_string_pretty(config)?);
    Ok(0)
}
