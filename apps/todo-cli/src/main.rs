use clap::Parser;
use todo_cli::cli::Cli;
use todo_cli::ui::{self, MessageKind};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let code = match todo_cli::app::run(cli) {
        Ok(code) => code,
        Err(e) => {
            if !e.is_expected() {
                tracing::error!(error = ?e, "command failed");
            }
            ui::print_message(MessageKind::Error, &e.to_string());
            e.exit_code()
        }
    };

    std::process::exit(code);
}
