//! `todo`: command-line front end over the client SDK.
//!
//! There is no stored session. `login` prints the user id; pass it to later commands with
//! `--user` or `TODO_USER_ID`.

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use todo_sdk::model::{SignupRequest, UpdateTaskRequest};
use todo_sdk::{
    ApiClient, ClientConfig, Priority, SessionContext, Task, TaskController, TaskFilter, TaskListState, TaskListView,
};
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser, Debug)]
#[command(name = "todo", about = "Manage your to-do list from the terminal")]
struct Cli {
    /// API base URL including the `/api` prefix.
    #[arg(long, env = "API_BASE_URL")]
    base_url: Option<String>,

    /// Signed-in user id, as printed by `login`.
    #[arg(long, env = "TODO_USER_ID")]
    user: Option<i64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account.
    Signup {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Defaults to the password.
        #[arg(long)]
        confirm: Option<String>,
    },
    /// Check credentials and print the user id.
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Show the current user.
    Whoami,
    /// List tasks.
    List {
        /// all, active or completed.
        #[arg(long, default_value = "all")]
        filter: TaskFilter,
        /// Number of pages to fetch.
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },
    /// Add a task.
    Add {
        title: String,
        #[arg(long)]
        description: Option<String>,
        /// Due date, e.g. 2026-10-31.
        #[arg(long)]
        due: Option<String>,
        #[arg(long, default_value = "low")]
        priority: Priority,
    },
    /// Change fields of a task.
    Edit {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, conflicts_with = "clear_description")]
        description: Option<String>,
        #[arg(long)]
        clear_description: bool,
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,
        #[arg(long)]
        clear_due: bool,
        #[arg(long)]
        priority: Option<Priority>,
    },
    /// Mark a task completed.
    Done { id: i64 },
    /// Mark a task not completed.
    Undone { id: i64 },
    /// Delete a task.
    Delete { id: i64 },
    /// Remove tasks completed at least `days` ago.
    Sweep {
        #[arg(long)]
        days: Option<u32>,
    },
    /// Show the list and keep sweeping stale completed tasks until Ctrl-C.
    Watch {
        #[arg(long, default_value = "all")]
        filter: TaskFilter,
    },
}

/// Prints errors as they happen. Lists are printed on every render only in live mode.
struct TerminalView {
    live: bool,
}

impl TaskListView for TerminalView {
    fn render(&self, state: &TaskListState) {
        if self.live && !state.loading {
            print_list(state, today());
        }
    }

    fn show_error(&self, message: &str) {
        eprintln!("error: {}", message);
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn print_list(state: &TaskListState, today: NaiveDate) {
    println!("{} tasks ({} shown)", state.filter, state.tasks.len());
    if state.is_empty() {
        println!("  nothing here");
    }
    for task in &state.tasks {
        println!("  {}", task_line(task, today));
    }
    if state.has_more {
        println!("  more available, use --pages");
    }
}

fn task_line(task: &Task, today: NaiveDate) -> String {
    let mut line = format!(
        "[{}] #{} {} ({})",
        if task.completed { "x" } else { " " },
        task.id,
        task.title,
        task.priority
    );
    if let Some(due) = &task.due_date {
        line.push_str(&format!(" due {}", due));
        if task.is_overdue(today) {
            line.push_str(" OVERDUE");
        }
    }
    if let Some(desc) = &task.description {
        line.push_str(&format!("\n        {}", desc));
    }
    line
}

#[tokio::main]
async fn main() -> CliResult<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = cli.base_url {
        config.base_url = url;
    }
    let api = ApiClient::new(&config)?;
    let session = SessionContext::new();
    let live = matches!(cli.command, Command::Watch { .. });
    let controller = TaskController::new(
        api.clone(),
        session.clone(),
        Arc::new(TerminalView { live }),
        config.tasks_per_page,
    );

    match cli.command {
        Command::Signup {
            username,
            email,
            password,
            confirm,
        } => {
            let confirm = confirm.unwrap_or_else(|| password.clone());
            let req = SignupRequest::new(&username, &email, &password, &confirm);
            let created = session.signup(&api, &req).await?;
            println!("Account created for {} (id {}). Log in to continue.", created.username, created.id);
        }
        Command::Login { username, password } => {
            let user = session.login(&api, &username, &password).await?;
            println!("Signed in as {} (id {}).", user.username, user.id);
            println!("export TODO_USER_ID={}", user.id);
        }
        command => {
            let user_id = cli.user.ok_or("no user; pass --user or set TODO_USER_ID")?;
            session.resume(&api, user_id).await?;
            run_signed_in(command, &controller, &config).await?;
        }
    }
    Ok(())
}

async fn run_signed_in(
    command: Command,
    controller: &TaskController<TerminalView>,
    config: &ClientConfig,
) -> CliResult<()> {
    match command {
        Command::Whoami => {
            if let Some(user) = controller.session().current() {
                println!("{} <{}> (id {})", user.username, user.email, user.id);
            }
            return Ok(());
        }
        Command::List { filter, pages } => {
            if let Some(handle) = controller.set_filter(filter) {
                handle.await?;
            }
            for _ in 1..pages {
                match controller.load_more() {
                    Some(handle) => handle.await?,
                    None => break,
                }
            }
        }
        Command::Add {
            title,
            description,
            due,
            priority,
        } => {
            let task = controller
                .add_task(&title, description.as_deref(), due.as_deref(), priority)
                .await?;
            println!("Added #{}", task.id);
            controller.refresh().await;
        }
        Command::Edit {
            id,
            title,
            description,
            clear_description,
            due,
            clear_due,
            priority,
        } => {
            let mut changes = UpdateTaskRequest::default();
            if let Some(t) = &title {
                changes = changes.title(t);
            }
            if clear_description || description.is_some() {
                changes = changes.description(description.as_deref());
            }
            if clear_due || due.is_some() {
                changes = changes.due_date(due.as_deref());
            }
            if let Some(p) = priority {
                changes = changes.priority(p);
            }
            let task = controller.update_task(id, &changes).await?;
            println!("Updated #{}", task.id);
            controller.refresh().await;
        }
        Command::Done { id } => set_completion(controller, id, true).await?,
        Command::Undone { id } => set_completion(controller, id, false).await?,
        Command::Delete { id } => {
            controller.delete_task(id).await?;
            println!("Deleted #{}", id);
            controller.refresh().await;
        }
        Command::Sweep { days } => {
            let deleted = controller
                .sweep_once(days.unwrap_or(config.sweep_retention_days))
                .await?;
            println!("Removed {} completed task(s)", deleted);
            return Ok(());
        }
        Command::Watch { filter } => {
            if let Some(handle) = controller.set_filter(filter) {
                handle.await?;
            }
            let sweeper = controller.spawn_sweeper(
                config.sweep_interval.max(Duration::from_secs(1)),
                config.sweep_retention_days,
            );
            tokio::signal::ctrl_c().await?;
            sweeper.shutdown().await;
            return Ok(());
        }
        Command::Signup { .. } | Command::Login { .. } => return Ok(()),
    }
    print_list(&controller.state(), today());
    Ok(())
}

async fn set_completion(controller: &TaskController<TerminalView>, id: i64, completed: bool) -> CliResult<()> {
    let task = controller.toggle_completion(id, completed).await?;
    println!("#{} {}", task.id, if task.completed { "completed" } else { "reopened" });
    controller.refresh().await;
    Ok(())
}
