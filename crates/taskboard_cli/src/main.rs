//! Command-line shell for the board.
//!
//! # Responsibility
//! - Render snapshots and map user commands onto the uniform store
//!   operations, including drag-style index moves.
//! - Hold the input guards: titles are trimmed and empty input is not
//!   submitted to the data layer.

use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use taskboard_core::{
    default_log_level, init_logging, BoardConfig, BoardService, Project, Task, TaskPatch,
};

#[derive(Parser)]
#[command(
    name = "taskboard",
    version,
    about = "Project/task board over a hosted document store or a local fallback"
)]
struct Cli {
    /// Fallback database file, used when remote settings are absent.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Log level (trace|debug|info|warn|error).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the active storage backend and entity counts.
    Status,
    /// Render every project with its tasks in board order.
    Board,
    /// Manage projects.
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },
    /// Manage tasks.
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },
    /// Subscribe and print each snapshot as it arrives (Ctrl-C to stop).
    Watch,
}

#[derive(Subcommand)]
enum ProjectAction {
    /// Add a project at the end of the board.
    Add { title: String },
    /// Rename one project.
    Rename { id: String, title: String },
    /// Delete a project and every task it owns.
    Rm { id: String },
    /// Move a project between board positions (0-based).
    Move { from: usize, to: usize },
}

#[derive(Subcommand)]
enum TaskAction {
    /// Add a task at the end of a project.
    Add { project_id: String, title: String },
    /// Change a task's title and/or comment.
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        comment: Option<String>,
    },
    /// Delete one task.
    Rm { id: String },
    /// Move a task between positions within its project (0-based).
    Move {
        project_id: String,
        from: usize,
        to: usize,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| default_log_level().to_string());
    init_logging(&level)?;

    let mut config = BoardConfig::from_env();
    if let Some(db) = cli.db {
        config.local_db_path = db;
    }
    let service = BoardService::open(&config)?;

    match cli.command {
        Commands::Status => status(&service),
        Commands::Board => render_board(&service),
        Commands::Project { action } => project_command(&service, action)?,
        Commands::Task { action } => task_command(&service, action)?,
        Commands::Watch => watch(&service),
    }

    Ok(())
}

fn status(service: &BoardService) {
    println!("storage: {}", service.kind());
    println!("projects: {}", service.snapshot_projects().len());
    println!("tasks: {}", service.snapshot_tasks().len());
}

fn render_board(service: &BoardService) {
    let projects = service.snapshot_projects();
    if projects.is_empty() {
        println!("(empty board)");
        return;
    }
    let tasks = service.snapshot_tasks();
    for project in &projects {
        print_project(project, &tasks);
    }
}

fn print_project(project: &Project, all_tasks: &[Task]) {
    println!("{}  [{}]", project.title, project.id);
    for task in all_tasks.iter().filter(|t| t.project_id == project.id) {
        println!("  - {}  [{}]", task.title, task.id);
        if !task.comment.is_empty() {
            println!("      {}", task.comment);
        }
    }
}

fn project_command(service: &BoardService, action: ProjectAction) -> Result<(), Box<dyn Error>> {
    match action {
        ProjectAction::Add { title } => {
            let Some(title) = submitted(&title) else {
                println!("nothing to add: empty title");
                return Ok(());
            };
            let id = service.create_project(title)?;
            println!("created project {id}");
        }
        ProjectAction::Rename { id, title } => {
            let Some(title) = submitted(&title) else {
                println!("nothing to rename: empty title");
                return Ok(());
            };
            service.rename_project(&id, title)?;
            println!("renamed project {id}");
        }
        ProjectAction::Rm { id } => {
            service.delete_project(&id)?;
            println!("deleted project {id} and its tasks");
        }
        ProjectAction::Move { from, to } => {
            if service.move_project(from, to)? {
                println!("moved project {from} -> {to}");
            } else {
                println!("nothing to move");
            }
        }
    }
    Ok(())
}

fn task_command(service: &BoardService, action: TaskAction) -> Result<(), Box<dyn Error>> {
    match action {
        TaskAction::Add { project_id, title } => {
            let Some(title) = submitted(&title) else {
                println!("nothing to add: empty title");
                return Ok(());
            };
            let id = service.create_task(&project_id, title)?;
            println!("created task {id}");
        }
        TaskAction::Edit { id, title, comment } => {
            let patch = TaskPatch {
                // An all-whitespace title is not submitted; clearing a
                // comment is a legitimate edit.
                title: title.as_deref().and_then(submitted).map(str::to_string),
                comment,
            };
            if patch.is_empty() {
                println!("nothing to change");
                return Ok(());
            }
            service.update_task(&id, &patch)?;
            println!("updated task {id}");
        }
        TaskAction::Rm { id } => {
            service.delete_task(&id)?;
            println!("deleted task {id}");
        }
        TaskAction::Move {
            project_id,
            from,
            to,
        } => {
            if service.move_task(&project_id, from, to)? {
                println!("moved task {from} -> {to} in {project_id}");
            } else {
                println!("nothing to move");
            }
        }
    }
    Ok(())
}

fn watch(service: &BoardService) {
    let _projects = service.subscribe_projects(Box::new(|projects| {
        println!("projects ({}):", projects.len());
        for project in &projects {
            println!("  {}  [{}]", project.title, project.id);
        }
    }));
    let _tasks = service.subscribe_tasks(Box::new(|tasks| {
        println!("tasks ({}):", tasks.len());
        for task in &tasks {
            println!("  {} / {}  [{}]", task.project_id, task.title, task.id);
        }
    }));

    loop {
        std::thread::park();
    }
}

fn submitted(input: &str) -> Option<&str> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}
