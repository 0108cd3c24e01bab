use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "weekplan", version, about = "Weekly task planner for the terminal")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Task file to use instead of the one in the data directory
    #[arg(long, global = true)]
    pub file: Option<PathBuf>,
    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Log at debug level
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a task for a day (today by default) or the someday backlog
    Add {
        /// Title of the task
        title: String,
        /// Put the task in the someday backlog
        #[arg(long, conflicts_with = "date")]
        someday: bool,
        /// Day to schedule the task on (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
        /// Optional notes
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete a task
    Delete {
        /// Task id or unique id prefix
        id: String,
    },
    /// Toggle completion; recurring tasks toggle one occurrence
    Toggle {
        /// Task id or unique id prefix
        id: String,
        /// Occurrence to toggle (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Replace the title (and optionally the notes) of a task
    Edit {
        /// Task id or unique id prefix
        id: String,
        /// New title
        title: String,
        /// New notes
        #[arg(long)]
        notes: Option<String>,
    },
    /// Show one task
    Get {
        /// Task id or unique id prefix
        id: String,
    },
    /// List the tasks of a day (today by default)
    List {
        /// Day to list (YYYY-MM-DD)
        #[arg(long, conflicts_with = "someday")]
        date: Option<String>,
        /// List the someday backlog
        #[arg(long)]
        someday: bool,
    },
    /// Launch the interactive planner
    Tui,
}
