mod ansi;
mod calendar;
mod cli;
mod commands;
mod compose;
mod config;
mod form;
mod model;
mod recurrence;
mod render;
mod state;
mod storage;
mod style;
mod ui;

use anyhow::Result;
use clap::Parser;
use std::fs::{self, OpenOptions};
use std::io::{stdout, Write};
use std::process;
use std::sync::Mutex;
use tracing::Level;

const LOG_FILE_NAME: &str = "weekplan.log";

fn main() {
    let args = cli::Cli::parse();
    if let Err(err) = run(args) {
        report_error(&err, &mut stdout());
        process::exit(1);
    }
}

fn report_error(err: &anyhow::Error, out: &mut impl Write) {
    let _ = writeln!(out, "Error: {:#}", err);
}

fn run(args: cli::Cli) -> Result<()> {
    let config = config::load_config(args.global.config.as_deref())?;
    let level = if args.global.verbose {
        Level::DEBUG
    } else {
        config.level()
    };
    init_logging(level);

    let theme = style::Theme::from_config(&config.theme)?;
    let location = storage::StoreLocation::resolve(args.global.file.clone())?;
    let mut out = stdout();
    let command = args.command.unwrap_or(cli::Command::Tui);
    match command {
        cli::Command::Add {
            title,
            someday,
            date,
            notes,
        } => commands::add(location, title, someday, date, notes, &mut out),
        cli::Command::Delete { id } => commands::delete(location, id, &mut out),
        cli::Command::Toggle { id, date } => commands::toggle(location, id, date, &mut out),
        cli::Command::Edit { id, title, notes } => commands::edit(location, id, title, notes, &mut out),
        cli::Command::Get { id } => commands::get(location, id, &mut out),
        cli::Command::List { date, someday } => commands::list(location, date, someday, &mut out),
        cli::Command::Tui => commands::tui(location, &config, &theme),
    }
}

fn init_logging(level: Level) {
    let Ok(dir) = storage::data_dir() else {
        return;
    };
    if fs::create_dir_all(&dir).is_err() {
        return;
    }
    let Ok(file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(LOG_FILE_NAME))
    else {
        return;
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
}
