use crate::calendar::{self, midnight, parse_iso, to_iso};
use crate::config::Config;
use crate::model::Task;
use crate::recurrence::{self, tasks_for_day, DaySlot};
use crate::storage::{Store, StoreLocation};
use crate::style::Theme;
use crate::ui;
use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use std::io::Write;
use tracing::info;

pub fn add(
    location: StoreLocation,
    title: String,
    someday: bool,
    date: Option<String>,
    notes: Option<String>,
    out: &mut impl Write,
) -> Result<()> {
    if title.trim().is_empty() {
        bail!("title must not be empty");
    }
    let mut store = Store::open(location)?;
    let day = if someday { None } else { Some(parse_day(date.as_deref())?) };
    let task = store
        .tasks
        .add(title, notes.unwrap_or_default(), day.map(midnight), someday)
        .clone();
    store.persist()?;
    info!(task_id = %task.id, "task added from command line");
    let target = match day {
        Some(day) => to_iso(day),
        None => "someday".to_string(),
    };
    writeln!(out, "Added task {} \"{}\" for {}", task.short_id(), task.title, target)?;
    Ok(())
}

pub fn delete(location: StoreLocation, id: String, out: &mut impl Write) -> Result<()> {
    let mut store = Store::open(location)?;
    let task_id = store.tasks.resolve(&id)?;
    let task = store
        .tasks
        .remove(&task_id)
        .with_context(|| format!("deleting task {}", id))?;
    store.persist()?;
    info!(task_id = %task_id, "task deleted from command line");
    writeln!(out, "Deleted task {} \"{}\"", task.short_id(), task.title)?;
    Ok(())
}

pub fn toggle(location: StoreLocation, id: String, date: Option<String>, out: &mut impl Write) -> Result<()> {
    let mut store = Store::open(location)?;
    let task_id = store.tasks.resolve(&id)?;
    let day = parse_day(date.as_deref())?;
    let task = store.tasks.find_mut(&task_id)?;

    let slot = if task.is_someday {
        DaySlot::Someday
    } else {
        DaySlot::Date(day)
    };
    if task.is_recurring() && !recurrence::occurs_in(task, slot) {
        bail!("task {} does not occur on {}", task.short_id(), to_iso(day));
    }
    recurrence::toggle_done_in(task, slot);
    let done = recurrence::is_done_in(task, slot);
    let summary = if task.is_recurring() {
        format!("{} on {}", done_word(done), to_iso(day))
    } else {
        done_word(done).to_string()
    };
    let label = format!("{} \"{}\"", task.short_id(), task.title);

    store.persist()?;
    info!(task_id = %task_id, done, "completion toggled from command line");
    writeln!(out, "Marked {} {}", label, summary)?;
    Ok(())
}

pub fn edit(
    location: StoreLocation,
    id: String,
    title: String,
    notes: Option<String>,
    out: &mut impl Write,
) -> Result<()> {
    if title.trim().is_empty() {
        bail!("title must not be empty");
    }
    let mut store = Store::open(location)?;
    let task_id = store.tasks.resolve(&id)?;
    let notes = match notes {
        Some(notes) => notes,
        None => store.tasks.find(&task_id)?.notes.clone(),
    };
    store.tasks.update_fields(&task_id, &title, &notes);
    store.persist()?;
    info!(task_id = %task_id, "task edited from command line");
    writeln!(out, "Updated task {} \"{}\"", crate::model::short_id(&task_id), title)?;
    Ok(())
}

pub fn get(location: StoreLocation, id: String, out: &mut impl Write) -> Result<()> {
    let store = Store::open(location)?;
    let task_id = store.tasks.resolve(&id)?;
    let task = store.tasks.find(&task_id)?;
    print_task(task, calendar::today(), out)
}

pub fn list(location: StoreLocation, date: Option<String>, someday: bool, out: &mut impl Write) -> Result<()> {
    let store = Store::open(location)?;
    let slot = if someday {
        DaySlot::Someday
    } else {
        DaySlot::Date(parse_day(date.as_deref())?)
    };
    let heading = match slot {
        DaySlot::Someday => "Someday".to_string(),
        DaySlot::Date(day) => day.format("%A, %b %d, %Y").to_string(),
    };
    writeln!(out, "{}", heading)?;
    let entries = tasks_for_day(&store.tasks, slot);
    if entries.is_empty() {
        writeln!(out, "  (no tasks)")?;
    }
    for entry in entries {
        let check = if entry.done { "[✔]" } else { "[ ]" };
        writeln!(out, "  {} {}  {}", check, entry.task.short_id(), entry.task.title)?;
    }
    Ok(())
}

pub fn tui(location: StoreLocation, config: &Config, theme: &Theme) -> Result<()> {
    let store = Store::open(location)?;
    ui::run(store, config, theme)
}

fn parse_day(input: Option<&str>) -> Result<NaiveDate> {
    match input.map(str::trim) {
        None | Some("") => Ok(calendar::today()),
        Some(raw) => {
            parse_iso(raw).map_err(|_| anyhow!("invalid date (use YYYY-MM-DD): {}", raw))
        }
    }
}

fn done_word(done: bool) -> &'static str {
    if done {
        "done"
    } else {
        "not done"
    }
}

fn print_task(task: &Task, today: NaiveDate, out: &mut impl Write) -> Result<()> {
    writeln!(out, "id:       {}", task.id)?;
    writeln!(out, "title:    {}", task.title)?;
    let scheduled = match (&task.date, task.is_someday) {
        (_, true) => "someday".to_string(),
        (Some(date), false) => to_iso(calendar::normalize(date)),
        (None, false) => "unscheduled".to_string(),
    };
    writeln!(out, "date:     {}", scheduled)?;
    match &task.recurrence_rule {
        Some(rule) => {
            writeln!(out, "repeats:  {}", rule.describe())?;
            writeln!(
                out,
                "today:    {}",
                done_word(recurrence::is_done(task, today))
            )?;
            writeln!(out, "done on:  {}", rule.done_list.len())?;
        }
        None => writeln!(out, "done:     {}", if task.done { "yes" } else { "no" })?,
    }
    if !task.notes.is_empty() {
        writeln!(out, "notes:")?;
        for line in task.notes.lines() {
            writeln!(out, "  {}", line)?;
        }
    }
    Ok(())
}
