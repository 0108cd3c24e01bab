use crate::calendar::{self, days_between, is_last_day_of_month, months_between};
use crate::model::{Frequency, RecurrenceRule, Task, TaskList};
use chrono::{Datelike, NaiveDate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaySlot {
    Date(NaiveDate),
    Someday,
}

#[derive(Debug, Clone, Copy)]
pub struct DayTask<'a> {
    pub task: &'a Task,
    pub done: bool,
}

pub fn occurs_on(task: &Task, date: NaiveDate) -> bool {
    if task.is_someday {
        return false;
    }
    let Some(start) = task.date.as_ref().map(calendar::normalize) else {
        return false;
    };
    match &task.recurrence_rule {
        None => start == date,
        Some(rule) => rule_matches(rule, start, date),
    }
}

pub fn occurs_in(task: &Task, slot: DaySlot) -> bool {
    match slot {
        DaySlot::Someday => task.is_someday,
        DaySlot::Date(date) => occurs_on(task, date),
    }
}

fn rule_matches(rule: &RecurrenceRule, start: NaiveDate, target: NaiveDate) -> bool {
    if target < start {
        return false;
    }
    let interval = rule.effective_interval();
    let days_diff = days_between(start, target);
    match rule.freq {
        Frequency::None => start == target,
        Frequency::Daily => days_diff % interval == 0,
        Frequency::Weekly => {
            let weekday_match = if rule.weekdays.is_empty() {
                target.weekday() == start.weekday()
            } else {
                rule.has_weekday(target.weekday())
            };
            weekday_match && (days_diff / 7) % interval == 0
        }
        Frequency::Monthly => {
            let months_diff = months_between(start, target);
            if months_diff < 0 || months_diff % interval != 0 {
                return false;
            }
            let match_day = effective_month_day(rule, start);
            target.day() == match_day
                || (match_day > calendar::days_in_month(target.year(), target.month())
                    && is_last_day_of_month(target))
        }
    }
}

fn effective_month_day(rule: &RecurrenceRule, start: NaiveDate) -> u32 {
    if rule.month_day > 0 {
        rule.month_day as u32
    } else {
        start.day()
    }
}

pub fn is_done(task: &Task, date: NaiveDate) -> bool {
    match &task.recurrence_rule {
        None => task.done,
        Some(rule) => rule.done_list.contains(&date),
    }
}

pub fn toggle_done(task: &mut Task, date: NaiveDate) {
    match task.recurrence_rule.as_mut() {
        None => task.done = !task.done,
        Some(rule) => {
            if !rule.done_list.remove(&date) {
                rule.done_list.insert(date);
            }
        }
    }
}

// the someday bucket has no occurrence date, so every task uses its own flag
pub fn is_done_in(task: &Task, slot: DaySlot) -> bool {
    match slot {
        DaySlot::Someday => task.done,
        DaySlot::Date(date) => is_done(task, date),
    }
}

pub fn toggle_done_in(task: &mut Task, slot: DaySlot) {
    match slot {
        DaySlot::Someday => task.done = !task.done,
        DaySlot::Date(date) => toggle_done(task, date),
    }
}

pub fn tasks_for_day(tasks: &TaskList, slot: DaySlot) -> Vec<DayTask<'_>> {
    tasks
        .iter()
        .filter(|task| occurs_in(task, slot))
        .map(|task| DayTask {
            task,
            done: is_done_in(task, slot),
        })
        .collect()
}

pub fn prune_completions(task: &mut Task) {
    let Some(rule) = task.recurrence_rule.as_ref() else {
        return;
    };
    let stale: Vec<NaiveDate> = rule
        .done_list
        .iter()
        .copied()
        .filter(|date| !occurs_on(task, *date))
        .collect();
    if let Some(rule) = task.recurrence_rule.as_mut() {
        for date in stale {
            rule.done_list.remove(&date);
        }
    }
}

pub fn retarget_rule(rule: &mut RecurrenceRule, date: NaiveDate) {
    match rule.freq {
        Frequency::Weekly => rule.weekdays = vec![date.weekday()],
        Frequency::Monthly => rule.month_day = date.day() as u8,
        Frequency::None | Frequency::Daily => {}
    }
}
