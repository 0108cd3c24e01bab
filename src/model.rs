use crate::calendar::weekday_from_index;
use chrono::{DateTime, Datelike, Local, NaiveDate, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

pub type TaskId = Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Task {
    pub id: TaskId,
    #[serde(rename = "task")]
    pub title: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default, deserialize_with = "unset_time_as_none")]
    pub date: Option<DateTime<Local>>,
    #[serde(default)]
    pub is_someday: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_rule: Option<RecurrenceRule>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(try_from = "FrequencyRepr", into = "u8")]
pub enum Frequency {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RecurrenceRule {
    pub freq: Frequency,
    #[serde(default = "default_interval")]
    pub interval: i32,
    #[serde(default, with = "weekday_numbers")]
    pub weekdays: Vec<Weekday>,
    #[serde(default)]
    pub month_day: u8,
    #[serde(default, deserialize_with = "null_as_default")]
    pub done_list: BTreeSet<NaiveDate>,
}

// On disk a frequency is its position in `Frequency::ALL`. Older files may
// carry the lowercase name instead.
#[derive(Deserialize)]
#[serde(untagged)]
enum FrequencyRepr {
    Code(u8),
    Name(String),
}

impl TryFrom<FrequencyRepr> for Frequency {
    type Error = String;

    fn try_from(repr: FrequencyRepr) -> Result<Self, Self::Error> {
        match repr {
            FrequencyRepr::Code(code) => Frequency::ALL
                .get(code as usize)
                .copied()
                .ok_or_else(|| format!("unknown frequency {}", code)),
            FrequencyRepr::Name(name) => Frequency::ALL
                .into_iter()
                .find(|f| f.label().eq_ignore_ascii_case(&name))
                .ok_or_else(|| format!("unknown frequency {:?}", name)),
        }
    }
}

impl From<Frequency> for u8 {
    fn from(freq: Frequency) -> u8 {
        freq.position() as u8
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// Dateless tasks written by other tools carry the zero time 0001-01-01.
fn unset_time_as_none<'de, D>(deserializer: D) -> Result<Option<DateTime<Local>>, D::Error>
where
    D: Deserializer<'de>,
{
    let date = Option::<DateTime<Local>>::deserialize(deserializer)?;
    Ok(date.filter(|d| d.year() > 1))
}

// Weekdays are stored as numbers with Sunday = 0. Names are accepted on load.
mod weekday_numbers {
    use super::*;
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum WeekdayRepr {
        Number(u8),
        Name(Weekday),
    }

    pub fn serialize<S: Serializer>(days: &[Weekday], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(days.iter().map(|d| d.num_days_from_sunday()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Weekday>, D::Error> {
        let raw = Option::<Vec<WeekdayRepr>>::deserialize(deserializer)?.unwrap_or_default();
        raw.into_iter()
            .map(|repr| match repr {
                WeekdayRepr::Number(n) if n < 7 => Ok(weekday_from_index((n as usize + 6) % 7)),
                WeekdayRepr::Number(n) => Err(D::Error::custom(format!("invalid weekday {}", n))),
                WeekdayRepr::Name(day) => Ok(day),
            })
            .collect()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(transparent)]
pub struct TaskList {
    tasks: Vec<Task>,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum TaskError {
    #[error("task not found: {0}")]
    NotFound(String),
    #[error("task id {0} matches more than one task")]
    Ambiguous(String),
    #[error("index {index} out of range for {len} tasks")]
    IndexOutOfRange { index: usize, len: usize },
}

fn default_interval() -> i32 {
    1
}

impl Frequency {
    pub const ALL: [Frequency; 4] = [
        Frequency::None,
        Frequency::Daily,
        Frequency::Weekly,
        Frequency::Monthly,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Frequency::None => "None",
            Frequency::Daily => "Daily",
            Frequency::Weekly => "Weekly",
            Frequency::Monthly => "Monthly",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Frequency::Weekly => "weeks",
            Frequency::Monthly => "months",
            Frequency::None | Frequency::Daily => "days",
        }
    }

    fn position(&self) -> usize {
        Frequency::ALL.iter().position(|f| f == self).unwrap_or(0)
    }

    pub fn step(&self, delta: i32) -> Frequency {
        let last = Frequency::ALL.len() as i32 - 1;
        let idx = (self.position() as i32 + delta).clamp(0, last);
        Frequency::ALL[idx as usize]
    }
}

impl RecurrenceRule {
    pub fn new(freq: Frequency, interval: i32) -> Self {
        RecurrenceRule {
            freq,
            interval,
            weekdays: Vec::new(),
            month_day: 0,
            done_list: BTreeSet::new(),
        }
    }

    pub fn effective_interval(&self) -> i64 {
        if self.interval <= 0 {
            1
        } else {
            self.interval as i64
        }
    }

    pub fn is_active(&self) -> bool {
        self.freq != Frequency::None
    }

    pub fn normalized(self) -> Option<RecurrenceRule> {
        if self.is_active() {
            Some(self)
        } else {
            None
        }
    }

    pub fn has_weekday(&self, weekday: Weekday) -> bool {
        self.weekdays.contains(&weekday)
    }

    pub fn toggle_weekday(&mut self, weekday: Weekday) {
        if self.has_weekday(weekday) {
            self.weekdays.retain(|w| *w != weekday);
        } else {
            self.weekdays.push(weekday);
        }
    }

    pub fn describe(&self) -> String {
        let n = self.effective_interval();
        let every = |singular: &str, plural: &str| {
            if n == 1 {
                singular.to_string()
            } else {
                format!("every {} {}", n, plural)
            }
        };
        match self.freq {
            Frequency::None => "does not repeat".to_string(),
            Frequency::Daily => every("daily", "days"),
            Frequency::Weekly => {
                let base = every("weekly", "weeks");
                if self.weekdays.is_empty() {
                    base
                } else {
                    let mut days = self.weekdays.clone();
                    days.sort_by_key(|d| d.num_days_from_monday());
                    let names = days
                        .iter()
                        .map(|d| d.to_string())
                        .collect::<Vec<_>>()
                        .join(", ");
                    format!("{} on {}", base, names)
                }
            }
            Frequency::Monthly => {
                let base = every("monthly", "months");
                if self.month_day > 0 {
                    format!("{} on day {}", base, self.month_day)
                } else {
                    base
                }
            }
        }
    }
}

impl Default for RecurrenceRule {
    fn default() -> Self {
        RecurrenceRule::new(Frequency::None, 1)
    }
}

impl Task {
    pub fn new(
        title: impl Into<String>,
        notes: impl Into<String>,
        date: Option<DateTime<Local>>,
        is_someday: bool,
    ) -> Self {
        Task {
            id: Uuid::new_v4(),
            title: title.into(),
            notes: notes.into(),
            done: false,
            date,
            is_someday,
            recurrence_rule: None,
        }
    }

    pub fn short_id(&self) -> String {
        short_id(&self.id)
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence_rule.is_some()
    }
}

pub fn short_id(id: &TaskId) -> String {
    id.simple().to_string()[..8].to_string()
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.short_id(), self.title)
    }
}

impl TaskList {
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Task> {
        self.tasks.iter()
    }

    pub fn add(
        &mut self,
        title: impl Into<String>,
        notes: impl Into<String>,
        date: Option<DateTime<Local>>,
        is_someday: bool,
    ) -> &Task {
        self.tasks.push(Task::new(title, notes, date, is_someday));
        &self.tasks[self.tasks.len() - 1]
    }

    pub fn position(&self, id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == *id)
    }

    pub fn find(&self, id: &TaskId) -> Result<&Task, TaskError> {
        self.tasks
            .iter()
            .find(|t| t.id == *id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))
    }

    pub fn find_mut(&mut self, id: &TaskId) -> Result<&mut Task, TaskError> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == *id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))
    }

    pub fn resolve(&self, text: &str) -> Result<TaskId, TaskError> {
        let needle = text.trim().to_lowercase().replace('-', "");
        if needle.is_empty() {
            return Err(TaskError::NotFound(text.to_string()));
        }
        let mut matches = self
            .tasks
            .iter()
            .filter(|t| t.id.simple().to_string().starts_with(&needle));
        match (matches.next(), matches.next()) {
            (Some(task), None) => Ok(task.id),
            (Some(_), Some(_)) => Err(TaskError::Ambiguous(text.to_string())),
            (None, _) => Err(TaskError::NotFound(text.to_string())),
        }
    }

    pub fn remove(&mut self, id: &TaskId) -> Result<Task, TaskError> {
        let idx = self
            .position(id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))?;
        self.remove_at(idx)
    }

    pub fn remove_at(&mut self, index: usize) -> Result<Task, TaskError> {
        if index >= self.tasks.len() {
            return Err(TaskError::IndexOutOfRange {
                index,
                len: self.tasks.len(),
            });
        }
        Ok(self.tasks.remove(index))
    }

    pub fn update<F>(&mut self, id: &TaskId, f: F) -> bool
    where
        F: FnOnce(&mut Task),
    {
        match self.find_mut(id) {
            Ok(task) => {
                f(task);
                true
            }
            Err(_) => false,
        }
    }

    pub fn update_fields(&mut self, id: &TaskId, title: &str, notes: &str) -> bool {
        self.update(id, |task| {
            task.title = title.to_string();
            task.notes = notes.to_string();
        })
    }

    pub fn update_date(&mut self, id: &TaskId, date: Option<DateTime<Local>>) -> bool {
        self.update(id, |task| task.date = date)
    }

    pub fn set_someday(&mut self, id: &TaskId, someday: bool) -> bool {
        self.update(id, |task| task.is_someday = someday)
    }

    pub fn set_recurrence_rule(&mut self, id: &TaskId, rule: Option<RecurrenceRule>) -> bool {
        self.update(id, |task| {
            task.recurrence_rule = rule.and_then(RecurrenceRule::normalized)
        })
    }

    pub fn normalize_rules(&mut self) {
        for task in &mut self.tasks {
            if let Some(rule) = task.recurrence_rule.take() {
                task.recurrence_rule = rule.normalized();
            }
        }
    }
}

impl<'a> IntoIterator for &'a TaskList {
    type Item = &'a Task;
    type IntoIter = std::slice::Iter<'a, Task>;

    fn into_iter(self) -> Self::IntoIter {
        self.tasks.iter()
    }
}
