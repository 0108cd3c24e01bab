use crate::model::TaskList;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const STORE_FILE_NAME: &str = "tasks.json";

#[derive(Debug, Clone)]
pub struct StoreLocation {
    pub path: PathBuf,
}

#[derive(Debug)]
pub struct Store {
    pub location: StoreLocation,
    pub tasks: TaskList,
}

impl StoreLocation {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        StoreLocation { path: path.into() }
    }

    pub fn resolve(explicit: Option<PathBuf>) -> Result<Self> {
        match explicit {
            Some(path) => Ok(StoreLocation::new(path)),
            None => Ok(StoreLocation::new(data_dir()?.join(STORE_FILE_NAME))),
        }
    }
}

impl Store {
    pub fn open(location: StoreLocation) -> Result<Self> {
        let mut store = Store {
            location,
            tasks: TaskList::default(),
        };
        store.load()?;
        Ok(store)
    }

    pub fn persist(&self) -> Result<()> {
        save_tasks(&self.location.path, &self.tasks)
    }

    pub fn load(&mut self) -> Result<()> {
        self.tasks = load_tasks(&self.location.path)?;
        Ok(())
    }
}

pub fn load_tasks(path: &Path) -> Result<TaskList> {
    if !path.exists() {
        info!(path = %path.display(), "no task file yet, starting empty");
        return Ok(TaskList::default());
    }
    let data = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
    if data.trim().is_empty() {
        return Ok(TaskList::default());
    }
    let mut tasks: TaskList =
        serde_json::from_str(&data).with_context(|| format!("parsing task file {:?}", path))?;
    tasks.normalize_rules();
    info!(path = %path.display(), count = tasks.len(), "tasks loaded");
    Ok(tasks)
}

pub fn save_tasks(path: &Path, tasks: &TaskList) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| format!("creating {:?}", parent))?;
        }
    }
    let serialized = serde_json::to_string_pretty(tasks).context("serializing tasks")?;
    fs::write(path, serialized).with_context(|| format!("writing {:?}", path))?;
    debug!(path = %path.display(), count = tasks.len(), "tasks saved");
    Ok(())
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "weekplan").context("locating data directory")
}

pub fn data_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().to_path_buf())
}

pub fn config_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::midnight;
    use crate::model::{Frequency, RecurrenceRule};
    use chrono::{NaiveDate, Weekday};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn sample() -> TaskList {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut list = TaskList::default();
        list.add("Buy milk", "2 litres", Some(midnight(day)), false);
        list.add("Learn piano", "", None, true);
        let id = list.add("Gym", "", Some(midnight(day)), false).id;
        let mut rule = RecurrenceRule::new(Frequency::Weekly, 2);
        rule.weekdays = vec![Weekday::Mon, Weekday::Thu];
        rule.done_list.insert(NaiveDate::from_ymd_opt(2024, 1, 4).unwrap());
        list.set_recurrence_rule(&id, Some(rule));
        list
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("tasks.json");
        let tasks = sample();
        save_tasks(&path, &tasks).unwrap();
        let loaded = load_tasks(&path).unwrap();
        assert_eq!(loaded, tasks);
    }

    #[test]
    fn persisted_format_uses_documented_field_names() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");
        save_tasks(&path, &sample()).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let items = value.as_array().unwrap();
        assert_eq!(items.len(), 3);
        for key in ["id", "task", "notes", "done", "date", "is_someday"] {
            assert!(items[0].get(key).is_some(), "missing {}", key);
        }
        assert!(items[0].get("recurrence_rule").is_none());
        let rule = &items[2]["recurrence_rule"];
        assert_eq!(rule["freq"], 2);
        assert_eq!(rule["interval"], 2);
        assert_eq!(rule["weekdays"], serde_json::json!([1, 4]));
        assert_eq!(rule["done_list"][0], "2024-01-04");
        assert!(rule.get("month_day").is_some());
    }

    #[test]
    fn missing_file_is_an_empty_list() {
        let dir = TempDir::new().unwrap();
        let tasks = load_tasks(&dir.path().join("absent.json")).unwrap();
        assert!(tasks.is_empty());
    }

    #[test]
    fn malformed_file_fails_to_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");
        fs::write(&path, "{ not json").unwrap();
        let err = load_tasks(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("parsing task file"));
    }

    #[test]
    fn none_frequency_on_disk_is_dropped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");
        let json = r#"[{"id":"6f1c9d2e-8c1b-4b7a-9a51-2f1e7c0f4d11","task":"Old","notes":"","done":false,
            "date":"2024-01-01T00:00:00Z","is_someday":false,
            "recurrence_rule":{"freq":0,"interval":1,"weekdays":null,"month_day":0,"done_list":null}}]"#;
        fs::write(&path, json).unwrap();
        let tasks = load_tasks(&path).unwrap();
        assert_eq!(tasks.iter().next().unwrap().recurrence_rule, None);
    }

    #[test]
    fn loads_numeric_rules_and_zero_dates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");
        let json = r#"[
            {"id":"6f1c9d2e-8c1b-4b7a-9a51-2f1e7c0f4d11","task":"Gym","notes":"","done":false,
             "date":"2024-01-01T00:00:00+01:00","is_someday":false,
             "recurrence_rule":{"freq":2,"interval":1,"weekdays":[1,0],"month_day":0,"done_list":["2024-01-08"]}},
            {"id":"0b7e4c55-2a0f-4c1e-9d8e-5b2f6a9c1d00","task":"Someday","notes":"","done":false,
             "date":"0001-01-01T00:00:00Z","is_someday":true},
            {"id":"9a0e1f22-3b4c-4d5e-8f60-718293a4b5c6","task":"Legacy","notes":"","done":false,
             "date":"2024-01-01T00:00:00Z","is_someday":false,
             "recurrence_rule":{"freq":"monthly","interval":1,"weekdays":["Mon"],"month_day":31,"done_list":[]}}
        ]"#;
        fs::write(&path, json).unwrap();
        let tasks = load_tasks(&path).unwrap();
        let all: Vec<_> = tasks.iter().collect();

        let gym = all[0].recurrence_rule.as_ref().unwrap();
        assert_eq!(gym.freq, Frequency::Weekly);
        assert_eq!(gym.weekdays, vec![Weekday::Mon, Weekday::Sun]);
        assert!(gym.done_list.contains(&NaiveDate::from_ymd_opt(2024, 1, 8).unwrap()));

        assert_eq!(all[1].date, None);
        assert_eq!(all[2].recurrence_rule.as_ref().unwrap().freq, Frequency::Monthly);
        assert_eq!(all[2].recurrence_rule.as_ref().unwrap().weekdays, vec![Weekday::Mon]);
    }

    #[test]
    fn out_of_range_frequency_fails_to_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");
        let json = r#"[{"id":"6f1c9d2e-8c1b-4b7a-9a51-2f1e7c0f4d11","task":"Odd","notes":"","done":false,
            "date":null,"is_someday":true,"recurrence_rule":{"freq":7,"interval":1}}]"#;
        fs::write(&path, json).unwrap();
        assert!(load_tasks(&path).is_err());
    }

    #[test]
    fn store_load_replaces_in_memory_list() {
        let dir = TempDir::new().unwrap();
        let location = StoreLocation::new(dir.path().join("tasks.json"));
        let mut store = Store::open(location).unwrap();
        store.tasks.add("Draft", "", None, true);
        store.persist().unwrap();
        store.tasks.add("Unsaved", "", None, true);
        store.load().unwrap();
        assert_eq!(store.tasks.len(), 1);
    }
}
