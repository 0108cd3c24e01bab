use crate::calendar::{self, days_in_month, shift_month, weekday_from_index, weekday_index};
use crate::model::{Frequency, RecurrenceRule, Task};
use chrono::{Datelike, NaiveDate, Weekday};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextField {
    pub value: String,
    pub cursor: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Notes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskForm {
    pub title: TextField,
    pub notes: TextField,
    pub focus: FormField,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatePicker {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleFocus {
    Frequency,
    Interval,
    Weekdays,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuleEditor {
    pub rule: RecurrenceRule,
    pub focus: RuleFocus,
    pub weekday_cursor: usize,
}

impl TextField {
    pub fn new(value: &str) -> Self {
        TextField {
            value: value.to_string(),
            cursor: value.len(),
        }
    }

    pub fn move_left(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor = prev_char(self.cursor, &self.value);
    }

    pub fn move_right(&mut self) {
        if self.cursor >= self.value.len() {
            return;
        }
        self.cursor = next_char(self.cursor, &self.value);
    }

    pub fn move_up(&mut self) {
        let (line_starts, line_idx, col) = line_state(&self.value, self.cursor);
        if line_idx == 0 {
            return;
        }
        let target_start = line_starts[line_idx - 1];
        self.cursor = index_at_col(&self.value, target_start, col);
    }

    pub fn move_down(&mut self) {
        let (line_starts, line_idx, col) = line_state(&self.value, self.cursor);
        if line_idx + 1 >= line_starts.len() {
            return;
        }
        let target_start = line_starts[line_idx + 1];
        self.cursor = index_at_col(&self.value, target_start, col);
    }

    pub fn home(&mut self) {
        let (line_starts, line_idx, _) = line_state(&self.value, self.cursor);
        self.cursor = line_starts[line_idx];
    }

    pub fn end(&mut self) {
        let rest = &self.value[self.cursor..];
        self.cursor += rest.find('\n').unwrap_or(rest.len());
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let prev = prev_char(self.cursor, &self.value);
        self.value.drain(prev..self.cursor);
        self.cursor = prev;
    }

    pub fn delete(&mut self) {
        if self.cursor >= self.value.len() {
            return;
        }
        let next = next_char(self.cursor, &self.value);
        self.value.drain(self.cursor..next);
    }

    pub fn insert_char(&mut self, ch: char) {
        self.value.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    pub fn with_caret(&self) -> String {
        let mut text = self.value.clone();
        text.insert(self.cursor, '▌');
        text
    }
}

impl TaskForm {
    pub fn new() -> Self {
        TaskForm {
            title: TextField::new(""),
            notes: TextField::new(""),
            focus: FormField::Title,
            error: None,
        }
    }

    pub fn from_task(task: &Task) -> Self {
        TaskForm {
            title: TextField::new(&task.title),
            notes: TextField::new(&task.notes),
            focus: FormField::Title,
            error: None,
        }
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            FormField::Title => FormField::Notes,
            FormField::Notes => FormField::Title,
        };
    }

    pub fn active_field_mut(&mut self) -> &mut TextField {
        match self.focus {
            FormField::Title => &mut self.title,
            FormField::Notes => &mut self.notes,
        }
    }

    pub fn has_title(&self) -> bool {
        !self.title.value.trim().is_empty()
    }
}

impl Default for TaskForm {
    fn default() -> Self {
        TaskForm::new()
    }
}

impl DatePicker {
    pub fn from_date(date: NaiveDate) -> Self {
        DatePicker {
            year: date.year(),
            month: date.month(),
            day: date.day(),
        }
    }

    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
    }

    pub fn days_in_month(&self) -> u32 {
        days_in_month(self.year, self.month)
    }

    pub fn shift_month(&mut self, delta: i32) {
        let (year, month) = shift_month(self.year, self.month, delta);
        self.year = year;
        self.month = month;
        self.clamp_day();
    }

    pub fn shift_year(&mut self, delta: i32) {
        self.year += delta;
        self.clamp_day();
    }

    pub fn step_day(&mut self, delta: i32) {
        let last = self.days_in_month() as i32;
        self.day = (self.day as i32 + delta).clamp(1, last) as u32;
    }

    // a step that would leave the month is ignored
    pub fn step_week(&mut self, delta: i32) {
        let target = self.day as i32 + delta * 7;
        if target >= 1 && target <= self.days_in_month() as i32 {
            self.day = target as u32;
        }
    }

    fn clamp_day(&mut self) {
        self.day = self.day.clamp(1, self.days_in_month());
    }
}

impl RuleEditor {
    pub fn for_task(task: &Task) -> Self {
        let mut rule = task
            .recurrence_rule
            .clone()
            .unwrap_or_else(|| RecurrenceRule::new(Frequency::None, 1));
        rule.interval = rule.effective_interval() as i32;
        let weekday_cursor = task
            .date
            .as_ref()
            .map(|d| weekday_index(calendar::normalize(d).weekday()))
            .unwrap_or(0);
        RuleEditor {
            rule,
            focus: RuleFocus::Frequency,
            weekday_cursor,
        }
    }

    fn weekly(&self) -> bool {
        self.rule.freq == Frequency::Weekly
    }

    pub fn next_focus(&mut self) {
        self.focus = match self.focus {
            RuleFocus::Frequency => RuleFocus::Interval,
            RuleFocus::Interval if self.weekly() => RuleFocus::Weekdays,
            RuleFocus::Interval | RuleFocus::Weekdays => RuleFocus::Frequency,
        };
    }

    pub fn step_frequency(&mut self, delta: i32) {
        self.rule.freq = self.rule.freq.step(delta);
    }

    pub fn step_interval(&mut self, delta: i32) {
        self.rule.interval = (self.rule.interval + delta).max(1);
    }

    pub fn move_weekday_cursor(&mut self, delta: i32) {
        self.weekday_cursor = (self.weekday_cursor as i32 + delta).clamp(0, 6) as usize;
    }

    pub fn cursor_weekday(&self) -> Weekday {
        weekday_from_index(self.weekday_cursor)
    }

    pub fn toggle_weekday(&mut self) {
        if self.focus == RuleFocus::Weekdays && self.weekly() {
            let weekday = self.cursor_weekday();
            self.rule.toggle_weekday(weekday);
        }
    }

    pub fn horizontal(&mut self, delta: i32) {
        match self.focus {
            RuleFocus::Frequency => self.step_frequency(delta),
            RuleFocus::Weekdays => self.move_weekday_cursor(delta),
            RuleFocus::Interval => {}
        }
    }

    pub fn finish(mut self, start: Option<NaiveDate>) -> Option<RecurrenceRule> {
        if self.weekly() && self.rule.weekdays.is_empty() {
            if let Some(start) = start {
                self.rule.weekdays.push(start.weekday());
            }
        }
        self.rule.normalized()
    }
}

fn prev_char(cursor: usize, text: &str) -> usize {
    if cursor == 0 {
        return 0;
    }
    let mut prev = 0;
    for (idx, _) in text.char_indices() {
        if idx >= cursor {
            break;
        }
        prev = idx;
    }
    prev
}

fn next_char(cursor: usize, text: &str) -> usize {
    for (idx, ch) in text.char_indices() {
        if idx > cursor {
            return idx;
        }
        if idx == cursor {
            return cursor + ch.len_utf8();
        }
    }
    text.len()
}

fn line_state(text: &str, cursor: usize) -> (Vec<usize>, usize, usize) {
    let mut starts = vec![0];
    for (idx, ch) in text.char_indices() {
        if ch == '\n' {
            starts.push(idx + 1);
        }
    }
    let line_idx = starts
        .iter()
        .rposition(|start| *start <= cursor)
        .unwrap_or(0);
    let col = text[starts[line_idx]..cursor].chars().count();
    (starts, line_idx, col)
}

fn index_at_col(text: &str, start: usize, target_col: usize) -> usize {
    let slice = &text[start..];
    let limit = slice.find('\n').unwrap_or(slice.len());
    slice[..limit]
        .char_indices()
        .nth(target_col)
        .map(|(idx, _)| start + idx)
        .unwrap_or(start + limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::midnight;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn text_field_edits_at_cursor() {
        let mut field = TextField::new("héllo");
        field.move_left();
        field.move_left();
        field.insert_char('X');
        assert_eq!(field.value, "hélXlo");
        field.backspace();
        field.backspace();
        assert_eq!(field.value, "hélo");
        field.home();
        field.delete();
        assert_eq!(field.value, "élo");
        field.end();
        assert_eq!(field.cursor, field.value.len());
        assert_eq!(field.with_caret(), "élo▌");
    }

    #[test]
    fn text_field_moves_between_lines() {
        let mut field = TextField::new("first line\nab");
        field.move_up();
        assert_eq!(field.cursor, 2);
        field.move_down();
        assert_eq!(field.cursor, field.value.len());
        field.move_down();
        assert_eq!(field.cursor, field.value.len());
    }

    #[test]
    fn form_tab_toggles_between_two_fields() {
        let mut form = TaskForm::new();
        form.active_field_mut().insert_char('a');
        form.toggle_focus();
        form.active_field_mut().insert_char('b');
        form.toggle_focus();
        assert_eq!(form.focus, FormField::Title);
        assert_eq!(form.title.value, "a");
        assert_eq!(form.notes.value, "b");
    }

    #[test]
    fn picker_month_navigation_clamps_day() {
        let mut picker = DatePicker::from_date(date(2024, 3, 31));
        picker.shift_month(1);
        assert_eq!((picker.year, picker.month, picker.day), (2024, 4, 30));
        picker.shift_month(-2);
        assert_eq!((picker.year, picker.month, picker.day), (2024, 2, 29));
        picker.shift_year(-1);
        assert_eq!((picker.year, picker.month, picker.day), (2023, 2, 28));
    }

    #[test]
    fn picker_wraps_year_at_month_boundary() {
        let mut picker = DatePicker::from_date(date(2024, 12, 15));
        picker.shift_month(1);
        assert_eq!((picker.year, picker.month), (2025, 1));
        picker.shift_month(-1);
        assert_eq!((picker.year, picker.month), (2024, 12));
    }

    #[test]
    fn picker_day_steps_stay_in_month() {
        let mut picker = DatePicker::from_date(date(2024, 4, 1));
        picker.step_day(-1);
        assert_eq!(picker.day, 1);
        picker.step_week(-1);
        assert_eq!(picker.day, 1);
        picker.step_week(1);
        assert_eq!(picker.day, 8);
        picker.day = 30;
        picker.step_day(1);
        assert_eq!(picker.day, 30);
        picker.step_week(1);
        assert_eq!(picker.day, 30);
        assert_eq!(picker.date(), Some(date(2024, 4, 30)));
    }

    #[test]
    fn rule_editor_seeds_default_rule() {
        let task = Task::new("t", "", Some(midnight(date(2024, 1, 3))), false);
        let editor = RuleEditor::for_task(&task);
        assert_eq!(editor.rule, RecurrenceRule::new(Frequency::None, 1));
        assert_eq!(editor.focus, RuleFocus::Frequency);
        assert_eq!(editor.cursor_weekday(), Weekday::Wed);
    }

    #[test]
    fn rule_editor_controls() {
        let task = Task::new("t", "", Some(midnight(date(2024, 1, 1))), false);
        let mut editor = RuleEditor::for_task(&task);
        editor.horizontal(-1);
        assert_eq!(editor.rule.freq, Frequency::None);
        editor.horizontal(1);
        editor.horizontal(1);
        assert_eq!(editor.rule.freq, Frequency::Weekly);
        editor.next_focus();
        editor.step_interval(-1);
        assert_eq!(editor.rule.interval, 1);
        editor.step_interval(2);
        assert_eq!(editor.rule.interval, 3);
        editor.next_focus();
        assert_eq!(editor.focus, RuleFocus::Weekdays);
        editor.horizontal(2);
        editor.toggle_weekday();
        assert_eq!(editor.rule.weekdays, vec![Weekday::Wed]);
        editor.toggle_weekday();
        assert!(editor.rule.weekdays.is_empty());
        editor.next_focus();
        assert_eq!(editor.focus, RuleFocus::Frequency);
    }

    #[test]
    fn rule_editor_skips_weekday_row_unless_weekly() {
        let task = Task::new("t", "", None, true);
        let mut editor = RuleEditor::for_task(&task);
        editor.step_frequency(1);
        editor.next_focus();
        editor.next_focus();
        assert_eq!(editor.focus, RuleFocus::Frequency);
    }

    #[test]
    fn finishing_weekly_rule_defaults_weekday() {
        let task = Task::new("t", "", Some(midnight(date(2024, 1, 1))), false);
        let mut editor = RuleEditor::for_task(&task);
        editor.step_frequency(2);
        let rule = editor.finish(Some(date(2024, 1, 1))).unwrap();
        assert_eq!(rule.weekdays, vec![Weekday::Mon]);

        let none = RuleEditor::for_task(&task).finish(Some(date(2024, 1, 1)));
        assert_eq!(none, None);
    }
}
