use crate::calendar::{self, midnight, weekday_index, DAYS_PER_WEEK, SOMEDAY_SLOT};
use crate::form::{DatePicker, FormField, RuleEditor, RuleFocus, TaskForm};
use crate::model::{Task, TaskId};
use crate::recurrence::{self, tasks_for_day, DaySlot, DayTask};
use crate::storage::Store;
use chrono::{Datelike, Duration, NaiveDate};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{debug, error, info};

#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    Browsing,
    AddingTask(TaskForm),
    ConfirmingDelete { task_id: TaskId },
    ViewingDetails { task_id: TaskId },
    EditingTask { task_id: TaskId, form: TaskForm },
    ChoosingMoveAction { task_id: TaskId },
    PickingDate { task_id: TaskId, picker: DatePicker },
    SettingRecurrence { task_id: TaskId, editor: RuleEditor },
}

#[derive(Debug, Clone)]
pub struct ViewState {
    pub mode: Mode,
    pub cursor_day: usize,
    pub cursor_idx: usize,
    pub week_start: NaiveDate,
    pub today: NaiveDate,
    pub width: u16,
    pub height: u16,
    pub status: String,
}

pub struct App {
    pub store: Store,
    pub state: ViewState,
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Browsing => "browsing",
            Mode::AddingTask(_) => "adding",
            Mode::ConfirmingDelete { .. } => "confirm-delete",
            Mode::ViewingDetails { .. } => "details",
            Mode::EditingTask { .. } => "editing",
            Mode::ChoosingMoveAction { .. } => "move",
            Mode::PickingDate { .. } => "pick-date",
            Mode::SettingRecurrence { .. } => "recurrence",
        }
    }
}

impl ViewState {
    pub fn new(today: NaiveDate) -> Self {
        ViewState {
            mode: Mode::Browsing,
            cursor_day: weekday_index(today.weekday()),
            cursor_idx: 0,
            week_start: calendar::week_start(today),
            today,
            width: 0,
            height: 0,
            status: String::new(),
        }
    }

    pub fn slot(&self, day: usize) -> DaySlot {
        if day >= SOMEDAY_SLOT {
            DaySlot::Someday
        } else {
            DaySlot::Date(self.week_start + Duration::days(day as i64))
        }
    }

    pub fn current_slot(&self) -> DaySlot {
        self.slot(self.cursor_day)
    }
}

impl App {
    pub fn new(store: Store, today: NaiveDate) -> Self {
        let mut state = ViewState::new(today);
        state.status = format!(
            "Loaded {} tasks from {}",
            store.tasks.len(),
            store.location.path.display()
        );
        App { store, state }
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.state.width = width;
        self.state.height = height;
    }

    pub fn visible_tasks(&self) -> Vec<DayTask<'_>> {
        tasks_for_day(&self.store.tasks, self.state.current_slot())
    }

    pub fn selected_id(&self) -> Option<TaskId> {
        self.visible_tasks()
            .get(self.state.cursor_idx)
            .map(|d| d.task.id)
    }

    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.store.tasks.find(id).ok()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return true;
        }
        let before = self.state.mode.name();
        let quit = match self.state.mode {
            Mode::Browsing => self.handle_browsing_key(key),
            Mode::AddingTask(_) | Mode::EditingTask { .. } => {
                self.handle_form_key(key);
                false
            }
            Mode::ConfirmingDelete { .. } => {
                self.handle_confirm_key(key);
                false
            }
            Mode::ViewingDetails { .. } => {
                self.handle_details_key(key);
                false
            }
            Mode::ChoosingMoveAction { .. } => {
                self.handle_move_key(key);
                false
            }
            Mode::PickingDate { .. } => {
                self.handle_picker_key(key);
                false
            }
            Mode::SettingRecurrence { .. } => {
                self.handle_recurrence_key(key);
                false
            }
        };
        let after = self.state.mode.name();
        if before != after {
            debug!(from = before, to = after, "mode changed");
        }
        quit
    }

    fn handle_browsing_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Left | KeyCode::Char('h') => {
                if self.state.cursor_day > 0 {
                    self.state.cursor_day -= 1;
                    self.state.cursor_idx = 0;
                }
            }
            KeyCode::Right | KeyCode::Char('l') => {
                if self.state.cursor_day < DAYS_PER_WEEK {
                    self.state.cursor_day += 1;
                    self.state.cursor_idx = 0;
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.state.cursor_idx = self.state.cursor_idx.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.state.cursor_idx + 1 < self.visible_tasks().len() {
                    self.state.cursor_idx += 1;
                }
            }
            KeyCode::Char('[') => self.shift_week(-7),
            KeyCode::Char(']') => self.shift_week(7),
            KeyCode::Char('n') => {
                self.state.mode = Mode::AddingTask(TaskForm::new());
            }
            KeyCode::Char(' ') => self.toggle_selected(),
            KeyCode::Char('e') => {
                if let Some(task_id) = self.selected_id() {
                    self.start_editing(task_id);
                }
            }
            KeyCode::Char('x') | KeyCode::Delete | KeyCode::Backspace => {
                if let Some(task_id) = self.selected_id() {
                    self.state.mode = Mode::ConfirmingDelete { task_id };
                }
            }
            KeyCode::Char('i') | KeyCode::Enter => {
                if let Some(task_id) = self.selected_id() {
                    self.state.mode = Mode::ViewingDetails { task_id };
                }
            }
            KeyCode::Char('m') => {
                if let Some(task_id) = self.selected_id() {
                    self.state.mode = Mode::ChoosingMoveAction { task_id };
                }
            }
            KeyCode::Char('r') => {
                if let Some(task_id) = self.selected_id() {
                    if let Some(task) = self.task(&task_id) {
                        let editor = RuleEditor::for_task(task);
                        self.state.mode = Mode::SettingRecurrence { task_id, editor };
                    }
                }
            }
            _ => {}
        }
        false
    }

    fn shift_week(&mut self, days: i64) {
        self.state.week_start = self.state.week_start + Duration::days(days);
        self.ensure_bounds();
    }

    fn start_editing(&mut self, task_id: TaskId) {
        self.state.mode = match self.task(&task_id) {
            Some(task) => Mode::EditingTask {
                task_id,
                form: TaskForm::from_task(task),
            },
            None => Mode::Browsing,
        };
    }

    fn toggle_selected(&mut self) {
        let Some(task_id) = self.selected_id() else {
            return;
        };
        let slot = self.state.current_slot();
        self.store
            .tasks
            .update(&task_id, |task| recurrence::toggle_done_in(task, slot));
        info!(task_id = %task_id, ?slot, "toggled completion");
        self.persist("Toggled completion");
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        let mut mode = std::mem::replace(&mut self.state.mode, Mode::Browsing);
        let close = match &mut mode {
            Mode::AddingTask(form) => self.process_form_key(None, form, key),
            Mode::EditingTask { task_id, form } => {
                let id = *task_id;
                self.process_form_key(Some(id), form, key)
            }
            _ => true,
        };
        self.state.mode = if close { Mode::Browsing } else { mode };
    }

    fn process_form_key(&mut self, editing: Option<TaskId>, form: &mut TaskForm, key: KeyEvent) -> bool {
        let control = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => {
                self.state.status = "Canceled".into();
                return true;
            }
            KeyCode::Tab | KeyCode::BackTab => form.toggle_focus(),
            KeyCode::Enter if form.focus == FormField::Notes && !control => {
                form.active_field_mut().insert_char('\n');
            }
            KeyCode::Enter => return self.submit_form(editing, form),
            KeyCode::Char('s') if control => return self.submit_form(editing, form),
            KeyCode::Left => form.active_field_mut().move_left(),
            KeyCode::Right => form.active_field_mut().move_right(),
            KeyCode::Up => form.active_field_mut().move_up(),
            KeyCode::Down => form.active_field_mut().move_down(),
            KeyCode::Home => form.active_field_mut().home(),
            KeyCode::End => form.active_field_mut().end(),
            KeyCode::Backspace => form.active_field_mut().backspace(),
            KeyCode::Delete => form.active_field_mut().delete(),
            KeyCode::Char(c) => {
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
                {
                    form.active_field_mut().insert_char(c);
                    form.error = None;
                }
            }
            _ => {}
        }
        false
    }

    fn submit_form(&mut self, editing: Option<TaskId>, form: &mut TaskForm) -> bool {
        if !form.has_title() {
            form.error = Some("Title is required".into());
            return false;
        }
        let title = form.title.value.clone();
        let notes = form.notes.value.clone();
        match editing {
            None => self.create_task(&title, &notes),
            Some(task_id) => {
                if self.store.tasks.update_fields(&task_id, &title, &notes) {
                    info!(task_id = %task_id, "task updated");
                    self.persist(format!("Updated \"{}\"", title));
                } else {
                    self.state.status = "Task no longer exists".into();
                }
            }
        }
        true
    }

    fn create_task(&mut self, title: &str, notes: &str) {
        let (date, someday) = match self.state.current_slot() {
            DaySlot::Someday => (None, true),
            DaySlot::Date(date) => (Some(midnight(date)), false),
        };
        let task_id = self.store.tasks.add(title, notes, date, someday).id;
        info!(task_id = %task_id, someday, "task created");
        if let Some(idx) = self
            .visible_tasks()
            .iter()
            .position(|d| d.task.id == task_id)
        {
            self.state.cursor_idx = idx;
        }
        self.persist(format!("Added \"{}\"", title));
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) {
        let Mode::ConfirmingDelete { task_id } = self.state.mode else {
            return;
        };
        match key.code {
            KeyCode::Enter => {
                self.state.mode = Mode::Browsing;
                match self.store.tasks.remove(&task_id) {
                    Ok(task) => {
                        info!(task_id = %task_id, "task deleted");
                        self.ensure_bounds();
                        self.persist(format!("Deleted \"{}\"", task.title));
                    }
                    Err(err) => self.state.status = err.to_string(),
                }
            }
            KeyCode::Char('q') | KeyCode::Esc => {
                self.state.mode = Mode::Browsing;
                self.state.status = "Delete canceled".into();
            }
            _ => {}
        }
    }

    fn handle_details_key(&mut self, key: KeyEvent) {
        let Mode::ViewingDetails { task_id } = self.state.mode else {
            return;
        };
        match key.code {
            KeyCode::Char('e') => self.start_editing(task_id),
            KeyCode::Char('q') | KeyCode::Esc => self.state.mode = Mode::Browsing,
            _ => {}
        }
    }

    fn handle_move_key(&mut self, key: KeyEvent) {
        let Mode::ChoosingMoveAction { task_id } = self.state.mode else {
            return;
        };
        match key.code {
            KeyCode::Esc => self.state.mode = Mode::Browsing,
            KeyCode::Char('t') => {
                let today = midnight(self.state.today);
                self.store.tasks.update(&task_id, |task| {
                    task.is_someday = false;
                    task.date = Some(today);
                    recurrence::prune_completions(task);
                });
                info!(task_id = %task_id, "moved to today");
                self.state.mode = Mode::Browsing;
                self.ensure_bounds();
                self.persist("Moved to today");
            }
            KeyCode::Char('s') => {
                self.store.tasks.set_someday(&task_id, true);
                self.store.tasks.update_date(&task_id, None);
                info!(task_id = %task_id, "moved to someday");
                self.state.mode = Mode::Browsing;
                self.ensure_bounds();
                self.persist("Moved to someday");
            }
            KeyCode::Char('c') => {
                self.state.mode = Mode::PickingDate {
                    task_id,
                    picker: DatePicker::from_date(self.state.today),
                };
            }
            _ => {}
        }
    }

    fn handle_picker_key(&mut self, key: KeyEvent) {
        let Mode::PickingDate { task_id, mut picker } = self.state.mode else {
            return;
        };
        match key.code {
            KeyCode::Esc => {
                self.state.mode = Mode::Browsing;
                return;
            }
            KeyCode::Enter => {
                self.commit_picked_date(task_id, &picker);
                return;
            }
            KeyCode::Char(']') => picker.shift_month(1),
            KeyCode::Char('[') => picker.shift_month(-1),
            KeyCode::PageUp => picker.shift_year(1),
            KeyCode::PageDown => picker.shift_year(-1),
            KeyCode::Left | KeyCode::Char('h') => picker.step_day(-1),
            KeyCode::Right | KeyCode::Char('l') => picker.step_day(1),
            KeyCode::Up | KeyCode::Char('k') => picker.step_week(-1),
            KeyCode::Down | KeyCode::Char('j') => picker.step_week(1),
            _ => {}
        }
        self.state.mode = Mode::PickingDate { task_id, picker };
    }

    fn commit_picked_date(&mut self, task_id: TaskId, picker: &DatePicker) {
        self.state.mode = Mode::Browsing;
        let Some(date) = picker.date() else {
            return;
        };
        let found = self.store.tasks.update(&task_id, |task| {
            task.date = Some(midnight(date));
            task.is_someday = false;
            if let Some(rule) = task.recurrence_rule.as_mut() {
                recurrence::retarget_rule(rule, date);
            }
            recurrence::prune_completions(task);
        });
        if !found {
            self.state.status = "Task no longer exists".into();
            return;
        }
        info!(task_id = %task_id, date = %date, "moved to date");
        self.ensure_bounds();
        self.persist(format!("Moved to {}", calendar::to_iso(date)));
    }

    fn handle_recurrence_key(&mut self, key: KeyEvent) {
        let mode = std::mem::replace(&mut self.state.mode, Mode::Browsing);
        let Mode::SettingRecurrence { task_id, mut editor } = mode else {
            return;
        };
        match key.code {
            KeyCode::Esc => return,
            KeyCode::Enter => {
                self.save_rule(task_id, editor);
                return;
            }
            KeyCode::Tab => editor.next_focus(),
            KeyCode::Left | KeyCode::Char('h') => editor.horizontal(-1),
            KeyCode::Right | KeyCode::Char('l') => editor.horizontal(1),
            KeyCode::Up | KeyCode::Char('k') => {
                if editor.focus == RuleFocus::Interval {
                    editor.step_interval(1);
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if editor.focus == RuleFocus::Interval {
                    editor.step_interval(-1);
                }
            }
            KeyCode::Char(' ') => editor.toggle_weekday(),
            _ => {}
        }
        self.state.mode = Mode::SettingRecurrence { task_id, editor };
    }

    fn save_rule(&mut self, task_id: TaskId, editor: RuleEditor) {
        let Some(task) = self.task(&task_id) else {
            self.state.status = "Task no longer exists".into();
            return;
        };
        let start = task.date.as_ref().map(calendar::normalize);
        let rule = editor.finish(start);
        let description = rule
            .as_ref()
            .map(|r| r.describe())
            .unwrap_or_else(|| "does not repeat".into());
        self.store.tasks.set_recurrence_rule(&task_id, rule);
        self.store
            .tasks
            .update(&task_id, recurrence::prune_completions);
        info!(task_id = %task_id, rule = %description, "recurrence updated");
        self.ensure_bounds();
        self.persist(format!("Repeats: {}", description));
    }

    pub fn ensure_bounds(&mut self) {
        let len = self.visible_tasks().len();
        self.state.cursor_idx = if len == 0 {
            0
        } else {
            self.state.cursor_idx.min(len - 1)
        };
    }

    // a failed save is shown on the status line and never aborts the UI
    fn persist(&mut self, message: impl Into<String>) {
        match self.store.persist() {
            Ok(()) => self.state.status = message.into(),
            Err(err) => {
                error!(error = %format!("{:#}", err), "save failed");
                self.state.status = format!("Save failed: {:#}", err);
            }
        }
    }
}
