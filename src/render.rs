use crate::calendar::{self, month_name, weekday_from_index, weekday_short, DAYS_PER_WEEK};
use crate::compose::{
    block_width, center, center_line, dim, fit_to_width, join_horizontal, overlay_lines,
    pad_to_width, truncate_to_width, visual_width,
};
use crate::config::LayoutConfig;
use crate::form::{DatePicker, FormField, RuleEditor, RuleFocus, TaskForm, TextField};
use crate::model::{Frequency, TaskId, TaskList};
use crate::recurrence::{self, tasks_for_day, DaySlot};
use crate::state::{Mode, ViewState};
use crate::style::{Paint, Theme};
use chrono::{Datelike, Duration, NaiveDate};

pub const APP_NAME: &str = "weekplan";
const FIELD_WIDTH: usize = 40;
const NOTES_ROWS: usize = 3;

const BROWSE_HELP: &[(&str, &str)] = &[
    ("← →", "day"),
    ("↑ ↓", "task"),
    ("space", "toggle"),
    ("n", "add"),
    ("e", "edit"),
    ("i", "details"),
    ("m", "move"),
    ("r", "repeat"),
    ("x", "delete"),
    ("[ ]", "week"),
    ("q", "quit"),
];

struct Border {
    top_left: char,
    top_right: char,
    bottom_left: char,
    bottom_right: char,
    horizontal: char,
    vertical: char,
}

const ROUNDED: Border = Border {
    top_left: '╭',
    top_right: '╮',
    bottom_left: '╰',
    bottom_right: '╯',
    horizontal: '─',
    vertical: '│',
};

pub fn grid_shape(width: u16, layout: &LayoutConfig) -> (usize, usize) {
    let per_row = (width / layout.column_width.max(1)) as usize;
    if per_row <= 2 {
        (2, layout.compact_column_height as usize)
    } else {
        (
            per_row.min(layout.max_columns_per_row as usize),
            layout.column_height as usize,
        )
    }
}

pub fn scroll_window(len: usize, capacity: usize, cursor: Option<usize>) -> (usize, usize) {
    if len <= capacity {
        return (0, len);
    }
    match cursor {
        Some(cursor) => {
            let mut start = cursor.saturating_sub(capacity / 2);
            let mut end = start + capacity;
            if end > len {
                end = len;
                start = end - capacity;
            }
            (start, end)
        }
        None => (0, capacity),
    }
}

pub fn render(state: &ViewState, tasks: &TaskList, theme: &Theme, layout: &LayoutConfig) -> Vec<String> {
    let view = main_view(state, tasks, theme, layout);
    let dialog = match &state.mode {
        Mode::Browsing => None,
        Mode::AddingTask(form) => Some(add_dialog(state, form, theme)),
        Mode::EditingTask { form, .. } => Some(edit_dialog(state, form, theme)),
        Mode::ConfirmingDelete { .. } => Some(delete_dialog(theme)),
        Mode::ViewingDetails { task_id } => details_dialog(state, tasks, task_id, theme),
        Mode::ChoosingMoveAction { .. } => Some(move_dialog(theme)),
        Mode::PickingDate { picker, .. } => Some(picker_dialog(state.today, picker, theme)),
        Mode::SettingRecurrence { editor, .. } => Some(recurrence_dialog(editor, theme)),
    };
    match dialog {
        Some(panel) => {
            let background: Vec<String> = view.iter().map(|line| dim(line)).collect();
            let (x, y) = center(
                block_width(&background),
                background.len(),
                block_width(&panel),
                panel.len(),
            );
            overlay_lines(&background, &panel, x, y)
        }
        None => view,
    }
}

fn main_view(state: &ViewState, tasks: &TaskList, theme: &Theme, layout: &LayoutConfig) -> Vec<String> {
    let (per_row, column_height) = grid_shape(state.width, layout);
    let column_width = layout.column_width as usize;

    let mut lines = vec![header_line(state.week_start, theme)];
    let days: Vec<usize> = (0..=DAYS_PER_WEEK).collect();
    for row in days.chunks(per_row) {
        let blocks: Vec<Vec<String>> = row
            .iter()
            .map(|day| day_column(state, tasks, *day, column_width, column_height, theme))
            .collect();
        lines.extend(join_horizontal(&blocks));
    }
    lines.push(String::new());
    let width = if state.width > 0 {
        state.width as usize
    } else {
        block_width(&lines)
    };
    lines.extend(footer_lines(width, theme));
    if !state.status.is_empty() {
        lines.push(theme.value().paint(&truncate_to_width(&state.status, width)));
    }
    lines
}

fn header_line(week_start: NaiveDate, theme: &Theme) -> String {
    let week_end = week_start + Duration::days(6);
    format!(
        "{}  {} - {} ",
        theme.header().paint(&format!(" {} ", APP_NAME)),
        week_start.format("%b %d"),
        week_end.format("%b %d, %Y")
    )
}

fn footer_lines(width: usize, theme: &Theme) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0;
    for (keys, label) in BROWSE_HELP {
        let item_width = visual_width(keys) + 1 + visual_width(label);
        let sep = if current_width == 0 { 0 } else { 3 };
        if current_width > 0 && current_width + sep + item_width > width {
            lines.push(std::mem::take(&mut current));
            current_width = 0;
        }
        if current_width > 0 {
            current.push_str(&theme.hint().paint(" • "));
            current_width += 3;
        }
        current.push_str(&theme.choice().paint(keys));
        current.push(' ');
        current.push_str(&theme.footer().paint(label));
        current_width += item_width;
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn day_label(state: &ViewState, day: usize) -> (String, bool) {
    match state.slot(day) {
        DaySlot::Someday => ("SOMEDAY".to_string(), false),
        DaySlot::Date(date) => (date.format("%A, %b %d").to_string(), date == state.today),
    }
}

fn day_column(
    state: &ViewState,
    tasks: &TaskList,
    day: usize,
    width: usize,
    height: usize,
    theme: &Theme,
) -> Vec<String> {
    let (label, is_today) = day_label(state, day);
    let focused = state.cursor_day == day;
    let border = if focused {
        Paint::new().fg(theme.secondary)
    } else if is_today {
        Paint::new().fg(theme.today)
    } else {
        Paint::new().fg(theme.muted)
    };

    let inner = width.saturating_sub(2);
    let rows = height.saturating_sub(2);
    let mut content = vec![format!(" {}", theme.badge().paint(&format!(" {} ", label)))];

    let day_tasks = tasks_for_day(tasks, state.slot(day));
    if day_tasks.is_empty() {
        content.push(String::new());
        content.push(theme.hint().italic().paint("  (No tasks)"));
    } else {
        let capacity = height.saturating_sub(6).max(1);
        let cursor = if focused { Some(state.cursor_idx) } else { None };
        let (start, end) = scroll_window(day_tasks.len(), capacity, cursor);
        content.push(if start > 0 {
            theme.hint().paint(&format!("  ↑ +{} more", start))
        } else {
            String::new()
        });
        for (idx, entry) in day_tasks.iter().enumerate().take(end).skip(start) {
            let check = if entry.done { "[✔]" } else { "[ ]" };
            let line = truncate_to_width(
                &format!("{} {}", check, entry.task.title),
                width.saturating_sub(7),
            );
            if focused && idx == state.cursor_idx {
                content.push(theme.highlight().paint(&format!("> {}", line)));
            } else if entry.done {
                content.push(format!("  {}", theme.hint().paint(&line)));
            } else {
                content.push(format!("  {}", line));
            }
        }
        if end < day_tasks.len() {
            content.push(theme.hint().paint(&format!("  ↓ +{} more", day_tasks.len() - end)));
        }
    }

    let body: Vec<String> = (0..rows)
        .map(|i| content.get(i).map(String::as_str).unwrap_or(""))
        .map(|line| fit_to_width(line, inner))
        .collect();
    frame(&body, inner, &ROUNDED, border)
}

fn frame(body: &[String], inner: usize, border: &Border, paint: Paint) -> Vec<String> {
    let bar: String = std::iter::repeat(border.horizontal).take(inner).collect();
    let side = paint.paint(&border.vertical.to_string());
    let mut out = Vec::with_capacity(body.len() + 2);
    out.push(paint.paint(&format!("{}{}{}", border.top_left, bar, border.top_right)));
    for line in body {
        out.push(format!("{}{}{}", side, line, side));
    }
    out.push(paint.paint(&format!("{}{}{}", border.bottom_left, bar, border.bottom_right)));
    out
}

fn panel(content: Vec<String>, paint: Paint) -> Vec<String> {
    let width = block_width(&content);
    let inner = width + 4;
    let mut body = Vec::with_capacity(content.len() + 2);
    body.push(" ".repeat(inner));
    for line in &content {
        body.push(format!("  {}  ", pad_to_width(line, width)));
    }
    body.push(" ".repeat(inner));
    frame(&body, inner, &ROUNDED, paint)
}

fn centered(content: Vec<String>) -> Vec<String> {
    let width = block_width(&content);
    content.iter().map(|line| center_line(line, width)).collect()
}

fn cursor_day_name(state: &ViewState, format: &str) -> String {
    match state.current_slot() {
        DaySlot::Someday => "Someday".to_string(),
        DaySlot::Date(date) => date.format(format).to_string(),
    }
}

fn field_lines(field: &TextField, focused: bool, rows: usize, theme: &Theme) -> Vec<String> {
    let text = if focused {
        field.with_caret()
    } else {
        field.value.clone()
    };
    let mut lines: Vec<String> = text
        .split('\n')
        .map(|line| {
            let shown = truncate_to_width(line, FIELD_WIDTH);
            let paint = if focused {
                Paint::new().bg(theme.surface).fg(theme.text)
            } else {
                Paint::new().bg(theme.surface).fg(theme.muted)
            };
            paint.paint(&pad_to_width(&shown, FIELD_WIDTH))
        })
        .collect();
    while lines.len() < rows {
        lines.push(Paint::new().bg(theme.surface).paint(&" ".repeat(FIELD_WIDTH)));
    }
    lines
}

fn field_label(name: &str, focused: bool, theme: &Theme) -> String {
    if focused {
        theme.choice().paint(&format!("▶ {}", name))
    } else {
        theme.label().paint(&format!("  {}", name))
    }
}

fn form_body(form: &TaskForm, theme: &Theme) -> Vec<String> {
    let title_focus = form.focus == FormField::Title;
    let mut lines = vec![field_label("Title", title_focus, theme)];
    lines.extend(field_lines(&form.title, title_focus, 1, theme));
    lines.push(String::new());
    lines.push(field_label("Notes", !title_focus, theme));
    lines.extend(field_lines(&form.notes, !title_focus, NOTES_ROWS, theme));
    lines.push(String::new());
    if let Some(error) = &form.error {
        lines.push(theme.danger().paint(error));
    }
    lines
}

fn add_dialog(state: &ViewState, form: &TaskForm, theme: &Theme) -> Vec<String> {
    let mut content = vec![
        Paint::new().bold().paint(&format!("Add task to {}", cursor_day_name(state, "%A"))),
        String::new(),
    ];
    content.extend(form_body(form, theme));
    content.push(theme.footer().paint(
        "Tab: Switch, Enter (on Title): Save, Ctrl+S: Save, Esc: Cancel",
    ));
    panel(content, Paint::new().fg(theme.primary))
}

fn edit_dialog(state: &ViewState, form: &TaskForm, theme: &Theme) -> Vec<String> {
    let mut content = vec![
        Paint::new()
            .bg(theme.accent)
            .fg(theme.primary_fg)
            .bold()
            .paint(" EDITING TASK "),
        theme.hint().paint(&format!("On {}", cursor_day_name(state, "%A, %b %d"))),
        String::new(),
    ];
    content.extend(form_body(form, theme));
    content.push(theme.footer().paint("Tab: Switch, Enter/Ctrl+S: Save, Esc: Cancel"));
    panel(content, Paint::new().fg(theme.accent))
}

fn delete_dialog(theme: &Theme) -> Vec<String> {
    let content = centered(vec![
        theme.danger().paint("Enter to Delete Task"),
        Paint::new().bold().paint("Esc to Cancel"),
    ]);
    panel(content, Paint::new().fg(theme.destructive))
}

fn details_dialog(state: &ViewState, tasks: &TaskList, task_id: &TaskId, theme: &Theme) -> Option<Vec<String>> {
    let task = tasks.find(task_id).ok()?;
    let slot = state.current_slot();
    let status = if recurrence::is_done_in(task, slot) {
        Paint::new().fg(theme.secondary).paint("Completed ✔")
    } else {
        Paint::new().fg(theme.destructive).paint("In Progress")
    };
    let scheduled = match (&task.date, task.is_someday) {
        (_, true) => Paint::new().fg(theme.accent).paint("Someday Drawer"),
        (Some(date), false) => calendar::normalize(date).format("%A, %b %d, %Y").to_string(),
        (None, false) => theme.hint().paint("Unscheduled"),
    };
    let repeats = match &task.recurrence_rule {
        Some(rule) => rule.describe(),
        None => "does not repeat".to_string(),
    };

    let mut content = vec![
        theme.badge().paint(" TASK DETAILS "),
        Paint::new().bold().paint(&truncate_to_width(&task.title, 60)),
        String::new(),
        format!("{} {}", theme.label().paint("Status:"), status),
        format!("{} {}", theme.label().paint("Scheduled:"), scheduled),
        format!("{} {}", theme.label().paint("Repeats:"), repeats),
        format!("{} {}", theme.label().paint("ID:"), theme.hint().paint(&task.short_id())),
        String::new(),
        theme.label().paint("Notes:"),
    ];
    if task.notes.is_empty() {
        content.push(theme.hint().paint("  No notes provided."));
    } else {
        content.extend(
            task.notes
                .split('\n')
                .map(|line| format!("  {}", truncate_to_width(line, 60))),
        );
    }
    content.push(String::new());
    content.push(theme.footer().paint("e to edit, Esc to close"));
    Some(panel(content, Paint::new().fg(theme.primary)))
}

fn move_dialog(theme: &Theme) -> Vec<String> {
    let choice = |key: &str, what: &str| format!("Press {} to {}", theme.choice().paint(key), what);
    let content = centered(vec![
        Paint::new().bold().paint("MOVE TASK"),
        String::new(),
        choice("t", "move to Today"),
        choice("s", "move to Someday"),
        choice("c", "choose a Date"),
        String::new(),
        theme.hint().paint("(esc to cancel)"),
    ]);
    panel(content, Paint::new().fg(theme.primary))
}

fn picker_dialog(today: NaiveDate, picker: &DatePicker, theme: &Theme) -> Vec<String> {
    let mut content = vec![
        Paint::new()
            .fg(theme.primary)
            .bold()
            .paint(&format!("{} {}", month_name(picker.month), picker.year)),
        (0..DAYS_PER_WEEK)
            .map(|i| theme.label().paint(&format!("{:<4}", weekday_short(weekday_from_index(i)))))
            .collect::<String>(),
    ];

    let offset = NaiveDate::from_ymd_opt(picker.year, picker.month, 1)
        .map(|first| calendar::weekday_index(first.weekday()))
        .unwrap_or(0);
    let mut row = "    ".repeat(offset);
    let mut column = offset;
    for day in 1..=picker.days_in_month() {
        let cell = format!("{:>2}", day);
        let is_today = NaiveDate::from_ymd_opt(picker.year, picker.month, day) == Some(today);
        let styled = if day == picker.day {
            theme.active_button().paint(&cell)
        } else if is_today {
            Paint::new().fg(theme.today).bold().paint(&cell)
        } else {
            theme.value().paint(&cell)
        };
        row.push_str(&styled);
        row.push_str("  ");
        column += 1;
        if column == DAYS_PER_WEEK {
            content.push(std::mem::take(&mut row));
            column = 0;
        }
    }
    if !row.is_empty() {
        content.push(row);
    }
    content.push(String::new());
    content.push(theme.footer().paint("←→↑↓: Nav, [ ]: Month, PgDn/PgUp: Year"));
    content.push(theme.footer().paint("Enter: Pick, Esc: Close"));
    panel(content, Paint::new().fg(theme.primary))
}

fn recurrence_dialog(editor: &RuleEditor, theme: &Theme) -> Vec<String> {
    let rule = &editor.rule;
    let freq_focus = editor.focus == RuleFocus::Frequency;
    let buttons: String = Frequency::ALL
        .iter()
        .map(|freq| {
            if *freq == rule.freq {
                let label = if freq_focus {
                    format!(" ▶ {} ", freq.label())
                } else {
                    format!(" {} ", freq.label())
                };
                theme.active_button().paint(&label)
            } else {
                theme.inactive_button().paint(&format!(" {} ", freq.label()))
            }
        })
        .collect::<Vec<_>>()
        .join(" ");

    let interval = format!("Repeat every: [ {} ] {}", rule.interval, rule.freq.unit());
    let interval = if editor.focus == RuleFocus::Interval {
        theme.highlight().paint(&interval)
    } else {
        interval
    };

    let mut content = vec![
        Paint::new().bold().paint("RECURRENCE SETTINGS"),
        String::new(),
        theme.label().paint("Frequency:"),
        buttons,
        String::new(),
        interval,
    ];

    if rule.freq == Frequency::Weekly {
        let days_focus = editor.focus == RuleFocus::Weekdays;
        let row: String = (0..DAYS_PER_WEEK)
            .map(|i| {
                let weekday = weekday_from_index(i);
                let cell = format!(" {} ", weekday_short(weekday));
                let mut paint = if rule.has_weekday(weekday) {
                    theme.active_button()
                } else {
                    theme.inactive_button()
                };
                if days_focus && i == editor.weekday_cursor {
                    paint = paint.underline().bold();
                }
                paint.paint(&cell)
            })
            .collect::<Vec<_>>()
            .join(" ");
        content.push(String::new());
        content.push(if days_focus {
            theme.choice().paint("▶ On:")
        } else {
            theme.label().paint("On:")
        });
        content.push(row);
    }

    content.push(String::new());
    content.push(theme.hint().paint(&rule.describe()));
    content.push(String::new());
    content.push(theme.footer().paint("Tab: Move, ←→↑↓: Change, Space: Day, Enter: Save, Esc: Cancel"));
    panel(content, Paint::new().fg(theme.primary))
}
