use crate::ansi;
use crate::calendar;
use crate::config::Config;
use crate::render::render;
use crate::state::App;
use crate::storage::Store;
use crate::style::Theme;
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::widgets::Paragraph;
use ratatui::Terminal;
use std::io::{stdout, Stdout};
use std::time::Duration;
use tracing::{debug, info};

pub fn run(store: Store, config: &Config, theme: &Theme) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let mut app = App::new(store, calendar::today());
    let size = terminal.size()?;
    app.resize(size.width, size.height);
    info!(width = size.width, height = size.height, "interactive session started");
    let result = event_loop(&mut app, &mut terminal, config, theme);
    teardown_terminal(&mut terminal)?;
    info!("interactive session ended");
    result
}

fn event_loop<B: Backend>(
    app: &mut App,
    terminal: &mut Terminal<B>,
    config: &Config,
    theme: &Theme,
) -> Result<()> {
    loop {
        terminal.draw(|f| draw(f, app, config, theme))?;
        if !event::poll(Duration::from_millis(500))? {
            continue;
        }
        match event::read()? {
            Event::Key(key) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                app.state.today = calendar::today();
                if app.handle_key(key) {
                    break;
                }
            }
            Event::Resize(width, height) => {
                debug!(width, height, "terminal resized");
                app.resize(width, height);
            }
            _ => {}
        }
    }
    Ok(())
}

fn draw(f: &mut ratatui::Frame<'_>, app: &App, config: &Config, theme: &Theme) {
    let lines = render(&app.state, &app.store.tasks, theme, &config.layout);
    f.render_widget(Paragraph::new(ansi::to_text(&lines)), f.size());
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn teardown_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::tests::test_app;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::backend::TestBackend;
    use tempfile::TempDir;

    fn render_to_string(app: &App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        let config = Config::default();
        let theme = Theme::default();
        terminal.draw(|f| draw(f, app, &config, &theme)).unwrap();
        let buf = terminal.backend().buffer().clone();
        buf.content
            .chunks(buf.area.width as usize)
            .map(|row| {
                let line: String = row.iter().map(|cell| cell.symbol()).collect();
                line.trim_end().to_string()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn draws_the_week_into_the_terminal_buffer() {
        let dir = TempDir::new().unwrap();
        let app = test_app(&dir);
        let screen = render_to_string(&app, 180, 50);
        assert!(screen.contains("weekplan"));
        assert!(screen.contains("Monday, Jan 01"));
        assert!(screen.contains("SOMEDAY"));
    }

    #[test]
    fn draws_open_dialog_on_top() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir);
        app.handle_key(KeyEvent::new(KeyCode::Char('n'), KeyModifiers::NONE));
        let screen = render_to_string(&app, 180, 50);
        assert!(screen.contains("Add task to Monday"));
    }
}
