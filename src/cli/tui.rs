//! Ratatui front end: article list, now-playing panel with the progress
//! estimate, and a toast line for notifications.

use super::shortcuts::{self, UiAction};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io::{self, stdout};
use std::time::{Duration, Instant};
use wingoo_reader::ambient::ToneBed;
use wingoo_reader::notify::{Notification, ToastBoard};
use wingoo_reader::speech::EspeakEngine;
use wingoo_reader::{Article, PlaybackController, PlaybackMode, PlaybackState, Severity};

pub type Reader = PlaybackController<EspeakEngine, ToneBed, ToastBoard>;

const VOLUME_STEP: f32 = 0.05;

/// TUI application state
pub struct App {
    pub articles: Vec<Article>,
    pub selected: usize,
    pub toasts: ToastBoard,
}

impl App {
    pub fn new(articles: Vec<Article>, toasts: ToastBoard) -> Self {
        Self {
            articles,
            selected: 0,
            toasts,
        }
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_next(&mut self) {
        if !self.articles.is_empty() {
            self.selected = (self.selected + 1).min(self.articles.len() - 1);
        }
    }
}

/// Restore terminal to normal state.
///
/// This function is safe to call multiple times and handles errors gracefully.
fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
}

/// Run the UI until the user quits.
pub fn run_tui_loop(reader: &mut Reader, app: &mut App) -> io::Result<()> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        restore_terminal();
        original_hook(panic_info);
    }));

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    let frame_duration = Duration::from_millis(33); // ~30 FPS

    loop {
        let frame_start = Instant::now();

        if event::poll(Duration::from_millis(10))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && !handle_key(reader, app, key.code) {
                    break;
                }
            }
        }

        reader.pump(Instant::now());

        terminal.draw(|f| draw_ui(f, reader, app))?;

        let frame_time = frame_start.elapsed();
        if frame_time < frame_duration {
            std::thread::sleep(frame_duration - frame_time);
        }
    }

    reader.stop();

    let _ = std::panic::take_hook();
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    Ok(())
}

/// Returns `false` when the user asked to quit.
fn handle_key(reader: &mut Reader, app: &mut App, code: crossterm::event::KeyCode) -> bool {
    if let Some(command) = shortcuts::transport_command(code) {
        // Failures have already been reported through the toast board.
        if let Err(e) = reader.dispatch(command) {
            tracing::debug!(?command, error = %e, "shortcut rejected");
        }
        return true;
    }

    let Some(action) = shortcuts::ui_action(code) else {
        return true;
    };
    let result = match action {
        UiAction::Quit => return false,
        UiAction::SelectPrevious => {
            app.select_previous();
            Ok(())
        }
        UiAction::SelectNext => {
            app.select_next();
            Ok(())
        }
        UiAction::PlaySelected => match app.articles.get(app.selected) {
            Some(article) => reader.play_article(article.clone()),
            None => Ok(()),
        },
        UiAction::PlayAll => reader.play_all(app.articles.clone()),
        UiAction::VolumeUp => {
            reader.set_volume(reader.volume() + VOLUME_STEP);
            Ok(())
        }
        UiAction::VolumeDown => {
            reader.set_volume(reader.volume() - VOLUME_STEP);
            Ok(())
        }
    };
    if let Err(e) = result {
        tracing::debug!(?action, error = %e, "action rejected");
    }
    true
}

fn draw_ui(f: &mut Frame, reader: &Reader, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(8),    // Content
            Constraint::Length(3), // Footer
        ])
        .split(f.area());

    draw_header(f, chunks[0], reader);

    let content = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(chunks[1]);
    draw_articles(f, content[0], reader, app);
    draw_now_playing(f, content[1], reader);

    draw_footer(f, chunks[2], app);
}

fn draw_header(f: &mut Frame, area: Rect, reader: &Reader) {
    let (status, color) = match reader.state() {
        PlaybackState::Speaking => ("▶ Speaking", Color::Green),
        PlaybackState::Paused => ("⏸ Paused", Color::Yellow),
        PlaybackState::Idle => ("■ Idle", Color::DarkGray),
    };
    let ambient = if reader.is_ambient_running() { "on" } else { "off" };

    let line = Line::from(vec![
        Span::raw(" "),
        Span::styled(status, Style::default().fg(color).bold()),
        Span::raw("  "),
        Span::styled(
            format!("Volume {:>3}%", (reader.volume() * 100.0).round() as u32),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw("  "),
        Span::styled(format!("Ambient {ambient}"), Style::default().fg(Color::DarkGray)),
    ]);

    let header = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Wingoo News Reader "),
    );
    f.render_widget(header, area);
}

fn draw_articles(f: &mut Frame, area: Rect, reader: &Reader, app: &App) {
    let playing = reader.current_article().map(|a| a.index);

    let items: Vec<ListItem> = app
        .articles
        .iter()
        .map(|article| {
            let marker = if playing == Some(article.index) { "♪ " } else { "  " };
            ListItem::new(Line::from(vec![
                Span::styled(marker, Style::default().fg(Color::Green)),
                Span::raw(article.title.clone()),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(" Articles "))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    let mut state = ListState::default();
    if !app.articles.is_empty() {
        state.select(Some(app.selected));
    }
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_now_playing(f: &mut Frame, area: Rect, reader: &Reader) {
    let block = Block::default().borders(Borders::ALL).title(" Now Playing ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(inner);

    let mut lines = Vec::new();
    match reader.current_article() {
        Some(article) => {
            lines.push(Line::from(Span::styled(
                article.title.clone(),
                Style::default().fg(Color::White).bold(),
            )));
            if let (PlaybackMode::PlayAll, Some(session)) = (reader.mode(), reader.session()) {
                lines.push(Line::from(Span::styled(
                    format!("Article {} of {}", reader.cursor() + 1, session.len()),
                    Style::default().fg(Color::DarkGray),
                )));
            }
            if reader.active_utterance().is_none() && reader.state() == PlaybackState::Speaking {
                lines.push(Line::from(Span::styled(
                    "Up next…",
                    Style::default().fg(Color::Yellow),
                )));
            }
            lines.push(Line::raw(""));
            lines.push(Line::raw(article.body.clone()));
        }
        None => lines.push(Line::from(Span::styled(
            "Select an article and press Enter, or press a to play all",
            Style::default().fg(Color::DarkGray),
        ))),
    }
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), rows[0]);

    let progress = reader.progress(Instant::now());
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(Color::Cyan).bg(Color::Black))
        .ratio(progress as f64)
        .label(format!("{:>3}%", (progress * 100.0).round() as u32));
    f.render_widget(gauge, rows[1]);
}

fn draw_footer(f: &mut Frame, area: Rect, app: &App) {
    let line = match app.toasts.latest(Instant::now()) {
        Some(Notification { message, severity }) => Line::from(Span::styled(
            format!(" {message}"),
            Style::default().fg(severity_color(severity)).bold(),
        )),
        None => Line::from(Span::styled(
            " ↑↓ select  Enter play  a all  Space pause  Esc stop  ←→ prev/next  +/- volume  q quit",
            Style::default().fg(Color::DarkGray),
        )),
    };
    f.render_widget(
        Paragraph::new(line).block(Block::default().borders(Borders::ALL)),
        area,
    );
}

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Info => Color::Cyan,
        Severity::Success => Color::Green,
        Severity::Warning => Color::Yellow,
        Severity::Error => Color::Red,
    }
}
