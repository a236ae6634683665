use crate::app::{App, Screen, StatusType};
use color_eyre::Result;
use netlife_monitor::{ActivityEvent, MonitorPhase};
use ratatui::crossterm::event;
use ratatui::crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, MouseEvent, MouseEventKind};
use ratatui::layout::Alignment;
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Gauge, Paragraph, Wrap},
};

// --- Palette ---
const fn c_bg() -> Color {
    Color::Rgb(18, 18, 23)
}
const fn c_bg_panel() -> Color {
    Color::Rgb(24, 26, 33)
}
const fn c_border() -> Color {
    Color::Rgb(60, 66, 80)
}
const fn c_accent() -> Color {
    Color::Rgb(80, 200, 255)
} // cyan-ish
const fn c_ok() -> Color {
    Color::Rgb(120, 220, 120)
}
const fn c_warn() -> Color {
    Color::Rgb(255, 210, 90)
}
const fn c_err() -> Color {
    Color::Rgb(255, 120, 120)
}
const fn c_text() -> Color {
    Color::Rgb(220, 224, 232)
}
const fn c_text_dim() -> Color {
    Color::Rgb(140, 145, 160)
}

pub fn run_app(app: &mut App) -> Result<()> {
    let backend = CrosstermBackend::new(std::io::stdout());
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    loop {
        app.tick();
        terminal.draw(|f| draw(f, app))?;
        if event::poll(std::time::Duration::from_millis(250))? {
            match event::read()? {
                Event::Key(key) => {
                    if key.kind == KeyEventKind::Press && handle_key(app, key) {
                        break;
                    }
                }
                Event::Mouse(mouse) => handle_mouse(app, mouse),
                _ => {}
            }
        }
    }
    Ok(())
}

/// Returns `true` when the app should quit.
fn handle_key(app: &mut App, key: KeyEvent) -> bool {
    if app.countdown.is_visible() {
        match key.code {
            KeyCode::Enter | KeyCode::Char('s') => app.stay_logged_in(),
            KeyCode::Char('l') => app.logout_now(),
            _ => {}
        }
        return false;
    }

    match app.screen {
        Screen::Session => match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('o') => app.sign_out(),
            _ => {
                app.clear_status();
                app.on_input(ActivityEvent::KeyPress);
            }
        },
        Screen::SignedOut => match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('r') | KeyCode::Enter => app.sign_in(),
            _ => {}
        },
    }
    false
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let activity = match mouse.kind {
        MouseEventKind::Down(_) => ActivityEvent::PointerDown,
        MouseEventKind::Moved | MouseEventKind::Drag(_) => ActivityEvent::PointerMove,
        MouseEventKind::ScrollUp | MouseEventKind::ScrollDown => ActivityEvent::Scroll,
        _ => return,
    };
    app.on_input(activity);
}

fn draw(f: &mut Frame, app: &App) {
    let size = f.area();
    let bg_block = Block::default().style(Style::default().bg(c_bg()));
    f.render_widget(bg_block, size);

    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Min(0),    // Body
            Constraint::Length(1), // Status bar
        ])
        .split(size);

    draw_header(f, root[0]);
    draw_status_bar(f, app, root[2]);

    match app.screen {
        Screen::Session => {
            draw_session(f, app, root[1]);
            if app.countdown.is_visible() {
                draw_warning(f, app);
            }
        }
        Screen::SignedOut => draw_signed_out(f, app, root[1]),
    }
}

fn draw_header(f: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(
            "  ◈ netlife ",
            Style::default().fg(c_accent()).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled("session guard", Style::default().fg(c_text_dim())),
    ]);

    let bar = Block::default()
        .borders(Borders::BOTTOM)
        .border_type(BorderType::Plain)
        .border_style(Style::default().fg(c_border()))
        .style(Style::default().bg(c_bg_panel()));
    f.render_widget(bar, area);

    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(area);

    let title_para = Paragraph::new(title).style(Style::default().fg(c_text()));
    f.render_widget(title_para, inner[0]);

    let version_info = Paragraph::new(Line::from(vec![
        Span::styled("v", Style::default().fg(c_text_dim())),
        Span::styled(env!("CARGO_PKG_VERSION"), Style::default().fg(c_accent())),
    ]))
    .style(Style::default().fg(c_text()))
    .alignment(Alignment::Right);
    f.render_widget(version_info, inner[1]);
}

fn phase_style(phase: MonitorPhase) -> Style {
    let color = match phase {
        MonitorPhase::Tracking => c_ok(),
        MonitorPhase::WarningShown => c_warn(),
        MonitorPhase::Terminated => c_err(),
        MonitorPhase::Inactive => c_text_dim(),
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

fn format_secs(ms: u64) -> String {
    let secs = ms.div_ceil(1000);
    format!("{}:{:02}", secs / 60, secs % 60)
}

fn draw_session(f: &mut Frame, app: &App, body: Rect) {
    let area = centered_rect(70, 60, body);
    let block = Block::default()
        .title(Span::styled(" Session ", Style::default().fg(c_accent())))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(c_border()))
        .style(Style::default().bg(c_bg_panel()));
    f.render_widget(block, area);

    let inner = pad(area, 2, 1);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Details
            Constraint::Length(1),
            Constraint::Length(1), // Gauge
            Constraint::Min(0),
        ])
        .split(inner);

    let snapshot = app.monitor.snapshot();
    let label = |text: &'static str| Span::styled(format!("{text:<16}"), Style::default().fg(c_text_dim()));
    let last_event = app.last_event.map_or_else(|| "none yet".to_string(), |e| e.as_str().to_string());

    let details = vec![
        Line::from(vec![
            label("Phase"),
            Span::styled(snapshot.phase.as_str(), phase_style(snapshot.phase)),
        ]),
        Line::from(vec![
            label("Signed in"),
            Span::styled(
                app.signed_in_at.format("%H:%M:%S").to_string(),
                Style::default().fg(c_text()),
            ),
        ]),
        Line::from(vec![
            label("Last activity"),
            Span::styled(
                snapshot.last_activity.format("%H:%M:%S").to_string(),
                Style::default().fg(c_text()),
            ),
        ]),
        Line::from(vec![
            label("Activity"),
            Span::styled(
                format!("{} events (last: {last_event})", app.activity_count),
                Style::default().fg(c_text()),
            ),
        ]),
        Line::from(vec![
            label("Signs out in"),
            Span::styled(format_secs(snapshot.remaining_time_ms), phase_style(snapshot.phase)),
        ]),
    ];
    f.render_widget(Paragraph::new(details), rows[0]);

    let gauge_color = if snapshot.warning_shown { c_warn() } else { c_accent() };
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(gauge_color).bg(c_bg()))
        .ratio(app.remaining_ratio())
        .label(Span::styled(
            format_secs(snapshot.remaining_time_ms),
            Style::default().fg(c_text()).add_modifier(Modifier::BOLD),
        ));
    f.render_widget(gauge, rows[2]);
}

fn draw_warning(f: &mut Frame, app: &App) {
    let area = centered_rect(50, 30, f.area());
    f.render_widget(Clear, area);

    let block = Block::default()
        .title(Span::styled(
            " Are you still there? ",
            Style::default().fg(c_warn()).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(c_warn()))
        .style(Style::default().bg(c_bg_panel()));
    f.render_widget(block, area);

    let text = vec![
        Line::from(Span::styled(app.countdown.message(), Style::default().fg(c_text()))),
        Line::raw(""),
        Line::from(vec![
            Span::styled("Signing out in ", Style::default().fg(c_text_dim())),
            Span::styled(
                app.countdown.display(),
                Style::default().fg(c_warn()).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::raw(""),
        Line::from(vec![
            Span::styled("[Enter]", Style::default().fg(c_accent()).add_modifier(Modifier::BOLD)),
            Span::styled(" Stay signed in   ", Style::default().fg(c_text_dim())),
            Span::styled("[l]", Style::default().fg(c_text()).add_modifier(Modifier::BOLD)),
            Span::styled(" Sign out now", Style::default().fg(c_text_dim())),
        ]),
    ];

    let para = Paragraph::new(text)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(para, pad(area, 2, 1));
}

fn draw_signed_out(f: &mut Frame, app: &App, body: Rect) {
    let area = centered_rect(60, 30, body);
    let block = Block::default()
        .title(Span::styled(" Signed out ", Style::default().fg(c_err())))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(c_border()))
        .style(Style::default().bg(c_bg_panel()));
    f.render_widget(block, area);

    let when = app
        .signed_out_at
        .map_or_else(String::new, |at| format!(" at {}", at.format("%H:%M:%S")));
    let text = vec![
        Line::from(Span::styled(
            format!("Your session ended{when}."),
            Style::default().fg(c_text()),
        )),
        Line::raw(""),
        Line::from(Span::styled(
            "Press r to sign in again.",
            Style::default().fg(c_text_dim()),
        )),
    ];
    f.render_widget(
        Paragraph::new(text).alignment(Alignment::Center),
        pad(area, 2, 1),
    );
}

fn draw_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let status_block = Block::default()
        .borders(Borders::TOP)
        .border_style(Style::default().fg(c_border()))
        .style(Style::default().bg(c_bg_panel()));

    f.render_widget(status_block, area);

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let (message, message_style) = get_status_message_and_style(app);
    let status_paragraph = Paragraph::new(Line::from(vec![
        Span::raw(" "),
        Span::styled(message, message_style),
    ]))
    .style(Style::default().bg(c_bg_panel()))
    .wrap(Wrap { trim: true });

    f.render_widget(status_paragraph, chunks[0]);

    let key_hints = get_key_hints_for_screen(app);
    let hints_paragraph = Paragraph::new(Line::from(key_hints))
        .style(Style::default().bg(c_bg_panel()).fg(c_text_dim()))
        .alignment(Alignment::Right)
        .wrap(Wrap { trim: true });

    f.render_widget(hints_paragraph, chunks[1]);
}

fn get_status_message_and_style(app: &App) -> (String, Style) {
    if let Some(message) = &app.status_message {
        let style = match app.status_type {
            StatusType::Success => Style::default().fg(c_ok()).add_modifier(Modifier::BOLD),
            StatusType::Warning => Style::default().fg(c_warn()).add_modifier(Modifier::BOLD),
            StatusType::Error => Style::default().fg(c_err()).add_modifier(Modifier::BOLD),
            StatusType::Info => Style::default().fg(c_accent()),
        };
        (message.clone(), style)
    } else {
        let context_message = match app.screen {
            Screen::Session => {
                let timeout_secs = app.monitor.config().inactivity_timeout_ms / 1000;
                format!("Idle sessions sign out after {timeout_secs}s")
            }
            Screen::SignedOut => "Session ended".to_string(),
        };
        (context_message, Style::default().fg(c_text_dim()))
    }
}

fn get_key_hints_for_screen(app: &App) -> Vec<Span<'static>> {
    let mut spans = Vec::new();

    let add_hint = |spans: &mut Vec<Span<'static>>, key: &'static str, action: &'static str, emphasized: bool| {
        if !spans.is_empty() {
            spans.push(Span::raw(" "));
        }
        let key_style = if emphasized {
            Style::default().fg(c_accent()).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(c_text()).add_modifier(Modifier::BOLD)
        };
        spans.push(Span::styled(format!("[{key}]"), key_style));
        spans.push(Span::styled(format!(" {action}"), Style::default().fg(c_text_dim())));
    };

    if app.countdown.is_visible() {
        add_hint(&mut spans, "Enter", "Stay", true);
        add_hint(&mut spans, "l", "Sign out", false);
    } else {
        match app.screen {
            Screen::Session => {
                add_hint(&mut spans, "Any key", "Activity", false);
                add_hint(&mut spans, "o", "Sign out", false);
                add_hint(&mut spans, "q", "Quit", false);
            }
            Screen::SignedOut => {
                add_hint(&mut spans, "r", "Sign in", true);
                add_hint(&mut spans, "q", "Quit", false);
            }
        }
    }

    spans.push(Span::raw(" "));
    spans
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let v = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    let h = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(v[1]);
    h[1]
}

const fn pad(r: Rect, x: u16, y: u16) -> Rect {
    Rect {
        x: r.x.saturating_add(x),
        y: r.y.saturating_add(y),
        width: r.width.saturating_sub(x.saturating_mul(2)),
        height: r.height.saturating_sub(y.saturating_mul(2)),
    }
}
