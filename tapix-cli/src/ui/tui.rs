//! Full-screen chat: metrics sidebar, category bars, suggestions, scrollable history

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use std::io::{self, Stdout};
use std::time::Duration;

use tapix_core::{ConversationMessage, Role};

use super::{Renderer, SessionView, Theme, bar, breakdown_rows, metrics_rows, stats_text};
use crate::app::App;
use crate::commands::{Command, Input, help_text, parse_input};

const SIDEBAR_WIDTH: u16 = 40;
const HINT: &str = "Enter send · F1-F5 suggestions · PgUp/PgDn scroll · Esc quit";

pub struct TuiRenderer {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    theme: Theme,
    /// Lines scrolled back from the bottom of the history
    scroll_back: u16,
    /// (title, text) shown in place of the history until dismissed
    overlay: Option<(String, String)>,
}

impl TuiRenderer {
    fn scroll_up(&mut self, n: u16) {
        self.scroll_back = self.scroll_back.saturating_add(n);
    }

    fn scroll_down(&mut self, n: u16) {
        self.scroll_back = self.scroll_back.saturating_sub(n);
    }
}

impl Renderer for TuiRenderer {
    fn render(&mut self, view: &SessionView<'_>) -> Result<()> {
        let theme = self.theme;
        let overlay = self.overlay.as_ref();
        let scroll_back = &mut self.scroll_back;
        self.terminal.draw(|f| draw(f, view, &theme, scroll_back, overlay))?;
        Ok(())
    }
}

pub fn run_tui(app: &mut App, theme: Theme) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    let mut r = TuiRenderer {
        terminal,
        theme,
        scroll_back: 0,
        overlay: None,
    };

    let res = tui_loop(app, &mut r);

    disable_raw_mode()?;
    execute!(r.terminal.backend_mut(), LeaveAlternateScreen)?;
    r.terminal.show_cursor()?;

    res
}

enum Flow {
    Continue,
    Quit,
}

fn tui_loop(app: &mut App, r: &mut TuiRenderer) -> Result<()> {
    let mut input = String::new();

    loop {
        r.render(&app.view(None, &input))?;

        if !event::poll(Duration::from_millis(50))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        let submitted = match key.code {
            KeyCode::Esc if r.overlay.is_some() => {
                r.overlay = None;
                None
            }
            KeyCode::Esc => break,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => break,
            KeyCode::F(n) if (1..=5).contains(&n) => Some(Input::Suggestion(usize::from(n - 1))),
            KeyCode::Enter => Some(parse_input(&std::mem::take(&mut input))),
            KeyCode::Backspace => {
                input.pop();
                None
            }
            KeyCode::PageUp => {
                r.scroll_up(5);
                None
            }
            KeyCode::PageDown => {
                r.scroll_down(5);
                None
            }
            KeyCode::Up => {
                r.scroll_up(1);
                None
            }
            KeyCode::Down => {
                r.scroll_down(1);
                None
            }
            KeyCode::Char(c) => {
                input.push(c);
                None
            }
            _ => None,
        };

        if let Some(submitted) = submitted {
            if let Flow::Quit = submit(app, r, submitted)? {
                break;
            }
        }
    }
    Ok(())
}

fn submit(app: &mut App, r: &mut TuiRenderer, input: Input) -> Result<Flow> {
    match input {
        Input::Empty => {}
        Input::Question(q) => {
            r.overlay = None;
            r.render(&app.view(Some("Thinking…"), ""))?;
            app.ask(&q);
            r.scroll_back = 0;
        }
        Input::Suggestion(i) => {
            r.overlay = None;
            r.render(&app.view(Some("Thinking…"), ""))?;
            app.ask_suggestion(i);
            r.scroll_back = 0;
        }
        Input::Command(Command::Help) => r.overlay = Some(("help (Esc to close)".to_string(), help_text())),
        Input::Command(Command::Stats) => {
            r.overlay = Some(("stats (Esc to close)".to_string(), stats_text(&app.view(None, ""))))
        }
        Input::Command(Command::Context) => {
            r.overlay = Some((
                "context (Esc to close)".to_string(),
                app.session.context().to_lines(),
            ))
        }
        Input::Command(Command::Quit) => return Ok(Flow::Quit),
        Input::Command(Command::Unknown(s)) => {
            r.overlay = Some(("unknown command".to_string(), format!("Unknown command {s}. Try /help")))
        }
    }
    Ok(Flow::Continue)
}

fn bordered<'a>(title: &'a str, theme: &Theme) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border))
        .title(Span::styled(title, Style::default().fg(theme.accent)))
}

fn draw(f: &mut Frame, view: &SessionView<'_>, theme: &Theme, scroll_back: &mut u16, overlay: Option<&(String, String)>) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(8),
            Constraint::Length(1),
            Constraint::Length(3),
        ])
        .split(f.area());

    draw_header(f, rows[0], view, theme);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(20)])
        .split(rows[1]);
    draw_sidebar(f, body[0], view, theme);

    match overlay {
        Some((title, text)) => {
            let p = Paragraph::new(text.as_str())
                .style(Style::default().fg(theme.text))
                .block(bordered(title, theme))
                .wrap(Wrap { trim: false });
            f.render_widget(p, body[1]);
        }
        None => draw_history(f, body[1], view, theme, scroll_back),
    }

    let status = match view.status {
        Some(s) => Span::styled(
            s.to_string(),
            Style::default().fg(theme.accent).add_modifier(Modifier::ITALIC),
        ),
        None => Span::styled(HINT, Style::default().fg(theme.muted)),
    };
    f.render_widget(Paragraph::new(Line::from(status)), rows[2]);

    let input = Paragraph::new(view.input)
        .style(Style::default().fg(theme.text))
        .block(bordered("message", theme));
    f.render_widget(input, rows[3]);
    let cursor_x = rows[3].x + 1 + (view.input.chars().count() as u16).min(rows[3].width.saturating_sub(3));
    f.set_cursor_position((cursor_x, rows[3].y + 1));
}

fn draw_header(f: &mut Frame, area: Rect, view: &SessionView<'_>, theme: &Theme) {
    let second = match view.notice {
        Some(n) => Span::styled(n.to_string(), Style::default().fg(theme.muted)),
        None => Span::styled(
            format!("answers by {}", view.backend_name),
            Style::default().fg(theme.muted),
        ),
    };
    let header = Paragraph::new(Text::from(vec![
        Line::from(Span::styled(
            view.title.clone(),
            Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
        )),
        Line::from(second),
    ]))
    .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(theme.border)));
    f.render_widget(header, area);
}

fn draw_sidebar(f: &mut Frame, area: Rect, view: &SessionView<'_>, theme: &Theme) {
    let shown = view.breakdown.len().clamp(1, 8) as u16;
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7),
            Constraint::Length(shown + 2),
            Constraint::Min(4),
        ])
        .split(area);

    let metrics: Vec<Line> = metrics_rows(view)
        .into_iter()
        .map(|(label, value)| {
            Line::from(vec![
                Span::styled(format!("{label:<14}"), Style::default().fg(theme.muted)),
                Span::styled(value, Style::default().fg(theme.text).add_modifier(Modifier::BOLD)),
            ])
        })
        .collect();
    f.render_widget(Paragraph::new(metrics).block(bordered("this period", theme)), parts[0]);

    let inner = usize::from(area.width.saturating_sub(2));
    let bar_width = inner.saturating_sub(12 + 1 + 11 + 1).max(4);
    let rows = breakdown_rows(&view.breakdown, view.currency_symbol, bar_width);
    let bars: Vec<Line> = if rows.is_empty() {
        vec![Line::from(Span::styled("No transactions", Style::default().fg(theme.muted)))]
    } else {
        rows.into_iter()
            .take(8)
            .map(|r| {
                let label: String = r.label.chars().take(12).collect();
                Line::from(vec![
                    Span::styled(format!("{label:<12} "), Style::default().fg(theme.text)),
                    Span::styled(bar(r.filled, bar_width), Style::default().fg(theme.bar)),
                    Span::styled(format!(" {:>11}", r.amount), Style::default().fg(theme.muted)),
                ])
            })
            .collect()
    };
    f.render_widget(Paragraph::new(bars).block(bordered("by category", theme)), parts[1]);

    let suggestions: Vec<Line> = view
        .suggestions
        .iter()
        .enumerate()
        .map(|(i, q)| {
            Line::from(vec![
                Span::styled(format!("F{} ", i + 1), Style::default().fg(theme.accent)),
                Span::styled(q.to_string(), Style::default().fg(theme.text)),
            ])
        })
        .collect();
    f.render_widget(
        Paragraph::new(suggestions)
            .block(bordered("try asking", theme))
            .wrap(Wrap { trim: true }),
        parts[2],
    );
}

fn draw_history(f: &mut Frame, area: Rect, view: &SessionView<'_>, theme: &Theme, scroll_back: &mut u16) {
    let lines = history_lines(view.messages, theme);
    let inner_width = area.width.saturating_sub(2);
    let inner_height = area.height.saturating_sub(2);
    let total = wrapped_height(&lines, inner_width);

    let max_back = total.saturating_sub(inner_height);
    *scroll_back = (*scroll_back).min(max_back);
    let offset = max_back - *scroll_back;

    let p = Paragraph::new(Text::from(lines))
        .block(bordered("conversation", theme))
        .wrap(Wrap { trim: false })
        .scroll((offset, 0));
    f.render_widget(p, area);
}

fn history_lines(messages: &[ConversationMessage], theme: &Theme) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for m in messages {
        let (tag, color) = match m.role {
            Role::User => ("you", theme.user),
            Role::Assistant => ("tapix", theme.assistant),
            Role::System => ("system", theme.muted),
        };
        let mut body = m.content.lines();
        let first = body.next().unwrap_or("");
        lines.push(Line::from(vec![
            Span::styled(format!("{tag}: "), Style::default().fg(color).add_modifier(Modifier::BOLD)),
            Span::styled(first.to_string(), Style::default().fg(theme.text)),
        ]));
        for rest in body {
            lines.push(Line::styled(rest.to_string(), Style::default().fg(theme.text)));
        }
        lines.push(Line::raw(""));
    }
    lines
}

/// Rows the lines occupy once wrapped to `width` (approximate for word wrap)
fn wrapped_height(lines: &[Line<'_>], width: u16) -> u16 {
    let width = usize::from(width.max(1));
    let rows: usize = lines.iter().map(|l| l.width().div_ceil(width).max(1)).sum();
    u16::try_from(rows).unwrap_or(u16::MAX)
}
