pub mod app;

pub use app::{App, Field, UiCommand, UiMessage};

use anyhow::Result;
use crawlpilot_core::text::{LineStyle, StyledLine};
use crawlpilot_core::{ActionState, FormController, FormError};
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};

/// Run the terminal form until the user quits. Blocking; network calls are
/// spawned onto `handle` and report back over a channel.
pub fn run(controller: Arc<FormController>, handle: Handle) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new();
    if let Some(session) = controller.last_result() {
        app.show_session(session);
    }

    let result = run_app(&mut terminal, &mut app, &controller, &handle);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    controller: &Arc<FormController>,
    handle: &Handle,
) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<UiMessage>();
    let mut status_rx: watch::Receiver<_> = controller.subscribe();

    loop {
        if status_rx.has_changed().unwrap_or(false) {
            let status = status_rx.borrow_and_update().clone();
            app.set_status(status);
        }
        while let Ok(message) = rx.try_recv() {
            app.apply_message(message);
        }

        terminal.draw(|f| ui(f, app))?;

        if event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
            && let Some(command) = app.handle_key(key)
        {
            dispatch(command, app, controller, handle, &tx);
        }

        if app.should_quit() {
            break;
        }
    }

    Ok(())
}

fn dispatch(
    command: UiCommand,
    app: &mut App,
    controller: &Arc<FormController>,
    handle: &Handle,
    tx: &mpsc::UnboundedSender<UiMessage>,
) {
    match command {
        UiCommand::Submit(form) => {
            let controller = controller.clone();
            let tx = tx.clone();
            handle.spawn(async move {
                let result = match controller.submit_crawl(&form).await {
                    // The form was reset while this crawl ran
                    Err(FormError::Superseded) => return,
                    result => result.map_err(|e| e.to_string()),
                };
                let _ = tx.send(UiMessage::CrawlFinished(result));
            });
        }
        UiCommand::Download(format) => {
            let controller = controller.clone();
            let tx = tx.clone();
            handle.spawn(async move {
                let result = controller
                    .request_download(format)
                    .await
                    .map_err(|e| e.to_string());
                let _ = tx.send(UiMessage::DownloadFinished(result));
            });
        }
        UiCommand::Reset => {
            controller.reset_form(&mut app.form);
            app.clear_results();
        }
    }
}

pub fn line_style(style: LineStyle) -> Style {
    match style {
        LineStyle::Rule => Style::default().fg(Color::DarkGray),
        LineStyle::Heading => Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        LineStyle::Title => Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        LineStyle::Label => Style::default().fg(Color::Yellow),
        LineStyle::Body => Style::default().fg(Color::Gray),
        LineStyle::Muted => Style::default().fg(Color::DarkGray),
        LineStyle::Link => Style::default().fg(Color::Blue),
        LineStyle::Meter => Style::default().fg(Color::Green),
        LineStyle::Error => Style::default().fg(Color::Red),
    }
}

fn styled(line: &StyledLine) -> Line<'static> {
    Line::from(Span::styled(line.text.clone(), line_style(line.style)))
}

fn ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(9), // Form
            Constraint::Length(1), // Status line
            Constraint::Min(5),    // Results
            Constraint::Length(1), // Hints bar
        ])
        .split(f.area());

    render_form(f, app, chunks[0]);
    render_status(f, app, chunks[1]);
    render_results(f, app, chunks[2]);
    render_hints(f, chunks[3]);
}

fn label_style(app: &App, field: Field) -> Style {
    if app.focus() == field {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    }
}

fn slider(value: u32, min: u32, max: u32) -> String {
    let width = (max - min) as usize;
    let filled = (value - min) as usize;
    if width <= 10 {
        format!("◀ {}{} ▶ {}", "■".repeat(filled), "□".repeat(width - filled), value)
    } else {
        let cells = (filled * 20) / width;
        format!("◀ {}{} ▶ {}", "■".repeat(cells), "□".repeat(20 - cells), value)
    }
}

const LABEL_WIDTH: u16 = 16;

fn render_form(f: &mut Frame, app: &App, area: Rect) {
    use crawlpilot_core::form::{MAX_DEPTH, MAX_MAX_PAGES, MIN_MAX_PAGES};

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" crawlpilot ")
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let row = |field: Field, label: &str, value: String| {
        Line::from(vec![
            Span::styled(
                format!("{:<width$}", label, width = LABEL_WIDTH as usize),
                label_style(app, field),
            ),
            Span::styled(value, Style::default().fg(Color::White)),
        ])
    };

    let checkbox = if app.form.follow_external_links { "[x]" } else { "[ ]" };
    let busy = app.status().crawl.is_busy();
    let submit_style = match (app.focus() == Field::Submit, busy) {
        (_, true) => Style::default().fg(Color::DarkGray),
        (true, false) => Style::default().fg(Color::Black).bg(Color::Cyan),
        (false, false) => Style::default().fg(Color::Cyan),
    };

    let lines = vec![
        row(Field::Url, "URL", app.form.url.clone()),
        row(Field::Instructions, "Instructions", app.form.instructions.clone()),
        row(Field::Depth, "Depth", slider(app.form.depth(), 0, MAX_DEPTH)),
        row(
            Field::MaxPages,
            "Max pages",
            slider(app.form.max_pages(), MIN_MAX_PAGES, MAX_MAX_PAGES),
        ),
        row(
            Field::FollowExternal,
            "External links",
            format!("{} follow links to other sites", checkbox),
        ),
        Line::default(),
        Line::from(Span::styled(format!("[ {} ]", app.submit_label()), submit_style)),
    ];
    f.render_widget(Paragraph::new(lines), inner);

    // Cursor only shows inside the text inputs
    let text_row = match app.focus() {
        Field::Url => Some((0, &app.form.url)),
        Field::Instructions => Some((1, &app.form.instructions)),
        _ => None,
    };
    if let Some((row, text)) = text_row {
        let column = cursor_column(text, app.cursor());
        f.set_cursor_position((inner.x + LABEL_WIDTH + column, inner.y + row));
    }
}

// Display width of the text left of the cursor; wide glyphs take two cells.
fn cursor_column(text: &str, cursor: usize) -> u16 {
    let before: String = text.chars().take(cursor).collect();
    Span::raw(before).width() as u16
}

fn render_status(f: &mut Frame, app: &App, area: Rect) {
    let line = if app.status().crawl.is_busy() {
        Line::from(Span::styled(" Scraping...", Style::default().fg(Color::Yellow)))
    } else if app.status().download.is_busy() {
        Line::from(Span::styled(" Downloading...", Style::default().fg(Color::Yellow)))
    } else if let Some(notice) = app.notice() {
        Line::from(Span::styled(format!(" {}", notice.text), line_style(notice.style)))
    } else if let ActionState::Failed { message, .. } = &app.status().download {
        Line::from(Span::styled(format!(" Error: {}", message), line_style(LineStyle::Error)))
    } else {
        Line::default()
    };
    f.render_widget(Paragraph::new(line), area);
}

fn render_results(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Results ")
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let (lines, _) = app.result_lines();
    let height = inner.height as usize;
    let total = lines.len();
    let scroll = app.scroll().min(total.saturating_sub(height));

    let visible: Vec<Line> = lines.iter().skip(scroll).take(height).map(styled).collect();
    f.render_widget(Paragraph::new(visible), inner);

    if total > height {
        render_scrollbar(f, area, total, height, scroll);
    }
}

fn render_scrollbar(f: &mut Frame, area: Rect, total: usize, visible: usize, offset: usize) {
    let track = area.height.saturating_sub(2) as usize;
    if track == 0 {
        return;
    }

    let thumb = ((visible as f32 / total as f32) * track as f32).max(1.0).floor() as usize;
    let ratio = offset as f32 / (total - visible) as f32;
    let position = (ratio * (track - thumb) as f32).floor() as usize;

    let x = area.x + area.width - 1;
    for i in 0..track {
        let on_thumb = i >= position && i < position + thumb;
        let (symbol, color) = if on_thumb { ("█", Color::Cyan) } else { ("│", Color::DarkGray) };
        f.render_widget(
            Paragraph::new(symbol).style(Style::default().fg(color)),
            Rect {
                x,
                y: area.y + 1 + i as u16,
                width: 1,
                height: 1,
            },
        );
    }
}

fn render_hints(f: &mut Frame, area: Rect) {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Black).bg(Color::Gray));
    let hints = Line::from(vec![
        key(" Tab "),
        Span::raw(" Next  "),
        key(" Enter "),
        Span::raw(" Scrape  "),
        key(" ^S "),
        Span::raw(" JSON  "),
        key(" ^D "),
        Span::raw(" Markdown  "),
        key(" ^L "),
        Span::raw(" Links  "),
        key(" ↑/↓ "),
        Span::raw(" Page  "),
        key(" ^R "),
        Span::raw(" Reset  "),
        key(" Esc "),
        Span::raw(" Quit"),
    ]);
    f.render_widget(
        Paragraph::new(hints).style(Style::default().bg(Color::Black).fg(Color::Gray)),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;

    #[test]
    fn test_slider_bounds() {
        assert_eq!(slider(0, 0, 5), "◀ □□□□□ ▶ 0");
        assert_eq!(slider(5, 0, 5), "◀ ■■■■■ ▶ 5");
        assert!(slider(100, 1, 100).starts_with(&format!("◀ {}", "■".repeat(20))));
    }

    #[test]
    fn test_cursor_column_counts_display_width() {
        assert_eq!(cursor_column("example.com", 7), 7);
        assert_eq!(cursor_column("价格 list", 2), 4);
        assert_eq!(cursor_column("价格 list", 100), 9);
    }

    #[test]
    fn test_form_renders_busy_label() {
        let backend = TestBackend::new(100, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        let mut app = App::new();
        app.set_status(crawlpilot_core::ControllerStatus {
            crawl: ActionState::Busy,
            download: ActionState::Idle,
        });

        terminal.draw(|f| ui(f, &app)).unwrap();

        let buffer = terminal.backend().buffer();
        let text: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("[ Scraping... ]"));
    }
}
