use crawlpilot_client::ExportFormat;
use crawlpilot_core::text::{page_lines, summary_lines, LineStyle, StyledLine, NO_RESULTS_TEXT};
use crawlpilot_core::view::{page_views, LinksToggle, PageView};
use crawlpilot_core::{ActionState, ControllerStatus, CrawlSession, FormState};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::path::PathBuf;
use std::sync::Arc;

pub const SUBMIT_LABEL: &str = "Start Scraping";
pub const SUBMIT_BUSY_LABEL: &str = "Scraping...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Url,
    Instructions,
    Depth,
    MaxPages,
    FollowExternal,
    Submit,
}

impl Field {
    const ORDER: [Field; 6] = [
        Field::Url,
        Field::Instructions,
        Field::Depth,
        Field::MaxPages,
        Field::FollowExternal,
        Field::Submit,
    ];

    fn position(self) -> usize {
        Self::ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ORDER[(self.position() + 1) % Self::ORDER.len()]
    }

    pub fn previous(self) -> Self {
        Self::ORDER[(self.position() + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }

    pub fn is_text(self) -> bool {
        matches!(self, Field::Url | Field::Instructions)
    }
}

/// Work the draw loop hands off to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum UiCommand {
    Submit(FormState),
    Download(ExportFormat),
    Reset,
}

/// Outcomes sent back from spawned controller calls.
#[derive(Debug, Clone)]
pub enum UiMessage {
    CrawlFinished(Result<Arc<CrawlSession>, String>),
    DownloadFinished(Result<PathBuf, String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub style: LineStyle,
    pub text: String,
}

pub struct App {
    pub form: FormState,
    focus: Field,
    cursor: usize,
    session: Option<Arc<CrawlSession>>,
    views: Vec<PageView>,
    toggles: Vec<Option<LinksToggle>>,
    selected_page: usize,
    scroll: usize,
    status: ControllerStatus,
    notice: Option<Notice>,
    should_quit: bool,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        Self {
            form: FormState::default(),
            focus: Field::Url,
            cursor: 0,
            session: None,
            views: Vec::new(),
            toggles: Vec::new(),
            selected_page: 0,
            scroll: 0,
            status: ControllerStatus::default(),
            notice: None,
            should_quit: false,
        }
    }

    pub fn focus(&self) -> Field {
        self.focus
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn status(&self) -> &ControllerStatus {
        &self.status
    }

    pub fn selected_page(&self) -> usize {
        self.selected_page
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    pub fn links_toggle(&self, page: usize) -> Option<LinksToggle> {
        self.toggles.get(page).copied().flatten()
    }

    pub fn submit_label(&self) -> &'static str {
        if self.status.crawl.is_busy() {
            SUBMIT_BUSY_LABEL
        } else {
            SUBMIT_LABEL
        }
    }

    pub fn set_status(&mut self, status: ControllerStatus) {
        if status.crawl != self.status.crawl {
            match &status.crawl {
                ActionState::Busy => {
                    self.clear_result_area();
                    self.notice = None;
                }
                ActionState::Failed { message, .. } => {
                    self.clear_result_area();
                    self.set_error(message.clone());
                }
                _ => {}
            }
        }
        self.status = status;
    }

    fn set_error(&mut self, message: String) {
        self.notice = Some(Notice {
            style: LineStyle::Error,
            text: format!("Error: {}", message),
        });
    }

    fn set_info(&mut self, message: String) {
        self.notice = Some(Notice {
            style: LineStyle::Meter,
            text: message,
        });
    }

    pub fn show_session(&mut self, session: Arc<CrawlSession>) {
        self.views = page_views(&session.response);
        self.toggles = self
            .views
            .iter()
            .map(|v| (!v.links.is_empty()).then(|| LinksToggle::new(v.links.len())))
            .collect();
        self.selected_page = 0;
        self.scroll = 0;
        self.notice = None;
        self.session = Some(session);
    }

    // The controller may still hold the session for download.
    fn clear_result_area(&mut self) {
        self.session = None;
        self.views.clear();
        self.toggles.clear();
        self.selected_page = 0;
        self.scroll = 0;
    }

    /// Clear everything shown; the form itself is reset by the controller.
    pub fn clear_results(&mut self) {
        self.clear_result_area();
        self.notice = None;
        self.status = ControllerStatus::default();
        self.focus = Field::Url;
        self.cursor = 0;
    }

    pub fn apply_message(&mut self, message: UiMessage) {
        match message {
            UiMessage::CrawlFinished(Ok(session)) => self.show_session(session),
            UiMessage::CrawlFinished(Err(e)) => {
                self.clear_result_area();
                self.set_error(e);
            }
            UiMessage::DownloadFinished(Ok(path)) => {
                self.set_info(format!("Saved {}", path.display()));
            }
            UiMessage::DownloadFinished(Err(e)) => self.set_error(e),
        }
    }

    pub fn toggle_selected_links(&mut self) {
        if let Some(Some(toggle)) = self.toggles.get_mut(self.selected_page) {
            toggle.toggle();
        }
    }

    /// Result area lines plus the first line of each page block.
    pub fn result_lines(&self) -> (Vec<StyledLine>, Vec<usize>) {
        let Some(session) = &self.session else {
            return (Vec::new(), Vec::new());
        };
        if self.views.is_empty() {
            return (vec![StyledLine::new(LineStyle::Muted, NO_RESULTS_TEXT)], Vec::new());
        }

        let mut lines = summary_lines(self.views.len(), session.request.max_pages);
        let mut starts = Vec::with_capacity(self.views.len());
        for (index, view) in self.views.iter().enumerate() {
            starts.push(lines.len());
            let mut block = page_lines(index, view, self.links_toggle(index));
            if index == self.selected_page {
                if let Some(title) = block.first_mut() {
                    title.text = format!("▶ {}", title.text);
                }
            }
            lines.extend(block);
        }
        (lines, starts)
    }

    fn select_page(&mut self, index: usize) {
        if self.views.is_empty() {
            return;
        }
        self.selected_page = index.min(self.views.len() - 1);
        let (_, starts) = self.result_lines();
        if let Some(start) = starts.get(self.selected_page) {
            self.scroll = *start;
        }
    }

    fn focused_text_mut(&mut self) -> Option<&mut String> {
        match self.focus {
            Field::Url => Some(&mut self.form.url),
            Field::Instructions => Some(&mut self.form.instructions),
            _ => None,
        }
    }

    fn focused_text_len(&self) -> usize {
        match self.focus {
            Field::Url => self.form.url.chars().count(),
            Field::Instructions => self.form.instructions.chars().count(),
            _ => 0,
        }
    }

    fn set_focus(&mut self, field: Field) {
        self.focus = field;
        self.cursor = self.focused_text_len();
    }

    fn adjust(&mut self, delta: i64) {
        match self.focus {
            Field::Depth => {
                let depth = (self.form.depth() as i64 + delta).max(0) as u32;
                self.form.set_depth(depth);
            }
            Field::MaxPages => {
                let pages = (self.form.max_pages() as i64 + delta).max(0) as u32;
                self.form.set_max_pages(pages);
            }
            _ => {}
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<UiCommand> {
        if key.kind != KeyEventKind::Press {
            return None;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('s') => Some(UiCommand::Download(ExportFormat::Json)),
                KeyCode::Char('d') => Some(UiCommand::Download(ExportFormat::Markdown)),
                KeyCode::Char('r') => Some(UiCommand::Reset),
                KeyCode::Char('l') => {
                    self.toggle_selected_links();
                    None
                }
                KeyCode::Char('c') => {
                    self.should_quit = true;
                    None
                }
                _ => None,
            };
        }

        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab => self.set_focus(self.focus.next()),
            KeyCode::BackTab => self.set_focus(self.focus.previous()),
            KeyCode::Enter => {
                if self.focus == Field::FollowExternal {
                    self.form.follow_external_links = !self.form.follow_external_links;
                } else {
                    return Some(UiCommand::Submit(self.form.clone()));
                }
            }
            KeyCode::Up => self.select_page(self.selected_page.saturating_sub(1)),
            KeyCode::Down => self.select_page(self.selected_page + 1),
            KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(10),
            KeyCode::PageDown => self.scroll += 10,
            KeyCode::Left if self.focus.is_text() => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right if self.focus.is_text() => {
                self.cursor = (self.cursor + 1).min(self.focused_text_len());
            }
            KeyCode::Left => self.adjust(-1),
            KeyCode::Right => self.adjust(1),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.focused_text_len(),
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    let cursor = self.cursor;
                    if let Some(text) = self.focused_text_mut() {
                        remove_char(text, cursor - 1);
                        self.cursor -= 1;
                    }
                }
            }
            KeyCode::Delete => {
                let cursor = self.cursor;
                if let Some(text) = self.focused_text_mut() {
                    remove_char(text, cursor);
                }
            }
            KeyCode::Char(c) => match self.focus {
                Field::Url | Field::Instructions => {
                    let cursor = self.cursor;
                    if let Some(text) = self.focused_text_mut() {
                        insert_char(text, cursor, c);
                        self.cursor += 1;
                    }
                }
                Field::FollowExternal if c == ' ' => {
                    self.form.follow_external_links = !self.form.follow_external_links;
                }
                Field::Depth | Field::MaxPages => match c {
                    '+' | '=' => self.adjust(1),
                    '-' => self.adjust(-1),
                    _ => {}
                },
                Field::Submit if c == ' ' => return Some(UiCommand::Submit(self.form.clone())),
                _ => {}
            },
            _ => {}
        }
        None
    }
}

fn byte_index(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

fn insert_char(text: &mut String, char_index: usize, c: char) {
    let at = byte_index(text, char_index);
    text.insert(at, c);
}

fn remove_char(text: &mut String, char_index: usize) {
    if char_index < text.chars().count() {
        let at = byte_index(text, char_index);
        text.remove(at);
    }
}
