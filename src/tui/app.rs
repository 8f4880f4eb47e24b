//! Terminal-side state of the browser: search input, focus, cursor and
//! key bindings. Everything archive-related is delegated to the
//! [`BrowserController`].

use idgames_core::browser::{BrowserController, BrowserEvent, BrowserMode, RequestGeneration};
use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::debug;

/// Lines moved by page up/down in the detail pane.
const DETAIL_PAGE: u16 = 10;

/// Which pane receives typed keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Search,
    Results,
}

pub struct App {
    controller: BrowserController,
    input: String,
    focus: Focus,
    cursor: usize,
    detail_scroll: u16,
    shown_generation: RequestGeneration,
    quit: bool,
}

impl App {
    pub fn new(controller: BrowserController) -> Self {
        let shown_generation = controller.state().generation();
        Self {
            controller,
            input: String::new(),
            focus: Focus::Search,
            cursor: 0,
            detail_scroll: 0,
            shown_generation,
            quit: false,
        }
    }

    pub fn controller(&self) -> &BrowserController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut BrowserController {
        &mut self.controller
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn detail_scroll(&self) -> u16 {
        self.detail_scroll
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// Lists the latest uploads, as an empty search does.
    pub fn start(&mut self) {
        self.submit();
    }

    /// Applies a background event and keeps the cursor on the list.
    pub fn handle_event(&mut self, event: BrowserEvent) {
        self.controller.handle_event(event);
        let state = self.controller.state();
        if !state.is_loading() && state.generation() != self.shown_generation {
            self.shown_generation = state.generation();
            self.cursor = 0;
            self.detail_scroll = 0;
        }
        let len = self.controller.state().records().len();
        self.cursor = self.cursor.min(len.saturating_sub(1));
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.quit = true;
            return;
        }

        if self.controller.state().mode() == BrowserMode::ConfirmPending {
            self.handle_confirm_key(key);
            return;
        }

        match self.focus {
            Focus::Search => self.handle_search_key(key),
            Focus::Results => self.handle_results_key(key),
        }
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('y' | 'Y') | KeyCode::Enter => {
                self.controller.accept();
            }
            KeyCode::Char('n' | 'N') | KeyCode::Esc => {
                self.controller.decline();
            }
            _ => {}
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.quit = true,
            KeyCode::Enter => {
                self.submit();
                self.focus = Focus::Results;
            }
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Down | KeyCode::Tab => self.focus = Focus::Results,
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.input.push(c);
            }
            _ => {}
        }
    }

    fn handle_results_key(&mut self, key: KeyEvent) {
        let detailed = self.controller.state().mode() == BrowserMode::Detailed;
        match key.code {
            KeyCode::Char('q') => self.quit = true,
            KeyCode::Char('/') | KeyCode::Tab => self.focus = Focus::Search,
            KeyCode::Esc => {
                if detailed {
                    self.controller.close_detail();
                } else {
                    self.focus = Focus::Search;
                }
            }
            KeyCode::Up | KeyCode::Char('k') => self.move_cursor(self.cursor.saturating_sub(1)),
            KeyCode::Down | KeyCode::Char('j') => self.move_cursor(self.cursor.saturating_add(1)),
            KeyCode::Home | KeyCode::Char('g') => self.move_cursor(0),
            KeyCode::End | KeyCode::Char('G') => self.move_cursor(usize::MAX),
            KeyCode::Enter if detailed => {
                self.controller.confirm(self.cursor);
            }
            KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => {
                if self.controller.select(self.cursor) {
                    self.detail_scroll = 0;
                }
            }
            KeyCode::Left | KeyCode::Char('h') | KeyCode::Backspace => {
                self.controller.close_detail();
            }
            KeyCode::Char('d') => {
                self.controller.confirm(self.cursor);
            }
            KeyCode::PageDown => self.detail_scroll = self.detail_scroll.saturating_add(DETAIL_PAGE),
            KeyCode::PageUp => self.detail_scroll = self.detail_scroll.saturating_sub(DETAIL_PAGE),
            _ => {}
        }
    }

    fn submit(&mut self) {
        if let Err(error) = self.controller.submit_input(&self.input) {
            debug!(error = %error, "search input rejected");
        }
    }

    fn move_cursor(&mut self, row: usize) {
        let len = self.controller.state().records().len();
        if len == 0 {
            return;
        }
        let row = row.min(len - 1);
        if row == self.cursor {
            return;
        }
        self.cursor = row;
        if self.controller.state().mode() == BrowserMode::Detailed {
            self.controller.select(row);
            self.detail_scroll = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use idgames_core::api::{ApiError, FileLookup, MetadataSource, Record, SearchRequest};
    use idgames_core::config::ArchiveConfig;
    use idgames_core::download::MirrorDownloader;

    use super::*;

    struct EmptyArchive;

    #[async_trait]
    impl MetadataSource for EmptyArchive {
        async fn fetch(&self, lookup: &FileLookup) -> Result<Record, ApiError> {
            Ok(Record {
                id: lookup.id.unwrap_or_default(),
                ..Record::default()
            })
        }

        async fn search(&self, _request: &SearchRequest) -> Result<Vec<Record>, ApiError> {
            Ok(Vec::new())
        }

        async fn latest_files(&self, _limit: u32, _start_id: u64) -> Result<Vec<Record>, ApiError> {
            Ok(Vec::new())
        }
    }

    fn app() -> App {
        let downloader = MirrorDownloader::new(&ArchiveConfig::default()).unwrap();
        let controller = BrowserController::new(Arc::new(EmptyArchive), Arc::new(downloader), ".");
        App::new(controller)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn records(count: u64) -> Vec<Record> {
        (1..=count)
            .map(|id| Record {
                id,
                title: format!("map {id}"),
                filename: format!("map{id}.zip"),
                ..Record::default()
            })
            .collect()
    }

    async fn listed_app(count: u64) -> App {
        let mut app = app();
        let generation = app.controller_mut().request_latest(10, 0);
        app.handle_event(BrowserEvent::ResultsReady {
            generation,
            records: records(count),
            failures: Vec::new(),
        });
        app.focus = Focus::Results;
        app
    }

    #[test]
    fn test_typing_edits_search_input() {
        let mut app = app();
        for c in "doom".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        app.handle_key(key(KeyCode::Backspace));
        assert_eq!(app.input(), "doo");
        assert_eq!(app.focus(), Focus::Search);
    }

    #[test]
    fn test_ctrl_c_quits_from_any_focus() {
        let mut app = app();
        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit());
        assert_eq!(app.input(), "");
    }

    #[test]
    fn test_short_query_sets_status_without_request() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('a')));
        app.handle_key(key(KeyCode::Char('b')));
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.focus(), Focus::Results);
        assert!(!app.controller().state().status().is_empty());
        assert_eq!(app.controller().state().mode(), BrowserMode::Empty);
    }

    #[tokio::test]
    async fn test_cursor_is_clamped_to_list() {
        let mut app = listed_app(3).await;
        app.handle_key(key(KeyCode::End));
        assert_eq!(app.cursor(), 2);
        app.handle_key(key(KeyCode::Down));
        assert_eq!(app.cursor(), 2);
        app.handle_key(key(KeyCode::Home));
        app.handle_key(key(KeyCode::Up));
        assert_eq!(app.cursor(), 0);
    }

    #[tokio::test]
    async fn test_enter_opens_detail_then_asks_to_confirm() {
        let mut app = listed_app(3).await;
        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.controller().state().mode(), BrowserMode::Detailed);
        assert_eq!(app.controller().state().selected(), Some(1));

        app.handle_key(key(KeyCode::Down));
        assert_eq!(app.controller().state().selected(), Some(2));

        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.controller().state().mode(), BrowserMode::ConfirmPending);
        assert_eq!(app.controller().state().confirm_row(), Some(2));

        app.handle_key(key(KeyCode::Char('n')));
        assert_eq!(app.controller().state().mode(), BrowserMode::Detailed);
    }

    #[tokio::test]
    async fn test_new_results_reset_cursor() {
        let mut app = listed_app(5).await;
        app.handle_key(key(KeyCode::End));
        assert_eq!(app.cursor(), 4);

        let generation = app.controller_mut().request_latest(10, 0);
        app.handle_event(BrowserEvent::ResultsReady {
            generation,
            records: records(2),
            failures: Vec::new(),
        });
        assert_eq!(app.cursor(), 0);
    }
}
