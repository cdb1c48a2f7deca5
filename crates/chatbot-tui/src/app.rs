use chatbot_core::{ChatClient, ChatSession};
use ratatui::layout::Rect;
use tokio::sync::mpsc;
use crate::tui::AppEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Chat,
    /// File path popup is open
    AttachFile,
}

/// Convert a character index to a byte index for UTF-8 safe string operations
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,

    // Conversation
    pub session: ChatSession,
    pub client: ChatClient,
    events: mpsc::UnboundedSender<AppEvent>,

    // Draft editor
    pub cursor: usize, // char index into the draft text

    // Attach-file popup
    pub file_prompt: String,
    pub file_prompt_cursor: usize,
    pub file_prompt_error: Option<String>,

    // Chat pane scroll state (dimensions updated during render)
    pub chat_scroll: u16,
    pub chat_height: u16,
    pub chat_total_lines: u16,
    pub follow_bottom: bool,
    pub chat_area: Option<Rect>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation
}

impl App {
    pub fn new(client: ChatClient, events: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Chat,

            session: ChatSession::new(),
            client,
            events,

            cursor: 0,

            file_prompt: String::new(),
            file_prompt_cursor: 0,
            file_prompt_error: None,

            chat_scroll: 0,
            chat_height: 0,
            chat_total_lines: 0,
            follow_bottom: true,
            chat_area: None,

            animation_frame: 0,
        }
    }

    /// Send the draft on a background task. The outcome comes back as
    /// `AppEvent::Reply`.
    pub fn submit(&mut self) {
        let Some(outgoing) = self.session.begin_send() else {
            return;
        };

        self.cursor = 0;
        self.animation_frame = 0;
        self.follow_bottom = true;

        let client = self.client.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let outcome = client.send(&outgoing).await;
            // Receiver is gone only when the app is shutting down
            let _ = events.send(AppEvent::Reply(outcome));
        });
    }

    pub fn receive_reply(&mut self, outcome: Result<String, chatbot_core::SendError>) {
        self.session.finish_send(outcome);
        self.follow_bottom = true;
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.session.is_in_flight() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Draft editing

    pub fn insert_char(&mut self, c: char) {
        let byte_pos = char_to_byte_index(self.session.draft_text(), self.cursor);
        self.session.draft_text_mut().insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(self.session.draft_text(), self.cursor);
            self.session.draft_text_mut().remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.draft_char_count() {
            let byte_pos = char_to_byte_index(self.session.draft_text(), self.cursor);
            self.session.draft_text_mut().remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.draft_char_count());
    }

    pub fn cursor_line_start(&mut self) {
        let (row, _) = self.cursor_row_col();
        self.cursor = self.cursor_at(row, 0);
    }

    pub fn cursor_line_end(&mut self) {
        let (row, _) = self.cursor_row_col();
        self.cursor = self.cursor_at(row, usize::MAX);
    }

    pub fn cursor_up(&mut self) {
        let (row, col) = self.cursor_row_col();
        if row > 0 {
            self.cursor = self.cursor_at(row - 1, col);
        }
    }

    pub fn cursor_down(&mut self) {
        let (row, col) = self.cursor_row_col();
        if row + 1 < self.draft_line_lengths().len() {
            self.cursor = self.cursor_at(row + 1, col);
        }
    }

    /// Row and column of the cursor inside the (possibly multiline) draft
    pub fn cursor_row_col(&self) -> (usize, usize) {
        let mut row = 0;
        let mut col = 0;
        for c in self.session.draft_text().chars().take(self.cursor) {
            if c == '\n' {
                row += 1;
                col = 0;
            } else {
                col += 1;
            }
        }
        (row, col)
    }

    fn cursor_at(&self, row: usize, col: usize) -> usize {
        let lengths = self.draft_line_lengths();
        let before: usize = lengths.iter().take(row).map(|len| len + 1).sum();
        before + col.min(lengths.get(row).copied().unwrap_or(0))
    }

    fn draft_line_lengths(&self) -> Vec<usize> {
        self.session
            .draft_text()
            .split('\n')
            .map(|line| line.chars().count())
            .collect()
    }

    fn draft_char_count(&self) -> usize {
        self.session.draft_text().chars().count()
    }

    // Attach-file popup

    pub fn open_file_prompt(&mut self) {
        self.input_mode = InputMode::AttachFile;
        self.file_prompt.clear();
        self.file_prompt_cursor = 0;
        self.file_prompt_error = None;
    }

    pub fn close_file_prompt(&mut self) {
        self.input_mode = InputMode::Chat;
        self.file_prompt.clear();
        self.file_prompt_cursor = 0;
        self.file_prompt_error = None;
    }

    // Chat pane scrolling

    pub fn max_chat_scroll(&self) -> u16 {
        self.chat_total_lines.saturating_sub(self.chat_height)
    }

    pub fn scroll_chat_up(&mut self, lines: u16) {
        self.follow_bottom = false;
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_chat_down(&mut self, lines: u16) {
        let max = self.max_chat_scroll();
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(max);
        if self.chat_scroll >= max {
            self.follow_bottom = true;
        }
    }

    pub fn chat_page(&self) -> u16 {
        (self.chat_height / 2).max(1)
    }
}
