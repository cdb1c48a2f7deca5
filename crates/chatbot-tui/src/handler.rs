use std::path::PathBuf;
use anyhow::Result;
use chatbot_core::Attachment;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use tracing::{debug, info};
use crate::app::{char_to_byte_index, App, InputMode};
use crate::tui::AppEvent;

const WHEEL_LINES: u16 = 3;

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key).await?,
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick_animation(),
        AppEvent::Reply(outcome) => app.receive_reply(outcome),
    }
    Ok(())
}

async fn handle_key(app: &mut App, key: KeyEvent) -> Result<()> {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return Ok(());
    }

    match app.input_mode {
        InputMode::Chat => handle_chat_key(app, key),
        InputMode::AttachFile => handle_file_prompt_key(app, key).await,
    }

    Ok(())
}

fn handle_chat_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Esc => app.should_quit = true,

        // Enter sends; Shift/Alt+Enter starts a new line
        KeyCode::Enter => {
            if key.modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) {
                app.insert_char('\n');
            } else {
                app.submit();
            }
        }

        // Attachments
        KeyCode::Char('o') if ctrl => app.open_file_prompt(),
        KeyCode::Char('x') if ctrl => {
            if let Some(removed) = app.session.detach() {
                debug!(file = removed.file_name(), "Attachment removed");
            }
        }

        // Chat pane scrolling
        KeyCode::PageUp => app.scroll_chat_up(app.chat_page()),
        KeyCode::PageDown => app.scroll_chat_down(app.chat_page()),

        // Draft editing
        KeyCode::Backspace => app.backspace(),
        KeyCode::Delete => app.delete(),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Up => app.cursor_up(),
        KeyCode::Down => app.cursor_down(),
        KeyCode::Home => app.cursor_line_start(),
        KeyCode::End => app.cursor_line_end(),
        KeyCode::Char(c) if !ctrl => app.insert_char(c),

        _ => {}
    }
}

async fn handle_file_prompt_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.close_file_prompt(),
        KeyCode::Enter => {
            if app.file_prompt.trim().is_empty() {
                app.close_file_prompt();
                return;
            }

            let path = expand_path(&app.file_prompt);
            match Attachment::from_path(&path).await {
                Ok(attachment) => {
                    info!(file = attachment.file_name(), bytes = attachment.len(), "File attached");
                    app.session.attach(attachment);
                    app.close_file_prompt();
                }
                Err(err) => {
                    debug!(path = %path.display(), error = %err, "Could not attach file");
                    app.file_prompt_error = Some(format!("{err:#}"));
                }
            }
        }
        KeyCode::Backspace => {
            if app.file_prompt_cursor > 0 {
                app.file_prompt_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.file_prompt, app.file_prompt_cursor);
                app.file_prompt.remove(byte_pos);
            }
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.file_prompt, app.file_prompt_cursor);
            app.file_prompt.insert(byte_pos, c);
            app.file_prompt_cursor += 1;
        }
        KeyCode::Left => {
            app.file_prompt_cursor = app.file_prompt_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.file_prompt.chars().count();
            app.file_prompt_cursor = (app.file_prompt_cursor + 1).min(char_count);
        }
        KeyCode::Home => app.file_prompt_cursor = 0,
        KeyCode::End => app.file_prompt_cursor = app.file_prompt.chars().count(),
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let over_chat = app
        .chat_area
        .map(|area| {
            mouse.column >= area.x
                && mouse.column < area.x + area.width
                && mouse.row >= area.y
                && mouse.row < area.y + area.height
        })
        .unwrap_or(false);

    if !over_chat {
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollUp => app.scroll_chat_up(WHEEL_LINES),
        MouseEventKind::ScrollDown => app.scroll_chat_down(WHEEL_LINES),
        _ => {}
    }
}

/// Turn typed or pasted input into a path: trims whitespace and
/// surrounding quotes (drag-and-drop adds them), expands a leading `~/`.
fn expand_path(input: &str) -> PathBuf {
    let trimmed = input.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| trimmed.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
        .unwrap_or(trimmed);

    if let Some(rest) = unquoted.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(unquoted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::{test_app, type_str, unreachable_app};
    use chatbot_core::{Author, Message, FILE_ATTACHED_LABEL, TRANSPORT_ERROR_TEXT};
    use crossterm::event::{KeyEventKind, KeyEventState};
    use std::io::Write;

    fn key(code: KeyCode) -> AppEvent {
        key_with(code, KeyModifiers::NONE)
    }

    fn key_with(code: KeyCode, modifiers: KeyModifiers) -> AppEvent {
        AppEvent::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        })
    }

    async fn type_keys(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_event(app, key(KeyCode::Char(c))).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_enter_on_empty_draft_does_nothing() {
        let (mut app, _rx) = test_app();
        handle_event(&mut app, key(KeyCode::Enter)).await.unwrap();
        assert!(app.session.messages().is_empty());
        assert!(!app.session.is_in_flight());
    }

    #[tokio::test]
    async fn test_shift_enter_inserts_newline() {
        let (mut app, _rx) = test_app();
        type_keys(&mut app, "a").await;
        handle_event(&mut app, key_with(KeyCode::Enter, KeyModifiers::SHIFT)).await.unwrap();
        type_keys(&mut app, "b").await;

        assert_eq!(app.session.draft_text(), "a\nb");
        assert!(app.session.messages().is_empty());
    }

    #[tokio::test]
    async fn test_enter_sends_and_reply_resolves() {
        let (mut app, mut rx) = unreachable_app().await;
        type_keys(&mut app, "ping").await;

        handle_event(&mut app, key(KeyCode::Enter)).await.unwrap();
        assert_eq!(app.session.messages(), &[Message::user("ping")]);
        assert!(app.session.is_in_flight());

        // Typing while waiting is allowed, a second Enter is ignored
        type_keys(&mut app, "next").await;
        handle_event(&mut app, key(KeyCode::Enter)).await.unwrap();
        assert_eq!(app.session.messages().len(), 1);

        let reply = rx.recv().await.expect("reply event");
        handle_event(&mut app, reply).await.unwrap();

        let last = app.session.messages().last().unwrap();
        assert_eq!(last.author, Author::Bot);
        assert_eq!(last.text, TRANSPORT_ERROR_TEXT);
        assert!(!app.session.is_in_flight());
        assert_eq!(app.session.draft_text(), "next");
    }

    #[tokio::test]
    async fn test_control_chars_are_not_typed() {
        let (mut app, _rx) = test_app();
        handle_event(&mut app, key_with(KeyCode::Char('k'), KeyModifiers::CONTROL)).await.unwrap();
        assert_eq!(app.session.draft_text(), "");
    }

    #[tokio::test]
    async fn test_ctrl_c_quits() {
        let (mut app, _rx) = test_app();
        handle_event(&mut app, key_with(KeyCode::Char('c'), KeyModifiers::CONTROL)).await.unwrap();
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_attach_file_through_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::File::create(&path).unwrap().write_all(b"some notes").unwrap();

        let (mut app, _rx) = test_app();
        handle_event(&mut app, key_with(KeyCode::Char('o'), KeyModifiers::CONTROL)).await.unwrap();
        assert_eq!(app.input_mode, InputMode::AttachFile);

        type_keys(&mut app, &format!("\"{}\"", path.display())).await;
        handle_event(&mut app, key(KeyCode::Enter)).await.unwrap();

        assert_eq!(app.input_mode, InputMode::Chat);
        let attached = app.session.attachment().expect("file attached");
        assert_eq!(attached.file_name(), "notes.txt");
        assert_eq!(attached.len(), 10);

        // File alone is sendable and shows the label
        handle_event(&mut app, key(KeyCode::Enter)).await.unwrap();
        assert_eq!(app.session.messages(), &[Message::user(FILE_ATTACHED_LABEL)]);
        assert!(app.session.attachment().is_none());
    }

    #[tokio::test]
    async fn test_attach_missing_file_keeps_prompt_open() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _rx) = test_app();
        app.open_file_prompt();
        type_keys(&mut app, &dir.path().join("nope.bin").display().to_string()).await;

        handle_event(&mut app, key(KeyCode::Enter)).await.unwrap();

        assert_eq!(app.input_mode, InputMode::AttachFile);
        assert!(app.file_prompt_error.is_some());
        assert!(app.session.attachment().is_none());
    }

    #[tokio::test]
    async fn test_ctrl_x_removes_attachment() {
        let (mut app, _rx) = test_app();
        app.session.attach(Attachment::new("a.txt", b"a".to_vec()));
        handle_event(&mut app, key_with(KeyCode::Char('x'), KeyModifiers::CONTROL)).await.unwrap();
        assert!(app.session.attachment().is_none());
    }

    #[tokio::test]
    async fn test_tick_advances_typing_indicator() {
        let (mut app, _rx) = unreachable_app().await;
        type_str(&mut app, "hi");
        app.submit();

        handle_event(&mut app, AppEvent::Tick).await.unwrap();
        assert_eq!(app.animation_frame, 1);
    }

    #[test]
    fn test_expand_path_strips_quotes() {
        assert_eq!(expand_path("  '/tmp/a b.txt' "), PathBuf::from("/tmp/a b.txt"));
        assert_eq!(expand_path("\"/tmp/x\""), PathBuf::from("/tmp/x"));
        assert_eq!(expand_path("relative/file"), PathBuf::from("relative/file"));
    }
}
