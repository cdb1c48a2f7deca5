use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Margin, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{
        Block, Borders, Clear, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState,
    },
};
use chatbot_core::{Attachment, Author};
use crate::app::{App, InputMode};

const USER_BUBBLE: Style = Style::new().fg(Color::White).bg(Color::Blue);
const BOT_BUBBLE: Style = Style::new().fg(Color::White).bg(Color::DarkGray);
const INPUT_ROWS: u16 = 3;

/// One row of wrapped text and the char index in the source where it starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedLine {
    pub start: usize,
    pub text: String,
}

/// Word-wrap `text` to `width` columns, keeping explicit line breaks and
/// hard-splitting words longer than a line. Spaces are kept as typed,
/// except the single space a line is broken at.
pub fn wrap_lines(text: &str, width: usize) -> Vec<WrappedLine> {
    let width = width.max(1);
    let mut out = Vec::new();
    let mut offset = 0;

    for raw_line in text.split('\n') {
        let mut current = String::new();
        let mut current_len = 0;
        let mut line_start = offset;
        let mut first_word = true;
        let mut word_start = offset;

        for word in raw_line.split(' ') {
            let word_len = word.chars().count();
            let needed = if first_word { word_len } else { current_len + 1 + word_len };

            if needed <= width {
                if !first_word {
                    current.push(' ');
                    current_len += 1;
                }
                current.push_str(word);
                current_len += word_len;
            } else {
                if current_len > 0 {
                    out.push(WrappedLine {
                        start: line_start,
                        text: std::mem::take(&mut current),
                    });
                }

                // Word longer than a full line
                let mut chars: Vec<char> = word.chars().collect();
                let mut chunk_start = word_start;
                while chars.len() > width {
                    let rest = chars.split_off(width);
                    out.push(WrappedLine {
                        start: chunk_start,
                        text: chars.into_iter().collect(),
                    });
                    chunk_start += width;
                    chars = rest;
                }
                line_start = chunk_start;
                current = chars.into_iter().collect();
                current_len = current.chars().count();
            }

            first_word = false;
            word_start += word_len + 1;
        }

        out.push(WrappedLine {
            start: line_start,
            text: current,
        });
        offset += raw_line.chars().count() + 1;
    }

    out
}

pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    wrap_lines(text, width).into_iter().map(|line| line.text).collect()
}

/// Row and column of char index `cursor` within wrapped lines
pub fn wrapped_cursor(lines: &[WrappedLine], cursor: usize) -> (usize, usize) {
    let row = lines.iter().rposition(|line| line.start <= cursor).unwrap_or(0);
    let Some(line) = lines.get(row) else {
        return (0, 0);
    };
    let col = cursor.saturating_sub(line.start).min(line.text.chars().count());
    (row, col)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, chat, attachment line, input, footer
    let [header_area, chat_area, attachment_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(1),
        Constraint::Length(INPUT_ROWS + 2),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_attachment(app, frame, attachment_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);

    if app.input_mode == InputMode::AttachFile {
        render_file_prompt(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let host = app.client.endpoint().host_str().unwrap_or_default().to_string();

    let title = Line::from(vec![
        Span::styled(" AI Chatbot ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(host, Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::Black));
    frame.render_widget(header, area);
}

fn bubble_lines(text: &str, style: Style, alignment: Alignment, wrap_width: usize) -> Vec<Line<'static>> {
    wrap_text(text, wrap_width)
        .into_iter()
        .map(|line| Line::from(Span::styled(format!(" {} ", line), style)).alignment(alignment))
        .collect()
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let inner = chat_block.inner(area);
    app.chat_area = Some(area);
    app.chat_height = inner.height;

    // Bubbles take at most two thirds of the pane, minus one column of padding each side
    let wrap_width = ((inner.width as usize * 2) / 3).saturating_sub(2).max(8);

    let mut lines: Vec<Line> = Vec::new();

    if app.session.messages().is_empty() && !app.session.is_in_flight() {
        lines.push(Line::from(Span::styled(
            "Say hello to start the conversation...",
            Style::default().fg(Color::DarkGray),
        )));
    }

    for msg in app.session.messages() {
        let (style, alignment) = match msg.author {
            Author::User => (USER_BUBBLE, Alignment::Right),
            Author::Bot => (BOT_BUBBLE, Alignment::Left),
        };
        lines.extend(bubble_lines(&msg.text, style, alignment, wrap_width));
        lines.push(Line::default());
    }

    if app.session.is_in_flight() {
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!(" {:<3} ", dots),
            BOT_BUBBLE.add_modifier(Modifier::ITALIC),
        )));
    }

    app.chat_total_lines = lines.len().min(u16::MAX as usize) as u16;
    if app.follow_bottom {
        app.chat_scroll = app.max_chat_scroll();
    } else {
        app.chat_scroll = app.chat_scroll.min(app.max_chat_scroll());
    }

    let chat = Paragraph::new(Text::from(lines))
        .block(chat_block)
        .scroll((app.chat_scroll, 0));
    frame.render_widget(chat, area);

    if app.chat_total_lines > app.chat_height {
        let mut scrollbar_state = ScrollbarState::new(app.max_chat_scroll() as usize)
            .position(app.chat_scroll as usize);
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight),
            area.inner(Margin { vertical: 1, horizontal: 0 }),
            &mut scrollbar_state,
        );
    }
}

fn format_size(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    let bytes_f = bytes as f64;
    if bytes_f < KB {
        format!("{} B", bytes)
    } else if bytes_f < KB * KB {
        format!("{:.1} KB", bytes_f / KB)
    } else {
        format!("{:.1} MB", bytes_f / (KB * KB))
    }
}

fn attachment_label(attachment: &Attachment) -> String {
    format!(" [file] {} ({}) ", attachment.file_name(), format_size(attachment.len()))
}

fn render_attachment(app: &App, frame: &mut Frame, area: Rect) {
    let line = match app.session.attachment() {
        Some(attachment) => Line::from(vec![
            Span::styled(attachment_label(attachment), Style::default().fg(Color::Black).bg(Color::Cyan)),
            Span::styled("  Ctrl+X to remove", Style::default().fg(Color::DarkGray)),
        ]),
        None => Line::from(Span::styled(
            " No file attached. Ctrl+O to attach one.",
            Style::default().fg(Color::DarkGray),
        )),
    };

    frame.render_widget(Paragraph::new(line), area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let border_color = if app.input_mode == InputMode::Chat { Color::Cyan } else { Color::DarkGray };
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));

    let inner = input_block.inner(area);

    // Wrap like a textarea so the cursor always stays inside the box
    let wrapped = wrap_lines(app.session.draft_text(), inner.width as usize);
    let (row, col) = wrapped_cursor(&wrapped, app.cursor);

    // Keep the cursor row inside the visible rows
    let input_scroll = (row as u16).saturating_sub(inner.height.saturating_sub(1));

    let input = if app.session.draft_text().is_empty() {
        Paragraph::new(Span::styled("Type your message...", Style::default().fg(Color::DarkGray)))
    } else {
        let lines: Vec<Line> = wrapped.into_iter().map(|line| Line::from(line.text)).collect();
        Paragraph::new(Text::from(lines)).scroll((input_scroll, 0))
    };
    frame.render_widget(input.block(input_block), area);

    if app.input_mode == InputMode::Chat && inner.width > 0 && inner.height > 0 {
        let cursor_x = (col as u16).min(inner.width - 1);
        let cursor_y = (row as u16 - input_scroll).min(inner.height - 1);
        frame.set_cursor_position((inner.x + cursor_x, inner.y + cursor_y));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = match app.input_mode {
        InputMode::Chat => (" CHAT ", Style::default().bg(Color::Blue).fg(Color::White)),
        InputMode::AttachFile => (" ATTACH ", Style::default().bg(Color::Yellow).fg(Color::Black)),
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);
    let waiting_style = Style::default().bg(Color::Black).fg(Color::DarkGray);

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::raw(" ")];

    let hints = match app.input_mode {
        InputMode::Chat => {
            let send_label = if app.session.is_in_flight() {
                Span::styled(" waiting ", waiting_style)
            } else {
                Span::styled(" send ", label_style)
            };
            vec![
                Span::styled(" Enter ", key_style),
                send_label,
                Span::styled(" Shift+Enter ", key_style),
                Span::styled(" newline ", label_style),
                Span::styled(" Ctrl+O ", key_style),
                Span::styled(" attach ", label_style),
                Span::styled(" PgUp/PgDn ", key_style),
                Span::styled(" scroll ", label_style),
                Span::styled(" Esc ", key_style),
                Span::styled(" quit ", label_style),
            ]
        }
        InputMode::AttachFile => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" attach ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" cancel ", label_style),
        ],
    };
    spans.extend(hints);

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_file_prompt(app: &App, frame: &mut Frame, area: Rect) {
    // Calculate popup size and position (centered)
    let popup_width = 64.min(area.width.saturating_sub(4));
    let popup_height = 7.min(area.height);

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Attach File ");

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);
    if inner.height < 3 || inner.width == 0 {
        return;
    }

    let instructions = Paragraph::new("Enter a file path. Press Enter to attach, Esc to cancel.")
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(instructions, Rect::new(inner.x, inner.y, inner.width, 1));

    // Show the tail of long paths so the cursor end stays visible
    let input_area = Rect::new(inner.x, inner.y + 2, inner.width, 1);
    let visible = input_area.width as usize;
    let skip = app.file_prompt_cursor.saturating_sub(visible.saturating_sub(1));
    let shown: String = app.file_prompt.chars().skip(skip).take(visible).collect();
    frame.render_widget(
        Paragraph::new(shown).style(Style::default().fg(Color::Cyan)),
        input_area,
    );

    let cursor_x = (app.file_prompt_cursor - skip) as u16;
    frame.set_cursor_position((input_area.x + cursor_x, input_area.y));

    if let Some(err) = &app.file_prompt_error {
        if inner.height > 4 {
            let status = Paragraph::new(err.as_str()).style(Style::default().fg(Color::Red));
            frame.render_widget(status, Rect::new(inner.x, inner.y + 4, inner.width, 1));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::test_app;
    use chatbot_core::{Message, SendError, StatusCode};
    use ratatui::{backend::TestBackend, layout::Position, Terminal};

    fn draw(app: &mut App, width: u16, height: u16) -> Vec<String> {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| render(app, frame)).unwrap();

        terminal
            .backend()
            .buffer()
            .content()
            .chunks(width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect())
            .collect()
    }

    fn row_containing<'a>(rows: &'a [String], needle: &str) -> &'a str {
        rows.iter()
            .find(|row| row.contains(needle))
            .unwrap_or_else(|| panic!("{needle:?} not rendered"))
    }

    #[test]
    fn test_wrap_text_words() {
        assert_eq!(wrap_text("the quick brown fox", 9), vec!["the quick", "brown fox"]);
    }

    #[test]
    fn test_wrap_text_keeps_newlines_and_splits_long_words() {
        assert_eq!(wrap_text("ab\n\nabcdefgh", 3), vec!["ab", "", "abc", "def", "gh"]);
        assert_eq!(wrap_text("", 10), vec![""]);
    }

    #[test]
    fn test_wrap_text_keeps_leading_spaces() {
        assert_eq!(wrap_text("  hi there ", 20), vec!["  hi there "]);
        assert_eq!(wrap_text("a  b", 20), vec!["a  b"]);
    }

    #[test]
    fn test_wrap_lines_track_source_offsets() {
        let lines = wrap_lines("one two\nabcdefg", 3);
        let starts: Vec<usize> = lines.iter().map(|line| line.start).collect();
        let texts: Vec<&str> = lines.iter().map(|line| line.text.as_str()).collect();
        assert_eq!(texts, vec!["one", "two", "abc", "def", "g"]);
        assert_eq!(starts, vec![0, 4, 8, 11, 14]);
    }

    #[test]
    fn test_wrapped_cursor() {
        let lines = wrap_lines("one two\nabcdefg", 3);
        assert_eq!(wrapped_cursor(&lines, 0), (0, 0));
        assert_eq!(wrapped_cursor(&lines, 5), (1, 1));
        assert_eq!(wrapped_cursor(&lines, 15), (4, 1));
        assert_eq!(wrapped_cursor(&wrap_lines("", 10), 0), (0, 0));
    }

    #[test]
    fn test_long_draft_wraps_in_input() {
        let (mut app, _rx) = test_app();
        let draft = format!("{}TAILMARK", "word ".repeat(20));
        app.session.set_draft_text(draft.clone());
        app.cursor = draft.chars().count();

        let mut terminal = Terminal::new(TestBackend::new(60, 20)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        let rows: Vec<String> = terminal
            .backend()
            .buffer()
            .content()
            .chunks(60)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect())
            .collect();
        // 58 inner columns: eleven words, then nine more plus the tail
        assert!(row_containing(&rows, "TAILMARK").contains("word TAILMARK"));
        assert_eq!(terminal.get_cursor_position().unwrap(), Position::new(54, 16));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn test_user_right_bot_left() {
        let (mut app, _rx) = test_app();
        app.session.set_draft_text("hi bot");
        app.session.begin_send();
        app.session.finish_send(Ok("hi human".to_string()));
        assert_eq!(app.session.messages()[1], Message::bot("hi human"));

        let rows = draw(&mut app, 60, 20);

        let user_row = row_containing(&rows, "hi bot");
        let bot_row = row_containing(&rows, "hi human");
        let user_col = user_row.find("hi bot").unwrap();
        let bot_col = bot_row.find("hi human").unwrap();
        assert!(user_col > 30, "user bubble should hug the right edge: {user_row:?}");
        assert!(bot_col < 10, "bot bubble should hug the left edge: {bot_row:?}");
    }

    #[test]
    fn test_typing_indicator_only_while_in_flight() {
        let (mut app, _rx) = test_app();
        app.session.set_draft_text("question");
        app.session.begin_send();
        app.animation_frame = 2;

        let rows = draw(&mut app, 60, 20);
        assert!(rows.iter().any(|row| row.contains(" ... ")));

        app.session.finish_send(Err(SendError::Status(StatusCode::INTERNAL_SERVER_ERROR)));
        let rows = draw(&mut app, 60, 20);
        assert!(!rows.iter().any(|row| row.contains(" ... ")));
        row_containing(&rows, "Error: Unable to get response");
    }

    #[test]
    fn test_follows_bottom_when_history_overflows() {
        let (mut app, _rx) = test_app();
        for i in 0..20 {
            app.session.set_draft_text(format!("message {i}"));
            app.session.begin_send();
            app.session.finish_send(Ok(format!("reply {i}")));
        }

        let rows = draw(&mut app, 60, 16);

        assert!(app.chat_scroll > 0);
        assert_eq!(app.chat_scroll, app.max_chat_scroll());
        row_containing(&rows, "reply 19");
    }

    #[test]
    fn test_attachment_line_and_placeholder() {
        let (mut app, _rx) = test_app();
        let rows = draw(&mut app, 80, 16);
        row_containing(&rows, "Type your message...");
        row_containing(&rows, "No file attached");

        app.session.attach(Attachment::new("doc.pdf", vec![0; 2048]));
        let rows = draw(&mut app, 80, 16);
        row_containing(&rows, "doc.pdf (2.0 KB)");
    }

    #[test]
    fn test_file_prompt_shows_error() {
        let (mut app, _rx) = test_app();
        app.open_file_prompt();
        app.file_prompt_error = Some("Could not read /nope".to_string());

        let rows = draw(&mut app, 80, 20);

        row_containing(&rows, "Attach File");
        row_containing(&rows, "Could not read /nope");
    }
}
