// Notice bar: the workflow's current transient message.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use pickem_core::notice::{Notice, NoticeLevel};

pub fn render(frame: &mut Frame, area: Rect, notice: Option<&Notice>) {
    let Some(notice) = notice else {
        frame.render_widget(Paragraph::new(""), area);
        return;
    };
    let (tag, color) = level_style(notice.level);
    let line = Line::from(vec![
        Span::styled(
            format!(" {tag} "),
            Style::default()
                .fg(Color::Black)
                .bg(color)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!(" {}", notice.message), Style::default().fg(color)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Badge text and color for a notice level.
pub fn level_style(level: NoticeLevel) -> (&'static str, Color) {
    match level {
        NoticeLevel::Info => ("INFO", Color::Cyan),
        NoticeLevel::Success => ("SAVED", Color::Green),
        NoticeLevel::Warning => ("WARN", Color::Yellow),
        NoticeLevel::Error => ("ERROR", Color::Red),
    }
}
