// League / sport / week selector boxes.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use pickem_app::protocol::SelectorSnapshot;
use pickem_core::workflow::LoadStatus;

use crate::layout::AppLayout;
use crate::{Focus, ViewState};

pub fn render(frame: &mut Frame, layout: &AppLayout, state: &ViewState) {
    let snap = &state.snapshot;
    let boxes = [
        ("League", layout.league, Focus::League, selector_line(&snap.leagues)),
        ("Sport", layout.sport, Focus::Sport, selector_line(&snap.sports)),
        ("Week", layout.week, Focus::Week, selector_line(&snap.weeks)),
    ];
    for (title, area, focus, line) in boxes {
        let border = if state.focus == focus {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::Gray)
        };
        let paragraph = Paragraph::new(line).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border)
                .title(title),
        );
        frame.render_widget(paragraph, area);
    }
}

/// One-line content of a selector box.
///
/// Arrows show whether stepping left or right would reach another option.
pub fn selector_line<K: Copy + PartialEq>(sel: &SelectorSnapshot<K>) -> Line<'static> {
    match &sel.status {
        LoadStatus::Disabled => Line::from(Span::styled("--", Style::default().fg(Color::DarkGray))),
        LoadStatus::Loading => Line::from(Span::styled(
            "Loading...",
            Style::default().fg(Color::Cyan),
        )),
        LoadStatus::Failed(message) => Line::from(Span::styled(
            format!("! {message}"),
            Style::default().fg(Color::Red),
        )),
        LoadStatus::Ready if sel.options.is_empty() => {
            Line::from(Span::styled("(none)", Style::default().fg(Color::DarkGray)))
        }
        LoadStatus::Ready => {
            let idx = sel.selected_index();
            let has_prev = idx.is_some_and(|i| i > 0);
            let has_next = idx.map_or(true, |i| i + 1 < sel.options.len());
            let label = sel.selected_label().unwrap_or("Select...").to_string();
            let arrow = |on: bool, glyph: &'static str| {
                if on {
                    Span::styled(glyph, Style::default().fg(Color::White))
                } else {
                    Span::raw(" ")
                }
            };
            Line::from(vec![
                arrow(has_prev, "◀"),
                Span::styled(
                    format!(" {label} "),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                arrow(has_next, "▶"),
            ])
        }
    }
}
