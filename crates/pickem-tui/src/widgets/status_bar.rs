// Status bar widget: signed-in user, workflow phase, unsaved count.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use pickem_core::workflow::Phase;

use crate::ViewState;

/// Render the status bar into the given area.
///
/// Layout: [user] | [phase indicator] | [unsaved count]
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let mut spans = Vec::new();

    let user = state
        .user
        .as_ref()
        .map(|u| u.username.as_str())
        .unwrap_or("--");
    spans.push(Span::styled(
        format!(" {user} "),
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    ));
    spans.push(Span::styled("| ", Style::default().fg(Color::Gray)));

    let (label, color) = phase_indicator(state.snapshot.phase);
    spans.push(Span::styled(format!("● {label}"), Style::default().fg(color)));

    spans.push(Span::styled(" | ", Style::default().fg(Color::Gray)));
    spans.push(unsaved_span(state.snapshot.unsaved));

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(paragraph, area);
}

/// Label and color for the workflow phase.
pub fn phase_indicator(phase: Phase) -> (&'static str, Color) {
    match phase {
        Phase::Idle => ("Idle", Color::DarkGray),
        Phase::Loading => ("Loading", Color::Cyan),
        Phase::Ready => ("Ready", Color::Green),
        Phase::Dirty => ("Unsaved changes", Color::Yellow),
        Phase::Submitting => ("Saving", Color::Magenta),
    }
}

pub fn unsaved_span(unsaved: usize) -> Span<'static> {
    match unsaved {
        0 => Span::styled("All picks saved", Style::default().fg(Color::Gray)),
        1 => Span::styled("1 unsaved pick", Style::default().fg(Color::Yellow)),
        n => Span::styled(format!("{n} unsaved picks"), Style::default().fg(Color::Yellow)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
