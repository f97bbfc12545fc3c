// Login screen: a centered username/password form.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use super::quit_confirm::centered_rect;
use crate::{LoginField, LoginForm, ViewState};

const FORM_WIDTH: u16 = 48;
const FORM_HEIGHT: u16 = 10;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let form_area = centered_rect(FORM_WIDTH, FORM_HEIGHT, area);
    let form = &state.login;

    let mut lines = Vec::new();
    match &state.logout_reason {
        Some(reason) => lines.push(Line::from(Span::styled(
            reason.clone(),
            Style::default().fg(Color::Yellow),
        ))),
        None => lines.push(Line::from("")),
    }
    lines.push(field_line("Username", &form.username, form.focus == LoginField::Username));
    lines.push(field_line(
        "Password",
        &masked(&form.password),
        form.focus == LoginField::Password,
    ));
    lines.push(Line::from(""));
    lines.push(footer_line(form));

    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Pick'em: sign in "),
        );
    frame.render_widget(paragraph, form_area);
}

fn field_line(label: &str, value: &str, focused: bool) -> Line<'static> {
    let label_style = if focused {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };
    let cursor = if focused { "_" } else { "" };
    Line::from(vec![
        Span::styled(format!("{label:>9}: "), label_style),
        Span::raw(format!("{value}{cursor}")),
    ])
}

fn footer_line(form: &LoginForm) -> Line<'static> {
    if form.submitting {
        return Line::from(Span::styled("Signing in...", Style::default().fg(Color::Cyan)));
    }
    match &form.error {
        Some(error) => Line::from(Span::styled(error.clone(), Style::default().fg(Color::Red))),
        None => Line::from(Span::styled(
            "Enter: sign in | Tab: switch field | Esc: quit",
            Style::default().fg(Color::Gray).add_modifier(Modifier::DIM),
        )),
    }
}

/// The password as bullets, one per character.
pub fn masked(password: &str) -> String {
    "•".repeat(password.chars().count())
}
