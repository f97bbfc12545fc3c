// Games table: one row per game with the working pick, the saved pick, the
// line, and the result once final.

use chrono::Local;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};
use ratatui::Frame;

use pickem_app::protocol::GameRow;
use pickem_core::models::{format_spread, GameStatus, Team};
use pickem_core::workflow::LoadStatus;

use crate::{Focus, ViewState};

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let snap = &state.snapshot;
    let border = if state.focus == Focus::Games {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::Gray)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title("Games");

    if snap.games.is_empty() {
        let message = empty_message(&snap.week_status);
        let paragraph = Paragraph::new(Span::styled(message, Style::default().fg(Color::Gray)))
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let mut header = vec!["", "Kickoff", "Away", "Home", "Line"];
    if snap.tiebreaker_enabled {
        header.push("TB");
    }
    header.push("Status");

    let editing = state.tiebreaker_input.as_deref();
    let rows: Vec<Row> = snap
        .games
        .iter()
        .enumerate()
        .map(|(i, game)| {
            let edit = if i == state.cursor { editing } else { None };
            game_row(game, snap.tiebreaker_enabled, edit)
        })
        .collect();

    let mut widths = vec![
        Constraint::Length(1),
        Constraint::Length(16),
        Constraint::Fill(1),
        Constraint::Fill(1),
        Constraint::Length(14),
    ];
    if snap.tiebreaker_enabled {
        widths.push(Constraint::Length(6));
    }
    widths.push(Constraint::Length(14));

    let table = Table::new(rows, widths)
        .header(Row::new(header).style(Style::default().add_modifier(Modifier::BOLD)))
        .block(block)
        .row_highlight_style(Style::default().bg(Color::DarkGray));

    let mut table_state = TableState::default().with_selected(Some(state.cursor));
    frame.render_stateful_widget(table, area, &mut table_state);
}

pub fn empty_message(status: &LoadStatus) -> String {
    match status {
        LoadStatus::Disabled => "Select a league, sport and week".to_string(),
        LoadStatus::Loading => "Loading games...".to_string(),
        LoadStatus::Failed(message) => message.clone(),
        LoadStatus::Ready => "No games scheduled for this week".to_string(),
    }
}

fn game_row(game: &GameRow, tiebreaker_enabled: bool, editing: Option<&str>) -> Row<'static> {
    let marker = if game.dirty {
        Span::styled("*", Style::default().fg(Color::Yellow))
    } else {
        Span::raw(" ")
    };
    let kickoff = game
        .starts_at
        .with_timezone(&Local)
        .format("%a %b %e %H:%M")
        .to_string();

    let away = team_cell(game, &game.away, game.spread.map(|s| -s));
    let home = team_cell(game, &game.home, game.spread);

    let mut cells = vec![
        Cell::from(marker),
        Cell::from(kickoff),
        away,
        home,
        Cell::from(game.betting_line.clone()),
    ];
    if tiebreaker_enabled {
        let text = match editing {
            Some(input) => format!("{input}_"),
            None => game.tiebreaker.map(|v| v.to_string()).unwrap_or_default(),
        };
        cells.push(Cell::from(text));
    }
    let (status, color) = status_text(game);
    cells.push(Cell::from(Span::styled(status, Style::default().fg(color))));

    let row = Row::new(cells);
    if game.locked {
        row.style(Style::default().add_modifier(Modifier::DIM))
    } else {
        row
    }
}

/// Team name with its spread. The working pick is highlighted, and a saved
/// pick the user has since moved away from is struck through.
fn team_cell(game: &GameRow, team: &Team, spread: Option<f64>) -> Cell<'static> {
    let chosen = game.choice.as_ref() == Some(&team.id);
    let saved = game.saved.as_ref() == Some(&team.id);
    let text = team_label(team, spread, chosen);
    let style = if chosen {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else if saved {
        Style::default().fg(Color::Gray).add_modifier(Modifier::CROSSED_OUT)
    } else {
        Style::default()
    };
    Cell::from(Span::styled(text, style))
}

pub fn team_label(team: &Team, spread: Option<f64>, chosen: bool) -> String {
    let prefix = if chosen { "► " } else { "  " };
    match spread {
        Some(s) => format!("{prefix}{} ({})", team.name, format_spread(s)),
        None => format!("{prefix}{}", team.name),
    }
}

/// Status column: result for finished games, otherwise lock state.
pub fn status_text(game: &GameRow) -> (String, Color) {
    if let Some(score) = game.final_score {
        let result = format!("{}-{}", score.away, score.home);
        return match game.is_correct {
            Some(true) => (format!("✓ {result}"), Color::Green),
            Some(false) => (format!("✗ {result}"), Color::Red),
            None => (format!("Final {result}"), Color::Gray),
        };
    }
    match game.status {
        GameStatus::InProgress => ("In progress".to_string(), Color::Cyan),
        GameStatus::Postponed => ("Postponed".to_string(), Color::Yellow),
        _ if game.locked => ("Locked".to_string(), Color::Gray),
        _ if game.choice.is_none() => ("No pick".to_string(), Color::Yellow),
        _ => ("Open".to_string(), Color::White),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
