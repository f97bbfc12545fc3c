// Screen layout: panel arrangement and sizing.
//
// Divides the terminal area into fixed zones for the picks screen:
//
// +--------------------------------------------------+
// | Status Bar (1 row)                                |
// +----------------+----------------+----------------+
// | League (3)     | Sport (3)      | Week (3)       |
// +----------------+----------------+----------------+
// | Games (fill)                                      |
// +--------------------------------------------------+
// | Notice Bar (1 row)                                |
// +--------------------------------------------------+
// | Help Bar (1 row)                                  |
// +--------------------------------------------------+

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Resolved screen areas for each zone.
#[derive(Debug, Clone)]
pub struct AppLayout {
    /// Top row: user, phase, unsaved count.
    pub status_bar: Rect,
    pub league: Rect,
    pub sport: Rect,
    pub week: Rect,
    /// The week's games with the working picks.
    pub games: Rect,
    /// Transient success/error message.
    pub notice_bar: Rect,
    /// Bottom row: keyboard shortcut hints.
    pub help_bar: Rect,
}

/// Build the picks-screen layout from the available terminal area.
pub fn build_layout(area: Rect) -> AppLayout {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // status bar
            Constraint::Length(3), // selectors
            Constraint::Min(5),    // games
            Constraint::Length(1), // notice bar
            Constraint::Length(1), // help bar
        ])
        .split(area);

    let selectors = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Percentage(30),
            Constraint::Percentage(30),
        ])
        .split(vertical[1]);

    AppLayout {
        status_bar: vertical[0],
        league: selectors[0],
        sport: selectors[1],
        week: selectors[2],
        games: vertical[2],
        notice_bar: vertical[3],
        help_bar: vertical[4],
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
