// Terminal UI: view state, layout, input handling, and widget rendering.
//
// The TUI owns a `ViewState` that mirrors what the driver last reported. The
// driver pushes `UiUpdate` messages over an mpsc channel; the TUI applies
// them to `ViewState` and re-renders on a fixed tick.

pub mod input;
pub mod layout;
pub mod widgets;

use std::time::Duration;

use crossterm::event::{Event, EventStream};
use futures_util::StreamExt;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use pickem_app::protocol::{PicksSnapshot, UiUpdate, UserCommand};
use pickem_core::models::User;

use layout::{build_layout, AppLayout};

// ---------------------------------------------------------------------------
// ViewState
// ---------------------------------------------------------------------------

/// Which top-level screen is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Waiting for the stored session to be checked.
    Connecting,
    Login,
    Picks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Username,
    Password,
}

#[derive(Debug, Clone)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub focus: LoginField,
    pub error: Option<String>,
    /// A login request is in flight.
    pub submitting: bool,
}

impl Default for LoginForm {
    fn default() -> Self {
        LoginForm {
            username: String::new(),
            password: String::new(),
            focus: LoginField::Username,
            error: None,
            submitting: false,
        }
    }
}

/// Which panel of the picks screen receives navigation keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    League,
    Sport,
    Week,
    Games,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Focus::League => Focus::Sport,
            Focus::Sport => Focus::Week,
            Focus::Week => Focus::Games,
            Focus::Games => Focus::League,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Focus::League => Focus::Games,
            Focus::Sport => Focus::League,
            Focus::Week => Focus::Sport,
            Focus::Games => Focus::Week,
        }
    }
}

/// TUI-local state mirroring the last update from the driver.
pub struct ViewState {
    pub screen: Screen,
    pub login: LoginForm,
    pub user: Option<User>,
    /// Why the last session ended, shown above the login form.
    pub logout_reason: Option<String>,
    pub snapshot: PicksSnapshot,
    pub focus: Focus,
    /// Highlighted row in the games table.
    pub cursor: usize,
    /// Digits typed so far while editing the highlighted game's tiebreaker.
    pub tiebreaker_input: Option<String>,
    pub confirm_quit: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState {
            screen: Screen::Connecting,
            login: LoginForm::default(),
            user: None,
            logout_reason: None,
            snapshot: PicksSnapshot::empty(),
            focus: Focus::Games,
            cursor: 0,
            tiebreaker_input: None,
            confirm_quit: false,
        }
    }
}

impl ViewState {
    /// Replace the picks snapshot, keeping the cursor on a valid row.
    pub fn apply_snapshot(&mut self, snapshot: PicksSnapshot) {
        let editing = self
            .tiebreaker_input
            .as_ref()
            .and_then(|_| self.snapshot.games.get(self.cursor))
            .map(|row| row.id);
        self.snapshot = snapshot;

        let rows = self.snapshot.games.len();
        if rows == 0 {
            self.cursor = 0;
        } else if self.cursor >= rows {
            self.cursor = rows - 1;
        }

        // The edited row can vanish when the week changes underneath it.
        if let Some(game) = editing {
            let still_there = self
                .snapshot
                .games
                .get(self.cursor)
                .is_some_and(|row| row.id == game && !row.locked);
            if !still_there {
                self.tiebreaker_input = None;
            }
        }
    }

    pub fn selected_row(&self) -> Option<&pickem_app::protocol::GameRow> {
        self.snapshot.games.get(self.cursor)
    }
}

// ---------------------------------------------------------------------------
// UiUpdate processing
// ---------------------------------------------------------------------------

/// Apply a single UiUpdate to the ViewState.
pub fn apply_ui_update(state: &mut ViewState, update: UiUpdate) {
    match update {
        UiUpdate::Snapshot(snapshot) => {
            state.apply_snapshot(*snapshot);
        }
        UiUpdate::SessionStarted(user) => {
            state.screen = Screen::Picks;
            state.user = Some(user);
            state.logout_reason = None;
            state.login.password.clear();
            state.login.error = None;
            state.login.submitting = false;
            state.focus = Focus::Games;
        }
        UiUpdate::LoginFailed(message) => {
            state.screen = Screen::Login;
            state.login.error = Some(message);
            state.login.password.clear();
            state.login.focus = LoginField::Password;
            state.login.submitting = false;
        }
        UiUpdate::LoggedOut { reason } => {
            state.screen = Screen::Login;
            state.user = None;
            state.logout_reason = reason;
            state.login.submitting = false;
            state.login.password.clear();
            state.snapshot = PicksSnapshot::empty();
            state.cursor = 0;
            state.tiebreaker_input = None;
            state.confirm_quit = false;
        }
    }
}

// ---------------------------------------------------------------------------
// Render frame
// ---------------------------------------------------------------------------

/// Render the complete frame for the current screen.
pub fn render_frame(frame: &mut Frame, state: &ViewState) {
    match state.screen {
        Screen::Connecting => {
            let paragraph = Paragraph::new("Restoring session...")
                .style(Style::default().fg(Color::Gray));
            frame.render_widget(paragraph, frame.area());
        }
        Screen::Login => {
            widgets::login::render(frame, frame.area(), state);
        }
        Screen::Picks => {
            let layout = build_layout(frame.area());
            widgets::status_bar::render(frame, layout.status_bar, state);
            widgets::selectors::render(frame, &layout, state);
            widgets::games::render(frame, layout.games, state);
            widgets::notice_bar::render(frame, layout.notice_bar, state.snapshot.notice.as_ref());
            render_help_bar(frame, &layout, state);
        }
    }

    if state.confirm_quit {
        widgets::quit_confirm::render(frame, frame.area(), state.snapshot.unsaved);
    }
}

/// Shortcut hints for the current input mode.
pub fn help_text(state: &ViewState) -> &'static str {
    if state.tiebreaker_input.is_some() {
        " 0-9:Digits | Enter:Save | Esc:Cancel"
    } else if state.focus == Focus::Games {
        " Tab:Focus | j/k:Move | h/l:Pick away/home | t:Tiebreaker | s:Save | r:Refresh | Esc:Dismiss | L:Logout | q:Quit"
    } else {
        " Tab:Focus | h/l:Change selection | s:Save | r:Refresh | Esc:Dismiss | L:Logout | q:Quit"
    }
}

fn render_help_bar(frame: &mut Frame, layout: &AppLayout, state: &ViewState) {
    let paragraph = Paragraph::new(Line::from(vec![Span::styled(
        help_text(state),
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::DIM),
    )]))
    .style(Style::default().bg(Color::DarkGray));
    frame.render_widget(paragraph, layout.help_bar);
}

// ---------------------------------------------------------------------------
// Main TUI loop
// ---------------------------------------------------------------------------

/// Run the TUI event loop.
///
/// Initializes the terminal and installs a panic hook that restores it, then
/// selects over driver updates, keyboard input and the render tick until the
/// user quits or the driver closes its channel.
pub async fn run(
    mut ui_rx: mpsc::Receiver<UiUpdate>,
    cmd_tx: mpsc::Sender<UserCommand>,
    tick_rate: Duration,
) -> anyhow::Result<()> {
    let mut terminal = ratatui::init();

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        ratatui::restore();
        original_hook(panic_info);
    }));

    let mut view_state = ViewState::default();
    let mut event_stream = EventStream::new();

    let mut render_tick = tokio::time::interval(tick_rate);
    render_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let result = loop {
        tokio::select! {
            update = ui_rx.recv() => {
                match update {
                    Some(ui_update) => apply_ui_update(&mut view_state, ui_update),
                    None => {
                        debug!("Update channel closed");
                        break Ok(());
                    }
                }
            }

            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key_event))) => {
                        if let Some(cmd) = input::handle_key(key_event, &mut view_state) {
                            let quit = cmd == UserCommand::Quit;
                            if cmd_tx.send(cmd).await.is_err() || quit {
                                break Ok(());
                            }
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("Terminal input error: {}", e);
                        break Err(e.into());
                    }
                    None => break Ok(()),
                }
            }

            _ = render_tick.tick() => {
                if let Err(e) = terminal.draw(|frame| render_frame(frame, &view_state)) {
                    break Err(e.into());
                }
            }
        }
    };

    ratatui::restore();
    result
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
