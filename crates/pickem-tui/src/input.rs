// Keyboard input handling and command dispatch.
//
// Translates crossterm key events into UserCommand messages sent to the
// driver, or into local ViewState mutations (focus, cursor, form fields).

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use pickem_app::protocol::{SelectorSnapshot, UserCommand};

use super::{Focus, LoginField, Screen, ViewState};

/// Longest tiebreaker the form accepts.
const MAX_TIEBREAKER_DIGITS: usize = 4;

/// Handle a keyboard event.
///
/// Returns `Some(UserCommand)` when the key press should be forwarded to the
/// driver. Returns `None` when it was handled locally or ignored.
pub fn handle_key(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    // Some terminals report both Press and Release; only act on Press.
    if key_event.kind != KeyEventKind::Press {
        return None;
    }

    if key_event.modifiers.contains(KeyModifiers::CONTROL)
        && key_event.code == KeyCode::Char('c')
    {
        return Some(UserCommand::Quit);
    }

    if view_state.confirm_quit {
        return handle_confirm_quit(key_event, view_state);
    }

    match view_state.screen {
        Screen::Connecting => None,
        Screen::Login => handle_login(key_event, view_state),
        Screen::Picks if view_state.tiebreaker_input.is_some() => {
            handle_tiebreaker(key_event, view_state)
        }
        Screen::Picks => handle_picks(key_event, view_state),
    }
}

/// y/q confirm, n/Esc cancel, everything else is blocked.
fn handle_confirm_quit(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Char('q') | KeyCode::Char('Q') => {
            Some(UserCommand::Quit)
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            view_state.confirm_quit = false;
            None
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Login form
// ---------------------------------------------------------------------------

fn handle_login(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    let form = &mut view_state.login;
    if form.submitting {
        return None;
    }
    match key_event.code {
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
            form.focus = match form.focus {
                LoginField::Username => LoginField::Password,
                LoginField::Password => LoginField::Username,
            };
            None
        }
        KeyCode::Enter => {
            if form.focus == LoginField::Username && form.password.is_empty() {
                form.focus = LoginField::Password;
                return None;
            }
            let username = form.username.trim().to_string();
            if username.is_empty() || form.password.is_empty() {
                form.error = Some("Enter your username and password".into());
                return None;
            }
            form.error = None;
            form.submitting = true;
            Some(UserCommand::Login {
                username,
                password: form.password.clone(),
            })
        }
        KeyCode::Backspace => {
            field(form).pop();
            None
        }
        KeyCode::Esc => {
            view_state.confirm_quit = true;
            None
        }
        KeyCode::Char(c) => {
            field(form).push(c);
            None
        }
        _ => None,
    }
}

fn field(form: &mut super::LoginForm) -> &mut String {
    match form.focus {
        LoginField::Username => &mut form.username,
        LoginField::Password => &mut form.password,
    }
}

// ---------------------------------------------------------------------------
// Tiebreaker entry
// ---------------------------------------------------------------------------

fn handle_tiebreaker(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    let game = view_state.selected_row()?.id;
    let input = view_state.tiebreaker_input.as_mut()?;
    match key_event.code {
        KeyCode::Char(c) if c.is_ascii_digit() => {
            if input.len() < MAX_TIEBREAKER_DIGITS {
                input.push(c);
            }
            None
        }
        KeyCode::Backspace => {
            input.pop();
            None
        }
        KeyCode::Enter => {
            // Empty input clears the tiebreaker.
            let value = input.parse::<u32>().ok();
            view_state.tiebreaker_input = None;
            Some(UserCommand::SetTiebreaker { game, value })
        }
        KeyCode::Esc => {
            view_state.tiebreaker_input = None;
            None
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Picks screen
// ---------------------------------------------------------------------------

fn handle_picks(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Tab => {
            view_state.focus = view_state.focus.next();
            None
        }
        KeyCode::BackTab => {
            view_state.focus = view_state.focus.prev();
            None
        }

        KeyCode::Left | KeyCode::Char('h') => move_sideways(view_state, -1),
        KeyCode::Right | KeyCode::Char('l') => move_sideways(view_state, 1),

        KeyCode::Up | KeyCode::Char('k') => {
            if view_state.focus == Focus::Games {
                view_state.cursor = view_state.cursor.saturating_sub(1);
            }
            None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if view_state.focus == Focus::Games {
                let last = view_state.snapshot.games.len().saturating_sub(1);
                view_state.cursor = (view_state.cursor + 1).min(last);
            }
            None
        }

        KeyCode::Char('t') => {
            begin_tiebreaker(view_state);
            None
        }

        KeyCode::Char('s') => Some(UserCommand::Submit),
        KeyCode::Char('r') => Some(UserCommand::Refresh),
        KeyCode::Esc => Some(UserCommand::DismissNotice),
        KeyCode::Char('L') => Some(UserCommand::Logout),

        // Leaving with unsaved picks asks first.
        KeyCode::Char('q') => {
            if view_state.snapshot.unsaved > 0 {
                view_state.confirm_quit = true;
                None
            } else {
                Some(UserCommand::Quit)
            }
        }

        _ => None,
    }
}

/// Left/right: step a selector, or pick the away/home team on the
/// highlighted game.
fn move_sideways(view_state: &mut ViewState, step: isize) -> Option<UserCommand> {
    let snap = &view_state.snapshot;
    match view_state.focus {
        Focus::League => neighbor(&snap.leagues, step).map(UserCommand::SelectLeague),
        Focus::Sport => neighbor(&snap.sports, step).map(UserCommand::SelectSport),
        Focus::Week => neighbor(&snap.weeks, step).map(UserCommand::SelectWeek),
        Focus::Games => {
            let row = view_state.selected_row()?;
            if row.locked {
                return None;
            }
            let team = if step < 0 { &row.away } else { &row.home };
            Some(UserCommand::SetPick {
                game: row.id,
                team: team.id.clone(),
            })
        }
    }
}

/// The option `step` places away from the selected one, if the selector is
/// usable and that option exists.
pub fn neighbor<K: Copy + PartialEq>(sel: &SelectorSnapshot<K>, step: isize) -> Option<K> {
    if !sel.is_enabled() {
        return None;
    }
    let target = match sel.selected_index() {
        Some(idx) => idx.checked_add_signed(step)?,
        None => 0,
    };
    sel.options.get(target).map(|(k, _)| *k)
}

fn begin_tiebreaker(view_state: &mut ViewState) {
    if view_state.focus != Focus::Games || !view_state.snapshot.tiebreaker_enabled {
        return;
    }
    let Some(row) = view_state.selected_row() else {
        return;
    };
    if row.locked || row.choice.is_none() {
        return;
    }
    let current = row.tiebreaker.map(|v| v.to_string()).unwrap_or_default();
    view_state.tiebreaker_input = Some(current);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
