// Application state and orchestration logic.
//
// The driver owns the pick workflow and the session. User commands from the
// UI and completions from spawned backend requests arrive on channels; each
// is turned into a workflow event, the resulting effects are spawned as
// tasks, and a fresh snapshot is pushed to the UI.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use pickem_api::{ApiError, Backend};
use pickem_core::config::Config;
use pickem_core::models::{LeagueId, WeekId};
use pickem_core::workflow::{Effect, Event, PickWorkflow, RequestFailed, WeekData};

use crate::protocol::{PicksSnapshot, UiUpdate, UserCommand};
use crate::session::{Session, SessionError};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// How often expired notices are swept.
pub const NOTICE_CHECK_INTERVAL: Duration = Duration::from_millis(500);

const SESSION_EXPIRED: &str = "Your session has expired. Please log in again.";

// ---------------------------------------------------------------------------
// Completions
// ---------------------------------------------------------------------------

/// Result of one executed effect, sent back to the driver loop.
#[derive(Debug)]
pub enum Completion {
    Workflow(Event),
    /// The server rejected the token. Ends the session regardless of which
    /// request it was.
    Unauthorized,
}

fn settle<T>(
    result: Result<T, ApiError>,
    wrap: impl FnOnce(Result<T, RequestFailed>) -> Event,
) -> Completion {
    match result {
        Err(e) if e.is_unauthorized() => Completion::Unauthorized,
        other => Completion::Workflow(wrap(other.map_err(RequestFailed::from))),
    }
}

/// Perform one effect against the backend.
pub async fn execute(backend: &dyn Backend, effect: Effect) -> Completion {
    match effect {
        Effect::FetchLeagues { ticket } => settle(backend.leagues().await, |result| {
            Event::LeaguesLoaded { ticket, result }
        }),
        Effect::FetchLeague { ticket, league } => {
            settle(backend.league(league).await, |result| Event::LeagueLoaded {
                ticket,
                result,
            })
        }
        Effect::FetchWeeks { ticket, sport } => {
            settle(backend.weeks(sport).await, |result| Event::WeeksLoaded {
                ticket,
                result,
            })
        }
        Effect::FetchWeek { ticket, scope } => {
            let loaded = tokio::try_join!(
                backend.games(scope.sport, scope.week),
                backend.user_picks(scope)
            )
            .map(|(games, picks)| WeekData { games, picks });
            settle(loaded, |result| Event::WeekLoaded { ticket, result })
        }
        Effect::SubmitPicks {
            ticket,
            scope,
            picks,
        } => settle(backend.submit_picks(scope, &picks).await, |result| {
            Event::SubmitFinished { ticket, result }
        }),
    }
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

pub struct AppState {
    pub config: Config,
    pub workflow: PickWorkflow,
    pub session: Session,
    backend: Arc<dyn Backend>,
    /// Requests currently running. Aborted when the session ends.
    in_flight: Vec<JoinHandle<()>>,
}

impl AppState {
    pub fn new(
        config: Config,
        backend: Arc<dyn Backend>,
        session: Session,
        league: Option<LeagueId>,
        week: Option<WeekId>,
    ) -> Self {
        AppState {
            config,
            workflow: PickWorkflow::with_preferences(league, week),
            session,
            backend,
            in_flight: Vec::new(),
        }
    }

    pub fn build_snapshot(&self) -> PicksSnapshot {
        PicksSnapshot::from_workflow(&self.workflow, Utc::now())
    }

    fn spawn_effects(&mut self, effects: Vec<Effect>, done_tx: &mpsc::Sender<Completion>) {
        self.in_flight.retain(|h| !h.is_finished());
        for effect in effects {
            debug!("Spawning {:?}", effect);
            let backend = Arc::clone(&self.backend);
            let tx = done_tx.clone();
            self.in_flight.push(tokio::spawn(async move {
                let completion = execute(backend.as_ref(), effect).await;
                // Receiver gone means the loop is shutting down.
                let _ = tx.send(completion).await;
            }));
        }
    }

    /// Feed one event to the workflow and spawn whatever it asks for.
    pub fn dispatch(&mut self, event: Event, done_tx: &mpsc::Sender<Completion>) {
        let effects = self.workflow.handle(event, Utc::now());
        self.spawn_effects(effects, done_tx);
    }

    fn cancel_in_flight(&mut self) {
        for handle in self.in_flight.drain(..) {
            handle.abort();
        }
    }

    /// Tear the session down and drop all workflow state.
    fn end_session(&mut self) {
        self.cancel_in_flight();
        self.workflow.reset();
        if let Err(e) = self.session.teardown(self.backend.as_ref()) {
            warn!("Failed to clear stored session: {}", e);
        }
    }
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

async fn push_snapshot(state: &AppState, ui_tx: &mpsc::Sender<UiUpdate>) {
    let _ = ui_tx
        .send(UiUpdate::Snapshot(Box::new(state.build_snapshot())))
        .await;
}

/// Run the driver loop until the UI quits or closes its channel.
///
/// On start the stored session is restored; if that yields a user the
/// league cascade begins immediately, otherwise the UI is told to show the
/// login prompt.
pub async fn run(
    mut cmd_rx: mpsc::Receiver<UserCommand>,
    ui_tx: mpsc::Sender<UiUpdate>,
    mut state: AppState,
) -> anyhow::Result<()> {
    info!("Application event loop started");

    let (done_tx, mut done_rx) = mpsc::channel::<Completion>(64);
    let notice_ttl = state.config.notice_ttl();

    match state.session.restore(state.backend.as_ref()).await {
        Ok(Some(user)) => {
            let _ = ui_tx.send(UiUpdate::SessionStarted(user)).await;
            state.dispatch(Event::Start, &done_tx);
        }
        Ok(None) => {
            let _ = ui_tx.send(UiUpdate::LoggedOut { reason: None }).await;
        }
        Err(e) => {
            warn!("Could not restore session: {}", e);
            let _ = ui_tx
                .send(UiUpdate::LoggedOut {
                    reason: Some(e.to_string()),
                })
                .await;
        }
    }
    push_snapshot(&state, &ui_tx).await;

    let mut notice_interval = tokio::time::interval(NOTICE_CHECK_INTERVAL);
    notice_interval.tick().await;
    // Games locked as of the last tick; a change means a kickoff to redraw.
    let mut locked_seen = 0;

    loop {
        tokio::select! {
            // --- User commands ---
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UserCommand::Quit) => {
                        info!("Quit command received, shutting down");
                        break;
                    }
                    Some(cmd) => {
                        handle_user_command(&mut state, cmd, &ui_tx, &done_tx).await;
                    }
                    None => {
                        info!("Command channel closed, shutting down");
                        break;
                    }
                }
            }

            // --- Backend completions ---
            Some(completion) = done_rx.recv() => {
                handle_completion(&mut state, completion, &ui_tx, &done_tx).await;
            }

            // --- Notice expiry and kickoffs ---
            _ = notice_interval.tick() => {
                let now = Utc::now();
                let expired = state.workflow.expire_notice(now, notice_ttl);
                let locked = state.workflow.store().locked_count(now);
                if expired || locked != locked_seen {
                    locked_seen = locked;
                    push_snapshot(&state, &ui_tx).await;
                }
            }
        }
    }

    state.cancel_in_flight();
    if state.workflow.has_unsaved_changes() {
        warn!("Exiting with unsaved picks");
    }
    info!("Application event loop exiting");
    Ok(())
}

async fn handle_completion(
    state: &mut AppState,
    completion: Completion,
    ui_tx: &mpsc::Sender<UiUpdate>,
    done_tx: &mpsc::Sender<Completion>,
) {
    match completion {
        Completion::Workflow(event) => {
            state.dispatch(event, done_tx);
        }
        Completion::Unauthorized => {
            if !state.session.is_authenticated() {
                debug!("Ignoring 401 after session already ended");
                return;
            }
            warn!("Server rejected the session token, logging out");
            state.end_session();
            let _ = ui_tx
                .send(UiUpdate::LoggedOut {
                    reason: Some(SESSION_EXPIRED.to_string()),
                })
                .await;
        }
    }
    push_snapshot(state, ui_tx).await;
}

/// Handle a user command from the UI.
async fn handle_user_command(
    state: &mut AppState,
    cmd: UserCommand,
    ui_tx: &mpsc::Sender<UiUpdate>,
    done_tx: &mpsc::Sender<Completion>,
) {
    let event = match cmd {
        UserCommand::Login { username, password } => {
            let result = state
                .session
                .login(state.backend.as_ref(), &username, &password)
                .await;
            match result {
                Ok(user) => {
                    let _ = ui_tx.send(UiUpdate::SessionStarted(user)).await;
                    state.dispatch(Event::Start, done_tx);
                    push_snapshot(state, ui_tx).await;
                }
                Err(SessionError::Rejected(message)) => {
                    let _ = ui_tx.send(UiUpdate::LoginFailed(message)).await;
                }
                Err(e) => {
                    warn!("Login failed: {}", e);
                    let _ = ui_tx.send(UiUpdate::LoginFailed(e.to_string())).await;
                }
            }
            return;
        }
        UserCommand::Logout => {
            info!("Logout requested");
            state.end_session();
            let _ = ui_tx.send(UiUpdate::LoggedOut { reason: None }).await;
            push_snapshot(state, ui_tx).await;
            return;
        }
        UserCommand::Quit => return,
        _ if !state.session.is_authenticated() => {
            debug!("Ignoring {:?} without a session", cmd);
            return;
        }
        UserCommand::SelectLeague(id) => Event::LeagueSelected(id),
        UserCommand::SelectSport(id) => Event::SportSelected(id),
        UserCommand::SelectWeek(id) => Event::WeekSelected(id),
        UserCommand::SetPick { game, team } => Event::PickChosen { game, team },
        UserCommand::SetTiebreaker { game, value } => Event::TiebreakerEntered { game, value },
        UserCommand::Submit => Event::SubmitRequested,
        UserCommand::Refresh => Event::RefreshRequested,
        UserCommand::DismissNotice => Event::NoticeDismissed,
    };

    state.dispatch(event, done_tx);
    push_snapshot(state, ui_tx).await;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
