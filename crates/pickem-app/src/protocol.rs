// Messages between the driver loop and the UI, and the snapshot the UI renders.

use chrono::{DateTime, Utc};

use pickem_core::models::{
    FinalScore, Game, GameId, GameStatus, LeagueId, SportId, Team, TeamId, User, WeekId,
};
use pickem_core::notice::Notice;
use pickem_core::workflow::{Keyed, LoadStatus, Phase, PickWorkflow, Selector};

// ---------------------------------------------------------------------------
// UI -> driver
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum UserCommand {
    Login { username: String, password: String },
    Logout,
    SelectLeague(LeagueId),
    SelectSport(SportId),
    SelectWeek(WeekId),
    SetPick { game: GameId, team: TeamId },
    SetTiebreaker { game: GameId, value: Option<u32> },
    Submit,
    Refresh,
    DismissNotice,
    Quit,
}

// ---------------------------------------------------------------------------
// driver -> UI
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum UiUpdate {
    /// Full picks-screen state. Sent after every workflow transition.
    Snapshot(Box<PicksSnapshot>),
    SessionStarted(User),
    LoginFailed(String),
    /// The session ended; `reason` is set when it was not the user's choice.
    LoggedOut { reason: Option<String> },
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// One selector as the UI shows it.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorSnapshot<K> {
    pub options: Vec<(K, String)>,
    pub selected: Option<K>,
    pub status: LoadStatus,
}

impl<K: Copy + PartialEq> SelectorSnapshot<K> {
    pub fn selected_index(&self) -> Option<usize> {
        let key = self.selected?;
        self.options.iter().position(|(k, _)| *k == key)
    }

    pub fn selected_label(&self) -> Option<&str> {
        let idx = self.selected_index()?;
        Some(self.options[idx].1.as_str())
    }

    pub fn is_enabled(&self) -> bool {
        self.status == LoadStatus::Ready && !self.options.is_empty()
    }
}

fn selector<T: Keyed>(sel: &Selector<T>, label: impl Fn(&T) -> String) -> SelectorSnapshot<T::Key> {
    SelectorSnapshot {
        options: sel.options.iter().map(|o| (o.key(), label(o))).collect(),
        selected: sel.selected,
        status: sel.status.clone(),
    }
}

/// One game line on the picks screen.
#[derive(Debug, Clone, PartialEq)]
pub struct GameRow {
    pub id: GameId,
    pub home: Team,
    pub away: Team,
    pub starts_at: DateTime<Utc>,
    pub betting_line: String,
    pub spread: Option<f64>,
    pub venue: Option<String>,
    pub status: GameStatus,
    pub final_score: Option<FinalScore>,
    /// Working-set choice.
    pub choice: Option<TeamId>,
    pub tiebreaker: Option<u32>,
    /// Choice as last saved on the server.
    pub saved: Option<TeamId>,
    pub locked: bool,
    pub dirty: bool,
    pub is_correct: Option<bool>,
}

impl GameRow {
    fn build(game: &Game, workflow: &PickWorkflow, now: DateTime<Utc>) -> Self {
        let store = workflow.store();
        let choice = store.choice(game.id);
        GameRow {
            id: game.id,
            home: game.home.clone(),
            away: game.away.clone(),
            starts_at: game.starts_at,
            betting_line: game.betting_line(),
            spread: game.spread,
            venue: game.venue.clone(),
            status: game.status,
            final_score: game.final_score,
            choice: choice.map(|c| c.team.clone()),
            tiebreaker: choice.and_then(|c| c.tiebreaker),
            saved: store.saved_choice(game.id).map(|c| c.team.clone()),
            locked: store.is_locked(game.id, now),
            dirty: store.is_game_dirty(game.id),
            is_correct: store.record(game.id).and_then(|p| p.is_correct),
        }
    }
}

/// Everything the picks screen renders.
#[derive(Debug, Clone, PartialEq)]
pub struct PicksSnapshot {
    pub leagues: SelectorSnapshot<LeagueId>,
    pub sports: SelectorSnapshot<SportId>,
    pub weeks: SelectorSnapshot<WeekId>,
    pub week_status: LoadStatus,
    pub phase: Phase,
    pub games: Vec<GameRow>,
    pub tiebreaker_enabled: bool,
    pub can_submit: bool,
    /// Number of picks that would be submitted.
    pub unsaved: usize,
    pub notice: Option<Notice>,
}

impl PicksSnapshot {
    pub fn from_workflow(workflow: &PickWorkflow, now: DateTime<Utc>) -> Self {
        let current = workflow.current_week();
        PicksSnapshot {
            leagues: selector(workflow.leagues(), |l| l.name.clone()),
            sports: selector(workflow.sports(), |s| s.name.clone()),
            weeks: selector(workflow.weeks(), |w| {
                if Some(w.id) == current {
                    format!("{} (current)", w.label())
                } else {
                    w.label()
                }
            }),
            week_status: workflow.week_status().clone(),
            phase: workflow.phase(),
            games: workflow
                .games()
                .iter()
                .map(|g| GameRow::build(g, workflow, now))
                .collect(),
            tiebreaker_enabled: workflow.tiebreaker_enabled(),
            can_submit: workflow.can_submit(),
            unsaved: workflow.store().delta().len(),
            notice: workflow.notice().cloned(),
        }
    }

    pub fn empty() -> Self {
        Self::from_workflow(&PickWorkflow::new(), Utc::now())
    }
}
