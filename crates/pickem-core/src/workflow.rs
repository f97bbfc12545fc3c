// Pick workflow state machine: league -> sport -> week selection cascade,
// week loading, and pick submission.
//
// The workflow never performs I/O. Every transition returns the list of
// `Effect`s the driver must execute; the driver feeds results back in as
// `Event`s. Each request carries a `Ticket` (per-level generation plus the
// selection it was issued for) so responses that arrive after the user has
// moved on are discarded instead of overwriting newer state.

use std::fmt;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::models::{
    Game, GameId, League, LeagueDetail, LeagueId, Pick, PickScope, Sport, SportId, TeamId, Week,
    WeekId, WeekListing,
};
use crate::notice::Notice;
use crate::picks::{PickDelta, PickRejected, PickStore};

// ---------------------------------------------------------------------------
// Request failures
// ---------------------------------------------------------------------------

/// A failed backend request, as seen by the workflow. Carries the
/// server-provided detail when there was one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RequestFailed {
    pub detail: Option<String>,
}

impl RequestFailed {
    pub fn new(detail: Option<String>) -> Self {
        RequestFailed { detail }
    }

    pub fn with_detail(detail: impl Into<String>) -> Self {
        RequestFailed {
            detail: Some(detail.into()),
        }
    }

    /// The server detail if present, otherwise `fallback`.
    pub fn message_or(&self, fallback: &str) -> String {
        match self.detail.as_deref() {
            Some(d) if !d.trim().is_empty() => d.to_string(),
            _ => fallback.to_string(),
        }
    }
}

impl fmt::Display for RequestFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(d) => write!(f, "request failed: {d}"),
            None => f.write_str("request failed"),
        }
    }
}

impl std::error::Error for RequestFailed {}

// ---------------------------------------------------------------------------
// Selectors
// ---------------------------------------------------------------------------

/// Option types that can be selected by key.
pub trait Keyed {
    type Key: Copy + Eq + fmt::Debug;
    fn key(&self) -> Self::Key;
}

impl Keyed for League {
    type Key = LeagueId;
    fn key(&self) -> LeagueId {
        self.id
    }
}

impl Keyed for Sport {
    type Key = SportId;
    fn key(&self) -> SportId {
        self.id
    }
}

impl Keyed for Week {
    type Key = WeekId;
    fn key(&self) -> WeekId {
        self.id
    }
}

/// Load state of one selector level (or of the week's games).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    /// Upstream selection missing; nothing to show.
    Disabled,
    Loading,
    Ready,
    Failed(String),
}

/// One level of the cascade: its option list, current selection and status.
#[derive(Debug, Clone)]
pub struct Selector<T: Keyed> {
    pub options: Vec<T>,
    pub selected: Option<T::Key>,
    pub status: LoadStatus,
}

impl<T: Keyed> Default for Selector<T> {
    fn default() -> Self {
        Selector {
            options: Vec::new(),
            selected: None,
            status: LoadStatus::Disabled,
        }
    }
}

impl<T: Keyed> Selector<T> {
    fn clear(&mut self, status: LoadStatus) {
        self.options.clear();
        self.selected = None;
        self.status = status;
    }

    pub fn contains(&self, key: T::Key) -> bool {
        self.options.iter().any(|o| o.key() == key)
    }

    pub fn selected_option(&self) -> Option<&T> {
        let key = self.selected?;
        self.options.iter().find(|o| o.key() == key)
    }

    /// Whether the user can interact with this selector.
    pub fn is_enabled(&self) -> bool {
        self.status == LoadStatus::Ready && !self.options.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tickets, effects, events
// ---------------------------------------------------------------------------

/// Which request stream a ticket belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Leagues,
    Sports,
    Weeks,
    Week,
    Submit,
}

impl Level {
    const ALL: [Level; 5] = [
        Level::Leagues,
        Level::Sports,
        Level::Weeks,
        Level::Week,
        Level::Submit,
    ];

    fn index(self) -> usize {
        match self {
            Level::Leagues => 0,
            Level::Sports => 1,
            Level::Weeks => 2,
            Level::Week => 3,
            Level::Submit => 4,
        }
    }

    /// Levels whose in-flight requests become stale when this level's
    /// selection changes (the level itself included).
    fn and_downstream(self) -> &'static [Level] {
        match self {
            Level::Leagues => &Self::ALL,
            Level::Sports => &Self::ALL[1..],
            Level::Weeks => &Self::ALL[2..],
            Level::Week => &Self::ALL[3..],
            Level::Submit => &Self::ALL[4..],
        }
    }
}

/// Identifies a request. A response is applied only if its ticket is still
/// current: same generation for its level, and the upstream selection it was
/// issued for is still selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub level: Level,
    pub generation: u64,
    pub league: Option<LeagueId>,
    pub sport: Option<SportId>,
    pub week: Option<WeekId>,
}

/// Games and saved picks for one (league, sport, week).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WeekData {
    pub games: Vec<Game>,
    pub picks: Vec<Pick>,
}

/// Side effects requested by a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    FetchLeagues { ticket: Ticket },
    FetchLeague { ticket: Ticket, league: LeagueId },
    /// Fetch the sport's week list together with its current-week marker.
    FetchWeeks { ticket: Ticket, sport: SportId },
    /// Fetch the week's games and the user's saved picks.
    FetchWeek { ticket: Ticket, scope: PickScope },
    SubmitPicks {
        ticket: Ticket,
        scope: PickScope,
        picks: Vec<PickDelta>,
    },
}

/// Inputs to the workflow: user intents and request results.
#[derive(Debug, Clone)]
pub enum Event {
    Start,
    LeagueSelected(LeagueId),
    SportSelected(SportId),
    WeekSelected(WeekId),
    LeaguesLoaded {
        ticket: Ticket,
        result: Result<Vec<League>, RequestFailed>,
    },
    LeagueLoaded {
        ticket: Ticket,
        result: Result<LeagueDetail, RequestFailed>,
    },
    WeeksLoaded {
        ticket: Ticket,
        result: Result<WeekListing, RequestFailed>,
    },
    WeekLoaded {
        ticket: Ticket,
        result: Result<WeekData, RequestFailed>,
    },
    PickChosen {
        game: GameId,
        team: TeamId,
    },
    TiebreakerEntered {
        game: GameId,
        value: Option<u32>,
    },
    SubmitRequested,
    SubmitFinished {
        ticket: Ticket,
        result: Result<(), RequestFailed>,
    },
    RefreshRequested,
    NoticeDismissed,
}

/// Where the currently selected week is in its load/edit/submit cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    /// Loaded; working set equals the saved snapshot.
    Ready,
    /// Loaded; working set has unsaved changes.
    Dirty,
    Submitting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WeekLoad {
    Idle,
    Loading,
    Loaded,
    Submitting,
}

// ---------------------------------------------------------------------------
// PickWorkflow
// ---------------------------------------------------------------------------

/// The complete state of the picks screen.
#[derive(Debug, Clone)]
pub struct PickWorkflow {
    leagues: Selector<League>,
    sports: Selector<Sport>,
    weeks: Selector<Week>,
    current_week: Option<WeekId>,
    games: Vec<Game>,
    store: PickStore,
    load: WeekLoad,
    week_status: LoadStatus,
    generations: [u64; 5],
    /// League to select when the league list arrives, instead of the first.
    preferred_league: Option<LeagueId>,
    /// Week to navigate to when the week list arrives, instead of the
    /// current week. Consumed on first use.
    requested_week: Option<WeekId>,
    notice: Option<Notice>,
}

impl Default for PickWorkflow {
    fn default() -> Self {
        Self::new()
    }
}

impl PickWorkflow {
    pub fn new() -> Self {
        PickWorkflow {
            leagues: Selector::default(),
            sports: Selector::default(),
            weeks: Selector::default(),
            current_week: None,
            games: Vec::new(),
            store: PickStore::default(),
            load: WeekLoad::Idle,
            week_status: LoadStatus::Disabled,
            generations: [0; 5],
            preferred_league: None,
            requested_week: None,
            notice: None,
        }
    }

    /// Start with an explicit league and/or week in mind (e.g. from the
    /// command line). Unknown ids fall back to the default choice.
    pub fn with_preferences(league: Option<LeagueId>, week: Option<WeekId>) -> Self {
        PickWorkflow {
            preferred_league: league,
            requested_week: week,
            ..Self::new()
        }
    }

    // -- accessors ----------------------------------------------------------

    pub fn leagues(&self) -> &Selector<League> {
        &self.leagues
    }

    pub fn sports(&self) -> &Selector<Sport> {
        &self.sports
    }

    pub fn weeks(&self) -> &Selector<Week> {
        &self.weeks
    }

    pub fn current_week(&self) -> Option<WeekId> {
        self.current_week
    }

    /// Games of the loaded week, ordered by start time.
    pub fn games(&self) -> &[Game] {
        &self.games
    }

    pub fn store(&self) -> &PickStore {
        &self.store
    }

    pub fn week_status(&self) -> &LoadStatus {
        &self.week_status
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn selected_league(&self) -> Option<&League> {
        self.leagues.selected_option()
    }

    pub fn tiebreaker_enabled(&self) -> bool {
        self.selected_league().is_some_and(|l| l.tiebreaker_enabled)
    }

    /// The (league, sport, week) currently selected, if all three are.
    pub fn scope(&self) -> Option<PickScope> {
        Some(PickScope {
            league: self.leagues.selected?,
            sport: self.sports.selected?,
            week: self.weeks.selected?,
        })
    }

    pub fn phase(&self) -> Phase {
        match self.load {
            WeekLoad::Idle => Phase::Idle,
            WeekLoad::Loading => Phase::Loading,
            WeekLoad::Submitting => Phase::Submitting,
            WeekLoad::Loaded if self.store.is_dirty() => Phase::Dirty,
            WeekLoad::Loaded => Phase::Ready,
        }
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.store.is_dirty()
    }

    /// Whether the submit control should be enabled.
    pub fn can_submit(&self) -> bool {
        self.phase() == Phase::Dirty
    }

    // -- dispatch -----------------------------------------------------------

    /// Apply one event and return the effects it requests.
    pub fn handle(&mut self, event: Event, now: DateTime<Utc>) -> Vec<Effect> {
        match event {
            Event::Start => self.start(),
            Event::LeagueSelected(id) => self.on_league_change(id),
            Event::SportSelected(id) => self.on_sport_change(id),
            Event::WeekSelected(id) => self.on_week_change(id),
            Event::LeaguesLoaded { ticket, result } => self.on_leagues_loaded(ticket, result, now),
            Event::LeagueLoaded { ticket, result } => self.on_league_loaded(ticket, result, now),
            Event::WeeksLoaded { ticket, result } => self.on_weeks_loaded(ticket, result, now),
            Event::WeekLoaded { ticket, result } => self.on_week_loaded(ticket, result, now),
            Event::PickChosen { game, team } => {
                if let Err(e) = self.set_pick(game, team, now) {
                    self.report_rejected_edit(&e, now);
                }
                Vec::new()
            }
            Event::TiebreakerEntered { game, value } => {
                if let Err(e) = self.set_tiebreaker(game, value, now) {
                    self.report_rejected_edit(&e, now);
                }
                Vec::new()
            }
            Event::SubmitRequested => self.submit(now),
            Event::SubmitFinished { ticket, result } => self.on_submit_finished(ticket, result, now),
            Event::RefreshRequested => self.refresh(now),
            Event::NoticeDismissed => {
                self.dismiss_notice();
                Vec::new()
            }
        }
    }

    // -- generations --------------------------------------------------------

    fn invalidate(&mut self, level: Level) {
        for l in level.and_downstream() {
            self.generations[l.index()] += 1;
        }
    }

    /// Bump `level` (and everything downstream of it) and issue a ticket for
    /// a new request at that level.
    fn issue(&mut self, level: Level) -> Ticket {
        self.invalidate(level);
        Ticket {
            level,
            generation: self.generations[level.index()],
            league: self.leagues.selected,
            sport: self.sports.selected,
            week: self.weeks.selected,
        }
    }

    /// Whether a response carrying `ticket` may still be applied.
    pub fn is_current(&self, ticket: &Ticket) -> bool {
        if ticket.generation != self.generations[ticket.level.index()] {
            return false;
        }
        let league_ok = ticket.league == self.leagues.selected;
        let sport_ok = ticket.sport == self.sports.selected;
        let week_ok = ticket.week == self.weeks.selected;
        match ticket.level {
            Level::Leagues => true,
            Level::Sports => league_ok,
            Level::Weeks => league_ok && sport_ok,
            Level::Week | Level::Submit => league_ok && sport_ok && week_ok,
        }
    }

    fn discard(&self, ticket: &Ticket) -> bool {
        if self.is_current(ticket) {
            return false;
        }
        debug!(
            "Discarding stale {:?} response (gen {}, current gen {})",
            ticket.level,
            ticket.generation,
            self.generations[ticket.level.index()]
        );
        true
    }

    // -- cascade ------------------------------------------------------------

    fn clear_week(&mut self) {
        self.games.clear();
        self.store = PickStore::default();
        self.load = WeekLoad::Idle;
        self.week_status = LoadStatus::Disabled;
    }

    /// Drop all loaded data and invalidate every in-flight request.
    pub fn reset(&mut self) {
        self.invalidate(Level::Leagues);
        self.leagues.clear(LoadStatus::Disabled);
        self.sports.clear(LoadStatus::Disabled);
        self.weeks.clear(LoadStatus::Disabled);
        self.current_week = None;
        self.clear_week();
        self.notice = None;
    }

    /// Begin (or restart) the cascade by fetching the league list.
    pub fn start(&mut self) -> Vec<Effect> {
        self.reset();
        self.leagues.status = LoadStatus::Loading;
        let ticket = self.issue(Level::Leagues);
        info!("Fetching leagues");
        vec![Effect::FetchLeagues { ticket }]
    }

    pub fn on_league_change(&mut self, id: LeagueId) -> Vec<Effect> {
        if !self.leagues.contains(id) {
            warn!("Ignoring selection of unknown league {}", id);
            return Vec::new();
        }
        if self.leagues.selected == Some(id) && !matches!(self.sports.status, LoadStatus::Failed(_)) {
            return Vec::new();
        }
        info!("League changed to {}", id);
        self.leagues.selected = Some(id);
        self.sports.clear(LoadStatus::Loading);
        self.weeks.clear(LoadStatus::Disabled);
        self.current_week = None;
        self.clear_week();

        let ticket = self.issue(Level::Sports);
        vec![Effect::FetchLeague { ticket, league: id }]
    }

    pub fn on_sport_change(&mut self, id: SportId) -> Vec<Effect> {
        if !self.sports.contains(id) {
            warn!("Ignoring selection of unknown sport {}", id);
            return Vec::new();
        }
        if self.sports.selected == Some(id) && !matches!(self.weeks.status, LoadStatus::Failed(_)) {
            return Vec::new();
        }
        info!("Sport changed to {}", id);
        self.sports.selected = Some(id);
        self.weeks.clear(LoadStatus::Loading);
        self.current_week = None;
        self.clear_week();

        let ticket = self.issue(Level::Weeks);
        vec![Effect::FetchWeeks { ticket, sport: id }]
    }

    pub fn on_week_change(&mut self, id: WeekId) -> Vec<Effect> {
        if !self.weeks.contains(id) {
            warn!("Ignoring selection of unknown week {}", id);
            return Vec::new();
        }
        if self.weeks.selected == Some(id) && !matches!(self.week_status, LoadStatus::Failed(_)) {
            return Vec::new();
        }
        info!("Week changed to {}", id);
        self.weeks.selected = Some(id);
        self.load_selected_week()
    }

    fn load_selected_week(&mut self) -> Vec<Effect> {
        let Some(scope) = self.scope() else {
            return Vec::new();
        };
        self.clear_week();
        self.load = WeekLoad::Loading;
        self.week_status = LoadStatus::Loading;
        let ticket = self.issue(Level::Week);
        vec![Effect::FetchWeek { ticket, scope }]
    }

    fn on_leagues_loaded(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<League>, RequestFailed>,
        now: DateTime<Utc>,
    ) -> Vec<Effect> {
        if self.discard(&ticket) {
            return Vec::new();
        }
        match result {
            Ok(leagues) => {
                info!("Loaded {} leagues", leagues.len());
                self.leagues.options = leagues;
                self.leagues.status = LoadStatus::Ready;
                let target = self
                    .preferred_league
                    .take()
                    .filter(|id| self.leagues.contains(*id))
                    .or_else(|| self.leagues.options.first().map(|l| l.id));
                match target {
                    Some(id) => self.on_league_change(id),
                    None => {
                        self.notice = Some(Notice::info(
                            "You are not a member of any leagues yet",
                            now,
                        ));
                        Vec::new()
                    }
                }
            }
            Err(e) => {
                warn!("Failed to load leagues: {}", e);
                let message = e.message_or("Failed to load your leagues");
                self.leagues.status = LoadStatus::Failed(message.clone());
                self.notice = Some(Notice::error(message, now));
                Vec::new()
            }
        }
    }

    fn on_league_loaded(
        &mut self,
        ticket: Ticket,
        result: Result<LeagueDetail, RequestFailed>,
        now: DateTime<Utc>,
    ) -> Vec<Effect> {
        if self.discard(&ticket) {
            return Vec::new();
        }
        match result {
            Ok(detail) => {
                // The detail is authoritative for flags the list may omit.
                if let Some(entry) = self
                    .leagues
                    .options
                    .iter_mut()
                    .find(|l| l.id == detail.league.id)
                {
                    entry.tiebreaker_enabled = detail.league.tiebreaker_enabled;
                    entry.is_member = detail.league.is_member;
                    entry.sport_ids = detail.sports.iter().map(|s| s.id).collect();
                }
                info!(
                    "League {} has {} sports",
                    detail.league.id,
                    detail.sports.len()
                );
                self.sports.options = detail.sports;
                self.sports.status = LoadStatus::Ready;
                match self.sports.options.first().map(|s| s.id) {
                    Some(first) => self.on_sport_change(first),
                    None => {
                        self.notice = Some(Notice::info("This league has no active sports", now));
                        Vec::new()
                    }
                }
            }
            Err(e) => {
                warn!("Failed to load league: {}", e);
                let message = e.message_or("Failed to load sports for this league");
                self.sports.status = LoadStatus::Failed(message.clone());
                self.notice = Some(Notice::error(message, now));
                Vec::new()
            }
        }
    }

    fn on_weeks_loaded(
        &mut self,
        ticket: Ticket,
        result: Result<WeekListing, RequestFailed>,
        now: DateTime<Utc>,
    ) -> Vec<Effect> {
        if self.discard(&ticket) {
            return Vec::new();
        }
        match result {
            Ok(listing) => {
                let mut weeks = listing.weeks;
                if let Some(current) = &listing.current {
                    if !weeks.iter().any(|w| w.id == current.id) {
                        weeks.push(current.clone());
                    }
                }
                weeks.sort_by_key(|w| w.number);

                let current_id = listing
                    .current
                    .map(|w| w.id)
                    .or_else(|| weeks.iter().find(|w| w.is_current).map(|w| w.id));
                for week in &mut weeks {
                    week.is_current = Some(week.id) == current_id;
                }

                self.current_week = current_id;
                self.weeks.options = weeks;
                self.weeks.status = LoadStatus::Ready;

                let requested = self.requested_week.take();
                let target = match requested {
                    Some(id) if self.weeks.contains(id) => Some(id),
                    Some(id) => {
                        warn!("Requested week {} not offered, using current week", id);
                        current_id
                    }
                    None => current_id,
                };
                match target {
                    Some(id) => self.on_week_change(id),
                    None => {
                        self.notice = Some(Notice::info("No current week for this sport", now));
                        Vec::new()
                    }
                }
            }
            Err(e) => {
                warn!("Failed to load weeks: {}", e);
                let message = e.message_or("Failed to load current week");
                self.weeks.status = LoadStatus::Failed(message.clone());
                self.notice = Some(Notice::error(message, now));
                Vec::new()
            }
        }
    }

    fn on_week_loaded(
        &mut self,
        ticket: Ticket,
        result: Result<WeekData, RequestFailed>,
        now: DateTime<Utc>,
    ) -> Vec<Effect> {
        if self.discard(&ticket) {
            return Vec::new();
        }
        match result {
            Ok(data) => {
                let mut games = data.games;
                games.sort_by_key(|g| g.starts_at);
                self.store = PickStore::load(&games, data.picks);
                info!(
                    "Week loaded: {} games, {} saved picks",
                    games.len(),
                    self.store.saved().len()
                );
                self.games = games;
                self.load = WeekLoad::Loaded;
                self.week_status = LoadStatus::Ready;
            }
            Err(e) => {
                warn!("Failed to load week: {}", e);
                let message = e.message_or("Failed to load games for this week");
                self.load = WeekLoad::Idle;
                self.week_status = LoadStatus::Failed(message.clone());
                self.notice = Some(Notice::error(message, now));
            }
        }
        Vec::new()
    }

    // -- editing ------------------------------------------------------------

    fn ensure_editable(&self) -> Result<(), PickRejected> {
        match self.load {
            WeekLoad::Loaded => Ok(()),
            WeekLoad::Submitting => Err(PickRejected::SubmissionInFlight),
            WeekLoad::Idle | WeekLoad::Loading => Err(PickRejected::NotLoaded),
        }
    }

    /// Choose `team` for `game` in the working set. See `PickStore::set_pick`.
    pub fn set_pick(
        &mut self,
        game: GameId,
        team: TeamId,
        now: DateTime<Utc>,
    ) -> Result<bool, PickRejected> {
        self.ensure_editable()?;
        self.store.set_pick(game, team, now)
    }

    pub fn set_tiebreaker(
        &mut self,
        game: GameId,
        value: Option<u32>,
        now: DateTime<Utc>,
    ) -> Result<bool, PickRejected> {
        self.ensure_editable()?;
        self.store.set_tiebreaker(game, value, now)
    }

    /// A game that kicked off since the last redraw is worth telling the user
    /// about; other refusals come from controls the UI already disables.
    fn report_rejected_edit(&mut self, rejected: &PickRejected, now: DateTime<Utc>) {
        debug!("Edit ignored: {}", rejected);
        if matches!(rejected, PickRejected::GameStarted(_)) {
            self.notice = Some(Notice::warning("This game has started; its pick is locked", now));
        }
    }

    // -- submission ---------------------------------------------------------

    /// Submit the delta between the working set and the saved snapshot.
    ///
    /// An empty delta produces an informational notice and no request.
    pub fn submit(&mut self, now: DateTime<Utc>) -> Vec<Effect> {
        if self.load != WeekLoad::Loaded {
            debug!("Submit ignored in {:?}", self.phase());
            return Vec::new();
        }
        let Some(scope) = self.scope() else {
            return Vec::new();
        };

        let picks = self.store.delta();
        if picks.is_empty() {
            self.notice = Some(Notice::info("No changes to save", now));
            return Vec::new();
        }
        if self.tiebreaker_enabled() && picks.iter().any(|p| p.tiebreaker.is_none()) {
            self.notice = Some(Notice::warning(
                "This league uses tiebreakers: enter one for every changed pick",
                now,
            ));
            return Vec::new();
        }

        info!(
            "Submitting {} picks for league {} sport {} week {}",
            picks.len(),
            scope.league,
            scope.sport,
            scope.week
        );
        self.load = WeekLoad::Submitting;
        let ticket = self.issue(Level::Submit);
        vec![Effect::SubmitPicks {
            ticket,
            scope,
            picks,
        }]
    }

    fn on_submit_finished(
        &mut self,
        ticket: Ticket,
        result: Result<(), RequestFailed>,
        now: DateTime<Utc>,
    ) -> Vec<Effect> {
        if self.discard(&ticket) {
            return Vec::new();
        }
        self.load = WeekLoad::Loaded;
        match result {
            Ok(()) => {
                let count = self.store.delta().len();
                self.store.commit();
                info!("Submission acknowledged ({} picks)", count);
                let noun = if count == 1 { "pick" } else { "picks" };
                self.notice = Some(Notice::success(format!("Saved {count} {noun}"), now));
            }
            Err(e) => {
                warn!("Submission failed: {}", e);
                self.notice = Some(Notice::error(e.message_or("Failed to save picks"), now));
            }
        }
        Vec::new()
    }

    // -- misc ---------------------------------------------------------------

    /// Re-issue the deepest request the current selection allows. Refused
    /// while there are unsaved changes, since reloading replaces them.
    pub fn refresh(&mut self, now: DateTime<Utc>) -> Vec<Effect> {
        if self.load == WeekLoad::Submitting {
            return Vec::new();
        }
        if self.has_unsaved_changes() {
            self.notice = Some(Notice::warning(
                "Save your picks before refreshing",
                now,
            ));
            return Vec::new();
        }

        if self.weeks.selected.is_some() {
            return self.load_selected_week();
        }
        if let Some(sport) = self.sports.selected {
            self.weeks.clear(LoadStatus::Loading);
            self.clear_week();
            let ticket = self.issue(Level::Weeks);
            return vec![Effect::FetchWeeks { ticket, sport }];
        }
        if let Some(league) = self.leagues.selected {
            self.sports.clear(LoadStatus::Loading);
            self.weeks.clear(LoadStatus::Disabled);
            self.clear_week();
            let ticket = self.issue(Level::Sports);
            return vec![Effect::FetchLeague { ticket, league }];
        }
        let preferred = self.preferred_league;
        let effects = self.start();
        self.preferred_league = preferred;
        effects
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Drop the notice once it has been shown for `ttl`. Returns whether a
    /// notice was removed.
    pub fn expire_notice(&mut self, now: DateTime<Utc>, ttl: chrono::Duration) -> bool {
        if self.notice.as_ref().is_some_and(|n| n.is_expired(now, ttl)) {
            self.notice = None;
            return true;
        }
        false
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
