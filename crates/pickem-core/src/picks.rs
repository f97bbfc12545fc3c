// Pick state store and diff engine.
//
// The store holds two mappings keyed by `GameId`: the working set the user is
// editing and the snapshot last acknowledged by the server. Only the working
// set is ever touched by edits; the snapshot is replaced wholesale on load and
// after a successful submission. The delta between the two is what gets sent.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::models::{Game, GameId, Pick, TeamId};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The user's selection for a single game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickChoice {
    pub team: TeamId,
    /// Predicted combined score, used by tiebreaker-enabled leagues.
    pub tiebreaker: Option<u32>,
}

impl PickChoice {
    pub fn team(team: TeamId) -> Self {
        PickChoice { team, tiebreaker: None }
    }
}

/// Mapping of game to choice. Ordered so deltas come out in a stable order.
pub type PickMap = BTreeMap<GameId, PickChoice>;

/// One changed entry, as submitted to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickDelta {
    pub game_id: GameId,
    pub team_id: TeamId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tiebreaker: Option<u32>,
}

/// Why an edit was refused. A refused edit never changes the working set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PickRejected {
    #[error("game {0} is not part of the loaded week")]
    UnknownGame(GameId),

    #[error("team {team} is not playing in game {game}")]
    TeamNotInGame { game: GameId, team: TeamId },

    #[error("game {0} has already started")]
    GameStarted(GameId),

    #[error("a tiebreaker needs a team picked for game {0} first")]
    NoTeamPicked(GameId),

    #[error("picks are being submitted")]
    SubmissionInFlight,

    #[error("no week is loaded")]
    NotLoaded,
}

// ---------------------------------------------------------------------------
// Diff
// ---------------------------------------------------------------------------

fn is_changed(game: &GameId, choice: &PickChoice, saved: &PickMap) -> bool {
    saved.get(game) != Some(choice)
}

/// Compute the entries of `working` whose value differs from `saved`.
///
/// Keys absent from `saved` count as unset, so every newly set pick is part of
/// the delta. Keys only present in `saved` are ignored; edits never remove a
/// pick.
pub fn diff(working: &PickMap, saved: &PickMap) -> Vec<PickDelta> {
    working
        .iter()
        .filter(|(game, choice)| is_changed(game, choice, saved))
        .map(|(game, choice)| PickDelta {
            game_id: *game,
            team_id: choice.team.clone(),
            tiebreaker: choice.tiebreaker,
        })
        .collect()
}

/// True iff `diff(working, saved)` is non-empty.
pub fn has_unsaved_changes(working: &PickMap, saved: &PickMap) -> bool {
    working
        .iter()
        .any(|(game, choice)| is_changed(game, choice, saved))
}

// ---------------------------------------------------------------------------
// PickStore
// ---------------------------------------------------------------------------

/// Working set plus saved snapshot for the currently loaded week.
#[derive(Debug, Clone, Default)]
pub struct PickStore {
    games: HashMap<GameId, Game>,
    working: PickMap,
    saved: PickMap,
    /// Server records as loaded, kept for ids and correctness flags.
    records: HashMap<GameId, Pick>,
}

impl PickStore {
    /// Seed the store from a week's games and the server's saved picks.
    ///
    /// Picks for games outside the week, or for a team that isn't playing in
    /// the referenced game, are dropped so both mappings share the same key
    /// domain as `games`.
    pub fn load(games: &[Game], picks: Vec<Pick>) -> Self {
        let by_id: HashMap<GameId, Game> = games.iter().map(|g| (g.id, g.clone())).collect();

        let mut saved = PickMap::new();
        let mut records = HashMap::new();
        for pick in picks {
            match by_id.get(&pick.game_id) {
                Some(g) if g.involves(&pick.team_id) => {
                    saved.insert(
                        pick.game_id,
                        PickChoice {
                            team: pick.team_id.clone(),
                            tiebreaker: pick.tiebreaker,
                        },
                    );
                    records.insert(pick.game_id, pick);
                }
                Some(_) => {
                    warn!(
                        "Dropping saved pick for game {}: team '{}' is not playing",
                        pick.game_id, pick.team_id
                    );
                }
                None => {
                    warn!("Dropping saved pick for unknown game {}", pick.game_id);
                }
            }
        }

        PickStore {
            games: by_id,
            working: saved.clone(),
            saved,
            records,
        }
    }

    /// Choose `team` for `game`. Returns `Ok(true)` when the working set
    /// changed and `Ok(false)` when that team was already chosen.
    ///
    /// An existing tiebreaker is kept when the team changes.
    pub fn set_pick(
        &mut self,
        game: GameId,
        team: TeamId,
        now: DateTime<Utc>,
    ) -> Result<bool, PickRejected> {
        let known = self.games.get(&game).ok_or(PickRejected::UnknownGame(game))?;
        if !known.involves(&team) {
            return Err(PickRejected::TeamNotInGame { game, team });
        }
        if known.is_locked(now) {
            return Err(PickRejected::GameStarted(game));
        }

        match self.working.get_mut(&game) {
            Some(existing) if existing.team == team => Ok(false),
            Some(existing) => {
                existing.team = team;
                Ok(true)
            }
            None => {
                self.working.insert(game, PickChoice::team(team));
                Ok(true)
            }
        }
    }

    /// Set or clear the tiebreaker on an existing pick.
    pub fn set_tiebreaker(
        &mut self,
        game: GameId,
        value: Option<u32>,
        now: DateTime<Utc>,
    ) -> Result<bool, PickRejected> {
        let known = self.games.get(&game).ok_or(PickRejected::UnknownGame(game))?;
        if known.is_locked(now) {
            return Err(PickRejected::GameStarted(game));
        }
        let choice = self
            .working
            .get_mut(&game)
            .ok_or(PickRejected::NoTeamPicked(game))?;
        if choice.tiebreaker == value {
            return Ok(false);
        }
        choice.tiebreaker = value;
        Ok(true)
    }

    /// Entries that differ from the saved snapshot.
    pub fn delta(&self) -> Vec<PickDelta> {
        diff(&self.working, &self.saved)
    }

    pub fn is_dirty(&self) -> bool {
        has_unsaved_changes(&self.working, &self.saved)
    }

    /// Whether `game` has an unsaved edit.
    pub fn is_game_dirty(&self, game: GameId) -> bool {
        self.working
            .get(&game)
            .is_some_and(|choice| is_changed(&game, choice, &self.saved))
    }

    /// Replace the saved snapshot with a full copy of the working set. Called
    /// once the server has acknowledged a submission.
    pub fn commit(&mut self) {
        self.saved = self.working.clone();
    }

    pub fn is_locked(&self, game: GameId, now: DateTime<Utc>) -> bool {
        self.games.get(&game).map_or(true, |g| g.is_locked(now))
    }

    /// Number of loaded games closed to edits at `now`.
    pub fn locked_count(&self, now: DateTime<Utc>) -> usize {
        self.games.values().filter(|g| g.is_locked(now)).count()
    }

    pub fn choice(&self, game: GameId) -> Option<&PickChoice> {
        self.working.get(&game)
    }

    pub fn saved_choice(&self, game: GameId) -> Option<&PickChoice> {
        self.saved.get(&game)
    }

    /// Server record for `game` as loaded (id and correctness flag).
    pub fn record(&self, game: GameId) -> Option<&Pick> {
        self.records.get(&game)
    }

    pub fn working(&self) -> &PickMap {
        &self.working
    }

    pub fn saved(&self) -> &PickMap {
        &self.saved
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GameStatus, PickId, Team, WeekId};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 9, 13, 12, 0, 0).unwrap()
    }

    fn game(id: i64, home: &str, away: &str, starts_in: Duration) -> Game {
        Game {
            id: GameId(id),
            week_id: Some(WeekId(1)),
            home: Team { id: TeamId::new(home), name: home.into(), logo: None },
            away: Team { id: TeamId::new(away), name: away.into(), logo: None },
            starts_at: now() + starts_in,
            spread: Some(-3.0),
            venue: None,
            status: GameStatus::Scheduled,
            final_score: None,
        }
    }

    fn week() -> Vec<Game> {
        vec![
            game(1, "KC", "BUF", Duration::hours(5)),
            game(2, "DAL", "PHI", Duration::hours(8)),
            game(3, "SF", "SEA", Duration::hours(-1)),
        ]
    }

    fn saved(game: i64, team: &str) -> Pick {
        Pick {
            id: Some(PickId(100 + game)),
            game_id: GameId(game),
            team_id: TeamId::new(team),
            tiebreaker: None,
            is_correct: None,
        }
    }

    fn map(entries: &[(i64, &str)]) -> PickMap {
        entries
            .iter()
            .map(|(g, t)| (GameId(*g), PickChoice::team(TeamId::new(*t))))
            .collect()
    }

    #[test]
    fn new_pick_against_empty_snapshot_is_the_whole_delta() {
        let working = map(&[(1, "X")]);
        let snapshot = PickMap::new();
        let delta = diff(&working, &snapshot);
        assert_eq!(
            delta,
            vec![PickDelta { game_id: GameId(1), team_id: TeamId::new("X"), tiebreaker: None }]
        );
        assert!(has_unsaved_changes(&working, &snapshot));
    }

    #[test]
    fn unchanged_entries_are_excluded_from_delta() {
        let working = map(&[(1, "X"), (2, "Y")]);
        let snapshot = map(&[(1, "X")]);
        let delta = diff(&working, &snapshot);
        assert_eq!(delta.len(), 1);
        assert_eq!(delta[0].game_id, GameId(2));
        assert_eq!(delta[0].team_id, TeamId::new("Y"));
    }

    #[test]
    fn changed_team_is_in_delta() {
        let delta = diff(&map(&[(1, "Y")]), &map(&[(1, "X")]));
        assert_eq!(delta.len(), 1);
        assert_eq!(delta[0].team_id, TeamId::new("Y"));
    }

    #[test]
    fn dirty_check_agrees_with_diff() {
        let cases = [
            (map(&[]), map(&[])),
            (map(&[(1, "X")]), map(&[(1, "X")])),
            (map(&[(1, "X")]), map(&[(1, "Y")])),
            (map(&[(1, "X"), (2, "Y")]), map(&[(2, "Y")])),
            (map(&[]), map(&[(1, "X")])),
        ];
        for (working, snapshot) in &cases {
            assert_eq!(
                diff(working, snapshot).is_empty(),
                !has_unsaved_changes(working, snapshot),
                "working={working:?} snapshot={snapshot:?}"
            );
        }
    }

    #[test]
    fn load_seeds_both_mappings_from_server_picks() {
        let store = PickStore::load(&week(), vec![saved(1, "KC"), saved(2, "PHI")]);
        assert_eq!(store.working(), store.saved());
        assert_eq!(store.working().len(), 2);
        assert!(!store.is_dirty());
        assert_eq!(store.record(GameId(1)).and_then(|p| p.id), Some(PickId(101)));
    }

    #[test]
    fn load_drops_picks_outside_the_key_domain() {
        let store = PickStore::load(&week(), vec![saved(1, "NYJ"), saved(99, "KC")]);
        assert!(store.working().is_empty());
        assert!(store.saved().is_empty());
    }

    #[test]
    fn set_pick_touches_working_set_only() {
        let mut store = PickStore::load(&week(), vec![saved(1, "KC")]);
        assert_eq!(store.set_pick(GameId(1), TeamId::new("BUF"), now()), Ok(true));
        assert_eq!(store.choice(GameId(1)).map(|c| c.team.as_str()), Some("BUF"));
        assert_eq!(store.saved_choice(GameId(1)).map(|c| c.team.as_str()), Some("KC"));
        assert!(store.is_dirty());
        assert!(store.is_game_dirty(GameId(1)));
        assert!(!store.is_game_dirty(GameId(2)));
    }

    #[test]
    fn picking_the_same_team_again_is_not_a_change() {
        let mut store = PickStore::load(&week(), vec![saved(1, "KC")]);
        assert_eq!(store.set_pick(GameId(1), TeamId::new("KC"), now()), Ok(false));
        assert!(!store.is_dirty());
    }

    #[test]
    fn reverting_an_edit_clears_dirty_state() {
        let mut store = PickStore::load(&week(), vec![saved(1, "KC")]);
        store.set_pick(GameId(1), TeamId::new("BUF"), now()).unwrap();
        store.set_pick(GameId(1), TeamId::new("KC"), now()).unwrap();
        assert!(!store.is_dirty());
        assert!(store.delta().is_empty());
    }

    #[test]
    fn started_game_is_frozen() {
        let mut store = PickStore::load(&week(), vec![saved(3, "SF")]);
        let before = store.working().clone();
        assert_eq!(
            store.set_pick(GameId(3), TeamId::new("SEA"), now()),
            Err(PickRejected::GameStarted(GameId(3)))
        );
        assert_eq!(store.working(), &before);
        assert!(store.is_locked(GameId(3), now()));
    }

    #[test]
    fn game_that_kicks_off_mid_session_freezes_without_blocking_others() {
        let mut store = PickStore::load(&week(), vec![]);
        store.set_pick(GameId(1), TeamId::new("KC"), now()).unwrap();
        store.set_pick(GameId(2), TeamId::new("DAL"), now()).unwrap();

        // Game 1 kicks off.
        let later = now() + Duration::hours(6);
        assert_eq!(
            store.set_pick(GameId(1), TeamId::new("BUF"), later),
            Err(PickRejected::GameStarted(GameId(1)))
        );
        assert_eq!(store.set_pick(GameId(2), TeamId::new("PHI"), later), Ok(true));

        // The earlier pick on game 1 is still part of the delta.
        let delta = store.delta();
        assert_eq!(delta.len(), 2);
        assert_eq!(delta[0].team_id, TeamId::new("KC"));
        assert_eq!(delta[1].team_id, TeamId::new("PHI"));
    }

    #[test]
    fn store_lock_follows_the_game_rule() {
        let mut games = week();
        games[1].status = GameStatus::Completed;
        let mut store = PickStore::load(&games, vec![]);
        for g in &games {
            assert_eq!(store.is_locked(g.id, now()), g.is_locked(now()), "game {}", g.id);
        }
        assert_eq!(
            store.set_pick(GameId(2), TeamId::new("DAL"), now()),
            Err(PickRejected::GameStarted(GameId(2)))
        );
        assert!(store.is_locked(GameId(42), now()));
    }

    #[test]
    fn locked_count_grows_as_games_kick_off() {
        let store = PickStore::load(&week(), vec![]);
        assert_eq!(store.locked_count(now()), 1);
        assert_eq!(store.locked_count(now() + Duration::hours(6)), 2);
        assert_eq!(store.locked_count(now() + Duration::hours(9)), 3);
    }

    #[test]
    fn unknown_game_and_foreign_team_are_rejected() {
        let mut store = PickStore::load(&week(), vec![]);
        assert_eq!(
            store.set_pick(GameId(42), TeamId::new("KC"), now()),
            Err(PickRejected::UnknownGame(GameId(42)))
        );
        assert_eq!(
            store.set_pick(GameId(1), TeamId::new("DAL"), now()),
            Err(PickRejected::TeamNotInGame { game: GameId(1), team: TeamId::new("DAL") })
        );
        assert!(store.working().is_empty());
    }

    #[test]
    fn tiebreaker_change_is_dirty_and_survives_team_switch() {
        let mut store = PickStore::load(&week(), vec![saved(1, "KC")]);
        assert_eq!(store.set_tiebreaker(GameId(1), Some(47), now()), Ok(true));
        assert!(store.is_dirty());
        store.set_pick(GameId(1), TeamId::new("BUF"), now()).unwrap();
        assert_eq!(store.choice(GameId(1)).and_then(|c| c.tiebreaker), Some(47));
        assert_eq!(store.delta()[0].tiebreaker, Some(47));
    }

    #[test]
    fn tiebreaker_requires_a_team() {
        let mut store = PickStore::load(&week(), vec![]);
        assert_eq!(
            store.set_tiebreaker(GameId(2), Some(30), now()),
            Err(PickRejected::NoTeamPicked(GameId(2)))
        );
    }

    #[test]
    fn commit_makes_snapshot_equal_working_set() {
        let mut store = PickStore::load(&week(), vec![saved(1, "KC")]);
        store.set_pick(GameId(2), TeamId::new("PHI"), now()).unwrap();
        let before = store.saved().clone();
        let delta = store.delta();

        store.commit();

        // New snapshot is S ∪ D.
        let mut expected = before;
        for d in delta {
            expected.insert(
                d.game_id,
                PickChoice { team: d.team_id, tiebreaker: d.tiebreaker },
            );
        }
        assert_eq!(store.saved(), &expected);
        assert!(store.delta().is_empty());
        assert!(!store.is_dirty());
    }

    #[test]
    fn delta_serializes_without_absent_tiebreaker() {
        let delta = PickDelta { game_id: GameId(7), team_id: TeamId::new("KC"), tiebreaker: None };
        let json = serde_json::to_value(&delta).unwrap();
        assert_eq!(json, serde_json::json!({ "gameId": 7, "teamId": "KC" }));
    }
}
