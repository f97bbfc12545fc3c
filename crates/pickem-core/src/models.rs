// Domain model: leagues, sports, weeks, games, and picks.
//
// Everything except `Pick` is owned by the backend and only ever read by the
// client. Identifiers are newtypes so the working and saved pick mappings can
// only ever be keyed by `GameId`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

numeric_id!(
    /// Backend identifier of a league.
    LeagueId
);
numeric_id!(
    /// Backend identifier of a sport.
    SportId
);
numeric_id!(
    /// Backend identifier of a week within a sport's season.
    WeekId
);
numeric_id!(
    /// Backend identifier of a scheduled game.
    GameId
);
numeric_id!(PickId);

/// Team identifier. The backend keys teams by their display string, so this
/// is textual rather than numeric.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(pub String);

impl TeamId {
    pub fn new(id: impl Into<String>) -> Self {
        TeamId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// League / Sport / Week
// ---------------------------------------------------------------------------

/// A group of users competing under shared sports and tiebreaker settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct League {
    pub id: LeagueId,
    pub name: String,
    /// Sports the league picks against. May be empty in list responses that
    /// omit the sport join; the league detail is authoritative.
    pub sport_ids: Vec<SportId>,
    pub is_member: bool,
    pub tiebreaker_enabled: bool,
}

/// League detail as returned by the backend: the league plus its sports.
#[derive(Debug, Clone, PartialEq)]
pub struct LeagueDetail {
    pub league: League,
    pub sports: Vec<Sport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sport {
    pub id: SportId,
    pub name: String,
    /// Ordinal of the sport's active week, if the backend reports one.
    pub current_week: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Week {
    pub id: WeekId,
    pub number: u32,
    pub is_current: bool,
    pub sport_id: SportId,
}

impl Week {
    pub fn label(&self) -> String {
        format!("Week {}", self.number)
    }
}

/// The week list for a sport plus the backend's current-week marker.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WeekListing {
    pub weeks: Vec<Week>,
    pub current: Option<Week>,
}

// ---------------------------------------------------------------------------
// Games
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub logo: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    Scheduled,
    InProgress,
    Completed,
    Postponed,
    Unknown,
}

impl GameStatus {
    /// Parse the backend's status string (`"in_progress"`, `"completed"`, ...).
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "scheduled" | "pre" | "" => GameStatus::Scheduled,
            "in_progress" | "in" | "live" => GameStatus::InProgress,
            "completed" | "final" | "post" => GameStatus::Completed,
            "postponed" => GameStatus::Postponed,
            _ => GameStatus::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GameStatus::Scheduled => "scheduled",
            GameStatus::InProgress => "in progress",
            GameStatus::Completed => "completed",
            GameStatus::Postponed => "postponed",
            GameStatus::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalScore {
    pub home: u32,
    pub away: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub week_id: Option<WeekId>,
    pub home: Team,
    pub away: Team,
    pub starts_at: DateTime<Utc>,
    /// Point spread relative to the home team (negative = home favored).
    pub spread: Option<f64>,
    pub venue: Option<String>,
    pub status: GameStatus,
    pub final_score: Option<FinalScore>,
}

impl Game {
    pub fn is_completed(&self) -> bool {
        self.status == GameStatus::Completed
    }

    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        now >= self.starts_at
    }

    /// A game is locked for edits once it has kicked off or been marked
    /// complete, whichever the client learns about first.
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.has_started(now) || self.is_completed()
    }

    /// Look up one of the two participating teams.
    pub fn team(&self, team_id: &TeamId) -> Option<&Team> {
        if &self.home.id == team_id {
            Some(&self.home)
        } else if &self.away.id == team_id {
            Some(&self.away)
        } else {
            None
        }
    }

    pub fn involves(&self, team_id: &TeamId) -> bool {
        self.team(team_id).is_some()
    }

    /// Human readable betting line, e.g. `"KC -3.5"` or `"Even"`.
    pub fn betting_line(&self) -> String {
        match self.spread {
            None => "Even".to_string(),
            Some(s) if s == 0.0 => "Even".to_string(),
            Some(s) => {
                let favored = if s < 0.0 { &self.home.name } else { &self.away.name };
                format!("{} -{}", favored, format_points(s.abs()))
            }
        }
    }
}

/// Format a spread with an explicit sign: `+3.5`, `-7`, `0`.
pub fn format_spread(spread: f64) -> String {
    if spread > 0.0 {
        format!("+{}", format_points(spread))
    } else if spread < 0.0 {
        format!("-{}", format_points(spread.abs()))
    } else {
        "0".to_string()
    }
}

fn format_points(points: f64) -> String {
    if points.fract() == 0.0 {
        format!("{points:.0}")
    } else {
        format!("{points}")
    }
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// The signed-in user, as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
}

// ---------------------------------------------------------------------------
// Picks
// ---------------------------------------------------------------------------

/// A pick as saved on the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pick {
    /// `None` until the backend has stored the pick.
    pub id: Option<PickId>,
    pub game_id: GameId,
    pub team_id: TeamId,
    pub tiebreaker: Option<u32>,
    /// Only set once the game is final.
    pub is_correct: Option<bool>,
}

/// The (league, sport, week) triple a pick page is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PickScope {
    pub league: LeagueId,
    pub sport: SportId,
    pub week: WeekId,
}
