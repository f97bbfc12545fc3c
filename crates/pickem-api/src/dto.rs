// Wire DTOs for the pick'em REST API and their conversion to domain types.
//
// The backend has shipped several response shapes over time: lists either
// bare or wrapped in an object, camelCase or snake_case field names, teams as
// plain strings or nested objects, naive or zoned timestamps, and SQL-ish 0/1
// booleans. All of that tolerance lives here so the rest of the client only
// ever sees `pickem_core::models`.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use pickem_core::models::{
    FinalScore, Game, GameId, GameStatus, League, LeagueDetail, LeagueId, Pick, PickId, Sport,
    SportId, Team, TeamId, User, Week, WeekId,
};
use pickem_core::picks::PickDelta;

// ---------------------------------------------------------------------------
// Lists
// ---------------------------------------------------------------------------

/// A list response, either a bare array or an object wrapping one.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Bare(Vec<T>),
    Wrapped(Wrapped<T>),
}

#[derive(Debug, Deserialize)]
pub struct Wrapped<T> {
    #[serde(
        alias = "leagues",
        alias = "sports",
        alias = "weeks",
        alias = "games",
        alias = "picks",
        alias = "data"
    )]
    items: Vec<T>,
}

impl<T> Listing<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Listing::Bare(items) => items,
            Listing::Wrapped(w) => w.items,
        }
    }
}

/// The current-week endpoint answers with a list whose first entry wins, but
/// a single object is accepted too.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CurrentWeekBody {
    Many(Listing<WeekDto>),
    One(WeekDto),
}

impl CurrentWeekBody {
    pub fn into_first(self) -> Option<WeekDto> {
        match self {
            CurrentWeekBody::Many(list) => list.into_vec().into_iter().next(),
            CurrentWeekBody::One(week) => Some(week),
        }
    }
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(untagged)]
enum BoolLike {
    Bool(bool),
    Int(i64),
}

fn flexible_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<BoolLike>::deserialize(deserializer)? {
        Some(BoolLike::Bool(b)) => b,
        Some(BoolLike::Int(i)) => i != 0,
        None => false,
    })
}

fn flexible_opt_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<BoolLike>::deserialize(deserializer)? {
        Some(BoolLike::Bool(b)) => Some(b),
        Some(BoolLike::Int(i)) => Some(i != 0),
        None => None,
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(i64),
}

impl StringOrNumber {
    fn into_string(self) -> String {
        match self {
            StringOrNumber::String(s) => s,
            StringOrNumber::Number(n) => n.to_string(),
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    StringOrNumber::deserialize(deserializer).map(StringOrNumber::into_string)
}

fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<StringOrNumber>::deserialize(deserializer)?.map(StringOrNumber::into_string))
}

/// A count typed into a text field upstream: a number, a numeric string, or
/// blank. Anything that is not a non-negative integer reads as absent.
fn opt_u32_or_string<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<StringOrNumber>::deserialize(deserializer)? {
        Some(StringOrNumber::Number(n)) => u32::try_from(n).ok(),
        Some(StringOrNumber::String(s)) => s.trim().parse().ok(),
        None => None,
    })
}

/// RFC 3339, or a naive `YYYY-MM-DD[T ]HH:MM:SS[.f]` taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
}

// ---------------------------------------------------------------------------
// Leagues / sports / weeks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct SportDto {
    pub id: i64,
    pub name: String,
    #[serde(default, alias = "currentWeek")]
    pub current_week: Option<u32>,
}

impl SportDto {
    pub fn into_sport(self) -> Sport {
        Sport {
            id: SportId(self.id),
            name: self.name,
            current_week: self.current_week,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeagueDto {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub sports: Vec<SportDto>,
    #[serde(default, alias = "sportIds")]
    pub sport_ids: Vec<i64>,
    /// `GET /leagues` only lists leagues the user belongs to, so a missing
    /// flag means member.
    #[serde(default, alias = "isMember", deserialize_with = "flexible_opt_bool")]
    pub is_member: Option<bool>,
    #[serde(
        default,
        alias = "tiebreakerEnabled",
        alias = "tiebreaker",
        deserialize_with = "flexible_bool"
    )]
    pub tiebreaker_enabled: bool,
}

impl LeagueDto {
    pub fn into_league(self) -> League {
        self.split().0
    }

    pub fn into_detail(self) -> LeagueDetail {
        let (league, sports) = self.split();
        LeagueDetail { league, sports }
    }

    fn split(self) -> (League, Vec<Sport>) {
        let sports: Vec<Sport> = self.sports.into_iter().map(SportDto::into_sport).collect();
        let sport_ids = if sports.is_empty() {
            self.sport_ids.into_iter().map(SportId).collect()
        } else {
            sports.iter().map(|s| s.id).collect()
        };
        let league = League {
            id: LeagueId(self.id),
            name: self.name,
            sport_ids,
            is_member: self.is_member.unwrap_or(true),
            tiebreaker_enabled: self.tiebreaker_enabled,
        };
        (league, sports)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeekDto {
    pub id: i64,
    #[serde(default, alias = "weekNumber", alias = "week_number", alias = "week")]
    pub number: u32,
    #[serde(default, alias = "isCurrent", deserialize_with = "flexible_bool")]
    pub is_current: bool,
    #[serde(default, alias = "sportId")]
    pub sport_id: Option<i64>,
}

impl WeekDto {
    /// `sport` fills in the parent when the row omits it.
    pub fn into_week(self, sport: SportId) -> Week {
        Week {
            id: WeekId(self.id),
            // Rows without an ordinal are numbered by id so ordering stays stable.
            number: if self.number == 0 {
                u32::try_from(self.id).unwrap_or(0)
            } else {
                self.number
            },
            is_current: self.is_current,
            sport_id: self.sport_id.map(SportId).unwrap_or(sport),
        }
    }
}

// ---------------------------------------------------------------------------
// Games
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct TeamDto {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub logo: Option<String>,
}

/// A team as the backend sends it: just a name, or a nested object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TeamField {
    Name(String),
    Object(TeamDto),
}

impl TeamField {
    fn into_team(self, flat_logo: Option<String>) -> Team {
        match self {
            TeamField::Name(name) => Team {
                id: TeamId::new(name.clone()),
                name,
                logo: flat_logo,
            },
            TeamField::Object(dto) => Team {
                id: TeamId::new(dto.id.unwrap_or_else(|| dto.name.clone())),
                name: dto.name,
                logo: dto.logo.or(flat_logo),
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameDto {
    pub id: i64,
    #[serde(default, alias = "weekId")]
    pub week_id: Option<i64>,
    #[serde(alias = "homeTeam")]
    pub home_team: TeamField,
    #[serde(alias = "awayTeam")]
    pub away_team: TeamField,
    #[serde(default, alias = "homeTeamLogo")]
    pub home_team_logo: Option<String>,
    #[serde(default, alias = "awayTeamLogo")]
    pub away_team_logo: Option<String>,
    #[serde(
        alias = "game_time",
        alias = "gameTime",
        alias = "startTime",
        alias = "start_time",
        alias = "startsAt",
        deserialize_with = "timestamp"
    )]
    pub starts_at: DateTime<Utc>,
    #[serde(default)]
    pub spread: Option<f64>,
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(
        default,
        alias = "isCompleted",
        alias = "completed",
        deserialize_with = "flexible_opt_bool"
    )]
    pub is_completed: Option<bool>,
    #[serde(default, alias = "homeTeamScore", alias = "home_score")]
    pub home_team_score: Option<u32>,
    #[serde(default, alias = "awayTeamScore", alias = "away_score")]
    pub away_team_score: Option<u32>,
}

impl GameDto {
    pub fn into_game(self) -> Game {
        let mut status = self
            .status
            .as_deref()
            .map(GameStatus::parse)
            .unwrap_or(GameStatus::Scheduled);
        if self.is_completed == Some(true) {
            status = GameStatus::Completed;
        }
        let final_score = match (status, self.home_team_score, self.away_team_score) {
            (GameStatus::Completed, Some(home), Some(away)) => Some(FinalScore { home, away }),
            _ => None,
        };

        Game {
            id: GameId(self.id),
            week_id: self.week_id.map(WeekId),
            home: self.home_team.into_team(self.home_team_logo),
            away: self.away_team.into_team(self.away_team_logo),
            starts_at: self.starts_at,
            spread: self.spread,
            venue: self.venue,
            status,
            final_score,
        }
    }
}

// ---------------------------------------------------------------------------
// Picks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct PickDto {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(alias = "gameId")]
    pub game_id: i64,
    #[serde(
        alias = "teamId",
        alias = "picked_team",
        alias = "pickedTeam",
        deserialize_with = "string_or_number"
    )]
    pub team_id: String,
    #[serde(default, deserialize_with = "opt_u32_or_string")]
    pub tiebreaker: Option<u32>,
    #[serde(default, alias = "isCorrect", deserialize_with = "flexible_opt_bool")]
    pub is_correct: Option<bool>,
}

impl PickDto {
    pub fn into_pick(self) -> Pick {
        Pick {
            id: self.id.map(PickId),
            game_id: GameId(self.game_id),
            team_id: TeamId::new(self.team_id),
            tiebreaker: self.tiebreaker,
            is_correct: self.is_correct,
        }
    }
}

/// `POST /picks` body: the scope travels with the picks.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchedSubmit<'a> {
    pub league_id: LeagueId,
    pub sport_id: SportId,
    pub week: WeekId,
    pub picks: &'a [PickDelta],
}

/// Body for the path- and query-scoped submit styles.
#[derive(Debug, Serialize)]
pub struct ScopedSubmit<'a> {
    pub picks: &'a [PickDelta],
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserDto {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl UserDto {
    pub fn into_user(self) -> User {
        User {
            id: self.id,
            username: self.username,
            email: self.email,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(alias = "access_token", alias = "accessToken")]
    pub token: String,
    pub user: UserDto,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ProfileBody {
    Wrapped { user: UserDto },
    Bare(UserDto),
}

impl ProfileBody {
    pub fn into_user(self) -> User {
        match self {
            ProfileBody::Wrapped { user } | ProfileBody::Bare(user) => user.into_user(),
        }
    }
}

// ---------------------------------------------------------------------------
// Error bodies
// ---------------------------------------------------------------------------

/// Extract a human readable message from an error body: `message`, then
/// `detail`, then `error.message`. Non-string values are ignored.
pub fn error_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let pick = |v: Option<&serde_json::Value>| {
        v.and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    pick(value.get("message"))
        .or_else(|| pick(value.get("detail")))
        .or_else(|| pick(value.get("error").and_then(|e| e.get("message"))))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn listing_accepts_bare_and_wrapped() {
        let bare: Listing<SportDto> =
            serde_json::from_str(r#"[{"id": 1, "name": "NFL"}]"#).unwrap();
        assert_eq!(bare.into_vec().len(), 1);

        let wrapped: Listing<LeagueDto> = serde_json::from_str(
            r#"{"leagues": [{"id": 3, "name": "Office", "sports": [{"id": 1, "name": "NFL"}]}]}"#,
        )
        .unwrap();
        let leagues: Vec<League> = wrapped.into_vec().into_iter().map(LeagueDto::into_league).collect();
        assert_eq!(leagues[0].id, LeagueId(3));
        assert_eq!(leagues[0].sport_ids, vec![SportId(1)]);
        assert!(leagues[0].is_member);
    }

    #[test]
    fn league_flags_accept_sql_integers() {
        let dto: LeagueDto = serde_json::from_str(
            r#"{"id": 1, "name": "L", "tiebreaker_enabled": 1, "is_member": 0}"#,
        )
        .unwrap();
        let league = dto.into_league();
        assert!(league.tiebreaker_enabled);
        assert!(!league.is_member);
    }

    #[test]
    fn league_detail_carries_sports_with_current_week() {
        let dto: LeagueDto = serde_json::from_str(
            r#"{"id": 9, "name": "L", "tiebreakerEnabled": true,
                "sports": [{"id": 2, "name": "NCAAF", "current_week": 5}]}"#,
        )
        .unwrap();
        let detail = dto.into_detail();
        assert!(detail.league.tiebreaker_enabled);
        assert_eq!(detail.sports[0].current_week, Some(5));
    }

    #[test]
    fn current_week_first_entry_wins() {
        let body: CurrentWeekBody =
            serde_json::from_str(r#"[{"id": 12, "week": 4}, {"id": 13, "week": 5}]"#).unwrap();
        let week = body.into_first().unwrap().into_week(SportId(1));
        assert_eq!(week.id, WeekId(12));
        assert_eq!(week.number, 4);
        assert_eq!(week.sport_id, SportId(1));

        let single: CurrentWeekBody =
            serde_json::from_str(r#"{"id": 12, "weekNumber": 4, "isCurrent": true}"#).unwrap();
        assert!(single.into_first().unwrap().is_current);

        let empty: CurrentWeekBody = serde_json::from_str("[]").unwrap();
        assert!(empty.into_first().is_none());
    }

    #[test]
    fn flat_snake_case_game_row() {
        let dto: GameDto = serde_json::from_str(
            r#"{"id": 5, "home_team": "Chiefs", "away_team": "Bills",
                "home_team_logo": "kc.png", "game_time": "2026-09-14T17:00:00",
                "spread": -3.5, "venue": "Arrowhead", "status": "completed",
                "home_team_score": 27, "away_team_score": 20}"#,
        )
        .unwrap();
        let game = dto.into_game();
        assert_eq!(game.home.id, TeamId::new("Chiefs"));
        assert_eq!(game.home.logo.as_deref(), Some("kc.png"));
        assert_eq!(game.away.logo, None);
        assert_eq!(game.starts_at, Utc.with_ymd_and_hms(2026, 9, 14, 17, 0, 0).unwrap());
        assert_eq!(game.status, GameStatus::Completed);
        assert_eq!(game.final_score, Some(FinalScore { home: 27, away: 20 }));
    }

    #[test]
    fn nested_camel_case_game_row() {
        let dto: GameDto = serde_json::from_str(
            r#"{"id": 6, "weekId": 3,
                "homeTeam": {"id": 11, "name": "Cowboys", "logo": "dal.png"},
                "awayTeam": {"name": "Eagles"},
                "startTime": "2026-09-14T20:25:00Z"}"#,
        )
        .unwrap();
        let game = dto.into_game();
        assert_eq!(game.week_id, Some(WeekId(3)));
        assert_eq!(game.home.id, TeamId::new("11"));
        assert_eq!(game.away.id, TeamId::new("Eagles"));
        assert_eq!(game.status, GameStatus::Scheduled);
        assert_eq!(game.final_score, None);
    }

    #[test]
    fn pick_rows_in_both_casings() {
        let camel: PickDto =
            serde_json::from_str(r#"{"id": 1, "gameId": 5, "teamId": "Chiefs", "isCorrect": true}"#)
                .unwrap();
        let snake: PickDto =
            serde_json::from_str(r#"{"game_id": 5, "picked_team": "Chiefs", "tiebreaker": 44}"#)
                .unwrap();
        let camel = camel.into_pick();
        let snake = snake.into_pick();
        assert_eq!(camel.game_id, snake.game_id);
        assert_eq!(camel.team_id, snake.team_id);
        assert_eq!(camel.is_correct, Some(true));
        assert_eq!(snake.id, None);
        assert_eq!(snake.tiebreaker, Some(44));
    }

    #[test]
    fn tiebreaker_typed_as_text_still_decodes() {
        let body = r#"{"picks": [
            {"id": 1, "game_id": 5, "picked_team": "Chiefs", "tiebreaker": "44"},
            {"id": 2, "game_id": 6, "picked_team": "Bills", "tiebreaker": ""},
            {"id": 3, "game_id": 7, "picked_team": "Jets", "tiebreaker": null},
            {"id": 4, "game_id": 8, "picked_team": "Rams", "tiebreaker": " 12 "}
        ]}"#;
        let picks: Vec<Pick> = serde_json::from_str::<Listing<PickDto>>(body)
            .unwrap()
            .into_vec()
            .into_iter()
            .map(PickDto::into_pick)
            .collect();
        let tiebreakers: Vec<_> = picks.iter().map(|p| p.tiebreaker).collect();
        assert_eq!(tiebreakers, vec![Some(44), None, None, Some(12)]);
    }

    #[test]
    fn submit_bodies_serialize_scope_in_camel_case() {
        let picks = vec![PickDelta { game_id: GameId(5), team_id: TeamId::new("KC"), tiebreaker: None }];
        let body = BatchedSubmit {
            league_id: LeagueId(1),
            sport_id: SportId(2),
            week: WeekId(3),
            picks: &picks,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"leagueId": 1, "sportId": 2, "week": 3,
                               "picks": [{"gameId": 5, "teamId": "KC"}]})
        );
    }

    #[test]
    fn login_response_and_profile_shapes() {
        let login: LoginResponse = serde_json::from_str(
            r#"{"message": "Login successful", "token": "t0k",
                "user": {"id": 1, "username": "alice", "email": null, "display_name": "A"}}"#,
        )
        .unwrap();
        assert_eq!(login.token, "t0k");
        assert_eq!(login.user.into_user().username, "alice");

        let wrapped: ProfileBody =
            serde_json::from_str(r#"{"user": {"id": 2, "username": "bob"}}"#).unwrap();
        assert_eq!(wrapped.into_user().id, 2);
        let bare: ProfileBody = serde_json::from_str(r#"{"id": 3, "username": "cy"}"#).unwrap();
        assert_eq!(bare.into_user().id, 3);
    }

    #[test]
    fn error_detail_prefers_message_then_detail() {
        assert_eq!(
            error_detail(r#"{"message": "Locked", "detail": "ignored"}"#).as_deref(),
            Some("Locked")
        );
        assert_eq!(
            error_detail(r#"{"detail": "Game not found"}"#).as_deref(),
            Some("Game not found")
        );
        assert_eq!(
            error_detail(r#"{"error": {"message": "nested"}}"#).as_deref(),
            Some("nested")
        );
        // FastAPI validation errors carry a list in `detail`.
        assert_eq!(error_detail(r#"{"detail": [{"loc": ["body"]}]}"#), None);
        assert_eq!(error_detail("<html>502</html>"), None);
    }

    #[test]
    fn timestamps_with_and_without_zone() {
        let expected = Utc.with_ymd_and_hms(2026, 9, 14, 17, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2026-09-14T17:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2026-09-14T13:00:00-04:00"), Some(expected));
        assert_eq!(parse_timestamp("2026-09-14 17:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2026-09-14T17:00:00.000"), Some(expected));
        assert_eq!(parse_timestamp("Sunday"), None);
    }
}
