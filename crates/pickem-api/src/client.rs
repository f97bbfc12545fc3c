// HTTP client for the pick'em REST API.
//
// Attaches the bearer token to every request, maps 401 to
// `ApiError::Unauthorized`, pulls the server's error detail out of failure
// bodies, and decodes successful bodies through the tolerant DTOs.

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use pickem_core::config::{ApiConfig, SubmitStyle};
use pickem_core::models::{
    Game, League, LeagueDetail, LeagueId, Pick, PickScope, SportId, User, WeekId, WeekListing,
};
use pickem_core::picks::PickDelta;

use crate::backend::Backend;
use crate::dto::{
    self, BatchedSubmit, CurrentWeekBody, GameDto, LeagueDto, Listing, LoginRequest,
    LoginResponse, PickDto, ProfileBody, ScopedSubmit, WeekDto,
};
use crate::error::ApiError;

// ---------------------------------------------------------------------------
// ApiClient
// ---------------------------------------------------------------------------

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    submit_style: SubmitStyle,
    token: RwLock<Option<String>>,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            submit_style: config.submit_style,
            token: RwLock::new(None),
        })
    }

    pub fn has_token(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self.token.read().unwrap_or_else(PoisonError::into_inner);
        match token.as_deref() {
            Some(t) => request.bearer_auth(t),
            None => request,
        }
    }

    /// Send `request`, turning non-success statuses into `ApiError`s.
    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = dto::error_detail(&body);
        if status == StatusCode::UNAUTHORIZED {
            debug!("Server answered 401");
            return Err(ApiError::Unauthorized { detail });
        }
        warn!("Server answered {}: {}", status, detail.as_deref().unwrap_or("<no detail>"));
        Err(ApiError::Status {
            status: status.as_u16(),
            detail,
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        debug!("GET {}", path);
        let response = self.send(self.http.get(self.url(path)).query(query)).await?;
        Self::decode(response).await
    }

    /// URL, query string and JSON body for a submission under the configured
    /// style.
    fn submit_request(&self, scope: PickScope, picks: &[PickDelta]) -> RequestBuilder {
        match self.submit_style {
            SubmitStyle::BatchedBody => self.http.post(self.url("/picks")).json(&BatchedSubmit {
                league_id: scope.league,
                sport_id: scope.sport,
                week: scope.week,
                picks,
            }),
            SubmitStyle::PathScoped => self
                .http
                .post(self.url(&format!(
                    "/leagues/{}/sports/{}/weeks/{}/picks",
                    scope.league, scope.sport, scope.week
                )))
                .json(&ScopedSubmit { picks }),
            SubmitStyle::QueryScoped => self
                .http
                .post(self.url("/picks"))
                .query(&scope_query(scope))
                .json(&ScopedSubmit { picks }),
        }
    }
}

fn scope_query(scope: PickScope) -> [(&'static str, String); 3] {
    [
        ("leagueId", scope.league.to_string()),
        ("sportId", scope.sport.to_string()),
        ("week", scope.week.to_string()),
    ]
}

// ---------------------------------------------------------------------------
// Backend implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl Backend for ApiClient {
    async fn leagues(&self) -> Result<Vec<League>, ApiError> {
        let list: Listing<LeagueDto> = self.get_json("/leagues", &[]).await?;
        Ok(list.into_vec().into_iter().map(LeagueDto::into_league).collect())
    }

    async fn league(&self, id: LeagueId) -> Result<LeagueDetail, ApiError> {
        let dto: LeagueDto = self.get_json(&format!("/leagues/{id}"), &[]).await?;
        Ok(dto.into_detail())
    }

    async fn weeks(&self, sport: SportId) -> Result<WeekListing, ApiError> {
        let list_path = format!("/sports/{sport}/weeks");
        let current_path = format!("/sports/{sport}/current-week");
        let (list, current) = tokio::join!(
            self.get_json::<Listing<WeekDto>>(&list_path, &[]),
            self.get_json::<CurrentWeekBody>(&current_path, &[]),
        );

        // Older backends only expose the current-week marker.
        let weeks = match list {
            Ok(list) => list.into_vec(),
            Err(ApiError::Status { status: 404, .. }) => {
                debug!("No week list for sport {}, using current week only", sport);
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        let current = match current {
            Ok(body) => body.into_first(),
            Err(ApiError::Status { status: 404, .. }) => {
                debug!("No current-week marker for sport {}, relying on the list", sport);
                None
            }
            Err(e) => return Err(e),
        };

        Ok(WeekListing {
            weeks: weeks.into_iter().map(|w| w.into_week(sport)).collect(),
            current: current.map(|w| w.into_week(sport)),
        })
    }

    async fn games(&self, sport: SportId, week: WeekId) -> Result<Vec<Game>, ApiError> {
        let query = [("sportId", sport.to_string()), ("week", week.to_string())];
        let list: Listing<GameDto> = self.get_json("/games", &query).await?;
        Ok(list.into_vec().into_iter().map(GameDto::into_game).collect())
    }

    async fn user_picks(&self, scope: PickScope) -> Result<Vec<Pick>, ApiError> {
        let list: Listing<PickDto> = self.get_json("/picks/user", &scope_query(scope)).await?;
        Ok(list.into_vec().into_iter().map(PickDto::into_pick).collect())
    }

    async fn submit_picks(&self, scope: PickScope, picks: &[PickDelta]) -> Result<(), ApiError> {
        info!(
            "POST {} picks ({:?}) for league {} sport {} week {}",
            picks.len(),
            self.submit_style,
            scope.league,
            scope.sport,
            scope.week
        );
        self.send(self.submit_request(scope, picks)).await?;
        Ok(())
    }

    async fn login(&self, username: &str, password: &str) -> Result<(String, User), ApiError> {
        let request = self
            .http
            .post(self.url("/auth/login"))
            .json(&LoginRequest { username, password });
        let response = self.send(request).await?;
        let body: LoginResponse = Self::decode(response).await?;
        Ok((body.token, body.user.into_user()))
    }

    async fn profile(&self) -> Result<User, ApiError> {
        let body: ProfileBody = self.get_json("/users/me", &[]).await?;
        Ok(body.into_user())
    }

    fn set_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pickem_core::models::{GameId, TeamId};
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    fn http_response(status_line: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    /// Read one HTTP request (headers plus Content-Length body).
    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf);
            if let Some(end) = text.find("\r\n\r\n") {
                let content_length = text[..end]
                    .lines()
                    .find_map(|l| {
                        let (name, value) = l.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())?
                    })
                    .unwrap_or(0);
                if buf.len() >= end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Local server answering each request with the first route whose
    /// `"METHOD /path"` prefix matches the request line. Unmatched requests
    /// get a 404. Returns the address and the captured raw requests.
    async fn mock_server(routes: Vec<(&'static str, String)>) -> (SocketAddr, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&seen);

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let routes = routes.clone();
                let captured = Arc::clone(&captured);
                tokio::spawn(async move {
                    let request = read_request(&mut socket).await;
                    let response = routes
                        .iter()
                        .find(|(prefix, _)| request.starts_with(prefix))
                        .map(|(_, r)| r.clone())
                        .unwrap_or_else(|| http_response("404 Not Found", r#"{"detail":"Not Found"}"#));
                    captured.lock().unwrap().push(request);
                    socket.write_all(response.as_bytes()).await.unwrap();
                    socket.flush().await.unwrap();
                });
            }
        });

        (addr, seen)
    }

    fn client(addr: SocketAddr, style: SubmitStyle) -> ApiClient {
        ApiClient::new(&ApiConfig {
            base_url: format!("http://{addr}/api/"),
            submit_style: style,
            timeout_secs: 5,
        })
        .unwrap()
    }

    fn body_json(request: &str) -> serde_json::Value {
        let (_, body) = request.split_once("\r\n\r\n").unwrap();
        serde_json::from_str(body).unwrap()
    }

    fn scope() -> PickScope {
        PickScope { league: LeagueId(1), sport: SportId(2), week: WeekId(3) }
    }

    fn delta() -> Vec<PickDelta> {
        vec![PickDelta { game_id: GameId(10), team_id: TeamId::new("Chiefs"), tiebreaker: None }]
    }

    #[tokio::test]
    async fn leagues_sends_bearer_token() {
        let (addr, seen) = mock_server(vec![(
            "GET /api/leagues",
            http_response("200 OK", r#"{"leagues":[{"id":1,"name":"Office","sports":[{"id":2,"name":"NFL"}]}]}"#),
        )])
        .await;
        let api = client(addr, SubmitStyle::BatchedBody);
        api.set_token(Some("tok-123".into()));
        assert!(api.has_token());

        let leagues = api.leagues().await.unwrap();
        assert_eq!(leagues.len(), 1);
        assert_eq!(leagues[0].name, "Office");

        let requests = seen.lock().unwrap();
        assert!(requests[0].to_lowercase().contains("authorization: bearer tok-123"));
    }

    #[tokio::test]
    async fn no_token_means_no_authorization_header() {
        let (addr, seen) = mock_server(vec![("GET /api/leagues", http_response("200 OK", "[]"))]).await;
        let api = client(addr, SubmitStyle::BatchedBody);
        assert!(api.leagues().await.unwrap().is_empty());
        assert!(!seen.lock().unwrap()[0].to_lowercase().contains("authorization:"));
    }

    #[tokio::test]
    async fn unauthorized_maps_to_variant() {
        let (addr, _) = mock_server(vec![(
            "GET /api/leagues",
            http_response("401 Unauthorized", r#"{"detail":"Could not validate credentials"}"#),
        )])
        .await;
        let err = client(addr, SubmitStyle::BatchedBody).leagues().await.unwrap_err();
        assert!(err.is_unauthorized(), "got {err:?}");
        assert_eq!(err.detail(), Some("Could not validate credentials"));
    }

    #[tokio::test]
    async fn error_status_carries_server_detail() {
        let (addr, _) = mock_server(vec![(
            "POST /api/picks",
            http_response("400 Bad Request", r#"{"detail":"Cannot make picks for games that have already started"}"#),
        )])
        .await;
        let err = client(addr, SubmitStyle::BatchedBody)
            .submit_picks(scope(), &delta())
            .await
            .unwrap_err();
        match err {
            ApiError::Status { status, detail } => {
                assert_eq!(status, 400);
                assert_eq!(detail.as_deref(), Some("Cannot make picks for games that have already started"));
            }
            other => panic!("expected Status, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_body_is_decode_error() {
        let (addr, _) = mock_server(vec![("GET /api/leagues", http_response("200 OK", "{\"oops\":"))]).await;
        let err = client(addr, SubmitStyle::BatchedBody).leagues().await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn batched_submit_puts_scope_in_body() {
        let (addr, seen) = mock_server(vec![("POST /api/picks ", http_response("200 OK", r#"{"message":"ok"}"#))]).await;
        client(addr, SubmitStyle::BatchedBody)
            .submit_picks(scope(), &delta())
            .await
            .unwrap();

        let requests = seen.lock().unwrap();
        assert!(requests[0].starts_with("POST /api/picks HTTP/1.1"));
        assert_eq!(
            body_json(&requests[0]),
            serde_json::json!({"leagueId": 1, "sportId": 2, "week": 3,
                               "picks": [{"gameId": 10, "teamId": "Chiefs"}]})
        );
    }

    #[tokio::test]
    async fn path_scoped_submit_puts_scope_in_path() {
        let (addr, seen) = mock_server(vec![(
            "POST /api/leagues/1/sports/2/weeks/3/picks",
            http_response("201 Created", "{}"),
        )])
        .await;
        client(addr, SubmitStyle::PathScoped)
            .submit_picks(scope(), &delta())
            .await
            .unwrap();

        let requests = seen.lock().unwrap();
        assert_eq!(
            body_json(&requests[0]),
            serde_json::json!({"picks": [{"gameId": 10, "teamId": "Chiefs"}]})
        );
    }

    #[tokio::test]
    async fn query_scoped_submit_puts_scope_in_query() {
        let (addr, seen) = mock_server(vec![(
            "POST /api/picks?leagueId=1&sportId=2&week=3 ",
            http_response("200 OK", "{}"),
        )])
        .await;
        client(addr, SubmitStyle::QueryScoped)
            .submit_picks(scope(), &delta())
            .await
            .unwrap();

        let requests = seen.lock().unwrap();
        assert_eq!(
            body_json(&requests[0]),
            serde_json::json!({"picks": [{"gameId": 10, "teamId": "Chiefs"}]})
        );
    }

    #[tokio::test]
    async fn weeks_combines_list_and_current_marker() {
        let (addr, _) = mock_server(vec![
            ("GET /api/sports/2/weeks", http_response("200 OK", r#"{"weeks":[{"id":30,"number":1},{"id":31,"number":2}]}"#)),
            ("GET /api/sports/2/current-week", http_response("200 OK", r#"[{"id":31,"week":2}]"#)),
        ])
        .await;
        let listing = client(addr, SubmitStyle::BatchedBody).weeks(SportId(2)).await.unwrap();
        assert_eq!(listing.weeks.len(), 2);
        assert_eq!(listing.current.map(|w| w.id), Some(WeekId(31)));
    }

    #[tokio::test]
    async fn weeks_tolerates_missing_week_list() {
        let (addr, _) = mock_server(vec![(
            "GET /api/sports/2/current-week",
            http_response("200 OK", r#"[{"id":31,"week":2}]"#),
        )])
        .await;
        let listing = client(addr, SubmitStyle::BatchedBody).weeks(SportId(2)).await.unwrap();
        assert!(listing.weeks.is_empty());
        assert_eq!(listing.current.map(|w| w.number), Some(2));
    }

    #[tokio::test]
    async fn weeks_tolerates_missing_current_marker() {
        let (addr, _) = mock_server(vec![(
            "GET /api/sports/2/weeks",
            http_response(
                "200 OK",
                r#"[{"id":30,"number":1},{"id":31,"number":2,"is_current":true}]"#,
            ),
        )])
        .await;
        let listing = client(addr, SubmitStyle::BatchedBody).weeks(SportId(2)).await.unwrap();
        assert_eq!(listing.weeks.len(), 2);
        assert!(listing.current.is_none());
        assert!(listing.weeks[1].is_current);
    }

    #[tokio::test]
    async fn weeks_still_fails_when_current_marker_errors() {
        let (addr, _) = mock_server(vec![
            ("GET /api/sports/2/weeks", http_response("200 OK", r#"[{"id":30,"number":1}]"#)),
            (
                "GET /api/sports/2/current-week",
                http_response("500 Internal Server Error", r#"{"detail":"boom"}"#),
            ),
        ])
        .await;
        let err = client(addr, SubmitStyle::BatchedBody).weeks(SportId(2)).await.unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn games_and_picks_use_scope_query() {
        let (addr, seen) = mock_server(vec![
            (
                "GET /api/games?sportId=2&week=3",
                http_response("200 OK", r#"{"games":[{"id":10,"home_team":"Chiefs","away_team":"Bills","game_time":"2026-09-14T17:00:00","spread":-3.5}]}"#),
            ),
            (
                "GET /api/picks/user?leagueId=1&sportId=2&week=3",
                http_response("200 OK", r#"{"picks":[{"id":7,"game_id":10,"picked_team":"Chiefs"}]}"#),
            ),
        ])
        .await;
        let api = client(addr, SubmitStyle::BatchedBody);
        let games = api.games(SportId(2), WeekId(3)).await.unwrap();
        let picks = api.user_picks(scope()).await.unwrap();
        assert_eq!(games[0].betting_line(), "Chiefs -3.5");
        assert_eq!(picks[0].team_id, games[0].home.id);
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn login_posts_credentials() {
        let (addr, seen) = mock_server(vec![(
            "POST /api/auth/login",
            http_response("200 OK", r#"{"token":"jwt","user":{"id":4,"username":"alice"}}"#),
        )])
        .await;
        let (token, user) = client(addr, SubmitStyle::BatchedBody)
            .login("alice", "hunter2")
            .await
            .unwrap();
        assert_eq!(token, "jwt");
        assert_eq!(user.username, "alice");
        assert_eq!(
            body_json(&seen.lock().unwrap()[0]),
            serde_json::json!({"username": "alice", "password": "hunter2"})
        );
    }

    #[tokio::test]
    async fn login_rejection_keeps_detail() {
        let (addr, _) = mock_server(vec![(
            "POST /api/auth/login",
            http_response("401 Unauthorized", r#"{"detail":"Incorrect username or password"}"#),
        )])
        .await;
        let err = client(addr, SubmitStyle::BatchedBody)
            .login("alice", "nope")
            .await
            .unwrap_err();
        assert_eq!(err.detail(), Some("Incorrect username or password"));
    }
}
