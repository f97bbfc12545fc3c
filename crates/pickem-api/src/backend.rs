// The backend operations the pick workflow needs.

use async_trait::async_trait;

use pickem_core::models::{
    Game, League, LeagueDetail, LeagueId, Pick, PickScope, SportId, User, WeekId, WeekListing,
};
use pickem_core::picks::PickDelta;

use crate::error::ApiError;

/// Everything the driver asks of the server. `ApiClient` is the HTTP
/// implementation; tests substitute scripted ones.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Leagues the signed-in user belongs to.
    async fn leagues(&self) -> Result<Vec<League>, ApiError>;

    /// One league with its active sports.
    async fn league(&self, id: LeagueId) -> Result<LeagueDetail, ApiError>;

    /// A sport's week list together with its current-week marker.
    async fn weeks(&self, sport: SportId) -> Result<WeekListing, ApiError>;

    async fn games(&self, sport: SportId, week: WeekId) -> Result<Vec<Game>, ApiError>;

    /// The signed-in user's saved picks for one scope.
    async fn user_picks(&self, scope: PickScope) -> Result<Vec<Pick>, ApiError>;

    /// Submit a batch of changed picks. One request, no retry.
    async fn submit_picks(&self, scope: PickScope, picks: &[PickDelta]) -> Result<(), ApiError>;

    /// Exchange credentials for a bearer token.
    async fn login(&self, username: &str, password: &str) -> Result<(String, User), ApiError>;

    async fn profile(&self) -> Result<User, ApiError>;

    /// Install or clear the bearer token sent with every request.
    fn set_token(&self, token: Option<String>);
}
