// Login session: stored token, current user, and teardown on logout or 401.

use thiserror::Error;
use tracing::{info, warn};

use pickem_api::{ApiError, Backend};
use pickem_core::db::SessionDb;
use pickem_core::models::User;

#[derive(Debug, Error)]
pub enum SessionError {
    /// The server refused the credentials.
    #[error("{0}")]
    Rejected(String),

    #[error("session store error: {0:#}")]
    Store(anyhow::Error),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// The signed-in user and the token store backing them.
pub struct Session {
    store: SessionDb,
    user: Option<User>,
}

impl Session {
    pub fn new(store: SessionDb) -> Self {
        Session { store, user: None }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Resume a previous session from the stored token.
    ///
    /// Returns `Ok(None)` when there is no token or the server rejects it
    /// (the stale token is cleared). When the profile cannot be fetched for
    /// another reason, the cached user is used if there is one.
    pub async fn restore(&mut self, backend: &dyn Backend) -> Result<Option<User>, SessionError> {
        let Some(token) = self.store.load_token().map_err(SessionError::Store)? else {
            info!("No stored session");
            return Ok(None);
        };
        backend.set_token(Some(token));

        match backend.profile().await {
            Ok(user) => {
                self.store.save_user(&user).map_err(SessionError::Store)?;
                info!("Resumed session for {}", user.username);
                self.user = Some(user.clone());
                Ok(Some(user))
            }
            Err(e) if e.is_unauthorized() => {
                info!("Stored token was rejected, clearing it");
                self.teardown(backend)?;
                Ok(None)
            }
            Err(e) => match self.store.load_user().map_err(SessionError::Store)? {
                Some(user) => {
                    warn!("Profile fetch failed ({}), using cached user", e);
                    self.user = Some(user.clone());
                    Ok(Some(user))
                }
                None => {
                    backend.set_token(None);
                    Err(e.into())
                }
            },
        }
    }

    /// Exchange credentials for a token and persist it.
    pub async fn login(
        &mut self,
        backend: &dyn Backend,
        username: &str,
        password: &str,
    ) -> Result<User, SessionError> {
        match backend.login(username, password).await {
            Ok((token, user)) => {
                self.store.save_token(&token).map_err(SessionError::Store)?;
                self.store.save_user(&user).map_err(SessionError::Store)?;
                backend.set_token(Some(token));
                info!("Logged in as {}", user.username);
                self.user = Some(user.clone());
                Ok(user)
            }
            Err(e) if e.is_unauthorized() => Err(SessionError::Rejected(
                e.detail()
                    .unwrap_or("Incorrect username or password")
                    .to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Forget the token and the user. The in-memory state is cleared even if
    /// the store cannot be written.
    pub fn teardown(&mut self, backend: &dyn Backend) -> Result<(), SessionError> {
        backend.set_token(None);
        if let Some(user) = self.user.take() {
            info!("Session for {} ended", user.username);
        }
        self.store.clear_session().map_err(SessionError::Store)
    }
}
