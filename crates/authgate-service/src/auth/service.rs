//! Registration and login use cases.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, info};

use authgate_auth::jwt::{IssuedToken, TokenIssuer};
use authgate_auth::password::PasswordHasher;
use authgate_core::error::AppError;
use authgate_core::result::AppResult;
use authgate_database::{ConnectionManager, UserStore};
use authgate_entity::user::UserLookup;

/// Returned when registering a username that is already taken.
pub const USER_EXISTS: &str = "User already exists.";

/// Returned when the store accepted the write but handed back no row.
pub const REGISTRATION_FAILED: &str = "Failed to register user.";

/// Returned for an unknown username and for a wrong password alike.
pub const INVALID_CREDENTIALS: &str = "Invalid username or password.";

/// Plaintext behind the hash verified for unknown usernames.
const DUMMY_PASSWORD: &str = "authgate-unknown-user";

/// Registers users and exchanges credentials for session tokens.
///
/// Each call runs inside one transaction of the current request scope.
#[derive(Clone)]
pub struct AuthService {
    db: Arc<ConnectionManager>,
    store: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    issuer: Arc<TokenIssuer>,
    /// Verified against on the unknown-user path so both login failures
    /// cost one Argon2 run.
    dummy_hash: Arc<OnceCell<String>>,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("issuer", &self.issuer)
            .finish()
    }
}

impl AuthService {
    /// Creates a new auth service.
    pub fn new(
        db: Arc<ConnectionManager>,
        store: Arc<dyn UserStore>,
        hasher: PasswordHasher,
        issuer: Arc<TokenIssuer>,
    ) -> Self {
        Self {
            db,
            store,
            hasher,
            issuer,
            dummy_hash: Arc::new(OnceCell::new()),
        }
    }

    /// Creates an account for `username`.
    ///
    /// Fails with a conflict when the username is taken. Input policy is
    /// checked by the caller.
    pub async fn register(&self, username: &str, password: &str) -> AppResult<()> {
        self.db
            .transaction(|| self.register_unit(username, password))
            .await
    }

    /// Verifies credentials and issues a session token for the user.
    pub async fn login(&self, username: &str, password: &str) -> AppResult<IssuedToken> {
        self.db
            .transaction(|| self.login_unit(username, password))
            .await
    }

    async fn register_unit(&self, username: &str, password: &str) -> AppResult<()> {
        let lookup = UserLookup::by_username(username);
        if self.store.get(&lookup).await?.is_some() {
            debug!(username, "Registration rejected: username taken");
            return Err(AppError::conflict(USER_EXISTS));
        }

        let hash = self.hash(password).await?;

        let user = self
            .store
            .upsert(username, &hash)
            .await?
            .ok_or_else(|| AppError::internal(REGISTRATION_FAILED))?;

        info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(())
    }

    async fn login_unit(&self, username: &str, password: &str) -> AppResult<IssuedToken> {
        let lookup = UserLookup::by_username(username);
        let Some(user) = self.store.get(&lookup).await? else {
            let dummy = self
                .dummy_hash
                .get_or_try_init(|| self.hash(DUMMY_PASSWORD))
                .await?;
            self.verify(password, dummy).await?;
            debug!(username, "Login rejected: unknown user");
            return Err(AppError::unauthorized(INVALID_CREDENTIALS));
        };

        if !self.verify(password, &user.password_hash).await? {
            debug!(user_id = %user.id, "Login rejected: wrong password");
            return Err(AppError::unauthorized(INVALID_CREDENTIALS));
        }

        let issued = self.issuer.issue(&user.id.to_string())?;
        info!(user_id = %user.id, expires_at = %issued.expires_at, "User logged in");
        Ok(issued)
    }

    async fn hash(&self, password: &str) -> AppResult<String> {
        let hasher = self.hasher.clone();
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || hasher.hash_password(&password))
            .await
            .map_err(|e| AppError::internal(format!("Password hashing task failed: {e}")))?
    }

    async fn verify(&self, password: &str, hash: &str) -> AppResult<bool> {
        let hasher = self.hasher.clone();
        let password = password.to_owned();
        let hash = hash.to_owned();
        tokio::task::spawn_blocking(move || hasher.verify_password(&password, &hash))
            .await
            .map_err(|e| AppError::internal(format!("Password verification task failed: {e}")))
    }
}
