//! Session guard: login, logout and session expiry
//!
//! Each login issues a [`SessionToken`]. The session lives in a blob store
//! under the token's own key and is re-read on every check, so an expired
//! session is cleared the first time anyone presents its token.

use std::sync::Arc;

use chrono::Duration;
use common::{
    blob_store::{BlobStore, read_json, write_json},
    clock::Clock,
    error::StorageError,
};
use tracing::{error, info, warn};

use crate::{
    config::AuthConfig,
    error::{AuthError, AuthResult},
    models::{ADMIN_ROLE, Session, SessionToken, StaticCredential},
    repositories::UserDirectory,
    validation::{validate_password, validate_username},
};

/// Where credentials are checked
#[derive(Clone)]
pub enum AuthMode {
    /// Compare against one statically configured credential
    Offline(StaticCredential),
    /// Look the user up in a remote directory
    Connected(Arc<dyn UserDirectory>),
}

/// Session guard for the dashboard
#[derive(Clone)]
pub struct SessionGuard {
    mode: AuthMode,
    blobs: Arc<dyn BlobStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl SessionGuard {
    /// Create a new session guard
    pub fn new(
        mode: AuthMode,
        blobs: Arc<dyn BlobStore>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
    ) -> Self {
        Self {
            mode,
            blobs,
            clock,
            ttl,
        }
    }

    /// Offline guard using the configured demo credential and TTL
    pub fn offline(config: &AuthConfig, blobs: Arc<dyn BlobStore>, clock: Arc<dyn Clock>) -> Self {
        Self::new(
            AuthMode::Offline(config.demo_credential.clone()),
            blobs,
            clock,
            config.session_ttl,
        )
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.mode, AuthMode::Connected(_))
    }

    /// Maximum session age
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Check the credentials and start a new session under a fresh token
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> AuthResult<(SessionToken, Session)> {
        validate_username(username).map_err(AuthError::InvalidInput)?;
        validate_password(password).map_err(AuthError::InvalidInput)?;

        let role = match &self.mode {
            AuthMode::Offline(credential) => {
                if !credential.matches(username, password) {
                    warn!("Rejected offline login for {}", username);
                    return Err(AuthError::AuthFailure(
                        "Invalid username or password".to_string(),
                    ));
                }
                ADMIN_ROLE.to_string()
            }
            AuthMode::Connected(directory) => {
                match directory.find_by_credentials(username, password).await {
                    Ok(Some(user)) => user.role,
                    Ok(None) => {
                        warn!("Rejected login for {}: no matching user", username);
                        return Err(AuthError::AuthFailure(
                            "Invalid username or password".to_string(),
                        ));
                    }
                    Err(e) => {
                        error!("User directory lookup failed: {:#}", e);
                        return Err(AuthError::AuthFailure(
                            "Could not reach the user directory".to_string(),
                        ));
                    }
                }
            }
        };

        let token = SessionToken::generate();
        let session = Session {
            username: username.to_string(),
            role,
            logged_in_at: self.clock.now(),
        };
        write_json(self.blobs.as_ref(), &token.storage_key(), &session).await?;

        info!("Session started for {} ({})", session.username, session.role);
        Ok((token, session))
    }

    /// Whether `token` names a live session; an expired one is cleared
    pub async fn is_authenticated(&self, token: &SessionToken) -> AuthResult<bool> {
        Ok(self.live_session(token).await?.is_some())
    }

    /// The live session behind `token`, if any
    pub async fn current_user(&self, token: &SessionToken) -> AuthResult<Option<Session>> {
        self.live_session(token).await
    }

    /// End the session behind `token`; other sessions are untouched
    pub async fn logout(&self, token: &SessionToken) -> AuthResult<()> {
        self.blobs.remove(&token.storage_key()).await?;
        info!("Session cleared");
        Ok(())
    }

    async fn live_session(&self, token: &SessionToken) -> AuthResult<Option<Session>> {
        let key = token.storage_key();
        let session = match read_json::<Session>(self.blobs.as_ref(), &key).await {
            Ok(session) => session,
            Err(StorageError::Corrupt { reason, .. }) => {
                warn!("Discarding unreadable session: {}", reason);
                self.logout(token).await?;
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        match session {
            Some(session) if session.is_expired(self.clock.now(), self.ttl) => {
                info!(
                    "Session for {} expired at {}",
                    session.username,
                    session.expires_at(self.ttl)
                );
                self.logout(token).await?;
                Ok(None)
            }
            other => Ok(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RemoteUser;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use common::{blob_store::MemoryBlobStore, clock::ManualClock};

    struct FakeDirectory {
        users: Vec<(String, String, RemoteUser)>,
        fail: bool,
    }

    #[async_trait]
    impl UserDirectory for FakeDirectory {
        async fn find_by_credentials(
            &self,
            username: &str,
            password: &str,
        ) -> anyhow::Result<Option<RemoteUser>> {
            if self.fail {
                anyhow::bail!("connection reset");
            }
            Ok(self
                .users
                .iter()
                .find(|(u, p, _)| u == username && p == password)
                .map(|(_, _, user)| user.clone()))
        }
    }

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 10, 1, 9, 0, 0).unwrap(),
        ))
    }

    fn offline_guard(clock: Arc<ManualClock>) -> (SessionGuard, Arc<MemoryBlobStore>) {
        let blobs = Arc::new(MemoryBlobStore::new());
        let guard = SessionGuard::offline(&AuthConfig::default(), blobs.clone(), clock);
        (guard, blobs)
    }

    fn connected_guard(fail: bool) -> SessionGuard {
        let directory = FakeDirectory {
            users: vec![(
                "nurse".to_string(),
                "ward7".to_string(),
                RemoteUser {
                    id: "42".to_string(),
                    username: "nurse".to_string(),
                    role: "viewer".to_string(),
                },
            )],
            fail,
        };
        SessionGuard::new(
            AuthMode::Connected(Arc::new(directory)),
            Arc::new(MemoryBlobStore::new()),
            clock(),
            Duration::hours(24),
        )
    }

    #[tokio::test]
    async fn test_offline_login_creates_admin_session() -> AuthResult<()> {
        let clock = clock();
        let (guard, _) = offline_guard(clock.clone());

        let (token, session) = guard.login("admin", "admin123").await?;
        assert_eq!(session.role, ADMIN_ROLE);
        assert_eq!(session.logged_in_at, clock.now());
        assert!(guard.is_authenticated(&token).await?);
        assert_eq!(guard.current_user(&token).await?, Some(session));
        assert!(!guard.is_connected());
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_token_is_not_authenticated() -> AuthResult<()> {
        let (guard, _) = offline_guard(clock());
        guard.login("admin", "admin123").await?;

        let stranger = SessionToken::generate();
        assert!(!guard.is_authenticated(&stranger).await?);
        assert_eq!(guard.current_user(&stranger).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_session_expires_after_a_day() -> AuthResult<()> {
        let clock = clock();
        let (guard, blobs) = offline_guard(clock.clone());
        let (token, _) = guard.login("admin", "admin123").await?;

        clock.advance(Duration::hours(23));
        assert!(guard.is_authenticated(&token).await?);

        clock.advance(Duration::hours(2));
        assert!(!guard.is_authenticated(&token).await?);
        assert_eq!(blobs.get(&token.storage_key()).await?, None);
        assert_eq!(guard.current_user(&token).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_each_session_expires_on_its_own_clock() -> AuthResult<()> {
        let clock = clock();
        let (guard, _) = offline_guard(clock.clone());
        let (early, _) = guard.login("admin", "admin123").await?;

        clock.advance(Duration::hours(12));
        let (late, _) = guard.login("admin", "admin123").await?;

        clock.advance(Duration::hours(13));
        assert!(!guard.is_authenticated(&early).await?);
        assert!(guard.is_authenticated(&late).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_offline_login_rejects_wrong_password() {
        let (guard, _) = offline_guard(clock());

        let err = guard.login("admin", "letmein").await.unwrap_err();
        assert!(matches!(err, AuthError::AuthFailure(_)));
    }

    #[tokio::test]
    async fn test_blank_input_is_rejected_before_lookup() {
        let guard = connected_guard(true);

        assert!(matches!(
            guard.login("", "ward7").await,
            Err(AuthError::InvalidInput(_))
        ));
        assert!(matches!(
            guard.login("nurse", "  ").await,
            Err(AuthError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_connected_login_adopts_remote_role() -> AuthResult<()> {
        let guard = connected_guard(false);

        let (_, session) = guard.login("nurse", "ward7").await?;
        assert_eq!(session.role, "viewer");
        assert!(guard.is_connected());

        assert!(matches!(
            guard.login("nurse", "ward8").await,
            Err(AuthError::AuthFailure(_))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_directory_errors_become_auth_failures() {
        let guard = connected_guard(true);
        assert!(matches!(
            guard.login("nurse", "ward7").await,
            Err(AuthError::AuthFailure(_))
        ));
    }

    #[tokio::test]
    async fn test_logout_only_clears_its_own_session() -> AuthResult<()> {
        let (guard, _) = offline_guard(clock());
        let (first, _) = guard.login("admin", "admin123").await?;
        let (second, _) = guard.login("admin", "admin123").await?;

        guard.logout(&first).await?;
        assert!(!guard.is_authenticated(&first).await?);
        assert!(guard.is_authenticated(&second).await?);
        guard.logout(&first).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_unreadable_session_counts_as_logged_out() -> AuthResult<()> {
        let (guard, blobs) = offline_guard(clock());
        let token = SessionToken::generate();
        blobs.set(&token.storage_key(), "garbage").await?;

        assert!(!guard.is_authenticated(&token).await?);
        assert_eq!(blobs.get(&token.storage_key()).await?, None);
        Ok(())
    }
}
