use async_trait::async_trait;
use log::{info, warn};
use reqwest::RequestBuilder;

use crate::error::{Error, Result};

/// Authentication state for the persona API. Tokens live on the session
/// object and nowhere else; dropping the session forgets them.
#[derive(Debug, Clone, Default)]
pub struct Session {
    access_token: Option<String>,
    csrf_token: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn authenticated(access_token: impl Into<String>) -> Self {
        Self {
            access_token: Some(access_token.into()),
            csrf_token: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    pub fn set_access_token(&mut self, token: impl Into<String>) {
        self.access_token = Some(token.into());
    }

    pub fn clear_access_token(&mut self) {
        self.access_token = None;
    }

    pub fn set_csrf_token(&mut self, token: impl Into<String>) {
        self.csrf_token = Some(token.into());
    }

    /// Attach the session's credentials to an outgoing request.
    pub fn apply(&self, mut request: RequestBuilder) -> RequestBuilder {
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }
        if let Some(token) = &self.csrf_token {
            request = request.header("X-CSRFToken", token);
        }
        request
    }
}

/// Exchanges an expired access token for a fresh one.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh_access_token(&self) -> Result<String>;
}

/// Refresh the session in place. On failure the stale token is dropped
/// so later requests fail as unauthenticated instead of retrying a
/// token the server already rejected.
pub async fn refresh_session<R: TokenRefresher + ?Sized>(
    refresher: &R,
    session: &mut Session,
) -> Result<()> {
    match refresher.refresh_access_token().await {
        Ok(token) => {
            info!("Session access token refreshed");
            session.set_access_token(token);
            Ok(())
        }
        Err(e) => {
            warn!("Session refresh failed: {}", e);
            session.clear_access_token();
            Err(Error::SessionExpired(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_installs_the_new_token() {
        let mut refresher = MockTokenRefresher::new();
        refresher
            .expect_refresh_access_token()
            .times(1)
            .returning(|| Ok("fresh".to_string()));

        let mut session = Session::authenticated("stale");
        tokio_test::block_on(refresh_session(&refresher, &mut session)).unwrap();
        assert!(session.is_authenticated());
        assert_eq!(session.access_token.as_deref(), Some("fresh"));
    }

    #[tokio::test]
    async fn failed_refresh_clears_the_session() {
        let mut refresher = MockTokenRefresher::new();
        refresher
            .expect_refresh_access_token()
            .times(1)
            .returning(|| Err(Error::ApiAuthFailed("refresh rejected".to_string())));

        let mut session = Session::authenticated("stale");
        let result = refresh_session(&refresher, &mut session).await;
        assert!(matches!(result, Err(Error::SessionExpired(_))));
        assert!(!session.is_authenticated());
    }
}
