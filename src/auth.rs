//! Session credentials shared by every component.
//!
//! The casino API is authenticated with three values captured by an external
//! browser login flow:
//!
//! 1. The browser's user agent string
//! 2. The full cookie header of the logged-in session (including `cf_clearance`)
//! 3. The account API key, sent as `x-access-token` and in the WebSocket handshake
//!
//! The login flow writes them into a [`CredentialStore`]; the gateway and the
//! realtime client read a fresh [`Credentials`] snapshot on every operation, so
//! a re-login is picked up by the next request or reconnect.

use std::fmt;
use std::sync::Arc;

use async_lock::RwLock;

/// Environment variable holding the browser user agent.
pub const ENV_USER_AGENT: &str = "CASINO_USER_AGENT";
/// Environment variable holding the session cookie header.
pub const ENV_COOKIES: &str = "CASINO_COOKIES";
/// Environment variable holding the account API key.
pub const ENV_API_KEY: &str = "CASINO_API_KEY";

/// User agent, cookie header and API key of the current session.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub user_agent: String,
    pub cookie_header: String,
    pub api_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user_agent", &self.user_agent)
            .field("cookie_header", &redact(&self.cookie_header))
            .field("api_key", &redact(&self.api_key))
            .finish()
    }
}

fn redact(value: &str) -> &'static str {
    if value.is_empty() {
        "<empty>"
    } else {
        "<redacted>"
    }
}

impl Credentials {
    pub fn new(
        user_agent: impl Into<String>,
        cookie_header: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            user_agent: user_agent.into(),
            cookie_header: cookie_header.into(),
            api_key: api_key.into(),
        }
    }

    /// Load credentials from `CASINO_USER_AGENT`, `CASINO_COOKIES` and `CASINO_API_KEY`.
    ///
    /// Returns `None` unless all three are set and non-empty.
    pub fn from_env() -> Option<Self> {
        let user_agent = std::env::var(ENV_USER_AGENT).ok()?;
        let cookie_header = std::env::var(ENV_COOKIES).ok()?;
        let api_key = std::env::var(ENV_API_KEY).ok()?;
        let credentials = Self::new(user_agent, cookie_header, api_key);
        credentials.is_complete().then_some(credentials)
    }

    /// True when user agent, cookie header and API key are all present.
    pub fn is_complete(&self) -> bool {
        self.has_browser_session() && !self.api_key.trim().is_empty()
    }

    /// True when the browser half (user agent + cookies) is present.
    pub fn has_browser_session(&self) -> bool {
        !self.user_agent.trim().is_empty() && !self.cookie_header.trim().is_empty()
    }
}

/// Process-wide handle to the current [`Credentials`].
///
/// Cloning the store shares the same underlying credentials.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    inner: Arc<RwLock<Credentials>>,
}

impl CredentialStore {
    /// Create an empty store; readers see incomplete credentials until login completes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-filled with credentials.
    pub fn with_credentials(credentials: Credentials) -> Self {
        Self {
            inner: Arc::new(RwLock::new(credentials)),
        }
    }

    /// Copy of the current credentials.
    pub async fn snapshot(&self) -> Credentials {
        self.inner.read().await.clone()
    }

    /// Replace all credentials (after a browser login).
    pub async fn set(&self, credentials: Credentials) {
        *self.inner.write().await = credentials;
    }

    /// Update the browser session half, keeping the API key.
    pub async fn set_browser_session(
        &self,
        user_agent: impl Into<String>,
        cookie_header: impl Into<String>,
    ) {
        let mut guard = self.inner.write().await;
        guard.user_agent = user_agent.into();
        guard.cookie_header = cookie_header.into();
    }

    /// Update the API key, keeping the browser session.
    pub async fn set_api_key(&self, api_key: impl Into<String>) {
        self.inner.write().await.api_key = api_key.into();
    }

    /// Drop every credential (logout).
    pub async fn clear(&self) {
        *self.inner.write().await = Credentials::default();
    }

    pub async fn is_complete(&self) -> bool {
        self.inner.read().await.is_complete()
    }
}
