//! Client-side session checks.
//!
//! Every check re-reads the token from storage and re-decodes it. Expiry is
//! asserted by the client clock only and nothing here talks to a server.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use http::header::{AUTHORIZATION, HeaderMap, HeaderValue};

use crate::storage::TokenStore;
use crate::token::{Claims, UserInfo, decode_claims};

/// Storage key holding the bearer token.
pub const TOKEN_KEY: &str = "marketplace_token";

/// Route of the marketplace login page.
pub const LOGIN_PATH: &str = "/login";

/// Full-page navigation, owned by the host.
pub trait Navigator: Send + Sync {
    /// Path (and query) of the page currently shown.
    fn current_path(&self) -> String;

    /// Leave the current page for `url`.
    fn navigate(&self, url: &str);
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct FixedClock(AtomicI64);

impl FixedClock {
    #[must_use]
    pub const fn new(now_millis: i64) -> Self {
        Self(AtomicI64::new(now_millis))
    }

    pub fn set(&self, now_millis: i64) {
        self.0.store(now_millis, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Navigator that records where it was sent instead of leaving the page.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    current: Mutex<String>,
    visits: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    /// Start on `current_path`.
    #[must_use]
    pub fn new(current_path: impl Into<String>) -> Self {
        Self {
            current: Mutex::new(current_path.into()),
            visits: Mutex::default(),
        }
    }

    /// Every URL navigated to, oldest first.
    #[must_use]
    pub fn visits(&self) -> Vec<String> {
        self.visits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The most recent navigation, if any.
    #[must_use]
    pub fn last(&self) -> Option<String> {
        self.visits().pop()
    }
}

impl Navigator for RecordingNavigator {
    fn current_path(&self) -> String {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn navigate(&self, url: &str) {
        tracing::debug!(url, "navigate");
        self.visits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.to_owned());
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = url.to_owned();
    }
}

/// Why [`Auth::init_auth`] refused the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthFailure {
    /// No token, or the token is malformed or expired.
    Unauthenticated,
    /// Signed in, but without the required role.
    MissingRole { required: String },
}

/// Result of [`Auth::init_auth`].
///
/// `Redirected` means navigation to the login page has been requested and the
/// caller must not continue initializing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Authenticated(UserInfo),
    Redirected(AuthFailure),
    /// Not signed in (or lacking the role) and auth was optional.
    Anonymous,
}

impl AuthOutcome {
    /// The signed-in user, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&UserInfo> {
        match self {
            Self::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    /// Whether the caller must stop because the page is being left.
    #[must_use]
    pub const fn must_stop(&self) -> bool {
        matches!(self, Self::Redirected(_))
    }
}

type SuccessHook = Box<dyn FnOnce(&UserInfo) + Send>;
type FailureHook = Box<dyn FnOnce(&AuthFailure) + Send>;

/// Options for [`Auth::init_auth`].
pub struct InitAuthOptions {
    pub require_auth: bool,
    pub required_role: Option<String>,
    pub on_success: Option<SuccessHook>,
    pub on_failure: Option<FailureHook>,
}

impl Default for InitAuthOptions {
    fn default() -> Self {
        Self {
            require_auth: true,
            required_role: None,
            on_success: None,
            on_failure: None,
        }
    }
}

impl InitAuthOptions {
    /// Do not redirect anonymous visitors.
    #[must_use]
    pub const fn optional(mut self) -> Self {
        self.require_auth = false;
        self
    }

    #[must_use]
    pub fn required_role(mut self, role: impl Into<String>) -> Self {
        self.required_role = Some(role.into());
        self
    }

    #[must_use]
    pub fn on_success(mut self, hook: impl FnOnce(&UserInfo) + Send + 'static) -> Self {
        self.on_success = Some(Box::new(hook));
        self
    }

    #[must_use]
    pub fn on_failure(mut self, hook: impl FnOnce(&AuthFailure) + Send + 'static) -> Self {
        self.on_failure = Some(Box::new(hook));
        self
    }
}

impl std::fmt::Debug for InitAuthOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitAuthOptions")
            .field("require_auth", &self.require_auth)
            .field("required_role", &self.required_role)
            .field("on_success", &self.on_success.is_some())
            .field("on_failure", &self.on_failure.is_some())
            .finish()
    }
}

/// Session checks over a token store.
///
/// Cheaply cloneable; clones share the store, navigator and clock.
#[derive(Clone)]
pub struct Auth {
    store: Arc<dyn TokenStore>,
    navigator: Arc<dyn Navigator>,
    clock: Arc<dyn Clock>,
}

impl Auth {
    /// Create session checks using the system clock.
    pub fn new(store: Arc<dyn TokenStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self::with_clock(store, navigator, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<dyn TokenStore>,
        navigator: Arc<dyn Navigator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            navigator,
            clock,
        }
    }

    /// The raw stored token, if any.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.store.get(TOKEN_KEY).filter(|t| !t.trim().is_empty())
    }

    /// Claims of a present, well-formed, unexpired token.
    ///
    /// An expired token is deleted from storage as a side effect.
    fn valid_claims(&self) -> Option<Claims> {
        let token = self.token()?;
        let claims = match decode_claims(&token) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::debug!(error = %e, "Stored token is malformed");
                return None;
            }
        };
        if claims.exp_millis.is_none() {
            tracing::debug!("Stored token has no expiry");
            return None;
        }
        if claims.is_expired_at(self.clock.now_millis()) {
            tracing::info!("Session token expired; removing it");
            self.store.remove(TOKEN_KEY);
            return None;
        }
        Some(claims)
    }

    /// Whether a present, well-formed, unexpired token is stored.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.valid_claims().is_some()
    }

    /// User fields decoded from the stored token.
    ///
    /// Does not check expiry. Pair with [`Self::is_authenticated`].
    #[must_use]
    pub fn user_info(&self) -> Option<UserInfo> {
        let token = self.token()?;
        decode_claims(&token).ok().map(|claims| claims.user_info())
    }

    /// Whether the signed-in user has exactly `role`.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.valid_claims()
            .is_some_and(|claims| claims.role.as_deref() == Some(role))
    }

    /// Login URL that returns to `path`, or to the current page.
    #[must_use]
    pub fn login_url(&self, path: Option<&str>) -> String {
        let target = path.map_or_else(|| self.navigator.current_path(), str::to_owned);
        format!("{LOGIN_PATH}?redirect={}", urlencoding::encode(&target))
    }

    /// Send the browser to the login page.
    pub fn redirect_to_login(&self, path: Option<&str>) {
        let url = self.login_url(path);
        self.navigator.navigate(&url);
    }

    /// Forget the token and go to the login page.
    pub fn logout(&self) {
        self.store.remove(TOKEN_KEY);
        tracing::info!("Logged out");
        self.navigator.navigate(LOGIN_PATH);
    }

    /// Copy of `headers` with `Authorization: Bearer <token>` added when a
    /// token is stored.
    #[must_use]
    pub fn add_auth_header(&self, headers: &HeaderMap) -> HeaderMap {
        let mut headers = headers.clone();
        if let Some(token) = self.token() {
            match HeaderValue::from_str(&format!("Bearer {token}")) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    headers.insert(AUTHORIZATION, value);
                }
                Err(_) => tracing::debug!("Stored token is not a valid header value"),
            }
        }
        headers
    }

    /// Decide whether the page may proceed.
    ///
    /// With `require_auth`, failures call `on_failure`, redirect to the login
    /// page and return [`AuthOutcome::Redirected`]. Without it, failures are
    /// silent and return [`AuthOutcome::Anonymous`].
    pub fn init_auth(&self, options: InitAuthOptions) -> AuthOutcome {
        let InitAuthOptions {
            require_auth,
            required_role,
            on_success,
            on_failure,
        } = options;

        let failure = match self.valid_claims() {
            None => AuthFailure::Unauthenticated,
            Some(claims) => match required_role {
                Some(required) if claims.role.as_deref() != Some(required.as_str()) => {
                    AuthFailure::MissingRole { required }
                }
                _ => {
                    let user = claims.user_info();
                    if let Some(hook) = on_success {
                        hook(&user);
                    }
                    return AuthOutcome::Authenticated(user);
                }
            },
        };

        if !require_auth {
            return AuthOutcome::Anonymous;
        }

        tracing::info!(?failure, "Authentication required");
        if let Some(hook) = on_failure {
            hook(&failure);
        }
        self.redirect_to_login(None);
        AuthOutcome::Redirected(failure)
    }
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Auth").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use std::sync::atomic::AtomicUsize;

    use serde_json::json;

    use super::*;
    use crate::storage::MemoryStore;
    use crate::token::test_support::make_token;

    /// 2023-11-14T22:13:20Z
    pub const NOW_MS: i64 = 1_700_000_000_000;

    pub struct Fixture {
        pub store: MemoryStore,
        pub navigator: Arc<RecordingNavigator>,
        pub clock: Arc<FixedClock>,
        pub auth: Auth,
    }

    pub fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let navigator = Arc::new(RecordingNavigator::new("/apps/notepad?tab=1"));
        let clock = Arc::new(FixedClock::new(NOW_MS));
        let auth = Auth::with_clock(
            Arc::new(store.clone()),
            navigator.clone(),
            clock.clone(),
        );
        Fixture {
            store,
            navigator,
            clock,
            auth,
        }
    }

    pub fn valid_token(role: &str) -> String {
        make_token(&json!({
            "id": "u1",
            "name": "Ada",
            "email": "ada@example.com",
            "role": role,
            "exp": NOW_MS / 1000 + 3600
        }))
    }

    #[test]
    fn test_absent_token_is_unauthenticated() {
        let f = fixture();
        assert!(!f.auth.is_authenticated());
        assert_eq!(f.auth.user_info(), None);
        assert!(!f.auth.has_role("user"));
    }

    #[test]
    fn test_valid_token() {
        let f = fixture();
        f.store.set(TOKEN_KEY, &valid_token("admin"));
        assert!(f.auth.is_authenticated());
        assert!(f.auth.has_role("admin"));
        assert!(!f.auth.has_role("user"));
        assert_eq!(f.auth.user_info().unwrap().name.as_deref(), Some("Ada"));
    }

    #[test]
    fn test_expired_token_is_removed() {
        let f = fixture();
        let token = make_token(&json!({ "name": "Ada", "exp": NOW_MS / 1000 - 1 }));
        f.store.set(TOKEN_KEY, &token);

        assert!(!f.auth.is_authenticated());
        assert_eq!(f.store.get(TOKEN_KEY), None);
    }

    #[test]
    fn test_user_info_ignores_expiry() {
        let f = fixture();
        let token = make_token(&json!({ "name": "Ada", "exp": NOW_MS / 1000 - 1 }));
        f.store.set(TOKEN_KEY, &token);
        assert_eq!(f.auth.user_info().unwrap().name.as_deref(), Some("Ada"));
    }

    #[test]
    fn test_token_expires_as_clock_advances() {
        let f = fixture();
        f.store.set(TOKEN_KEY, &valid_token("user"));
        assert!(f.auth.is_authenticated());
        f.clock.set(NOW_MS + 3_600_001);
        assert!(!f.auth.is_authenticated());
        assert!(f.store.is_empty());
    }

    #[test]
    fn test_malformed_token_fails_closed_and_is_kept() {
        let f = fixture();
        f.store.set(TOKEN_KEY, "garbage");
        assert!(!f.auth.is_authenticated());
        assert_eq!(f.store.get(TOKEN_KEY).as_deref(), Some("garbage"));

        f.store.set(TOKEN_KEY, &make_token(&json!({ "name": "NoExp" })));
        assert!(!f.auth.is_authenticated());
    }

    #[test]
    fn test_login_url_encodes_path() {
        let f = fixture();
        assert_eq!(
            f.auth.login_url(None),
            "/login?redirect=%2Fapps%2Fnotepad%3Ftab%3D1"
        );
        f.auth.redirect_to_login(Some("/x y"));
        assert_eq!(f.navigator.last().as_deref(), Some("/login?redirect=%2Fx%20y"));
    }

    #[test]
    fn test_logout() {
        let f = fixture();
        f.store.set(TOKEN_KEY, &valid_token("user"));
        f.auth.logout();
        assert!(f.store.is_empty());
        assert_eq!(f.navigator.last().as_deref(), Some(LOGIN_PATH));
    }

    #[test]
    fn test_add_auth_header_passthrough() {
        let f = fixture();
        let mut headers = HeaderMap::new();
        headers.insert("x-foo", HeaderValue::from_static("bar"));

        let out = f.auth.add_auth_header(&headers);
        assert_eq!(out, headers);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_add_auth_header_with_token() {
        let f = fixture();
        let token = valid_token("user");
        f.store.set(TOKEN_KEY, &token);
        let mut headers = HeaderMap::new();
        headers.insert("x-foo", HeaderValue::from_static("bar"));

        let out = f.auth.add_auth_header(&headers);
        assert_eq!(out.len(), 2);
        assert_eq!(out["x-foo"], "bar");
        assert_eq!(out[AUTHORIZATION], format!("Bearer {token}").as_str());
        assert_eq!(headers.len(), 1, "input must not be modified");
    }

    #[test]
    fn test_init_auth_success_calls_hook() {
        let f = fixture();
        f.store.set(TOKEN_KEY, &valid_token("admin"));
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();

        let outcome = f.auth.init_auth(
            InitAuthOptions::default()
                .required_role("admin")
                .on_success(move |user| {
                    assert_eq!(user.role.as_deref(), Some("admin"));
                    seen.fetch_add(1, Ordering::SeqCst);
                })
                .on_failure(|_| panic!("must not fail")),
        );

        assert_eq!(outcome.user().unwrap().id.as_deref(), Some("u1"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(f.navigator.visits().is_empty());
    }

    #[test]
    fn test_init_auth_required_redirects() {
        let f = fixture();
        let failures = Arc::new(Mutex::new(Vec::new()));
        let sink = failures.clone();

        let outcome = f.auth.init_auth(
            InitAuthOptions::default().on_failure(move |failure| {
                sink.lock().unwrap().push(failure.clone());
            }),
        );

        assert_eq!(outcome, AuthOutcome::Redirected(AuthFailure::Unauthenticated));
        assert!(outcome.must_stop());
        assert_eq!(
            *failures.lock().unwrap(),
            vec![AuthFailure::Unauthenticated]
        );
        assert_eq!(
            f.navigator.last().as_deref(),
            Some("/login?redirect=%2Fapps%2Fnotepad%3Ftab%3D1")
        );
    }

    #[test]
    fn test_init_auth_role_mismatch_redirects() {
        let f = fixture();
        f.store.set(TOKEN_KEY, &valid_token("user"));

        let outcome = f
            .auth
            .init_auth(InitAuthOptions::default().required_role("admin"));

        assert_eq!(
            outcome,
            AuthOutcome::Redirected(AuthFailure::MissingRole {
                required: "admin".to_owned()
            })
        );
        assert_eq!(f.navigator.visits().len(), 1);
    }

    #[test]
    fn test_init_auth_optional_is_silent() {
        let f = fixture();
        let outcome = f.auth.init_auth(
            InitAuthOptions::default()
                .optional()
                .on_failure(|_| panic!("optional auth must not report failure")),
        );
        assert_eq!(outcome, AuthOutcome::Anonymous);
        assert!(!outcome.must_stop());
        assert!(f.navigator.visits().is_empty());

        f.store.set(TOKEN_KEY, &valid_token("user"));
        let outcome = f
            .auth
            .init_auth(InitAuthOptions::default().optional().required_role("admin"));
        assert_eq!(outcome, AuthOutcome::Anonymous);

        f.clock.set(NOW_MS + 3_600_001);
        let outcome = f.auth.init_auth(InitAuthOptions::default().optional());
        assert_eq!(outcome, AuthOutcome::Anonymous);
        assert_eq!(f.store.get(TOKEN_KEY), None);
        assert!(f.navigator.visits().is_empty());
    }

    #[test]
    fn test_fractional_exp_and_numeric_role_stay_signed_in() {
        let f = fixture();
        f.store.set(
            TOKEN_KEY,
            &make_token(&json!({
                "name": "Ada",
                "role": 1,
                "exp": 1_700_003_600.5
            })),
        );
        assert!(f.auth.is_authenticated());
        assert!(f.auth.has_role("1"));
        assert_eq!(f.auth.user_info().unwrap().name.as_deref(), Some("Ada"));
    }
}
