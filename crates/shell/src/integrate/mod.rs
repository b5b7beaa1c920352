//! Wiring the shell into a host application.
//!
//! [`Integration::start`] is the one call a host makes once its page is ready.
//! It checks the session, mounts the navbar, greets the user and hands back
//! an [`IntegrationSession`] holding the interceptors the host registers
//! into its own logger and HTTP stack. Nothing global is replaced, so
//! starting again builds a fresh session rather than stacking wrappers.

pub mod http;
pub mod logger;

pub use self::http::{AuthHeader, AuthHeaderLayer, AuthorizedClient};
pub use self::logger::{
    COMPLETION_KEYWORDS, HostLogger, ToastLayer, ToastingLogger, TracingLogger,
    is_completion_message,
};

use crate::auth::{Auth, AuthOutcome, InitAuthOptions};
use crate::document::Document;
use crate::navbar::{Navbar, NavbarOptions, create_navbar};
use crate::notify::Notifier;
use crate::token::UserInfo;

/// Entry point for embedding the shell.
#[derive(Debug, Clone)]
pub struct Integration {
    document: Document,
    auth: Auth,
}

impl Integration {
    #[must_use]
    pub const fn new(document: Document, auth: Auth) -> Self {
        Self { document, auth }
    }

    /// Require a session and set up the page for it.
    ///
    /// Returns `None` when the visitor is not signed in. The browser is
    /// already on its way to the login page then, and the host must not keep
    /// initializing.
    pub fn start(&self, navbar: NavbarOptions) -> Option<IntegrationSession> {
        let outcome = self.auth.init_auth(
            InitAuthOptions::default()
                .on_failure(|failure| tracing::info!(?failure, "Marketplace session required")),
        );
        let AuthOutcome::Authenticated(user) = outcome else {
            return None;
        };

        let notifier = Notifier::new(self.document.clone());
        let navbar = create_navbar(&self.document, &self.auth, navbar);
        notifier.show_success(&format!("Welcome, {}!", user.display_name()), None);
        tracing::info!(user = ?user.id, "Marketplace integration started");

        Some(IntegrationSession {
            user,
            navbar,
            notifier,
            auth: self.auth.clone(),
        })
    }
}

/// A started integration.
///
/// Dropping the session unregisters the navbar's click handling.
#[derive(Debug)]
pub struct IntegrationSession {
    user: UserInfo,
    navbar: Navbar,
    notifier: Notifier,
    auth: Auth,
}

impl IntegrationSession {
    #[must_use]
    pub const fn user(&self) -> &UserInfo {
        &self.user
    }

    #[must_use]
    pub const fn navbar(&self) -> &Navbar {
        &self.navbar
    }

    #[must_use]
    pub const fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    #[must_use]
    pub const fn auth(&self) -> &Auth {
        &self.auth
    }

    /// Wrap the host's logger so its messages also appear as toasts.
    pub fn logger<L: HostLogger>(&self, inner: L) -> ToastingLogger<L> {
        ToastingLogger::new(inner, self.notifier.clone())
    }

    /// Toasts for `tracing` events, for hosts that log through `tracing`.
    #[must_use]
    pub fn toast_layer(&self) -> ToastLayer {
        ToastLayer::new(self.notifier.clone())
    }

    /// Bearer-header layer for the host's tower HTTP client.
    #[must_use]
    pub fn http_layer(&self) -> AuthHeaderLayer {
        AuthHeaderLayer::new(self.auth.clone())
    }

    /// Decorate the host's `reqwest` client.
    #[must_use]
    pub fn client(&self, client: reqwest::Client) -> AuthorizedClient {
        AuthorizedClient::new(client, self.auth.clone())
    }
}
