//! Marketplace Shell - the layer third-party apps embed to join a marketplace
//! session.
//!
//! # Architecture
//!
//! Every piece is an explicit value the host wires up at startup. Nothing
//! patches ambient globals, so starting twice never stacks wrappers.
//!
//! - [`storage`] - Persistent key/value storage holding the bearer token
//! - [`token`] - Unverified decoding of the token's claims segment
//! - [`auth`] - Presence/expiry checks, role checks, login redirects
//! - [`document`] - Rendering-neutral mount tree (styles, containers, clicks)
//! - [`notify`] - Transient toast notifications
//! - [`navbar`] - Navigation bar reflecting session state
//! - [`integrate`] - Logger and HTTP interception plus the startup routine
//!
//! # Security
//!
//! Claims are decoded without checking the signature. Everything here is a
//! UX heuristic; whatever serves protected resources must verify the token
//! itself.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
pub mod document;
pub mod integrate;
pub mod navbar;
pub mod notify;
pub mod storage;
pub mod token;

pub use auth::{
    Auth, AuthFailure, AuthOutcome, Clock, FixedClock, InitAuthOptions, LOGIN_PATH, Navigator,
    RecordingNavigator, SystemClock, TOKEN_KEY,
};
pub use document::{ClickEvent, Document, ListenerGuard, Node, NodeId};
pub use integrate::{
    AuthHeader, AuthHeaderLayer, AuthorizedClient, HostLogger, Integration, IntegrationSession,
    ToastLayer, ToastingLogger, TracingLogger,
};
pub use navbar::{MenuClick, MenuItem, Navbar, NavbarOptions, create_navbar};
pub use notify::{Notifier, Severity, Toast};
pub use storage::{FileStore, MemoryStore, TokenStore};
pub use token::{Claims, TokenError, UserInfo, decode_claims};
