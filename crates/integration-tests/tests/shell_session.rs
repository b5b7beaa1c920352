//! Session startup for an embedded app, with requests to a live backend.

use std::sync::Arc;

use axum::{Router, http::HeaderMap, routing::get};
use marketplace_integration_tests::{TestServer, make_token};
use marketplace_shell::{
    Auth, ClickEvent, Document, Integration, MemoryStore, NavbarOptions, RecordingNavigator,
    TOKEN_KEY, TokenStore,
};
use serde_json::json;

/// Echoes the request's Authorization header.
async fn whoami(headers: HeaderMap) -> String {
    headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("anonymous")
        .to_owned()
}

fn session_token() -> String {
    make_token(&json!({
        "id": "u-17",
        "name": "Grace",
        "email": "grace@example.com",
        "role": "developer",
        "exp": 4_102_444_800_i64
    }))
}

fn page(path: &str) -> (MemoryStore, Arc<RecordingNavigator>, Auth) {
    let store = MemoryStore::new();
    let navigator = Arc::new(RecordingNavigator::new(path));
    let auth = Auth::new(Arc::new(store.clone()), navigator.clone());
    (store, navigator, auth)
}

#[tokio::test]
async fn test_signed_in_session_authorizes_requests() {
    let backend = TestServer::spawn(Router::new().route("/whoami", get(whoami)))
        .await
        .unwrap();
    let (store, navigator, auth) = page("/apps/notepad");
    let token = session_token();
    store.set(TOKEN_KEY, &token);

    let document = Document::new();
    let session = Integration::new(document.clone(), auth)
        .start(NavbarOptions {
            app_name: "NotePad".to_owned(),
            ..NavbarOptions::default()
        })
        .unwrap();

    assert_eq!(session.user().display_name(), "Grace");
    assert!(navigator.visits().is_empty());
    assert!(session.navbar().html().contains("NotePad"));
    assert_eq!(session.notifier().mounted_count(), 1);

    let client = session.client(reqwest::Client::new());
    let seen = client
        .get(backend.url("/whoami"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(seen, format!("Bearer {token}"));

    // Logging out from the navbar drops the token for later requests
    document.click(&ClickEvent::on(session.navbar().logout_target()));
    assert_eq!(navigator.last().as_deref(), Some("/login"));
    let seen = client
        .get(backend.url("/whoami"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(seen, "anonymous");
}

#[tokio::test]
async fn test_signed_out_visitor_is_sent_to_login() {
    let (_store, navigator, auth) = page("/apps/notepad?tab=2");
    let document = Document::new();

    let session = Integration::new(document.clone(), auth).start(NavbarOptions::default());

    assert!(session.is_none());
    assert_eq!(
        navigator.last().as_deref(),
        Some("/login?redirect=%2Fapps%2Fnotepad%3Ftab%3D2")
    );
    assert!(document.find_by_class("marketplace-navbar").is_empty());
}

#[tokio::test]
async fn test_expired_token_is_sent_to_login() {
    let (store, navigator, auth) = page("/apps/notepad");
    store.set(
        TOKEN_KEY,
        &make_token(&json!({ "name": "Grace", "exp": 946_684_800_i64 })),
    );

    let session = Integration::new(Document::new(), auth).start(NavbarOptions::default());

    assert!(session.is_none());
    assert!(navigator.last().unwrap().starts_with("/login?redirect="));
}
