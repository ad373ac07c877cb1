mod common;

use std::{sync::Arc, time::Duration};

use common::*;
use staybook_core::{
    error::SessionError,
    notice::{Notice, NoticeLevel},
    session::MemoryTokenStore,
    AppContext, SignupForm, TokenStore,
};
use tokio::sync::mpsc::UnboundedReceiver;

async fn anonymous(
    stub: &StubBackend,
) -> (AppContext, Arc<MemoryTokenStore>, UnboundedReceiver<Notice>) {
    let store = Arc::new(MemoryTokenStore::default());
    let (context, notices) =
        AppContext::start(stub.config(), store.clone()).await.expect("context");
    (context, store, notices)
}

#[tokio::test]
async fn login_with_valid_credentials_authenticates() {
    let stub = StubBackend::start().await;
    let (mut context, store, mut notices) = anonymous(&stub).await;

    let success = context
        .session_mut()
        .login(GUEST_EMAIL, PASSWORD)
        .await
        .expect("login");

    assert_eq!(success.user.name, "Ana");
    assert!(!success.is_owner);
    assert_eq!(context.session().token(), Some(GUEST_TOKEN));
    assert!(context.session().is_authenticated());
    assert_eq!(store.load().expect("load").as_deref(), Some(GUEST_TOKEN));

    let notice = notices.try_recv().expect("login notice");
    assert_eq!(notice.level, NoticeLevel::Success);
    assert_eq!(notice.message, "Logged in successfully");
}

#[tokio::test]
async fn owner_login_derives_owner_flag() {
    let stub = StubBackend::start().await;
    let (mut context, _store, _notices) = anonymous(&stub).await;

    let success = context
        .session_mut()
        .login(&format!("  {OWNER_EMAIL} "), PASSWORD)
        .await
        .expect("login");
    assert!(success.is_owner);
    assert!(context.session().is_owner());
}

#[tokio::test]
async fn wrong_password_is_reported_and_nothing_is_stored() {
    let stub = StubBackend::start().await;
    let (mut context, store, mut notices) = anonymous(&stub).await;

    let err = context
        .session_mut()
        .login(GUEST_EMAIL, "nope")
        .await
        .expect_err("wrong password");

    assert_eq!(err, SessionError::InvalidCredentials);
    assert_eq!(err.to_string(), "Invalid email or password.");
    assert!(context.session().token().is_none());
    assert!(!context.session().is_authenticated());
    assert_eq!(store.load().expect("load"), None);

    let notice = notices.try_recv().expect("error notice");
    assert_eq!(notice.level, NoticeLevel::Error);
    assert_eq!(notice.message, "Invalid email or password.");
}

#[tokio::test]
async fn login_failures_are_classified_by_status() {
    let stub = StubBackend::start().await;
    let (mut context, _store, _notices) = anonymous(&stub).await;

    let missing = context
        .session_mut()
        .login("ghost@example.com", PASSWORD)
        .await
        .expect_err("unknown user");
    assert_eq!(missing, SessionError::UserNotFound);

    let server = context
        .session_mut()
        .login("boom@example.com", PASSWORD)
        .await
        .expect_err("server error");
    assert_eq!(server, SessionError::Server);
}

#[tokio::test]
async fn unreachable_backend_is_a_connectivity_error() {
    let (mut context, _notices) = AppContext::new(
        staybook_core::AppConfig {
            backend_url: "http://127.0.0.1:9".to_string(),
            request_timeout_secs: 1,
            ..Default::default()
        },
        Arc::new(MemoryTokenStore::default()),
    )
    .expect("context");

    let err = context
        .session_mut()
        .login(GUEST_EMAIL, PASSWORD)
        .await
        .expect_err("no backend");
    assert_eq!(err, SessionError::Connectivity);
}

#[tokio::test]
async fn saved_token_is_restored_at_start() {
    let stub = StubBackend::start().await;
    let store = Arc::new(MemoryTokenStore::with_token(OWNER_TOKEN));
    let (context, mut notices) = AppContext::start(stub.config(), store)
        .await
        .expect("context");

    assert!(context.session().is_authenticated());
    assert!(context.session().is_owner());
    assert_eq!(context.session().user().map(|user| user.name.as_str()), Some("Olu"));
    assert!(notices.try_recv().is_err());
}

#[tokio::test]
async fn rotated_access_token_replaces_the_saved_one() {
    let stub = StubBackend::start().await;
    let store = Arc::new(MemoryTokenStore::with_token(STALE_TOKEN));
    let (mut context, mut notices) = AppContext::start(stub.config(), store.clone())
        .await
        .expect("context");

    assert_eq!(context.session().token(), Some(ROTATED_TOKEN));
    assert_eq!(store.load().expect("load").as_deref(), Some(ROTATED_TOKEN));
    assert!(context.session().is_authenticated());
    assert!(notices.try_recv().is_err());

    // The stub refuses the stale token on protected routes.
    let bookings = context.my_bookings().await.expect("bookings with rotated token");
    assert_eq!(bookings.len(), 1);
}

#[tokio::test]
async fn expired_token_clears_session_silently() {
    let stub = StubBackend::start().await;
    let store = Arc::new(MemoryTokenStore::with_token(EXPIRED_TOKEN));
    let (context, mut notices) = AppContext::start(stub.config(), store.clone())
        .await
        .expect("context");

    assert!(context.session().user().is_none());
    assert!(context.session().token().is_none());
    assert!(!context.session().is_loading());
    assert_eq!(store.load().expect("load"), None);
    assert!(notices.try_recv().is_err(), "401 must not raise a notice");
}

#[tokio::test]
async fn logout_clears_token_before_the_backend_hears_about_it() {
    let stub = StubBackend::start().await;
    let (mut context, store, _notices) = anonymous(&stub).await;
    context
        .session_mut()
        .login(GUEST_EMAIL, PASSWORD)
        .await
        .expect("login");

    context.session_mut().logout();
    assert!(context.session().token().is_none());
    assert!(context.session().user().is_none());
    assert_eq!(store.load().expect("load"), None);

    context.session_mut().settle(Duration::from_secs(5)).await;
    assert_eq!(stub.calls.sign_outs(), 1);
    assert!(context.session().token().is_none());
}

#[tokio::test]
async fn logout_when_backend_is_gone_still_ends_session() {
    let stub = StubBackend::start().await;
    let (mut context, _store, _notices) = anonymous(&stub).await;
    context
        .session_mut()
        .login(GUEST_EMAIL, PASSWORD)
        .await
        .expect("login");
    drop(stub);

    context.session_mut().logout();
    assert!(context.session().token().is_none());
    context.shutdown().await;
}

#[tokio::test]
async fn signup_surfaces_field_errors_and_does_not_log_in() {
    let stub = StubBackend::start().await;
    let (mut context, _store, mut notices) = anonymous(&stub).await;

    let duplicate = SignupForm {
        username: "Ana".to_string(),
        email: GUEST_EMAIL.to_string(),
        password: PASSWORD.to_string(),
    };
    let err = context
        .session_mut()
        .signup(&duplicate)
        .await
        .expect_err("duplicate email");
    let fields = err.field_errors().expect("field errors");
    assert_eq!(fields["email"], "Email already exists");
    let _ = notices.try_recv();

    let fresh = SignupForm {
        email: "new@example.com".to_string(),
        ..duplicate
    };
    context.session_mut().signup(&fresh).await.expect("signup");
    assert!(context.session().token().is_none());
    let notice = notices.try_recv().expect("signup notice");
    assert_eq!(notice.message, "Account created successfully! Please login.");
}

#[tokio::test]
async fn signup_with_blank_fields_never_reaches_the_backend() {
    let (mut context, _notices) = AppContext::new(
        staybook_core::AppConfig {
            backend_url: "http://127.0.0.1:9".to_string(),
            ..Default::default()
        },
        Arc::new(MemoryTokenStore::default()),
    )
    .expect("context");

    let err = context
        .session_mut()
        .signup(&SignupForm {
            username: String::new(),
            email: "x@example.com".to_string(),
            password: "pw".to_string(),
        })
        .await
        .expect_err("blank username");
    assert!(err.field_errors().expect("fields").contains_key("username"));
}
