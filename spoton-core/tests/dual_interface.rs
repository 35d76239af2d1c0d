//! Integration tests for the awaitable and callback call shapes.
//!
//! Runs against an in-process backend so the number of requests that
//! reach the wire can be asserted exactly.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use common::*;
use reqwest::StatusCode;
use spoton_core::{Credential, ErrorKind, HttpRequest, HttpResponse};
use tokio::sync::oneshot;

fn location_backend() -> Arc<RecordingBackend> {
    RecordingBackend::new(|request: &HttpRequest| match request.url.path() {
        VERIFY_PATH => HttpResponse::new(StatusCode::NO_CONTENT, ""),
        LOCATION_PATH => HttpResponse::new(StatusCode::OK, location_json().to_string()),
        _ => HttpResponse::new(StatusCode::NOT_FOUND, ""),
    })
}

#[tokio::test]
async fn test_malformed_ids_never_reach_the_backend() {
    let backend = location_backend();
    let client = recording_client(backend.clone(), Credential::api_key("k"));
    client.authenticate().await.unwrap();
    let calls_after_auth = backend.calls();

    for bad in [
        "invalid-location-id",
        "BL-1234-5678",
        "BL-ABCD-5678-9012",
        "bl-1234-5678-9012",
        "BL-1234-5678-9012/../../admin",
        "",
    ] {
        let err = client.business().get_location(bad).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation, "{:?}", bad);

        let err = client.menus().get_menus(bad).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation, "{:?}", bad);

        let (tx, rx) = oneshot::channel();
        let handle = client.business().get_location_with(bad, move |result| {
            let _ = tx.send(result);
        });
        assert!(handle.finished().await);
        assert_eq!(rx.await.unwrap().unwrap_err().kind(), ErrorKind::Validation);
    }

    assert_eq!(backend.calls(), calls_after_auth);
}

#[tokio::test]
async fn test_malformed_id_fails_even_when_unauthenticated() {
    let backend = location_backend();
    let client = recording_client(backend.clone(), Credential::api_key("k"));

    let err = client.business().get_location("nope").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn test_callback_and_awaitable_agree() {
    let backend = location_backend();
    let client = recording_client(backend.clone(), Credential::api_key("k"));
    client.authenticate().await.unwrap();

    let awaited = client
        .business()
        .get_location(LOCATION_ID)
        .await
        .unwrap()
        .unwrap();

    let (tx, rx) = oneshot::channel();
    let handle = client.business().get_location_with(LOCATION_ID, move |result| {
        let _ = tx.send(result);
    });
    assert!(handle.finished().await);
    let called_back = rx.await.unwrap().unwrap().unwrap();

    assert_eq!(awaited, called_back);
    assert_eq!(backend.calls_to(LOCATION_PATH), 2);
}

#[tokio::test]
async fn test_callback_gets_none_for_missing_location() {
    let backend = RecordingBackend::new(|request: &HttpRequest| match request.url.path() {
        VERIFY_PATH => HttpResponse::new(StatusCode::NO_CONTENT, ""),
        _ => HttpResponse::new(StatusCode::NOT_FOUND, r#"{"code": "NOT_FOUND"}"#),
    });
    let client = recording_client(backend, Credential::api_key("k"));
    client.authenticate().await.unwrap();

    let (tx, rx) = oneshot::channel();
    let handle = client.menus().get_menus_with(LOCATION_ID, move |result| {
        let _ = tx.send(result);
    });
    assert!(handle.finished().await);

    assert!(rx.await.unwrap().unwrap().is_none());
}

#[tokio::test]
async fn test_callback_gets_errors_not_none() {
    let backend = RecordingBackend::new(|request: &HttpRequest| match request.url.path() {
        VERIFY_PATH => HttpResponse::new(StatusCode::NO_CONTENT, ""),
        _ => HttpResponse::new(StatusCode::UNAUTHORIZED, ""),
    });
    let client = recording_client(backend, Credential::api_key("k"));
    client.authenticate().await.unwrap();

    let (tx, rx) = oneshot::channel();
    let handle = client.business().get_location_with(LOCATION_ID, move |result| {
        let _ = tx.send(result);
    });
    assert!(handle.finished().await);

    let err = rx.await.unwrap().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authentication);
}

#[tokio::test]
async fn test_authenticate_with_callback() {
    let backend = RecordingBackend::new(|request: &HttpRequest| match request.url.path() {
        TOKEN_PATH => HttpResponse::new(
            StatusCode::UNAUTHORIZED,
            r#"{"error": "invalid_client"}"#,
        ),
        _ => HttpResponse::new(StatusCode::NOT_FOUND, ""),
    });
    let client = recording_client(backend.clone(), Credential::client_credentials("id", "bad"));

    let (tx, rx) = oneshot::channel();
    let handle = client.authenticate_with(move |result| {
        let _ = tx.send(result);
    });
    assert!(handle.finished().await);

    let err = rx.await.unwrap().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authentication);
    assert_eq!(err.code(), Some("invalid_client"));
    assert_eq!(backend.calls_to(TOKEN_PATH), 1);
    assert!(client.token_store().is_empty());
}

#[tokio::test]
async fn test_abandoned_call_does_not_invoke_callback() {
    let backend = location_backend();
    let client = recording_client(backend, Credential::api_key("k"));

    let invoked = Arc::new(AtomicBool::new(false));
    let flag = invoked.clone();

    // Abandon before the runtime gets a chance to run the task.
    let handle = client.authenticate_with(move |_| flag.store(true, Ordering::SeqCst));
    handle.abandon();

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!invoked.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_concurrent_resource_calls_share_one_token() {
    let backend = location_backend();
    let client = recording_client(backend.clone(), Credential::api_key("k"));
    client.authenticate().await.unwrap();

    let (a, b, c) = tokio::join!(
        client.business().get_location(LOCATION_ID),
        client.business().get_location(LOCATION_ID),
        client.business().get_location(LOCATION_ID)
    );

    assert!(a.unwrap().is_some() && b.unwrap().is_some() && c.unwrap().is_some());
    assert_eq!(backend.calls_to(VERIFY_PATH), 1);
    assert_eq!(backend.calls_to(LOCATION_PATH), 3);
}
