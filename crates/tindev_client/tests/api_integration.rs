//! Integration tests for the devs API client and the interaction dispatcher,
//! against an httpmock server.

use httpmock::prelude::*;
use serde_json::json;
use tindev_client::{Action, ApiClient, ClientError, Interactions, Session};

fn client(server: &MockServer) -> ApiClient {
    ApiClient::new(&server.base_url(), None).expect("client should build")
}

#[tokio::test]
async fn register_posts_username_and_returns_session() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/devs")
                .json_body(json!({ "username": "alice" }));
            then.status(200).json_body(json!({
                "_id": "u1",
                "name": "Alice",
                "user": "alice",
                "bio": "hi",
                "avatar": "https://avatars/u1"
            }));
        })
        .await;

    let session = client(&server).register("  alice ").await.unwrap();
    assert_eq!(session.user_id(), "u1");
    mock.assert_async().await;
}

#[tokio::test]
async fn register_rejects_blank_handle_without_request() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/devs");
            then.status(200).json_body(json!({ "_id": "u1" }));
        })
        .await;

    let err = client(&server).register("   ").await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidInput(_)));
    assert_eq!(mock.hits_async().await, 0);
}

#[tokio::test]
async fn candidates_sends_user_header_and_keeps_order() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/devs").header("user", "u1");
            then.status(200).json_body(json!([
                { "_id": "A", "name": "Ann", "bio": "a", "avatar": "https://a" },
                { "_id": "B", "name": "Ben", "avatar": "https://b" },
                { "_id": "C", "name": "Cid" }
            ]));
        })
        .await;

    let candidates = client(&server)
        .candidates(&Session::new("u1"))
        .await
        .unwrap();
    let ids: Vec<&str> = candidates.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, ["A", "B", "C"]);
    assert_eq!(candidates[1].bio, "");
    mock.assert_async().await;
}

#[tokio::test]
async fn like_and_dislike_post_to_candidate_paths() {
    let server = MockServer::start_async().await;
    let like = server
        .mock_async(|when, then| {
            when.method(POST).path("/devs/B/likes").header("user", "u1");
            then.status(200).json_body(json!({ "_id": "u1" }));
        })
        .await;
    let dislike = server
        .mock_async(|when, then| {
            when.method(POST).path("/devs/A/dislikes").header("user", "u1");
            then.status(200);
        })
        .await;

    let api = client(&server);
    let session = Session::new("u1");
    api.dislike(&session, "A").await.unwrap();
    api.like(&session, "B").await.unwrap();
    like.assert_async().await;
    dislike.assert_async().await;
}

#[tokio::test]
async fn error_status_maps_to_status_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/devs");
            then.status(400).body("User not exists");
        })
        .await;

    let err = client(&server)
        .candidates(&Session::new("stale"))
        .await
        .unwrap_err();
    match err {
        ClientError::Status { status, body } => {
            assert_eq!(status.as_u16(), 400);
            assert_eq!(body, "User not exists");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn malformed_json_maps_to_decode_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/devs");
            then.status(200).body("not json");
        })
        .await;

    let err = client(&server)
        .candidates(&Session::new("u1"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Decode(_)));
}

#[tokio::test]
async fn base_url_path_prefix_is_kept() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/devs");
            then.status(200).json_body(json!([]));
        })
        .await;

    let api = ApiClient::new(&format!("{}/api/", server.base_url()), None).unwrap();
    assert!(api.candidates(&Session::new("u1")).await.unwrap().is_empty());
    mock.assert_async().await;
}

#[tokio::test]
async fn dispatched_failures_are_reported_on_outcome_channel() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/devs/A/likes");
            then.status(500);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/devs/B/dislikes");
            then.status(200);
        })
        .await;

    let mut interactions = Interactions::new(client(&server));
    let session = Session::new("u1");
    interactions.dispatch(&session, Action::Like, "A");
    interactions.dispatch(&session, Action::Dislike, "B");
    assert_eq!(interactions.in_flight(), 2);

    let mut outcomes = Vec::new();
    while let Some(outcome) = interactions.next_outcome().await {
        outcomes.push(outcome);
    }
    assert_eq!(outcomes.len(), 2);
    assert_eq!(interactions.in_flight(), 0);

    let failed = outcomes.iter().find(|o| o.candidate_id == "A").unwrap();
    assert_eq!(failed.action, Action::Like);
    assert!(matches!(failed.result, Err(ClientError::Status { .. })));
    let ok = outcomes.iter().find(|o| o.candidate_id == "B").unwrap();
    assert!(ok.is_success());
}
