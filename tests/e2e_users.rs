//! E2E tests for sign-in, signup, nickname check and account summary

mod common;

use common::TestServer;
use serde_json::{Value, json};
use std::sync::atomic::Ordering;
use std::time::Duration;

fn provider_profile(id: Value, nickname: &str, is_default_image: bool) -> Value {
    json!({
        "id": id,
        "kakao_account": {
            "email": format!("{nickname}@example.com"),
            "profile": {
                "nickname": nickname,
                "profile_image_url": format!("https://k.kakaocdn.net/{nickname}.jpg"),
                "is_default_image": is_default_image
            }
        }
    })
}

async fn wait_for_mail(server: &TestServer, count: usize) {
    for _ in 0..50 {
        if server.mailer.sent.lock().unwrap().len() >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("expected {count} mail message(s)");
}

#[tokio::test]
async fn test_signin_of_unregistered_user() {
    let server = TestServer::new().await;
    server.register_provider_token("access-1", provider_profile(json!(1234567890), "jy", false));

    let response = server
        .client
        .post(server.url("/users/signin"))
        .header("Authorization", "access-1")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["id"], 1234567890);
    assert_eq!(body["email"], "jy@example.com");
    assert_eq!(body["nickname"], "jy");
    assert_eq!(body["profile_image"], "https://k.kakaocdn.net/jy.jpg");
    assert!(body.get("self_token").is_none());
}

#[tokio::test]
async fn test_signin_with_default_image_has_no_profile_image() {
    let server = TestServer::new().await;
    server.register_provider_token("access-1", provider_profile(json!(7), "jy", true));

    let response = server
        .client
        .post(server.url("/users/signin"))
        .header("Authorization", "access-1")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert!(body["profile_image"].is_null());
}

#[tokio::test]
async fn test_signin_of_registered_user_issues_token() {
    let server = TestServer::new().await;
    let (user, _token) = server.create_user("jy").await;
    // create_user registers the external id as `kakao-jy`
    server.register_provider_token("access-1", provider_profile(json!("kakao-jy"), "jy", false));

    let response = server
        .client
        .post(server.url("/users/signin"))
        .header("Authorization", "access-1")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["id"], "kakao-jy");
    let self_token = body["self_token"].as_str().unwrap();
    assert_eq!(server.state.token_codec.verify(self_token).unwrap(), user.id);
}

#[tokio::test]
async fn test_signin_rejected_by_provider() {
    let server = TestServer::new().await;

    let response = server
        .client
        .post(server.url("/users/signin"))
        .header("Authorization", "expired-token")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "INVALID_TOKEN");
}

#[tokio::test]
async fn test_signin_without_credential() {
    let server = TestServer::new().await;

    let response = server
        .client
        .post(server.url("/users/signin"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "KEY_ERROR");
}

#[tokio::test]
async fn test_signin_with_incomplete_profile() {
    let server = TestServer::new().await;
    server.register_provider_token(
        "access-1",
        json!({"id": 1, "kakao_account": {"profile": {"nickname": "jy"}}}),
    );

    let response = server
        .client
        .post(server.url("/users/signin"))
        .header("Authorization", "access-1")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "KEY_ERROR");
}

#[tokio::test]
async fn test_signup_issues_token_and_sends_welcome_mail() {
    let server = TestServer::new().await;

    let response = server
        .client
        .post(server.url("/users/signup"))
        .json(&json!({
            "email": "jy@example.com",
            "nickname": "jy",
            "profile_image": "https://k.kakaocdn.net/jy.jpg",
            "id": 1234567890
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["profile_image"], "https://k.kakaocdn.net/jy.jpg");

    let user_id = server
        .state
        .token_codec
        .verify(body["self_token"].as_str().unwrap())
        .unwrap();
    let user = server.state.db.get_user(user_id).await.unwrap().unwrap();
    assert_eq!(user.nickname, "jy");
    assert_eq!(user.kakao_id, "1234567890");

    wait_for_mail(&server, 1).await;
    let sent = server.mailer.sent.lock().unwrap();
    assert_eq!(sent[0].to, "jy@example.com");
}

#[tokio::test]
async fn test_signup_token_is_usable_immediately() {
    let server = TestServer::new().await;

    for i in 0..20 {
        let response = server
            .client
            .post(server.url("/users/signup"))
            .json(&json!({
                "email": format!("u{i}@example.com"),
                "nickname": format!("u{i}"),
                "id": i
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);
        let body: Value = response.json().await.unwrap();

        let summary = server
            .client
            .get(server.url("/users"))
            .header("Authorization", body["self_token"].as_str().unwrap())
            .send()
            .await
            .unwrap();
        assert_eq!(summary.status(), 200, "signup {i}");
    }
}

#[tokio::test]
async fn test_signup_with_string_id_and_no_image() {
    let server = TestServer::new().await;

    let response = server
        .client
        .post(server.url("/users/signup"))
        .json(&json!({"email": "mk@example.com", "nickname": "mk", "id": "ext-42"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    assert!(body["profile_image"].is_null());

    let user = server
        .state
        .db
        .get_user_by_kakao_id("ext-42")
        .await
        .unwrap();
    assert!(user.is_some());
}

#[tokio::test]
async fn test_signup_succeeds_when_mail_fails() {
    let server = TestServer::new().await;
    server.mailer.fail.store(true, Ordering::SeqCst);

    let response = server
        .client
        .post(server.url("/users/signup"))
        .json(&json!({"email": "jy@example.com", "nickname": "jy", "id": 1}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 201);
    assert!(server.mailer.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_signup_missing_field() {
    let server = TestServer::new().await;

    let response = server
        .client
        .post(server.url("/users/signup"))
        .json(&json!({"email": "jy@example.com", "id": 1}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "KEY_ERROR");
}

#[tokio::test]
async fn test_signup_malformed_body() {
    let server = TestServer::new().await;

    let response = server
        .client
        .post(server.url("/users/signup"))
        .header("Content-Type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_nickname_check_available() {
    let server = TestServer::new().await;
    server.create_user("jy").await;

    let response = server
        .client
        .post(server.url("/users/nickname-check"))
        .json(&json!({"nickname": "mk"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "SUCCESS");
}

#[tokio::test]
async fn test_nickname_check_taken_recommends_next_suffix() {
    let server = TestServer::new().await;
    for nickname in ["jy", "jy10", "jy20"] {
        server.create_user(nickname).await;
    }

    let response = server
        .client
        .post(server.url("/users/nickname-check"))
        .json(&json!({"nickname": "jy"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "NICKNAME_ALREADY_EXISTS");
    assert_eq!(body["recommendNickname"], "jy21");
}

#[tokio::test]
async fn test_concurrent_checks_may_recommend_the_same_nickname() {
    let server = TestServer::new().await;
    server.create_user("jy").await;

    let check = || {
        server
            .client
            .post(server.url("/users/nickname-check"))
            .json(&json!({"nickname": "jy"}))
            .send()
    };
    let (first, second) = tokio::join!(check(), check());
    let first: Value = first.unwrap().json().await.unwrap();
    let second: Value = second.unwrap().json().await.unwrap();
    assert_eq!(first["recommendNickname"], "jy1");
    assert_eq!(second["recommendNickname"], "jy1");

    // Signup does not re-check, so both registrations go through
    for id in [1, 2] {
        let response = server
            .client
            .post(server.url("/users/signup"))
            .json(&json!({"email": format!("{id}@example.com"), "nickname": "jy1", "id": id}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);
    }

    let response = server
        .client
        .post(server.url("/users/nickname-check"))
        .json(&json!({"nickname": "jy"}))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["recommendNickname"], "jy2");
}

#[tokio::test]
async fn test_account_summary() {
    let server = TestServer::new().await;
    let (user, token) = server.create_user("jy").await;
    let (other, _) = server.create_user("mk").await;
    let first = server.create_posting(user.id, 1, "first").await;
    server.create_posting(user.id, 2, "second").await;
    let theirs = server.create_posting(other.id, 1, "theirs").await;
    server.state.db.insert_like(user.id, first).await.unwrap();
    server.state.db.insert_like(user.id, theirs).await.unwrap();

    let response = server
        .client
        .get(server.url("/users"))
        .header("Authorization", token)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body["postings"],
        json!([
            "https://media.test.example.com/postings/first.jpg",
            "https://media.test.example.com/postings/second.jpg"
        ])
    );
    assert_eq!(body["likes"], 2);
}
