mod common;

use anyhow::Result;
use reqwest::StatusCode;
use std::time::Instant;

#[tokio::test]
async fn login_returns_token_and_profile() -> Result<()> {
    let server = common::spawn_server().await?;
    let admin = server.users.seed("admin", "admin123", "admin").await;

    let (status, body) = server.login("admin", "admin123").await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["user"]["id"], admin.id);
    assert_eq!(body["data"]["user"]["username"], "admin");
    assert_eq!(body["data"]["expires_in"], 3600);
    assert!(body["data"]["user"].get("password_hash").is_none());

    let token = body["data"]["token"].as_str().unwrap_or_default().to_string();
    let (status, profile) = server.get_authed("/api/auth/profile", &token).await?;
    assert_eq!(status, StatusCode::OK, "{}", profile);
    assert_eq!(profile["data"]["username"], "admin");
    assert_eq!(profile["data"]["role"], "admin");
    Ok(())
}

#[tokio::test]
async fn login_failures_are_indistinguishable() -> Result<()> {
    let server = common::spawn_server().await?;
    server.users.seed("admin", "admin123", "admin").await;

    let (wrong_password, wrong_body) = server.login("admin", "nope").await?;
    let (unknown_user, unknown_body) = server.login("ghost", "nope").await?;

    assert_eq!(wrong_password, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, unknown_body);
    assert_eq!(wrong_body["success"], false);
    Ok(())
}

#[tokio::test]
async fn unknown_user_login_is_not_measurably_faster() -> Result<()> {
    let server = common::spawn_server().await?;
    server.users.seed("admin", "admin123", "admin").await;

    // Warm up the connection pool and the hasher
    server.login("admin", "nope").await?;

    let started = Instant::now();
    let (status, _) = server.login("admin", "nope").await?;
    let wrong_password = started.elapsed();
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let started = Instant::now();
    let (status, _) = server.login("ghost", "nope").await?;
    let unknown_user = started.elapsed();
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert!(
        unknown_user * 10 >= wrong_password,
        "unknown user answered in {:?}, wrong password in {:?}",
        unknown_user,
        wrong_password
    );
    Ok(())
}

#[tokio::test]
async fn login_rejects_missing_fields_and_bad_json() -> Result<()> {
    let server = common::spawn_server().await?;

    let (status, body) = server.login("", "").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let res = server
        .client
        .post(server.url("/api/auth/login"))
        .header("Content-Type", "application/json")
        .body("{not json")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["code"], "INVALID_JSON");
    assert_eq!(body["success"], false);
    Ok(())
}

#[tokio::test]
async fn second_login_supersedes_first_token() -> Result<()> {
    let server = common::spawn_server().await?;
    server.users.seed("admin", "admin123", "admin").await;

    let first = server.token_for("admin", "admin123").await?;
    let second = server.token_for("admin", "admin123").await?;

    let (status, _) = server.get_authed("/api/auth/profile", &first).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = server.get_authed("/api/auth/profile", &second).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}
