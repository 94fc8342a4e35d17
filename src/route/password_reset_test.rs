use std::sync::Arc;

use poem::{http::StatusCode, test::TestClient};
use serde_json::json;
use sqlx::PgPool;

use crate::{
    core::{
        security::{encode_uid, make_password_reset_token, verify_hash_password},
        test_utils::{app_state_with_pool, stub_providers, test_config, test_user, StubMailer},
    },
    init_openapi_route,
    repository::user::{create_user, get_user_by_id},
};

#[sqlx::test]
async fn test_password_reset_request(pool: PgPool) -> anyhow::Result<()> {
    // Given
    let config = test_config();
    let (mut providers, ..) = stub_providers();
    let mailer = Arc::new(StubMailer::new());
    providers.mailer = mailer.clone();
    let app_state = app_state_with_pool(&config, pool, providers);
    let fox = test_user("fox");
    let mut tx = app_state.db.begin().await?;
    create_user(&mut tx, &fox).await?;
    tx.commit().await?;
    let app = init_openapi_route(app_state.clone(), &config);
    let cli = TestClient::new(app);

    // When known address in another case
    let resp = cli
        .post("/password-reset/")
        .body_json(&json!({"email": "FOX@example.com"}))
        .send()
        .await;

    // Expect
    resp.assert_status_is_ok();
    resp.assert_json(json!({"ok": true})).await;
    assert_eq!(mailer.sent().len(), 1);
    assert_eq!(mailer.sent()[0].subject, "Reset your PSI Vision password");

    // When unknown address
    let resp = cli
        .post("/password-reset/")
        .body_json(&json!({"email": "nobody@example.com"}))
        .send()
        .await;

    // Expect the same answer and no email
    resp.assert_status_is_ok();
    resp.assert_json(json!({"ok": true})).await;
    assert_eq!(mailer.sent().len(), 1);
    Ok(())
}

#[sqlx::test]
async fn test_password_reset_link_ignores_forwarded_host(pool: PgPool) -> anyhow::Result<()> {
    // Given
    let mut config = test_config();
    config.allowed_hosts = Some("psi.example.org".to_string());
    let (mut providers, ..) = stub_providers();
    let mailer = Arc::new(StubMailer::new());
    providers.mailer = mailer.clone();
    let app_state = app_state_with_pool(&config, pool, providers);
    let fox = test_user("fox");
    let mut tx = app_state.db.begin().await?;
    create_user(&mut tx, &fox).await?;
    tx.commit().await?;
    let app = init_openapi_route(app_state.clone(), &config);
    let cli = TestClient::new(app);

    // When the forwarded host points elsewhere
    let resp = cli
        .post("/password-reset/")
        .header("host", "psi.example.org")
        .header("x-forwarded-host", "evil.attacker.test")
        .body_json(&json!({"email": "fox@example.com"}))
        .send()
        .await;

    // Expect the link to stay on the request host
    resp.assert_status_is_ok();
    let text = mailer.sent()[0].text.clone();
    assert!(text.contains("http://psi.example.org/reset/"));
    assert!(!text.contains("evil.attacker.test"));

    // When the host itself is not allowed
    let resp = cli
        .post("/password-reset/")
        .header("host", "evil.attacker.test")
        .body_json(&json!({"email": "fox@example.com"}))
        .send()
        .await;

    // Expect the fallback domain
    resp.assert_status_is_ok();
    let text = mailer.sent()[1].text.clone();
    assert!(text.contains("http://localhost:8000/reset/"));
    assert!(!text.contains("evil.attacker.test"));
    Ok(())
}

#[sqlx::test]
async fn test_set_password_from_link(pool: PgPool) -> anyhow::Result<()> {
    // Given
    let config = test_config();
    let (providers, ..) = stub_providers();
    let app_state = app_state_with_pool(&config, pool, providers);
    let fox = test_user("fox");
    let mut tx = app_state.db.begin().await?;
    create_user(&mut tx, &fox).await?;
    tx.commit().await?;
    let uid = encode_uid(&fox.id);
    let token = make_password_reset_token(&fox, &config)?;
    let link = format!("/reset/{}/{}/", uid, token);
    let app = init_openapi_route(app_state.clone(), &config);
    let cli = TestClient::new(app);

    // When checking the link
    let resp = cli.get(&link).send().await;
    // Expect
    resp.assert_status_is_ok();
    resp.assert_json(json!({"valid": true})).await;

    // When the password is too short
    let resp = cli
        .post(&link)
        .body_json(&json!({"new_password": "short"}))
        .send()
        .await;
    // Expect
    resp.assert_status(StatusCode::BAD_REQUEST);

    // When setting the password
    let resp = cli
        .post(&link)
        .body_json(&json!({"new_password": "a-much-better-password"}))
        .send()
        .await;
    // Expect
    resp.assert_status_is_ok();
    let mut tx = app_state.db.begin().await?;
    let stored = get_user_by_id(&mut tx, &fox.id).await?.unwrap();
    assert!(verify_hash_password("a-much-better-password", &stored.password).unwrap());

    // When the link is used twice
    let resp = cli.get(&link).send().await;
    resp.assert_json(json!({"valid": false})).await;
    let resp = cli
        .post(&link)
        .body_json(&json!({"new_password": "another-password"}))
        .send()
        .await;
    // Expect
    resp.assert_status(StatusCode::BAD_REQUEST);

    // When the uid is garbage
    let resp = cli.get(format!("/reset/bm9wZQ/{}/", token)).send().await;
    resp.assert_json(json!({"valid": false})).await;
    Ok(())
}
