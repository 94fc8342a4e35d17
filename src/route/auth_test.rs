use poem::{http::StatusCode, test::TestClient};
use serde_json::json;
use sqlx::PgPool;

use crate::{
    core::{
        security::{decode_token, get_user_from_token, hash_password},
        test_utils::{app_state_with_pool, stub_providers, test_config, test_user},
    },
    factory::user::UserFactory,
    init_openapi_route,
    model::user::User,
    repository::user::{create_user, get_user_by_id},
};

async fn login(
    cli: &TestClient<impl poem::Endpoint>,
    user_name: &str,
    password: &str,
) -> poem::test::TestResponse {
    cli.post("/api/auth/login")
        .body_json(&json!({"user_name": user_name, "password": password}))
        .send()
        .await
}

#[sqlx::test]
async fn test_login_then_logout(pool: PgPool) -> anyhow::Result<()> {
    // Given
    let mut config = test_config();
    config.prefix = Some("/api".to_string());
    let (providers, ..) = stub_providers();
    let app_state = app_state_with_pool(&config, pool, providers);
    let mut user_factory = UserFactory::<()>::new();
    user_factory.modified_one(|data, _| User {
        user_name: "test_user".to_string(),
        email: Some("Test.User@example.com".to_string()),
        password: hash_password("password").unwrap(),
        is_active: true,
        last_login: None,
        ..data.clone()
    });
    let user = user_factory.generate_one(&app_state.db, ()).await?;
    let app = init_openapi_route(app_state.clone(), &config);
    let cli = TestClient::new(app);

    // When login
    let resp = login(&cli, "test_user", "password").await;

    // Expect login
    resp.assert_status_is_ok();
    let json = resp.json().await;
    let token: String = json.value().object().get("token").deserialize();
    json.value().object().get("token_type").assert_string("Bearer");
    let mut tx = app_state.db.begin().await?;
    let mut redis_conn = app_state.redis_conn.get()?;
    let user_in_token = get_user_from_token(&mut tx, &mut redis_conn, Some(token.clone())).await?;
    assert_eq!(user_in_token.map(|x| x.id), Some(user.id));
    let stored = get_user_by_id(&mut tx, &user.id).await?.unwrap();
    assert!(stored.last_login.is_some());
    drop(tx);

    // When logout
    let resp = cli
        .post("/api/auth/logout")
        .header("authorization", format!("Bearer {}", token))
        .send()
        .await;

    // Expect logout
    resp.assert_status(StatusCode::NO_CONTENT);
    let mut tx = app_state.db.begin().await?;
    let user_in_token = get_user_from_token(&mut tx, &mut redis_conn, Some(token.clone())).await?;
    assert!(user_in_token.is_none());

    // When second logout
    let resp = cli
        .post("/api/auth/logout")
        .header("authorization", format!("Bearer {}", token))
        .send()
        .await;

    // Expect second logout
    resp.assert_status(StatusCode::UNAUTHORIZED);
    Ok(())
}

#[sqlx::test]
async fn test_login_with_email_and_bad_credentials(pool: PgPool) -> anyhow::Result<()> {
    // Given
    let mut config = test_config();
    config.prefix = Some("/api".to_string());
    let (providers, ..) = stub_providers();
    let app_state = app_state_with_pool(&config, pool, providers);
    let mut user_factory = UserFactory::<bool>::new();
    user_factory.modified_many(|data, idx, active| User {
        user_name: format!("user_{}", idx),
        email: Some(format!("user_{}@example.com", idx)),
        password: hash_password("password").unwrap(),
        is_active: active || idx == 0,
        ..data.clone()
    });
    user_factory.generate_many(&app_state.db, 2, false).await?;
    let app = init_openapi_route(app_state.clone(), &config);
    let cli = TestClient::new(app);

    // When / Expect email in another case
    login(&cli, "USER_0@example.com", "password").await.assert_status_is_ok();
    // When / Expect wrong password
    login(&cli, "user_0", "wrong").await.assert_status(StatusCode::BAD_REQUEST);
    // When / Expect unknown user
    login(&cli, "nobody", "password").await.assert_status(StatusCode::BAD_REQUEST);
    // When / Expect inactive user
    login(&cli, "user_1", "password").await.assert_status(StatusCode::BAD_REQUEST);
    login(&cli, "user_1@example.com", "password").await.assert_status(StatusCode::BAD_REQUEST);
    Ok(())
}

#[sqlx::test]
async fn test_login_then_refresh(pool: PgPool) -> anyhow::Result<()> {
    // Given
    let mut config = test_config();
    config.prefix = Some("/api".to_string());
    let (providers, ..) = stub_providers();
    let app_state = app_state_with_pool(&config, pool, providers);
    let mut user_factory = UserFactory::<()>::new();
    user_factory.modified_one(|data, _| User {
        user_name: "test_user".to_string(),
        password: hash_password("password").unwrap(),
        is_active: true,
        ..data.clone()
    });
    let user = user_factory.generate_one(&app_state.db, ()).await?;
    let app = init_openapi_route(app_state.clone(), &config);
    let cli = TestClient::new(app);

    // When login
    let resp = login(&cli, "test_user", "password").await;

    // Expect login
    resp.assert_status_is_ok();
    let json = resp.json().await;
    let refresh_token: String = json.value().object().get("refresh_token").deserialize();
    let access_token: String = json.value().object().get("token").deserialize();

    // When refresh
    let resp = cli
        .post("/api/auth/refresh-token")
        .body_json(&json!({"refresh_token": refresh_token}))
        .send()
        .await;

    // Expect refresh
    resp.assert_status_is_ok();
    let json = resp.json().await;
    let token: String = json.value().object().get("token").deserialize();
    let mut tx = app_state.db.begin().await?;
    let mut redis_conn = app_state.redis_conn.get()?;
    let user_in_token = get_user_from_token(&mut tx, &mut redis_conn, Some(token)).await?;
    assert_eq!(user_in_token.map(|x| x.id), Some(user.id));

    // When an access token is used as refresh token
    let resp = cli
        .post("/api/auth/refresh-token")
        .body_json(&json!({"refresh_token": access_token}))
        .send()
        .await;

    // Expect
    resp.assert_status(StatusCode::UNAUTHORIZED);
    Ok(())
}

#[sqlx::test]
async fn test_login_falls_back_to_email_after_user_name_fails(pool: PgPool) -> anyhow::Result<()> {
    // Given one account named like an address and another using it as email
    let mut config = test_config();
    config.prefix = Some("/api".to_string());
    let (providers, ..) = stub_providers();
    let app_state = app_state_with_pool(&config, pool, providers);
    let mut named = test_user("owl");
    named.user_name = "owl@example.com".to_string();
    named.email = None;
    named.password = hash_password("named-pass").unwrap();
    let mut mailed = test_user("raven");
    mailed.email = Some("Owl@Example.com".to_string());
    mailed.password = hash_password("mailed-pass").unwrap();
    let mut tx = app_state.db.begin().await?;
    create_user(&mut tx, &named).await?;
    create_user(&mut tx, &mailed).await?;
    tx.commit().await?;
    let app = init_openapi_route(app_state.clone(), &config);
    let cli = TestClient::new(app);

    // When / Expect the user name account with its own password
    let resp = login(&cli, "owl@example.com", "named-pass").await;
    resp.assert_status_is_ok();
    let token: String = resp.json().await.value().object().get("token").deserialize();
    assert_eq!(decode_token(&token, &config.jwt_secret)?.id, named.id.to_string());

    // When / Expect the email account once the user name password fails
    let resp = login(&cli, "owl@example.com", "mailed-pass").await;
    resp.assert_status_is_ok();
    let token: String = resp.json().await.value().object().get("token").deserialize();
    assert_eq!(decode_token(&token, &config.jwt_secret)?.id, mailed.id.to_string());

    // When / Expect neither password
    login(&cli, "owl@example.com", "wrong")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    Ok(())
}
