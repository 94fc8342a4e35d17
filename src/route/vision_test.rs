use std::sync::Arc;

use poem::{http::StatusCode, test::TestClient};
use serde_json::json;
use sqlx::PgPool;

use crate::{
    core::test_utils::{
        app_state_with_pool, generate_test_user, lazy_app_state, stub_providers, test_config,
        StubStorage,
    },
    init_openapi_route,
    repository::vision::get_visions_by_user,
};

#[tokio::test]
async fn test_generate_vision_with_stub_backends() -> anyhow::Result<()> {
    // Given
    let config = test_config();
    let (providers, _, images, storage, _) = stub_providers();
    let app = init_openapi_route(lazy_app_state(&config, providers), &config);
    let cli = TestClient::new(app);

    // When
    let resp = cli
        .post("/generate-vision/")
        .body_json(&json!({"vision": "a red fox", "size": "1024x1024"}))
        .send()
        .await;

    // Expect
    resp.assert_status_is_ok();
    let json = resp.json().await;
    let body = json.value().object();
    body.get("prompt").assert_string("a red fox");
    body.get("size").assert_string("1024x1024");
    body.get("background").assert_null();
    let public_id: String = body.get("public_id").deserialize();
    let image_url: String = body.get("image_url").deserialize();
    assert!(public_id.starts_with("psi-vision/"));
    assert_eq!(
        image_url,
        format!("https://res.stub.test/psi-cloud/image/upload/{}.png", public_id)
    );
    assert_eq!(images.calls().len(), 1);
    assert_eq!(storage.uploads().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_generate_vision_validation() -> anyhow::Result<()> {
    // Given
    let config = test_config();
    let (providers, _, images, ..) = stub_providers();
    let app = init_openapi_route(lazy_app_state(&config, providers), &config);
    let cli = TestClient::new(app);

    // When blank prompt
    let resp = cli
        .post("/generate-vision/")
        .body_json(&json!({"vision": "   "}))
        .send()
        .await;
    // Expect
    resp.assert_status(StatusCode::BAD_REQUEST);
    resp.assert_json(json!({"error": "No vision provided"})).await;

    // When unknown size
    let resp = cli
        .post("/generate-vision/")
        .body_json(&json!({"vision": "fox", "size": "640x480"}))
        .send()
        .await;
    // Expect
    resp.assert_status(StatusCode::BAD_REQUEST);
    resp.assert_json(json!({
        "error": "Invalid size. Allowed: 1024x1024, 1024x1536, 1536x1024, auto"
    }))
    .await;

    // When unknown background
    let resp = cli
        .post("/generate-vision/")
        .body_json(&json!({"vision": "fox", "background": "black"}))
        .send()
        .await;
    // Expect
    resp.assert_status(StatusCode::BAD_REQUEST);

    // When malformed body
    let resp = cli
        .post("/generate-vision/")
        .content_type("application/json")
        .body("vision=fox")
        .send()
        .await;
    // Expect
    resp.assert_status(StatusCode::BAD_REQUEST);
    resp.assert_json(json!({"error": "Invalid JSON body"})).await;

    assert!(images.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_generate_vision_upload_failure_is_502() -> anyhow::Result<()> {
    // Given
    let config = test_config();
    let (mut providers, ..) = stub_providers();
    providers.storage = Arc::new(StubStorage::rejecting());
    let app = init_openapi_route(lazy_app_state(&config, providers), &config);
    let cli = TestClient::new(app);

    // When
    let resp = cli
        .post("/generate-vision/")
        .body_json(&json!({"vision": "a red fox", "background": "transparent"}))
        .send()
        .await;

    // Expect
    resp.assert_status(StatusCode::BAD_GATEWAY);
    let json = resp.json().await;
    let body = json.value().object();
    body.get("error").assert_string("Cloudinary upload failed.");
    body.get("details")
        .object()
        .get("error")
        .object()
        .get("message")
        .assert_string("Invalid Signature");
    Ok(())
}

#[sqlx::test]
async fn test_generate_vision_is_saved_for_signed_in_user(pool: PgPool) -> anyhow::Result<()> {
    // Given
    let config = test_config();
    let (providers, ..) = stub_providers();
    let app_state = app_state_with_pool(&config, pool, providers);
    let mut redis_conn = app_state.redis_conn.get()?;
    let fox = generate_test_user(&app_state.db, &mut redis_conn, &config, "fox", "password", false)
        .await?;
    let app = init_openapi_route(app_state.clone(), &config);
    let cli = TestClient::new(app);

    // When anonymous
    let resp = cli
        .post("/generate-vision/")
        .body_json(&json!({"vision": "anonymous fox"}))
        .send()
        .await;
    resp.assert_status_is_ok();

    // When signed in
    let resp = cli
        .post("/generate-vision/")
        .header("authorization", format!("Bearer {}", fox.token))
        .body_json(&json!({"vision": "a red fox", "size": "1536x1024", "background": "white"}))
        .send()
        .await;

    // Expect
    resp.assert_status_is_ok();
    let json = resp.json().await;
    let public_id: String = json.value().object().get("public_id").deserialize();
    let mut tx = app_state.db.begin().await?;
    let visions = get_visions_by_user(&mut tx, &fox.user.id, 10).await?;
    assert_eq!(visions.len(), 1);
    assert_eq!(visions[0].prompt, "a red fox");
    assert_eq!(visions[0].image, public_id);
    assert_eq!(visions[0].meta.0["size"], json!("1536x1024"));
    assert_eq!(visions[0].meta.0["background"], json!("white"));
    assert_eq!(visions[0].meta.0["source"], json!("b64"));

    // When listing
    let resp = cli
        .get("/api/visions/")
        .header("authorization", format!("Bearer {}", fox.token))
        .send()
        .await;

    // Expect
    resp.assert_status_is_ok();
    let json = resp.json().await;
    let listed = json.value().object().get("visions").array();
    listed.assert_len(1);
    listed.get(0).object().get("public_id").assert_string(&public_id);

    // When listing without a session
    let resp = cli.get("/api/visions/").send().await;
    resp.assert_status(StatusCode::UNAUTHORIZED);
    Ok(())
}
