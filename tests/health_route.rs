use coach_api::routes::health::{HealthResponse, health_check, readiness};
use coach_api::test_support::{TestRocketBuilder, database_or_skip};
use rocket::http::Status;
use rocket::routes;

#[test]
fn health_endpoint_returns_ok() {
    let client = TestRocketBuilder::new()
        .mount_api_routes(routes![health_check])
        .blocking_client();

    let response = client.get("/api/v1/health").dispatch();
    assert_eq!(response.status(), Status::Ok);

    let payload: HealthResponse = response.into_json().expect("valid JSON payload");
    assert_eq!(payload.status, "ok");
}

#[tokio::test]
async fn readiness_reports_ready_with_database() {
    let Some(test_db) = database_or_skip("readiness test").await else {
        return;
    };

    let client = TestRocketBuilder::new()
        .manage_pg_pool(test_db.pool_clone())
        .mount_api_routes(routes![readiness])
        .async_client()
        .await;

    let response = client.get("/api/v1/health/ready").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    let payload: HealthResponse = response.into_json().await.expect("valid JSON payload");
    assert_eq!(payload.status, "ready");

    drop(client);
    test_db.close().await.expect("failed to drop test database");
}
