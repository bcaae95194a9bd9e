use std::sync::Arc;

use axum::{middleware, routing::get, Extension, Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::{
    handler::{
        auth::auth_handler,
        exchange::exchange_handler,
        snapshot::snapshot_handler,
        users::users_handler,
        websites::{marketplace_handler, websites_handler},
    },
    middleware::auth,
    AppState,
};

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "message": "Server is running"
    }))
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let protected_routes = Router::new()
        .merge(marketplace_handler())
        .merge(exchange_handler())
        .merge(snapshot_handler())
        .layer(middleware::from_fn(auth));

    let api_route = Router::new()
        .nest("/auth", auth_handler())
        .nest("/users", users_handler().layer(middleware::from_fn(auth)))
        .nest("/websites", websites_handler().layer(middleware::from_fn(auth)))
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(Extension(app_state));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_route)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::test_support::test_state;

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value, Response<()>) {
        let response = app.clone().oneshot(request).await.unwrap();
        let (parts, body) = response.into_parts();
        let bytes = to_bytes(body, usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (parts.status, json, Response::from_parts(parts, ()))
    }

    fn get(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    fn post(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn demo_token(app: &Router) -> String {
        let (status, body, _) = send(app, post("/api/auth/demo", None, json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = create_router(test_state(1.0).await);
        let (status, body, _) = send(&app, get("/health", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn protected_routes_need_a_session() {
        let app = create_router(test_state(1.0).await);

        let (status, body, _) = send(&app, get("/api/users/me", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["status"], "fail");

        let (status, _, _) = send(&app, get("/api/marketplace", Some("garbage"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn demo_login_issues_cookie_and_token() {
        let app = create_router(test_state(1.0).await);

        let (status, body, response) = send(&app, post("/api/auth/demo", None, json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["user"]["email"], "demo@linkauthority.app");
        assert_eq!(body["data"]["user"]["points"], 100);

        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap();
        assert!(cookie.starts_with("token="));
        assert!(cookie.contains("HttpOnly"));

        // Logging in again reuses the account.
        let token = body["token"].as_str().unwrap();
        let again = demo_token(&app).await;
        let (_, first, _) = send(&app, get("/api/users/me", Some(token))).await;
        let (_, second, _) = send(&app, get("/api/users/me", Some(&again))).await;
        assert_eq!(first["data"]["user"]["id"], second["data"]["user"]["id"]);
    }

    #[tokio::test]
    async fn session_cookie_is_accepted() {
        let app = create_router(test_state(1.0).await);
        let token = demo_token(&app).await;

        let request = Request::builder()
            .uri("/api/users/me")
            .header(header::COOKIE, format!("token={}", token))
            .body(Body::empty())
            .unwrap();
        let (status, body, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["user"]["name"], "Demo User");
    }

    #[tokio::test]
    async fn google_login_is_unavailable_without_client_id() {
        let app = create_router(test_state(1.0).await);
        let (status, _, _) = send(
            &app,
            post("/api/auth/google", None, json!({ "credential": "a.b.c" })),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn exchange_requires_a_registered_site() {
        let app = create_router(test_state(1.0).await);
        let token = demo_token(&app).await;

        let (_, market, _) = send(&app, get("/api/marketplace", Some(&token))).await;
        let target = market["data"]["listings"][0]["id"].clone();

        let (status, body, _) = send(
            &app,
            post("/api/exchanges", Some(&token), json!({ "targetWebsiteId": target })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "You must add a site first!");
    }

    #[tokio::test]
    async fn register_then_exchange_credits_the_provider() {
        let app = create_router(test_state(1.0).await);
        let token = demo_token(&app).await;

        let (status, body, _) = send(
            &app,
            post("/api/websites", Some(&token), json!({ "domain": "https://www.demo-site.dev/" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["website"]["domain"], "demo-site.dev");
        let da = body["data"]["website"]["domainAuthority"].as_i64().unwrap();

        let (status, _, _) = send(
            &app,
            post("/api/websites", Some(&token), json!({ "domain": "demo-site.dev" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, market, _) = send(&app, get("/api/marketplace", Some(&token))).await;
        assert_eq!(market["data"]["results"], 3);
        assert_eq!(market["data"]["lowTradingPower"], false);
        let techcrunch = market["data"]["listings"]
            .as_array()
            .unwrap()
            .iter()
            .find(|l| l["domain"] == "techcrunch.com")
            .unwrap()
            .clone();

        let (status, body, _) = send(
            &app,
            post(
                "/api/exchanges",
                Some(&token),
                json!({ "targetWebsiteId": techcrunch["id"] }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["transaction"]["status"], "verified");
        assert_eq!(body["data"]["user"]["points"], 100 + da);

        let (_, history, _) = send(&app, get("/api/transactions", Some(&token))).await;
        assert_eq!(history["results"], 1);
        assert_eq!(history["data"][0]["direction"], "earned");
        assert_eq!(history["data"][0]["signedPoints"], da);

        let (_, dashboard, _) = send(&app, get("/api/websites/mine", Some(&token))).await;
        assert_eq!(dashboard["data"]["stats"]["activeSites"], 1);
        assert_eq!(dashboard["data"]["stats"]["totalExchanges"], 1);
    }

    #[tokio::test]
    async fn failed_verification_returns_reason() {
        let app = create_router(test_state(0.0).await);
        let token = demo_token(&app).await;

        send(&app, post("/api/websites", Some(&token), json!({ "domain": "demo-site.dev" }))).await;
        let (_, market, _) = send(&app, get("/api/marketplace", Some(&token))).await;
        let target = market["data"]["listings"][0]["id"].clone();

        let (status, body, _) = send(
            &app,
            post("/api/exchanges", Some(&token), json!({ "targetWebsiteId": target })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["message"], "Target URL not found on source page.");

        let (_, history, _) = send(&app, get("/api/transactions", Some(&token))).await;
        assert_eq!(history["data"][0]["status"], "failed");
        assert_eq!(history["data"][0]["signedPoints"], 0);
    }

    #[tokio::test]
    async fn malformed_bodies_get_the_error_envelope() {
        let app = create_router(test_state(1.0).await);
        let token = demo_token(&app).await;

        let (status, body, _) = send(
            &app,
            post("/api/exchanges", Some(&token), json!({ "targetWebsiteId": "not-a-uuid" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "fail");
        assert!(body["message"].as_str().unwrap().contains("targetWebsiteId"));

        let request = Request::builder()
            .method("POST")
            .uri("/api/websites")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::from("{\"domain\": "))
            .unwrap();
        let (status, body, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "fail");

        let request = Request::builder()
            .method("POST")
            .uri("/api/auth/google")
            .body(Body::from("credential=abc"))
            .unwrap();
        let (status, body, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "fail");
    }

    #[tokio::test]
    async fn exported_snapshot_restores_through_startup() {
        let app = create_router(test_state(1.0).await);
        let token = demo_token(&app).await;
        let (_, body, _) = send(&app, get("/api/snapshot", Some(&token))).await;

        let path = std::env::temp_dir().join(format!("linkauthority-export-{}.json", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, body["data"].to_string()).await.unwrap();

        let fresh = crate::db::db::DBClient::in_memory().await.unwrap();
        let origin = crate::service::bootstrap::prepare_store(&fresh, Some(path.as_path())).await;
        let _ = tokio::fs::remove_file(&path).await;

        assert_eq!(origin.unwrap(), crate::service::bootstrap::StoreOrigin::Snapshot);
        let restored = crate::db::userdb::UserExt::get_users(&fresh).await.unwrap();
        assert_eq!(restored.len(), 4);
        assert!(restored.iter().any(|u| u.email == "demo@linkauthority.app"));
    }

    #[tokio::test]
    async fn snapshot_exports_the_store() {
        let app = create_router(test_state(1.0).await);
        let token = demo_token(&app).await;

        let (status, body, _) = send(&app, get("/api/snapshot", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        let db = &body["data"]["linkauthority_db"];
        assert_eq!(db["users"].as_array().unwrap().len(), 4);
        assert_eq!(db["websites"].as_array().unwrap().len(), 3);
        assert!(db["transactions"].as_array().unwrap().is_empty());
    }
}
