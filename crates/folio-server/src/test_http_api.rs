//! End-to-end tests against a live server on an ephemeral port.

use crate::{AppState, build_router};
use folio_core::config::{AdminSeed, FolioConfig};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use std::sync::Arc;
use tempfile::TempDir;

const ADMIN: &str = "admin";
const PASSWORD: &str = "correct-pw";

struct TestServer {
    base: String,
    client: Client,
    temp_dir: TempDir,
}

impl TestServer {
    async fn spawn() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let config = FolioConfig {
            root_dir: temp_dir.path().to_path_buf(),
            admins: vec![AdminSeed {
                username: ADMIN.to_string(),
                password: PASSWORD.to_string(),
            }],
            ..Default::default()
        };

        let state = Arc::new(AppState::from_config(&config).await.unwrap());
        let app = build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base: format!("http://{}", addr),
            client: Client::new(),
            temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn login(&self) -> String {
        let response = self
            .client
            .post(self.url("/admin/auth/login"))
            .json(&json!({"username": ADMIN, "password": PASSWORD}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = response.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    async fn mutate(&self, token: &str, content_type: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(&format!("/admin/content/{}", content_type)))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn backups(&self, token: &str, content_type: &str) -> Vec<Value> {
        let response = self
            .client
            .get(self.url(&format!("/admin/backups/{}", content_type)))
            .bearer_auth(token)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        response.json().await.unwrap()
    }

    async fn update_status(&self, content_type: &str, since: i64) -> Value {
        self.client
            .get(self.url(&format!(
                "/content/update-status/{}?lastUpdate={}",
                content_type, since
            )))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    }
}

#[tokio::test]
async fn test_health() {
    let server = TestServer::spawn().await;
    let body: Value = server
        .client
        .get(server.url("/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_footer_round_trip() {
    let server = TestServer::spawn().await;
    let token = server.login().await;

    let response = server
        .mutate(&token, "footer", json!({"copyright": "2024"}))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["type"], "footer");
    assert_eq!(body["fileName"], "footer.json");
    assert!(body["updatedAt"].is_string());
    assert!(server.backups(&token, "footer").await.is_empty());

    let response = server
        .mutate(&token, "footer", json!({"copyright": "2025"}))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let backups = server.backups(&token, "footer").await;
    assert_eq!(backups.len(), 1);
    let version_file = backups[0]["fileName"].as_str().unwrap();
    assert!(backups[0]["timestamp"].is_i64());
    assert!(backups[0]["createdAt"].is_string());

    let archived = tokio::fs::read(server.temp_dir.path().join("backups").join(version_file))
        .await
        .unwrap();
    let archived: Value = serde_json::from_slice(&archived).unwrap();
    assert_eq!(archived, json!({"copyright": "2024"}));

    let current: Value = server
        .client
        .get(server.url("/content/footer"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(current, json!({"copyright": "2025"}));

    let status = server.update_status("footer", 0).await;
    assert_eq!(status["hasUpdate"], true);
    assert_eq!(status["contentType"], "footer");

    let seen = status["timestamp"].as_i64().unwrap();
    let status = server.update_status("footer", seen).await;
    assert_eq!(status["hasUpdate"], false);
}

#[tokio::test]
async fn test_update_status_defaults_and_unknown_types() {
    let server = TestServer::spawn().await;

    let body: Value = server
        .client
        .get(server.url("/content/update-status/not-a-type"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["hasUpdate"], false);
    assert!(body["timestamp"].is_null());
}

#[tokio::test]
async fn test_admin_routes_require_bearer_token() {
    let server = TestServer::spawn().await;

    let response = server
        .client
        .post(server.url("/admin/content/footer"))
        .json(&json!({"copyright": "2024"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "unauthenticated");

    let response = server.mutate("not-a-token", "footer", json!({})).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = server
        .client
        .get(server.url("/admin/backups/footer"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // A broken body from an anonymous caller is still an auth failure
    let response = server
        .client
        .post(server.url("/admin/content/footer"))
        .header("content-type", "application/json")
        .body("{ broken")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = server
        .client
        .get(server.url("/admin/status"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_failures() {
    let server = TestServer::spawn().await;

    let response = server
        .client
        .post(server.url("/admin/auth/login"))
        .json(&json!({"username": ADMIN, "password": "wrong"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "invalid_credentials");

    let response = server
        .client
        .post(server.url("/admin/auth/login"))
        .body("not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_type_and_invalid_payloads() {
    let server = TestServer::spawn().await;
    let token = server.login().await;

    let response = server.mutate(&token, "blog", json!({"a": 1})).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "unknown_content_type");

    // A bare string is not a content document
    let response = server.mutate(&token, "about", json!("just text")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"][0]["field"], "$");

    let response = server
        .client
        .post(server.url("/admin/content/about"))
        .bearer_auth(&token)
        .header("content-type", "application/json")
        .body("{ broken")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = server
        .client
        .get(server.url("/content/about"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_restore_flow() {
    let server = TestServer::spawn().await;
    let token = server.login().await;

    for year in ["2023", "2024", "2025"] {
        let response = server
            .mutate(&token, "footer", json!({"copyright": year}))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let backups = server.backups(&token, "footer").await;
    assert_eq!(backups.len(), 2);
    let oldest = backups[1]["fileName"].as_str().unwrap().to_string();

    let response = server
        .client
        .post(server.url(&format!("/admin/restore/footer/{}", oldest)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["type"], "footer");
    assert_eq!(body["restoredFrom"], oldest.as_str());
    assert!(body["restoredAt"].is_string());

    let current: Value = server
        .client
        .get(server.url("/content/footer"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(current, json!({"copyright": "2023"}));
    assert_eq!(server.backups(&token, "footer").await.len(), 3);

    let archived: Value = server
        .client
        .get(server.url(&format!("/admin/backups/footer/{}", oldest)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(archived, json!({"copyright": "2023"}));

    let response = server
        .client
        .get(server.url("/admin/backups/footer/2001-01-01T00-00-00-000Z_footer.json"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = server
        .client
        .post(server.url("/admin/restore/footer/not-a-version"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = server
        .client
        .post(server.url(
            "/admin/restore/footer/2001-01-01T00-00-00-000Z_footer.json",
        ))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_logout_and_change_password() {
    let server = TestServer::spawn().await;
    let token = server.login().await;

    // Wrong current password is a bad request; the session survives it
    let response = server
        .client
        .post(server.url("/admin/auth/change-password"))
        .bearer_auth(&token)
        .json(&json!({"currentPassword": "not-it", "newPassword": "much-longer-pw"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "current_password_mismatch");
    assert_eq!(server.backups(&token, "footer").await.len(), 0);

    let response = server
        .client
        .post(server.url("/admin/auth/change-password"))
        .bearer_auth(&token)
        .json(&json!({"currentPassword": PASSWORD, "newPassword": "short"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = server
        .client
        .post(server.url("/admin/auth/change-password"))
        .bearer_auth(&token)
        .json(&json!({"currentPassword": PASSWORD, "newPassword": "much-longer-pw"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = server
        .client
        .post(server.url("/admin/auth/logout"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = server.mutate(&token, "footer", json!({"a": 1})).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = server
        .client
        .post(server.url("/admin/auth/login"))
        .json(&json!({"username": ADMIN, "password": "much-longer-pw"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_admin_status() {
    let server = TestServer::spawn().await;
    let token = server.login().await;

    let response = server.mutate(&token, "faq", json!({"items": []})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated_at = server.update_status("faq", 0).await["timestamp"]
        .as_i64()
        .unwrap();

    let response = server
        .client
        .get(server.url("/admin/status"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["activeSessions"], 1);
    assert_eq!(body["lastUpdates"]["faq"], updated_at);
    assert!(body["lastUpdates"].get("footer").is_none());
}
