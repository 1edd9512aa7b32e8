//! Login, registration and profile updates.

use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use codemart_core::{Registration, User};

use crate::api::AccountGateway;
use crate::client::{take_list, take_object, GatewayClient};
use crate::error::GatewayResult;

/// Body of `POST /users/login`.
#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<&'a str>,
}

#[async_trait]
impl AccountGateway for GatewayClient {
    async fn login(&self, email: &str, password: Option<&str>) -> GatewayResult<User> {
        let body = LoginRequest { email, password };
        let value: Value = self
            .send_json(Method::POST, &["users", "login"], &body)
            .await?;
        take_object(value, "user")
    }

    async fn register(&self, registration: &Registration) -> GatewayResult<User> {
        let value: Value = self
            .send_json(Method::POST, &["users", "register"], registration)
            .await?;
        take_object(value, "user")
    }

    async fn update_profile(&self, user_id: u64, patch: &Map<String, Value>) -> GatewayResult<()> {
        let id = user_id.to_string();
        let _: Value = self
            .send_json(Method::PUT, &["users", id.as_str()], patch)
            .await?;
        debug!(user_id, fields = patch.len(), "Profile update accepted");
        Ok(())
    }

    async fn user_by_email(&self, email: &str) -> GatewayResult<Option<User>> {
        let value: Value = self
            .get_json(&["users"], &[("email", email.to_string())])
            .await?;

        if value.is_object() && value.get("users").is_none() {
            return take_object(value, "user").map(Some);
        }
        let mut users: Vec<User> = take_list(value, "users")?;
        Ok(if users.is_empty() {
            None
        } else {
            Some(users.swap_remove(0))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::serve;
    use crate::error::GatewayError;
    use axum::extract::{Path, Query};
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use axum::routing::{get, post, put};
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    async fn login(Json(body): Json<Value>) -> Response {
        match body.get("password").and_then(Value::as_str) {
            Some("hunter2") => Json(json!({
                "success": true,
                "user": {
                    "id": 7, "username": "ada", "email": body["email"],
                    "avatar": "https://cdn.example.com/ada.png", "first_name": "Ada"
                }
            }))
            .into_response(),
            Some(_) => Json(json!({ "success": false, "message": "Incorrect password" }))
                .into_response(),
            None => (StatusCode::BAD_REQUEST, "password required").into_response(),
        }
    }

    async fn register(Json(body): Json<Value>) -> Json<Value> {
        Json(json!({ "id": 8, "username": body["username"], "email": body["email"] }))
    }

    async fn update(Path(id): Path<u64>, Json(patch): Json<Value>) -> Json<Value> {
        Json(json!({ "success": true, "id": id, "updated": patch }))
    }

    async fn find(Query(q): Query<HashMap<String, String>>) -> Json<Value> {
        match q.get("email").map(String::as_str) {
            Some("ada@example.com") => Json(json!([{ "id": 7, "email": "ada@example.com" }])),
            _ => Json(json!([])),
        }
    }

    fn router() -> Router {
        Router::new()
            .route("/api/users/login", post(login))
            .route("/api/users/register", post(register))
            .route("/api/users/{id}", put(update))
            .route("/api/users", get(find))
    }

    #[test]
    fn test_login_request_omits_missing_password() {
        let body = LoginRequest {
            email: "ada@example.com",
            password: None,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({ "email": "ada@example.com" })
        );
    }

    #[tokio::test]
    async fn test_login() {
        let client = serve(router()).await;

        let user = client
            .login("ada@example.com", Some("hunter2"))
            .await
            .unwrap();
        assert_eq!(user.id, 7);
        assert_eq!(user.avatar_url.as_deref(), Some("https://cdn.example.com/ada.png"));
        assert_eq!(user.display_name(), "Ada");

        let wrong = client
            .login("ada@example.com", Some("guess"))
            .await
            .unwrap_err();
        assert!(matches!(wrong, GatewayError::Rejected(m) if m == "Incorrect password"));

        let missing = client.login("ada@example.com", None).await.unwrap_err();
        assert!(matches!(missing, GatewayError::Http { status: 400, .. }));
    }

    #[tokio::test]
    async fn test_register_and_update() {
        let client = serve(router()).await;

        let user = client
            .register(&Registration {
                username: "grace".into(),
                email: "grace@example.com".into(),
                password: "secret".into(),
                ..Registration::default()
            })
            .await
            .unwrap();
        assert_eq!(user.id, 8);
        assert_eq!(user.username, "grace");

        let mut patch = Map::new();
        patch.insert("first_name".into(), json!("Grace"));
        client.update_profile(8, &patch).await.unwrap();
    }

    #[tokio::test]
    async fn test_user_by_email() {
        let client = serve(router()).await;
        let found = client.user_by_email("ada@example.com").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(7));
        assert!(client.user_by_email("nobody@example.com").await.unwrap().is_none());
    }
}
