//! `/auth` endpoints.

use dreamlog_core::{LoginRequest, LoginResponse, RegisterRequest, TokenPair, User};
use serde::Serialize;
use serde_json::json;
use tracing::instrument;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::request::{AUTH_LOGIN_PATH, AUTH_REFRESH_PATH, AUTH_REGISTER_PATH, ApiRequest};

/// Body of `PUT /auth/profile`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    /// New display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    /// New contact email.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// New avatar location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// Typed access to the authentication endpoints.
#[derive(Debug, Clone)]
pub struct AuthApi {
    client: ApiClient,
}

impl AuthApi {
    /// Wraps `client`.
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// `POST /auth/login`.
    ///
    /// # Errors
    ///
    /// Returns the pipeline error; a 401 here is never refreshed.
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        self.client.post(AUTH_LOGIN_PATH, request).await
    }

    /// `POST /auth/register`.
    ///
    /// # Errors
    ///
    /// Returns the pipeline error.
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn register(&self, request: &RegisterRequest) -> Result<LoginResponse, ApiError> {
        self.client.post(AUTH_REGISTER_PATH, request).await
    }

    /// `POST /auth/refresh`, trading `refresh_token` for a new pair.
    ///
    /// # Errors
    ///
    /// Returns the pipeline error.
    #[instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, ApiError> {
        self.client
            .post(AUTH_REFRESH_PATH, &json!({ "refreshToken": refresh_token }))
            .await
    }

    /// `POST /auth/logout`.
    ///
    /// # Errors
    ///
    /// Returns the pipeline error.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.client.send_empty(ApiRequest::post("/auth/logout")).await
    }

    /// `GET /auth/me`.
    ///
    /// # Errors
    ///
    /// Returns the pipeline error.
    #[instrument(skip(self))]
    pub async fn me(&self) -> Result<User, ApiError> {
        self.client.get("/auth/me").await
    }

    /// `PUT /auth/profile`.
    ///
    /// # Errors
    ///
    /// Returns the pipeline error.
    #[instrument(skip(self, update))]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, ApiError> {
        self.client.put("/auth/profile", update).await
    }

    /// `PUT /auth/password`.
    ///
    /// # Errors
    ///
    /// Returns the pipeline error.
    #[instrument(skip_all)]
    pub async fn change_password(&self, old_password: &str, new_password: &str) -> Result<(), ApiError> {
        let request = ApiRequest::put("/auth/password").with_json(&json!({
            "oldPassword": old_password,
            "newPassword": new_password,
        }))?;
        self.client.send_empty(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn api(server: &MockServer) -> AuthApi {
        AuthApi::new(
            ApiClient::builder(format!("{}/api", server.uri()))
                .build()
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_login_decodes_enveloped_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .and(body_json(json!({"username": "luna", "password": "pw"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 200,
                "data": {
                    "accessToken": "a1",
                    "refreshToken": "r1",
                    "tokenType": "Bearer",
                    "expiresIn": 86400,
                    "user": {"id": 3, "username": "luna", "email": "luna@example.com", "role": "USER"}
                }
            })))
            .mount(&server)
            .await;

        let response = api(&server)
            .await
            .login(&LoginRequest {
                username: "luna".to_string(),
                password: "pw".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(response.access_token, "a1");
        assert_eq!(response.user.id, 3);
    }

    #[tokio::test]
    async fn test_change_password_body() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/auth/password"))
            .and(body_json(json!({"oldPassword": "old", "newPassword": "new"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 200, "data": null})))
            .expect(1)
            .mount(&server)
            .await;

        api(&server).await.change_password("old", "new").await.unwrap();
    }

    #[test]
    fn test_profile_update_skips_unset_fields() {
        let update = ProfileUpdate {
            nickname: Some("Moon".to_string()),
            ..ProfileUpdate::default()
        };
        assert_eq!(serde_json::to_value(&update).unwrap(), json!({"nickname": "Moon"}));
    }
}
