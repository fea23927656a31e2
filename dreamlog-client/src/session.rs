//! Login state on top of the request pipeline.

use dreamlog_core::{LoginRequest, RegisterRequest, User};
use tracing::{debug, info, instrument, warn};

use crate::api::AuthApi;
use crate::client::ApiClient;
use crate::error::ApiError;

/// Fallback when login fails without a server message.
pub const LOGIN_FAILED_MESSAGE: &str = "Login failed";

/// Fallback when registration fails without a server message.
pub const REGISTER_FAILED_MESSAGE: &str = "Registration failed";

/// The signed-in user and the calls that change who that is.
#[derive(Debug, Clone)]
pub struct AuthSession {
    client: ApiClient,
    auth: AuthApi,
}

impl AuthSession {
    /// Creates a session over `client`'s credential store.
    pub fn new(client: ApiClient) -> Self {
        let auth = AuthApi::new(client.clone());
        Self { client, auth }
    }

    /// Logs in and stores the issued tokens and identity.
    ///
    /// # Errors
    ///
    /// Returns the pipeline error; [`ApiError::message_or`] with
    /// [`LOGIN_FAILED_MESSAGE`] gives the text to show.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<User, ApiError> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        match self.auth.login(&request).await {
            Ok(response) => {
                self.client.credentials().set_from_login(&response).await;
                info!(user_id = response.user.id, "Logged in");
                Ok(response.user)
            }
            Err(e) => {
                warn!(reason = %e.message_or(LOGIN_FAILED_MESSAGE), "Login failed");
                Err(e)
            }
        }
    }

    /// Registers an account and signs it in.
    ///
    /// # Errors
    ///
    /// Returns the pipeline error; [`ApiError::message_or`] with
    /// [`REGISTER_FAILED_MESSAGE`] gives the text to show.
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn register(&self, request: &RegisterRequest) -> Result<User, ApiError> {
        match self.auth.register(request).await {
            Ok(response) => {
                self.client.credentials().set_from_login(&response).await;
                info!(user_id = response.user.id, "Registered");
                Ok(response.user)
            }
            Err(e) => {
                warn!(reason = %e.message_or(REGISTER_FAILED_MESSAGE), "Registration failed");
                Err(e)
            }
        }
    }

    /// Ends the session.
    ///
    /// The server is told only if a token is held. Its answer does not
    /// matter: local state is cleared either way.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        if self.client.credentials().access_token().is_some() {
            if let Err(e) = self.auth.logout().await {
                debug!(error = %e, "Server logout failed, clearing local session anyway");
            }
        }
        self.client.credentials().clear().await;
        info!("Logged out");
    }

    /// Reloads the identity from `/auth/me`.
    ///
    /// # Errors
    ///
    /// Returns the pipeline error.
    pub async fn fetch_current_user(&self) -> Result<User, ApiError> {
        let user = self.auth.me().await?;
        self.client.credentials().set_identity(user.clone()).await;
        Ok(user)
    }

    /// Returns true if both a token and an identity are held.
    pub fn is_logged_in(&self) -> bool {
        let credential = self.client.credentials().snapshot();
        credential.access_token.is_some() && credential.identity.is_some()
    }

    /// Returns true if the signed-in user is an administrator.
    pub fn is_admin(&self) -> bool {
        self.client
            .credentials()
            .identity()
            .is_some_and(|u| u.is_admin())
    }

    /// Login name of the signed-in user.
    pub fn username(&self) -> Option<String> {
        self.client.credentials().identity().map(|u| u.username)
    }

    /// The underlying client.
    pub fn client(&self) -> &ApiClient {
        &self.client
    }
}
