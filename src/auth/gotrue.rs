//! HTTP auth provider speaking the GoTrue REST API (`/auth/v1/...`).
//!
//! The current session is kept in memory and every change is broadcast as an
//! [`AuthEvent`] so the session manager can follow along.

use crate::{
    auth::provider::{AuthEvent, AuthProvider, ProviderSession, ProviderUser, SignUpOutcome},
    config::auth::AuthConfig,
    errors::{Error, Result},
};
use async_trait::async_trait;
use reqwest::{Client, Response};
use std::sync::{PoisonError, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, warn};

const EVENT_CAPACITY: usize = 16;

/// Auth provider backed by a GoTrue-compatible HTTP service.
pub struct GoTrueProvider {
    config: AuthConfig,
    http_client: Client,
    current_session: RwLock<Option<ProviderSession>>,
    events: broadcast::Sender<AuthEvent>,
}

impl GoTrueProvider {
    /// Creates a provider with no active session.
    #[must_use]
    pub fn new(config: AuthConfig, http_client: Client) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            config,
            http_client,
            current_session: RwLock::new(None),
            events,
        }
    }

    /// Creates a provider that starts from a previously persisted session.
    #[must_use]
    pub fn with_session(config: AuthConfig, http_client: Client, session: ProviderSession) -> Self {
        let provider = Self::new(config, http_client);
        provider.store_session(Some(session));
        provider
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.config.url)
    }

    fn store_session(&self, session: Option<ProviderSession>) {
        let mut guard = self
            .current_session
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = session;
    }

    fn stored_session(&self) -> Option<ProviderSession> {
        self.current_session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn notify(&self, event: AuthEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn establish(&self, session: ProviderSession) -> ProviderSession {
        self.store_session(Some(session.clone()));
        self.notify(AuthEvent::SignedIn(session.user.clone()));
        session
    }
}

/// Turns a non-success response into `Error::Auth` with the provider's message.
async fn rejection(response: Response) -> Error {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = provider_message(&body).unwrap_or_else(|| {
        if body.trim().is_empty() {
            status.to_string()
        } else {
            body.trim().to_string()
        }
    });
    debug!("Auth provider rejected request with {status}: {message}");
    Error::Auth { message }
}

/// Extracts the human-readable message from a GoTrue error body.
fn provider_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["msg", "error_description", "message", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(serde_json::Value::as_str))
        .filter(|message| !message.trim().is_empty())
        .map(str::to_string)
}

#[async_trait]
impl AuthProvider for GoTrueProvider {
    async fn get_session(&self) -> Result<Option<ProviderSession>> {
        Ok(self.stored_session())
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<ProviderSession> {
        let payload = serde_json::json!({
            "email": email,
            "password": password,
        });

        let response = self
            .http_client
            .post(self.endpoint("token?grant_type=password"))
            .header("apikey", &self.config.anon_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        let session: ProviderSession = response.json().await?;
        Ok(self.establish(session))
    }

    async fn sign_up(&self, name: &str, email: &str, password: &str) -> Result<SignUpOutcome> {
        let payload = serde_json::json!({
            "email": email,
            "password": password,
            "data": { "name": name },
        });

        let response = self
            .http_client
            .post(self.endpoint("signup"))
            .header("apikey", &self.config.anon_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        // With auto-confirm the body is a session, otherwise just the new user
        let body: serde_json::Value = response.json().await?;
        if body.get("access_token").is_some() {
            let session: ProviderSession = serde_json::from_value(body)?;
            let session = self.establish(session);
            return Ok(SignUpOutcome {
                user: session.user.clone(),
                session: Some(session),
            });
        }

        let user: ProviderUser = serde_json::from_value(body)?;
        Ok(SignUpOutcome {
            user,
            session: None,
        })
    }

    async fn sign_out(&self) -> Result<()> {
        let Some(session) = self.stored_session() else {
            self.notify(AuthEvent::SignedOut);
            return Ok(());
        };

        let result = self
            .http_client
            .post(self.endpoint("logout"))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(&session.access_token)
            .send()
            .await;

        // The local session ends regardless of what the server says
        self.store_session(None);
        self.notify(AuthEvent::SignedOut);

        let response = result?;
        if !response.status().is_success() {
            let error = rejection(response).await;
            warn!("Remote sign-out failed: {error}");
            return Err(error);
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}
