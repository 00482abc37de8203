//! The remote authentication provider as seen by the session manager.
//!
//! The provider owns accounts, passwords and tokens. The crate only needs five
//! calls from it plus a stream of sign-in/sign-out notifications.

use crate::errors::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Account as reported by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderUser {
    /// Provider user id, also the profile row id
    pub id: String,
    /// Login email, when the provider exposes it
    pub email: Option<String>,
    /// Free-form metadata supplied at sign-up
    #[serde(default)]
    pub user_metadata: serde_json::Value,
}

impl ProviderUser {
    /// The `name` stored in the sign-up metadata, if any.
    #[must_use]
    pub fn metadata_name(&self) -> Option<String> {
        self.user_metadata
            .get("name")
            .and_then(serde_json::Value::as_str)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
    }

    /// Part of the email before `@`, or the whole id when there is no email.
    #[must_use]
    pub fn email_local_part(&self) -> String {
        self.email
            .as_deref()
            .and_then(|email| email.split('@').next())
            .filter(|local| !local.is_empty())
            .map_or_else(|| self.id.clone(), str::to_string)
    }
}

/// Tokens of a signed-in account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSession {
    /// Bearer token for API calls
    pub access_token: String,
    /// Token used to obtain a new access token
    pub refresh_token: String,
    /// Lifetime of the access token in seconds
    pub expires_in: i64,
    /// Usually `bearer`
    pub token_type: String,
    /// The signed-in account
    pub user: ProviderUser,
}

/// Result of a sign-up call.
#[derive(Debug, Clone, PartialEq)]
pub struct SignUpOutcome {
    /// The new account
    pub user: ProviderUser,
    /// Present when the provider signs the account in immediately,
    /// absent while email confirmation is pending
    pub session: Option<ProviderSession>,
}

/// Notification pushed by the provider whenever its session changes.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthEvent {
    /// A session was established for this account
    SignedIn(ProviderUser),
    /// The session ended
    SignedOut,
}

/// Operations consumed from the auth provider.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// The session the provider currently holds, if any.
    async fn get_session(&self) -> Result<Option<ProviderSession>>;

    /// Signs in with email and password.
    ///
    /// # Errors
    /// `Error::Auth` carrying the provider's message when the credentials are rejected.
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<ProviderSession>;

    /// Creates an account, passing `name` as user metadata.
    async fn sign_up(&self, name: &str, email: &str, password: &str) -> Result<SignUpOutcome>;

    /// Ends the current session.
    async fn sign_out(&self) -> Result<()>;

    /// Subscribes to session change notifications.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}
