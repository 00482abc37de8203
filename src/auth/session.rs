//! Session store for the signed-in user.
//!
//! [`SessionManager`] is the only writer of the current-user state. Consumers
//! read a [`SessionSnapshot`] or subscribe to changes through a `watch`
//! receiver. Every state-changing call takes a new generation number, and a
//! result computed under an older generation is dropped instead of applied.

use crate::{
    auth::{
        profile::{NewProfile, ProfileStore},
        provider::{AuthEvent, AuthProvider, ProviderUser},
    },
    entities::{UserRole, user},
    errors::{Error, Result},
};
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use tokio::{
    sync::{Mutex, broadcast, watch},
    task::JoinHandle,
};
use tracing::{debug, info, instrument, warn};

/// Where the session currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Nobody is signed in
    Unauthenticated,
    /// A provider call or profile lookup is in flight
    Loading,
    /// Signed in with this profile
    Authenticated(user::Model),
}

/// What consumers see: the state plus the last error message, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Current state
    pub state: SessionState,
    /// Message of the last failed login or registration
    pub error: Option<String>,
}

impl SessionSnapshot {
    const fn new(state: SessionState) -> Self {
        Self { state, error: None }
    }

    /// The signed-in profile, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&user::Model> {
        match &self.state {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    /// Whether someone is signed in.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self.state, SessionState::Authenticated(_))
    }
}

/// Editable profile fields. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    /// New display name
    pub name: Option<String>,
}

/// Owns the current-user state and drives it from the auth provider.
pub struct SessionManager {
    provider: Arc<dyn AuthProvider>,
    profiles: Arc<dyn ProfileStore>,
    state: watch::Sender<SessionSnapshot>,
    generation: AtomicU64,
    resolving: Mutex<()>,
}

impl SessionManager {
    /// Creates a manager in the `Loading` state; call [`Self::initialize`] next.
    #[must_use]
    pub fn new(provider: Arc<dyn AuthProvider>, profiles: Arc<dyn ProfileStore>) -> Self {
        let (state, _) = watch::channel(SessionSnapshot::new(SessionState::Loading));
        Self {
            provider,
            profiles,
            state,
            generation: AtomicU64::new(0),
            resolving: Mutex::new(()),
        }
    }

    /// Copy of the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    /// The signed-in profile, if any.
    #[must_use]
    pub fn current_user(&self) -> Option<user::Model> {
        self.state.borrow().user().cloned()
    }

    /// Picks up a session the provider already holds.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> Result<()> {
        let generation = self.begin();
        self.apply_if_current(generation, SessionSnapshot::new(SessionState::Loading));

        let session = match self.provider.get_session().await {
            Ok(session) => session,
            Err(e) => {
                warn!("Could not read the provider session: {e}");
                self.apply_if_current(generation, failed(&e));
                return Err(e);
            }
        };

        let Some(session) = session else {
            debug!("No existing session");
            self.apply_if_current(
                generation,
                SessionSnapshot::new(SessionState::Unauthenticated),
            );
            return Ok(());
        };

        let user = self.resolve_profile(&session.user).await;
        info!("Restored session for user {}", user.id);
        self.apply_if_current(
            generation,
            SessionSnapshot::new(SessionState::Authenticated(user)),
        );
        Ok(())
    }

    /// Signs in with email and password.
    ///
    /// On rejection the provider's message is kept in the snapshot's `error`
    /// and returned as `Error::Auth`.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<user::Model> {
        let generation = self.begin();
        self.apply_if_current(generation, SessionSnapshot::new(SessionState::Loading));

        let session = match self.provider.sign_in_with_password(email, password).await {
            Ok(session) => session,
            Err(e) => {
                warn!("Login rejected: {e}");
                self.apply_if_current(generation, failed(&e));
                return Err(e);
            }
        };

        let user = self.resolve_profile(&session.user).await;
        info!("User {} logged in", user.id);
        self.finish_sign_in(generation, user).await
    }

    /// Creates an account with `name` as metadata.
    ///
    /// Returns the profile when the provider signs the account in right away,
    /// `None` while confirmation is pending.
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Option<user::Model>> {
        let generation = self.begin();
        self.apply_if_current(generation, SessionSnapshot::new(SessionState::Loading));

        let outcome = match self.provider.sign_up(name, email, password).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Registration rejected: {e}");
                self.apply_if_current(generation, failed(&e));
                return Err(e);
            }
        };

        if outcome.session.is_none() {
            info!("Account {} awaits confirmation", outcome.user.id);
            self.apply_if_current(
                generation,
                SessionSnapshot::new(SessionState::Unauthenticated),
            );
            return Ok(None);
        }

        let user = self.resolve_profile(&outcome.user).await;
        self.finish_sign_in(generation, user).await.map(Some)
    }

    /// Signs out. Local state is cleared even when the provider call fails.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<()> {
        let generation = self.begin();
        let result = self.provider.sign_out().await;

        self.apply_if_current(
            generation,
            SessionSnapshot::new(SessionState::Unauthenticated),
        );

        if let Err(e) = &result {
            warn!("Provider sign-out failed, local session cleared anyway: {e}");
        }
        result
    }

    /// Saves profile changes, then applies the stored row locally.
    #[instrument(skip(self))]
    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<user::Model> {
        let current = self.current_user().ok_or(Error::Unauthenticated)?;
        let Some(name) = update.name else {
            return Ok(current);
        };

        let saved = self.profiles.update_profile_name(&current.id, &name).await?;

        // Only replace the user this write was for
        self.state.send_if_modified(|snapshot| match &mut snapshot.state {
            SessionState::Authenticated(user) if user.id == saved.id && *user != saved => {
                *user = saved.clone();
                true
            }
            _ => false,
        });
        Ok(saved)
    }

    /// Applies one provider notification. Returns whether the state changed.
    pub async fn handle_auth_event(&self, event: AuthEvent) -> bool {
        let generation = self.begin();
        match event {
            AuthEvent::SignedIn(provider_user) => {
                let user = self.resolve_profile(&provider_user).await;
                self.apply_if_current(
                    generation,
                    SessionSnapshot::new(SessionState::Authenticated(user)),
                )
            }
            AuthEvent::SignedOut => self.apply_if_current(
                generation,
                SessionSnapshot::new(SessionState::Unauthenticated),
            ),
        }
    }

    /// Applies notifications until the provider's channel closes.
    pub async fn listen(&self, mut events: broadcast::Receiver<AuthEvent>) {
        loop {
            match events.recv().await {
                Ok(event) => {
                    self.handle_auth_event(event).await;
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Missed {skipped} auth notifications");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Auth notification channel closed");
                    break;
                }
            }
        }
    }

    /// Subscribes to the provider and runs [`Self::listen`] on a new task.
    pub fn spawn_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let events = self.provider.subscribe();
        let manager = Arc::clone(self);
        tokio::spawn(async move { manager.listen(events).await })
    }

    fn begin(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn apply_if_current(&self, generation: u64, next: SessionSnapshot) -> bool {
        self.apply(generation, next).unwrap_or(false)
    }

    /// Replaces the snapshot when `generation` is still the latest.
    ///
    /// `None` means a newer operation owns the state; otherwise whether the
    /// snapshot changed.
    fn apply(&self, generation: u64, next: SessionSnapshot) -> Option<bool> {
        let mut outcome = None;
        self.state.send_if_modified(|current| {
            if self.generation.load(Ordering::SeqCst) != generation {
                debug!("Dropping session update from superseded generation {generation}");
                return false;
            }
            let changed = *current != next;
            if changed {
                *current = next;
            }
            outcome = Some(changed);
            changed
        });
        outcome
    }

    /// Publishes a signed-in user, or waits for the newer operation that
    /// superseded this one and reports what it settled on.
    async fn finish_sign_in(&self, generation: u64, user: user::Model) -> Result<user::Model> {
        let next = SessionSnapshot::new(SessionState::Authenticated(user.clone()));
        if self.apply(generation, next).is_some() {
            return Ok(user);
        }

        debug!("Sign-in for {} superseded, waiting for the session to settle", user.id);
        let mut changes = self.state.subscribe();
        let settled = changes
            .wait_for(|snapshot| snapshot.state != SessionState::Loading)
            .await
            .map_err(|_| Error::Unauthenticated)?
            .clone();

        match settled.user() {
            Some(current) if current.id == user.id => Ok(current.clone()),
            _ => Err(Error::Unauthenticated),
        }
    }

    /// Finds or creates the profile row for a provider account, degrading to
    /// a minimal in-memory user when the store cannot be reached.
    async fn resolve_profile(&self, account: &ProviderUser) -> user::Model {
        // One find-or-create at a time, or two callers race to insert the same row
        let _guard = self.resolving.lock().await;

        match self.profiles.find_profile(&account.id).await {
            Ok(Some(profile)) => return profile,
            Ok(None) => {}
            Err(e) => {
                warn!("Profile lookup failed for {}: {e}", account.id);
                return minimal_user(account);
            }
        }

        let profile = NewProfile {
            id: account.id.clone(),
            name: account
                .metadata_name()
                .unwrap_or_else(|| account.email_local_part()),
            email: account.email.clone().unwrap_or_default(),
            role: UserRole::User,
        };
        match self.profiles.create_profile(profile).await {
            Ok(created) => created,
            Err(e) => {
                // Another client may have inserted the row in the meantime
                if let Ok(Some(profile)) = self.profiles.find_profile(&account.id).await {
                    debug!("Profile for {} appeared after a failed insert", account.id);
                    return profile;
                }
                warn!("Profile creation failed for {}: {e}", account.id);
                minimal_user(account)
            }
        }
    }
}

fn failed(error: &Error) -> SessionSnapshot {
    let message = match error {
        Error::Auth { message } => message.clone(),
        other => other.to_string(),
    };
    SessionSnapshot {
        state: SessionState::Unauthenticated,
        error: Some(message),
    }
}

fn minimal_user(account: &ProviderUser) -> user::Model {
    user::Model {
        id: account.id.clone(),
        name: account.email_local_part(),
        email: account.email.clone().unwrap_or_default(),
        role: UserRole::User,
        created_at: chrono::DateTime::default(),
        updated_at: chrono::DateTime::default(),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::auth::provider::{ProviderSession, SignUpOutcome};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use tokio::sync::Notify;

    const PASSWORD: &str = "correct horse";

    fn account() -> ProviderUser {
        ProviderUser {
            id: "uid-ana".to_string(),
            email: Some("ana@acme.io".to_string()),
            user_metadata: json!({"name": "Ana"}),
        }
    }

    fn session() -> ProviderSession {
        ProviderSession {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_in: 3600,
            token_type: "bearer".to_string(),
            user: account(),
        }
    }

    #[derive(Default)]
    struct FakeProvider {
        existing: Option<ProviderSession>,
        auto_confirm: bool,
        fail_sign_out: bool,
        gate: Option<(Arc<Notify>, Arc<Notify>)>,
        events: Option<broadcast::Sender<AuthEvent>>,
    }

    #[async_trait]
    impl AuthProvider for FakeProvider {
        async fn get_session(&self) -> Result<Option<ProviderSession>> {
            if let Some((entered, release)) = &self.gate {
                entered.notify_one();
                release.notified().await;
            }
            Ok(self.existing.clone())
        }

        async fn sign_in_with_password(&self, _email: &str, password: &str) -> Result<ProviderSession> {
            if password == PASSWORD {
                if let Some(events) = &self.events {
                    let _ = events.send(AuthEvent::SignedIn(account()));
                }
                Ok(session())
            } else {
                Err(Error::Auth {
                    message: "Invalid login credentials".to_string(),
                })
            }
        }

        async fn sign_up(&self, _name: &str, _email: &str, _password: &str) -> Result<SignUpOutcome> {
            Ok(SignUpOutcome {
                user: account(),
                session: self.auto_confirm.then(session),
            })
        }

        async fn sign_out(&self) -> Result<()> {
            if self.fail_sign_out {
                return Err(Error::Auth {
                    message: "network down".to_string(),
                });
            }
            Ok(())
        }

        fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
            match &self.events {
                Some(sender) => sender.subscribe(),
                None => broadcast::channel(1).1,
            }
        }
    }

    #[derive(Default)]
    struct MemoryProfiles {
        rows: std::sync::Mutex<HashMap<String, user::Model>>,
        unavailable: bool,
        slow: bool,
    }

    impl MemoryProfiles {
        async fn round_trip(&self) {
            if self.slow {
                for _ in 0..3 {
                    tokio::task::yield_now().await;
                }
            }
        }
    }

    #[async_trait]
    impl ProfileStore for MemoryProfiles {
        async fn find_profile(&self, id: &str) -> Result<Option<user::Model>> {
            self.round_trip().await;
            if self.unavailable {
                return Err(Error::Config {
                    message: "store offline".to_string(),
                });
            }
            Ok(self.rows.lock().unwrap().get(id).cloned())
        }

        async fn create_profile(&self, profile: NewProfile) -> Result<user::Model> {
            self.round_trip().await;
            let row = user::Model {
                id: profile.id,
                name: profile.name,
                email: profile.email,
                role: profile.role,
                created_at: chrono::DateTime::default(),
                updated_at: chrono::DateTime::default(),
            };
            let mut rows = self.rows.lock().unwrap();
            if rows.contains_key(&row.id) {
                return Err(Error::Config {
                    message: format!("duplicate profile {}", row.id),
                });
            }
            rows.insert(row.id.clone(), row.clone());
            Ok(row)
        }

        async fn update_profile_name(&self, id: &str, name: &str) -> Result<user::Model> {
            let mut rows = self.rows.lock().unwrap();
            let row = rows.get_mut(id).ok_or_else(|| Error::not_found("User", id))?;
            row.name = name.to_string();
            Ok(row.clone())
        }
    }

    fn manager(provider: FakeProvider, profiles: MemoryProfiles) -> SessionManager {
        SessionManager::new(Arc::new(provider), Arc::new(profiles))
    }

    #[tokio::test]
    async fn test_initialize_without_session() -> Result<()> {
        let sessions = manager(FakeProvider::default(), MemoryProfiles::default());
        assert_eq!(sessions.snapshot().state, SessionState::Loading);

        sessions.initialize().await?;
        assert_eq!(sessions.snapshot().state, SessionState::Unauthenticated);

        Ok(())
    }

    #[tokio::test]
    async fn test_initialize_creates_missing_profile() -> Result<()> {
        let provider = FakeProvider {
            existing: Some(session()),
            ..Default::default()
        };
        let sessions = manager(provider, MemoryProfiles::default());

        sessions.initialize().await?;

        let user = sessions.current_user().unwrap();
        assert_eq!(user.id, "uid-ana");
        assert_eq!(user.name, "Ana");
        assert_eq!(user.role, UserRole::User);

        Ok(())
    }

    #[tokio::test]
    async fn test_initialize_falls_back_when_store_fails() -> Result<()> {
        let provider = FakeProvider {
            existing: Some(session()),
            ..Default::default()
        };
        let profiles = MemoryProfiles {
            unavailable: true,
            ..Default::default()
        };
        let sessions = manager(provider, profiles);

        sessions.initialize().await?;

        let user = sessions.current_user().unwrap();
        assert_eq!(user.name, "ana");
        assert_eq!(user.email, "ana@acme.io");
        assert_eq!(user.role, UserRole::User);

        Ok(())
    }

    #[tokio::test]
    async fn test_rejected_login_stays_unauthenticated() {
        let sessions = manager(FakeProvider::default(), MemoryProfiles::default());

        let result = sessions.login("ana@acme.io", "wrong").await;

        assert!(matches!(result, Err(Error::Auth { .. })));
        let snapshot = sessions.snapshot();
        assert_eq!(snapshot.state, SessionState::Unauthenticated);
        assert!(snapshot.error.is_some_and(|message| !message.is_empty()));
    }

    #[tokio::test]
    async fn test_login_clears_previous_error() -> Result<()> {
        let sessions = manager(FakeProvider::default(), MemoryProfiles::default());
        let _ = sessions.login("ana@acme.io", "wrong").await;

        let user = sessions.login("ana@acme.io", PASSWORD).await?;

        let snapshot = sessions.snapshot();
        assert_eq!(snapshot.error, None);
        assert_eq!(snapshot.user(), Some(&user));

        Ok(())
    }

    #[tokio::test]
    async fn test_register_pending_confirmation() -> Result<()> {
        let sessions = manager(FakeProvider::default(), MemoryProfiles::default());

        let registered = sessions.register("Ana", "ana@acme.io", PASSWORD).await?;

        assert!(registered.is_none());
        assert_eq!(sessions.snapshot().state, SessionState::Unauthenticated);

        Ok(())
    }

    #[tokio::test]
    async fn test_register_with_immediate_session() -> Result<()> {
        let provider = FakeProvider {
            auto_confirm: true,
            ..Default::default()
        };
        let sessions = manager(provider, MemoryProfiles::default());

        let registered = sessions.register("Ana", "ana@acme.io", PASSWORD).await?;

        assert_eq!(registered.unwrap().name, "Ana");
        assert!(sessions.snapshot().is_authenticated());

        Ok(())
    }

    #[tokio::test]
    async fn test_logout_clears_even_when_provider_fails() -> Result<()> {
        let provider = FakeProvider {
            fail_sign_out: true,
            ..Default::default()
        };
        let sessions = manager(provider, MemoryProfiles::default());
        sessions.login("ana@acme.io", PASSWORD).await?;

        let result = sessions.logout().await;

        assert!(result.is_err());
        assert_eq!(sessions.snapshot().state, SessionState::Unauthenticated);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_profile_requires_authentication() {
        let sessions = manager(FakeProvider::default(), MemoryProfiles::default());

        let result = sessions
            .update_profile(ProfileUpdate {
                name: Some("Bob".to_string()),
            })
            .await;

        assert!(matches!(result, Err(Error::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_update_profile_applies_saved_row() -> Result<()> {
        let sessions = manager(FakeProvider::default(), MemoryProfiles::default());
        sessions.login("ana@acme.io", PASSWORD).await?;

        let saved = sessions
            .update_profile(ProfileUpdate {
                name: Some("Ana María".to_string()),
            })
            .await?;

        assert_eq!(saved.name, "Ana María");
        assert_eq!(sessions.current_user(), Some(saved));

        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_signed_in_notifies_once() -> Result<()> {
        let sessions = manager(FakeProvider::default(), MemoryProfiles::default());
        sessions.initialize().await?;
        let mut changes = sessions.subscribe();
        changes.mark_unchanged();

        assert!(sessions.handle_auth_event(AuthEvent::SignedIn(account())).await);
        assert!(changes.has_changed().unwrap());
        changes.mark_unchanged();

        assert!(!sessions.handle_auth_event(AuthEvent::SignedIn(account())).await);
        assert!(!changes.has_changed().unwrap());
        assert!(sessions.snapshot().is_authenticated());

        assert!(sessions.handle_auth_event(AuthEvent::SignedOut).await);
        assert_eq!(sessions.snapshot().state, SessionState::Unauthenticated);

        Ok(())
    }

    #[tokio::test]
    async fn test_superseded_generation_is_dropped() {
        let sessions = manager(FakeProvider::default(), MemoryProfiles::default());

        let stale = sessions.begin();
        let current = sessions.begin();

        assert!(!sessions.apply_if_current(
            stale,
            SessionSnapshot::new(SessionState::Unauthenticated)
        ));
        assert_eq!(sessions.snapshot().state, SessionState::Loading);
        assert!(sessions.apply_if_current(
            current,
            SessionSnapshot::new(SessionState::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn test_late_initialize_does_not_override_sign_out() -> Result<()> {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let provider = FakeProvider {
            existing: Some(session()),
            gate: Some((Arc::clone(&entered), Arc::clone(&release))),
            ..Default::default()
        };
        let sessions = Arc::new(manager(provider, MemoryProfiles::default()));

        let pending = tokio::spawn({
            let sessions = Arc::clone(&sessions);
            async move { sessions.initialize().await }
        });
        entered.notified().await;

        sessions.handle_auth_event(AuthEvent::SignedOut).await;
        release.notify_one();
        pending.await.unwrap()?;

        assert_eq!(sessions.snapshot().state, SessionState::Unauthenticated);

        Ok(())
    }

    #[tokio::test]
    async fn test_login_with_listener_running_settles_on_stored_profile() -> Result<()> {
        let (sender, _) = broadcast::channel(4);
        let provider = FakeProvider {
            events: Some(sender),
            ..Default::default()
        };
        let profiles = MemoryProfiles {
            slow: true,
            ..Default::default()
        };
        let sessions = Arc::new(manager(provider, profiles));
        let listener = sessions.spawn_listener();

        let user = sessions.login("ana@acme.io", PASSWORD).await?;

        assert_eq!(user.name, "Ana");
        assert_eq!(sessions.snapshot().user(), Some(&user));

        // Let the listener finish handling the sign-in notification
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
        let settled = sessions.snapshot();
        assert_eq!(settled.user(), Some(&user));
        assert_eq!(settled.error, None);

        listener.abort();
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_resolution_creates_one_profile() {
        let profiles = MemoryProfiles {
            slow: true,
            ..Default::default()
        };
        let sessions = manager(FakeProvider::default(), profiles);
        let first = account();
        let second = account();

        let (a, b) = tokio::join!(
            sessions.resolve_profile(&first),
            sessions.resolve_profile(&second)
        );

        assert_eq!(a, b);
        assert_eq!(a.name, "Ana");
    }

    #[tokio::test]
    async fn test_listener_follows_provider_events() {
        let (sender, _) = broadcast::channel(4);
        let provider = FakeProvider {
            events: Some(sender.clone()),
            ..Default::default()
        };
        let sessions = Arc::new(manager(provider, MemoryProfiles::default()));
        let mut changes = sessions.subscribe();

        let listener = sessions.spawn_listener();
        sender.send(AuthEvent::SignedIn(account())).unwrap();

        let snapshot = changes
            .wait_for(SessionSnapshot::is_authenticated)
            .await
            .unwrap()
            .clone();
        assert_eq!(snapshot.user().unwrap().id, "uid-ana");

        listener.abort();
    }
}
