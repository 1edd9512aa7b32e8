//! # Session Store
//!
//! At most one signed-in user, mirrored to local storage.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   ┌──────────┐   login / register    ┌──────────────┐                   │
//! │   │ Signed   │──────────────────────►│  Signed in   │◄──┐               │
//! │   │ out      │◄──────────────────────│  (User)      │   │ update_user_  │
//! │   └──────────┘        logout         └──────────────┘───┘ profile       │
//! │                                                           (merge)       │
//! │                                                                         │
//! │  Gateway failures propagate and leave the session untouched.            │
//! │  Storage failures are logged; hydration failures mean "signed out".     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Profile Merge
//! A profile update is merged into a copy of the local user before the
//! gateway is called, so a patch that doesn't fit the user shape is rejected
//! without reaching the backend. Once the gateway accepts it the copy becomes
//! the session, without re-fetching the canonical record. Keys that don't
//! match a known field are kept in [`User::extra`].

use serde_json::{Map, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use codemart_core::validation::validate_email;
use codemart_core::{Registration, User, ValidationError};
use codemart_db::{SnapshotRepository, SESSION_KEY};
use codemart_gateway::{AccountGateway, GatewayError};

pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Debug, Error)]
pub enum SessionError {
    /// Profile update without a signed-in user.
    #[error("Not logged in")]
    NotLoggedIn,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Resets the loading flag when dropped.
struct LoadingGuard<'a>(&'a AtomicBool);

impl<'a> LoadingGuard<'a> {
    fn start(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        LoadingGuard(flag)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct SessionStore {
    user: Mutex<Option<User>>,
    loading: AtomicBool,
    accounts: Arc<dyn AccountGateway>,
    snapshots: SnapshotRepository,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("loading", &self.loading.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    pub fn new(accounts: Arc<dyn AccountGateway>, snapshots: SnapshotRepository) -> Self {
        SessionStore {
            user: Mutex::new(None),
            loading: AtomicBool::new(false),
            accounts,
            snapshots,
        }
    }

    /// Restores the session from storage. Any failure means signed out.
    pub async fn hydrate(accounts: Arc<dyn AccountGateway>, snapshots: SnapshotRepository) -> Self {
        let user = match snapshots.get::<User>(SESSION_KEY).await {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "Discarding unreadable session snapshot");
                None
            }
        };

        debug!(signed_in = user.is_some(), "Session hydrated");
        let store = Self::new(accounts, snapshots);
        *store.user.lock().await = user;
        store
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub async fn current_user(&self) -> Option<User> {
        self.user.lock().await.clone()
    }

    pub async fn is_logged_in(&self) -> bool {
        self.user.lock().await.is_some()
    }

    /// True while a gateway call is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    // =========================================================================
    // Identity Operations
    // =========================================================================

    /// Signs in. On failure the current session is left as it was.
    pub async fn login(&self, email: &str, password: Option<&str>) -> SessionResult<User> {
        validate_email(email)?;

        let user = {
            let _loading = LoadingGuard::start(&self.loading);
            self.accounts.login(email.trim(), password).await?
        };

        info!(user_id = user.id, "Logged in");
        self.replace(Some(user.clone())).await;
        Ok(user)
    }

    /// Creates an account and signs in as it.
    pub async fn register(&self, registration: &Registration) -> SessionResult<User> {
        validate_email(&registration.email)?;
        if registration.username.trim().is_empty() {
            return Err(ValidationError::required("username").into());
        }

        let user = {
            let _loading = LoadingGuard::start(&self.loading);
            self.accounts.register(registration).await?
        };

        info!(user_id = user.id, "Registered");
        self.replace(Some(user.clone())).await;
        Ok(user)
    }

    /// Merges `patch` into a copy of the local user, pushes it to the
    /// gateway, then commits the copy.
    ///
    /// ## Errors
    /// - NotLoggedIn: no session, or it changed while the request was in flight
    /// - Validation: the patch doesn't fit the user shape (gateway not called)
    /// - Gateway: the backend failed; the session is unchanged
    pub async fn update_user_profile(&self, patch: &Map<String, Value>) -> SessionResult<User> {
        let merged = {
            let guard = self.user.lock().await;
            let mut merged = guard.clone().ok_or(SessionError::NotLoggedIn)?;
            merged
                .merge_profile(patch)
                .map_err(|e| ValidationError::invalid_format("profile", e.to_string()))?;
            merged
        };

        {
            let _loading = LoadingGuard::start(&self.loading);
            self.accounts.update_profile(merged.id, patch).await?;
        }

        let mut guard = self.user.lock().await;
        // Signed out (or switched user) while the request was in flight
        if guard.as_ref().map(|u| u.id) != Some(merged.id) {
            return Err(SessionError::NotLoggedIn);
        }

        *guard = Some(merged.clone());
        self.persist(&guard).await;

        debug!(user_id = merged.id, fields = patch.len(), "Profile merged");
        Ok(merged)
    }

    /// Signs out and deletes the stored session.
    pub async fn logout(&self) {
        self.replace(None).await;
        info!("Logged out");
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn replace(&self, user: Option<User>) {
        let mut guard = self.user.lock().await;
        *guard = user;
        self.persist(&guard).await;
    }

    async fn persist(&self, user: &Option<User>) {
        let result = match user {
            Some(user) => self.snapshots.put(SESSION_KEY, user).await,
            None => self.snapshots.delete(SESSION_KEY).await.map(|_| ()),
        };
        if let Err(e) = result {
            warn!(error = %e, "Failed to persist session");
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use codemart_db::{Database, DbConfig};
    use codemart_gateway::GatewayResult;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    /// Accepts password "hunter2", counts every call and records profile
    /// updates.
    #[derive(Default)]
    struct FakeAccounts {
        calls: AtomicUsize,
        updates: AtomicUsize,
        fail_updates: bool,
    }

    fn ada() -> User {
        serde_json::from_value(json!({
            "id": 7, "username": "ada", "email": "ada@example.com", "first_name": "Ada"
        }))
        .unwrap()
    }

    #[async_trait]
    impl AccountGateway for FakeAccounts {
        async fn login(&self, email: &str, password: Option<&str>) -> GatewayResult<User> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            check_password(email, password)
        }

        async fn register(&self, registration: &Registration) -> GatewayResult<User> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(User {
                id: 8,
                username: registration.username.clone(),
                email: registration.email.clone(),
                avatar_url: None,
                extra: Map::new(),
            })
        }

        async fn update_profile(&self, _user_id: u64, _patch: &Map<String, Value>) -> GatewayResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.updates.fetch_add(1, Ordering::SeqCst);
            if self.fail_updates {
                return Err(GatewayError::http(500, "boom"));
            }
            Ok(())
        }

        async fn user_by_email(&self, _email: &str) -> GatewayResult<Option<User>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        }
    }

    fn check_password(email: &str, password: Option<&str>) -> GatewayResult<User> {
        match password {
            Some("hunter2") if email == "ada@example.com" => Ok(ada()),
            _ => Err(GatewayError::Rejected("Incorrect password".into())),
        }
    }

    /// Holds every login until the test releases it.
    #[derive(Default)]
    struct GatedAccounts {
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl AccountGateway for GatedAccounts {
        async fn login(&self, email: &str, password: Option<&str>) -> GatewayResult<User> {
            self.entered.notify_one();
            self.release.notified().await;
            check_password(email, password)
        }

        async fn register(&self, _registration: &Registration) -> GatewayResult<User> {
            Err(GatewayError::http(501, "not implemented"))
        }

        async fn update_profile(&self, _user_id: u64, _patch: &Map<String, Value>) -> GatewayResult<()> {
            Err(GatewayError::http(501, "not implemented"))
        }

        async fn user_by_email(&self, _email: &str) -> GatewayResult<Option<User>> {
            Ok(None)
        }
    }

    async fn setup(accounts: FakeAccounts) -> (Database, SessionStore) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let store = SessionStore::new(Arc::new(accounts), db.snapshots());
        (db, store)
    }

    #[tokio::test]
    async fn test_login_and_rehydrate_without_gateway() {
        let (db, store) = setup(FakeAccounts::default()).await;

        let user = store.login("ada@example.com", Some("hunter2")).await.unwrap();
        assert_eq!(user.id, 7);
        assert!(!store.is_loading());

        let accounts = Arc::new(FakeAccounts::default());
        let restored = SessionStore::hydrate(accounts.clone(), db.snapshots()).await;
        assert_eq!(restored.current_user().await, Some(ada()));
        assert!(restored.is_logged_in().await);
        assert_eq!(accounts.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_loading_flag_spans_gateway_call() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let accounts = Arc::new(GatedAccounts::default());
        let store = SessionStore::new(accounts.clone(), db.snapshots());

        for (password, succeeds) in [("hunter2", true), ("guess", false)] {
            assert!(!store.is_loading());

            let observe = async {
                accounts.entered.notified().await;
                let during = store.is_loading();
                accounts.release.notify_one();
                during
            };
            let (result, during) =
                tokio::join!(store.login("ada@example.com", Some(password)), observe);

            assert!(during, "loading while the login is in flight");
            assert_eq!(result.is_ok(), succeeds);
            assert!(!store.is_loading());
        }
    }

    #[tokio::test]
    async fn test_failed_login_keeps_session() {
        let (_db, store) = setup(FakeAccounts::default()).await;
        store.login("ada@example.com", Some("hunter2")).await.unwrap();

        let err = store.login("ada@example.com", Some("guess")).await.unwrap_err();
        assert!(matches!(err, SessionError::Gateway(GatewayError::Rejected(_))));
        assert!(!store.is_loading());
        assert_eq!(store.current_user().await.map(|u| u.id), Some(7));
    }

    #[tokio::test]
    async fn test_login_validates_email() {
        let (_db, store) = setup(FakeAccounts::default()).await;
        let err = store.login("not-an-email", Some("hunter2")).await.unwrap_err();
        assert!(matches!(err, SessionError::Validation(_)));
    }

    #[tokio::test]
    async fn test_register_signs_in() {
        let (db, store) = setup(FakeAccounts::default()).await;
        let user = store
            .register(&Registration {
                username: "grace".into(),
                email: "grace@example.com".into(),
                password: "secret".into(),
                ..Registration::default()
            })
            .await
            .unwrap();

        assert_eq!(user.id, 8);
        assert!(store.is_logged_in().await);
        assert!(db.snapshots().exists(SESSION_KEY).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_profile_requires_session() {
        let (_db, store) = setup(FakeAccounts::default()).await;
        let err = store.update_user_profile(&Map::new()).await.unwrap_err();
        assert!(matches!(err, SessionError::NotLoggedIn));
    }

    #[tokio::test]
    async fn test_update_profile_merges_optimistically() {
        let (db, store) = setup(FakeAccounts::default()).await;
        store.login("ada@example.com", Some("hunter2")).await.unwrap();

        let mut patch = Map::new();
        patch.insert("last_name".into(), json!("Lovelace"));
        patch.insert("avatar".into(), json!("https://cdn.example.com/ada.png"));
        patch.insert("nickname".into(), json!("countess"));

        let user = store.update_user_profile(&patch).await.unwrap();
        assert_eq!(user.display_name(), "Ada Lovelace");
        assert_eq!(user.avatar_url.as_deref(), Some("https://cdn.example.com/ada.png"));
        assert_eq!(user.extra.get("nickname"), Some(&json!("countess")));

        let stored: User = db.snapshots().get(SESSION_KEY).await.unwrap().unwrap();
        assert_eq!(stored, user);
    }

    #[tokio::test]
    async fn test_ill_typed_patch_rejected_before_gateway() {
        let accounts = Arc::new(FakeAccounts::default());
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let store = SessionStore::new(accounts.clone(), db.snapshots());
        store.login("ada@example.com", Some("hunter2")).await.unwrap();

        let mut patch = Map::new();
        patch.insert("username".into(), json!(123));

        let err = store.update_user_profile(&patch).await.unwrap_err();
        assert!(matches!(err, SessionError::Validation(_)));
        assert_eq!(accounts.updates.load(Ordering::SeqCst), 0);
        assert_eq!(store.current_user().await, Some(ada()));

        let stored: User = db.snapshots().get(SESSION_KEY).await.unwrap().unwrap();
        assert_eq!(stored, ada());
    }

    #[tokio::test]
    async fn test_failed_update_leaves_session() {
        let (_db, store) = setup(FakeAccounts {
            fail_updates: true,
            ..FakeAccounts::default()
        })
        .await;
        store.login("ada@example.com", Some("hunter2")).await.unwrap();

        let mut patch = Map::new();
        patch.insert("first_name".into(), json!("Augusta"));
        assert!(store.update_user_profile(&patch).await.is_err());
        assert!(!store.is_loading());
        assert_eq!(store.current_user().await, Some(ada()));
    }

    #[tokio::test]
    async fn test_logout_deletes_entry() {
        let (db, store) = setup(FakeAccounts::default()).await;
        store.login("ada@example.com", Some("hunter2")).await.unwrap();

        store.logout().await;
        assert!(store.current_user().await.is_none());
        assert!(!db.snapshots().exists(SESSION_KEY).await.unwrap());
    }

    #[tokio::test]
    async fn test_corrupt_session_hydrates_signed_out() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.snapshots().put_raw(SESSION_KEY, "[1, 2").await.unwrap();

        let store = SessionStore::hydrate(Arc::new(FakeAccounts::default()), db.snapshots()).await;
        assert!(store.current_user().await.is_none());
    }
}
