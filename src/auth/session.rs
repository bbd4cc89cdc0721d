//! Session store for AlumniConnect.
//!
//! The store is the single writer of "who is signed in and what is their
//! profile". Every operation that changes it holds `op_lock` across its
//! remote calls, so a slow response can never overwrite a newer state.
//! Readers take snapshots or subscribe to changes.

use std::fmt;
use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::auth::registration::SignUpRequest;
use crate::auth::validation::validate_credentials;
use crate::db::{Profile, ProfileRepository};
use crate::remote::{AuthChange, DataService, Identity, SignUpOutcome};
use crate::{AlumniError, Result};

/// Lifecycle state of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Process started, restore not yet begun.
    Uninitialized,
    /// Restore in progress.
    Loading,
    /// No usable profile. May still hold an identity (degraded).
    Anonymous,
    /// Identity and profile present.
    Authenticated,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::Loading => "loading",
            SessionState::Anonymous => "anonymous",
            SessionState::Authenticated => "authenticated",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only view of the session at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    state: SessionState,
    identity: Option<Identity>,
    profile: Option<Profile>,
}

impl SessionSnapshot {
    fn uninitialized() -> Self {
        Self {
            state: SessionState::Uninitialized,
            identity: None,
            profile: None,
        }
    }

    fn loading() -> Self {
        Self {
            state: SessionState::Loading,
            ..Self::uninitialized()
        }
    }

    fn anonymous() -> Self {
        Self {
            state: SessionState::Anonymous,
            ..Self::uninitialized()
        }
    }

    /// Identity without a profile.
    fn degraded(identity: Identity) -> Self {
        Self {
            state: SessionState::Anonymous,
            identity: Some(identity),
            profile: None,
        }
    }

    fn authenticated(identity: Identity, profile: Profile) -> Self {
        Self {
            state: SessionState::Authenticated,
            identity: Some(identity),
            profile: Some(profile),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Identity held by the session, including the degraded case.
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Profile of the signed-in user. Always `None` unless authenticated.
    pub fn profile(&self) -> Option<&Profile> {
        match self.state {
            SessionState::Authenticated => self.profile.as_ref(),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == SessionState::Authenticated
    }

    /// Restore has finished; role-gated content may be rendered.
    pub fn is_ready(&self) -> bool {
        matches!(
            self.state,
            SessionState::Anonymous | SessionState::Authenticated
        )
    }

    /// An identity was found but its profile could not be loaded.
    pub fn is_degraded(&self) -> bool {
        self.state == SessionState::Anonymous && self.identity.is_some()
    }
}

/// Process-wide session store over a data service.
pub struct SessionStore<S> {
    service: S,
    op_lock: Mutex<()>,
    state_tx: watch::Sender<SessionSnapshot>,
}

impl<S: DataService> SessionStore<S> {
    /// Create a store in the uninitialized state.
    pub fn new(service: S) -> Self {
        let (state_tx, _) = watch::channel(SessionSnapshot::uninitialized());
        Self {
            service,
            op_lock: Mutex::new(()),
            state_tx,
        }
    }

    /// The underlying data service.
    pub fn service(&self) -> &S {
        &self.service
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state_tx.borrow().clone()
    }

    /// Profile of the signed-in user, if authenticated.
    pub fn current_profile(&self) -> Option<Profile> {
        self.state_tx.borrow().profile().cloned()
    }

    /// Subscribe to session changes. The receiver sees the current value first.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state_tx.subscribe()
    }

    /// Wait until restore has finished and return the resulting snapshot.
    pub async fn wait_ready(&self) -> SessionSnapshot {
        let mut rx = self.subscribe();
        let snapshot = match rx.wait_for(SessionSnapshot::is_ready).await {
            Ok(snapshot) => snapshot.clone(),
            Err(_) => self.snapshot(),
        };
        snapshot
    }

    /// Create an identity and its profile, then make them the active session.
    ///
    /// If the profile cannot be created the half-created remote session is
    /// signed out and the store is left anonymous. The identity itself
    /// remains on the service; its id is logged.
    ///
    /// When the service holds the session back until the email is confirmed,
    /// the profile is still created where the service allows it, the store
    /// stays anonymous and [`AlumniError::ConfirmationPending`] is returned.
    pub async fn sign_up(&self, request: SignUpRequest) -> Result<Profile> {
        request.validate()?;

        let _guard = self.op_lock.lock().await;
        let outcome = self
            .service
            .sign_up(request.normalized_email(), &request.password)
            .await?;
        let identity = match outcome {
            SignUpOutcome::SignedIn(identity) => identity,
            SignUpOutcome::ConfirmationPending(identity) => {
                return Err(self.finish_unconfirmed_sign_up(&request, identity).await);
            }
        };
        info!(user_id = %identity.id, role = %request.role, "Identity created");

        let repo = ProfileRepository::new(&self.service);
        match repo.create(&request.to_new_profile(identity.id)).await {
            Ok(profile) => {
                info!(
                    user_id = %identity.id,
                    role = %profile.role(),
                    is_approved = profile.is_approved,
                    "Signed up"
                );
                self.publish(SessionSnapshot::authenticated(identity, profile.clone()));
                Ok(profile)
            }
            Err(e) => {
                warn!(
                    user_id = %identity.id,
                    error = %e,
                    "Profile creation failed, identity has no profile"
                );
                if let Err(sign_out_err) = self.service.sign_out().await {
                    warn!(error = %sign_out_err, "Sign-out after failed sign-up failed");
                }
                self.publish(SessionSnapshot::anonymous());
                Err(e)
            }
        }
    }

    /// Profile creation for an identity that has no session yet. Always ends
    /// anonymous; the returned error is what `sign_up` reports.
    async fn finish_unconfirmed_sign_up(
        &self,
        request: &SignUpRequest,
        identity: Identity,
    ) -> AlumniError {
        let repo = ProfileRepository::new(&self.service);
        let err = match repo.create(&request.to_new_profile(identity.id)).await {
            Ok(_) => {
                info!(
                    user_id = %identity.id,
                    role = %request.role,
                    "Signed up, email confirmation pending"
                );
                AlumniError::ConfirmationPending(identity.id)
            }
            Err(e) => {
                warn!(
                    user_id = %identity.id,
                    error = %e,
                    "Profile creation before email confirmation failed, identity has no profile"
                );
                e
            }
        };
        self.publish(SessionSnapshot::anonymous());
        err
    }

    /// Authenticate and load the matching profile.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Profile> {
        let email = email.trim();
        validate_credentials(email, password)?;

        let _guard = self.op_lock.lock().await;
        let identity = match self.service.sign_in(email, password).await {
            Ok(identity) => identity,
            Err(e) => {
                debug!(error = %e, "Sign-in rejected");
                return Err(e.into());
            }
        };
        self.load_profile(identity).await
    }

    /// Clear the session and invalidate it remotely.
    ///
    /// Local state is cleared first and stays cleared when the remote call
    /// fails; that failure is still returned.
    pub async fn sign_out(&self) -> Result<()> {
        let _guard = self.op_lock.lock().await;
        let user_id = self.state_tx.borrow().identity().map(|i| i.id);
        self.publish(SessionSnapshot::anonymous());

        match self.service.sign_out().await {
            Ok(()) => {
                if let Some(user_id) = user_id {
                    info!(%user_id, "Signed out");
                }
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Remote sign-out failed, local session cleared");
                Err(e.into())
            }
        }
    }

    /// Re-fetch the profile of the signed-in user.
    ///
    /// Returns `Ok(None)` when not authenticated. On failure the cached
    /// profile is kept.
    pub async fn refresh_profile(&self) -> Result<Option<Profile>> {
        let _guard = self.op_lock.lock().await;
        let snapshot = self.snapshot();
        let Some(identity) = snapshot.identity().filter(|_| snapshot.is_authenticated()) else {
            return Ok(None);
        };

        let repo = ProfileRepository::new(&self.service);
        match repo.get_by_user_id(identity.id).await? {
            Some(profile) => {
                debug!(user_id = %identity.id, "Profile refreshed");
                self.publish(SessionSnapshot::authenticated(
                    identity.clone(),
                    profile.clone(),
                ));
                Ok(Some(profile))
            }
            None => {
                warn!(user_id = %identity.id, "Profile disappeared, keeping cached copy");
                Err(AlumniError::ProfileMissing(identity.id))
            }
        }
    }

    /// Restore a previously issued session. Runs once; later calls do nothing.
    pub async fn restore_session(&self) -> Result<()> {
        let _guard = self.op_lock.lock().await;
        if self.state_tx.borrow().state() != SessionState::Uninitialized {
            return Ok(());
        }
        self.publish(SessionSnapshot::loading());

        match self.service.get_current_session().await {
            Ok(Some(identity)) => self.load_profile(identity).await.map(|_| ()),
            Ok(None) => {
                self.publish(SessionSnapshot::anonymous());
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Session restore failed");
                self.publish(SessionSnapshot::anonymous());
                Err(e.into())
            }
        }
    }

    /// Resynchronize with the data service after an auth-change notification.
    ///
    /// The client's current identity is authoritative, so a notification
    /// handled late cannot resurrect a session that has since changed.
    pub async fn handle_auth_change(&self, change: AuthChange) {
        let _guard = self.op_lock.lock().await;
        let snapshot = self.snapshot();
        if !snapshot.is_ready() {
            return;
        }

        let current = self.service.current_identity().await;
        match (current, snapshot.identity()) {
            (None, None) => {}
            (None, Some(cached)) => {
                info!(user_id = %cached.id, ?change, "Session ended remotely");
                self.publish(SessionSnapshot::anonymous());
            }
            (Some(current), Some(cached)) if current.id == cached.id => {
                debug!(?change, "Session unchanged");
            }
            (Some(current), _) => {
                info!(user_id = %current.id, ?change, "Session changed remotely");
                if let Err(e) = self.load_profile(current).await {
                    warn!(error = %e, "Profile load after auth change failed");
                }
            }
        }
    }

    /// Forward the service's auth-change notifications to this store.
    ///
    /// The task ends when the store is dropped or the service closes its
    /// notification channel.
    pub fn spawn_auth_listener(self: &Arc<Self>) -> JoinHandle<()>
    where
        S: 'static,
    {
        let mut rx = self.service.subscribe();
        let store = Arc::downgrade(self);
        tokio::spawn(async move {
            loop {
                let change = match rx.recv().await {
                    Ok(change) => change,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Auth notifications lagged, resynchronizing");
                        AuthChange::TokenRefreshed
                    }
                    Err(RecvError::Closed) => break,
                };
                let Some(store) = store.upgrade() else {
                    break;
                };
                store.handle_auth_change(change).await;
            }
            debug!("Auth listener stopped");
        })
    }

    /// Fetch the profile of `identity` and publish the result. Caller holds
    /// `op_lock`.
    async fn load_profile(&self, identity: Identity) -> Result<Profile> {
        let repo = ProfileRepository::new(&self.service);
        match repo.get_by_user_id(identity.id).await {
            Ok(Some(profile)) => {
                info!(user_id = %identity.id, role = %profile.role(), "Signed in");
                self.publish(SessionSnapshot::authenticated(identity, profile.clone()));
                Ok(profile)
            }
            Ok(None) => {
                warn!(user_id = %identity.id, "Identity has no profile");
                let user_id = identity.id;
                self.publish(SessionSnapshot::degraded(identity));
                Err(AlumniError::ProfileMissing(user_id))
            }
            Err(e) => {
                warn!(user_id = %identity.id, error = %e, "Profile fetch failed");
                self.publish(SessionSnapshot::degraded(identity));
                Err(e)
            }
        }
    }

    fn publish(&self, snapshot: SessionSnapshot) {
        debug!(state = %snapshot.state(), "Session state published");
        self.state_tx.send_replace(snapshot);
    }
}
