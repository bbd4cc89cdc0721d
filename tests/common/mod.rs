//! Test helpers for E2E tests.
//!
//! Provides a session store over the in-process data service and helpers
//! for creating members.

#![allow(dead_code)]

use std::time::Duration;

use tokio::time::timeout;

use alumni_connect::auth::{SessionSnapshot, SessionStore, SignUpRequest};
use alumni_connect::db::{Profile, Role};
use alumni_connect::MemoryDataService;

/// Default timeout for test operations.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Password used for every test member.
pub const TEST_PASSWORD: &str = "password123";

/// A store together with a handle on its data service for fault injection.
pub struct TestApp {
    pub service: MemoryDataService,
    pub store: SessionStore<MemoryDataService>,
}

impl TestApp {
    /// Create an app whose session has been restored (no prior session).
    pub async fn new() -> Self {
        Self::with_service(MemoryDataService::new()).await
    }

    /// Create an app over `service`, restoring whatever session it holds.
    pub async fn with_service(service: MemoryDataService) -> Self {
        let store = SessionStore::new(service.clone());
        store.restore_session().await.unwrap();
        Self { service, store }
    }

    /// Email used for the member called `name`.
    pub fn email(name: &str) -> String {
        let local = name.to_lowercase().replace(' ', ".");
        format!("{local}@alumni.test")
    }

    /// Sign up `name` with `role`. The new member stays signed in.
    pub async fn sign_up(&self, name: &str, role: Role) -> Profile {
        let request = SignUpRequest::new(Self::email(name), TEST_PASSWORD, name, role)
            .with_batch("2020")
            .with_branch("Computer Science");
        self.store.sign_up(request).await.unwrap()
    }

    /// Sign up `name` with `role` and sign out again.
    pub async fn create_member(&self, name: &str, role: Role) -> Profile {
        let profile = self.sign_up(name, role).await;
        self.store.sign_out().await.unwrap();
        profile
    }

    /// Sign in as `name`.
    pub async fn sign_in(&self, name: &str) -> Profile {
        self.store
            .sign_in(&Self::email(name), TEST_PASSWORD)
            .await
            .unwrap()
    }
}

/// Wait until `predicate` holds for the store's snapshot.
pub async fn wait_for_snapshot<F>(store: &SessionStore<MemoryDataService>, predicate: F) -> SessionSnapshot
where
    F: FnMut(&SessionSnapshot) -> bool,
{
    let mut rx = store.subscribe();
    let snapshot = timeout(DEFAULT_TIMEOUT, rx.wait_for(predicate))
        .await
        .expect("timed out waiting for session state")
        .expect("session store dropped")
        .clone();
    snapshot
}
