//! In-memory user store with optional JSON persistence.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::auth::password::hash_password;
use crate::auth::{Role, UserId};
use crate::store::{StoreError, UserStore};
use crate::time::unix_now;

/// User record as the core sees it.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub email: String,
    /// Argon2 PHC string.
    pub password_hash: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub created_at: u64,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}

/// DashMap-backed [`UserStore`]. Emails are unique, compared case-insensitively.
#[derive(Clone, Default)]
pub struct InMemoryUserStore {
    users: Arc<DashMap<UserId, User>>,
    by_email: Arc<DashMap<String, UserId>>,
    next_id: Arc<AtomicU64>,
    persistence_path: Option<String>,
}

impl InMemoryUserStore {
    pub fn new(persistence_path: Option<String>) -> Self {
        Self {
            users: Arc::new(DashMap::new()),
            by_email: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicU64::new(1)),
            persistence_path,
        }
    }

    /// Load from file if it exists; later saves go to the same file.
    pub fn load_from_file(path: &str) -> Result<Self, StoreError> {
        let store = Self::new(Some(path.to_string()));
        if Path::new(path).exists() {
            let reader = BufReader::new(File::open(path)?);
            let users: Vec<User> = serde_json::from_reader(reader)?;

            let mut max_id = 0;
            for user in users {
                max_id = max_id.max(user.id);
                store.by_email.insert(email_key(&user.email), user.id);
                store.users.insert(user.id, user);
            }
            store.next_id.store(max_id.saturating_add(1), Ordering::SeqCst);
            tracing::info!("Loaded {} users from {}", store.users.len(), path);
        }
        Ok(store)
    }

    /// Write all users to the persistence file, if one is configured.
    pub fn save_to_file(&self) -> Result<(), StoreError> {
        if let Some(path) = &self.persistence_path {
            let mut users: Vec<User> = self.users.iter().map(|r| r.value().clone()).collect();
            users.sort_by_key(|u| u.id);

            let writer = BufWriter::new(File::create(path)?);
            serde_json::to_writer_pretty(writer, &users)?;
            tracing::info!("Saved {} users to {}", users.len(), path);
        }
        Ok(())
    }

    /// Register a new user, hashing `password`.
    pub fn create_user(&self, email: &str, password: &str, role: Role) -> Result<User, StoreError> {
        let password_hash = hash_password(password).map_err(|e| StoreError::Backend(e.to_string()))?;
        self.insert_new(email, password_hash, role)
    }

    fn insert_new(&self, email: &str, password_hash: String, role: Role) -> Result<User, StoreError> {
        match self.by_email.entry(email_key(email)) {
            Entry::Occupied(_) => Err(StoreError::Conflict(format!("email already registered: {}", email))),
            Entry::Vacant(slot) => {
                let user = User {
                    id: self.next_id.fetch_add(1, Ordering::SeqCst),
                    email: email.trim().to_string(),
                    password_hash,
                    role,
                    created_at: unix_now(),
                };
                self.users.insert(user.id, user.clone());
                slot.insert(user.id);
                Ok(user)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, email: &str, password_hash: String, role: Role) -> Result<User, StoreError> {
        self.insert_new(email, password_hash, role)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let id = self.by_email.get(&email_key(email)).map(|r| *r.value());
        Ok(id.and_then(|id| self.users.get(&id).map(|r| r.value().clone())))
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.users.get(&id).map(|r| r.value().clone()))
    }

    async fn save(&self, user: User) -> Result<(), StoreError> {
        let key = email_key(&user.email);
        let owner = self.by_email.get(&key).map(|r| *r.value());
        if let Some(owner) = owner {
            if owner != user.id {
                return Err(StoreError::Conflict(format!("email already registered: {}", user.email)));
            }
        }

        if let Some(previous) = self.users.insert(user.id, user.clone()) {
            let previous_key = email_key(&previous.email);
            if previous_key != key {
                self.by_email.remove(&previous_key);
            }
        }
        self.by_email.insert(key, user.id);
        self.next_id.fetch_max(user.id.saturating_add(1), Ordering::SeqCst);
        Ok(())
    }
}
