//! User records and their persistence
//!
//! The web layer only sees the [`UserStore`] trait; the persistent
//! implementation lives in the fjall `users` keyspace, and an in-memory
//! variant backs tests and throwaway instances.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use async_trait::async_trait;
use fjall::Keyspace;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tokio::task;
use tracing::{debug, info};

use crate::analysis::DisplayUnit;
use crate::storage::{Storage, USERS_KEYSPACE};
use crate::{Result, WeatherDashError};

/// A registered dashboard user and their preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub name: String,
    pub password: String,
    /// Home city shown on the dashboard by default
    pub city: String,
    pub temp_unit: DisplayUnit,
}

impl UserRecord {
    #[must_use]
    pub fn new(name: impl Into<String>, password: impl Into<String>, city: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            password: password.into(),
            city: city.into(),
            temp_unit: DisplayUnit::default(),
        }
    }

    /// Compare a candidate password without short-circuiting on the first mismatch
    #[must_use]
    pub fn password_matches(&self, candidate: &str) -> bool {
        // slice `==` returns at the first differing byte, leaking the match length through timing
        let stored = self.password.as_bytes();
        let candidate = candidate.as_bytes();
        let mut diff = stored.len() ^ candidate.len();
        for (i, byte) in stored.iter().enumerate() {
            let other = candidate.get(i).copied().unwrap_or(0);
            diff |= usize::from(byte ^ other);
        }
        diff == 0
    }
}

fn check_new_user(record: &UserRecord) -> Result<()> {
    if record.name.is_empty() || record.password.is_empty() {
        return Err(WeatherDashError::validation(
            "username and password are required",
        ));
    }
    Ok(())
}

fn name_taken(name: &str) -> WeatherDashError {
    WeatherDashError::validation(format!("user '{name}' already exists"))
}

/// Load/save access to user records keyed by username
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn load(&self, name: &str) -> Result<Option<UserRecord>>;

    async fn save(&self, record: &UserRecord) -> Result<()>;

    /// Register a new user, failing if the name is taken. The existence
    /// check and the insert are atomic.
    async fn create(&self, record: UserRecord) -> Result<()>;

    /// Persist a user's home city and temperature unit
    async fn update_preferences(
        &self,
        name: &str,
        city: &str,
        unit: DisplayUnit,
    ) -> Result<UserRecord> {
        let mut record = self
            .load(name)
            .await?
            .ok_or_else(|| WeatherDashError::validation(format!("unknown user '{name}'")))?;
        record.city = city.trim().to_string();
        record.temp_unit = unit;
        self.save(&record).await?;
        debug!("Updated preferences for '{}'", name);
        Ok(record)
    }

    /// Return the user when the name exists and the password matches
    async fn verify_credentials(&self, name: &str, password: &str) -> Result<Option<UserRecord>> {
        Ok(self
            .load(name)
            .await?
            .filter(|record| record.password_matches(password)))
    }
}

/// User store persisted in the fjall `users` keyspace
#[derive(Clone)]
pub struct FjallUserStore {
    store: Keyspace,
    /// Serializes registrations; fjall holds the database open for a single process
    create_lock: Arc<Mutex<()>>,
}

impl FjallUserStore {
    pub fn open(storage: &Storage) -> Result<Self> {
        Ok(Self {
            store: storage.keyspace(USERS_KEYSPACE)?,
            create_lock: Arc::new(Mutex::new(())),
        })
    }
}

#[async_trait]
impl UserStore for FjallUserStore {
    #[tracing::instrument(level = "debug", skip(self))]
    async fn load(&self, name: &str) -> Result<Option<UserRecord>> {
        let store = self.store.clone();
        let key = name.as_bytes().to_vec();
        let bytes = task::spawn_blocking(move || store.get(key)).await??;
        match bytes {
            Some(bytes) => Ok(Some(postcard::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    #[tracing::instrument(level = "debug", skip(self, record), fields(user = %record.name))]
    async fn save(&self, record: &UserRecord) -> Result<()> {
        let store = self.store.clone();
        let key = record.name.as_bytes().to_vec();
        let bytes = postcard::to_stdvec(record)?;
        task::spawn_blocking(move || store.insert(key, bytes)).await??;
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self, record), fields(user = %record.name))]
    async fn create(&self, record: UserRecord) -> Result<()> {
        check_new_user(&record)?;
        let _guard = self.create_lock.lock().await;
        if self.load(&record.name).await?.is_some() {
            return Err(name_taken(&record.name));
        }
        self.save(&record).await?;
        info!("Registered user '{}'", record.name);
        Ok(())
    }
}

/// Non-persistent user store
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl InMemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with the given records
    #[must_use]
    pub fn with_users(records: impl IntoIterator<Item = UserRecord>) -> Self {
        let users = records
            .into_iter()
            .map(|record| (record.name.clone(), record))
            .collect();
        Self {
            users: RwLock::new(users),
        }
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn load(&self, name: &str) -> Result<Option<UserRecord>> {
        Ok(self.users.read().await.get(name).cloned())
    }

    async fn save(&self, record: &UserRecord) -> Result<()> {
        self.users
            .write()
            .await
            .insert(record.name.clone(), record.clone());
        Ok(())
    }

    async fn create(&self, record: UserRecord) -> Result<()> {
        check_new_user(&record)?;
        match self.users.write().await.entry(record.name.clone()) {
            Entry::Occupied(_) => Err(name_taken(&record.name)),
            Entry::Vacant(slot) => {
                info!("Registered user '{}'", record.name);
                slot.insert(record);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user() -> UserRecord {
        UserRecord::new("test_user", "test_pwd", "Beijing")
    }

    #[test]
    fn test_password_matching() {
        let user = test_user();
        assert!(user.password_matches("test_pwd"));
        assert!(!user.password_matches("test_pw"));
        assert!(!user.password_matches("test_pwd2"));
        assert!(!user.password_matches(""));
    }

    #[tokio::test]
    async fn test_in_memory_create_and_load() {
        let store = InMemoryUserStore::new();
        store.create(test_user()).await.unwrap();

        let loaded = store.load("test_user").await.unwrap().unwrap();
        assert_eq!(loaded.city, "Beijing");
        assert_eq!(loaded.temp_unit, DisplayUnit::Celsius);

        let duplicate = store.create(test_user()).await;
        assert!(matches!(duplicate, Err(WeatherDashError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_create_requires_name_and_password() {
        let store = InMemoryUserStore::new();
        let result = store.create(UserRecord::new("", "pwd", "Paris")).await;
        assert!(result.is_err());
        assert!(store.load("").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_verify_credentials() {
        let store = InMemoryUserStore::with_users([test_user()]);
        assert!(store.verify_credentials("test_user", "test_pwd").await.unwrap().is_some());
        assert!(store.verify_credentials("test_user", "nope").await.unwrap().is_none());
        assert!(store.verify_credentials("ghost", "test_pwd").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fjall_store_persists_preferences() {
        let dir = tempfile::tempdir().unwrap();
        {
            let storage = Storage::open(dir.path()).unwrap();
            let store = FjallUserStore::open(&storage).unwrap();
            store.create(test_user()).await.unwrap();
            store
                .create(UserRecord::new("new_user", "new_pwd", "Shanghai"))
                .await
                .unwrap();
            let updated = store
                .update_preferences("test_user", " Tokyo ", DisplayUnit::Fahrenheit)
                .await
                .unwrap();
            assert_eq!(updated.city, "Tokyo");
        }

        let storage = Storage::open(dir.path()).unwrap();
        let store = FjallUserStore::open(&storage).unwrap();
        let user = store.load("test_user").await.unwrap().unwrap();
        assert_eq!(user.city, "Tokyo");
        assert_eq!(user.temp_unit, DisplayUnit::Fahrenheit);
        let other = store.load("new_user").await.unwrap().unwrap();
        assert_eq!(other.city, "Shanghai");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_registrations_have_one_winner() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(dir.path()).unwrap();
        let fjall = FjallUserStore::open(&storage).unwrap();
        let memory = InMemoryUserStore::new();
        let stores: [&dyn UserStore; 2] = [&fjall, &memory];

        for store in stores {
            let (first, second) = tokio::join!(
                store.create(UserRecord::new("alice", "first", "Oslo")),
                store.create(UserRecord::new("alice", "second", "Rome")),
            );
            assert_ne!(first.is_ok(), second.is_ok());

            let winner = if first.is_ok() { "first" } else { "second" };
            let stored = store.load("alice").await.unwrap().unwrap();
            assert_eq!(stored.password, winner);
        }
    }

    #[tokio::test]
    async fn test_update_unknown_user_fails() {
        let store = InMemoryUserStore::new();
        let result = store
            .update_preferences("ghost", "Oslo", DisplayUnit::Celsius)
            .await;
        assert!(result.is_err());
    }
}
