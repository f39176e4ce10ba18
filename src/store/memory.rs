//! In-process store backend.
//!
//! Every mutation takes the write lock for the whole read-modify-write, so
//! entry appends and removals for the same user are serialized and cannot
//! lose each other's updates.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{NewUser, NewVaultEntry, StoreError, User, UserStore, VaultEntry};

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, StoredUser>,
    by_username: HashMap<String, Uuid>,
}

struct StoredUser {
    user: User,
    entries: Vec<VaultEntry>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;

        if inner.by_username.contains_key(&new_user.username) {
            return Err(StoreError::Conflict);
        }

        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username.clone(),
            password_hash: new_user.password_hash,
            totp_secret: new_user.totp_secret,
            totp_enabled: false,
            created_at: Utc::now(),
        };

        inner.by_username.insert(new_user.username, user.id);
        inner.users.insert(
            user.id,
            StoredUser {
                user: user.clone(),
                entries: Vec::new(),
            },
        );

        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        let id = inner.by_username.get(username);
        Ok(id.and_then(|id| inner.users.get(id)).map(|s| s.user.clone()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(&id).map(|s| s.user.clone()))
    }

    async fn enable_totp(&self, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let stored = inner.users.get_mut(&id).ok_or(StoreError::NotFound)?;
        stored.user.totp_enabled = true;
        Ok(())
    }

    async fn list_entries(&self, user_id: Uuid) -> Result<Vec<VaultEntry>, StoreError> {
        let inner = self.inner.read().await;
        let stored = inner.users.get(&user_id).ok_or(StoreError::NotFound)?;
        Ok(stored.entries.clone())
    }

    async fn append_entry(
        &self,
        user_id: Uuid,
        entry: NewVaultEntry,
    ) -> Result<VaultEntry, StoreError> {
        let mut inner = self.inner.write().await;
        let stored = inner.users.get_mut(&user_id).ok_or(StoreError::NotFound)?;

        let entry = VaultEntry {
            id: Uuid::new_v4(),
            site: entry.site,
            username: entry.username,
            secret_value: entry.secret_value,
            created_at: Utc::now(),
        };

        stored.entries.push(entry.clone());
        Ok(entry)
    }

    async fn remove_entry(&self, user_id: Uuid, entry_id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let stored = inner.users.get_mut(&user_id).ok_or(StoreError::NotFound)?;
        stored.entries.retain(|entry| entry.id != entry_id);
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            password_hash: "$argon2id$fake".to_string(),
            totp_secret: "JBSWY3DPEHPK3PXP".to_string(),
        }
    }

    fn new_entry(site: &str) -> NewVaultEntry {
        NewVaultEntry {
            site: site.to_string(),
            username: "alice".to_string(),
            secret_value: "hunter2".to_string(),
        }
    }

    #[tokio::test]
    async fn create_user_rejects_duplicate_username() {
        let store = MemoryStore::new();
        store.create_user(new_user("alice")).await.unwrap();

        let result = store.create_user(new_user("alice")).await;
        assert!(matches!(result, Err(StoreError::Conflict)));
    }

    #[tokio::test]
    async fn created_user_starts_unenrolled() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("alice")).await.unwrap();
        assert!(!user.totp_enabled);

        let found = store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert!(!found.totp_enabled);
    }

    #[tokio::test]
    async fn enable_totp_flips_flag_once() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("alice")).await.unwrap();

        store.enable_totp(user.id).await.unwrap();
        // A second call is a no-op, not an error.
        store.enable_totp(user.id).await.unwrap();

        let found = store.find_by_id(user.id).await.unwrap().unwrap();
        assert!(found.totp_enabled);
    }

    #[tokio::test]
    async fn enable_totp_unknown_user_is_not_found() {
        let store = MemoryStore::new();
        let result = store.enable_totp(Uuid::new_v4()).await;
        assert!(matches!(result, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn entries_keep_insertion_order() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("alice")).await.unwrap();

        for site in ["one.example", "two.example", "three.example"] {
            store.append_entry(user.id, new_entry(site)).await.unwrap();
        }

        let entries = store.list_entries(user.id).await.unwrap();
        let sites: Vec<&str> = entries.iter().map(|e| e.site.as_str()).collect();
        assert_eq!(sites, ["one.example", "two.example", "three.example"]);
    }

    #[tokio::test]
    async fn removed_entry_does_not_reappear() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("alice")).await.unwrap();

        let kept = store
            .append_entry(user.id, new_entry("keep.example"))
            .await
            .unwrap();
        let dropped = store
            .append_entry(user.id, new_entry("drop.example"))
            .await
            .unwrap();

        store.remove_entry(user.id, dropped.id).await.unwrap();
        // Idempotent: removing again succeeds.
        store.remove_entry(user.id, dropped.id).await.unwrap();

        let entries = store.list_entries(user.id).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, kept.id);
    }

    #[tokio::test]
    async fn list_entries_unknown_user_is_not_found() {
        let store = MemoryStore::new();
        let result = store.list_entries(Uuid::new_v4()).await;
        assert!(matches!(result, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn concurrent_appends_both_land() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let user = store.create_user(new_user("alice")).await.unwrap();

        let first = {
            let store = store.clone();
            tokio::spawn(async move { store.append_entry(user.id, new_entry("a.example")).await })
        };
        let second = {
            let store = store.clone();
            tokio::spawn(async move { store.append_entry(user.id, new_entry("b.example")).await })
        };

        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();

        let entries = store.list_entries(user.id).await.unwrap();
        assert_eq!(entries.len(), 2);
    }
}
