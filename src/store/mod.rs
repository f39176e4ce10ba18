//! Identity and vault-entry storage.
//!
//! The [`UserStore`] trait is the single owner of user records and their
//! vault entries. Two backends implement it: [`memory::MemoryStore`] for
//! in-process deployments and tests, and [`postgres::PgStore`] for
//! production.
//!
//! Entry mutations are deliberately expressed as atomic per-owner operations
//! (`append_entry`, `remove_entry`) instead of a whole-document `save`: the
//! load-list/mutate/write-list-back shape loses concurrent updates.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

/// A registered account. Owned exclusively by the store; the password hash
/// and TOTP secret never leave the server boundary.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub totp_secret: String,
    pub totp_enabled: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for [`UserStore::create_user`].
#[derive(Debug)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub totp_secret: String,
}

/// A per-site credential record owned by exactly one user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VaultEntry {
    pub id: Uuid,
    pub site: String,
    #[serde(rename = "entryUsername")]
    pub username: String,
    #[serde(rename = "secretValue")]
    pub secret_value: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Input for [`UserStore::append_entry`].
#[derive(Debug)]
pub struct NewVaultEntry {
    pub site: String,
    pub username: String,
    pub secret_value: String,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("username already exists")]
    Conflict,

    #[error("user not found")]
    NotFound,

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Storage contract shared by all backends.
///
/// `append_entry` and `remove_entry` must be atomic with respect to other
/// mutations of the same user: two concurrent appends both land.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persist a new user in unenrolled state.
    ///
    /// # Errors
    /// `StoreError::Conflict` when the username is already taken.
    async fn create_user(&self, new_user: NewUser) -> Result<User, StoreError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Flip `totp_enabled` for the user. Idempotent; the flag never reverts.
    ///
    /// # Errors
    /// `StoreError::NotFound` when the id does not resolve to a user.
    async fn enable_totp(&self, id: Uuid) -> Result<(), StoreError>;

    /// The user's entries in insertion order.
    ///
    /// # Errors
    /// `StoreError::NotFound` when the id does not resolve to a user.
    async fn list_entries(&self, user_id: Uuid) -> Result<Vec<VaultEntry>, StoreError>;

    /// Append an entry to the user's collection and return it with its
    /// generated id and timestamp.
    async fn append_entry(
        &self,
        user_id: Uuid,
        entry: NewVaultEntry,
    ) -> Result<VaultEntry, StoreError>;

    /// Remove an entry by id. Succeeds when the entry id is absent; still
    /// fails with `NotFound` for an unknown user.
    async fn remove_entry(&self, user_id: Uuid, entry_id: Uuid) -> Result<(), StoreError>;

    /// Cheap reachability probe for the health endpoint.
    async fn ping(&self) -> Result<(), StoreError>;
}

pub type SharedStore = Arc<dyn UserStore>;
