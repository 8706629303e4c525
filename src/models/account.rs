use serde::{Deserialize, Serialize};

use crate::entities::accounts;

/// Fields that must never be settable from untrusted input.
pub const PROTECTED_FIELDS: &[&str] = &["registered_on", "id"];

/// Input for creating an account. The raw password lives here only until
/// the repository hashes it; it is never persisted.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub email: String,
}

/// A stored account as read back from the database.
///
/// Carries the password hash (needed for verification) but never the raw
/// password; use [`Account::info`] for anything externally visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub registered_on: String,
    pub email: String,
}

impl Account {
    /// External projection: password and id intentionally excluded.
    #[must_use]
    pub fn info(&self) -> AccountInfo {
        AccountInfo {
            username: self.username.clone(),
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            registered_on: self.registered_on.clone(),
        }
    }
}

impl Account {
    /// Privilege check placeholder. There is no admin user/group notion
    /// yet, so every account reports `false` regardless of its fields.
    // TODO: replace with a real role lookup once an admin model exists.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        false
    }
}

impl From<accounts::Model> for Account {
    fn from(model: accounts::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            first_name: model.first_name,
            last_name: model.last_name,
            password_hash: model.password_hash,
            registered_on: model.registered_on,
            email: model.email,
        }
    }
}

/// Externally visible account data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountInfo {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub registered_on: String,
}

/// An arbitrary subset of writable account fields.
///
/// Password and email go through the same hashing/validation as creation
/// when the patch is applied.
#[derive(Debug, Clone, Default)]
pub struct AccountPatch {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
}

impl AccountPatch {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.password.is_none()
            && self.email.is_none()
    }
}

/// Hardcoded admin allow-list; placeholder until admins live in the
/// database.
const ADMIN_USERNAMES: &[&str] = &["admin"];

/// Whether the given username belongs to the hardcoded admin list.
#[must_use]
pub fn is_admin_username(username: &str) -> bool {
    ADMIN_USERNAMES.contains(&username)
}

/// Lookup key for an account. Exactly one selector per query.
#[derive(Debug, Clone)]
pub enum AccountSelector {
    Id(i32),
    Username(String),
    Email(String),
}
