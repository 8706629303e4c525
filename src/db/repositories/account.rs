use std::str::FromStr;

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use email_address::EmailAddress;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use tokio::task;
use tracing::info;

use crate::config::SecurityConfig;
use crate::db::error::StoreError;
use crate::db::repositories::token;
use crate::entities::{accounts, prelude::*};
use crate::models::account::{
    Account, AccountPatch, AccountSelector, NewAccount, PROTECTED_FIELDS,
};

pub struct AccountRepository {
    conn: DatabaseConnection,
    security: SecurityConfig,
}

impl AccountRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection, security: SecurityConfig) -> Self {
        Self { conn, security }
    }

    /// Create and persist a new account.
    ///
    /// Email validation/normalization and password hashing happen in memory
    /// before the transaction opens, so a `Validation` failure leaves nothing
    /// persisted. Storage failures roll the transaction back and surface the
    /// original `DbErr`.
    pub async fn create(&self, new: NewAccount) -> Result<Account, StoreError> {
        let email = normalize_email(&new.email)?;

        let password = new.password;
        let security = self.security.clone();
        let password_hash = task::spawn_blocking(move || hash_password(&password, &security))
            .await
            .map_err(|e| StoreError::internal(format!("Password hashing task panicked: {e}")))??;

        // Per-record timestamp, taken at construction time.
        let registered_on = chrono::Utc::now().to_rfc3339();

        let txn = self.conn.begin().await?;

        let res = Accounts::insert(accounts::ActiveModel {
            username: Set(new.username.clone()),
            first_name: Set(new.first_name),
            last_name: Set(new.last_name),
            password_hash: Set(password_hash),
            registered_on: Set(registered_on),
            email: Set(email),
            ..Default::default()
        })
        .exec(&txn)
        .await?;

        let model = Accounts::find_by_id(res.last_insert_id)
            .one(&txn)
            .await?
            .ok_or_else(|| StoreError::internal("Failed to read back created account"))?;

        txn.commit().await?;

        info!("Created account '{}' (id {})", new.username, model.id);
        Ok(Account::from(model))
    }

    /// Look up an account by exactly one of id, username, or email.
    pub async fn find(&self, selector: AccountSelector) -> Result<Option<Account>, StoreError> {
        let model = match selector {
            AccountSelector::Id(id) => Accounts::find_by_id(id).one(&self.conn).await?,
            AccountSelector::Username(username) => {
                Accounts::find()
                    .filter(accounts::Column::Username.eq(username))
                    .one(&self.conn)
                    .await?
            }
            AccountSelector::Email(email) => {
                Accounts::find()
                    .filter(accounts::Column::Email.eq(email))
                    .one(&self.conn)
                    .await?
            }
        };

        Ok(model.map(Account::from))
    }

    /// Apply a field-subset update to an existing account.
    ///
    /// Password and email in the patch go through the same hashing and
    /// validation as creation. The whole call is one transaction.
    pub async fn update(
        &self,
        username: &str,
        patch: AccountPatch,
    ) -> Result<Account, StoreError> {
        self.apply(username, patch, &[]).await
    }

    /// String-keyed update for callers holding untyped field maps.
    ///
    /// The `auth_tokens` key appends the given value to the token
    /// association instead of overwriting a column. Unknown and protected
    /// keys are rejected before anything is written.
    pub async fn update_fields(
        &self,
        username: &str,
        fields: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<Account, StoreError> {
        let mut patch = AccountPatch::default();
        let mut tokens: Vec<String> = Vec::new();

        for (key, value) in fields {
            if PROTECTED_FIELDS.contains(&key.as_str()) {
                return Err(StoreError::validation(format!(
                    "Field '{key}' is protected and cannot be updated"
                )));
            }

            if key == "auth_tokens" {
                tokens.push(expect_string(key, value)?);
                continue;
            }

            let slot = match key.as_str() {
                "username" => &mut patch.username,
                "first_name" => &mut patch.first_name,
                "last_name" => &mut patch.last_name,
                "password" => &mut patch.password,
                "email" => &mut patch.email,
                _ => {
                    return Err(StoreError::validation(format!("Unknown field '{key}'")));
                }
            };
            *slot = Some(expect_string(key, value)?);
        }

        self.apply(username, patch, &tokens).await
    }

    /// Append a token to an account's association collection.
    pub async fn append_token(&self, username: &str, token: &str) -> Result<(), StoreError> {
        self.apply(username, AccountPatch::default(), &[token.to_string()])
            .await?;
        Ok(())
    }

    async fn apply(
        &self,
        username: &str,
        patch: AccountPatch,
        tokens: &[String],
    ) -> Result<Account, StoreError> {
        let has_changes = !patch.is_empty();
        let AccountPatch {
            username: new_username,
            first_name,
            last_name,
            password,
            email,
        } = patch;

        let email = email.as_deref().map(normalize_email).transpose()?;

        let password_hash = match password {
            Some(password) => {
                let security = self.security.clone();
                Some(
                    task::spawn_blocking(move || hash_password(&password, &security))
                        .await
                        .map_err(|e| {
                            StoreError::internal(format!("Password hashing task panicked: {e}"))
                        })??,
                )
            }
            None => None,
        };

        let txn = self.conn.begin().await?;

        let model = Accounts::find()
            .filter(accounts::Column::Username.eq(username))
            .one(&txn)
            .await?
            .ok_or_else(|| StoreError::NotFound(username.to_string()))?;

        let account_id = model.id;

        // An update statement with no changed columns is a DbErr in sea-orm,
        // so a token-only call skips the row update entirely.
        let updated = if has_changes {
            let mut active: accounts::ActiveModel = model.into();

            if let Some(new_username) = new_username {
                active.username = Set(new_username);
            }
            if let Some(first_name) = first_name {
                active.first_name = Set(first_name);
            }
            if let Some(last_name) = last_name {
                active.last_name = Set(last_name);
            }
            if let Some(hash) = password_hash {
                active.password_hash = Set(hash);
            }
            if let Some(email) = email {
                active.email = Set(email);
            }

            active.update(&txn).await?
        } else {
            model
        };

        for value in tokens {
            token::append_tx(&txn, account_id, value).await?;
        }

        txn.commit().await?;

        info!("Updated account '{}' (id {})", updated.username, account_id);
        Ok(Account::from(updated))
    }

    /// Delete all accounts matching the given username.
    ///
    /// Bulk-delete semantics: a username with no matching rows is `Ok(0)`,
    /// not an error. Associated tokens are not touched; cleaning those up
    /// belongs to the token store's owner.
    pub async fn delete(&self, username: &str) -> Result<u64, StoreError> {
        let txn = self.conn.begin().await?;

        let res = Accounts::delete_many()
            .filter(accounts::Column::Username.eq(username))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        info!(
            "Deleted {} account(s) for username '{}'",
            res.rows_affected, username
        );
        Ok(res.rows_affected)
    }

    /// Check a raw password against the stored hash.
    ///
    /// Runs on the blocking pool because Argon2 verification is
    /// CPU-intensive and would stall the async runtime.
    pub async fn verify_password(
        &self,
        username: &str,
        password: &str,
    ) -> Result<bool, StoreError> {
        let model = Accounts::find()
            .filter(accounts::Column::Username.eq(username))
            .one(&self.conn)
            .await?;

        let Some(model) = model else {
            return Ok(false);
        };

        let password_hash = model.password_hash;
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || {
            let parsed = PasswordHash::new(&password_hash)
                .map_err(|e| StoreError::internal(format!("Invalid password hash format: {e}")))?;

            Ok::<bool, StoreError>(
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed)
                    .is_ok(),
            )
        })
        .await
        .map_err(|e| StoreError::internal(format!("Password verification task panicked: {e}")))??;

        Ok(is_valid)
    }
}

/// Hash a password with Argon2id using the configured cost parameters.
pub fn hash_password(password: &str, security: &SecurityConfig) -> Result<String, StoreError> {
    let params = Params::new(
        security.argon2_memory_cost_kib,
        security.argon2_time_cost,
        security.argon2_parallelism,
        None,
    )
    .map_err(|e| StoreError::internal(format!("Invalid Argon2 params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
    let salt = SaltString::generate(&mut OsRng);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| StoreError::internal(format!("Failed to hash password: {e}")))?;

    Ok(hash.to_string())
}

/// Validate an email address and return the form we store: surrounding
/// whitespace trimmed, domain lowercased, local part untouched.
pub fn normalize_email(input: &str) -> Result<String, StoreError> {
    let trimmed = input.trim();
    let parsed = EmailAddress::from_str(trimmed)
        .map_err(|e| StoreError::validation(format!("Invalid email address '{trimmed}': {e}")))?;

    Ok(format!(
        "{}@{}",
        parsed.local_part(),
        parsed.domain().to_ascii_lowercase()
    ))
}

fn expect_string(key: &str, value: &serde_json::Value) -> Result<String, StoreError> {
    value
        .as_str()
        .map(ToString::to_string)
        .ok_or_else(|| StoreError::validation(format!("Field '{key}' expects a string value")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email_lowercases_domain() {
        let email = normalize_email("  Alice.Liddell@Example.COM ").unwrap();
        assert_eq!(email, "Alice.Liddell@example.com");
    }

    #[test]
    fn test_normalize_email_rejects_malformed() {
        for bad in ["not-an-email", "missing@tld@twice", "", "a b@example.com"] {
            let err = normalize_email(bad).unwrap_err();
            assert!(matches!(err, StoreError::Validation(_)), "{bad}");
        }
    }

    #[test]
    fn test_hash_password_roundtrip() {
        let security = SecurityConfig::default();
        let hash = hash_password("hunter2", &security).unwrap();

        assert_ne!(hash, "hunter2");
        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.len() <= 128);

        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(
            Argon2::default()
                .verify_password(b"hunter2", &parsed)
                .is_ok()
        );
        assert!(
            Argon2::default()
                .verify_password(b"wrong", &parsed)
                .is_err()
        );
    }
}
