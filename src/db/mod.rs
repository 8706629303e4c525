use std::path::Path;
use std::time::Duration;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use tracing::info;

use crate::config::SecurityConfig;
use crate::entities::auth_tokens;
use crate::models::account::{Account, AccountPatch, AccountSelector, NewAccount};

pub mod error;
pub mod migrator;
pub mod repositories;

pub use error::StoreError;

/// Facade over the account database: owns the connection pool, runs
/// migrations on startup, and exposes the repository operations.
#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
    security: SecurityConfig,
}

impl Store {
    pub async fn new(db_url: &str, security: SecurityConfig) -> Result<Self, StoreError> {
        Self::with_pool_options(db_url, security, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        security: SecurityConfig,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, StoreError> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.starts_with(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)
                    .map_err(|e| StoreError::internal(format!("Failed to create db file: {e}")))?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn, security })
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    #[must_use]
    pub fn account_repo(&self) -> repositories::account::AccountRepository {
        repositories::account::AccountRepository::new(self.conn.clone(), self.security.clone())
    }

    #[must_use]
    pub fn token_repo(&self) -> repositories::token::TokenRepository {
        repositories::token::TokenRepository::new(self.conn.clone())
    }

    pub async fn create_account(&self, new: NewAccount) -> Result<Account, StoreError> {
        self.account_repo().create(new).await
    }

    pub async fn find_account(
        &self,
        selector: AccountSelector,
    ) -> Result<Option<Account>, StoreError> {
        self.account_repo().find(selector).await
    }

    pub async fn update_account(
        &self,
        username: &str,
        patch: AccountPatch,
    ) -> Result<Account, StoreError> {
        self.account_repo().update(username, patch).await
    }

    pub async fn update_account_fields(
        &self,
        username: &str,
        fields: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<Account, StoreError> {
        self.account_repo().update_fields(username, fields).await
    }

    pub async fn delete_account(&self, username: &str) -> Result<u64, StoreError> {
        self.account_repo().delete(username).await
    }

    pub async fn verify_account_password(
        &self,
        username: &str,
        password: &str,
    ) -> Result<bool, StoreError> {
        self.account_repo().verify_password(username, password).await
    }

    pub async fn append_auth_token(&self, username: &str, token: &str) -> Result<(), StoreError> {
        self.account_repo().append_token(username, token).await
    }

    pub async fn auth_tokens_for(
        &self,
        account_id: i32,
    ) -> Result<Vec<auth_tokens::Model>, StoreError> {
        self.token_repo().list_for_account(account_id).await
    }
}
