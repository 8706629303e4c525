use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use tracing::info;

use crate::db::error::StoreError;
use crate::entities::{auth_tokens, prelude::*};

/// Repository for the token rows owned by accounts.
///
/// Tokens are opaque values issued elsewhere; this side only stores the
/// association, keyed by account id, in insertion order.
pub struct TokenRepository {
    conn: DatabaseConnection,
}

impl TokenRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn append(&self, account_id: i32, token: &str) -> Result<(), StoreError> {
        append_tx(&self.conn, account_id, token).await
    }

    /// All tokens for an account, oldest first.
    pub async fn list_for_account(
        &self,
        account_id: i32,
    ) -> Result<Vec<auth_tokens::Model>, StoreError> {
        let rows = AuthTokens::find()
            .filter(auth_tokens::Column::AccountId.eq(account_id))
            .order_by_asc(auth_tokens::Column::Id)
            .all(&self.conn)
            .await?;

        Ok(rows)
    }

    pub async fn count_for_account(&self, account_id: i32) -> Result<u64, StoreError> {
        let count = AuthTokens::find()
            .filter(auth_tokens::Column::AccountId.eq(account_id))
            .count(&self.conn)
            .await?;

        Ok(count)
    }
}

/// Insert a token row on any connection, so account updates can append
/// tokens inside their own transaction.
pub(crate) async fn append_tx<C: ConnectionTrait>(
    conn: &C,
    account_id: i32,
    token: &str,
) -> Result<(), StoreError> {
    AuthTokens::insert(auth_tokens::ActiveModel {
        account_id: Set(account_id),
        token: Set(token.to_string()),
        created_at: Set(chrono::Utc::now().to_rfc3339()),
        ..Default::default()
    })
    .exec(conn)
    .await?;

    info!("Appended auth token for account {}", account_id);
    Ok(())
}
