use std::sync::Arc;

use crate::{
    db::Store,
    error::{AppError, Result},
    models::UserAccount,
};

use super::mutation::Outcome;

/// Account Service - fetch-or-create and conditional writes of user accounts
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn Store>,
}

impl AccountService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Returns the account for `user_id`, creating it with starting allowances on first
    /// contact. Losing an insert race to another request re-reads the winner's row.
    pub async fn fetch_or_create(&self, user_id: i64) -> Result<UserAccount> {
        if let Some(account) = self.store.find_account(user_id).await? {
            return Ok(account);
        }

        let fresh = UserAccount::with_defaults(user_id);
        if let Some(created) = self.store.insert_account(&fresh).await? {
            tracing::info!("Created account for user {}", user_id);
            return Ok(created);
        }

        self.store.find_account(user_id).await?.ok_or_else(|| {
            AppError::Database(format!(
                "User {} conflicted on insert but could not be read back",
                user_id
            ))
        })
    }

    /// Writes the outcome's patch, if any. A guarded write that no longer matches
    /// the stored balances is reported as a conflict and leaves the row untouched.
    pub async fn commit(&self, user_id: i64, outcome: &Outcome) -> Result<()> {
        if outcome.patch.is_empty() {
            return Ok(());
        }

        let applied = self
            .store
            .update_account(user_id, &outcome.patch, outcome.guard.as_ref())
            .await?;
        if !applied {
            tracing::warn!("Balance of user {} changed during update", user_id);
            return Err(AppError::Conflict(
                "Balance changed, please retry.".to_string(),
            ));
        }

        Ok(())
    }
}
