use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use super::Store;
use crate::{
    error::{AppError, Result},
    models::*,
};

fn apply_patch(patch: &AccountPatch, account: &mut UserAccount) {
    if let Some(score) = patch.total_score {
        account.total_score = score;
    }
    if let Some(tickets) = patch.ticket_left {
        account.ticket_left = tickets;
    }
    if let Some(usdt) = patch.usdt_balance {
        account.usdt_balance = usdt;
    }
    if let Some(ads) = patch.ads_left {
        account.ads_left = ads;
    }
    if let Some(joined) = patch.is_joined {
        account.is_joined = joined;
    }
    if let Some(uid) = &patch.binance_uid {
        account.binance_uid = Some(uid.clone());
    }
}

/// Mirrors the `eq.` filters the REST store adds to a guarded PATCH.
fn guard_matches(guard: &BalanceGuard, account: &UserAccount) -> bool {
    guard
        .total_score
        .map_or(true, |score| account.total_score == score)
        && guard
            .usdt_balance
            .map_or(true, |usdt| account.usdt_balance == usdt)
}

/// In-process `Store` for handler tests.
#[derive(Default)]
pub struct MemoryStore {
    accounts: Mutex<HashMap<i64, UserAccount>>,
    actions: Mutex<Vec<ActionLogEntry>>,
    audit_attempts: AtomicUsize,
    updates: AtomicUsize,
    pub fail_audit: AtomicBool,
    pub fail_reads: AtomicBool,
    /// Applied right before the next update, as if another request got there first.
    concurrent_write: Mutex<Option<AccountPatch>>,
    /// Row another request manages to insert just before ours; `None` inside drops it.
    insert_winner: Mutex<Option<Option<UserAccount>>>,
}

impl MemoryStore {
    pub fn with_account(account: UserAccount) -> Self {
        let store = Self::default();
        store
            .accounts
            .lock()
            .unwrap()
            .insert(account.id, account);
        store
    }

    pub fn account(&self, id: i64) -> Option<UserAccount> {
        self.accounts.lock().unwrap().get(&id).cloned()
    }

    pub fn logged_actions(&self) -> Vec<ActionLogEntry> {
        self.actions.lock().unwrap().clone()
    }

    pub fn audit_attempts(&self) -> usize {
        self.audit_attempts.load(Ordering::SeqCst)
    }

    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn interleave_write(&self, patch: AccountPatch) {
        *self.concurrent_write.lock().unwrap() = Some(patch);
    }

    /// Makes the next insert lose to `winner`, stored as if a concurrent request created it.
    /// With `None` the insert still conflicts but no row can be read back.
    pub fn lose_insert_race(&self, winner: Option<UserAccount>) {
        *self.insert_winner.lock().unwrap() = Some(winner);
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn find_account(&self, id: i64) -> Result<Option<UserAccount>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(AppError::Database(
                "users GET failed with 503 Service Unavailable".to_string(),
            ));
        }
        Ok(self.account(id))
    }

    async fn insert_account(&self, account: &UserAccount) -> Result<Option<UserAccount>> {
        let mut accounts = self.accounts.lock().unwrap();
        if let Some(winner) = self.insert_winner.lock().unwrap().take() {
            if let Some(row) = winner {
                accounts.insert(row.id, row);
            }
            return Ok(None);
        }
        if accounts.contains_key(&account.id) {
            return Ok(None);
        }
        accounts.insert(account.id, account.clone());
        Ok(Some(account.clone()))
    }

    async fn update_account(
        &self,
        id: i64,
        patch: &AccountPatch,
        guard: Option<&BalanceGuard>,
    ) -> Result<bool> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        let mut accounts = self.accounts.lock().unwrap();
        let Some(account) = accounts.get_mut(&id) else {
            return Ok(false);
        };

        if let Some(concurrent) = self.concurrent_write.lock().unwrap().take() {
            apply_patch(&concurrent, account);
        }
        if let Some(guard) = guard {
            if !guard_matches(guard, account) {
                return Ok(false);
            }
        }
        apply_patch(patch, account);
        Ok(true)
    }

    async fn append_action(&self, entry: &ActionLogEntry) -> Result<()> {
        self.audit_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_audit.load(Ordering::SeqCst) {
            return Err(AppError::Database(
                "actions_log insert returned 500".to_string(),
            ));
        }
        self.actions.lock().unwrap().push(entry.clone());
        Ok(())
    }
}
