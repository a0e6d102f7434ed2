// In memory implementation of the dispute and payment store ports.
//
// Purpose
// - Support engine and shell tests and local development without a database.
//
// Responsibilities
// - Keep aggregates in maps behind one lock so check-then-write operations
//   (resolution, balance adjust) are row-atomic the way a relational store
//   would make them.
// - Offer an offline switch so failure paths can be exercised.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::core::dispute::{
    Dispute, DisputeComment, DisputeReason, DisputeStatus, ResolutionUpdate,
};
use crate::core::money::Money;
use crate::core::payment::{PaymentMethod, PaymentMethodType, WalletTransaction};
use crate::core::ports::{DisputeStore, PageOf, PaymentStore, StoreError};

#[derive(Default)]
struct Rows {
    disputes: HashMap<Uuid, Dispute>,
    comments: Vec<DisputeComment>,
    methods: HashMap<Uuid, PaymentMethod>,
    transactions: Vec<WalletTransaction>,
}

#[derive(Default)]
pub struct InMemoryStore {
    rows: Mutex<Rows>,
    offline: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that fails every call, for 500-path and degradation tests.
    pub fn offline() -> Self {
        let store = Self::default();
        store.offline.store(true, Ordering::Relaxed);
        store
    }

    pub fn toggle_offline(&self) {
        self.offline.fetch_xor(true, Ordering::Relaxed);
    }

    fn lock(&self) -> Result<MutexGuard<'_, Rows>, StoreError> {
        if self.offline.load(Ordering::Relaxed) {
            return Err(StoreError::Backend("store offline".to_string()));
        }
        self.rows
            .lock()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))
    }

    /// Test seeding: an active card owned by `user_id`.
    pub fn seed_card(&self, user_id: Uuid) -> Uuid {
        let id = Uuid::now_v7();
        let card = PaymentMethod {
            id,
            user_id,
            kind: PaymentMethodType::Card,
            card_last4: Some("4242".to_string()),
            card_brand: Some("visa".to_string()),
            card_exp_month: Some(12),
            card_exp_year: Some(2030),
            card_holder: Some("Test Holder".to_string()),
            provider_token: Some(format!("tok_{id}")),
            balance: None,
            currency: None,
            is_default: true,
            is_active: true,
            created_at: Utc::now(),
        };
        self.rows
            .lock()
            .expect("store lock poisoned")
            .methods
            .insert(id, card);
        id
    }

    /// Test inspection: every ledger entry for a wallet, oldest first.
    pub fn ledger_of(&self, wallet_id: Uuid) -> Vec<WalletTransaction> {
        let rows = self.rows.lock().expect("store lock poisoned");
        let mut entries: Vec<_> = rows
            .transactions
            .iter()
            .filter(|t| t.payment_method_id == wallet_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        entries
    }
}

fn page<T: Clone>(mut rows: Vec<T>, limit: u64, offset: u64) -> PageOf<T> {
    let total = rows.len() as u64;
    let start = (offset as usize).min(rows.len());
    let end = (start + limit as usize).min(rows.len());
    (rows.drain(start..end).collect(), total)
}

#[async_trait]
impl DisputeStore for InMemoryStore {
    async fn insert_dispute(&self, dispute: Dispute) -> Result<(), StoreError> {
        self.lock()?.disputes.insert(dispute.id, dispute);
        Ok(())
    }

    async fn get_dispute(&self, id: Uuid) -> Result<Dispute, StoreError> {
        self.lock()?
            .disputes
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn find_active_dispute(
        &self,
        ride_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Dispute>, StoreError> {
        Ok(self
            .lock()?
            .disputes
            .values()
            .find(|d| d.ride_id == ride_id && d.user_id == user_id && d.status.is_active())
            .cloned())
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        status: Option<DisputeStatus>,
        limit: u64,
        offset: u64,
    ) -> Result<PageOf<Dispute>, StoreError> {
        let mut rows: Vec<_> = self
            .lock()?
            .disputes
            .values()
            .filter(|d| d.user_id == user_id)
            .filter(|d| status.is_none_or(|s| d.status == s))
            .cloned()
            .collect();
        rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(page(rows, limit, offset))
    }

    async fn list_all(
        &self,
        status: Option<DisputeStatus>,
        reason: Option<DisputeReason>,
        limit: u64,
        offset: u64,
    ) -> Result<PageOf<Dispute>, StoreError> {
        let mut rows: Vec<_> = self
            .lock()?
            .disputes
            .values()
            .filter(|d| status.is_none_or(|s| d.status == s))
            .filter(|d| reason.is_none_or(|r| d.reason == r))
            .cloned()
            .collect();
        rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(page(rows, limit, offset))
    }

    async fn apply_resolution(
        &self,
        id: Uuid,
        update: ResolutionUpdate,
    ) -> Result<Option<Dispute>, StoreError> {
        let mut rows = self.lock()?;
        let dispute = rows.disputes.get_mut(&id).ok_or(StoreError::NotFound)?;
        if !dispute.status.is_resolvable() {
            return Ok(None);
        }
        dispute.status = update.status;
        dispute.resolution_type = Some(update.resolution_type);
        dispute.refund_amount = update.refund_amount;
        dispute.resolution_note = Some(update.note);
        dispute.resolved_by = Some(update.resolved_by);
        dispute.resolved_at = Some(update.resolved_at);
        dispute.updated_at = update.resolved_at;
        Ok(Some(dispute.clone()))
    }

    async fn mark_reviewing_if_pending(&self, id: Uuid) -> Result<(), StoreError> {
        let mut rows = self.lock()?;
        let dispute = rows.disputes.get_mut(&id).ok_or(StoreError::NotFound)?;
        if dispute.status == DisputeStatus::Pending {
            dispute.status = DisputeStatus::Reviewing;
            dispute.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn insert_comment(&self, comment: DisputeComment) -> Result<(), StoreError> {
        self.lock()?.comments.push(comment);
        Ok(())
    }

    async fn list_comments(&self, dispute_id: Uuid) -> Result<Vec<DisputeComment>, StoreError> {
        let mut rows: Vec<_> = self
            .lock()?
            .comments
            .iter()
            .filter(|c| c.dispute_id == dispute_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        Ok(rows)
    }

    async fn list_created_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Dispute>, StoreError> {
        Ok(self
            .lock()?
            .disputes
            .values()
            .filter(|d| d.created_at >= from && d.created_at < to)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PaymentStore for InMemoryStore {
    async fn get_payment_method(&self, id: Uuid) -> Result<PaymentMethod, StoreError> {
        self.lock()?
            .methods
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn find_wallet(&self, user_id: Uuid) -> Result<Option<PaymentMethod>, StoreError> {
        Ok(self
            .lock()?
            .methods
            .values()
            .find(|m| m.user_id == user_id && m.kind == PaymentMethodType::Wallet)
            .cloned())
    }

    async fn create_wallet(
        &self,
        user_id: Uuid,
        currency: &str,
    ) -> Result<PaymentMethod, StoreError> {
        let mut rows = self.lock()?;
        if let Some(existing) = rows
            .methods
            .values()
            .find(|m| m.user_id == user_id && m.kind == PaymentMethodType::Wallet)
        {
            return Ok(existing.clone());
        }
        let wallet = PaymentMethod::new_wallet(user_id, currency);
        rows.methods.insert(wallet.id, wallet.clone());
        Ok(wallet)
    }

    async fn adjust_wallet_balance(
        &self,
        wallet_id: Uuid,
        delta: Money,
    ) -> Result<Money, StoreError> {
        let mut rows = self.lock()?;
        let wallet = rows.methods.get_mut(&wallet_id).ok_or(StoreError::NotFound)?;
        let new_balance = wallet.current_balance() + delta;
        wallet.balance = Some(new_balance);
        Ok(new_balance)
    }

    async fn insert_transaction(&self, tx: WalletTransaction) -> Result<(), StoreError> {
        self.lock()?.transactions.push(tx);
        Ok(())
    }

    async fn recent_transactions(
        &self,
        wallet_id: Uuid,
        limit: u64,
    ) -> Result<Vec<WalletTransaction>, StoreError> {
        let mut rows: Vec<_> = self
            .lock()?
            .transactions
            .iter()
            .filter(|t| t.payment_method_id == wallet_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        rows.truncate(limit as usize);
        Ok(rows)
    }
}
