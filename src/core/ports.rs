// Ports define what the core needs from the outside world, without implementing it.
//
// Purpose
// - Describe abstract storage and lookup capabilities as traits
//   (DisputeStore, PaymentStore, RideLookup).
//
// Responsibilities
// - Keep the engines independent of any database or upstream service by
//   coding against traits.
//
// Boundaries
// - No concrete input or output here. Adapters implement these traits in the
//   adapters layer.
//
// Testing guidance
// - Provide in memory implementations for tests and local development.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::core::dispute::{Dispute, DisputeComment, DisputeReason, DisputeStatus, ResolutionUpdate};
use crate::core::money::Money;
use crate::core::payment::{PaymentMethod, WalletTransaction};
use crate::core::ride::RideContext;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The addressed row does not exist. Distinct from I/O failure so the
    /// engines can map it to a 404 instead of a 500.
    #[error("row not found")]
    NotFound,

    #[error("backend error: {0}")]
    Backend(String),
}

/// A slice of rows plus the total count for pagination.
pub type PageOf<T> = (Vec<T>, u64);

#[async_trait]
pub trait DisputeStore: Send + Sync {
    async fn insert_dispute(&self, dispute: Dispute) -> Result<(), StoreError>;

    async fn get_dispute(&self, id: Uuid) -> Result<Dispute, StoreError>;

    /// The active (non-closed, non-rejected) dispute for a (ride, rider)
    /// pair, if one exists. The uniqueness constraint allows at most one.
    async fn find_active_dispute(
        &self,
        ride_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Dispute>, StoreError>;

    /// A rider's disputes, created-at descending.
    async fn list_for_user(
        &self,
        user_id: Uuid,
        status: Option<DisputeStatus>,
        limit: u64,
        offset: u64,
    ) -> Result<PageOf<Dispute>, StoreError>;

    /// All disputes, created-at descending, with optional filters.
    async fn list_all(
        &self,
        status: Option<DisputeStatus>,
        reason: Option<DisputeReason>,
        limit: u64,
        offset: u64,
    ) -> Result<PageOf<Dispute>, StoreError>;

    /// Row-atomic check-then-write of the resolution fields. Returns
    /// `Ok(None)` when the dispute is no longer resolvable, so a racing
    /// second resolve loses cleanly.
    async fn apply_resolution(
        &self,
        id: Uuid,
        update: ResolutionUpdate,
    ) -> Result<Option<Dispute>, StoreError>;

    /// pending -> reviewing, a no-op in any other status.
    async fn mark_reviewing_if_pending(&self, id: Uuid) -> Result<(), StoreError>;

    async fn insert_comment(&self, comment: DisputeComment) -> Result<(), StoreError>;

    /// All comments of a dispute, created-at ascending. Role scoping is the
    /// engine's concern.
    async fn list_comments(&self, dispute_id: Uuid) -> Result<Vec<DisputeComment>, StoreError>;

    /// Disputes with `created_at` in `[from, to)`, for analytics.
    async fn list_created_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Dispute>, StoreError>;
}

#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn get_payment_method(&self, id: Uuid) -> Result<PaymentMethod, StoreError>;

    async fn find_wallet(&self, user_id: Uuid) -> Result<Option<PaymentMethod>, StoreError>;

    /// Create the user's wallet, or return the existing one. A user holds at
    /// most one wallet.
    async fn create_wallet(&self, user_id: Uuid, currency: &str)
    -> Result<PaymentMethod, StoreError>;

    /// Row-atomic read-modify-write of the wallet balance. Returns the
    /// post-adjustment balance. This is the single serialisation point for a
    /// wallet's balance-changing commands.
    async fn adjust_wallet_balance(&self, wallet_id: Uuid, delta: Money)
    -> Result<Money, StoreError>;

    async fn insert_transaction(&self, tx: WalletTransaction) -> Result<(), StoreError>;

    /// The most recent ledger entries for a wallet, newest first.
    async fn recent_transactions(
        &self,
        wallet_id: Uuid,
        limit: u64,
    ) -> Result<Vec<WalletTransaction>, StoreError>;
}

#[async_trait]
pub trait RideLookup: Send + Sync {
    async fn lookup(&self, ride_id: Uuid) -> Result<Option<RideContext>, StoreError>;

    /// Rides requested in `[from, to)`; the denominator of the dispute rate.
    async fn count_rides_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<u64, StoreError>;
}
