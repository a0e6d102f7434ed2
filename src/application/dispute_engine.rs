// Dispute resolution engine: filing preconditions, the status state machine,
// the threaded comment log and resolution with refund derivation.
//
// Every command validates against the aggregate it first read, then writes
// through the store in one row-atomic step. Authorization on ownership is a
// plain precondition here; role gating (admin vs user) happens at the edge.

use std::sync::Arc;

use chrono::{Days, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use crate::application::dispute_stats::{self, DisputeStats};
use crate::application::errors::ApiError;
use crate::core::dispute::{
    COMMENT_MAX, DESCRIPTION_MAX, DESCRIPTION_MIN, DISPUTE_WINDOW_DAYS, CommentRole, Dispute,
    DisputeComment, DisputeReason, DisputeStatus, ResolutionType, ResolutionUpdate,
    mint_dispute_number,
};
use crate::core::money::Money;
use crate::core::ports::{DisputeStore, RideLookup, StoreError};
use crate::core::ride::RideContext;

pub const USER_PAGE_MAX: u64 = 50;
pub const ADMIN_PAGE_MAX: u64 = 100;
const DEFAULT_PAGE_SIZE: u64 = 20;

/// Pagination input, clamped to sane bounds before it reaches the store.
#[derive(Debug, Clone, Copy)]
pub struct PageParams {
    pub page: u64,
    pub page_size: u64,
}

impl PageParams {
    pub fn clamped(page: Option<u64>, page_size: Option<u64>, max_page_size: u64) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, max_page_size),
        }
    }

    pub fn offset(self) -> u64 {
        (self.page - 1) * self.page_size
    }
}

#[derive(Debug, Clone)]
pub struct FileDispute {
    pub ride_id: Uuid,
    pub reason: DisputeReason,
    pub description: String,
    pub disputed_amount: Money,
    pub evidence: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ResolveDispute {
    pub resolution_type: ResolutionType,
    pub refund_amount: Option<Money>,
    pub note: String,
}

/// A dispute projected for one read path. `comments` is already role-scoped.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DisputeDetail {
    pub dispute: Dispute,
    pub ride: Option<RideContext>,
    pub comments: Vec<DisputeComment>,
}

pub struct DisputeEngine<S, R> {
    store: Arc<S>,
    rides: Arc<R>,
}

impl<S, R> DisputeEngine<S, R>
where
    S: DisputeStore + 'static,
    R: RideLookup + 'static,
{
    pub fn new(store: Arc<S>, rides: Arc<R>) -> Self {
        Self { store, rides }
    }

    /// File a dispute against a completed ride. Preconditions run in order,
    /// all before any write.
    pub async fn file_dispute(&self, rider_id: Uuid, cmd: FileDispute) -> Result<Dispute, ApiError> {
        let description = cmd.description.trim().to_string();
        let len = description.chars().count();
        if !(DESCRIPTION_MIN..=DESCRIPTION_MAX).contains(&len) {
            return Err(ApiError::bad_request(format!(
                "description must be between {DESCRIPTION_MIN} and {DESCRIPTION_MAX} characters"
            )));
        }
        if cmd.disputed_amount <= Money::ZERO {
            return Err(ApiError::bad_request("disputed amount must be positive"));
        }

        let ride = self
            .rides
            .lookup(cmd.ride_id)
            .await?
            .ok_or_else(|| ApiError::not_found("ride not found"))?;

        let completed_at = ride
            .completed_at
            .ok_or_else(|| ApiError::bad_request("can only dispute completed rides"))?;

        let now = Utc::now();
        if now - completed_at > chrono::Duration::days(DISPUTE_WINDOW_DAYS) {
            return Err(ApiError::bad_request(format!(
                "disputes must be filed within {DISPUTE_WINDOW_DAYS} days of ride completion"
            )));
        }

        let original_fare = ride.fare_baseline();
        if cmd.disputed_amount > original_fare {
            return Err(ApiError::bad_request(
                "disputed amount cannot exceed the ride fare",
            ));
        }

        if self
            .store
            .find_active_dispute(cmd.ride_id, rider_id)
            .await?
            .is_some()
        {
            return Err(ApiError::conflict(
                "you already have an active dispute for this ride",
            ));
        }

        let dispute = Dispute {
            id: Uuid::now_v7(),
            number: mint_dispute_number(),
            ride_id: cmd.ride_id,
            user_id: rider_id,
            driver_id: ride.driver_id,
            reason: cmd.reason,
            description: description.clone(),
            status: DisputeStatus::Pending,
            original_fare,
            disputed_amount: cmd.disputed_amount,
            refund_amount: None,
            resolution_type: None,
            resolution_note: None,
            evidence: cmd.evidence,
            resolved_by: None,
            created_at: now,
            updated_at: now,
            resolved_at: None,
        };
        self.store.insert_dispute(dispute.clone()).await?;

        tracing::info!(
            dispute_id = %dispute.id,
            number = %dispute.number,
            ride_id = %dispute.ride_id,
            reason = %dispute.reason,
            "dispute filed"
        );

        // Opening comment mirrors the description. The dispute row is the
        // source of truth, so a failed append only warns.
        let opening = comment(dispute.id, rider_id, CommentRole::User, description, false);
        if let Err(err) = self.store.insert_comment(opening).await {
            tracing::warn!(dispute_id = %dispute.id, %err, "opening comment not persisted");
        }

        Ok(dispute)
    }

    /// A rider's own disputes, newest first.
    pub async fn my_disputes(
        &self,
        rider_id: Uuid,
        status: Option<DisputeStatus>,
        page: PageParams,
    ) -> Result<(Vec<Dispute>, u64), ApiError> {
        Ok(self
            .store
            .list_for_user(rider_id, status, page.page_size, page.offset())
            .await?)
    }

    pub async fn dispute_detail(
        &self,
        dispute_id: Uuid,
        rider_id: Uuid,
    ) -> Result<DisputeDetail, ApiError> {
        let dispute = self.get_owned(dispute_id, rider_id).await?;
        let ride = self.ride_context(dispute.ride_id).await;
        let comments = self
            .store
            .list_comments(dispute_id)
            .await?
            .into_iter()
            .filter(|c| !c.internal)
            .collect();
        Ok(DisputeDetail {
            dispute,
            ride,
            comments,
        })
    }

    pub async fn add_user_comment(
        &self,
        dispute_id: Uuid,
        rider_id: Uuid,
        body: String,
    ) -> Result<DisputeComment, ApiError> {
        let dispute = self.get_owned(dispute_id, rider_id).await?;
        if !dispute.status.accepts_user_comments() {
            return Err(ApiError::bad_request(
                "cannot comment on a closed or rejected dispute",
            ));
        }
        let body = valid_comment_body(body)?;
        let c = comment(dispute_id, rider_id, CommentRole::User, body, false);
        self.store.insert_comment(c.clone()).await?;
        Ok(c)
    }

    pub async fn admin_list(
        &self,
        status: Option<DisputeStatus>,
        reason: Option<DisputeReason>,
        page: PageParams,
    ) -> Result<(Vec<Dispute>, u64), ApiError> {
        Ok(self
            .store
            .list_all(status, reason, page.page_size, page.offset())
            .await?)
    }

    /// Same shape as the rider detail, internal comments included.
    pub async fn admin_detail(&self, dispute_id: Uuid) -> Result<DisputeDetail, ApiError> {
        let dispute = self.get_existing(dispute_id).await?;
        let ride = self.ride_context(dispute.ride_id).await;
        let comments = self.store.list_comments(dispute_id).await?;
        Ok(DisputeDetail {
            dispute,
            ride,
            comments,
        })
    }

    pub async fn admin_resolve(
        &self,
        dispute_id: Uuid,
        admin_id: Uuid,
        cmd: ResolveDispute,
    ) -> Result<Dispute, ApiError> {
        let dispute = self.get_existing(dispute_id).await?;
        if !dispute.status.is_resolvable() {
            return Err(ApiError::bad_request("dispute already resolved"));
        }

        let refund_amount =
            derive_refund(cmd.resolution_type, cmd.refund_amount, dispute.original_fare)?;
        let update = ResolutionUpdate {
            status: cmd.resolution_type.resulting_status(),
            resolution_type: cmd.resolution_type,
            refund_amount,
            note: cmd.note.clone(),
            resolved_by: admin_id,
            resolved_at: Utc::now(),
        };

        // The store re-checks resolvability under the row lock; a concurrent
        // resolve that lost the race surfaces as `None` here.
        let resolved = self
            .store
            .apply_resolution(dispute_id, update)
            .await
            .map_err(map_dispute_store_err)?
            .ok_or_else(|| ApiError::bad_request("dispute already resolved"))?;

        tracing::info!(
            dispute_id = %resolved.id,
            resolution = %cmd.resolution_type,
            status = %resolved.status,
            "dispute resolved"
        );

        let body = format!("Dispute resolved: {} - {}", cmd.resolution_type, cmd.note);
        let c = comment(dispute_id, admin_id, CommentRole::Admin, body, false);
        if let Err(err) = self.store.insert_comment(c).await {
            tracing::warn!(dispute_id = %dispute_id, %err, "resolution comment not persisted");
        }

        Ok(resolved)
    }

    /// Admin comment; the first one moves a pending dispute into review.
    pub async fn admin_add_comment(
        &self,
        dispute_id: Uuid,
        admin_id: Uuid,
        body: String,
        internal: bool,
    ) -> Result<DisputeComment, ApiError> {
        let dispute = self.get_existing(dispute_id).await?;
        let body = valid_comment_body(body)?;
        let c = comment(dispute_id, admin_id, CommentRole::Admin, body, internal);
        self.store.insert_comment(c.clone()).await?;
        if dispute.status == DisputeStatus::Pending {
            self.store.mark_reviewing_if_pending(dispute_id).await?;
        }
        Ok(c)
    }

    /// Analytics over disputes created in `[from, to]` (calendar dates,
    /// `to` inclusive).
    pub async fn admin_stats(&self, from: NaiveDate, to: NaiveDate) -> Result<DisputeStats, ApiError> {
        if from > to {
            return Err(ApiError::bad_request("from must not be after to"));
        }
        let start = from.and_time(NaiveTime::MIN).and_utc();
        let end = to
            .checked_add_days(Days::new(1))
            .ok_or_else(|| ApiError::bad_request("invalid date range"))?
            .and_time(NaiveTime::MIN)
            .and_utc();

        let disputes = self.store.list_created_between(start, end).await?;
        let rides = self.rides.count_rides_between(start, end).await?;
        Ok(dispute_stats::compute(&disputes, rides))
    }

    async fn get_existing(&self, dispute_id: Uuid) -> Result<Dispute, ApiError> {
        self.store
            .get_dispute(dispute_id)
            .await
            .map_err(map_dispute_store_err)
    }

    async fn get_owned(&self, dispute_id: Uuid, rider_id: Uuid) -> Result<Dispute, ApiError> {
        let dispute = self.get_existing(dispute_id).await?;
        if dispute.user_id != rider_id {
            return Err(ApiError::forbidden("not your dispute"));
        }
        Ok(dispute)
    }

    /// Ride context is best-effort on read paths; a lookup failure degrades
    /// the detail to `ride: null` instead of failing the read.
    async fn ride_context(&self, ride_id: Uuid) -> Option<RideContext> {
        match self.rides.lookup(ride_id).await {
            Ok(ride) => ride,
            Err(err) => {
                tracing::warn!(%ride_id, %err, "ride context unavailable");
                None
            }
        }
    }
}

fn map_dispute_store_err(err: StoreError) -> ApiError {
    match err {
        StoreError::NotFound => ApiError::not_found("dispute not found"),
        other => other.into(),
    }
}

fn valid_comment_body(body: String) -> Result<String, ApiError> {
    let body = body.trim().to_string();
    let len = body.chars().count();
    if len == 0 || len > COMMENT_MAX {
        return Err(ApiError::bad_request(format!(
            "comment must be between 1 and {COMMENT_MAX} characters"
        )));
    }
    Ok(body)
}

fn comment(
    dispute_id: Uuid,
    author_id: Uuid,
    role: CommentRole,
    body: String,
    internal: bool,
) -> DisputeComment {
    DisputeComment {
        id: Uuid::now_v7(),
        dispute_id,
        author_id,
        role,
        body,
        internal,
        created_at: Utc::now(),
    }
}

/// The resolution-type table: resulting refund per type. `full_refund`
/// overrides whatever the caller supplied; the rest validate against the
/// original fare so no resolved dispute ever refunds more than was paid.
fn derive_refund(
    resolution_type: ResolutionType,
    supplied: Option<Money>,
    original_fare: Money,
) -> Result<Option<Money>, ApiError> {
    let validated = |amount: Money| -> Result<Money, ApiError> {
        if amount <= Money::ZERO {
            return Err(ApiError::bad_request("refund amount must be positive"));
        }
        if amount > original_fare {
            return Err(ApiError::bad_request(
                "refund cannot exceed the original fare",
            ));
        }
        Ok(amount)
    };

    match resolution_type {
        ResolutionType::FullRefund => Ok(Some(original_fare)),
        ResolutionType::PartialRefund => {
            let amount = supplied.ok_or_else(|| {
                ApiError::bad_request("partial refund requires a refund amount")
            })?;
            Ok(Some(validated(amount)?))
        }
        ResolutionType::FareAdjustment => {
            let amount = supplied.ok_or_else(|| {
                ApiError::bad_request("fare adjustment requires a refund amount")
            })?;
            Ok(Some(validated(amount)?))
        }
        ResolutionType::Credits | ResolutionType::NoAction => {
            supplied.map(validated).transpose()
        }
    }
}
