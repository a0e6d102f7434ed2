// Dispute aggregate: the root entity, its comment children and the status
// state machine. Pure data and transitions, no I/O.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::core::money::Money;

/// Riders can dispute a fare for up to 30 days after ride completion.
pub const DISPUTE_WINDOW_DAYS: i64 = 30;

pub const DESCRIPTION_MIN: usize = 10;
pub const DESCRIPTION_MAX: usize = 2000;
pub const COMMENT_MAX: usize = 2000;

#[derive(Debug, Error)]
#[error("unknown value: {0}")]
pub struct ParseEnumError(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeStatus {
    Pending,
    Reviewing,
    Approved,
    Rejected,
    PartialRefund,
    Closed,
}

impl DisputeStatus {
    /// Active disputes block a second filing for the same (ride, rider) pair.
    pub fn is_active(self) -> bool {
        !matches!(self, Self::Closed | Self::Rejected)
    }

    /// Only pending and reviewing disputes accept a resolution.
    pub fn is_resolvable(self) -> bool {
        matches!(self, Self::Pending | Self::Reviewing)
    }

    /// Riders cannot comment once the dispute is closed or rejected.
    pub fn accepts_user_comments(self) -> bool {
        !matches!(self, Self::Closed | Self::Rejected)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Reviewing => "reviewing",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::PartialRefund => "partial_refund",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for DisputeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisputeStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "reviewing" => Ok(Self::Reviewing),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "partial_refund" => Ok(Self::PartialRefund),
            "closed" => Ok(Self::Closed),
            other => Err(ParseEnumError(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeReason {
    WrongRoute,
    Overcharged,
    TripNotTaken,
    DriverDetour,
    WrongFare,
    UnfairSurge,
    WrongWaitTime,
    WrongCancelFee,
    DuplicateCharge,
    Other,
}

impl DisputeReason {
    pub const ALL: [DisputeReason; 10] = [
        Self::WrongRoute,
        Self::Overcharged,
        Self::TripNotTaken,
        Self::DriverDetour,
        Self::WrongFare,
        Self::UnfairSurge,
        Self::WrongWaitTime,
        Self::WrongCancelFee,
        Self::DuplicateCharge,
        Self::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::WrongRoute => "wrong_route",
            Self::Overcharged => "overcharged",
            Self::TripNotTaken => "trip_not_taken",
            Self::DriverDetour => "driver_detour",
            Self::WrongFare => "wrong_fare",
            Self::UnfairSurge => "unfair_surge",
            Self::WrongWaitTime => "wrong_wait_time",
            Self::WrongCancelFee => "wrong_cancel_fee",
            Self::DuplicateCharge => "duplicate_charge",
            Self::Other => "other",
        }
    }

    /// Rider-facing label for the reason catalogue endpoint.
    pub fn label(self) -> &'static str {
        match self {
            Self::WrongRoute => "Driver took the wrong route",
            Self::Overcharged => "I was overcharged",
            Self::TripNotTaken => "I did not take this trip",
            Self::DriverDetour => "Driver took an unnecessary detour",
            Self::WrongFare => "Fare differs from the estimate",
            Self::UnfairSurge => "Unfair surge pricing",
            Self::WrongWaitTime => "Incorrect wait time charge",
            Self::WrongCancelFee => "Incorrect cancellation fee",
            Self::DuplicateCharge => "I was charged twice",
            Self::Other => "Something else",
        }
    }
}

impl fmt::Display for DisputeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisputeReason {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| ParseEnumError(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionType {
    FullRefund,
    PartialRefund,
    Credits,
    NoAction,
    FareAdjustment,
}

impl ResolutionType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FullRefund => "full_refund",
            Self::PartialRefund => "partial_refund",
            Self::Credits => "credits",
            Self::NoAction => "no_action",
            Self::FareAdjustment => "fare_adjustment",
        }
    }

    /// The status a dispute lands in when resolved this way.
    pub fn resulting_status(self) -> DisputeStatus {
        match self {
            Self::FullRefund | Self::Credits | Self::FareAdjustment => DisputeStatus::Approved,
            Self::PartialRefund => DisputeStatus::PartialRefund,
            Self::NoAction => DisputeStatus::Rejected,
        }
    }
}

impl fmt::Display for ResolutionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentRole {
    User,
    Admin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dispute {
    pub id: Uuid,
    /// Cosmetic rider-facing number, `DSP-` + 6 digits. Not unique; the id is
    /// authoritative.
    pub number: String,
    pub ride_id: Uuid,
    pub user_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub reason: DisputeReason,
    pub description: String,
    pub status: DisputeStatus,
    pub original_fare: Money,
    pub disputed_amount: Money,
    pub refund_amount: Option<Money>,
    pub resolution_type: Option<ResolutionType>,
    pub resolution_note: Option<String>,
    pub evidence: Vec<String>,
    pub resolved_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisputeComment {
    pub id: Uuid,
    pub dispute_id: Uuid,
    pub author_id: Uuid,
    pub role: CommentRole,
    pub body: String,
    /// Internal comments are visible through admin read paths only.
    pub internal: bool,
    pub created_at: DateTime<Utc>,
}

/// The fields a resolution writes in one row-atomic step.
#[derive(Debug, Clone)]
pub struct ResolutionUpdate {
    pub status: DisputeStatus,
    pub resolution_type: ResolutionType,
    pub refund_amount: Option<Money>,
    pub note: String,
    pub resolved_by: Uuid,
    pub resolved_at: DateTime<Utc>,
}

/// Mint a rider-facing dispute number from a uniform 6-digit draw.
pub fn mint_dispute_number() -> String {
    use rand::Rng;
    let n: u32 = rand::rngs::OsRng.gen_range(0..=999_999);
    format!("DSP-{n:06}")
}
