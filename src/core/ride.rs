// Read-only projection of a ride supplied by the ride-record service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::money::Money;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RideContext {
    pub ride_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub estimated_fare: Money,
    pub final_fare: Option<Money>,
    pub estimated_distance_km: Option<f64>,
    pub actual_distance_km: Option<f64>,
    pub estimated_duration_min: Option<f64>,
    pub actual_duration_min: Option<f64>,
    pub surge_multiplier: Option<f64>,
    pub pickup_address: Option<String>,
    pub dropoff_address: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl RideContext {
    /// The upper bound for a disputed amount: the final fare when the ride
    /// service has settled one, otherwise the estimate.
    pub fn fare_baseline(&self) -> Money {
        self.final_fare.unwrap_or(self.estimated_fare)
    }
}
