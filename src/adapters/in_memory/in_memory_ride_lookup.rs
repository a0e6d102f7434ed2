// In memory implementation of the ride lookup port, seeded by tests with
// whatever ride facts a scenario needs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::core::ports::{RideLookup, StoreError};
use crate::core::ride::RideContext;

#[derive(Default)]
pub struct InMemoryRideLookup {
    rides: Mutex<HashMap<Uuid, RideContext>>,
    offline: AtomicBool,
}

impl InMemoryRideLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, ride: RideContext) {
        self.rides
            .lock()
            .expect("ride lock poisoned")
            .insert(ride.ride_id, ride);
    }

    pub fn toggle_offline(&self) {
        self.offline.fetch_xor(true, Ordering::Relaxed);
    }

    fn guard(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::Relaxed) {
            return Err(StoreError::Backend("ride service offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RideLookup for InMemoryRideLookup {
    async fn lookup(&self, ride_id: Uuid) -> Result<Option<RideContext>, StoreError> {
        self.guard()?;
        Ok(self
            .rides
            .lock()
            .map_err(|_| StoreError::Backend("ride lock poisoned".to_string()))?
            .get(&ride_id)
            .cloned())
    }

    async fn count_rides_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        self.guard()?;
        Ok(self
            .rides
            .lock()
            .map_err(|_| StoreError::Backend("ride lock poisoned".to_string()))?
            .values()
            .filter(|r| r.requested_at >= from && r.requested_at < to)
            .count() as u64)
    }
}
