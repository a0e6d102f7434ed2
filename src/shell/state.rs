use std::sync::Arc;

use crate::adapters::in_memory::in_memory_ride_lookup::InMemoryRideLookup;
use crate::adapters::in_memory::in_memory_store::InMemoryStore;
use crate::application::dispute_engine::DisputeEngine;
use crate::application::wallet_ledger::{WalletConfig, WalletLedger};

pub type Disputes = DisputeEngine<InMemoryStore, InMemoryRideLookup>;
pub type Wallet = WalletLedger<InMemoryStore>;

#[derive(Clone)]
pub struct AppState {
    pub disputes: Arc<Disputes>,
    pub wallet: Arc<Wallet>,
}

impl AppState {
    /// Engines wired over fresh in-memory adapters. Returns the adapters too
    /// so callers (main, tests) can seed them.
    pub fn in_memory(config: WalletConfig) -> (Self, Arc<InMemoryStore>, Arc<InMemoryRideLookup>) {
        let store = Arc::new(InMemoryStore::new());
        let rides = Arc::new(InMemoryRideLookup::new());
        let state = Self {
            disputes: Arc::new(DisputeEngine::new(store.clone(), rides.clone())),
            wallet: Arc::new(WalletLedger::new(store.clone(), config)),
        };
        (state, store, rides)
    }
}
