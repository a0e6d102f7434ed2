// Crate entry point. Re-export modules so tests and binaries can import them easily.
//
// Responsibilities
// - Only declare and expose modules. No business logic here.
//
// How it is used
// - Tests import modules from this crate root to reach the code under test.

pub mod config;

pub mod core {
    pub mod dispute;
    pub mod money;
    pub mod payment;
    pub mod ports;
    pub mod ride;
}

pub mod application {
    pub mod dispute_engine;
    pub mod dispute_stats;
    pub mod errors;
    pub mod wallet_ledger;
}

pub mod adapters {
    pub mod in_memory {
        pub mod in_memory_ride_lookup;
        pub mod in_memory_store;
    }
}

pub mod shell;
