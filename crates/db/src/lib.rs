//! SQLite-backed catalog store for TIA.
//!
//! Holds the three catalog tables (insurers, term plans, premium bands) and
//! the read-side queries the advisor tools call. The eligibility predicate is
//! written once (`store::ELIGIBILITY_PREDICATE`) and shared between the
//! premium lookup and the recommendation path so the two can never drift.

pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod store;

pub use connection::{connect, connect_memory, DbPool};
pub use fixtures::SeedCatalog;
pub use store::{CatalogStore, StoreError};
