//! Catalog domain and deterministic retrieval logic for TIA.
//!
//! This crate is the side-effect-free heart of the advisor:
//! - **Catalog types** (`catalog`) - insurers, term plans, premium bands, and
//!   the eligibility predicate over half-open request envelopes
//! - **Ranking** (`ranking`) - priority-factor composite ordering with dense
//!   ranks and a configurable result cap
//! - **Matching** (`matching`) - tiered fuzzy name resolution for point lookups
//! - **Profile** (`profile`) - the versioned customer record the conversation
//!   layer merges turn by turn
//! - **Rendering seam** (`render`) - the interface the presentation layer
//!   implements; the core only hands back typed rows
//!
//! Storage access lives in `tia-db`; nothing here performs I/O. The SQL
//! eligibility query and `PremiumBand::matches` are the same predicate written
//! twice, and the unit tests here keep the two honest.

pub mod catalog;
pub mod config;
pub mod errors;
pub mod matching;
pub mod profile;
pub mod ranking;
pub mod render;

pub use catalog::{
    CandidateRow, Insurer, InsurerMetrics, PlanDetail, PremiumBand, PremiumRow, QuoteRequest,
    TermPlan,
};
pub use errors::CatalogError;
pub use matching::{best_match, NameEntry};
pub use profile::{CustomerProfile, ProfileUpdate};
pub use ranking::{parse_factors, rank_candidates, PriorityFactor, RankedRow};
pub use render::{Artifact, ResultRenderer, TextTableRenderer};
