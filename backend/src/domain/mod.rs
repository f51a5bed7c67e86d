//! # Domain Module
//!
//! Business logic for the film funding backend, independent of the HTTP
//! layer and of where state is stored.
//!
//! ## Module Organization
//!
//! - **progress_calculator**: funded percentage and milestone marker positions
//! - **allocation_rebalancer**: keeps budget stage percentages summing to 100
//! - **milestone_service**: milestone planning on campaign drafts
//! - **campaign_service**: catalog browsing, drafts and admin aggregates
//! - **profile_service**: filmmaker profile and its statistics
//! - **models**: id generation and domain error types
//!
//! The two calculators are pure functions with no shared state; the services
//! build on them and on the [`ValueStore`](crate::storage::ValueStore).

pub mod allocation_rebalancer;
pub mod campaign_service;
pub mod milestone_service;
pub mod models;
pub mod profile_service;
pub mod progress_calculator;

pub use allocation_rebalancer::*;
pub use campaign_service::*;
pub use milestone_service::*;
pub use profile_service::*;
pub use progress_calculator::*;
