//! Client library for the pricewatch alerting and portfolio service.
//!
//! The interesting state lives server-side; what this crate owns is the
//! alert resource model and its transition rules — which field combinations
//! a write may carry, when the notified latch is cleared, what the free plan
//! may touch — plus the HTTP plumbing to act on them. The binary in
//! `main.rs` is a thin command surface over this library; integration tests
//! drive [`api::ApiClient`] directly.

pub mod alerts;
pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod output;
