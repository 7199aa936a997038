//! Deal lifecycle engine for a real-estate brokerage back office.
//!
//! The [`deals`] module hosts the negotiation state machine: a transactional
//! store, one state object per lifecycle status built by a factory, optimistic
//! concurrency on every mutation, and event-driven commission settlement once
//! a deal closes. [`config`], [`telemetry`], and [`error`] carry the service
//! plumbing shared with the API binary.

pub mod config;
pub mod deals;
pub mod error;
pub mod telemetry;
