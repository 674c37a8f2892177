//! WRENCH: multi-tenant training platform backend
//!
//! The core is the in-memory [`store::Store`]: communities and memberships,
//! accounts with rotating bearer tokens, admin invite codes, courses gated by
//! skill level and community-scoped prerequisite tests, and scored test
//! attempts. [`rest`] exposes it over HTTP/JSON.

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod store;
pub mod telemetry;
// REST API module: Axum HTTP handlers over the store
pub mod rest;
