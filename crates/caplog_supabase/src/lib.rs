//! Supabase-backed gateway for the caplog data layer.
//!
//! This crate implements the service traits from `caplog_common::services`
//! over the hosted platform's REST surface:
//!
//! - auth endpoints for registration, login, logout and password reset
//! - row endpoints for the daily-record, profile and settings relations
//! - object storage for profile images
//! - a polling change feed standing in for the platform's websocket transport
//!
//! The rest of the application only sees [`SupabaseGatewayFactory`]; all
//! concrete request plumbing stays inside this crate.

pub mod auth;
pub mod client;
pub mod realtime;
pub mod repository;
pub mod service;
pub mod storage;

// Re-export the factory to be used by application wiring
pub use service::SupabaseGatewayFactory;
