//! Shared foundations for the caplog client data layer.
//!
//! This crate carries the pieces every other workspace crate leans on:
//!
//! - the [`CaplogError`] taxonomy and its helper constructors
//! - the domain models mirroring the backend relations
//! - the gateway service traits the store is written against
//! - `tracing` subscriber setup

pub mod error;
pub mod logging;
pub mod models;
pub mod services;

pub use error::{
    auth_error, config_error, conflict, external_service_error, internal_error, not_found,
    validation_error, CaplogError, Context,
};
