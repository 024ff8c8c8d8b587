//! Kori Core - Shared configuration and types library.
//!
//! This crate is consumed by every Kori process:
//! - `api` - HTTP API skeleton
//! - `cli` - Environment checks and database seeding
//! - `web` - Status page that reports API health
//!
//! # Architecture
//!
//! The core crate performs no network or database I/O. The only ambient input
//! it reads is the process environment, and only through
//! [`KoriConfig::from_env`]; everything else takes its input explicitly so it
//! can be tested without touching process state.
//!
//! # Modules
//!
//! - [`config`] - Typed, validated configuration and masked rendering
//! - [`password`] - Password strength rules
//! - [`types`] - Newtype wrappers for emails and IDs

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod password;
pub mod types;

pub use config::{
    ConfigError, ConfigIssue, Environment, KoriConfig, LogFormat, mask, render_masked, utf8_vars,
};
pub use types::*;

/// Display name of the application, reported by the API health endpoint.
pub const APP_NAME: &str = "Kori";
