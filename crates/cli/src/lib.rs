//! Kori CLI - environment checks and database seeding.
//!
//! The command logic lives in this library so it can be tested without
//! spawning the `kori` binary.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod commands;
pub mod db;
