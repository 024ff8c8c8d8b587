//! Core types for Kori.

pub mod email;
pub mod id;

pub use email::{Email, EmailError};
pub use id::AdminUserId;
