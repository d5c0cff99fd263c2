//! Harvest Hub Core - Shared types library.
//!
//! This crate provides common types used across all Harvest Hub components:
//! - `market` - Marketplace engine and its JSON HTTP surface
//! - `cli` - Command-line tools for migrations, seeding and account management
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, money, emails, addresses and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

#[doc(hidden)]
pub use uuid;

pub use uuid::Uuid;
