//! Core types for Harvest Hub.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod email;
pub mod id;
pub mod money;
pub mod status;

pub use address::{Address, Locality, ValidationError};
pub use email::{Email, EmailError};
pub use id::*;
pub use money::{Currency, CurrencyError, Money};
pub use status::*;
