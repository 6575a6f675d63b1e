//! ZapaStyle Core - Shared types library.
//!
//! This crate provides common types used across all ZapaStyle components:
//! - `storefront` - Cart, catalog, favorites and analytics state engine
//! - `cli` - Command-line front end over file-backed storage
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs and prices

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
