//! ZapaStyle Storefront library.
//!
//! Client-side state for the storefront: the shopping cart, favorites,
//! product comparison, analytics counters and theme preference, all
//! persisted through a [`storage::KeyValueStore`].
//!
//! # Architecture
//!
//! - Every service is a constructed instance with its collaborators injected;
//!   there are no process-wide singletons.
//! - State changes are published on an [`events::EventBus`]. Presentation side
//!   effects (toasts) are listeners on that bus, never part of a mutation.
//! - Browsing contexts that share a [`storage::MemoryStorage`] area replicate
//!   the cart through a [`storage::ChangeFeed`] with last-writer-wins semantics.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod analytics;
pub mod cart;
pub mod catalog;
pub mod compare;
pub mod config;
pub mod error;
pub mod events;
pub mod favorites;
pub mod listing;
pub mod notifications;
pub mod state;
pub mod storage;
pub mod theme;
