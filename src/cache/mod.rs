//! Local caching module for offline data access.
//!
//! This module provides the `CharacterStore`, a single-table SQLite cache
//! of character rows keyed by id. Rows are written on successful listing
//! fetches and never expire; the only eviction is the explicit
//! `clear` operation.
//!
//! Each row carries the listing page it was last fetched under, which is
//! used for display ordering and page-local lookups.

pub mod store;

pub use store::CharacterStore;
