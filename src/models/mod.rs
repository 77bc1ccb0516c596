//! Data models for Rick and Morty API entities.
//!
//! This module contains the data structures shared between the API client,
//! the local cache, and the UI:
//!
//! - `Character`: a single character record, identity = id
//! - `CharacterPage`, `PageInfo`: the paginated wire shape
//! - `LocationRef`: a named reference to an origin or location world
//! - `CharacterFilter`: optional search/filter criteria

pub mod character;

pub use character::{Character, CharacterFilter, CharacterPage, LocationRef, PageInfo};
