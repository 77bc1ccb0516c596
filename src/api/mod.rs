//! REST API client module for the Rick and Morty API.
//!
//! This module provides the `ApiClient` for fetching character pages,
//! single characters, and server-side filtered listings from
//! `https://rickandmortyapi.com/api`. The API is public and requires
//! no authentication.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
