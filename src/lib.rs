//! spacex-mirror: mirror the SpaceX public API into a local SQLite database
//!
//! Crew, payloads and launches are fetched from the API, reconciled into a
//! normalized schema that keeps cross-references between them, and served
//! back as list and detail views.

pub mod api;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod progress;
pub mod reconcile;
pub mod records;

pub use error::{Error, Result};
