//! # Gym Tracker Data Engine
//!
//! Core data layer for the gym membership tracker: a versioned interchange
//! format for the full dataset, selective export with filtering, validated
//! import with configurable merge behavior, rotating local backups, and an
//! advisory offline change tracker.
//!
//! The engine is storage-agnostic: services are constructed with injected
//! [`storage::RecordStorage`] repositories and a [`storage::KeyValueStore`],
//! so any backend satisfying those contracts is interchangeable. The crate
//! ships a JSON-file implementation under [`storage::json`].
//!
//! UI rendering, authentication and network handling live elsewhere; this
//! crate only produces artifacts and outcome values for the presentation
//! layer to surface.

pub mod domain;
pub mod error;
pub mod storage;

pub use error::DataError;
