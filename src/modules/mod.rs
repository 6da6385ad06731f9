//! Modules layer - Infrastructure components for external integrations
//!
//! Contains the persistence backends and the file storage adapters.

pub mod storage;
pub mod store;
