//! Shared types and models for the Stock Ledger
//!
//! This crate contains types shared between the backend, the browser
//! helpers (via WASM), and any other component that reads ledger data.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
