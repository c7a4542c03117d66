//! Stratum Core - Access and Hierarchy Service
//!
//! This crate is the authorization/session core of the Stratum platform:
//! bearer session tokens, role assignments, contract rank ledgers, and
//! owner-scoped permission trees. Transport concerns live in a separate
//! boundary layer that hands this core validated, typed inputs.

pub mod config;
pub mod domain;
pub mod error;
pub mod jwt;
pub mod migration;
pub mod repository;
pub mod service;
pub mod state;
pub mod telemetry;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Result};
pub use state::AppState;
