//! API module for shared HTTP API functionality
//!
//! # Design Principle
//!
//! This module contains ONLY:
//! - Pure functions (no HTTP framework dependencies)
//! - Shared wire types
//!
//! Services wrap these with framework-specific handlers (Axum, etc.).

pub mod auth;
pub mod types;

pub use auth::{AuthError, SharedSecret};
pub use types::{
    AcceptedResponse, CoincidenceCallback, CoincidenceRequest, CoincidenceResponse, ErrorBody,
    ErrorResponse,
};
