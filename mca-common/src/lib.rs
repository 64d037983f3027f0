//! # MCA Common Library
//!
//! Shared code for the MCA (Music Composer Analysis) services:
//! - Error and result types
//! - Configuration file loading and value resolution
//! - Shared-secret verification
//! - Wire payloads exchanged with the backend (system of record)

pub mod api;
pub mod config;
pub mod error;

pub use error::{Error, Result};
