//! Marketplace Core - Shared domain types.
//!
//! This crate provides the catalog types used across all marketplace components:
//! - `shell` - Session and UI integration layer embedded by third-party apps
//! - `server` - Static server for a bundled app
//! - `cli` - Admin tools for seeding and maintaining the catalog database
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtypes for slugs and emails, pricing, categories, ratings
//! - [`validate`] - Validation of raw application documents

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;
pub mod validate;

pub use types::*;
pub use validate::{ValidationError, validate_app_data};
