//! Core types for the marketplace catalog.
//!
//! This module provides type-safe wrappers for catalog concepts.

pub mod app;
pub mod category;
pub mod email;
pub mod pricing;
pub mod rating;
pub mod slug;

pub use app::{AppDraft, AppImages, Description, Developer};
pub use category::{Category, CategoryRef};
pub use email::{Email, EmailError};
pub use pricing::{Pricing, PricingType};
pub use rating::{Rating, RatingError, average_rating};
pub use slug::{Slug, SlugError};
