//! Application listings.

use serde::{Deserialize, Serialize};

use super::category::CategoryRef;
use super::email::Email;
use super::pricing::Pricing;
use super::slug::Slug;

/// Short and long descriptions shown on listing cards and detail pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Description {
    pub short: String,
    pub full: String,
}

/// Publisher of an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Developer {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<Email>,
}

/// Image assets for a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppImages {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,
    #[serde(default)]
    pub screenshots: Vec<String>,
}

/// A validated application document, ready to be written to the catalog.
///
/// Produced by [`crate::validate_app_data`]. Database-owned fields (ids,
/// counters, ratings, timestamps) are added by the writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppDraft {
    pub name: String,
    pub slug: Slug,
    pub description: Description,
    pub developer: Developer,
    pub category: CategoryRef,
    /// Unique tags, in first-seen order.
    pub tags: Vec<String>,
    pub images: AppImages,
    pub pricing: Pricing,
    pub url: String,
}
