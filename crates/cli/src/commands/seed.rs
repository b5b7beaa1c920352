//! Seed catalog categories from a JSON file.
//!
//! The file holds an array of `{ name, slug, description?, icon? }` objects.
//! Categories are matched by slug, so the command can be re-run after editing
//! the file.

use std::path::Path;

use marketplace_core::Category;
use mongodb::bson::DateTime;
use serde_json::Value;
use tracing::info;

use crate::db::{CategoryRepository, Upsert};
use crate::error::CliError;

/// Counts of seeded categories.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub inserted: usize,
    pub updated: usize,
}

/// Read and parse the category file.
///
/// # Errors
///
/// Returns an error if the file is unreadable, not a JSON array, or an entry
/// is not a valid category.
pub async fn load(path: &Path) -> Result<Vec<Category>, CliError> {
    let Value::Array(entries) = super::read_json(path).await? else {
        return Err(CliError::NotAnArray(path.to_path_buf()));
    };
    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            serde_json::from_value(entry).map_err(|source| CliError::InvalidCategory { index, source })
        })
        .collect()
}

/// Upsert every category by slug.
///
/// # Errors
///
/// Returns an error if a database write fails. Categories before the failing
/// one stay written.
pub async fn seed<C: CategoryRepository>(
    categories: &C,
    entries: Vec<Category>,
) -> Result<SeedSummary, CliError> {
    let mut summary = SeedSummary::default();
    for category in entries {
        let slug = category.slug.clone();
        match categories.upsert(category, DateTime::now()).await? {
            Upsert::Inserted => {
                summary.inserted += 1;
                info!(%slug, "Inserted category");
            }
            Upsert::Updated => {
                summary.updated += 1;
                info!(%slug, "Updated category");
            }
        }
    }
    Ok(summary)
}
