//! Add or update one application.
//!
//! # Usage
//!
//! ```bash
//! # Insert a new app (fails if the slug is taken)
//! mp-cli add --file notepad.json
//!
//! # Update the app with the same slug
//! mp-cli add --file notepad.json --update
//!
//! # Update a specific app, possibly renaming its slug
//! mp-cli add --file notepad.json --update --id 65a1b2c3d4e5f60718293a4b
//! ```

use std::path::Path;

use marketplace_core::{AppDraft, validate_app_data};
use mongodb::bson::{DateTime, oid::ObjectId};

use crate::db::{AppRepository, CategoryRepository, is_duplicate_key};
use crate::error::CliError;
use crate::models::{AppDocument, AppFields};

/// How the document is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Create a new app.
    Insert,
    /// Update the app with this id, or with the document's slug.
    Update { id: Option<ObjectId> },
}

impl WriteMode {
    /// Build from the `--update` / `--id` flags.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::InvalidId`] if `id` is not a 24-character hex id.
    pub fn from_flags(update: bool, id: Option<&str>) -> Result<Self, CliError> {
        if !update {
            return Ok(Self::Insert);
        }
        let id = id
            .map(|raw| ObjectId::parse_str(raw).map_err(|_| CliError::InvalidId(raw.to_owned())))
            .transpose()?;
        Ok(Self::Update { id })
    }
}

/// What was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Written {
    Inserted(ObjectId),
    Updated(ObjectId),
}

/// Read and validate an application document.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not JSON, or fails
/// validation.
pub async fn load(path: &Path) -> Result<AppDraft, CliError> {
    let raw = super::read_json(path).await?;
    let draft = validate_app_data(&raw)?;
    tracing::info!(name = %draft.name, slug = %draft.slug, "Validated app document");
    Ok(draft)
}

/// Write a validated draft to the catalog.
///
/// # Errors
///
/// Returns an error if the category does not exist, the slug collides with
/// another app, the app to update does not exist, or the database fails.
pub async fn write<A, C>(
    apps: &A,
    categories: &C,
    draft: AppDraft,
    mode: WriteMode,
) -> Result<Written, CliError>
where
    A: AppRepository,
    C: CategoryRepository,
{
    let category = categories
        .find(&draft.category)
        .await?
        .and_then(|category| category.id)
        .ok_or_else(|| CliError::CategoryNotFound(draft.category.to_string()))?;
    let fields = AppFields::from_draft(draft, category);
    let now = DateTime::now();

    match mode {
        WriteMode::Insert => {
            if apps.find_by_slug(&fields.slug).await?.is_some() {
                return Err(CliError::DuplicateSlug(fields.slug.to_string()));
            }
            let slug = fields.slug.to_string();
            let id = apps
                .insert(AppDocument::new(fields, now))
                .await
                .map_err(|e| {
                    if is_duplicate_key(&e) {
                        CliError::DuplicateSlug(slug)
                    } else {
                        e.into()
                    }
                })?;
            Ok(Written::Inserted(id))
        }
        WriteMode::Update { id: Some(id) } => {
            if apps.find_by_id(id).await?.is_none() {
                return Err(CliError::AppNotFound(format!("id {id}")));
            }
            if let Some(other) = apps.find_by_slug(&fields.slug).await? {
                if other.id != Some(id) {
                    return Err(CliError::DuplicateSlug(fields.slug.to_string()));
                }
            }
            update(apps, id, fields, now).await
        }
        WriteMode::Update { id: None } => {
            let existing = apps
                .find_by_slug(&fields.slug)
                .await?
                .ok_or_else(|| CliError::AppNotFound(format!("slug {}", fields.slug)))?;
            let id = existing
                .id
                .ok_or_else(|| CliError::AppNotFound(format!("slug {}", fields.slug)))?;
            update(apps, id, fields, now).await
        }
    }
}

async fn update<A: AppRepository>(
    apps: &A,
    id: ObjectId,
    fields: AppFields,
    now: DateTime,
) -> Result<Written, CliError> {
    if apps.update(id, fields, now).await? {
        Ok(Written::Updated(id))
    } else {
        Err(CliError::AppNotFound(format!("id {id}")))
    }
}
