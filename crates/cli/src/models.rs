//! Catalog documents as stored in MongoDB.
//!
//! Field names are camelCase to match what the marketplace backend reads.

use marketplace_core::{
    AppDraft, AppImages, Category, Description, Developer, Pricing, Rating, Slug, average_rating,
};
use mongodb::bson::{self, Bson, DateTime, oid::ObjectId};
use serde::{Deserialize, Deserializer, Serialize};

/// Fields of an app that the admin tool writes.
///
/// Counters, ratings and timestamps belong to [`AppDocument`] and are never
/// overwritten by an update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppFields {
    pub name: String,
    pub slug: Slug,
    pub description: Description,
    pub developer: Developer,
    pub category: ObjectId,
    pub tags: Vec<String>,
    pub images: AppImages,
    pub pricing: Pricing,
    pub url: String,
}

impl AppFields {
    /// Combine a validated draft with its resolved category id.
    #[must_use]
    pub fn from_draft(draft: AppDraft, category: ObjectId) -> Self {
        Self {
            name: draft.name,
            slug: draft.slug,
            description: draft.description,
            developer: draft.developer,
            category,
            tags: draft.tags,
            images: draft.images,
            pricing: draft.pricing,
            url: draft.url,
        }
    }
}

/// A catalog application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub slug: Slug,
    pub description: Description,
    pub developer: Developer,
    pub category: ObjectId,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub images: AppImages,
    pub pricing: Pricing,
    pub url: String,
    #[serde(default)]
    pub downloads: i64,
    #[serde(default)]
    pub views: i64,
    /// Written by the marketplace backend. Entries that do not decode are
    /// dropped on read.
    #[serde(default, deserialize_with = "lenient_ratings")]
    pub ratings: Vec<Rating>,
    /// Absent on documents created outside this tool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,
}

impl AppDocument {
    /// A new, never-downloaded, unrated app.
    #[must_use]
    pub fn new(fields: AppFields, now: DateTime) -> Self {
        Self {
            id: None,
            name: fields.name,
            slug: fields.slug,
            description: fields.description,
            developer: fields.developer,
            category: fields.category,
            tags: fields.tags,
            images: fields.images,
            pricing: fields.pricing,
            url: fields.url,
            downloads: 0,
            views: 0,
            ratings: Vec::new(),
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    /// Mean user score, or `None` if unrated.
    #[must_use]
    pub fn average_rating(&self) -> Option<f64> {
        average_rating(&self.ratings)
    }

    /// Overwrite the admin-owned fields, keeping counters and ratings.
    pub fn apply(&mut self, fields: AppFields, now: DateTime) {
        self.name = fields.name;
        self.slug = fields.slug;
        self.description = fields.description;
        self.developer = fields.developer;
        self.category = fields.category;
        self.tags = fields.tags;
        self.images = fields.images;
        self.pricing = fields.pricing;
        self.url = fields.url;
        self.updated_at = Some(now);
    }
}

fn lenient_ratings<'de, D>(deserializer: D) -> Result<Vec<Rating>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Bson>>::deserialize(deserializer)?.unwrap_or_default();
    let total = raw.len();
    let ratings: Vec<Rating> = raw
        .into_iter()
        .filter_map(|entry| bson::from_bson(entry).ok())
        .collect();
    if ratings.len() < total {
        tracing::debug!(skipped = total - ratings.len(), "Ignoring undecodable ratings");
    }
    Ok(ratings)
}

/// A catalog category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub slug: Slug,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,
}

impl CategoryDocument {
    #[must_use]
    pub fn new(category: Category, now: DateTime) -> Self {
        Self {
            id: None,
            name: category.name,
            slug: category.slug,
            description: category.description,
            icon: category.icon,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }
}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use mongodb::bson;

    use super::test_support::sample_fields;
    use super::*;

    #[test]
    fn test_new_app_defaults() {
        let doc = AppDocument::new(sample_fields("notepad"), DateTime::now());
        assert_eq!(doc.downloads, 0);
        assert!(doc.ratings.is_empty());
        assert_eq!(doc.created_at, doc.updated_at);
        assert_eq!(doc.average_rating(), None);

        let stored = bson::to_document(&doc).unwrap();
        assert!(!stored.contains_key("_id"));
        assert!(stored.contains_key("createdAt"));
        let pricing = stored.get_document("pricing").unwrap();
        assert_eq!(pricing.get_str("type").unwrap(), "free");
        assert_eq!(
            stored.get_document("developer").unwrap().get_str("email").unwrap(),
            "dev@pistachio.example"
        );
    }

    #[test]
    fn test_apply_keeps_counters() {
        let created = DateTime::from_millis(1_000);
        let mut doc = AppDocument::new(sample_fields("notepad"), created);
        doc.downloads = 42;
        doc.ratings.push(Rating::new("u1", 5, None).unwrap());

        let mut fields = sample_fields("notepad-pro");
        fields.name = "NotePad Pro".to_owned();
        doc.apply(fields, DateTime::from_millis(2_000));

        assert_eq!(doc.name, "NotePad Pro");
        assert_eq!(doc.slug.as_str(), "notepad-pro");
        assert_eq!(doc.downloads, 42);
        assert_eq!(doc.ratings.len(), 1);
        assert_eq!(doc.created_at, Some(created));
        assert_eq!(doc.updated_at, Some(DateTime::from_millis(2_000)));
    }

    #[test]
    fn test_reads_backend_document() {
        let mut stored = bson::to_document(&AppDocument::new(
            sample_fields("notepad"),
            DateTime::now(),
        ))
        .unwrap();
        stored.remove("createdAt");
        stored.remove("updatedAt");
        stored.insert(
            "ratings",
            bson::bson!([
                { "userId": "u1", "score": 4, "createdAt": "2024-05-01T10:00:00Z" },
                { "userId": "u2", "score": 2, "comment": "meh", "createdAt": "2024-05-02T10:00:00Z" },
                { "stars": "five" }
            ]),
        );

        let doc: AppDocument = bson::from_document(stored).unwrap();
        assert_eq!(doc.created_at, None);
        assert_eq!(doc.ratings.len(), 2);
        assert_eq!(doc.ratings.last().unwrap().comment.as_deref(), Some("meh"));
        assert!((doc.average_rating().unwrap() - 3.0).abs() < f64::EPSILON);
    }
}
