//! Catalog database access.
//!
//! Commands are written against the [`AppRepository`] and
//! [`CategoryRepository`] traits. [`MarketDb`] provides the MongoDB
//! implementations.

#[cfg(test)]
pub mod memory;

use std::future::Future;

use futures_util::stream::TryStreamExt;
use marketplace_core::{Category, CategoryRef, Slug};
use mongodb::bson::{self, DateTime, doc, oid::ObjectId};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, Database, IndexModel};
use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

use crate::models::{AppDocument, AppFields, CategoryDocument};

pub type DbResult<T> = Result<T, mongodb::error::Error>;

pub const APPS: &str = "apps";
pub const CATEGORIES: &str = "categories";

/// MongoDB duplicate key error code.
const DUPLICATE_KEY: i32 = 11000;

/// Whether a category upsert created a new document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Updated,
}

/// Storage for catalog applications.
pub trait AppRepository: Send + Sync {
    fn find_by_id(
        &self,
        id: ObjectId,
    ) -> impl Future<Output = DbResult<Option<AppDocument>>> + Send;

    fn find_by_slug(
        &self,
        slug: &Slug,
    ) -> impl Future<Output = DbResult<Option<AppDocument>>> + Send;

    /// Insert a new app and return its id.
    fn insert(&self, app: AppDocument) -> impl Future<Output = DbResult<ObjectId>> + Send;

    /// Overwrite the admin-owned fields of `id`. Returns `false` if no such
    /// app exists.
    fn update(
        &self,
        id: ObjectId,
        fields: AppFields,
        now: DateTime,
    ) -> impl Future<Output = DbResult<bool>> + Send;

    /// Apps ordered by name, optionally restricted to one category.
    fn list(
        &self,
        category: Option<ObjectId>,
    ) -> impl Future<Output = DbResult<Vec<AppDocument>>> + Send;
}

/// Storage for catalog categories.
pub trait CategoryRepository: Send + Sync {
    /// Resolve a reference by id or slug.
    fn find(
        &self,
        reference: &CategoryRef,
    ) -> impl Future<Output = DbResult<Option<CategoryDocument>>> + Send;

    /// Insert or update the category with the same slug.
    fn upsert(
        &self,
        category: Category,
        now: DateTime,
    ) -> impl Future<Output = DbResult<Upsert>> + Send;
}

/// Whether `err` is a unique index violation.
#[must_use]
pub fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        &*err.kind,
        ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == DUPLICATE_KEY
    )
}

/// Connection to the catalog database.
pub struct MarketDb {
    client: Client,
    db: Database,
}

impl MarketDb {
    /// Create a client for `uri`. The server is first contacted by the first
    /// operation.
    ///
    /// # Errors
    ///
    /// Returns an error if the URI cannot be parsed.
    pub async fn connect(uri: &SecretString, database: &str) -> DbResult<Self> {
        let client = Client::with_uri_str(uri.expose_secret()).await?;
        let db = client.database(database);
        Ok(Self { client, db })
    }

    #[must_use]
    pub fn apps(&self) -> MongoApps {
        MongoApps {
            collection: self.db.collection(APPS),
        }
    }

    #[must_use]
    pub fn categories(&self) -> MongoCategories {
        MongoCategories {
            collection: self.db.collection(CATEGORIES),
        }
    }

    /// Ensure unique slug indexes on apps and categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the server is unreachable or existing documents
    /// violate uniqueness.
    pub async fn init_indexes(&self) -> DbResult<()> {
        for collection in [APPS, CATEGORIES] {
            let index = IndexModel::builder()
                .keys(doc! { "slug": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build();
            self.db
                .collection::<bson::Document>(collection)
                .create_index(index)
                .await?;
        }
        tracing::debug!("Slug indexes ensured");
        Ok(())
    }

    /// Close the client, waiting for in-flight operations.
    pub async fn shutdown(self) {
        self.client.shutdown().await;
    }
}

#[derive(Clone)]
pub struct MongoApps {
    collection: Collection<AppDocument>,
}

impl AppRepository for MongoApps {
    async fn find_by_id(&self, id: ObjectId) -> DbResult<Option<AppDocument>> {
        self.collection.find_one(doc! { "_id": id }).await
    }

    #[instrument(skip_all, fields(slug = %slug))]
    async fn find_by_slug(&self, slug: &Slug) -> DbResult<Option<AppDocument>> {
        self.collection
            .find_one(doc! { "slug": slug.as_str() })
            .await
    }

    #[instrument(skip_all, fields(slug = %app.slug))]
    async fn insert(&self, mut app: AppDocument) -> DbResult<ObjectId> {
        let id = *app.id.get_or_insert_with(ObjectId::new);
        self.collection.insert_one(&app).await?;
        Ok(id)
    }

    #[instrument(skip_all, fields(id = %id))]
    async fn update(&self, id: ObjectId, fields: AppFields, now: DateTime) -> DbResult<bool> {
        let mut set = bson::to_document(&fields)?;
        set.insert("updatedAt", now);
        let result = self
            .collection
            .update_one(doc! { "_id": id }, doc! { "$set": set })
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn list(&self, category: Option<ObjectId>) -> DbResult<Vec<AppDocument>> {
        let filter = category.map_or_else(|| doc! {}, |id| doc! { "category": id });
        let mut cursor = self
            .collection
            .clone_with_type::<bson::Document>()
            .find(filter)
            .sort(doc! { "name": 1 })
            .await?;

        let mut apps = Vec::new();
        while let Some(raw) = cursor.try_next().await? {
            let id = raw.get_object_id("_id").ok();
            match bson::from_document(raw) {
                Ok(app) => apps.push(app),
                Err(e) => tracing::warn!(?id, error = %e, "Skipping undecodable app"),
            }
        }
        Ok(apps)
    }
}

#[derive(Clone)]
pub struct MongoCategories {
    collection: Collection<CategoryDocument>,
}

impl CategoryRepository for MongoCategories {
    async fn find(&self, reference: &CategoryRef) -> DbResult<Option<CategoryDocument>> {
        let filter = match reference {
            CategoryRef::Id(hex) => match ObjectId::parse_str(hex) {
                Ok(id) => doc! { "_id": id },
                Err(_) => return Ok(None),
            },
            CategoryRef::Slug(slug) => doc! { "slug": slug.as_str() },
        };
        self.collection.find_one(filter).await
    }

    #[instrument(skip_all, fields(slug = %category.slug))]
    async fn upsert(&self, category: Category, now: DateTime) -> DbResult<Upsert> {
        let slug = category.slug.as_str().to_owned();
        let mut set = bson::to_document(&category)?;
        set.insert("updatedAt", now);
        let result = self
            .collection
            .update_one(
                doc! { "slug": slug },
                doc! { "$set": set, "$setOnInsert": { "createdAt": now } },
            )
            .upsert(true)
            .await?;
        Ok(if result.upserted_id.is_some() {
            Upsert::Inserted
        } else {
            Upsert::Updated
        })
    }
}
