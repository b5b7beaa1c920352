//! In-memory repositories for command tests.

use std::sync::{Mutex, PoisonError};

use marketplace_core::{Category, CategoryRef, Slug};
use mongodb::bson::{DateTime, oid::ObjectId};

use super::{AppRepository, CategoryRepository, DbResult, Upsert};
use crate::models::{AppDocument, AppFields, CategoryDocument};

#[derive(Default)]
pub struct MemoryApps {
    docs: Mutex<Vec<AppDocument>>,
}

impl MemoryApps {
    pub fn all(&self) -> Vec<AppDocument> {
        self.docs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl AppRepository for MemoryApps {
    async fn find_by_id(&self, id: ObjectId) -> DbResult<Option<AppDocument>> {
        Ok(self.all().into_iter().find(|app| app.id == Some(id)))
    }

    async fn find_by_slug(&self, slug: &Slug) -> DbResult<Option<AppDocument>> {
        Ok(self.all().into_iter().find(|app| &app.slug == slug))
    }

    async fn insert(&self, mut app: AppDocument) -> DbResult<ObjectId> {
        let id = *app.id.get_or_insert_with(ObjectId::new);
        self.docs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(app);
        Ok(id)
    }

    async fn update(&self, id: ObjectId, fields: AppFields, now: DateTime) -> DbResult<bool> {
        let mut docs = self.docs.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(match docs.iter_mut().find(|app| app.id == Some(id)) {
            Some(app) => {
                app.apply(fields, now);
                true
            }
            None => false,
        })
    }

    async fn list(&self, category: Option<ObjectId>) -> DbResult<Vec<AppDocument>> {
        let mut apps: Vec<_> = self
            .all()
            .into_iter()
            .filter(|app| category.is_none_or(|id| app.category == id))
            .collect();
        apps.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(apps)
    }
}

#[derive(Default)]
pub struct MemoryCategories {
    docs: Mutex<Vec<CategoryDocument>>,
}

impl MemoryCategories {
    /// Seed one category and return its id.
    pub fn with(self, name: &str, slug: &str) -> (Self, ObjectId) {
        let mut doc = CategoryDocument::new(
            Category {
                name: name.to_owned(),
                slug: Slug::parse(slug).unwrap_or_else(|e| panic!("bad test slug: {e}")),
                description: None,
                icon: None,
            },
            DateTime::now(),
        );
        let id = ObjectId::new();
        doc.id = Some(id);
        self.docs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(doc);
        (self, id)
    }

    pub fn all(&self) -> Vec<CategoryDocument> {
        self.docs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl CategoryRepository for MemoryCategories {
    async fn find(&self, reference: &CategoryRef) -> DbResult<Option<CategoryDocument>> {
        Ok(self.all().into_iter().find(|doc| match reference {
            CategoryRef::Id(hex) => doc.id.is_some_and(|id| id.to_hex() == *hex),
            CategoryRef::Slug(slug) => &doc.slug == slug,
        }))
    }

    async fn upsert(&self, category: Category, now: DateTime) -> DbResult<Upsert> {
        let mut docs = self.docs.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(doc) = docs.iter_mut().find(|doc| doc.slug == category.slug) {
            doc.name = category.name;
            doc.description = category.description;
            doc.icon = category.icon;
            doc.updated_at = Some(now);
            return Ok(Upsert::Updated);
        }
        let mut doc = CategoryDocument::new(category, now);
        doc.id = Some(ObjectId::new());
        docs.push(doc);
        Ok(Upsert::Inserted)
    }
}
