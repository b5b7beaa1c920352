//! Catalog categories.

use serde::{Deserialize, Serialize};

use super::slug::Slug;

/// A catalog category, as seeded by the admin tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub slug: Slug,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Reference from an application to its category.
///
/// Application documents name their category either by database id or by slug.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CategoryRef {
    /// 24-character hex object id.
    Id(String),
    Slug(Slug),
}

impl CategoryRef {
    /// Parse a category reference. Object ids take precedence over slugs.
    ///
    /// Returns `None` if the value is neither an object id nor a valid slug.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        if is_object_id(value) {
            return Some(Self::Id(value.to_ascii_lowercase()));
        }
        Slug::parse(value).ok().map(Self::Slug)
    }
}

impl std::fmt::Display for CategoryRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id {id}"),
            Self::Slug(slug) => write!(f, "slug {slug}"),
        }
    }
}

/// Whether `value` has the shape of a MongoDB object id.
#[must_use]
pub fn is_object_id(value: &str) -> bool {
    value.len() == 24 && value.bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_ref_prefers_object_id() {
        assert_eq!(
            CategoryRef::parse("65A1b2c3d4e5f60718293a4b"),
            Some(CategoryRef::Id("65a1b2c3d4e5f60718293a4b".to_owned()))
        );
        assert!(matches!(
            CategoryRef::parse("productivity"),
            Some(CategoryRef::Slug(_))
        ));
        assert_eq!(CategoryRef::parse("Not A Slug"), None);
    }
}
