//! List catalog applications.

use marketplace_core::{CategoryRef, Slug};
use tracing::info;

use crate::db::{AppRepository, CategoryRepository};
use crate::error::CliError;
use crate::models::AppDocument;

/// Apps ordered by name, optionally only those in `category`.
///
/// # Errors
///
/// Returns [`CliError::CategoryNotFound`] for an unknown category, or a
/// database error.
pub async fn list<A, C>(
    apps: &A,
    categories: &C,
    category: Option<Slug>,
) -> Result<Vec<AppDocument>, CliError>
where
    A: AppRepository,
    C: CategoryRepository,
{
    let category_id = match category {
        Some(slug) => {
            let reference = CategoryRef::Slug(slug);
            let found = categories
                .find(&reference)
                .await?
                .and_then(|doc| doc.id)
                .ok_or_else(|| CliError::CategoryNotFound(reference.to_string()))?;
            Some(found)
        }
        None => None,
    };

    let found = apps.list(category_id).await?;
    for app in &found {
        info!(
            name = %app.name,
            slug = %app.slug,
            pricing = %app.pricing.label(),
            downloads = app.downloads,
            views = app.views,
            rating = %rating_label(app),
            "App"
        );
    }
    info!(count = found.len(), "Listed apps");
    Ok(found)
}

/// Average score to one decimal, with the number of ratings.
fn rating_label(app: &AppDocument) -> String {
    app.average_rating().map_or_else(
        || "unrated".to_owned(),
        |avg| format!("{avg:.1} ({})", app.ratings.len()),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use marketplace_core::Rating;
    use mongodb::bson::DateTime;

    use super::*;
    use crate::db::memory::{MemoryApps, MemoryCategories};
    use crate::models::test_support::sample_fields;

    #[tokio::test]
    async fn test_list_filters_by_category() {
        let (categories, games) = MemoryCategories::default().with("Games", "games");
        let apps = MemoryApps::default();

        let mut chess = sample_fields("chess");
        chess.name = "Chess".to_owned();
        chess.category = games;
        let mut notes = sample_fields("notes");
        notes.name = "Notes".to_owned();
        let mut arcade = sample_fields("arcade");
        arcade.name = "Arcade".to_owned();
        arcade.category = games;
        for fields in [chess, notes, arcade] {
            apps.insert(AppDocument::new(fields, DateTime::now())).await.unwrap();
        }

        let all = list(&apps, &categories, None).await.unwrap();
        let names: Vec<_> = all.iter().map(|app| app.name.as_str()).collect();
        assert_eq!(names, ["Arcade", "Chess", "Notes"]);

        let slug = Slug::parse("games").unwrap();
        let in_games = list(&apps, &categories, Some(slug)).await.unwrap();
        assert_eq!(in_games.len(), 2);
    }

    #[test]
    fn test_rating_label() {
        let mut app = AppDocument::new(sample_fields("chess"), DateTime::now());
        assert_eq!(rating_label(&app), "unrated");

        for score in [5, 4, 4] {
            app.ratings.push(Rating::new("u", score, None).unwrap());
        }
        assert_eq!(rating_label(&app), "4.3 (3)");
    }

    #[tokio::test]
    async fn test_list_unknown_category() {
        let categories = MemoryCategories::default();
        let apps = MemoryApps::default();
        let err = list(&apps, &categories, Some(Slug::parse("games").unwrap()))
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::CategoryNotFound(_)));
    }
}
