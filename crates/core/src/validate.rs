//! Validation of raw application documents.
//!
//! Admin tooling reads application listings as loose JSON. Everything is
//! checked here before any database work so a bad file never half-writes.
//! Errors always name the dotted path of the offending field.

use rust_decimal::Decimal;
use serde_json::Value;
use thiserror::Error;

use crate::types::{
    AppDraft, AppImages, CategoryRef, Description, Developer, Email, EmailError, Pricing,
    PricingType, Slug, SlugError,
};

/// Fields that must be present and non-empty.
pub const REQUIRED_FIELDS: &[&str] = &[
    "name",
    "slug",
    "description.short",
    "description.full",
    "developer.name",
    "category",
    "pricing.type",
    "url",
];

/// Errors produced by [`validate_app_data`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("application data must be a JSON object")]
    NotAnObject,

    #[error("missing required field: {field}")]
    MissingField { field: String },

    #[error("field {field} must be {expected}")]
    WrongType {
        field: String,
        expected: &'static str,
    },

    #[error("field {field} has invalid value '{value}' (allowed: {allowed})")]
    InvalidEnum {
        field: String,
        value: String,
        allowed: String,
    },

    #[error("field slug is invalid: {0}")]
    Slug(#[from] SlugError),

    #[error("field {field} is not a valid email: {source}")]
    Email { field: String, source: EmailError },

    #[error("field {field} must be an absolute http(s) URL (got '{value}')")]
    Url { field: String, value: String },

    #[error("field {field} {reason}")]
    InvalidValue { field: String, reason: String },
}

impl ValidationError {
    /// Dotted path of the field the error refers to, if any.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::NotAnObject => None,
            Self::Slug(_) => Some("slug"),
            Self::MissingField { field }
            | Self::WrongType { field, .. }
            | Self::InvalidEnum { field, .. }
            | Self::Email { field, .. }
            | Self::Url { field, .. }
            | Self::InvalidValue { field, .. } => Some(field),
        }
    }
}

/// Validate a raw application document.
///
/// # Errors
///
/// Returns the first [`ValidationError`] found. Required fields are checked
/// first, in the order of [`REQUIRED_FIELDS`], then types and formats.
pub fn validate_app_data(data: &Value) -> Result<AppDraft, ValidationError> {
    if !data.is_object() {
        return Err(ValidationError::NotAnObject);
    }

    for field in REQUIRED_FIELDS {
        if is_blank(lookup(data, field)) {
            return Err(ValidationError::MissingField {
                field: (*field).to_owned(),
            });
        }
    }

    let name = required_str(data, "name")?;
    let slug = Slug::parse(&required_str(data, "slug")?)?;

    let description = Description {
        short: required_str(data, "description.short")?,
        full: required_str(data, "description.full")?,
    };

    let developer = Developer {
        name: required_str(data, "developer.name")?,
        website: optional_url(data, "developer.website")?,
        email: optional_str(data, "developer.email")?
            .map(|raw| {
                Email::parse(&raw).map_err(|source| ValidationError::Email {
                    field: "developer.email".to_owned(),
                    source,
                })
            })
            .transpose()?,
    };

    let category_raw = required_str(data, "category")?;
    let category =
        CategoryRef::parse(&category_raw).ok_or_else(|| ValidationError::InvalidValue {
            field: "category".to_owned(),
            reason: format!("must be an object id or a slug (got '{category_raw}')"),
        })?;

    let tags = dedup(string_array(data, "tags")?);

    let images = AppImages {
        icon: optional_str(data, "images.icon")?,
        banner: optional_str(data, "images.banner")?,
        screenshots: string_array(data, "images.screenshots")?,
    };

    let pricing = pricing(data)?;

    let url = optional_url(data, "url")?.ok_or_else(|| ValidationError::MissingField {
        field: "url".to_owned(),
    })?;

    Ok(AppDraft {
        name,
        slug,
        description,
        developer,
        category,
        tags,
        images,
        pricing,
        url,
    })
}

fn pricing(data: &Value) -> Result<Pricing, ValidationError> {
    let raw_kind = required_str(data, "pricing.type")?;
    let kind: PricingType = raw_kind
        .parse()
        .map_err(|_| ValidationError::InvalidEnum {
            field: "pricing.type".to_owned(),
            value: raw_kind.clone(),
            allowed: PricingType::allowed(),
        })?;

    let price = match lookup(data, "pricing.price") {
        None | Some(Value::Null) => None,
        Some(value) => {
            let number = value.as_f64().ok_or_else(|| ValidationError::WrongType {
                field: "pricing.price".to_owned(),
                expected: "a number",
            })?;
            let price = Decimal::try_from(number).map_err(|_| ValidationError::InvalidValue {
                field: "pricing.price".to_owned(),
                reason: format!("is not representable ({number})"),
            })?;
            if price.is_sign_negative() {
                return Err(ValidationError::InvalidValue {
                    field: "pricing.price".to_owned(),
                    reason: "cannot be negative".to_owned(),
                });
            }
            Some(price.normalize())
        }
    };

    let price = match (kind, price) {
        (PricingType::Free, None) => Decimal::ZERO,
        (PricingType::Free, Some(p)) if p.is_zero() => Decimal::ZERO,
        (PricingType::Free, Some(_)) => {
            return Err(ValidationError::InvalidValue {
                field: "pricing.price".to_owned(),
                reason: "must be 0 for free applications".to_owned(),
            });
        }
        (_, Some(p)) if !p.is_zero() => p,
        _ => {
            return Err(ValidationError::InvalidValue {
                field: "pricing.price".to_owned(),
                reason: format!("must be greater than 0 for {kind} applications"),
            });
        }
    };

    let currency = optional_str(data, "pricing.currency")?
        .map_or_else(|| Pricing::DEFAULT_CURRENCY.to_owned(), |c| c.to_uppercase());
    if currency.len() != 3 || !currency.bytes().all(|b| b.is_ascii_uppercase()) {
        return Err(ValidationError::InvalidValue {
            field: "pricing.currency".to_owned(),
            reason: format!("must be a three-letter ISO 4217 code (got '{currency}')"),
        });
    }

    Ok(Pricing {
        kind,
        price,
        currency,
    })
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Walk a dotted path through nested objects.
fn lookup<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(data, |node, key| node.get(key))
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

fn required_str(data: &Value, field: &str) -> Result<String, ValidationError> {
    optional_str(data, field)?.ok_or_else(|| ValidationError::MissingField {
        field: field.to_owned(),
    })
}

fn optional_str(data: &Value, field: &str) -> Result<Option<String>, ValidationError> {
    match lookup(data, field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_owned())),
        Some(_) => Err(ValidationError::WrongType {
            field: field.to_owned(),
            expected: "a string",
        }),
    }
}

fn optional_url(data: &Value, field: &str) -> Result<Option<String>, ValidationError> {
    let Some(raw) = optional_str(data, field)? else {
        return Ok(None);
    };
    match url::Url::parse(&raw) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(Some(raw)),
        _ => Err(ValidationError::Url {
            field: field.to_owned(),
            value: raw,
        }),
    }
}

fn string_array(data: &Value, field: &str) -> Result<Vec<String>, ValidationError> {
    let wrong_type = || ValidationError::WrongType {
        field: field.to_owned(),
        expected: "an array of strings",
    };
    match lookup(data, field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map(|s| s.trim().to_owned()).ok_or_else(wrong_type))
            .filter(|item| !matches!(item, Ok(s) if s.is_empty()))
            .collect(),
        Some(_) => Err(wrong_type()),
    }
}

fn dedup(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample() -> Value {
        json!({
            "name": "Transkryptor",
            "slug": "transkryptor",
            "description": {
                "short": "Speech to text",
                "full": "Transcribes audio files into editable text."
            },
            "developer": {
                "name": "Acme Audio",
                "website": "https://acme.example.com",
                "email": "dev@acme.example.com"
            },
            "category": "productivity",
            "tags": ["audio", "text", "audio"],
            "images": { "icon": "/icons/transkryptor.png", "screenshots": ["/s/1.png"] },
            "pricing": { "type": "subscription", "price": 4.99, "currency": "usd" },
            "url": "https://apps.example.com/transkryptor"
        })
    }

    fn without(mut data: Value, path: &str) -> Value {
        let (parent, key) = path.rsplit_once('.').map_or((None, path), |(p, k)| (Some(p), k));
        let target = match parent {
            Some(p) => p.split('.').fold(&mut data, |node, k| &mut node[k]),
            None => &mut data,
        };
        target.as_object_mut().unwrap().remove(key);
        data
    }

    #[test]
    fn test_valid_document() {
        let draft = validate_app_data(&sample()).unwrap();
        assert_eq!(draft.slug.as_str(), "transkryptor");
        assert_eq!(draft.tags, vec!["audio".to_owned(), "text".to_owned()]);
        assert_eq!(draft.pricing.kind, PricingType::Subscription);
        assert_eq!(draft.pricing.price, Decimal::new(499, 2));
        assert_eq!(draft.pricing.currency, "USD");
        assert!(matches!(draft.category, CategoryRef::Slug(_)));
        assert_eq!(
            draft.developer.email.unwrap().as_str(),
            "dev@acme.example.com"
        );
    }

    #[test]
    fn test_missing_pricing_type_names_field() {
        let err = validate_app_data(&without(sample(), "pricing.type")).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingField {
                field: "pricing.type".to_owned()
            }
        );
        assert!(err.to_string().contains("pricing.type"));
    }

    #[test]
    fn test_every_required_field_is_enforced() {
        for field in REQUIRED_FIELDS {
            let err = validate_app_data(&without(sample(), field)).unwrap_err();
            assert_eq!(err.field(), Some(*field), "field {field}");
        }
    }

    #[test]
    fn test_bogus_pricing_type_cites_allowed_values() {
        let mut data = sample();
        data["pricing"]["type"] = json!("bogus");
        let err = validate_app_data(&data).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidEnum { .. }));
        let message = err.to_string();
        assert!(message.contains("bogus"));
        assert!(message.contains("free, paid, subscription"));
    }

    #[test]
    fn test_bad_slug_cites_pattern() {
        let mut data = sample();
        data["slug"] = json!("My_App");
        let err = validate_app_data(&data).unwrap_err();
        assert!(matches!(err, ValidationError::Slug(SlugError::Pattern { .. })));
        assert!(err.to_string().contains(Slug::PATTERN));
    }

    #[test]
    fn test_not_an_object() {
        assert_eq!(
            validate_app_data(&json!([1, 2])),
            Err(ValidationError::NotAnObject)
        );
    }

    #[test]
    fn test_wrong_types() {
        let mut data = sample();
        data["tags"] = json!("audio");
        assert!(matches!(
            validate_app_data(&data),
            Err(ValidationError::WrongType { field, .. }) if field == "tags"
        ));

        let mut data = sample();
        data["pricing"]["price"] = json!("4.99");
        assert!(matches!(
            validate_app_data(&data),
            Err(ValidationError::WrongType { field, .. }) if field == "pricing.price"
        ));

        let mut data = sample();
        data["name"] = json!(42);
        assert!(matches!(
            validate_app_data(&data),
            Err(ValidationError::WrongType { field, .. }) if field == "name"
        ));
    }

    #[test]
    fn test_price_rules() {
        let mut data = sample();
        data["pricing"] = json!({ "type": "free" });
        let draft = validate_app_data(&data).unwrap();
        assert!(draft.pricing.price.is_zero());
        assert_eq!(draft.pricing.currency, "USD");

        let mut data = sample();
        data["pricing"] = json!({ "type": "free", "price": 3 });
        assert!(validate_app_data(&data).is_err());

        let mut data = sample();
        data["pricing"] = json!({ "type": "paid" });
        assert!(validate_app_data(&data).is_err());

        let mut data = sample();
        data["pricing"] = json!({ "type": "paid", "price": -1 });
        assert!(validate_app_data(&data).is_err());
    }

    #[test]
    fn test_url_and_email_formats() {
        let mut data = sample();
        data["url"] = json!("ftp://example.com/app");
        assert!(matches!(
            validate_app_data(&data),
            Err(ValidationError::Url { field, .. }) if field == "url"
        ));

        let mut data = sample();
        data["developer"]["email"] = json!("not-an-email");
        assert!(matches!(
            validate_app_data(&data),
            Err(ValidationError::Email { .. })
        ));
    }

    #[test]
    fn test_category_by_object_id() {
        let mut data = sample();
        data["category"] = json!("65a1b2c3d4e5f60718293a4b");
        let draft = validate_app_data(&data).unwrap();
        assert!(matches!(draft.category, CategoryRef::Id(_)));
    }
}
