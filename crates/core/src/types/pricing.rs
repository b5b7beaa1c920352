//! Application pricing.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How an application is sold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PricingType {
    #[default]
    Free,
    Paid,
    Subscription,
}

impl PricingType {
    /// Every accepted value, in display order.
    pub const ALL: [Self; 3] = [Self::Free, Self::Paid, Self::Subscription];

    /// Wire name of this pricing type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Paid => "paid",
            Self::Subscription => "subscription",
        }
    }

    /// Comma-separated list of accepted values, for error messages.
    #[must_use]
    pub fn allowed() -> String {
        Self::ALL
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for PricingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PricingType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Self::Free),
            "paid" => Ok(Self::Paid),
            "subscription" => Ok(Self::Subscription),
            _ => Err(format!("invalid pricing type: {s}")),
        }
    }
}

/// Price of an application.
///
/// `price` is stored as a JSON/BSON number so catalog queries can sort on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pricing {
    #[serde(rename = "type")]
    pub kind: PricingType,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub currency: String,
}

impl Pricing {
    /// Currency used when a document does not name one.
    pub const DEFAULT_CURRENCY: &'static str = "USD";

    /// Short human label, e.g. `Free` or `4.99 USD / month`.
    #[must_use]
    pub fn label(&self) -> String {
        match self.kind {
            PricingType::Free => "Free".to_owned(),
            PricingType::Paid => format!("{} {}", self.price, self.currency),
            PricingType::Subscription => format!("{} {} / month", self.price, self.currency),
        }
    }
}
