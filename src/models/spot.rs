use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::geo::{Coordinates, RadiusFilter};

/// Locale tag to localized text, e.g. `{"ja": "東京タワー"}`.
pub type LocalizedText = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Spot {
    pub id: String,
    pub name: String,
    #[sqlx(json)]
    pub name_i18n: LocalizedText,
    pub latitude: f64,
    pub longitude: f64,
    pub category: String,
    pub address: String,
    #[sqlx(json)]
    pub address_i18n: LocalizedText,
    pub country_code: String,
    pub average_rating: f64,
    pub review_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Spot {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            lat: self.latitude,
            lng: self.longitude,
        }
    }
}

/// A spot in a search result. `distance_km` is set when the search had a center.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SpotHit {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub spot: Spot,
    pub distance_km: Option<f64>,
}

/// Category and country narrowing shared by listing and text search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpotFilter {
    pub category: Option<String>,
    pub country_code: Option<String>,
}

impl SpotFilter {
    pub fn new(category: Option<String>, country_code: Option<String>) -> Self {
        let clean = |v: Option<String>| {
            v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        };
        Self {
            category: clean(category),
            country_code: clean(country_code).map(|c| c.to_uppercase()),
        }
    }

    pub fn matches(&self, spot: &Spot) -> bool {
        self.category
            .as_deref()
            .is_none_or(|c| spot.category.eq_ignore_ascii_case(c))
            && self
                .country_code
                .as_deref()
                .is_none_or(|c| spot.country_code.eq_ignore_ascii_case(c))
    }
}

/// Validated text search request.
#[derive(Debug, Clone, PartialEq)]
pub struct SpotTextQuery {
    pub text: String,
    pub filter: SpotFilter,
    pub radius: Option<RadiusFilter>,
}

/// How well a spot's name matches the search text; lower sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NameMatch {
    Exact = 0,
    Prefix = 1,
    Other = 2,
}

impl SpotTextQuery {
    /// Case-insensitive substring match on name, localized names or address.
    pub fn matches(&self, spot: &Spot) -> bool {
        let needle = self.text.to_lowercase();
        spot.name.to_lowercase().contains(&needle)
            || spot.address.to_lowercase().contains(&needle)
            || spot
                .name_i18n
                .values()
                .any(|n| n.to_lowercase().contains(&needle))
    }

    pub fn name_match(&self, spot: &Spot) -> NameMatch {
        let needle = self.text.to_lowercase();
        let name = spot.name.to_lowercase();
        if name == needle {
            NameMatch::Exact
        } else if name.starts_with(&needle) {
            NameMatch::Prefix
        } else {
            NameMatch::Other
        }
    }
}
