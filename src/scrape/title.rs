//! Scraped record types and rating order

use serde::{Deserialize, Serialize};

/// Classification ratings from most to least restrictive
pub const RATING_ORDER: [&str; 6] = [
    "Restricted 21",
    "Matured Above 18",
    "No Children Under 16",
    "Parental Guidance 13",
    "Parental Guidance",
    "General Viewing",
];

/// Reported in place of a rating when a title carries none of [`RATING_ORDER`]
pub const MISSING_RATING: &str = "Missing, NAR, or pre-2004 rating. Check URL.";

/// A single rating and the decision attached to it
///
/// e.g. `No Children Under 16` / `Passed Clean`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Rating {
    pub rating: String,
    pub decision: String,
}

/// One classified title as scraped from its detail page
///
/// Serialized with the key names of the existing `out.json` documents:
/// `Name`, `Ratings`, `URL`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Title {
    pub name: String,
    pub ratings: Vec<Rating>,
    #[serde(rename = "URL")]
    pub url: String,
}

impl Title {
    /// Returns the most restrictive known rating, if the title has any
    pub fn max_rating(&self) -> Option<&'static str> {
        RATING_ORDER
            .iter()
            .copied()
            .find(|known| self.ratings.iter().any(|r| r.rating == *known))
    }

    /// Like [`Title::max_rating`], with [`MISSING_RATING`] standing in for none
    pub fn max_rating_or_fallback(&self) -> &'static str {
        self.max_rating().unwrap_or(MISSING_RATING)
    }
}
