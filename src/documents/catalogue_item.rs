use serde::{Deserialize, Serialize};
use std::fmt;

/// Document type under 'catalogue/{item_id}' describing a game that can be
/// purchased from the store.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct CatalogueItem {
    pub id: String,
    pub title: String,

    #[serde(default)]
    pub description: String,

    /// Price in cents. Zero for free-to-play games.
    #[serde(default)]
    pub price_cents: u64,

    /// Price before a discount, if the item is discounted.
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_price_cents: Option<u64>,

    #[serde(default)]
    pub image_url: String,

    #[serde(default)]
    pub category: String,

    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub platforms: Vec<String>,

    #[serde(default)]
    pub developer: String,

    #[serde(default)]
    pub publisher: String,

    #[serde(default)]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub release_date: String,

    /// Average user rating out of 5.
    #[serde(default)]
    pub rating: f64,

    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub screenshots: Vec<String>,

    #[serde(default)]
    pub featured: bool,

    #[serde(default = "in_stock_default")]
    pub in_stock: bool,

    #[serde(default)]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub download_size: String,

    /// Achievements copied into a user's library when the game is bought.
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub achievements: Vec<AchievementTemplate>,
}

impl CatalogueItem {
    pub fn is_free(&self) -> bool {
        self.price_cents == 0
    }
}

impl fmt::Display for CatalogueItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CatalogueItem({}): '{}'", &self.id, &self.title)
    }
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
pub struct AchievementTemplate {
    pub id: String,
    pub title: String,

    #[serde(default)]
    pub description: String,
}

fn in_stock_default() -> bool {
    true
}
