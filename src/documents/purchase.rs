use serde::{Deserialize, Serialize};

use super::CatalogueItem;

/// Document type under 'users/{user_id}/cart/{item_id}'.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
pub struct CartItem {
    pub item_id: String,

    /// Digital items are bought once, so this is always 1.
    #[serde(default = "one")]
    pub quantity: u32,

    #[serde(default)]
    pub added_at: i64,
}

impl CartItem {
    pub fn new(item_id: &str, now: i64) -> Self {
        CartItem {
            item_id: item_id.to_owned(),
            quantity: 1,
            added_at: now,
        }
    }
}

fn one() -> u32 {
    1
}

/// Document type under 'purchases/{purchase_id}' that records a completed
/// order.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct Purchase {
    pub id: String,
    pub user_id: String,
    pub items: Vec<PurchaseLine>,
    pub total_cents: u64,
    pub purchased_at: i64,
    pub status: PurchaseStatus,

    #[serde(default)]
    pub payment_method: String,
}

impl Purchase {
    pub fn new(
        id: String,
        user_id: &str,
        items: &[CatalogueItem],
        payment_method: &str,
        now: i64,
    ) -> Self {
        let items = items
            .iter()
            .map(|item| PurchaseLine {
                item_id: item.id.clone(),
                title: item.title.clone(),
                price_cents: item.price_cents,
            })
            .collect::<Vec<_>>();

        Purchase {
            id,
            user_id: user_id.to_owned(),
            total_cents: items.iter().map(|line| line.price_cents).sum(),
            items,
            purchased_at: now,
            status: PurchaseStatus::Completed,
            payment_method: payment_method.to_owned(),
        }
    }
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
pub struct PurchaseLine {
    pub item_id: String,
    pub title: String,
    pub price_cents: u64,
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseStatus {
    Pending,
    #[default]
    Completed,
    Failed,
    Refunded,
}
