use tracing::instrument;

use crate::{
    datastore::{CollectionPath, Filter, Precondition, Write},
    documents::Purchase,
    traits::DocumentStore,
    Status,
};

/// Purchase history of a user, newest first.
#[instrument(name = "purchases::list", level = "trace", skip(store))]
pub async fn list<S: DocumentStore>(store: &S, user_id: &str) -> Result<Vec<Purchase>, Status> {
    let mut purchases: Vec<Purchase> = store
        .query(
            &CollectionPath::purchases(),
            &[Filter::eq("user_id", user_id)],
        )
        .await?;
    purchases.sort_by(|a, b| b.purchased_at.cmp(&a.purchased_at));
    Ok(purchases)
}

pub fn write(purchase: &Purchase) -> Result<Write, Status> {
    Write::set(
        CollectionPath::purchases().doc(&purchase.id),
        purchase,
        Precondition::Missing,
    )
}
