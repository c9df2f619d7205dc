use tracing::instrument;

use crate::{
    datastore::{CollectionPath, Precondition, Versioned, Write},
    documents::CartItem,
    traits::DocumentStore,
    Status,
};

#[instrument(name = "cart::read", level = "trace", skip(store))]
pub async fn read<S: DocumentStore>(
    store: &S,
    user_id: &str,
    item_id: &str,
) -> Result<Option<Versioned<CartItem>>, Status> {
    store.read(&CollectionPath::cart(user_id).doc(item_id)).await
}

#[instrument(name = "cart::list", level = "trace", skip(store))]
pub async fn list<S: DocumentStore>(store: &S, user_id: &str) -> Result<Vec<CartItem>, Status> {
    store.query(&CollectionPath::cart(user_id), &[]).await
}

pub fn write(user_id: &str, item: &CartItem) -> Result<Write, Status> {
    Write::set(
        CollectionPath::cart(user_id).doc(&item.item_id),
        item,
        Precondition::None,
    )
}

pub fn delete(user_id: &str, item_id: &str) -> Write {
    Write::delete(CollectionPath::cart(user_id).doc(item_id), Precondition::None)
}
