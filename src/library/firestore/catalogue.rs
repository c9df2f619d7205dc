use tracing::instrument;

use crate::{
    datastore::{CollectionPath, Filter, Precondition, Versioned, Write},
    documents::CatalogueItem,
    traits::DocumentStore,
    Status,
};

#[instrument(name = "catalogue::read", level = "trace", skip(store))]
pub async fn read<S: DocumentStore>(
    store: &S,
    item_id: &str,
) -> Result<Option<Versioned<CatalogueItem>>, Status> {
    store.read(&CollectionPath::catalogue().doc(item_id)).await
}

/// Returns catalogue items, restricted to `category` when one is given.
#[instrument(name = "catalogue::list", level = "trace", skip(store))]
pub async fn list<S: DocumentStore>(
    store: &S,
    category: Option<&str>,
) -> Result<Vec<CatalogueItem>, Status> {
    let filters = match category {
        Some(category) => vec![Filter::eq("category", category)],
        None => vec![],
    };
    store.query(&CollectionPath::catalogue(), &filters).await
}

pub fn write(item: &CatalogueItem) -> Result<Write, Status> {
    Write::set(
        CollectionPath::catalogue().doc(&item.id),
        item,
        Precondition::None,
    )
}
