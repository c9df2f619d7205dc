use futures::future::try_join_all;
use itertools::{Either, Itertools};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::Session,
    datastore::{retry_on_abort, Precondition, Write},
    documents::{CartItem, CatalogueItem, OwnedGame, Purchase},
    logging::StoreEvent,
    traits::DocumentStore,
    util::time::now_millis,
    Status,
};

use super::firestore::{cart, catalogue, games, purchases};

/// Store front: the catalogue, users' carts and purchases.
pub struct StoreManager<S> {
    store: Arc<S>,
}

impl<S: DocumentStore> StoreManager<S> {
    pub fn new(store: Arc<S>) -> Self {
        StoreManager { store }
    }

    /// Returns catalogue items sorted by title. A missing category or `all`
    /// lists the whole catalogue.
    #[instrument(level = "trace", skip(self))]
    pub async fn list_catalogue(
        &self,
        category: Option<&str>,
    ) -> Result<Vec<CatalogueItem>, Status> {
        let category = category
            .map(|category| category.trim())
            .filter(|category| !category.is_empty() && !category.eq_ignore_ascii_case("all"));
        let items = catalogue::list(&*self.store, category).await?;
        Ok(sorted_by_title(items))
    }

    #[instrument(level = "trace", skip(self))]
    pub async fn featured(&self) -> Result<Vec<CatalogueItem>, Status> {
        let items = catalogue::list(&*self.store, None).await?;
        Ok(sorted_by_title(
            items.into_iter().filter(|item| item.featured).collect(),
        ))
    }

    #[instrument(level = "trace", skip(self))]
    pub async fn get_item(&self, item_id: &str) -> Result<CatalogueItem, Status> {
        match catalogue::read(&*self.store, item_id).await? {
            Some(item) => Ok(item.doc),
            None => Err(Status::not_found(format!(
                "Catalogue item '{item_id}' was not found"
            ))),
        }
    }

    /// Creates or replaces a catalogue item.
    #[instrument(level = "trace", skip(self, item), fields(item_id = %item.id))]
    pub async fn upsert_item(&self, item: CatalogueItem) -> Result<CatalogueItem, Status> {
        validate_item(&item)?;
        self.store.commit(vec![catalogue::write(&item)?]).await?;
        Ok(item)
    }

    /// Writes a batch of catalogue items. Nothing is written if any item is
    /// invalid. Returns the number of items written.
    #[instrument(level = "trace", skip(self, items))]
    pub async fn seed_catalogue(&self, items: Vec<CatalogueItem>) -> Result<usize, Status> {
        let errors = items
            .iter()
            .filter_map(|item| validate_item(item).err())
            .map(|status| status.to_string())
            .collect_vec();
        if !errors.is_empty() {
            return Err(Status::invalid_argument(errors.join("; ")));
        }
        if let Some(id) = items.iter().map(|item| &item.id).duplicates().next() {
            return Err(Status::invalid_argument(format!(
                "Catalogue item '{id}' appears more than once"
            )));
        }

        for chunk in items.chunks(MAX_WRITES_PER_COMMIT) {
            let writes = chunk
                .iter()
                .map(catalogue::write)
                .collect::<Result<Vec<_>, _>>()?;
            self.store.commit(writes).await?;
        }
        info!("seeded {} catalogue items", items.len());
        Ok(items.len())
    }

    /// Adds an item to the user's cart. Adding an item already in the cart
    /// leaves the cart unchanged.
    #[instrument(level = "trace", skip(self, session), fields(uid = %session.uid))]
    pub async fn add_to_cart(&self, session: &Session, item_id: &str) -> Result<CartItem, Status> {
        let item = self.get_item(item_id).await?;
        if !item.in_stock {
            return Err(Status::failed_precondition(format!(
                "'{}' is not available for purchase",
                &item.title
            )));
        }
        if games::read(&*self.store, &session.uid, item_id)
            .await?
            .is_some()
        {
            return Err(Status::already_exists(format!(
                "'{}' is already in your library",
                &item.title
            )));
        }

        if let Some(existing) = cart::read(&*self.store, &session.uid, item_id).await? {
            return Ok(existing.doc);
        }
        let entry = CartItem::new(item_id, now_millis());
        self.store
            .commit(vec![cart::write(&session.uid, &entry)?])
            .await?;
        Ok(entry)
    }

    #[instrument(level = "trace", skip(self, session), fields(uid = %session.uid))]
    pub async fn remove_from_cart(&self, session: &Session, item_id: &str) -> Result<(), Status> {
        self.store
            .commit(vec![cart::delete(&session.uid, item_id)])
            .await
    }

    /// Returns the user's cart joined with the catalogue. Entries whose item
    /// left the catalogue are dropped.
    #[instrument(level = "trace", skip(self))]
    pub async fn cart(&self, user_id: &str) -> Result<Cart, Status> {
        let mut entries = cart::list(&*self.store, user_id).await?;
        entries.sort_by(|a, b| a.added_at.cmp(&b.added_at));

        let items = try_join_all(
            entries
                .iter()
                .map(|entry| catalogue::read(&*self.store, &entry.item_id)),
        )
        .await?;
        let items = items.into_iter().flatten().map(|item| item.doc).collect_vec();
        Ok(Cart::new(items))
    }

    #[instrument(level = "trace", skip(self, session), fields(uid = %session.uid))]
    pub async fn clear_cart(&self, session: &Session) -> Result<(), Status> {
        let entries = cart::list(&*self.store, &session.uid).await?;
        if entries.is_empty() {
            return Ok(());
        }
        self.store
            .commit(
                entries
                    .iter()
                    .map(|entry| cart::delete(&session.uid, &entry.item_id))
                    .collect(),
            )
            .await
    }

    /// Buys a single item.
    #[instrument(level = "trace", skip(self, session), fields(uid = %session.uid))]
    pub async fn purchase(
        &self,
        session: &Session,
        item_id: &str,
        payment_method: &str,
    ) -> Result<Purchase, Status> {
        let result = match validate_payment_method(payment_method) {
            Ok(payment_method) => match self.get_item(item_id).await {
                Ok(item) => self.buy(session, vec![item], &[], payment_method).await,
                Err(status) => Err(status),
            },
            Err(status) => Err(status),
        };
        StoreEvent::purchase(&session.uid, vec![item_id.to_owned()], &result);
        result
    }

    /// Buys every item in the user's cart in one purchase. Entries whose item
    /// left the catalogue are dropped from the cart instead of bought.
    #[instrument(level = "trace", skip(self, session), fields(uid = %session.uid))]
    pub async fn checkout(&self, session: &Session, payment_method: &str) -> Result<Purchase, Status> {
        let item_ids = cart::list(&*self.store, &session.uid)
            .await?
            .into_iter()
            .sorted_by_key(|entry| entry.added_at)
            .map(|entry| entry.item_id)
            .collect_vec();

        let result = match (item_ids.is_empty(), validate_payment_method(payment_method)) {
            (true, _) => Err(Status::failed_precondition("Cart is empty")),
            (false, Err(status)) => Err(status),
            (false, Ok(payment_method)) => {
                self.buy_cart(session, &item_ids, payment_method).await
            }
        };
        StoreEvent::purchase(&session.uid, item_ids, &result);
        result
    }

    /// Purchase history of the user, newest first.
    #[instrument(level = "trace", skip(self))]
    pub async fn purchases(&self, user_id: &str) -> Result<Vec<Purchase>, Status> {
        purchases::list(&*self.store, user_id).await
    }

    async fn buy_cart(
        &self,
        session: &Session,
        item_ids: &[String],
        payment_method: &str,
    ) -> Result<Purchase, Status> {
        let items = try_join_all(
            item_ids
                .iter()
                .map(|item_id| catalogue::read(&*self.store, item_id)),
        )
        .await?;
        let (items, dropped): (Vec<CatalogueItem>, Vec<String>) = item_ids
            .iter()
            .zip(items)
            .partition_map(|(item_id, item)| match item {
                Some(item) => Either::Left(item.doc),
                None => Either::Right(item_id.clone()),
            });

        if items.is_empty() {
            self.store
                .commit(
                    dropped
                        .iter()
                        .map(|item_id| cart::delete(&session.uid, item_id))
                        .collect(),
                )
                .await?;
            return Err(Status::failed_precondition("Cart is empty"));
        }
        if !dropped.is_empty() {
            info!(
                "dropping {} cart items that left the catalogue: {}",
                dropped.len(),
                dropped.join(", ")
            );
        }
        self.buy(session, items, &dropped, payment_method).await
    }

    /// Adds the items to the user's library, records the purchase and removes
    /// the items and `dropped` entries from the cart in one commit. Library
    /// entries are created only if missing, so an item is never bought twice.
    async fn buy(
        &self,
        session: &Session,
        items: Vec<CatalogueItem>,
        dropped: &[String],
        payment_method: &str,
    ) -> Result<Purchase, Status> {
        if let Some(item) = items.iter().find(|item| !item.in_stock) {
            return Err(Status::failed_precondition(format!(
                "'{}' is not available for purchase",
                &item.title
            )));
        }

        retry_on_abort("purchase", || async {
            let owned = try_join_all(
                items
                    .iter()
                    .map(|item| games::read(&*self.store, &session.uid, &item.id)),
            )
            .await?;
            if let Some((item, _)) = items
                .iter()
                .zip(owned.iter())
                .find(|(_, owned)| owned.is_some())
            {
                return Err(Status::already_exists(format!(
                    "'{}' is already in your library",
                    &item.title
                )));
            }

            let now = now_millis();
            let purchase = Purchase::new(
                Uuid::new_v4().to_string(),
                &session.uid,
                &items,
                payment_method,
                now,
            );

            let mut writes = items
                .iter()
                .map(|item| {
                    games::write(
                        &session.uid,
                        &OwnedGame::new(item, now),
                        Precondition::Missing,
                    )
                })
                .collect::<Result<Vec<Write>, Status>>()?;
            writes.push(purchases::write(&purchase)?);
            writes.extend(items.iter().map(|item| cart::delete(&session.uid, &item.id)));
            writes.extend(dropped.iter().map(|item_id| cart::delete(&session.uid, item_id)));

            self.store.commit(writes).await?;
            Ok(purchase)
        })
        .await
    }
}

/// A user's cart with the catalogue entries of its items.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct Cart {
    pub items: Vec<CatalogueItem>,
    pub total_cents: u64,
}

impl Cart {
    fn new(items: Vec<CatalogueItem>) -> Self {
        Cart {
            total_cents: items.iter().map(|item| item.price_cents).sum(),
            items,
        }
    }
}

/// Checks the invariants of a catalogue item.
pub fn validate_item(item: &CatalogueItem) -> Result<(), Status> {
    let mut errors = vec![];
    if !SLUG.is_match(&item.id) {
        errors.push(format!(
            "id '{}' must be lowercase letters, digits and dashes",
            &item.id
        ));
    }
    if item.title.trim().is_empty() {
        errors.push("title cannot be empty".to_owned());
    }
    if !(0.0..=5.0).contains(&item.rating) {
        errors.push(format!("rating {} must be between 0 and 5", item.rating));
    }
    if let Some(original) = item.original_price_cents {
        if original < item.price_cents {
            errors.push(format!(
                "original price {original} is lower than price {}",
                item.price_cents
            ));
        }
    }

    match errors.is_empty() {
        true => Ok(()),
        false => Err(Status::invalid_argument(format!(
            "Invalid catalogue item '{}': {}",
            &item.id,
            errors.join(", ")
        ))),
    }
}

fn validate_payment_method(payment_method: &str) -> Result<&str, Status> {
    match payment_method.trim() {
        "" => Err(Status::invalid_argument("Payment method is required")),
        payment_method => Ok(payment_method),
    }
}

fn sorted_by_title(items: Vec<CatalogueItem>) -> Vec<CatalogueItem> {
    items
        .into_iter()
        .sorted_by(|a, b| {
            a.title
                .to_lowercase()
                .cmp(&b.title.to_lowercase())
                .then_with(|| a.id.cmp(&b.id))
        })
        .collect()
}

/// Firestore rejects transactions with more writes than this.
const MAX_WRITES_PER_COMMIT: usize = 500;

lazy_static! {
    static ref SLUG: Regex = Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").unwrap();
}
