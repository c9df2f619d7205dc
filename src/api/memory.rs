use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use tracing::instrument;

use crate::{
    datastore::{
        decode, CollectionPath, DocPath, Filter, Precondition, Revision, Versioned, Write, WriteOp,
    },
    logging::DatastoreEvent,
    traits::DocumentStore,
    Status,
};

/// In-process document store with the same commit semantics as Firestore.
/// Backs local development and tests.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    docs: BTreeMap<String, Stored>,
    last_update: Option<DateTime<Utc>>,
}

struct Stored {
    collection: String,
    value: serde_json::Value,
    revision: Revision,
}

impl State {
    /// Returns a revision strictly later than any handed out before.
    fn next_revision(&mut self) -> Revision {
        let now = Utc::now();
        let update_time = match self.last_update {
            Some(last) if last >= now => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_update = Some(update_time);
        Revision::new(update_time)
    }

    fn check(&self, write: &Write) -> Result<(), Status> {
        let current = self.docs.get(&write.path.to_string());
        match (write.precondition, current) {
            (Precondition::None, _) => Ok(()),
            (Precondition::Missing, None) => Ok(()),
            (Precondition::Exists, Some(_)) => Ok(()),
            (Precondition::Revision(revision), Some(stored)) if stored.revision == revision => {
                Ok(())
            }
            (Precondition::Missing, Some(_)) => Err(Status::aborted(format!(
                "Document '{}' already exists",
                write.path
            ))),
            _ => Err(Status::aborted(format!(
                "Document '{}' changed since it was read",
                write.path
            ))),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, Status> {
        self.state
            .lock()
            .map_err(|_| Status::internal("MemoryStore lock was poisoned"))
    }

    fn apply(&self, writes: Vec<Write>) -> Result<(), Status> {
        let mut state = self.lock()?;
        for write in &writes {
            state.check(write)?;
        }

        let revision = state.next_revision();
        for write in writes {
            let path = write.path.to_string();
            match write.op {
                WriteOp::Set(value) => {
                    state.docs.insert(
                        path,
                        Stored {
                            collection: write.path.collection().to_string(),
                            value,
                            revision,
                        },
                    );
                }
                WriteOp::Delete => {
                    state.docs.remove(&path);
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    #[instrument(name = "memory::read", level = "trace", skip(self))]
    async fn read<D>(&self, path: &DocPath) -> Result<Option<Versioned<D>>, Status>
    where
        D: DeserializeOwned + Send,
    {
        let stored = {
            let state = self.lock()?;
            state
                .docs
                .get(&path.to_string())
                .map(|stored| (stored.value.clone(), stored.revision))
        };

        DatastoreEvent::read(
            path.collection().to_string(),
            path.id().to_owned(),
            stored.is_some(),
            None,
        );
        match stored {
            Some((value, revision)) => Ok(Some(Versioned {
                doc: decode(&path.to_string(), value)?,
                revision,
            })),
            None => Ok(None),
        }
    }

    #[instrument(name = "memory::query", level = "trace", skip(self))]
    async fn query<D>(
        &self,
        collection: &CollectionPath,
        filters: &[Filter],
    ) -> Result<Vec<D>, Status>
    where
        D: DeserializeOwned + Send,
    {
        let collection_path = collection.to_string();
        let matching = {
            let state = self.lock()?;
            state
                .docs
                .iter()
                .filter(|(_, stored)| stored.collection == collection_path)
                .filter(|(_, stored)| filters.iter().all(|f| f.matches(&stored.value)))
                .map(|(path, stored)| (path.clone(), stored.value.clone()))
                .collect::<Vec<_>>()
        };

        DatastoreEvent::query(collection_path, matching.len(), None);
        matching
            .into_iter()
            .map(|(path, value)| decode(&path, value))
            .collect()
    }

    #[instrument(name = "memory::commit", level = "trace", skip(self, writes))]
    async fn commit(&self, writes: Vec<Write>) -> Result<(), Status> {
        let docs = writes.iter().map(|w| w.path.to_string()).collect();
        let result = self.apply(writes);
        DatastoreEvent::commit(docs, result.as_ref().err().map(|e| e.to_string()));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
    struct Doc {
        id: String,
        kind: String,
    }

    fn doc(id: &str, kind: &str) -> Doc {
        Doc {
            id: id.to_owned(),
            kind: kind.to_owned(),
        }
    }

    async fn put(store: &MemoryStore, path: DocPath, d: &Doc) {
        store
            .commit(vec![Write::set(path, d, Precondition::None).unwrap()])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn read_missing_returns_none() {
        let store = MemoryStore::new();
        let read: Option<Versioned<Doc>> = store
            .read(&CollectionPath::users().doc("u1"))
            .await
            .unwrap();
        assert!(read.is_none());
    }

    #[tokio::test]
    async fn revisions_change_on_every_write() {
        let store = MemoryStore::new();
        let path = CollectionPath::users().doc("u1");
        put(&store, path.clone(), &doc("u1", "a")).await;
        let first: Versioned<Doc> = store.read(&path).await.unwrap().unwrap();
        put(&store, path.clone(), &doc("u1", "b")).await;
        let second: Versioned<Doc> = store.read(&path).await.unwrap().unwrap();

        assert!(second.revision > first.revision);
        assert_eq!(second.doc, doc("u1", "b"));
    }

    #[tokio::test]
    async fn stale_revision_aborts_whole_commit() {
        let store = MemoryStore::new();
        let path = CollectionPath::users().doc("u1");
        put(&store, path.clone(), &doc("u1", "a")).await;
        let stale: Versioned<Doc> = store.read(&path).await.unwrap().unwrap();
        put(&store, path.clone(), &doc("u1", "b")).await;

        let other = CollectionPath::users().doc("u2");
        let result = store
            .commit(vec![
                Write::set(other.clone(), &doc("u2", "c"), Precondition::Missing).unwrap(),
                Write::set(
                    path.clone(),
                    &doc("u1", "d"),
                    Precondition::Revision(stale.revision),
                )
                .unwrap(),
            ])
            .await;

        assert!(matches!(result, Err(Status::Aborted(_))));
        let untouched: Option<Versioned<Doc>> = store.read(&other).await.unwrap();
        assert!(untouched.is_none());
    }

    #[tokio::test]
    async fn missing_precondition_rejects_existing_doc() {
        let store = MemoryStore::new();
        let path = CollectionPath::owned_games("u1").doc("g1");
        let write = Write::set(path.clone(), &doc("g1", "a"), Precondition::Missing).unwrap();
        assert_eq!(store.commit(vec![write.clone()]).await, Ok(()));
        assert!(matches!(
            store.commit(vec![write]).await,
            Err(Status::Aborted(_))
        ));
    }

    #[tokio::test]
    async fn delete_requires_existing_doc() {
        let store = MemoryStore::new();
        let path = CollectionPath::users().doc("u1");
        let delete = Write::delete(path.clone(), Precondition::Exists);
        assert!(matches!(
            store.commit(vec![delete.clone()]).await,
            Err(Status::Aborted(_))
        ));

        put(&store, path.clone(), &doc("u1", "a")).await;
        assert_eq!(store.commit(vec![delete]).await, Ok(()));
        let read: Option<Versioned<Doc>> = store.read(&path).await.unwrap();
        assert!(read.is_none());
    }

    #[tokio::test]
    async fn query_is_scoped_to_collection_and_filtered() {
        let store = MemoryStore::new();
        put(&store, CollectionPath::catalogue().doc("a"), &doc("a", "rpg")).await;
        put(&store, CollectionPath::catalogue().doc("b"), &doc("b", "racing")).await;
        put(&store, CollectionPath::catalogue().doc("c"), &doc("c", "rpg")).await;
        put(
            &store,
            CollectionPath::owned_games("u1").doc("d"),
            &doc("d", "rpg"),
        )
        .await;

        let rpgs: Vec<Doc> = store
            .query(&CollectionPath::catalogue(), &[Filter::eq("kind", "rpg")])
            .await
            .unwrap();
        assert_eq!(rpgs, vec![doc("a", "rpg"), doc("c", "rpg")]);

        let owned: Vec<Doc> = store
            .query(&CollectionPath::owned_games("u1"), &[])
            .await
            .unwrap();
        assert_eq!(owned, vec![doc("d", "rpg")]);

        let none: Vec<Doc> = store
            .query(&CollectionPath::owned_games("u2"), &[])
            .await
            .unwrap();
        assert!(none.is_empty());
    }
}
