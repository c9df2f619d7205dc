use async_trait::async_trait;
use firestore::{
    errors::FirestoreError, timestamp_utils::from_timestamp, FirestoreDb, FirestoreDocument,
    FirestoreTransaction, FirestoreWritePrecondition,
};
use serde::de::DeserializeOwned;
use tracing::instrument;

use crate::{
    datastore::{CollectionPath, DocPath, Filter, Precondition, Revision, Versioned, Write, WriteOp},
    logging::DatastoreEvent,
    traits::DocumentStore,
    Status,
};

pub struct FirestoreApi {
    db: FirestoreDb,
}

impl FirestoreApi {
    pub async fn connect(project_id: &str) -> Result<Self, Status> {
        Ok(FirestoreApi {
            db: FirestoreDb::new(project_id).await?,
        })
    }

    pub fn db(&self) -> &FirestoreDb {
        &self.db
    }

    /// Absolute parent path of a collection as expected by the Firestore
    /// client.
    fn parent(&self, collection: &CollectionPath) -> String {
        match collection.parent() {
            Some(parent) => format!("{}/{parent}", self.db.get_documents_path()),
            None => self.db.get_documents_path().to_owned(),
        }
    }

    async fn commit_transaction(&self, writes: &[Write]) -> Result<(), Status> {
        let mut transaction = self.db.begin_transaction().await?;
        for write in writes {
            if let Err(status) = self.add_write(write, &mut transaction) {
                transaction.rollback().await?;
                return Err(status);
            }
        }

        match transaction.commit().await {
            Ok(_) => Ok(()),
            Err(e) => Err(commit_status(e)),
        }
    }

    fn add_write(
        &self,
        write: &Write,
        transaction: &mut FirestoreTransaction<'_>,
    ) -> Result<(), Status> {
        let collection = write.path.collection();
        let parent = self.parent(collection);

        match &write.op {
            WriteOp::Set(value) => {
                let update = self.db.fluent().update().in_col(collection.name());
                let update = match precondition(write.precondition) {
                    Some(precondition) => update.precondition(precondition),
                    None => update,
                };
                update
                    .document_id(write.path.id())
                    .parent(&parent)
                    .object(value)
                    .add_to_transaction(transaction)?;
            }
            WriteOp::Delete => {
                let delete = self.db.fluent().delete().from(collection.name());
                let delete = match precondition(write.precondition) {
                    Some(precondition) => delete.precondition(precondition),
                    None => delete,
                };
                delete
                    .document_id(write.path.id())
                    .parent(&parent)
                    .add_to_transaction(transaction)?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FirestoreApi {
    #[instrument(name = "firestore::read", level = "trace", skip(self))]
    async fn read<D>(&self, path: &DocPath) -> Result<Option<Versioned<D>>, Status>
    where
        D: DeserializeOwned + Send,
    {
        let doc: Result<Option<FirestoreDocument>, FirestoreError> = self
            .db
            .fluent()
            .select()
            .by_id_in(path.collection().name())
            .parent(self.parent(path.collection()))
            .one(path.id())
            .await;

        let collection = path.collection().to_string();
        match doc {
            Ok(Some(doc)) => {
                DatastoreEvent::read(collection, path.id().to_owned(), true, None);
                Ok(Some(versioned(path, &doc)?))
            }
            Ok(None) => {
                DatastoreEvent::read(collection, path.id().to_owned(), false, None);
                Ok(None)
            }
            Err(e) => {
                DatastoreEvent::read(
                    collection,
                    path.id().to_owned(),
                    false,
                    Some(e.to_string()),
                );
                Err(make_status(e, &path.to_string()))
            }
        }
    }

    #[instrument(name = "firestore::query", level = "trace", skip(self))]
    async fn query<D>(
        &self,
        collection: &CollectionPath,
        filters: &[Filter],
    ) -> Result<Vec<D>, Status>
    where
        D: DeserializeOwned + Send,
    {
        let docs: Result<Vec<D>, FirestoreError> = self
            .db
            .fluent()
            .select()
            .from(collection.name())
            .parent(self.parent(collection))
            .filter(|q| {
                q.for_all(
                    filters
                        .iter()
                        .map(|filter| q.field(filter.field.as_str()).equal(filter.value.as_str())),
                )
            })
            .obj()
            .query()
            .await;

        match docs {
            Ok(docs) => {
                DatastoreEvent::query(collection.to_string(), docs.len(), None);
                Ok(docs)
            }
            Err(e) => {
                DatastoreEvent::query(collection.to_string(), 0, Some(e.to_string()));
                Err(make_status(e, &collection.to_string()))
            }
        }
    }

    #[instrument(name = "firestore::commit", level = "trace", skip(self, writes))]
    async fn commit(&self, writes: Vec<Write>) -> Result<(), Status> {
        let docs = writes.iter().map(|w| w.path.to_string()).collect();
        let result = self.commit_transaction(&writes).await;
        DatastoreEvent::commit(docs, result.as_ref().err().map(|e| e.to_string()));
        result
    }
}

fn versioned<D: DeserializeOwned>(
    path: &DocPath,
    doc: &FirestoreDocument,
) -> Result<Versioned<D>, Status> {
    let revision = match &doc.update_time {
        Some(update_time) => Revision::new(from_timestamp(update_time.clone())?),
        None => {
            return Err(Status::internal(format!(
                "Firestore '{path}' document has no update time"
            )))
        }
    };

    match FirestoreDb::deserialize_doc_to::<D>(doc) {
        Ok(doc) => Ok(Versioned { doc, revision }),
        Err(e) => Err(make_status(e, &path.to_string())),
    }
}

fn precondition(precondition: Precondition) -> Option<FirestoreWritePrecondition> {
    match precondition {
        Precondition::None => None,
        Precondition::Missing => Some(FirestoreWritePrecondition::Exists(false)),
        Precondition::Exists => Some(FirestoreWritePrecondition::Exists(true)),
        Precondition::Revision(revision) => Some(FirestoreWritePrecondition::UpdateTime(
            revision.update_time(),
        )),
    }
}

/// Failed write preconditions and transaction contention surface as aborted
/// commits so that callers can retry them.
fn commit_status(error: FirestoreError) -> Status {
    match error {
        FirestoreError::DataConflictError(e) => Status::aborted(e.to_string()),
        FirestoreError::DataNotFoundError(e) => Status::aborted(e.to_string()),
        e => {
            let msg = e.to_string();
            match msg.contains("FailedPrecondition")
                || msg.contains("FAILED_PRECONDITION")
                || msg.contains("Aborted")
                || msg.contains("ABORTED")
            {
                true => Status::aborted(msg),
                false => Status::internal(format!("Firestore commit error: {msg}")),
            }
        }
    }
}

pub fn make_status(error: FirestoreError, path: &str) -> Status {
    match error {
        FirestoreError::DeserializeError(e) => Status::internal(format!(
            "Firestore '{path}' document failed to parse with error '{}'",
            e.message,
        )),
        e => Status::internal(format!("Firestore '{path}' error: {e}")),
    }
}
