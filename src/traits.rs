use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::{
    auth::Session,
    datastore::{CollectionPath, DocPath, Filter, Versioned, Write},
    documents::{RecommendationRequest, Recommendations},
    Status,
};

/// Hosted document database holding the service's collections.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Reads a document and the revision it was read at. Returns None if the
    /// document does not exist.
    async fn read<D>(&self, path: &DocPath) -> Result<Option<Versioned<D>>, Status>
    where
        D: DeserializeOwned + Send;

    /// Returns all documents in `collection` matching every filter.
    async fn query<D>(&self, collection: &CollectionPath, filters: &[Filter]) -> Result<Vec<D>, Status>
    where
        D: DeserializeOwned + Send;

    /// Applies all writes atomically. If any precondition does not hold the
    /// commit fails with `Status::Aborted` and nothing is written.
    async fn commit(&self, writes: Vec<Write>) -> Result<(), Status>;
}

/// Authentication service that turns a bearer token into a session.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Session, Status>;
}

/// External generative model producing game recommendations.
#[async_trait]
pub trait RecommendationModel: Send + Sync {
    async fn recommend(&self, request: &RecommendationRequest) -> Result<Recommendations, Status>;
}
