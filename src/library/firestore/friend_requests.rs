use tracing::instrument;

use crate::{
    datastore::{CollectionPath, Filter, Precondition, Versioned, Write},
    documents::{FriendRequest, RequestStatus},
    traits::DocumentStore,
    Status,
};

#[instrument(name = "friend_requests::read", level = "trace", skip(store))]
pub async fn read<S: DocumentStore>(
    store: &S,
    request_id: &str,
) -> Result<Option<Versioned<FriendRequest>>, Status> {
    store
        .read(&CollectionPath::friend_requests().doc(request_id))
        .await
}

/// Pending requests addressed to the user, newest first.
#[instrument(name = "friend_requests::incoming", level = "trace", skip(store))]
pub async fn incoming<S: DocumentStore>(
    store: &S,
    user_id: &str,
) -> Result<Vec<FriendRequest>, Status> {
    pending(store, "to_id", user_id).await
}

/// Pending requests sent by the user, newest first.
#[instrument(name = "friend_requests::outgoing", level = "trace", skip(store))]
pub async fn outgoing<S: DocumentStore>(
    store: &S,
    user_id: &str,
) -> Result<Vec<FriendRequest>, Status> {
    pending(store, "from_id", user_id).await
}

async fn pending<S: DocumentStore>(
    store: &S,
    field: &str,
    user_id: &str,
) -> Result<Vec<FriendRequest>, Status> {
    let mut requests: Vec<FriendRequest> = store
        .query(
            &CollectionPath::friend_requests(),
            &[
                Filter::eq(field, user_id),
                Filter::eq("status", RequestStatus::Pending.as_str()),
            ],
        )
        .await?;
    requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(requests)
}

pub fn write(request: &FriendRequest, precondition: Precondition) -> Result<Write, Status> {
    Write::set(
        CollectionPath::friend_requests().doc(&request.id),
        request,
        precondition,
    )
}
