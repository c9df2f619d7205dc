use tracing::instrument;

use crate::{
    datastore::{CollectionPath, Filter, Precondition, Versioned, Write},
    documents::{normalize_email, UserProfile},
    traits::DocumentStore,
    Status,
};

#[instrument(name = "users::read", level = "trace", skip(store))]
pub async fn read<S: DocumentStore>(
    store: &S,
    user_id: &str,
) -> Result<Option<Versioned<UserProfile>>, Status> {
    store.read(&CollectionPath::users().doc(user_id)).await
}

/// Looks up a profile by email. Emails are compared in normalized form.
#[instrument(name = "users::find_by_email", level = "trace", skip(store))]
pub async fn find_by_email<S: DocumentStore>(
    store: &S,
    email: &str,
) -> Result<Option<UserProfile>, Status> {
    let profiles: Vec<UserProfile> = store
        .query(
            &CollectionPath::users(),
            &[Filter::eq("email", normalize_email(email))],
        )
        .await?;
    Ok(profiles.into_iter().next())
}

pub fn write(profile: &UserProfile, precondition: Precondition) -> Result<Write, Status> {
    Write::set(
        CollectionPath::users().doc(&profile.id),
        profile,
        precondition,
    )
}
