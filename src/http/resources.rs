use std::{convert::Infallible, sync::Arc};
use warp::{self, Filter};

use crate::{auth::Session, traits::IdentityVerifier, Status};

pub fn with_store<S: Send + Sync + 'static>(
    store: Arc<S>,
) -> impl Filter<Extract = (Arc<S>,), Error = Infallible> + Clone {
    warp::any().map(move || Arc::clone(&store))
}

pub fn with_model<M: Send + Sync + 'static>(
    model: Arc<M>,
) -> impl Filter<Extract = (Arc<M>,), Error = Infallible> + Clone {
    warp::any().map(move || Arc::clone(&model))
}

/// Extracts the caller's session from the `Authorization: Bearer` header.
/// Requests without a valid token are rejected with `AuthRejection`.
pub fn with_session<V: IdentityVerifier + 'static>(
    verifier: Arc<V>,
) -> impl Filter<Extract = (Session,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>("authorization").and_then(move |header: Option<String>| {
        let verifier = Arc::clone(&verifier);
        async move {
            let token = Session::bearer_token(header.as_deref())
                .map_err(|status| warp::reject::custom(AuthRejection(status)))?;
            verifier
                .verify(token)
                .await
                .map_err(|status| warp::reject::custom(AuthRejection(status)))
        }
    })
}

#[derive(Debug)]
pub struct AuthRejection(pub Status);

impl warp::reject::Reject for AuthRejection {}
