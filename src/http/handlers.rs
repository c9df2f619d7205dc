use serde::Serialize;
use std::{convert::Infallible, sync::Arc};
use tracing::{info, instrument, warn};
use warp::{http::StatusCode, reply::Response, Reply};

use crate::{
    auth::Session,
    documents::{PublicProfile, RecommendationRequest},
    http::models,
    library::{
        user::{ensure_profile, read_profile},
        ChatManager, LibraryManager, ProfileUpdate, SocialManager,
        StoreManager, User,
    },
    log_request,
    logging::LogHttpRequest,
    recommendations::{friend_activity_from, Recommender},
    traits::{DocumentStore, RecommendationModel},
    Status,
};

use super::resources::AuthRejection;

#[instrument(level = "trace")]
pub async fn welcome() -> Result<impl warp::Reply, Infallible> {
    info!(
        http_request.request_method = "GET",
        http_request.request_url = "/",
        labels.log_type = "http_logs",
        labels.handler = "welcome",
        "welcome"
    );
    Ok("welcome")
}

#[instrument(level = "info", skip(session, store), fields(uid = %session.uid))]
pub async fn get_profile<S: DocumentStore>(
    session: Session,
    store: Arc<S>,
) -> Result<Response, Infallible> {
    let result = User::fetch(store, &session).await.map(User::into_profile);
    log_request!(LogHttpRequest::new("GET", "/profile", &session.uid, &result));
    Ok(reply(result))
}

#[instrument(level = "info", skip(update, session, store), fields(uid = %session.uid))]
pub async fn post_profile<S: DocumentStore>(
    update: ProfileUpdate,
    session: Session,
    store: Arc<S>,
) -> Result<Response, Infallible> {
    let result = match User::fetch(store, &session).await {
        Ok(mut user) => match user.update_profile(update).await {
            Ok(_) => Ok(user.into_profile()),
            Err(status) => Err(status),
        },
        Err(status) => Err(status),
    };
    log_request!(LogHttpRequest::new("POST", "/profile", &session.uid, &result));
    Ok(reply(result))
}

#[instrument(level = "info", skip(session, store), fields(uid = %session.uid))]
pub async fn get_user<S: DocumentStore>(
    user_id: String,
    session: Session,
    store: Arc<S>,
) -> Result<Response, Infallible> {
    let result = read_profile(&*store, &user_id).await;
    log_request!(LogHttpRequest::new("GET", "/users/{uid}", &session.uid, &result));
    Ok(match result {
        Ok(profile) if profile.id == session.uid => reply(Ok(profile)),
        result => reply(result.map(PublicProfile::from)),
    })
}

#[instrument(level = "info", skip(session, store), fields(uid = %session.uid))]
pub async fn post_presence<S: DocumentStore>(
    update: models::PresenceUpdate,
    session: Session,
    store: Arc<S>,
) -> Result<Response, Infallible> {
    let result = match User::fetch(store, &session).await {
        Ok(mut user) => match user.set_presence(update.presence, update.current_game).await {
            Ok(_) => Ok(user.into_profile()),
            Err(status) => Err(status),
        },
        Err(status) => Err(status),
    };
    log_request!(LogHttpRequest::new("POST", "/presence", &session.uid, &result));
    Ok(reply(result))
}

#[instrument(level = "info", skip(session, store), fields(uid = %session.uid))]
pub async fn get_friends<S: DocumentStore>(
    session: Session,
    store: Arc<S>,
) -> Result<Response, Infallible> {
    let result = match ensure_profile(&*store, &session).await {
        Ok(_) => SocialManager::new(store).friends(&session.uid).await,
        Err(status) => Err(status),
    };
    log_request!(LogHttpRequest::new("GET", "/friends", &session.uid, &result));
    Ok(reply(result))
}

#[instrument(level = "info", skip(session, store), fields(uid = %session.uid))]
pub async fn delete_friend<S: DocumentStore>(
    friend_id: String,
    session: Session,
    store: Arc<S>,
) -> Result<Response, Infallible> {
    let result = SocialManager::new(store)
        .remove_friend(&session, &friend_id)
        .await;
    log_request!(LogHttpRequest::new("DELETE", "/friends/{id}", &session.uid, &result));
    Ok(reply_ok(result))
}

#[instrument(level = "info", skip(session, store), fields(uid = %session.uid))]
pub async fn get_friend_requests<S: DocumentStore>(
    session: Session,
    store: Arc<S>,
) -> Result<Response, Infallible> {
    let social = SocialManager::new(store);
    let result = match futures::try_join!(
        social.incoming_requests(&session.uid),
        social.outgoing_requests(&session.uid)
    ) {
        Ok((incoming, outgoing)) => Ok(models::FriendRequests { incoming, outgoing }),
        Err(status) => Err(status),
    };
    log_request!(LogHttpRequest::new("GET", "/friends/requests", &session.uid, &result));
    Ok(reply(result))
}

#[instrument(level = "info", skip(session, store), fields(uid = %session.uid))]
pub async fn post_friend_request<S: DocumentStore>(
    request: models::SendFriendRequest,
    session: Session,
    store: Arc<S>,
) -> Result<Response, Infallible> {
    let result = SocialManager::new(store)
        .send_request(&session, &request.email)
        .await;
    log_request!(LogHttpRequest::new("POST", "/friends/requests", &session.uid, &result));
    Ok(reply(result))
}

#[instrument(level = "info", skip(session, store), fields(uid = %session.uid))]
pub async fn post_accept_request<S: DocumentStore>(
    request_id: String,
    session: Session,
    store: Arc<S>,
) -> Result<Response, Infallible> {
    let result = SocialManager::new(store)
        .accept_request(&session, &request_id)
        .await;
    log_request!(LogHttpRequest::new(
        "POST",
        "/friends/requests/{id}/accept",
        &session.uid,
        &result
    ));
    Ok(reply(result))
}

#[instrument(level = "info", skip(session, store), fields(uid = %session.uid))]
pub async fn post_decline_request<S: DocumentStore>(
    request_id: String,
    session: Session,
    store: Arc<S>,
) -> Result<Response, Infallible> {
    let result = SocialManager::new(store)
        .decline_request(&session, &request_id)
        .await;
    log_request!(LogHttpRequest::new(
        "POST",
        "/friends/requests/{id}/decline",
        &session.uid,
        &result
    ));
    Ok(reply(result))
}

#[instrument(level = "info", skip(session, store), fields(uid = %session.uid))]
pub async fn post_cancel_request<S: DocumentStore>(
    request_id: String,
    session: Session,
    store: Arc<S>,
) -> Result<Response, Infallible> {
    let result = SocialManager::new(store)
        .cancel_request(&session, &request_id)
        .await;
    log_request!(LogHttpRequest::new(
        "POST",
        "/friends/requests/{id}/cancel",
        &session.uid,
        &result
    ));
    Ok(reply(result))
}

#[instrument(level = "info", skip(session, store), fields(uid = %session.uid))]
pub async fn get_catalogue<S: DocumentStore>(
    query: models::CatalogueQuery,
    session: Session,
    store: Arc<S>,
) -> Result<Response, Infallible> {
    let result = StoreManager::new(store)
        .list_catalogue(query.category.as_deref())
        .await;
    log_request!(LogHttpRequest::new("GET", "/catalogue", &session.uid, &result));
    Ok(reply(result))
}

#[instrument(level = "info", skip(session, store), fields(uid = %session.uid))]
pub async fn get_featured<S: DocumentStore>(
    session: Session,
    store: Arc<S>,
) -> Result<Response, Infallible> {
    let result = StoreManager::new(store).featured().await;
    log_request!(LogHttpRequest::new("GET", "/catalogue/featured", &session.uid, &result));
    Ok(reply(result))
}

#[instrument(level = "info", skip(session, store), fields(uid = %session.uid))]
pub async fn get_catalogue_item<S: DocumentStore>(
    item_id: String,
    session: Session,
    store: Arc<S>,
) -> Result<Response, Infallible> {
    let result = StoreManager::new(store).get_item(&item_id).await;
    log_request!(LogHttpRequest::new("GET", "/catalogue/{id}", &session.uid, &result));
    Ok(reply(result))
}

#[instrument(level = "info", skip(session, store), fields(uid = %session.uid))]
pub async fn get_cart<S: DocumentStore>(
    session: Session,
    store: Arc<S>,
) -> Result<Response, Infallible> {
    let result = StoreManager::new(store).cart(&session.uid).await;
    log_request!(LogHttpRequest::new("GET", "/cart", &session.uid, &result));
    Ok(reply(result))
}

#[instrument(level = "info", skip(session, store), fields(uid = %session.uid))]
pub async fn post_cart<S: DocumentStore>(
    add: models::CartAdd,
    session: Session,
    store: Arc<S>,
) -> Result<Response, Infallible> {
    let result = StoreManager::new(store)
        .add_to_cart(&session, &add.item_id)
        .await;
    log_request!(LogHttpRequest::new("POST", "/cart", &session.uid, &result));
    Ok(reply(result))
}

#[instrument(level = "info", skip(session, store), fields(uid = %session.uid))]
pub async fn delete_cart_item<S: DocumentStore>(
    item_id: String,
    session: Session,
    store: Arc<S>,
) -> Result<Response, Infallible> {
    let result = StoreManager::new(store)
        .remove_from_cart(&session, &item_id)
        .await;
    log_request!(LogHttpRequest::new("DELETE", "/cart/{id}", &session.uid, &result));
    Ok(reply_ok(result))
}

#[instrument(level = "info", skip(session, store), fields(uid = %session.uid))]
pub async fn delete_cart<S: DocumentStore>(
    session: Session,
    store: Arc<S>,
) -> Result<Response, Infallible> {
    let result = StoreManager::new(store).clear_cart(&session).await;
    log_request!(LogHttpRequest::new("DELETE", "/cart", &session.uid, &result));
    Ok(reply_ok(result))
}

#[instrument(level = "info", skip(session, store), fields(uid = %session.uid))]
pub async fn post_checkout<S: DocumentStore>(
    checkout: models::Checkout,
    session: Session,
    store: Arc<S>,
) -> Result<Response, Infallible> {
    let result = StoreManager::new(store)
        .checkout(&session, &checkout.payment_method)
        .await;
    log_request!(LogHttpRequest::new("POST", "/cart/checkout", &session.uid, &result));
    Ok(reply(result))
}

#[instrument(level = "info", skip(session, store), fields(uid = %session.uid))]
pub async fn post_purchase<S: DocumentStore>(
    purchase: models::PurchaseOp,
    session: Session,
    store: Arc<S>,
) -> Result<Response, Infallible> {
    let result = StoreManager::new(store)
        .purchase(&session, &purchase.item_id, &purchase.payment_method)
        .await;
    log_request!(LogHttpRequest::new("POST", "/purchase", &session.uid, &result));
    Ok(reply(result))
}

#[instrument(level = "info", skip(session, store), fields(uid = %session.uid))]
pub async fn get_purchases<S: DocumentStore>(
    session: Session,
    store: Arc<S>,
) -> Result<Response, Infallible> {
    let result = StoreManager::new(store).purchases(&session.uid).await;
    log_request!(LogHttpRequest::new("GET", "/purchases", &session.uid, &result));
    Ok(reply(result))
}

#[instrument(level = "info", skip(session, store), fields(uid = %session.uid))]
pub async fn get_library<S: DocumentStore>(
    session: Session,
    store: Arc<S>,
) -> Result<Response, Infallible> {
    let result = LibraryManager::new(store).library(&session.uid).await;
    log_request!(LogHttpRequest::new("GET", "/library", &session.uid, &result));
    Ok(reply(result))
}

#[instrument(level = "info", skip(session, store), fields(uid = %session.uid))]
pub async fn post_achievement<S: DocumentStore>(
    game_id: String,
    achievement_id: String,
    update: models::AchievementProgress,
    session: Session,
    store: Arc<S>,
) -> Result<Response, Infallible> {
    let result = LibraryManager::new(store)
        .update_achievement(&session, &game_id, &achievement_id, update.progress)
        .await;
    log_request!(LogHttpRequest::new(
        "POST",
        "/library/{game}/achievements/{id}",
        &session.uid,
        &result
    ));
    Ok(reply(result))
}

#[instrument(level = "info", skip(session, store), fields(uid = %session.uid))]
pub async fn post_playtime<S: DocumentStore>(
    game_id: String,
    play: models::PlaySession,
    session: Session,
    store: Arc<S>,
) -> Result<Response, Infallible> {
    let result = LibraryManager::new(store)
        .record_playtime(&session, &game_id, play.minutes)
        .await;
    log_request!(LogHttpRequest::new(
        "POST",
        "/library/{game}/playtime",
        &session.uid,
        &result
    ));
    Ok(reply(result))
}

#[instrument(level = "info", skip(session, store), fields(uid = %session.uid))]
pub async fn get_achievements<S: DocumentStore>(
    session: Session,
    store: Arc<S>,
) -> Result<Response, Infallible> {
    let result = LibraryManager::new(store)
        .achievement_summary(&session.uid)
        .await;
    log_request!(LogHttpRequest::new("GET", "/achievements", &session.uid, &result));
    Ok(reply(result))
}

#[instrument(level = "info", skip(session, store), fields(uid = %session.uid))]
pub async fn get_messages<S: DocumentStore>(
    friend_id: String,
    query: models::MessagesQuery,
    session: Session,
    store: Arc<S>,
) -> Result<Response, Infallible> {
    let result = ChatManager::new(store)
        .messages(&session, &friend_id, query.limit)
        .await;
    log_request!(LogHttpRequest::new("GET", "/chat/{friend}", &session.uid, &result));
    Ok(reply(result))
}

#[instrument(level = "info", skip(message, session, store), fields(uid = %session.uid))]
pub async fn post_message<S: DocumentStore>(
    friend_id: String,
    message: models::MessageOp,
    session: Session,
    store: Arc<S>,
) -> Result<Response, Infallible> {
    let result = ChatManager::new(store)
        .send_message(&session, &friend_id, &message.text)
        .await;
    log_request!(LogHttpRequest::new("POST", "/chat/{friend}", &session.uid, &result));
    Ok(reply(result))
}

#[instrument(level = "info", skip(request, session, store, model), fields(uid = %session.uid))]
pub async fn post_recommendations<S: DocumentStore, M: RecommendationModel>(
    mut request: RecommendationRequest,
    session: Session,
    store: Arc<S>,
    model: Arc<M>,
) -> Result<Response, Infallible> {
    let result = async {
        if request.friend_activity.trim().is_empty() {
            ensure_profile(&*store, &session).await?;
            let friends = SocialManager::new(store).friends(&session.uid).await?;
            request.friend_activity = friend_activity_from(&friends);
        }
        Recommender::new(model).recommend(&request).await
    }
    .await;
    log_request!(LogHttpRequest::new("POST", "/recommendations", &session.uid, &result));
    Ok(reply(result))
}

/// Turns rejected requests into JSON error replies.
pub async fn rejection(err: warp::Rejection) -> Result<Response, Infallible> {
    if let Some(AuthRejection(status)) = err.find::<AuthRejection>() {
        return Ok(error_reply(status));
    }

    let status = if err.is_not_found() {
        Status::not_found("No such route")
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        Status::invalid_argument(e.to_string())
    } else if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
        Status::invalid_argument(e.to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        return Ok(warp::reply::with_status(
            warp::reply::json(&models::ErrorReply {
                error: "Method not allowed".to_owned(),
            }),
            StatusCode::METHOD_NOT_ALLOWED,
        )
        .into_response());
    } else {
        warn!("Unhandled rejection: {:?}", err);
        Status::internal(format!("{:?}", err))
    };
    Ok(error_reply(&status))
}

fn reply<T: Serialize>(result: Result<T, Status>) -> Response {
    match result {
        Ok(value) => warp::reply::json(&value).into_response(),
        Err(status) => error_reply(&status),
    }
}

fn reply_ok(result: Result<(), Status>) -> Response {
    match result {
        Ok(()) => StatusCode::OK.into_response(),
        Err(status) => error_reply(&status),
    }
}

fn error_reply(status: &Status) -> Response {
    warp::reply::with_status(
        warp::reply::json(&models::ErrorReply {
            error: status.to_string(),
        }),
        status.http_code(),
    )
    .into_response()
}
