use crate::{
    documents::RecommendationRequest,
    library::ProfileUpdate,
    traits::{DocumentStore, IdentityVerifier, RecommendationModel},
};
use std::{convert::Infallible, sync::Arc};
use tracing::warn;
use warp::{self, Filter};

use super::{handlers, models, resources::*};

/// Returns a Filter with all available routes. Rejections are turned into
/// JSON error replies.
pub fn routes<S, V, M>(
    store: Arc<S>,
    verifier: Arc<V>,
    model: Arc<M>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = Infallible> + Clone
where
    S: DocumentStore + 'static,
    V: IdentityVerifier + 'static,
    M: RecommendationModel + 'static,
{
    home()
        .or(profile_routes(Arc::clone(&store), Arc::clone(&verifier)))
        .or(social_routes(Arc::clone(&store), Arc::clone(&verifier)))
        .or(store_routes(Arc::clone(&store), Arc::clone(&verifier)))
        .or(library_routes(Arc::clone(&store), Arc::clone(&verifier)))
        .or(chat_routes(Arc::clone(&store), Arc::clone(&verifier)))
        .or(post_recommendations(store, verifier, model))
        .or_else(|e| async {
            warn! {"Rejected route: {:?}", e};
            Err(e)
        })
        .recover(handlers::rejection)
}

/// GET /
fn home() -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    warp::path!().and(warp::get()).and_then(handlers::welcome)
}

/// GET /profile, POST /profile, GET /users/{uid}, POST /presence
fn profile_routes<S: DocumentStore + 'static, V: IdentityVerifier + 'static>(
    store: Arc<S>,
    verifier: Arc<V>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let get_profile = warp::path!("profile")
        .and(warp::get())
        .and(with_session(Arc::clone(&verifier)))
        .and(with_store(Arc::clone(&store)))
        .and_then(handlers::get_profile::<S>);

    let post_profile = warp::path!("profile")
        .and(warp::post())
        .and(json_body::<ProfileUpdate>())
        .and(with_session(Arc::clone(&verifier)))
        .and(with_store(Arc::clone(&store)))
        .and_then(handlers::post_profile::<S>);

    let get_user = warp::path!("users" / String)
        .and(warp::get())
        .and(with_session(Arc::clone(&verifier)))
        .and(with_store(Arc::clone(&store)))
        .and_then(handlers::get_user::<S>);

    let post_presence = warp::path!("presence")
        .and(warp::post())
        .and(json_body::<models::PresenceUpdate>())
        .and(with_session(verifier))
        .and(with_store(store))
        .and_then(handlers::post_presence::<S>);

    get_profile.or(post_profile).or(get_user).or(post_presence)
}

/// Friends and friend requests.
fn social_routes<S: DocumentStore + 'static, V: IdentityVerifier + 'static>(
    store: Arc<S>,
    verifier: Arc<V>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let get_requests = warp::path!("friends" / "requests")
        .and(warp::get())
        .and(with_session(Arc::clone(&verifier)))
        .and(with_store(Arc::clone(&store)))
        .and_then(handlers::get_friend_requests::<S>);

    let post_request = warp::path!("friends" / "requests")
        .and(warp::post())
        .and(json_body::<models::SendFriendRequest>())
        .and(with_session(Arc::clone(&verifier)))
        .and(with_store(Arc::clone(&store)))
        .and_then(handlers::post_friend_request::<S>);

    let accept = warp::path!("friends" / "requests" / String / "accept")
        .and(warp::post())
        .and(with_session(Arc::clone(&verifier)))
        .and(with_store(Arc::clone(&store)))
        .and_then(handlers::post_accept_request::<S>);

    let decline = warp::path!("friends" / "requests" / String / "decline")
        .and(warp::post())
        .and(with_session(Arc::clone(&verifier)))
        .and(with_store(Arc::clone(&store)))
        .and_then(handlers::post_decline_request::<S>);

    let cancel = warp::path!("friends" / "requests" / String / "cancel")
        .and(warp::post())
        .and(with_session(Arc::clone(&verifier)))
        .and(with_store(Arc::clone(&store)))
        .and_then(handlers::post_cancel_request::<S>);

    let get_friends = warp::path!("friends")
        .and(warp::get())
        .and(with_session(Arc::clone(&verifier)))
        .and(with_store(Arc::clone(&store)))
        .and_then(handlers::get_friends::<S>);

    let delete_friend = warp::path!("friends" / String)
        .and(warp::delete())
        .and(with_session(verifier))
        .and(with_store(store))
        .and_then(handlers::delete_friend::<S>);

    get_requests
        .or(post_request)
        .or(accept)
        .or(decline)
        .or(cancel)
        .or(get_friends)
        .or(delete_friend)
}

/// Catalogue, cart and purchases.
fn store_routes<S: DocumentStore + 'static, V: IdentityVerifier + 'static>(
    store: Arc<S>,
    verifier: Arc<V>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let get_catalogue = warp::path!("catalogue")
        .and(warp::get())
        .and(warp::query::<models::CatalogueQuery>())
        .and(with_session(Arc::clone(&verifier)))
        .and(with_store(Arc::clone(&store)))
        .and_then(handlers::get_catalogue::<S>);

    let get_featured = warp::path!("catalogue" / "featured")
        .and(warp::get())
        .and(with_session(Arc::clone(&verifier)))
        .and(with_store(Arc::clone(&store)))
        .and_then(handlers::get_featured::<S>);

    let get_item = warp::path!("catalogue" / String)
        .and(warp::get())
        .and(with_session(Arc::clone(&verifier)))
        .and(with_store(Arc::clone(&store)))
        .and_then(handlers::get_catalogue_item::<S>);

    let get_cart = warp::path!("cart")
        .and(warp::get())
        .and(with_session(Arc::clone(&verifier)))
        .and(with_store(Arc::clone(&store)))
        .and_then(handlers::get_cart::<S>);

    let post_cart = warp::path!("cart")
        .and(warp::post())
        .and(json_body::<models::CartAdd>())
        .and(with_session(Arc::clone(&verifier)))
        .and(with_store(Arc::clone(&store)))
        .and_then(handlers::post_cart::<S>);

    let delete_cart = warp::path!("cart")
        .and(warp::delete())
        .and(with_session(Arc::clone(&verifier)))
        .and(with_store(Arc::clone(&store)))
        .and_then(handlers::delete_cart::<S>);

    let checkout = warp::path!("cart" / "checkout")
        .and(warp::post())
        .and(optional_json_body::<models::Checkout>())
        .and(with_session(Arc::clone(&verifier)))
        .and(with_store(Arc::clone(&store)))
        .and_then(handlers::post_checkout::<S>);

    let delete_cart_item = warp::path!("cart" / String)
        .and(warp::delete())
        .and(with_session(Arc::clone(&verifier)))
        .and(with_store(Arc::clone(&store)))
        .and_then(handlers::delete_cart_item::<S>);

    let purchase = warp::path!("purchase")
        .and(warp::post())
        .and(json_body::<models::PurchaseOp>())
        .and(with_session(Arc::clone(&verifier)))
        .and(with_store(Arc::clone(&store)))
        .and_then(handlers::post_purchase::<S>);

    let get_purchases = warp::path!("purchases")
        .and(warp::get())
        .and(with_session(verifier))
        .and(with_store(store))
        .and_then(handlers::get_purchases::<S>);

    get_catalogue
        .or(get_featured)
        .or(get_item)
        .or(get_cart)
        .or(post_cart)
        .or(delete_cart)
        .or(checkout)
        .or(delete_cart_item)
        .or(purchase)
        .or(get_purchases)
}

/// Owned games, achievements and playtime.
fn library_routes<S: DocumentStore + 'static, V: IdentityVerifier + 'static>(
    store: Arc<S>,
    verifier: Arc<V>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let get_library = warp::path!("library")
        .and(warp::get())
        .and(with_session(Arc::clone(&verifier)))
        .and(with_store(Arc::clone(&store)))
        .and_then(handlers::get_library::<S>);

    let post_achievement = warp::path!("library" / String / "achievements" / String)
        .and(warp::post())
        .and(json_body::<models::AchievementProgress>())
        .and(with_session(Arc::clone(&verifier)))
        .and(with_store(Arc::clone(&store)))
        .and_then(handlers::post_achievement::<S>);

    let post_playtime = warp::path!("library" / String / "playtime")
        .and(warp::post())
        .and(json_body::<models::PlaySession>())
        .and(with_session(Arc::clone(&verifier)))
        .and(with_store(Arc::clone(&store)))
        .and_then(handlers::post_playtime::<S>);

    let get_achievements = warp::path!("achievements")
        .and(warp::get())
        .and(with_session(verifier))
        .and(with_store(store))
        .and_then(handlers::get_achievements::<S>);

    get_library
        .or(post_achievement)
        .or(post_playtime)
        .or(get_achievements)
}

/// GET /chat/{friend}, POST /chat/{friend}
fn chat_routes<S: DocumentStore + 'static, V: IdentityVerifier + 'static>(
    store: Arc<S>,
    verifier: Arc<V>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let get_messages = warp::path!("chat" / String)
        .and(warp::get())
        .and(warp::query::<models::MessagesQuery>())
        .and(with_session(Arc::clone(&verifier)))
        .and(with_store(Arc::clone(&store)))
        .and_then(handlers::get_messages::<S>);

    let post_message = warp::path!("chat" / String)
        .and(warp::post())
        .and(json_body::<models::MessageOp>())
        .and(with_session(verifier))
        .and(with_store(store))
        .and_then(handlers::post_message::<S>);

    get_messages.or(post_message)
}

/// POST /recommendations
fn post_recommendations<S, V, M>(
    store: Arc<S>,
    verifier: Arc<V>,
    model: Arc<M>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone
where
    S: DocumentStore + 'static,
    V: IdentityVerifier + 'static,
    M: RecommendationModel + 'static,
{
    warp::path!("recommendations")
        .and(warp::post())
        .and(json_body::<RecommendationRequest>())
        .and(with_session(verifier))
        .and(with_store(store))
        .and(with_model(model))
        .and_then(handlers::post_recommendations::<S, M>)
}

fn json_body<T: serde::de::DeserializeOwned + Send>(
) -> impl Filter<Extract = (T,), Error = warp::Rejection> + Clone {
    warp::body::content_length_limit(16 * 1024).and(warp::body::json())
}

/// Like `json_body`, but a request without a body gets `T::default()`.
fn optional_json_body<T: serde::de::DeserializeOwned + Default + Send>(
) -> impl Filter<Extract = (T,), Error = warp::Rejection> + Clone {
    let empty = warp::header::optional::<u64>("content-length").and_then(
        |length: Option<u64>| async move {
            match length.unwrap_or(0) {
                0 => Ok(T::default()),
                _ => Err(warp::reject()),
            }
        },
    );
    empty.or(json_body::<T>()).unify()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::MemoryStore,
        auth::Session,
        documents::{Recommendations, RecommendedGame},
        library::{store::tests::item, StoreManager},
        Status,
    };
    use async_trait::async_trait;
    use serde_json::{json, Value};

    /// Accepts tokens of the form `uid` and `uid:email`.
    struct FakeVerifier;

    #[async_trait]
    impl IdentityVerifier for FakeVerifier {
        async fn verify(&self, token: &str) -> Result<Session, Status> {
            match token.split_once(':') {
                Some((uid, email)) => Ok(Session::new(uid, email)),
                None if token == "expired" => Err(Status::unauthenticated("Token expired")),
                None => Ok(Session::new(token, &format!("{token}@example.com"))),
            }
        }
    }

    struct FakeModel;

    #[async_trait]
    impl RecommendationModel for FakeModel {
        async fn recommend(
            &self,
            request: &RecommendationRequest,
        ) -> Result<Recommendations, Status> {
            let game = |title: &str, match_score: f64| RecommendedGame {
                title: title.to_owned(),
                platform: "PC".to_owned(),
                genre: "Roguelike".to_owned(),
                key_features: vec!["Replayability".to_owned()],
                match_score,
                reasoning: request.friend_activity.clone(),
            };
            Ok(Recommendations {
                recommended_games: vec![
                    game("Hades", 70.0),
                    game("Balatro", 90.0),
                    game("Slay the Spire", 80.0),
                ],
                summary: "Roguelikes".to_owned(),
            })
        }
    }

    fn server(
        store: Arc<MemoryStore>,
    ) -> impl Filter<Extract = (impl warp::Reply,), Error = Infallible> + Clone {
        routes(store, Arc::new(FakeVerifier), Arc::new(FakeModel))
    }

    fn body<B: AsRef<[u8]>>(response: &warp::http::Response<B>) -> Value {
        serde_json::from_slice(response.body().as_ref()).unwrap()
    }

    #[tokio::test]
    async fn welcome_needs_no_session() {
        let api = server(Arc::new(MemoryStore::new()));
        let response = warp::test::request().method("GET").path("/").reply(&api).await;
        assert_eq!(response.status(), 200);
    }

    #[tokio::test]
    async fn missing_or_invalid_token_is_unauthorized() {
        let api = server(Arc::new(MemoryStore::new()));

        let response = warp::test::request()
            .method("GET")
            .path("/profile")
            .reply(&api)
            .await;
        assert_eq!(response.status(), 401);
        assert!(body(&response)["error"].is_string());

        let response = warp::test::request()
            .method("GET")
            .path("/profile")
            .header("authorization", "Bearer expired")
            .reply(&api)
            .await;
        assert_eq!(response.status(), 401);
    }

    #[tokio::test]
    async fn profile_is_created_on_first_request() {
        let api = server(Arc::new(MemoryStore::new()));

        let response = warp::test::request()
            .method("GET")
            .path("/profile")
            .header("authorization", "Bearer u1:ada@example.com")
            .reply(&api)
            .await;
        assert_eq!(response.status(), 200);
        let profile = body(&response);
        assert_eq!(profile["id"], "u1");
        assert_eq!(profile["email"], "ada@example.com");

        let response = warp::test::request()
            .method("POST")
            .path("/profile")
            .header("authorization", "Bearer u1:ada@example.com")
            .json(&json!({ "display_name": "   " }))
            .reply(&api)
            .await;
        assert_eq!(response.status(), 400);
    }

    #[tokio::test]
    async fn friendship_over_http() {
        let api = server(Arc::new(MemoryStore::new()));
        for token in ["Bearer u1:a@example.com", "Bearer u2:b@example.com"] {
            let response = warp::test::request()
                .method("GET")
                .path("/profile")
                .header("authorization", token)
                .reply(&api)
                .await;
            assert_eq!(response.status(), 200);
        }

        let response = warp::test::request()
            .method("POST")
            .path("/friends/requests")
            .header("authorization", "Bearer u1:a@example.com")
            .json(&json!({ "email": "b@example.com" }))
            .reply(&api)
            .await;
        assert_eq!(response.status(), 200);
        let request_id = body(&response)["id"].as_str().unwrap().to_owned();

        let response = warp::test::request()
            .method("GET")
            .path("/friends/requests")
            .header("authorization", "Bearer u2:b@example.com")
            .reply(&api)
            .await;
        assert_eq!(body(&response)["incoming"].as_array().unwrap().len(), 1);

        let response = warp::test::request()
            .method("POST")
            .path(&format!("/friends/requests/{request_id}/accept"))
            .header("authorization", "Bearer u2:b@example.com")
            .reply(&api)
            .await;
        assert_eq!(response.status(), 200);

        let response = warp::test::request()
            .method("GET")
            .path("/friends")
            .header("authorization", "Bearer u1:a@example.com")
            .reply(&api)
            .await;
        let friends = body(&response);
        assert_eq!(friends.as_array().unwrap().len(), 1);
        assert_eq!(friends[0]["id"], "u2");

        let response = warp::test::request()
            .method("POST")
            .path(&format!("/friends/requests/{request_id}/accept"))
            .header("authorization", "Bearer u2:b@example.com")
            .reply(&api)
            .await;
        assert_eq!(response.status(), 409);
    }

    #[tokio::test]
    async fn purchase_over_http() {
        let store = Arc::new(MemoryStore::new());
        StoreManager::new(Arc::clone(&store))
            .seed_catalogue(vec![item("hades", "Hades", 2499)])
            .await
            .unwrap();
        let api = server(store);

        let response = warp::test::request()
            .method("GET")
            .path("/catalogue/featured")
            .header("authorization", "Bearer u1")
            .reply(&api)
            .await;
        assert_eq!(response.status(), 200);

        let response = warp::test::request()
            .method("POST")
            .path("/purchase")
            .header("authorization", "Bearer u1")
            .json(&json!({ "item_id": "hades" }))
            .reply(&api)
            .await;
        assert_eq!(response.status(), 200);
        assert_eq!(body(&response)["payment_method"], "credit_card");

        let response = warp::test::request()
            .method("POST")
            .path("/purchase")
            .header("authorization", "Bearer u1")
            .json(&json!({ "item_id": "hades" }))
            .reply(&api)
            .await;
        assert_eq!(response.status(), 409);

        let response = warp::test::request()
            .method("GET")
            .path("/library")
            .header("authorization", "Bearer u1")
            .reply(&api)
            .await;
        assert_eq!(body(&response).as_array().unwrap().len(), 1);

        let response = warp::test::request()
            .method("GET")
            .path("/catalogue/missing")
            .header("authorization", "Bearer u1")
            .reply(&api)
            .await;
        assert_eq!(response.status(), 404);
    }

    #[tokio::test]
    async fn recommendations_fill_in_friend_activity() {
        let api = server(Arc::new(MemoryStore::new()));
        warp::test::request()
            .method("GET")
            .path("/profile")
            .header("authorization", "Bearer u1")
            .reply(&api)
            .await;

        let response = warp::test::request()
            .method("POST")
            .path("/recommendations")
            .header("authorization", "Bearer u1")
            .json(&json!({
                "play_history": "Hundreds of hours in Dead Cells and Celeste",
                "preferences": "Fast roguelikes with short sessions",
            }))
            .reply(&api)
            .await;
        assert_eq!(response.status(), 200);
        let recommendations = body(&response);
        assert_eq!(recommendations["recommended_games"][0]["title"], "Balatro");
        assert_eq!(
            recommendations["recommended_games"][0]["reasoning"],
            "The user has not added any friends yet."
        );
    }

    #[tokio::test]
    async fn recommendations_and_friends_for_user_without_profile() {
        let api = server(Arc::new(MemoryStore::new()));

        let response = warp::test::request()
            .method("POST")
            .path("/recommendations")
            .header("authorization", "Bearer newcomer")
            .json(&json!({
                "play_history": "A few runs of Hades",
                "preferences": "Action",
            }))
            .reply(&api)
            .await;
        assert_eq!(response.status(), 200);
        assert_eq!(
            body(&response)["recommended_games"][0]["reasoning"],
            "The user has not added any friends yet."
        );

        let response = warp::test::request()
            .method("GET")
            .path("/friends")
            .header("authorization", "Bearer other-newcomer")
            .reply(&api)
            .await;
        assert_eq!(response.status(), 200);
        assert!(body(&response).as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn checkout_without_body_uses_default_payment_method() {
        let store = Arc::new(MemoryStore::new());
        StoreManager::new(Arc::clone(&store))
            .seed_catalogue(vec![item("hades", "Hades", 2499)])
            .await
            .unwrap();
        let api = server(store);

        let response = warp::test::request()
            .method("POST")
            .path("/cart")
            .header("authorization", "Bearer u1")
            .json(&json!({ "item_id": "hades" }))
            .reply(&api)
            .await;
        assert_eq!(response.status(), 200);

        let response = warp::test::request()
            .method("POST")
            .path("/cart/checkout")
            .header("authorization", "Bearer u1")
            .body("{")
            .reply(&api)
            .await;
        assert_eq!(response.status(), 400);

        let response = warp::test::request()
            .method("POST")
            .path("/cart/checkout")
            .header("authorization", "Bearer u1")
            .reply(&api)
            .await;
        assert_eq!(response.status(), 200);
        let purchase = body(&response);
        assert_eq!(purchase["payment_method"], "credit_card");
        assert_eq!(purchase["total_cents"], 2499);
    }

    #[tokio::test]
    async fn other_users_see_public_profile_only() {
        let api = server(Arc::new(MemoryStore::new()));
        for token in ["Bearer u1:a@example.com", "Bearer u2:b@example.com"] {
            warp::test::request()
                .method("GET")
                .path("/profile")
                .header("authorization", token)
                .reply(&api)
                .await;
        }

        let response = warp::test::request()
            .method("GET")
            .path("/users/u2")
            .header("authorization", "Bearer u1:a@example.com")
            .reply(&api)
            .await;
        assert_eq!(response.status(), 200);
        let profile = body(&response);
        assert_eq!(profile["id"], "u2");
        assert_eq!(profile["display_name"], "b");
        assert!(profile.get("email").is_none());
        assert!(profile.get("friends").is_none());

        let response = warp::test::request()
            .method("GET")
            .path("/users/u2")
            .header("authorization", "Bearer u2:b@example.com")
            .reply(&api)
            .await;
        assert_eq!(body(&response)["email"], "b@example.com");
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request() {
        let api = server(Arc::new(MemoryStore::new()));
        let response = warp::test::request()
            .method("POST")
            .path("/cart")
            .header("authorization", "Bearer u1")
            .body("not json")
            .reply(&api)
            .await;
        assert_eq!(response.status(), 400);
    }
}
