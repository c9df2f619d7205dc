use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::{
    auth::Session,
    datastore::{read_or_not_found, retry_on_abort, CollectionPath, Precondition, Versioned},
    documents::{normalize_email, FriendRequest, Presence, RequestStatus, UserProfile},
    logging::SocialEvent,
    traits::DocumentStore,
    util::time::now_millis,
    Status,
};

use super::{
    firestore::{friend_requests, users},
    user::ensure_profile,
};

/// Manages friend requests and the friendships they create.
pub struct SocialManager<S> {
    store: Arc<S>,
}

impl<S: DocumentStore> SocialManager<S> {
    pub fn new(store: Arc<S>) -> Self {
        SocialManager { store }
    }

    /// Sends a friend request from the session user to the user registered
    /// with `to_email`.
    #[instrument(level = "trace", skip(self, session), fields(uid = %session.uid))]
    pub async fn send_request(
        &self,
        session: &Session,
        to_email: &str,
    ) -> Result<FriendRequest, Status> {
        let result = self.try_send_request(session, to_email).await;
        SocialEvent::send_request(&session.uid, to_email, &result);
        result
    }

    async fn try_send_request(
        &self,
        session: &Session,
        to_email: &str,
    ) -> Result<FriendRequest, Status> {
        let email = normalize_email(to_email);
        if email.is_empty() || !email.contains('@') {
            return Err(Status::invalid_argument(format!(
                "'{to_email}' is not a valid email address"
            )));
        }

        let sender = ensure_profile(&*self.store, session).await?;
        let recipient = match users::find_by_email(&*self.store, &email).await? {
            Some(recipient) => recipient,
            None => {
                return Err(Status::not_found(format!(
                    "No user is registered with email '{email}'"
                )))
            }
        };
        if recipient.id == sender.id {
            return Err(Status::invalid_argument(
                "Cannot send a friend request to yourself",
            ));
        }
        if sender.is_friend(&recipient.id) || recipient.is_friend(&sender.id) {
            return Err(Status::already_exists(format!(
                "Already friends with '{}'",
                recipient.display_name
            )));
        }

        retry_on_abort("send_request", || async {
            let request_id = FriendRequest::pair_key(&sender.id, &recipient.id);
            let existing = friend_requests::read(&*self.store, &request_id).await?;
            if let Some(existing) = &existing {
                if existing.doc.is_pending() {
                    return Err(Status::already_exists(format!(
                        "A friend request between '{}' and '{}' is already pending",
                        sender.display_name, recipient.display_name
                    )));
                }
            }

            let request = FriendRequest::new(&sender, &recipient, now_millis());
            self.store
                .commit(vec![friend_requests::write(
                    &request,
                    Precondition::unchanged(existing.as_ref()),
                )?])
                .await?;
            Ok(request)
        })
        .await
    }

    /// Accepts a pending request addressed to the session user. Both users'
    /// friends lists and the request status change in one commit.
    #[instrument(level = "trace", skip(self, session), fields(uid = %session.uid))]
    pub async fn accept_request(
        &self,
        session: &Session,
        request_id: &str,
    ) -> Result<FriendRequest, Status> {
        let result = retry_on_abort("accept_request", || async {
            let Versioned { doc: request, revision } = self.read_request(request_id).await?;
            validate_transition(&request, &session.uid, Transition::Accept)?;

            let from = self.read_or_placeholder(&request.from_id, &request.from_name);
            let to = self.read_or_placeholder(&request.to_id, &request.to_name);
            let ((mut from, from_pre), (mut to, to_pre)) = futures::try_join!(from, to)?;
            link(&mut from, &mut to);

            let request = resolve(request, RequestStatus::Accepted);
            self.store
                .commit(vec![
                    friend_requests::write(&request, Precondition::Revision(revision))?,
                    users::write(&from, from_pre)?,
                    users::write(&to, to_pre)?,
                ])
                .await?;
            info!("'{}' and '{}' are now friends", &from.id, &to.id);
            Ok(request)
        })
        .await;

        SocialEvent::resolve_request("accept", request_id, &result);
        result
    }

    /// Declines a pending request addressed to the session user.
    #[instrument(level = "trace", skip(self, session), fields(uid = %session.uid))]
    pub async fn decline_request(
        &self,
        session: &Session,
        request_id: &str,
    ) -> Result<FriendRequest, Status> {
        let result = self
            .close_request(session, request_id, Transition::Decline)
            .await;
        SocialEvent::resolve_request("decline", request_id, &result);
        result
    }

    /// Withdraws a pending request sent by the session user.
    #[instrument(level = "trace", skip(self, session), fields(uid = %session.uid))]
    pub async fn cancel_request(
        &self,
        session: &Session,
        request_id: &str,
    ) -> Result<FriendRequest, Status> {
        let result = self
            .close_request(session, request_id, Transition::Cancel)
            .await;
        SocialEvent::resolve_request("cancel", request_id, &result);
        result
    }

    async fn close_request(
        &self,
        session: &Session,
        request_id: &str,
        transition: Transition,
    ) -> Result<FriendRequest, Status> {
        retry_on_abort("close_request", || async {
            let Versioned { doc: request, revision } = self.read_request(request_id).await?;
            validate_transition(&request, &session.uid, transition)?;

            let request = resolve(request, RequestStatus::Declined);
            self.store
                .commit(vec![friend_requests::write(
                    &request,
                    Precondition::Revision(revision),
                )?])
                .await?;
            Ok(request)
        })
        .await
    }

    /// Pending requests addressed to the user, newest first.
    #[instrument(level = "trace", skip(self))]
    pub async fn incoming_requests(&self, user_id: &str) -> Result<Vec<FriendRequest>, Status> {
        friend_requests::incoming(&*self.store, user_id).await
    }

    /// Pending requests sent by the user, newest first.
    #[instrument(level = "trace", skip(self))]
    pub async fn outgoing_requests(&self, user_id: &str) -> Result<Vec<FriendRequest>, Status> {
        friend_requests::outgoing(&*self.store, user_id).await
    }

    /// Returns the user's friends, online friends first and then by name.
    #[instrument(level = "trace", skip(self))]
    pub async fn friends(&self, user_id: &str) -> Result<Vec<FriendSummary>, Status> {
        let profile: Versioned<UserProfile> =
            read_or_not_found(&*self.store, &CollectionPath::users().doc(user_id)).await?;

        let friends = try_join_all(
            profile
                .doc
                .friends
                .iter()
                .map(|friend_id| users::read(&*self.store, friend_id)),
        )
        .await?;

        let mut friends = friends
            .into_iter()
            .flatten()
            .map(|friend| FriendSummary::from(friend.doc))
            .collect::<Vec<_>>();
        friends.sort_by(|a, b| {
            b.is_online()
                .cmp(&a.is_online())
                .then_with(|| a.display_name.to_lowercase().cmp(&b.display_name.to_lowercase()))
        });
        Ok(friends)
    }

    /// Ends the friendship between the session user and `friend_id` on both
    /// sides.
    #[instrument(level = "trace", skip(self, session), fields(uid = %session.uid))]
    pub async fn remove_friend(&self, session: &Session, friend_id: &str) -> Result<(), Status> {
        let result = retry_on_abort("remove_friend", || async {
            let Versioned {
                doc: mut user,
                revision,
            }: Versioned<UserProfile> = read_or_not_found(&*self.store, &CollectionPath::users().doc(&session.uid))
                .await?;
            if !user.is_friend(friend_id) {
                return Err(Status::not_found(format!(
                    "'{friend_id}' is not a friend of '{}'",
                    &user.id
                )));
            }

            let mut writes = vec![];
            match users::read(&*self.store, friend_id).await? {
                Some(Versioned {
                    doc: mut friend,
                    revision: friend_revision,
                }) => {
                    unlink(&mut user, &mut friend);
                    writes.push(users::write(&friend, Precondition::Revision(friend_revision))?);
                }
                None => {
                    user.remove_friend(friend_id);
                }
            }
            writes.push(users::write(&user, Precondition::Revision(revision))?);
            self.store.commit(writes).await
        })
        .await;

        SocialEvent::remove_friend(&session.uid, friend_id, &result);
        result
    }

    async fn read_request(&self, request_id: &str) -> Result<Versioned<FriendRequest>, Status> {
        match friend_requests::read(&*self.store, request_id).await? {
            Some(request) => Ok(request),
            None => Err(Status::not_found(format!(
                "Friend request '{request_id}' was not found"
            ))),
        }
    }

    /// Reads a profile together with the precondition for writing it back.
    /// Users that never signed in get a placeholder profile.
    async fn read_or_placeholder(
        &self,
        user_id: &str,
        display_name: &str,
    ) -> Result<(UserProfile, Precondition), Status> {
        match users::read(&*self.store, user_id).await? {
            Some(Versioned { doc, revision }) => Ok((doc, Precondition::Revision(revision))),
            None => Ok((
                UserProfile::placeholder(user_id, display_name, now_millis()),
                Precondition::Missing,
            )),
        }
    }
}

/// Public view of a friend's profile.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
pub struct FriendSummary {
    pub id: String,
    pub display_name: String,
    pub avatar: String,
    pub presence: Presence,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_game: Option<String>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<i64>,
}

impl FriendSummary {
    pub fn is_online(&self) -> bool {
        matches!(self.presence, Presence::Online | Presence::InGame)
    }
}

impl From<UserProfile> for FriendSummary {
    fn from(profile: UserProfile) -> Self {
        FriendSummary {
            id: profile.id,
            display_name: profile.display_name,
            avatar: profile.avatar,
            presence: profile.presence,
            current_game: profile.current_game,
            last_seen: profile.last_seen,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Accept,
    Decline,
    Cancel,
}

/// Checks that `actor` may move `request` through `transition`. Only the
/// recipient accepts or declines, only the sender cancels, and only pending
/// requests move.
pub fn validate_transition(
    request: &FriendRequest,
    actor: &str,
    transition: Transition,
) -> Result<(), Status> {
    let allowed = match transition {
        Transition::Accept | Transition::Decline => request.to_id == actor,
        Transition::Cancel => request.from_id == actor,
    };
    if !allowed {
        return Err(Status::permission_denied(format!(
            "User '{actor}' cannot {transition:?} friend request '{}'",
            &request.id
        )));
    }

    match request.is_pending() {
        true => Ok(()),
        false => Err(Status::failed_precondition(format!(
            "Friend request '{}' is already {}",
            &request.id,
            request.status.as_str()
        ))),
    }
}

/// Makes two users friends of each other.
pub fn link(a: &mut UserProfile, b: &mut UserProfile) {
    a.add_friend(&b.id);
    b.add_friend(&a.id);
}

/// Removes two users from each other's friends.
pub fn unlink(a: &mut UserProfile, b: &mut UserProfile) {
    a.remove_friend(&b.id);
    b.remove_friend(&a.id);
}

fn resolve(mut request: FriendRequest, status: RequestStatus) -> FriendRequest {
    request.status = status;
    request.updated_at = now_millis();
    request
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::MemoryStore,
        datastore::{DocPath, Filter, Write},
        library::user::{find_by_email, read_profile},
    };
    use async_trait::async_trait;
    use futures::future::{BoxFuture, FutureExt};
    use serde::de::DeserializeOwned;
    use std::sync::Mutex;

    /// Store that runs a rival operation against the same documents right
    /// before its first commit lands.
    struct RacingStore {
        inner: Arc<MemoryStore>,
        rival: Mutex<Option<BoxFuture<'static, ()>>>,
    }

    impl RacingStore {
        fn new(inner: Arc<MemoryStore>, rival: BoxFuture<'static, ()>) -> Self {
            RacingStore {
                inner,
                rival: Mutex::new(Some(rival)),
            }
        }
    }

    #[async_trait]
    impl DocumentStore for RacingStore {
        async fn read<D>(&self, path: &DocPath) -> Result<Option<Versioned<D>>, Status>
        where
            D: DeserializeOwned + Send,
        {
            self.inner.read(path).await
        }

        async fn query<D>(
            &self,
            collection: &CollectionPath,
            filters: &[Filter],
        ) -> Result<Vec<D>, Status>
        where
            D: DeserializeOwned + Send,
        {
            self.inner.query(collection, filters).await
        }

        async fn commit(&self, writes: Vec<Write>) -> Result<(), Status> {
            let rival = self.rival.lock().unwrap().take();
            if let Some(rival) = rival {
                rival.await;
            }
            self.inner.commit(writes).await
        }
    }

    fn profile(id: &str) -> UserProfile {
        UserProfile::placeholder(id, id, 0)
    }

    fn request(from: &str, to: &str, status: RequestStatus) -> FriendRequest {
        FriendRequest {
            status,
            ..FriendRequest::new(&profile(from), &profile(to), 0)
        }
    }

    async fn setup() -> (Arc<MemoryStore>, SocialManager<MemoryStore>, Session, Session) {
        let store = Arc::new(MemoryStore::new());
        let ada = Session::new("u1", "ada@example.com");
        let bob = Session::new("u2", "bob@example.com");
        ensure_profile(&*store, &ada).await.unwrap();
        ensure_profile(&*store, &bob).await.unwrap();
        (Arc::clone(&store), SocialManager::new(store), ada, bob)
    }

    #[test]
    fn link_is_symmetric_and_idempotent() {
        let mut a = profile("a");
        let mut b = profile("b");
        link(&mut a, &mut b);
        link(&mut a, &mut b);
        assert_eq!(a.friends, vec!["b"]);
        assert_eq!(b.friends, vec!["a"]);

        unlink(&mut a, &mut b);
        assert!(a.friends.is_empty());
        assert!(b.friends.is_empty());
    }

    #[test]
    fn transitions_require_right_party() {
        let pending = request("a", "b", RequestStatus::Pending);
        assert_eq!(validate_transition(&pending, "b", Transition::Accept), Ok(()));
        assert_eq!(validate_transition(&pending, "b", Transition::Decline), Ok(()));
        assert_eq!(validate_transition(&pending, "a", Transition::Cancel), Ok(()));

        assert!(matches!(
            validate_transition(&pending, "a", Transition::Accept),
            Err(Status::PermissionDenied(_))
        ));
        assert!(matches!(
            validate_transition(&pending, "b", Transition::Cancel),
            Err(Status::PermissionDenied(_))
        ));
    }

    #[test]
    fn transitions_require_pending_request() {
        for status in [RequestStatus::Accepted, RequestStatus::Declined] {
            let resolved = request("a", "b", status);
            assert!(matches!(
                validate_transition(&resolved, "b", Transition::Accept),
                Err(Status::FailedPrecondition(_))
            ));
        }
    }

    #[tokio::test]
    async fn request_to_unknown_email_creates_nothing() {
        let (store, social, ada, _) = setup().await;

        assert!(matches!(
            social.send_request(&ada, "nobody@example.com").await,
            Err(Status::NotFound(_))
        ));
        assert!(social.outgoing_requests("u1").await.unwrap().is_empty());
        let requests: Vec<FriendRequest> = store
            .query(&CollectionPath::friend_requests(), &[])
            .await
            .unwrap();
        assert!(requests.is_empty());
    }

    #[tokio::test]
    async fn invalid_and_self_requests_are_rejected() {
        let (_, social, ada, _) = setup().await;

        assert!(matches!(
            social.send_request(&ada, "  ").await,
            Err(Status::InvalidArgument(_))
        ));
        assert!(matches!(
            social.send_request(&ada, "Ada@Example.com").await,
            Err(Status::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn duplicate_requests_in_either_direction_are_rejected() {
        let (_, social, ada, bob) = setup().await;

        social.send_request(&ada, "bob@example.com").await.unwrap();
        assert!(matches!(
            social.send_request(&ada, "bob@example.com").await,
            Err(Status::AlreadyExists(_))
        ));
        assert!(matches!(
            social.send_request(&bob, "ada@example.com").await,
            Err(Status::AlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn accept_links_both_users_once() {
        let (store, social, ada, bob) = setup().await;
        let request = social.send_request(&ada, "bob@example.com").await.unwrap();

        assert!(matches!(
            social.accept_request(&ada, &request.id).await,
            Err(Status::PermissionDenied(_))
        ));

        let accepted = social.accept_request(&bob, &request.id).await.unwrap();
        assert_eq!(accepted.status, RequestStatus::Accepted);
        assert!(matches!(
            social.accept_request(&bob, &request.id).await,
            Err(Status::FailedPrecondition(_))
        ));

        assert_eq!(read_profile(&*store, "u1").await.unwrap().friends, vec!["u2"]);
        assert_eq!(read_profile(&*store, "u2").await.unwrap().friends, vec!["u1"]);
        assert!(social.incoming_requests("u2").await.unwrap().is_empty());

        assert!(matches!(
            social.send_request(&ada, "bob@example.com").await,
            Err(Status::AlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn racing_requests_in_opposite_directions_leave_one_pending() {
        let (memory, _, ada, bob) = setup().await;
        let rival = {
            let social = SocialManager::new(Arc::clone(&memory));
            async move {
                social.send_request(&bob, "ada@example.com").await.unwrap();
            }
            .boxed()
        };
        let social = SocialManager::new(Arc::new(RacingStore::new(Arc::clone(&memory), rival)));

        assert!(matches!(
            social.send_request(&ada, "bob@example.com").await,
            Err(Status::AlreadyExists(_))
        ));
        let requests: Vec<FriendRequest> = memory
            .query(&CollectionPath::friend_requests(), &[])
            .await
            .unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].from_id, "u2");
        assert!(requests[0].is_pending());
    }

    #[tokio::test]
    async fn racing_accepts_link_users_once() {
        let (memory, social, ada, bob) = setup().await;
        let request = social.send_request(&ada, "bob@example.com").await.unwrap();

        let rival = {
            let social = SocialManager::new(Arc::clone(&memory));
            let (bob, request_id) = (bob.clone(), request.id.clone());
            async move {
                social.accept_request(&bob, &request_id).await.unwrap();
            }
            .boxed()
        };
        let racing = SocialManager::new(Arc::new(RacingStore::new(Arc::clone(&memory), rival)));

        assert!(matches!(
            racing.accept_request(&bob, &request.id).await,
            Err(Status::FailedPrecondition(_))
        ));
        assert_eq!(read_profile(&*memory, "u1").await.unwrap().friends, vec!["u2"]);
        assert_eq!(read_profile(&*memory, "u2").await.unwrap().friends, vec!["u1"]);
        let stored = friend_requests::read(&*memory, &request.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.doc.status, RequestStatus::Accepted);
    }

    #[tokio::test]
    async fn request_lifecycle_end_to_end() {
        let store = Arc::new(MemoryStore::new());
        let a = Session::new("u1", "a@example.com");
        let b = Session::new("u2", "b@example.com");
        ensure_profile(&*store, &b).await.unwrap();
        let social = SocialManager::new(Arc::clone(&store));

        let request = social.send_request(&a, "b@example.com").await.unwrap();
        let outgoing = social.outgoing_requests("u1").await.unwrap();
        let incoming = social.incoming_requests("u2").await.unwrap();
        assert_eq!(outgoing, vec![request.clone()]);
        assert_eq!(incoming, vec![request.clone()]);
        assert_eq!(incoming[0].status, RequestStatus::Pending);

        let accepted = social.accept_request(&b, &request.id).await.unwrap();
        assert_eq!(accepted.status, RequestStatus::Accepted);
        assert_eq!(read_profile(&*store, "u1").await.unwrap().friends, vec!["u2"]);
        assert_eq!(read_profile(&*store, "u2").await.unwrap().friends, vec!["u1"]);
        let stored = friend_requests::read(&*store, &request.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.doc.status, RequestStatus::Accepted);
    }

    #[tokio::test]
    async fn accept_creates_placeholder_for_missing_sender() {
        let store = Arc::new(MemoryStore::new());
        let bob = Session::new("u2", "bob@example.com");
        ensure_profile(&*store, &bob).await.unwrap();
        let pending = FriendRequest::new(
            &UserProfile::placeholder("ghost", "Ghost", 0),
            &read_profile(&*store, "u2").await.unwrap(),
            0,
        );
        store
            .commit(vec![friend_requests::write(&pending, Precondition::Missing).unwrap()])
            .await
            .unwrap();

        let social = SocialManager::new(Arc::clone(&store));
        social.accept_request(&bob, &pending.id).await.unwrap();

        let ghost = read_profile(&*store, "ghost").await.unwrap();
        assert_eq!(ghost.display_name, "Ghost");
        assert_eq!(ghost.friends, vec!["u2"]);
    }

    #[tokio::test]
    async fn placeholder_user_is_findable_after_signing_in() {
        let store = Arc::new(MemoryStore::new());
        let bob = Session::new("u2", "bob@example.com");
        ensure_profile(&*store, &bob).await.unwrap();
        let pending = FriendRequest::new(
            &UserProfile::placeholder("ghost", "Ghost", 0),
            &read_profile(&*store, "u2").await.unwrap(),
            0,
        );
        store
            .commit(vec![friend_requests::write(&pending, Precondition::Missing).unwrap()])
            .await
            .unwrap();
        let social = SocialManager::new(Arc::clone(&store));
        social.accept_request(&bob, &pending.id).await.unwrap();

        let ghost = Session::new("ghost", "Ghost@Example.com");
        let profile = ensure_profile(&*store, &ghost).await.unwrap();
        assert_eq!(profile.email, "ghost@example.com");
        assert_eq!(profile.friends, vec!["u2"]);

        let found = find_by_email(&*store, "ghost@example.com").await.unwrap();
        assert_eq!(found.id, "ghost");
        assert_eq!(found.display_name, "Ghost");

        let carol = Session::new("u3", "carol@example.com");
        ensure_profile(&*store, &carol).await.unwrap();
        let request = social.send_request(&carol, "ghost@example.com").await.unwrap();
        assert_eq!(request.to_id, "ghost");
    }

    #[tokio::test]
    async fn decline_and_cancel_leave_users_unlinked() {
        let (store, social, ada, bob) = setup().await;

        let request = social.send_request(&ada, "bob@example.com").await.unwrap();
        let declined = social.decline_request(&bob, &request.id).await.unwrap();
        assert_eq!(declined.status, RequestStatus::Declined);
        assert!(read_profile(&*store, "u1").await.unwrap().friends.is_empty());
        assert!(read_profile(&*store, "u2").await.unwrap().friends.is_empty());

        // A declined request does not block a new one.
        let request = social.send_request(&bob, "ada@example.com").await.unwrap();
        assert_eq!(social.incoming_requests("u1").await.unwrap().len(), 1);
        assert!(matches!(
            social.cancel_request(&ada, &request.id).await,
            Err(Status::PermissionDenied(_))
        ));
        social.cancel_request(&bob, &request.id).await.unwrap();
        assert!(social.incoming_requests("u1").await.unwrap().is_empty());
        assert!(social.outgoing_requests("u2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn pending_requests_are_listed_newest_first() {
        let store = Arc::new(MemoryStore::new());
        let social = SocialManager::new(Arc::clone(&store));
        for (i, from) in ["a", "b", "c"].iter().enumerate() {
            let mut request = request(from, "u1", RequestStatus::Pending);
            request.created_at = i as i64;
            store
                .commit(vec![friend_requests::write(&request, Precondition::None).unwrap()])
                .await
                .unwrap();
        }
        let declined = request("d", "u1", RequestStatus::Declined);
        store
            .commit(vec![friend_requests::write(&declined, Precondition::None).unwrap()])
            .await
            .unwrap();

        let incoming = social.incoming_requests("u1").await.unwrap();
        let senders = incoming.iter().map(|r| r.from_id.as_str()).collect::<Vec<_>>();
        assert_eq!(senders, vec!["c", "b", "a"]);
    }

    #[tokio::test]
    async fn friends_are_listed_online_first_then_by_name() {
        let store = Arc::new(MemoryStore::new());
        let mut me = profile("me");
        let mut zed = profile("zed");
        let mut amy = profile("amy");
        let mut bea = profile("bea");
        zed.presence = Presence::Online;
        for friend in [&mut zed, &mut amy, &mut bea] {
            link(&mut me, friend);
        }
        let writes = [&me, &zed, &amy, &bea]
            .iter()
            .map(|p| users::write(p, Precondition::None).unwrap())
            .collect();
        store.commit(writes).await.unwrap();

        let social = SocialManager::new(Arc::clone(&store));
        let friends = social.friends("me").await.unwrap();
        let names = friends.iter().map(|f| f.id.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["zed", "amy", "bea"]);
    }

    #[tokio::test]
    async fn remove_friend_unlinks_both_sides() {
        let (store, social, ada, bob) = setup().await;
        let request = social.send_request(&ada, "bob@example.com").await.unwrap();
        social.accept_request(&bob, &request.id).await.unwrap();

        social.remove_friend(&bob, "u1").await.unwrap();
        assert!(read_profile(&*store, "u1").await.unwrap().friends.is_empty());
        assert!(read_profile(&*store, "u2").await.unwrap().friends.is_empty());
        assert!(matches!(
            social.remove_friend(&bob, "u1").await,
            Err(Status::NotFound(_))
        ));
    }
}
