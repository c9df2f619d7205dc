use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::{
    auth::Session,
    datastore::{read_or_not_found, retry_on_abort, CollectionPath, Precondition, Versioned},
    documents::{Presence, UserProfile},
    traits::DocumentStore,
    util::time::now_millis,
    Status,
};

use super::firestore::users;

/// A signed-in user and their profile.
pub struct User<S> {
    profile: UserProfile,
    store: Arc<S>,
}

impl<S: DocumentStore> User<S> {
    /// Returns the User of the session, creating their profile on first
    /// sign-in.
    #[instrument(level = "trace", skip(store, session), fields(uid = %session.uid))]
    pub async fn fetch(store: Arc<S>, session: &Session) -> Result<Self, Status> {
        let profile = ensure_profile(&*store, session).await?;
        Ok(User { profile, store })
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn into_profile(self) -> UserProfile {
        self.profile
    }

    /// Merges the provided fields into the user's profile.
    #[instrument(level = "trace", skip(self, update))]
    pub async fn update_profile(&mut self, update: ProfileUpdate) -> Result<&UserProfile, Status> {
        let update = update.validate()?;
        let user_id = self.profile.id.clone();
        self.profile = retry_on_abort("update_profile", || {
            modify(&*self.store, &user_id, |profile| update.apply(profile))
        })
        .await?;
        Ok(&self.profile)
    }

    /// Updates the user's presence. The current game is kept only while the
    /// user is in-game.
    #[instrument(level = "trace", skip(self))]
    pub async fn set_presence(
        &mut self,
        presence: Presence,
        current_game: Option<String>,
    ) -> Result<&UserProfile, Status> {
        let current_game = match presence {
            Presence::InGame => current_game
                .map(|game| game.trim().to_owned())
                .filter(|game| !game.is_empty()),
            _ => None,
        };

        let user_id = self.profile.id.clone();
        self.profile = retry_on_abort("set_presence", || {
            modify(&*self.store, &user_id, |profile| {
                profile.presence = presence;
                profile.current_game = current_game.clone();
                profile.last_seen = Some(now_millis());
            })
        })
        .await?;
        Ok(&self.profile)
    }
}

/// Returns the profile of `user_id`.
#[instrument(level = "trace", skip(store))]
pub async fn read_profile<S: DocumentStore>(
    store: &S,
    user_id: &str,
) -> Result<UserProfile, Status> {
    let profile: Versioned<UserProfile> =
        read_or_not_found(store, &CollectionPath::users().doc(user_id)).await?;
    Ok(profile.doc)
}

/// Returns the profile registered with `email`.
#[instrument(level = "trace", skip(store))]
pub async fn find_by_email<S: DocumentStore>(
    store: &S,
    email: &str,
) -> Result<UserProfile, Status> {
    match users::find_by_email(store, email).await? {
        Some(profile) => Ok(profile),
        None => Err(Status::not_found(format!(
            "No user is registered with email '{email}'"
        ))),
    }
}

/// Returns the caller's profile, creating it if this is their first sign-in.
/// Creation is conditioned on the profile missing, so a concurrent first
/// request that wins the race is read back instead. A placeholder created by
/// an accepted friend request gets the session's email on first sign-in.
pub async fn ensure_profile<S: DocumentStore>(
    store: &S,
    session: &Session,
) -> Result<UserProfile, Status> {
    retry_on_abort("ensure_profile", || async {
        if let Some(Versioned { mut doc, revision }) = users::read(store, &session.uid).await? {
            if doc.complete_from(session) {
                info!("Completing placeholder user '{}'", &session.uid);
                store
                    .commit(vec![users::write(&doc, Precondition::Revision(revision))?])
                    .await?;
            }
            return Ok(doc);
        }

        info!("Creating new user '{}'", &session.uid);
        let profile = UserProfile::new(session, now_millis());
        store
            .commit(vec![users::write(&profile, Precondition::Missing)?])
            .await?;
        Ok(profile)
    })
    .await
}

/// Applies `op` on the latest revision of a profile and writes it back
/// conditioned on that revision.
async fn modify<S, F>(store: &S, user_id: &str, op: F) -> Result<UserProfile, Status>
where
    S: DocumentStore,
    F: FnOnce(&mut UserProfile),
{
    let Versioned { mut doc, revision }: Versioned<UserProfile> =
        read_or_not_found(store, &CollectionPath::users().doc(user_id)).await?;
    op(&mut doc);
    store
        .commit(vec![users::write(&doc, Precondition::Revision(revision))?])
        .await?;
    Ok(doc)
}

/// Profile fields a user can edit. Absent fields are left unchanged.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub display_name: Option<String>,

    #[serde(default)]
    pub avatar: Option<String>,

    #[serde(default)]
    pub bio: Option<String>,

    #[serde(default)]
    pub favorite_genres: Option<Vec<String>>,
}

impl ProfileUpdate {
    /// Returns the update in normalized form, or InvalidArgument listing every
    /// violation.
    pub fn validate(self) -> Result<Self, Status> {
        let mut errors = vec![];

        let display_name = self.display_name.map(|name| name.trim().to_owned());
        if let Some(name) = &display_name {
            if name.is_empty() {
                errors.push("Display name cannot be empty.".to_owned());
            } else if name.chars().count() > MAX_DISPLAY_NAME_LEN {
                errors.push(format!(
                    "Display name cannot exceed {MAX_DISPLAY_NAME_LEN} characters."
                ));
            }
        }

        let bio = self.bio.map(|bio| bio.trim().to_owned());
        if let Some(bio) = &bio {
            if bio.chars().count() > MAX_BIO_LEN {
                errors.push(format!("Bio cannot exceed {MAX_BIO_LEN} characters."));
            }
        }

        if !errors.is_empty() {
            return Err(Status::invalid_argument(errors.join(" ")));
        }

        Ok(ProfileUpdate {
            display_name,
            avatar: self.avatar.map(|avatar| avatar.trim().to_owned()),
            bio,
            favorite_genres: self.favorite_genres.map(|genres| normalize_genres(&genres)),
        })
    }

    fn apply(&self, profile: &mut UserProfile) {
        if let Some(name) = &self.display_name {
            profile.display_name = name.clone();
        }
        if let Some(avatar) = &self.avatar {
            profile.avatar = avatar.clone();
        }
        if let Some(bio) = &self.bio {
            profile.bio = bio.clone();
        }
        if let Some(genres) = &self.favorite_genres {
            profile.favorite_genres = genres.clone();
        }
    }
}

/// Trims genres and drops empty or repeated entries, keeping first
/// occurrences in order.
fn normalize_genres(genres: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = vec![];
    for genre in genres.iter().map(|genre| genre.trim()) {
        if !genre.is_empty() && !normalized.iter().any(|g| g.eq_ignore_ascii_case(genre)) {
            normalized.push(genre.to_owned());
        }
    }
    normalized
}

const MAX_DISPLAY_NAME_LEN: usize = 64;
const MAX_BIO_LEN: usize = 500;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MemoryStore;

    fn session(uid: &str, email: &str) -> Session {
        Session::new(uid, email)
    }

    #[tokio::test]
    async fn fetch_creates_profile_once() {
        let store = Arc::new(MemoryStore::new());
        let user = User::fetch(Arc::clone(&store), &session("u1", "Ada@Example.com "))
            .await
            .unwrap();
        assert_eq!(user.profile().display_name, "ada");
        assert_eq!(user.profile().email, "ada@example.com");
        let created_at = user.profile().created_at;

        let again = User::fetch(Arc::clone(&store), &session("u1", "ada@example.com"))
            .await
            .unwrap();
        assert_eq!(again.profile().created_at, created_at);
        assert_eq!(read_profile(&*store, "u1").await.unwrap().id, "u1");
    }

    #[tokio::test]
    async fn read_profile_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(
            read_profile(&store, "nobody").await,
            Err(Status::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn find_by_email_is_normalized() {
        let store = Arc::new(MemoryStore::new());
        User::fetch(Arc::clone(&store), &session("u2", "bob@example.com"))
            .await
            .unwrap();

        let profile = find_by_email(&*store, "  BOB@example.com").await.unwrap();
        assert_eq!(profile.id, "u2");
        assert!(matches!(
            find_by_email(&*store, "carol@example.com").await,
            Err(Status::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn update_profile_merges_fields() {
        let store = Arc::new(MemoryStore::new());
        let mut user = User::fetch(Arc::clone(&store), &session("u1", "ada@example.com"))
            .await
            .unwrap();

        user.update_profile(ProfileUpdate {
            display_name: Some("  Ada L. ".to_owned()),
            favorite_genres: Some(vec![
                " RPG ".to_owned(),
                "".to_owned(),
                "rpg".to_owned(),
                "Puzzle".to_owned(),
            ]),
            ..Default::default()
        })
        .await
        .unwrap();

        let stored = read_profile(&*store, "u1").await.unwrap();
        assert_eq!(stored.display_name, "Ada L.");
        assert_eq!(stored.favorite_genres, vec!["RPG", "Puzzle"]);
        assert_eq!(stored.bio, user.profile().bio);
        assert!(!stored.bio.is_empty());
    }

    #[tokio::test]
    async fn update_profile_rejects_invalid_fields() {
        let store = Arc::new(MemoryStore::new());
        let mut user = User::fetch(Arc::clone(&store), &session("u1", "ada@example.com"))
            .await
            .unwrap();

        let result = user
            .update_profile(ProfileUpdate {
                display_name: Some("   ".to_owned()),
                bio: Some("x".repeat(501)),
                ..Default::default()
            })
            .await;
        match result {
            Err(Status::InvalidArgument(msg)) => {
                assert!(msg.contains("Display name"));
                assert!(msg.contains("Bio"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(read_profile(&*store, "u1").await.unwrap().display_name, "ada");
    }

    #[tokio::test]
    async fn presence_clears_current_game_unless_in_game() {
        let store = Arc::new(MemoryStore::new());
        let mut user = User::fetch(Arc::clone(&store), &session("u1", "ada@example.com"))
            .await
            .unwrap();

        user.set_presence(Presence::InGame, Some("Celeste".to_owned()))
            .await
            .unwrap();
        let stored = read_profile(&*store, "u1").await.unwrap();
        assert_eq!(stored.presence, Presence::InGame);
        assert_eq!(stored.current_game.as_deref(), Some("Celeste"));
        assert!(stored.last_seen.is_some());

        user.set_presence(Presence::Away, Some("Celeste".to_owned()))
            .await
            .unwrap();
        let stored = read_profile(&*store, "u1").await.unwrap();
        assert_eq!(stored.presence, Presence::Away);
        assert_eq!(stored.current_game, None);
    }
}
