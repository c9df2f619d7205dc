use serde::{Deserialize, Serialize};
use std::fmt;

use crate::auth::Session;

/// Document type under 'users/{user_id}' that holds a user's public profile
/// and their friends list.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub id: String,
    pub display_name: String,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub avatar: String,

    #[serde(default)]
    pub bio: String,

    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub favorite_genres: Vec<String>,

    /// Ids of the user's friends. Always mirrored on the friend's profile.
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub friends: Vec<String>,

    #[serde(default)]
    pub presence: Presence,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_game: Option<String>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<i64>,

    #[serde(default)]
    pub created_at: i64,
}

impl UserProfile {
    /// Profile created at first sign-in.
    pub fn new(session: &Session, now: i64) -> Self {
        let email = normalize_email(&session.email);
        let display_name = match &session.display_name {
            Some(name) if !name.trim().is_empty() => name.trim().to_owned(),
            _ => match email.split('@').next() {
                Some(local) if !local.is_empty() => local.to_owned(),
                _ => DEFAULT_DISPLAY_NAME.to_owned(),
            },
        };

        UserProfile {
            id: session.uid.clone(),
            display_name,
            email,
            avatar: match &session.avatar {
                Some(avatar) if !avatar.is_empty() => avatar.clone(),
                _ => default_avatar(&session.uid),
            },
            bio: DEFAULT_BIO.to_owned(),
            created_at: now,
            ..Default::default()
        }
    }

    /// Minimal profile for a user that is referenced before ever signing in.
    pub fn placeholder(user_id: &str, display_name: &str, now: i64) -> Self {
        UserProfile {
            id: user_id.to_owned(),
            display_name: match display_name.trim().is_empty() {
                false => display_name.trim().to_owned(),
                true => DEFAULT_DISPLAY_NAME.to_owned(),
            },
            avatar: default_avatar(user_id),
            created_at: now,
            ..Default::default()
        }
    }

    /// Fills in what a placeholder lacks from the session of the user's first
    /// sign-in. Returns true if the profile changed.
    pub fn complete_from(&mut self, session: &Session) -> bool {
        if !self.email.is_empty() {
            return false;
        }
        let signed_in = UserProfile::new(session, self.created_at);
        if signed_in.email.is_empty() {
            return false;
        }

        self.email = signed_in.email;
        if self.display_name == DEFAULT_DISPLAY_NAME || session.display_name.is_some() {
            self.display_name = signed_in.display_name;
        }
        if self.avatar.is_empty() || self.avatar == default_avatar(&self.id) {
            self.avatar = signed_in.avatar;
        }
        if self.bio.is_empty() {
            self.bio = signed_in.bio;
        }
        true
    }

    pub fn is_friend(&self, user_id: &str) -> bool {
        self.friends.iter().any(|id| id == user_id)
    }

    /// Adds `user_id` in the friends list. Returns true if it was added.
    pub fn add_friend(&mut self, user_id: &str) -> bool {
        match self.is_friend(user_id) {
            true => false,
            false => {
                self.friends.push(user_id.to_owned());
                true
            }
        }
    }

    /// Removes `user_id` from the friends list. Returns true if it was found.
    pub fn remove_friend(&mut self, user_id: &str) -> bool {
        let original_len = self.friends.len();
        self.friends.retain(|id| id != user_id);
        self.friends.len() != original_len
    }
}

/// Profile fields visible to other users. Email and the friends list stay
/// private to the owner.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct PublicProfile {
    pub id: String,
    pub display_name: String,
    pub avatar: String,
    pub bio: String,

    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub favorite_genres: Vec<String>,

    pub presence: Presence,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_game: Option<String>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<i64>,
}

impl From<UserProfile> for PublicProfile {
    fn from(profile: UserProfile) -> Self {
        PublicProfile {
            id: profile.id,
            display_name: profile.display_name,
            avatar: profile.avatar,
            bio: profile.bio,
            favorite_genres: profile.favorite_genres,
            presence: profile.presence,
            current_game: profile.current_game,
            last_seen: profile.last_seen,
        }
    }
}

impl fmt::Display for UserProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserProfile({}): '{}'", &self.id, &self.display_name)
    }
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Presence {
    Online,
    #[default]
    Offline,
    Away,
    InGame,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn default_avatar(user_id: &str) -> String {
    format!("https://api.dicebear.com/8.x/bottts/svg?seed={user_id}")
}

const DEFAULT_DISPLAY_NAME: &str = "Astra Player";
const DEFAULT_BIO: &str = "A new player exploring Astra.";
