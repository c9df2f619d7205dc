use serde::{Deserialize, Serialize};
use std::fmt;

use super::UserProfile;

/// Document type under 'friend_requests/{pair_key}'.
///
/// There is at most one request document per pair of users, keyed by
/// `FriendRequest::pair_key()`, regardless of who sent it.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
pub struct FriendRequest {
    pub id: String,

    pub from_id: String,
    pub from_name: String,

    #[serde(default)]
    pub from_avatar: String,

    pub to_id: String,
    pub to_name: String,

    pub status: RequestStatus,

    #[serde(default)]
    pub created_at: i64,

    #[serde(default)]
    pub updated_at: i64,
}

impl FriendRequest {
    pub fn new(from: &UserProfile, to: &UserProfile, now: i64) -> Self {
        FriendRequest {
            id: Self::pair_key(&from.id, &to.id),
            from_id: from.id.clone(),
            from_name: from.display_name.clone(),
            from_avatar: from.avatar.clone(),
            to_id: to.id.clone(),
            to_name: to.display_name.clone(),
            status: RequestStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Deterministic id for the request between two users.
    pub fn pair_key(a: &str, b: &str) -> String {
        match a <= b {
            true => format!("{a}_{b}"),
            false => format!("{b}_{a}"),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }
}

impl fmt::Display for FriendRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FriendRequest({}): {} -> {} [{:?}]",
            &self.id, &self.from_id, &self.to_id, self.status
        )
    }
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    #[default]
    Pending,
    Accepted,
    Declined,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Declined => "declined",
        }
    }
}
