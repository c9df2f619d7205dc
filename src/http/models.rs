use serde::{Deserialize, Serialize};

use crate::documents::{FriendRequest, Presence};

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct SendFriendRequest {
    pub email: String,
}

/// Response of `GET /friends/requests`.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct FriendRequests {
    pub incoming: Vec<FriendRequest>,
    pub outgoing: Vec<FriendRequest>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct PresenceUpdate {
    pub presence: Presence,

    #[serde(default)]
    pub current_game: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct CatalogueQuery {
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct CartAdd {
    pub item_id: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PurchaseOp {
    pub item_id: String,

    #[serde(default = "default_payment_method")]
    pub payment_method: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Checkout {
    #[serde(default = "default_payment_method")]
    pub payment_method: String,
}

impl Default for Checkout {
    fn default() -> Self {
        Checkout {
            payment_method: default_payment_method(),
        }
    }
}

fn default_payment_method() -> String {
    "credit_card".to_owned()
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct AchievementProgress {
    pub progress: u8,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct PlaySession {
    pub minutes: u64,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct MessageOp {
    pub text: String,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct MessagesQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Body of every error reply.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ErrorReply {
    pub error: String,
}
