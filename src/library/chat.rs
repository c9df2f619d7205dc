use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::Session,
    datastore::{read_or_not_found, CollectionPath, Versioned},
    documents::{ChatMessage, UserProfile},
    traits::DocumentStore,
    util::time::now_millis,
    Status,
};

use super::firestore::chats;

/// Direct messages between friends.
pub struct ChatManager<S> {
    store: Arc<S>,
}

impl<S: DocumentStore> ChatManager<S> {
    pub fn new(store: Arc<S>) -> Self {
        ChatManager { store }
    }

    #[instrument(level = "trace", skip(self, session, text), fields(uid = %session.uid))]
    pub async fn send_message(
        &self,
        session: &Session,
        friend_id: &str,
        text: &str,
    ) -> Result<ChatMessage, Status> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Status::invalid_argument("Message cannot be empty"));
        }
        if text.chars().count() > MAX_MESSAGE_LEN {
            return Err(Status::invalid_argument(format!(
                "Message cannot exceed {MAX_MESSAGE_LEN} characters"
            )));
        }
        self.check_friends(&session.uid, friend_id).await?;

        let message = ChatMessage {
            id: Uuid::new_v4().to_string(),
            conversation_id: ChatMessage::conversation_id(&session.uid, friend_id),
            sender_id: session.uid.clone(),
            text: text.to_owned(),
            sent_at: now_millis(),
        };
        self.store.commit(vec![chats::write(&message)?]).await?;
        Ok(message)
    }

    /// Returns the last `limit` messages with a friend in ascending time
    /// order.
    #[instrument(level = "trace", skip(self, session), fields(uid = %session.uid))]
    pub async fn messages(
        &self,
        session: &Session,
        friend_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<ChatMessage>, Status> {
        self.check_friends(&session.uid, friend_id).await?;

        let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
        let mut messages = chats::list(
            &*self.store,
            &ChatMessage::conversation_id(&session.uid, friend_id),
        )
        .await?;
        let skip = messages.len().saturating_sub(limit);
        Ok(messages.split_off(skip))
    }

    async fn check_friends(&self, user_id: &str, friend_id: &str) -> Result<(), Status> {
        let profile: Versioned<UserProfile> =
            read_or_not_found(&*self.store, &CollectionPath::users().doc(user_id)).await?;
        match profile.doc.is_friend(friend_id) {
            true => Ok(()),
            false => Err(Status::permission_denied(format!(
                "'{user_id}' can only message friends"
            ))),
        }
    }
}

const DEFAULT_LIMIT: usize = 50;
const MAX_LIMIT: usize = 500;
const MAX_MESSAGE_LEN: usize = 2000;
