use tracing::instrument;

use crate::{
    datastore::{CollectionPath, Precondition, Write},
    documents::ChatMessage,
    traits::DocumentStore,
    Status,
};

/// All messages of a conversation in ascending time order.
#[instrument(name = "chats::list", level = "trace", skip(store))]
pub async fn list<S: DocumentStore>(
    store: &S,
    conversation_id: &str,
) -> Result<Vec<ChatMessage>, Status> {
    let mut messages: Vec<ChatMessage> = store
        .query(&CollectionPath::messages(conversation_id), &[])
        .await?;
    messages.sort_by(|a, b| a.sent_at.cmp(&b.sent_at).then_with(|| a.id.cmp(&b.id)));
    Ok(messages)
}

pub fn write(message: &ChatMessage) -> Result<Write, Status> {
    Write::set(
        CollectionPath::messages(&message.conversation_id).doc(&message.id),
        message,
        Precondition::Missing,
    )
}
