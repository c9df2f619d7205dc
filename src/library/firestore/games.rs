use tracing::instrument;

use crate::{
    datastore::{CollectionPath, Precondition, Versioned, Write},
    documents::OwnedGame,
    traits::DocumentStore,
    Status,
};

#[instrument(name = "games::read", level = "trace", skip(store))]
pub async fn read<S: DocumentStore>(
    store: &S,
    user_id: &str,
    game_id: &str,
) -> Result<Option<Versioned<OwnedGame>>, Status> {
    store
        .read(&CollectionPath::owned_games(user_id).doc(game_id))
        .await
}

#[instrument(name = "games::list", level = "trace", skip(store))]
pub async fn list<S: DocumentStore>(store: &S, user_id: &str) -> Result<Vec<OwnedGame>, Status> {
    store.query(&CollectionPath::owned_games(user_id), &[]).await
}

pub fn write(
    user_id: &str,
    game: &OwnedGame,
    precondition: Precondition,
) -> Result<Write, Status> {
    Write::set(
        CollectionPath::owned_games(user_id).doc(&game.id),
        game,
        precondition,
    )
}
