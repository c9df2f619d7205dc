use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

use crate::{
    auth::Session,
    datastore::{retry_on_abort, Precondition, Versioned},
    documents::OwnedGame,
    logging::StoreEvent,
    traits::DocumentStore,
    util::time::now_millis,
    Status,
};

use super::firestore::games;

/// Manages the games a user owns, their achievements and playtime.
pub struct LibraryManager<S> {
    store: Arc<S>,
}

impl<S: DocumentStore> LibraryManager<S> {
    pub fn new(store: Arc<S>) -> Self {
        LibraryManager { store }
    }

    /// Returns the user's games sorted by title.
    #[instrument(level = "trace", skip(self))]
    pub async fn library(&self, user_id: &str) -> Result<Vec<OwnedGame>, Status> {
        let games = games::list(&*self.store, user_id).await?;
        Ok(games
            .into_iter()
            .sorted_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
            .collect())
    }

    /// Moves an achievement's progress. Progress is clamped to 100 and
    /// reaching it unlocks the achievement for good.
    #[instrument(level = "trace", skip(self, session), fields(uid = %session.uid))]
    pub async fn update_achievement(
        &self,
        session: &Session,
        game_id: &str,
        achievement_id: &str,
        progress: u8,
    ) -> Result<OwnedGame, Status> {
        let result = retry_on_abort("update_achievement", || async {
            let Versioned { mut doc, revision } = self.read_game(&session.uid, game_id).await?;
            let achievement = match doc.achievements.iter_mut().find(|a| a.id == achievement_id) {
                Some(achievement) => achievement,
                None => {
                    return Err(Status::not_found(format!(
                        "Achievement '{achievement_id}' was not found in '{}'",
                        &doc.title
                    )))
                }
            };

            if achievement.set_progress(progress, now_millis()) {
                self.store
                    .commit(vec![games::write(
                        &session.uid,
                        &doc,
                        Precondition::Revision(revision),
                    )?])
                    .await?;
            }
            Ok(doc)
        })
        .await;

        StoreEvent::achievement(&session.uid, game_id, achievement_id, &result);
        result
    }

    /// Adds a play session of `minutes` to a game.
    #[instrument(level = "trace", skip(self, session), fields(uid = %session.uid))]
    pub async fn record_playtime(
        &self,
        session: &Session,
        game_id: &str,
        minutes: u64,
    ) -> Result<OwnedGame, Status> {
        if minutes == 0 || minutes > MAX_SESSION_MINUTES {
            return Err(Status::invalid_argument(format!(
                "Play session of {minutes} minutes must be between 1 and {MAX_SESSION_MINUTES}"
            )));
        }

        retry_on_abort("record_playtime", || async {
            let Versioned { mut doc, revision } = self.read_game(&session.uid, game_id).await?;
            doc.playtime_minutes += minutes;
            doc.last_played = Some(now_millis());
            self.store
                .commit(vec![games::write(
                    &session.uid,
                    &doc,
                    Precondition::Revision(revision),
                )?])
                .await?;
            Ok(doc)
        })
        .await
    }

    /// Unlocked and total achievement counts per game and overall.
    #[instrument(level = "trace", skip(self))]
    pub async fn achievement_summary(&self, user_id: &str) -> Result<AchievementSummary, Status> {
        let games = self
            .library(user_id)
            .await?
            .into_iter()
            .map(|game| GameAchievements {
                unlocked: game.unlocked(),
                total: game.achievements.len(),
                game_id: game.id,
                title: game.title,
            })
            .collect_vec();

        Ok(AchievementSummary {
            unlocked: games.iter().map(|game| game.unlocked).sum(),
            total: games.iter().map(|game| game.total).sum(),
            games,
        })
    }

    async fn read_game(&self, user_id: &str, game_id: &str) -> Result<Versioned<OwnedGame>, Status> {
        match games::read(&*self.store, user_id, game_id).await? {
            Some(game) => Ok(game),
            None => Err(Status::not_found(format!(
                "'{game_id}' is not in the library of '{user_id}'"
            ))),
        }
    }
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
pub struct AchievementSummary {
    pub unlocked: usize,
    pub total: usize,
    pub games: Vec<GameAchievements>,
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
pub struct GameAchievements {
    pub game_id: String,
    pub title: String,
    pub unlocked: usize,
    pub total: usize,
}

const MAX_SESSION_MINUTES: u64 = 24 * 60;
