use serde::{Deserialize, Serialize};

use crate::{
    documents::{OwnedGame, Purchase},
    log_event,
    logging::LogEvent,
    Status,
};

use super::Response;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub enum StoreEvent {
    Purchase(PurchaseRequest),
    Achievement(AchievementRequest),
}

impl StoreEvent {
    pub fn purchase(user_id: &str, item_ids: Vec<String>, response: &Result<Purchase, Status>) {
        log_event!(LogEvent::Store(StoreEvent::Purchase(PurchaseRequest {
            user_id: user_id.to_owned(),
            item_ids,
            result: Response::of(response, |purchase| {
                format!("{} ({} cents)", purchase.id, purchase.total_cents)
            }),
        })))
    }

    pub fn achievement(
        user_id: &str,
        game_id: &str,
        achievement_id: &str,
        response: &Result<OwnedGame, Status>,
    ) {
        log_event!(LogEvent::Store(StoreEvent::Achievement(
            AchievementRequest {
                user_id: user_id.to_owned(),
                game_id: game_id.to_owned(),
                achievement_id: achievement_id.to_owned(),
                result: Response::of(response, |game| {
                    format!("{}/{} unlocked", game.unlocked(), game.achievements.len())
                }),
            }
        )))
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PurchaseRequest {
    user_id: String,
    item_ids: Vec<String>,
    result: Response,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AchievementRequest {
    user_id: String,
    game_id: String,
    achievement_id: String,
    result: Response,
}
