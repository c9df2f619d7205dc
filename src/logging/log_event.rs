use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{DatastoreEvent, RecommendationEvent, SocialEvent, StoreEvent};

#[derive(Serialize, Deserialize, Clone, Debug)]
pub enum LogEvent {
    Datastore(DatastoreEvent),
    Social(SocialEvent),
    Store(StoreEvent),
    Recommendation(RecommendationEvent),
}

impl LogEvent {
    pub fn encode(&self) -> String {
        match serde_json::to_string(self) {
            Ok(json) => json,
            Err(e) => {
                warn!("{}", e);
                String::default()
            }
        }
    }
}

#[macro_export]
macro_rules! log_event {
    ($event:expr) => {
        ::tracing::debug!(event = $event.encode())
    };
}
