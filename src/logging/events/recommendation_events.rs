use serde::{Deserialize, Serialize};

use crate::{documents::Recommendations, log_event, logging::LogEvent, Status};

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RecommendationEvent {
    latency: u64,

    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    games: Vec<(String, f64)>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl RecommendationEvent {
    pub fn recommend(latency: u64, response: &Result<Recommendations, Status>) {
        let event = match response {
            Ok(recommendations) => RecommendationEvent {
                latency,
                games: recommendations
                    .recommended_games
                    .iter()
                    .map(|game| (game.title.clone(), game.match_score))
                    .collect(),
                error: None,
            },
            Err(status) => RecommendationEvent {
                latency,
                games: vec![],
                error: Some(status.to_string()),
            },
        };
        log_event!(LogEvent::Recommendation(event))
    }
}
