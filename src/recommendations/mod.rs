use std::{sync::Arc, time::SystemTime};
use tracing::instrument;

use crate::{
    documents::{Presence, RecommendationRequest, Recommendations, RecommendedGame},
    library::FriendSummary,
    logging::RecommendationEvent,
    traits::RecommendationModel,
    Status,
};

/// Produces game recommendations for a user from a generative model,
/// validating what goes in and what comes out.
pub struct Recommender<M> {
    model: Arc<M>,
}

impl<M: RecommendationModel> Recommender<M> {
    pub fn new(model: Arc<M>) -> Self {
        Recommender { model }
    }

    /// Returns exactly three recommendations ordered by descending match
    /// score.
    #[instrument(level = "trace", skip(self, request))]
    pub async fn recommend(
        &self,
        request: &RecommendationRequest,
    ) -> Result<Recommendations, Status> {
        validate_request(request)?;

        let start = SystemTime::now();
        let result = match self.model.recommend(request).await {
            Ok(recommendations) => validate_recommendations(recommendations),
            Err(status) => Err(status),
        };
        let latency = SystemTime::now()
            .duration_since(start)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or_default();

        RecommendationEvent::recommend(latency, &result);
        result
    }
}

/// Checks that every free-text field is descriptive enough. All violations
/// are reported in one message.
pub fn validate_request(request: &RecommendationRequest) -> Result<(), Status> {
    let errors = [
        (&request.play_history, "play history"),
        (&request.preferences, "preferences"),
        (&request.friend_activity, "friend activity"),
    ]
    .iter()
    .filter(|(text, _)| text.trim().chars().count() < MIN_INPUT_LEN)
    .map(|(_, field)| format!("Please provide more details about your {field}."))
    .collect::<Vec<_>>();

    match errors.is_empty() {
        true => Ok(()),
        false => Err(Status::invalid_argument(errors.join(" "))),
    }
}

/// Checks the model's output and sorts it by descending match score. Ties
/// keep the model's order.
pub fn validate_recommendations(
    mut recommendations: Recommendations,
) -> Result<Recommendations, Status> {
    if recommendations.recommended_games.len() != NUM_RECOMMENDATIONS {
        return Err(Status::internal(format!(
            "Model returned {} recommendations instead of {NUM_RECOMMENDATIONS}",
            recommendations.recommended_games.len()
        )));
    }
    for game in &recommendations.recommended_games {
        validate_game(game)?;
    }

    recommendations
        .recommended_games
        .sort_by(|a, b| b.match_score.total_cmp(&a.match_score));
    Ok(recommendations)
}

fn validate_game(game: &RecommendedGame) -> Result<(), Status> {
    let missing = [
        (&game.title, "title"),
        (&game.platform, "platform"),
        (&game.genre, "genre"),
        (&game.reasoning, "reasoning"),
    ]
    .iter()
    .filter(|(text, _)| text.trim().is_empty())
    .map(|(_, field)| *field)
    .collect::<Vec<_>>();
    if !missing.is_empty() {
        return Err(Status::internal(format!(
            "Recommendation '{}' is missing {}",
            &game.title,
            missing.join(", ")
        )));
    }

    if !game.match_score.is_finite() || !(0.0..=100.0).contains(&game.match_score) {
        return Err(Status::internal(format!(
            "Recommendation '{}' has match score {} outside 0-100",
            &game.title, game.match_score
        )));
    }
    if game.key_features.is_empty() || game.key_features.len() > MAX_KEY_FEATURES {
        return Err(Status::internal(format!(
            "Recommendation '{}' has {} key features",
            &game.title,
            game.key_features.len()
        )));
    }
    Ok(())
}

/// Describes what a user's friends are up to, for requests that leave friend
/// activity empty.
pub fn friend_activity_from(friends: &[FriendSummary]) -> String {
    let playing = friends
        .iter()
        .filter_map(|friend| match (&friend.presence, &friend.current_game) {
            (Presence::InGame, Some(game)) => {
                Some(format!("{} is playing {game}", &friend.display_name))
            }
            _ => None,
        })
        .collect::<Vec<_>>();

    match (playing.is_empty(), friends.is_empty()) {
        (false, _) => format!("Friends currently playing: {}.", playing.join("; ")),
        (true, false) => format!(
            "None of the user's {} friends are playing anything right now.",
            friends.len()
        ),
        (true, true) => "The user has not added any friends yet.".to_owned(),
    }
}

const MIN_INPUT_LEN: usize = 20;
const NUM_RECOMMENDATIONS: usize = 3;
const MAX_KEY_FEATURES: usize = 6;
