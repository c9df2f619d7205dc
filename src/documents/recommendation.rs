use serde::{Deserialize, Serialize};

/// Input of a recommendation request: free-text descriptions of the user.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
pub struct RecommendationRequest {
    /// Genres, titles and platforms the user has played.
    pub play_history: String,

    /// What the user is looking for.
    pub preferences: String,

    /// What the user's friends are currently playing.
    #[serde(default)]
    pub friend_activity: String,
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct Recommendations {
    pub recommended_games: Vec<RecommendedGame>,
    pub summary: String,
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct RecommendedGame {
    pub title: String,

    /// Platform(s) the game is available on.
    pub platform: String,
    pub genre: String,

    #[serde(default)]
    pub key_features: Vec<String>,

    /// How well the game matches the user, 0-100.
    pub match_score: f64,
    pub reasoning: String,
}
