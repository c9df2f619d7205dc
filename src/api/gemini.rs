use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;

use crate::{
    documents::{RecommendationRequest, Recommendations},
    traits::RecommendationModel,
    util::keys::GeminiKeys,
    Status,
};

/// Client of the Generative Language API producing game recommendations.
pub struct GeminiApi {
    keys: GeminiKeys,
    client: reqwest::Client,
}

impl GeminiApi {
    pub fn new(keys: GeminiKeys) -> Self {
        GeminiApi {
            keys,
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.keys.url, self.keys.model, self.keys.api_key
        )
    }
}

#[async_trait]
impl RecommendationModel for GeminiApi {
    #[instrument(level = "trace", skip(self, request))]
    async fn recommend(&self, request: &RecommendationRequest) -> Result<Recommendations, Status> {
        let body = GenerateRequest {
            contents: vec![Content {
                role: "user".to_owned(),
                parts: vec![Part {
                    text: prompt(request),
                }],
            }],
            generation_config: json!({
                "responseMimeType": "application/json",
                "responseSchema": response_schema(),
            }),
        };

        let resp = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .await?;
        if !resp.status().is_success() {
            let code = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(Status::internal(format!(
                "Recommendation model returned {code}: {text}"
            )));
        }

        let resp = resp.json::<GenerateResponse>().await?;
        let text = resp
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .map(|part| part.text);

        match text {
            Some(text) => serde_json::from_str::<Recommendations>(&text).map_err(|e| {
                Status::internal(format!("Recommendation model returned malformed output: {e}"))
            }),
            None => Err(Status::internal("Recommendation model returned no candidates")),
        }
    }
}

fn prompt(request: &RecommendationRequest) -> String {
    format!(
        "You are an expert game recommendation system. Provide exactly three highly \
        relevant game recommendations based on the user's play history, preferences and \
        friend activity.\n\n\
        For each recommendation give the title, platform(s), primary genre, 3-4 key \
        features, a match score from 0 to 100 for how well it fits the user and a brief \
        reasoning. Finish with a summary of the overall reasoning.\n\n\
        User's play history:\n{}\n\n\
        User's preferences:\n{}\n\n\
        User's friend activity:\n{}\n",
        request.play_history.trim(),
        request.preferences.trim(),
        request.friend_activity.trim(),
    )
}

fn response_schema() -> serde_json::Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "recommended_games": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "title": { "type": "STRING" },
                        "platform": { "type": "STRING" },
                        "genre": { "type": "STRING" },
                        "key_features": { "type": "ARRAY", "items": { "type": "STRING" } },
                        "match_score": { "type": "NUMBER" },
                        "reasoning": { "type": "STRING" },
                    },
                    "required": [
                        "title", "platform", "genre", "key_features", "match_score", "reasoning",
                    ],
                },
            },
            "summary": { "type": "STRING" },
        },
        "required": ["recommended_games", "summary"],
    })
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: serde_json::Value,
}

#[derive(Serialize, Deserialize, Debug, Default)]
struct Content {
    #[serde(default)]
    role: String,

    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize, Debug, Default)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize, Debug, Default)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug, Default)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_includes_all_inputs() {
        let request = RecommendationRequest {
            play_history: "  Hundreds of hours in Hollow Knight  ".to_owned(),
            preferences: "Tight platforming with exploration".to_owned(),
            friend_activity: "Ada is playing Celeste".to_owned(),
        };

        let prompt = prompt(&request);
        assert!(prompt.contains("User's play history:\nHundreds of hours in Hollow Knight\n"));
        assert!(prompt.contains("Tight platforming with exploration"));
        assert!(prompt.contains("Ada is playing Celeste"));
    }

    #[test]
    fn endpoint_uses_configured_model() {
        let api = GeminiApi::new(GeminiKeys {
            api_key: "secret".to_owned(),
            ..Default::default()
        });
        assert_eq!(
            api.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent?key=secret"
        );
    }

    #[test]
    fn candidate_text_parses_as_recommendations() {
        let resp: GenerateResponse = serde_json::from_str(
            r#"{
                "candidates": [{
                    "content": {
                        "role": "model",
                        "parts": [{ "text": "{\"recommended_games\": [], \"summary\": \"none\"}" }]
                    }
                }]
            }"#,
        )
        .unwrap();

        let text = &resp.candidates[0].content.parts[0].text;
        let recommendations: Recommendations = serde_json::from_str(text).unwrap();
        assert_eq!(recommendations.summary, "none");
    }
}
