use serde::{Deserialize, Serialize};
use std::fs;

use crate::Status;

/// Application keys and service settings, loaded from a JSON key store.
#[derive(Serialize, Deserialize, Default, Debug, Clone)]
pub struct Keys {
    pub firebase: FirebaseKeys,

    #[serde(default)]
    pub gemini: GeminiKeys,
}

impl Keys {
    pub fn from_file(filename: &str) -> Result<Self, Status> {
        let text = fs::read_to_string(filename)?;
        let keys: Keys = serde_json::from_str(&text)?;
        Ok(keys)
    }
}

#[derive(Serialize, Deserialize, Default, Debug, Clone)]
pub struct FirebaseKeys {
    /// Firebase project that hosts the Firestore database and issues the
    /// users' id tokens.
    pub project_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GeminiKeys {
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_url")]
    pub url: String,
}

impl Default for GeminiKeys {
    fn default() -> Self {
        GeminiKeys {
            api_key: String::default(),
            model: default_model(),
            url: default_url(),
        }
    }
}

fn default_model() -> String {
    "gemini-1.5-flash".to_owned()
}

fn default_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_owned()
}
