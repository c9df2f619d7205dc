use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use crate::{auth::Session, traits::IdentityVerifier, Status};

/// Verifies Firebase ID tokens against Google's published signing keys.
pub struct FirebaseAuth {
    project_id: String,
    client: reqwest::Client,
    keys: RwLock<KeyCache>,
}

struct KeyCache {
    keys: HashMap<String, DecodingKey>,
    fetched_at: Option<Instant>,
}

impl KeyCache {
    fn is_fresh(&self) -> bool {
        match self.fetched_at {
            Some(fetched_at) => fetched_at.elapsed() < KEYS_TTL,
            None => false,
        }
    }
}

impl FirebaseAuth {
    pub fn new(project_id: &str) -> Self {
        FirebaseAuth {
            project_id: project_id.to_owned(),
            client: reqwest::Client::new(),
            keys: RwLock::new(KeyCache {
                keys: HashMap::new(),
                fetched_at: None,
            }),
        }
    }

    fn issuer(&self) -> String {
        format!("{FIREBASE_ISSUER}/{}", self.project_id)
    }

    /// Returns the key that signed a token. Keys are refetched when the cache
    /// is stale or the key id is unknown, since Google rotates them.
    async fn decoding_key(&self, kid: &str) -> Result<DecodingKey, Status> {
        {
            let cache = self.keys.read().await;
            if cache.is_fresh() {
                if let Some(key) = cache.keys.get(kid) {
                    return Ok(key.clone());
                }
            }
        }

        let jwks = self
            .client
            .get(JWKS_URL)
            .send()
            .await?
            .json::<Jwks>()
            .await?;

        let mut cache = self.keys.write().await;
        cache.keys = jwks
            .keys
            .iter()
            .filter_map(|jwk| Some((jwk.kid.clone(), jwk.decoding_key()?)))
            .collect();
        cache.fetched_at = Some(Instant::now());
        info!("fetched {} firebase signing keys", cache.keys.len());

        match cache.keys.get(kid) {
            Some(key) => Ok(key.clone()),
            None => Err(Status::unauthenticated(format!(
                "Token signed with unknown key '{kid}'"
            ))),
        }
    }
}

#[async_trait]
impl IdentityVerifier for FirebaseAuth {
    #[instrument(level = "trace", skip(self, token))]
    async fn verify(&self, token: &str) -> Result<Session, Status> {
        let header = decode_header(token)?;
        let kid = match header.kid {
            Some(kid) => kid,
            None => return Err(Status::unauthenticated("Token has no key id")),
        };
        let key = self.decoding_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.project_id]);
        validation.set_issuer(&[self.issuer()]);

        let claims = match decode::<FirebaseClaims>(token, &key, &validation) {
            Ok(data) => data.claims,
            Err(e) => {
                warn!("rejected id token: {e}");
                return Err(Status::from(e));
            }
        };
        claims.into_session()
    }
}

/// Claims of a Firebase ID token that make up a session.
#[derive(Deserialize, Debug, Clone)]
struct FirebaseClaims {
    sub: String,

    #[serde(default)]
    email: Option<String>,

    #[serde(default)]
    name: Option<String>,

    #[serde(default)]
    picture: Option<String>,
}

impl FirebaseClaims {
    fn into_session(self) -> Result<Session, Status> {
        if self.sub.is_empty() {
            return Err(Status::unauthenticated("Token has an empty subject"));
        }
        Ok(Session {
            uid: self.sub,
            email: self.email.unwrap_or_default(),
            display_name: self.name,
            avatar: self.picture,
        })
    }
}

#[derive(Deserialize, Debug)]
struct Jwks {
    keys: Vec<Jwk>,
}

#[derive(Deserialize, Debug)]
struct Jwk {
    kid: String,
    kty: String,
    n: Option<String>,
    e: Option<String>,
}

impl Jwk {
    fn decoding_key(&self) -> Option<DecodingKey> {
        if self.kty != "RSA" {
            return None;
        }
        DecodingKey::from_rsa_components(self.n.as_ref()?, self.e.as_ref()?).ok()
    }
}

const JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";
const FIREBASE_ISSUER: &str = "https://securetoken.google.com";
const KEYS_TTL: Duration = Duration::from_secs(60 * 60);
