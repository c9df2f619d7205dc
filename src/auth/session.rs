use serde::{Deserialize, Serialize};

use crate::Status;

/// Identity of the caller of a request, produced by verifying its bearer
/// token. Passed explicitly to every operation acting on behalf of a user.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub uid: String,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl Session {
    pub fn new(uid: &str, email: &str) -> Self {
        Session {
            uid: uid.to_owned(),
            email: email.to_owned(),
            ..Default::default()
        }
    }

    /// Extracts the token from an `Authorization: Bearer <token>` header.
    pub fn bearer_token(header: Option<&str>) -> Result<&str, Status> {
        let header = match header {
            Some(header) => header,
            None => return Err(Status::unauthenticated("Missing Authorization header")),
        };

        match header.strip_prefix("Bearer ") {
            Some(token) if !token.trim().is_empty() => Ok(token.trim()),
            _ => Err(Status::unauthenticated(
                "Authorization header is not a bearer token",
            )),
        }
    }
}
