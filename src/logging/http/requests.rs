use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::Status;

/// Summary of a served HTTP request.
#[derive(Serialize, Deserialize, Clone, Default, Debug)]
pub struct LogHttpRequest {
    pub method: String,
    pub path: String,

    #[serde(default)]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub user_id: String,

    pub status: Status,
}

impl LogHttpRequest {
    pub fn new<T>(method: &str, path: &str, user_id: &str, result: &Result<T, Status>) -> Self {
        LogHttpRequest {
            method: method.to_owned(),
            path: path.to_owned(),
            user_id: user_id.to_owned(),
            status: match result {
                Ok(_) => Status::Ok,
                Err(status) => status.clone(),
            },
        }
    }

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
macro_rules! log_request {
    ($request:expr) => {
        ::tracing::debug!(request = $request.encode());
    };
}
