mod datastore_event;
mod recommendation_events;
mod social_events;
mod store_events;

pub use datastore_event::*;
pub use recommendation_events::*;
pub use social_events::*;
pub use store_events::*;

use serde::{Deserialize, Serialize};

use crate::Status;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub enum Response {
    Success(String),
    Error(String),
}

impl Response {
    fn of<T>(result: &Result<T, Status>, describe: impl Fn(&T) -> String) -> Self {
        match result {
            Ok(value) => Response::Success(describe(value)),
            Err(status) => Response::Error(status.to_string()),
        }
    }
}
