use serde::{Deserialize, Serialize};

use super::{LogEvent, LogHttpRequest};

#[derive(Serialize, Deserialize, Default, Clone, Debug)]
pub struct EventSpan {
    pub name: String,

    #[serde(default)]
    pub latency: u64,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<LogHttpRequest>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<LogEvent>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<EventSpan>,
}

impl EventSpan {
    pub fn new(name: &str) -> Self {
        EventSpan {
            name: name.to_owned(),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.request.is_none() && self.events.is_empty() && self.children.is_empty()
    }
}
