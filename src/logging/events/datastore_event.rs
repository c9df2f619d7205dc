use serde::{Deserialize, Serialize};

use crate::{log_event, logging::LogEvent};

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DatastoreEvent {
    op: Op,
    collection: String,

    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    docs: Vec<String>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<String>,
}

impl DatastoreEvent {
    pub fn read(collection: String, doc: String, found: bool, error: Option<String>) {
        log_event!(LogEvent::Datastore(DatastoreEvent {
            op: Op::Read(ReadStats {
                read: 1,
                not_found: match found {
                    true => 0,
                    false => 1,
                },
            }),
            collection,
            docs: vec![doc],
            errors: error.into_iter().collect(),
        }))
    }

    pub fn query(collection: String, num: usize, error: Option<String>) {
        log_event!(LogEvent::Datastore(DatastoreEvent {
            op: Op::Read(ReadStats {
                read: num,
                not_found: 0,
            }),
            collection,
            docs: vec![],
            errors: error.into_iter().collect(),
        }))
    }

    pub fn commit(docs: Vec<String>, error: Option<String>) {
        log_event!(LogEvent::Datastore(DatastoreEvent {
            op: Op::Commit,
            collection: String::default(),
            docs,
            errors: error.into_iter().collect(),
        }))
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
enum Op {
    Read(ReadStats),
    Commit,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct ReadStats {
    read: usize,

    #[serde(skip_serializing_if = "is_zero")]
    not_found: usize,
}

fn is_zero(num: &usize) -> bool {
    *num == 0
}
