use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

use crate::Status;

use super::DocPath;

/// Version of a stored document. Changes on every write to the document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Revision(DateTime<Utc>);

impl Revision {
    pub fn new(update_time: DateTime<Utc>) -> Self {
        Revision(update_time)
    }

    pub fn update_time(&self) -> DateTime<Utc> {
        self.0
    }
}

/// A document together with the revision it was read at.
#[derive(Clone, Debug)]
pub struct Versioned<D> {
    pub doc: D,
    pub revision: Revision,
}

/// Condition a write must satisfy at commit time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Precondition {
    None,
    Missing,
    Exists,
    Revision(Revision),
}

impl Precondition {
    /// Condition for overwriting what was read: the same revision if the
    /// document existed, or its absence otherwise.
    pub fn unchanged<D>(read: Option<&Versioned<D>>) -> Self {
        match read {
            Some(versioned) => Precondition::Revision(versioned.revision),
            None => Precondition::Missing,
        }
    }
}

#[derive(Clone, Debug)]
pub enum WriteOp {
    Set(serde_json::Value),
    Delete,
}

#[derive(Clone, Debug)]
pub struct Write {
    pub path: DocPath,
    pub op: WriteOp,
    pub precondition: Precondition,
}

impl Write {
    pub fn set<D: Serialize>(
        path: DocPath,
        doc: &D,
        precondition: Precondition,
    ) -> Result<Self, Status> {
        Ok(Write {
            path,
            op: WriteOp::Set(serde_json::to_value(doc)?),
            precondition,
        })
    }

    pub fn delete(path: DocPath, precondition: Precondition) -> Self {
        Write {
            path,
            op: WriteOp::Delete,
            precondition,
        }
    }
}

/// Equality filter on a top-level string field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Filter {
    pub field: String,
    pub value: String,
}

impl Filter {
    pub fn eq(field: &str, value: impl Into<String>) -> Self {
        Filter {
            field: field.to_owned(),
            value: value.into(),
        }
    }

    /// Returns true if the JSON document matches the filter.
    pub fn matches(&self, doc: &serde_json::Value) -> bool {
        match doc.get(&self.field) {
            Some(serde_json::Value::String(value)) => *value == self.value,
            _ => false,
        }
    }
}

/// Converts a stored JSON document to its typed form.
pub fn decode<D: DeserializeOwned>(path: &str, value: serde_json::Value) -> Result<D, Status> {
    serde_json::from_value(value).map_err(|e| {
        Status::internal(format!(
            "Document '{path}' failed to parse with error '{e}'"
        ))
    })
}
