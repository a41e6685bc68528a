/**
 * Change Notification Events
 *
 * Events pushed by the store's change feed. Only the fact that something
 * happened to a table matters to the client; the record payload that comes
 * along with it is ignored and a full re-fetch follows.
 */
use serde::{Deserialize, Serialize};

/// Kind of row change
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeOperation {
    Insert,
    Update,
    Delete,
}

/// Change on a table, as carried by one feed message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Operation; feeds spell this `type`, `operation` or `eventType`
    #[serde(rename = "type", alias = "operation", alias = "eventType")]
    pub operation: ChangeOperation,
    /// Table the change applies to
    pub table: String,
}

impl ChangeEvent {
    pub fn new(operation: ChangeOperation, table: impl Into<String>) -> Self {
        Self {
            operation,
            table: table.into(),
        }
    }

    /// Parse one feed message. Unknown fields (record, old_record, schema,
    /// commit_timestamp, ...) are ignored.
    pub fn parse(data: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(data)
    }

    pub fn affects(&self, table: &str) -> bool {
        self.table == table
    }
}
