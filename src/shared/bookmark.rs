/**
 * Bookmark Data Structure
 *
 * Rows of the remote "bookmarks" table plus the payloads sent when
 * inserting or patching a row. Deserialization is the shape check for
 * anything the store returns: a row missing a required column, or carrying
 * a column of the wrong type, fails to parse instead of being trusted.
 */
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single bookmark row.
///
/// # Fields
/// * `id` - Assigned by the store, immutable, the only update/delete key
/// * `owner_id` - Identity that created the row; defines who may see it
/// * `title` - Display text
/// * `url` - Target link, stored as typed (no well-formedness check)
///
/// Extra columns the store may add (timestamps and so on) are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Bookmark {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub url: String,
}

impl Bookmark {
    /// Parse a list response body into rows.
    pub fn parse_rows(body: &str) -> Result<Vec<Bookmark>, serde_json::Error> {
        serde_json::from_str(body)
    }

    pub fn is_owned_by(&self, owner_id: Uuid) -> bool {
        self.owner_id == owner_id
    }
}

/// Insert payload. The store assigns `id`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NewBookmark<'a> {
    pub owner_id: Uuid,
    pub title: &'a str,
    pub url: &'a str,
}

/// Patch payload for an existing row.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BookmarkPatch<'a> {
    pub title: &'a str,
    pub url: &'a str,
}
