//! Bookmark form state
//!
//! The form is either composing a new bookmark or editing an existing one.
//! Editing starts from `begin_edit` and ends when a submit settles or the
//! user cancels.

use uuid::Uuid;

use crate::shared::bookmark::Bookmark;
use crate::shared::error::ValidationError;

/// Text shown by the blocking warning when a field is empty
pub const MISSING_FIELDS_WARNING: &str = "Fill all fields!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftMode {
    ComposingNew,
    EditingExisting(Uuid),
}

/// What a valid submit turns into
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Create { title: String, url: String },
    Update { id: Uuid, title: String, url: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub title: String,
    pub url: String,
    editing: Option<Uuid>,
}

impl Draft {
    pub fn mode(&self) -> DraftMode {
        match self.editing {
            Some(id) => DraftMode::EditingExisting(id),
            None => DraftMode::ComposingNew,
        }
    }

    pub fn editing(&self) -> Option<Uuid> {
        self.editing
    }

    /// Seed the form from `bookmark` and target it for the next submit.
    pub fn begin_edit(&mut self, bookmark: &Bookmark) {
        self.title = bookmark.title.clone();
        self.url = bookmark.url.clone();
        self.editing = Some(bookmark.id);
    }

    /// Back to an empty composing-new form.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn submit_label(&self) -> &'static str {
        match self.mode() {
            DraftMode::ComposingNew => "Add",
            DraftMode::EditingExisting(_) => "Update",
        }
    }

    /// Presence check on both fields, then the operation to perform.
    pub fn submission(&self) -> Result<Submission, ValidationError> {
        if self.title.is_empty() {
            return Err(ValidationError::missing("title"));
        }
        if self.url.is_empty() {
            return Err(ValidationError::missing("url"));
        }
        let title = self.title.clone();
        let url = self.url.clone();
        Ok(match self.editing {
            Some(id) => Submission::Update { id, title, url },
            None => Submission::Create { title, url },
        })
    }
}
