//! Entity records mirrored from the server.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Update sequence number.
///
/// Assigned by the server, monotonically increasing across the account's
/// change log. Zero means "nothing applied yet".
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Usn(pub u64);

impl Usn {
    /// The cold-start cursor.
    pub const ZERO: Usn = Usn(0);

    /// Creates a new sequence number.
    #[must_use]
    pub const fn new(usn: u64) -> Self {
        Self(usn)
    }

    /// Returns the raw sequence value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns true for the zero sequence number.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns the next sequence number.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Usn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Optional metadata attached to a note.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteAttributes {
    /// URL the note was clipped from.
    pub source_url: Option<String>,
    /// Latitude where the note was created.
    pub latitude: Option<f64>,
    /// Application or device that created the note.
    pub source: Option<String>,
    /// Human-readable place name.
    pub place_name: Option<String>,
    /// Content class tag set by specialised clients.
    pub content_class: Option<String>,
}

/// A note record (metadata only; the body lives in the content store).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Unique note identifier.
    pub guid: String,
    /// Note title.
    #[serde(default)]
    pub title: String,
    /// GUID of the owning notebook.
    #[serde(default)]
    pub notebook_guid: String,
    /// Sequence number of the last change to this note.
    #[serde(default)]
    pub update_sequence_num: Usn,
    /// Last modification time in milliseconds since the Unix epoch.
    #[serde(default)]
    pub updated: Option<i64>,
    /// Length of the note body in bytes, as reported by the server.
    #[serde(default)]
    pub content_length: Option<u32>,
    /// Note attributes.
    #[serde(default)]
    pub attributes: NoteAttributes,
}

impl Note {
    /// Creates a note with empty attributes.
    pub fn new(
        guid: impl Into<String>,
        title: impl Into<String>,
        notebook_guid: impl Into<String>,
        update_sequence_num: Usn,
    ) -> Self {
        Self {
            guid: guid.into(),
            title: title.into(),
            notebook_guid: notebook_guid.into(),
            update_sequence_num,
            updated: None,
            content_length: None,
            attributes: NoteAttributes::default(),
        }
    }

    /// Sets the attributes.
    #[must_use]
    pub fn with_attributes(mut self, attributes: NoteAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Sets the last modification time.
    #[must_use]
    pub fn with_updated(mut self, updated_ms: i64) -> Self {
        self.updated = Some(updated_ms);
        self
    }
}

/// A notebook record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notebook {
    /// Unique notebook identifier.
    pub guid: String,
    /// Notebook name.
    #[serde(default)]
    pub name: String,
    /// Sequence number of the last change to this notebook.
    #[serde(default)]
    pub update_sequence_num: Usn,
    /// Whether this is the account's default notebook.
    #[serde(default)]
    pub default_notebook: Option<bool>,
}

impl Notebook {
    /// Creates a notebook record.
    pub fn new(guid: impl Into<String>, name: impl Into<String>, update_sequence_num: Usn) -> Self {
        Self {
            guid: guid.into(),
            name: name.into(),
            update_sequence_num,
            default_notebook: None,
        }
    }
}
