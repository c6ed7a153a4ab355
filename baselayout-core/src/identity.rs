//! Identity types for repository items

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{LayoutError, LayoutResult, ValidationError};

/// Separator between the database label and the item id in textual references.
pub const REFERENCE_SEPARATOR: char = ':';

/// Identifier of an item within a database.
///
/// Identities are only comparable within the same database; use [`ItemRef`]
/// whenever the database matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(Uuid);

impl ItemId {
    /// Wrap an existing UUID.
    pub const fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a new UUIDv7 item id (timestamp-sortable).
    pub fn now_v7() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for ItemId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for ItemId {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self).map_err(|e| {
            ValidationError::InvalidArgument {
                argument: "item_id".to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }
}

/// A partition label ("database"), e.g. `master` or `web`.
///
/// Labels are normalized to lowercase and restricted to ASCII alphanumerics,
/// `_`, `-` and `.`, so that a label can never contain the reference separator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Database(String);

impl Database {
    /// Create a database label, validating and normalizing it.
    pub fn new(label: impl AsRef<str>) -> LayoutResult<Self> {
        let label = label.as_ref().trim();
        if label.is_empty() {
            return Err(ValidationError::InvalidArgument {
                argument: "database".to_string(),
                reason: "database label must not be empty".to_string(),
            }
            .into());
        }
        if let Some(c) = label
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
        {
            return Err(ValidationError::InvalidArgument {
                argument: "database".to_string(),
                reason: format!("invalid character {c:?} in database label {label:?}"),
            }
            .into());
        }
        Ok(Self(label.to_ascii_lowercase()))
    }

    /// The authoring database.
    pub fn master() -> Self {
        Self("master".to_string())
    }

    /// The published database.
    pub fn web() -> Self {
        Self("web".to_string())
    }

    /// The normalized label.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Database {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Database {
    type Error = LayoutError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Database> for String {
    fn from(database: Database) -> Self {
        database.0
    }
}

/// Reference to an item: an identity plus the database it lives in.
///
/// Two references are equal iff both the database and the id match; the same
/// id in two databases denotes unrelated items.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemRef {
    database: Database,
    id: ItemId,
}

impl ItemRef {
    pub fn new(database: Database, id: ItemId) -> Self {
        Self { database, id }
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    /// Reference another item in the same database.
    pub fn sibling(&self, id: ItemId) -> Self {
        Self {
            database: self.database.clone(),
            id,
        }
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.database, REFERENCE_SEPARATOR, self.id)
    }
}

impl FromStr for ItemRef {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (database, id) = s.split_once(REFERENCE_SEPARATOR).ok_or_else(|| {
            LayoutError::from(ValidationError::InvalidArgument {
                argument: "item_ref".to_string(),
                reason: format!("expected <database>{REFERENCE_SEPARATOR}<id>, got {s:?}"),
            })
        })?;
        Ok(Self::new(database.parse()?, id.parse()?))
    }
}
