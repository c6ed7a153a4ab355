//! Well-known layout fields.
//!
//! Presentation configuration is stored in a shared layout field and, for
//! repositories with versioned layouts, a final layout field. Whether the
//! final layout field participates is a build-time choice made with the
//! `final-layout` cargo feature.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a field on an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldId(Uuid);

impl FieldId {
    pub const fn new(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.0.hyphenated().to_string().to_uppercase())
    }
}

/// The shared layout field (`__Renderings`).
pub const LAYOUT_FIELD: FieldId = FieldId::new(Uuid::from_u128(0xF1A1FE9E_A60C_4DDB_A3A0_BB5B29FE732E));

/// The final (versioned) layout field (`__Final Renderings`).
pub const FINAL_LAYOUT_FIELD: FieldId =
    FieldId::new(Uuid::from_u128(0x04BF00DB_F5FB_41F7_8AB7_22408372A981));

/// A field holding presentation configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayoutField {
    /// Shared across versions and languages.
    Shared,
    /// Per version; layered on top of the shared layout.
    Final,
}

impl LayoutField {
    pub fn field_id(self) -> FieldId {
        match self {
            LayoutField::Shared => LAYOUT_FIELD,
            LayoutField::Final => FINAL_LAYOUT_FIELD,
        }
    }

    /// Map a field id to the layout field it denotes, if it is one.
    pub fn from_field_id(field: FieldId) -> Option<Self> {
        if field == LAYOUT_FIELD {
            Some(LayoutField::Shared)
        } else if cfg!(feature = "final-layout") && field == FINAL_LAYOUT_FIELD {
            Some(LayoutField::Final)
        } else {
            None
        }
    }

    /// Layout fields recognised by this build.
    pub fn enabled() -> &'static [LayoutField] {
        if cfg!(feature = "final-layout") {
            &[LayoutField::Shared, LayoutField::Final]
        } else {
            &[LayoutField::Shared]
        }
    }
}

/// True if `field` holds presentation configuration.
pub fn is_layout_field(field: FieldId) -> bool {
    LayoutField::from_field_id(field).is_some()
}
