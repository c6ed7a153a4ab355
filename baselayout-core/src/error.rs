//! Error types for base layout operations

use thiserror::Error;

use crate::identity::{Database, ItemId, ItemRef};

/// Validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A base layout chain revisited an item.
    ///
    /// `chain` holds the ids walked before the revisit, in walk order.
    #[error("Circular base layout reference in {database}: {item} revisited after {chain:?}")]
    CircularReference {
        database: Database,
        item: ItemId,
        chain: Vec<ItemId>,
    },

    #[error("Invalid argument {argument}: {reason}")]
    InvalidArgument { argument: String, reason: String },

    #[error("Item not found: {item}")]
    ItemNotFound { item: ItemRef },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Cache errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache lock poisoned")]
    LockPoisoned,
}

/// Master error type for all base layout errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

impl LayoutError {
    /// True if this is a circular reference error.
    pub fn is_circular_reference(&self) -> bool {
        matches!(
            self,
            LayoutError::Validation(ValidationError::CircularReference { .. })
        )
    }
}

/// Result type alias for base layout operations.
pub type LayoutResult<T> = Result<T, LayoutError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_circular_reference_display() {
        let err = ValidationError::CircularReference {
            database: Database::new("master").expect("valid database"),
            item: ItemId::new(Uuid::nil()),
            chain: vec![ItemId::new(Uuid::nil())],
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Circular base layout reference"));
        assert!(msg.contains("master"));
        assert!(msg.contains("00000000-0000-0000-0000-000000000000"));
    }

    #[test]
    fn test_config_error_display_invalid_value() {
        let err = ConfigError::InvalidValue {
            field: "databases".to_string(),
            value: "".to_string(),
            reason: "must not be empty".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("databases"));
        assert!(msg.contains("must not be empty"));
    }

    #[test]
    fn test_layout_error_from_variants() {
        let validation = LayoutError::from(ValidationError::InvalidArgument {
            argument: "item".to_string(),
            reason: "no base layout field".to_string(),
        });
        assert!(matches!(validation, LayoutError::Validation(_)));
        assert!(!validation.is_circular_reference());

        let config = LayoutError::from(ConfigError::InvalidValue {
            field: "enabled".to_string(),
            value: "maybe".to_string(),
            reason: "not a bool".to_string(),
        });
        assert!(matches!(config, LayoutError::Config(_)));

        let cache = LayoutError::from(CacheError::LockPoisoned);
        assert!(matches!(cache, LayoutError::Cache(_)));
        assert!(cache.to_string().contains("lock poisoned"));
    }

    #[test]
    fn test_is_circular_reference() {
        let err = LayoutError::from(ValidationError::CircularReference {
            database: Database::new("web").expect("valid database"),
            item: ItemId::now_v7(),
            chain: Vec::new(),
        });
        assert!(err.is_circular_reference());
    }
}
