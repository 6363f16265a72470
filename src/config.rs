use allocative::Allocative;

use crate::store::StoreKind;

/// Column whose value becomes the row key unless configured otherwise.
pub const DEFAULT_KEY_COLUMN: &str = "id";

/// Engine-wide settings, fixed when the [crate::Database] is created.
#[derive(Debug, Clone, PartialEq, Eq, Allocative)]
pub struct EngineConfig {
    /// Store strategy used for every table created afterwards.
    pub store: StoreKind,
    /// Column whose value keys each row. Tables without it fall back to their
    /// first declared column.
    pub key_column: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            store: StoreKind::default(),
            key_column: DEFAULT_KEY_COLUMN.to_string(),
        }
    }
}

impl EngineConfig {
    pub fn with_store(mut self, store: StoreKind) -> Self {
        self.store = store;
        self
    }

    pub fn with_key_column(mut self, key_column: impl Into<String>) -> Self {
        self.key_column = key_column.into();
        self
    }
}
