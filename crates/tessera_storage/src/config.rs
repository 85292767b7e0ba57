//! Configuration for the archetype store.

/// Sizing and diagnostics knobs for a [`World`](crate::World).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageConfig {
    /// Initial length of the entity metadata array. Grows by doubling.
    pub initial_entity_capacity: usize,

    /// Rows reserved in every column when a table is created.
    pub table_row_capacity: usize,

    /// Emit a `trace!` event for every table migration.
    pub log_transitions: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            initial_entity_capacity: 512,
            table_row_capacity: 0,
            log_transitions: false,
        }
    }
}

impl StorageConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the initial entity metadata capacity.
    #[must_use]
    pub fn with_initial_entity_capacity(mut self, capacity: usize) -> Self {
        self.initial_entity_capacity = capacity;
        self
    }

    /// Builder method to set the per-table row reservation.
    #[must_use]
    pub fn with_table_row_capacity(mut self, capacity: usize) -> Self {
        self.table_row_capacity = capacity;
        self
    }

    /// Builder method to toggle migration tracing.
    #[must_use]
    pub fn with_log_transitions(mut self, enabled: bool) -> Self {
        self.log_transitions = enabled;
        self
    }
}
