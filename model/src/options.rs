use crate::schema::IndexNamePolicy;
use serde::{Deserialize, Serialize};

/// Batch-control knobs shared by every table's pipeline (§4.5).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BatchConfig {
    pub rows: usize,
    pub bytes: usize,
    pub concurrent_batches: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            rows: 1000,
            bytes: 4 * 1024 * 1024,
            concurrent_batches: 4,
        }
    }
}

/// Run-wide switches consumed by the schema orchestrator (§4.7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOptions {
    pub include_drop: bool,
    pub data_only: bool,
    pub create_tables: bool,
    pub foreign_keys: bool,
    pub reset_sequences: bool,
    pub index_names: IndexNamePolicy,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            include_drop: false,
            data_only: false,
            create_tables: true,
            foreign_keys: true,
            reset_sequences: true,
            index_names: IndexNamePolicy::Uniquify,
        }
    }
}

/// Per-table writer options (§4.3 public contract).
#[derive(Debug, Clone)]
pub struct CopyOptions {
    pub columns: Vec<String>,
    pub truncate: bool,
    pub disable_triggers: bool,
}
