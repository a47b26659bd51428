use model::schema::IndexNamePolicy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level migration configuration document (§6 "Migration configuration
/// document"), the flat `serde`/`toml` replacement for the DSL compiler's
/// output this repository does not implement (§1 Out of scope).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    pub target: TargetConfig,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub tables: Vec<TableConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    pub dsn: String,
    #[serde(default)]
    pub session_settings: Vec<(String, String)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub include_drop: bool,
    pub data_only: bool,
    pub reset_sequences: bool,
    pub index_names: IndexNamePolicy,
    pub batch_rows: usize,
    pub batch_bytes: usize,
    pub concurrent_batches: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            include_drop: false,
            data_only: false,
            reset_sequences: true,
            index_names: IndexNamePolicy::Uniquify,
            batch_rows: 1000,
            batch_bytes: 4 * 1024 * 1024,
            concurrent_batches: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    /// A source URI (`mysql://…#table`, `fixed://…`, etc; §6 Source URIs).
    pub source: String,
    /// `schema.table` on the target.
    pub target: String,
    #[serde(default)]
    pub truncate: bool,
    #[serde(default)]
    pub disable_triggers: bool,
    #[serde(default)]
    pub columns: Vec<TableColumnConfig>,
    /// Field layout for a `fixed://`/glob/stdin/inline source; absent for a
    /// `mysql://` source. Supplements the distilled config shape (§6), which
    /// otherwise has no way to place fixed-width columns by byte offset.
    #[serde(default)]
    pub fixed_fields: Vec<TableFixedFieldConfig>,
    #[serde(default = "default_encoding")]
    pub encoding: String,
    #[serde(default)]
    pub skip_lines: usize,
    /// Indexes to build on this table during the complete phase (§4.7).
    /// Supplements the distilled config shape, which has no way to declare
    /// per-table indexes at all.
    #[serde(default)]
    pub indexes: Vec<TableIndexConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableFixedFieldConfig {
    pub name: String,
    pub start: usize,
    pub length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableIndexConfig {
    pub name: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub primary: bool,
}

fn default_encoding() -> String {
    "utf-8".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableColumnConfig {
    pub name: String,
    pub source_type: String,
    pub target_type: String,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub default: Option<String>,
}

impl TableConfig {
    /// Splits `target` into `(schema, table)`, defaulting the schema to
    /// `public` when the config omits it.
    pub fn target_schema_and_table(&self) -> (String, String) {
        match self.target.split_once('.') {
            Some((schema, table)) => (schema.to_string(), table.to_string()),
            None => ("public".to_string(), self.target.clone()),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

pub fn load(path: &str) -> Result<MigrationConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_string(),
        source,
    })?;
    parse(&text)
}

pub fn parse(text: &str) -> Result<MigrationConfig, ConfigError> {
    Ok(toml::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[target]
dsn = "postgresql://user:pw@host:5432/dbname?sslmode=prefer"
session_settings = [["statement_timeout", "0"], ["synchronous_commit", "off"]]

[run]
include_drop = true
reset_sequences = true
index_names = "uniquify"
batch_rows = 1000
batch_bytes = 4194304
concurrent_batches = 4

[[tables]]
source = "mysql://user:pw@localhost:3306/shop#orders"
target = "public.orders"
truncate = true
disable_triggers = false

[[tables.columns]]
name = "id"
source_type = "INT"
target_type = "INTEGER"
nullable = false
"#;

    #[test]
    fn parses_full_sample_document() {
        let config = parse(SAMPLE).expect("valid config");
        assert_eq!(config.target.dsn, "postgresql://user:pw@host:5432/dbname?sslmode=prefer");
        assert_eq!(config.run.batch_rows, 1000);
        assert_eq!(config.tables.len(), 1);
        assert_eq!(config.tables[0].target, "public.orders");
        assert_eq!(config.tables[0].columns[0].name, "id");
    }

    #[test]
    fn run_section_is_optional_and_defaults() {
        let minimal = r#"
[target]
dsn = "postgresql://user@host/db"
"#;
        let config = parse(minimal).expect("valid config");
        assert!(config.run.reset_sequences);
        assert_eq!(config.run.concurrent_batches, 4);
        assert!(config.tables.is_empty());
    }

    #[test]
    fn target_without_schema_defaults_to_public() {
        let table = TableConfig {
            source: "mysql://x/y#t".into(),
            target: "orders".into(),
            truncate: false,
            disable_triggers: false,
            columns: vec![],
            fixed_fields: vec![],
            encoding: "utf-8".into(),
            skip_lines: 0,
            indexes: vec![],
        };
        assert_eq!(
            table.target_schema_and_table(),
            ("public".to_string(), "orders".to_string())
        );
    }
}
