use serde::{Deserialize, Serialize};

/// MySQL reader configuration: the source DSN, table, and the column list
/// (and per-connection text encoding) the `SELECT` is built from (§4.4, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MySqlSourceConfig {
    pub dsn: String,
    pub table: String,
    pub columns: Vec<String>,
    #[serde(default = "default_encoding")]
    pub encoding: String,
}

fn default_encoding() -> String {
    "utf-8".to_string()
}
