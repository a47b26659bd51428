use crate::core::data_type::DataType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TlsMode {
    Off,
    Prefer,
    Require,
}

/// Where to reach a database: either a TCP host or a local Unix socket
/// directory (`unix:/path/to/socket/dir`, see §6 Target DSN).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Host {
    Tcp { host: String, port: u16 },
    LocalSocket { dir: String },
}

/// An immutable, fully-resolved connection target (§3 `ConnectionSpec`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionSpec {
    pub host: Host,
    pub user: String,
    pub password: Option<String>,
    pub dbname: String,
    pub tls_mode: TlsMode,
}

impl ConnectionSpec {
    pub fn is_local_socket(&self) -> bool {
        matches!(self.host, Host::LocalSocket { .. })
    }
}

/// One column of a table being migrated (§3 `ColumnSpec`). `transform` is a
/// reference to the named transform registered with a reader, applied to
/// the raw cell before it reaches the queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub source_type: String,
    pub target_type: DataType,
    pub nullable: bool,
    pub default: Option<String>,
    pub transform: Option<String>,
}

/// A table's full shape plus post-CREATE metadata (§3 `TableSpec`). `oid`
/// starts `None` and is filled in exactly once, by the schema orchestrator's
/// prepare phase, right after the table is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSpec {
    pub schema: String,
    pub name: String,
    pub columns: Vec<ColumnSpec>,
    pub oid: Option<u32>,
}

impl TableSpec {
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn set_oid(&mut self, oid: u32) {
        self.oid = Some(oid);
    }
}

/// An index to be created as part of the completion phase (§3 `IndexSpec`,
/// GLOSSARY `Uniquify`). `name` may be rewritten once the owning table's
/// `oid` is known, to guarantee schema-wide uniqueness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSpec {
    pub name: String,
    pub table: String,
    pub primary: bool,
    pub unique: bool,
    /// `CREATE INDEX {name} ON ...` text captured from source metadata; the
    /// `{name}` placeholder is substituted with the (possibly oid-suffixed)
    /// final name at build time, after `uniquify` has run.
    pub sql: String,
    pub constraint_name: Option<String>,
}

impl IndexSpec {
    /// Apply the `uniquify` index-naming policy: suffix with the owning
    /// table's oid. No-op if called twice with the same oid.
    pub fn uniquify(&mut self, table_oid: u32) {
        let suffix = format!("_{table_oid}");
        if !self.name.ends_with(&suffix) {
            self.name.push_str(&suffix);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexNamePolicy {
    Uniquify,
    Preserve,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniquify_is_idempotent() {
        let mut idx = IndexSpec {
            name: "v_idx".into(),
            table: "t".into(),
            primary: false,
            unique: true,
            sql: String::new(),
            constraint_name: None,
        };
        idx.uniquify(1234);
        idx.uniquify(1234);
        assert_eq!(idx.name, "v_idx_1234");
    }
}
