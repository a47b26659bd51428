//! Source/target column type taxonomy and the type-cast tables used when
//! materializing a target schema from a source's metadata.
//!
//! The dialect-specific cast *tables* themselves are the out-of-scope
//! collaborator named in the purpose & scope section; this module only
//! carries the shared vocabulary both dialects render through.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::{borrow::Cow, collections::HashMap, fmt};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum DataType {
    Decimal,
    Short,
    ShortUnsigned,
    Long,
    Float,
    Double,
    Boolean,
    Null,
    Date,
    Timestamp,
    LongLong,
    Int,
    IntUnsigned,
    Time,
    Year,
    VarChar,
    Bit,
    Json,
    Enum,
    TinyBlob,
    MediumBlob,
    LongBlob,
    Blob,
    Binary,
    VarBinary,
    Bytea,
    String,
    Array(Option<String>),
    Char,
    Custom(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlDialect {
    MySql,
    Postgres,
}

lazy_static! {
    static ref MYSQL_TYPE_MAP: HashMap<&'static str, DataType> = build_mysql_type_map();
    static ref POSTGRES_TYPE_MAP: HashMap<&'static str, DataType> = build_postgres_type_map();
}

impl DataType {
    pub fn from_mysql_type(type_name: &str) -> Result<Self, String> {
        let normalized = Self::normalize_type_name(type_name);
        MYSQL_TYPE_MAP
            .get(normalized.as_str())
            .cloned()
            .ok_or_else(|| format!("Unknown MySQL column type: {type_name}"))
    }

    pub fn from_postgres_type(type_name: &str) -> Result<Self, String> {
        let normalized = Self::normalize_type_name(type_name);
        POSTGRES_TYPE_MAP
            .get(normalized.as_str())
            .cloned()
            .ok_or_else(|| format!("Unknown Postgres column type: {type_name}"))
    }

    /// Render the type the way it should appear inside a `CREATE TABLE` on
    /// the Postgres target, regardless of which dialect it came from.
    pub fn postgres_name(&self) -> Cow<'_, str> {
        match self {
            DataType::Decimal => Cow::Borrowed("NUMERIC"),
            DataType::Short | DataType::ShortUnsigned => Cow::Borrowed("SMALLINT"),
            DataType::Long | DataType::LongLong => Cow::Borrowed("BIGINT"),
            DataType::Int | DataType::IntUnsigned => Cow::Borrowed("INTEGER"),
            DataType::Float => Cow::Borrowed("REAL"),
            DataType::Double => Cow::Borrowed("DOUBLE PRECISION"),
            DataType::Boolean => Cow::Borrowed("BOOLEAN"),
            DataType::Null => Cow::Borrowed("TEXT"),
            DataType::Timestamp => Cow::Borrowed("TIMESTAMP"),
            DataType::Date => Cow::Borrowed("DATE"),
            DataType::Time => Cow::Borrowed("TIME"),
            DataType::Year => Cow::Borrowed("INTEGER"),
            DataType::VarChar => Cow::Borrowed("VARCHAR"),
            DataType::Char => Cow::Borrowed("CHAR"),
            DataType::String => Cow::Borrowed("TEXT"),
            DataType::Bit => Cow::Borrowed("BIT"),
            DataType::Json => Cow::Borrowed("JSONB"),
            DataType::Enum => Cow::Borrowed("TEXT"),
            DataType::Array(Some(name)) => Cow::Owned(name.clone()),
            DataType::Array(None) => Cow::Borrowed("TEXT[]"),
            DataType::TinyBlob
            | DataType::MediumBlob
            | DataType::LongBlob
            | DataType::Blob
            | DataType::Binary
            | DataType::VarBinary
            | DataType::Bytea => Cow::Borrowed("BYTEA"),
            DataType::Custom(name) => Cow::Borrowed(name),
        }
    }

    fn normalize_type_name(type_name: &str) -> String {
        type_name.trim().to_uppercase()
    }
}

impl TryFrom<&str> for DataType {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::from_mysql_type(s)
            .or_else(|_| Self::from_postgres_type(s))
            .or(Ok(DataType::Custom(s.to_string())))
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.postgres_name())
    }
}

fn build_mysql_type_map() -> HashMap<&'static str, DataType> {
    use DataType::*;

    let entries = [
        ("BOOLEAN", Boolean),
        ("BOOL", Boolean),
        ("TINYINT", Short),
        ("SMALLINT", Short),
        ("TINYINT UNSIGNED", ShortUnsigned),
        ("SMALLINT UNSIGNED", ShortUnsigned),
        ("MEDIUMINT", Int),
        ("MEDIUMINT UNSIGNED", IntUnsigned),
        ("INT", Int),
        ("INTEGER", Int),
        ("INT UNSIGNED", Long),
        ("INTEGER UNSIGNED", Long),
        ("BIGINT", Long),
        ("BIGINT UNSIGNED", LongLong),
        ("FLOAT", Float),
        ("DOUBLE", Double),
        ("DOUBLE PRECISION", Double),
        ("DECIMAL", Decimal),
        ("NUMERIC", Decimal),
        ("NULL", Null),
        ("TIMESTAMP", Timestamp),
        ("DATETIME", Timestamp),
        ("DATE", Date),
        ("TIME", Time),
        ("YEAR", Year),
        ("BIT", Bit),
        ("ENUM", Enum),
        ("JSON", Json),
        ("CHAR", Char),
        ("CHARACTER", Char),
        ("VARCHAR", VarChar),
        ("CHARACTER VARYING", VarChar),
        ("TEXT", String),
        ("TINYTEXT", String),
        ("MEDIUMTEXT", String),
        ("LONGTEXT", String),
        ("BINARY", Binary),
        ("VARBINARY", VarBinary),
        ("TINYBLOB", TinyBlob),
        ("BLOB", Blob),
        ("MEDIUMBLOB", MediumBlob),
        ("LONGBLOB", LongBlob),
    ];

    entries.into_iter().collect()
}

fn build_postgres_type_map() -> HashMap<&'static str, DataType> {
    use DataType::*;

    let entries = [
        ("BOOLEAN", Boolean),
        ("BOOL", Boolean),
        ("SMALLINT", Short),
        ("INT2", Short),
        ("INTEGER", Int),
        ("INT", Int),
        ("INT4", Int),
        ("INT8", Long),
        ("BIGINT", Long),
        ("FLOAT4", Float),
        ("REAL", Float),
        ("FLOAT8", Double),
        ("DOUBLE PRECISION", Double),
        ("NUMERIC", Decimal),
        ("DECIMAL", Decimal),
        ("JSONB", Json),
        ("JSON", Json),
        ("TEXT", String),
        ("NAME", String),
        ("CHARACTER VARYING", VarChar),
        ("VARCHAR", VarChar),
        ("CHARACTER", Char),
        ("CHAR", Char),
        ("BPCHAR", Char),
        ("BYTEA", Bytea),
        ("BIT", Bit),
        ("DATE", Date),
        ("TIME", Time),
        ("TIMESTAMP", Timestamp),
        ("TIMESTAMP WITHOUT TIME ZONE", Timestamp),
        ("TIMESTAMPTZ", Timestamp),
    ];

    entries.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mysql_unsigned_int_widens_to_bigint() {
        assert_eq!(
            DataType::from_mysql_type("INT UNSIGNED").unwrap(),
            DataType::Long
        );
    }

    #[test]
    fn postgres_name_renders_bytea_family_uniformly() {
        assert_eq!(DataType::LongBlob.postgres_name(), "BYTEA");
        assert_eq!(DataType::VarBinary.postgres_name(), "BYTEA");
    }

    #[test]
    fn unknown_type_falls_back_to_custom() {
        let dt = DataType::try_from("GEOMETRY").unwrap();
        assert_eq!(dt, DataType::Custom("GEOMETRY".to_string()));
    }
}
