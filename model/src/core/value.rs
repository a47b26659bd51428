use crate::core::data_type::DataType;
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single cell value as handed from a reader to the writer.
///
/// `Value` never appears bare in a `Row` — cells are always `Option<Value>`,
/// with `None` meaning SQL NULL (see [`crate::row::Row`]).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Value {
    SmallInt(i16),
    Int(i64),
    Uint(u64),
    Float(f64),
    Decimal(BigDecimal),
    String(String),
    Boolean(bool),
    Json(serde_json::Value),
    Uuid(Uuid),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
    TimestampNaive(NaiveDateTime),
}

impl Value {
    pub fn data_type(&self) -> DataType {
        match self {
            Value::SmallInt(_) => DataType::Short,
            Value::Int(_) => DataType::Int,
            Value::Uint(_) => DataType::IntUnsigned,
            Value::Float(_) => DataType::Float,
            Value::Decimal(_) => DataType::Decimal,
            Value::String(_) => DataType::String,
            Value::Boolean(_) => DataType::Boolean,
            Value::Json(_) => DataType::Json,
            Value::Uuid(_) => DataType::VarChar,
            Value::Bytes(_) => DataType::Bytea,
            Value::Date(_) => DataType::Date,
            Value::Timestamp(_) | Value::TimestampNaive(_) => DataType::Timestamp,
        }
    }

    pub fn size_bytes(&self) -> usize {
        match self {
            Value::SmallInt(_) => 2,
            Value::Int(_) => 8,
            Value::Uint(_) => 8,
            Value::Float(_) => 8,
            Value::Decimal(v) => v.to_string().len(),
            Value::String(s) => s.len(),
            Value::Boolean(_) => 1,
            Value::Json(v) => serde_json::to_string(v).map_or(0, |s| s.len()),
            Value::Uuid(_) => 16,
            Value::Bytes(b) => b.len(),
            Value::Date(_) => std::mem::size_of::<NaiveDate>(),
            Value::Timestamp(_) => std::mem::size_of::<DateTime<Utc>>(),
            Value::TimestampNaive(_) => std::mem::size_of::<NaiveDateTime>(),
        }
    }

    /// Render the value as PostgreSQL `COPY ... (FORMAT text)` expects it:
    /// the raw field text with `\`, `\t`, `\n`, `\r` backslash-escaped.
    /// NULL is handled by the caller (`\N` never comes from a `Value`).
    pub fn encode_copy_text(&self) -> String {
        let raw = match self {
            Value::SmallInt(v) => v.to_string(),
            Value::Int(v) => v.to_string(),
            Value::Uint(v) => v.to_string(),
            Value::Float(v) => v.to_string(),
            Value::Decimal(v) => v.to_string(),
            Value::String(v) => v.clone(),
            Value::Boolean(v) => v.to_string(),
            Value::Json(v) => v.to_string(),
            Value::Uuid(v) => v.to_string(),
            Value::Bytes(v) => format!("\\x{}", hex_encode(v)),
            Value::Date(v) => v.to_string(),
            Value::Timestamp(v) => v.to_rfc3339(),
            Value::TimestampNaive(v) => v.to_string(),
        };
        escape_copy_text(&raw)
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Backslash-escape the four characters PostgreSQL's text COPY format
/// treats specially. Order matters: `\\` must be escaped first so the
/// escapes introduced for the other three characters are not themselves
/// re-escaped.
pub fn escape_copy_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_tab_newline_cr_and_backslash() {
        assert_eq!(escape_copy_text("a\tb\nc\rd\\e"), "a\\tb\\nc\\rd\\\\e");
    }

    #[test]
    fn plain_text_is_untouched() {
        assert_eq!(escape_copy_text("ALICE"), "ALICE");
    }

    #[test]
    fn bytes_render_as_hex_literal() {
        let v = Value::Bytes(vec![0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(v.encode_copy_text(), "\\\\xdeadbeef");
    }
}
