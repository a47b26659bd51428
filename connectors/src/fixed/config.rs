use serde::{Deserialize, Serialize};
use tracing::debug;

/// One `{name, start, length}` triple from the table's `[[tables.columns]]`
/// entries (§4.4). `start` and `length` are byte offsets into the raw line,
/// not UTF-8 aware — encoding is applied to the whole line before slicing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub start: usize,
    pub length: usize,
}

/// Fixed-width reader configuration (§4.4, §6).
///
/// `skip_lines`/`skip_line` is a documented naming inconsistency in the
/// source configuration: the singular `skip-line` key predates `skip-lines`
/// and some configs still carry it. Both are accepted; if both are present
/// `skip_lines` wins (§9 Open Question b).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixedWidthConfig {
    pub encoding: String,
    #[serde(default)]
    pub skip_lines: Option<usize>,
    #[serde(default)]
    pub skip_line: Option<usize>,
    pub fields: Vec<FieldSpec>,
}

impl FixedWidthConfig {
    /// Resolves the two possible skip-line keys into one count, logging when
    /// both are present so the fallback isn't silent.
    pub fn resolved_skip_lines(&self) -> usize {
        match (self.skip_lines, self.skip_line) {
            (Some(n), Some(_)) => {
                debug!(
                    skip_lines = n,
                    "both skip_lines and skip_line set, skip_lines wins"
                );
                n
            }
            (Some(n), None) => n,
            (None, Some(n)) => n,
            (None, None) => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_lines_wins_when_both_present() {
        let cfg = FixedWidthConfig {
            encoding: "utf-8".into(),
            skip_lines: Some(2),
            skip_line: Some(1),
            fields: vec![],
        };
        assert_eq!(cfg.resolved_skip_lines(), 2);
    }

    #[test]
    fn singular_key_used_as_fallback() {
        let cfg = FixedWidthConfig {
            encoding: "utf-8".into(),
            skip_lines: None,
            skip_line: Some(3),
            fields: vec![],
        };
        assert_eq!(cfg.resolved_skip_lines(), 3);
    }

    #[test]
    fn defaults_to_zero() {
        let cfg = FixedWidthConfig {
            encoding: "utf-8".into(),
            skip_lines: None,
            skip_line: None,
            fields: vec![],
        };
        assert_eq!(cfg.resolved_skip_lines(), 0);
    }
}
