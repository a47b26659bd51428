use crate::core::value::Value;
use serde::{Deserialize, Serialize};

/// An ordered sequence of nullable cell values, aligned to a fixed column
/// order (§3 `Row`). A `Row` never outlives the batch it is assembled into.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Row {
    pub cells: Vec<Option<Value>>,
}

impl Row {
    pub fn new(cells: Vec<Option<Value>>) -> Self {
        Self { cells }
    }

    pub fn null(column_count: usize) -> Self {
        Self {
            cells: vec![None; column_count],
        }
    }

    /// Render the row as one tab-separated COPY text line, without the
    /// trailing newline (the writer appends it once per row).
    pub fn to_copy_line(&self) -> String {
        let mut line = String::new();
        for (i, cell) in self.cells.iter().enumerate() {
            if i > 0 {
                line.push('\t');
            }
            match cell {
                Some(value) => line.push_str(&value.encode_copy_text()),
                None => line.push_str("\\N"),
            }
        }
        line
    }

    /// Rough byte size used for `batch-bytes` accounting; approximates the
    /// wire size of the rendered COPY line rather than re-rendering it.
    pub fn size_bytes(&self) -> usize {
        self.cells
            .iter()
            .map(|c| c.as_ref().map_or(2, |v| v.size_bytes()))
            .sum::<usize>()
            + self.cells.len() // tab/newline overhead, one byte per cell
    }
}

/// A contiguous group of rows loaded in a single transaction (§3 `Batch`,
/// GLOSSARY `Batch`). `start_ordinal` is the zero-based row-read ordinal
/// of `rows[0]`, used only for diagnostics when a batch is split or dropped.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    pub rows: Vec<Row>,
    pub start_ordinal: u64,
}

impl Batch {
    pub fn new(start_ordinal: u64) -> Self {
        Self {
            rows: Vec::new(),
            start_ordinal,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn byte_size(&self) -> usize {
        self.rows.iter().map(Row::size_bytes).sum()
    }

    /// Split a failed batch into two halves for re-attempt (§4.3). Halving
    /// keeps the worst case at O(log2(n)) COPY attempts rather than
    /// one-row-at-a-time; see SPEC_FULL.md §4.3.
    pub fn split(self) -> (Batch, Batch) {
        let mid = self.rows.len() / 2;
        let start_ordinal = self.start_ordinal;
        let mut rows = self.rows;
        let second_rows = rows.split_off(mid);
        let first = Batch {
            rows,
            start_ordinal,
        };
        let second = Batch {
            start_ordinal: start_ordinal + mid as u64,
            rows: second_rows,
        };
        (first, second)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::value::Value;

    #[test]
    fn null_row_renders_all_backslash_n() {
        let row = Row::null(3);
        assert_eq!(row.to_copy_line(), "\\N\t\\N\t\\N");
    }

    #[test]
    fn mixed_row_renders_tab_separated() {
        let row = Row::new(vec![
            Some(Value::Int(1)),
            Some(Value::String("ALICE".into())),
            None,
        ]);
        assert_eq!(row.to_copy_line(), "1\tALICE\t\\N");
    }

    #[test]
    fn split_divides_in_half_preserving_order() {
        let mut batch = Batch::new(10);
        for i in 0..5 {
            batch.rows.push(Row::new(vec![Some(Value::Int(i))]));
        }
        let (first, second) = batch.split();
        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 3);
        assert_eq!(first.start_ordinal, 10);
        assert_eq!(second.start_ordinal, 12);
    }
}
