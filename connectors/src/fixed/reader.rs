use crate::error::Error;
use crate::fixed::config::FixedWidthConfig;
use crate::fixed::source::{decode_line, FixedSource};
use crate::reader::{EmitControl, Reader};
use async_trait::async_trait;
use model::core::value::Value;
use model::progress::ProgressSink;
use model::row::Row;
use std::io::BufRead;
use tracing::error;

/// Reads fixed-width text lines and slices each into columns by
/// `{name, start, length}` (§4.4). Every emitted row is a plain
/// `Value::String` per cell; target-type coercion happens downstream in the
/// writer, consistent with the teacher's source-side readers handing the
/// pipeline untyped text and letting the sink coerce (`sql/base/encoder.rs`).
pub struct FixedWidthReader {
    config: FixedWidthConfig,
    source: FixedSource,
    columns: Vec<String>,
}

impl FixedWidthReader {
    pub fn new(source: FixedSource, config: FixedWidthConfig) -> Self {
        let columns = config.fields.iter().map(|f| f.name.clone()).collect();
        Self {
            config,
            source,
            columns,
        }
    }

    /// Ragged-right substring extraction (§4.4 B2): a field starting past
    /// the end of the line is NULL; a field whose declared range runs past
    /// the end of the line is truncated to whatever suffix remains.
    fn slice_field(line: &str, start: usize, length: usize) -> Option<String> {
        let bytes = line.as_bytes();
        if start >= bytes.len() {
            return None;
        }
        let end = (start + length).min(bytes.len());
        // Fixed-width sources are assumed single-byte-per-char after
        // decoding; a multi-byte cut here would already have surfaced as a
        // decode error upstream.
        std::str::from_utf8(&bytes[start..end])
            .ok()
            .map(|s| s.trim_end().to_string())
    }
}

#[async_trait]
impl Reader for FixedWidthReader {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    async fn map_rows(
        &mut self,
        stats: &dyn ProgressSink,
        emit: &mut (dyn FnMut(Row) -> crate::reader::BoxEmitFuture + Send),
    ) -> Result<(), Error> {
        let skip = self.config.resolved_skip_lines();
        let readers = self.source.open_readers()?;

        for mut reader in readers {
            let mut raw_line = Vec::new();
            let mut line_no = 0usize;
            loop {
                raw_line.clear();
                let read = reader.read_until(b'\n', &mut raw_line)?;
                if read == 0 {
                    break;
                }
                line_no += 1;
                if line_no <= skip {
                    continue;
                }
                while matches!(raw_line.last(), Some(b'\n') | Some(b'\r')) {
                    raw_line.pop();
                }

                let (line, had_decode_errors) = decode_line(&raw_line, &self.config.encoding);
                if had_decode_errors {
                    error!(line_no, "fixed-width line had undecodable bytes, nulling row");
                    stats.inc_errs(1);
                }

                let mut cells = Vec::with_capacity(self.config.fields.len());
                for field in &self.config.fields {
                    if had_decode_errors {
                        cells.push(None);
                        continue;
                    }
                    let cell = Self::slice_field(&line, field.start, field.length);
                    cells.push(cell.filter(|s| !s.is_empty()).map(Value::String));
                }

                stats.inc_read(1);
                let row = Row::new(cells);
                let control = emit(row).await;
                if control == EmitControl::Cancel {
                    return Ok(());
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slices_field_within_line() {
        assert_eq!(
            FixedWidthReader::slice_field("ALICE     30", 0, 10),
            Some("ALICE".to_string())
        );
    }

    #[test]
    fn field_past_end_of_line_is_null() {
        assert_eq!(FixedWidthReader::slice_field("AB", 5, 3), None);
    }

    #[test]
    fn ragged_right_line_takes_available_suffix() {
        assert_eq!(
            FixedWidthReader::slice_field("ABCDE", 3, 10),
            Some("DE".to_string())
        );
    }
}
