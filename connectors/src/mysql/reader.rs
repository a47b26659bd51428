use crate::error::Error;
use crate::mysql::config::MySqlSourceConfig;
use crate::reader::{BoxEmitFuture, EmitControl, Reader};
use async_trait::async_trait;
use model::core::value::Value;
use model::progress::ProgressSink;
use model::row::Row;
use mysql_async::prelude::Queryable;
use mysql_async::{Pool, Row as MySqlRow};
use tracing::error;

/// Streams `SELECT col1, … FROM \`table\`` row by row (§4.4). Cell decoding
/// is best-effort: a column whose bytes don't decode cleanly under the
/// configured encoding becomes NULL rather than aborting the row, mirroring
/// the teacher's `EndOfInputInCharacter`/`CharacterDecodingError` handling
/// named in the spec.
pub struct MySqlReader {
    config: MySqlSourceConfig,
    pool: Pool,
}

impl MySqlReader {
    pub fn new(config: MySqlSourceConfig) -> Result<Self, Error> {
        let pool = Pool::from_url(&config.dsn).map_err(|e| Error::Connect(e.to_string()))?;
        Ok(Self { config, pool })
    }

    fn select_sql(&self) -> String {
        let cols = self
            .config
            .columns
            .iter()
            .map(|c| escape_identifier(c))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "SELECT {cols} FROM {}",
            escape_identifier(&self.config.table)
        )
    }

    fn cell_value(&self, raw: &mysql_async::Value, col: &str, stats: &dyn ProgressSink) -> Option<Value> {
        match raw {
            mysql_async::Value::NULL => None,
            mysql_async::Value::Bytes(bytes) => {
                let encoding = encoding_rs::Encoding::for_label(self.config.encoding.as_bytes())
                    .unwrap_or(encoding_rs::UTF_8);
                let (text, _, had_errors) = encoding.decode(bytes);
                if had_errors {
                    error!(
                        column = col,
                        encoding = %self.config.encoding,
                        "could not decode cell under configured encoding, substituting NULL"
                    );
                    stats.inc_errs(1);
                    return None;
                }
                Some(Value::String(text.into_owned()))
            }
            mysql_async::Value::Int(i) => Some(Value::Int(*i)),
            mysql_async::Value::UInt(u) => Some(Value::Uint(*u)),
            mysql_async::Value::Float(f) => Some(Value::Float(*f as f64)),
            mysql_async::Value::Double(d) => Some(Value::Float(*d)),
            mysql_async::Value::Date(year, month, day, hour, min, sec, micro) => {
                use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
                let date = NaiveDate::from_ymd_opt(*year as i32, *month as u32, *day as u32)?;
                let time = NaiveTime::from_hms_micro_opt(
                    *hour as u32,
                    *min as u32,
                    *sec as u32,
                    *micro,
                )?;
                Some(Value::TimestampNaive(NaiveDateTime::new(date, time)))
            }
            mysql_async::Value::Time(negative, days, hours, minutes, seconds, micros) => {
                let sign = if *negative { "-" } else { "" };
                Some(Value::String(format!(
                    "{sign}{}:{:02}:{:02}.{:06}",
                    *days as u64 * 24 + *hours as u64,
                    minutes,
                    seconds,
                    micros
                )))
            }
        }
    }
}

#[async_trait]
impl Reader for MySqlReader {
    fn columns(&self) -> &[String] {
        &self.config.columns
    }

    async fn map_rows(
        &mut self,
        stats: &dyn ProgressSink,
        emit: &mut (dyn FnMut(Row) -> BoxEmitFuture + Send),
    ) -> Result<(), Error> {
        let sql = self.select_sql();
        let mut conn = self.pool.get_conn().await.map_err(Error::from)?;

        let mut result = conn.query_iter(sql).await.map_err(Error::from)?;
        let columns = self.config.columns.clone();

        loop {
            let next_row: Option<MySqlRow> = result.next().await.map_err(Error::from)?;
            let mysql_row = match next_row {
                Some(r) => r,
                None => break,
            };

            let mut cells = Vec::with_capacity(columns.len());
            for (idx, col) in columns.iter().enumerate() {
                let raw = mysql_row.as_ref(idx).cloned().unwrap_or(mysql_async::Value::NULL);
                cells.push(self.cell_value(&raw, col, stats));
            }

            stats.inc_read(1);
            let row = Row::new(cells);
            let control = emit(row).await;
            if control == EmitControl::Cancel {
                return Ok(());
            }
        }

        Ok(())
    }
}

fn escape_identifier(name: &str) -> String {
    let escaped = name.replace('`', "``");
    format!("`{escaped}`")
}
