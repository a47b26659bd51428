use crate::error::Error;
use crate::postgres::session::PgSession;
use bytes::Bytes;
use futures_util::{pin_mut, SinkExt};
use model::row::Batch;
use tracing::debug;

/// Quotes a single identifier for safe interpolation into DDL/DML text.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// One attempt at streaming `batch` into `table` over `COPY … FROM STDIN`,
/// inside its own transaction (§4.3 Per-batch protocol). On any failure the
/// transaction is rolled back and the error returned untouched; splitting
/// and retrying a failed batch is the caller's responsibility (the pipeline
/// runtime's writer owns that policy, §4.3 Failure handling).
pub async fn copy_batch(
    session: &mut PgSession,
    table: &str,
    columns: &[String],
    batch: &Batch,
) -> Result<u64, Error> {
    if batch.is_empty() {
        return Ok(0);
    }

    session.begin().await?;

    let column_list = columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");
    let statement = format!("COPY {table} ({column_list}) FROM STDIN");
    debug!(%statement, rows = batch.len(), "starting COPY");

    let result = stream_rows(session, &statement, batch).await;

    match result {
        Ok(rows) => match session.commit().await {
            Ok(()) => Ok(rows),
            Err(err) => {
                let _ = session.rollback().await;
                Err(err)
            }
        },
        Err(err) => {
            let _ = session.rollback().await;
            Err(err)
        }
    }
}

async fn stream_rows(
    session: &mut PgSession,
    statement: &str,
    batch: &Batch,
) -> Result<u64, Error> {
    let sink = session.client().copy_in(statement).await?;
    pin_mut!(sink);

    for row in &batch.rows {
        let mut line = row.to_copy_line();
        line.push('\n');
        sink.as_mut().send(Bytes::from(line)).await?;
    }

    sink.as_mut().close().await?;
    Ok(batch.len() as u64)
}
