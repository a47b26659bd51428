//! The schema orchestrator (§4.7, §2 item 7): prepare-before-load and
//! complete-after-load phases bracketing the per-table pipelines. Grounded
//! on the teacher's `engine-core/src/schema/plan.rs` execution ordering,
//! rebuilt here against `planner`'s plain-SQL builders instead of an AST.

use connectors::postgres::session::PgSession;
use engine_core::error::MigrationError;
use engine_core::retry::{open_session_with_retry, RetryPolicy};
use engine_core::stats::Stats;
use futures_util::StreamExt;
use model::schema::{ConnectionSpec, IndexSpec, TableSpec};
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct ForeignKeySpec {
    pub table_schema: String,
    pub table_name: String,
    pub constraint_name: String,
    pub columns: Vec<String>,
    pub ref_schema: String,
    pub ref_table: String,
    pub ref_columns: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct PrepareOptions {
    pub include_drop: bool,
    pub data_only: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct CompleteOptions {
    pub reset_sequences: bool,
    pub data_only: bool,
}

/// Prepare phase (§4.7): drop FKs (if requested), then drop/create tables,
/// then stamp each `TableSpec.oid` from the just-created relation. Runs as
/// one transaction; any failure is fatal for the run.
pub async fn prepare(
    target: &ConnectionSpec,
    tables: &mut [TableSpec],
    foreign_keys: &[ForeignKeySpec],
    options: PrepareOptions,
    stats: &Stats,
) -> Result<(), MigrationError> {
    let _timer = stats.scoped_timer("Prepare Schema");
    let mut session = open_session_with_retry(target, &RetryPolicy::default())
        .await
        .map_err(|e| MigrationError::schema("prepare:connect", e))?;

    session
        .begin()
        .await
        .map_err(|e| MigrationError::schema("prepare:begin", e))?;

    let result = run_prepare_body(&mut session, tables, foreign_keys, options, stats).await;

    match result {
        Ok(()) => session
            .commit()
            .await
            .map_err(|e| MigrationError::schema("prepare:commit", e)),
        Err(err) => {
            let _ = session.rollback().await;
            Err(err)
        }
    }
}

async fn run_prepare_body(
    session: &mut PgSession,
    tables: &mut [TableSpec],
    foreign_keys: &[ForeignKeySpec],
    options: PrepareOptions,
    stats: &Stats,
) -> Result<(), MigrationError> {
    let sink = engine_core::stats::StatsLabelHandle::new(stats.clone(), "Prepare Schema");

    if options.include_drop {
        for fk in foreign_keys {
            let sql = planner::ddl::drop_foreign_key(
                &find_table(tables, &fk.table_schema, &fk.table_name)?,
                &fk.constraint_name,
            );
            session
                .exec_timed("Prepare Schema", &sql, &sink)
                .await
                .map_err(|e| MigrationError::schema("prepare:drop_fk", e))?;
        }
    }

    if !options.data_only {
        for table in tables.iter() {
            if options.include_drop {
                let sql = planner::ddl::drop_table(table, true);
                session
                    .exec_timed("Prepare Schema", &sql, &sink)
                    .await
                    .map_err(|e| MigrationError::schema("prepare:drop_table", e))?;
            }
        }
        for table in tables.iter() {
            let sql = planner::ddl::create_table(table);
            session
                .exec_timed("Prepare Schema", &sql, &sink)
                .await
                .map_err(|e| MigrationError::schema("prepare:create_table", e))?;
        }
    }

    for table in tables.iter_mut() {
        let oid = fetch_table_oid(session, table)
            .await
            .map_err(|e| MigrationError::schema("prepare:oid", e))?;
        table.set_oid(oid);
        info!(table = %table.qualified_name(), oid, "table oid assigned");
    }

    Ok(())
}

fn find_table(tables: &[TableSpec], schema: &str, name: &str) -> Result<TableSpec, MigrationError> {
    tables
        .iter()
        .find(|t| t.schema == schema && t.name == name)
        .cloned()
        .ok_or_else(|| MigrationError::Config(format!("unknown table {schema}.{name}")))
}

async fn fetch_table_oid(
    session: &PgSession,
    table: &TableSpec,
) -> Result<u32, connectors::error::Error> {
    let row = session
        .client()
        .query_one(
            "SELECT c.oid FROM pg_class c JOIN pg_namespace n ON n.oid = c.relnamespace \
             WHERE n.nspname = $1 AND c.relname = $2",
            &[&table.schema, &table.name],
        )
        .await?;
    let oid: u32 = row.get(0);
    Ok(oid)
}

/// Complete phase (§4.7): sequence reset, PK promotion, FK addition, table
/// comments. Each sub-step is timed and reported under its own label; a
/// `Database` error on any one statement (§7 `DatabaseError`) is
/// per-statement non-fatal — it is logged and counted against that
/// sub-step's label, and both the rest of that sub-step's loop and every
/// later sub-step still run.
pub async fn complete(
    target: &ConnectionSpec,
    tables: &[TableSpec],
    unique_indexes: &[IndexSpec],
    foreign_keys: &[ForeignKeySpec],
    comments: &[(String, String)],
    options: CompleteOptions,
    stats: &Stats,
) -> Result<(), MigrationError> {
    let mut session = open_session_with_retry(target, &RetryPolicy::default())
        .await
        .map_err(|e| MigrationError::schema("complete:connect", e))?;

    if options.reset_sequences {
        reset_sequences(&mut session, tables, stats).await?;
    }

    promote_primary_keys(&mut session, tables, unique_indexes, stats).await?;

    if !options.data_only {
        add_foreign_keys(&mut session, tables, foreign_keys, stats).await?;
    }

    apply_comments(&mut session, tables, comments, stats).await?;

    Ok(())
}

/// Drains whatever `NOTIFY channel` payloads have already arrived on
/// `session`'s connection without blocking past `budget`, summing any that
/// parse as an integer count. Used right after a statement that issues
/// `pg_notify` so the notification it produced is picked up before moving
/// on to the next table (§4.7.1).
async fn drain_notification_count(session: &PgSession, budget: Duration) -> u64 {
    let mut stream = session.notifications();
    let mut total = 0u64;
    loop {
        match tokio::time::timeout(budget, stream.next()).await {
            Ok(Some(Ok(note))) => {
                if let Ok(n) = note.payload().parse::<u64>() {
                    total += n;
                }
            }
            _ => break,
        }
    }
    total
}

async fn reset_sequences(
    session: &mut PgSession,
    tables: &[TableSpec],
    stats: &Stats,
) -> Result<(), MigrationError> {
    let _timer = stats.scoped_timer("Reset Sequences");
    let sink = engine_core::stats::StatsLabelHandle::new(stats.clone(), "Reset Sequences");

    session
        .exec_timed("Reset Sequences", "LISTEN seqs", &sink)
        .await
        .map_err(|e| MigrationError::schema("complete:listen_seqs", e))?;

    let mut touched_total = 0u64;
    for table in tables {
        let sql = planner::sequence_reset::reset_sequences_block(table);
        match session.exec_timed("Reset Sequences", &sql, &sink).await {
            Ok(()) => {
                touched_total += drain_notification_count(session, Duration::from_millis(50)).await;
            }
            Err(err) => {
                warn!(table = %table.qualified_name(), %err, "sequence reset failed for table, continuing");
            }
        }
    }
    info!(sequences_touched = touched_total, "sequence reset notifications recorded");
    Ok(())
}

async fn promote_primary_keys(
    session: &mut PgSession,
    tables: &[TableSpec],
    unique_indexes: &[IndexSpec],
    stats: &Stats,
) -> Result<(), MigrationError> {
    let _timer = stats.scoped_timer("Primary Keys");
    let sink = engine_core::stats::StatsLabelHandle::new(stats.clone(), "Primary Keys");
    for index in unique_indexes.iter().filter(|i| i.primary) {
        let Some(table) = tables.iter().find(|t| t.qualified_name() == index.table) else {
            warn!(index = %index.name, "primary key index references unknown table, skipping");
            continue;
        };
        let sql = planner::ddl::add_primary_key_using_index(table, index);
        if let Err(err) = session.exec_timed("Primary Keys", &sql, &sink).await {
            warn!(index = %index.name, %err, "primary key promotion failed, continuing");
        }
    }
    Ok(())
}

async fn add_foreign_keys(
    session: &mut PgSession,
    tables: &[TableSpec],
    foreign_keys: &[ForeignKeySpec],
    stats: &Stats,
) -> Result<(), MigrationError> {
    let _timer = stats.scoped_timer("Foreign Keys");
    let sink = engine_core::stats::StatsLabelHandle::new(stats.clone(), "Foreign Keys");
    for fk in foreign_keys {
        let Some(table) = tables
            .iter()
            .find(|t| t.schema == fk.table_schema && t.name == fk.table_name)
        else {
            warn!(constraint = %fk.constraint_name, "foreign key references unknown table, skipping");
            continue;
        };
        let sql = planner::ddl::add_foreign_key(
            table,
            &fk.constraint_name,
            &fk.columns,
            &fk.ref_schema,
            &fk.ref_table,
            &fk.ref_columns,
        );
        if let Err(err) = session.exec_timed("Foreign Keys", &sql, &sink).await {
            warn!(constraint = %fk.constraint_name, %err, "foreign key addition failed, continuing");
        }
    }
    Ok(())
}

async fn apply_comments(
    session: &mut PgSession,
    tables: &[TableSpec],
    comments: &[(String, String)],
    stats: &Stats,
) -> Result<(), MigrationError> {
    let _timer = stats.scoped_timer("Comments");
    let sink = engine_core::stats::StatsLabelHandle::new(stats.clone(), "Comments");
    for (qualified_name, comment) in comments {
        let Some(table) = tables.iter().find(|t| &t.qualified_name() == qualified_name) else {
            warn!(table = %qualified_name, "comment references unknown table, skipping");
            continue;
        };
        let sql = planner::ddl::comment_on_table(table, comment);
        if let Err(err) = session.exec_timed("Comments", &sql, &sink).await {
            warn!(table = %qualified_name, %err, "comment application failed, continuing");
        }
    }
    Ok(())
}
