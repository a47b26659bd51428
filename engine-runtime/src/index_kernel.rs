//! The index kernel (§4.6): a bounded pool of concurrent `CREATE INDEX`
//! jobs, sized by the caller to the maximum index fanout of any one table in
//! the run. Collects the UNIQUE indexes that built successfully so the
//! schema orchestrator's complete phase can promote them to PRIMARY KEYs.

use engine_core::retry::{open_session_with_retry, RetryPolicy};
use engine_core::stats::{Stats, StatsLabelHandle};
use futures_util::stream::{self, StreamExt};
use model::schema::{ConnectionSpec, IndexSpec};
use tracing::warn;

pub const LABEL: &str = "Create Indexes";

pub struct IndexBuildOutcome {
    pub succeeded: Vec<IndexSpec>,
    pub failed: Vec<(IndexSpec, connectors::error::Error)>,
}

impl IndexBuildOutcome {
    /// UNIQUE indexes among the succeeded builds, handed to the complete
    /// phase for PRIMARY KEY promotion (§4.7 Complete step 2).
    pub fn unique_indexes(&self) -> Vec<IndexSpec> {
        self.succeeded
            .iter()
            .filter(|i| i.unique)
            .cloned()
            .collect()
    }
}

/// Runs every index in `indexes` concurrently, capped at `max_concurrency`
/// in flight. Returns once every job has terminated, success or failure
/// (§4.6 contract); a failed build never aborts the run.
pub async fn build_indexes(
    target: &ConnectionSpec,
    indexes: Vec<IndexSpec>,
    max_concurrency: usize,
    stats: &Stats,
) -> IndexBuildOutcome {
    let _timer = stats.scoped_timer(LABEL);

    let results: Vec<(IndexSpec, Result<(), connectors::error::Error>)> = stream::iter(indexes)
        .map(|index| {
            let target = target.clone();
            let stats = stats.clone();
            async move {
                let result = build_one(&target, &index, &stats).await;
                (index, result)
            }
        })
        .buffer_unordered(max_concurrency.max(1))
        .collect()
        .await;

    let mut succeeded = Vec::new();
    let mut failed = Vec::new();
    for (index, result) in results {
        match result {
            Ok(()) => succeeded.push(index),
            Err(err) => {
                warn!(index = %index.name, %err, "index build failed, continuing run");
                failed.push((index, err));
            }
        }
    }
    IndexBuildOutcome { succeeded, failed }
}

async fn build_one(
    target: &ConnectionSpec,
    index: &IndexSpec,
    stats: &Stats,
) -> Result<(), connectors::error::Error> {
    let sink = StatsLabelHandle::new(stats.clone(), LABEL.to_string());
    let mut session = open_session_with_retry(target, &RetryPolicy::default()).await?;
    let sql = planner::ddl::create_index(index);
    session.exec_timed(LABEL, &sql, &sink).await
}
