/// The narrow counter-increment surface a reader or writer needs during a
/// run, without depending on the concrete `Stats` collector (which lives in
/// `engine-core`, a crate downstream of `model`). `engine-core::stats::Stats`
/// implements this for a given label handle (§4.1, §4.4 "the reader
/// increments `read`/`errs`").
pub trait ProgressSink: Send + Sync {
    /// One row was handed to the consumer, regardless of whether it was
    /// ultimately accepted.
    fn inc_read(&self, n: u64);
    /// `n` rows were durably accepted by the target. Owned exclusively by
    /// the writer side of a pipeline (§3 "`rows` is the count of rows
    /// accepted by PostgreSQL") — a reader must never call this, or a row
    /// that is later rejected by the writer would be double-counted.
    fn inc_rows(&self, n: u64);
    /// A recoverable error was absorbed for this label.
    fn inc_errs(&self, n: u64);
}

/// A sink that discards everything; useful for tests and standalone tools
/// that don't need a full `Stats` collector.
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn inc_read(&self, _n: u64) {}
    fn inc_rows(&self, _n: u64) {}
    fn inc_errs(&self, _n: u64) {}
}
