use std::fmt::Debug;

/// A trait for report payloads pushed to the collector
pub trait Report: Clone + Send + Sync + Debug + 'static {}

// Implement for any type that meets the requirements
impl<T> Report for T where T: Clone + Send + Sync + Debug + 'static {}

/// Trait for collaborators that produce usage reports on demand.
///
/// `snapshot` is called on the reporter's scheduling task every sample
/// period, so it must be a fast in-memory read: a slow snapshot stalls
/// every other timed action behind it.
pub trait ReportSource: Send + Sync + 'static {
    /// The type of report this source produces
    type Report: Report;

    /// Take a snapshot of the current usage state.
    ///
    /// Returns `None` when there is nothing new to report; the sample
    /// timer still fires again after one full period.
    fn snapshot(&self) -> Option<Self::Report>;

    /// Get the source name
    fn name(&self) -> &str;
}
