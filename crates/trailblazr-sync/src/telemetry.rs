//! Pipeline counters, emitted through the `metrics` facade.
//!
//! Nothing here installs a recorder. Without one the calls are no-ops.

use trailblazr_core::SubmissionError;

pub const PROBE_TOTAL: &str = "trailblazr_probe_total";
pub const FETCH_TOTAL: &str = "trailblazr_fetch_total";
pub const ROWS_SKIPPED_TOTAL: &str = "trailblazr_rows_skipped_total";
pub const SUBMISSION_TOTAL: &str = "trailblazr_submission_total";

pub(crate) fn probe(ok: bool) {
    metrics::counter!(PROBE_TOTAL, "outcome" => if ok { "ok" } else { "unreachable" }).increment(1);
}

pub(crate) fn fetch(ok: bool) {
    metrics::counter!(FETCH_TOTAL, "outcome" => if ok { "ok" } else { "error" }).increment(1);
}

pub(crate) fn rows_skipped(count: u64) {
    if count > 0 {
        metrics::counter!(ROWS_SKIPPED_TOTAL).increment(count);
    }
}

pub(crate) fn submission(result: &Result<(), SubmissionError>) {
    metrics::counter!(SUBMISSION_TOTAL, "outcome" => submission_outcome(result)).increment(1);
}

/// Label value for a submission result.
pub fn submission_outcome(result: &Result<(), SubmissionError>) -> &'static str {
    match result {
        Ok(()) => "ok",
        Err(SubmissionError::NoRouteSelected) => "no_route_selected",
        Err(SubmissionError::InvalidRating { .. }) => "invalid_rating",
        Err(SubmissionError::RouteNotFound { .. }) => "route_not_found",
        Err(SubmissionError::AmbiguousUpdate { .. }) => "ambiguous_update",
        Err(SubmissionError::SubmissionInProgress) => "in_progress",
        Err(SubmissionError::CatalogNotReady { .. }) => "not_ready",
        Err(SubmissionError::Store(_)) => "store_error",
    }
}
