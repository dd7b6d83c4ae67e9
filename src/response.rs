use chrono::{DateTime, Duration, Utc};

use crate::filter::ContributionFilter;
use crate::model::Contribution;

/// Fallback when no qualifying comment exists: the contribution's whole
/// effective lifetime inside the window.
fn default_response<C: Contribution>(contribution: &C, window_end: DateTime<Utc>) -> Duration {
    match contribution.closed_at().filter(|_| contribution.is_closed()) {
        Some(closed_at) if closed_at < window_end => closed_at - contribution.created_at(),
        _ => window_end - contribution.created_at(),
    }
}

/// Comments past this point never count: close time for closed
/// contributions, the window end for open ones.
fn scan_bound<C: Contribution>(contribution: &C, window_end: DateTime<Utc>) -> DateTime<Utc> {
    if contribution.is_closed() {
        contribution.closed_at().unwrap_or(window_end)
    } else {
        window_end
    }
}

/// Time from creation to the first qualifying response.
///
/// Expects the comment list sorted ascending by update time. The scan stops
/// at the first comment beyond the close/window bound; such comments also
/// mean no later comment can count, so the default stands.
pub fn first_response_time<C: Contribution>(
    contribution: &C,
    window_end: DateTime<Utc>,
    filter: &ContributionFilter,
) -> Duration {
    let bound = scan_bound(contribution, window_end);
    for comment in contribution.comments() {
        if comment.created_at > bound {
            break;
        }
        if filter.is_qualifying_commenter(comment) {
            return comment.created_at - contribution.created_at();
        }
    }
    default_response(contribution, window_end)
}

/// Time from the latest qualifying response to the close/window bound
/// ("staleness").
///
/// Expects the comment list sorted descending by update time, so
/// out-of-bound comments are skipped rather than ending the scan; an
/// in-bound qualifying comment may still follow.
pub fn latest_response_time<C: Contribution>(
    contribution: &C,
    window_end: DateTime<Utc>,
    filter: &ContributionFilter,
) -> Duration {
    let bound = scan_bound(contribution, window_end);
    for comment in contribution.comments() {
        if comment.created_at > bound {
            continue;
        }
        if filter.is_qualifying_commenter(comment) {
            return bound - comment.created_at;
        }
    }
    default_response(contribution, window_end)
}
