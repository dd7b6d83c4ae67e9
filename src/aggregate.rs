use std::future::Future;

use anyhow::Result;
use chrono::Duration;

use crate::filter::ContributionFilter;
use crate::model::Contribution;

/// One page of search results as handed over by the transport layer.
/// Termination is driven by `has_next_page` alone; an empty first page is a
/// valid zero-result terminal state, not a signal to keep fetching.
#[derive(Debug, Default)]
pub struct FetchedPage<C> {
    pub records: Vec<C>,
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

/// Drive `fetch` to exhaustion, keeping every record the filter accepts
/// together with its derived duration.
///
/// `fetch` is the injected page function (`cursor -> page`); this driver
/// issues no network calls of its own. Any fetch failure aborts the whole
/// run and discards what was accumulated so far.
pub async fn collect_records<C, F, Fut, D>(
    mut fetch: F,
    filter: &ContributionFilter,
    derive: D,
) -> Result<Vec<(C, Duration)>>
where
    C: Contribution,
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<FetchedPage<C>>>,
    D: Fn(&C) -> Duration,
{
    let mut out = Vec::new();
    let mut cursor = None;
    loop {
        let page = fetch(cursor.take()).await?;
        for record in page.records {
            if !filter.accepts(&record) {
                continue;
            }
            let duration = derive(&record);
            out.push((record, duration));
        }
        if !page.has_next_page {
            break;
        }
        cursor = page.end_cursor;
    }
    Ok(out)
}

/// Like [`collect_records`] but keeps only the derived durations.
pub async fn collect_durations<C, F, Fut, D>(
    fetch: F,
    filter: &ContributionFilter,
    derive: D,
) -> Result<Vec<Duration>>
where
    C: Contribution,
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<FetchedPage<C>>>,
    D: Fn(&C) -> Duration,
{
    Ok(collect_records(fetch, filter, derive)
        .await?
        .into_iter()
        .map(|(_, duration)| duration)
        .collect())
}
