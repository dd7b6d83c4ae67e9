use chrono::Duration;
use serde::{Serialize, Serializer};

fn as_seconds<S: Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_i64(d.num_seconds())
}

/// Summary statistics over a list of durations.
///
/// The quartile names follow the tool's historical convention over a
/// descending sort: `first_quartile` sits at index `3n/4` (nearer the
/// maximum) and `third_quartile` at `n/4` (nearer the minimum). The index
/// arithmetic is a fixed contract; callers relying on the standard
/// ascending-percentile naming should read the fields accordingly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DurationStats {
    #[serde(serialize_with = "as_seconds")]
    pub min: Duration,
    #[serde(serialize_with = "as_seconds")]
    pub first_quartile: Duration,
    #[serde(serialize_with = "as_seconds")]
    pub median: Duration,
    #[serde(serialize_with = "as_seconds")]
    pub mean: Duration,
    #[serde(serialize_with = "as_seconds")]
    pub third_quartile: Duration,
    #[serde(serialize_with = "as_seconds")]
    pub max: Duration,
    pub count: usize,
}

impl DurationStats {
    pub fn empty() -> Self {
        Self {
            min: Duration::zero(),
            first_quartile: Duration::zero(),
            median: Duration::zero(),
            mean: Duration::zero(),
            third_quartile: Duration::zero(),
            max: Duration::zero(),
            count: 0,
        }
    }
}

/// Reduce a duration list to its summary. An empty input yields the
/// all-zero stats with `count == 0` rather than an error.
pub fn summarize(durations: &[Duration]) -> DurationStats {
    if durations.is_empty() {
        return DurationStats::empty();
    }

    let mut sorted = durations.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    let n = sorted.len();

    let total = sorted.iter().fold(Duration::zero(), |acc, d| acc + *d);

    DurationStats {
        min: sorted[n - 1],
        first_quartile: sorted[n * 3 / 4],
        median: sorted[n / 2],
        mean: total / (n as i32),
        third_quartile: sorted[n / 4],
        max: sorted[0],
        count: n,
    }
}

/// Render a duration as a compact human string like `"3d 4h"`.
pub fn format_duration(d: &Duration) -> String {
    let total_minutes = d.num_minutes();
    if total_minutes < 1 {
        return format!("{}s", d.num_seconds());
    }
    let days = total_minutes / (24 * 60);
    let hours = (total_minutes / 60) % 24;
    let minutes = total_minutes % 60;
    if days > 0 {
        format!("{}d {}h", days, hours)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hours(list: &[i64]) -> Vec<Duration> {
        list.iter().copied().map(Duration::hours).collect()
    }

    #[test]
    fn empty_input_yields_zero_stats_without_error() {
        let stats = summarize(&[]);
        assert_eq!(stats.count, 0);
        assert_eq!(stats.min, Duration::zero());
        assert_eq!(stats.max, Duration::zero());
        assert_eq!(stats.mean, Duration::zero());
    }

    #[test]
    fn quartile_index_convention_is_pinned() {
        // Descending [5h, 4h, 3h, 2h, 1h]: first_quartile = d[3], median =
        // d[2], third_quartile = d[1].
        let stats = summarize(&hours(&[1, 2, 3, 4, 5]));
        assert_eq!(stats.max, Duration::hours(5));
        assert_eq!(stats.first_quartile, Duration::hours(2));
        assert_eq!(stats.median, Duration::hours(3));
        assert_eq!(stats.third_quartile, Duration::hours(4));
        assert_eq!(stats.min, Duration::hours(1));
        assert_eq!(stats.mean, Duration::hours(3));
        assert_eq!(stats.count, 5);
    }

    #[test]
    fn single_element_uses_it_everywhere() {
        let stats = summarize(&hours(&[7]));
        assert_eq!(stats.min, Duration::hours(7));
        assert_eq!(stats.max, Duration::hours(7));
        assert_eq!(stats.median, Duration::hours(7));
        assert_eq!(stats.mean, Duration::hours(7));
        assert_eq!(stats.count, 1);
    }

    #[test]
    fn ordering_invariants_hold() {
        let stats = summarize(&hours(&[9, 1, 4, 4, 12, 2, 6]));
        assert!(stats.min <= stats.median);
        assert!(stats.median <= stats.max);
        assert!(stats.min <= stats.mean);
        assert!(stats.mean <= stats.max);
        assert!(stats.first_quartile <= stats.third_quartile);
    }

    #[test]
    fn input_order_does_not_matter() {
        let a = summarize(&hours(&[1, 2, 3, 4]));
        let b = summarize(&hours(&[4, 2, 1, 3]));
        assert_eq!(a, b);
    }

    #[test]
    fn serializes_fields_as_seconds() {
        let json = serde_json::to_value(summarize(&hours(&[2]))).unwrap();
        assert_eq!(json["median"], 7200);
        assert_eq!(json["count"], 1);
    }

    #[test]
    fn formats_compact_human_durations() {
        assert_eq!(format_duration(&Duration::seconds(42)), "42s");
        assert_eq!(format_duration(&Duration::minutes(5)), "5m");
        assert_eq!(format_duration(&Duration::minutes(125)), "2h 5m");
        assert_eq!(format_duration(&(Duration::days(3) + Duration::hours(4))), "3d 4h");
    }
}
