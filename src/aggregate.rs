//! Windowing and averaging over a flat load series.
//!
//! Every function here is pure: the newest sample anchors the trailing
//! windows, never the wall clock. Timestamps are naive wall-clock values, so
//! month keys, ISO strings and day-of-month are all read from the same fields.

use std::collections::HashMap;
use std::hash::Hash;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

use crate::models::{LoadPoint, LoadSummary, MonthlyAggregate, Sample, WeeklyAggregate, WindowSpan};

const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const MONTH_KEY_FORMAT: &str = "%Y-%m";
const POINT_LABEL_FORMAT: &str = "%Y-%m-%d %H:%M";

pub fn month_key(timestamp: &NaiveDateTime) -> String {
    timestamp.format(MONTH_KEY_FORMAT).to_string()
}

pub fn iso_timestamp(timestamp: &NaiveDateTime) -> String {
    timestamp.format(ISO_FORMAT).to_string()
}

/// Fixed 7-day bucket of the month: days 1-7 are week 1, 8-14 week 2, ...
pub fn week_of_month(day: u32) -> u32 {
    (day + 6) / 7
}

pub fn latest_timestamp(samples: &[Sample]) -> Option<NaiveDateTime> {
    samples.iter().map(|sample| sample.timestamp).max()
}

/// Samples within `span` of the newest sample, bounds inclusive, row order kept.
pub fn filter_by_window(samples: &[Sample], span: WindowSpan) -> Vec<Sample> {
    let Some(end) = latest_timestamp(samples) else {
        return Vec::new();
    };
    let start = end - span.duration();

    samples
        .iter()
        .filter(|sample| sample.timestamp >= start && sample.timestamp <= end)
        .cloned()
        .collect()
}

pub fn monthly_averages(samples: &[Sample]) -> Vec<MonthlyAggregate> {
    average_by_key(
        samples
            .iter()
            .map(|sample| (month_key(&sample.timestamp), sample.load_value)),
    )
    .into_iter()
    .map(|(month_key, average_load)| MonthlyAggregate {
        month_key,
        average_load,
    })
    .collect()
}

/// Averages per 7-day bucket for the samples whose ISO timestamp starts with
/// `month_key`. Buckets come out in first-seen order.
pub fn weekly_averages(samples: &[Sample], month_key: &str) -> Vec<WeeklyAggregate> {
    average_by_key(
        samples
            .iter()
            .filter(|sample| in_month(sample, month_key))
            .map(|sample| (week_of_month(sample.timestamp.day()), sample.load_value)),
    )
    .into_iter()
    .map(|(week, average_load)| WeeklyAggregate {
        week_label: format!("Week {week}"),
        average_load,
    })
    .collect()
}

/// All samples of one calendar month, row order kept.
pub fn filter_by_month(samples: &[Sample], month_key: &str) -> Vec<Sample> {
    samples
        .iter()
        .filter(|sample| in_month(sample, month_key))
        .cloned()
        .collect()
}

/// Samples dated `start` through `start + 6 days`.
pub fn filter_week_from(samples: &[Sample], start: NaiveDate) -> Vec<Sample> {
    let end = start + Duration::days(6);
    samples
        .iter()
        .filter(|sample| {
            let date = sample.timestamp.date();
            date >= start && date <= end
        })
        .cloned()
        .collect()
}

pub fn to_load_points(samples: &[Sample]) -> Vec<LoadPoint> {
    samples
        .iter()
        .map(|sample| LoadPoint {
            date: sample.timestamp.format(POINT_LABEL_FORMAT).to_string(),
            load: sample.load_value,
        })
        .collect()
}

pub fn summarize(samples: &[Sample]) -> LoadSummary {
    let mut latest: Option<&Sample> = None;
    let mut earliest: Option<NaiveDateTime> = None;

    for sample in samples {
        // strict comparison keeps the first row on ties
        if latest.map_or(true, |current| sample.timestamp > current.timestamp) {
            latest = Some(sample);
        }
        if earliest.map_or(true, |current| sample.timestamp < current) {
            earliest = Some(sample.timestamp);
        }
    }

    let peak_load_24h = latest.and_then(|newest| {
        let start = newest.timestamp - Duration::hours(24);
        samples
            .iter()
            .filter(|sample| sample.timestamp >= start && sample.timestamp <= newest.timestamp)
            .map(|sample| sample.load_value)
            .reduce(f64::max)
    });

    LoadSummary {
        sample_count: samples.len(),
        first_timestamp: earliest,
        last_timestamp: latest.map(|sample| sample.timestamp),
        current_load: latest.map(|sample| sample.load_value),
        peak_load_24h,
    }
}

fn in_month(sample: &Sample, month_key: &str) -> bool {
    iso_timestamp(&sample.timestamp).starts_with(month_key)
}

/// Arithmetic mean per key, keys in order of first appearance.
fn average_by_key<K, I>(entries: I) -> Vec<(K, f64)>
where
    K: Eq + Hash + Clone,
    I: IntoIterator<Item = (K, f64)>,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, f64, usize)> = Vec::new();

    for (key, value) in entries {
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            groups.push((key, 0.0, 0));
            groups.len() - 1
        });
        let group = &mut groups[slot];
        group.1 += value;
        group.2 += 1;
    }

    groups
        .into_iter()
        .map(|(key, total, count)| (key, total / count as f64))
        .collect()
}
