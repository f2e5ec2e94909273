use std::fmt;

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

/// One timestamped load reading.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub timestamp: NaiveDateTime,
    pub load_value: f64,
}

impl Sample {
    pub fn new(timestamp: NaiveDateTime, load_value: f64) -> Self {
        Self {
            timestamp,
            load_value,
        }
    }
}

/// Trailing range measured back from the newest sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum WindowSpan {
    Week,
    Month,
    Year,
}

impl WindowSpan {
    pub const ALL: [WindowSpan; 3] = [WindowSpan::Week, WindowSpan::Month, WindowSpan::Year];

    /// Fixed-length approximation; not calendar aware.
    pub fn duration(self) -> Duration {
        match self {
            WindowSpan::Week => Duration::days(7),
            WindowSpan::Month => Duration::days(30),
            WindowSpan::Year => Duration::days(365),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WindowSpan::Week => "Last Week",
            WindowSpan::Month => "Last Month",
            WindowSpan::Year => "Last Year",
        }
    }
}

impl fmt::Display for WindowSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WindowSpan::Week => "week",
            WindowSpan::Month => "month",
            WindowSpan::Year => "year",
        };
        f.write_str(name)
    }
}

/// Chart-ready point for the load profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadPoint {
    pub date: String,
    pub load: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyAggregate {
    #[serde(rename = "month")]
    pub month_key: String,
    #[serde(rename = "avgLoad")]
    pub average_load: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyAggregate {
    #[serde(rename = "week")]
    pub week_label: String,
    #[serde(rename = "avgLoad")]
    pub average_load: f64,
}

/// A row that could not be turned into a [`Sample`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowError {
    pub line: u64,
    pub message: String,
}

/// Ingest output: samples in row order plus the rows that were skipped.
#[derive(Debug, Clone, Default)]
pub struct ParsedSamples {
    pub samples: Vec<Sample>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// Headline figures shown above the charts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadSummary {
    pub sample_count: usize,
    pub first_timestamp: Option<NaiveDateTime>,
    pub last_timestamp: Option<NaiveDateTime>,
    pub current_load: Option<f64>,
    pub peak_load_24h: Option<f64>,
}
