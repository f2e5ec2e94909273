//! Positional CSV ingest for hourly load readings.
//!
//! The dataset carries no header row. Column 0 holds the date, column 1 the
//! hour and column 10 the load in MW. Rows whose date/hour do not form a valid
//! timestamp are skipped and reported; a missing or non-numeric load reads as 0.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveDateTime;
use csv::StringRecord;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::LoadError;
use crate::models::{ParsedSamples, RowError, Sample};

const TIMESTAMP_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    pub delimiter: u8,
    pub date_column: usize,
    pub hour_column: usize,
    pub load_column: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            date_column: 0,
            hour_column: 1,
            load_column: 10,
        }
    }
}

/// Where the dataset text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    File(PathBuf),
    Url(String),
}

impl FromStr for DataSource {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_ascii_lowercase();
        if lowered.starts_with("http://") || lowered.starts_with("https://") {
            Ok(DataSource::Url(s.to_string()))
        } else {
            Ok(DataSource::File(PathBuf::from(s)))
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::File(path) => write!(f, "{}", path.display()),
            DataSource::Url(url) => f.write_str(url),
        }
    }
}

pub fn parse_samples(raw: &str, options: &ParseOptions) -> ParsedSamples {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .delimiter(options.delimiter)
        .from_reader(raw.as_bytes());

    let mut parsed = ParsedSamples::default();

    for (idx, result) in reader.records().enumerate() {
        parsed.rows_read += 1;
        let fallback_line = idx as u64 + 1;

        let record = match result {
            Ok(record) => record,
            Err(e) => {
                let line = e
                    .position()
                    .map(|pos| pos.line())
                    .unwrap_or(fallback_line);
                parsed.row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        let line = record
            .position()
            .map(|pos| pos.line())
            .unwrap_or(fallback_line);

        match parse_record(&record, options) {
            Ok(sample) => parsed.samples.push(sample),
            Err(message) => parsed.row_errors.push(RowError { line, message }),
        }
    }

    parsed
}

fn parse_record(record: &StringRecord, options: &ParseOptions) -> Result<Sample, String> {
    let date = record.get(options.date_column).unwrap_or_default();
    let hour = record.get(options.hour_column).unwrap_or_default();
    if date.is_empty() || hour.is_empty() {
        return Err(format!(
            "missing date or hour (columns {} and {})",
            options.date_column, options.hour_column
        ));
    }

    let timestamp = parse_timestamp(date, hour)
        .ok_or_else(|| format!("invalid timestamp `{date} {hour}:00`"))?;
    let load_value = parse_load(record.get(options.load_column));

    Ok(Sample::new(timestamp, load_value))
}

/// Builds `"{date} {hour}:00"` and parses it as a wall-clock timestamp.
pub fn parse_timestamp(date: &str, hour: &str) -> Option<NaiveDateTime> {
    let combined = format!("{} {}:00", date.trim(), hour.trim());
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(&combined, format).ok())
}

pub fn parse_load(field: Option<&str>) -> f64 {
    field
        .and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

pub async fn fetch_text(source: &DataSource) -> Result<String, LoadError> {
    match source {
        DataSource::File(path) => {
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| LoadError::Io {
                    path: path.clone(),
                    source,
                })
        }
        DataSource::Url(url) => {
            let http_error = |source: reqwest::Error| LoadError::Http {
                url: url.clone(),
                source,
            };
            let response = reqwest::get(url.as_str())
                .await
                .and_then(|response| response.error_for_status())
                .map_err(http_error)?;
            response.text().await.map_err(http_error)
        }
    }
}

/// Fetches and parses the dataset; resolves to `Cancelled` as soon as
/// `cancel` fires, whether or not the read has finished.
pub async fn load_samples(
    source: &DataSource,
    options: &ParseOptions,
    cancel: &CancellationToken,
) -> Result<ParsedSamples, LoadError> {
    debug!(%source, "loading dataset");

    let text = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(LoadError::Cancelled),
        text = fetch_text(source) => text?,
    };

    let parsed = parse_samples(&text, options);
    info!(
        %source,
        rows = parsed.rows_read,
        samples = parsed.samples.len(),
        skipped = parsed.row_errors.len(),
        "dataset parsed"
    );
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn row(date: &str, hour: &str, load: &str) -> String {
        format!("{date},{hour},a,b,c,d,e,f,g,h,{load}")
    }

    fn at(year: i32, month: u32, day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|date| date.and_hms_opt(hour, 0, 0))
            .unwrap()
    }

    #[test]
    fn empty_input_yields_no_samples() {
        let parsed = parse_samples("", &ParseOptions::default());
        assert!(parsed.samples.is_empty());
        assert!(parsed.row_errors.is_empty());
        assert_eq!(parsed.rows_read, 0);
    }

    #[test]
    fn parses_every_row_in_order() {
        let raw = [
            row("2024-03-02", "5", "310.5"),
            row("2024-03-01", "23", "120"),
            row("2024-03-01", "0", "99.25"),
        ]
        .join("\n");

        let parsed = parse_samples(&raw, &ParseOptions::default());
        assert_eq!(
            parsed.samples,
            vec![
                Sample::new(at(2024, 3, 2, 5), 310.5),
                Sample::new(at(2024, 3, 1, 23), 120.0),
                Sample::new(at(2024, 3, 1, 0), 99.25),
            ]
        );
        assert_eq!(parsed.rows_read, 3);
    }

    #[test]
    fn blank_lines_are_skipped() {
        let raw = format!(
            "{}\n\n{}\n",
            row("2024-03-01", "1", "1"),
            row("2024-03-01", "2", "2")
        );
        let parsed = parse_samples(&raw, &ParseOptions::default());
        assert_eq!(parsed.samples.len(), 2);
        assert!(parsed.row_errors.is_empty());
    }

    #[test]
    fn missing_or_bad_load_reads_as_zero() {
        let raw = [
            row("2024-03-01", "1", ""),
            row("2024-03-01", "2", "n/a"),
            row("2024-03-01", "3", "NaN"),
            "2024-03-01,4".to_string(),
        ]
        .join("\n");

        let parsed = parse_samples(&raw, &ParseOptions::default());
        let loads: Vec<f64> = parsed.samples.iter().map(|s| s.load_value).collect();
        assert_eq!(loads, vec![0.0, 0.0, 0.0, 0.0]);
        assert!(parsed.row_errors.is_empty());
    }

    #[test]
    fn invalid_timestamps_are_reported_not_sampled() {
        let raw = [
            "Date,Hour,x,x,x,x,x,x,x,x,Historical Demand (MW)".to_string(),
            row("2024-03-01", "1", "10"),
            row("2024-02-30", "1", "10"),
            row("2024-03-01", "25", "10"),
            row("", "", "10"),
        ]
        .join("\n");

        let parsed = parse_samples(&raw, &ParseOptions::default());
        assert_eq!(parsed.samples, vec![Sample::new(at(2024, 3, 1, 1), 10.0)]);
        let lines: Vec<u64> = parsed.row_errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![1, 3, 4, 5]);
        assert_eq!(parsed.rows_read, 5);
    }

    #[test]
    fn accepts_common_date_and_hour_layouts() {
        assert_eq!(parse_timestamp("2024-03-01", "07"), Some(at(2024, 3, 1, 7)));
        assert_eq!(parse_timestamp("2024/03/01", "7"), Some(at(2024, 3, 1, 7)));
        assert_eq!(parse_timestamp("03/01/2024", "13"), Some(at(2024, 3, 1, 13)));
        assert_eq!(parse_timestamp("2024-03-01", "13:00"), Some(at(2024, 3, 1, 13)));
        assert_eq!(parse_timestamp("yesterday", "1"), None);
    }

    #[test]
    fn honours_custom_delimiter_and_load_column() {
        let options = ParseOptions {
            delimiter: b';',
            load_column: 2,
            ..ParseOptions::default()
        };
        let parsed = parse_samples("2024-03-01;6;42.5", &options);
        assert_eq!(parsed.samples, vec![Sample::new(at(2024, 3, 1, 6), 42.5)]);
    }

    #[test]
    fn urls_and_paths_are_told_apart() {
        assert_eq!(
            "https://grid.example/Dataset.csv".parse::<DataSource>(),
            Ok(DataSource::Url("https://grid.example/Dataset.csv".to_string()))
        );
        assert_eq!(
            "data/Dataset.csv".parse::<DataSource>(),
            Ok(DataSource::File(PathBuf::from("data/Dataset.csv")))
        );
    }

    #[tokio::test]
    async fn cancelled_load_never_reads() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let source = DataSource::File(PathBuf::from("does/not/exist.csv"));

        let result = load_samples(&source, &ParseOptions::default(), &cancel).await;
        assert!(matches!(result, Err(LoadError::Cancelled)));
    }

    #[tokio::test]
    async fn missing_file_is_a_retryable_io_error() {
        let source = DataSource::File(PathBuf::from("does/not/exist.csv"));
        let result = load_samples(&source, &ParseOptions::default(), &CancellationToken::new()).await;

        match result {
            Err(err @ LoadError::Io { .. }) => assert!(err.is_retryable()),
            other => panic!("expected io error, got {other:?}"),
        }
    }
}
