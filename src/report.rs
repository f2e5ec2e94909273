use std::fmt::Write;

use crate::aggregate;
use crate::models::{ParsedSamples, WindowSpan};

const MAX_LISTED_ROW_ERRORS: usize = 10;

pub fn build_report(
    source_label: &str,
    span: WindowSpan,
    selected_month: Option<&str>,
    parsed: &ParsedSamples,
) -> String {
    let samples = &parsed.samples;
    let summary = aggregate::summarize(samples);
    let window = aggregate::filter_by_window(samples, span);
    let monthly = aggregate::monthly_averages(samples);

    let mut output = String::new();

    let _ = writeln!(output, "# Grid Load Report");
    let _ = writeln!(
        output,
        "Generated from {} ({} samples from {} rows)",
        source_label, summary.sample_count, parsed.rows_read
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Headline");

    match (summary.last_timestamp, summary.current_load) {
        (Some(last), Some(current)) => {
            let _ = writeln!(output, "- Current load: {:.2} MW (at {})", current, last);
            if let Some(peak) = summary.peak_load_24h {
                let _ = writeln!(output, "- Peak over the last 24 hours: {:.2} MW", peak);
            }
            if let Some(first) = summary.first_timestamp {
                let _ = writeln!(output, "- Coverage: {} to {}", first, last);
            }
        }
        _ => {
            let _ = writeln!(output, "No readings available.");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Load Profile ({})", span.label());

    if window.is_empty() {
        let _ = writeln!(output, "No data available for this window.");
    } else {
        let loads = window.iter().map(|sample| sample.load_value);
        let total: f64 = loads.clone().sum();
        let min = loads.clone().fold(f64::INFINITY, f64::min);
        let max = loads.fold(f64::NEG_INFINITY, f64::max);
        let _ = writeln!(
            output,
            "- {} readings, average {:.2} MW (min {:.2}, max {:.2})",
            window.len(),
            total / window.len() as f64,
            min,
            max
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Monthly Load Averages");

    if monthly.is_empty() {
        let _ = writeln!(output, "No months recorded.");
    } else {
        for aggregate in monthly.iter() {
            let _ = writeln!(
                output,
                "- {}: {:.2} MW",
                aggregate.month_key, aggregate.average_load
            );
        }
    }

    let _ = writeln!(output);
    match selected_month {
        Some(month) => {
            let _ = writeln!(output, "## Weekly Averages for {}", month);
            let weekly = aggregate::weekly_averages(samples, month);
            if weekly.is_empty() {
                let _ = writeln!(output, "No readings recorded for {}.", month);
            } else {
                for aggregate in weekly.iter() {
                    let _ = writeln!(
                        output,
                        "- {}: {:.2} MW",
                        aggregate.week_label, aggregate.average_load
                    );
                }
            }
        }
        None => {
            let _ = writeln!(output, "## Weekly Averages");
            let _ = writeln!(output, "Select a month to see its weekly breakdown.");
        }
    }

    if !parsed.row_errors.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Skipped Rows");
        for row_error in parsed.row_errors.iter().take(MAX_LISTED_ROW_ERRORS) {
            let _ = writeln!(output, "- line {}: {}", row_error.line, row_error.message);
        }
        let remaining = parsed.row_errors.len().saturating_sub(MAX_LISTED_ROW_ERRORS);
        if remaining > 0 {
            let _ = writeln!(output, "- ...and {} more", remaining);
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RowError, Sample};
    use chrono::NaiveDate;

    fn parsed() -> ParsedSamples {
        let samples = [(1, 100.0), (8, 200.0), (15, 300.0)]
            .into_iter()
            .map(|(day, load)| {
                let ts = NaiveDate::from_ymd_opt(2024, 3, day)
                    .and_then(|date| date.and_hms_opt(9, 0, 0))
                    .unwrap();
                Sample::new(ts, load)
            })
            .collect();
        ParsedSamples {
            samples,
            row_errors: vec![RowError {
                line: 1,
                message: "invalid timestamp `Date Hour:00`".to_string(),
            }],
            rows_read: 4,
        }
    }

    #[test]
    fn report_lists_months_and_selected_weeks() {
        let report = build_report("Dataset.csv", WindowSpan::Month, Some("2024-03"), &parsed());

        assert!(report.contains("Generated from Dataset.csv (3 samples from 4 rows)"));
        assert!(report.contains("- Current load: 300.00 MW (at 2024-03-15 09:00:00)"));
        assert!(report.contains("- 2024-03: 200.00 MW"));
        assert!(report.contains("## Weekly Averages for 2024-03"));
        assert!(report.contains("- Week 2: 200.00 MW"));
        assert!(report.contains("- line 1: invalid timestamp"));
    }

    #[test]
    fn week_span_narrows_the_profile() {
        let report = build_report("Dataset.csv", WindowSpan::Week, None, &parsed());

        assert!(report.contains("## Load Profile (Last Week)"));
        assert!(report.contains("- 2 readings, average 250.00 MW (min 200.00, max 300.00)"));
        assert!(report.contains("Select a month to see its weekly breakdown."));
    }

    #[test]
    fn empty_dataset_renders_no_data_sections() {
        let report = build_report("empty.csv", WindowSpan::Year, Some("2024-01"), &ParsedSamples::default());

        assert!(report.contains("No readings available."));
        assert!(report.contains("No data available for this window."));
        assert!(report.contains("No months recorded."));
        assert!(report.contains("No readings recorded for 2024-01."));
        assert!(!report.contains("## Skipped Rows"));
    }
}
