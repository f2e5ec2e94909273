//! Temporal aggregation for hourly grid-load readings.
//!
//! `ingest` turns the positional CSV dataset into samples, `aggregate` derives
//! the trailing windows and monthly/weekly averages, and `dataset` / `cache`
//! hold the loaded collection and memoized views for a long-lived host.

pub mod aggregate;
pub mod cache;
pub mod dataset;
pub mod error;
pub mod ingest;
pub mod models;
pub mod report;
