use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use serde::Serialize;
use tracing::trace;

use crate::aggregate;
use crate::models::{LoadPoint, MonthlyAggregate, Sample, WeeklyAggregate, WindowSpan};

const DEFAULT_CAPACITY: usize = 32;

/// A derived view a chart asks for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ViewQuery {
    Window(WindowSpan),
    Monthly,
    Weekly(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum View {
    Window(Vec<LoadPoint>),
    Monthly(Vec<MonthlyAggregate>),
    Weekly(Vec<WeeklyAggregate>),
}

impl View {
    pub fn is_empty(&self) -> bool {
        match self {
            View::Window(points) => points.is_empty(),
            View::Monthly(rows) => rows.is_empty(),
            View::Weekly(rows) => rows.is_empty(),
        }
    }
}

pub fn compute_view(samples: &[Sample], query: &ViewQuery) -> View {
    match query {
        ViewQuery::Window(span) => {
            View::Window(aggregate::to_load_points(&aggregate::filter_by_window(samples, *span)))
        }
        ViewQuery::Monthly => View::Monthly(aggregate::monthly_averages(samples)),
        ViewQuery::Weekly(month) => View::Weekly(aggregate::weekly_averages(samples, month)),
    }
}

/// Memoizes views per (collection version, query).
pub struct ViewCache {
    entries: LruCache<(u64, ViewQuery), Arc<View>>,
    hits: u64,
    misses: u64,
}

impl ViewCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// `samples` must be the collection that `version` identifies.
    pub fn view(&mut self, version: u64, samples: &[Sample], query: &ViewQuery) -> Arc<View> {
        let key = (version, query.clone());
        if let Some(view) = self.entries.get(&key) {
            self.hits += 1;
            return Arc::clone(view);
        }

        self.misses += 1;
        trace!(version, ?query, "computing view");
        let view = Arc::new(compute_view(samples, query));
        self.entries.put(key, Arc::clone(&view));
        view
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

impl Default for ViewCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
