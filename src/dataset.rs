use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::ingest::{self, DataSource, ParseOptions};
use crate::models::{ParsedSamples, Sample};

#[derive(Debug, Clone)]
pub enum LoadState {
    /// Nothing loaded yet, or the last load was cancelled before any data arrived.
    Pending,
    Ready(Arc<ParsedSamples>),
    /// The last load failed; calling [`Dataset::load`] again retries.
    Unavailable { reason: String },
}

/// Owns the sample collection for one dataset source.
///
/// Each successful load replaces the collection wholesale and bumps
/// `version`, which callers use to key derived views. Dropping the handle
/// cancels a load that is still in flight.
pub struct Dataset {
    source: DataSource,
    options: ParseOptions,
    cancel: CancellationToken,
    state: LoadState,
    version: u64,
}

impl Dataset {
    pub fn new(source: DataSource, options: ParseOptions) -> Self {
        Self {
            source,
            options,
            cancel: CancellationToken::new(),
            state: LoadState::Pending,
            version: 0,
        }
    }

    pub fn source(&self) -> &DataSource {
        &self.source
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Samples of the last successful load; empty unless ready.
    pub fn samples(&self) -> &[Sample] {
        match &self.state {
            LoadState::Ready(parsed) => parsed.samples.as_slice(),
            LoadState::Pending | LoadState::Unavailable { .. } => &[],
        }
    }

    /// Token that aborts in-flight and future loads of this handle once cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn load(&mut self) -> &LoadState {
        match ingest::load_samples(&self.source, &self.options, &self.cancel).await {
            Ok(parsed) => {
                if !parsed.row_errors.is_empty() {
                    warn!(
                        source = %self.source,
                        skipped = parsed.row_errors.len(),
                        "skipped rows without a valid timestamp"
                    );
                }
                self.version += 1;
                info!(source = %self.source, version = self.version, "dataset ready");
                self.state = LoadState::Ready(Arc::new(parsed));
            }
            Err(err) if !err.is_retryable() => {
                info!(source = %self.source, error = %err, "dataset load stopped");
            }
            Err(err) => {
                error!(source = %self.source, error = %err, "failed to load dataset");
                self.state = LoadState::Unavailable {
                    reason: err.to_string(),
                };
            }
        }
        &self.state
    }
}

impl Drop for Dataset {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
