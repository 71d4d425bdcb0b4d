//! Progress reporting driven by resolution events.

use tracing::debug;
use trellis_resolver::ResolutionEvent;

/// Tallies resolution events and logs each one at debug level
#[derive(Debug, Default)]
pub struct ProgressReporter {
    fetches_started: usize,
    recipes_fetched: usize,
    candidates_seen: usize,
    snapshots: usize,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, event: &ResolutionEvent) {
        debug!("{}", event);
        match event {
            ResolutionEvent::FetchingRecipe { .. } => self.fetches_started += 1,
            ResolutionEvent::RecipeFetched { candidates, .. } => {
                self.recipes_fetched += 1;
                self.candidates_seen += candidates;
            }
            ResolutionEvent::Snapshot(_) => self.snapshots += 1,
        }
    }

    /// One-line summary of the work done
    pub fn summary(&self) -> String {
        format!(
            "fetched {} recipes ({} requested), considered {} candidate versions",
            self.recipes_fetched, self.fetches_started, self.candidates_seen
        )
    }
}
