//! Catalog refresh decision.
//!
//! Cache-invalidation check against the backend's catalog hash: the
//! full catalog is fetched only when the hash moved, and is replaced
//! wholesale — never patched. Failures are logged and treated as "no
//! update this cycle"; the next poll recovers.

use tracing::{debug, info, warn};

use crate::client::ReviewClient;
use crate::errors::QuakeReviewError;
use crate::models::{events_from_raw, CatalogResponse, Event};

/// Source of catalog hashes and snapshots. Seam for the refresh loop.
pub trait CatalogSource {
    /// Get the hash of the current catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the hash cannot be fetched.
    fn events_hash(&self) -> Result<u64, QuakeReviewError>;

    /// Get the full catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be fetched.
    fn catalog(&self) -> Result<CatalogResponse, QuakeReviewError>;
}

impl CatalogSource for ReviewClient {
    fn events_hash(&self) -> Result<u64, QuakeReviewError> {
        self.fetch_events_hash()
    }

    fn catalog(&self) -> Result<CatalogResponse, QuakeReviewError> {
        self.fetch_catalog()
    }
}

/// The in-memory catalog snapshot owned by the scheduler loop.
#[derive(Debug, Default)]
pub struct CatalogState {
    /// Hash of the snapshot below; `None` until the first fetch lands
    pub hash: Option<u64>,
    pub events: Vec<Event>,
}

impl CatalogState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Run one refresh cycle.
///
/// Returns the (possibly replaced) state and whether it was replaced.
pub fn refresh(source: &impl CatalogSource, state: CatalogState) -> (CatalogState, bool) {
    debug!("querying for latest events hash");
    let hash = match source.events_hash() {
        Ok(hash) => hash,
        Err(e) => {
            warn!("failed to get events hash: {e}");
            return (state, false);
        }
    };

    if state.hash == Some(hash) {
        debug!("no catalog update");
        return (state, false);
    }

    debug!("new hash detected; getting new events");
    match source.catalog() {
        Ok(response) => {
            let events = events_from_raw(response.data.events);
            info!("setting {} events", events.len());
            (
                CatalogState {
                    hash: Some(response.data.hash),
                    events,
                },
                true,
            )
        }
        Err(e) => {
            warn!("failed to get events: {e}");
            (state, false)
        }
    }
}

/// Token identifying one selection request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionToken(u64);

/// Guard against stale fetch results on rapid event re-selection.
///
/// Each new selection begins a generation; a completion handler checks
/// its token before applying results, so a superseded request's data is
/// discarded instead of overwriting newer state.
#[derive(Debug, Default)]
pub struct SelectionGuard {
    current: u64,
}

impl SelectionGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new generation, invalidating all outstanding tokens.
    pub fn begin(&mut self) -> SelectionToken {
        self.current += 1;
        SelectionToken(self.current)
    }

    /// Check whether a token still belongs to the latest generation.
    #[must_use]
    pub fn is_current(&self, token: SelectionToken) -> bool {
        token.0 == self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CatalogData;
    use std::cell::RefCell;

    /// Scripted source counting how often the full catalog is fetched.
    struct ScriptedSource {
        hash: Result<u64, ()>,
        catalog_hash: u64,
        catalog_fetches: RefCell<u32>,
    }

    impl ScriptedSource {
        fn new(hash: Result<u64, ()>, catalog_hash: u64) -> Self {
            Self {
                hash,
                catalog_hash,
                catalog_fetches: RefCell::new(0),
            }
        }
    }

    impl CatalogSource for ScriptedSource {
        fn events_hash(&self) -> Result<u64, QuakeReviewError> {
            self.hash
                .map_err(|()| QuakeReviewError::InvalidResponse("hash unavailable".into()))
        }

        fn catalog(&self) -> Result<CatalogResponse, QuakeReviewError> {
            *self.catalog_fetches.borrow_mut() += 1;
            Ok(CatalogResponse {
                status_code: 200,
                data: CatalogData {
                    events: vec![],
                    hash: self.catalog_hash,
                },
            })
        }
    }

    #[test]
    fn test_first_cycle_fetches_catalog() {
        let source = ScriptedSource::new(Ok(42), 42);
        let (state, updated) = refresh(&source, CatalogState::new());
        assert!(updated);
        assert_eq!(state.hash, Some(42));
        assert_eq!(*source.catalog_fetches.borrow(), 1);
    }

    #[test]
    fn test_unchanged_hash_skips_fetch() {
        let source = ScriptedSource::new(Ok(42), 42);
        let (state, _) = refresh(&source, CatalogState::new());

        // Second poll sees the same hash: no catalog fetch, state untouched
        let (state, updated) = refresh(&source, state);
        assert!(!updated);
        assert_eq!(state.hash, Some(42));
        assert_eq!(*source.catalog_fetches.borrow(), 1);
    }

    #[test]
    fn test_changed_hash_replaces_wholesale() {
        let source = ScriptedSource::new(Ok(7), 7);
        let stale = CatalogState {
            hash: Some(42),
            events: vec![],
        };
        let (state, updated) = refresh(&source, stale);
        assert!(updated);
        assert_eq!(state.hash, Some(7));
    }

    #[test]
    fn test_hash_failure_is_swallowed() {
        let source = ScriptedSource::new(Err(()), 0);
        let stale = CatalogState {
            hash: Some(42),
            events: vec![],
        };
        let (state, updated) = refresh(&source, stale);
        assert!(!updated);
        assert_eq!(state.hash, Some(42));
        assert_eq!(*source.catalog_fetches.borrow(), 0);
    }

    #[test]
    fn test_selection_guard_discards_stale() {
        let mut guard = SelectionGuard::new();
        let first = guard.begin();
        let second = guard.begin();
        assert!(!guard.is_current(first));
        assert!(guard.is_current(second));
    }
}
