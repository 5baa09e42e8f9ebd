//! Fan-out/fan-in nearby-place search: one concurrent query per enabled
//! subtype token, merged into a deduplicated, ranked result set.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, info, warn};

use pinpoint_common::{GeoPoint, OverlayConfig, OverlayError, SearchFilters};
use places_client::Place;

use crate::store::CredentialStore;
use crate::traits::NearbySearch;

/// Outcome of one subtype query. Anything but a transport failure
/// contributes to the merge (possibly nothing).
enum SubtypeOutcome {
    Results(Vec<Place>),
    /// Upstream answered with an error status or an undecodable body;
    /// contributes no results.
    Degraded,
    /// The request never completed: connection failure or timeout.
    Transport,
}

pub struct SearchOrchestrator {
    searcher: Arc<dyn NearbySearch>,
    credentials: Arc<CredentialStore>,
    request_timeout: Duration,
}

impl SearchOrchestrator {
    pub fn new(
        searcher: Arc<dyn NearbySearch>,
        credentials: Arc<CredentialStore>,
        config: &OverlayConfig,
    ) -> Self {
        Self {
            searcher,
            credentials,
            request_timeout: config.search_timeout(),
        }
    }

    /// Run one search: expand filters to subtype tokens, query them all
    /// concurrently, and return the deduplicated set ranked by review count.
    ///
    /// Callers are expected to pre-validate center and filters; an empty
    /// filter set here is a contract violation and fails before any request
    /// is dispatched. The search as a whole fails only on a missing
    /// credential or when every query fails at the transport level; any
    /// individual subtype failure just contributes nothing.
    pub async fn search(
        &self,
        center: GeoPoint,
        radius_m: u32,
        filters: &SearchFilters,
    ) -> Result<Vec<Place>, OverlayError> {
        if !filters.any() {
            return Err(OverlayError::Validation(
                "at least one place category must be selected".to_string(),
            ));
        }

        let Some(api_key) = self.credentials.load().await? else {
            return Err(OverlayError::MissingCredential);
        };

        let subtypes = filters.subtypes();
        // Untyped single query if expansion somehow produced nothing.
        let subtypes: Vec<Option<&str>> = if subtypes.is_empty() {
            vec![None]
        } else {
            subtypes.into_iter().map(Some).collect()
        };

        info!(
            queries = subtypes.len(),
            radius_m,
            lat = center.lat,
            lng = center.lng,
            "Dispatching nearby searches"
        );

        let outcomes = join_all(
            subtypes
                .iter()
                .map(|subtype| self.query_subtype(center, radius_m, *subtype, &api_key)),
        )
        .await;

        let dispatched = outcomes.len();
        let transport_failures = outcomes
            .iter()
            .filter(|o| matches!(o, SubtypeOutcome::Transport))
            .count();
        if transport_failures == dispatched {
            return Err(OverlayError::SearchFailed(format!(
                "all {dispatched} nearby searches failed"
            )));
        }

        // join_all preserves dispatch order, so the merge is deterministic:
        // last-listed subtype wins duplicate content, first-seen position
        // survives for the stable sort below.
        let merged = merge_by_place_id(outcomes.into_iter().filter_map(|o| match o {
            SubtypeOutcome::Results(places) => Some(places),
            SubtypeOutcome::Degraded | SubtypeOutcome::Transport => None,
        }));

        info!(
            unique = merged.len(),
            searches = dispatched,
            "Merged nearby search results"
        );
        Ok(rank_by_reviews(merged))
    }

    async fn query_subtype(
        &self,
        center: GeoPoint,
        radius_m: u32,
        subtype: Option<&str>,
        api_key: &str,
    ) -> SubtypeOutcome {
        let label = subtype.unwrap_or("all");
        let request = self
            .searcher
            .nearby(center.lat, center.lng, radius_m, subtype, api_key);
        match tokio::time::timeout(self.request_timeout, request).await {
            Ok(Ok(places)) => {
                debug!(subtype = label, count = places.len(), "Subtype query ok");
                SubtypeOutcome::Results(places)
            }
            Ok(Err(e)) if e.is_transport() => {
                warn!(subtype = label, error = %e, "Subtype query failed in transit");
                SubtypeOutcome::Transport
            }
            Ok(Err(e)) => {
                warn!(subtype = label, error = %e, "Subtype query degraded to empty");
                SubtypeOutcome::Degraded
            }
            Err(_) => {
                warn!(subtype = label, "Subtype query timed out");
                SubtypeOutcome::Transport
            }
        }
    }
}

/// Merge per-subtype result lists into one collection with unique place ids.
/// A duplicate id keeps its first-seen position but takes the later record's
/// content.
pub fn merge_by_place_id(lists: impl IntoIterator<Item = Vec<Place>>) -> Vec<Place> {
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut merged: Vec<Place> = Vec::new();
    for list in lists {
        for place in list {
            match slots.get(&place.place_id) {
                Some(&i) => merged[i] = place,
                None => {
                    slots.insert(place.place_id.clone(), merged.len());
                    merged.push(place);
                }
            }
        }
    }
    merged
}

/// Sort by review count descending. The sort is stable, so equal counts keep
/// their merge order.
pub fn rank_by_reviews(mut places: Vec<Place>) -> Vec<Place> {
    places.sort_by(|a, b| b.review_count().cmp(&a.review_count()));
    places
}
