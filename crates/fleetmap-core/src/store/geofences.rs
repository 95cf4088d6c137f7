use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::api::{ApiError, Connector};
use crate::models::envelope::describe_shape;
use crate::models::{Envelope, Geofence};
use crate::tracker::RequestTracker;
use crate::utils::format_age;

/// Collection endpoint for the account's geofences
pub const GEOFENCES_PATH: &str = "/gw/geofences";

/// Label reported to the request tracker
const REQUEST_LABEL: &str = "get geofences";

#[derive(Debug, Default)]
struct GeofenceCache {
    geofences: Vec<Geofence>,
    /// Set on successful fetch, cleared by `clear_geofences`.
    loaded_at: Option<DateTime<Utc>>,
}

/// In-memory geofence cache filled by a single best-effort fetch.
///
/// The store never returns errors to its caller: failures are logged,
/// handed to the request tracker, and turned into an empty result with
/// the cache left as it was.
pub struct GeofenceStore {
    connector: Option<Arc<dyn Connector>>,
    tracker: Arc<dyn RequestTracker>,
    cache: RwLock<GeofenceCache>,
}

impl GeofenceStore {
    pub fn new(connector: Option<Arc<dyn Connector>>, tracker: Arc<dyn RequestTracker>) -> Self {
        Self {
            connector,
            tracker,
            cache: RwLock::new(GeofenceCache::default()),
        }
    }

    pub fn with_connector(connector: Arc<dyn Connector>, tracker: Arc<dyn RequestTracker>) -> Self {
        Self::new(Some(connector), tracker)
    }

    pub fn without_connector(tracker: Arc<dyn RequestTracker>) -> Self {
        Self::new(None, tracker)
    }

    fn read(&self) -> RwLockReadGuard<'_, GeofenceCache> {
        self.cache.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, GeofenceCache> {
        self.cache.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Fetch the geofence collection and replace the cache with it.
    ///
    /// Returns the new contents, or an empty vec when there is no
    /// connector or the request fails in any way. Concurrent calls are
    /// not de-duplicated; the last one to complete wins.
    pub async fn fetch_geofences(&self) -> Vec<Geofence> {
        let Some(connector) = self.connector.as_ref() else {
            warn!("No connector available, skipping geofence fetch");
            return Vec::new();
        };

        self.tracker.request_start(REQUEST_LABEL);

        match self.request(connector.as_ref()).await {
            Ok(geofences) => {
                {
                    let mut cache = self.write();
                    cache.geofences = geofences.clone();
                    cache.loaded_at = Some(Utc::now());
                }
                self.tracker.request_end(REQUEST_LABEL);
                info!(count = geofences.len(), "Loaded geofences");
                geofences
            }
            Err(e) => {
                error!(error = %e, "Failed to fetch geofences");
                self.tracker.request_failed(&e);
                Vec::new()
            }
        }
    }

    async fn request(&self, connector: &dyn Connector) -> Result<Vec<Geofence>, ApiError> {
        let response = connector.get(GEOFENCES_PATH).await?;
        let body = response.data;

        let result = match Envelope::from_body(&body).and_then(Envelope::into_result_array) {
            Some(items) => items,
            None => {
                // Gateway failures often come back as `{"errors": [...]}` alone
                self.tracker.errors_check(&body)?;
                let shape = describe_shape(&body);
                warn!(shape = %shape, "Unrecognized geofences response shape");
                return Err(ApiError::InvalidResponse(format!(
                    "expected an envelope with a result array, got {}",
                    shape
                )));
            }
        };

        self.tracker.errors_check(&body)?;

        Ok(result.into_iter().map(Geofence::from_value).collect())
    }

    /// First cached geofence whose `id` equals `id`, or the empty record.
    pub fn geofence_by_id(&self, id: impl Into<Value>) -> Geofence {
        let id = id.into();
        self.read()
            .geofences
            .iter()
            .find(|g| g.has_id(&id))
            .cloned()
            .unwrap_or_default()
    }

    /// Empty the cache and mark it as not loaded.
    pub fn clear_geofences(&self) {
        let mut cache = self.write();
        cache.geofences.clear();
        cache.loaded_at = None;
    }

    pub fn is_loaded(&self) -> bool {
        self.read().loaded_at.is_some()
    }

    /// Snapshot of the cached geofences in API order.
    pub fn geofences(&self) -> Vec<Geofence> {
        self.read().geofences.clone()
    }

    pub fn len(&self) -> usize {
        self.read().geofences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().geofences.is_empty()
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.read().loaded_at
    }

    /// How long ago the cache was loaded, e.g. "5m ago", or "never".
    pub fn age_display(&self) -> String {
        match self.loaded_at() {
            Some(at) => format_age((Utc::now() - at).num_minutes()),
            None => "never".to_string(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;

    use crate::api::HttpResponse;
    use crate::tracker::check_envelope_errors;

    /// Connector that replays scripted responses, optionally after a delay.
    #[derive(Default)]
    struct ScriptedConnector {
        responses: Mutex<VecDeque<(Duration, Result<Value, ApiError>)>>,
        paths: Mutex<Vec<String>>,
    }

    impl ScriptedConnector {
        fn with(responses: Vec<Result<Value, ApiError>>) -> Arc<Self> {
            let scripted = responses.into_iter().map(|r| (Duration::ZERO, r)).collect();
            Arc::new(Self {
                responses: Mutex::new(scripted),
                paths: Mutex::new(Vec::new()),
            })
        }

        fn delayed(responses: Vec<(Duration, Value)>) -> Arc<Self> {
            let scripted = responses.into_iter().map(|(d, v)| (d, Ok(v))).collect();
            Arc::new(Self {
                responses: Mutex::new(scripted),
                paths: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Connector for ScriptedConnector {
        async fn get(&self, path: &str) -> Result<HttpResponse, ApiError> {
            self.paths.lock().unwrap().push(path.to_string());
            let (delay, next) = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected request");
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            next.map(HttpResponse::ok)
        }
    }

    #[derive(Default)]
    struct RecordingTracker {
        events: Mutex<Vec<String>>,
    }

    impl RecordingTracker {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }

        fn failures(&self) -> usize {
            self.events().iter().filter(|e| e.starts_with("fail:")).count()
        }
    }

    impl RequestTracker for RecordingTracker {
        fn request_start(&self, label: &str) {
            self.events.lock().unwrap().push(format!("start:{}", label));
        }

        fn request_end(&self, label: &str) {
            self.events.lock().unwrap().push(format!("end:{}", label));
        }

        fn request_failed(&self, error: &ApiError) {
            self.events.lock().unwrap().push(format!("fail:{}", error));
        }

        fn errors_check(&self, payload: &Value) -> Result<(), ApiError> {
            self.events.lock().unwrap().push("check".to_string());
            check_envelope_errors(payload)
        }
    }

    fn store_with(connector: Arc<ScriptedConnector>) -> (GeofenceStore, Arc<RecordingTracker>) {
        let tracker = Arc::new(RecordingTracker::default());
        let store = GeofenceStore::with_connector(connector, tracker.clone());
        (store, tracker)
    }

    fn two_geofences() -> Value {
        json!({"result": [{"id": "g1"}, {"id": "g2"}]})
    }

    #[tokio::test]
    async fn test_fetch_replaces_cache_in_order() {
        let connector = ScriptedConnector::with(vec![Ok(two_geofences())]);
        let (store, tracker) = store_with(connector.clone());

        let fetched = store.fetch_geofences().await;

        assert_eq!(fetched.len(), 2);
        assert_eq!(store.geofences(), fetched);
        assert_eq!(fetched[0].id(), Some(&json!("g1")));
        assert_eq!(fetched[1].id(), Some(&json!("g2")));
        assert!(store.is_loaded());
        assert!(store.loaded_at().is_some());
        assert_eq!(*connector.paths.lock().unwrap(), vec![GEOFENCES_PATH.to_string()]);
        assert_eq!(
            tracker.events(),
            vec!["start:get geofences", "check", "end:get geofences"]
        );
    }

    #[tokio::test]
    async fn test_lookup_after_fetch() {
        let (store, _) = store_with(ScriptedConnector::with(vec![Ok(two_geofences())]));
        store.fetch_geofences().await;

        assert_eq!(store.geofence_by_id("g2").into_value(), json!({"id": "g2"}));
        assert_eq!(store.geofence_by_id("g9").into_value(), json!({}));
    }

    #[tokio::test]
    async fn test_lookup_is_idempotent() {
        let (store, tracker) = store_with(ScriptedConnector::with(vec![Ok(two_geofences())]));
        store.fetch_geofences().await;
        let events_before = tracker.events();

        let first = store.geofence_by_id("g1");
        let second = store.geofence_by_id("g1");

        assert_eq!(first, second);
        assert_eq!(store.len(), 2);
        assert_eq!(tracker.events(), events_before);
    }

    #[tokio::test]
    async fn test_lookup_returns_first_match() {
        let body = json!({"result": [
            {"id": 5, "name": "first"},
            {"id": 5, "name": "second"}
        ]});
        let (store, _) = store_with(ScriptedConnector::with(vec![Ok(body)]));
        store.fetch_geofences().await;

        assert_eq!(store.geofence_by_id(5).name(), Some("first"));
        assert!(store.geofence_by_id("5").is_empty());
    }

    #[test]
    fn test_lookup_on_empty_cache() {
        let store = GeofenceStore::without_connector(Arc::new(RecordingTracker::default()));
        assert!(store.geofence_by_id("anything").is_empty());
        assert!(store.is_empty());
        assert!(!store.is_loaded());
    }

    #[tokio::test]
    async fn test_no_connector_is_a_no_op() {
        let tracker = Arc::new(RecordingTracker::default());
        let store = GeofenceStore::without_connector(tracker.clone());

        let fetched = store.fetch_geofences().await;

        assert!(fetched.is_empty());
        assert!(store.is_empty());
        assert!(!store.is_loaded());
        assert!(tracker.events().is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_leaves_cache_untouched() {
        let connector = ScriptedConnector::with(vec![
            Ok(two_geofences()),
            Err(ApiError::ServerError("gateway down".to_string())),
        ]);
        let (store, tracker) = store_with(connector);
        store.fetch_geofences().await;

        let fetched = store.fetch_geofences().await;

        assert!(fetched.is_empty());
        assert_eq!(store.len(), 2);
        assert!(store.is_loaded());
        assert_eq!(tracker.failures(), 1);
        assert_eq!(tracker.events().last().unwrap(), "fail:Server error: gateway down");
    }

    #[tokio::test]
    async fn test_failure_on_empty_cache_stays_not_loaded() {
        let connector = ScriptedConnector::with(vec![Err(ApiError::Unauthorized)]);
        let (store, tracker) = store_with(connector);

        assert!(store.fetch_geofences().await.is_empty());
        assert!(!store.is_loaded());
        assert_eq!(tracker.failures(), 1);
    }

    #[tokio::test]
    async fn test_embedded_api_error_is_a_failure() {
        let body = json!({
            "result": [{"id": "g1"}],
            "errors": [{"code": 7, "reason": "token expired"}]
        });
        let (store, tracker) = store_with(ScriptedConnector::with(vec![Ok(body)]));

        let fetched = store.fetch_geofences().await;

        assert!(fetched.is_empty());
        assert!(store.is_empty());
        assert!(!store.is_loaded());
        assert_eq!(tracker.failures(), 1);
        assert_eq!(tracker.events().last().unwrap(), "fail:API error 7: token expired");
    }

    #[tokio::test]
    async fn test_unrecognized_shape_reports_invalid_response() {
        for body in [json!({"data": []}), json!({"result": null}), json!({"result": {"id": 1}}), json!([1, 2])] {
            let (store, tracker) = store_with(ScriptedConnector::with(vec![Ok(body)]));

            assert!(store.fetch_geofences().await.is_empty());
            assert!(!store.is_loaded());
            assert_eq!(tracker.failures(), 1);
            assert!(tracker.events().last().unwrap().starts_with("fail:Invalid response"));
        }
    }

    #[tokio::test]
    async fn test_irregular_embedded_errors_are_failures() {
        let bodies = [
            (
                json!({"result": [{"id": "g1"}], "errors": [{"code": "E42", "reason": "token expired"}]}),
                "fail:API error E42: token expired",
            ),
            (
                json!({"result": [{"id": "g1"}], "errors": [{"code": 7, "reason": "a"}, "oops"]}),
                "fail:API error 7: a (and 1 more)",
            ),
            (
                json!({"result": [{"id": "g1"}], "errors": [{"code": 1.5, "reason": "b"}]}),
                "fail:API error 1.5: b",
            ),
            (
                json!({"result": [{"id": "g1"}], "errors": "quota exceeded"}),
                "fail:API error unknown: quota exceeded",
            ),
        ];
        for (body, expected) in bodies {
            let (store, tracker) = store_with(ScriptedConnector::with(vec![Ok(body)]));

            assert!(store.fetch_geofences().await.is_empty());
            assert!(store.is_empty());
            assert!(!store.is_loaded());
            assert_eq!(tracker.failures(), 1);
            assert_eq!(tracker.events().last().unwrap(), expected);
        }
    }

    #[tokio::test]
    async fn test_errors_without_result_report_api_error() {
        let body = json!({"errors": [{"code": 1, "reason": "access denied"}]});
        let (store, tracker) = store_with(ScriptedConnector::with(vec![Ok(body)]));

        assert!(store.fetch_geofences().await.is_empty());
        assert_eq!(tracker.failures(), 1);
        assert_eq!(tracker.events().last().unwrap(), "fail:API error 1: access denied");
    }

    #[tokio::test]
    async fn test_empty_result_counts_as_loaded() {
        let (store, _) = store_with(ScriptedConnector::with(vec![Ok(json!({"result": []}))]));

        assert!(store.fetch_geofences().await.is_empty());
        assert!(store.is_loaded());
    }

    #[tokio::test]
    async fn test_refetch_replaces_wholesale() {
        let connector = ScriptedConnector::with(vec![
            Ok(two_geofences()),
            Ok(json!({"result": [{"id": "g3"}]})),
        ]);
        let (store, _) = store_with(connector);
        store.fetch_geofences().await;
        store.fetch_geofences().await;

        assert_eq!(store.len(), 1);
        assert!(store.geofence_by_id("g1").is_empty());
        assert_eq!(store.geofence_by_id("g3").display_id(), "g3");
    }

    #[tokio::test]
    async fn test_clear_resets_state() {
        let (store, _) = store_with(ScriptedConnector::with(vec![Ok(two_geofences())]));
        store.fetch_geofences().await;

        store.clear_geofences();

        assert!(store.geofence_by_id("g1").is_empty());
        assert!(!store.is_loaded());
        assert!(store.is_empty());
        assert_eq!(store.age_display(), "never");
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_fetches_last_completion_wins() {
        let connector = ScriptedConnector::delayed(vec![
            (Duration::from_millis(80), json!({"result": [{"id": "slow"}]})),
            (Duration::from_millis(5), json!({"result": [{"id": "fast"}]})),
        ]);
        let (store, _) = store_with(connector);

        let (slow, fast) = futures::join!(store.fetch_geofences(), store.fetch_geofences());

        assert_eq!(slow[0].display_id(), "slow");
        assert_eq!(fast[0].display_id(), "fast");
        assert_eq!(store.len(), 1);
        assert_eq!(store.geofences()[0].display_id(), "slow");
    }

    #[tokio::test]
    async fn test_age_display_after_fetch() {
        let (store, _) = store_with(ScriptedConnector::with(vec![Ok(two_geofences())]));
        assert_eq!(store.age_display(), "never");
        store.fetch_geofences().await;
        assert_eq!(store.age_display(), "just now");
    }
}
