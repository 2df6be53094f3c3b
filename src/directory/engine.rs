//! Directory query engine. Applies filter criteria to a worker snapshot.
//!
//! One engine backs one directory view. It owns its snapshot outright and is
//! driven through `&mut self` from a single event loop, so there is no
//! locking here. Filters are criteria rather than indices, which means a
//! snapshot can be swapped underneath them at any time.

use tracing::{debug, info, warn};

use crate::navigation::{Destination, NavigationIntent};
use crate::store::ProfileStore;

use super::model::{DirectorySnapshot, FilterCriteria, WorkerProfile};

/// What a directory screen should render right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryView<'a> {
    /// Snapshot is still being fetched.
    Loading,
    /// Fetch finished and nothing passed the filters.
    Empty,
    /// Fetch finished with at least one visible worker.
    Workers(Vec<&'a WorkerProfile>),
}

/// What a worker card offers the current user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardAction {
    /// The card is the current user's own profile; no request button.
    SelfCard,
    /// Show "Request Job", navigating here when pressed.
    RequestJob(NavigationIntent),
}

/// Pure self-request guard: a user may request anyone but themselves.
pub fn can_request(current_user_id: &str, target_worker_id: &str) -> bool {
    current_user_id != target_worker_id
}

/// Filterable worker directory for one view.
#[derive(Debug, Default)]
pub struct DirectoryEngine {
    snapshot: DirectorySnapshot,
    criteria: FilterCriteria,
    loading: bool,
}

impl DirectoryEngine {
    /// Engine with an empty snapshot that is not loading.
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine preloaded with `snapshot`.
    pub fn with_snapshot(snapshot: impl Into<DirectorySnapshot>) -> Self {
        Self {
            snapshot: snapshot.into(),
            ..Self::default()
        }
    }

    pub fn snapshot(&self) -> &DirectorySnapshot {
        &self.snapshot
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Mark a fetch as outstanding.
    pub fn begin_loading(&mut self) {
        self.loading = true;
    }

    /// Replace the snapshot and finish loading. Criteria are kept.
    pub fn load(&mut self, snapshot: impl Into<DirectorySnapshot>) {
        self.snapshot = snapshot.into();
        self.loading = false;
        debug!(workers = self.snapshot.len(), "Directory snapshot loaded");
    }

    /// Fetch a fresh snapshot from the store.
    ///
    /// A store failure leaves an empty snapshot so the view shows
    /// "no workers found" instead of spinning forever.
    pub async fn refresh(&mut self, store: &dyn ProfileStore) {
        self.begin_loading();
        match store.list_workers().await {
            Ok(workers) => {
                info!(count = workers.len(), "Directory refreshed");
                self.load(workers);
            }
            Err(e) => {
                warn!(error = %e, "Failed to list workers, showing empty directory");
                self.load(DirectorySnapshot::default());
            }
        }
    }

    /// Workers passing the current criteria, in snapshot order.
    pub fn visible_workers(&self) -> Vec<&WorkerProfile> {
        self.snapshot
            .profiles()
            .iter()
            .filter(|p| self.criteria.matches(p))
            .collect()
    }

    /// Loading and emptiness, reported separately.
    pub fn view(&self) -> DirectoryView<'_> {
        if self.loading {
            return DirectoryView::Loading;
        }
        let visible = self.visible_workers();
        if visible.is_empty() {
            DirectoryView::Empty
        } else {
            DirectoryView::Workers(visible)
        }
    }

    pub fn set_search_text(&mut self, text: impl Into<String>) {
        self.criteria.search_text = text.into();
    }

    pub fn set_work_type(&mut self, work_type: impl Into<String>) {
        self.criteria.work_type = work_type.into();
    }

    pub fn set_location(&mut self, location: impl Into<String>) {
        self.criteria.location = location.into();
    }

    /// Replace all criteria at once.
    pub fn set_filters(&mut self, criteria: FilterCriteria) {
        self.criteria = criteria;
    }

    /// Reset search, work type, and location together.
    pub fn clear_filters(&mut self) {
        self.criteria = FilterCriteria::default();
    }

    pub fn can_request(&self, current_user_id: &str, target_worker_id: &str) -> bool {
        can_request(current_user_id, target_worker_id)
    }

    /// Decide whether `worker`'s card shows "This is you" or a request button.
    pub fn card_action(&self, current_user_id: &str, worker: &WorkerProfile) -> CardAction {
        if self.can_request(current_user_id, &worker.id) {
            CardAction::RequestJob(NavigationIntent::to(Destination::RequestJob {
                worker_id: worker.id.clone(),
            }))
        } else {
            CardAction::SelfCard
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::{Map, Value};

    use super::*;
    use crate::directory::fixtures::seed_workers;
    use crate::error::DatabaseError;

    fn seeded() -> DirectoryEngine {
        DirectoryEngine::with_snapshot(seed_workers())
    }

    fn names(engine: &DirectoryEngine) -> Vec<&str> {
        engine
            .visible_workers()
            .iter()
            .map(|p| p.name.as_str())
            .collect()
    }

    #[test]
    fn no_criteria_returns_full_snapshot_in_order() {
        let engine = seeded();
        assert_eq!(
            names(&engine),
            vec![
                "Rahim Mia",
                "Karima Begum",
                "Shofiq Ahmed",
                "Nasrin Sultana",
                "Abdul Karim"
            ]
        );
    }

    #[test]
    fn search_is_case_insensitive_substring_on_work_type() {
        let mut engine = seeded();
        engine.set_search_text("PAINT");
        assert_eq!(names(&engine), vec!["Nasrin Sultana"]);

        engine.set_search_text("a");
        // Plumber has no "a"; everything else does.
        assert_eq!(
            names(&engine),
            vec!["Karima Begum", "Shofiq Ahmed", "Nasrin Sultana", "Abdul Karim"]
        );
    }

    #[test]
    fn work_type_an_matches_electrician_and_mason() {
        let mut engine = seeded();
        engine.set_work_type("an");
        assert_eq!(names(&engine), vec!["Karima Begum", "Abdul Karim"]);

        engine.set_work_type("son");
        assert_eq!(names(&engine), vec!["Abdul Karim"]);
    }

    #[test]
    fn inclusion_tracks_substring_for_every_profile() {
        let needles = ["er", "ter", "e", "x", "PLUMBER", "cian"];
        for needle in needles {
            let mut engine = seeded();
            engine.set_search_text(needle);
            let visible: Vec<&str> = engine.visible_workers().iter().map(|p| p.id.as_str()).collect();
            for profile in seed_workers() {
                let expected = profile
                    .work_type
                    .to_lowercase()
                    .contains(&needle.to_lowercase());
                assert_eq!(
                    visible.contains(&profile.id.as_str()),
                    expected,
                    "needle {needle:?} vs {}",
                    profile.work_type
                );
            }
        }
    }

    #[test]
    fn location_filter_combines_with_search() {
        let mut engine = seeded();
        engine.set_location("mo");
        // Mohammadpur, Dhanmondi, Motijheel
        assert_eq!(
            names(&engine),
            vec!["Shofiq Ahmed", "Nasrin Sultana", "Abdul Karim"]
        );

        engine.set_search_text("carp");
        assert_eq!(names(&engine), vec!["Shofiq Ahmed"]);
    }

    #[test]
    fn clear_filters_restores_full_set() {
        let mut engine = seeded();
        engine.set_search_text("mason");
        engine.set_work_type("ma");
        engine.set_location("moti");
        assert_eq!(engine.visible_workers().len(), 1);

        engine.clear_filters();
        assert!(engine.criteria().is_unconstrained());
        assert_eq!(engine.visible_workers().len(), 5);
    }

    #[test]
    fn set_filters_replaces_everything() {
        let mut engine = seeded();
        engine.set_location("Uttara");
        engine.set_filters(FilterCriteria {
            search_text: "plumb".into(),
            ..Default::default()
        });
        assert_eq!(names(&engine), vec!["Rahim Mia"]);
    }

    #[test]
    fn criteria_survive_snapshot_replacement() {
        let mut engine = seeded();
        engine.set_search_text("electric");
        assert_eq!(names(&engine), vec!["Karima Begum"]);

        engine.load(vec![
            WorkerProfile::new("w9", "Jamal Uddin", "Electrician", "Banani"),
            WorkerProfile::new("w10", "Rina Das", "Tailor", "Banani"),
        ]);
        assert_eq!(names(&engine), vec!["Jamal Uddin"]);
    }

    #[test]
    fn view_distinguishes_loading_from_empty() {
        let mut engine = DirectoryEngine::new();
        assert_eq!(engine.view(), DirectoryView::Empty);

        engine.begin_loading();
        assert!(engine.is_loading());
        assert_eq!(engine.view(), DirectoryView::Loading);

        engine.load(seed_workers());
        assert!(matches!(engine.view(), DirectoryView::Workers(w) if w.len() == 5));

        engine.set_search_text("welder");
        assert_eq!(engine.view(), DirectoryView::Empty);
    }

    #[test]
    fn guard_rejects_only_self() {
        for id in ["", "user123", "worker1"] {
            assert!(!can_request(id, id));
        }
        assert!(can_request("user123", "worker1"));
        assert!(can_request("worker1", "worker2"));
        assert!(can_request("", "worker2"));
    }

    #[test]
    fn card_action_for_self_and_others() {
        let engine = seeded();
        let me = engine.snapshot().get("worker2").unwrap();
        assert_eq!(engine.card_action("worker2", me), CardAction::SelfCard);

        match engine.card_action("user123", me) {
            CardAction::RequestJob(intent) => {
                assert_eq!(intent.destination.route(), "request_job/worker2");
                assert!(!intent.clear_history);
            }
            other => panic!("expected RequestJob, got {other:?}"),
        }
    }

    struct FailingStore;

    #[async_trait]
    impl ProfileStore for FailingStore {
        async fn list_workers(&self) -> Result<Vec<WorkerProfile>, DatabaseError> {
            Err(DatabaseError::Query("offline".into()))
        }
        async fn get_profile(&self, _id: &str) -> Result<Option<Map<String, Value>>, DatabaseError> {
            Ok(None)
        }
        async fn set_profile(&self, _id: &str, _fields: &Map<String, Value>) -> Result<(), DatabaseError> {
            Ok(())
        }
        async fn upsert_worker(&self, _worker: &WorkerProfile) -> Result<(), DatabaseError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn refresh_failure_yields_empty_not_loading() {
        let mut engine = seeded();
        engine.refresh(&FailingStore).await;
        assert!(!engine.is_loading());
        assert!(engine.snapshot().is_empty());
        assert_eq!(engine.view(), DirectoryView::Empty);
    }
}
