/// Cluster tab lifecycle and debounced context switching
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::events::{ClusterEvent, EventPublisher, CONTEXT_SWITCH_REASON};
use super::models::{ClusterTab, TabCache, TabCacheUpdate, TabId};
use super::notify::Notifier;
use super::switcher::ContextSwitcher;

/// Default quiet period before a requested switch is executed
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone)]
pub struct TabManagerOptions {
    /// Quiet period collapsing bursts of switch requests into one call
    pub debounce: Duration,

    /// Force a switch for the first tab when no context was confirmed yet
    pub auto_switch_first_tab: bool,
}

impl Default for TabManagerOptions {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            auto_switch_first_tab: true,
        }
    }
}

/// Observable state of the context switch machinery
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchState {
    Idle,
    PendingSwitch { tab_id: TabId, deadline: Instant },
    Switching { tab_id: TabId },
}

struct PendingSwitch {
    generation: u64,
    tab_id: TabId,
    deadline: Instant,
    handle: JoinHandle<()>,
}

/// Switch currently awaiting the backend
struct InFlight {
    generation: u64,
    tab_id: TabId,
}

#[derive(Default)]
struct TabState {
    clusters: Vec<String>,
    tabs: Vec<ClusterTab>,
    active: Option<TabId>,
    next_sequence: u64,
    last_confirmed: Option<String>,
    in_flight: Option<InFlight>,
    pending: Option<PendingSwitch>,
    generation: u64,
}

impl TabState {
    fn tab(&self, tab_id: &TabId) -> Option<&ClusterTab> {
        self.tabs.iter().find(|t| &t.id == tab_id)
    }

    fn tab_mut(&mut self, tab_id: &TabId) -> Option<&mut ClusterTab> {
        self.tabs.iter_mut().find(|t| &t.id == tab_id)
    }

    fn active_tab(&self) -> Option<&ClusterTab> {
        self.active.as_ref().and_then(|id| self.tab(id))
    }

    fn create_tab(&mut self) -> TabId {
        self.next_sequence += 1;
        let cluster = self.clusters.first().cloned().unwrap_or_default();
        let tab = ClusterTab::new(self.next_sequence, cluster);
        let id = tab.id.clone();
        self.tabs.push(tab);
        id
    }

    fn cancel_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            debug!("Cancelling pending switch for {}", pending.tab_id);
            pending.handle.abort();
        }
    }
}

struct Shared {
    state: Mutex<TabState>,
    switcher: Arc<dyn ContextSwitcher>,
    events: Arc<dyn EventPublisher>,
    notifier: Arc<dyn Notifier>,
    options: TabManagerOptions,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, TabState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Body of a debounced switch once its quiet period elapsed
    async fn run_switch(self: Arc<Self>, generation: u64, tab_id: TabId, cluster: String) {
        {
            let mut state = self.lock();
            match &state.pending {
                Some(pending) if pending.generation == generation => {}
                _ => return,
            }
            state.pending = None;
            state.in_flight = Some(InFlight {
                generation,
                tab_id: tab_id.clone(),
            });
            state.last_confirmed = Some(cluster.clone());
        }

        info!("Switching to tab context: {}", cluster);
        let outcome = self.switcher.switch_context(&cluster).await;

        {
            // A newer forced switch may have started meanwhile; it owns the state
            let mut state = self.lock();
            let current = state
                .in_flight
                .as_ref()
                .is_some_and(|in_flight| in_flight.generation == generation);
            if current {
                state.in_flight = None;
                state.last_confirmed = outcome.is_ok().then(|| cluster.clone());
            } else {
                debug!("Switch to {} superseded before completion", cluster);
            }
        }

        match outcome {
            Ok(()) => {
                info!("Context switched successfully to: {}", cluster);
                self.notifier
                    .success(&format!("Context switched to: {}", cluster));
                self.events.publish(ClusterEvent::ClusterChanged {
                    cluster: cluster.clone(),
                    tab_id: tab_id.clone(),
                });
                self.events.publish(ClusterEvent::ForceRescan {
                    cluster,
                    tab_id,
                    reason: CONTEXT_SWITCH_REASON.to_string(),
                });
            }
            Err(e) => {
                error!("Error switching context to {}: {}", cluster, e);
                self.notifier
                    .error(&format!("Failed to switch context: {}", e));
            }
        }
    }
}

/// Owns a set of cluster tabs and keeps the remote context in step with the
/// active one.
///
/// Operations are fire-and-forget: switches run on spawned tasks, so every
/// method that may switch must be called from within a tokio runtime.
pub struct ClusterTabManager {
    shared: Arc<Shared>,
}

impl ClusterTabManager {
    /// Create a manager and synthesise the first tab if clusters are known
    pub fn new(
        clusters: Vec<String>,
        switcher: Arc<dyn ContextSwitcher>,
        events: Arc<dyn EventPublisher>,
        notifier: Arc<dyn Notifier>,
        options: TabManagerOptions,
    ) -> Self {
        let manager = Self {
            shared: Arc::new(Shared {
                state: Mutex::new(TabState::default()),
                switcher,
                events,
                notifier,
                options,
            }),
        };
        manager.set_clusters(clusters);
        manager
    }

    fn lock(&self) -> MutexGuard<'_, TabState> {
        self.shared.lock()
    }

    /// Replace the known cluster list
    pub fn set_clusters(&self, clusters: Vec<String>) {
        self.lock().clusters = clusters;
        self.initialize_first_tab();
    }

    /// Create the first tab, bound to the first cluster, if none exists yet
    pub fn initialize_first_tab(&self) {
        let (tab_id, auto_switch) = {
            let mut state = self.lock();
            if state.clusters.is_empty() || !state.tabs.is_empty() {
                return;
            }
            let tab_id = state.create_tab();
            state.active = Some(tab_id.clone());
            info!("Created first tab {} for {}", tab_id, state.clusters[0]);
            let auto_switch =
                self.shared.options.auto_switch_first_tab && state.last_confirmed.is_none();
            (tab_id, auto_switch)
        };

        if auto_switch {
            self.switch_to_tab_context(&tab_id, true);
        }
    }

    /// Schedule a switch of the remote context to the tab's cluster.
    ///
    /// Without `force`, the request is dropped while a switch is in flight or
    /// when the tab's cluster is already the confirmed context. Any pending
    /// request is replaced.
    pub fn switch_to_tab_context(&self, tab_id: &TabId, force: bool) {
        let mut state = self.lock();
        let cluster = match state.tab(tab_id) {
            Some(tab) if !tab.cluster.is_empty() => tab.cluster.clone(),
            _ => return,
        };

        if !force
            && (state.in_flight.is_some()
                || state.last_confirmed.as_deref() == Some(cluster.as_str()))
        {
            debug!("Skipping duplicate switch to: {}", cluster);
            return;
        }

        state.cancel_pending();

        state.generation += 1;
        let generation = state.generation;
        let deadline = Instant::now() + self.shared.options.debounce;
        let shared = Arc::clone(&self.shared);
        let task_tab = tab_id.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            shared.run_switch(generation, task_tab, cluster).await;
        });

        state.pending = Some(PendingSwitch {
            generation,
            tab_id: tab_id.clone(),
            deadline,
            handle,
        });
    }

    /// Activate a tab and switch to its cluster
    pub fn handle_tab_change(&self, tab_id: &TabId) {
        {
            let mut state = self.lock();
            if state.active.as_ref() == Some(tab_id) {
                return;
            }
            if state.tab(tab_id).is_none() {
                warn!("Ignoring change to unknown tab {}", tab_id);
                return;
            }
            state.active = Some(tab_id.clone());
        }
        self.switch_to_tab_context(tab_id, false);
    }

    /// Append a tab bound to the first known cluster and activate it
    pub fn add_tab(&self) -> TabId {
        let tab_id = self.lock().create_tab();
        self.handle_tab_change(&tab_id);
        tab_id
    }

    /// Remove a tab; if it was active, its predecessor (or the new first tab)
    /// becomes active
    pub fn remove_tab(&self, tab_id: &TabId) {
        let replacement = {
            let mut state = self.lock();
            let Some(index) = state.tabs.iter().position(|t| &t.id == tab_id) else {
                return;
            };
            state.tabs.remove(index);

            if state.pending.as_ref().is_some_and(|p| &p.tab_id == tab_id) {
                state.cancel_pending();
            }

            if state.active.as_ref() != Some(tab_id) {
                return;
            }

            if state.tabs.is_empty() {
                state.active = None;
                return;
            }

            let replacement = state.tabs[index.saturating_sub(1)].id.clone();
            state.active = Some(replacement.clone());
            replacement
        };

        self.switch_to_tab_context(&replacement, false);
    }

    /// Rebind a tab to another cluster; for the active tab this forces a switch
    pub fn change_tab_cluster(&self, tab_id: &TabId, new_cluster: &str) {
        let is_active = {
            let mut state = self.lock();
            let Some(tab) = state.tab_mut(tab_id) else {
                return;
            };
            if tab.cluster == new_cluster {
                return;
            }
            tab.cluster = new_cluster.to_string();
            state.active.as_ref() == Some(tab_id)
        };

        if is_active {
            info!(
                "Active tab cluster changed, switching context to: {}",
                new_cluster
            );
            self.switch_to_tab_context(tab_id, true);
            self.shared.events.publish(ClusterEvent::ClusterChanged {
                cluster: new_cluster.to_string(),
                tab_id: tab_id.clone(),
            });
        }
    }

    /// Merge cached data into a tab's snapshot
    pub fn save_tab_cache(&self, tab_id: &TabId, update: TabCacheUpdate) {
        let mut state = self.lock();
        match state.tab_mut(tab_id) {
            Some(tab) => {
                debug!("Saving cache for tab {}", tab_id);
                tab.cache.apply(update);
            }
            None => warn!("Ignoring cache update for unknown tab {}", tab_id),
        }
    }

    /// Snapshot of the active tab's cache, or an empty cache without one
    pub fn active_tab_cache(&self) -> TabCache {
        self.lock()
            .active_tab()
            .map(|tab| tab.cache.clone())
            .unwrap_or_default()
    }

    pub fn tabs(&self) -> Vec<ClusterTab> {
        self.lock().tabs.clone()
    }

    pub fn active_tab_id(&self) -> Option<TabId> {
        self.lock().active.clone()
    }

    /// Cluster of the active tab; empty when there is none
    pub fn active_cluster(&self) -> String {
        self.lock()
            .active_tab()
            .map(|tab| tab.cluster.clone())
            .unwrap_or_default()
    }

    pub fn is_context_switching(&self) -> bool {
        self.lock().in_flight.is_some()
    }

    pub fn last_confirmed_cluster(&self) -> Option<String> {
        self.lock().last_confirmed.clone()
    }

    pub fn switch_state(&self) -> SwitchState {
        let state = self.lock();
        if let Some(in_flight) = &state.in_flight {
            return SwitchState::Switching {
                tab_id: in_flight.tab_id.clone(),
            };
        }
        match &state.pending {
            Some(pending) => SwitchState::PendingSwitch {
                tab_id: pending.tab_id.clone(),
                deadline: pending.deadline,
            },
            None => SwitchState::Idle,
        }
    }

    /// Cancel any pending switch; one already in flight runs to completion
    pub fn shutdown(&self) {
        self.lock().cancel_pending();
    }
}

impl Drop for ClusterTabManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tabs::switcher::SwitchError;
    use futures::future::BoxFuture;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Default)]
    struct RecordingSwitcher {
        calls: Mutex<Vec<String>>,
        fail: AtomicBool,
        failing_cluster: Option<&'static str>,
        delay: Option<Duration>,
    }

    impl RecordingSwitcher {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ContextSwitcher for RecordingSwitcher {
        fn switch_context<'a>(
            &'a self,
            cluster: &'a str,
        ) -> BoxFuture<'a, Result<(), SwitchError>> {
            Box::pin(async move {
                self.calls.lock().unwrap().push(cluster.to_string());
                if let Some(delay) = self.delay {
                    tokio::time::sleep(delay).await;
                }
                if self.fail.load(Ordering::SeqCst) || self.failing_cluster == Some(cluster) {
                    Err(SwitchError::Command("context not found".to_string()))
                } else {
                    Ok(())
                }
            })
        }
    }

    #[derive(Default)]
    struct RecordingEvents {
        events: Mutex<Vec<ClusterEvent>>,
    }

    impl RecordingEvents {
        fn events(&self) -> Vec<ClusterEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    impl EventPublisher for RecordingEvents {
        fn publish(&self, event: ClusterEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        successes: Mutex<Vec<String>>,
        errors: Mutex<Vec<String>>,
    }

    impl Notifier for RecordingNotifier {
        fn success(&self, message: &str) {
            self.successes.lock().unwrap().push(message.to_string());
        }

        fn error(&self, message: &str) {
            self.errors.lock().unwrap().push(message.to_string());
        }
    }

    struct Harness {
        manager: ClusterTabManager,
        switcher: Arc<RecordingSwitcher>,
        events: Arc<RecordingEvents>,
        notifier: Arc<RecordingNotifier>,
    }

    fn harness_with(clusters: &[&str], switcher: RecordingSwitcher, auto_switch: bool) -> Harness {
        let switcher = Arc::new(switcher);
        let events = Arc::new(RecordingEvents::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let manager = ClusterTabManager::new(
            clusters.iter().map(|c| c.to_string()).collect(),
            switcher.clone(),
            events.clone(),
            notifier.clone(),
            TabManagerOptions {
                debounce: DEFAULT_DEBOUNCE,
                auto_switch_first_tab: auto_switch,
            },
        );
        Harness {
            manager,
            switcher,
            events,
            notifier,
        }
    }

    fn harness(clusters: &[&str]) -> Harness {
        harness_with(clusters, RecordingSwitcher::default(), false)
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(400)).await;
    }

    fn tab(n: u64) -> TabId {
        TabId::from_sequence(n)
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tab_created_for_first_cluster() {
        let h = harness(&["a", "b"]);
        let tabs = h.manager.tabs();
        assert_eq!(tabs.len(), 1);
        assert_eq!(tabs[0].cluster, "a");
        assert_eq!(h.manager.active_tab_id(), Some(tabs[0].id.clone()));
        assert_eq!(h.manager.active_cluster(), "a");
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_tab_without_clusters() {
        let h = harness(&[]);
        assert!(h.manager.tabs().is_empty());
        assert_eq!(h.manager.active_tab_id(), None);
        assert_eq!(h.manager.active_cluster(), "");

        h.manager.set_clusters(vec!["a".to_string()]);
        assert_eq!(h.manager.tabs().len(), 1);

        // Already initialised: a new list does not add tabs
        h.manager.set_clusters(vec!["b".to_string()]);
        assert_eq!(h.manager.tabs().len(), 1);
        assert_eq!(h.manager.active_cluster(), "a");
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_switch_first_tab() {
        let h = harness_with(&["a", "b"], RecordingSwitcher::default(), true);
        assert!(matches!(
            h.manager.switch_state(),
            SwitchState::PendingSwitch { .. }
        ));
        settle().await;
        assert_eq!(h.switcher.calls(), vec!["a"]);
        assert_eq!(h.manager.last_confirmed_cluster().as_deref(), Some("a"));
        assert_eq!(h.manager.switch_state(), SwitchState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_switches_collapse_into_one_call() {
        let h = harness(&["a", "b"]);
        let id = tab(1);

        h.manager.switch_to_tab_context(&id, false);
        tokio::time::sleep(Duration::from_millis(100)).await;
        h.manager.switch_to_tab_context(&id, false);
        tokio::time::sleep(Duration::from_millis(100)).await;
        h.manager.switch_to_tab_context(&id, false);

        assert!(h.switcher.calls().is_empty());
        settle().await;
        assert_eq!(h.switcher.calls(), vec!["a"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_uses_last_requested_tab() {
        let h = harness(&["a", "b"]);
        let second = h.manager.add_tab();
        h.manager.change_tab_cluster(&second, "b");
        tokio::time::sleep(Duration::from_millis(50)).await;

        h.manager.handle_tab_change(&tab(1));
        settle().await;
        assert_eq!(h.switcher.calls(), vec!["a"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_switch_publishes_events() {
        let h = harness(&["a"]);
        h.manager.switch_to_tab_context(&tab(1), false);
        settle().await;

        assert_eq!(
            h.events.events(),
            vec![
                ClusterEvent::ClusterChanged {
                    cluster: "a".to_string(),
                    tab_id: tab(1),
                },
                ClusterEvent::ForceRescan {
                    cluster: "a".to_string(),
                    tab_id: tab(1),
                    reason: CONTEXT_SWITCH_REASON.to_string(),
                },
            ]
        );
        assert_eq!(
            *h.notifier.successes.lock().unwrap(),
            vec!["Context switched to: a".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_context_is_not_switched_twice() {
        let h = harness(&["a"]);
        h.manager.switch_to_tab_context(&tab(1), false);
        settle().await;
        h.manager.switch_to_tab_context(&tab(1), false);
        settle().await;
        assert_eq!(h.switcher.calls(), vec!["a"]);

        h.manager.switch_to_tab_context(&tab(1), true);
        settle().await;
        assert_eq!(h.switcher.calls(), vec!["a", "a"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_switch_allows_retry() {
        let switcher = RecordingSwitcher::default();
        switcher.fail.store(true, Ordering::SeqCst);
        let h = harness_with(&["a"], switcher, false);

        h.manager.switch_to_tab_context(&tab(1), false);
        settle().await;
        assert_eq!(h.manager.last_confirmed_cluster(), None);
        assert!(!h.manager.is_context_switching());
        assert!(h.events.events().is_empty());
        assert_eq!(h.notifier.errors.lock().unwrap().len(), 1);

        h.switcher.fail.store(false, Ordering::SeqCst);
        h.manager.switch_to_tab_context(&tab(1), false);
        settle().await;
        assert_eq!(h.switcher.calls(), vec!["a", "a"]);
        assert_eq!(h.manager.last_confirmed_cluster().as_deref(), Some("a"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_switch_blocks_unforced_requests() {
        let switcher = RecordingSwitcher {
            delay: Some(Duration::from_secs(2)),
            ..Default::default()
        };
        let h = harness_with(&["a", "b"], switcher, false);
        let second = h.manager.add_tab();
        h.manager.change_tab_cluster(&second, "b");
        h.manager.handle_tab_change(&tab(1));

        // Let the switch to "a" start
        tokio::time::sleep(Duration::from_millis(350)).await;
        assert!(h.manager.is_context_switching());
        assert_eq!(h.manager.switch_state(), SwitchState::Switching { tab_id: tab(1) });

        h.manager.handle_tab_change(&second);
        assert_eq!(h.manager.active_tab_id(), Some(second.clone()));
        assert!(matches!(h.manager.switch_state(), SwitchState::Switching { .. }));

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(h.switcher.calls(), vec!["a"]);
        assert!(!h.manager.is_context_switching());
    }

    #[tokio::test(start_paused = true)]
    async fn test_handle_tab_change_ignores_active_tab() {
        let h = harness(&["a"]);
        h.manager.handle_tab_change(&tab(1));
        settle().await;
        assert!(h.switcher.calls().is_empty());

        h.manager.handle_tab_change(&TabId::from("missing"));
        assert_eq!(h.manager.active_tab_id(), Some(tab(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_tab_activates_new_tab() {
        let h = harness(&["a", "b"]);
        let id = h.manager.add_tab();
        assert_eq!(id, tab(2));
        assert_eq!(h.manager.active_tab_id(), Some(id.clone()));

        let tabs = h.manager.tabs();
        assert_eq!(tabs.len(), 2);
        assert_eq!(tabs[1].cluster, "a");
        assert_eq!(tabs[1].label, "Cluster 2");

        settle().await;
        assert_eq!(h.switcher.calls(), vec!["a"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_tab_without_clusters_has_empty_binding() {
        let h = harness(&[]);
        let id = h.manager.add_tab();
        assert_eq!(h.manager.tabs()[0].cluster, "");
        assert_eq!(h.manager.active_tab_id(), Some(id));
        settle().await;
        assert!(h.switcher.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_tab_ids_are_never_reused() {
        let h = harness(&["a"]);
        let second = h.manager.add_tab();
        h.manager.remove_tab(&second);
        let third = h.manager.add_tab();
        assert_ne!(second, third);
        assert_eq!(third, tab(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_active_tab_promotes_previous() {
        let h = harness(&["a", "b", "c"]);
        let second = h.manager.add_tab();
        let third = h.manager.add_tab();
        h.manager.change_tab_cluster(&second, "b");
        h.manager.change_tab_cluster(&third, "c");
        settle().await;

        h.manager.handle_tab_change(&second);
        settle().await;

        h.manager.remove_tab(&second);
        let ids: Vec<_> = h.manager.tabs().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![tab(1), third.clone()]);
        assert_eq!(h.manager.active_tab_id(), Some(tab(1)));

        settle().await;
        assert_eq!(h.switcher.calls().last().map(String::as_str), Some("a"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_first_active_tab_promotes_new_first() {
        let h = harness(&["a"]);
        let second = h.manager.add_tab();
        h.manager.handle_tab_change(&tab(1));
        h.manager.remove_tab(&tab(1));
        assert_eq!(h.manager.active_tab_id(), Some(second));
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_inactive_and_last_tab() {
        let h = harness(&["a"]);
        let second = h.manager.add_tab();
        h.manager.remove_tab(&tab(1));
        assert_eq!(h.manager.active_tab_id(), Some(second.clone()));
        assert_eq!(h.manager.tabs().len(), 1);

        h.manager.remove_tab(&second);
        assert!(h.manager.tabs().is_empty());
        assert_eq!(h.manager.active_tab_id(), None);
        assert_eq!(h.manager.active_tab_cache(), TabCache::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_tab_cancels_its_pending_switch() {
        let h = harness(&["a", "b"]);
        let second = h.manager.add_tab();
        h.manager.change_tab_cluster(&second, "b");
        h.manager.remove_tab(&second);
        settle().await;
        // Replacement tab's cluster "a" was never confirmed, so it is switched
        assert_eq!(h.switcher.calls(), vec!["a"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_change_active_tab_cluster_forces_switch() {
        let h = harness(&["a", "b"]);
        h.manager.switch_to_tab_context(&tab(1), false);
        settle().await;

        h.manager.change_tab_cluster(&tab(1), "b");
        assert_eq!(h.manager.active_cluster(), "b");
        assert_eq!(
            h.events.events().last(),
            Some(&ClusterEvent::ClusterChanged {
                cluster: "b".to_string(),
                tab_id: tab(1),
            })
        );

        settle().await;
        assert_eq!(h.switcher.calls(), vec!["a", "b"]);
        assert_eq!(h.manager.last_confirmed_cluster().as_deref(), Some("b"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_change_cluster_forces_switch_while_in_flight() {
        let switcher = RecordingSwitcher {
            delay: Some(Duration::from_secs(1)),
            ..Default::default()
        };
        let h = harness_with(&["a", "b"], switcher, false);
        h.manager.switch_to_tab_context(&tab(1), false);
        tokio::time::sleep(Duration::from_millis(350)).await;
        assert!(h.manager.is_context_switching());

        h.manager.change_tab_cluster(&tab(1), "b");
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(h.switcher.calls(), vec!["a", "b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_older_completion_keeps_newer_switch_in_flight() {
        let switcher = RecordingSwitcher {
            delay: Some(Duration::from_secs(1)),
            ..Default::default()
        };
        let h = harness_with(&["a", "b"], switcher, false);
        h.manager.switch_to_tab_context(&tab(1), true);
        tokio::time::sleep(Duration::from_millis(350)).await;
        h.manager.change_tab_cluster(&tab(1), "b");

        // "a" finished at 1300ms, "b" runs until 1650ms
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(h.switcher.calls(), vec!["a", "b"]);
        assert!(h.manager.is_context_switching());
        assert_eq!(
            h.manager.switch_state(),
            SwitchState::Switching { tab_id: tab(1) }
        );

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(h.manager.switch_state(), SwitchState::Idle);
        assert_eq!(h.manager.last_confirmed_cluster().as_deref(), Some("b"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_older_failure_keeps_newer_confirmation() {
        let switcher = RecordingSwitcher {
            failing_cluster: Some("fail-me"),
            delay: Some(Duration::from_secs(1)),
            ..Default::default()
        };
        let h = harness_with(&["fail-me", "b"], switcher, false);
        h.manager.switch_to_tab_context(&tab(1), true);
        tokio::time::sleep(Duration::from_millis(350)).await;
        h.manager.change_tab_cluster(&tab(1), "b");
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(h.switcher.calls(), vec!["fail-me", "b"]);
        assert_eq!(
            *h.notifier.errors.lock().unwrap(),
            vec!["Failed to switch context: context not found".to_string()]
        );
        assert_eq!(
            *h.notifier.successes.lock().unwrap(),
            vec!["Context switched to: b".to_string()]
        );
        assert_eq!(h.manager.last_confirmed_cluster().as_deref(), Some("b"));
        assert!(!h.manager.is_context_switching());
    }

    #[tokio::test(start_paused = true)]
    async fn test_change_inactive_or_same_cluster() {
        let h = harness(&["a", "b"]);
        let second = h.manager.add_tab();
        h.manager.handle_tab_change(&tab(1));
        settle().await;
        let before = h.events.events().len();

        h.manager.change_tab_cluster(&second, "b");
        h.manager.change_tab_cluster(&tab(1), "a");
        settle().await;

        assert_eq!(h.manager.tabs()[1].cluster, "b");
        assert_eq!(h.events.events().len(), before);
        assert_eq!(h.switcher.calls(), vec!["a"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tab_cache_is_per_tab() {
        let h = harness(&["a"]);
        let second = h.manager.add_tab();

        h.manager.save_tab_cache(
            &tab(1),
            TabCacheUpdate {
                selected_namespace: Some("payments".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(h.manager.active_tab_cache(), TabCache::default());

        h.manager.handle_tab_change(&tab(1));
        assert_eq!(h.manager.active_tab_cache().selected_namespace, "payments");

        h.manager.handle_tab_change(&second);
        assert_eq!(h.manager.active_tab_cache().selected_namespace, "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_pending_switch() {
        let h = harness(&["a"]);
        h.manager.switch_to_tab_context(&tab(1), false);
        h.manager.shutdown();
        settle().await;
        assert!(h.switcher.calls().is_empty());
        assert_eq!(h.manager.switch_state(), SwitchState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_pending_switch() {
        let h = harness(&["a"]);
        h.manager.switch_to_tab_context(&tab(1), false);
        let switcher = h.switcher.clone();
        drop(h);
        settle().await;
        assert!(switcher.calls().is_empty());
    }
}
