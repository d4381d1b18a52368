//! Ordered change-event queue with replay-and-clear semantics.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::events::{ChangeEvent, ChangeKind, ConfigurationListener, FireReport};
use crate::value::PropertyValue;

/// Records create/update/remove events in arrival order and notifies
/// registered listeners.
///
/// Recording an event queues it and synchronously invokes every currently
/// registered listener's matching callback. [`ChangeTracker::fire_all`]
/// later replays the whole queue in FIFO order to every listener and
/// clears it atomically: mutations racing with a drain land entirely in
/// the next one.
pub struct ChangeTracker {
    queue: Mutex<VecDeque<ChangeEvent>>,
    listeners: Mutex<Vec<Arc<dyn ConfigurationListener>>>,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn add_listener(&self, listener: Arc<dyn ConfigurationListener>) {
        self.listeners.lock().push(listener);
    }

    /// Remove a listener by pointer identity. Returns whether it was found.
    pub fn remove_listener(&self, listener: &Arc<dyn ConfigurationListener>) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|registered| !Arc::ptr_eq(registered, listener));
        listeners.len() < before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Number of events queued and not yet drained.
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Queue an event and synchronously notify current listeners.
    ///
    /// Dispatch happens after the queue lock is released, so a listener may
    /// re-enter the configuration (and record further events) without
    /// deadlocking.
    pub fn record(&self, event: ChangeEvent) {
        self.queue.lock().push_back(event.clone());
        let listeners = self.listeners.lock().clone();
        for listener in &listeners {
            dispatch(listener.as_ref(), &event);
        }
    }

    /// Drain the queue, replaying every event to every listener in FIFO
    /// order, and report what was delivered.
    pub fn fire_all(&self, configuration: &str, resource_uri: &str) -> FireReport {
        let drained: Vec<ChangeEvent> = {
            let mut queue = self.queue.lock();
            queue.drain(..).collect()
        };
        let listeners = self.listeners.lock().clone();

        let mut report = FireReport {
            configuration: configuration.to_string(),
            resource_uri: resource_uri.to_string(),
            created: 0,
            updated: 0,
            removed: 0,
            deliveries: 0,
        };
        for event in &drained {
            match event.kind {
                ChangeKind::Create => report.created += 1,
                ChangeKind::Update => report.updated += 1,
                ChangeKind::Remove => report.removed += 1,
            }
        }
        for listener in &listeners {
            for event in &drained {
                dispatch(listener.as_ref(), event);
                report.deliveries += 1;
            }
        }

        tracing::info!(
            configuration,
            resource_uri,
            created = report.created,
            updated = report.updated,
            removed = report.removed,
            deliveries = report.deliveries,
            "configuration changes fired"
        );
        report
    }

    /// Notify listeners that the configuration was unloaded.
    pub fn fire_unload(&self, source: &str) {
        let listeners = self.listeners.lock().clone();
        for listener in &listeners {
            listener.on_unload(source);
        }
    }
}

impl Default for ChangeTracker {
    fn default() -> Self {
        Self::new()
    }
}

fn dispatch(listener: &dyn ConfigurationListener, event: &ChangeEvent) {
    match event.kind {
        ChangeKind::Create => listener.on_create(event),
        ChangeKind::Update => listener.on_update(event),
        ChangeKind::Remove => listener.on_remove(event),
    }
}

/// Structural diff between two property snapshots, in a deterministic
/// order: removals and updates over the old key set first, then creations
/// over the new one.
///
/// Keys present in both snapshots with equal values emit nothing. Keys
/// only in the new snapshot emit Create events; a reload that observes a
/// brand-new key reports the same fact `set_property` would.
pub fn diff_snapshots(
    source: &str,
    old: &BTreeMap<String, PropertyValue>,
    new: &BTreeMap<String, PropertyValue>,
) -> Vec<ChangeEvent> {
    let mut events = Vec::new();
    for (key, old_value) in old {
        match new.get(key) {
            None => events.push(ChangeEvent::removed(source, key, old_value.clone())),
            Some(new_value) if new_value != old_value => events.push(ChangeEvent::updated(
                source,
                key,
                old_value.clone(),
                new_value.clone(),
            )),
            Some(_) => {}
        }
    }
    for (key, new_value) in new {
        if !old.contains_key(key) {
            events.push(ChangeEvent::created(source, key, new_value.clone()));
        }
    }
    events
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Test listener that records every callback it receives.
    #[derive(Default)]
    struct Recording {
        seen: Mutex<Vec<(ChangeKind, String)>>,
        unloads: AtomicUsize,
    }

    impl Recording {
        fn seen(&self) -> Vec<(ChangeKind, String)> {
            self.seen.lock().clone()
        }
    }

    impl ConfigurationListener for Recording {
        fn on_create(&self, event: &ChangeEvent) {
            self.seen.lock().push((ChangeKind::Create, event.key.clone()));
        }

        fn on_update(&self, event: &ChangeEvent) {
            self.seen.lock().push((ChangeKind::Update, event.key.clone()));
        }

        fn on_remove(&self, event: &ChangeEvent) {
            self.seen.lock().push((ChangeKind::Remove, event.key.clone()));
        }

        fn on_unload(&self, _source: &str) {
            self.unloads.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn snapshot(entries: &[(&str, i64)]) -> BTreeMap<String, PropertyValue> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), PropertyValue::Int(*v)))
            .collect()
    }

    fn init_tracing() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    }

    #[test]
    fn test_record_notifies_current_listeners() {
        let tracker = ChangeTracker::new();
        let listener = Arc::new(Recording::default());
        tracker.add_listener(listener.clone());

        tracker.record(ChangeEvent::created("cfg", "//a", PropertyValue::Int(1)));
        assert_eq!(listener.seen(), vec![(ChangeKind::Create, "//a".to_string())]);
        assert_eq!(tracker.pending(), 1);
    }

    #[test]
    fn test_fire_all_replays_in_fifo_order_and_clears() {
        init_tracing();
        let tracker = ChangeTracker::new();
        tracker.record(ChangeEvent::created("cfg", "//a", PropertyValue::Int(1)));
        tracker.record(ChangeEvent::updated(
            "cfg",
            "//b",
            PropertyValue::Int(1),
            PropertyValue::Int(2),
        ));
        tracker.record(ChangeEvent::removed("cfg", "//c", PropertyValue::Int(3)));

        // registered after the mutations: sees only the replay
        let listener = Arc::new(Recording::default());
        tracker.add_listener(listener.clone());

        let report = tracker.fire_all("cfg", "memory:/cfg.properties");
        assert_eq!(
            listener.seen(),
            vec![
                (ChangeKind::Create, "//a".to_string()),
                (ChangeKind::Update, "//b".to_string()),
                (ChangeKind::Remove, "//c".to_string()),
            ]
        );
        assert_eq!((report.created, report.updated, report.removed), (1, 1, 1));
        assert_eq!(report.deliveries, 3);
        assert_eq!(tracker.pending(), 0);

        // nothing new recorded in between: the second drain is empty
        let report = tracker.fire_all("cfg", "memory:/cfg.properties");
        assert_eq!(report.total(), 0);
        assert_eq!(listener.seen().len(), 3);
    }

    #[test]
    fn test_sequential_mutations_replay_in_mutation_order() {
        let tracker = ChangeTracker::new();
        for i in 0..10 {
            tracker.record(ChangeEvent::created(
                "cfg",
                &format!("//k{i}"),
                PropertyValue::Int(i),
            ));
        }
        let listener = Arc::new(Recording::default());
        tracker.add_listener(listener.clone());

        tracker.fire_all("cfg", "memory:/cfg.properties");
        let keys: Vec<String> = listener.seen().into_iter().map(|(_, k)| k).collect();
        let expected: Vec<String> = (0..10).map(|i| format!("//k{i}")).collect();
        assert_eq!(keys, expected);
    }

    #[test]
    fn test_remove_listener_by_identity() {
        let tracker = ChangeTracker::new();
        let first = Arc::new(Recording::default());
        let second = Arc::new(Recording::default());
        tracker.add_listener(first.clone());
        tracker.add_listener(second.clone());

        let as_dyn: Arc<dyn ConfigurationListener> = first.clone();
        assert!(tracker.remove_listener(&as_dyn));
        assert!(!tracker.remove_listener(&as_dyn));
        assert_eq!(tracker.listener_count(), 1);

        tracker.record(ChangeEvent::created("cfg", "//a", PropertyValue::Int(1)));
        assert!(first.seen().is_empty());
        assert_eq!(second.seen().len(), 1);
    }

    #[test]
    fn test_fire_unload_reaches_every_listener() {
        let tracker = ChangeTracker::new();
        let listener = Arc::new(Recording::default());
        tracker.add_listener(listener.clone());
        tracker.fire_unload("cfg");
        assert_eq!(listener.unloads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_diff_removed_and_updated() {
        let old = snapshot(&[("//a", 1), ("//b", 2)]);
        let new = snapshot(&[("//a", 1), ("//c", 3)]);
        let events = diff_snapshots("cfg", &old, &new);

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, ChangeKind::Remove);
        assert_eq!(events[0].key, "//b");
        assert_eq!(events[0].old_value, Some(PropertyValue::Int(2)));
        assert_eq!(events[1].kind, ChangeKind::Create);
        assert_eq!(events[1].key, "//c");
        assert_eq!(events[1].new_value, Some(PropertyValue::Int(3)));
    }

    #[test]
    fn test_diff_equal_values_emit_nothing() {
        let old = snapshot(&[("//a", 1)]);
        let new = snapshot(&[("//a", 1)]);
        assert!(diff_snapshots("cfg", &old, &new).is_empty());
    }

    #[test]
    fn test_diff_changed_value_is_an_update() {
        let old = snapshot(&[("//a", 1)]);
        let new = snapshot(&[("//a", 2)]);
        let events = diff_snapshots("cfg", &old, &new);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, ChangeKind::Update);
        assert_eq!(events[0].old_value, Some(PropertyValue::Int(1)));
        assert_eq!(events[0].new_value, Some(PropertyValue::Int(2)));
    }

    #[test]
    fn test_concurrent_records_all_arrive() {
        let tracker = Arc::new(ChangeTracker::new());
        let mut handles = Vec::new();
        for t in 0..4 {
            let tracker = tracker.clone();
            handles.push(std::thread::spawn(move || {
                for i in 0..50 {
                    tracker.record(ChangeEvent::created(
                        "cfg",
                        &format!("//t{t}/k{i}"),
                        PropertyValue::Int(i),
                    ));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(tracker.pending(), 200);
        let report = tracker.fire_all("cfg", "memory:/cfg.properties");
        assert_eq!(report.created, 200);
        assert_eq!(tracker.pending(), 0);
    }
}
