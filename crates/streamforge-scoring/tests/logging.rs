//! Integration tests for the structured events a session emits.

use std::sync::{Arc, Mutex};

use streamforge_config::EngineConfig;
use streamforge_core::SimpleScore;
use streamforge_scoring::{ConstraintFactory, ConstraintWeightOverrides, ScoringSession, Tuple};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

#[derive(Debug, PartialEq, Eq, Hash)]
struct Item {
    size: i64,
}

/// Records the `event` field and level of every event.
#[derive(Clone, Default)]
struct CaptureLayer {
    events: Arc<Mutex<Vec<(Level, String)>>>,
}

impl CaptureLayer {
    fn names(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|(_, name)| name.clone())
            .collect()
    }

    fn level_of(&self, name: &str) -> Option<Level> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .find(|(_, n)| n == name)
            .map(|(level, _)| *level)
    }
}

#[derive(Default)]
struct EventName(Option<String>);

impl Visit for EventName {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "event" {
            self.0 = Some(value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "event" && self.0.is_none() {
            self.0 = Some(format!("{:?}", value).trim_matches('"').to_string());
        }
    }
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if !event.metadata().target().starts_with("streamforge_scoring") {
            return;
        }
        let mut visitor = EventName::default();
        event.record(&mut visitor);
        if let Some(name) = visitor.0 {
            self.events
                .lock()
                .unwrap()
                .push((*event.metadata().level(), name));
        }
    }
}

fn captured<R>(f: impl FnOnce() -> R) -> (R, CaptureLayer) {
    let layer = CaptureLayer::default();
    let subscriber = tracing_subscriber::registry().with(layer.clone());
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, layer)
}

fn factory() -> ConstraintFactory<SimpleScore> {
    let factory = ConstraintFactory::new();
    factory
        .for_each::<Item>()
        .filter(|t: &Tuple| {
            let size = t.a::<Item>().size;
            assert!(size >= 0, "negative item size");
            size > 5
        })
        .penalize(SimpleScore::ONE)
        .as_constraint("Large item");
    factory
        .for_each::<Item>()
        .penalize_configurable(SimpleScore::ONE)
        .as_constraint("Item count");
    factory
}

#[test]
fn test_lifecycle_events() {
    let (_, layer) = captured(|| {
        let pipeline = Arc::new(factory().build().unwrap());
        let overrides = ConstraintWeightOverrides::from_pairs([
            ("Item count", SimpleScore::ZERO),
            ("No such constraint", SimpleScore::ONE),
        ]);
        let config = EngineConfig::new().with_prune_inactive_branches(true);
        let mut session = ScoringSession::with_config(pipeline, &overrides, &config).unwrap();
        let handle = session.insert(Item { size: 7 }).unwrap();
        session.update(handle, Item { size: 3 }).unwrap();
        session.retract(handle).unwrap();
    });

    let names = layer.names();
    assert!(names.contains(&"pipeline_built".to_string()));
    assert!(names.contains(&"constraint_deactivated".to_string()));
    assert!(names.contains(&"node_pruned".to_string()));
    assert!(names.contains(&"session_created".to_string()));
    assert_eq!(names.iter().filter(|n| *n == "fact_changed").count(), 3);
    assert_eq!(layer.level_of("session_created"), Some(Level::INFO));
    assert_eq!(layer.level_of("unknown_constraint_weight"), Some(Level::WARN));
    assert_eq!(layer.level_of("fact_changed"), Some(Level::TRACE));
}

#[test]
fn test_poisoning_is_logged_as_error() {
    let (poisoned, layer) = captured(|| {
        let mut session = ScoringSession::new(Arc::new(factory().build().unwrap()));
        session.insert(Item { size: 2 }).unwrap();
        let failed = session.insert(Item { size: -1 });
        assert!(failed.is_err());
        session.is_poisoned()
    });

    assert!(poisoned);
    assert_eq!(layer.level_of("session_poisoned"), Some(Level::ERROR));
}
