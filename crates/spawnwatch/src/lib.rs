//! Spawnwatch: respawn estimation, tracking and alerting for bosses with bounded respawn delays.

pub mod alerts;
pub mod catalog;
pub mod defaults;
pub mod disambiguation;
pub mod format;
pub mod paginator;
pub mod predicate;
pub mod probability;
pub mod resolver;
pub mod tracker;
pub mod tracking;
pub mod types;

pub use alerts::{AlertRule, AlertRules, RuleId};
pub use catalog::EntityCatalog;
pub use defaults::{default_catalog, default_entities};
pub use disambiguation::{
    parse_selection, parse_selector, Continuation, DisambiguationBroker, Resumption, Selection,
};
pub use paginator::{paginate, BoardRow, Field, Page, PageLimits};
pub use predicate::{Bindings, Predicate, PredicateError};
pub use probability::{spawn_signal, window_probability};
pub use resolver::NameIndex;
pub use tracker::{AlertFiring, RemovedSpawn, Tracker, TrackerSnapshot, TrackingRecord};
pub use tracking::{TrackedSpawn, TrackingStore};
pub use types::*;
