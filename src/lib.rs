//! Date-based repartitioning of object storage buckets.
//!
//! Moves `prefix/name-2023-05-09-14.json` to
//! `prefix/year=2023/month=05/day=09/hour=14/name-2023-05-09-14.json`,
//! one listing page at a time.

pub mod config;
pub mod observability;
pub mod orchestrator;
pub mod partition;
pub mod relocate;
pub mod store;

pub use config::{ConfigError, LayoutKind, RepartitionConfig, StoreType};
pub use orchestrator::{PageOrchestrator, RunError, RunReport, RunStatus};
pub use partition::{Decision, KeyPlanner, Layout, Relocation, SkipReason};
pub use relocate::{RelocationError, RelocationOutcome, Relocator};
pub use store::{create_store, InMemoryObjectStore, ListPage, ObjectStore};
