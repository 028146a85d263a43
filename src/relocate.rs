//! Single-object relocation: copy, then delete the original.
//!
//! Invariant: the original is deleted only after the copy succeeded. A failed
//! delete leaves the object at both keys; that is reported, never rolled back.

use crate::partition::Relocation;
use crate::store::ObjectStore;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Per-object relocation failure
#[derive(Debug, Error)]
pub enum RelocationError {
    /// Original left untouched
    #[error("Copy {from} -> {to}: {source}")]
    Copy {
        from: String,
        to: String,
        source: std::io::Error,
    },
    /// Object now exists at both keys
    #[error("Delete {from} (copied to {to}): {source}")]
    Delete {
        from: String,
        to: String,
        source: std::io::Error,
    },
    /// Relocation task panicked or was aborted
    #[error("Relocation task failed: {0}")]
    Task(String),
}

impl RelocationError {
    /// Store operation that failed
    pub fn operation(&self) -> &'static str {
        match self {
            RelocationError::Copy { .. } => "Copy",
            RelocationError::Delete { .. } => "Delete",
            RelocationError::Task(_) => "Task",
        }
    }

    /// True when the object was left at both the original and target keys
    pub fn left_duplicate(&self) -> bool {
        matches!(self, RelocationError::Delete { .. })
    }
}

/// Result of relocating one object
#[derive(Debug)]
pub enum RelocationOutcome {
    Moved(Relocation),
    /// Dry run: nothing was copied or deleted
    DryRun(Relocation),
    Failed(RelocationError),
}

/// Copy-then-delete for one object
#[derive(Debug, Clone, Copy, Default)]
pub struct Relocator {
    dry_run: bool,
}

impl Relocator {
    pub fn new(dry_run: bool) -> Self {
        Relocator { dry_run }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Issues exactly one copy and at most one delete. No retries.
    pub async fn relocate(
        &self,
        store: &dyn ObjectStore,
        relocation: Relocation,
    ) -> RelocationOutcome {
        if self.dry_run {
            info!(key = %relocation.from, target = %relocation.to, "Would move");
            return RelocationOutcome::DryRun(relocation);
        }

        if let Err(source) = store.copy(&relocation.from, &relocation.to).await {
            warn!(
                operation = "Copy",
                key = %relocation.from,
                target = %relocation.to,
                error = %source,
                "Relocation aborted, original left in place"
            );
            return RelocationOutcome::Failed(RelocationError::Copy {
                from: relocation.from,
                to: relocation.to,
                source,
            });
        }

        if let Err(source) = store.delete(&relocation.from).await {
            error!(
                operation = "Delete",
                key = %relocation.from,
                target = %relocation.to,
                error = %source,
                "Object now exists at both keys"
            );
            return RelocationOutcome::Failed(RelocationError::Delete {
                from: relocation.from,
                to: relocation.to,
                source,
            });
        }

        debug!(key = %relocation.from, target = %relocation.to, "Moved");
        RelocationOutcome::Moved(relocation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{
        InMemoryObjectStore, SimulatedObjectStore, SimulatedStoreConfig, StoreCall,
    };

    fn relocation() -> Relocation {
        Relocation {
            from: "logs/app-2023-05-09-14.json".to_string(),
            to: "logs/year=2023/month=05/day=09/hour=14/app-2023-05-09-14.json".to_string(),
        }
    }

    fn store_with(config: SimulatedStoreConfig) -> SimulatedObjectStore<InMemoryObjectStore> {
        let inner = InMemoryObjectStore::new("bucket");
        inner.insert(&relocation().from, "payload");
        SimulatedObjectStore::new(inner, 42, config)
    }

    #[tokio::test]
    async fn test_relocate_moves_object() {
        let store = store_with(SimulatedStoreConfig::no_faults());

        let outcome = Relocator::new(false).relocate(&store, relocation()).await;

        assert!(matches!(outcome, RelocationOutcome::Moved(_)));
        assert_eq!(store.inner().keys(), vec![relocation().to]);
        assert_eq!(
            store.history(),
            vec![
                StoreCall::Copy {
                    from: relocation().from,
                    to: relocation().to,
                    ok: true
                },
                StoreCall::Delete {
                    key: relocation().from,
                    ok: true
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_copy_failure_skips_delete() {
        let store = store_with(SimulatedStoreConfig {
            copy_fail_prob: 1.0,
            ..SimulatedStoreConfig::no_faults()
        });

        let outcome = Relocator::new(false).relocate(&store, relocation()).await;

        match outcome {
            RelocationOutcome::Failed(err) => {
                assert_eq!(err.operation(), "Copy");
                assert!(!err.left_duplicate());
            }
            other => panic!("expected copy failure, got {:?}", other),
        }
        assert_eq!(store.inner().keys(), vec![relocation().from]);
        assert_eq!(store.stats().delete_attempts, 0);
    }

    #[tokio::test]
    async fn test_delete_failure_leaves_duplicate() {
        let store = store_with(SimulatedStoreConfig {
            delete_fail_prob: 1.0,
            ..SimulatedStoreConfig::no_faults()
        });

        let outcome = Relocator::new(false).relocate(&store, relocation()).await;

        match outcome {
            RelocationOutcome::Failed(err) => {
                assert_eq!(err.operation(), "Delete");
                assert!(err.left_duplicate());
            }
            other => panic!("expected delete failure, got {:?}", other),
        }
        assert!(store.inner().contains(&relocation().from));
        assert!(store.inner().contains(&relocation().to));
        let stats = store.stats();
        assert_eq!((stats.copy_attempts, stats.delete_attempts), (1, 1));
    }

    #[tokio::test]
    async fn test_missing_source_is_copy_failure() {
        let store = SimulatedObjectStore::new(
            InMemoryObjectStore::new("bucket"),
            1,
            SimulatedStoreConfig::no_faults(),
        );

        let outcome = Relocator::new(false).relocate(&store, relocation()).await;

        assert!(matches!(
            outcome,
            RelocationOutcome::Failed(RelocationError::Copy { .. })
        ));
        assert_eq!(store.stats().delete_attempts, 0);
    }

    #[tokio::test]
    async fn test_dry_run_issues_no_calls() {
        let store = store_with(SimulatedStoreConfig::no_faults());

        let outcome = Relocator::new(true).relocate(&store, relocation()).await;

        assert!(matches!(outcome, RelocationOutcome::DryRun(_)));
        assert!(store.history().is_empty());
        assert_eq!(store.inner().keys(), vec![relocation().from]);
    }
}
