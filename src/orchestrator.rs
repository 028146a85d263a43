//! Page Orchestrator
//!
//! Walks the bucket one listing page at a time. Every relocation planned for a
//! page runs as its own task; the page is joined completely before the next
//! page is requested.
//!
//! ```text
//! Listing ──ok──→ Dispatching ──→ AwaitingPage ──has_more──→ Listing
//!    │                                  │
//!    └──err──→ Failed                   └──last page──→ Done
//! ```
//!
//! Only a listing failure ends the run early. Relocation failures are
//! collected in the report and never stop sibling tasks.

use crate::config::RepartitionConfig;
use crate::partition::{is_directory_marker, Decision, KeyPlanner};
use crate::relocate::{RelocationError, RelocationOutcome, Relocator};
use crate::store::{ListPage, ObjectStore};
use std::io::{Error as IoError, ErrorKind};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, error, info, trace};

/// Terminal state of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunStatus {
    #[default]
    Running,
    Done,
    Failed,
}

/// Counters and per-object failures for one run
#[derive(Debug, Default)]
pub struct RunReport {
    /// Every key returned by the listing, directory markers included
    pub listed: usize,
    pub pages: usize,
    pub directory_markers: usize,
    /// Planned as no-op (ineligible, undated, or already partitioned)
    pub skipped: usize,
    pub moved: usize,
    /// Relocations planned during a dry run
    pub would_move: usize,
    pub failures: Vec<RelocationError>,
    pub status: RunStatus,
}

impl RunReport {
    fn record(&mut self, outcome: RelocationOutcome) {
        match outcome {
            RelocationOutcome::Moved(_) => self.moved += 1,
            RelocationOutcome::DryRun(_) => self.would_move += 1,
            RelocationOutcome::Failed(err) => self.failures.push(err),
        }
    }

    pub fn copy_failures(&self) -> usize {
        self.failures
            .iter()
            .filter(|e| matches!(e, RelocationError::Copy { .. }))
            .count()
    }

    /// Objects left at both their original and target keys
    pub fn delete_failures(&self) -> usize {
        self.failures.iter().filter(|e| e.left_duplicate()).count()
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("error listing objects in bucket {bucket} after {listed} objects: {source}")]
    List {
        bucket: String,
        listed: usize,
        source: IoError,
        report: Box<RunReport>,
    },
}

impl RunError {
    /// Progress made before the run aborted
    pub fn report(&self) -> &RunReport {
        match self {
            RunError::List { report, .. } => report,
        }
    }
}

enum PageState {
    Listing {
        cursor: Option<String>,
    },
    Dispatching {
        page: ListPage,
    },
    AwaitingPage {
        tasks: JoinSet<RelocationOutcome>,
        /// Cursor for the next page, `None` after the last page
        next: Option<String>,
    },
    Done,
    Failed {
        source: IoError,
    },
}

impl PageState {
    fn name(&self) -> &'static str {
        match self {
            PageState::Listing { .. } => "Listing",
            PageState::Dispatching { .. } => "Dispatching",
            PageState::AwaitingPage { .. } => "AwaitingPage",
            PageState::Done => "Done",
            PageState::Failed { .. } => "Failed",
        }
    }
}

/// Drives listing, planning and relocation over a whole bucket
pub struct PageOrchestrator {
    store: Arc<dyn ObjectStore>,
    planner: KeyPlanner,
    relocator: Relocator,
    page_size: usize,
}

impl PageOrchestrator {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        planner: KeyPlanner,
        relocator: Relocator,
        page_size: usize,
    ) -> Self {
        PageOrchestrator {
            store,
            planner,
            relocator,
            page_size: page_size.max(1),
        }
    }

    pub fn from_config(store: Arc<dyn ObjectStore>, config: &RepartitionConfig) -> Self {
        Self::new(
            store,
            KeyPlanner::new(config.layout()),
            Relocator::new(config.dry_run),
            config.page_size,
        )
    }

    /// Run until the listing is exhausted or fails
    pub async fn run(&self) -> Result<RunReport, RunError> {
        info!(
            bucket = self.store.bucket(),
            layout = ?self.planner.layout(),
            page_size = self.page_size,
            dry_run = self.relocator.is_dry_run(),
            "Processing files"
        );

        let mut report = RunReport::default();
        let mut state = PageState::Listing { cursor: None };

        loop {
            trace!(state = state.name(), "Page state");
            state = match state {
                PageState::Listing { cursor } => self.list(cursor.as_deref(), &mut report).await,
                PageState::Dispatching { page } => self.dispatch(page, &mut report),
                PageState::AwaitingPage { tasks, next } => {
                    Self::await_page(tasks, &mut report).await;
                    match next {
                        Some(cursor) => PageState::Listing {
                            cursor: Some(cursor),
                        },
                        None => PageState::Done,
                    }
                }
                PageState::Done => {
                    report.status = RunStatus::Done;
                    info!(
                        listed = report.listed,
                        moved = report.moved,
                        would_move = report.would_move,
                        skipped = report.skipped,
                        copy_failures = report.copy_failures(),
                        delete_failures = report.delete_failures(),
                        "Total files {}",
                        report.listed
                    );
                    return Ok(report);
                }
                PageState::Failed { source } => {
                    report.status = RunStatus::Failed;
                    error!(
                        listed = report.listed,
                        error = %source,
                        "error listing objects, total files {}",
                        report.listed
                    );
                    return Err(RunError::List {
                        bucket: self.store.bucket().to_string(),
                        listed: report.listed,
                        source,
                        report: Box::new(report),
                    });
                }
            };
        }
    }

    async fn list(&self, cursor: Option<&str>, report: &mut RunReport) -> PageState {
        let page = match self.store.list_page(cursor, self.page_size).await {
            Ok(page) => page,
            Err(source) => return PageState::Failed { source },
        };
        if page.has_more && page.next_cursor.is_none() {
            // Listing again without a cursor would restart from the first key
            return PageState::Failed {
                source: IoError::new(
                    ErrorKind::InvalidData,
                    "truncated listing without continuation token",
                ),
            };
        }

        report.pages += 1;
        report.listed += page.keys.len();
        debug!(
            page = report.pages,
            keys = page.keys.len(),
            has_more = page.has_more,
            "Listed page"
        );
        PageState::Dispatching { page }
    }

    fn dispatch(&self, page: ListPage, report: &mut RunReport) -> PageState {
        let mut tasks = JoinSet::new();

        for key in &page.keys {
            if is_directory_marker(key) {
                report.directory_markers += 1;
                continue;
            }
            match self.planner.plan(key) {
                Decision::Skip(reason) => {
                    trace!(key = %key, reason = ?reason, "Skipped");
                    report.skipped += 1;
                }
                Decision::Relocate(relocation) => {
                    let store = Arc::clone(&self.store);
                    let relocator = self.relocator;
                    tasks.spawn(
                        async move { relocator.relocate(store.as_ref(), relocation).await },
                    );
                }
            }
        }

        let next = if page.has_more { page.next_cursor } else { None };
        PageState::AwaitingPage { tasks, next }
    }

    /// Page barrier: returns once every task of the page has finished
    async fn await_page(mut tasks: JoinSet<RelocationOutcome>, report: &mut RunReport) {
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => report.record(outcome),
                Err(e) => {
                    error!(operation = "Task", error = %e, "Relocation task failed");
                    report.failures.push(RelocationError::Task(e.to_string()));
                }
            }
        }
    }
}
