//! Date Partitioning
//!
//! Turns flat object keys into `year=/month=/day=/hour=` partitioned keys.
//!
//! ```text
//! logs/app-2023-05-09-14.json
//!          └─ extract_timestamp ─→ 2023-05-09T14:00
//!                                        ↓
//! logs/year=2023/month=05/day=09/hour=14/app-2023-05-09-14.json
//! ```

pub mod date;
pub mod key;
pub mod planner;

pub use date::{extract_timestamp, DateError};
pub use key::{is_directory_marker, partitioned_key, split_key, DELIMITER};
pub use planner::{Decision, KeyPlanner, Layout, Relocation, SkipReason};
