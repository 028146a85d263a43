//! Key Planning
//!
//! Decides, per object key, whether the object must move and where to.
//!
//! ## Layouts
//!
//! | Layout | Eligible keys | Preserved prefix |
//! |--------|---------------|------------------|
//! | `FlexiblePrefix { prefix_depth: D }` | more than D segments | first D segments |
//! | `FixedTwoSegment` | exactly `event/filename` | `event` |
//!
//! In both layouts the filename must carry a `YYYY-MM-DD-HH` stamp; objects
//! without one are left where they are.

use super::date::{extract_timestamp, DateError};
use super::key::{is_directory_marker, partitioned_key, split_key, DELIMITER};
use tracing::info;

/// Target key layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Keep the first `prefix_depth` segments and partition the filename under them
    FlexiblePrefix { prefix_depth: usize },
    /// Only `event/filename` keys; `event` becomes the top-level prefix
    FixedTwoSegment,
}

/// A single planned move
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
    pub from: String,
    pub to: String,
}

/// Why an object is left in place
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    DirectoryMarker,
    /// Not more segments than the preserved prefix depth
    TooShallow,
    /// Fixed layout needs exactly two segments
    UnexpectedShape,
    NoDate(DateError),
    /// Key already equals its partitioned form
    AlreadyPartitioned,
}

/// Planner verdict for one key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Skip(SkipReason),
    Relocate(Relocation),
}

impl Decision {
    pub fn is_relocation(&self) -> bool {
        matches!(self, Decision::Relocate(_))
    }
}

/// Computes canonical partitioned keys for one configured layout
#[derive(Debug, Clone, Copy)]
pub struct KeyPlanner {
    layout: Layout,
}

impl KeyPlanner {
    pub fn new(layout: Layout) -> Self {
        KeyPlanner { layout }
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Plan the move for `key`.
    pub fn plan(&self, key: &str) -> Decision {
        if is_directory_marker(key) {
            return Decision::Skip(SkipReason::DirectoryMarker);
        }

        let segments = split_key(key);
        let (prefix, filename) = match self.layout {
            Layout::FlexiblePrefix { prefix_depth } => {
                if segments.len() <= prefix_depth {
                    return Decision::Skip(SkipReason::TooShallow);
                }
                let prefix = segments[..prefix_depth].join(DELIMITER);
                (prefix, segments[segments.len() - 1])
            }
            Layout::FixedTwoSegment => match segments.as_slice() {
                [event, filename] => (event.to_string(), *filename),
                _ => return Decision::Skip(SkipReason::UnexpectedShape),
            },
        };

        let ts = match extract_timestamp(filename) {
            Ok(ts) => ts,
            Err(e) => {
                info!(key, error = %e, "ExtractDateFromString");
                return Decision::Skip(SkipReason::NoDate(e));
            }
        };

        let target = partitioned_key(&prefix, &ts, filename);
        if target == key {
            Decision::Skip(SkipReason::AlreadyPartitioned)
        } else {
            Decision::Relocate(Relocation {
                from: key.to_string(),
                to: target,
            })
        }
    }
}
