//! Object Store Abstraction
//!
//! The repartitioner only needs three bucket operations: list a page of keys,
//! copy an object server-side, and delete an object. Every backend is bound
//! to a single bucket when it is constructed.
//!
//! Implementations:
//! - `InMemoryObjectStore`: For unit tests and the `memory` store type
//! - `LocalFsObjectStore`: A directory tree treated as a bucket
//! - `S3ObjectStore`: For production (feature-gated)
//! - `SimulatedObjectStore`: Fault-injecting wrapper for deterministic tests

pub mod local;
pub mod memory;
#[cfg(feature = "s3")]
pub mod s3;
pub mod simulated;

pub use local::LocalFsObjectStore;
pub use memory::InMemoryObjectStore;
#[cfg(feature = "s3")]
pub use s3::S3ObjectStore;
pub use simulated::{
    SimulatedObjectStore, SimulatedRng, SimulatedStoreConfig, SimulatedStoreStats, StoreCall,
};

use crate::config::{RepartitionConfig, StoreType};
use std::future::Future;
use std::io::{Error as IoError, ErrorKind, Result as IoResult};
use std::pin::Pin;
use std::sync::Arc;

/// One page of a bucket listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    /// Keys in this page, in listing order
    pub keys: Vec<String>,
    /// Token to pass as the cursor for the following page
    pub next_cursor: Option<String>,
    /// Whether another page follows
    pub has_more: bool,
}

impl ListPage {
    /// Build a page from at most `page_size + 1` keys fetched past the cursor.
    ///
    /// The extra key only signals that more results exist; it is not
    /// returned. The cursor is the last key of the page.
    pub(crate) fn from_lookahead(mut keys: Vec<String>, page_size: usize) -> Self {
        let has_more = keys.len() > page_size;
        keys.truncate(page_size);
        let next_cursor = if has_more { keys.last().cloned() } else { None };
        ListPage {
            keys,
            next_cursor,
            has_more,
        }
    }
}

/// Bucket operations used by the repartitioner
pub trait ObjectStore: Send + Sync + 'static {
    /// Bucket this store is bound to
    fn bucket(&self) -> &str;

    /// List up to `page_size` keys strictly after `cursor`
    fn list_page<'a>(
        &'a self,
        cursor: Option<&'a str>,
        page_size: usize,
    ) -> Pin<Box<dyn Future<Output = IoResult<ListPage>> + Send + 'a>>;

    /// Copy an object within the bucket without downloading it
    fn copy<'a>(
        &'a self,
        from: &'a str,
        to: &'a str,
    ) -> Pin<Box<dyn Future<Output = IoResult<()>> + Send + 'a>>;

    /// Delete an object; deleting a missing key is not an error
    fn delete<'a>(
        &'a self,
        key: &'a str,
    ) -> Pin<Box<dyn Future<Output = IoResult<()>> + Send + 'a>>;
}

/// Build the store selected by `config`.
pub async fn create_store(config: &RepartitionConfig) -> IoResult<Arc<dyn ObjectStore>> {
    match config.store.store_type {
        StoreType::Memory => Ok(Arc::new(InMemoryObjectStore::new(&config.bucket))),
        StoreType::LocalFs => {
            let root = config.store.local_path.as_ref().ok_or_else(|| {
                IoError::new(ErrorKind::InvalidInput, "localfs store requires local_path")
            })?;
            let store = LocalFsObjectStore::open(root.join(&config.bucket), &config.bucket)?;
            Ok(Arc::new(store))
        }
        #[cfg(feature = "s3")]
        StoreType::S3 => {
            let store = S3ObjectStore::new(&config.bucket, &config.store.s3).await;
            Ok(Arc::new(store))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("k{:03}", i)).collect()
    }

    #[test]
    fn test_lookahead_with_more() {
        let page = ListPage::from_lookahead(keys(4), 3);
        assert_eq!(page.keys, vec!["k000", "k001", "k002"]);
        assert!(page.has_more);
        assert_eq!(page.next_cursor.as_deref(), Some("k002"));
    }

    #[test]
    fn test_lookahead_exact_fit_is_last_page() {
        let page = ListPage::from_lookahead(keys(3), 3);
        assert_eq!(page.keys.len(), 3);
        assert!(!page.has_more);
        assert!(page.next_cursor.is_none());
    }

    #[test]
    fn test_lookahead_empty() {
        let page = ListPage::from_lookahead(Vec::new(), 100);
        assert_eq!(page, ListPage::default());
    }
}
