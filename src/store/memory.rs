//! In-memory object store for unit tests and dry rehearsals.

use super::{ListPage, ObjectStore};
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::future::Future;
use std::io::{Error as IoError, ErrorKind, Result as IoResult};
use std::ops::Bound;
use std::pin::Pin;
use std::sync::Arc;

/// Keys are kept sorted so pages come back in lexicographic order, like S3.
#[derive(Debug, Clone)]
pub struct InMemoryObjectStore {
    bucket: String,
    data: Arc<RwLock<BTreeMap<String, Bytes>>>,
}

impl InMemoryObjectStore {
    pub fn new(bucket: &str) -> Self {
        InMemoryObjectStore {
            bucket: bucket.to_string(),
            data: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Seed an object (for testing)
    pub fn insert(&self, key: &str, data: impl Into<Bytes>) {
        self.data.write().insert(key.to_string(), data.into());
    }

    pub fn get(&self, key: &str) -> Option<Bytes> {
        self.data.read().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.data.read().contains_key(key)
    }

    /// All keys in sorted order
    pub fn keys(&self) -> Vec<String> {
        self.data.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn list_page<'a>(
        &'a self,
        cursor: Option<&'a str>,
        page_size: usize,
    ) -> Pin<Box<dyn Future<Output = IoResult<ListPage>> + Send + 'a>> {
        Box::pin(async move {
            let page_size = page_size.max(1);
            let lower = match cursor {
                Some(c) => Bound::Excluded(c.to_string()),
                None => Bound::Unbounded,
            };
            let keys: Vec<String> = self
                .data
                .read()
                .range((lower, Bound::Unbounded))
                .take(page_size + 1)
                .map(|(k, _)| k.clone())
                .collect();
            Ok(ListPage::from_lookahead(keys, page_size))
        })
    }

    fn copy<'a>(
        &'a self,
        from: &'a str,
        to: &'a str,
    ) -> Pin<Box<dyn Future<Output = IoResult<()>> + Send + 'a>> {
        Box::pin(async move {
            let mut data = self.data.write();
            let obj = data.get(from).cloned().ok_or_else(|| {
                IoError::new(ErrorKind::NotFound, format!("Key not found: {}", from))
            })?;
            data.insert(to.to_string(), obj);
            Ok(())
        })
    }

    fn delete<'a>(
        &'a self,
        key: &'a str,
    ) -> Pin<Box<dyn Future<Output = IoResult<()>> + Send + 'a>> {
        Box::pin(async move {
            self.data.write().remove(key);
            Ok(())
        })
    }
}
