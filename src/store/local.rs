//! Local filesystem object store
//!
//! Treats a directory as a bucket: every regular file below the root is an
//! object whose key is its `/`-separated relative path. Useful for rehearsing
//! a repartition against a copy of a bucket synced to disk.

use super::{ListPage, ObjectStore};
use crate::partition::{split_key, DELIMITER};
use std::future::Future;
use std::io::{Error as IoError, ErrorKind, Result as IoResult};
use std::path::{Path, PathBuf};
use std::pin::Pin;

#[derive(Debug, Clone)]
pub struct LocalFsObjectStore {
    bucket: String,
    base_path: PathBuf,
}

impl LocalFsObjectStore {
    /// Open `base_path` as bucket `bucket`, creating the directory if needed
    pub fn open(base_path: PathBuf, bucket: &str) -> IoResult<Self> {
        std::fs::create_dir_all(&base_path)?;
        Ok(LocalFsObjectStore {
            bucket: bucket.to_string(),
            base_path,
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Map a key to a path under the root, refusing keys that would escape it
    fn full_path(&self, key: &str) -> IoResult<PathBuf> {
        let segments = split_key(key);
        if segments.is_empty() || segments.iter().any(|s| *s == "." || *s == "..") {
            return Err(IoError::new(
                ErrorKind::InvalidInput,
                format!("Key cannot be mapped to a file: {}", key),
            ));
        }
        let mut path = self.base_path.clone();
        path.extend(segments);
        Ok(path)
    }

    /// Collect up to `limit` keys strictly after `cursor`, in key order.
    ///
    /// Entries are visited sorted by key, with a directory sorting as its key
    /// plus the delimiter, so a depth-first walk yields keys in the same order
    /// as a sorted listing. Subtrees entirely at or before the cursor are not
    /// read.
    fn walk_after(
        dir: &Path,
        prefix: &str,
        cursor: Option<&str>,
        limit: usize,
        keys: &mut Vec<String>,
    ) -> IoResult<()> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            if !file_type.is_dir() && !file_type.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let key = if prefix.is_empty() {
                name
            } else {
                format!("{}{}{}", prefix, DELIMITER, name)
            };
            let order = if file_type.is_dir() {
                format!("{}{}", key, DELIMITER)
            } else {
                key.clone()
            };
            entries.push((order, key, entry.path(), file_type.is_dir()));
        }
        entries.sort();

        for (order, key, path, is_dir) in entries {
            if keys.len() >= limit {
                break;
            }
            if is_dir {
                // Every key below starts with `order`
                let behind_cursor =
                    cursor.is_some_and(|c| order.as_str() < c && !c.starts_with(&order));
                if !behind_cursor {
                    Self::walk_after(&path, &key, cursor, limit, keys)?;
                }
            } else if cursor.map_or(true, |c| key.as_str() > c) {
                keys.push(key);
            }
        }
        Ok(())
    }
}

impl ObjectStore for LocalFsObjectStore {
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
            let base = self.base_path.clone();
            let cursor = cursor.map(str::to_string);
            let window = tokio::task::spawn_blocking(move || {
                let mut keys = Vec::with_capacity(page_size + 1);
                Self::walk_after(&base, "", cursor.as_deref(), page_size + 1, &mut keys)?;
                Ok::<_, IoError>(keys)
            })
            .await
            .map_err(|e| IoError::new(ErrorKind::Other, e))??;

            Ok(ListPage::from_lookahead(window, page_size))
        })
    }

    fn copy<'a>(
        &'a self,
        from: &'a str,
        to: &'a str,
    ) -> Pin<Box<dyn Future<Output = IoResult<()>> + Send + 'a>> {
        Box::pin(async move {
            let from_path = self.full_path(from)?;
            let to_path = self.full_path(to)?;
            if let Some(parent) = to_path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::copy(&from_path, &to_path).await?;
            Ok(())
        })
    }

    fn delete<'a>(
        &'a self,
        key: &'a str,
    ) -> Pin<Box<dyn Future<Output = IoResult<()>> + Send + 'a>> {
        Box::pin(async move {
            let path = self.full_path(key)?;
            match tokio::fs::remove_file(&path).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()), // Already deleted
                Err(e) => Err(e),
            }
        })
    }
}
