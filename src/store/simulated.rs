//! Simulated Object Store with Fault Injection
//!
//! Wraps another store and fails list, copy and delete calls with seeded
//! probabilities. Every call is appended to a history so tests can check
//! ordering properties (e.g. no delete of a key without a prior successful
//! copy from it). Same seed, same faults.

use super::{ListPage, ObjectStore};
use parking_lot::Mutex;
use rand::{Rng as _, SeedableRng};
use std::future::Future;
use std::io::{Error as IoError, ErrorKind, Result as IoResult};
use std::pin::Pin;
use std::sync::Arc;

/// Deterministic RNG for fault injection
#[derive(Debug)]
pub struct SimulatedRng {
    inner: rand_chacha::ChaCha8Rng,
}

impl SimulatedRng {
    pub fn new(seed: u64) -> Self {
        SimulatedRng {
            inner: rand_chacha::ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn gen_bool(&mut self, probability: f64) -> bool {
        self.inner.gen_bool(probability.clamp(0.0, 1.0))
    }

    pub fn gen_range(&mut self, min: u64, max: u64) -> u64 {
        if min >= max {
            return min;
        }
        self.inner.gen_range(min..max)
    }
}

/// Configuration for simulated fault injection
#[derive(Debug, Clone)]
pub struct SimulatedStoreConfig {
    /// Probability of LIST failure
    pub list_fail_prob: f64,
    /// Probability of COPY failure
    pub copy_fail_prob: f64,
    /// Probability of DELETE failure
    pub delete_fail_prob: f64,
    /// Simulated latency range in microseconds (min, max)
    pub latency_range_us: (u64, u64),
}

impl Default for SimulatedStoreConfig {
    fn default() -> Self {
        SimulatedStoreConfig {
            list_fail_prob: 0.0,           // listing failures abort the run
            copy_fail_prob: 0.01,          // 1%
            delete_fail_prob: 0.01,        // 1%
            latency_range_us: (100, 2_000), // 0.1ms - 2ms
        }
    }
}

impl SimulatedStoreConfig {
    /// High chaos configuration for stress testing
    pub fn high_chaos() -> Self {
        SimulatedStoreConfig {
            list_fail_prob: 0.0,
            copy_fail_prob: 0.2,
            delete_fail_prob: 0.2,
            latency_range_us: (0, 5_000),
        }
    }

    /// No faults - for baseline testing
    pub fn no_faults() -> Self {
        SimulatedStoreConfig {
            list_fail_prob: 0.0,
            copy_fail_prob: 0.0,
            delete_fail_prob: 0.0,
            latency_range_us: (0, 0),
        }
    }
}

/// Statistics for fault injection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulatedStoreStats {
    pub list_attempts: u64,
    pub list_failures: u64,
    pub copy_attempts: u64,
    pub copy_failures: u64,
    pub delete_attempts: u64,
    pub delete_failures: u64,
}

/// One recorded call against the simulated store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    List { cursor: Option<String>, ok: bool },
    Copy { from: String, to: String, ok: bool },
    Delete { key: String, ok: bool },
}

struct SimulatedStoreInner {
    rng: SimulatedRng,
    stats: SimulatedStoreStats,
    history: Vec<StoreCall>,
}

/// Simulated object store that wraps another store and injects faults
pub struct SimulatedObjectStore<S: ObjectStore> {
    inner_store: S,
    config: SimulatedStoreConfig,
    state: Arc<Mutex<SimulatedStoreInner>>,
}

impl<S: ObjectStore> SimulatedObjectStore<S> {
    pub fn new(inner_store: S, seed: u64, config: SimulatedStoreConfig) -> Self {
        SimulatedObjectStore {
            inner_store,
            config,
            state: Arc::new(Mutex::new(SimulatedStoreInner {
                rng: SimulatedRng::new(seed),
                stats: SimulatedStoreStats::default(),
                history: Vec::new(),
            })),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner_store
    }

    /// Get current statistics
    pub fn stats(&self) -> SimulatedStoreStats {
        self.state.lock().stats.clone()
    }

    /// Calls in the order they completed
    pub fn history(&self) -> Vec<StoreCall> {
        self.state.lock().history.clone()
    }

    /// Roll for a fault and pick a latency in one lock acquisition
    fn roll(&self, fail_prob: f64) -> (bool, u64) {
        let mut s = self.state.lock();
        let fail = s.rng.gen_bool(fail_prob);
        let (min, max) = self.config.latency_range_us;
        let latency_us = s.rng.gen_range(min, max);
        (fail, latency_us)
    }

    async fn delay(latency_us: u64) {
        if latency_us > 0 {
            tokio::time::sleep(std::time::Duration::from_micros(latency_us)).await;
        }
    }

    fn record(&self, call: StoreCall) {
        self.state.lock().history.push(call);
    }
}

impl<S: ObjectStore> ObjectStore for SimulatedObjectStore<S> {
    fn bucket(&self) -> &str {
        self.inner_store.bucket()
    }

    fn list_page<'a>(
        &'a self,
        cursor: Option<&'a str>,
        page_size: usize,
    ) -> Pin<Box<dyn Future<Output = IoResult<ListPage>> + Send + 'a>> {
        Box::pin(async move {
            self.state.lock().stats.list_attempts += 1;
            let (should_fail, latency_us) = self.roll(self.config.list_fail_prob);
            Self::delay(latency_us).await;

            let result = if should_fail {
                self.state.lock().stats.list_failures += 1;
                Err(IoError::new(ErrorKind::Other, "simulated list failure"))
            } else {
                self.inner_store.list_page(cursor, page_size).await
            };
            self.record(StoreCall::List {
                cursor: cursor.map(str::to_string),
                ok: result.is_ok(),
            });
            result
        })
    }

    fn copy<'a>(
        &'a self,
        from: &'a str,
        to: &'a str,
    ) -> Pin<Box<dyn Future<Output = IoResult<()>> + Send + 'a>> {
        Box::pin(async move {
            self.state.lock().stats.copy_attempts += 1;
            let (should_fail, latency_us) = self.roll(self.config.copy_fail_prob);
            Self::delay(latency_us).await;

            let result = if should_fail {
                self.state.lock().stats.copy_failures += 1;
                Err(IoError::new(ErrorKind::Other, "simulated copy failure"))
            } else {
                self.inner_store.copy(from, to).await
            };
            self.record(StoreCall::Copy {
                from: from.to_string(),
                to: to.to_string(),
                ok: result.is_ok(),
            });
            result
        })
    }

    fn delete<'a>(
        &'a self,
        key: &'a str,
    ) -> Pin<Box<dyn Future<Output = IoResult<()>> + Send + 'a>> {
        Box::pin(async move {
            self.state.lock().stats.delete_attempts += 1;
            let (should_fail, latency_us) = self.roll(self.config.delete_fail_prob);
            Self::delay(latency_us).await;

            let result = if should_fail {
                self.state.lock().stats.delete_failures += 1;
                Err(IoError::new(ErrorKind::Other, "simulated delete failure"))
            } else {
                self.inner_store.delete(key).await
            };
            self.record(StoreCall::Delete {
                key: key.to_string(),
                ok: result.is_ok(),
            });
            result
        })
    }
}
