//! Cache wrappers that count, record and inject failures.
//!
//! [`InstrumentedCache`] behaves like an in-memory cache but keeps a tally
//! of every operation, appends it to a shared [`OpLog`], and can be told to
//! fail gets or puts. Sharing one log between the data cache and the
//! metadata cache shows the order in which a stream touched them.

use gridfs_storage::{Cache, InMemoryCache, StorageError, StorageResult};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// One recorded cache operation and the key it touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheOp {
    /// A `get`.
    Get(String),
    /// A `put`.
    Put(String),
    /// A `remove`.
    Remove(String),
    /// A `contains_key`.
    Contains(String),
}

impl CacheOp {
    /// Returns the key the operation touched.
    pub fn key(&self) -> &str {
        match self {
            Self::Get(k) | Self::Put(k) | Self::Remove(k) | Self::Contains(k) => k,
        }
    }

    /// Returns `true` for puts.
    pub fn is_put(&self) -> bool {
        matches!(self, Self::Put(_))
    }
}

/// An ordered, shareable log of cache operations.
#[derive(Debug, Clone, Default)]
pub struct OpLog(Arc<Mutex<Vec<CacheOp>>>);

impl OpLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an operation.
    pub fn push(&self, op: CacheOp) {
        self.0.lock().push(op);
    }

    /// Returns a copy of all recorded operations, oldest first.
    pub fn ops(&self) -> Vec<CacheOp> {
        self.0.lock().clone()
    }

    /// Returns the recorded puts, oldest first.
    pub fn puts(&self) -> Vec<String> {
        self.0
            .lock()
            .iter()
            .filter(|op| op.is_put())
            .map(|op| op.key().to_owned())
            .collect()
    }

    /// Forgets everything recorded so far.
    pub fn clear(&self) {
        self.0.lock().clear();
    }
}

/// Operation tallies of one cache.
#[derive(Debug, Default)]
pub struct CacheCounters {
    gets: AtomicUsize,
    puts: AtomicUsize,
    removes: AtomicUsize,
}

impl CacheCounters {
    /// Number of `get` calls.
    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    /// Number of `put` calls.
    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    /// Number of `remove` calls.
    pub fn removes(&self) -> usize {
        self.removes.load(Ordering::SeqCst)
    }

    /// Resets all tallies to zero.
    pub fn reset(&self) {
        self.gets.store(0, Ordering::SeqCst);
        self.puts.store(0, Ordering::SeqCst);
        self.removes.store(0, Ordering::SeqCst);
    }
}

/// An in-memory cache with operation counting, logging and fault injection.
#[derive(Debug)]
pub struct InstrumentedCache {
    inner: InMemoryCache,
    log: OpLog,
    counters: CacheCounters,
    fail_gets: AtomicBool,
    fail_puts: AtomicBool,
    gets_before_failure: Mutex<Option<usize>>,
    puts_before_failure: Mutex<Option<usize>>,
}

impl Default for InstrumentedCache {
    fn default() -> Self {
        Self::with_log(OpLog::new())
    }
}

impl InstrumentedCache {
    /// Creates a cache with its own log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cache that records into `log`.
    pub fn with_log(log: OpLog) -> Self {
        Self {
            inner: InMemoryCache::new(),
            log,
            counters: CacheCounters::default(),
            fail_gets: AtomicBool::new(false),
            fail_puts: AtomicBool::new(false),
            gets_before_failure: Mutex::new(None),
            puts_before_failure: Mutex::new(None),
        }
    }

    /// Returns the wrapped cache for direct inspection or tampering.
    /// Operations on it are neither counted nor logged.
    pub fn inner(&self) -> &InMemoryCache {
        &self.inner
    }

    /// Returns the operation log.
    pub fn log(&self) -> &OpLog {
        &self.log
    }

    /// Returns the operation tallies.
    pub fn counters(&self) -> &CacheCounters {
        &self.counters
    }

    /// Makes every `get` fail (or succeed again). Clears any budget set
    /// by [`InstrumentedCache::fail_gets_after`].
    pub fn fail_gets(&self, fail: bool) {
        self.fail_gets.store(fail, Ordering::SeqCst);
        *self.gets_before_failure.lock() = None;
    }

    /// Makes every `put` fail (or succeed again). Clears any budget set
    /// by [`InstrumentedCache::fail_puts_after`].
    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
        *self.puts_before_failure.lock() = None;
    }

    /// Lets the next `n` gets succeed and fails every get after them.
    pub fn fail_gets_after(&self, n: usize) {
        *self.gets_before_failure.lock() = Some(n);
    }

    /// Lets the next `n` puts succeed and fails every put after them.
    pub fn fail_puts_after(&self, n: usize) {
        *self.puts_before_failure.lock() = Some(n);
    }

    fn get_should_fail(&self) -> bool {
        self.fail_gets.load(Ordering::SeqCst) || budget_spent(&self.gets_before_failure)
    }

    fn put_should_fail(&self) -> bool {
        self.fail_puts.load(Ordering::SeqCst) || budget_spent(&self.puts_before_failure)
    }
}

/// Consumes one operation from `budget`; `true` once it has run out.
fn budget_spent(budget: &Mutex<Option<usize>>) -> bool {
    let mut budget = budget.lock();
    match budget.as_mut() {
        Some(0) => true,
        Some(n) => {
            *n -= 1;
            false
        }
        None => false,
    }
}

impl Cache for InstrumentedCache {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        self.counters.gets.fetch_add(1, Ordering::SeqCst);
        self.log.push(CacheOp::Get(key.to_owned()));
        if self.get_should_fail() {
            return Err(StorageError::Unavailable(format!("injected get failure for {key}")));
        }
        self.inner.get(key)
    }

    fn put(&self, key: &str, value: Vec<u8>) -> StorageResult<()> {
        self.counters.puts.fetch_add(1, Ordering::SeqCst);
        self.log.push(CacheOp::Put(key.to_owned()));
        if self.put_should_fail() {
            return Err(StorageError::Unavailable(format!("injected put failure for {key}")));
        }
        self.inner.put(key, value)
    }

    fn remove(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        self.counters.removes.fetch_add(1, Ordering::SeqCst);
        self.log.push(CacheOp::Remove(key.to_owned()));
        self.inner.remove(key)
    }

    fn contains_key(&self, key: &str) -> StorageResult<bool> {
        self.log.push(CacheOp::Contains(key.to_owned()));
        self.inner.contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_and_logs_operations() {
        let cache = InstrumentedCache::new();
        cache.put("a", vec![1]).unwrap();
        cache.get("a").unwrap();
        cache.get("b").unwrap();
        cache.remove("a").unwrap();

        assert_eq!(cache.counters().puts(), 1);
        assert_eq!(cache.counters().gets(), 2);
        assert_eq!(cache.counters().removes(), 1);
        assert_eq!(
            cache.log().ops(),
            vec![
                CacheOp::Put("a".into()),
                CacheOp::Get("a".into()),
                CacheOp::Get("b".into()),
                CacheOp::Remove("a".into()),
            ]
        );
    }

    #[test]
    fn shared_log_interleaves() {
        let log = OpLog::new();
        let first = InstrumentedCache::with_log(log.clone());
        let second = InstrumentedCache::with_log(log.clone());
        first.put("x", vec![]).unwrap();
        second.put("y", vec![]).unwrap();
        first.put("z", vec![]).unwrap();
        assert_eq!(log.puts(), vec!["x", "y", "z"]);
    }

    #[test]
    fn injected_failures() {
        let cache = InstrumentedCache::new();
        cache.put("a", vec![1]).unwrap();

        cache.fail_gets(true);
        assert!(matches!(cache.get("a"), Err(StorageError::Unavailable(_))));
        cache.fail_gets(false);
        assert!(cache.get("a").unwrap().is_some());

        cache.fail_puts(true);
        assert!(cache.put("b", vec![]).is_err());
        assert!(cache.inner().get("b").unwrap().is_none());
    }

    #[test]
    fn fail_after_budget() {
        let cache = InstrumentedCache::new();
        cache.fail_gets_after(2);
        assert!(cache.get("a").is_ok());
        assert!(cache.get("a").is_ok());
        assert!(cache.get("a").is_err());
        assert!(cache.get("a").is_err());
    }

    #[test]
    fn put_budget_and_reset() {
        let cache = InstrumentedCache::new();
        cache.fail_puts_after(1);
        assert!(cache.put("a", vec![1]).is_ok());
        assert!(cache.put("b", vec![2]).is_err());
        assert!(cache.inner().get("b").unwrap().is_none());

        cache.fail_puts(false);
        assert!(cache.put("b", vec![2]).is_ok());
        assert_eq!(cache.counters().puts(), 3);
    }
}
