//! In-memory [`ChainStore`] with real transaction semantics.
//!
//! Writes are staged in the transaction handle and applied to the base
//! tables only on `commit`; dropping the handle discards them. Id
//! reservations hit the allocator directly so they survive rollback,
//! matching sequence semantics of the production store.
//!
//! Transactions serialize on one store-wide lock, acquired with the
//! configured lock-wait bound. Tests inject failures at chosen points to
//! exercise the abort paths.

use crate::ports::outbound::{
    CaseAssignment, ChainStore, StoreError, StoreResult, StoreTransaction, Table,
};
use parking_lot::{Mutex, MutexGuard};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

const INJECTED: &str = "injected failure";

/// Where an injected failure fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePoint {
    /// `begin` fails with a lock-wait timeout.
    LockTimeout,
    /// The first write touching this table fails.
    OnTable(Table),
    /// The write after `n` successful writes fails.
    AfterWrites(usize),
}

#[derive(Default)]
struct Inner {
    tables: HashMap<Table, BTreeMap<Vec<u8>, Vec<u8>>>,
    sequences: HashMap<Table, u64>,
}

/// In-memory transactional row store.
pub struct MemoryStore {
    inner: Mutex<Inner>,
    lock_wait: Duration,
    idle_limit: Duration,
    failure: Mutex<Option<FailurePoint>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_timeouts(Duration::from_secs(5), Duration::from_secs(30))
    }

    pub fn with_timeouts(lock_wait: Duration, idle_limit: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            lock_wait,
            idle_limit,
            failure: Mutex::new(None),
        }
    }

    /// Store with the timeouts the subsystem config asks of its durable
    /// store.
    pub fn from_config(config: &crate::config::CommitConfig) -> Self {
        Self::with_timeouts(
            Duration::from_millis(config.lock_wait_ms),
            Duration::from_millis(config.idle_txn_timeout_ms),
        )
    }

    /// Arms a one-shot failure point for the next transaction.
    pub fn inject_failure(&self, point: FailurePoint) {
        *self.failure.lock() = Some(point);
    }

    pub fn clear_failure(&self) {
        *self.failure.lock() = None;
    }

    /// Rows currently in a table, for assertions.
    pub fn row_count(&self, table: Table) -> usize {
        self.inner
            .lock()
            .tables
            .get(&table)
            .map_or(0, BTreeMap::len)
    }

    fn lock_inner(&self) -> StoreResult<MutexGuard<'_, Inner>> {
        self.inner
            .try_lock_for(self.lock_wait)
            .ok_or(StoreError::LockTimeout {
                table: Table::Mempool,
                waited_ms: self.lock_wait.as_millis() as u64,
            })
    }
}

impl ChainStore for MemoryStore {
    fn get(&self, table: Table, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        let inner = self.lock_inner()?;
        Ok(inner
            .tables
            .get(&table)
            .and_then(|rows| rows.get(key))
            .cloned())
    }

    fn scan(
        &self,
        table: Table,
        after: Option<&[u8]>,
        limit: usize,
    ) -> StoreResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let inner = self.lock_inner()?;
        let Some(rows) = inner.tables.get(&table) else {
            return Ok(Vec::new());
        };
        let page = match after {
            Some(after) => rows
                .range::<[u8], _>((std::ops::Bound::Excluded(after), std::ops::Bound::Unbounded)),
            None => rows.range::<[u8], _>(..),
        };
        Ok(page
            .take(limit)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn begin(&self) -> StoreResult<Box<dyn StoreTransaction + '_>> {
        let failure = self.failure.lock().take();
        if failure == Some(FailurePoint::LockTimeout) {
            return Err(StoreError::LockTimeout {
                table: Table::Mempool,
                waited_ms: self.lock_wait.as_millis() as u64,
            });
        }
        let guard = self.lock_inner()?;
        Ok(Box::new(MemoryTransaction {
            inner: guard,
            staged: Vec::new(),
            failure,
            writes_done: 0,
            idle_limit: self.idle_limit,
            last_op: std::time::Instant::now(),
        }))
    }
}

enum Staged {
    Put(Table, Vec<u8>, Vec<u8>),
    Delete(Table, Vec<u8>),
}

/// Holds the store lock for its lifetime; other transactions wait.
struct MemoryTransaction<'a> {
    inner: MutexGuard<'a, Inner>,
    staged: Vec<Staged>,
    failure: Option<FailurePoint>,
    writes_done: usize,
    idle_limit: Duration,
    last_op: std::time::Instant,
}

impl MemoryTransaction<'_> {
    fn check_failure(&mut self, table: Table) -> StoreResult<()> {
        let idle = self.last_op.elapsed();
        if idle > self.idle_limit {
            return Err(StoreError::IdleTimeout {
                idle_ms: idle.as_millis() as u64,
            });
        }
        self.last_op = std::time::Instant::now();
        match self.failure {
            Some(FailurePoint::OnTable(t)) if t == table => {
                Err(StoreError::Backend(INJECTED.into()))
            }
            Some(FailurePoint::AfterWrites(n)) if self.writes_done >= n => {
                Err(StoreError::Backend(INJECTED.into()))
            }
            _ => {
                self.writes_done += 1;
                Ok(())
            }
        }
    }

    /// Point read through the staged overlay.
    fn effective_get(&self, table: Table, key: &[u8]) -> Option<Vec<u8>> {
        for write in self.staged.iter().rev() {
            match write {
                Staged::Put(t, k, v) if *t == table && k.as_slice() == key => {
                    return Some(v.clone())
                }
                Staged::Delete(t, k) if *t == table && k.as_slice() == key => return None,
                _ => {}
            }
        }
        self.inner
            .tables
            .get(&table)
            .and_then(|rows| rows.get(key))
            .cloned()
    }
}

impl StoreTransaction for MemoryTransaction<'_> {
    fn insert_unique(&mut self, table: Table, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.check_failure(table)?;
        if self.effective_get(table, key).is_some() {
            return Err(StoreError::DuplicateKey { table });
        }
        self.staged
            .push(Staged::Put(table, key.to_vec(), value.to_vec()));
        Ok(())
    }

    fn upsert(&mut self, table: Table, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.check_failure(table)?;
        self.staged
            .push(Staged::Put(table, key.to_vec(), value.to_vec()));
        Ok(())
    }

    fn delete(&mut self, table: Table, key: &[u8]) -> StoreResult<()> {
        self.check_failure(table)?;
        self.staged.push(Staged::Delete(table, key.to_vec()));
        Ok(())
    }

    fn batch_insert(&mut self, table: Table, rows: &[(Vec<u8>, Vec<u8>)]) -> StoreResult<()> {
        self.check_failure(table)?;
        for (key, value) in rows {
            if self.effective_get(table, key).is_some() {
                return Err(StoreError::DuplicateKey { table });
            }
            self.staged
                .push(Staged::Put(table, key.clone(), value.clone()));
        }
        Ok(())
    }

    fn update_rows(&mut self, table: Table, assignments: &[CaseAssignment]) -> StoreResult<()> {
        self.check_failure(table)?;
        // CASE-update semantics: rows without a match are left alone.
        for assignment in assignments {
            if self.effective_get(table, &assignment.key).is_some() {
                self.staged.push(Staged::Put(
                    table,
                    assignment.key.clone(),
                    assignment.value.clone(),
                ));
            }
        }
        Ok(())
    }

    fn reserve_ids(&mut self, table: Table, count: u64) -> StoreResult<u64> {
        // Applied to the allocator directly, not staged: reservations
        // survive rollback.
        let next = self.inner.sequences.entry(table).or_insert(1);
        let base = *next;
        *next += count;
        Ok(base)
    }

    fn get(&self, table: Table, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.effective_get(table, key))
    }

    fn commit(self: Box<Self>) -> StoreResult<()> {
        let mut this = *self;
        for write in this.staged.drain(..) {
            match write {
                Staged::Put(table, key, value) => {
                    this.inner.tables.entry(table).or_default().insert(key, value);
                }
                Staged::Delete(table, key) => {
                    if let Some(rows) = this.inner.tables.get_mut(&table) {
                        rows.remove(&key);
                    }
                }
            }
        }
        Ok(())
    }
}
