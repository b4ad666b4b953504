//! Poison-tolerant lock acquisition.
//!
//! Session and cache state stay usable after a panic in another task; the
//! recovery is logged so the event is visible.

use std::sync::{LockResult, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::warn;

fn recover<G>(result: LockResult<G>, owner: &'static str, op: &'static str, kind: &'static str) -> G {
    result.unwrap_or_else(|poisoned| {
        warn!(
            op,
            owner,
            lock_kind = kind,
            result = "poisoned_recovered",
            "Recovered from poisoned lock; state may predate a panic"
        );
        poisoned.into_inner()
    })
}

pub(crate) fn rw_read<'a, T>(
    lock: &'a RwLock<T>,
    owner: &'static str,
    op: &'static str,
) -> RwLockReadGuard<'a, T> {
    recover(lock.read(), owner, op, "rwlock.read")
}

pub(crate) fn rw_write<'a, T>(
    lock: &'a RwLock<T>,
    owner: &'static str,
    op: &'static str,
) -> RwLockWriteGuard<'a, T> {
    recover(lock.write(), owner, op, "rwlock.write")
}

pub(crate) fn mutex_lock<'a, T>(
    lock: &'a Mutex<T>,
    owner: &'static str,
    op: &'static str,
) -> MutexGuard<'a, T> {
    recover(lock.lock(), owner, op, "mutex.lock")
}
