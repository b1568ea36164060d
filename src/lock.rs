//! Lock naming for lockable models.
//!
//! Mutual exclusion itself comes from a [`LockProvider`] supplied by the
//! caller. This module decides which names to take and in what order.

use log::{debug, warn};

use crate::db_error::{DbError, DbResult};
use crate::model::Model;

/// Acquires and releases named locks.
pub trait LockProvider {
    fn acquire(&self, name: &str) -> DbResult<()>;

    fn release(&self, name: &str) -> DbResult<()>;
}

/// Lock names `model` requires, sorted and de-duplicated. Empty when the
/// model is not lockable.
pub fn required_locks<M: Model + ?Sized>(model: &M) -> Vec<String> {
    if !model.is_lockable() {
        return Vec::new();
    }

    let mut names = model.lock_file_names();
    names.sort();
    names.dedup();
    names
}

/// Runs `f` while holding every lock in `names`.
///
/// Names are acquired in sorted order and released in reverse, whether or not
/// `f` succeeds. If an acquisition fails, the locks already taken are
/// released and `f` does not run.
pub fn with_locks<T, F>(provider: &dyn LockProvider, names: &[String], f: F) -> DbResult<T>
where
    F: FnOnce() -> DbResult<T>,
{
    let mut ordered: Vec<&String> = names.iter().collect();
    ordered.sort();
    ordered.dedup();

    let mut held: Vec<&str> = Vec::with_capacity(ordered.len());
    for name in ordered {
        debug!("Acquiring lock {name}");
        if let Err(e) = provider.acquire(name) {
            release_all(provider, &held);
            return Err(DbError::LockError(format!("could not acquire {name}: {e}")));
        }
        held.push(name);
    }

    let result = f();
    release_all(provider, &held);
    result
}

fn release_all(provider: &dyn LockProvider, held: &[&str]) {
    for name in held.iter().rev() {
        debug!("Releasing lock {name}");
        if let Err(e) = provider.release(name) {
            warn!("Failed to release lock {name}: {e}");
        }
    }
}
