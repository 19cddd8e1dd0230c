use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

/// One mutex per package name, created on first use.
///
/// Holding a package's lock makes its read-latest / insert-if-changed
/// sequence atomic with respect to any other sync of the same package.
#[derive(Default)]
pub struct PackageLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl PackageLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_package(&self, package_name: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock();
        Arc::clone(locks.entry(package_name.to_string()).or_default())
    }

    /// Drop the entry for a package that is gone, unless someone still
    /// holds (or waits on) its lock.
    pub fn release(&self, package_name: &str) {
        let mut locks = self.locks.lock();
        if locks
            .get(package_name)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(package_name);
        }
    }

    #[cfg(test)]
    pub(crate) fn tracked(&self) -> usize {
        self.locks.lock().len()
    }
}
