//! Scoped lock acquisition
//!
//! Task context uses `embassy_sync::mutex::Mutex::lock`, whose guard releases
//! on drop along every exit path. Interrupt context must never wait, so it
//! gets [`IsrGuard`]: a single try-acquire that remembers whether it won.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};

/// Non-blocking scoped lock for interrupt context
///
/// Released on drop if (and only if) it was acquired.
pub struct IsrGuard<'a, M: RawMutex, T> {
    guard: Option<MutexGuard<'a, M, T>>,
}

impl<'a, M: RawMutex, T> IsrGuard<'a, M, T> {
    /// Try once to take `mutex`
    pub fn acquire(mutex: &'a Mutex<M, T>) -> Self {
        Self {
            guard: mutex.try_lock().ok(),
        }
    }

    /// Whether the lock is held
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.guard.is_some()
    }

    /// The protected value, if the lock is held
    pub fn get(&mut self) -> Option<&mut T> {
        self.guard.as_deref_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    #[test]
    fn test_acquire_free_mutex() {
        let mutex: Mutex<NoopRawMutex, u8> = Mutex::new(1);
        let mut guard = IsrGuard::acquire(&mutex);
        assert!(guard.is_locked());
        if let Some(value) = guard.get() {
            *value = 2;
        }
        drop(guard);
        assert_eq!(mutex.try_lock().map(|g| *g).ok(), Some(2));
    }

    #[test]
    fn test_contended_mutex_not_acquired() {
        let mutex: Mutex<NoopRawMutex, u8> = Mutex::new(0);
        let held = mutex.try_lock();
        assert!(held.is_ok());

        let mut guard = IsrGuard::acquire(&mutex);
        assert!(!guard.is_locked());
        assert!(guard.get().is_none());

        // Dropping an unacquired guard must not release the holder's lock
        drop(guard);
        assert!(mutex.try_lock().is_err());
    }

    #[test]
    fn test_release_on_drop() {
        let mutex: Mutex<NoopRawMutex, u8> = Mutex::new(0);
        {
            let guard = IsrGuard::acquire(&mutex);
            assert!(guard.is_locked());
        }
        assert!(IsrGuard::acquire(&mutex).is_locked());
    }
}
