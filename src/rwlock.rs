//! # RwLock
//!
//! A data-carrying wrapper around [`ReadWriteLock`]. Where the raw lock only
//! sequences access, [`RwLock<T>`] owns the value it protects and hands it out
//! through guards, so the begin/end pairing can't be forgotten.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::thread;
//! use axiom_rwlock::RwLock;
//!
//! let config = Arc::new(RwLock::new(vec![1, 2, 3]));
//!
//! let reader = {
//!     let config = config.clone();
//!     thread::spawn(move || config.read().iter().sum::<i32>())
//! };
//!
//! config.write().push(4);
//!
//! let sum = reader.join().unwrap();
//! assert!(sum == 6 || sum == 10);
//! assert_eq!(config.read().len(), 4);
//! ```

use core::cell::UnsafeCell;
use core::fmt;
use core::marker::PhantomData;
use core::ops::{Deref, DerefMut};

use crate::ReadWriteLock;

/// A writer-preferring reader/writer lock that owns its data.
///
/// Behaves like [`ReadWriteLock`]: readers share, writers are exclusive, and
/// a waiting writer blocks new readers.
pub struct RwLock<T> {
    raw: ReadWriteLock,
    data: UnsafeCell<T>,
}

/// Shared access to the data of an [`RwLock`], released when dropped.
#[must_use = "the lock is released immediately if the guard is not held"]
pub struct RwLockReadGuard<'a, T> {
    lock: &'a RwLock<T>,
    _not_send: PhantomData<*const ()>,
}

/// Exclusive access to the data of an [`RwLock`], released when dropped.
#[must_use = "the lock is released immediately if the guard is not held"]
pub struct RwLockWriteGuard<'a, T> {
    lock: &'a RwLock<T>,
    _not_send: PhantomData<*const ()>,
}

impl<T> RwLock<T> {
    /// Creates a new [`RwLock`] wrapping the given data.
    ///
    /// # Example
    /// ```
    /// use axiom_rwlock::RwLock;
    ///
    /// static TABLE: RwLock<[u8; 4]> = RwLock::new([0; 4]);
    /// TABLE.write()[1] = 7;
    /// assert_eq!(TABLE.read()[1], 7);
    /// ```
    #[inline]
    pub const fn new(data: T) -> Self {
        RwLock {
            raw: ReadWriteLock::new(),
            data: UnsafeCell::new(data),
        }
    }

    /// Acquires shared access, blocking while a writer is pending or active.
    #[inline]
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.raw.begin_read();
        RwLockReadGuard {
            lock: self,
            _not_send: PhantomData,
        }
    }

    /// Acquires exclusive access, blocking until other writers and all
    /// active readers are gone.
    #[inline]
    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.raw.begin_write();
        RwLockWriteGuard {
            lock: self,
            _not_send: PhantomData,
        }
    }

    /// Runs a closure with shared access to the data.
    ///
    /// # Example
    /// ```
    /// use axiom_rwlock::RwLock;
    /// let lock = RwLock::new(String::from("axiom"));
    /// assert_eq!(lock.with_read(|s| s.len()), 5);
    /// ```
    #[inline]
    pub fn with_read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let guard = self.read();
        f(&*guard)
    }

    /// Runs a closure with exclusive access to the data.
    ///
    /// # Example
    /// ```
    /// use axiom_rwlock::RwLock;
    /// let lock = RwLock::new(0i32);
    /// lock.with_write(|data| {
    ///     *data += 1;
    /// });
    /// assert_eq!(*lock.read(), 1);
    /// ```
    #[inline]
    pub fn with_write<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.write();
        f(&mut *guard)
    }

    /// Returns a mutable reference to the data without locking.
    ///
    /// The exclusive borrow already rules out every other accessor.
    #[inline]
    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }

    /// Consumes the lock and returns the data.
    #[inline]
    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }

    /// The underlying [`ReadWriteLock`], for inspecting its state.
    #[inline(always)]
    pub fn raw(&self) -> &ReadWriteLock {
        &self.raw
    }
}

impl<T: Default> Default for RwLock<T> {
    #[inline]
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> From<T> for RwLock<T> {
    #[inline]
    fn from(data: T) -> Self {
        Self::new(data)
    }
}

impl<T> fmt::Debug for RwLock<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RwLock")
            .field("reader_count", &self.raw.reader_count())
            .field("writer_pending", &self.raw.is_writer_pending())
            .finish_non_exhaustive()
    }
}

impl<T> Drop for RwLockReadGuard<'_, T> {
    #[inline]
    fn drop(&mut self) {
        // SAFETY: the guard was created by a successful begin_read.
        unsafe { self.lock.raw.end_read() }
    }
}

impl<T> Drop for RwLockWriteGuard<'_, T> {
    #[inline]
    fn drop(&mut self) {
        // SAFETY: the guard was created by a successful begin_write.
        unsafe { self.lock.raw.end_write() }
    }
}

impl<T> Deref for RwLockReadGuard<'_, T> {
    type Target = T;
    #[inline(always)]
    fn deref(&self) -> &T {
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> Deref for RwLockWriteGuard<'_, T> {
    type Target = T;
    #[inline(always)]
    fn deref(&self) -> &T {
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> DerefMut for RwLockWriteGuard<'_, T> {
    #[inline(always)]
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T: fmt::Debug> fmt::Debug for RwLockReadGuard<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

impl<T: fmt::Debug> fmt::Debug for RwLockWriteGuard<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

// Safety: readers only get `&T` (hence `T: Sync`) and a writer gets `&mut T`
// exclusively, possibly on another thread (hence `T: Send`).
unsafe impl<T: Send> Send for RwLock<T> {}
unsafe impl<T: Send + Sync> Sync for RwLock<T> {}

// Safety: a shared guard only hands out `&T`.
unsafe impl<T: Sync> Sync for RwLockReadGuard<'_, T> {}
unsafe impl<T: Sync> Sync for RwLockWriteGuard<'_, T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_read_and_write_guards() {
        let lock = RwLock::new(10);

        {
            let mut guard = lock.write();
            *guard += 5;
            assert_eq!(*guard, 15);
            assert!(lock.raw().is_writer_pending());
        }
        assert!(!lock.raw().is_writer_pending(), "Write guard should release on drop");

        let a = lock.read();
        let b = lock.read();
        assert_eq!(*a + *b, 30);
        assert_eq!(lock.raw().reader_count(), 2);
        drop((a, b));
        assert_eq!(lock.raw().reader_count(), 0);
    }

    #[test]
    fn test_concurrent_increments() {
        let lock = Arc::new(RwLock::new(0usize));
        let mut handles = vec![];

        for id in 0..8 {
            let lock_cloned = lock.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..5_000 {
                    if id % 2 == 0 {
                        *lock_cloned.write() += 1;
                    } else {
                        let seen = *lock_cloned.read();
                        assert!(seen <= 4 * 5_000);
                    }
                }
            }));
        }

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(*lock.read(), 4 * 5_000, "Counter should match total increments");
    }

    #[test]
    fn test_writer_sees_no_torn_state() {
        let lock = Arc::new(RwLock::new((0u64, 0u64)));
        let mut handles = vec![];

        for id in 0..6 {
            let lock = lock.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..2_000 {
                    if id == 0 {
                        lock.with_write(|pair| {
                            pair.0 += 1;
                            thread::yield_now();
                            pair.1 += 1;
                        });
                    } else {
                        lock.with_read(|pair| assert_eq!(pair.0, pair.1, "Reader saw a half-written pair"));
                    }
                }
            }));
        }

        for h in handles {
            h.join().unwrap();
        }
        let lock = Arc::try_unwrap(lock).ok().expect("all threads joined");
        assert_eq!(lock.into_inner(), (2_000, 2_000));
    }

    #[test]
    fn test_reader_blocked_by_write_guard() {
        let lock = Arc::new(RwLock::new(String::from("before")));
        let guard = lock.write();

        let (tx, rx) = mpsc::channel();
        let reader = {
            let lock = lock.clone();
            thread::spawn(move || tx.send(lock.read().clone()).unwrap())
        };

        assert!(rx.recv_timeout(Duration::from_millis(150)).is_err(), "Reader entered during write");

        let mut guard = guard;
        guard.replace_range(.., "after");
        drop(guard);

        assert_eq!(rx.recv_timeout(Duration::from_secs(10)).unwrap(), "after");
        reader.join().unwrap();
    }

    #[test]
    fn test_get_mut_default_and_from() {
        let mut lock: RwLock<Vec<u8>> = RwLock::default();
        lock.get_mut().push(1);
        assert_eq!(*lock.read(), vec![1]);

        let lock = RwLock::from(3u8);
        assert_eq!(format!("{:?}", lock.read()), "3");
        assert!(format!("{lock:?}").starts_with("RwLock"));
    }

    #[test]
    fn test_guards_shared_across_scoped_threads() {
        let lock = RwLock::new(vec![1u32, 2, 3]);

        let read = lock.read();
        let sums: Vec<u32> = thread::scope(|s| {
            let read = &read;
            let handles: Vec<_> = (0..3).map(|_| s.spawn(move || read.iter().sum::<u32>())).collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(sums, vec![6, 6, 6]);
        drop(read);

        let mut write = lock.write();
        write.push(4);
        let len = thread::scope(|s| {
            let write = &write;
            s.spawn(move || write.len()).join().unwrap()
        });
        assert_eq!(len, 4);
    }
}
