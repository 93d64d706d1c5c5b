//! # ReadWriteLock
//!
//! A writer-preferring reader/writer lock exposed as four explicit operations:
//! [`begin_read`](ReadWriteLock::begin_read), [`end_read`](ReadWriteLock::end_read),
//! [`begin_write`](ReadWriteLock::begin_write) and
//! [`end_write`](ReadWriteLock::end_write).
//!
//! Any number of readers may hold a read section at the same time. A writer
//! gets the resource exclusively. As soon as a writer calls `begin_write`,
//! newly arriving readers are parked until that writer has finished, so a
//! steady stream of readers can never starve writers. Readers that were
//! already inside their section when the writer arrived are never evicted;
//! the writer waits for them to drain.
//!
//! Waiting threads are parked on condition variables instead of spinning, so
//! sections may be long.
//!
//! ## Example
//! ```rust
//! use axiom_rwlock::ReadWriteLock;
//!
//! let lock = ReadWriteLock::new();
//!
//! lock.begin_read();
//! assert_eq!(lock.reader_count(), 1);
//! // Safety: this thread holds the read section it just began.
//! unsafe { lock.end_read() };
//!
//! lock.begin_write();
//! assert!(lock.is_writer_pending());
//! // Safety: this thread holds the write section it just began.
//! unsafe { lock.end_write() };
//!
//! // Scoped sections end themselves on drop.
//! {
//!     let _section = lock.read();
//!     assert_eq!(lock.reader_count(), 1);
//! }
//! assert_eq!(lock.reader_count(), 0);
//! ```
//!
//! ## Caveats
//! - The lock is **not reentrant**: a thread inside a section must not begin
//!   another section of the same lock. A second `begin_write` on the same
//!   thread deadlocks.
//! - There is no upgrade from a read section to a write section.
//! - Readers are not ordered among themselves, and queued writers are not
//!   FIFO; writers are only guaranteed to run one at a time.

use core::fmt;
use core::marker::PhantomData;
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering::SeqCst};

use lock_api::RawMutex as _;
use log::trace;
use parking_lot::{Condvar, Mutex, RawMutex};

/// A writer-preferring reader/writer lock with explicit begin/end calls.
///
/// The write section is not tied to a lexical scope: `begin_write` returns
/// while still holding the exclusive gate and `end_write` releases it.
/// See the [module-level documentation](self) for examples.
pub struct ReadWriteLock {
    reader_count: AtomicUsize,
    writer_pending: AtomicBool,
    /// Exclusive gate, held from `begin_write` until `end_write`.
    gate: RawMutex,
    read_admission: Mutex<()>,
    readers_drained: Condvar,
    write_admission: Mutex<()>,
    writer_admitted: Condvar,
}

impl ReadWriteLock {
    /// Creates an idle lock: no readers and no pending writer.
    ///
    /// # Example
    /// ```
    /// use axiom_rwlock::ReadWriteLock;
    ///
    /// static LOCK: ReadWriteLock = ReadWriteLock::new();
    /// assert_eq!(LOCK.reader_count(), 0);
    /// assert!(!LOCK.is_writer_pending());
    /// ```
    #[inline]
    pub const fn new() -> Self {
        ReadWriteLock {
            reader_count: AtomicUsize::new(0),
            writer_pending: AtomicBool::new(false),
            gate: <RawMutex as lock_api::RawMutex>::INIT,
            read_admission: Mutex::new(()),
            readers_drained: Condvar::new(),
            write_admission: Mutex::new(()),
            writer_admitted: Condvar::new(),
        }
    }

    /// Enters a read section, blocking while a writer is pending or active.
    ///
    /// After this returns the calling thread is registered as an active
    /// reader and may access the resource alongside other readers until it
    /// calls [`end_read`](Self::end_read).
    pub fn begin_read(&self) {
        loop {
            if self.writer_pending.load(SeqCst) {
                self.wait_for_writer();
            }

            self.reader_count.fetch_add(1, SeqCst);
            if !self.writer_pending.load(SeqCst) {
                return;
            }

            // A writer raised its flag after our check but may have already
            // sampled the count; step back out so its drain can complete.
            self.release_reader();
        }
    }

    /// Leaves a read section and wakes any writer waiting for readers to drain.
    ///
    /// # Safety
    /// - The calling thread must currently hold a read section begun with
    ///   [`begin_read`](Self::begin_read).
    /// - Unbalanced calls corrupt the reader count and break exclusion.
    #[inline]
    pub unsafe fn end_read(&self) {
        self.release_reader();
    }

    /// Enters the write section.
    ///
    /// Blocks first on the exclusive gate (other writers), then until every
    /// reader that is already inside a read section has left. Readers that
    /// arrive after this call are held back until [`end_write`](Self::end_write).
    pub fn begin_write(&self) {
        self.gate.lock();
        self.writer_pending.store(true, SeqCst);

        if self.reader_count.load(SeqCst) > 0 {
            trace!(
                "writer waiting for {} reader(s) to drain",
                self.reader_count.load(SeqCst)
            );
            let mut admission = self.write_admission.lock();
            while self.reader_count.load(SeqCst) > 0 {
                self.writer_admitted.wait(&mut admission);
            }
        }
    }

    /// Leaves the write section, letting the next writer or the parked
    /// readers in.
    ///
    /// # Safety
    /// - The calling thread must currently hold the write section begun with
    ///   [`begin_write`](Self::begin_write).
    /// - Calling this without owning the section releases a gate held by
    ///   someone else.
    pub unsafe fn end_write(&self) {
        debug_assert!(
            self.writer_pending.load(SeqCst),
            "end_write called without a matching begin_write"
        );
        self.writer_pending.store(false, SeqCst);

        drop(self.write_admission.lock());
        self.writer_admitted.notify_all();

        // SAFETY: the caller holds the write section, which owns the gate.
        unsafe { self.gate.unlock() };

        drop(self.read_admission.lock());
        let woken = self.readers_drained.notify_all();
        if woken > 0 {
            trace!("writer released, woke {} parked reader(s)", woken);
        }
    }

    /// Enters a read section that ends when the returned [`ReadSection`] is dropped.
    ///
    /// # Example
    /// ```
    /// use axiom_rwlock::ReadWriteLock;
    ///
    /// let lock = ReadWriteLock::new();
    /// {
    ///     let _section = lock.read();
    ///     assert_eq!(lock.reader_count(), 1);
    /// }
    /// assert_eq!(lock.reader_count(), 0);
    /// ```
    #[inline]
    pub fn read(&self) -> ReadSection<'_> {
        self.begin_read();
        ReadSection {
            lock: self,
            _not_send: PhantomData,
        }
    }

    /// Enters the write section, which ends when the returned
    /// [`WriteSection`] is dropped.
    #[inline]
    pub fn write(&self) -> WriteSection<'_> {
        self.begin_write();
        WriteSection {
            lock: self,
            _not_send: PhantomData,
        }
    }

    /// Number of threads currently registered as readers.
    ///
    /// This is a snapshot; it may change as soon as it is returned.
    #[inline(always)]
    pub fn reader_count(&self) -> usize {
        self.reader_count.load(SeqCst)
    }

    /// Whether a writer is waiting for, or holding, the write section.
    #[inline(always)]
    pub fn is_writer_pending(&self) -> bool {
        self.writer_pending.load(SeqCst)
    }

    fn wait_for_writer(&self) {
        trace!("reader parked behind pending writer");
        let mut admission = self.read_admission.lock();
        while self.writer_pending.load(SeqCst) {
            self.readers_drained.wait(&mut admission);
        }
    }

    fn release_reader(&self) {
        let previous = self.reader_count.fetch_sub(1, SeqCst);
        debug_assert!(previous > 0, "end_read called without a matching begin_read");

        drop(self.write_admission.lock());
        self.writer_admitted.notify_all();
    }
}

impl Default for ReadWriteLock {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ReadWriteLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadWriteLock")
            .field("reader_count", &self.reader_count())
            .field("writer_pending", &self.is_writer_pending())
            .finish_non_exhaustive()
    }
}

/// A read section on a [`ReadWriteLock`], ended when dropped.
///
/// Returned from [`ReadWriteLock::read`]. Must stay on the thread that
/// created it.
#[must_use = "the read section ends immediately if the guard is not held"]
pub struct ReadSection<'a> {
    lock: &'a ReadWriteLock,
    _not_send: PhantomData<*const ()>,
}

impl Drop for ReadSection<'_> {
    #[inline]
    fn drop(&mut self) {
        // SAFETY: a ReadSection only exists after a successful begin_read.
        unsafe { self.lock.end_read() }
    }
}

/// The write section on a [`ReadWriteLock`], ended when dropped.
///
/// Returned from [`ReadWriteLock::write`]. Must stay on the thread that
/// created it.
#[must_use = "the write section ends immediately if the guard is not held"]
pub struct WriteSection<'a> {
    lock: &'a ReadWriteLock,
    _not_send: PhantomData<*const ()>,
}

impl Drop for WriteSection<'_> {
    #[inline]
    fn drop(&mut self) {
        // SAFETY: a WriteSection only exists after a successful begin_write.
        unsafe { self.lock.end_write() }
    }
}
