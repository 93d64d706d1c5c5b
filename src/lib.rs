//! # axiom-rwlock 📖✍️
//!
//! A **writer-preferring reader/writer lock** for protecting a resource that
//! is read by many threads and occasionally written by one.
//!
//! The crate includes:
//!
//! - [`ReadWriteLock`] — the lock itself, driven by four explicit calls:
//!   `begin_read` / `end_read` and `begin_write` / `end_write`.
//! - [`RwLock<T>`] — a data-owning wrapper with RAII guards.
//!
//! Readers run side by side. A writer runs alone. Once a writer announces
//! itself, readers that arrive later wait behind it, so writers never starve
//! under a constant flow of readers.
//!
//! ## ✨ Features
//!
//! - 🔓 Write sections that span two calls (`begin_write` … `end_write`), not
//!   just a lexical scope
//! - 🧵 Blocking waits on condition variables; nothing spins
//! - 🔒 Scoped [`ReadSection`] / [`WriteSection`] guards and typed
//!   [`RwLockReadGuard`] / [`RwLockWriteGuard`]
//! - 🪵 `log` trace events on the slow paths
//!
//! ## 🚀 Quick Example
//!
//! ```rust
//! use axiom_rwlock::{ReadWriteLock, RwLock};
//!
//! // Example 1: explicit sections
//! let lock = ReadWriteLock::new();
//! lock.begin_write();
//! // ... exclusive work ...
//! // Safety: this thread began the write section above.
//! unsafe { lock.end_write() };
//!
//! // Example 2: a lock that owns its data
//! let counter = RwLock::new(0);
//! *counter.write() += 1;
//! assert_eq!(*counter.read(), 1);
//! ```
//!
//! ## 🧠 Design
//!
//! A reader registers in an atomic reader count and then checks an atomic
//! writer-pending flag; if the flag is up it steps back out and parks until
//! the writer is done. A writer takes an exclusive gate (one writer at a
//! time), raises the flag, and parks until the reader count drains to zero.
//! It keeps the gate until `end_write`, which lowers the flag, releases the
//! gate and wakes the parked readers.
//!
//! ## ⚠️ Safety & Usage Notes
//!
//! - Not reentrant, and no read → write upgrade.
//! - No timeouts and no `try_*` variants; every acquisition blocks until
//!   admitted.
//! - `end_read` / `end_write` are `unsafe`: they must pair with a
//!   `begin_*` on the same thread. Prefer the guards.
//!
//! ## 📦 Modules
//!
//! - [`raw`] — the explicit begin/end lock.
//! - [`rwlock`] — the data-carrying wrapper.

pub mod raw;
pub mod rwlock;

pub use raw::{ReadSection, ReadWriteLock, WriteSection};
pub use rwlock::{RwLock, RwLockReadGuard, RwLockWriteGuard};
