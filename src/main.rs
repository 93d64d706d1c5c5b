//! Example demonstrating the `RwLock` from the `axiom-rwlock` crate.
//!
//! This program spawns 32 reader threads that keep checking a shared
//! snapshot and 4 writer threads that keep replacing it. Every snapshot
//! carries its own checksum, so a reader observing a half-written value
//! would notice. Run with `RUST_LOG=trace` to see writers draining readers.

use axiom_rwlock::RwLock;
use log::info;
use std::thread;

/// A value that is only consistent when written as a whole.
struct Snapshot {
    version: u64,
    values: [u64; 8],
    checksum: u64,
}

// Shared static lock protecting the snapshot.
static SNAPSHOT: RwLock<Snapshot> = RwLock::new(Snapshot {
    version: 0,
    values: [0; 8],
    checksum: 0,
});

/// Publish a new version of the snapshot a thousand times.
fn write() {
    for _ in 0..1_000 {
        let mut snapshot = SNAPSHOT.write();
        snapshot.version += 1;
        let version = snapshot.version;
        for (i, v) in snapshot.values.iter_mut().enumerate() {
            *v = version * (i as u64 + 1);
        }
        snapshot.checksum = snapshot.values.iter().sum();
    }
}

/// Verify the snapshot ten thousand times, returning how many reads were consistent.
fn read() -> usize {
    let mut consistent = 0;
    for _ in 0..10_000 {
        let snapshot = SNAPSHOT.read();
        if snapshot.values.iter().sum::<u64>() == snapshot.checksum {
            consistent += 1;
        }
    }
    consistent
}

fn main() {
    env_logger::init();
    info!("Starting rwlock test...");

    let writers: Vec<_> = (0..4).map(|_| thread::spawn(write)).collect();
    let readers: Vec<_> = (0..32).map(|_| thread::spawn(read)).collect();

    for w in writers {
        let _ = w.join();
    }
    let consistent: usize = readers.into_iter().filter_map(|r| r.join().ok()).sum();

    println!("Final version: {}", SNAPSHOT.read().version);
    println!("Consistent reads: {} / {}", consistent, 32 * 10_000);
}
