//! Store Property Tests
//!
//! Exercise the blob store through its public API: the concrete Hello/World
//! scenario, forced digest collisions and concurrent writers.
//!
//! Run with:
//! ```bash
//! cargo test --test store_properties
//! ```

use mailvault::{BlobKey, BlobStore, ContentHasher, Digest, MailRecord};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Barrier};
use std::thread;
use tempfile::tempdir;

const HELLO: &str = "8b1a9953c4611296a827abf8c47804d7";

/// Every payload hashes to the digest of "Hello"
struct CollidingHasher;

impl ContentHasher for CollidingHasher {
    fn digest(&self, _payload: &[u8]) -> Digest {
        Digest::from_hex(HELLO).unwrap()
    }

    fn name(&self) -> &str {
        "colliding"
    }
}

fn file_count(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

// ============================================================================
// Concrete scenario
// ============================================================================

#[test]
fn test_hello_world_scenario() {
    let dir = tempdir().unwrap();
    let root = dir.path();

    // Real MD5 for the first writes.
    let store = BlobStore::new(root);
    let first = store.put(b"Hello").unwrap();
    assert_eq!(first.key, BlobKey::new(Digest::from_hex(HELLO).unwrap(), 0));
    assert!(root.join("8b").join(HELLO).is_file());

    let second = store.put(b"Hello").unwrap();
    assert_eq!(second.key, first.key);
    assert!(!second.written);
    assert_eq!(file_count(&root.join("8b")), 1);

    // Same directory, a hasher that forces "World" onto Hello's digest.
    let colliding = BlobStore::with_hasher(root, CollidingHasher);
    let world = colliding.put(b"World").unwrap();
    assert_eq!(world.key.collision, 1);
    assert!(root.join("8b").join(format!("{}-1", HELLO)).is_file());

    assert_eq!(store.get(&first.key.digest, 0).unwrap(), b"Hello");
    assert_eq!(store.get(&world.key.digest, 1).unwrap(), b"World");
}

#[test]
fn test_distinct_payloads_never_share_a_location() {
    let dir = tempdir().unwrap();
    let store = BlobStore::new(dir.path());

    let payloads: Vec<Vec<u8>> = (0..64).map(|i| format!("message {}", i).into_bytes()).collect();
    let mut paths = HashSet::new();
    for p in &payloads {
        let key = store.put(p).unwrap().key;
        assert_eq!(key.collision, 0);
        assert!(paths.insert(store.path_for(&key)));
        assert_eq!(store.get(&key.digest, key.collision).unwrap(), *p);
    }
    assert_eq!(store.keys().unwrap().len(), payloads.len());
}

#[test]
fn test_empty_payload_roundtrip() {
    let dir = tempdir().unwrap();
    let store = BlobStore::new(dir.path());
    let key = store.put(b"").unwrap().key;
    assert_eq!(key.digest.to_hex(), "d41d8cd98f00b204e9800998ecf8427e");
    assert_eq!(store.get(&key.digest, 0).unwrap(), Vec::<u8>::new());
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn test_concurrent_identical_puts() {
    let dir = tempdir().unwrap();
    let store = BlobStore::new(dir.path());
    let threads = 16;
    let barrier = Arc::new(Barrier::new(threads));

    let keys: Vec<BlobKey> = thread::scope(|s| {
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let store = store.clone();
                let barrier = Arc::clone(&barrier);
                s.spawn(move || {
                    barrier.wait();
                    store.put(b"Hello").unwrap().key
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(keys.iter().all(|k| k.collision == 0 && k.digest.to_hex() == HELLO));
    assert_eq!(file_count(&dir.path().join("8b")), 1);
}

#[test]
fn test_concurrent_colliding_puts_claim_distinct_slots() {
    let dir = tempdir().unwrap();
    let store = BlobStore::with_hasher(dir.path(), CollidingHasher);
    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));

    let results: Vec<(Vec<u8>, BlobKey)> = thread::scope(|s| {
        let handles: Vec<_> = (0..threads)
            .map(|i| {
                let store = store.clone();
                let barrier = Arc::clone(&barrier);
                s.spawn(move || {
                    let payload = format!("payload {}", i).into_bytes();
                    barrier.wait();
                    let key = store.put(&payload).unwrap().key;
                    (payload, key)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let slots: HashSet<u32> = results.iter().map(|(_, k)| k.collision).collect();
    assert_eq!(slots, (0..threads as u32).collect::<HashSet<_>>());

    for (payload, key) in &results {
        assert_eq!(store.get(&key.digest, key.collision).unwrap(), *payload);
    }
    assert_eq!(file_count(&dir.path().join("8b")), threads);
}

#[test]
fn test_concurrent_mixed_puts_dedupe_per_payload() {
    let dir = tempdir().unwrap();
    let store = BlobStore::with_hasher(dir.path(), CollidingHasher);
    let threads = 12;
    let barrier = Arc::new(Barrier::new(threads));

    // Three distinct payloads, four writers each.
    let results: Vec<(usize, BlobKey)> = thread::scope(|s| {
        let handles: Vec<_> = (0..threads)
            .map(|i| {
                let store = store.clone();
                let barrier = Arc::clone(&barrier);
                s.spawn(move || {
                    let which = i % 3;
                    let payload = format!("variant {}", which).into_bytes();
                    barrier.wait();
                    (which, store.put(&payload).unwrap().key)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for which in 0..3 {
        let keys: HashSet<BlobKey> = results
            .iter()
            .filter(|(w, _)| *w == which)
            .map(|(_, k)| *k)
            .collect();
        assert_eq!(keys.len(), 1, "variant {} stored under several keys", which);
    }
    assert_eq!(store.keys().unwrap().len(), 3);
}

// ============================================================================
// Adapter over a shared store
// ============================================================================

#[test]
fn test_records_survive_collisions() {
    let dir = tempdir().unwrap();
    let store = BlobStore::with_hasher(dir.path(), CollidingHasher);

    let mut a = MailRecord::new("INBOX");
    let mut b = MailRecord::new("INBOX");
    a.set_body(&store, b"Subject: a\r\n\r\nfirst\r\n").unwrap();
    b.set_body(&store, b"Subject: b\r\n\r\nsecond\r\n").unwrap();

    assert_eq!(a.collision(), 0);
    assert_eq!(b.collision(), 1);
    assert_eq!(a.body(&store).unwrap(), b"Subject: a\r\n\r\nfirst\r\n");
    assert_eq!(b.body(&store).unwrap(), b"Subject: b\r\n\r\nsecond\r\n");
}
