use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mailvault::BlobStore;
use tempfile::tempdir;

fn message(i: usize) -> Vec<u8> {
    format!(
        "From: bench@example.com\r\nSubject: message {}\r\n\r\n{}\r\n",
        i,
        "lorem ipsum ".repeat(200)
    )
    .into_bytes()
}

fn bench_put(c: &mut Criterion) {
    c.bench_function("put_new", |b| {
        let dir = tempdir().unwrap();
        let store = BlobStore::new(dir.path());
        let mut i = 0;
        b.iter(|| {
            i += 1;
            store.put(black_box(&message(i))).unwrap()
        })
    });

    c.bench_function("put_duplicate", |b| {
        let dir = tempdir().unwrap();
        let store = BlobStore::new(dir.path());
        let payload = message(0);
        store.put(&payload).unwrap();
        b.iter(|| store.put(black_box(&payload)).unwrap())
    });

    c.bench_function("get", |b| {
        let dir = tempdir().unwrap();
        let store = BlobStore::new(dir.path());
        let key = store.put(&message(0)).unwrap().key;
        b.iter(|| store.get(black_box(&key.digest), key.collision))
    });
}

criterion_group!(benches, bench_put);
criterion_main!(benches);
