use arraymap::{fold32, ArrayMap};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn test_two_threads_distinct_keys() {
    // capacity 1 leaves five buckets, so "x" and "y" may well share one
    for _ in 0..100 {
        let map = Arc::new(ArrayMap::new(1).unwrap());
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = ["x", "y"]
            .into_iter()
            .map(|key| {
                let m = map.clone();
                let b = barrier.clone();
                thread::spawn(move || {
                    b.wait();
                    m.set(key, 1);
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(map.count(), 2);
        assert_eq!(map.get(&"x"), Some(1));
        assert_eq!(map.get(&"y"), Some(1));
    }
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_concurrent_distinct_inserts() {
    let map = Arc::new(ArrayMap::with_hasher(8000, fold32::<u64>).unwrap());

    let mut handles = vec![];
    for t in 0..8u64 {
        let m = map.clone();
        handles.push(thread::spawn(move || {
            for i in 0..1000 {
                let key = t * 1000 + i;
                m.set(key, key * 2);
            }
        }));
    }

    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(map.count(), 8000);
    for key in 0..8000u64 {
        assert_eq!(map.get(&key), Some(key * 2));
    }
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_random_keys_count_is_exact() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut keys = HashSet::new();
    while keys.len() < 20_000 {
        keys.insert(rng.gen::<u64>());
    }
    let keys: Arc<Vec<u64>> = Arc::new(keys.into_iter().collect());

    let map = Arc::new(ArrayMap::with_hasher(keys.len(), fold32::<u64>).unwrap());
    let threads = 8;
    let chunk = keys.len() / threads;

    let mut handles = vec![];
    for t in 0..threads {
        let m = map.clone();
        let keys = keys.clone();
        handles.push(thread::spawn(move || {
            for &key in &keys[t * chunk..(t + 1) * chunk] {
                m.set(key, !key);
            }
        }));
    }

    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(map.count(), keys.len());
    let items = map.items();
    assert_eq!(items.len(), keys.len());
    for key in keys.iter() {
        assert_eq!(items[key], !key);
    }
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_overlapping_first_inserts() {
    // every thread races to create the same keys
    let map = Arc::new(ArrayMap::with_hasher(500, fold32::<u32>).unwrap());
    let barrier = Arc::new(Barrier::new(8));

    let mut handles = vec![];
    for t in 0..8u32 {
        let m = map.clone();
        let b = barrier.clone();
        handles.push(thread::spawn(move || {
            b.wait();
            for key in 0..500 {
                m.set(key, t);
            }
        }));
    }

    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(map.count(), 500);
    assert_eq!(map.items().len(), 500);
    for key in 0..500 {
        assert!(map.get(&key).unwrap() < 8);
    }
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_single_bucket_contention() {
    let map = Arc::new(ArrayMap::with_hasher(1, |_: &u32| 7).unwrap());

    let mut handles = vec![];
    for t in 0..4u32 {
        let m = map.clone();
        handles.push(thread::spawn(move || {
            for i in 0..250 {
                m.set(t * 250 + i, i);
            }
        }));
    }

    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(map.count(), 1000);
    let stats = map.chain_stats();
    assert_eq!(stats.occupied, 1);
    assert_eq!(stats.longest, 1000);
    assert_eq!(stats.entries, 1000);
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_heavy_contention_same_key() {
    let map = Arc::new(ArrayMap::new(1).unwrap());

    let mut handles = vec![];
    for t in 0..8u64 {
        let m = map.clone();
        handles.push(thread::spawn(move || {
            for i in 0..5000 {
                m.set("hot", t * 5000 + i);
                let _ = m.get(&"hot");
            }
        }));
    }

    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(map.count(), 1);
    let last = map.get(&"hot").unwrap();
    assert!(last < 40_000);
    assert_eq!(last % 5000, 4999);
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_read_heavy() {
    let map = Arc::new(ArrayMap::with_hasher(2000, fold32::<u32>).unwrap());

    // Pre-populate
    for i in 0..1000 {
        map.set(i, i * 2);
    }

    let mut handles = vec![];

    // Many readers
    for _ in 0..8 {
        let m = map.clone();
        handles.push(thread::spawn(move || {
            for i in 0..10_000 {
                let key = i % 1000;
                assert_eq!(m.get(&key), Some(key * 2));
            }
        }));
    }

    // One writer
    {
        let m = map.clone();
        handles.push(thread::spawn(move || {
            for i in 1000..2000 {
                m.set(i, i * 2);
            }
        }));
    }

    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(map.count(), 2000);
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_snapshot_during_writes() {
    let map = Arc::new(ArrayMap::with_hasher(4000, fold32::<u32>).unwrap());
    for i in 0..1000 {
        map.set(i, 0);
    }

    let writer = {
        let m = map.clone();
        thread::spawn(move || {
            for i in 1000..4000 {
                m.set(i, 0);
            }
        })
    };

    for _ in 0..20 {
        let items = map.items();
        assert!(items.len() >= 1000);
        assert!(items.len() <= 4000);
        for i in 0..1000 {
            assert!(items.contains_key(&i));
        }
    }

    writer.join().unwrap();
    assert_eq!(map.items().len(), 4000);
}
