//! Example demonstrating concurrent operations on ArrayMap
//!
//! Several threads insert disjoint keys, then readers and updaters run side
//! by side while a snapshot is taken.

use arraymap::ArrayMap;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

fn main() {
    env_logger::init();
    println!("=== Append-Optimized ArrayMap Demo ===\n");

    // Sized for the number of keys we are going to insert
    let map = Arc::new(ArrayMap::new(80_000).expect("positive capacity"));
    println!("Allocated {} buckets\n", map.capacity());

    println!("Benchmarking concurrent inserts...");
    let start = Instant::now();
    let mut handles = Vec::new();

    // Spawn 8 threads, each inserting 10,000 keys
    for thread_id in 0..8 {
        let map_clone = Arc::clone(&map);
        let handle = thread::spawn(move || {
            for i in 0..10_000 {
                let key = format!("user:{}", thread_id * 10_000 + i);
                map_clone.set(key, i);
            }
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.join().unwrap();
    }

    let duration = start.elapsed();
    println!(
        "Inserted 80,000 entries from 8 threads in {:?} ({:.2} ops/sec)",
        duration,
        80_000.0 / duration.as_secs_f64()
    );
    println!("Map contains {} entries\n", map.count());

    println!("Benchmarking mixed reads and updates...");
    let start = Instant::now();
    let mut handles = Vec::new();

    // 4 readers, 2 updaters over the same keys
    for _ in 0..4 {
        let map_clone = Arc::clone(&map);
        handles.push(thread::spawn(move || {
            let mut found = 0usize;
            for i in 0..10_000 {
                if map_clone.has(&format!("user:{}", i)) {
                    found += 1;
                }
            }
            found
        }));
    }
    for thread_id in 0..2 {
        let map_clone = Arc::clone(&map);
        handles.push(thread::spawn(move || {
            for i in 0..5_000 {
                map_clone.set(format!("user:{}", thread_id * 5_000 + i), 0);
            }
            0usize
        }));
    }

    let total_found: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    println!("Mixed operations completed in {:?}", start.elapsed());
    println!("Readers found {} keys", total_found);
    println!("Map still contains {} entries\n", map.count());

    let stats = map.chain_stats();
    println!(
        "Chains: {} occupied, {} with collisions ({:.2}%), longest {}",
        stats.occupied,
        stats.collided,
        stats.collision_rate() * 100.0,
        stats.longest
    );

    let snapshot = map.items();
    let zeroed = snapshot.values().filter(|v| **v == 0).count();
    println!("Snapshot holds {} entries, {} zeroed", snapshot.len(), zeroed);

    println!("\n=== Demo Complete ===");
}
