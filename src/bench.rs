use std::collections::HashSet;
use std::time::{Duration, Instant};

use dashmap::DashSet;
use foldhash::fast::RandomState as FoldRandomState;
use rayon::prelude::*;
use stset::StSet;
use stset::hash::{FoldKeyHasher, KeyHasher};
use voracious_radix_sort::RadixSort;

use crate::hashers::BuildPrehashed;

const MAX_WORD_LEN: usize = 12;

/// `n` lowercase words of 1..=12 letters. Roughly a quarter are repeats.
fn generate_words(n: usize, seed: u64) -> Vec<Vec<u8>> {
    let distinct = (n - n / 4).max(1) as u64;
    (0..n)
        .into_par_iter()
        .map(|i| {
            let word_id = (i as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15) % distinct;
            let mut rng = fastrand::Rng::with_seed(seed ^ word_id);
            let len = rng.usize(1..=MAX_WORD_LEN);
            (0..len).map(|_| rng.lowercase() as u8).collect()
        })
        .collect()
}

fn count_unique_stset(keys: &[&[u8]]) -> usize {
    let mut set = StSet::new(keys.len());
    keys.iter().filter(|&&key| set.try_insert(key)).count()
}

fn count_unique_hashset(keys: &[&[u8]], hasher: FoldRandomState) -> usize {
    let mut set = HashSet::with_capacity_and_hasher(keys.len(), hasher);
    keys.iter().filter(|&&key| set.insert(key)).count()
}

fn count_unique_dashset(keys: &[&[u8]], hasher: FoldRandomState) -> usize {
    let set = DashSet::with_capacity_and_hasher(keys.len(), hasher);
    keys.par_iter().filter(|&&key| set.insert(key)).count()
}

/// Counts distinct hashes, not distinct keys.
fn count_unique_scc(hashes: &[u64]) -> usize {
    let set = scc::HashSet::with_capacity_and_hasher(hashes.len(), BuildPrehashed::default());
    hashes.iter().filter(|&&hash| set.insert(hash).is_ok()).count()
}

/// Counts distinct hashes by sorting them.
fn count_unique_sorted(hashes: &[u64]) -> usize {
    let mut sorted = hashes.to_vec();
    sorted.voracious_mt_sort(rayon::current_num_threads());
    sorted.dedup();
    sorted.len()
}

fn benchmark(name: &str, repeats: usize, mut f: impl FnMut() -> usize) {
    // Warmup.
    let expected = f();
    let start = Instant::now();
    for _ in 0..repeats {
        std::hint::black_box(f());
    }
    let duration = start.elapsed();
    println!("  {}: {} ({} unique)", name, human_time(repeats, duration), expected);
}

fn human_time(repeats: usize, duration: Duration) -> String {
    let mut value = duration.as_nanos() as f64 / repeats.max(1) as f64;
    for unit in ["ns", "us", "ms"] {
        if value < 1000.0 {
            return format!("{value:.1}{unit}");
        }
        value /= 1000.0;
    }
    format!("{value:.1}s")
}

fn human_size(size: usize) -> String {
    if size < 1024 {
        return format!("{size}B");
    }
    let mut value = size as f64 / 1024.0;
    for unit in ["KiB", "MiB"] {
        if value < 1024.0 {
            return format!("{value:.1}{unit}");
        }
        value /= 1024.0;
    }
    format!("{value:.1}GiB")
}

pub fn run() {
    let hasher = FoldKeyHasher::with_seed(0);
    for lg_size in [10, 14, 17, 20] {
        let words = generate_words(1 << lg_size, 0);
        let keys: Vec<&[u8]> = words.iter().map(Vec::as_slice).collect();
        let hashes: Vec<u64> = keys.iter().map(|key| hasher.hash_bytes(key)).collect();
        let repeats = 1usize << 22usize.saturating_sub(lg_size);
        let bytes: usize = keys.iter().map(|key| key.len()).sum();
        println!("words: {} ({})", keys.len(), human_size(bytes));

        benchmark("StSet (try_insert)", repeats, || count_unique_stset(&keys));

        let fold = FoldRandomState::default();
        benchmark("HashSet (FoldHash)", repeats, || {
            count_unique_hashset(&keys, fold.clone())
        });
        benchmark("DashSet (FoldHash, rayon)", repeats, || {
            count_unique_dashset(&keys, fold.clone())
        });
        benchmark("scc::HashSet (prehashed)", repeats, || count_unique_scc(&hashes));
        benchmark("voracious sort (prehashed)", repeats, || {
            count_unique_sorted(&hashes)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_agree() {
        let words = generate_words(5_000, 3);
        assert!(words.iter().all(|w| (1..=MAX_WORD_LEN).contains(&w.len())));
        let keys: Vec<&[u8]> = words.iter().map(Vec::as_slice).collect();

        let exact = count_unique_hashset(&keys, FoldRandomState::default());
        assert!(exact < keys.len());
        assert_eq!(count_unique_stset(&keys), exact);
        assert_eq!(count_unique_dashset(&keys, FoldRandomState::default()), exact);

        let hasher = FoldKeyHasher::with_seed(1);
        let hashes: Vec<u64> = keys.iter().map(|key| hasher.hash_bytes(key)).collect();
        assert_eq!(count_unique_scc(&hashes), count_unique_sorted(&hashes));
    }

    #[test]
    fn human_units() {
        assert_eq!(human_time(1, Duration::from_nanos(12)), "12.0ns");
        assert_eq!(human_time(2, Duration::from_micros(3)), "1.5us");
        assert_eq!(human_time(1, Duration::from_secs(5)), "5.0s");
        assert_eq!(human_size(512), "512B");
        assert_eq!(human_size(3 << 20), "3.0MiB");
    }
}
