//! One-time selection of the probe engine for this CPU.
//!
//! The first public call initializes a process-wide [`Dispatch`]: CPU features
//! are queried, the configuration is read, a [`ProbeStrategy`] is bound and
//! the hash seed is fixed. The state never changes afterwards. Initialization
//! goes through a `OnceLock`, so concurrent first calls are fine.

use std::sync::OnceLock;

use crate::config::Config;
use crate::cpu::{self, CpuFeatures};
use crate::group::{GROUP_WIDTH, generic};
use crate::hash::{FoldKeyHasher, SplitHash};
use crate::raw::RawTable;

/// A probe engine bound to one group implementation.
pub(crate) trait ProbeStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn insert_unchecked<'k>(&self, table: &mut RawTable<'k>, hash: SplitHash, key: &'k [u8]);
    fn try_insert<'k>(&self, table: &mut RawTable<'k>, hash: SplitHash, key: &'k [u8]) -> bool;
    fn exists(&self, table: &RawTable<'_>, hash: SplitHash, key: &[u8]) -> bool;
    fn grow(&self, table: &mut RawTable<'_>);
}

/// Portable engine; runs anywhere.
pub(crate) struct ScalarProbe;

impl ProbeStrategy for ScalarProbe {
    fn name(&self) -> &'static str {
        "scalar"
    }

    fn insert_unchecked<'k>(&self, table: &mut RawTable<'k>, hash: SplitHash, key: &'k [u8]) {
        // Safety: the generic group uses no special instructions.
        unsafe { table.insert_unchecked::<generic::Group>(hash, key) }
    }

    fn try_insert<'k>(&self, table: &mut RawTable<'k>, hash: SplitHash, key: &'k [u8]) -> bool {
        unsafe { table.try_insert::<generic::Group>(hash, key) }
    }

    fn exists(&self, table: &RawTable<'_>, hash: SplitHash, key: &[u8]) -> bool {
        unsafe { table.exists::<generic::Group>(hash, key) }
    }

    fn grow(&self, table: &mut RawTable<'_>) {
        unsafe { table.grow::<generic::Group>() }
    }
}

#[cfg(target_arch = "x86_64")]
mod avx2 {
    use super::ProbeStrategy;
    use crate::cpu::CpuFeatures;
    use crate::group::avx2::Group;
    use crate::hash::SplitHash;
    use crate::raw::RawTable;

    /// AVX2 engine. Only constructible once the CPU has reported AVX2 and BMI1.
    pub(crate) struct Avx2Probe {
        _detected: (),
    }

    impl Avx2Probe {
        pub(crate) fn new(features: &CpuFeatures) -> Option<Self> {
            features
                .supports_avx2_probe()
                .then_some(Avx2Probe { _detected: () })
        }
    }

    #[target_feature(enable = "avx2,bmi1")]
    unsafe fn insert_unchecked<'k>(table: &mut RawTable<'k>, hash: SplitHash, key: &'k [u8]) {
        unsafe { table.insert_unchecked::<Group>(hash, key) }
    }

    #[target_feature(enable = "avx2,bmi1")]
    unsafe fn try_insert<'k>(table: &mut RawTable<'k>, hash: SplitHash, key: &'k [u8]) -> bool {
        unsafe { table.try_insert::<Group>(hash, key) }
    }

    #[target_feature(enable = "avx2,bmi1")]
    unsafe fn exists(table: &RawTable<'_>, hash: SplitHash, key: &[u8]) -> bool {
        unsafe { table.exists::<Group>(hash, key) }
    }

    #[target_feature(enable = "avx2,bmi1")]
    unsafe fn grow(table: &mut RawTable<'_>) {
        unsafe { table.grow::<Group>() }
    }

    // Safety (all methods): an Avx2Probe exists only if AVX2 and BMI1 were detected.
    impl ProbeStrategy for Avx2Probe {
        fn name(&self) -> &'static str {
            "avx2"
        }

        fn insert_unchecked<'k>(&self, table: &mut RawTable<'k>, hash: SplitHash, key: &'k [u8]) {
            unsafe { insert_unchecked(table, hash, key) }
        }

        fn try_insert<'k>(&self, table: &mut RawTable<'k>, hash: SplitHash, key: &'k [u8]) -> bool {
            unsafe { try_insert(table, hash, key) }
        }

        fn exists(&self, table: &RawTable<'_>, hash: SplitHash, key: &[u8]) -> bool {
            unsafe { exists(table, hash, key) }
        }

        fn grow(&self, table: &mut RawTable<'_>) {
            unsafe { grow(table) }
        }
    }
}

pub struct Dispatch {
    features: CpuFeatures,
    strategy: Box<dyn ProbeStrategy>,
    seed: u64,
}

static DISPATCH: OnceLock<Dispatch> = OnceLock::new();

/// The process-wide dispatch table, initializing it on first use.
pub fn dispatch() -> &'static Dispatch {
    DISPATCH.get_or_init(|| Dispatch::new(cpu::get_features(), &Config::from_env()))
}

/// Alignment (and group width) the set uses for its control bytes.
///
/// Calling this before spawning threads forces initialization.
pub fn get_alignment() -> usize {
    dispatch();
    GROUP_WIDTH
}

impl Dispatch {
    fn new(features: CpuFeatures, config: &Config) -> Self {
        let strategy = select_strategy(&features, config);
        let seed = config.seed.unwrap_or_else(|| fastrand::u64(..));
        log::info!(
            "stset: {} probe ({}), {} seed",
            strategy.name(),
            features,
            if config.seed.is_some() { "fixed" } else { "random" },
        );
        Self {
            features,
            strategy,
            seed,
        }
    }

    pub fn features(&self) -> CpuFeatures {
        self.features
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn hasher(&self) -> FoldKeyHasher {
        FoldKeyHasher::with_seed(self.seed)
    }

    pub(crate) fn strategy(&self) -> &dyn ProbeStrategy {
        &*self.strategy
    }
}

impl std::fmt::Debug for Dispatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatch")
            .field("features", &self.features)
            .field("strategy", &self.strategy.name())
            .finish_non_exhaustive()
    }
}

fn select_strategy(features: &CpuFeatures, config: &Config) -> Box<dyn ProbeStrategy> {
    if config.force_scalar {
        return Box::new(ScalarProbe);
    }
    #[cfg(target_arch = "x86_64")]
    {
        if let Some(probe) = avx2::Avx2Probe::new(features) {
            return Box::new(probe);
        }
    }
    let _ = features;
    Box::new(ScalarProbe)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initializes_once() {
        let a = dispatch();
        let b = dispatch();
        assert!(std::ptr::eq(a, b));
        assert_eq!(a.seed(), b.seed());
        assert_eq!(get_alignment(), GROUP_WIDTH);
        assert_eq!(a.features(), cpu::get_features());
    }

    #[test]
    fn concurrent_first_calls_agree() {
        use rayon::prelude::*;

        let seeds: Vec<u64> = (0..64).into_par_iter().map(|_| dispatch().seed()).collect();
        assert!(seeds.iter().all(|&seed| seed == seeds[0]));
    }

    #[test]
    fn picks_avx2_only_with_bmi1() {
        let config = Config::default();
        let none = CpuFeatures::default();
        assert_eq!(Dispatch::new(none, &config).strategy_name(), "scalar");

        let avx2_only = CpuFeatures {
            avx2: true,
            ..CpuFeatures::default()
        };
        assert_eq!(Dispatch::new(avx2_only, &config).strategy_name(), "scalar");
    }

    #[test]
    fn matches_detected_hardware() {
        let features = cpu::get_features();
        let dispatch = Dispatch::new(features, &Config::default());
        let expected = if cfg!(target_arch = "x86_64") && features.supports_avx2_probe() {
            "avx2"
        } else {
            "scalar"
        };
        assert_eq!(dispatch.strategy_name(), expected);
    }

    #[test]
    fn force_scalar_wins() {
        let config = Config {
            seed: Some(9),
            force_scalar: true,
        };
        let dispatch = Dispatch::new(cpu::get_features(), &config);
        assert_eq!(dispatch.strategy_name(), "scalar");
        assert_eq!(dispatch.seed(), 9);
        assert_eq!(dispatch.hasher().seed(), 9);
    }
}
