//! Runtime CPU capability query.
//!
//! Only the three features the set cares about are reported. Detection goes
//! through `is_x86_feature_detected!`, which reads CPUID leaves 1 and 7 and also
//! checks that the OS saves the wide registers, so a reported `avx2` is usable.

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CpuFeatures {
    pub bmi1: bool,
    pub avx2: bool,
    pub sse4_2: bool,
}

impl CpuFeatures {
    /// Whether the vectorized probe engine can run on this CPU.
    #[inline]
    pub fn supports_avx2_probe(&self) -> bool {
        self.avx2 && self.bmi1
    }
}

impl std::fmt::Display for CpuFeatures {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "bmi1={} avx2={} sse4.2={}",
            self.bmi1, self.avx2, self.sse4_2
        )
    }
}

/// Query the hardware. Cheap and side-effect free; std caches the CPUID result.
#[cfg(target_arch = "x86_64")]
pub fn get_features() -> CpuFeatures {
    CpuFeatures {
        bmi1: std::is_x86_feature_detected!("bmi1"),
        avx2: std::is_x86_feature_detected!("avx2"),
        sse4_2: std::is_x86_feature_detected!("sse4.2"),
    }
}

#[cfg(not(target_arch = "x86_64"))]
pub fn get_features() -> CpuFeatures {
    CpuFeatures::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn features_are_stable_across_calls() {
        let first = get_features();
        for _ in 0..16 {
            assert_eq!(get_features(), first);
        }
    }

    #[test]
    fn avx2_probe_needs_both_features() {
        let mut features = CpuFeatures {
            bmi1: true,
            avx2: false,
            sse4_2: true,
        };
        assert!(!features.supports_avx2_probe());
        features.avx2 = true;
        assert!(features.supports_avx2_probe());
        features.bmi1 = false;
        assert!(!features.supports_avx2_probe());
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn avx2_implies_sse4_2() {
        // Every AVX2 part also ships SSE4.2.
        let features = get_features();
        if features.avx2 {
            assert!(features.sse4_2);
        }
    }
}
