//! Control-byte groups: `GROUP_WIDTH` consecutive control bytes scanned at once.
//!
//! Both implementations share width, alignment and lane order, so a table built
//! with one can be probed with the other.

mod bitmask;
pub(crate) mod generic;

#[cfg(target_arch = "x86_64")]
pub(crate) mod avx2;

pub(crate) use bitmask::BitMask;

/// Lanes per group. Also the alignment of the control-byte array.
pub const GROUP_WIDTH: usize = 32;

pub(crate) trait Group: Copy {
    /// # Safety
    /// `ptr` must be aligned to `GROUP_WIDTH` and valid for `GROUP_WIDTH` reads,
    /// and the CPU must support whatever instructions the implementation uses.
    unsafe fn load_aligned(ptr: *const u8) -> Self;

    /// Lanes whose occupied bit is clear.
    fn match_empty(self) -> BitMask;

    /// Lanes whose control byte equals `tag` exactly.
    fn match_tag(self, tag: u8) -> BitMask;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::OCCUPIED;

    #[repr(align(32))]
    struct Ctrl([u8; GROUP_WIDTH]);

    fn scalar_empty(ctrl: &Ctrl) -> u32 {
        ctrl.0
            .iter()
            .enumerate()
            .filter(|(_, b)| **b & OCCUPIED == 0)
            .fold(0, |mask, (i, _)| mask | 1 << i)
    }

    fn scalar_tag(ctrl: &Ctrl, tag: u8) -> u32 {
        ctrl.0
            .iter()
            .enumerate()
            .filter(|(_, b)| **b == tag)
            .fold(0, |mask, (i, _)| mask | 1 << i)
    }

    fn random_ctrl(rng: &mut fastrand::Rng) -> Ctrl {
        let mut ctrl = Ctrl([0; GROUP_WIDTH]);
        for byte in &mut ctrl.0 {
            // Few distinct tags so matches actually happen.
            *byte = if rng.bool() { 0 } else { OCCUPIED | rng.u8(0..4) };
        }
        ctrl
    }

    #[test]
    fn generic_matches_reference() {
        let mut rng = fastrand::Rng::with_seed(11);
        for _ in 0..2_000 {
            let ctrl = random_ctrl(&mut rng);
            let group = unsafe { generic::Group::load_aligned(ctrl.0.as_ptr()) };
            assert_eq!(group.match_empty().0, scalar_empty(&ctrl));
            for tag in OCCUPIED..OCCUPIED + 4 {
                assert_eq!(group.match_tag(tag).0, scalar_tag(&ctrl, tag));
            }
        }
    }

    #[test]
    fn generic_all_empty_and_all_full() {
        let empty = Ctrl([0; GROUP_WIDTH]);
        let group = unsafe { generic::Group::load_aligned(empty.0.as_ptr()) };
        assert_eq!(group.match_empty().0, u32::MAX);
        assert!(!group.match_tag(OCCUPIED).any_bit_set());

        let full = Ctrl([OCCUPIED | 0x7e; GROUP_WIDTH]);
        let group = unsafe { generic::Group::load_aligned(full.0.as_ptr()) };
        assert!(!group.match_empty().any_bit_set());
        assert_eq!(group.match_tag(OCCUPIED | 0x7e).0, u32::MAX);
        assert!(!group.match_tag(OCCUPIED | 0x7d).any_bit_set());
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn avx2_agrees_with_generic() {
        if !crate::cpu::get_features().supports_avx2_probe() {
            return;
        }

        #[target_feature(enable = "avx2")]
        unsafe fn masks(ctrl: &Ctrl, tag: u8) -> (u32, u32) {
            let group = unsafe { avx2::Group::load_aligned(ctrl.0.as_ptr()) };
            (group.match_empty().0, group.match_tag(tag).0)
        }

        let mut rng = fastrand::Rng::with_seed(12);
        for _ in 0..2_000 {
            let ctrl = random_ctrl(&mut rng);
            let group = unsafe { generic::Group::load_aligned(ctrl.0.as_ptr()) };
            for tag in OCCUPIED..OCCUPIED + 4 {
                let (empty, matched) = unsafe { masks(&ctrl, tag) };
                assert_eq!(empty, group.match_empty().0);
                assert_eq!(matched, group.match_tag(tag).0);
            }
        }
    }
}
