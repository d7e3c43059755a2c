/// One bit per lane of a group; bit `i` set means lane `i` matched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct BitMask(pub(crate) u32);

impl BitMask {
    #[inline(always)]
    pub(crate) fn any_bit_set(self) -> bool {
        self.0 != 0
    }

    #[inline(always)]
    pub(crate) fn lowest_set_bit(self) -> Option<usize> {
        if self.any_bit_set() {
            Some(self.trailing_zeros())
        } else {
            None
        }
    }

    /// Lane of the lowest set bit, or the group width when no bit is set.
    #[inline(always)]
    pub(crate) fn trailing_zeros(self) -> usize {
        self.0.trailing_zeros() as usize
    }

    #[inline(always)]
    #[must_use]
    pub(crate) fn remove_lowest_bit(self) -> Self {
        BitMask(self.0 & self.0.wrapping_sub(1))
    }
}

impl IntoIterator for BitMask {
    type Item = usize;
    type IntoIter = BitMaskIter;

    #[inline(always)]
    fn into_iter(self) -> BitMaskIter {
        BitMaskIter(self)
    }
}

/// Yields set lanes in increasing order.
pub(crate) struct BitMaskIter(BitMask);

impl Iterator for BitMaskIter {
    type Item = usize;

    #[inline(always)]
    fn next(&mut self) -> Option<usize> {
        let bit = self.0.lowest_set_bit()?;
        self.0 = self.0.remove_lowest_bit();
        Some(bit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iterates_lanes_in_order() {
        let mask = BitMask(0b1000_0000_0000_0000_0000_0000_0010_0101);
        let lanes: Vec<usize> = mask.into_iter().collect();
        assert_eq!(lanes, vec![0, 2, 5, 31]);
    }

    #[test]
    fn empty_mask() {
        let mask = BitMask(0);
        assert!(!mask.any_bit_set());
        assert_eq!(mask.lowest_set_bit(), None);
        assert_eq!(mask.trailing_zeros(), 32);
        assert_eq!(mask.into_iter().next(), None);
    }
}
