//! Triangular probe sequence.
//!
//! Starting from `hash & mask`, the n-th step advances by `n`, so the
//! cumulative offsets are the triangular numbers 0, 1, 3, 6, 10, ...
//! Modulo a power of two these hit every slot exactly once within
//! `capacity` probes.

pub(crate) struct Probe {
    pos: usize,
    step: usize,
    mask: usize,
}

impl Probe {
    #[inline]
    pub(crate) fn new(hash: u64, mask: usize) -> Self {
        debug_assert!(mask.wrapping_add(1).is_power_of_two());
        Self {
            pos: (hash as usize) & mask,
            step: 0,
            mask,
        }
    }
}

impl Iterator for Probe {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        if self.step > self.mask {
            return None;
        }
        let pos = self.pos;
        self.step += 1;
        self.pos = (self.pos + self.step) & self.mask;
        Some(pos)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.mask + 1 - self.step;
        (left, Some(left))
    }
}

impl ExactSizeIterator for Probe {}

#[cfg(test)]
mod tests {
    use super::Probe;

    #[test]
    fn offsets_are_triangular() {
        let seq: Vec<usize> = Probe::new(0, 63).take(6).collect();
        assert_eq!(seq, vec![0, 1, 3, 6, 10, 15]);
    }

    #[test]
    fn wraps_around_mask() {
        let seq: Vec<usize> = Probe::new(6, 7).take(4).collect();
        assert_eq!(seq, vec![6, 7, 1, 4]);
    }

    #[test]
    fn visits_every_slot_once() {
        for level in 0..12 {
            let cap = 1usize << level;
            for start in [0u64, 1, 5, u64::MAX] {
                let mut seen = vec![false; cap];
                let probe = Probe::new(start, cap - 1);
                assert_eq!(probe.len(), cap);
                for i in probe {
                    assert!(!seen[i], "slot {} visited twice at capacity {}", i, cap);
                    seen[i] = true;
                }
                assert!(seen.iter().all(|&s| s), "capacity {} not covered", cap);
            }
        }
    }
}
