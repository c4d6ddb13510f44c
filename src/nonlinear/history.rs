//! Per-solve iteration history.
//!
//! `RingBuffer` is the bounded vector memory used by Anderson mixing: slots
//! are allocated once and reused, and rotation only moves the head index.
//! `IterationHistory` records the scalar diagnostics of every step.

use crate::error::NlError;

/// Fixed-capacity circular buffer, logical order oldest → newest.
#[derive(Clone, Debug)]
pub struct RingBuffer<T> {
    slots: Vec<T>,
    capacity: usize,
    /// Physical index of the oldest entry.
    head: usize,
    len: usize,
}

impl<T> RingBuffer<T> {
    /// Reserve room for `capacity` entries; fails instead of aborting on OOM.
    pub fn with_capacity<S>(capacity: usize) -> Result<Self, NlError<S>> {
        let mut slots = Vec::new();
        slots.try_reserve_exact(capacity)?;
        Ok(RingBuffer {
            slots,
            capacity,
            head: 0,
            len: 0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.capacity
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    fn physical(&self, i: usize) -> usize {
        (self.head + i) % self.capacity
    }

    /// Append `value`, evicting the oldest entry when full.
    pub fn push(&mut self, value: T) {
        if self.capacity == 0 {
            return;
        }
        if self.len < self.capacity {
            let idx = self.physical(self.len);
            if idx < self.slots.len() {
                self.slots[idx] = value;
            } else {
                self.slots.push(value);
            }
            self.len += 1;
        } else {
            let idx = self.head;
            self.slots[idx] = value;
            self.head = (self.head + 1) % self.capacity;
        }
    }

    /// Logical access, `0` is the oldest entry.
    pub fn get(&self, i: usize) -> Option<&T> {
        if i < self.len {
            Some(&self.slots[self.physical(i)])
        } else {
            None
        }
    }

    pub fn newest(&self) -> Option<&T> {
        self.len.checked_sub(1).and_then(|i| self.get(i))
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        (0..self.len).map(move |i| &self.slots[self.physical(i)])
    }
}

impl<S: Clone> RingBuffer<Vec<S>> {
    /// Copy `x` into the next slot, reusing the evicted vector's allocation.
    pub fn push_copy(&mut self, x: &[S]) {
        if self.capacity == 0 {
            return;
        }
        let idx = if self.len < self.capacity {
            self.physical(self.len)
        } else {
            self.head
        };
        if idx < self.slots.len() {
            let slot = &mut self.slots[idx];
            slot.clear();
            slot.extend_from_slice(x);
            if self.len < self.capacity {
                self.len += 1;
            } else {
                self.head = (self.head + 1) % self.capacity;
            }
        } else {
            self.push(x.to_vec());
        }
    }
}

impl<T> std::ops::Index<usize> for RingBuffer<T> {
    type Output = T;
    fn index(&self, i: usize) -> &T {
        self.get(i).expect("RingBuffer index out of range")
    }
}

/// Scalar diagnostics recorded once per iteration.
#[derive(Clone, Debug, Default)]
pub struct IterationHistory {
    damping_factors: Vec<f64>,
    change_norms: Vec<f64>,
    residual_norms: Vec<f64>,
    jacobian_assembled: Vec<bool>,
}

impl IterationHistory {
    /// Empty history with room for `expected_steps` records.
    pub fn with_capacity<S>(expected_steps: usize) -> Result<Self, NlError<S>> {
        let mut h = IterationHistory::default();
        h.damping_factors.try_reserve_exact(expected_steps)?;
        h.change_norms.try_reserve_exact(expected_steps)?;
        h.residual_norms.try_reserve_exact(expected_steps)?;
        h.jacobian_assembled.try_reserve_exact(expected_steps)?;
        Ok(h)
    }

    pub fn record(&mut self, damping_factor: f64, change_norm: f64, residual_norm: f64, jacobian_assembled: bool) {
        self.damping_factors.push(damping_factor);
        self.change_norms.push(change_norm);
        self.residual_norms.push(residual_norm);
        self.jacobian_assembled.push(jacobian_assembled);
    }

    /// Number of completed iterations.
    pub fn iterations(&self) -> usize {
        self.change_norms.len()
    }

    /// Damping factor applied at each step.
    pub fn damping_factors(&self) -> &[f64] {
        &self.damping_factors
    }

    /// Damping-scaled solution change per step.
    pub fn change_norms(&self) -> &[f64] {
        &self.change_norms
    }

    /// `‖J x_k − r(x_k)‖₂` of the iterate entering each step.
    pub fn residual_norms(&self) -> &[f64] {
        &self.residual_norms
    }

    /// Whether each step reassembled the Jacobian.
    pub fn jacobian_assembled(&self) -> &[bool] {
        &self.jacobian_assembled
    }

    /// `(previous, current)` change norms, once two steps exist.
    pub fn last_change_pair(&self) -> Option<(f64, f64)> {
        match self.change_norms.as_slice() {
            [.., prev, cur] => Some((*prev, *cur)),
            _ => None,
        }
    }

    /// `(previous, current)` residual norms, once two steps exist.
    pub fn last_residual_pair(&self) -> Option<(f64, f64)> {
        match self.residual_norms.as_slice() {
            [.., prev, cur] => Some((*prev, *cur)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_keeps_oldest_to_newest_order() {
        let mut r = RingBuffer::with_capacity::<f64>(3).unwrap();
        for v in 1..=5 {
            r.push(v);
        }
        assert!(r.is_full());
        assert_eq!(r.iter().copied().collect::<Vec<_>>(), vec![3, 4, 5]);
        assert_eq!(r[0], 3);
        assert_eq!(r.newest(), Some(&5));
        assert_eq!(r.get(3), None);
    }

    #[test]
    fn push_copy_reuses_slots() {
        let mut r = RingBuffer::<Vec<f64>>::with_capacity::<f64>(2).unwrap();
        r.push_copy(&[1.0, 1.0]);
        r.push_copy(&[2.0, 2.0]);
        let before = r[0].as_ptr();
        r.push_copy(&[3.0, 3.0]);
        assert_eq!(r[0], vec![2.0, 2.0]);
        assert_eq!(r[1], vec![3.0, 3.0]);
        // the evicted vector's buffer now holds the newest entry
        assert_eq!(r[1].as_ptr(), before);
        r.clear();
        assert!(r.is_empty());
        r.push_copy(&[4.0, 4.0]);
        assert_eq!(r.newest(), Some(&vec![4.0, 4.0]));
    }

    #[test]
    fn history_pairs() {
        let mut h = IterationHistory::with_capacity::<f64>(4).unwrap();
        assert_eq!(h.last_change_pair(), None);
        h.record(1.0, 4.0, 8.0, true);
        assert_eq!(h.last_change_pair(), None);
        h.record(0.5, 2.0, 3.0, false);
        assert_eq!(h.last_change_pair(), Some((4.0, 2.0)));
        assert_eq!(h.last_residual_pair(), Some((8.0, 3.0)));
        assert_eq!(h.iterations(), 2);
        assert_eq!(h.jacobian_assembled(), &[true, false]);
    }
}
