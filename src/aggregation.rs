use crate::slot::{Mode, Slot};
use crate::window::Window;

/// Folds over a range of a window's buckets.
///
/// Every call takes a fresh snapshot of the window under its read lock. An empty
/// range folds to zero, so "no observations" reads the same as "quiescent".
/// Sums wrap on overflow.
pub struct Aggregation<'w, M: Mode> {
    window: &'w Window<M>,
    left_skip: usize,
    right_skip: usize,
}

impl<'w, M: Mode> Aggregation<'w, M> {
    pub(crate) fn new(window: &'w Window<M>, left_skip: usize, right_skip: usize) -> Self {
        Self {
            window,
            left_skip,
            right_skip,
        }
    }

    /// Visits the live buckets of the range, oldest first, until `f` returns `true`.
    pub fn reduce(&self, mut f: impl FnMut(&Slot) -> bool) {
        self.window
            .scan(self.left_skip, self.right_skip, |slot| match slot {
                Some(slot) => f(slot),
                None => false,
            });
    }

    /// Smallest stored value, or 0 when the range is empty.
    pub fn min(&self) -> i64 {
        let mut min = None;
        self.reduce(|slot| {
            for &value in slot.data() {
                min = Some(min.map_or(value, |m: i64| m.min(value)));
            }
            false
        });
        min.unwrap_or(0)
    }

    /// Largest stored value, or 0 when the range is empty.
    pub fn max(&self) -> i64 {
        let mut max = None;
        self.reduce(|slot| {
            for &value in slot.data() {
                max = Some(max.map_or(value, |m: i64| m.max(value)));
            }
            false
        });
        max.unwrap_or(0)
    }

    pub fn sum(&self) -> i64 {
        let mut sum = 0i64;
        self.reduce(|slot| {
            sum = sum.wrapping_add(slot_sum(slot));
            false
        });
        sum
    }

    /// Number of values written into the range.
    pub fn count(&self) -> i64 {
        let mut count = 0;
        self.reduce(|slot| {
            count += slot.count();
            false
        });
        count
    }

    /// `sum / count` from a single snapshot, or 0.0 when nothing was written.
    pub fn avg(&self) -> f64 {
        let (mut sum, mut count) = (0i64, 0i64);
        self.reduce(|slot| {
            sum = sum.wrapping_add(slot_sum(slot));
            count += slot.count();
            false
        });
        if count == 0 {
            return 0.0;
        }
        sum as f64 / count as f64
    }
}

#[inline]
fn slot_sum(slot: &Slot) -> i64 {
    slot.data().iter().copied().fold(0, i64::wrapping_add)
}
