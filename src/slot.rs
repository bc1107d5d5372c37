/// Round of a slot that has never been written. No instant maps to it.
pub(crate) const UNWRITTEN_ROUND: i64 = -1;

/// The window as seen from one instant: where "now" sits on the track and how
/// many slots, ending at "now", are still live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowView {
    pub(crate) round: i64,
    pub(crate) position: i64,
    pub(crate) size: i64,
    pub(crate) track_bits: u32,
}

impl WindowView {
    /// `round * track_size + position`, the slot identifier that never repeats.
    #[inline(always)]
    pub(crate) fn absolute(&self) -> i64 {
        (self.round << self.track_bits) | self.position
    }
}

/// One bucket of the ring, covering a single bucket duration.
///
/// A slot either collects every sample (sample windows) or keeps a single running
/// sum in `data()[0]` with `count()` additions (aggregate windows). The running sum
/// wraps on overflow.
#[derive(Debug, Clone)]
pub struct Slot {
    round: i64,
    position: i64,
    data: Vec<i64>,
    count: i64,
}

impl Slot {
    pub(crate) fn new(position: i64, capacity: usize) -> Self {
        Self {
            round: UNWRITTEN_ROUND,
            position,
            data: Vec::with_capacity(capacity),
            count: 0,
        }
    }

    /// Samples of a sample window, or `[sum]` of an aggregate window.
    #[inline]
    pub fn data(&self) -> &[i64] {
        &self.data
    }

    /// Number of values written into the slot since it was last recycled.
    #[inline]
    pub fn count(&self) -> i64 {
        self.count
    }

    /// Round the data belongs to.
    #[inline]
    pub fn round(&self) -> i64 {
        self.round
    }

    /// Fixed index of the slot in the ring.
    #[inline]
    pub fn position(&self) -> i64 {
        self.position
    }

    /// Whether the slot's data lies within the `view.size` slots ending at `view`.
    #[inline(always)]
    pub(crate) fn is_valid(&self, view: &WindowView) -> bool {
        if self.round < 0 {
            return false;
        }
        let right = view.absolute();
        let left = right - view.size + 1;
        let own = (self.round << view.track_bits) | self.position;
        left <= own && own <= right
    }

    /// Drops the data but keeps the round. The round is fixed up by the next write.
    #[inline]
    pub(crate) fn reset(&mut self) {
        self.data.clear();
        self.count = 0;
    }

    #[inline]
    pub(crate) fn recycle(&mut self, round: i64) {
        self.reset();
        self.round = round;
    }

    #[inline(always)]
    fn claim(&mut self, view: &WindowView) {
        debug_assert_eq!(self.position, view.position, "window: write into a foreign slot");
        if !self.is_valid(view) {
            self.recycle(view.round);
        }
    }

    #[inline]
    pub(crate) fn append(&mut self, view: &WindowView, value: i64) {
        self.claim(view);
        self.data.push(value);
        self.count += 1;
    }

    #[inline]
    pub(crate) fn add(&mut self, view: &WindowView, value: i64) {
        self.claim(view);
        match self.data.first_mut() {
            Some(sum) => *sum = sum.wrapping_add(value),
            None => self.data.push(value),
        }
        self.count += 1;
    }
}

mod sealed {
    pub trait Sealed {}
}

/// How a window stores the values written into a slot.
pub trait Mode: sealed::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn store(slot: &mut Slot, view: &WindowView, value: i64);

    #[doc(hidden)]
    fn slot_capacity(requested: usize) -> usize;
}

/// Every sample is kept; `count` is the number of samples.
#[derive(Debug, Clone, Copy, Default)]
pub struct Samples;

/// Each slot keeps a running sum and the number of additions.
#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregate;

impl sealed::Sealed for Samples {}
impl sealed::Sealed for Aggregate {}

impl Mode for Samples {
    #[inline(always)]
    fn store(slot: &mut Slot, view: &WindowView, value: i64) {
        slot.append(view, value);
    }

    fn slot_capacity(requested: usize) -> usize {
        requested
    }
}

impl Mode for Aggregate {
    #[inline(always)]
    fn store(slot: &mut Slot, view: &WindowView, value: i64) {
        slot.add(view, value);
    }

    fn slot_capacity(_requested: usize) -> usize {
        1
    }
}

#[cfg(test)]
mod slot_tests {
    use super::*;

    // Track of 8 slots, window of 6 slots ending at round 5 position 2.
    // Live absolute positions: 37..=42.
    fn straddling_view() -> WindowView {
        WindowView {
            round: 5,
            position: 2,
            size: 6,
            track_bits: 3,
        }
    }

    fn slot_at(round: i64, position: i64) -> Slot {
        let mut slot = Slot::new(position, 0);
        slot.round = round;
        slot
    }

    #[test]
    fn test_validity_straddling_round_boundary() {
        let view = straddling_view();
        assert_eq!(view.absolute(), 42);

        // Current round, up to and including now.
        assert!(slot_at(5, 0).is_valid(&view));
        assert!(slot_at(5, 2).is_valid(&view));
        // Previous round, tail of the ring.
        assert!(slot_at(4, 5).is_valid(&view));
        assert!(slot_at(4, 7).is_valid(&view));
        // Previous round, too old.
        assert!(!slot_at(4, 4).is_valid(&view));
        assert!(!slot_at(4, 0).is_valid(&view));
        // Two rounds back, same tail positions.
        assert!(!slot_at(3, 5).is_valid(&view));
        assert!(!slot_at(3, 7).is_valid(&view));
        // Ahead of now.
        assert!(!slot_at(5, 3).is_valid(&view));
        assert!(!slot_at(6, 0).is_valid(&view));
        // Never written.
        assert!(!slot_at(UNWRITTEN_ROUND, 7).is_valid(&view));
    }

    #[test]
    fn test_validity_within_one_round() {
        let view = WindowView {
            round: 9,
            position: 6,
            size: 3,
            track_bits: 3,
        };
        assert!(slot_at(9, 4).is_valid(&view));
        assert!(slot_at(9, 6).is_valid(&view));
        assert!(!slot_at(9, 3).is_valid(&view));
        assert!(!slot_at(9, 7).is_valid(&view));
        assert!(!slot_at(8, 6).is_valid(&view));
    }

    #[test]
    fn test_append_recycles_expired_slot() {
        let view = straddling_view();
        let mut slot = slot_at(4, 2);
        slot.data = vec![7, 8];
        slot.count = 2;

        slot.append(&view, 1);
        assert_eq!(slot.round(), 5);
        assert_eq!(slot.data(), &[1]);
        assert_eq!(slot.count(), 1);

        slot.append(&view, 2);
        assert_eq!(slot.data(), &[1, 2]);
        assert_eq!(slot.count(), 2);
    }

    #[test]
    fn test_add_keeps_running_sum() {
        let view = straddling_view();
        let mut slot = Slot::new(2, 1);

        slot.add(&view, 3);
        assert_eq!(slot.round(), 5);
        assert_eq!(slot.data(), &[3]);
        assert_eq!(slot.count(), 1);

        slot.add(&view, 4);
        slot.add(&view, -2);
        assert_eq!(slot.data(), &[5]);
        assert_eq!(slot.count(), 3);
    }

    #[test]
    fn test_add_wraps_running_sum() {
        let view = straddling_view();
        let mut slot = Slot::new(2, 1);
        slot.add(&view, i64::MAX);
        slot.add(&view, 1);
        assert_eq!(slot.data(), &[i64::MIN]);
        assert_eq!(slot.count(), 2);
    }

    #[test]
    fn test_reset_keeps_round_and_capacity() {
        let view = straddling_view();
        let mut slot = Slot::new(2, 0);
        for v in 0..64 {
            slot.append(&view, v);
        }
        let capacity = slot.data.capacity();

        slot.reset();
        assert_eq!(slot.round(), 5);
        assert!(slot.data().is_empty());
        assert_eq!(slot.count(), 0);
        assert_eq!(slot.data.capacity(), capacity);

        // Same round, so the next write accepts into the emptied slot.
        slot.append(&view, 1);
        assert_eq!(slot.data(), &[1]);
    }
}
