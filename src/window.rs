use crate::aggregation::Aggregation;
use crate::clock;
use crate::error::WindowError;
use crate::options::WindowOptions;
use crate::slot::{Aggregate, Mode, Samples, Slot};
use crate::track::Track;
use spdlog::{debug, warn};
use std::marker::PhantomData;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

/// A window keeping every sample of its buckets.
pub type SampleWindow = Window<Samples>;

/// A window keeping a running sum and count per bucket.
pub type AggregateWindow = Window<Aggregate>;

/// Sliding time window over the most recent `size` buckets.
///
/// Writers take the write lock for the whole of "read the clock, sweep stale
/// buckets, write, remember the position". Reducers hold the read lock while the
/// callback runs, so callbacks must neither touch the same window nor block.
pub struct Window<M: Mode> {
    track: Track,
    size: i64,
    ring: RwLock<Ring>,
    _mode: PhantomData<fn() -> M>,
}

struct Ring {
    slots: Box<[Slot]>,
    /// Absolute position of the last write.
    last_position: i64,
}

impl<M: Mode> Window<M> {
    /// Panics when `size` is zero or `bucket_duration` is under a millisecond.
    pub fn new(size: usize, bucket_duration: Duration) -> Self {
        match Self::try_new(size, bucket_duration) {
            Ok(window) => window,
            Err(err) => panic!("{err}"),
        }
    }

    pub fn try_new(size: usize, bucket_duration: Duration) -> Result<Self, WindowError> {
        Self::with_options(WindowOptions {
            size,
            bucket_duration,
            ..Default::default()
        })
    }

    pub fn with_options(options: WindowOptions) -> Result<Self, WindowError> {
        let track = Track::try_new(options.size, options.bucket_duration)?;
        let slots = track.slots(M::slot_capacity(options.slot_capacity));
        debug!(
            "window: size={} (required {}), bucket={}ms (required {:?}), round={}ms",
            track.size(),
            options.size,
            track.bucket_millis(),
            options.bucket_duration,
            track.round_millis()
        );
        Ok(Self {
            track,
            size: options.size as i64,
            ring: RwLock::new(Ring {
                slots,
                last_position: 0,
            }),
            _mode: PhantomData,
        })
    }

    /// Number of buckets a reduction covers.
    #[inline]
    pub fn size(&self) -> i64 {
        self.size
    }

    #[inline]
    pub fn track(&self) -> &Track {
        &self.track
    }

    /// Absolute position of the current instant: `round * track size + position`.
    ///
    /// Panics if the clock reports an instant before the Unix epoch.
    #[inline]
    pub fn position(&self) -> i64 {
        self.track.absolute(clock::now())
    }

    /// Visits the live buckets of the window, oldest first, leaving out the
    /// `skip_recent` newest ones. Returning `true` from `f` stops the iteration.
    ///
    /// Buckets with no data in the window are not visited at all.
    pub fn reduce(&self, skip_recent: usize, f: impl FnMut(&Slot) -> bool) {
        self.aggregation(skip_recent).reduce(f);
    }

    /// Calls `f` once for each bucket in `[left_skip, size - right_skip)`, oldest
    /// first. Buckets with no data in the window are passed as empty slices.
    pub fn reduce_range(&self, left_skip: usize, right_skip: usize, mut f: impl FnMut(&[i64])) {
        self.scan(left_skip, right_skip, |slot| {
            match slot {
                Some(slot) => f(slot.data()),
                None => f(&[]),
            }
            false
        });
    }

    /// Folds over the window leaving out the `skip_recent` newest buckets.
    pub fn aggregation(&self, skip_recent: usize) -> Aggregation<'_, M> {
        Aggregation::new(self, 0, skip_recent)
    }

    /// Folds over the window leaving out `left_skip` oldest and `right_skip` newest buckets.
    pub fn range_aggregation(&self, left_skip: usize, right_skip: usize) -> Aggregation<'_, M> {
        Aggregation::new(self, left_skip, right_skip)
    }

    /// Walks the buckets `[left_skip, size - right_skip)` of the window ending now,
    /// handing `visit` the slot if its data is live and `None` otherwise.
    pub(crate) fn scan(
        &self,
        left_skip: usize,
        right_skip: usize,
        mut visit: impl FnMut(Option<&Slot>) -> bool,
    ) {
        let ring = self.read();
        let position = self.position();
        let end = self.size - clamp_skip(right_skip, self.size);
        let begin = clamp_skip(left_skip, self.size).min(end);

        // Buckets at or after `live_end` can not hold data: nothing was written
        // since `last_position`, or the whole window rolled out while silent.
        let live_end = match position - ring.last_position {
            span if span < 0 => 0,
            span if span >= self.size => 0,
            span => self.size - span,
        };

        let view = self.track.view_of(position, self.size);
        let oldest = position + self.track.size() + 1 - self.size;
        for i in begin..end {
            let slot = &ring.slots[self.track.index(oldest + i)];
            let live = i < live_end && slot.is_valid(&view);
            if visit(live.then_some(slot)) {
                return;
            }
        }
    }

    /// Sweeps, stores and records the position as one step under the write lock.
    #[inline]
    fn record(&self, value: i64) {
        let mut ring = self.write();
        let position = self.position();
        self.check_reset(&mut ring, position);
        let view = self.track.view_of(position, self.size);
        let index = self.track.index(position);
        M::store(&mut ring.slots[index], &view, value);
        ring.last_position = position;
    }

    fn check_reset(&self, ring: &mut Ring, position: i64) {
        let last_position = ring.last_position;
        if last_position == position {
            return;
        }
        if last_position > position {
            warn!(
                "window: clock went back from bucket {} to {}, dropping window",
                last_position, position
            );
            self.reset_to(ring, position, self.size);
            return;
        }
        let span = position - last_position;
        if span >= self.size {
            self.reset_to(ring, position, self.size);
            return;
        }
        // From the last write (exclusive) up to now (inclusive).
        self.reset_to(ring, position, span);
    }

    /// Clears the `count` buckets ending at `position`.
    fn reset_to(&self, ring: &mut Ring, position: i64, count: i64) {
        assert!(
            (0..=self.size).contains(&count),
            "window: can not reset {} buckets of a window of {}",
            count,
            self.size
        );
        for absolute in position - count + 1..=position {
            ring.slots[self.track.index(absolute)].reset();
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Ring> {
        self.ring.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Ring> {
        self.ring.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[inline]
fn clamp_skip(skip: usize, size: i64) -> i64 {
    i64::try_from(skip).map_or(size, |skip| skip.min(size))
}

impl Window<Samples> {
    /// Keeps `value` in the bucket of the current instant.
    pub fn append(&self, value: i64) {
        self.record(value);
    }
}

impl Window<Aggregate> {
    /// Adds `value` to the running sum of the bucket of the current instant.
    pub fn add(&self, value: i64) {
        self.record(value);
    }
}

impl<M: Mode> Default for Window<M> {
    fn default() -> Self {
        match Self::with_options(WindowOptions::default()) {
            Ok(window) => window,
            Err(err) => panic!("{err}"),
        }
    }
}
