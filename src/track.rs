use crate::bits::{ceil_po2, floor_po2, trailing_ones};
use crate::error::WindowError;
use crate::slot::{Slot, WindowView};
use std::time::Duration;

/// Geometry of the ring: how an instant in milliseconds maps to a round and a
/// slot position, using shifts and masks only.
///
/// Both the bucket duration and the number of slots are powers of two, so one
/// full revolution of the ring (a round) is a power of two milliseconds as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Track {
    size: i64,
    bucket_millis: i64,
    bucket_shift: u32,
    track_bits: u32,
    round_shift: u32,
    position_mask: i64,
}

impl Track {
    /// Panics on invalid requirements. See [`Track::try_new`].
    pub fn new(required_buckets: usize, required_bucket_duration: Duration) -> Self {
        match Self::try_new(required_buckets, required_bucket_duration) {
            Ok(track) => track,
            Err(err) => panic!("{err}"),
        }
    }

    /// Lays out a ring holding at least `required_buckets + 1` slots of at most
    /// `required_bucket_duration` each.
    ///
    /// The extra slot keeps the slot being written apart from the oldest slot
    /// still inside a window of `required_buckets`.
    pub fn try_new(
        required_buckets: usize,
        required_bucket_duration: Duration,
    ) -> Result<Self, WindowError> {
        if required_buckets == 0 {
            return Err(WindowError::ZeroBuckets);
        }
        let required_millis = required_bucket_duration.as_millis();
        if required_millis == 0 {
            return Err(WindowError::BucketDurationTooShort(required_bucket_duration));
        }

        let bucket_millis = floor_po2(u64::try_from(required_millis).unwrap_or(u64::MAX));
        let required_slots = required_buckets as u64;
        if required_slots >= 1 << 62 {
            return Err(WindowError::TrackTooWide {
                track_size: required_slots,
                bucket_millis,
            });
        }
        let size = ceil_po2(required_slots + 1);

        let bucket_shift = trailing_ones(bucket_millis - 1);
        let track_bits = trailing_ones(size - 1);
        let round_shift = bucket_shift + track_bits;
        if round_shift > 62 {
            return Err(WindowError::TrackTooWide {
                track_size: size,
                bucket_millis,
            });
        }

        Ok(Self {
            size: size as i64,
            bucket_millis: bucket_millis as i64,
            bucket_shift,
            track_bits,
            round_shift,
            position_mask: size as i64 - 1,
        })
    }

    /// Number of slots in the ring.
    #[inline]
    pub fn size(&self) -> i64 {
        self.size
    }

    #[inline]
    pub fn bucket_millis(&self) -> i64 {
        self.bucket_millis
    }

    #[inline]
    pub fn round_millis(&self) -> i64 {
        1 << self.round_shift
    }

    #[inline]
    pub fn position_mask(&self) -> i64 {
        self.position_mask
    }

    #[inline]
    pub fn bucket_shift(&self) -> u32 {
        self.bucket_shift
    }

    #[inline]
    pub fn round_shift(&self) -> u32 {
        self.round_shift
    }

    /// `(round, position)` of an instant given in milliseconds since the epoch.
    #[inline(always)]
    pub fn coordinates(&self, instant: i64) -> (i64, i64) {
        check_epoch(instant);
        let round = instant >> self.round_shift;
        let position = (instant >> self.bucket_shift) & self.position_mask;
        (round, position)
    }

    /// `round * size + position` of an instant.
    #[inline(always)]
    pub fn absolute(&self, instant: i64) -> i64 {
        check_epoch(instant);
        instant >> self.bucket_shift
    }

    /// Ring index of an absolute position. Negative positions wrap as well.
    #[inline(always)]
    pub fn index(&self, absolute: i64) -> usize {
        (absolute & self.position_mask) as usize
    }

    #[inline(always)]
    pub(crate) fn view_of(&self, absolute: i64, size: i64) -> WindowView {
        WindowView {
            round: absolute >> self.track_bits,
            position: absolute & self.position_mask,
            size,
            track_bits: self.track_bits,
        }
    }

    pub(crate) fn slots(&self, capacity: usize) -> Box<[Slot]> {
        (0..self.size).map(|position| Slot::new(position, capacity)).collect()
    }
}

#[inline(always)]
fn check_epoch(instant: i64) {
    if instant < 0 {
        panic!("window: we do not support instant before 1970-01-01 00:00:00");
    }
}
