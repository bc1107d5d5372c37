use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowError {
    #[error("window: bucket size can not be zero")]
    ZeroBuckets,

    #[error("window: bucket duration must be at least 1ms, got {0:?}")]
    BucketDurationTooShort(Duration),

    #[error("window: a track of {track_size} buckets of {bucket_millis}ms does not fit in 63 bits of milliseconds")]
    TrackTooWide { track_size: u64, bucket_millis: u64 },
}
