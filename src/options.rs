use crate::error::WindowError;
use crate::track::Track;
use std::time::Duration;

/// Construction parameters of a [`Window`](crate::Window).
///
/// `size` and `bucket_duration` are requirements, not exact values: the track
/// rounds the bucket duration down and the ring size up to powers of two.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowOptions {
    /// Number of buckets the window reduces over.
    pub size: usize,
    /// Longest acceptable bucket duration. Millisecond precision.
    pub bucket_duration: Duration,
    /// Samples preallocated per bucket of a sample window.
    pub slot_capacity: usize,
}

impl Default for WindowOptions {
    fn default() -> Self {
        Self {
            size: 16,
            bucket_duration: Duration::from_millis(512),
            slot_capacity: 0,
        }
    }
}

impl WindowOptions {
    /// Whether a track can be laid out for these options.
    pub fn validate(&self) -> Result<(), WindowError> {
        Track::try_new(self.size, self.bucket_duration).map(|_| ())
    }
}
