//! Bounded sample window shared between the poller and its readers.
//!
//! `SampleBuffer` keeps the most recent `capacity` samples, oldest first. When full,
//! an append evicts exactly one sample from the old end before inserting at the new
//! end. Both steps happen under a single write lock, so a concurrent `snapshot()`
//! sees either the whole append or none of it.
//!
//! Ownership: the buffer is created once and handed around as `Arc<SampleBuffer>`.
//! The poller is the only writer; any number of readers may call `snapshot()`,
//! `latest()` and `len()` concurrently.

use std::collections::VecDeque;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use sampler_common::{ConfigError, Sample};

/// Fixed-capacity, overwrite-oldest sample window.
#[derive(Debug)]
pub struct SampleBuffer {
    capacity: usize,
    samples: RwLock<VecDeque<Sample>>,
}

impl SampleBuffer {
    /// Creates an empty buffer. Zero capacity is rejected.
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(Self {
            capacity,
            samples: RwLock::new(VecDeque::with_capacity(capacity)),
        })
    }

    /// Maximum number of retained samples.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends at the newest end, evicting the oldest sample first when full.
    ///
    /// Returns the evicted sample, if any.
    pub fn append(&self, sample: Sample) -> Option<Sample> {
        let mut samples = self.write();
        let evicted = if samples.len() >= self.capacity {
            samples.pop_front()
        } else {
            None
        };
        samples.push_back(sample);
        evicted
    }

    /// Point-in-time copy of the window, oldest first.
    pub fn snapshot(&self) -> Vec<Sample> {
        self.read().iter().copied().collect()
    }

    /// The most recently appended sample, or `None` before the first append.
    pub fn latest(&self) -> Option<Sample> {
        self.read().back().copied()
    }

    /// Current number of samples.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// `true` until the first successful append.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // A panic while holding the lock cannot leave the deque half-updated: both
    // `pop_front` and `push_back` complete or do nothing. Recovering the guard keeps
    // readers working after a poisoned write.
    fn read(&self) -> RwLockReadGuard<'_, VecDeque<Sample>> {
        self.samples.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, VecDeque<Sample>> {
        self.samples.write().unwrap_or_else(PoisonError::into_inner)
    }
}
