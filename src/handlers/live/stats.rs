//! Inbound audio counters for one relay session.
//!
//! Only the inbound forwarding path writes these.

use std::time::{Duration, Instant};

/// Log a per-chunk debug line every this many chunks.
pub const CHUNK_LOG_INTERVAL: u64 = 50;

#[derive(Debug, Default, Clone)]
pub struct AudioStats {
    bytes_since_activity_end: u64,
    total_bytes: u64,
    chunk_count: u64,
    activity_started_at: Option<Instant>,
    activity_cycles: u64,
}

impl AudioStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one forwarded audio chunk.
    ///
    /// Returns true when the running total since the last activity end
    /// crosses a multiple of `threshold`. A chunk that spans several
    /// multiples still reports a single crossing.
    pub fn record_audio(&mut self, len: usize, threshold: u64) -> bool {
        let before = self.bytes_since_activity_end;
        self.bytes_since_activity_end += len as u64;
        self.total_bytes += len as u64;
        self.chunk_count += 1;

        threshold > 0 && before / threshold < self.bytes_since_activity_end / threshold
    }

    pub fn mark_activity_start(&mut self) {
        self.activity_started_at = Some(Instant::now());
    }

    /// Close the current activity cycle.
    ///
    /// Resets the since-activity-end counter and returns the time elapsed
    /// since the matching `mark_activity_start`, if there was one.
    pub fn mark_activity_end(&mut self) -> Option<Duration> {
        let elapsed = self.activity_started_at.take().map(|start| start.elapsed());
        self.activity_cycles += 1;
        self.bytes_since_activity_end = 0;
        elapsed
    }

    /// True when this chunk count should be logged at debug level.
    pub fn should_log_chunk(&self) -> bool {
        self.chunk_count > 0 && self.chunk_count % CHUNK_LOG_INTERVAL == 0
    }

    pub fn bytes_since_activity_end(&self) -> u64 {
        self.bytes_since_activity_end
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn chunk_count(&self) -> u64 {
        self.chunk_count
    }

    pub fn activity_cycles(&self) -> u64 {
        self.activity_cycles
    }

    /// Time since the last activity start, if one is open.
    pub fn since_activity_start(&self) -> Option<Duration> {
        self.activity_started_at.map(|start| start.elapsed())
    }
}
